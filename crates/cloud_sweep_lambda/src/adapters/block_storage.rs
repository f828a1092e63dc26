use cloud_sweep_core::descriptor::{Page, SnapshotDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub volume_id: String,
    pub description: String,
    pub tags: Vec<(String, String)>,
}

pub trait SnapshotStore {
    /// Returns the id of the snapshot that was started.
    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<String, String>;

    /// Snapshots owned by the caller for `volume_id`.
    fn describe_snapshots_page(
        &self,
        volume_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<SnapshotDescriptor>, String>;

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), String>;
}
