use cloud_sweep_core::descriptor::{InstanceDescriptor, Page};
use cloud_sweep_core::predicate::TagStatePredicate;

pub trait InstanceFleet {
    /// One page of instances. Implementations may push `filter` to the
    /// remote side; the caller re-applies it either way.
    fn describe_instances_page(
        &self,
        filter: &TagStatePredicate,
        next_token: Option<&str>,
    ) -> Result<Page<InstanceDescriptor>, String>;

    fn stop_instances(&self, instance_ids: &[String]) -> Result<(), String>;

    fn start_instances(&self, instance_ids: &[String]) -> Result<(), String>;
}
