use cloud_sweep_core::chunking::BatchResponse;
use cloud_sweep_core::descriptor::{BucketDescriptor, ObjectDescriptor, Page};
use cloud_sweep_core::encryption::EncryptionLookup;

pub trait BucketEncryptionSource {
    fn list_buckets_page(&self, next_token: Option<&str>)
        -> Result<Page<BucketDescriptor>, String>;

    fn get_bucket_encryption(&self, bucket: &str) -> EncryptionLookup;
}

pub trait ObjectStore {
    fn list_objects_page(
        &self,
        bucket: &str,
        next_token: Option<&str>,
    ) -> Result<Page<ObjectDescriptor>, String>;

    /// Bulk delete of at most `MAX_BATCH_SIZE` keys.
    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<BatchResponse, String>;
}
