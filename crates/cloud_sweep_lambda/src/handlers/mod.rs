pub mod encryption_audit;
pub mod instance_schedule;
pub mod object_expiry;
pub mod response;
pub mod snapshot_lifecycle;
