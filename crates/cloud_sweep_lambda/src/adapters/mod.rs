pub mod block_storage;
pub mod compute;
pub mod object_store;
