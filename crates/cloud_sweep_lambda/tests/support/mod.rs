#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use cloud_sweep_core::chunking::{BatchItemError, BatchResponse};
use cloud_sweep_core::descriptor::{
    BucketDescriptor, InstanceDescriptor, InstanceState, ObjectDescriptor, Page,
    SnapshotDescriptor,
};
use cloud_sweep_core::encryption::EncryptionLookup;
use cloud_sweep_core::predicate::TagStatePredicate;
use cloud_sweep_lambda::adapters::block_storage::{SnapshotRequest, SnapshotStore};
use cloud_sweep_lambda::adapters::compute::InstanceFleet;
use cloud_sweep_lambda::adapters::object_store::{BucketEncryptionSource, ObjectStore};

/// Serves `items` in pages of `page_size`, using the item offset as the
/// continuation token.
pub fn page_of<T: Clone>(
    items: &[T],
    page_size: usize,
    token: Option<&str>,
) -> Result<Page<T>, String> {
    let start = match token {
        None => 0,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| format!("invalid continuation token {raw}"))?,
    };
    let end = (start + page_size.max(1)).min(items.len());
    let page = items[start.min(items.len())..end].to_vec();
    if end < items.len() {
        Ok(Page::with_next(page, end.to_string()))
    } else {
        Ok(Page::last(page))
    }
}

/// In-memory compute fleet that applies stop/start transitions, so repeated
/// sweeps observe their own effects.
pub struct FakeFleet {
    pub page_size: usize,
    instances: Mutex<Vec<InstanceDescriptor>>,
    pub stop_calls: Mutex<Vec<Vec<String>>>,
    pub start_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeFleet {
    pub fn new(page_size: usize, instances: Vec<InstanceDescriptor>) -> Self {
        Self {
            page_size,
            instances: Mutex::new(instances),
            stop_calls: Mutex::new(Vec::new()),
            start_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn state_of(&self, instance_id: &str) -> Option<InstanceState> {
        self.instances
            .lock()
            .expect("poisoned mutex")
            .iter()
            .find(|instance| instance.instance_id == instance_id)
            .map(|instance| instance.state.clone())
    }

    fn transition(&self, instance_ids: &[String], from: InstanceState, to: InstanceState) {
        let ids: HashSet<&str> = instance_ids.iter().map(String::as_str).collect();
        for instance in self.instances.lock().expect("poisoned mutex").iter_mut() {
            if ids.contains(instance.instance_id.as_str()) && instance.state == from {
                instance.state = to.clone();
            }
        }
    }
}

impl InstanceFleet for FakeFleet {
    fn describe_instances_page(
        &self,
        _filter: &TagStatePredicate,
        next_token: Option<&str>,
    ) -> Result<Page<InstanceDescriptor>, String> {
        let instances = self.instances.lock().expect("poisoned mutex").clone();
        page_of(&instances, self.page_size, next_token)
    }

    fn stop_instances(&self, instance_ids: &[String]) -> Result<(), String> {
        self.stop_calls
            .lock()
            .expect("poisoned mutex")
            .push(instance_ids.to_vec());
        self.transition(instance_ids, InstanceState::Running, InstanceState::Stopped);
        Ok(())
    }

    fn start_instances(&self, instance_ids: &[String]) -> Result<(), String> {
        self.start_calls
            .lock()
            .expect("poisoned mutex")
            .push(instance_ids.to_vec());
        self.transition(instance_ids, InstanceState::Stopped, InstanceState::Running);
        Ok(())
    }
}

pub fn tagged_instance(id: &str, state: InstanceState, action: &str) -> InstanceDescriptor {
    InstanceDescriptor {
        instance_id: id.to_string(),
        state,
        tags: BTreeMap::from([("Action".to_string(), action.to_string())]),
    }
}

pub struct FakeBuckets {
    pub page_size: usize,
    pub buckets: Vec<(String, EncryptionLookup)>,
}

impl BucketEncryptionSource for FakeBuckets {
    fn list_buckets_page(
        &self,
        next_token: Option<&str>,
    ) -> Result<Page<BucketDescriptor>, String> {
        let names: Vec<BucketDescriptor> = self
            .buckets
            .iter()
            .map(|(name, _)| BucketDescriptor { name: name.clone() })
            .collect();
        page_of(&names, self.page_size, next_token)
    }

    fn get_bucket_encryption(&self, bucket: &str) -> EncryptionLookup {
        self.buckets
            .iter()
            .find(|(name, _)| name == bucket)
            .map(|(_, lookup)| lookup.clone())
            .unwrap_or_else(|| EncryptionLookup::OtherError(format!("NoSuchBucket: {bucket}")))
    }
}

/// Bucket that removes confirmed keys, so a re-run lists only survivors.
pub struct FakeBucket {
    pub page_size: usize,
    objects: Mutex<Vec<ObjectDescriptor>>,
    pub denied_keys: HashSet<String>,
    pub failing_batches: HashSet<usize>,
    pub delete_calls: Mutex<Vec<Vec<String>>>,
}

impl FakeBucket {
    pub fn new(page_size: usize, objects: Vec<ObjectDescriptor>) -> Self {
        Self {
            page_size,
            objects: Mutex::new(objects),
            denied_keys: HashSet::new(),
            failing_batches: HashSet::new(),
            delete_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn remaining_keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|object| object.key.clone())
            .collect()
    }
}

impl ObjectStore for FakeBucket {
    fn list_objects_page(
        &self,
        _bucket: &str,
        next_token: Option<&str>,
    ) -> Result<Page<ObjectDescriptor>, String> {
        let objects = self.objects.lock().expect("poisoned mutex").clone();
        page_of(&objects, self.page_size, next_token)
    }

    fn delete_objects(&self, _bucket: &str, keys: &[String]) -> Result<BatchResponse, String> {
        let call_index = {
            let mut calls = self.delete_calls.lock().expect("poisoned mutex");
            calls.push(keys.to_vec());
            calls.len() - 1
        };
        if self.failing_batches.contains(&call_index) {
            return Err("SlowDown: please reduce your request rate".to_string());
        }

        let mut response = BatchResponse::default();
        for key in keys {
            if self.denied_keys.contains(key) {
                response.errors.push(BatchItemError {
                    key: key.clone(),
                    code: Some("AccessDenied".to_string()),
                    message: "Access Denied".to_string(),
                });
            } else {
                response.confirmed.push(key.clone());
            }
        }

        let confirmed: HashSet<&str> = response.confirmed.iter().map(String::as_str).collect();
        self.objects
            .lock()
            .expect("poisoned mutex")
            .retain(|object| !confirmed.contains(object.key.as_str()));
        Ok(response)
    }
}

pub struct FakeSnapshots {
    pub page_size: usize,
    pub fail_create: bool,
    snapshots: Mutex<Vec<SnapshotDescriptor>>,
    pub created: Mutex<Vec<SnapshotRequest>>,
    now: DateTime<Utc>,
}

impl FakeSnapshots {
    pub fn new(page_size: usize, now: DateTime<Utc>, snapshots: Vec<SnapshotDescriptor>) -> Self {
        Self {
            page_size,
            fail_create: false,
            snapshots: Mutex::new(snapshots),
            created: Mutex::new(Vec::new()),
            now,
        }
    }

    pub fn snapshot_ids(&self) -> Vec<String> {
        self.snapshots
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|snapshot| snapshot.snapshot_id.clone())
            .collect()
    }
}

impl SnapshotStore for FakeSnapshots {
    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<String, String> {
        self.created
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());
        if self.fail_create {
            return Err("IncorrectState: volume is not attached".to_string());
        }
        let mut snapshots = self.snapshots.lock().expect("poisoned mutex");
        let snapshot_id = format!("snap-created-{}", snapshots.len());
        snapshots.push(SnapshotDescriptor {
            snapshot_id: snapshot_id.clone(),
            volume_id: request.volume_id.clone(),
            start_time: self.now,
        });
        Ok(snapshot_id)
    }

    fn describe_snapshots_page(
        &self,
        volume_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<SnapshotDescriptor>, String> {
        let owned: Vec<SnapshotDescriptor> = self
            .snapshots
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|snapshot| snapshot.volume_id == volume_id)
            .cloned()
            .collect();
        page_of(&owned, self.page_size, next_token)
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), String> {
        let mut snapshots = self.snapshots.lock().expect("poisoned mutex");
        let before = snapshots.len();
        snapshots.retain(|snapshot| snapshot.snapshot_id != snapshot_id);
        if snapshots.len() == before {
            Err(format!("InvalidSnapshot.NotFound: {snapshot_id}"))
        } else {
            Ok(())
        }
    }
}
