use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Filter, ResourceType, Snapshot, Tag, TagSpecification};
use chrono::{DateTime, Utc};
use cloud_sweep_core::descriptor::{Page, SnapshotDescriptor};
use cloud_sweep_lambda::adapters::block_storage::{SnapshotRequest, SnapshotStore};
use cloud_sweep_lambda::config::{env_lookup, snapshot_lifecycle_config};
use cloud_sweep_lambda::handlers::response::HandlerResponse;
use cloud_sweep_lambda::handlers::snapshot_lifecycle::handle_snapshot_lifecycle_event;
use cloud_sweep_lambda::runtime::{block_on, init_logging};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::warn;

struct Ec2SnapshotStore {
    ec2_client: aws_sdk_ec2::Client,
}

impl SnapshotStore for Ec2SnapshotStore {
    fn create_snapshot(&self, request: &SnapshotRequest) -> Result<String, String> {
        let client = self.ec2_client.clone();
        let tags: Vec<Tag> = request
            .tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect();
        let tag_specification = TagSpecification::builder()
            .resource_type(ResourceType::Snapshot)
            .set_tags(Some(tags))
            .build();
        let volume_id = request.volume_id.clone();
        let description = request.description.clone();

        block_on(async move {
            let output = client
                .create_snapshot()
                .volume_id(volume_id)
                .description(description)
                .tag_specifications(tag_specification)
                .send()
                .await
                .map_err(|error| {
                    format!("failed to create snapshot: {}", DisplayErrorContext(&error))
                })?;

            output
                .snapshot_id()
                .map(str::to_string)
                .ok_or_else(|| "create_snapshot response did not include a snapshot id".to_string())
        })
    }

    fn describe_snapshots_page(
        &self,
        volume_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<SnapshotDescriptor>, String> {
        let client = self.ec2_client.clone();
        let volume_filter = Filter::builder().name("volume-id").values(volume_id).build();
        let token = next_token.map(str::to_string);

        block_on(async move {
            let output = client
                .describe_snapshots()
                .owner_ids("self")
                .filters(volume_filter)
                .set_next_token(token)
                .send()
                .await
                .map_err(|error| {
                    format!("failed to describe snapshots: {}", DisplayErrorContext(&error))
                })?;

            let items: Vec<SnapshotDescriptor> = output
                .snapshots()
                .iter()
                .filter_map(snapshot_descriptor)
                .collect();
            Ok::<_, String>(Page {
                items,
                next_token: output.next_token().map(str::to_string),
            })
        })
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), String> {
        let client = self.ec2_client.clone();
        let snapshot_id = snapshot_id.to_string();

        block_on(async move {
            client
                .delete_snapshot()
                .snapshot_id(snapshot_id)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!("failed to delete snapshot: {}", DisplayErrorContext(&error))
                })
        })
    }
}

fn snapshot_descriptor(snapshot: &Snapshot) -> Option<SnapshotDescriptor> {
    let snapshot_id = snapshot.snapshot_id()?.to_string();
    let Some(start_time) = snapshot
        .start_time()
        .and_then(|time| DateTime::<Utc>::from_timestamp(time.secs(), time.subsec_nanos()))
    else {
        warn!(
            component = "snapshot_lifecycle",
            event = "snapshot_without_start_time",
            snapshot_id = %snapshot_id
        );
        return None;
    };

    Some(SnapshotDescriptor {
        snapshot_id,
        volume_id: snapshot.volume_id().unwrap_or_default().to_string(),
        start_time,
    })
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    store: &Ec2SnapshotStore,
) -> Result<HandlerResponse, Error> {
    let config = snapshot_lifecycle_config(env_lookup, Utc::now())?;
    Ok(handle_snapshot_lifecycle_event(&config, store))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = Ec2SnapshotStore {
        ec2_client: aws_sdk_ec2::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &store))).await
}
