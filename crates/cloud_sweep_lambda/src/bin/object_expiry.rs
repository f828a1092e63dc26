use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{Delete, Object, ObjectIdentifier};
use chrono::{DateTime, Utc};
use cloud_sweep_core::chunking::{BatchItemError, BatchResponse};
use cloud_sweep_core::descriptor::{ObjectDescriptor, Page};
use cloud_sweep_lambda::adapters::object_store::ObjectStore;
use cloud_sweep_lambda::config::{env_lookup, object_expiry_config};
use cloud_sweep_lambda::handlers::object_expiry::handle_object_expiry_event;
use cloud_sweep_lambda::handlers::response::HandlerResponse;
use cloud_sweep_lambda::runtime::{block_on, init_logging};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::warn;

struct S3ObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    fn list_objects_page(
        &self,
        bucket: &str,
        next_token: Option<&str>,
    ) -> Result<Page<ObjectDescriptor>, String> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        let token = next_token.map(str::to_string);

        block_on(async move {
            let output = client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|error| format!("failed to list objects: {}", DisplayErrorContext(&error)))?;

            let items: Vec<ObjectDescriptor> = output
                .contents()
                .iter()
                .filter_map(object_descriptor)
                .collect();
            let next_token = if output.is_truncated().unwrap_or(false) {
                output.next_continuation_token().map(str::to_string)
            } else {
                None
            };
            Ok::<_, String>(Page { items, next_token })
        })
    }

    fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<BatchResponse, String> {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();
        let identifiers = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| format!("failed to build object identifiers: {error}"))?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|error| format!("failed to build delete request: {error}"))?;

        block_on(async move {
            let output = client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|error| format!("failed to delete objects: {}", DisplayErrorContext(&error)))?;

            let confirmed = output
                .deleted()
                .iter()
                .filter_map(|deleted| deleted.key())
                .map(str::to_string)
                .collect();
            let errors = output
                .errors()
                .iter()
                .map(|error| BatchItemError {
                    key: error.key().unwrap_or_default().to_string(),
                    code: error.code().map(str::to_string),
                    message: error.message().unwrap_or("unknown error").to_string(),
                })
                .collect();
            Ok::<_, String>(BatchResponse { confirmed, errors })
        })
    }
}

fn object_descriptor(object: &Object) -> Option<ObjectDescriptor> {
    let key = object.key()?.to_string();
    let Some(last_modified) = object
        .last_modified()
        .and_then(|time| DateTime::<Utc>::from_timestamp(time.secs(), time.subsec_nanos()))
    else {
        warn!(
            component = "object_expiry",
            event = "object_without_last_modified",
            key = %key
        );
        return None;
    };

    Some(ObjectDescriptor { key, last_modified })
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    store: &S3ObjectStore,
) -> Result<HandlerResponse, Error> {
    let config = object_expiry_config(env_lookup, Utc::now())?;
    Ok(handle_object_expiry_event(&config, store))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore {
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &store))).await
}
