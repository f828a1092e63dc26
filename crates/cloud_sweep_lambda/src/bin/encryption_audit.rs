use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::ServerSideEncryptionConfiguration;
use cloud_sweep_core::descriptor::{BucketDescriptor, Page};
use cloud_sweep_core::encryption::{EncryptionConfiguration, EncryptionLookup, EncryptionRule};
use cloud_sweep_lambda::adapters::object_store::BucketEncryptionSource;
use cloud_sweep_lambda::handlers::encryption_audit::handle_encryption_audit_event;
use cloud_sweep_lambda::handlers::response::HandlerResponse;
use cloud_sweep_lambda::runtime::{block_on, init_logging};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

/// Error code S3 returns when a bucket has no default encryption.
const ENCRYPTION_NOT_FOUND_CODE: &str = "ServerSideEncryptionConfigurationNotFoundError";
const LIST_BUCKETS_PAGE_SIZE: i32 = 1_000;

struct S3EncryptionSource {
    s3_client: aws_sdk_s3::Client,
}

impl BucketEncryptionSource for S3EncryptionSource {
    fn list_buckets_page(
        &self,
        next_token: Option<&str>,
    ) -> Result<Page<BucketDescriptor>, String> {
        let client = self.s3_client.clone();
        let token = next_token.map(str::to_string);

        block_on(async move {
            let output = client
                .list_buckets()
                .max_buckets(LIST_BUCKETS_PAGE_SIZE)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|error| format!("failed to list buckets: {}", DisplayErrorContext(&error)))?;

            let items: Vec<BucketDescriptor> = output
                .buckets()
                .iter()
                .filter_map(|bucket| bucket.name())
                .map(|name| BucketDescriptor {
                    name: name.to_string(),
                })
                .collect();
            Ok::<_, String>(Page {
                items,
                next_token: output.continuation_token().map(str::to_string),
            })
        })
    }

    fn get_bucket_encryption(&self, bucket: &str) -> EncryptionLookup {
        let client = self.s3_client.clone();
        let bucket = bucket.to_string();

        block_on(async move {
            match client.get_bucket_encryption().bucket(bucket).send().await {
                Ok(output) => EncryptionLookup::Found(
                    output
                        .server_side_encryption_configuration()
                        .map(encryption_configuration)
                        .unwrap_or_default(),
                ),
                Err(error) => {
                    let code = error.as_service_error().and_then(|service| service.code());
                    if code == Some(ENCRYPTION_NOT_FOUND_CODE) {
                        EncryptionLookup::NotConfigured
                    } else {
                        EncryptionLookup::OtherError(DisplayErrorContext(&error).to_string())
                    }
                }
            }
        })
    }
}

fn encryption_configuration(
    configuration: &ServerSideEncryptionConfiguration,
) -> EncryptionConfiguration {
    EncryptionConfiguration {
        rules: configuration
            .rules()
            .iter()
            .map(|rule| {
                let default = rule.apply_server_side_encryption_by_default();
                EncryptionRule {
                    algorithm: default.map(|value| value.sse_algorithm().as_str().to_string()),
                    kms_master_key_id: default
                        .and_then(|value| value.kms_master_key_id())
                        .map(str::to_string),
                    bucket_key_enabled: rule.bucket_key_enabled(),
                }
            })
            .collect(),
    }
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    source: &S3EncryptionSource,
) -> Result<HandlerResponse, Error> {
    Ok(handle_encryption_audit_event(source))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let source = S3EncryptionSource {
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &source))).await
}
