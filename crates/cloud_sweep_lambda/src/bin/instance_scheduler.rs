use std::collections::BTreeMap;

use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::{Filter, Instance};
use cloud_sweep_core::descriptor::{InstanceDescriptor, InstanceState, Page};
use cloud_sweep_core::predicate::TagStatePredicate;
use cloud_sweep_lambda::adapters::compute::InstanceFleet;
use cloud_sweep_lambda::config::{env_lookup, schedule_config};
use cloud_sweep_lambda::handlers::instance_schedule::handle_schedule_event;
use cloud_sweep_lambda::handlers::response::HandlerResponse;
use cloud_sweep_lambda::runtime::{block_on, init_logging};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct Ec2InstanceFleet {
    ec2_client: aws_sdk_ec2::Client,
}

impl InstanceFleet for Ec2InstanceFleet {
    fn describe_instances_page(
        &self,
        filter: &TagStatePredicate,
        next_token: Option<&str>,
    ) -> Result<Page<InstanceDescriptor>, String> {
        let client = self.ec2_client.clone();
        let tag_filter = Filter::builder()
            .name(format!("tag:{}", filter.tag_key))
            .values(filter.tag_value.clone())
            .build();
        let state_filter = Filter::builder()
            .name("instance-state-name")
            .values(filter.state.as_str())
            .build();
        let token = next_token.map(str::to_string);

        block_on(async move {
            let output = client
                .describe_instances()
                .filters(tag_filter)
                .filters(state_filter)
                .set_next_token(token)
                .send()
                .await
                .map_err(|error| {
                    format!("failed to describe instances: {}", DisplayErrorContext(&error))
                })?;

            let items: Vec<InstanceDescriptor> = output
                .reservations()
                .iter()
                .flat_map(|reservation| reservation.instances())
                .filter_map(instance_descriptor)
                .collect();
            Ok::<_, String>(Page {
                items,
                next_token: output.next_token().map(str::to_string),
            })
        })
    }

    fn stop_instances(&self, instance_ids: &[String]) -> Result<(), String> {
        let client = self.ec2_client.clone();
        let ids = instance_ids.to_vec();

        block_on(async move {
            client
                .stop_instances()
                .set_instance_ids(Some(ids))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to stop instances: {}", DisplayErrorContext(&error)))
        })
    }

    fn start_instances(&self, instance_ids: &[String]) -> Result<(), String> {
        let client = self.ec2_client.clone();
        let ids = instance_ids.to_vec();

        block_on(async move {
            client
                .start_instances()
                .set_instance_ids(Some(ids))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!("failed to start instances: {}", DisplayErrorContext(&error))
                })
        })
    }
}

fn instance_descriptor(instance: &Instance) -> Option<InstanceDescriptor> {
    let instance_id = instance.instance_id()?.to_string();
    let state = instance
        .state()
        .and_then(|state| state.name())
        .map(|name| InstanceState::parse(name.as_str()))
        .unwrap_or_else(|| InstanceState::Unknown("missing".to_string()));
    let tags: BTreeMap<String, String> = instance
        .tags()
        .iter()
        .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
        .collect();

    Some(InstanceDescriptor {
        instance_id,
        state,
        tags,
    })
}

async fn handle_request(
    _event: LambdaEvent<Value>,
    fleet: &Ec2InstanceFleet,
) -> Result<HandlerResponse, Error> {
    let config = schedule_config(env_lookup);
    Ok(handle_schedule_event(&config, fleet))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let fleet = Ec2InstanceFleet {
        ec2_client: aws_sdk_ec2::Client::new(&aws_config),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &fleet))).await
}
