use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use stack_log_tags_lambda::adapters::log_groups::CloudWatchLogsTagger;
use stack_log_tags_lambda::adapters::stack_resources::CloudFormationStackResources;
use stack_log_tags_lambda::handlers::trigger::{
    handle_trigger_event, TriggerResponse, TriggerSettings,
};
use stack_log_tags_lambda::telemetry::init_lambda_logging;

#[derive(Clone)]
struct RuntimeDependencies {
    settings: TriggerSettings,
    pages: CloudFormationStackResources,
    tagger: CloudWatchLogsTagger,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<TriggerResponse, Error> {
    handle_trigger_event(&event.payload, &deps.settings, &deps.pages, &deps.tagger)
        .await
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_lambda_logging().map_err(|error| Error::from(format!("{error:#}")))?;

    let settings = TriggerSettings::from_env()
        .map_err(|error| Error::from(format!("invalid lambda configuration: {error}")))?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        settings,
        pages: CloudFormationStackResources::new(aws_sdk_cloudformation::Client::new(&aws_config)),
        tagger: CloudWatchLogsTagger::new(aws_sdk_cloudwatchlogs::Client::new(&aws_config)),
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
