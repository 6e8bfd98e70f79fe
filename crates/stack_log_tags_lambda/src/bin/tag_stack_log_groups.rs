use std::process::ExitCode;

use clap::Parser;
use stack_log_tags_lambda::adapters::log_groups::{
    CloudWatchLogsTagger, DryRunTagger, LogGroupTagger,
};
use stack_log_tags_lambda::adapters::stack_resources::CloudFormationStackResources;
use stack_log_tags_lambda::config::{CliArgs, RunConfig};
use stack_log_tags_lambda::handlers::dispatch::TagDispatcher;
use stack_log_tags_lambda::telemetry::init_logging;
use tracing::{error, info};

const EXIT_FAILED: u8 = 1;
const EXIT_MISCONFIGURED: u8 = 2;

async fn load_aws_config(config: &RunConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

async fn run(config: RunConfig) -> ExitCode {
    let aws_config = load_aws_config(&config).await;
    let pages =
        CloudFormationStackResources::new(aws_sdk_cloudformation::Client::new(&aws_config));
    let live_tagger = CloudWatchLogsTagger::new(aws_sdk_cloudwatchlogs::Client::new(&aws_config));
    let dry_run_tagger = DryRunTagger;
    let tagger: &dyn LogGroupTagger = if config.dry_run {
        &dry_run_tagger
    } else {
        &live_tagger
    };

    info!(
        stack_name = %config.request.stack_name,
        tags = ?config.request.tags,
        dry_run = config.dry_run,
        "tagging stack log groups"
    );
    let dispatcher = TagDispatcher::new(&pages, tagger, &config.request.tags, &config.dispatch);
    match dispatcher.tag_stack(&config.request.stack_name).await {
        Ok(report) => {
            info!(
                log_groups = report.tagged_log_groups.len(),
                stacks = report.listed_stacks.len(),
                skipped = report.skipped.len(),
                "tagging completed"
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            for record in failure.failures() {
                error!(
                    operation = %record.operation,
                    target = %record.target,
                    logical_id = record.logical_resource_id.as_deref(),
                    message = %record.message,
                    "operation failed"
                );
            }
            error!(error = %failure, "tagging failed");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    if let Err(failure) = init_logging(args.log_format) {
        eprintln!("{failure:#}");
    }

    match args.resolve() {
        Ok(config) => run(config).await,
        Err(failure) => {
            let message = format!("{failure:#}");
            error!(error = %message, "invalid configuration");
            ExitCode::from(EXIT_MISCONFIGURED)
        }
    }
}
