use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use stack_log_tags_core::contract::{serverless_stack_name, TagRunRequest, TagSet};
use stack_log_tags_core::error::ValidationError;
use stack_log_tags_core::tags::{parse_tag_assignment, tag_set_from_json, tag_set_from_value};

use crate::handlers::dispatch::DispatchOptions;
use crate::telemetry::LogFormat;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "tag_stack_log_groups",
    about = "Tag every CloudWatch log group created by a CloudFormation stack",
    long_about = "Lists the resources of a deployed stack, recursing into nested stacks,\n\
                  and applies the configured tags to every AWS::Logs::LogGroup found."
)]
pub struct CliArgs {
    /// Root stack name or ARN
    #[arg(long, env = "STACK_NAME")]
    pub stack_name: Option<String>,
    /// Service name; the stack is `<service>-<stage>` when --stack-name is absent
    #[arg(long, env = "SERVICE_NAME")]
    pub service: Option<String>,
    /// Deployment stage used to derive the stack name
    #[arg(long, env = "STAGE")]
    pub stage: Option<String>,
    /// Tag to apply, as KEY=VALUE (repeatable, wins over file tags)
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    pub tags: Vec<String>,
    /// JSON object of tags
    #[arg(long, env = "LOG_GROUP_TAGS", value_name = "JSON")]
    pub tags_json: Option<String>,
    /// File holding a JSON object of tags
    #[arg(long, value_name = "PATH")]
    pub tags_file: Option<PathBuf>,
    /// serverless.yml to read `service`, `provider.stage`, `provider.region`
    /// and `custom.cloudWatchLogsTags` from
    #[arg(long, value_name = "PATH")]
    pub serverless_config: Option<PathBuf>,
    /// AWS region; falls back to the SDK's default chain
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,
    /// Named AWS profile
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,
    /// Maximum in-flight AWS requests (unbounded when omitted)
    #[arg(long, env = "MAX_CONCURRENCY")]
    pub max_concurrency: Option<usize>,
    /// List log groups that would be tagged without tagging them
    #[arg(long)]
    pub dry_run: bool,
    /// Log output format
    #[arg(value_enum, long, env = "LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Fully resolved CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub request: TagRunRequest,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub dispatch: DispatchOptions,
    pub dry_run: bool,
}

// ── serverless.yml ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ServerlessManifest {
    #[serde(default)]
    service: Option<ServiceName>,
    #[serde(default)]
    provider: ProviderSection,
    #[serde(default)]
    custom: CustomSection,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Plain(String),
    Named { name: String },
}

impl ServiceName {
    fn as_str(&self) -> &str {
        match self {
            Self::Plain(name) | Self::Named { name } => name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSection {
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomSection {
    #[serde(default, rename = "cloudWatchLogsTags")]
    cloud_watch_logs_tags: Option<serde_yaml::Value>,
}

fn load_manifest(path: &Path) -> Result<ServerlessManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read serverless config '{}'", path.display()))?;
    serde_yaml::from_str(&raw)
        .with_context(|| format!("malformed serverless config '{}'", path.display()))
}

fn manifest_tags(manifest: &ServerlessManifest) -> Result<Option<TagSet>> {
    let Some(raw) = manifest.custom.cloud_watch_logs_tags.as_ref() else {
        return Ok(None);
    };
    let value =
        serde_json::to_value(raw).context("custom.cloudWatchLogsTags is not a mapping")?;
    Ok(Some(tag_set_from_value(&value)?))
}

// ── resolution ─────────────────────────────────────────────────────

impl CliArgs {
    /// Merges flags, environment and files into one run configuration.
    ///
    /// Tags are layered in increasing precedence: serverless.yml,
    /// `--tags-file`, `--tags-json`, then each `--tag`.
    pub fn resolve(&self) -> Result<RunConfig> {
        let manifest = match &self.serverless_config {
            Some(path) => load_manifest(path)?,
            None => ServerlessManifest::default(),
        };

        let mut tags = manifest_tags(&manifest)?.unwrap_or_default();
        if let Some(path) = &self.tags_file {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read tags file '{}'", path.display()))?;
            tags.extend(tag_set_from_json(&raw)?);
        }
        if let Some(raw) = self.tags_json.as_deref().filter(|raw| !raw.trim().is_empty()) {
            tags.extend(tag_set_from_json(raw)?);
        }
        for assignment in &self.tags {
            let (key, value) = parse_tag_assignment(assignment)?;
            tags.insert(key, value);
        }

        let stack_name = self.resolve_stack_name(&manifest)?;
        let request = TagRunRequest::new(stack_name, tags)?;

        Ok(RunConfig {
            request,
            region: self.region.clone().or(manifest.provider.region),
            profile: self.profile.clone(),
            dispatch: DispatchOptions {
                max_concurrency: self.max_concurrency,
            },
            dry_run: self.dry_run,
        })
    }

    fn resolve_stack_name(
        &self,
        manifest: &ServerlessManifest,
    ) -> Result<String, ValidationError> {
        if let Some(name) = self
            .stack_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
        {
            return Ok(name.trim().to_string());
        }

        let service = self
            .service
            .as_deref()
            .or_else(|| manifest.service.as_ref().map(ServiceName::as_str))
            .ok_or_else(|| {
                ValidationError::new(
                    "one of --stack-name, --service or --serverless-config is required",
                )
            })?;
        let stage = self.stage.as_deref().or(manifest.provider.stage.as_deref());
        serverless_stack_name(service, stage)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args() -> CliArgs {
        CliArgs::default()
    }

    #[test]
    fn explicit_stack_name_and_tags() {
        let config = CliArgs {
            stack_name: Some("orders-prod".to_string()),
            tags: vec!["team=payments".to_string(), "cost=42".to_string()],
            max_concurrency: Some(8),
            ..args()
        }
        .resolve()
        .expect("config should resolve");

        assert_eq!(config.request.stack_name, "orders-prod");
        assert_eq!(config.request.tags.len(), 2);
        assert_eq!(config.dispatch.max_concurrency, Some(8));
        assert!(!config.dry_run);
    }

    #[test]
    fn stack_name_derives_from_service_and_stage() {
        let config = CliArgs {
            service: Some("orders".to_string()),
            stage: Some("staging".to_string()),
            tags: vec!["team=payments".to_string()],
            ..args()
        }
        .resolve()
        .expect("config should resolve");
        assert_eq!(config.request.stack_name, "orders-staging");
    }

    #[test]
    fn missing_stack_identity_is_rejected() {
        let error = CliArgs {
            tags: vec!["team=payments".to_string()],
            ..args()
        }
        .resolve()
        .expect_err("stack identity is required");
        assert!(error.to_string().contains("--stack-name"));
    }

    #[test]
    fn missing_tags_are_rejected() {
        let error = CliArgs {
            stack_name: Some("orders-prod".to_string()),
            ..args()
        }
        .resolve()
        .expect_err("tags are required");
        assert!(error.to_string().contains("at least one tag"));
    }

    #[test]
    fn serverless_manifest_supplies_service_stage_region_and_tags() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "service:\n  name: orders\nprovider:\n  name: aws\n  stage: prod\n  region: eu-west-1\n\
             custom:\n  cloudWatchLogsTags:\n    team: payments\n    tier: 1\n"
        )
        .expect("write manifest");

        let config = CliArgs {
            serverless_config: Some(file.path().to_path_buf()),
            tags: vec!["tier=2".to_string()],
            ..args()
        }
        .resolve()
        .expect("config should resolve");

        assert_eq!(config.request.stack_name, "orders-prod");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.request.tags["team"], "payments");
        assert_eq!(config.request.tags["tier"], "2", "--tag wins over the manifest");
    }

    #[test]
    fn tags_file_and_json_layer_in_order() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{{\"team\": \"from-file\", \"env\": \"prod\"}}").expect("write tags");

        let config = CliArgs {
            stack_name: Some("orders-prod".to_string()),
            tags_file: Some(file.path().to_path_buf()),
            tags_json: Some("{\"team\": \"from-json\"}".to_string()),
            ..args()
        }
        .resolve()
        .expect("config should resolve");

        assert_eq!(config.request.tags["team"], "from-json");
        assert_eq!(config.request.tags["env"], "prod");
    }

    #[test]
    fn unreadable_tags_file_names_the_path() {
        let error = CliArgs {
            stack_name: Some("orders-prod".to_string()),
            tags_file: Some(PathBuf::from("/nonexistent/tags.json")),
            ..args()
        }
        .resolve()
        .expect_err("missing file should fail");
        assert!(error.to_string().contains("/nonexistent/tags.json"));
    }

    #[test]
    fn parses_command_line() {
        let parsed = CliArgs::try_parse_from([
            "tag_stack_log_groups",
            "--stack-name",
            "orders-prod",
            "--tag",
            "team=payments",
            "--tag",
            "env=prod",
            "--dry-run",
            "--log-format",
            "json",
        ])
        .expect("arguments should parse");

        assert_eq!(parsed.tags.len(), 2);
        assert!(parsed.dry_run);
        assert_eq!(parsed.log_format, LogFormat::Json);
    }
}
