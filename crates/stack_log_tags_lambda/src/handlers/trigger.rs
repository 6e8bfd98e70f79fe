use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stack_log_tags_core::contract::{TagRunRequest, TagSet};
use stack_log_tags_core::error::{AggregateError, ValidationError};
use stack_log_tags_core::report::DispatchReport;
use stack_log_tags_core::tags::{tag_set_from_json, tag_set_from_value};
use tracing::info;

use crate::adapters::log_groups::LogGroupTagger;
use crate::adapters::stack_resources::StackResourcePages;
use crate::handlers::dispatch::{DispatchOptions, TagDispatcher};

pub const STACK_STATUS_CHANGE_DETAIL_TYPE: &str = "CloudFormation Stack Status Change";
const COMPLETED_STATUSES: [&str; 2] = ["CREATE_COMPLETE", "UPDATE_COMPLETE"];

/// Settings read from the Lambda environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSettings {
    /// Tags applied when the event does not carry its own (`LOG_GROUP_TAGS`).
    pub default_tags: Option<TagSet>,
    /// Only stack-status events for this stack trigger a run (`STACK_NAME`).
    pub stack_filter: Option<String>,
    pub dispatch: DispatchOptions,
}

impl TriggerSettings {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        let default_tags = lookup("LOG_GROUP_TAGS")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| tag_set_from_json(&raw))
            .transpose()?;
        let stack_filter = lookup("STACK_NAME")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let max_concurrency = lookup("MAX_CONCURRENCY")
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|error| {
                    ValidationError::new(format!("MAX_CONCURRENCY must be an integer: {error}"))
                })
            })
            .transpose()?;

        Ok(Self {
            default_tags,
            stack_filter,
            dispatch: DispatchOptions { max_concurrency },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    Run(TagRunRequest),
    Ignore { reason: String },
}

#[derive(Debug, Deserialize)]
struct DirectPayload {
    stack_name: String,
    #[serde(default)]
    tags: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DispatchReport>,
}

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("invalid trigger event: {0}")]
    Validation(#[from] ValidationError),
    #[error("{summary}: {details}")]
    Failed {
        summary: String,
        details: Value,
        #[source]
        source: AggregateError,
    },
}

impl From<AggregateError> for TriggerError {
    fn from(error: AggregateError) -> Self {
        Self::Failed {
            summary: error.to_string(),
            details: json!(&error.report),
            source: error,
        }
    }
}

/// Decides whether `event` should start a tagging run.
///
/// Accepts a direct `{"stack_name": ..., "tags": {...}}` payload or an
/// EventBridge stack status change. Only completed creates and updates run.
pub fn resolve_trigger(
    event: &Value,
    settings: &TriggerSettings,
) -> Result<TriggerDecision, ValidationError> {
    let Some(object) = event.as_object() else {
        return Err(ValidationError::new("event must be a JSON object"));
    };

    let (stack_name, tags) = match object.get("detail-type").and_then(Value::as_str) {
        Some(STACK_STATUS_CHANGE_DETAIL_TYPE) => {
            let detail = object.get("detail").unwrap_or(&Value::Null);
            let status = detail
                .pointer("/status-details/status")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if !COMPLETED_STATUSES.contains(&status) {
                return Ok(TriggerDecision::Ignore {
                    reason: format!("stack status '{status}' is not a completed deployment"),
                });
            }

            let stack_id = detail
                .get("stack-id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ValidationError::new("stack status event must include detail.stack-id")
                })?;
            if let Some(filter) = settings.stack_filter.as_deref() {
                if !stack_id_matches(stack_id, filter) {
                    return Ok(TriggerDecision::Ignore {
                        reason: format!("stack '{stack_id}' does not match '{filter}'"),
                    });
                }
            }
            (stack_id.to_string(), None)
        }
        Some(other) => {
            return Ok(TriggerDecision::Ignore {
                reason: format!("unsupported detail-type '{other}'"),
            })
        }
        None => {
            let payload: DirectPayload = serde_json::from_value(event.clone())
                .map_err(|error| ValidationError::new(format!("malformed payload: {error}")))?;
            let tags = payload.tags.as_ref().map(tag_set_from_value).transpose()?;
            (payload.stack_name, tags)
        }
    };

    let tags = tags
        .or_else(|| settings.default_tags.clone())
        .ok_or_else(|| ValidationError::new("no tags in event and LOG_GROUP_TAGS is not set"))?;
    Ok(TriggerDecision::Run(TagRunRequest::new(stack_name, tags)?))
}

/// Stack ids are ARNs of the form `arn:...:stack/<name>/<uuid>`.
fn stack_id_matches(stack_id: &str, stack_name: &str) -> bool {
    stack_id == stack_name || stack_id.contains(&format!(":stack/{stack_name}/"))
}

pub async fn handle_trigger_event(
    event: &Value,
    settings: &TriggerSettings,
    pages: &dyn StackResourcePages,
    tagger: &dyn LogGroupTagger,
) -> Result<TriggerResponse, TriggerError> {
    let request = match resolve_trigger(event, settings)? {
        TriggerDecision::Run(request) => request,
        TriggerDecision::Ignore { reason } => {
            info!(reason = %reason, "ignoring event");
            return Ok(TriggerResponse {
                status: "ignored".to_string(),
                stack_name: None,
                reason: Some(reason),
                report: None,
            });
        }
    };

    info!(stack_name = %request.stack_name, tags = ?request.tags, "tagging stack log groups");
    let dispatcher = TagDispatcher::new(pages, tagger, &request.tags, &settings.dispatch);
    let report = dispatcher.tag_stack(&request.stack_name).await?;
    info!(
        stack_name = %request.stack_name,
        log_groups = report.tagged_log_groups.len(),
        stacks = report.listed_stacks.len(),
        "tagging completed"
    );

    Ok(TriggerResponse {
        status: "tagged".to_string(),
        stack_name: Some(request.stack_name),
        reason: None,
        report: Some(report),
    })
}
