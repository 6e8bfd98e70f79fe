//! AWS-oriented adapters and handlers for tagging the log groups of a stack.
//!
//! This crate owns runtime integration details (CloudFormation and CloudWatch
//! Logs clients, the Lambda trigger and CLI configuration) and builds on the
//! provider-independent model in `stack_log_tags_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
