//! Provider-independent primitives for tagging the log groups of a stack.
//!
//! This crate owns the resource model, tag-set validation, partitioning of
//! stack resources and the run report. It intentionally excludes AWS SDK and
//! Lambda runtime concerns; those live in `stack_log_tags_lambda`.

pub mod contract;
pub mod error;
pub mod partition;
pub mod report;
pub mod tags;
