pub mod log_groups;
pub mod stack_resources;
