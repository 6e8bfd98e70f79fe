use crate::contract::{ResourceKind, StackResourceSummary};
use crate::report::SkippedResource;

/// A resource that is ready to be listed or tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub logical_resource_id: String,
    pub physical_resource_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePartition {
    pub nested_stacks: Vec<ResourceRef>,
    pub log_groups: Vec<ResourceRef>,
    pub skipped: Vec<SkippedResource>,
}

impl ResourcePartition {
    /// No nested stacks means recursion stops at this stack.
    pub fn is_leaf(&self) -> bool {
        self.nested_stacks.is_empty()
    }
}

/// Splits the resources of `stack_name` into nested stacks and log groups,
/// keeping listing order. Other resource types are ignored; stacks and log
/// groups without a physical id are reported as skipped.
pub fn partition_resources(
    stack_name: &str,
    summaries: &[StackResourceSummary],
) -> ResourcePartition {
    let mut partition = ResourcePartition::default();

    for summary in summaries {
        let kind = summary.kind();
        if kind == ResourceKind::Other {
            continue;
        }

        let Some(physical_resource_id) = summary
            .physical_resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
        else {
            partition.skipped.push(SkippedResource {
                stack_name: stack_name.to_string(),
                logical_resource_id: summary.logical_resource_id.clone(),
                resource_type: summary.resource_type.clone(),
                reason: "missing physical resource id".to_string(),
            });
            continue;
        };

        let reference = ResourceRef {
            logical_resource_id: summary.logical_resource_id.clone(),
            physical_resource_id: physical_resource_id.to_string(),
        };
        match kind {
            ResourceKind::NestedStack => partition.nested_stacks.push(reference),
            ResourceKind::LogGroup => partition.log_groups.push(reference),
            ResourceKind::Other => {}
        }
    }

    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{LOG_GROUP_RESOURCE_TYPE, NESTED_STACK_RESOURCE_TYPE};

    #[test]
    fn splits_stacks_and_log_groups_in_order() {
        let summaries = vec![
            StackResourceSummary::new("A", "/aws/lambda/fnA", LOG_GROUP_RESOURCE_TYPE),
            StackResourceSummary::new("Fn", "fnA", "AWS::Lambda::Function"),
            StackResourceSummary::new("B", "nested-1", NESTED_STACK_RESOURCE_TYPE),
            StackResourceSummary::new("D", "/aws/lambda/fnD", LOG_GROUP_RESOURCE_TYPE),
        ];

        let partition = partition_resources("root", &summaries);
        let log_groups: Vec<_> = partition
            .log_groups
            .iter()
            .map(|item| item.physical_resource_id.as_str())
            .collect();

        assert_eq!(log_groups, vec!["/aws/lambda/fnA", "/aws/lambda/fnD"]);
        assert_eq!(partition.nested_stacks.len(), 1);
        assert_eq!(partition.nested_stacks[0].logical_resource_id, "B");
        assert!(partition.skipped.is_empty());
        assert!(!partition.is_leaf());
    }

    #[test]
    fn skips_resources_without_physical_id() {
        let summaries = vec![
            StackResourceSummary {
                logical_resource_id: "Pending".to_string(),
                physical_resource_id: None,
                resource_type: LOG_GROUP_RESOURCE_TYPE.to_string(),
            },
            StackResourceSummary {
                logical_resource_id: "Bucket".to_string(),
                physical_resource_id: None,
                resource_type: "AWS::S3::Bucket".to_string(),
            },
        ];

        let partition = partition_resources("root", &summaries);
        assert!(partition.log_groups.is_empty());
        assert!(partition.is_leaf());
        assert_eq!(partition.skipped.len(), 1);
        assert_eq!(partition.skipped[0].logical_resource_id, "Pending");
        assert_eq!(partition.skipped[0].stack_name, "root");
    }
}
