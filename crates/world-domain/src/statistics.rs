//! Counts derived from an already-fetched list

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resource::FieldAccess;
use crate::value_objects::ResourceSpec;

/// Count of records whose category is in a named subset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub label: String,
    pub count: usize,
}

/// Statistics for one list view. Holds no state beyond the list it was
/// computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityStatistics {
    pub total: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    /// Records with no (or a blank) category value
    pub uncategorized: usize,
    pub groups: Vec<GroupCount>,
}

impl EntityStatistics {
    pub fn compute<R: FieldAccess>(records: &[R], spec: &ResourceSpec) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            if let Some(field) = spec.category_field {
                match record.field_text(field).map(str::trim) {
                    Some(category) if !category.is_empty() => {
                        *stats.by_category.entry(category.to_string()).or_default() += 1;
                    }
                    _ => stats.uncategorized += 1,
                }
            }

            if let Some(field) = spec.status_field {
                if let Some(status) = record.field_text(field).map(str::trim) {
                    if !status.is_empty() {
                        *stats.by_status.entry(status.to_string()).or_default() += 1;
                    }
                }
            }
        }

        let groups: Vec<GroupCount> = spec
            .stat_groups
            .iter()
            .map(|group| GroupCount {
                label: group.label.to_string(),
                count: group
                    .members
                    .iter()
                    .map(|member| stats.count(member))
                    .sum(),
            })
            .collect();
        stats.groups = groups;

        stats
    }

    /// Records tagged with `category`
    pub fn count(&self, category: &str) -> usize {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    pub fn status_count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }

    pub fn group(&self, label: &str) -> Option<usize> {
        self.groups
            .iter()
            .find(|group| group.label == label)
            .map(|group| group.count)
    }
}
