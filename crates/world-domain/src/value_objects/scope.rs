//! List/create scope parameters

use serde::{Deserialize, Serialize};

use crate::ids::{ProjectId, WorldId};
use crate::value_objects::ScopeRule;

/// World (and optionally project) a list or create call is scoped to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub world_id: Option<WorldId>,
    pub project_id: Option<ProjectId>,
}

impl Scope {
    /// Scope with no world selected
    pub fn none() -> Self {
        Self::default()
    }

    pub fn world(world_id: WorldId) -> Self {
        Self {
            world_id: Some(world_id),
            project_id: None,
        }
    }

    pub fn with_project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Whether a resource under `rule` can be fetched with this scope
    pub fn satisfies(&self, rule: ScopeRule) -> bool {
        match rule {
            ScopeRule::Unscoped => true,
            ScopeRule::World => self.world_id.is_some(),
        }
    }

    /// Query parameters for a list call under `rule`
    pub fn query_pairs(&self, rule: ScopeRule) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if rule == ScopeRule::World {
            if let Some(world_id) = &self.world_id {
                pairs.push(("world_id", world_id.to_string()));
            }
            if let Some(project_id) = &self.project_id {
                pairs.push(("project_id", project_id.to_string()));
            }
        }
        pairs
    }
}
