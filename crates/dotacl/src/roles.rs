// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Role registry with multi-parent inheritance

use crate::error::{AclError, AclResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Role registered in the graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Unique role identifier
    pub id: String,

    /// Parent roles, lowest priority first
    pub parent_roles: Vec<String>,

    /// Roles that list this one as a parent
    pub child_roles: Vec<String>,

    /// Role creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Create a new role without parents
    pub fn new(id: String) -> Self {
        Self {
            id,
            parent_roles: Vec::new(),
            child_roles: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn remove_parent_role(&mut self, parent_role_id: &str) {
        if let Some(pos) = self.parent_roles.iter().position(|id| id == parent_role_id) {
            self.parent_roles.remove(pos);
        }
    }

    fn remove_child_role(&mut self, child_role_id: &str) {
        if let Some(pos) = self.child_roles.iter().position(|id| id == child_role_id) {
            self.child_roles.remove(pos);
        }
    }
}

/// Inheritance DAG of roles.
///
/// Parents are fixed when a role is added and must already exist, so the graph
/// can never contain a cycle. Parent order matters: the parent added last has
/// the highest priority during rule resolution.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
    roles: HashMap<String, Role>,

    /// Registration order
    order: Vec<String>,
}

impl RoleGraph {
    /// Create an empty role graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role inheriting from `parents`
    pub fn add(&mut self, id: &str, parents: &[&str]) -> AclResult<()> {
        if id.is_empty() {
            return Err(AclError::InvalidIdentifier {
                message: "role id must not be empty".to_string(),
            });
        }

        if self.has(id) {
            return Err(AclError::DuplicateRole { id: id.to_string() });
        }

        if let Some(missing) = parents.iter().find(|parent| !self.has(parent)) {
            return Err(AclError::UnknownParent {
                id: id.to_string(),
                parent: missing.to_string(),
            });
        }

        let mut role = Role::new(id.to_string());
        for parent in parents {
            // Repeated parents add nothing to the search
            if role.parent_roles.iter().any(|p| p == parent) {
                continue;
            }
            role.parent_roles.push(parent.to_string());
            if let Some(parent_role) = self.roles.get_mut(*parent) {
                parent_role.child_roles.push(id.to_string());
            }
        }

        self.roles.insert(id.to_string(), role);
        self.order.push(id.to_string());
        Ok(())
    }

    /// Remove a role, unlinking it from its parents and children.
    ///
    /// Children survive with the role dropped from their parent lists.
    pub fn remove(&mut self, id: &str) -> AclResult<Role> {
        let role = self.roles.remove(id).ok_or_else(|| AclError::UnknownRole { id: id.to_string() })?;

        for child in &role.child_roles {
            if let Some(child_role) = self.roles.get_mut(child) {
                child_role.remove_parent_role(id);
            }
        }
        for parent in &role.parent_roles {
            if let Some(parent_role) = self.roles.get_mut(parent) {
                parent_role.remove_child_role(id);
            }
        }

        self.order.retain(|existing| existing != id);
        Ok(role)
    }

    /// Remove every role
    pub fn remove_all(&mut self) {
        self.roles.clear();
        self.order.clear();
    }

    /// Get a role by ID
    pub fn get(&self, id: &str) -> AclResult<&Role> {
        self.roles.get(id).ok_or_else(|| AclError::UnknownRole { id: id.to_string() })
    }

    pub fn has(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Direct parents in declaration order
    pub fn parents(&self, id: &str) -> AclResult<&[String]> {
        Ok(&self.get(id)?.parent_roles)
    }

    /// Check whether `id` inherits from `ancestor`, either directly or through
    /// any chain of parents unless `direct_only` is set
    pub fn inherits(&self, id: &str, ancestor: &str, direct_only: bool) -> AclResult<bool> {
        let role = self.get(id)?;
        self.get(ancestor)?;

        if role.parent_roles.iter().any(|p| p == ancestor) {
            return Ok(true);
        }
        if direct_only {
            return Ok(false);
        }

        let mut visited = HashSet::new();
        let mut stack: Vec<&str> = role.parent_roles.iter().map(String::as_str).collect();
        while let Some(current) = stack.pop() {
            if current == ancestor {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(current_role) = self.roles.get(current) {
                stack.extend(current_role.parent_roles.iter().map(String::as_str));
            }
        }

        Ok(false)
    }

    /// Role ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_graph() -> RoleGraph {
        let mut graph = RoleGraph::new();
        graph.add("guest", &[]).unwrap();
        graph.add("member", &["guest"]).unwrap();
        graph.add("editor", &["member"]).unwrap();
        graph
    }

    #[test]
    fn test_basic_inheritance() {
        let graph = create_test_graph();

        assert!(graph.parents("guest").unwrap().is_empty());
        assert_eq!(graph.parents("member").unwrap(), ["guest".to_string()]);
        assert_eq!(graph.parents("editor").unwrap(), ["member".to_string()]);

        assert!(graph.inherits("member", "guest", true).unwrap());
        assert!(graph.inherits("editor", "member", true).unwrap());
        assert!(graph.inherits("editor", "guest", false).unwrap());
        assert!(!graph.inherits("editor", "guest", true).unwrap());

        assert!(!graph.inherits("guest", "member", false).unwrap());
        assert!(!graph.inherits("member", "editor", false).unwrap());
        assert!(!graph.inherits("guest", "editor", false).unwrap());
    }

    #[test]
    fn test_multiple_inheritance() {
        let mut graph = RoleGraph::new();
        graph.add("parent1", &[]).unwrap();
        graph.add("parent2", &[]).unwrap();
        graph.add("child", &["parent1", "parent2"]).unwrap();

        assert_eq!(graph.parents("child").unwrap(), ["parent1".to_string(), "parent2".to_string()]);
        assert!(graph.inherits("child", "parent1", false).unwrap());
        assert!(graph.inherits("child", "parent2", false).unwrap());

        graph.remove("parent2").unwrap();

        assert_eq!(graph.parents("child").unwrap(), ["parent1".to_string()]);
        assert!(graph.inherits("child", "parent1", false).unwrap());
        assert!(graph.get("parent1").unwrap().child_roles.contains(&"child".to_string()));
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let mut graph = RoleGraph::new();
        graph.add("tst", &[]).unwrap();

        assert!(matches!(graph.add("tst", &[]), Err(AclError::DuplicateRole { .. })));
    }

    #[test]
    fn test_unknown_parent_leaves_graph_untouched() {
        let mut graph = RoleGraph::new();
        graph.add("guest", &[]).unwrap();

        let result = graph.add("member", &["guest", "ghost"]);
        assert!(matches!(result, Err(AclError::UnknownParent { ref parent, .. }) if parent == "ghost"));
        assert!(!graph.has("member"));
        assert!(graph.get("guest").unwrap().child_roles.is_empty());
    }

    #[test]
    fn test_remove_keeps_descendants() {
        let mut graph = create_test_graph();
        graph.remove("member").unwrap();

        assert!(graph.has("editor"));
        assert!(graph.parents("editor").unwrap().is_empty());
        assert!(graph.get("guest").unwrap().child_roles.is_empty());
        assert!(matches!(graph.remove("member"), Err(AclError::UnknownRole { .. })));
    }

    #[test]
    fn test_ids_keep_registration_order() {
        let mut graph = create_test_graph();
        graph.add("admin", &[]).unwrap();
        graph.remove("member").unwrap();

        assert_eq!(graph.ids(), vec!["guest", "editor", "admin"]);
        graph.remove_all();
        assert!(graph.ids().is_empty());
    }

    #[test]
    fn test_inherits_requires_known_roles() {
        let graph = create_test_graph();
        assert!(graph.inherits("editor", "ghost", false).is_err());
        assert!(graph.inherits("ghost", "guest", false).is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut graph = RoleGraph::new();
        assert!(matches!(graph.add("", &[]), Err(AclError::InvalidIdentifier { .. })));
    }
}
