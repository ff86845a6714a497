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

//! Resource registry with single-parent inheritance

use crate::error::{AclError, AclResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// An object that can stand in for a resource id
pub trait ResourceRef {
    /// The id of the resource this object represents
    fn resource_id(&self) -> &str;
}

impl ResourceRef for str {
    fn resource_id(&self) -> &str {
        self
    }
}

impl ResourceRef for String {
    fn resource_id(&self) -> &str {
        self.as_str()
    }
}

/// Resource argument of a query: every resource, a bare id, or an object
/// exposing its id
#[derive(Clone, Copy)]
pub enum ResourceTarget<'a> {
    All,
    Id(&'a str),
    Reference(&'a dyn ResourceRef),
}

impl<'a> ResourceTarget<'a> {
    /// Target an application object implementing [`ResourceRef`]
    pub fn reference<R: ResourceRef>(resource: &'a R) -> Self {
        ResourceTarget::Reference(resource)
    }

    /// Canonical id, or `None` for [`ResourceTarget::All`]
    pub fn id(&self) -> Option<&'a str> {
        match *self {
            ResourceTarget::All => None,
            ResourceTarget::Id(id) => Some(id),
            ResourceTarget::Reference(resource) => Some(resource.resource_id()),
        }
    }
}

impl fmt::Debug for ResourceTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceTarget::All => f.write_str("All"),
            ResourceTarget::Id(id) => f.debug_tuple("Id").field(id).finish(),
            ResourceTarget::Reference(resource) => f.debug_tuple("Reference").field(&resource.resource_id()).finish(),
        }
    }
}

impl<'a> From<&'a str> for ResourceTarget<'a> {
    fn from(id: &'a str) -> Self {
        ResourceTarget::Id(id)
    }
}

impl<'a> From<&'a String> for ResourceTarget<'a> {
    fn from(id: &'a String) -> Self {
        ResourceTarget::Id(id.as_str())
    }
}

impl<'a> From<Option<&'a str>> for ResourceTarget<'a> {
    fn from(id: Option<&'a str>) -> Self {
        id.map_or(ResourceTarget::All, ResourceTarget::Id)
    }
}

impl<'a> From<&'a dyn ResourceRef> for ResourceTarget<'a> {
    fn from(resource: &'a dyn ResourceRef) -> Self {
        ResourceTarget::Reference(resource)
    }
}

/// Resource registered in the tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    /// Unique resource identifier
    pub id: String,

    /// Parent resource, if any
    pub parent: Option<String>,

    /// Direct children
    pub children: Vec<String>,

    /// Resource creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub fn new(id: String, parent: Option<String>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Forest of resources.
///
/// A parent must be registered before its children and is never reassigned,
/// so walking parent links always reaches a root.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    resources: HashMap<String, Resource>,

    /// Registration order
    order: Vec<String>,
}

impl ResourceTree {
    /// Create an empty resource tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource below `parent`
    pub fn add(&mut self, id: &str, parent: Option<&str>) -> AclResult<()> {
        if id.is_empty() {
            return Err(AclError::InvalidIdentifier {
                message: "resource id must not be empty".to_string(),
            });
        }

        if self.has(id) {
            return Err(AclError::DuplicateResource { id: id.to_string() });
        }

        if let Some(parent) = parent {
            let parent_resource = self.resources.get_mut(parent).ok_or_else(|| AclError::UnknownParent {
                id: id.to_string(),
                parent: parent.to_string(),
            })?;
            parent_resource.children.push(id.to_string());
        }

        self.resources.insert(id.to_string(), Resource::new(id.to_string(), parent.map(str::to_string)));
        self.order.push(id.to_string());
        Ok(())
    }

    /// Remove a resource and all of its descendants.
    ///
    /// Returns the removed ids, the requested resource first.
    pub fn remove(&mut self, id: &str) -> AclResult<Vec<String>> {
        let mut removed = vec![id.to_string()];
        removed.extend(self.descendants(id)?);

        if let Some(parent) = self.resources.get(id).and_then(|r| r.parent.clone()) {
            if let Some(parent_resource) = self.resources.get_mut(&parent) {
                parent_resource.children.retain(|child| child != id);
            }
        }

        for removed_id in &removed {
            self.resources.remove(removed_id);
        }
        self.order.retain(|existing| !removed.contains(existing));

        Ok(removed)
    }

    /// Remove every resource
    pub fn remove_all(&mut self) {
        self.resources.clear();
        self.order.clear();
    }

    /// Get a resource by ID
    pub fn get(&self, id: &str) -> AclResult<&Resource> {
        self.resources.get(id).ok_or_else(|| AclError::UnknownResource { id: id.to_string() })
    }

    pub fn has(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    /// Parent of a resource
    pub fn parent(&self, id: &str) -> AclResult<Option<&str>> {
        Ok(self.get(id)?.parent.as_deref())
    }

    /// Direct children in insertion order
    pub fn children(&self, id: &str) -> AclResult<&[String]> {
        Ok(&self.get(id)?.children)
    }

    /// All descendants of a resource, depth first
    pub fn descendants(&self, id: &str) -> AclResult<Vec<String>> {
        let mut result = Vec::new();
        let mut stack: Vec<&str> = self.children(id)?.iter().rev().map(String::as_str).collect();

        while let Some(current) = stack.pop() {
            result.push(current.to_string());
            if let Some(resource) = self.resources.get(current) {
                stack.extend(resource.children.iter().rev().map(String::as_str));
            }
        }

        Ok(result)
    }

    /// Check whether `id` inherits from `ancestor`
    pub fn inherits(&self, id: &str, ancestor: &str, direct_only: bool) -> AclResult<bool> {
        let resource = self.get(id)?;
        self.get(ancestor)?;

        let mut parent = resource.parent.as_deref();
        if direct_only {
            return Ok(parent == Some(ancestor));
        }

        while let Some(current) = parent {
            if current == ancestor {
                return Ok(true);
            }
            parent = self.resources.get(current).and_then(|r| r.parent.as_deref());
        }

        Ok(false)
    }

    /// Resource ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_tree() -> ResourceTree {
        let mut tree = ResourceTree::new();
        tree.add("city", None).unwrap();
        tree.add("building", Some("city")).unwrap();
        tree.add("room", Some("building")).unwrap();
        tree
    }

    struct Document {
        id: String,
    }

    impl ResourceRef for Document {
        fn resource_id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_resource_inheritance() {
        let tree = create_test_tree();

        assert!(tree.inherits("building", "city", true).unwrap());
        assert!(tree.inherits("room", "building", true).unwrap());
        assert!(tree.inherits("room", "city", false).unwrap());
        assert!(!tree.inherits("room", "city", true).unwrap());
        assert!(!tree.inherits("city", "building", false).unwrap());
        assert!(!tree.inherits("building", "room", false).unwrap());
        assert!(!tree.inherits("city", "room", false).unwrap());
    }

    #[test]
    fn test_remove_cascades() {
        let mut tree = create_test_tree();
        tree.add("garage", Some("city")).unwrap();

        let removed = tree.remove("building").unwrap();
        assert_eq!(removed, vec!["building", "room"]);
        assert!(!tree.has("room"));
        assert!(!tree.has("building"));
        assert_eq!(tree.get("city").unwrap().children, vec!["garage"]);
        assert_eq!(tree.ids(), vec!["city", "garage"]);
    }

    #[test]
    fn test_duplicate_and_unknown_parent() {
        let mut tree = create_test_tree();

        assert!(matches!(tree.add("city", None), Err(AclError::DuplicateResource { .. })));
        assert!(matches!(tree.add("desk", Some("office")), Err(AclError::UnknownParent { .. })));
        assert!(!tree.has("desk"));
        assert!(matches!(tree.remove("office"), Err(AclError::UnknownResource { .. })));
    }

    #[test]
    fn test_descendants_depth_first() {
        let mut tree = create_test_tree();
        tree.add("closet", Some("room")).unwrap();
        tree.add("lobby", Some("building")).unwrap();

        assert_eq!(tree.descendants("city").unwrap(), vec!["building", "room", "closet", "lobby"]);
        assert!(tree.descendants("closet").unwrap().is_empty());
        assert_eq!(tree.children("building").unwrap(), ["room".to_string(), "lobby".to_string()]);
    }

    #[test]
    fn test_targets_resolve_ids() {
        let doc = Document { id: "doc-1".to_string() };

        assert_eq!(ResourceTarget::from("city").id(), Some("city"));
        assert_eq!(ResourceTarget::from(None::<&str>).id(), None);
        assert_eq!(ResourceTarget::reference(&doc).id(), Some("doc-1"));
        assert_eq!(format!("{:?}", ResourceTarget::reference(&doc)), "Reference(\"doc-1\")");
    }
}
