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

//! Rule storage keyed by resource scope, role scope and privilege
//!
//! The table is a three level map. Each level has a wildcard slot ("all
//! resources", "all roles", "all privileges") next to the specific entries.
//! Rule sets are created lazily on write, so a missing set means "no rule
//! here" rather than a deny, and the resolver keeps searching ancestors.

use crate::assertion::Assertion;
use crate::error::AclError;
use crate::resources::ResourceRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Outcome a rule grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn opposite(self) -> Self {
        match self {
            Effect::Allow => Effect::Deny,
            Effect::Deny => Effect::Allow,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("allow"),
            Effect::Deny => f.write_str("deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = AclError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ALLOW" | "TYPE_ALLOW" => Ok(Effect::Allow),
            "DENY" | "TYPE_DENY" => Ok(Effect::Deny),
            _ => Err(AclError::InvalidEffect { value: value.to_string() }),
        }
    }
}

/// Rule table mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
}

impl FromStr for Operation {
    type Err = AclError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADD" | "OP_ADD" => Ok(Operation::Add),
            "REMOVE" | "OP_REMOVE" => Ok(Operation::Remove),
            _ => Err(AclError::UnknownOperation { value: value.to_string() }),
        }
    }
}

/// Rule table key on the role or resource axis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Id(String),
}

impl Scope {
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Id(id) => Some(id),
        }
    }
}

/// Roles, resources or privileges a rule mutation applies to.
///
/// `All` is the wildcard. For resources it also fans out to every registered
/// resource, while an empty `Only` list targets the wildcard scope alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    All,
    Only(Vec<String>),
}

impl Targets {
    /// Target a single application object implementing [`ResourceRef`]
    pub fn reference<R: ResourceRef + ?Sized>(resource: &R) -> Self {
        Targets::Only(vec![resource.resource_id().to_string()])
    }
}

impl From<&str> for Targets {
    fn from(id: &str) -> Self {
        Targets::Only(vec![id.to_string()])
    }
}

impl From<String> for Targets {
    fn from(id: String) -> Self {
        Targets::Only(vec![id])
    }
}

impl From<Option<&str>> for Targets {
    fn from(id: Option<&str>) -> Self {
        id.map_or(Targets::All, |id| Targets::Only(vec![id.to_string()]))
    }
}

impl From<Vec<String>> for Targets {
    fn from(ids: Vec<String>) -> Self {
        Targets::Only(ids)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(ids: Vec<&str>) -> Self {
        Targets::Only(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Targets {
    fn from(ids: &[&str]) -> Self {
        Targets::Only(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(ids: [&str; N]) -> Self {
        Targets::Only(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// A stored effect with its optional assertion
#[derive(Clone)]
pub struct Rule {
    pub effect: Effect,
    pub assertion: Option<Arc<dyn Assertion>>,
}

impl Rule {
    pub fn new(effect: Effect, assertion: Option<Arc<dyn Assertion>>) -> Self {
        Self { effect, assertion }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("effect", &self.effect)
            .field("has_assertion", &self.assertion.is_some())
            .finish()
    }
}

/// Rules stored for one (resource scope, role scope) pair
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    all_privileges: Option<Rule>,
    by_privilege: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn all_privileges(&self) -> Option<&Rule> {
        self.all_privileges.as_ref()
    }

    pub fn privilege(&self, privilege: &str) -> Option<&Rule> {
        self.by_privilege.get(privilege)
    }

    /// Privileges with a dedicated rule
    pub fn privileges(&self) -> impl Iterator<Item = &str> {
        self.by_privilege.keys().map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.all_privileges.is_none() && self.by_privilege.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct ResourceRules {
    all_roles: Option<RuleSet>,
    by_role: HashMap<String, RuleSet>,
}

impl ResourceRules {
    fn get(&self, role: Option<&str>) -> Option<&RuleSet> {
        match role {
            None => self.all_roles.as_ref(),
            Some(role) => self.by_role.get(role),
        }
    }

    fn get_mut(&mut self, role: Option<&str>) -> Option<&mut RuleSet> {
        match role {
            None => self.all_roles.as_mut(),
            Some(role) => self.by_role.get_mut(role),
        }
    }

    fn get_or_create(&mut self, role: Option<&str>) -> &mut RuleSet {
        match role {
            None => self.all_roles.get_or_insert_with(RuleSet::default),
            Some(role) => self.by_role.entry(role.to_string()).or_default(),
        }
    }
}

/// The rule table of an ACL.
///
/// `None` stands for the wildcard scope on both the resource and role axis.
#[derive(Debug, Clone)]
pub struct RuleTable {
    all_resources: ResourceRules,
    by_resource: HashMap<String, ResourceRules>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTable {
    /// Create a table holding only the default rule: deny everything
    pub fn new() -> Self {
        let default_rules = RuleSet {
            all_privileges: Some(Rule::new(Effect::Deny, None)),
            by_privilege: BTreeMap::new(),
        };

        Self {
            all_resources: ResourceRules {
                all_roles: Some(default_rules),
                by_role: HashMap::new(),
            },
            by_resource: HashMap::new(),
        }
    }

    /// Rules for a (resource, role) scope, if any were ever written
    pub fn rules(&self, resource: Option<&str>, role: Option<&str>) -> Option<&RuleSet> {
        match resource {
            None => self.all_resources.get(role),
            Some(resource) => self.by_resource.get(resource)?.get(role),
        }
    }

    fn rules_mut(&mut self, resource: Option<&str>, role: Option<&str>) -> Option<&mut RuleSet> {
        match resource {
            None => self.all_resources.get_mut(role),
            Some(resource) => self.by_resource.get_mut(resource)?.get_mut(role),
        }
    }

    fn rules_or_create(&mut self, resource: Option<&str>, role: Option<&str>) -> &mut RuleSet {
        let resource_rules = match resource {
            None => &mut self.all_resources,
            Some(resource) => self.by_resource.entry(resource.to_string()).or_default(),
        };
        resource_rules.get_or_create(role)
    }

    /// Write `effect` for the given privileges, or for all privileges when
    /// `privileges` is empty
    pub fn add(&mut self, resource: Option<&str>, role: Option<&str>, privileges: &[String], effect: Effect, assertion: Option<Arc<dyn Assertion>>) {
        let rules = self.rules_or_create(resource, role);

        if privileges.is_empty() {
            rules.all_privileges = Some(Rule::new(effect, assertion));
            return;
        }

        for privilege in privileges {
            rules.by_privilege.insert(privilege.clone(), Rule::new(effect, assertion.clone()));
        }
    }

    /// Erase rules carrying `effect`. Rules with the other effect are kept.
    ///
    /// Removing the default rule's effect resets it to deny without an
    /// assertion and drops its privilege rules.
    pub fn remove(&mut self, resource: Option<&str>, role: Option<&str>, privileges: &[String], effect: Effect) {
        let Some(rules) = self.rules_mut(resource, role) else {
            return;
        };

        if !privileges.is_empty() {
            for privilege in privileges {
                if rules.by_privilege.get(privilege).is_some_and(|rule| rule.effect == effect) {
                    rules.by_privilege.remove(privilege);
                }
            }
            return;
        }

        let matches = rules.all_privileges.as_ref().is_some_and(|rule| rule.effect == effect);
        if resource.is_none() && role.is_none() {
            if matches {
                rules.all_privileges = Some(Rule::new(Effect::Deny, None));
                rules.by_privilege.clear();
            }
        } else if matches {
            rules.all_privileges = None;
        }
    }

    /// Drop every rule scoped to `role`
    pub fn remove_role(&mut self, role: &str) {
        self.all_resources.by_role.remove(role);
        for resource_rules in self.by_resource.values_mut() {
            resource_rules.by_role.remove(role);
        }
    }

    /// Drop every rule scoped to a specific role
    pub fn remove_all_roles(&mut self) {
        self.all_resources.by_role.clear();
        for resource_rules in self.by_resource.values_mut() {
            resource_rules.by_role.clear();
        }
    }

    /// Drop every rule scoped to one of `resources`
    pub fn remove_resources(&mut self, resources: &[String]) {
        for resource in resources {
            self.by_resource.remove(resource);
        }
    }

    /// Drop every rule scoped to a specific resource
    pub fn remove_all_resources(&mut self) {
        self.by_resource.clear();
    }

    /// Number of (resource, role) scopes holding at least one rule
    pub fn scope_count(&self) -> usize {
        std::iter::once(&self.all_resources)
            .chain(self.by_resource.values())
            .map(|resource_rules| {
                resource_rules.all_roles.iter().chain(resource_rules.by_role.values()).filter(|rules| !rules.is_empty()).count()
            })
            .sum()
    }
}
