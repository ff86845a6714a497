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

//! ACL instance: registries, rule editing and the current identity

use crate::assertion::Assertion;
use crate::config::AclConfig;
use crate::error::{AclError, AclResult};
use crate::identity::Identity;
use crate::resources::{Resource, ResourceRef, ResourceTarget, ResourceTree};
use crate::roles::{Role, RoleGraph};
use crate::rules::{Effect, Operation, RuleTable, Scope, Targets};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Access control list owning its roles, resources and rules
pub struct Acl {
    pub(crate) config: AclConfig,
    pub(crate) roles: RoleGraph,
    pub(crate) resources: ResourceTree,
    pub(crate) rules: RuleTable,
    pub(crate) identity: Option<Box<dyn Identity>>,
}

impl fmt::Debug for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acl")
            .field("config", &self.config)
            .field("roles", &self.roles.ids())
            .field("resources", &self.resources.ids())
            .field("rule_scopes", &self.rules.scope_count())
            .field("has_identity", &self.identity.is_some())
            .finish()
    }
}

impl Default for Acl {
    fn default() -> Self {
        Self::new()
    }
}

impl Acl {
    /// Create an ACL that denies everything
    pub fn new() -> Self {
        Self::with_config(AclConfig::default())
    }

    pub fn with_config(config: AclConfig) -> Self {
        Self {
            config,
            roles: RoleGraph::new(),
            resources: ResourceTree::new(),
            rules: RuleTable::new(),
            identity: None,
        }
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    // --- Identity -------------------------------------------------------

    /// Make `identity` the current principal.
    ///
    /// The identity role is (re)created with exactly the identity's roles as
    /// parents. Every claimed role must already be registered.
    pub fn set_identity<I: Identity + 'static>(&mut self, identity: I) -> AclResult<()> {
        let claimed = identity.roles();
        let identity_role = self.config.identity_role.clone();

        for role in &claimed {
            if *role == identity_role {
                return Err(AclError::InvalidIdentity {
                    message: format!("identity may not claim the reserved role '{identity_role}'"),
                });
            }
            if !self.roles.has(role) {
                return Err(AclError::InvalidIdentity {
                    message: format!("identity claims unknown role '{role}'"),
                });
            }
        }

        if self.roles.has(&identity_role) {
            self.remove_role(&identity_role)?;
        }

        let parents: Vec<&str> = claimed.iter().map(String::as_str).collect();
        self.roles.add(&identity_role, &parents)?;
        self.identity = Some(Box::new(identity));

        info!(identity_role = %identity_role, roles = ?claimed, "Identity set");
        Ok(())
    }

    pub fn identity(&self) -> Option<&dyn Identity> {
        self.identity.as_deref()
    }

    /// Forget the current identity and its role
    pub fn clear_identity(&mut self) {
        let identity_role = self.config.identity_role.clone();
        if self.roles.has(&identity_role) {
            self.roles.remove(&identity_role).ok();
            self.rules.remove_role(&identity_role);
        }
        if self.identity.take().is_some() {
            info!(identity_role = %identity_role, "Identity cleared");
        }
    }

    /// Check access for the current identity
    pub fn can<'a>(&self, resource: impl Into<ResourceTarget<'a>>, privilege: Option<&str>) -> AclResult<bool> {
        if self.identity.is_none() {
            return Err(AclError::NoIdentity);
        }
        self.is_allowed(Some(&self.config.identity_role), resource, privilege)
    }

    // --- Roles ----------------------------------------------------------

    /// Add a role inheriting from `parents`; the last parent has the highest
    /// priority
    pub fn add_role(&mut self, role: &str, parents: &[&str]) -> AclResult<()> {
        if role == self.config.identity_role {
            return Err(AclError::InvalidIdentifier {
                message: format!("role id '{role}' is reserved for the identity"),
            });
        }
        self.roles.add(role, parents)?;
        debug!(role = %role, parents = ?parents, "Role added");
        Ok(())
    }

    pub fn role(&self, role: &str) -> AclResult<&Role> {
        self.roles.get(role)
    }

    /// Registered role ids in registration order
    pub fn roles(&self) -> Vec<String> {
        self.roles.ids()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.has(role)
    }

    pub fn role_parents(&self, role: &str) -> AclResult<&[String]> {
        self.roles.parents(role)
    }

    pub fn inherits_role(&self, role: &str, inherit: &str, only_parents: bool) -> AclResult<bool> {
        self.roles.inherits(role, inherit, only_parents)
    }

    /// Remove a role and every rule scoped to it
    pub fn remove_role(&mut self, role: &str) -> AclResult<()> {
        self.roles.remove(role)?;
        self.rules.remove_role(role);

        if role == self.config.identity_role {
            self.identity = None;
        }

        debug!(role = %role, "Role removed");
        Ok(())
    }

    /// Remove every role and every role-scoped rule
    pub fn remove_all_roles(&mut self) {
        self.roles.remove_all();
        self.rules.remove_all_roles();
        self.identity = None;
        debug!("All roles removed");
    }

    // --- Resources ------------------------------------------------------

    pub fn add_resource(&mut self, resource: &str, parent: Option<&str>) -> AclResult<()> {
        self.resources.add(resource, parent)?;
        debug!(resource = %resource, parent = ?parent, "Resource added");
        Ok(())
    }

    pub fn resource<R: ResourceRef + ?Sized>(&self, resource: &R) -> AclResult<&Resource> {
        self.resources.get(resource.resource_id())
    }

    /// Registered resource ids in registration order
    pub fn resources(&self) -> Vec<String> {
        self.resources.ids()
    }

    /// Direct children of a resource
    pub fn resource_children<R: ResourceRef + ?Sized>(&self, resource: &R) -> AclResult<&[String]> {
        self.resources.children(resource.resource_id())
    }

    pub fn has_resource<R: ResourceRef + ?Sized>(&self, resource: &R) -> bool {
        self.resources.has(resource.resource_id())
    }

    pub fn inherits_resource<R, I>(&self, resource: &R, inherit: &I, only_parent: bool) -> AclResult<bool>
    where
        R: ResourceRef + ?Sized,
        I: ResourceRef + ?Sized,
    {
        self.resources.inherits(resource.resource_id(), inherit.resource_id(), only_parent)
    }

    /// Remove a resource, its descendants and every rule scoped to them
    pub fn remove_resource<R: ResourceRef + ?Sized>(&mut self, resource: &R) -> AclResult<()> {
        let removed = self.resources.remove(resource.resource_id())?;
        self.rules.remove_resources(&removed);
        debug!(resource = %resource.resource_id(), removed = ?removed, "Resource removed");
        Ok(())
    }

    /// Remove every resource and every resource-scoped rule
    pub fn remove_all_resources(&mut self) {
        self.rules.remove_all_resources();
        self.resources.remove_all();
        debug!("All resources removed");
    }

    // --- Rules ----------------------------------------------------------

    /// Add an allow rule. `Targets::All` on any axis means every role,
    /// resource or privilege; all three together address the default rule.
    pub fn allow(&mut self, roles: impl Into<Targets>, resources: impl Into<Targets>, privileges: impl Into<Targets>, assertion: Option<Arc<dyn Assertion>>) -> AclResult<()> {
        self.set_rule(Operation::Add, Effect::Allow, roles.into(), resources.into(), privileges.into(), assertion)
    }

    /// Add a deny rule
    pub fn deny(&mut self, roles: impl Into<Targets>, resources: impl Into<Targets>, privileges: impl Into<Targets>, assertion: Option<Arc<dyn Assertion>>) -> AclResult<()> {
        self.set_rule(Operation::Add, Effect::Deny, roles.into(), resources.into(), privileges.into(), assertion)
    }

    /// Remove allow rules. A no-op where no matching allow rule exists.
    pub fn remove_allow(&mut self, roles: impl Into<Targets>, resources: impl Into<Targets>, privileges: impl Into<Targets>) -> AclResult<()> {
        self.set_rule(Operation::Remove, Effect::Allow, roles.into(), resources.into(), privileges.into(), None)
    }

    /// Remove deny rules
    pub fn remove_deny(&mut self, roles: impl Into<Targets>, resources: impl Into<Targets>, privileges: impl Into<Targets>) -> AclResult<()> {
        self.set_rule(Operation::Remove, Effect::Deny, roles.into(), resources.into(), privileges.into(), None)
    }

    /// Add or remove rules for every (resource, role) pair the targets
    /// expand to.
    ///
    /// A named resource also covers all of its descendants. `Targets::All`
    /// resources cover the all-resources scope plus every registered
    /// resource. All targets are validated before anything is written.
    pub fn set_rule(&mut self, operation: Operation, effect: Effect, roles: Targets, resources: Targets, privileges: Targets, assertion: Option<Arc<dyn Assertion>>) -> AclResult<()> {
        let role_scopes = self.role_scopes(roles)?;
        let resource_scopes = self.resource_scopes(resources)?;
        let privileges = match privileges {
            Targets::All => Vec::new(),
            Targets::Only(privileges) => privileges,
        };

        for resource in &resource_scopes {
            for role in &role_scopes {
                match operation {
                    Operation::Add => self.rules.add(resource.as_id(), role.as_id(), &privileges, effect, assertion.clone()),
                    Operation::Remove => self.rules.remove(resource.as_id(), role.as_id(), &privileges, effect),
                }
            }
        }

        debug!(
            operation = ?operation,
            effect = %effect,
            roles = role_scopes.len(),
            resources = resource_scopes.len(),
            privileges = ?privileges,
            has_assertion = assertion.is_some(),
            "Rules updated"
        );

        Ok(())
    }

    fn role_scopes(&self, roles: Targets) -> AclResult<Vec<Scope>> {
        match roles {
            Targets::All => Ok(vec![Scope::All]),
            Targets::Only(ids) if ids.is_empty() => Ok(vec![Scope::All]),
            Targets::Only(ids) => ids
                .into_iter()
                .map(|id| -> AclResult<Scope> {
                    self.roles.get(&id)?;
                    Ok(Scope::Id(id))
                })
                .collect(),
        }
    }

    fn resource_scopes(&self, resources: Targets) -> AclResult<Vec<Scope>> {
        match resources {
            Targets::All => {
                let mut scopes = vec![Scope::All];
                scopes.extend(self.resources.ids().into_iter().map(Scope::Id));
                Ok(scopes)
            }
            Targets::Only(ids) if ids.is_empty() => Ok(vec![Scope::All]),
            Targets::Only(ids) => {
                let mut seen = HashSet::new();
                let mut scopes = Vec::new();
                for id in ids {
                    let mut expanded = self.resources.descendants(&id)?;
                    expanded.push(id);
                    for resource in expanded {
                        if seen.insert(resource.clone()) {
                            scopes.push(Scope::Id(resource));
                        }
                    }
                }
                Ok(scopes)
            }
        }
    }
}
