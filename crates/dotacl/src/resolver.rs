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

//! Access decisions
//!
//! A query walks from the requested resource up to the all-resources scope.
//! At every level the requested role and its ancestors are searched depth
//! first, then the all-roles rules of that level are consulted. The first
//! applicable rule decides.

use crate::acl::Acl;
use crate::assertion::{AssertionContext, Subject};
use crate::error::AclResult;
use crate::identity::Identity;
use crate::resources::ResourceTarget;
use crate::rules::Effect;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Arguments of the query being resolved, as seen by assertions
struct Query<'q> {
    resource: ResourceTarget<'q>,
    identity: Option<&'q dyn Identity>,
}

impl Acl {
    /// Decide whether `role` may exercise `privilege` on `resource`.
    ///
    /// `None` role and [`ResourceTarget::All`] query the all-roles and
    /// all-resources scopes. Without a privilege the answer is true only if
    /// no privilege on the resource is denied to the role.
    ///
    /// Role inheritance is searched depth first with the most recently added
    /// parent visited first, so later parents take precedence over earlier
    /// ones.
    pub fn is_allowed<'a>(&self, role: Option<&str>, resource: impl Into<ResourceTarget<'a>>, privilege: Option<&str>) -> AclResult<bool> {
        let start_time = Instant::now();
        let target = resource.into();

        if let Some(role) = role {
            self.roles.get(role)?;
        }
        let resource_id = match target.id() {
            Some(id) => Some(self.resources.get(id)?.id.as_str()),
            None => None,
        };

        let identity = match (role, self.identity.as_deref()) {
            (Some(role), Some(identity)) if role == self.config.identity_role => Some(identity),
            _ => None,
        };
        let query = Query { resource: target, identity };

        let allowed = match privilege {
            Some(privilege) => self.resolve_privilege(&query, role, resource_id, privilege)?,
            None => self.resolve_all_privileges(&query, role, resource_id)?,
        };

        let duration = start_time.elapsed();
        if duration > self.config.slow_check_threshold {
            warn!(
                role = ?role,
                resource = ?resource_id,
                privilege = ?privilege,
                duration_us = %duration.as_micros(),
                "Slow access check detected"
            );
        }

        if self.config.log_decisions {
            debug!(
                role = ?role,
                resource = ?resource_id,
                privilege = ?privilege,
                allowed = %allowed,
                duration_us = %duration.as_micros(),
                "Access check completed"
            );
        }

        Ok(allowed)
    }

    fn resolve_privilege<'s>(&'s self, query: &Query<'_>, role: Option<&str>, mut resource: Option<&'s str>, privilege: &str) -> AclResult<bool> {
        loop {
            if let Some(role) = role {
                let decision = self.role_dfs(role, |current| {
                    if let Some(effect) = self.rule_type(query, resource, Some(current), Some(privilege))? {
                        return Ok(Some(effect == Effect::Allow));
                    }
                    Ok(self.rule_type(query, resource, Some(current), None)?.map(|effect| effect == Effect::Allow))
                })?;
                if let Some(allowed) = decision {
                    return Ok(allowed);
                }
            }

            if let Some(effect) = self.rule_type(query, resource, None, Some(privilege))? {
                return Ok(effect == Effect::Allow);
            }

            if let Some(effect) = self.rule_type(query, resource, None, None)? {
                let allowed = effect == Effect::Allow;
                // A blanket deny below the root leaves room for an allow
                // further up the tree
                if allowed || resource.is_none() {
                    return Ok(allowed);
                }
            }

            match resource {
                Some(id) => resource = self.resources.parent(id)?,
                // The default rule always resolves at the root
                None => return Ok(false),
            }
        }
    }

    fn resolve_all_privileges<'s>(&'s self, query: &Query<'_>, role: Option<&str>, mut resource: Option<&'s str>) -> AclResult<bool> {
        loop {
            if let Some(role) = role {
                let decision = self.role_dfs(role, |current| self.visit_all_privileges(query, resource, Some(current)))?;
                if let Some(allowed) = decision {
                    return Ok(allowed);
                }
            }

            if let Some(allowed) = self.visit_all_privileges(query, resource, None)? {
                return Ok(allowed);
            }

            match resource {
                Some(id) => resource = self.resources.parent(id)?,
                None => return Ok(false),
            }
        }
    }

    /// Any denied privilege makes the scope deny; otherwise its
    /// all-privileges rule decides
    fn visit_all_privileges(&self, query: &Query<'_>, resource: Option<&str>, role: Option<&str>) -> AclResult<Option<bool>> {
        let Some(rules) = self.rules.rules(resource, role) else {
            return Ok(None);
        };

        for privilege in rules.privileges() {
            if self.rule_type(query, resource, role, Some(privilege))? == Some(Effect::Deny) {
                return Ok(Some(false));
            }
        }

        Ok(self.rule_type(query, resource, role, None)?.map(|effect| effect == Effect::Allow))
    }

    /// Depth-first search over `role` and its ancestors.
    ///
    /// Parents are pushed in declaration order, so the last declared parent is
    /// popped and searched first. Each role is visited at most once even when
    /// reachable through several paths.
    fn role_dfs<F>(&self, role: &str, mut visit: F) -> AclResult<Option<bool>>
    where
        F: FnMut(&str) -> AclResult<Option<bool>>,
    {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![role];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            trace!(role = %current, "Visiting role");
            if let Some(decision) = visit(current)? {
                return Ok(Some(decision));
            }

            stack.extend(self.roles.parents(current)?.iter().map(String::as_str));
        }

        Ok(None)
    }

    /// Effect of the exact (resource, role, privilege) rule, if it applies.
    ///
    /// A failing assertion makes the rule inapplicable, except on the default
    /// rule where it inverts the effect so there is always a fallback.
    fn rule_type(&self, query: &Query<'_>, resource: Option<&str>, role: Option<&str>, privilege: Option<&str>) -> AclResult<Option<Effect>> {
        let Some(rules) = self.rules.rules(resource, role) else {
            return Ok(None);
        };

        let rule = match privilege {
            None => rules.all_privileges(),
            Some(privilege) => rules.privilege(privilege),
        };
        let Some(rule) = rule else {
            return Ok(None);
        };

        let Some(assertion) = &rule.assertion else {
            return Ok(Some(rule.effect));
        };

        let context = AssertionContext {
            acl: self,
            role: match query.identity {
                Some(identity) => Some(Subject::Identity(identity)),
                None => role.map(Subject::Role),
            },
            resource: match query.resource {
                ResourceTarget::All => resource.map_or(ResourceTarget::All, ResourceTarget::Id),
                target => target,
            },
            privilege,
        };

        if assertion.assert(&context)? {
            return Ok(Some(rule.effect));
        }

        trace!(resource = ?resource, role = ?role, privilege = ?privilege, effect = %rule.effect, "Assertion failed");

        if resource.is_none() && role.is_none() && privilege.is_none() {
            Ok(Some(rule.effect.opposite()))
        } else {
            Ok(None)
        }
    }
}
