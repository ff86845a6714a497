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

//! Runtime assertions gating whether a stored rule applies

use crate::acl::Acl;
use crate::error::AclResult;
use crate::identity::Identity;
use crate::resources::ResourceTarget;
use std::fmt;
use std::sync::Arc;

/// Role an assertion is evaluated for
#[derive(Clone, Copy)]
pub enum Subject<'a> {
    /// A role from the registry
    Role(&'a str),

    /// The current identity, when the query runs through [`Acl::can`]
    Identity(&'a dyn Identity),
}

impl<'a> Subject<'a> {
    pub fn role_id(&self) -> Option<&'a str> {
        match *self {
            Subject::Role(id) => Some(id),
            Subject::Identity(_) => None,
        }
    }

    pub fn identity(&self) -> Option<&'a dyn Identity> {
        match *self {
            Subject::Role(_) => None,
            Subject::Identity(identity) => Some(identity),
        }
    }
}

impl fmt::Debug for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Role(id) => f.debug_tuple("Role").field(id).finish(),
            Subject::Identity(identity) => f.debug_tuple("Identity").field(&identity.roles()).finish(),
        }
    }
}

/// Everything an assertion gets to look at
#[derive(Debug, Clone, Copy)]
pub struct AssertionContext<'a> {
    /// The ACL being queried
    pub acl: &'a Acl,

    /// Role owning the rule under evaluation, `None` for the all-roles scope
    pub role: Option<Subject<'a>>,

    /// Resource from the query as the caller passed it, or the scope of the
    /// rule when the query targeted every resource
    pub resource: ResourceTarget<'a>,

    /// Privilege of the rule, `None` for the all-privileges rule
    pub privilege: Option<&'a str>,
}

/// Predicate that must hold for a rule to apply.
///
/// Assertions run on every query that reaches their rule and are never cached.
/// Errors propagate to the caller of the query unchanged.
pub trait Assertion: Send + Sync {
    fn assert(&self, context: &AssertionContext<'_>) -> AclResult<bool>;
}

/// Assertion backed by a closure
pub struct FnAssertion<F> {
    f: F,
}

impl<F> Assertion for FnAssertion<F>
where
    F: Fn(&AssertionContext<'_>) -> AclResult<bool> + Send + Sync,
{
    fn assert(&self, context: &AssertionContext<'_>) -> AclResult<bool> {
        (self.f)(context)
    }
}

/// Build a shareable assertion from a closure
pub fn assertion_fn<F>(f: F) -> Arc<dyn Assertion>
where
    F: Fn(&AssertionContext<'_>) -> AclResult<bool> + Send + Sync + 'static,
{
    Arc::new(FnAssertion { f })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_assertion_sees_context() {
        let acl = Acl::new();
        let assertion = assertion_fn(|ctx| Ok(ctx.privilege == Some("read") && ctx.role.and_then(|r| r.role_id()) == Some("guest")));

        let context = AssertionContext {
            acl: &acl,
            role: Some(Subject::Role("guest")),
            resource: ResourceTarget::Id("page"),
            privilege: Some("read"),
        };
        assert!(assertion.assert(&context).unwrap());

        let context = AssertionContext { privilege: Some("write"), ..context };
        assert!(!assertion.assert(&context).unwrap());
    }

    #[test]
    fn test_subject_accessors() {
        let subject = Subject::Role("editor");
        assert_eq!(subject.role_id(), Some("editor"));
        assert!(subject.identity().is_none());
    }
}
