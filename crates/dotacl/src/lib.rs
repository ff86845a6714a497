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

//! Dotlanth access control
//!
//! Role-based access control lists with hierarchical roles, hierarchical
//! resources, allow/deny rules scoped per privilege and optional runtime
//! assertions. Everything is denied until a rule says otherwise.

pub mod acl;
pub mod assertion;
pub mod config;
pub mod error;
pub mod identity;
mod resolver;
pub mod resources;
pub mod roles;
pub mod rules;

pub use acl::Acl;
pub use assertion::{Assertion, AssertionContext, FnAssertion, Subject, assertion_fn};
pub use config::AclConfig;
pub use error::{AclError, AclResult};
pub use identity::{Identity, StaticIdentity};
pub use resources::{Resource, ResourceRef, ResourceTarget};
pub use roles::Role;
pub use rules::{Effect, Operation, Rule, Targets};
