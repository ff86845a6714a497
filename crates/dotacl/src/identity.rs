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

//! Current principal of an ACL

/// A principal that claims a set of registered roles
pub trait Identity: Send + Sync {
    /// Ids of the roles this identity holds, highest priority last
    fn roles(&self) -> Vec<String>;
}

/// Identity with a fixed role list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity {
    pub name: String,
    pub roles: Vec<String>,
}

impl StaticIdentity {
    pub fn new(name: impl Into<String>, roles: &[&str]) -> Self {
        Self {
            name: name.into(),
            roles: roles.iter().map(|role| role.to_string()).collect(),
        }
    }
}

impl Identity for StaticIdentity {
    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}
