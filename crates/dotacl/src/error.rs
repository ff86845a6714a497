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

//! Error types for ACL operations

use thiserror::Error;

/// Errors raised by registry, rule and query operations
#[derive(Error, Debug)]
pub enum AclError {
    #[error("Role '{id}' already exists in the registry")]
    DuplicateRole { id: String },

    #[error("Resource '{id}' already exists in the ACL")]
    DuplicateResource { id: String },

    #[error("Role '{id}' not found")]
    UnknownRole { id: String },

    #[error("Resource '{id}' not found")]
    UnknownResource { id: String },

    #[error("Parent '{parent}' for '{id}' does not exist")]
    UnknownParent { id: String, parent: String },

    #[error("Invalid identifier: {message}")]
    InvalidIdentifier { message: String },

    #[error("Invalid identity: {message}")]
    InvalidIdentity { message: String },

    #[error("No identity has been set")]
    NoIdentity,

    #[error("Unsupported rule effect '{value}'")]
    InvalidEffect { value: String },

    #[error("Unsupported rule operation '{value}'")]
    UnknownOperation { value: String },

    #[error("Assertion failed to evaluate: {0}")]
    Assertion(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AclError {
    /// Wrap an error raised inside a caller-supplied assertion
    pub fn assertion<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        AclError::Assertion(error.into())
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            AclError::DuplicateRole { .. } | AclError::DuplicateResource { .. } => "duplicate_entity",
            AclError::UnknownRole { .. } | AclError::UnknownResource { .. } | AclError::UnknownParent { .. } => "unknown_entity",
            AclError::InvalidIdentifier { .. } => "invalid_identifier",
            AclError::InvalidIdentity { .. } => "invalid_identity",
            AclError::NoIdentity => "no_identity",
            AclError::InvalidEffect { .. } => "invalid_effect",
            AclError::UnknownOperation { .. } => "unknown_operation",
            AclError::Assertion(_) => "assertion",
        }
    }
}

/// Result type for ACL operations
pub type AclResult<T> = Result<T, AclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = AclError::DuplicateRole { id: "admin".to_string() };
        assert_eq!(err.error_type(), "duplicate_entity");
        assert_eq!(err.to_string(), "Role 'admin' already exists in the registry");

        let err = AclError::UnknownParent {
            id: "child".to_string(),
            parent: "ghost".to_string(),
        };
        assert_eq!(err.error_type(), "unknown_entity");
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_assertion_error_keeps_source() {
        let err = AclError::assertion("clock unavailable");
        assert_eq!(err.error_type(), "assertion");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Assertion failed to evaluate: clock unavailable");
    }
}
