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

//! Configuration for an ACL instance

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Role id reserved for the synthetic identity role
pub const DEFAULT_IDENTITY_ROLE: &str = "dotacl.identity";

const DEFAULT_SLOW_CHECK_MICROS: u64 = 5_000;

/// Configuration for an ACL instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclConfig {
    /// Id of the role created for the current identity
    pub identity_role: String,

    /// Decisions slower than this are logged as warnings
    pub slow_check_threshold: Duration,

    /// Emit a debug event for every access decision
    pub log_decisions: bool,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            identity_role: DEFAULT_IDENTITY_ROLE.to_string(),
            slow_check_threshold: Duration::from_micros(DEFAULT_SLOW_CHECK_MICROS),
            log_decisions: true,
        }
    }
}

impl AclConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            identity_role: env::var("DOTACL_IDENTITY_ROLE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IDENTITY_ROLE.to_string()),

            slow_check_threshold: Duration::from_micros(
                env::var("DOTACL_SLOW_CHECK_MICROS")
                    .map(|v| v.parse().unwrap_or(DEFAULT_SLOW_CHECK_MICROS))
                    .unwrap_or(DEFAULT_SLOW_CHECK_MICROS),
            ),

            log_decisions: env::var("DOTACL_LOG_DECISIONS").map(|v| v.parse().unwrap_or(true)).unwrap_or(true),
        }
    }

    /// Override the identity role id
    pub fn with_identity_role(mut self, identity_role: impl Into<String>) -> Self {
        self.identity_role = identity_role.into();
        self
    }

    /// Override the slow decision threshold
    pub fn with_slow_check_threshold(mut self, threshold: Duration) -> Self {
        self.slow_check_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AclConfig::default();
        assert_eq!(config.identity_role, "dotacl.identity");
        assert_eq!(config.slow_check_threshold, Duration::from_millis(5));
        assert!(config.log_decisions);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AclConfig::default().with_identity_role("me").with_slow_check_threshold(Duration::from_millis(1));
        assert_eq!(config.identity_role, "me");
        assert_eq!(config.slow_check_threshold, Duration::from_millis(1));
    }

    #[test]
    fn test_config_serializes() {
        let config = AclConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AclConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
