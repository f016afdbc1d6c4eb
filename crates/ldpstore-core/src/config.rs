//! # Repository Configuration
//!
//! Settings consulted by the resource engine at call time. Resources never
//! cache them; every operation reads them from the active `Context`.

use crate::primitives::DEFAULT_USER;
use crate::types::RefIntMode;
use serde::{Deserialize, Serialize};

/// Repository-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Referential integrity enforcement for internal links.
    pub referential_integrity: RefIntMode,
    /// Whether committed changes are appended to the changelog.
    pub messaging: bool,
    /// Actor stamped into `createdBy` / `lastModifiedBy`.
    pub default_user: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            referential_integrity: RefIntMode::Off,
            messaging: true,
            default_user: DEFAULT_USER.to_string(),
        }
    }
}

impl RepoConfig {
    #[must_use]
    pub fn with_referential_integrity(mut self, mode: RefIntMode) -> Self {
        self.referential_integrity = mode;
        self
    }

    #[must_use]
    pub fn with_messaging(mut self, enabled: bool) -> Self {
        self.messaging = enabled;
        self
    }
}
