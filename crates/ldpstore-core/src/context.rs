//! # Request Context
//!
//! The explicit environment of one request: store handle, binary sink,
//! changelog, configuration, and the request timestamp stamped on every
//! write. Every engine operation takes it as an argument.

use crate::config::RepoConfig;
use crate::notifier::Changelog;
use crate::rdf::datetime_literal;
use crate::store::{BinaryStore, ResourceStore};
use chrono::{DateTime, Utc};
use oxigraph::model::Literal;

/// Environment of one request.
pub struct Context<'a> {
    pub store: &'a mut dyn ResourceStore,
    pub binaries: &'a mut dyn BinaryStore,
    pub changelog: &'a mut Changelog,
    pub config: &'a RepoConfig,
    /// Request timestamp. Every write of the request shares it.
    pub timestamp: DateTime<Utc>,
}

impl<'a> Context<'a> {
    pub fn new(
        store: &'a mut dyn ResourceStore,
        binaries: &'a mut dyn BinaryStore,
        changelog: &'a mut Changelog,
        config: &'a RepoConfig,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            binaries,
            changelog,
            config,
            timestamp,
        }
    }

    /// The request timestamp as an `xsd:dateTime` literal.
    #[must_use]
    pub fn timestamp_term(&self) -> Literal {
        datetime_literal(&self.timestamp)
    }

    /// The acting user as a literal.
    #[must_use]
    pub fn actor(&self) -> Literal {
        Literal::new_simple_literal(self.config.default_user.as_str())
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("timestamp", &self.timestamp)
            .field("pending_events", &self.changelog.len())
            .finish_non_exhaustive()
    }
}
