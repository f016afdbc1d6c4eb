//! # Core Type Definitions
//!
//! This module contains the small vocabulary shared by every layer of the
//! resource engine:
//! - Resource variant tag (`LdpVariant`)
//! - Payload handling and referential integrity modes (`Handling`, `RefIntMode`)
//! - Change event kinds (`EventKind`)
//! - Error types (`LdpError`, `TermAxis`)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// RESOURCE VARIANT
// =============================================================================

/// The LDP interaction model of a resource.
///
/// One resource type carries this tag; behavior that differs between
/// variants (base types, membership propagation) matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LdpVariant {
    /// Binary content described by an RDF metadata graph.
    NonRdfSource,
    /// Plain RDF source that is not a container.
    RdfSource,
    /// `ldp:BasicContainer`.
    BasicContainer,
    /// `ldp:DirectContainer`: children become members of a membership resource.
    DirectContainer,
    /// `ldp:IndirectContainer`: members are taken from the child payload.
    IndirectContainer,
}

impl LdpVariant {
    /// Whether the variant is an RDF source (any container included).
    #[must_use]
    pub const fn is_rdf_source(self) -> bool {
        !matches!(self, Self::NonRdfSource)
    }

    /// Whether the variant is any kind of container.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::BasicContainer | Self::DirectContainer | Self::IndirectContainer
        )
    }

    /// Whether children of this container propagate membership triples.
    #[must_use]
    pub const fn propagates_membership(self) -> bool {
        matches!(self, Self::DirectContainer | Self::IndirectContainer)
    }
}

impl fmt::Display for LdpVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NonRdfSource => "LdpNr",
            Self::RdfSource => "LdpRs",
            Self::BasicContainer => "LdpBc",
            Self::DirectContainer => "LdpDc",
            Self::IndirectContainer => "LdpIc",
        };
        f.write_str(name)
    }
}

// =============================================================================
// HANDLING MODES
// =============================================================================

/// How server-managed terms found in a client payload are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handling {
    /// Reject the payload with `LdpError::ServerManagedTerm`.
    #[default]
    Strict,
    /// Strip offending triples and continue.
    Lenient,
    /// No check at all. Reserved for trusted internal writes.
    None,
}

/// Referential integrity enforcement applied to internal links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefIntMode {
    /// Links to missing resources are stored as provided.
    #[default]
    Off,
    /// Links to missing resources are silently dropped.
    Lenient,
    /// Links to missing resources fail the write.
    Strict,
}

impl RefIntMode {
    /// Whether any enforcement is configured.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

// =============================================================================
// EVENT KIND
// =============================================================================

/// Kind of a committed change, as recorded in the changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A resource came into existence (or was resurrected).
    Created,
    /// A live resource changed.
    Updated,
    /// A resource was buried or forgotten.
    Deleted,
}

impl EventKind {
    /// Wire label used by message consumers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "_create_",
            Self::Updated => "_update_",
            Self::Deleted => "_delete_",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Axis on which a server-managed term was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermAxis {
    Subject,
    Predicate,
    Type,
}

impl fmt::Display for TermAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Type => "RDF type",
        };
        f.write_str(name)
    }
}

/// Errors raised by the resource engine.
///
/// - Every error is raised synchronously to the immediate caller
/// - Nothing in this crate retries; lenient sanitization is opt-in via `Handling`
/// - A collaborator failure mid-write propagates so the request is rolled back
#[derive(Debug, Error)]
pub enum LdpError {
    /// The UID is malformed or the operation does not apply to this resource.
    #[error("Invalid resource {uid}: {reason}")]
    InvalidResource { uid: String, reason: String },

    /// A resource already lives at this UID.
    #[error("Resource already exists: {0}")]
    ResourceExists(String),

    /// Nothing is stored at this UID.
    #[error("Resource not found: {0}")]
    ResourceNotExists(String),

    /// The resource (or the ancestor it points to) was buried.
    #[error("Resource {uid} is a tombstone{}", buried.as_ref().map(|b| format!(" (buried {b})")).unwrap_or_default())]
    Tombstone { uid: String, buried: Option<String> },

    /// Attempt to switch an existing resource between RDF and non-RDF kinds.
    #[error("Incompatible LDP type for {uid} (mimetype: {})", mimetype.as_deref().unwrap_or("none"))]
    IncompatibleLdpType {
        uid: String,
        mimetype: Option<String>,
    },

    /// A client payload carried server-managed terms under strict handling.
    #[error("Server-managed {axis} terms in payload: {}", terms.join(", "))]
    ServerManagedTerm { terms: Vec<String>, axis: TermAxis },

    /// A payload links to an internal resource that does not exist.
    #[error("Referential integrity violation: {0} does not exist")]
    RefIntViolation(String),

    /// A serialized RDF payload could not be decoded.
    #[error("Error parsing {format} data: {reason}")]
    RdfParsing { format: String, reason: String },

    /// The provided payload is inconsistent (e.g. mimetype without stream).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A SPARQL Update is malformed or reaches outside its resource.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Repository settings could not be read.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system access outside the stores failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl LdpError {
    /// Shorthand for `InvalidResource`.
    pub fn invalid(uid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResource {
            uid: uid.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error means "there is no live resource here".
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::ResourceNotExists(_) | Self::Tombstone { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_classification() {
        assert!(!LdpVariant::NonRdfSource.is_rdf_source());
        assert!(LdpVariant::RdfSource.is_rdf_source());
        assert!(!LdpVariant::RdfSource.is_container());
        assert!(LdpVariant::BasicContainer.is_container());
        assert!(!LdpVariant::BasicContainer.propagates_membership());
        assert!(LdpVariant::DirectContainer.propagates_membership());
        assert!(LdpVariant::IndirectContainer.propagates_membership());
    }

    #[test]
    fn defaults_are_conservative() {
        assert_eq!(Handling::default(), Handling::Strict);
        assert_eq!(RefIntMode::default(), RefIntMode::Off);
        assert!(!RefIntMode::Off.is_enabled());
        assert!(RefIntMode::Lenient.is_enabled());
    }

    #[test]
    fn tombstone_error_names_ancestor() {
        let err = LdpError::Tombstone {
            uid: "/a/b".into(),
            buried: Some("2024-01-01T00:00:00Z".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/b"));
        assert!(msg.contains("buried"));
        assert!(err.is_gone());
    }

    #[test]
    fn server_managed_error_lists_terms() {
        let err = LdpError::ServerManagedTerm {
            terms: vec!["<urn:a>".into(), "<urn:b>".into()],
            axis: TermAxis::Predicate,
        };
        assert_eq!(
            err.to_string(),
            "Server-managed predicate terms in payload: <urn:a>, <urn:b>"
        );
    }

    #[test]
    fn event_kind_labels() {
        assert_eq!(EventKind::Created.to_string(), "_create_");
        assert_eq!(EventKind::Deleted.as_str(), "_delete_");
    }
}
