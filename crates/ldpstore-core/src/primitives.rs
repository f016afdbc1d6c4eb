//! # Innate Primitives
//!
//! Hardcoded constants and term tables for the resource engine.
//!
//! These tables are compiled into the binary and immutable at runtime. The
//! resource engine consults them; nothing ever writes to them.

use crate::vocab::{RDF_TYPE, ebucore, fcrepo, fcsystem, iana, ldp, premis};
use oxigraph::model::{NamedNodeRef, Term, Triple};

/// UID of the repository root.
pub const ROOT_UID: &str = "/";

/// Path segment under which version snapshots of a resource are stored.
pub const VERSIONS_LABEL: &str = "fcr:versions";

/// Actor stamped on writes when the configuration names none.
pub const DEFAULT_USER: &str = "BypassAdmin";

/// Mimetype assumed for binary streams provided without one.
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Magic bytes prefixing every stored resource record.
pub const MAGIC_BYTES: &[u8; 4] = b"LDPR";

/// Stored record format version.
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on a single stored resource record.
pub const MAX_RECORD_SIZE: usize = 64 * 1024 * 1024;

// =============================================================================
// BASE TYPES
// =============================================================================

/// RDF types populating every live resource.
pub const BASE_TYPES: &[NamedNodeRef<'static>] = &[fcrepo::RESOURCE, ldp::RESOURCE];

/// Extra base types of RDF sources.
pub const RDF_SOURCE_TYPES: &[NamedNodeRef<'static>] = &[ldp::RDF_SOURCE];

/// Extra base types of every container variant.
pub const CONTAINER_TYPES: &[NamedNodeRef<'static>] = &[fcrepo::CONTAINER, ldp::CONTAINER];

/// Extra base types of non-RDF sources.
pub const NON_RDF_SOURCE_TYPES: &[NamedNodeRef<'static>] = &[fcrepo::BINARY, ldp::NON_RDF_SOURCE];

// =============================================================================
// PROTECTED AND NON-VERSIONED TERMS
// =============================================================================

/// Predicates whose triples survive a replace.
pub const PROTECTED_PREDICATES: &[NamedNodeRef<'static>] =
    &[fcrepo::CREATED, fcrepo::CREATED_BY, ldp::CONTAINS];

/// Predicates never copied into a version snapshot.
pub const NON_VERSIONED_PREDICATES: &[NamedNodeRef<'static>] = &[
    fcrepo::HAS_PARENT,
    fcrepo::HAS_VERSIONS,
    fcrepo::HAS_VERSION,
    premis::HAS_MESSAGE_DIGEST,
    ldp::CONTAINS,
];

/// `rdf:type` objects never copied into a version snapshot.
pub const NON_VERSIONED_TYPES: &[NamedNodeRef<'static>] = &[
    fcrepo::BINARY,
    fcrepo::CONTAINER,
    fcrepo::PAIRTREE,
    fcrepo::RESOURCE,
    fcrepo::VERSION,
    ldp::BASIC_CONTAINER,
    ldp::CONTAINER,
    ldp::DIRECT_CONTAINER,
    ldp::RESOURCE,
    ldp::RDF_SOURCE,
    ldp::NON_RDF_SOURCE,
];

/// Version links kept by the store when a resource is truncated for replace.
pub const VERSION_LINK_PREDICATES: &[NamedNodeRef<'static>] =
    &[fcrepo::HAS_VERSION, fcrepo::HAS_VERSIONS];

/// Predicates hidden from the output graph.
pub const OUTPUT_HIDDEN_PREDICATES: &[NamedNodeRef<'static>] =
    &[fcrepo::HAS_VERSION, premis::HAS_MESSAGE_DIGEST];

/// Predicates that belong to the administrative (metadata) subset of a resource.
/// All `rdf:type` triples are metadata as well.
pub const METADATA_PREDICATES: &[NamedNodeRef<'static>] = &[
    fcrepo::CREATED,
    fcrepo::CREATED_BY,
    fcrepo::LAST_MODIFIED,
    fcrepo::LAST_MODIFIED_BY,
    fcrepo::HAS_PARENT,
    fcrepo::HAS_VERSIONS,
    premis::HAS_MESSAGE_DIGEST,
    premis::HAS_SIZE,
    ebucore::HAS_MIME_TYPE,
    fcsystem::TOMBSTONE,
    fcsystem::BURIED,
    ldp::MEMBERSHIP_RESOURCE,
    ldp::HAS_MEMBER_RELATION,
    ldp::INSERTED_CONTENT_RELATION,
];

/// Triples with these predicates mark a tombstone and are stripped on resurrection.
pub const TOMBSTONE_PREDICATES: &[NamedNodeRef<'static>] = &[fcsystem::TOMBSTONE, fcsystem::BURIED];

/// Structural links left in place when inbound references are cut on burial.
pub const STRUCTURAL_PREDICATES: &[NamedNodeRef<'static>] = &[ldp::CONTAINS, fcrepo::HAS_PARENT];

// =============================================================================
// SERVER-MANAGED TERMS
// =============================================================================

/// Subjects a client may never write.
pub const SRV_MGD_SUBJECTS: &[NamedNodeRef<'static>] = &[fcsystem::ROOT];

/// Predicates a client may never write.
pub const SRV_MGD_PREDICATES: &[NamedNodeRef<'static>] = &[
    ebucore::HAS_MIME_TYPE,
    fcrepo::CREATED,
    fcrepo::CREATED_BY,
    fcrepo::HAS_PARENT,
    fcrepo::HAS_VERSION,
    fcrepo::HAS_VERSIONS,
    fcrepo::HAS_VERSION_LABEL,
    fcrepo::LAST_MODIFIED,
    fcrepo::LAST_MODIFIED_BY,
    fcsystem::TOMBSTONE,
    fcsystem::BURIED,
    iana::DESCRIBED_BY,
    ldp::CONTAINS,
    premis::HAS_MESSAGE_DIGEST,
    premis::HAS_SIZE,
];

/// `rdf:type` objects a client may never write.
pub const SRV_MGD_TYPES: &[NamedNodeRef<'static>] = &[
    fcrepo::BINARY,
    fcrepo::CONTAINER,
    fcrepo::PAIRTREE,
    fcrepo::RESOURCE,
    fcrepo::VERSION,
    fcsystem::TOMBSTONE_TYPE,
    ldp::BASIC_CONTAINER,
    ldp::CONTAINER,
    ldp::DIRECT_CONTAINER,
    ldp::INDIRECT_CONTAINER,
    ldp::NON_RDF_SOURCE,
    ldp::RDF_SOURCE,
    ldp::RESOURCE,
];

/// Server-managed types a client may assert while the resource is being created.
pub const SMT_ALLOW_ON_CREATE: &[NamedNodeRef<'static>] =
    &[ldp::DIRECT_CONTAINER, ldp::INDIRECT_CONTAINER];

// =============================================================================
// TERM HELPERS
// =============================================================================

/// Whether `term` is the IRI `iri`.
#[must_use]
pub fn is_iri(term: &Term, iri: NamedNodeRef<'_>) -> bool {
    matches!(term, Term::NamedNode(n) if n.as_ref() == iri)
}

/// Whether a table contains the given IRI.
#[must_use]
pub fn in_table(table: &[NamedNodeRef<'static>], iri: NamedNodeRef<'_>) -> bool {
    table.iter().any(|t| *t == iri)
}

/// Whether a triple is an `rdf:type` assertion whose object is in `table`.
#[must_use]
pub fn is_type_in(triple: &Triple, table: &[NamedNodeRef<'static>]) -> bool {
    triple.predicate.as_ref() == RDF_TYPE
        && matches!(&triple.object, Term::NamedNode(n) if in_table(table, n.as_ref()))
}

/// Whether a triple is server-managed (managed predicate or managed type).
#[must_use]
pub fn is_trp_managed(triple: &Triple) -> bool {
    in_table(SRV_MGD_PREDICATES, triple.predicate.as_ref()) || is_type_in(triple, SRV_MGD_TYPES)
}

/// Whether a triple is excluded from version snapshots.
#[must_use]
pub fn is_unversioned(triple: &Triple) -> bool {
    in_table(NON_VERSIONED_PREDICATES, triple.predicate.as_ref())
        || is_type_in(triple, NON_VERSIONED_TYPES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode};

    fn triple(p: NamedNodeRef<'_>, o: Term) -> Triple {
        Triple::new(NamedNode::new_unchecked("info:fcres/a"), p.into_owned(), o)
    }

    #[test]
    fn protected_predicates_are_server_managed() {
        for p in PROTECTED_PREDICATES {
            assert!(in_table(SRV_MGD_PREDICATES, *p));
        }
    }

    #[test]
    fn managed_type_detected() {
        let t = triple(RDF_TYPE, ldp::CONTAINER.into_owned().into());
        assert!(is_trp_managed(&t));
        let user = triple(RDF_TYPE, NamedNode::new_unchecked("urn:type:Book").into());
        assert!(!is_trp_managed(&user));
    }

    #[test]
    fn indirect_container_type_is_versioned() {
        let t = triple(RDF_TYPE, ldp::INDIRECT_CONTAINER.into_owned().into());
        assert!(!is_unversioned(&t));
        let d = triple(RDF_TYPE, ldp::DIRECT_CONTAINER.into_owned().into());
        assert!(is_unversioned(&d));
    }

    #[test]
    fn digest_is_not_versioned() {
        let t = triple(premis::HAS_MESSAGE_DIGEST, Literal::new_simple_literal("x").into());
        assert!(is_unversioned(&t));
    }
}
