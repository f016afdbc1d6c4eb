//! # Vocabulary
//!
//! Namespace terms used by the repository, as compile-time constants.

use oxigraph::model::NamedNodeRef;

pub use oxigraph::model::vocab::rdf::TYPE as RDF_TYPE;
pub use oxigraph::model::vocab::xsd::{DATE_TIME as XSD_DATE_TIME, LONG as XSD_LONG};

/// Namespace of internal resource URIs. A resource URI is this prefix + UID.
pub const FCRES: &str = "info:fcres";

/// Linked Data Platform namespace.
pub mod ldp {
    use super::NamedNodeRef;

    pub const NS: &str = "http://www.w3.org/ns/ldp#";

    pub const RESOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Resource");
    pub const RDF_SOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#RDFSource");
    pub const NON_RDF_SOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#NonRDFSource");
    pub const CONTAINER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Container");
    pub const BASIC_CONTAINER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#BasicContainer");
    pub const DIRECT_CONTAINER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#DirectContainer");
    pub const INDIRECT_CONTAINER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#IndirectContainer");

    pub const CONTAINS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#contains");
    pub const MEMBER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#member");
    pub const MEMBER_SUBJECT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#memberSubject");
    pub const MEMBERSHIP_RESOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#membershipResource");
    pub const HAS_MEMBER_RELATION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#hasMemberRelation");
    pub const INSERTED_CONTENT_RELATION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#insertedContentRelation");
}

/// Fedora repository namespace.
pub mod fcrepo {
    use super::NamedNodeRef;

    pub const RESOURCE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#Resource");
    pub const CONTAINER: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#Container");
    pub const BINARY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#Binary");
    pub const PAIRTREE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#Pairtree");
    pub const VERSION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#Version");
    pub const REPOSITORY_ROOT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#RepositoryRoot");

    pub const CREATED: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#created");
    pub const CREATED_BY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#createdBy");
    pub const LAST_MODIFIED: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#lastModified");
    pub const LAST_MODIFIED_BY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#lastModifiedBy");
    pub const HAS_PARENT: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#hasParent");
    pub const HAS_VERSION: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#hasVersion");
    pub const HAS_VERSIONS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#hasVersions");
    pub const HAS_VERSION_LABEL: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://fedora.info/definitions/v4/repository#hasVersionLabel");
}

/// Internal system namespace (tombstones, system subjects).
pub mod fcsystem {
    use super::NamedNodeRef;

    pub const ROOT: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("info:fcsystem/root");
    pub const TOMBSTONE_TYPE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("info:fcsystem/Tombstone");
    pub const TOMBSTONE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("info:fcsystem/tombstone");
    pub const BURIED: NamedNodeRef<'static> = NamedNodeRef::new_unchecked("info:fcsystem/buried");
}

/// PREMIS preservation metadata.
pub mod premis {
    use super::NamedNodeRef;

    pub const HAS_MESSAGE_DIGEST: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.loc.gov/premis/rdf/v1#hasMessageDigest");
    pub const HAS_SIZE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.loc.gov/premis/rdf/v1#hasSize");
}

/// EBUCore technical metadata.
pub mod ebucore {
    use super::NamedNodeRef;

    pub const HAS_MIME_TYPE: NamedNodeRef<'static> = NamedNodeRef::new_unchecked(
        "http://www.ebu.ch/metadata/ontologies/ebucore/ebucore#hasMimeType",
    );
}

/// IANA link relations.
pub mod iana {
    use super::NamedNodeRef;

    pub const DESCRIBED_BY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.iana.org/assignments/relation/describedby");
}
