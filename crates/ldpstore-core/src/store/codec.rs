//! # Resource Record Format
//!
//! Binary serialization of one resource graph for disk-backed stores.
//!
//! Format: Header (5 bytes) + postcard-serialized triples.
//! - 4 bytes: Magic ("LDPR")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded. Triples are
//! written in canonical order so equal graphs produce equal bytes.

use crate::imr::{TripleSet, sorted};
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_RECORD_SIZE};
use crate::types::LdpError;
use oxigraph::model::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
use serde::{Deserialize, Serialize};

const HEADER_SIZE: usize = 5;

// =============================================================================
// RECORD HEADER
// =============================================================================

/// The header preceding every stored record.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), LdpError> {
        if &self.magic != MAGIC_BYTES {
            return Err(LdpError::Serialization("Invalid magic bytes".to_string()));
        }
        if self.version != FORMAT_VERSION {
            return Err(LdpError::Serialization(format!(
                "Unsupported record version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LdpError> {
        if bytes.len() < HEADER_SIZE {
            return Err(LdpError::Serialization("Record too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for RecordHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// STORED TERMS
// =============================================================================

/// Serializable mirror of an RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum StoredTerm {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        datatype: String,
        lang: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredTriple {
    subject: StoredTerm,
    predicate: String,
    object: StoredTerm,
}

fn encode_subject(subject: &Subject) -> Result<StoredTerm, LdpError> {
    match subject {
        Subject::NamedNode(n) => Ok(StoredTerm::Iri(n.as_str().to_string())),
        Subject::BlankNode(b) => Ok(StoredTerm::Blank(b.as_str().to_string())),
        #[allow(unreachable_patterns)]
        _ => Err(LdpError::Serialization(format!(
            "Unsupported subject term: {subject}"
        ))),
    }
}

fn encode_object(object: &Term) -> Result<StoredTerm, LdpError> {
    match object {
        Term::NamedNode(n) => Ok(StoredTerm::Iri(n.as_str().to_string())),
        Term::BlankNode(b) => Ok(StoredTerm::Blank(b.as_str().to_string())),
        Term::Literal(l) => Ok(StoredTerm::Literal {
            value: l.value().to_string(),
            datatype: l.datatype().as_str().to_string(),
            lang: l.language().map(str::to_string),
        }),
        #[allow(unreachable_patterns)]
        _ => Err(LdpError::Serialization(format!(
            "Unsupported object term: {object}"
        ))),
    }
}

fn decode_subject(term: StoredTerm) -> Result<Subject, LdpError> {
    match term {
        StoredTerm::Iri(iri) => Ok(NamedNode::new_unchecked(iri).into()),
        StoredTerm::Blank(id) => Ok(BlankNode::new_unchecked(id).into()),
        StoredTerm::Literal { value, .. } => Err(LdpError::Serialization(format!(
            "Literal \"{value}\" in subject position"
        ))),
    }
}

fn decode_object(term: StoredTerm) -> Term {
    match term {
        StoredTerm::Iri(iri) => NamedNode::new_unchecked(iri).into(),
        StoredTerm::Blank(id) => BlankNode::new_unchecked(id).into(),
        StoredTerm::Literal {
            value,
            lang: Some(lang),
            ..
        } => Literal::new_language_tagged_literal_unchecked(value, lang).into(),
        StoredTerm::Literal {
            value, datatype, ..
        } => Literal::new_typed_literal(value, NamedNode::new_unchecked(datatype)).into(),
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a resource graph (header + payload).
pub fn triples_to_bytes(triples: &TripleSet) -> Result<Vec<u8>, LdpError> {
    let stored = sorted(triples)
        .into_iter()
        .map(|t| {
            Ok(StoredTriple {
                subject: encode_subject(&t.subject)?,
                predicate: t.predicate.as_str().to_string(),
                object: encode_object(&t.object)?,
            })
        })
        .collect::<Result<Vec<_>, LdpError>>()?;

    let payload =
        postcard::to_allocvec(&stored).map_err(|e| LdpError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&RecordHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a resource graph. Size and header are checked first.
pub fn triples_from_bytes(bytes: &[u8]) -> Result<TripleSet, LdpError> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(LdpError::Serialization(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }
    let header = RecordHeader::from_bytes(bytes)?;
    header.validate()?;

    let stored: Vec<StoredTriple> = postcard::from_bytes(&bytes[HEADER_SIZE..])
        .map_err(|e| LdpError::Serialization(format!("Failed to decode record: {e}")))?;

    stored
        .into_iter()
        .map(|t| {
            Ok(Triple::new(
                decode_subject(t.subject)?,
                NamedNode::new_unchecked(t.predicate),
                decode_object(t.object),
            ))
        })
        .collect()
}
