//! # RDF Collaborator Glue
//!
//! Thin adapters over the collaborator RDF stack: payload decoding, transient
//! SPARQL Update evaluation, literal construction and content digests.
//! No RDF logic of our own lives here.

use crate::imr::{Imr, TripleSet, to_ntriples};
use crate::types::LdpError;
use crate::uid::defrag;
use crate::vocab::{XSD_DATE_TIME, XSD_LONG};
use chrono::{DateTime, SecondsFormat, Utc};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphName, GraphNameRef, Literal, NamedNode, Term, Triple};
use oxigraph::store::Store;
use spargebra::GraphUpdateOperation;
use spargebra::term::{GroundSubject, GroundTermPattern, Subject, TermPattern};

/// Prefix of content digest URNs.
pub const DIGEST_PREFIX: &str = "urn:blake3:";

// =============================================================================
// PAYLOAD DECODING
// =============================================================================

/// Resolve a format name, media type or file extension.
#[must_use]
pub fn rdf_format(name: &str) -> Option<RdfFormat> {
    let name = name.trim().to_ascii_lowercase();
    match name.as_str() {
        "turtle" | "ttl" => Some(RdfFormat::Turtle),
        "ntriples" | "n-triples" | "nt" => Some(RdfFormat::NTriples),
        "nquads" | "n-quads" | "nq" => Some(RdfFormat::NQuads),
        "trig" => Some(RdfFormat::TriG),
        "rdfxml" | "rdf/xml" | "xml" | "rdf" => Some(RdfFormat::RdfXml),
        "n3" => Some(RdfFormat::N3),
        other => RdfFormat::from_media_type(other).or_else(|| RdfFormat::from_extension(other)),
    }
}

/// Decode serialized RDF into an IMR for `uri`. Relative IRIs resolve
/// against `uri`, so `<>` is the resource itself. Named graphs are ignored.
pub fn parse_rdf(uri: &NamedNode, data: &[u8], format: &str) -> Result<Imr, LdpError> {
    let parsing = |reason: String| LdpError::RdfParsing {
        format: format.to_string(),
        reason,
    };
    let rdf_format = rdf_format(format).ok_or_else(|| parsing("unsupported format".into()))?;
    let parser = RdfParser::from_format(rdf_format)
        .with_base_iri(uri.as_str())
        .map_err(|e| parsing(e.to_string()))?;

    let mut imr = Imr::new(uri.clone());
    for quad in parser.for_reader(data) {
        let quad = quad.map_err(|e| parsing(e.to_string()))?;
        if quad.graph_name.is_default_graph() {
            imr.insert(Triple::new(quad.subject, quad.predicate, quad.object));
        }
    }
    Ok(imr)
}

// =============================================================================
// SPARQL UPDATE
// =============================================================================

/// Reject an update naming any bound subject outside `uri` (hash URIs of
/// `uri` included). Variable and blank subjects are allowed; the resulting
/// delta is sanitized separately.
pub fn check_update_scope(query: &str, uri: &NamedNode) -> Result<(), LdpError> {
    let update = spargebra::Update::parse(query, Some(uri.as_str()))
        .map_err(|e| LdpError::InvalidUpdate(e.to_string()))?;

    let mut subjects: Vec<&str> = Vec::new();
    for op in &update.operations {
        match op {
            GraphUpdateOperation::InsertData { data } => {
                subjects.extend(data.iter().filter_map(|q| match &q.subject {
                    Subject::NamedNode(n) => Some(n.as_str()),
                    _ => None,
                }));
            }
            GraphUpdateOperation::DeleteData { data } => {
                subjects.extend(data.iter().filter_map(|q| match &q.subject {
                    GroundSubject::NamedNode(n) => Some(n.as_str()),
                    _ => None,
                }));
            }
            GraphUpdateOperation::DeleteInsert { delete, insert, .. } => {
                subjects.extend(delete.iter().filter_map(|q| match &q.subject {
                    GroundTermPattern::NamedNode(n) => Some(n.as_str()),
                    _ => None,
                }));
                subjects.extend(insert.iter().filter_map(|q| match &q.subject {
                    TermPattern::NamedNode(n) => Some(n.as_str()),
                    _ => None,
                }));
            }
            GraphUpdateOperation::Load { .. } => {
                return Err(LdpError::InvalidUpdate("LOAD is not allowed".into()));
            }
            _ => {}
        }
    }

    match subjects.into_iter().find(|s| defrag(s) != uri.as_str()) {
        Some(foreign) => Err(LdpError::InvalidUpdate(format!(
            "subject <{foreign}> is outside <{}>",
            uri.as_str()
        ))),
        None => Ok(()),
    }
}

/// Evaluate `query` against a transient copy of `graph` and return the
/// resulting default graph. `graph` itself is never touched.
pub fn apply_update(graph: &TripleSet, query: &str, base: &NamedNode) -> Result<TripleSet, LdpError> {
    let store = Store::new().map_err(|e| LdpError::Storage(e.to_string()))?;
    for triple in graph {
        store
            .insert(&triple.clone().in_graph(GraphName::DefaultGraph))
            .map_err(|e| LdpError::Storage(e.to_string()))?;
    }

    let update = oxigraph::sparql::Update::parse(query, Some(base.as_str()))
        .map_err(|e| LdpError::InvalidUpdate(e.to_string()))?;
    store
        .update(update)
        .map_err(|e| LdpError::InvalidUpdate(e.to_string()))?;

    let mut post = TripleSet::new();
    for quad in store.quads_for_pattern(None, None, None, Some(GraphNameRef::DefaultGraph)) {
        let quad = quad.map_err(|e| LdpError::Storage(e.to_string()))?;
        post.insert(Triple::new(quad.subject, quad.predicate, quad.object));
    }
    Ok(post)
}

// =============================================================================
// LITERALS AND DIGESTS
// =============================================================================

/// `xsd:dateTime` literal for a timestamp.
#[must_use]
pub fn datetime_literal(ts: &DateTime<Utc>) -> Literal {
    Literal::new_typed_literal(
        ts.to_rfc3339_opts(SecondsFormat::Micros, true),
        XSD_DATE_TIME,
    )
}

/// Timestamp carried by an `xsd:dateTime` literal term.
#[must_use]
pub fn parse_datetime(term: &Term) -> Option<DateTime<Utc>> {
    match term {
        Term::Literal(l) => DateTime::parse_from_rfc3339(l.value())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// `xsd:long` literal.
#[must_use]
pub fn long_literal(value: u64) -> Literal {
    Literal::new_typed_literal(value.to_string(), XSD_LONG)
}

/// Digest URN of raw bytes.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> NamedNode {
    NamedNode::new_unchecked(format!("{DIGEST_PREFIX}{}", blake3::hash(bytes).to_hex()))
}

/// Digest URN of a graph's canonical N-Triples form.
#[must_use]
pub fn digest_graph(graph: &TripleSet) -> NamedNode {
    digest_bytes(to_ntriples(graph).as_bytes())
}

/// Hex checksum carried by a digest term, if it is one.
#[must_use]
pub fn digest_hex(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(n) => n.as_str().strip_prefix(DIGEST_PREFIX),
        _ => None,
    }
}
