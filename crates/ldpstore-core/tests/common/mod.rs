//! Shared fixtures for integration tests.

#![allow(dead_code)]

use ldpstore_core::model::{Literal, NamedNode, Subject, Term};
use ldpstore_core::{
    Imr, MemoryBinaryStore, MemoryStore, Payload, RepoConfig, Repository, TripleSet,
};

pub type MemRepo = Repository<MemoryStore, MemoryBinaryStore>;

pub const DC_TITLE: &str = "http://purl.org/dc/terms/title";
pub const EX: &str = "http://example.org/";

pub fn repo() -> MemRepo {
    repo_with(RepoConfig::default())
}

pub fn repo_with(config: RepoConfig) -> MemRepo {
    Repository::open(MemoryStore::new(), MemoryBinaryStore::new(), config).expect("open repository")
}

/// Turtle payload. `<>` is the resource itself.
pub fn ttl(body: &str) -> Payload {
    let doc = format!(
        "@prefix ldp: <http://www.w3.org/ns/ldp#> .\n@prefix dc: <http://purl.org/dc/terms/> .\n@prefix ex: <{EX}> .\n{body}"
    );
    Payload::rdf(doc.into_bytes(), "turtle")
}

pub fn titled(title: &str) -> Payload {
    ttl(&format!("<> dc:title \"{title}\" ."))
}

pub fn uri(uid: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("info:fcres{uid}"))
}

pub fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

pub fn title_of(imr: &Imr) -> Option<String> {
    match imr.value(iri(DC_TITLE).as_ref()) {
        Some(Term::Literal(l)) => Some(l.value().to_string()),
        _ => None,
    }
}

pub fn literal(value: &str) -> Term {
    Literal::new_simple_literal(value).into()
}

/// Whether `set` holds the triple `(s, p, o)`.
pub fn has_triple(set: &TripleSet, s: &NamedNode, p: &NamedNode, o: &Term) -> bool {
    set.iter().any(|t| {
        matches!(&t.subject, Subject::NamedNode(n) if n == s) && &t.predicate == p && &t.object == o
    })
}
