//! # In-Memory Resource
//!
//! A mutable set of triples scoped to one subject URI. An `Imr` holds either a
//! stored snapshot fetched from the store or a client-provided payload.
//!
//! Iteration order of the underlying set is unspecified; every accessor that
//! must pick among several triples orders them by their N-Triples form so the
//! result is deterministic.

use crate::vocab::{RDF_TYPE, ldp};
use oxigraph::model::{NamedNode, NamedNodeRef, Subject, Term, Triple};
use std::collections::HashSet;

/// An unordered set of triples.
pub type TripleSet = HashSet<Triple>;

/// In-memory resource: a triple set bound to a subject URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imr {
    uri: NamedNode,
    triples: TripleSet,
}

impl Imr {
    /// Create an empty IMR for `uri`.
    #[must_use]
    pub fn new(uri: NamedNode) -> Self {
        Self {
            uri,
            triples: TripleSet::new(),
        }
    }

    /// Create an IMR from existing triples.
    #[must_use]
    pub fn from_triples(uri: NamedNode, triples: impl IntoIterator<Item = Triple>) -> Self {
        Self {
            uri,
            triples: triples.into_iter().collect(),
        }
    }

    /// The subject URI this IMR is scoped to.
    #[must_use]
    pub fn uri(&self) -> &NamedNode {
        &self.uri
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    #[must_use]
    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    /// Borrow the underlying triple set.
    #[must_use]
    pub fn triples(&self) -> &TripleSet {
        &self.triples
    }

    /// Mutable access to the underlying triple set.
    pub fn triples_mut(&mut self) -> &mut TripleSet {
        &mut self.triples
    }

    /// Consume the IMR, returning its triples.
    #[must_use]
    pub fn into_triples(self) -> TripleSet {
        self.triples
    }

    pub fn insert(&mut self, triple: Triple) -> bool {
        self.triples.insert(triple)
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        self.triples.remove(triple)
    }

    pub fn extend(&mut self, triples: impl IntoIterator<Item = Triple>) {
        self.triples.extend(triples);
    }

    /// Keep only triples matching `keep`. Returns the removed triples.
    pub fn retain(&mut self, mut keep: impl FnMut(&Triple) -> bool) -> TripleSet {
        let removed: TripleSet = self.triples.iter().filter(|t| !keep(t)).cloned().collect();
        self.triples.retain(|t| !removed.contains(t));
        removed
    }

    /// Add a triple `(uri, predicate, object)`.
    pub fn add(&mut self, predicate: NamedNodeRef<'_>, object: impl Into<Term>) {
        self.triples.insert(Triple::new(
            self.uri.clone(),
            predicate.into_owned(),
            object.into(),
        ));
    }

    /// Replace every `(uri, predicate, *)` triple with `(uri, predicate, object)`.
    pub fn set(&mut self, predicate: NamedNodeRef<'_>, object: impl Into<Term>) {
        self.remove_predicate(predicate);
        self.add(predicate, object);
    }

    /// Remove every `(uri, predicate, *)` triple.
    pub fn remove_predicate(&mut self, predicate: NamedNodeRef<'_>) -> TripleSet {
        let uri = self.uri.clone();
        self.retain(|t| !(is_subject(t, &uri) && t.predicate.as_ref() == predicate))
    }

    /// Objects of `(uri, predicate, *)`, in deterministic order.
    #[must_use]
    pub fn objects(&self, predicate: NamedNodeRef<'_>) -> Vec<&Term> {
        let mut objects: Vec<&Term> = self
            .triples
            .iter()
            .filter(|t| is_subject(t, &self.uri) && t.predicate.as_ref() == predicate)
            .map(|t| &t.object)
            .collect();
        objects.sort_by_key(|o| o.to_string());
        objects
    }

    /// First object of `(uri, predicate, *)`, if any.
    #[must_use]
    pub fn value(&self, predicate: NamedNodeRef<'_>) -> Option<&Term> {
        self.objects(predicate).into_iter().next()
    }

    /// First IRI object of `(uri, predicate, *)`, if any.
    #[must_use]
    pub fn iri_value(&self, predicate: NamedNodeRef<'_>) -> Option<NamedNode> {
        self.objects(predicate).into_iter().find_map(|o| match o {
            Term::NamedNode(n) => Some(n.clone()),
            _ => None,
        })
    }

    /// All `rdf:type` IRIs of the subject, sorted.
    #[must_use]
    pub fn types(&self) -> Vec<NamedNode> {
        let mut types: Vec<NamedNode> = self
            .objects(RDF_TYPE)
            .into_iter()
            .filter_map(|o| match o {
                Term::NamedNode(n) => Some(n.clone()),
                _ => None,
            })
            .collect();
        types.dedup();
        types
    }

    /// The subject's types within the LDP namespace.
    #[must_use]
    pub fn ldp_types(&self) -> Vec<NamedNode> {
        self.types()
            .into_iter()
            .filter(|t| t.as_str().starts_with(ldp::NS))
            .collect()
    }

    #[must_use]
    pub fn has_type(&self, rdf_type: NamedNodeRef<'_>) -> bool {
        self.types().iter().any(|t| t.as_ref() == rdf_type)
    }

    /// Triples sorted by their N-Triples form.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Triple> {
        sorted(&self.triples)
    }

    /// Canonical N-Triples serialization (sorted, one statement per line).
    #[must_use]
    pub fn to_ntriples(&self) -> String {
        to_ntriples(&self.triples)
    }
}

impl<'a> IntoIterator for &'a Imr {
    type Item = &'a Triple;
    type IntoIter = std::collections::hash_set::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

/// Whether the triple's subject is exactly `uri`.
#[must_use]
pub fn is_subject(triple: &Triple, uri: &NamedNode) -> bool {
    matches!(&triple.subject, Subject::NamedNode(s) if s == uri)
}

/// Triples of `set` sorted by N-Triples form.
#[must_use]
pub fn sorted(set: &TripleSet) -> Vec<&Triple> {
    let mut triples: Vec<&Triple> = set.iter().collect();
    triples.sort_by_cached_key(|t| t.to_string());
    triples
}

/// Sorted N-Triples serialization of `set`.
#[must_use]
pub fn to_ntriples(set: &TripleSet) -> String {
    let mut out = String::new();
    for triple in sorted(set) {
        out.push_str(&triple.to_string());
        out.push_str(" .\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::Literal;

    fn uri() -> NamedNode {
        NamedNode::new_unchecked("info:fcres/a")
    }

    fn title() -> NamedNodeRef<'static> {
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/title")
    }

    #[test]
    fn set_replaces_existing_values() {
        let mut imr = Imr::new(uri());
        imr.add(title(), Literal::new_simple_literal("one"));
        imr.add(title(), Literal::new_simple_literal("two"));
        assert_eq!(imr.objects(title()).len(), 2);

        imr.set(title(), Literal::new_simple_literal("three"));
        assert_eq!(imr.len(), 1);
        assert_eq!(
            imr.value(title()),
            Some(&Term::from(Literal::new_simple_literal("three")))
        );
    }

    #[test]
    fn value_is_deterministic() {
        let mut imr = Imr::new(uri());
        imr.add(title(), Literal::new_simple_literal("b"));
        imr.add(title(), Literal::new_simple_literal("a"));
        assert_eq!(
            imr.value(title()),
            Some(&Term::from(Literal::new_simple_literal("a")))
        );
    }

    #[test]
    fn types_ignore_other_subjects() {
        let mut imr = Imr::new(uri());
        imr.add(RDF_TYPE, ldp::CONTAINER.into_owned());
        imr.insert(Triple::new(
            NamedNode::new_unchecked("info:fcres/other"),
            RDF_TYPE.into_owned(),
            ldp::RESOURCE.into_owned(),
        ));
        assert_eq!(imr.types(), vec![ldp::CONTAINER.into_owned()]);
        assert!(imr.has_type(ldp::CONTAINER));
        assert!(!imr.has_type(ldp::RESOURCE));
    }

    #[test]
    fn retain_reports_removed_triples() {
        let mut imr = Imr::new(uri());
        imr.add(title(), Literal::new_simple_literal("x"));
        imr.add(RDF_TYPE, ldp::CONTAINER.into_owned());
        let removed = imr.retain(|t| t.predicate.as_ref() == RDF_TYPE);
        assert_eq!(removed.len(), 1);
        assert_eq!(imr.len(), 1);
    }

    #[test]
    fn ntriples_are_sorted_and_terminated() {
        let mut imr = Imr::new(uri());
        imr.add(title(), Literal::new_simple_literal("z"));
        imr.add(RDF_TYPE, ldp::CONTAINER.into_owned());
        let nt = imr.to_ntriples();
        let lines: Vec<&str> = nt.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.ends_with(" .")));
        let mut sorted_lines = lines.clone();
        sorted_lines.sort_unstable();
        assert_eq!(lines, sorted_lines);
    }
}
