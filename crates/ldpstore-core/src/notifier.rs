//! # Change Notification
//!
//! Ordered change events produced by committed mutations.
//!
//! The engine only appends to the `Changelog`. Delivery is the caller's
//! business: once the enclosing transaction commits, the changelog is flushed
//! into a `TaskQueue`. Nothing here spawns threads or processes.

use crate::context::Context;
use crate::imr::{Imr, TripleSet, sorted};
use crate::resource::Resource;
use crate::types::{EventKind, LdpError};
use crate::vocab::fcrepo;
use chrono::{DateTime, Utc};
use oxigraph::model::{Subject, Term};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

// =============================================================================
// CHANGE EVENT
// =============================================================================

/// A committed change to one resource. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uid: String,
    pub uri: String,
    pub kind: EventKind,
    pub removed: TripleSet,
    pub added: TripleSet,
    pub timestamp: DateTime<Utc>,
    pub resource_types: Vec<String>,
    pub actor: Option<String>,
}

impl ChangeEvent {
    /// Distinct IRI subjects touched by the delta, sorted.
    ///
    /// A single delta can carry hash URIs or other subjects besides the
    /// resource itself; consumers publish one message per subject.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        let subjects: BTreeSet<String> = self
            .removed
            .iter()
            .chain(self.added.iter())
            .filter_map(|t| match &t.subject {
                Subject::NamedNode(n) => Some(n.as_str().to_string()),
                _ => None,
            })
            .collect();
        subjects.into_iter().collect()
    }

    /// Delta as sorted N-Triples lines: `(removed, added)`.
    #[must_use]
    pub fn delta_lines(&self) -> (Vec<String>, Vec<String>) {
        let lines = |set: &TripleSet| sorted(set).iter().map(|t| t.to_string()).collect();
        (lines(&self.removed), lines(&self.added))
    }
}

// =============================================================================
// CHANGELOG
// =============================================================================

/// In-process, ordered sink of change events.
#[derive(Debug, Default)]
pub struct Changelog {
    events: VecDeque<ChangeEvent>,
}

impl Changelog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ChangeEvent) {
        self.events.push_back(event);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter()
    }

    /// Current position, to be passed to `truncate` if the request fails.
    #[must_use]
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    /// Discard every event appended after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// Drain events in order into `queue`. Returns the number delivered.
    ///
    /// Delivery stops at the first queue error; undelivered events stay in
    /// the changelog.
    pub fn flush_into(&mut self, queue: &mut dyn TaskQueue) -> Result<usize, LdpError> {
        let mut delivered = 0;
        while let Some(event) = self.events.pop_front() {
            if let Err(e) = queue.enqueue(&event) {
                self.events.push_front(event);
                return Err(e);
            }
            delivered += 1;
        }
        Ok(delivered)
    }
}

// =============================================================================
// TASK QUEUE
// =============================================================================

/// Consumer of committed change events.
pub trait TaskQueue {
    fn enqueue(&mut self, event: &ChangeEvent) -> Result<(), LdpError>;
}

impl TaskQueue for Vec<ChangeEvent> {
    fn enqueue(&mut self, event: &ChangeEvent) -> Result<(), LdpError> {
        self.push(event.clone());
        Ok(())
    }
}

// =============================================================================
// MUTATION + EVENT COMPOSITION
// =============================================================================

impl Resource {
    /// Apply a delta to the stored graph and record the change.
    ///
    /// With `ev` set and messaging enabled, a `ChangeEvent` is appended to
    /// the changelog. Types and actor come from the post-mutation metadata
    /// when the resource still resolves, otherwise from the added triples.
    pub fn modify(
        &mut self,
        ctx: &mut Context<'_>,
        ev: Option<EventKind>,
        remove: &TripleSet,
        add: &TripleSet,
    ) -> Result<(), LdpError> {
        debug!(
            uid = %self.uid(),
            removed = remove.len(),
            added = add.len(),
            "modifying resource"
        );
        ctx.store.modify_rsrc(self.uid(), remove, add)?;
        self.invalidate();

        if let Some(kind) = ev.filter(|_| ctx.config.messaging) {
            let event = self.compose_event(ctx, kind, remove, add)?;
            ctx.changelog.push(event);
        }
        Ok(())
    }

    fn compose_event(
        &self,
        ctx: &Context<'_>,
        kind: EventKind,
        remove: &TripleSet,
        add: &TripleSet,
    ) -> Result<ChangeEvent, LdpError> {
        let (resource_types, actor) = match ctx.store.get_metadata(self.uid(), true) {
            Ok(meta) => (
                meta.types().iter().map(|t| t.as_str().to_string()).collect(),
                meta.value(fcrepo::CREATED_BY).map(literal_value),
            ),
            Err(e) if e.is_gone() => {
                let fallback = Imr::from_triples(self.uri().clone(), add.iter().cloned());
                (
                    fallback.types().iter().map(|t| t.as_str().to_string()).collect(),
                    fallback.value(fcrepo::CREATED_BY).map(literal_value),
                )
            }
            Err(e) => return Err(e),
        };

        Ok(ChangeEvent {
            uid: self.uid().to_string(),
            uri: self.uri().as_str().to_string(),
            kind,
            removed: remove.clone(),
            added: add.clone(),
            timestamp: ctx.timestamp,
            resource_types,
            actor,
        })
    }
}

fn literal_value(term: &Term) -> String {
    match term {
        Term::Literal(l) => l.value().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode, Triple};

    fn event(uid: &str, kind: EventKind) -> ChangeEvent {
        let uri = format!("info:fcres{uid}");
        let mut added = TripleSet::new();
        added.insert(Triple::new(
            NamedNode::new_unchecked(uri.clone()),
            NamedNode::new_unchecked("urn:p"),
            Literal::new_simple_literal("o"),
        ));
        added.insert(Triple::new(
            NamedNode::new_unchecked(format!("{uri}#h")),
            NamedNode::new_unchecked("urn:p"),
            Literal::new_simple_literal("o"),
        ));
        ChangeEvent {
            uid: uid.to_string(),
            uri,
            kind,
            removed: TripleSet::new(),
            added,
            timestamp: Utc::now(),
            resource_types: Vec::new(),
            actor: None,
        }
    }

    struct FailingQueue;

    impl TaskQueue for FailingQueue {
        fn enqueue(&mut self, _event: &ChangeEvent) -> Result<(), LdpError> {
            Err(LdpError::Storage("queue closed".into()))
        }
    }

    #[test]
    fn flush_preserves_order() {
        let mut log = Changelog::new();
        log.push(event("/a", EventKind::Created));
        log.push(event("/b", EventKind::Updated));
        let mut queue: Vec<ChangeEvent> = Vec::new();
        assert_eq!(log.flush_into(&mut queue).expect("flush"), 2);
        assert!(log.is_empty());
        assert_eq!(queue[0].uid, "/a");
        assert_eq!(queue[1].kind, EventKind::Updated);
    }

    #[test]
    fn truncate_discards_events_after_mark() {
        let mut log = Changelog::new();
        log.push(event("/a", EventKind::Created));
        let mark = log.mark();
        log.push(event("/b", EventKind::Created));
        log.truncate(mark);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn failed_delivery_keeps_event() {
        let mut log = Changelog::new();
        log.push(event("/a", EventKind::Created));
        assert!(log.flush_into(&mut FailingQueue).is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn subjects_include_hash_uris() {
        let subjects = event("/a", EventKind::Created).subjects();
        assert_eq!(subjects, vec!["info:fcres/a", "info:fcres/a#h"]);
    }
}
