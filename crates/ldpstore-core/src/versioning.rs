//! # Versioning Engine
//!
//! Immutable snapshots of a resource's user-facing state, stored under
//! `{uid}/fcr:versions/{label}`, and reverts from them.

use crate::context::Context;
use crate::imr::{Imr, TripleSet};
use crate::primitives::{is_trp_managed, is_unversioned};
use crate::resource::Resource;
use crate::store::ImrOptions;
use crate::types::{EventKind, LdpError};
use crate::uid::{replace_domain, uid_to_uri, version_uid, versions_uid};
use crate::vocab::{RDF_TYPE, fcrepo};
use oxigraph::model::{NamedNode, Subject, Triple};
use tracing::info;
use uuid::Uuid;

impl Resource {
    /// Snapshot the live state under `label` and link it from the resource.
    ///
    /// A missing, empty or already used label is replaced by a random one.
    /// The snapshot write itself is never notified; the link update on the
    /// live resource is notified when `notify` is set. Returns the label.
    pub fn create_version(
        &mut self,
        ctx: &mut Context<'_>,
        label: Option<&str>,
        notify: bool,
    ) -> Result<String, LdpError> {
        let existing = self.version_uids(ctx)?;
        let label = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(l) if l.contains('/') || l.contains('#') => {
                return Err(LdpError::invalid(
                    self.uid(),
                    format!("version label {l:?} cannot contain '/' or '#'"),
                ));
            }
            Some(l) if !existing.contains(l) => l.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let ver_uid = version_uid(self.uid(), &label);
        let ver_uri = uid_to_uri(&ver_uid);
        info!(uid = %self.uid(), label = %label, "creating version");

        let live = self.imr(ctx)?.clone();
        let mut snapshot = TripleSet::new();
        snapshot.insert(Triple::new(
            ver_uri.clone(),
            RDF_TYPE.into_owned(),
            fcrepo::VERSION.into_owned(),
        ));
        snapshot.extend(
            live.iter()
                .filter(|t| !is_unversioned(t))
                .map(|t| rebase_subject(t, self.uri(), &ver_uri)),
        );
        ctx.store.modify_rsrc(&ver_uid, &TripleSet::new(), &snapshot)?;

        let mut add = TripleSet::new();
        add.insert(Triple::new(
            self.uri().clone(),
            fcrepo::HAS_VERSION.into_owned(),
            ver_uri,
        ));
        if live.value(fcrepo::HAS_VERSIONS).is_none() {
            add.insert(Triple::new(
                self.uri().clone(),
                fcrepo::HAS_VERSIONS.into_owned(),
                uid_to_uri(&versions_uid(self.uid())),
            ));
        }
        let ev = notify.then_some(EventKind::Updated);
        self.modify(ctx, ev, &TripleSet::new(), &add)?;
        Ok(label)
    }

    /// Replace the live user data with the content of version `label`.
    ///
    /// With `backup` the current state is versioned first. Server-managed
    /// triples of the snapshot are discarded and stamped afresh.
    pub fn revert_to_version(
        &mut self,
        ctx: &mut Context<'_>,
        label: &str,
        backup: bool,
    ) -> Result<EventKind, LdpError> {
        let opts = ImrOptions {
            version: Some(label.to_string()),
            ..ImrOptions::without_children()
        };
        let snapshot = ctx.store.get_imr(self.uid(), &opts)?;
        info!(uid = %self.uid(), label, backup, "reverting to version");

        if backup {
            self.create_version(ctx, None, true)?;
        }

        let ver_uri = snapshot.uri().clone();
        let provided = Imr::from_triples(
            self.uri().clone(),
            snapshot
                .iter()
                .filter(|t| !is_trp_managed(t))
                .map(|t| rebase_subject(t, &ver_uri, self.uri())),
        );
        self.provided = Some(provided);
        self.create_or_replace(ctx, false)
    }
}

/// Move a triple's subject from the `from` domain to the `to` domain.
/// Only the subject position is rewritten.
fn rebase_subject(triple: &Triple, from: &NamedNode, to: &NamedNode) -> Triple {
    let subject = match &triple.subject {
        Subject::NamedNode(n) => replace_domain(n.as_str(), from.as_str(), to.as_str())
            .map(|iri| Subject::NamedNode(NamedNode::new_unchecked(iri)))
            .unwrap_or_else(|| triple.subject.clone()),
        other => other.clone(),
    };
    Triple::new(subject, triple.predicate.clone(), triple.object.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, Term};

    #[test]
    fn rebase_rewrites_subject_only() {
        let from = NamedNode::new_unchecked("info:fcres/a");
        let to = NamedNode::new_unchecked("info:fcres/a/fcr:versions/v1");
        let triple = Triple::new(
            NamedNode::new_unchecked("info:fcres/a#h"),
            NamedNode::new_unchecked("urn:p"),
            from.clone(),
        );
        let rebased = rebase_subject(&triple, &from, &to);
        assert_eq!(
            rebased.subject,
            Subject::NamedNode(NamedNode::new_unchecked("info:fcres/a/fcr:versions/v1#h"))
        );
        assert_eq!(rebased.object, Term::from(from));
    }

    #[test]
    fn rebase_leaves_foreign_subjects() {
        let from = NamedNode::new_unchecked("info:fcres/a");
        let to = NamedNode::new_unchecked("info:fcres/x");
        let triple = Triple::new(
            NamedNode::new_unchecked("info:fcres/ab"),
            NamedNode::new_unchecked("urn:p"),
            Literal::new_simple_literal("o"),
        );
        assert_eq!(rebase_subject(&triple, &from, &to), triple);
    }
}
