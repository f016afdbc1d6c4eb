//! # Integrity Guard
//!
//! Stateless validators applied to client payloads before anything is
//! persisted:
//! - server-managed term sanitization (`check_mgd_terms`)
//! - referential integrity of internal links (`check_ref_int`)
//! - SPARQL Update delta computation (`Resource::sparql_delta`)

use crate::context::Context;
use crate::imr::TripleSet;
use crate::primitives::{
    SMT_ALLOW_ON_CREATE, SRV_MGD_PREDICATES, SRV_MGD_SUBJECTS, SRV_MGD_TYPES, in_table,
};
use crate::rdf::{apply_update, check_update_scope};
use crate::resource::Resource;
use crate::types::{Handling, LdpError, RefIntMode, TermAxis};
use crate::uid::{defrag, is_internal, uri_to_uid};
use crate::vocab::RDF_TYPE;
use oxigraph::model::{NamedNode, Subject, Term, Triple};
use std::collections::BTreeSet;
use tracing::{debug, info};

// =============================================================================
// SERVER-MANAGED TERMS
// =============================================================================

/// Check a payload for server-managed subjects, predicates and types.
///
/// `Strict` fails on the first offending axis and leaves `trp` untouched.
/// `Lenient` strips offending triples in place. `None` skips the check.
/// Direct/Indirect container types are allowed while `creating`.
pub fn check_mgd_terms(
    trp: &mut TripleSet,
    handling: Handling,
    creating: bool,
) -> Result<(), LdpError> {
    if handling == Handling::None {
        return Ok(());
    }

    let subject_of = |t: &Triple| match &t.subject {
        Subject::NamedNode(n) if in_table(SRV_MGD_SUBJECTS, n.as_ref()) => {
            Some(n.as_str().to_string())
        }
        _ => None,
    };
    sanitize_axis(trp, handling, TermAxis::Subject, subject_of)?;

    let predicate_of = |t: &Triple| {
        in_table(SRV_MGD_PREDICATES, t.predicate.as_ref()).then(|| t.predicate.as_str().to_string())
    };
    sanitize_axis(trp, handling, TermAxis::Predicate, predicate_of)?;

    let type_of = |t: &Triple| match &t.object {
        Term::NamedNode(o)
            if t.predicate.as_ref() == RDF_TYPE
                && in_table(SRV_MGD_TYPES, o.as_ref())
                && !(creating && in_table(SMT_ALLOW_ON_CREATE, o.as_ref())) =>
        {
            Some(o.as_str().to_string())
        }
        _ => None,
    };
    sanitize_axis(trp, handling, TermAxis::Type, type_of)
}

fn sanitize_axis(
    trp: &mut TripleSet,
    handling: Handling,
    axis: TermAxis,
    offending: impl Fn(&Triple) -> Option<String>,
) -> Result<(), LdpError> {
    let terms: BTreeSet<String> = trp.iter().filter_map(&offending).collect();
    if terms.is_empty() {
        return Ok(());
    }
    if handling == Handling::Strict {
        return Err(LdpError::ServerManagedTerm {
            terms: terms.into_iter().collect(),
            axis,
        });
    }
    for term in &terms {
        info!(%axis, term = %term, "removing offending server-managed term");
    }
    trp.retain(|t| offending(t).is_none());
    Ok(())
}

// =============================================================================
// REFERENTIAL INTEGRITY
// =============================================================================

/// Check internal links of a payload for `uri` against the store.
///
/// Links to the resource itself (or its hash URIs) are always fine. Under
/// `Strict` the first dangling link fails the write; otherwise every triple
/// pointing at a missing resource is dropped.
pub fn check_ref_int(
    ctx: &Context<'_>,
    uri: &NamedNode,
    trp: &mut TripleSet,
    mode: RefIntMode,
) -> Result<(), LdpError> {
    if !mode.is_enabled() {
        return Ok(());
    }

    let mut dangling: BTreeSet<NamedNode> = BTreeSet::new();
    let mut targets: Vec<&NamedNode> = trp
        .iter()
        .filter_map(|t| match &t.object {
            Term::NamedNode(o) if is_internal(o.as_str()) && defrag(o.as_str()) != uri.as_str() => {
                Some(o)
            }
            _ => None,
        })
        .collect();
    targets.sort();
    targets.dedup();

    for target in targets {
        let target_uid = uri_to_uid(target.as_ref())?;
        if ctx.store.ask_rsrc_exists(&target_uid)? {
            continue;
        }
        if mode == RefIntMode::Strict {
            return Err(LdpError::RefIntViolation(target_uid));
        }
        dangling.insert(target.clone());
    }

    for target in &dangling {
        info!(target = %target.as_str(), "removing link to non-existent repo resource");
    }
    trp.retain(|t| !matches!(&t.object, Term::NamedNode(o) if dangling.contains(o)));
    Ok(())
}

// =============================================================================
// RESOURCE-BOUND CHECKS
// =============================================================================

impl Resource {
    /// Sanitize `trp` with this resource's handling mode. Container types are
    /// allowed only while the resource is not stored yet.
    pub fn check_mgd_terms(
        &mut self,
        ctx: &Context<'_>,
        trp: &mut TripleSet,
    ) -> Result<(), LdpError> {
        let creating = !self.is_stored(ctx)?;
        check_mgd_terms(trp, self.handling(), creating)
    }

    /// Delta produced by a SPARQL Update on this resource: `(remove, add)`.
    ///
    /// The update runs on a transient copy of the live IMR; the store is not
    /// touched. Both sets are sanitized independently. Updates naming a
    /// subject other than this resource are rejected up front.
    pub fn sparql_delta(
        &mut self,
        ctx: &Context<'_>,
        query: &str,
    ) -> Result<(TripleSet, TripleSet), LdpError> {
        debug!(uid = %self.uid(), query, "computing SPARQL delta");
        check_update_scope(query, self.uri())?;

        let pre = self.imr(ctx)?.triples().clone();
        let post = apply_update(&pre, query, self.uri())?;

        let mut remove: TripleSet = pre.difference(&post).cloned().collect();
        let mut add: TripleSet = post.difference(&pre).cloned().collect();
        self.check_mgd_terms(ctx, &mut remove)?;
        self.check_mgd_terms(ctx, &mut add)?;
        Ok((remove, add))
    }
}
