//! # Store Interface
//!
//! The contract the resource engine consumes, in resource-centric layout:
//! every resource UID owns one graph holding its own triples plus the
//! outbound links it asserts.
//!
//! Implementors supply the raw primitives (`load`, `save`, `purge`, `uids`
//! and the transaction hooks). The store contract proper is provided on top
//! of them and encodes the layout rules:
//! - A resource is live iff it carries `rdf:type ldp:Resource`
//! - A tombstone drops that type and carries either `rdf:type
//!   fcsystem:Tombstone` + `fcsystem:buried`, or `fcsystem:tombstone
//!   <ancestor>`
//! - Version snapshots live at `{uid}/fcr:versions/{label}`; they are never
//!   descendants or referrers
//! - Metadata is the administrative predicate subset plus all `rdf:type`
//!   triples

pub mod binary;
pub mod codec;
pub mod memory;
pub mod redb_store;

pub use binary::{BinaryStore, DirBinaryStore, MemoryBinaryStore};
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::imr::{Imr, TripleSet, is_subject};
use crate::primitives::{
    METADATA_PREDICATES, PROTECTED_PREDICATES, ROOT_UID, VERSION_LINK_PREDICATES, in_table,
    is_iri,
};
use crate::types::LdpError;
use crate::uid::{self, child_prefix, is_version_uid, uid_to_uri, version_uid, versions_uid};
use crate::vocab::{RDF_TYPE, fcrepo, fcsystem, ldp};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, Term, Triple};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// IMR OPTIONS
// =============================================================================

/// Representation options for `get_imr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImrOptions {
    /// Fetch this version snapshot instead of the live resource.
    pub version: Option<String>,
    /// Fail on tombstones.
    pub strict: bool,
    /// Merge triples of other resources pointing at this one.
    pub incl_inbound: bool,
    /// Keep `ldp:contains` triples.
    pub incl_children: bool,
}

impl Default for ImrOptions {
    fn default() -> Self {
        Self {
            version: None,
            strict: true,
            incl_inbound: false,
            incl_children: true,
        }
    }
}

impl ImrOptions {
    #[must_use]
    pub fn without_children() -> Self {
        Self {
            incl_children: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_inbound() -> Self {
        Self {
            incl_inbound: true,
            ..Self::default()
        }
    }
}

// =============================================================================
// RESOURCE STORE
// =============================================================================

/// Resource-centric triple store.
///
/// One write transaction per request: `begin` opens it, `commit` makes every
/// write since `begin` durable at once, `rollback` discards them.
pub trait ResourceStore {
    /// Graph stored under `uid`, if any.
    fn load(&self, uid: &str) -> Result<Option<TripleSet>, LdpError>;

    /// Replace the graph stored under `uid`. An empty set removes it.
    fn save(&mut self, uid: &str, triples: TripleSet) -> Result<(), LdpError>;

    /// Remove the graph stored under `uid`.
    fn purge(&mut self, uid: &str) -> Result<(), LdpError>;

    /// Every stored UID, sorted.
    fn uids(&self) -> Result<Vec<String>, LdpError>;

    fn begin(&mut self) -> Result<(), LdpError>;

    fn commit(&mut self) -> Result<(), LdpError>;

    fn rollback(&mut self) -> Result<(), LdpError>;

    // -------------------------------------------------------------------------
    // Store contract
    // -------------------------------------------------------------------------

    /// Whether a live resource (or a version snapshot) is stored at `uid`.
    fn ask_rsrc_exists(&self, uid: &str) -> Result<bool, LdpError> {
        let uri = uid_to_uri(uid);
        Ok(match self.load(uid)? {
            Some(triples) => is_version_uid(uid) || is_live(&triples, &uri),
            None => false,
        })
    }

    /// Administrative triples of `uid`.
    ///
    /// Fails `ResourceNotExists` if nothing is stored, and `Tombstone` if
    /// `strict` and the resource (or the ancestor it points to) was buried.
    fn get_metadata(&self, uid: &str, strict: bool) -> Result<Imr, LdpError> {
        let uri = uid_to_uri(uid);
        let triples = self
            .load(uid)?
            .ok_or_else(|| LdpError::ResourceNotExists(uid.to_string()))?;
        if strict {
            self.check_tombstone(uid, &triples)?;
        }
        Ok(Imr::from_triples(
            uri.clone(),
            triples.into_iter().filter(|t| {
                is_subject(t, &uri)
                    && (t.predicate.as_ref() == RDF_TYPE
                        || in_table(METADATA_PREDICATES, t.predicate.as_ref()))
            }),
        ))
    }

    /// Full graph of `uid` (or of one of its versions).
    fn get_imr(&self, uid: &str, opts: &ImrOptions) -> Result<Imr, LdpError> {
        let uri = uid_to_uri(uid);
        if let Some(label) = &opts.version {
            let ver_uid = version_uid(uid, label);
            let Some(triples) = self.load(&ver_uid)? else {
                return Err(LdpError::ResourceNotExists(ver_uid));
            };
            return Ok(Imr::from_triples(uid_to_uri(&ver_uid), triples));
        }

        let mut triples = self
            .load(uid)?
            .ok_or_else(|| LdpError::ResourceNotExists(uid.to_string()))?;
        if opts.strict {
            self.check_tombstone(uid, &triples)?;
        }
        if !opts.incl_children {
            triples.retain(|t| t.predicate.as_ref() != ldp::CONTAINS);
        }
        let mut imr = Imr::from_triples(uri.clone(), triples);
        if opts.incl_inbound {
            for inbound in self.get_referrers(&uri)?.into_values() {
                imr.extend(inbound);
            }
        }
        Ok(imr)
    }

    /// Remove `remove` from, then add `add` to, the graph of `uid`.
    fn modify_rsrc(&mut self, uid: &str, remove: &TripleSet, add: &TripleSet) -> Result<(), LdpError> {
        let mut triples = self.load(uid)?.unwrap_or_default();
        triples.retain(|t| !remove.contains(t));
        triples.extend(add.iter().cloned());
        self.save(uid, triples)
    }

    /// Drop every triple of `uid` except protected ones and version links.
    /// Returns the removed triples.
    fn truncate_rsrc(&mut self, uid: &str) -> Result<TripleSet, LdpError> {
        let Some(mut triples) = self.load(uid)? else {
            return Ok(TripleSet::new());
        };
        let removed: TripleSet = triples
            .iter()
            .filter(|t| {
                let p = t.predicate.as_ref();
                !in_table(PROTECTED_PREDICATES, p) && !in_table(VERSION_LINK_PREDICATES, p)
            })
            .cloned()
            .collect();
        triples.retain(|t| !removed.contains(t));
        self.save(uid, triples)?;
        Ok(removed)
    }

    /// URIs of every stored resource nested under `uid`, parents first.
    /// Version snapshots are excluded.
    fn get_descendants(&self, uid: &str) -> Result<Vec<NamedNode>, LdpError> {
        let prefix = child_prefix(uid);
        Ok(self
            .uids()?
            .into_iter()
            .filter(|u| u != uid && u.starts_with(&prefix) && !is_version_uid(u))
            .map(|u| uid_to_uri(&u))
            .collect())
    }

    /// Version metadata: `hasVersion` links and labels.
    fn get_version_info(&self, uid: &str) -> Result<Imr, LdpError> {
        let uri = uid_to_uri(uid);
        if self.load(uid)?.is_none() {
            return Err(LdpError::ResourceNotExists(uid.to_string()));
        }
        let mut info = Imr::new(uri.clone());
        for label in self.version_labels(uid)? {
            let ver_uri = uid_to_uri(&version_uid(uid, &label));
            info.insert(Triple::new(
                uri.clone(),
                fcrepo::HAS_VERSION.into_owned(),
                ver_uri.clone(),
            ));
            info.insert(Triple::new(
                ver_uri,
                fcrepo::HAS_VERSION_LABEL.into_owned(),
                Literal::new_simple_literal(label),
            ));
        }
        Ok(info)
    }

    /// Remove `uid`, its descendants and its version history for good. With
    /// `inbound`, links from other resources into the purged ones go too.
    fn forget_rsrc(&mut self, uid: &str, inbound: bool) -> Result<(), LdpError> {
        if uid == ROOT_UID {
            return Err(LdpError::invalid(uid, "the root cannot be forgotten"));
        }
        if self.load(uid)?.is_none() {
            return Err(LdpError::ResourceNotExists(uid.to_string()));
        }
        let prefix = child_prefix(uid);
        let doomed: BTreeSet<String> = self
            .uids()?
            .into_iter()
            .filter(|u| u == uid || u.starts_with(&prefix))
            .collect();
        for u in &doomed {
            self.purge(u)?;
        }

        if inbound {
            let doomed_uris: BTreeSet<String> =
                doomed.iter().map(|u| uid_to_uri(u).as_str().to_string()).collect();
            for other in self.uids()? {
                let Some(mut triples) = self.load(&other)? else {
                    continue;
                };
                let before = triples.len();
                triples.retain(|t| match &t.object {
                    Term::NamedNode(o) => !doomed_uris.contains(uid::defrag(o.as_str())),
                    _ => true,
                });
                if triples.len() != before {
                    self.save(&other, triples)?;
                }
            }
        }
        Ok(())
    }

    /// Triples in other resources' graphs whose object is `uri`, keyed by
    /// the UID of the graph holding them.
    fn get_referrers(&self, uri: &NamedNode) -> Result<BTreeMap<String, TripleSet>, LdpError> {
        let own = uid::uri_to_uid(uri.as_ref())?;
        let mut referrers = BTreeMap::new();
        for other in self.uids()? {
            if other == own || is_version_uid(&other) {
                continue;
            }
            let Some(triples) = self.load(&other)? else {
                continue;
            };
            let inbound: TripleSet = triples
                .into_iter()
                .filter(|t| matches!(&t.object, Term::NamedNode(o) if o == uri))
                .collect();
            if !inbound.is_empty() {
                referrers.insert(other, inbound);
            }
        }
        Ok(referrers)
    }

    /// Labels of the stored versions of `uid`, sorted.
    fn version_labels(&self, uid: &str) -> Result<Vec<String>, LdpError> {
        let prefix = child_prefix(&versions_uid(uid));
        Ok(self
            .uids()?
            .into_iter()
            .filter_map(|u| u.strip_prefix(&prefix).map(str::to_string))
            .filter(|label| !label.contains('/'))
            .collect())
    }

    fn uri_to_uid(&self, uri: NamedNodeRef<'_>) -> Result<String, LdpError> {
        uid::uri_to_uid(uri)
    }

    /// Fail `Tombstone` if `triples` mark `uid` as buried. A pointer
    /// tombstone is followed up to the ancestor holding the full tombstone,
    /// which is the one reported.
    fn check_tombstone(&self, uid: &str, triples: &TripleSet) -> Result<(), LdpError> {
        let uri = uid_to_uri(uid);
        let own = Imr::from_triples(uri, triples.iter().cloned());
        if own.has_type(fcsystem::TOMBSTONE_TYPE) {
            return Err(LdpError::Tombstone {
                uid: uid.to_string(),
                buried: own.value(fcsystem::BURIED).map(term_value),
            });
        }
        let Some(mut pointer) = own.iri_value(fcsystem::TOMBSTONE) else {
            return Ok(());
        };
        let mut seen = BTreeSet::from([uid.to_string()]);
        loop {
            let ancestor = uid::uri_to_uid(pointer.as_ref())?;
            let Some(stored) = self.load(&ancestor)? else {
                return Err(LdpError::Tombstone {
                    uid: ancestor,
                    buried: None,
                });
            };
            let anc = Imr::from_triples(pointer, stored);
            match anc.iri_value(fcsystem::TOMBSTONE) {
                Some(next) if seen.insert(ancestor.clone()) => pointer = next,
                _ => {
                    return Err(LdpError::Tombstone {
                        uid: ancestor,
                        buried: anc.value(fcsystem::BURIED).map(term_value),
                    });
                }
            }
        }
    }
}

/// Whether `triples` type `uri` as a live `ldp:Resource`.
#[must_use]
pub fn is_live(triples: &TripleSet, uri: &NamedNode) -> bool {
    triples
        .iter()
        .any(|t| is_subject(t, uri) && t.predicate.as_ref() == RDF_TYPE && is_iri(&t.object, ldp::RESOURCE))
}

fn term_value(term: &Term) -> String {
    match term {
        Term::Literal(l) => l.value().to_string(),
        other => other.to_string(),
    }
}
