//! # In-Memory Store
//!
//! `BTreeMap`-backed resource store. A transaction snapshots the map on
//! `begin` and restores it on `rollback`.

use super::ResourceStore;
use crate::imr::TripleSet;
use crate::types::LdpError;
use std::collections::BTreeMap;

/// Volatile resource store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    resources: BTreeMap<String, TripleSet>,
    snapshot: Option<BTreeMap<String, TripleSet>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored graphs (resources, tombstones and versions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl ResourceStore for MemoryStore {
    fn load(&self, uid: &str) -> Result<Option<TripleSet>, LdpError> {
        Ok(self.resources.get(uid).cloned())
    }

    fn save(&mut self, uid: &str, triples: TripleSet) -> Result<(), LdpError> {
        if triples.is_empty() {
            self.resources.remove(uid);
        } else {
            self.resources.insert(uid.to_string(), triples);
        }
        Ok(())
    }

    fn purge(&mut self, uid: &str) -> Result<(), LdpError> {
        self.resources.remove(uid);
        Ok(())
    }

    fn uids(&self) -> Result<Vec<String>, LdpError> {
        Ok(self.resources.keys().cloned().collect())
    }

    fn begin(&mut self) -> Result<(), LdpError> {
        if self.snapshot.is_some() {
            return Err(LdpError::Storage("transaction already open".to_string()));
        }
        self.snapshot = Some(self.resources.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LdpError> {
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LdpError> {
        if let Some(snapshot) = self.snapshot.take() {
            self.resources = snapshot;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::store::ImrOptions;
    use crate::uid::uid_to_uri;
    use crate::vocab::{RDF_TYPE, fcsystem, ldp};
    use oxigraph::model::{Literal, Triple};

    fn live(uid: &str) -> TripleSet {
        let mut set = TripleSet::new();
        set.insert(Triple::new(
            uid_to_uri(uid),
            RDF_TYPE.into_owned(),
            ldp::RESOURCE.into_owned(),
        ));
        set
    }

    #[test]
    fn rollback_restores_snapshot() {
        let mut store = MemoryStore::new();
        store.save("/a", live("/a")).expect("save");
        store.begin().expect("begin");
        store.save("/b", live("/b")).expect("save");
        store.purge("/a").expect("purge");
        store.rollback().expect("rollback");
        assert!(store.ask_rsrc_exists("/a").expect("ask"));
        assert!(!store.ask_rsrc_exists("/b").expect("ask"));
        assert!(!store.in_transaction());
    }

    #[test]
    fn nested_begin_rejected() {
        let mut store = MemoryStore::new();
        store.begin().expect("begin");
        assert!(matches!(store.begin(), Err(LdpError::Storage(_))));
    }

    #[test]
    fn descendants_skip_versions_and_self() {
        let mut store = MemoryStore::new();
        for uid in ["/a", "/a/b", "/a/b/c", "/a/fcr:versions/v1", "/ab"] {
            store.save(uid, live(uid)).expect("save");
        }
        let desc: Vec<String> = store
            .get_descendants("/a")
            .expect("descendants")
            .iter()
            .map(|u| u.as_str().to_string())
            .collect();
        assert_eq!(desc, vec!["info:fcres/a/b", "info:fcres/a/b/c"]);
    }

    #[test]
    fn pointer_tombstone_reports_ancestor() {
        let mut store = MemoryStore::new();
        let mut anc = TripleSet::new();
        anc.insert(Triple::new(
            uid_to_uri("/a"),
            RDF_TYPE.into_owned(),
            fcsystem::TOMBSTONE_TYPE.into_owned(),
        ));
        anc.insert(Triple::new(
            uid_to_uri("/a"),
            fcsystem::BURIED.into_owned(),
            Literal::new_simple_literal("2024-01-01T00:00:00Z"),
        ));
        store.save("/a", anc).expect("save");
        let mut desc = TripleSet::new();
        desc.insert(Triple::new(
            uid_to_uri("/a/b"),
            fcsystem::TOMBSTONE.into_owned(),
            uid_to_uri("/a"),
        ));
        store.save("/a/b", desc).expect("save");

        match store.get_imr("/a/b", &ImrOptions::default()) {
            Err(LdpError::Tombstone { uid, buried }) => {
                assert_eq!(uid, "/a");
                assert_eq!(buried.as_deref(), Some("2024-01-01T00:00:00Z"));
            }
            other => panic!("expected tombstone, got {other:?}"),
        }
        let lenient = ImrOptions {
            strict: false,
            ..ImrOptions::default()
        };
        assert!(store.get_imr("/a/b", &lenient).is_ok());
    }

    #[test]
    fn forget_purges_subtree_and_inbound() {
        let mut store = MemoryStore::new();
        for uid in ["/a", "/a/b", "/a/fcr:versions/v1", "/c"] {
            store.save(uid, live(uid)).expect("save");
        }
        let link = Triple::new(
            uid_to_uri("/c"),
            oxigraph::model::NamedNode::new_unchecked("urn:rel"),
            uid_to_uri("/a/b"),
        );
        let mut add = TripleSet::new();
        add.insert(link.clone());
        store.modify_rsrc("/c", &TripleSet::new(), &add).expect("modify");

        store.forget_rsrc("/a", true).expect("forget");
        assert_eq!(store.uids().expect("uids"), vec!["/c".to_string()]);
        let c = store.load("/c").expect("load").expect("stored");
        assert!(!c.contains(&link));
    }
}
