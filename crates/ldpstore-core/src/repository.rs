//! # Repository
//!
//! Request-level entry points. Each public operation runs in its own
//! transaction: writes are staged in the store and committed together, and
//! change events reach the changelog only for requests that commit. A failed
//! request rolls back the store and drops every event it produced.
//!
//! Binary content is content-addressed and written outside the transaction;
//! a rollback may leave an unreferenced blob behind, never a dangling link.

use crate::config::RepoConfig;
use crate::context::Context;
use crate::factory::{Payload, ResourceFactory};
use crate::imr::{Imr, TripleSet};
use crate::notifier::{Changelog, TaskQueue};
use crate::rdf::digest_hex;
use crate::resource::Resource;
use crate::store::{BinaryStore, ImrOptions, ResourceStore};
use crate::types::{EventKind, Handling, LdpError, LdpVariant};
use crate::vocab::premis;
use chrono::Utc;
use oxigraph::model::NamedNode;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// A resource repository over a resource store and a binary sink.
#[derive(Debug)]
pub struct Repository<S, B> {
    store: S,
    binaries: B,
    changelog: Changelog,
    config: RepoConfig,
}

impl<S: ResourceStore, B: BinaryStore> Repository<S, B> {
    /// Open a repository, creating the root container if the store is empty.
    pub fn open(store: S, binaries: B, config: RepoConfig) -> Result<Self, LdpError> {
        let mut repo = Self {
            store,
            binaries,
            changelog: Changelog::new(),
            config,
        };
        let created = repo.transaction(true, ResourceFactory::bootstrap)?;
        debug!(created, "repository opened");
        Ok(repo)
    }

    /// Run `op` as one request.
    ///
    /// Write requests commit on success and roll back on failure. Events
    /// appended by a failed request are discarded.
    pub fn transaction<T>(
        &mut self,
        write: bool,
        op: impl FnOnce(&mut Context<'_>) -> Result<T, LdpError>,
    ) -> Result<T, LdpError> {
        let mark = self.changelog.mark();
        if write {
            self.store.begin()?;
        }

        let result = {
            let mut ctx = Context::new(
                &mut self.store,
                &mut self.binaries,
                &mut self.changelog,
                &self.config,
                Utc::now(),
            );
            op(&mut ctx)
        };
        let result = match result {
            Ok(value) if write => self.store.commit().map(|()| value),
            other => other,
        };

        if let Err(e) = &result {
            let rolled_back = if write {
                self.store.rollback()
            } else {
                Ok(())
            };
            if let Err(rb) = rolled_back {
                warn!(error = %rb, "rollback failed");
            }
            self.changelog.truncate(mark);
            warn!(error = %e, write, "request failed");
        }
        result
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Whether a live resource exists at `uid`.
    pub fn exists(&mut self, uid: &str) -> Result<bool, LdpError> {
        self.transaction(false, |ctx| ctx.store.ask_rsrc_exists(uid))
    }

    /// Output graph of `uid` under `opts`. Server-managed triples are
    /// included only with `incl_srv_mgd`.
    pub fn get(&mut self, uid: &str, opts: ImrOptions, incl_srv_mgd: bool) -> Result<Imr, LdpError> {
        self.transaction(false, |ctx| {
            let mut rsrc = ResourceFactory::from_stored(ctx, uid, opts.version.as_deref(), opts.strict)?
                .with_options(opts);
            rsrc.out_graph(ctx, incl_srv_mgd)
        })
    }

    /// Administrative metadata of a live resource.
    pub fn get_metadata(&mut self, uid: &str) -> Result<Imr, LdpError> {
        self.transaction(false, |ctx| {
            let mut rsrc = ResourceFactory::from_stored(ctx, uid, None, true)?;
            Ok(rsrc.metadata(ctx)?.clone())
        })
    }

    /// Protocol headers of a live resource.
    pub fn head(&mut self, uid: &str) -> Result<BTreeMap<String, Vec<String>>, LdpError> {
        self.transaction(false, |ctx| {
            ResourceFactory::from_stored(ctx, uid, None, true)?.head(ctx)
        })
    }

    /// Variant of a live resource.
    pub fn variant(&mut self, uid: &str) -> Result<LdpVariant, LdpError> {
        self.transaction(false, |ctx| {
            Ok(ResourceFactory::from_stored(ctx, uid, None, true)?.variant())
        })
    }

    /// Version links and labels of a live resource.
    pub fn get_version_info(&mut self, uid: &str) -> Result<Imr, LdpError> {
        self.transaction(false, |ctx| {
            let mut rsrc = ResourceFactory::from_stored(ctx, uid, None, true)?;
            Ok(rsrc.version_info(ctx)?.clone())
        })
    }

    /// Snapshot graph of version `label` of `uid`.
    pub fn get_version(&mut self, uid: &str, label: &str) -> Result<Imr, LdpError> {
        self.transaction(false, |ctx| {
            ResourceFactory::from_stored(ctx, uid, None, true)?.get_version(ctx, label)
        })
    }

    /// Labels of every version of `uid`.
    pub fn version_uids(&mut self, uid: &str) -> Result<BTreeSet<String>, LdpError> {
        self.transaction(false, |ctx| {
            ResourceFactory::from_stored(ctx, uid, None, true)?.version_uids(ctx)
        })
    }

    /// Stored bytes of a non-RDF source.
    pub fn get_binary(&mut self, uid: &str) -> Result<Option<Vec<u8>>, LdpError> {
        self.transaction(false, |ctx| {
            let mut rsrc = ResourceFactory::from_stored(ctx, uid, None, true)?;
            if rsrc.variant() != LdpVariant::NonRdfSource {
                return Err(LdpError::invalid(uid, "not a non-RDF source"));
            }
            let digest = rsrc
                .metadata(ctx)?
                .value(premis::HAS_MESSAGE_DIGEST)
                .and_then(digest_hex)
                .map(str::to_string);
            match digest {
                Some(hex) => ctx.binaries.fetch(&hex),
                None => Ok(None),
            }
        })
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Create a new child of `parent`. `slug` is a requested path segment.
    /// Returns the new UID.
    pub fn create(
        &mut self,
        parent: &str,
        slug: Option<&str>,
        payload: Payload,
    ) -> Result<String, LdpError> {
        self.transaction(true, |ctx| {
            let uid = ResourceFactory::mint_uid(ctx, parent, slug)?;
            let mut rsrc = ResourceFactory::from_provided(ctx, &uid, payload)?;
            rsrc.create_or_replace(ctx, true)?;
            info!(uid = %uid, "created resource");
            Ok(uid)
        })
    }

    /// Create the resource at `uid`, or replace it if it exists.
    pub fn create_or_replace(&mut self, uid: &str, payload: Payload) -> Result<EventKind, LdpError> {
        self.transaction(true, |ctx| {
            ResourceFactory::from_provided(ctx, uid, payload)?.create_or_replace(ctx, false)
        })
    }

    /// Apply a SPARQL Update to `uid`. Binary resources only accept
    /// metadata updates. An update with no net change writes nothing and
    /// emits no event.
    pub fn update(
        &mut self,
        uid: &str,
        query: &str,
        is_metadata: bool,
        handling: Handling,
    ) -> Result<EventKind, LdpError> {
        self.transaction(true, |ctx| {
            let mut rsrc =
                ResourceFactory::from_stored(ctx, uid, None, true)?.with_handling(handling);
            if rsrc.variant() == LdpVariant::NonRdfSource && !is_metadata {
                return Err(LdpError::invalid(
                    uid,
                    "binary content cannot be updated with SPARQL",
                ));
            }
            let (remove, add) = rsrc.sparql_delta(ctx, query)?;
            if remove.is_empty() && add.is_empty() {
                debug!(uid, "update has no net change");
                return Ok(EventKind::Updated);
            }
            rsrc.modify(ctx, Some(EventKind::Updated), &remove, &add)?;
            Ok(EventKind::Updated)
        })
    }

    /// Apply explicit triple sets to `uid`. Both sets are sanitized.
    pub fn update_delta(
        &mut self,
        uid: &str,
        mut remove: TripleSet,
        mut add: TripleSet,
    ) -> Result<EventKind, LdpError> {
        self.transaction(true, |ctx| {
            let mut rsrc = ResourceFactory::from_stored(ctx, uid, None, true)?;
            rsrc.check_mgd_terms(ctx, &mut remove)?;
            rsrc.check_mgd_terms(ctx, &mut add)?;
            rsrc.modify(ctx, Some(EventKind::Updated), &remove, &add)?;
            Ok(EventKind::Updated)
        })
    }

    /// Snapshot `uid`. Returns the version label actually used.
    pub fn create_version(&mut self, uid: &str, label: Option<&str>) -> Result<String, LdpError> {
        self.transaction(true, |ctx| {
            ResourceFactory::from_stored(ctx, uid, None, true)?.create_version(ctx, label, true)
        })
    }

    /// Delete `uid`: `soft` leaves tombstones, otherwise every trace is
    /// purged. Inbound links are always cut when referential integrity is
    /// enabled.
    pub fn delete(&mut self, uid: &str, soft: bool, inbound: bool) -> Result<EventKind, LdpError> {
        let inbound = inbound || self.config.referential_integrity.is_enabled();
        self.transaction(true, |ctx| {
            if soft {
                let rsrc = ResourceFactory::from_stored(ctx, uid, None, true)?;
                let mut rsrc = if inbound { rsrc.with_inbound() } else { rsrc };
                rsrc.bury(ctx, inbound, None)
            } else {
                Resource::forget(ctx, uid, inbound)
            }
        })
    }

    /// Revert `uid` to version `label`, versioning the current state first
    /// when `backup` is set.
    pub fn revert_to_version(
        &mut self,
        uid: &str,
        label: &str,
        backup: bool,
    ) -> Result<EventKind, LdpError> {
        self.transaction(true, |ctx| {
            ResourceFactory::from_stored(ctx, uid, None, true)?.revert_to_version(ctx, label, backup)
        })
    }

    /// Reinstate a buried resource. Only the resource holding the full
    /// tombstone can be resurrected; descendants come back with it.
    pub fn resurrect(&mut self, uid: &str) -> Result<NamedNode, LdpError> {
        self.transaction(true, |ctx| {
            match ResourceFactory::from_stored(ctx, uid, None, true) {
                Ok(_) => Err(LdpError::invalid(uid, "resource is not dead")),
                Err(LdpError::Tombstone { uid: buried, .. }) if buried == uid => {
                    ResourceFactory::from_stored(ctx, uid, None, false)?.resurrect(ctx)
                }
                Err(e) => Err(e),
            }
        })
    }

    /// Purge `uid`, its descendants and versions without a tombstone.
    pub fn forget(&mut self, uid: &str, inbound: bool) -> Result<EventKind, LdpError> {
        self.transaction(true, |ctx| Resource::forget(ctx, uid, inbound))
    }

    // =========================================================================
    // NOTIFICATION + ACCESSORS
    // =========================================================================

    /// Deliver committed events to `queue`. Returns the number delivered.
    pub fn dispatch(&mut self, queue: &mut dyn TaskQueue) -> Result<usize, LdpError> {
        let delivered = self.changelog.flush_into(queue)?;
        debug!(delivered, "dispatched change events");
        Ok(delivered)
    }

    #[must_use]
    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }

    #[must_use]
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn binaries(&self) -> &B {
        &self.binaries
    }

    /// Consume the repository, returning its store and binary sink.
    pub fn into_parts(self) -> (S, B) {
        (self.store, self.binaries)
    }
}
