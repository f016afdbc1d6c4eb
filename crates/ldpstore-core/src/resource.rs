//! # Resource Lifecycle
//!
//! One `Resource` type covers every LDP interaction model; the variant tag
//! decides base types and membership propagation. A resource is a short-lived
//! working object: it caches stored views for the duration of one request and
//! drops them after every mutation it makes.
//!
//! Lifecycle:
//! - `create_or_replace`: stamp server-managed triples, check links, write
//! - `bury`: turn the resource and its descendants into tombstones
//! - `resurrect`: bring a tombstone (and its descendants) back
//! - `forget`: purge every trace from the store

use crate::context::Context;
use crate::factory::ResourceFactory;
use crate::imr::{Imr, TripleSet};
use crate::integrity::check_ref_int;
use crate::primitives::{
    BASE_TYPES, CONTAINER_TYPES, NON_RDF_SOURCE_TYPES, OUTPUT_HIDDEN_PREDICATES, RDF_SOURCE_TYPES,
    ROOT_UID, STRUCTURAL_PREDICATES, TOMBSTONE_PREDICATES, in_table, is_trp_managed,
};
use crate::rdf::{DIGEST_PREFIX, digest_bytes, digest_graph, digest_hex, long_literal, parse_datetime};
use crate::store::ImrOptions;
use crate::types::{EventKind, Handling, LdpError, LdpVariant};
use crate::uid::uid_to_uri;
use crate::vocab::{RDF_TYPE, ebucore, fcrepo, fcsystem, ldp, premis};
use oxigraph::model::{Literal, NamedNode, NamedNodeRef, Term, Triple};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

// =============================================================================
// RESOURCE
// =============================================================================

/// Binary stream attached to a non-RDF source payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub bytes: Vec<u8>,
    pub mimetype: String,
}

/// Stored views fetched lazily and dropped after each mutation.
#[derive(Debug, Clone, Default)]
struct Cache {
    is_stored: Option<bool>,
    imr: Option<Imr>,
    metadata: Option<Imr>,
    version_info: Option<Imr>,
}

/// A repository resource addressed by UID.
#[derive(Debug, Clone)]
pub struct Resource {
    uid: String,
    uri: NamedNode,
    variant: LdpVariant,
    handling: Handling,
    opts: ImrOptions,
    pub(crate) provided: Option<Imr>,
    pub(crate) binary: Option<Binary>,
    cache: Cache,
}

impl Resource {
    pub(crate) fn new(uid: &str, variant: LdpVariant) -> Self {
        Self {
            uid: uid.to_string(),
            uri: uid_to_uri(uid),
            variant,
            handling: Handling::default(),
            opts: ImrOptions::default(),
            provided: None,
            binary: None,
            cache: Cache::default(),
        }
    }

    #[must_use]
    pub(crate) fn with_handling(mut self, handling: Handling) -> Self {
        self.handling = handling;
        self
    }

    #[must_use]
    pub(crate) fn with_options(mut self, opts: ImrOptions) -> Self {
        self.opts = opts;
        self.invalidate();
        self
    }

    #[must_use]
    pub(crate) fn with_provided(mut self, provided: Imr) -> Self {
        self.provided = Some(provided);
        self
    }

    /// Seed the metadata cache with a view fetched under the same options.
    pub(crate) fn prime_metadata(&mut self, metadata: Imr) {
        self.cache.metadata = Some(metadata);
    }

    /// Do not load `ldp:contains` triples into the IMR.
    #[must_use]
    pub fn without_children(mut self) -> Self {
        self.opts.incl_children = false;
        self.cache.imr = None;
        self
    }

    /// Merge inbound references into the IMR.
    #[must_use]
    pub fn with_inbound(mut self) -> Self {
        self.opts.incl_inbound = true;
        self.cache.imr = None;
        self
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub fn uri(&self) -> &NamedNode {
        &self.uri
    }

    #[must_use]
    pub fn variant(&self) -> LdpVariant {
        self.variant
    }

    #[must_use]
    pub fn handling(&self) -> Handling {
        self.handling
    }

    #[must_use]
    pub fn options(&self) -> &ImrOptions {
        &self.opts
    }

    /// The client-provided payload, if any.
    #[must_use]
    pub fn provided(&self) -> Option<&Imr> {
        self.provided.as_ref()
    }

    /// Drop every cached stored view.
    pub fn invalidate(&mut self) {
        self.cache = Cache::default();
    }

    // -------------------------------------------------------------------------
    // Stored views
    // -------------------------------------------------------------------------

    /// Whether a live resource is stored at this UID.
    pub fn is_stored(&mut self, ctx: &Context<'_>) -> Result<bool, LdpError> {
        if let Some(stored) = self.cache.is_stored {
            return Ok(stored);
        }
        let stored = ctx.store.ask_rsrc_exists(&self.uid)?;
        self.cache.is_stored = Some(stored);
        Ok(stored)
    }

    /// Full stored representation, fetched with this resource's options.
    pub fn imr(&mut self, ctx: &Context<'_>) -> Result<&Imr, LdpError> {
        let imr = match self.cache.imr.take() {
            Some(imr) => imr,
            None => ctx.store.get_imr(&self.uid, &self.opts)?,
        };
        Ok(self.cache.imr.insert(imr))
    }

    /// Administrative subset of the stored representation.
    pub fn metadata(&mut self, ctx: &Context<'_>) -> Result<&Imr, LdpError> {
        let metadata = match self.cache.metadata.take() {
            Some(metadata) => metadata,
            None => ctx.store.get_metadata(&self.uid, self.opts.strict)?,
        };
        Ok(self.cache.metadata.insert(metadata))
    }

    /// Version links and labels of the resource.
    pub fn version_info(&mut self, ctx: &Context<'_>) -> Result<&Imr, LdpError> {
        let info = match self.cache.version_info.take() {
            Some(info) => info,
            None => ctx.store.get_version_info(&self.uid)?,
        };
        Ok(self.cache.version_info.insert(info))
    }

    /// Labels of every stored version.
    pub fn version_uids(&mut self, ctx: &Context<'_>) -> Result<BTreeSet<String>, LdpError> {
        let info = match self.version_info(ctx) {
            Ok(info) => info,
            Err(LdpError::ResourceNotExists(_)) => return Ok(BTreeSet::new()),
            Err(e) => return Err(e),
        };
        Ok(info
            .triples()
            .iter()
            .filter(|t| t.predicate.as_ref() == fcrepo::HAS_VERSION_LABEL)
            .filter_map(|t| match &t.object {
                Term::Literal(l) => Some(l.value().to_string()),
                _ => None,
            })
            .collect())
    }

    /// `rdf:type` values: stored ones when the resource exists, otherwise
    /// those of the provided payload.
    pub fn types(&mut self, ctx: &Context<'_>) -> Result<Vec<NamedNode>, LdpError> {
        match self.metadata(ctx) {
            Ok(meta) if !meta.is_empty() => return Ok(meta.types()),
            Ok(_) => {}
            Err(e) if e.is_gone() => {}
            Err(e) => return Err(e),
        }
        Ok(self.provided.as_ref().map(Imr::types).unwrap_or_default())
    }

    /// Types within the LDP namespace.
    pub fn ldp_types(&mut self, ctx: &Context<'_>) -> Result<Vec<NamedNode>, LdpError> {
        Ok(self
            .types(ctx)?
            .into_iter()
            .filter(|t| t.as_str().starts_with(ldp::NS))
            .collect())
    }

    /// Output graph: the IMR minus hidden predicates. Server-managed
    /// triples are dropped unless `incl_srv_mgd`.
    pub fn out_graph(&mut self, ctx: &Context<'_>, incl_srv_mgd: bool) -> Result<Imr, LdpError> {
        let mut out = self.imr(ctx)?.clone();
        out.retain(|t| {
            !in_table(OUTPUT_HIDDEN_PREDICATES, t.predicate.as_ref())
                && (incl_srv_mgd || !is_trp_managed(t))
        });
        Ok(out)
    }

    /// Protocol headers derived from the stored metadata.
    pub fn head(&mut self, ctx: &Context<'_>) -> Result<BTreeMap<String, Vec<String>>, LdpError> {
        let meta = self.metadata(ctx)?.clone();
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if let Some(hex) = meta.value(premis::HAS_MESSAGE_DIGEST).and_then(digest_hex) {
            headers.insert("ETag".into(), vec![format!("W/\"{hex}\"")]);
        }
        if let Some(ts) = meta.value(fcrepo::LAST_MODIFIED).and_then(parse_datetime) {
            headers.insert(
                "Last-Modified".into(),
                vec![ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()],
            );
        }
        if let Some(Term::Literal(mimetype)) = meta.value(ebucore::HAS_MIME_TYPE) {
            headers.insert("Content-Type".into(), vec![mimetype.value().to_string()]);
        }
        let links = meta
            .ldp_types()
            .iter()
            .map(|t| format!("<{}>;rel=\"type\"", t.as_str()))
            .collect::<Vec<_>>();
        if !links.is_empty() {
            headers.insert("Link".into(), links);
        }
        Ok(headers)
    }

    /// Snapshot graph of version `label`.
    pub fn get_version(&self, ctx: &Context<'_>, label: &str) -> Result<Imr, LdpError> {
        let opts = ImrOptions {
            version: Some(label.to_string()),
            ..ImrOptions::default()
        };
        ctx.store.get_imr(&self.uid, &opts)
    }

    // -------------------------------------------------------------------------
    // Create / replace
    // -------------------------------------------------------------------------

    /// Create the resource, or replace its user data if it already exists.
    ///
    /// With `create_only` an existing live resource fails `ResourceExists`.
    /// A tombstone at the UID is never overwritten.
    pub fn create_or_replace(
        &mut self,
        ctx: &mut Context<'_>,
        create_only: bool,
    ) -> Result<EventKind, LdpError> {
        let stored = self.is_stored(ctx)?;
        if create_only && stored {
            return Err(LdpError::ResourceExists(self.uid.clone()));
        }
        let create = create_only || !stored;
        let tombstone = if create {
            ctx.store
                .get_metadata(&self.uid, true)
                .err()
                .filter(|e| matches!(e, LdpError::Tombstone { .. }))
        } else {
            None
        };
        if let Some(e) = tombstone {
            return Err(e);
        }
        let ev = if create {
            EventKind::Created
        } else {
            EventKind::Updated
        };
        info!(uid = %self.uid, variant = %self.variant, create, "writing resource");

        let mut provided = self.provided.take().ok_or_else(|| {
            LdpError::InvalidPayload(format!("no payload provided for {}", self.uid))
        })?;
        self.add_srv_mgd_triples(ctx, &mut provided, create)?;
        let refint = ctx.config.referential_integrity;
        check_ref_int(ctx, &self.uri, provided.triples_mut(), refint)?;

        let removed = if create {
            TripleSet::new()
        } else {
            let removed = ctx.store.truncate_rsrc(&self.uid)?;
            self.invalidate();
            removed
        };

        let mut add = provided.triples().clone();
        self.provided = Some(provided);
        add.extend(self.containment_rel(ctx, create)?);

        let remove: TripleSet = removed.difference(&add).cloned().collect();
        self.modify(ctx, Some(ev), &remove, &add)?;
        Ok(ev)
    }

    /// Stamp types, timestamps, actors and digests onto `provided`.
    ///
    /// The RDF digest covers the user payload only, so it is computed before
    /// anything else is added.
    fn add_srv_mgd_triples(
        &mut self,
        ctx: &mut Context<'_>,
        provided: &mut Imr,
        create: bool,
    ) -> Result<(), LdpError> {
        if self.variant == LdpVariant::NonRdfSource {
            self.stamp_binary(ctx, provided, create)?;
        } else {
            provided.set(premis::HAS_MESSAGE_DIGEST, digest_graph(provided.triples()));
        }

        for rdf_type in base_types(self.variant) {
            provided.add(RDF_TYPE, rdf_type.into_owned());
        }

        if create {
            provided.set(fcrepo::CREATED, ctx.timestamp_term());
            provided.set(fcrepo::CREATED_BY, ctx.actor());
        } else {
            let meta = self.metadata(ctx)?.clone();
            for pred in [fcrepo::CREATED, fcrepo::CREATED_BY] {
                if let Some(value) = meta.value(pred) {
                    provided.set(pred, value.clone());
                }
            }
        }
        provided.set(fcrepo::LAST_MODIFIED, ctx.timestamp_term());
        provided.set(fcrepo::LAST_MODIFIED_BY, ctx.actor());
        Ok(())
    }

    /// Persist the binary stream and describe it. Without a new stream an
    /// existing binary keeps its current description.
    fn stamp_binary(
        &mut self,
        ctx: &mut Context<'_>,
        provided: &mut Imr,
        create: bool,
    ) -> Result<(), LdpError> {
        match self.binary.take() {
            Some(binary) => {
                let digest = digest_bytes(&binary.bytes);
                let hex = digest
                    .as_str()
                    .strip_prefix(DIGEST_PREFIX)
                    .unwrap_or_default()
                    .to_string();
                ctx.binaries.persist(&hex, &binary.bytes)?;
                debug!(uid = %self.uid, digest = %hex, size = binary.bytes.len(), "persisted binary");
                provided.set(
                    ebucore::HAS_MIME_TYPE,
                    Literal::new_simple_literal(binary.mimetype.as_str()),
                );
                provided.set(premis::HAS_SIZE, long_literal(binary.bytes.len() as u64));
                provided.set(premis::HAS_MESSAGE_DIGEST, digest);
                self.binary = Some(binary);
            }
            None if !create => {
                let meta = self.metadata(ctx)?.clone();
                for pred in [ebucore::HAS_MIME_TYPE, premis::HAS_SIZE, premis::HAS_MESSAGE_DIGEST] {
                    if let Some(value) = meta.value(pred) {
                        provided.set(pred, value.clone());
                    }
                }
            }
            None => {
                return Err(LdpError::InvalidPayload(format!(
                    "a binary stream is required to create {}",
                    self.uid
                )));
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    /// Bury the resource and every live descendant.
    ///
    /// The resource gets a full tombstone unless `pointer` names the buried
    /// ancestor it descends from; every descendant points to its nearest
    /// buried ancestor.
    /// With `inbound`, links from other live resources are versioned and then
    /// cut.
    pub fn bury(
        &mut self,
        ctx: &mut Context<'_>,
        inbound: bool,
        pointer: Option<&NamedNode>,
    ) -> Result<EventKind, LdpError> {
        if self.uid == ROOT_UID {
            return Err(LdpError::invalid(ROOT_UID, "the root cannot be deleted"));
        }
        info!(uid = %self.uid, inbound, pointer = ?pointer.map(NamedNode::as_str), "burying resource");

        let remove = own_triples(&self.uri, [(RDF_TYPE, ldp::RESOURCE.into_owned().into())]);
        let add = match pointer {
            Some(ancestor) => own_triples(&self.uri, [(fcsystem::TOMBSTONE, ancestor.clone().into())]),
            None => own_triples(
                &self.uri,
                [
                    (RDF_TYPE, fcsystem::TOMBSTONE_TYPE.into_owned().into()),
                    (fcsystem::BURIED, ctx.timestamp_term().into()),
                ],
            ),
        };

        // Shallowest first: a nested descendant is buried by its own parent
        // and skipped here once it is gone.
        let mut desc_uids = ctx
            .store
            .get_descendants(&self.uid)?
            .iter()
            .map(|u| ctx.store.uri_to_uid(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        desc_uids.sort_by_key(|u| u.matches('/').count());
        for desc_uid in desc_uids {
            let mut desc = match ResourceFactory::from_stored(ctx, &desc_uid, None, true) {
                Ok(desc) => desc.without_children(),
                Err(e) if e.is_gone() => continue,
                Err(e) => return Err(e),
            };
            desc.bury(ctx, inbound, Some(&self.uri))?;
        }

        if inbound {
            self.cut_inbound(ctx)?;
        }

        self.modify(ctx, Some(EventKind::Deleted), &remove, &add)?;
        Ok(EventKind::Deleted)
    }

    /// Version, then remove, every link from a live resource to this one.
    fn cut_inbound(&mut self, ctx: &mut Context<'_>) -> Result<(), LdpError> {
        for (ref_uid, links) in ctx.store.get_referrers(&self.uri)? {
            let links: TripleSet = links
                .into_iter()
                .filter(|t| !in_table(STRUCTURAL_PREDICATES, t.predicate.as_ref()))
                .collect();
            if links.is_empty() {
                continue;
            }
            let mut referrer = match ResourceFactory::from_stored(ctx, &ref_uid, None, true) {
                Ok(referrer) => referrer,
                Err(e) if e.is_gone() => continue,
                Err(e) => return Err(e),
            };
            debug!(referrer = %ref_uid, links = links.len(), "removing inbound links");
            referrer.create_version(ctx, None, true)?;
            referrer.modify(ctx, Some(EventKind::Updated), &links, &TripleSet::new())?;
        }
        Ok(())
    }

    /// Bring a tombstone back to life, with every buried descendant.
    pub fn resurrect(&mut self, ctx: &mut Context<'_>) -> Result<NamedNode, LdpError> {
        info!(uid = %self.uid, "resurrecting resource");
        let stored = ctx.store.get_metadata(&self.uid, false)?;
        let mut remove = own_triples(&self.uri, [(RDF_TYPE, fcsystem::TOMBSTONE_TYPE.into_owned().into())]);
        remove.extend(
            stored
                .iter()
                .filter(|t| in_table(TOMBSTONE_PREDICATES, t.predicate.as_ref()))
                .cloned(),
        );
        let add = own_triples(&self.uri, [(RDF_TYPE, ldp::RESOURCE.into_owned().into())]);
        self.modify(ctx, Some(EventKind::Created), &remove, &add)?;

        for desc_uri in ctx.store.get_descendants(&self.uid)? {
            let desc_uid = ctx.store.uri_to_uid(desc_uri.as_ref())?;
            if ctx.store.ask_rsrc_exists(&desc_uid)? {
                continue;
            }
            ResourceFactory::from_stored(ctx, &desc_uid, None, false)?.resurrect(ctx)?;
        }
        Ok(self.uri.clone())
    }

    /// Purge `uid`, its descendants and versions. Emits no event.
    pub fn forget(ctx: &mut Context<'_>, uid: &str, inbound: bool) -> Result<EventKind, LdpError> {
        info!(uid, inbound, "forgetting resource");
        ctx.store.forget_rsrc(uid, inbound)?;
        Ok(EventKind::Deleted)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Base types stamped on every resource of `variant`.
#[must_use]
pub fn base_types(variant: LdpVariant) -> Vec<NamedNodeRef<'static>> {
    let mut types = BASE_TYPES.to_vec();
    match variant {
        LdpVariant::NonRdfSource => types.extend_from_slice(NON_RDF_SOURCE_TYPES),
        LdpVariant::RdfSource => types.extend_from_slice(RDF_SOURCE_TYPES),
        LdpVariant::BasicContainer => {
            types.extend_from_slice(RDF_SOURCE_TYPES);
            types.extend_from_slice(CONTAINER_TYPES);
            types.push(ldp::BASIC_CONTAINER);
        }
        LdpVariant::DirectContainer => {
            types.extend_from_slice(RDF_SOURCE_TYPES);
            types.extend_from_slice(CONTAINER_TYPES);
            types.push(ldp::DIRECT_CONTAINER);
        }
        LdpVariant::IndirectContainer => {
            types.extend_from_slice(RDF_SOURCE_TYPES);
            types.extend_from_slice(CONTAINER_TYPES);
            types.push(ldp::INDIRECT_CONTAINER);
        }
    }
    types
}

fn own_triples<const N: usize>(
    uri: &NamedNode,
    pairs: [(NamedNodeRef<'static>, Term); N],
) -> TripleSet {
    pairs
        .into_iter()
        .map(|(p, o)| Triple::new(uri.clone(), p.into_owned(), o))
        .collect()
}
