//! # Resource Factory
//!
//! Decides which resource variant to instantiate for a UID, from stored
//! types or from a client payload, and mints UIDs for new children.

use crate::context::Context;
use crate::imr::{Imr, TripleSet};
use crate::primitives::{DEFAULT_MIMETYPE, ROOT_UID};
use crate::rdf::parse_rdf;
use crate::resource::{Binary, Resource};
use crate::store::ImrOptions;
use crate::types::{Handling, LdpError, LdpVariant};
use crate::uid::{self, child_prefix, uid_to_uri};
use crate::vocab::{RDF_TYPE, fcrepo, ldp};
use tracing::{debug, info};
use uuid::Uuid;

// =============================================================================
// PAYLOAD
// =============================================================================

/// Client-provided content for a create or replace.
///
/// A binary `stream` makes the resource a non-RDF source; otherwise the
/// RDF `graph` or serialized `rdf_data` is the resource body.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    pub mimetype: Option<String>,
    pub stream: Option<Vec<u8>>,
    pub graph: Option<TripleSet>,
    pub rdf_data: Option<Vec<u8>>,
    pub rdf_format: Option<String>,
    pub handling: Handling,
}

impl Payload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized RDF body in `format` (name, media type or extension).
    #[must_use]
    pub fn rdf(data: impl Into<Vec<u8>>, format: &str) -> Self {
        Self {
            rdf_data: Some(data.into()),
            rdf_format: Some(format.to_string()),
            ..Self::default()
        }
    }

    /// Pre-parsed RDF body.
    #[must_use]
    pub fn graph(graph: TripleSet) -> Self {
        Self {
            graph: Some(graph),
            ..Self::default()
        }
    }

    /// Binary body.
    #[must_use]
    pub fn binary(stream: impl Into<Vec<u8>>, mimetype: Option<&str>) -> Self {
        Self {
            stream: Some(stream.into()),
            mimetype: mimetype.map(str::to_string),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_handling(mut self, handling: Handling) -> Self {
        self.handling = handling;
        self
    }

    #[must_use]
    pub fn with_mimetype(mut self, mimetype: &str) -> Self {
        self.mimetype = Some(mimetype.to_string());
        self
    }

    /// RDF description attached to a binary body.
    #[must_use]
    pub fn with_graph(mut self, graph: TripleSet) -> Self {
        self.graph = Some(graph);
        self
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Stateless resource factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceFactory;

impl ResourceFactory {
    /// A basic container to be created at `uid`.
    pub fn new_container(ctx: &Context<'_>, uid: &str) -> Result<Resource, LdpError> {
        if !uid.starts_with('/') || uid == ROOT_UID {
            return Err(LdpError::invalid(uid, "not a valid container UID"));
        }
        uid::validate(uid)?;
        if ctx.store.ask_rsrc_exists(uid)? {
            return Err(LdpError::ResourceExists(uid.to_string()));
        }
        Ok(Resource::new(uid, LdpVariant::BasicContainer).with_provided(Imr::new(uid_to_uri(uid))))
    }

    /// Resolve a stored resource from its stored types.
    ///
    /// `strict` makes tombstones fail; with `strict` off a tombstone resolves
    /// to its former variant.
    pub fn from_stored(
        ctx: &Context<'_>,
        uid: &str,
        version: Option<&str>,
        strict: bool,
    ) -> Result<Resource, LdpError> {
        let meta = ctx.store.get_metadata(uid, strict)?;
        let variant = variant_from_types(&meta)
            .ok_or_else(|| LdpError::ResourceNotExists(uid.to_string()))?;
        debug!(uid, %variant, "resolved stored resource");

        let opts = ImrOptions {
            version: version.map(str::to_string),
            strict,
            ..ImrOptions::default()
        };
        let mut rsrc = Resource::new(uid, variant).with_options(opts);
        rsrc.prime_metadata(meta);
        Ok(rsrc)
    }

    /// Resolve the resource to create or replace from a client payload.
    ///
    /// A binary stream makes a non-RDF source. Otherwise the payload's
    /// container type picks the variant; a payload without one keeps the
    /// stored variant, or becomes a basic container. Switching an existing
    /// resource between RDF and non-RDF kinds fails `IncompatibleLdpType`.
    pub fn from_provided(
        ctx: &Context<'_>,
        uid: &str,
        payload: Payload,
    ) -> Result<Resource, LdpError> {
        uid::validate(uid)?;
        let uri = uid_to_uri(uid);
        let mut provided = match (payload.rdf_data, payload.graph) {
            (Some(data), _) => parse_rdf(
                &uri,
                &data,
                payload.rdf_format.as_deref().unwrap_or("turtle"),
            )?,
            (None, Some(graph)) => Imr::from_triples(uri, graph),
            (None, None) => Imr::new(uri),
        };

        let stored_variant = if ctx.store.ask_rsrc_exists(uid)? {
            variant_from_types(&ctx.store.get_metadata(uid, true)?)
        } else {
            None
        };

        let rsrc = match payload.stream {
            None => {
                if payload.mimetype.is_some() {
                    return Err(LdpError::InvalidPayload(
                        "binary stream must be provided if mimetype is specified".into(),
                    ));
                }
                if stored_variant == Some(LdpVariant::NonRdfSource) {
                    return Err(LdpError::IncompatibleLdpType {
                        uid: uid.to_string(),
                        mimetype: None,
                    });
                }
                let variant = if provided.has_type(ldp::INDIRECT_CONTAINER) {
                    LdpVariant::IndirectContainer
                } else if provided.has_type(ldp::DIRECT_CONTAINER) {
                    LdpVariant::DirectContainer
                } else {
                    stored_variant.unwrap_or(LdpVariant::BasicContainer)
                };
                Resource::new(uid, variant)
            }
            Some(bytes) => {
                let mimetype = payload
                    .mimetype
                    .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());
                if stored_variant.is_some_and(LdpVariant::is_rdf_source) {
                    return Err(LdpError::IncompatibleLdpType {
                        uid: uid.to_string(),
                        mimetype: Some(mimetype),
                    });
                }
                let mut rsrc = Resource::new(uid, LdpVariant::NonRdfSource);
                rsrc.binary = Some(Binary { bytes, mimetype });
                rsrc
            }
        };

        let mut rsrc = rsrc.with_handling(payload.handling);
        rsrc.check_mgd_terms(ctx, provided.triples_mut())?;
        debug!(uid, variant = %rsrc.variant(), triples = provided.len(), "resolved provided resource");
        Ok(rsrc.with_provided(provided))
    }

    /// Mint a UID for a new child of `parent_uid`.
    ///
    /// A requested `path` is used when free; a taken or missing path gets a
    /// random UUID segment. Children of the root with no path skip the parent
    /// check.
    pub fn mint_uid(
        ctx: &Context<'_>,
        parent_uid: &str,
        path: Option<&str>,
    ) -> Result<String, LdpError> {
        if let Some(p) = path.filter(|p| p.starts_with('/')) {
            return Err(LdpError::invalid(p, "slug cannot start with a slash"));
        }
        let path = path.filter(|p| !p.is_empty());
        if path.is_none() && parent_uid == ROOT_UID {
            return Ok(format!("/{}", Uuid::new_v4()));
        }
        if !parent_uid.starts_with('/') {
            return Err(LdpError::invalid(parent_uid, "invalid parent UID"));
        }

        let mut parent = Self::from_stored(ctx, parent_uid, None, true)?;
        if !parent.types(ctx)?.iter().any(|t| t.as_ref() == ldp::CONTAINER) {
            return Err(LdpError::invalid(parent_uid, "parent is not a container"));
        }

        let prefix = child_prefix(parent_uid);
        if let Some(p) = path {
            let candidate = format!("{prefix}{p}");
            uid::validate(&candidate)?;
            if !ctx.store.ask_rsrc_exists(&candidate)? {
                return Ok(candidate);
            }
            debug!(candidate = %candidate, "requested path taken; minting random UID");
        }
        Ok(format!("{prefix}{}", Uuid::new_v4()))
    }

    /// Create the repository root if it is missing. Returns whether it was
    /// created.
    pub fn bootstrap(ctx: &mut Context<'_>) -> Result<bool, LdpError> {
        if ctx.store.ask_rsrc_exists(ROOT_UID)? {
            return Ok(false);
        }
        let mut provided = Imr::new(uid_to_uri(ROOT_UID));
        provided.add(RDF_TYPE, fcrepo::REPOSITORY_ROOT.into_owned());
        let mut root = Resource::new(ROOT_UID, LdpVariant::BasicContainer)
            .with_handling(Handling::None)
            .with_provided(provided);
        root.create_or_replace(ctx, true)?;
        info!("bootstrapped repository root");
        Ok(true)
    }
}

/// Variant implied by a stored type set, if the types describe a resource.
fn variant_from_types(meta: &Imr) -> Option<LdpVariant> {
    if meta.has_type(ldp::NON_RDF_SOURCE) {
        Some(LdpVariant::NonRdfSource)
    } else if meta.has_type(ldp::RDF_SOURCE) {
        Some(if meta.has_type(ldp::INDIRECT_CONTAINER) {
            LdpVariant::IndirectContainer
        } else if meta.has_type(ldp::DIRECT_CONTAINER) {
            LdpVariant::DirectContainer
        } else if meta.has_type(ldp::CONTAINER) {
            LdpVariant::BasicContainer
        } else {
            LdpVariant::RdfSource
        })
    } else {
        None
    }
}
