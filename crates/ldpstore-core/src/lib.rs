//! # ldpstore-core
//!
//! The resource lifecycle and consistency engine of an LDP repository.
//!
//! This crate layers resource semantics over a resource-centric triple
//! store:
//! - `factory` resolves which resource variant to instantiate
//! - `resource` carries the create/replace/bury/resurrect/forget lifecycle
//! - `containment` materializes the path hierarchy and LDP membership
//! - `versioning` snapshots and reverts resources
//! - `integrity` sanitizes payloads and enforces referential integrity
//! - `notifier` records committed changes for delivery
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network dependencies
//! - Every operation takes an explicit `Context`; there is no global state
//! - Storage lives behind the `ResourceStore` contract
//! - Change events are only enqueued; delivery belongs to the caller

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod containment;
pub mod context;
pub mod factory;
pub mod imr;
pub mod integrity;
pub mod notifier;
pub mod primitives;
pub mod rdf;
pub mod repository;
pub mod resource;
pub mod store;
pub mod types;
pub mod uid;
pub mod versioning;
pub mod vocab;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{EventKind, Handling, LdpError, LdpVariant, RefIntMode, TermAxis};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use config::RepoConfig;
pub use context::Context;
pub use factory::{Payload, ResourceFactory};
pub use imr::{Imr, TripleSet};
pub use integrity::{check_mgd_terms, check_ref_int};
pub use notifier::{ChangeEvent, Changelog, TaskQueue};
pub use repository::Repository;
pub use resource::{Binary, Resource};

// =============================================================================
// RE-EXPORTS: Storage (from store module)
// =============================================================================

pub use store::{
    BinaryStore, DirBinaryStore, ImrOptions, MemoryBinaryStore, MemoryStore, RedbStore,
    ResourceStore,
};

/// Re-export of the RDF term model used throughout the public API.
pub use oxigraph::model;
