//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::PayloadArgs;
use crate::config::{CONFIG_FILE, load_config};
use ldpstore_core::{
    ChangeEvent, DirBinaryStore, EventKind, Handling, Imr, ImrOptions, LdpError, Payload,
    RedbStore, Repository, TaskQueue,
};
use std::io::Read;
use std::path::{Path, PathBuf};

/// The repository type the binary operates on.
pub type DiskRepository = Repository<RedbStore, DirBinaryStore>;

/// Database file inside the data directory.
pub const DATABASE_FILE: &str = "repo.redb";

/// Binary content directory inside the data directory.
pub const BINARIES_DIR: &str = "binaries";

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum payload file size (100 MB).
///
/// This prevents memory exhaustion from accidental large files.
const MAX_PAYLOAD_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Read all of `reader`, failing rather than truncating past `limit` bytes.
fn read_limited(reader: impl Read, limit: u64) -> Result<Vec<u8>, LdpError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| LdpError::Io(format!("Read input: {e}")))?;
    if buf.len() as u64 > limit {
        return Err(LdpError::Io(format!(
            "Input exceeds maximum allowed {limit} bytes"
        )));
    }
    Ok(buf)
}

/// Read a payload from `path`, or from stdin if `None`.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>, LdpError> {
    let Some(path) = path else {
        return read_limited(std::io::stdin().lock(), MAX_PAYLOAD_FILE_SIZE);
    };

    let canonical = path.canonicalize().map_err(|e| {
        LdpError::Io(format!("Invalid file path '{}': {e}", path.display()))
    })?;
    let metadata = std::fs::metadata(&canonical)
        .map_err(|e| LdpError::Io(format!("Cannot read file metadata: {e}")))?;
    if !metadata.is_file() {
        return Err(LdpError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_PAYLOAD_FILE_SIZE {
        return Err(LdpError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_PAYLOAD_FILE_SIZE
        )));
    }
    std::fs::read(&canonical).map_err(|e| LdpError::Io(format!("Read file: {e}")))
}

fn handling(lenient: bool) -> Handling {
    if lenient {
        Handling::Lenient
    } else {
        Handling::Strict
    }
}

/// Build an engine payload from the command-line payload options.
pub fn build_payload(args: &PayloadArgs) -> Result<Payload, LdpError> {
    let data = read_input(args.file.as_deref())?;
    let payload = if args.binary {
        Payload::binary(data, args.mimetype.as_deref())
    } else {
        Payload::rdf(data, &args.format)
    };
    Ok(payload.with_handling(handling(args.lenient)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// EVENT DELIVERY
// =============================================================================

/// Delivers committed change events to the log, one record per subject.
#[derive(Debug, Default)]
pub struct LogQueue {
    delivered: usize,
}

impl LogQueue {
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl TaskQueue for LogQueue {
    fn enqueue(&mut self, event: &ChangeEvent) -> Result<(), LdpError> {
        for subject in event.subjects() {
            tracing::info!(
                target: "ldpstore::events",
                subject = %subject,
                kind = %event.kind,
                types = ?event.resource_types,
                actor = event.actor.as_deref().unwrap_or_default(),
                timestamp = %event.timestamp.to_rfc3339(),
                "change event"
            );
        }
        self.delivered += 1;
        Ok(())
    }
}

/// Flush committed events after a write command.
fn deliver(repo: &mut DiskRepository) -> Result<(), LdpError> {
    let mut queue = LogQueue::default();
    repo.dispatch(&mut queue)?;
    tracing::debug!(delivered = queue.delivered(), "events delivered");
    Ok(())
}

// =============================================================================
// REPOSITORY ACCESS
// =============================================================================

/// Open (creating if needed) the repository under `data_dir`.
///
/// Settings come from `config`, or from `<data_dir>/ldpstore.toml` if that
/// file exists, then from the environment.
pub fn open_repository(data_dir: &Path, config: Option<&Path>) -> Result<DiskRepository, LdpError> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
        LdpError::Io(format!("Cannot create '{}': {e}", data_dir.display()))
    })?;
    let default_config = data_dir.join(CONFIG_FILE);
    let config_path: Option<PathBuf> = match config {
        Some(p) => Some(p.to_path_buf()),
        None => default_config.is_file().then_some(default_config),
    };
    let settings = load_config(config_path.as_deref())?;
    tracing::debug!(?settings, "repository settings");

    let store = RedbStore::open(data_dir.join(DATABASE_FILE))?;
    let binaries = DirBinaryStore::open(data_dir.join(BINARIES_DIR))?;
    Repository::open(store, binaries, settings)
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Report the settings of a freshly opened repository.
pub fn cmd_init(repo: &mut DiskRepository, data_dir: &Path, json: bool) -> Result<(), LdpError> {
    deliver(repo)?;
    let settings = repo.config();

    if json {
        print_json(&serde_json::json!({
            "data_dir": data_dir.to_string_lossy(),
            "referential_integrity": settings.referential_integrity,
            "messaging": settings.messaging,
            "default_user": settings.default_user,
        }));
        return Ok(());
    }

    println!("Repository ready at {}", data_dir.display());
    println!("  Referential integrity: {:?}", settings.referential_integrity);
    println!("  Messaging:             {}", settings.messaging);
    println!("  Default user:          {}", settings.default_user);
    Ok(())
}

// =============================================================================
// READ COMMANDS
// =============================================================================

fn graph_json(uid: &str, graph: &Imr) -> serde_json::Value {
    let triples: Vec<String> = graph.sorted().iter().map(|t| t.to_string()).collect();
    serde_json::json!({
        "uid": uid,
        "uri": graph.uri().as_str(),
        "triples": triples,
    })
}

/// Print the graph of a resource.
pub fn cmd_get(
    repo: &mut DiskRepository,
    uid: &str,
    opts: ImrOptions,
    all: bool,
    json: bool,
) -> Result<(), LdpError> {
    let graph = repo.get(uid, opts, all)?;
    if json {
        print_json(&graph_json(uid, &graph));
    } else {
        print!("{}", graph.to_ntriples());
    }
    Ok(())
}

/// Print the protocol headers of a resource.
pub fn cmd_head(repo: &mut DiskRepository, uid: &str, json: bool) -> Result<(), LdpError> {
    let headers = repo.head(uid)?;
    if json {
        print_json(&serde_json::json!(headers));
        return Ok(());
    }
    for (name, values) in &headers {
        for value in values {
            println!("{name}: {value}");
        }
    }
    Ok(())
}

/// List version labels of a resource.
pub fn cmd_versions(repo: &mut DiskRepository, uid: &str, json: bool) -> Result<(), LdpError> {
    let labels = repo.version_uids(uid)?;
    if json {
        print_json(&serde_json::json!({ "uid": uid, "versions": labels }));
        return Ok(());
    }
    for label in &labels {
        println!("{label}");
    }
    Ok(())
}

// =============================================================================
// WRITE COMMANDS
// =============================================================================

fn report(uid: &str, kind: EventKind, json: bool) {
    if json {
        print_json(&serde_json::json!({ "uid": uid, "event": kind.as_str() }));
    } else {
        println!("{kind} {uid}");
    }
}

/// Create a child resource under `parent`.
pub fn cmd_create(
    repo: &mut DiskRepository,
    parent: &str,
    slug: Option<&str>,
    args: &PayloadArgs,
    json: bool,
) -> Result<(), LdpError> {
    let payload = build_payload(args)?;
    let uid = repo.create(parent, slug, payload)?;
    deliver(repo)?;
    report(&uid, EventKind::Created, json);
    Ok(())
}

/// Create or replace the resource at `uid`.
pub fn cmd_put(
    repo: &mut DiskRepository,
    uid: &str,
    args: &PayloadArgs,
    json: bool,
) -> Result<(), LdpError> {
    let payload = build_payload(args)?;
    let kind = repo.create_or_replace(uid, payload)?;
    deliver(repo)?;
    report(uid, kind, json);
    Ok(())
}

/// Apply a SPARQL Update read from `file` (or stdin).
pub fn cmd_patch(
    repo: &mut DiskRepository,
    uid: &str,
    file: Option<&Path>,
    metadata: bool,
    lenient: bool,
    json: bool,
) -> Result<(), LdpError> {
    let query = String::from_utf8(read_input(file)?)
        .map_err(|e| LdpError::InvalidUpdate(format!("query is not UTF-8: {e}")))?;
    let kind = repo.update(uid, &query, metadata, handling(lenient))?;
    deliver(repo)?;
    report(uid, kind, json);
    Ok(())
}

/// Bury `uid`, or purge it with `forget`.
pub fn cmd_delete(
    repo: &mut DiskRepository,
    uid: &str,
    forget: bool,
    inbound: bool,
    json: bool,
) -> Result<(), LdpError> {
    let kind = repo.delete(uid, !forget, inbound)?;
    deliver(repo)?;
    report(uid, kind, json);
    Ok(())
}

/// Resurrect a buried resource.
pub fn cmd_resurrect(repo: &mut DiskRepository, uid: &str, json: bool) -> Result<(), LdpError> {
    repo.resurrect(uid)?;
    deliver(repo)?;
    report(uid, EventKind::Created, json);
    Ok(())
}

/// Snapshot a resource and print the label used.
pub fn cmd_version(
    repo: &mut DiskRepository,
    uid: &str,
    label: Option<&str>,
    json: bool,
) -> Result<(), LdpError> {
    let label = repo.create_version(uid, label)?;
    deliver(repo)?;
    if json {
        print_json(&serde_json::json!({ "uid": uid, "version": label }));
    } else {
        println!("{label}");
    }
    Ok(())
}

/// Restore a resource from version `label`.
pub fn cmd_revert(
    repo: &mut DiskRepository,
    uid: &str,
    label: &str,
    backup: bool,
    json: bool,
) -> Result<(), LdpError> {
    let kind = repo.revert_to_version(uid, label, backup)?;
    deliver(repo)?;
    report(uid, kind, json);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
