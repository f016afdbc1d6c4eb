//! # ldpstore CLI Module
//!
//! This module implements the CLI interface for ldpstore.
//!
//! ## Available Commands
//!
//! - `init` - Create the repository and its root container
//! - `get` - Print the graph of a resource
//! - `head` - Print the protocol headers of a resource
//! - `create` - Create a child resource under a container
//! - `put` - Create or replace a resource at a given UID
//! - `patch` - Apply a SPARQL Update to a resource
//! - `delete` - Bury (or forget) a resource and its subtree
//! - `resurrect` - Bring a buried resource back
//! - `version` - Snapshot a resource
//! - `versions` - List version labels of a resource
//! - `revert` - Restore a resource from a version

mod commands;

use clap::{Parser, Subcommand};
use ldpstore_core::{ImrOptions, LdpError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// ldpstore - Linked Data Platform resource repository
///
/// Resources are addressed by UID (`/path/to/resource`); `/` is the root
/// container.
#[derive(Parser, Debug)]
#[command(name = "ldpstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository directory (database and binary content)
    #[arg(short = 'D', long, global = true, default_value = "ldpstore-data")]
    pub data_dir: PathBuf,

    /// TOML configuration file (defaults to `<data-dir>/ldpstore.toml` if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Payload options shared by `create` and `put`.
#[derive(clap::Args, Debug)]
pub struct PayloadArgs {
    /// Payload file (reads stdin if omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// RDF serialization of the payload (turtle, ntriples, rdfxml, ...)
    #[arg(short = 't', long, default_value = "turtle")]
    pub format: String,

    /// Store the payload as binary content instead of RDF
    #[arg(short, long)]
    pub binary: bool,

    /// Mimetype of binary content
    #[arg(short, long, requires = "binary")]
    pub mimetype: Option<String>,

    /// Strip server-managed terms instead of rejecting the payload
    #[arg(long)]
    pub lenient: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the repository (root container included)
    Init,

    /// Print the graph of a resource as N-Triples
    Get {
        /// Resource UID
        uid: String,

        /// Read this version instead of the live resource
        #[arg(long)]
        version: Option<String>,

        /// Include triples of other resources that point here
        #[arg(long)]
        inbound: bool,

        /// Omit `ldp:contains` triples
        #[arg(long)]
        no_children: bool,

        /// Include server-managed triples
        #[arg(short = 'a', long)]
        all: bool,
    },

    /// Print the protocol headers of a resource
    Head {
        /// Resource UID
        uid: String,
    },

    /// Create a child resource; prints the new UID
    Create {
        /// Parent container UID
        #[arg(default_value = "/")]
        parent: String,

        /// Requested path segment for the new resource
        #[arg(short, long)]
        slug: Option<String>,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Create or replace the resource at a UID
    Put {
        /// Resource UID
        uid: String,

        #[command(flatten)]
        payload: PayloadArgs,
    },

    /// Apply a SPARQL Update to a resource
    Patch {
        /// Resource UID
        uid: String,

        /// SPARQL Update file (reads stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Update the description of a binary resource
        #[arg(long)]
        metadata: bool,

        /// Strip server-managed terms instead of rejecting the update
        #[arg(long)]
        lenient: bool,
    },

    /// Delete a resource and its subtree
    Delete {
        /// Resource UID
        uid: String,

        /// Purge every trace instead of leaving tombstones
        #[arg(long)]
        forget: bool,

        /// Also remove links from other resources
        #[arg(long)]
        inbound: bool,
    },

    /// Bring a buried resource and its subtree back
    Resurrect {
        /// Resource UID
        uid: String,
    },

    /// Snapshot a resource; prints the version label
    Version {
        /// Resource UID
        uid: String,

        /// Version label (a random one is used if missing or taken)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List version labels of a resource
    Versions {
        /// Resource UID
        uid: String,
    },

    /// Restore a resource from a version
    Revert {
        /// Resource UID
        uid: String,

        /// Version label
        label: String,

        /// Do not snapshot the current state first
        #[arg(long)]
        no_backup: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), LdpError> {
    let json = cli.json;
    let mut repo = open_repository(&cli.data_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Init => cmd_init(&mut repo, &cli.data_dir, json),
        Commands::Get {
            uid,
            version,
            inbound,
            no_children,
            all,
        } => {
            let opts = ImrOptions {
                version,
                strict: true,
                incl_inbound: inbound,
                incl_children: !no_children,
            };
            cmd_get(&mut repo, &uid, opts, all, json)
        }
        Commands::Head { uid } => cmd_head(&mut repo, &uid, json),
        Commands::Create {
            parent,
            slug,
            payload,
        } => cmd_create(&mut repo, &parent, slug.as_deref(), &payload, json),
        Commands::Put { uid, payload } => cmd_put(&mut repo, &uid, &payload, json),
        Commands::Patch {
            uid,
            file,
            metadata,
            lenient,
        } => cmd_patch(&mut repo, &uid, file.as_deref(), metadata, lenient, json),
        Commands::Delete {
            uid,
            forget,
            inbound,
        } => cmd_delete(&mut repo, &uid, forget, inbound, json),
        Commands::Resurrect { uid } => cmd_resurrect(&mut repo, &uid, json),
        Commands::Version { uid, label } => cmd_version(&mut repo, &uid, label.as_deref(), json),
        Commands::Versions { uid } => cmd_versions(&mut repo, &uid, json),
        Commands::Revert {
            uid,
            label,
            no_backup,
        } => cmd_revert(&mut repo, &uid, &label, !no_backup, json),
    }
}
