//! CLI Tooling
//!
//! Command-line interface over a workspace repository. Every command runs
//! against one sled database holding objects, references and permissions.

use crate::acl::{AccessControl, AllowedNames, PermissionManager, Principal, SledPermissionStore};
use crate::config::{ConfigLoader, GitStoreConfig};
use crate::error::{ApiError, RepoError, StorageError};
use crate::logging::LoggingConfig;
use crate::object::{FileMode, Identity};
use crate::path::RepoPath;
use crate::repository::{BlobRecord, Repository};
use crate::store::{ObjectStore, SledObjectStore};
use crate::tree::{Listing, ListingEntry};
use crate::types::ObjectId;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// gitstore CLI - version-controlled hierarchical object store
#[derive(Parser)]
#[command(name = "gitstore")]
#[command(about = "Store files in a content-addressed, versioned tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Author name for commits made by this invocation
    #[arg(long)]
    pub author: Option<String>,

    /// Author email for commits made by this invocation
    #[arg(long)]
    pub email: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line logging flags on top of the configured values
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
            config.output = "stderr".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }

    /// Author override from `--author` / `--email`, if either was given
    pub fn author_override(&self, default: &Identity) -> Option<Identity> {
        if self.author.is_none() && self.email.is_none() {
            return None;
        }
        Some(Identity::new(
            self.author.clone().unwrap_or_else(|| default.name.clone()),
            self.email.clone().unwrap_or_else(|| default.email.clone()),
        ))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the repository and its reference
    Init,
    /// Store a local file at a repository path
    Put {
        /// Repository path
        path: String,
        /// Local file to read
        file: PathBuf,
        /// Record the entry as executable
        #[arg(long)]
        executable: bool,
        /// Attempts when another writer commits first
        #[arg(long, default_value = "3")]
        retries: usize,
    },
    /// Print the content of a blob
    Cat { path: String },
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
        /// Only show entries this user was granted
        #[arg(long = "as-user", conflicts_with = "anonymous")]
        as_user: Option<String>,
        /// Only show entries granted to anonymous users
        #[arg(long)]
        anonymous: bool,
    },
    /// Remove a path, pruning directories left empty
    Rm {
        path: String,
        #[arg(long, default_value = "3")]
        retries: usize,
    },
    /// Show commit history, newest first
    Log {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List distinct blobs reachable from commits after a given one
    Blobs {
        /// Exclusive starting commit id (hex)
        #[arg(long)]
        since: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Grant access to a path
    Share {
        path: String,
        /// Users to grant; anonymous access when omitted
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Revoke access to a path
    Unshare {
        path: String,
        /// Users to revoke; anonymous access when omitted
        #[arg(long = "user")]
        users: Vec<String>,
    },
    /// Show who was granted a path
    Permissions {
        path: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// CLI context: loaded configuration plus the opened repository
pub struct CliContext {
    workspace_root: PathBuf,
    config: GitStoreConfig,
    repository: Repository<SledObjectStore>,
    permissions: PermissionManager<SledPermissionStore>,
}

impl CliContext {
    /// Load configuration for a workspace, or from an explicit file
    pub fn load_config(
        workspace_root: &Path,
        config_path: Option<&Path>,
    ) -> Result<GitStoreConfig, ApiError> {
        Ok(match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(workspace_root)?,
        })
    }

    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = Self::load_config(&workspace_root, config_path.as_deref())?;
        Self::from_config(workspace_root, config)
    }

    /// Open the repository described by an already loaded configuration
    pub fn from_config(workspace_root: PathBuf, config: GitStoreConfig) -> Result<Self, ApiError> {
        let store_path = config.storage.resolve_path(&workspace_root)?;
        let store = SledObjectStore::open(&store_path)?;
        let permissions = PermissionManager::new(SledPermissionStore::from_db(store.db())?);
        let repository = Repository::new(Arc::new(store), config.repository.clone())?;
        info!(path = %store_path.display(), "Opened workspace repository");

        Ok(Self {
            workspace_root,
            config,
            repository,
            permissions,
        })
    }

    /// Commit as `author` instead of the configured identity
    pub fn with_author(mut self, author: Identity) -> Self {
        self.repository = self.repository.with_author(author);
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &GitStoreConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository<SledObjectStore> {
        &self.repository
    }

    /// Execute a command and write its output
    ///
    /// `cat` writes the blob's bytes untouched; every other command writes
    /// its rendered text followed by a newline.
    pub fn run(&self, command: &Commands, out: &mut dyn Write) -> Result<(), ApiError> {
        match command {
            Commands::Cat { path } => {
                let data = self.repository.read(path)?;
                out.write_all(&data).map_err(StorageError::from)?;
            }
            _ => {
                let rendered = self.execute(command)?;
                writeln!(out, "{}", rendered).map_err(StorageError::from)?;
            }
        }
        out.flush().map_err(StorageError::from)?;
        Ok(())
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Init => {
                let head = self.repository.head()?;
                Ok(format!(
                    "Repository ready: {} at {}",
                    self.repository.config().reference_name,
                    head.commit
                ))
            }
            Commands::Put {
                path,
                file,
                executable,
                retries,
            } => {
                let path = RepoPath::parse(path)?;
                let mut content = std::fs::File::open(file).map_err(StorageError::from)?;
                let blob = self
                    .repository
                    .store()
                    .put_blob(&mut content)
                    .map_err(RepoError::from)?;
                let mode = if *executable {
                    FileMode::Executable
                } else {
                    FileMode::Regular
                };
                let head = self.repository.retry(*retries, |repo| {
                    repo.insert_on(&repo.head()?, &path, blob, mode)
                })?;
                Ok(format!("Saved {} ({}) in {}", path, blob.short(), head.commit.short()))
            }
            Commands::Cat { path } => {
                let data = self.repository.read(path)?;
                String::from_utf8(data).map_err(|_| {
                    ApiError::OutputError(format!("{} is not UTF-8 text", path))
                })
            }
            Commands::Ls {
                path,
                format,
                as_user,
                anonymous,
            } => {
                let listing = self.repository.listdir(path)?;
                let principal = match (as_user, anonymous) {
                    (Some(user), _) => Some(Principal::user(user.clone())),
                    (None, true) => Some(Principal::Anonymous),
                    (None, false) => None,
                };
                let listing = match principal {
                    Some(principal) => {
                        let allowed = self
                            .permissions
                            .allowed_child_names(&principal, &RepoPath::parse(path)?)?;
                        filter_listing(listing, &allowed)
                    }
                    None => listing,
                };
                format_listing(&listing, format)
            }
            Commands::Rm { path, retries } => {
                let path = RepoPath::parse(path)?;
                let head = self
                    .repository
                    .retry(*retries, |repo| repo.remove_on(&repo.head()?, &path))?;
                Ok(format!("Removed {} in {}", path, head.commit.short()))
            }
            Commands::Log { limit, format } => {
                let entries: Vec<LogEntry> = self
                    .repository
                    .history(*limit)?
                    .into_iter()
                    .map(|(id, commit)| LogEntry {
                        commit: id,
                        date: commit
                            .author
                            .timestamp()
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_default(),
                        author: commit.author.identity.to_string(),
                        message: commit.message,
                    })
                    .collect();
                format_log(&entries, format)
            }
            Commands::Blobs { since, format } => {
                let since = since
                    .as_deref()
                    .map(|raw| {
                        raw.parse::<ObjectId>().map_err(|e| {
                            ApiError::ConfigError(format!("Invalid commit id {}: {}", raw, e))
                        })
                    })
                    .transpose()?;
                let records = self.repository.blobs_between(since, None)?;
                format_blobs(&records, format)
            }
            Commands::Share { path, users } => {
                let path = RepoPath::parse(path)?;
                let added = self.permissions.grant(&principals(users), &path)?;
                Ok(format!("Shared {} ({} new grant(s))", path, added))
            }
            Commands::Unshare { path, users } => {
                let path = RepoPath::parse(path)?;
                let removed = self.permissions.revoke(&principals(users), &path)?;
                Ok(format!("Unshared {} ({} grant(s) removed)", path, removed))
            }
            Commands::Permissions { path, format } => {
                let path = RepoPath::parse(path)?;
                let entries = self.permissions.current_permissions(&path)?;
                let grantees: Vec<String> = entries
                    .into_iter()
                    .map(|entry| entry.principal.unwrap_or_else(|| ANONYMOUS.to_string()))
                    .collect();
                if format == "json" {
                    return to_json(&grantees);
                }
                if grantees.is_empty() {
                    return Ok(format!("{} is not shared", path));
                }
                Ok(format!("{} shared with: {}", path, grantees.join(", ")))
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::OutputError(format!("Failed to render config: {}", e))),
        }
    }
}

const ANONYMOUS: &str = "(anonymous)";

fn principals(users: &[String]) -> Vec<Principal> {
    if users.is_empty() {
        return vec![Principal::Anonymous];
    }
    users.iter().cloned().map(Principal::User).collect()
}

fn filter_listing(listing: Listing, allowed: &AllowedNames) -> Listing {
    let keep = |entries: Vec<ListingEntry>| -> Vec<ListingEntry> {
        entries
            .into_iter()
            .filter(|entry| allowed.contains(&entry.name))
            .collect()
    };
    Listing {
        directories: keep(listing.directories),
        blobs: keep(listing.blobs),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::OutputError(format!("Failed to render JSON: {}", e)))
}

fn format_listing(listing: &Listing, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(listing);
    }
    let mut rows: Vec<&ListingEntry> = listing
        .directories
        .iter()
        .chain(listing.blobs.iter())
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Name", "Mode", "Object", "Size"]);
    for entry in rows {
        let name = if entry.kind.is_directory() {
            format!("{}/", entry.name)
        } else {
            entry.name.clone()
        };
        let size = entry
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            name,
            format!("{:06o}", entry.kind.mode()),
            entry.id.short(),
            size,
        ]);
    }
    Ok(table.to_string())
}

#[derive(Debug, Serialize)]
struct LogEntry {
    commit: ObjectId,
    date: String,
    author: String,
    message: String,
}

fn format_log(entries: &[LogEntry], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(entries);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Commit", "Date", "Author", "Message"]);
    for entry in entries {
        table.add_row(vec![
            entry.commit.short(),
            entry.date.clone(),
            entry.author.clone(),
            entry.message.clone(),
        ]);
    }
    Ok(table.to_string())
}

fn format_blobs(records: &[BlobRecord], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(records);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Blob", "Path", "Size"]);
    for record in records {
        table.add_row(vec![
            record.id.to_hex(),
            record.path.to_string(),
            record.size.to_string(),
        ]);
    }
    Ok(table.to_string())
}
