//! Command-line interface for the `livelist` watcher.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::client::DEFAULT_RECONNECT_DELAY;
use crate::config::FileConfig;
use crate::kind::{ListKind, ScopeFilter};
use crate::snapshot::{SnapshotQuery, SortOrder};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Parser)]
#[command(name = "livelist")]
#[command(version)]
#[command(about = "Tail admin-console lists over REST snapshots and WebSocket deltas")]
pub struct Args {
    /// Path to a TOML config file (defaults to ./livelist.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Follow a list live: initial snapshot, then push updates
    Watch {
        /// Which list to follow
        #[arg(value_enum)]
        kind: KindArg,

        /// Backend base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Restrict to one project (documents only)
        #[arg(long)]
        project: Option<String>,

        /// Page size; also caps live appends
        #[arg(long)]
        page_size: Option<u32>,

        /// Sort field (e.g. created_at, name)
        #[arg(long)]
        order_by: Option<String>,

        /// Sort direction
        #[arg(long, value_enum)]
        order: Option<SortOrder>,

        /// Seconds between reconnect attempts after channel loss
        #[arg(long)]
        reconnect_secs: Option<u64>,
    },

    /// Fetch and print one snapshot page, then exit
    Snapshot {
        /// Which list to fetch
        #[arg(value_enum)]
        kind: KindArg,

        /// Backend base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Restrict to one project (documents only)
        #[arg(long)]
        project: Option<String>,

        /// 1-based page index
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long)]
        page_size: Option<u32>,

        /// Name search filter
        #[arg(long)]
        search: Option<String>,

        /// Sort field
        #[arg(long)]
        order_by: Option<String>,

        /// Sort direction
        #[arg(long, value_enum)]
        order: Option<SortOrder>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// The three built-in list kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Documents,
    Models,
    Projects,
}

impl KindArg {
    pub fn to_kind(self) -> ListKind {
        match self {
            KindArg::Documents => ListKind::documents(),
            KindArg::Models => ListKind::models(),
            KindArg::Projects => ListKind::projects(),
        }
    }
}

// ---------------------------------------------------------------------------
// Flag / config-file resolution (flags win)
// ---------------------------------------------------------------------------

pub fn resolve_base_url(flag: Option<&str>, file: &FileConfig) -> String {
    flag.map(str::to_string)
        .or_else(|| file.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

pub fn resolve_page_size(flag: Option<u32>, file: &FileConfig) -> u32 {
    flag.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE)
}

pub fn resolve_project(flag: Option<&str>, file: &FileConfig) -> Option<String> {
    flag.map(str::to_string).or_else(|| file.project.clone())
}

pub fn resolve_reconnect(flag: Option<u64>, file: &FileConfig) -> Duration {
    flag.or(file.reconnect_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RECONNECT_DELAY)
}

/// Assemble the snapshot query for a watch/snapshot invocation.
pub fn build_query(
    page: u32,
    page_size: u32,
    order_by: Option<String>,
    order: Option<SortOrder>,
    search: Option<String>,
    project: Option<String>,
) -> SnapshotQuery {
    SnapshotQuery {
        page,
        limit: page_size,
        order_by,
        order,
        search,
        project,
    }
}

/// Scope filter implied by a project restriction.
pub fn project_scope(project: Option<&str>) -> Option<ScopeFilter> {
    project.map(|p| ScopeFilter::field_equals("project", p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_watch_minimal() {
        let args = Args::parse_from(["livelist", "watch", "documents"]);
        match args.command {
            Command::Watch { kind, base_url, project, .. } => {
                assert_eq!(kind, KindArg::Documents);
                assert!(base_url.is_none());
                assert!(project.is_none());
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_watch_with_flags() {
        let args = Args::parse_from([
            "livelist", "watch", "models",
            "--base-url", "http://10.0.0.5:8080",
            "--page-size", "50",
            "--reconnect-secs", "5",
        ]);
        match args.command {
            Command::Watch { kind, base_url, page_size, reconnect_secs, .. } => {
                assert_eq!(kind, KindArg::Models);
                assert_eq!(base_url.as_deref(), Some("http://10.0.0.5:8080"));
                assert_eq!(page_size, Some(50));
                assert_eq!(reconnect_secs, Some(5));
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_snapshot_defaults_page_one() {
        let args = Args::parse_from(["livelist", "snapshot", "projects"]);
        match args.command {
            Command::Snapshot { kind, page, .. } => {
                assert_eq!(kind, KindArg::Projects);
                assert_eq!(page, 1);
            }
            _ => panic!("expected snapshot"),
        }
    }

    #[test]
    fn test_parse_global_config_flag() {
        let args = Args::parse_from(["livelist", "watch", "projects", "--config", "custom.toml"]);
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    }

    #[test]
    fn test_kind_arg_mapping() {
        assert_eq!(KindArg::Documents.to_kind().name(), "documents");
        assert_eq!(KindArg::Models.to_kind().name(), "models");
        assert_eq!(KindArg::Projects.to_kind().name(), "projects");
    }

    #[test]
    fn test_resolve_base_url_flag_wins() {
        let file = FileConfig {
            base_url: Some("http://file:1".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_base_url(Some("http://flag:2"), &file), "http://flag:2");
    }

    #[test]
    fn test_resolve_base_url_file_then_default() {
        let file = FileConfig {
            base_url: Some("http://file:1".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_base_url(None, &file), "http://file:1");
        assert_eq!(resolve_base_url(None, &FileConfig::default()), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_resolve_page_size_chain() {
        let file = FileConfig { page_size: Some(10), ..Default::default() };
        assert_eq!(resolve_page_size(Some(5), &file), 5);
        assert_eq!(resolve_page_size(None, &file), 10);
        assert_eq!(resolve_page_size(None, &FileConfig::default()), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_resolve_reconnect_default_is_two_seconds() {
        assert_eq!(
            resolve_reconnect(None, &FileConfig::default()),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_project_scope_built_from_flag() {
        let scope = project_scope(Some("alpha")).unwrap();
        assert_eq!(scope.field(), "project");
        assert_eq!(scope.value(), "alpha");
        assert!(project_scope(None).is_none());
    }
}
