use clap::{CommandFactory, Parser};
use colored::*;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use livelist::channel::WsChannelFactory;
use livelist::cli::{self, Args, Command};
use livelist::client::LiveListClient;
use livelist::config::FileConfig;
use livelist::entity::Entity;
use livelist::kind::ListKind;
use livelist::snapshot::{HttpSnapshotSource, SnapshotQuery, SnapshotSource};
use livelist::state::ListView;

#[tokio::main]
async fn main() {
    // Logs go to stderr so watch output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match FileConfig::load_or_default(args.config.as_deref()) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Completions { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(shell, &mut cmd, "livelist", &mut std::io::stdout());
        }

        Command::Snapshot {
            kind,
            base_url,
            project,
            page,
            page_size,
            search,
            order_by,
            order,
        } => {
            let kind = kind.to_kind();
            let base_url = cli::resolve_base_url(base_url.as_deref(), &file);
            let project = cli::resolve_project(project.as_deref(), &file);
            let query = cli::build_query(
                page,
                cli::resolve_page_size(page_size, &file),
                order_by,
                order,
                search,
                project,
            );
            run_snapshot(kind, base_url, query).await;
        }

        Command::Watch {
            kind,
            base_url,
            project,
            page_size,
            order_by,
            order,
            reconnect_secs,
        } => {
            let kind = kind.to_kind();
            let base_url = cli::resolve_base_url(base_url.as_deref(), &file);
            let project = cli::resolve_project(project.as_deref(), &file);
            let query = cli::build_query(
                1,
                cli::resolve_page_size(page_size, &file),
                order_by,
                order,
                None,
                project.clone(),
            );
            let reconnect = cli::resolve_reconnect(reconnect_secs, &file);
            run_watch(kind, base_url, project, query, reconnect).await;
        }
    }
}

async fn run_snapshot(kind: ListKind, base_url: String, query: SnapshotQuery) {
    let source = HttpSnapshotSource::new(&base_url);
    match source.fetch(&kind, &query).await {
        Ok(page) => {
            println!(
                "{} {} — {} of {} total",
                "●".cyan(),
                kind.name().bold(),
                page.entities.len(),
                page.total
            );
            for entity in &page.entities {
                println!("  {}", describe(&kind, entity));
            }
        }
        Err(e) => {
            eprintln!("{} {e}", "snapshot failed:".red().bold());
            std::process::exit(1);
        }
    }
}

async fn run_watch(
    kind: ListKind,
    base_url: String,
    project: Option<String>,
    query: SnapshotQuery,
    reconnect: std::time::Duration,
) {
    let source = HttpSnapshotSource::new(&base_url);
    let factory = WsChannelFactory::new(&base_url);

    let mut builder = LiveListClient::builder(kind.clone(), source, factory)
        .query(query)
        .reconnect_delay(reconnect);
    if let Some(scope) = cli::project_scope(project.as_deref()) {
        builder = builder.scope(scope);
    }
    let mut client = builder.build();

    // Snapshot failures are surfaced but not fatal: the push channel still
    // connects and the user can watch updates trickle in.
    if let Err(e) = client.initialize().await {
        eprintln!("{} {e}", "snapshot failed:".red().bold());
    }

    let mut rx = client.subscribe();
    render(&kind, &rx.borrow_and_update().clone());
    client.connect();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = rx.borrow_and_update().clone();
                render(&kind, &view);
            }
        }
    }

    client.disconnect();
}

fn render(kind: &ListKind, view: &ListView) {
    let status = if view.live {
        "live".green()
    } else {
        "offline".yellow()
    };
    println!();
    println!(
        "{} {} — {} of {} total [{}]",
        "●".cyan(),
        kind.name().bold(),
        view.entities.len(),
        view.total,
        status
    );
    if let Some(error) = &view.last_error {
        println!("  {} {}", "!".red().bold(), error.red());
    }
    for entity in &view.entities {
        println!("  {}", describe(kind, entity));
    }
}

/// One-line rendering of an entity: identity key, display name, and any
/// progress counters the backend exposes.
fn describe(kind: &ListKind, entity: &Entity) -> String {
    let key = kind
        .key_of(entity)
        .map(|k| k.to_string())
        .unwrap_or_else(|| "?".to_string());
    let mut line = format!("{}", key.cyan());

    if let Some(name) = entity.get("name").and_then(Value::as_str) {
        if name != key {
            line.push(' ');
            line.push_str(name);
        }
    }

    if let (Some(loaded), Some(total)) = (
        entity.get("loaded_chunks").and_then(Value::as_u64),
        entity.get("total_chunks").and_then(Value::as_u64),
    ) {
        let counter = format!("{loaded}/{total}");
        let styled = if loaded < total {
            counter.yellow()
        } else {
            counter.green()
        };
        line.push_str(&format!(" [{styled}]"));
    }

    if let Some(status) = entity
        .get("downloadStatus")
        .and_then(Value::as_object)
        .and_then(|s| s.get("status"))
        .and_then(Value::as_str)
    {
        line.push_str(&format!(" ({})", status.dimmed()));
    }

    line
}
