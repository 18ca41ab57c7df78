//! sacloud-lifecycle: wait on, inspect and wire up control-plane resources

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sacloud_lifecycle::{
    Config, HttpGateway, ProvenanceResolver, ReferenceResolver, StateMonitor,
};
use sacloud_lifecycle_common::defaults::DEFAULT_WAIT_TIMEOUT_SECS;
use sacloud_lifecycle_common::{Resource, ResourceId, ResourceKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sacloud-lifecycle")]
#[command(about = "Readiness, edit-capability and packet filter helpers for cloud resources")]
#[command(version)]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Connection and polling options shared by every command
#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Zone to operate in (overrides the config file)
    #[arg(long, global = true)]
    zone: Option<String>,

    /// API access token
    #[arg(long, global = true, env = "SAKURACLOUD_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API access token secret
    #[arg(long, global = true, env = "SAKURACLOUD_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Seconds between readiness polls
    #[arg(long, global = true)]
    poll_interval: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block until a resource becomes available
    Wait {
        /// Resource kind (disk, archive, server, packetfilter, interface)
        kind: ResourceKind,
        id: ResourceId,
        /// Give up after this many seconds (0 = never)
        #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_SECS)]
        timeout: u64,
        /// Stop as soon as the resource reports a failed state
        #[arg(long)]
        fail_fast: bool,
    },

    /// Print every poll until a resource becomes available
    Watch {
        kind: ResourceKind,
        id: ResourceId,
        /// Give up after this many seconds (0 = never)
        #[arg(long, default_value_t = DEFAULT_WAIT_TIMEOUT_SECS)]
        timeout: u64,
    },

    /// Report whether a disk or archive may be edited in place
    CanEdit {
        kind: ResourceKind,
        id: ResourceId,
        /// Tag that makes a resource editable; repeat for several (replaces the defaults)
        #[arg(long = "allow-tag")]
        allow_tags: Vec<String>,
        /// Maximum provenance ancestors to follow
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Resolve a packet filter id or name to its id
    Resolve { token: String },

    /// Attach a packet filter to one of a server's interfaces
    Connect {
        server: ResourceId,
        /// Packet filter id or name
        token: String,
        /// Use the second (private) interface instead of the shared one
        #[arg(long)]
        private: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

/// Merge the config file with command-line overrides
fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(zone) = &global.zone {
        config.api.zone = zone.clone();
    }
    if let Some(token) = &global.token {
        config.api.access_token = Some(token.clone());
    }
    if let Some(secret) = &global.secret {
        config.api.access_token_secret = Some(secret.clone());
    }
    if let Some(secs) = global.poll_interval {
        config.monitor.poll_interval_secs = secs;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// One status line; servers also show their instance status
fn describe(resource: &Resource) -> String {
    match &resource.instance_status {
        Some(status) => format!("{} {} (instance {status})", resource.label(), resource.state),
        None => format!("{} {}", resource.label(), resource.state),
    }
}

/// Cancellation token fired by Ctrl-C
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            trigger.cancel();
        }
    });
    token
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(&args.global)?;
    let gateway = Arc::new(HttpGateway::new(&config.api).context("Failed to create API client")?);
    info!(zone = %config.api.zone, "Using API endpoint {}", gateway.base_url());

    match args.command {
        Command::Wait {
            kind,
            id,
            timeout,
            fail_fast,
        } => {
            config.monitor.fail_fast_on_failed |= fail_fast;
            let monitor = StateMonitor::with_config(gateway, config.monitor)?;
            info!(
                interval_secs = monitor.config().poll_interval_secs,
                timeout_secs = timeout,
                "Waiting for {kind} {id}"
            );
            let resource = monitor
                .wait_until_ready_cancellable(kind, id, Duration::from_secs(timeout), &interrupt_token())
                .await
                .with_context(|| format!("Waiting for {kind} {id} failed"))?;
            println!("{}", describe(&resource));
        }

        Command::Watch { kind, id, timeout } => {
            let monitor = StateMonitor::with_config(gateway, config.monitor)?;
            let mut watch = monitor.watch_until_ready_with_parent(
                kind,
                id,
                Duration::from_secs(timeout),
                &interrupt_token(),
            );
            let label = watch.resource().to_string();
            while let Some(resource) = watch.next_progress().await {
                println!(
                    "{} [{}]",
                    describe(&resource),
                    resource.availability.as_deref().unwrap_or("-")
                );
            }
            let resource = watch
                .outcome()
                .await
                .with_context(|| format!("Watching {label} failed"))?;
            println!("{}", describe(&resource));
        }

        Command::CanEdit {
            kind,
            id,
            allow_tags,
            max_depth,
        } => {
            if !allow_tags.is_empty() {
                config.edit.allow_edit_tags = allow_tags;
            }
            if let Some(depth) = max_depth {
                config.edit.max_depth = depth;
            }
            config.edit.validate().context("Invalid edit policy")?;

            let resolver = ProvenanceResolver::with_policy(gateway, config.edit);
            let assessment = resolver
                .assess(kind, id)
                .await
                .with_context(|| format!("Checking edit capability of {kind} {id} failed"))?;
            let (decided_kind, decided_id) = assessment.decided_by;
            println!(
                "{} ({} on {decided_kind} {decided_id}, {} fetched)",
                if assessment.editable { "editable" } else { "not editable" },
                assessment.reason,
                assessment.chain.len()
            );
        }

        Command::Resolve { token } => {
            let resolver = ReferenceResolver::new(gateway);
            match resolver
                .resolve(&token)
                .await
                .with_context(|| format!("Resolving {} '{token}' failed", resolver.kind()))?
            {
                Some(id) => println!("{id}"),
                None => println!("no {} given", resolver.kind()),
            }
        }

        Command::Connect {
            server,
            token,
            private,
        } => {
            let resolver = ReferenceResolver::new(gateway);
            let attached = if private {
                resolver.connect_to_private_nic(server, &token).await
            } else {
                resolver.connect_to_shared_nic(server, &token).await
            }
            .with_context(|| format!("Connecting packet filter '{token}' to server {server} failed"))?;

            match attached {
                Some(filter) => println!("packet filter {filter} attached to server {server}"),
                None => println!("nothing attached"),
            }
        }
    }

    Ok(())
}
