use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rust_udcn_core::config::RouterConfig;
use rust_udcn_core::controller::Controller;
use rust_udcn_core::packet::{NullSink, NullSource};
use rust_udcn_core::worker::{Worker, WorkerConfig};
use rust_udcn_common::metrics::WorkerStats;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;

mod commands;
mod faces;
mod signals;

/// Bound on each worker's FIB-update queue. The controller blocks on
/// `send` past this, rather than growing without limit, if a worker
/// falls behind draining its channel.
const FIB_UPDATE_CHANNEL_CAPACITY: usize = 64;

/// µDCN software router
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Bitmask of enabled ports, e.g. "0x3" for ports 0 and 1
    #[arg(short = 'p', long = "ports")]
    ports: Option<String>,

    /// Space-separated MAC addresses, one per enabled port, in bit order
    #[arg(short = 'm', long = "macs")]
    macs: Option<String>,

    /// Enable promiscuous mode on every port (logged only; NIC setup is
    /// external to this binary)
    #[arg(short = 'P', long)]
    promiscuous: bool,

    /// Disable NUMA-aware worker placement
    #[arg(long = "no-numa")]
    no_numa: bool,

    /// Path to a TOML configuration file overlaying the compiled-in defaults
    #[arg(long)]
    config: Option<String>,

    /// Increase log verbosity
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a FIB-update command to a running router
    Fib {
        #[command(subcommand)]
        cmd: FibCommand,
    },
}

#[derive(Subcommand)]
enum FibCommand {
    /// Add a forwarding route
    Add {
        /// Name prefix, e.g. "/a/b"
        prefix: String,
        /// Next-hop face id
        face: u8,
        /// Controller address
        #[arg(long, default_value = "127.0.0.1:9000")]
        controller: String,
    },
    /// Remove a forwarding route
    Del {
        prefix: String,
        face: u8,
        #[arg(long, default_value = "127.0.0.1:9000")]
        controller: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    match cli.command {
        Some(Commands::Fib { cmd }) => run_fib_command(cmd),
        None => run_router(&cli),
    }
}

fn run_fib_command(cmd: FibCommand) -> Result<()> {
    match cmd {
        FibCommand::Add {
            prefix,
            face,
            controller,
        } => commands::fib::add(&controller, &prefix, face),
        FibCommand::Del {
            prefix,
            face,
            controller,
        } => commands::fib::del(&controller, &prefix, face),
    }
}

fn run_router(cli: &Cli) -> Result<()> {
    let ports = cli
        .ports
        .as_deref()
        .context("-p/--ports is required to start the router")?;
    let face_table = faces::build_face_table(ports, cli.macs.as_deref())?;
    if cli.promiscuous {
        info!("promiscuous mode requested on all {} port(s)", face_table.faces.len());
    }
    if cli.no_numa {
        info!("NUMA-aware placement disabled");
    } else {
        info!("NUMA-aware placement requested but not enforced by this build");
    }

    let router_cfg = RouterConfig::load(cli.config.as_deref())?;
    let worker_cfg: WorkerConfig = (&router_cfg).into();

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown))?;
    let stat_signals = signals::StatsSignals::install()?;

    let mut senders = Vec::new();
    let mut stats_handles = Vec::new();
    let mut join_handles = Vec::new();

    for face in face_table.face_ids() {
        let (tx, rx) = mpsc::sync_channel(FIB_UPDATE_CHANNEL_CAPACITY);
        senders.push(tx);
        let stats = Arc::new(WorkerStats::new());
        stats_handles.push(Arc::clone(&stats));

        let worker_cfg = WorkerConfig {
            fib_buckets: worker_cfg.fib_buckets,
            fib_max_elements: worker_cfg.fib_max_elements,
            pit_buckets: worker_cfg.pit_buckets,
            pit_max_elements: worker_cfg.pit_max_elements,
            pit_ttl_ticks: worker_cfg.pit_ttl_ticks,
            cs_buckets: worker_cfg.cs_buckets,
            cs_max_elements: worker_cfg.cs_max_elements,
            max_pkt_burst: worker_cfg.max_pkt_burst,
            prefetch_offset: worker_cfg.prefetch_offset,
            drain_deadline_ticks: worker_cfg.drain_deadline_ticks,
            purge_deadline_ticks: worker_cfg.purge_deadline_ticks,
        };
        let shutdown = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name(format!("udcn-worker-{}", face))
            .spawn(move || {
                let mut worker = Worker::new(&worker_cfg, rx, stats);
                let mut source = NullSource;
                let mut sink = NullSink;
                worker.run(&mut source, &mut sink, &shutdown);
            })
            .with_context(|| format!("failed to spawn worker thread for face {}", face))?;
        join_handles.push(handle);
    }

    let controller = Controller::bind(router_cfg.control_port, senders, face_table.face_entries())?;
    info!(
        "router up: {} worker(s), control port {}",
        join_handles.len(),
        router_cfg.control_port
    );

    let controller_shutdown = Arc::clone(&shutdown);
    let controller_handle = thread::Builder::new()
        .name("udcn-controller".into())
        .spawn(move || controller.run(&controller_shutdown))
        .context("failed to spawn controller thread")?;

    while !shutdown.load(std::sync::atomic::Ordering::Relaxed) {
        stat_signals.poll(&stats_handles);
        thread::sleep(std::time::Duration::from_millis(100));
    }

    for handle in join_handles {
        let _ = handle.join();
    }
    match controller_handle.join() {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("controller thread panicked"),
    }

    rust_udcn_core::stats::print_report(&stats_handles);
    Ok(())
}
