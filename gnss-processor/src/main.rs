//! gnss-processor: Edge binary between an NMEA receiver and its consumers.
//!
//! Supports:
//! - Live processing from a serial receiver, relaying raw sentences to a
//!   named pipe and publishing a telemetry snapshot file
//! - Replaying a recorded NMEA capture through the same pipeline
//! - Showing and initialising the config file

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, Table};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gnss_core::accuracy::{estimate_accuracy, rtk_status};
use gnss_core::config::{self, Config};
use gnss_core::{Cadence, GnssError, ShutdownToken};

mod processor;
mod publish;
mod relay;
mod source;

use processor::{Processor, RunSummary, StopReason};
use publish::SnapshotPublisher;
use relay::{Connector, FifoConnector, RelaySink, WriterConnector};
use source::{LineSource, ReaderSource, SerialSource};

const DEFAULT_LOG_FILTER: &str = "gnss_processor=info,gnss_core=info";

#[derive(Parser)]
#[command(
    name = "gnss-processor",
    version,
    about = "NMEA relay and GNSS telemetry processor"
)]
struct Cli {
    /// Config file [default: ~/.gnss-processor/config.yaml]
    #[arg(long, global = true, env = "GNSS_PROCESSOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the live receiver stream until interrupted
    Run(RunArgs),

    /// Feed a recorded NMEA capture through the pipeline and print a summary
    Replay {
        /// Capture file, one sentence per line ("-" for stdin)
        file: PathBuf,

        /// Write relayed sentences here (discarded if omitted)
        #[arg(long)]
        relay_out: Option<PathBuf>,

        /// Write the final telemetry snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config to ~/.gnss-processor/config.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Per-run overrides for the config file.
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Serial device of the receiver
    #[arg(long, env = "GNSS_SERIAL_PORT")]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Named pipe for the relay consumer
    #[arg(long)]
    fifo: Option<PathBuf>,

    /// Telemetry snapshot file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Seconds between snapshot publishes
    #[arg(long)]
    publish_secs: Option<f64>,

    /// Seconds between classifier window resets
    #[arg(long)]
    reset_secs: Option<f64>,

    /// Seconds between diagnostics log lines
    #[arg(long)]
    diagnostics_secs: Option<f64>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.serial.port = port;
        }
        if let Some(baud) = self.baud {
            config.serial.baud = baud;
        }
        if let Some(fifo) = self.fifo {
            config.relay.fifo_path = fifo;
        }
        if let Some(snapshot) = self.snapshot {
            config.snapshot.path = snapshot;
        }
        if let Some(secs) = self.publish_secs {
            config.cadence.publish_secs = secs;
        }
        if let Some(secs) = self.reset_secs {
            config.cadence.reset_secs = secs;
        }
        if let Some(secs) = self.diagnostics_secs {
            config.cadence.diagnostics_secs = Some(secs);
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            cmd_run(&config);
        }
        Commands::Replay {
            file,
            relay_out,
            snapshot,
        } => cmd_replay(file, relay_out, snapshot),
        Commands::Config { action } => match action {
            ConfigAction::Show => cmd_config_show(&config),
            ConfigAction::Init { force } => cmd_config_init(force),
        },
    }
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn cmd_run(config: &Config) {
    info!(
        port = %config.serial.port,
        baud = config.serial.baud,
        fifo = %config.relay.fifo_path.display(),
        snapshot = %config.snapshot.path.display(),
        "starting gnss-processor"
    );

    if let Err(e) = relay::prepare_fifo(&config.relay.fifo_path) {
        warn!(error = %e, "relay pipe not prepared");
    }

    let source = SerialSource::open(
        &config.serial.port,
        config.serial.baud,
        config.serial.read_timeout(),
    )
    .unwrap_or_else(|e| {
        error!("{e}");
        std::process::exit(1);
    });

    let cadence = Cadence::new(
        config.cadence.publish_period(),
        config.cadence.reset_period(),
        config.cadence.diagnostics_period(),
        Instant::now(),
    );
    let processor = Processor::new(
        source,
        RelaySink::new(FifoConnector::new(&config.relay.fifo_path)),
        Some(SnapshotPublisher::new(&config.snapshot.path)),
    )
    .with_cadence(cadence);

    match run_until_signal(processor) {
        Ok(summary) if summary.stop == StopReason::InputClosed => {
            error!(port = %config.serial.port, "{}", GnssError::InputClosed);
            std::process::exit(1);
        }
        Ok(summary) => info!(
            lines = summary.stats.lines,
            nmea_sent = summary.state.counters.nmea_sent,
            ml_corrections = summary.state.counters.ml_corrections,
            "shutdown complete"
        ),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

/// Run the loop on a blocking worker while this thread waits for SIGINT or
/// SIGTERM. A signal cancels the loop, which then tears down and returns.
fn run_until_signal<S, C>(processor: Processor<S, C>) -> gnss_core::Result<RunSummary>
where
    S: LineSource + Send + 'static,
    C: Connector + Send + 'static,
    C::Writer: Send,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let joined = runtime.block_on(async move {
        let token = ShutdownToken::new();
        let worker_token = token.clone();
        let mut worker = tokio::task::spawn_blocking(move || processor.run(&worker_token));

        let finished = tokio::select! {
            joined = &mut worker => Some(joined),
            () = shutdown_signal() => None,
        };
        match finished {
            Some(joined) => joined,
            None => {
                token.cancel();
                worker.await
            }
        }
    });

    joined.map_err(io::Error::other)?
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = interrupt => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

fn cmd_replay(file: PathBuf, relay_out: Option<PathBuf>, snapshot: Option<PathBuf>) {
    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(&file).unwrap_or_else(|e| {
            error!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    };

    let relay_writer: Box<dyn Write> = match relay_out {
        Some(path) => {
            let f = std::fs::File::create(&path).unwrap_or_else(|e| {
                error!("Error creating {}: {e}", path.display());
                std::process::exit(1);
            });
            Box::new(io::BufWriter::new(f))
        }
        None => Box::new(io::sink()),
    };

    let processor = Processor::new(
        ReaderSource::new(reader),
        RelaySink::new(WriterConnector::new(relay_writer)),
        snapshot.map(SnapshotPublisher::new),
    );

    match processor.run(&ShutdownToken::new()) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let state = &summary.state;
    let stats = &summary.stats;
    let fix = &state.fix;
    let dist = state.classifier.distribution();

    println!();
    println!(
        "Lines: {} read, {} fix, {} visibility, {} relayed",
        stats.lines, stats.fixes, stats.visibility, state.counters.nmea_sent
    );
    println!(
        "Fix:   {:.6}, {:.6}  alt {:.1} m  quality {} ({})  {} sats  HDOP {:.1}  ~{:.1} m",
        fix.lat,
        fix.lon,
        fix.alt,
        fix.quality,
        rtk_status(fix.quality),
        fix.satellites,
        fix.hdop,
        estimate_accuracy(fix.quality, fix.hdop)
    );
    println!(
        "Signal: {} LOS, {} multipath, {} NLOS, avg confidence {:.1}%",
        dist.los,
        dist.multipath,
        dist.nlos,
        state.classifier.average_confidence()
    );
    println!();

    if state.satellites.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "System", "SNR", "Elev", "Az", "Condition", "Conf",
    ]);

    for sat in state.satellites.sorted() {
        table.add_row(vec![
            Cell::new(sat.id),
            Cell::new(sat.constellation),
            Cell::new(format!("{:.0}", sat.snr)),
            Cell::new(format!("{:.0}", sat.elevation)),
            Cell::new(format!("{:.0}", sat.azimuth)),
            Cell::new(
                sat.condition
                    .map(|c| c.to_string())
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                sat.confidence
                    .map(|c| format!("{c:.2}"))
                    .unwrap_or("-".into()),
            ),
        ]);
    }

    println!("{table}");
}

fn cmd_config_show(config: &Config) {
    match config::serialize_config(config) {
        Ok(text) => print!("{text}"),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config_init(force: bool) {
    let path = config::config_file();
    if path.exists() && !force {
        error!("{} already exists (use --force to overwrite)", path.display());
        std::process::exit(1);
    }
    match config::save_config(&Config::default()) {
        Ok(path) => println!("Wrote {}", path.display()),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_overrides() {
        let cli = Cli::try_parse_from([
            "gnss-processor",
            "run",
            "--port",
            "/dev/ttyUSB1",
            "--baud",
            "9600",
            "--publish-secs",
            "0.5",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.cadence.publish_secs, 0.5);
        assert_eq!(config.relay, Config::default().relay);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = Config::default();
        config.serial.baud = 4800;
        RunArgs::default().apply(&mut config);
        assert_eq!(config.serial.baud, 4800);
    }

    #[test]
    fn test_cli_replay() {
        let cli = Cli::try_parse_from([
            "gnss-processor",
            "replay",
            "-",
            "--snapshot",
            "/tmp/out.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay {
                file,
                relay_out,
                snapshot,
            } => {
                assert_eq!(file, PathBuf::from("-"));
                assert!(relay_out.is_none());
                assert_eq!(snapshot, Some(PathBuf::from("/tmp/out.json")));
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli =
            Cli::try_parse_from(["gnss-processor", "config", "show", "--config", "/etc/g.yaml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/g.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
