use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;
use trafficlens_core::{
    AnalysisConfig, AnalysisRun, CaptureBackend, CaptureError, CaptureOptions, ChartRenderer,
    DEFAULT_HISTOGRAM_BINS, DEFAULT_MAX_PACKETS, DEFAULT_TOP_TALKERS, DeviceInfo, DeviceSelector,
    JsonRenderer, LiveCaptureBackend, PcapReplayBackend, RecordLogOptions, Schema, SourceError,
    SvgRenderer, TimeBucket, analyze_store, capture_to_store,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TRAFFICLENS_BUILD_COMMIT"),
    " ",
    env!("TRAFFICLENS_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  trafficlens capture --device-index 0 --count 100\n  trafficlens capture --replay capture.pcap\n  trafficlens analyze data/packets.csv --out out";

#[derive(Parser, Debug)]
#[command(name = "trafficlens")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Capture IPv4 traffic into a CSV store and chart it offline.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture packets and append them to the record store.
    Capture {
        /// Record store to append to
        #[arg(long, default_value = "data/packets.csv")]
        store: PathBuf,

        /// Interface name to capture on
        #[arg(short, long, conflicts_with_all = ["device_index", "replay"])]
        interface: Option<String>,

        /// Interface index as printed by `trafficlens interfaces`
        #[arg(short, long, conflicts_with = "replay")]
        device_index: Option<usize>,

        /// Replay a .pcap or .pcapng file instead of a live interface
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Packets to capture; 0 runs until Ctrl-C or end of input
        #[arg(short, long, default_value_t = DEFAULT_MAX_PACKETS)]
        count: u64,

        /// Also store source and destination ports
        #[arg(long)]
        with_ports: bool,

        /// Sync every record to disk, not just flush it
        #[arg(long)]
        sync: bool,
    },
    /// Aggregate the record store into charts and a text report.
    #[command(alias = "analyse")]
    Analyze {
        /// Record store to read (glob patterns must match a single file)
        #[arg(default_value = "data/packets.csv")]
        store: PathBuf,

        /// Output directory for the report artifacts
        #[arg(short, long, default_value = "out")]
        out: PathBuf,

        /// Chart format
        #[arg(long, value_enum, default_value_t = ChartFormat::Svg)]
        format: ChartFormat,

        /// Histogram bin count
        #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
        bins: usize,

        /// Number of top talkers to keep
        #[arg(long, default_value_t = DEFAULT_TOP_TALKERS)]
        top: usize,

        /// Time series granularity
        #[arg(long, value_enum, default_value_t = Bucket::Ms)]
        bucket: Bucket,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// List capture-capable interfaces.
    Interfaces,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ChartFormat {
    Svg,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Bucket {
    S,
    Ms,
    Us,
}

impl From<Bucket> for TimeBucket {
    fn from(bucket: Bucket) -> Self {
        match bucket {
            Bucket::S => TimeBucket::Second,
            Bucket::Ms => TimeBucket::Millisecond,
            Bucket::Us => TimeBucket::Microsecond,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = matches!(cli.command, Commands::Analyze { quiet: true, .. });
    init_logging(cli.verbose, quiet);

    let result = match cli.command {
        Commands::Capture {
            store,
            interface,
            device_index,
            replay,
            count,
            with_ports,
            sync,
        } => cmd_capture(CaptureArgs {
            store,
            interface,
            device_index,
            replay,
            count,
            with_ports,
            sync,
        }),
        Commands::Analyze {
            store,
            out,
            format,
            bins,
            top,
            bucket,
            quiet,
        } => cmd_analyze(&store, &out, format, bins, top, bucket, quiet),
        Commands::Interfaces => cmd_interfaces(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = match (verbose, quiet) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<CaptureError> for CliError {
    fn from(err: CaptureError) -> Self {
        let hint = match &err {
            CaptureError::NoDevicesFound => {
                Some("check capture permissions, or use --replay FILE".to_string())
            }
            CaptureError::InvalidSelection { .. } | CaptureError::UnknownInterface(_) => {
                Some("run `trafficlens interfaces` to list devices".to_string())
            }
            CaptureError::Source(source) => source_hint(source),
            CaptureError::Store(_) => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

fn source_hint(err: &SourceError) -> Option<String> {
    match err {
        SourceError::LiveUnavailable => Some(
            "rebuild with `--features live` (needs libpcap), or use --replay FILE".to_string(),
        ),
        SourceError::Open { .. } => {
            Some("live capture usually needs root or CAP_NET_RAW".to_string())
        }
        _ => None,
    }
}

struct CaptureArgs {
    store: PathBuf,
    interface: Option<String>,
    device_index: Option<usize>,
    replay: Option<PathBuf>,
    count: u64,
    with_ports: bool,
    sync: bool,
}

fn cmd_capture(args: CaptureArgs) -> Result<(), CliError> {
    let options = CaptureOptions {
        max_packets: (args.count > 0).then_some(args.count),
        log: RecordLogOptions {
            schema: if args.with_ports {
                Schema::WithPorts
            } else {
                Schema::Basic
            },
            sync: args.sync,
        },
        ..CaptureOptions::default()
    };
    let stop = install_stop_handler()?;

    if let Some(replay) = args.replay {
        if !replay.is_file() {
            return Err(CliError::new(
                format!("replay file not found: {}", replay.display()),
                Some("use a .pcap or .pcapng file".to_string()),
            ));
        }
        let backend = PcapReplayBackend::new(replay);
        return capture_with(&backend, DeviceSelector::Index(0), &args.store, &options, &stop);
    }

    let backend = LiveCaptureBackend;
    let selector = match (args.interface, args.device_index) {
        (Some(name), _) => DeviceSelector::Name(name),
        (None, Some(index)) => DeviceSelector::Index(index),
        (None, None) => prompt_for_device(&backend)?,
    };
    capture_with(&backend, selector, &args.store, &options, &stop)
}

fn capture_with<B: CaptureBackend>(
    backend: &B,
    selector: DeviceSelector,
    store: &Path,
    options: &CaptureOptions,
    stop: &AtomicBool,
) -> Result<(), CliError> {
    debug!(?selector, store = %store.display(), "starting capture");
    let stats = capture_to_store(backend, &selector, store, options, stop)?;
    eprintln!(
        "OK: captured {} packets -> {}",
        stats.captured,
        store.display()
    );
    if stats.write_failures > 0 {
        warn!(failures = stats.write_failures, "some records could not be stored");
    }
    Ok(())
}

fn install_stop_handler() -> Result<Arc<AtomicBool>, CliError> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;
    Ok(stop)
}

/// Ask for a device index on an interactive terminal.
fn prompt_for_device<B: CaptureBackend>(backend: &B) -> Result<DeviceSelector, CliError> {
    let no_selection = || {
        CliError::new(
            "no capture device selected",
            Some("use --interface NAME, --device-index N or --replay FILE".to_string()),
        )
    };
    if !io::stdin().is_terminal() {
        return Err(no_selection());
    }

    let devices = backend
        .list_interfaces()
        .map_err(|err| CliError::from(CaptureError::Source(err)))?;
    if devices.is_empty() {
        return Err(CaptureError::NoDevicesFound.into());
    }
    print_devices(&devices);

    print!("Select device index: ");
    io::stdout().flush().context("Failed to write prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read device index")?;
    let index = line.trim().parse::<usize>().map_err(|_| {
        CliError::new(
            format!("invalid device index '{}'", line.trim()),
            Some("enter one of the listed numbers".to_string()),
        )
    })?;
    Ok(DeviceSelector::Index(index))
}

fn cmd_interfaces() -> Result<(), CliError> {
    let devices = LiveCaptureBackend
        .list_interfaces()
        .map_err(|err| CliError::from(CaptureError::Source(err)))?;
    if devices.is_empty() {
        return Err(CaptureError::NoDevicesFound.into());
    }
    print_devices(&devices);
    Ok(())
}

fn print_devices(devices: &[DeviceInfo]) {
    for (index, device) in devices.iter().enumerate() {
        match &device.description {
            Some(description) => println!("{index}: {} ({description})", device.name),
            None => println!("{index}: {}", device.name),
        }
    }
}

fn cmd_analyze(
    store: &Path,
    out: &Path,
    format: ChartFormat,
    bins: usize,
    top: usize,
    bucket: Bucket,
    quiet: bool,
) -> Result<(), CliError> {
    if bins == 0 {
        return Err(CliError::new(
            "--bins must be at least 1",
            Some(format!("the default is {DEFAULT_HISTOGRAM_BINS}")),
        ));
    }
    let store = resolve_store_path(store)?;
    validate_store_file(&store)?;
    debug!(store = %store.display(), out = %out.display(), ?format, "analysing store");

    let config = AnalysisConfig {
        histogram_bins: bins,
        top_talkers: top,
        time_bucket: bucket.into(),
    };
    let renderer: &dyn ChartRenderer = match format {
        ChartFormat::Svg => &SvgRenderer,
        ChartFormat::Json => &JsonRenderer,
    };

    let run = analyze_store(&store, out, &config, renderer)
        .with_context(|| format!("Analysis of {} failed", store.display()))?;

    match run {
        AnalysisRun::NoData { skipped } => {
            if !quiet {
                eprintln!("No data: {} holds no records", store.display());
                if skipped > 0 {
                    eprintln!("  {skipped} malformed lines were skipped");
                }
            }
            Ok(())
        }
        AnalysisRun::Completed { total, outcome } => {
            if !outcome.is_complete() {
                for failure in &outcome.failures {
                    error!(
                        path = %failure.path.display(),
                        error = %failure.error,
                        "artifact not written"
                    );
                }
                return Err(CliError::new(
                    format!(
                        "{} of {} report artifacts failed",
                        outcome.failures.len(),
                        outcome.failures.len() + outcome.written.len()
                    ),
                    Some(format!("check that {} is writable", out.display())),
                ));
            }
            if !quiet {
                eprintln!(
                    "OK: {total} packets analysed, {} artifacts written -> {}",
                    outcome.written.len(),
                    out.display()
                );
            }
            Ok(())
        }
    }
}

fn validate_store_file(store: &Path) -> Result<(), CliError> {
    if !store.exists() {
        return Err(CliError::new(
            format!("store not found: {}", store.display()),
            Some("run `trafficlens capture` first, or pass the store path".to_string()),
        ));
    }
    if !store.is_file() {
        return Err(CliError::new(
            format!("store is not a file: {}", store.display()),
            Some("pass the path of a .csv record store".to_string()),
        ));
    }
    Ok(())
}

fn resolve_store_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid store pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid store pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        n => {
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            let more = if n > 3 { ", ..." } else { "" };
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}{}",
                    pattern,
                    n,
                    listed.join(", "),
                    more
                ),
                Some("pass a single store, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
