use anyhow::Result;
use clap::Parser;
use homewatch::{HomewatchConfig, HomewatchOrchestrator};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "homewatch")]
#[command(about = "Motion-triggered home surveillance controlled through a Telegram bot")]
#[command(version)]
#[command(long_about = "Homewatch watches a PIR motion sensor while armed, takes a short burst \
of photos when motion starts and sends them to a single operator over Telegram. The operator \
arms, disarms and requests snapshots with bot commands.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "homewatch.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Load configuration and check the bot token, then exit
    #[arg(long, help = "Authenticate against the bot API and exit without arming anything")]
    dry_run: bool,

    #[arg(long, help = "Use the keyboard motion sensor instead of the configured backend")]
    keyboard: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[arg(long, value_name = "DIR", help = "Also write daily rotated log files to DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting Homewatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match HomewatchConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match config.validate() {
        Ok(()) if args.validate_config => {
            info!("Configuration validation successful");
            println!("✓ Configuration is valid");
            return Ok(());
        }
        Ok(()) => {}
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            drop(log_guard);
            std::process::exit(1);
        }
    }

    let mut orchestrator = HomewatchOrchestrator::new(config, args.keyboard)
        .await
        .map_err(|e| {
            error!("Failed to create orchestrator: {}", e);
            e
        })?;

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize system: {}", e);
        e
    })?;

    if args.dry_run {
        return match orchestrator.authenticate().await {
            Ok(user) => {
                println!(
                    "✓ Dry run completed successfully - authorized as {}",
                    user.username.as_deref().unwrap_or(&user.first_name)
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("✗ Dry run failed: {}", e);
                drop(log_guard);
                std::process::exit(1);
            }
        };
    }

    if let Err(e) = orchestrator.start().await {
        error!("Failed to start system: {}", e);
        if e.is_startup_fatal() {
            drop(log_guard);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("Homewatch exited with code: {}", exit_code);

    // process::exit skips destructors, flush file logs first
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
    };

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("homewatch={}", log_level)));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };
    layers.push(console);

    let guard = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "homewatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Homewatch Configuration File");
    println!("# telegram.token and telegram.operator_id must be set before starting.");
    println!("# Any value can be overridden with HOMEWATCH_<SECTION>__<KEY>, e.g.");
    println!("# HOMEWATCH_TELEGRAM__TOKEN.");
    println!();

    let rendered = toml::to_string_pretty(&HomewatchConfig::default())?;
    println!("{}", rendered);
    Ok(())
}
