use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoproxy::{config, server, FixtureSource, HttpSource, ProviderRegistry, Resolver, ServerConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Relative URL path of the geocode endpoint. A trailing '?' is accepted
    #[clap(long, env = "GEOPROXY_PATH", default_value = config::DEFAULT_PATH)]
    path: String,

    /// Bind address. Leave empty to listen on every interface
    #[clap(long, env = "GEOPROXY_ADDR", default_value = "")]
    addr: String,

    /// Listening port, between 1024 and 49151
    #[clap(
        long,
        env = "GEOPROXY_PORT",
        allow_negative_numbers = true,
        default_value_t = i64::from(config::DEFAULT_PORT)
    )]
    port: i64,

    /// Cache-Control max-age in seconds for successful responses (0 = no header)
    #[clap(
        long = "cctl",
        value_name = "SECS",
        env = "GEOPROXY_CACHE_MAX_AGE",
        allow_negative_numbers = true,
        default_value_t = 0
    )]
    max_age: i64,

    /// Run debug mode against fixture data: every provider is exercised and
    /// reported instead of returning the first match
    #[clap(long)]
    debug: bool,

    /// Directory holding the <provider>_sample.json fixtures used by --debug
    #[clap(
        long,
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
        env = "GEOPROXY_FIXTURES",
        default_value = "."
    )]
    fixtures: Utf8PathBuf,

    /// Provider configuration file
    #[clap(
        long,
        value_name = "FILE",
        value_hint = clap::ValueHint::FilePath,
        env = "GEOPROXY_PROVIDERS",
        default_value = "providers.json"
    )]
    providers: Utf8PathBuf,

    /// Timeout in seconds for each provider request (default: wait indefinitely)
    #[clap(long, value_name = "SECS", env = "GEOPROXY_TIMEOUT")]
    timeout: Option<u64>,

    /// List the configured providers in priority order and exit
    #[clap(long)]
    list_providers: bool,
}

fn main() -> ExitCode {
    init_tracing();

    let err = match run_main() {
        Ok(code) => return code,
        Err(err) => err,
    };

    // Print detailed error information based on environment variables
    if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        let _ = writeln!(&mut std::io::stderr(), "{:?}", err);
    } else {
        let _ = writeln!(&mut std::io::stderr(), "{:#}", err);
    }

    ExitCode::FAILURE
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,geoproxy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_main() -> Result<ExitCode> {
    let args = Args::parse();

    let registry = ProviderRegistry::from_path(&args.providers)
        .with_context(|| format!("Failed to load providers from {}", args.providers))?;

    if args.list_providers {
        print!("{}", registry.describe());
        return Ok(ExitCode::SUCCESS);
    }

    let config = ServerConfig::new(&args.path, &args.addr, args.port, args.max_age)?;
    tracing::info!(
        providers = ?registry.names(),
        debug = args.debug,
        "Loaded geocode providers"
    );

    let registry = Arc::new(registry);
    let resolver = if args.debug {
        tracing::warn!(
            fixtures = %args.fixtures,
            "Debug mode: answering from fixtures, providers will not be contacted"
        );
        Resolver::new(registry, FixtureSource::new(args.fixtures), true)
    } else {
        let timeout = args.timeout.map(Duration::from_secs);
        let source = HttpSource::new(timeout).context("Failed to build HTTP client")?;
        Resolver::new(registry, source, false)
    };
    // Declared before the runtime so the blocking HTTP client is dropped
    // after the runtime has shut down.
    let resolver = Arc::new(resolver);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime
        .block_on(server::serve(Arc::clone(&resolver), &config))
        .context("Geocode proxy server failed")?;

    Ok(ExitCode::SUCCESS)
}
