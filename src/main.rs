//! Elmo main entry point
//!
//! This is the command-line interface for the Elmo page-asset auditor.

use anyhow::{anyhow, Context};
use clap::Parser;
use elmo::audit::run_audit;
use elmo::config::{load_config, validate, Config, TimingMode};
use elmo::output::{evaluate_report, format_nagios_line, print_report, InfluxExporter, NagiosStatus};
use elmo::url::parse_domain_list;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Elmo: a page-asset auditor
///
/// Elmo downloads a page and every image, script, embed, stylesheet and inline
/// background image it references, then reports how long it took and how
/// much was transferred.
#[derive(Parser, Debug)]
#[command(name = "elmo")]
#[command(version)]
#[command(about = "A page-asset auditor", long_about = None)]
struct Cli {
    /// The url to get
    #[arg(long)]
    url: Option<String>,

    /// Path to a TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of parallel fetches to launch, 0 means unlimited
    #[arg(long)]
    parallel: Option<usize>,

    /// Connect timeout in ms
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// TLS handshake timeout in ms, added to the connect timeout
    #[arg(long)]
    tls_timeout: Option<u64>,

    /// Response header timeout in ms, 0 disables it
    #[arg(long)]
    response_header_timeout: Option<u64>,

    /// Request timeout in ms
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Allowed asset domains, comma separated
    #[arg(long, value_name = "DOMAINS")]
    assets_allowed_domains: Option<String>,

    /// Keyword the page must contain
    #[arg(long)]
    keyword: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// User-Agent header value
    #[arg(long)]
    user_agent: Option<String>,

    /// Resolve host:port to another address, as host:port:addr
    #[arg(long, value_name = "RULE")]
    resolve: Option<String>,

    /// Total time accounting: elapsed or cumulative
    #[arg(long)]
    timing: Option<TimingMode>,

    /// Nagios compatible output and exit code
    #[arg(long)]
    nagios: bool,

    /// Nagios warning time in ms
    #[arg(long)]
    nagios_warning: Option<u64>,

    /// Nagios critical time in ms
    #[arg(long)]
    nagios_critical: Option<u64>,

    /// Send statistics to InfluxDB
    #[arg(long)]
    influx: bool,

    /// The InfluxDB access url
    #[arg(long)]
    influx_url: Option<String>,

    /// The InfluxDB database name
    #[arg(long)]
    influx_database: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv); -v also lists every resource
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Builds the run configuration: file or defaults, then flag overrides
    fn build_config(&self) -> anyhow::Result<Config> {
        let mut config = match (&self.config, &self.url) {
            (Some(path), _) => load_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            (None, Some(url)) => Config::for_url(url.clone()),
            (None, None) => return Err(anyhow!("either --url or --config is required")),
        };

        if let Some(url) = &self.url {
            config.audit.url = url.clone();
        }
        if let Some(parallel) = self.parallel {
            config.audit.parallel = parallel;
        }
        if let Some(domains) = &self.assets_allowed_domains {
            config.audit.allowed_domains = parse_domain_list(domains);
        }
        if let Some(keyword) = &self.keyword {
            config.audit.keyword = Some(keyword.clone());
        }
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| anyhow!("header '{}' must be NAME:VALUE", header))?;
            config
                .audit
                .headers
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        if let Some(user_agent) = &self.user_agent {
            config.audit.user_agent = user_agent.clone();
        }
        if let Some(timing) = self.timing {
            config.audit.timing = timing;
        }

        if let Some(ms) = self.connect_timeout {
            config.transport.connect_timeout = ms;
        }
        if let Some(ms) = self.tls_timeout {
            config.transport.tls_timeout = ms;
        }
        if let Some(ms) = self.response_header_timeout {
            config.transport.response_header_timeout = ms;
        }
        if let Some(ms) = self.request_timeout {
            config.transport.request_timeout = ms;
        }
        if let Some(rule) = &self.resolve {
            config.transport.resolve = Some(rule.clone());
        }

        if let Some(ms) = self.nagios_warning {
            config.nagios.warning = ms;
        }
        if let Some(ms) = self.nagios_critical {
            config.nagios.critical = ms;
        }
        if let Some(url) = &self.influx_url {
            config.influx.url = url.clone();
        }
        if let Some(database) = &self.influx_database {
            config.influx.database = database.clone();
        }

        validate(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet || cli.nagios);

    let config = match cli.build_config() {
        Ok(config) => config,
        Err(e) if cli.nagios => exit_unknown(&e),
        Err(e) => return Err(e),
    };

    let report = match run_audit(&config).await {
        Ok(report) => report,
        Err(e) if cli.nagios => exit_unknown(&e.into()),
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e.into());
        }
    };

    if cli.influx {
        let exported = match InfluxExporter::new(&config.influx) {
            Ok(exporter) => exporter.export(&report).await,
            Err(e) => Err(e),
        };
        if let Err(e) = exported {
            tracing::error!("Influxdb export failed: {}", e);
        }
    }

    if cli.nagios {
        let status = evaluate_report(&report, &config);
        println!("{}", format_nagios_line(&report, &config));
        std::process::exit(status.exit_code());
    }

    if !cli.quiet {
        print_report(&report, cli.verbose > 0);
    }

    Ok(())
}

/// Prints a plugin UNKNOWN line and exits with its code
fn exit_unknown(error: &anyhow::Error) -> ! {
    println!("{}: {:#}", NagiosStatus::Unknown, error);
    std::process::exit(NagiosStatus::Unknown.exit_code());
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("elmo=info,warn"),
            1 => EnvFilter::new("elmo=debug,info"),
            2 => EnvFilter::new("elmo=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}
