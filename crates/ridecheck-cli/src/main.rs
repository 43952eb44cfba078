//! ridecheck CLI - conformance checks for carpooling API servers

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ridecheck_core::{Config, Expectations, ReportRecord, RequestCase, RunSummary};
use ridecheck_runner::{ApiRequest, HttpClient, Orchestrator, SpecDocument, TestTable};

#[derive(Parser)]
#[command(name = "ridecheck")]
#[command(about = "Conformance checks for carpooling API servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Show passing assertions too
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Debug logging on stderr (RUST_LOG is honored otherwise)
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a single request
    Test {
        /// Full request URL, e.g. http://localhost:8080/driver_journeys
        #[arg(long)]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Query parameter (key=value), repeatable
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// Request header (name:value), repeatable
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        header: Vec<String>,

        /// JSON request body, or @file to read it from a file
        #[arg(long)]
        body: Option<String>,

        /// Expected status code (default: the endpoint's success code)
        #[arg(long)]
        expect_status: Option<u16>,

        /// Response array must not be empty
        #[arg(long)]
        expect_non_empty: bool,

        /// Expected booking status
        #[arg(long)]
        expect_booking_status: Option<String>,

        /// OpenAPI document (default: bundled carpooling document)
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Config file for headers, timeout and radius margin
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Test every request listed in a config file
    Run {
        /// Config file (default: .ridecheck.toml)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// List the endpoints under test
    Endpoints,

    /// Export JSON Schema for the JSON report format
    Schema,

    /// Initialize config file
    Init,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let cfg = match path {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::load_default()?,
    };
    Ok(cfg)
}

/// The OpenAPI document is validated before any request is issued.
fn load_spec(path: Option<&Path>) -> Result<Arc<SpecDocument>> {
    match path {
        Some(path) => {
            let doc = SpecDocument::load(path)
                .with_context(|| format!("cannot use OpenAPI document {}", path.display()))?;
            Ok(Arc::new(doc))
        }
        None => Ok(SpecDocument::bundled()),
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Test {
            url,
            method,
            query,
            header,
            body,
            expect_status,
            expect_non_empty,
            expect_booking_status,
            spec,
            config,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            for raw in &header {
                let (name, value) = split_pair(raw, ':')?;
                cfg.headers.insert(name.to_string(), value.to_string());
            }
            let case = RequestCase {
                method,
                // Absolute URL; the case is resolved against an empty base
                path: url,
                query: parse_query(&query)?,
                body: body.as_deref().map(parse_body).transpose()?,
                expect: Expectations {
                    status: expect_status,
                    non_empty: expect_non_empty,
                    booking_status: expect_booking_status,
                },
            };
            let spec_path = spec.or_else(|| cfg.spec.clone());
            let spec = load_spec(spec_path.as_deref())?;

            let summary = test_cases(&cfg, spec, "", std::slice::from_ref(&case))?;
            print_summary(&summary, cli.output, cli.verbose || cfg.verbose)?;
            Ok(summary.exit_code())
        }

        Commands::Run { config } => {
            let cfg = load_config(config.as_deref())?;
            if cfg.requests.is_empty() {
                bail!("no requests configured; add [[requests]] entries (see `ridecheck init`)");
            }
            let spec = load_spec(cfg.spec.as_deref())?;

            if cli.output == OutputFormat::Terminal {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                if let Some(spec) = &cfg.spec {
                    eprintln!("  spec:     {}", spec.display());
                }
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                eprintln!("  requests: {}", cfg.requests.len());
                eprintln!();
            }

            let summary = test_cases(&cfg, spec, &cfg.base_url, &cfg.requests)?;
            print_summary(&summary, cli.output, cli.verbose || cfg.verbose)?;
            Ok(summary.exit_code())
        }

        Commands::Endpoints => {
            let table = TestTable::standard();
            for endpoint in table.endpoints() {
                println!("{:<32} {}", endpoint.label(), endpoint.default_status());
            }
            Ok(0)
        }

        Commands::Schema => {
            let schema = ridecheck_core::report::generate_schema();
            println!("{schema}");
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".ridecheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: server to test");
            println!("  - headers: API keys");
            println!("  - requests: the calls to check and what to expect");
            Ok(0)
        }
    }
}

/// Issue every case in order. A case that cannot be built or targets no
/// known endpoint is recorded as a tool error and the run continues.
fn test_cases(
    cfg: &Config,
    spec: Arc<SpecDocument>,
    base_url: &str,
    cases: &[RequestCase],
) -> Result<RunSummary> {
    let client = HttpClient::new(Duration::from_secs(cfg.timeout_secs))?;
    let orchestrator = Orchestrator::new(client, spec, TestTable::standard());
    tracing::debug!(cases = cases.len(), timeout_secs = cfg.timeout_secs, "starting run");

    let mut summary = RunSummary::default();
    for case in cases {
        let url = case.url(base_url);
        let request = match build_request(case, &url, &cfg.headers) {
            Ok(request) => request,
            Err(e) => {
                summary.record_error(format!("{} {url}: {e:#}", case.method));
                continue;
            }
        };
        match orchestrator.run(&request, &case.flags(cfg.radius_margin)) {
            Ok(report) => summary.record(report.to_record()),
            Err(e) => summary.record_error(format!("{} {url}: {e}", case.method)),
        }
    }
    Ok(summary)
}

fn build_request(
    case: &RequestCase,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<ApiRequest> {
    let mut request = ApiRequest::new(&case.method, url)?;
    for (name, value) in headers {
        request = request.with_header(name, value)?;
    }
    if let Some(body) = &case.body {
        request = request.with_json_body(body);
    }
    Ok(request)
}

fn print_summary(summary: &RunSummary, output: OutputFormat, verbose: bool) -> Result<()> {
    match output {
        OutputFormat::Terminal => {
            for record in &summary.reports {
                print_record(record, verbose);
            }
            if !summary.errors.is_empty() {
                println!("\nErrors:");
                for err in &summary.errors {
                    println!("  - {err}");
                }
            }
            let icon = if summary.exit_code() == 0 { "PASS" } else { "FAIL" };
            println!(
                "\n{icon}: {} requests ({} failed), {} assertions ({} failed)",
                summary.requests,
                summary.failed_requests,
                summary.assertions,
                summary.failed_assertions
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Silent => {}
    }
    Ok(())
}

fn print_record(record: &ReportRecord, verbose: bool) {
    let icon = if record.has_errors() { "FAIL" } else { "PASS" };
    println!("{icon} {} {}", record.endpoint, record.url);
    for assertion in &record.assertions {
        match &assertion.error {
            Some(e) => println!("  FAIL {}: {e}", assertion.description),
            None if verbose => println!("  PASS {}", assertion.description),
            None => {}
        }
    }
}

fn split_pair(raw: &str, separator: char) -> Result<(&str, &str)> {
    let Some((key, value)) = raw.split_once(separator) else {
        bail!("expected '{separator}' in \"{raw}\"");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty name in \"{raw}\"");
    }
    Ok((key, value.trim()))
}

fn parse_query(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| {
            let (key, value) = split_pair(pair, '=')?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

fn parse_body(raw: &str) -> Result<serde_json::Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request body from {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("request body is not valid JSON")
}
