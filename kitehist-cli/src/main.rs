mod cli;
mod error;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{CommandFactory, Parser};
use kitehist::{
    HistoryOutcome, KiteHist, KiteHistBuilder, Market, RateLimitConfig, Resolution, SecurityType,
    Symbol,
};
use kitehist_mock::MockProvider;
use kitehist_zerodha::ZerodhaConnector;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::BarWriter;

const DATE_FORMAT: &str = "%Y%m%d-%H:%M:%S";

#[tokio::main]
async fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    if std::env::args_os().len() <= 1 {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprint!("ERROR: {e}");
            return ExitCode::from(1);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = cli.app.as_deref().ok_or(CliError::MissingApp)?;
    if !(app.contains("download") || app.contains("dl")) {
        return Err(CliError::UnrecognizedApp);
    }
    download(&cli).await
}

fn parse_date(flag: &str, value: &str) -> Result<DateTime<Utc>, CliError> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|t| t.and_utc())
        .map_err(|e| CliError::Argument(format!("--{flag} '{value}' is not yyyyMMdd-HH:mm:ss: {e}")))
}

fn or_default<T: std::str::FromStr>(flag: &str, value: &str, default: T) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    if value.trim().is_empty() {
        return Ok(default);
    }
    value
        .parse()
        .map_err(|e| CliError::Argument(format!("--{flag}: {e}")))
}

/// Attach the data source. The mock is throttled per fetch through middleware;
/// the Zerodha connector charges its own limiter per HTTP request.
fn with_provider(cli: &Cli, builder: KiteHistBuilder) -> Result<KiteHistBuilder, CliError> {
    if std::env::var_os("KITEHIST_USE_MOCK").is_some_and(|v| !v.is_empty()) {
        tracing::info!("using mock provider");
        return Ok(builder
            .with_provider(Arc::new(MockProvider::new()))
            .rate_limit(RateLimitConfig::kite()));
    }
    let (Some(key), Some(token)) = (cli.api_key.as_deref(), cli.access_token.as_deref()) else {
        return Err(CliError::Argument(
            "KITE_API_KEY and KITE_ACCESS_TOKEN are required".into(),
        ));
    };
    let mut connector = ZerodhaConnector::builder()
        .credentials(key, token)
        .rate_limit(RateLimitConfig::kite());
    if let Some(url) = &cli.base_url {
        connector = connector.base_url(url.clone());
    }
    Ok(builder.with_provider(Arc::new(connector.build()?)))
}

async fn download(cli: &Cli) -> Result<(), CliError> {
    let from = cli
        .from_date
        .as_deref()
        .ok_or_else(|| CliError::Argument("--from-date is required".into()))?;
    let start = parse_date("from-date", from)?;
    let end = match cli.to_date.as_deref() {
        Some(to) => parse_date("to-date", to)?,
        None => Utc::now(),
    };
    let resolution = or_default("resolution", &cli.resolution, Resolution::Minute)?;
    let market = if cli.market.trim().is_empty() {
        Market::india()
    } else {
        Market::new(&cli.market)
    };
    let kind = or_default("security-type", &cli.security_type, SecurityType::Equity)?;

    let tickers = cli.tickers();
    if tickers.is_empty() {
        return Err(CliError::Argument("at least one ticker is required".into()));
    }
    let symbols = tickers
        .iter()
        .map(|t| Symbol::new(t, kind, market.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    let kh = with_provider(cli, KiteHist::builder())?.build()?;
    tracing::info!(
        symbols = symbols.len(),
        %resolution,
        %start,
        %end,
        "starting download"
    );
    let report = kh
        .download()
        .symbols(&symbols)?
        .resolution(resolution)
        .period(start, end)
        .run()
        .await?;

    let mut out = BarWriter::new(std::io::stdout().lock())?;
    for entry in &report.entries {
        match &entry.outcome {
            HistoryOutcome::Supported(resp) => out.write(&entry.symbol, resp)?,
            HistoryOutcome::Unsupported(reason) => {
                eprintln!("skipping {}: {reason}", entry.symbol);
            }
            HistoryOutcome::Failed(_) => {}
        }
    }
    out.finish()?;
    for w in &report.warnings {
        tracing::warn!(warning = %w, "download warning");
        eprintln!("WARN: {w}");
    }
    Ok(())
}
