//! xsection CLI binary.
//!
//! Evaluates factor panels against forward excess returns and writes the
//! result tables as CSV.
//!
//! Usage:
//!   evaluate --factors factors.csv --returns returns.csv --output out/
//!   evaluate --config run.json --factors factors.csv --quotes quotes.csv \
//!       --rates rates.csv --calendar calendar.csv --registry registry.csv

use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use polars::prelude::*;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xsection::{
    calendar::{CalendarTable, ScheduleConfig, SessionScheduler},
    model::{EvalConfig, FactorEvaluator, QuantileAnalytics, tables},
    panel::{
        BenchmarkRates, EligibilityConfig, EligibilityFilter, FactorPanel, ListingRecord,
        NameChange, QuoteBook, ReturnCalculator, ReturnConfig, ReturnPanel,
    },
    primitives::{Date, FactorName, Session},
};

#[derive(Parser)]
#[command(name = "evaluate")]
#[command(about = "Cross-sectional factor signal evaluation", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Factor panel `{symbol, session_end, <factors>}`
    #[arg(long)]
    factors: PathBuf,

    /// Precomputed return panel `{symbol, session_date, er_<h>m, weight_<h>m}`
    #[arg(long)]
    returns: Option<PathBuf>,

    /// Quote panel `{symbol, trade_date, close, market_value}`
    #[arg(long, conflicts_with = "returns")]
    quotes: Option<PathBuf>,

    /// Benchmark rate panel `{date, 1m, 3m, 6m, 12m}`
    #[arg(long, conflicts_with = "returns")]
    rates: Option<PathBuf>,

    /// Trading calendar `{cal_date, is_open}`
    #[arg(long, conflicts_with = "returns")]
    calendar: Option<PathBuf>,

    /// Listing registry `{symbol, list_date, delist_date}`
    #[arg(long, conflicts_with = "returns")]
    registry: Option<PathBuf>,

    /// Name changes `{symbol, name, start_date, end_date}`
    #[arg(long, conflicts_with = "returns")]
    name_changes: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

/// Everything a run needs besides its input files.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunConfig {
    schedule: ScheduleConfig,
    eligibility: EligibilityConfig,
    returns: ReturnConfig,
    eval: EvalConfig,
    /// Factor columns to evaluate; every numeric column when unset.
    factors: Option<Vec<FactorName>>,
}

impl RunConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::load(cli.config.as_deref())?;
    let evaluator = FactorEvaluator::new(config.eval.clone()).context("invalid evaluation config")?;
    let label = config.eval.run_label();

    let factors = FactorPanel::from_frame(&read_csv(&cli.factors, true)?, config.factors.as_deref())
        .context("failed to load factor panel")?;
    info!(
        factors = factors.factors().len(),
        sessions = factors.n_sessions(),
        rows = factors.n_rows(),
        "loaded factor panel"
    );

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let returns = match &cli.returns {
        Some(path) => ReturnPanel::from_frame(&read_csv(path, true)?).context("failed to load return panel")?,
        None => {
            let returns = compute_returns(&cli, &config)?;
            write_csv(&cli.output, "excess_returns.csv", returns.to_frame()?)?;
            returns
        }
    };
    info!(observations = returns.len(), horizons = returns.horizons().len(), "return panel ready");

    let evaluation = evaluator.evaluate(&factors, &returns)?;
    let summary = evaluator.summarize(&evaluation);
    for stat in &summary {
        info!(
            series = %stat.label(),
            t_value_mean = stat.t_value_mean,
            t_gt2 = stat.t_gt2,
            ic_mean = stat.ic_mean,
            "summary"
        );
    }

    write_csv(&cli.output, &format!("factor_loading_{label}.csv"), tables::loading_table(&evaluation.results)?)?;
    write_csv(&cli.output, &format!("t_value_{label}.csv"), tables::tvalue_table(&evaluation.results)?)?;
    write_csv(&cli.output, &format!("ic_{label}.csv"), tables::ic_table(&evaluation.results)?)?;
    write_csv(&cli.output, &format!("summary_{label}.csv"), tables::summary_table(&summary)?)?;
    for factor in factors.factors() {
        write_csv(
            &cli.output,
            &format!("{factor}_{label}.csv"),
            tables::transformed_table(factor, &evaluation.transformed)?,
        )?;
    }
    for analytics in evaluator.quantiles(&evaluation, &returns)? {
        write_quantiles(&cli.output, &label, &analytics)?;
    }

    info!(output = %cli.output.display(), skipped = evaluation.skipped.len(), "done");
    Ok(())
}

/// Price forward excess returns over the scheduled sessions.
fn compute_returns(cli: &Cli, config: &RunConfig) -> Result<ReturnPanel> {
    let (Some(quotes), Some(rates), Some(calendar), Some(registry)) =
        (&cli.quotes, &cli.rates, &cli.calendar, &cli.registry)
    else {
        bail!("either --returns or all of --quotes, --rates, --calendar and --registry are required");
    };

    let calendar = CalendarTable::from_frame(&read_csv(calendar, false)?).context("failed to load calendar")?;
    let quotes = QuoteBook::from_frame(&read_csv(quotes, true)?).context("failed to load quotes")?;
    let rates = BenchmarkRates::from_frame(&read_csv(rates, false)?).context("failed to load rates")?;
    let listings = ListingRecord::from_frame(&read_csv(registry, true)?).context("failed to load registry")?;
    let name_changes = match &cli.name_changes {
        Some(path) => NameChange::from_frame(&read_csv(path, true)?).context("failed to load name changes")?,
        None => Vec::new(),
    };
    info!(
        open_dates = calendar.len(),
        quote_dates = quotes.n_dates(),
        listings = listings.len(),
        name_changes = name_changes.len(),
        "loaded market data"
    );

    config.schedule.validate()?;
    let schedule = SessionScheduler::new(&calendar, config.schedule.clone()).schedule()?;
    let sessions: BTreeMap<Date, Session> =
        schedule.into_values().flatten().map(|s| (s.end, s)).collect();
    let sessions: Vec<Session> = sessions.into_values().collect();

    let filter = EligibilityFilter::new(config.eligibility.clone(), listings, name_changes);
    let calculator = ReturnCalculator::new(&calendar, &quotes, &rates, config.returns.clone());
    Ok(calculator.compute_sessions(&sessions, &filter)?)
}

fn write_quantiles(dir: &Path, label: &str, analytics: &QuantileAnalytics) -> Result<()> {
    let factor = &analytics.factor;
    write_csv(dir, &format!("turnover_{factor}_{label}.csv"), tables::turnover_table(analytics)?)?;
    write_csv(
        dir,
        &format!("autocorrelation_{factor}_{label}.csv"),
        tables::autocorrelation_table(analytics)?,
    )?;
    write_csv(
        dir,
        &format!("quantile_returns_{factor}_{label}.csv"),
        tables::quantile_returns_table(analytics)?,
    )?;
    write_csv(dir, &format!("spread_{factor}_{label}.csv"), tables::spread_table(analytics)?)
}

/// Read a CSV file, keeping the `symbol` column as text when present.
fn read_csv(path: &Path, has_symbol: bool) -> Result<DataFrame> {
    let mut options = CsvReadOptions::default().with_has_header(true);
    if has_symbol {
        let schema = Schema::from_iter([(PlSmallStr::from_static("symbol"), DataType::String)]);
        options = options.with_schema_overwrite(Some(Arc::new(schema)));
    }
    options
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))
}

fn write_csv(dir: &Path, name: &str, mut df: DataFrame) -> Result<()> {
    let path = dir.join(name);
    let mut file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}
