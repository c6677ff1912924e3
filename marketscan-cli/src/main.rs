//! MarketScan CLI — scan, rank, and inspect instruments from CSV history.
//!
//! Commands:
//! - `scan` — evaluate a scan template over a universe loaded from CSV
//! - `rank` — compute indicators and print the top instruments by RS number
//! - `indicators` — print the computed indicator block for one symbol
//!
//! The instrument CSV carries one row per instrument
//! (`id,kind,symbol,exchange,name,sector_id,group_id,dividend_id,divisor_id`);
//! quotation history lives in one `<SYMBOL>.csv` per listed instrument
//! (`date,open,high,low,close,volume`). Ratio instruments are derived from
//! their legs after loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use marketscan_core::compute::compute_universe;
use marketscan_core::domain::{
    Instrument, InstrumentId, InstrumentKind, Quotation, QuotationSeries,
};
use marketscan_core::provider::{CandidateProvider, HistoryProvider, MemoryProvider};
use marketscan_core::rank::rank_universe;
use marketscan_core::scan::Candidate;
use marketscan_core::{ScanParams, ScanTemplateEngine};

#[derive(Parser)]
#[command(
    name = "marketscan",
    about = "MarketScan CLI — stock screening and relative-strength ranking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a scan template over the loaded universe.
    Scan {
        /// Instrument metadata CSV.
        #[arg(long)]
        instruments: PathBuf,

        /// Directory of per-symbol quotation CSVs.
        #[arg(long)]
        quotes: PathBuf,

        /// Template name (e.g. swing_trading_environment, buyable_base).
        #[arg(long)]
        template: Option<String>,

        /// Instrument kind to scan: stock, etf, sector, industry_group.
        #[arg(long)]
        kind: Option<String>,

        /// Ranking start date for rank_since_date (YYYY-MM-DD).
        #[arg(long)]
        start_date: Option<String>,

        /// Minimum 20-day average dollar volume.
        #[arg(long)]
        min_liquidity: Option<f64>,

        /// TOML file supplying the same parameters; explicit flags win.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Compute indicators, rank, and print the top instruments.
    Rank {
        /// Instrument metadata CSV.
        #[arg(long)]
        instruments: PathBuf,

        /// Directory of per-symbol quotation CSVs.
        #[arg(long)]
        quotes: PathBuf,

        /// Instrument kind to rank. Defaults to stock.
        #[arg(long, default_value = "stock")]
        kind: String,

        /// How many instruments to print.
        #[arg(long, default_value_t = 50)]
        top: usize,
    },
    /// Print the computed indicator block for one instrument.
    Indicators {
        /// Instrument metadata CSV.
        #[arg(long)]
        instruments: PathBuf,

        /// Directory of per-symbol quotation CSVs.
        #[arg(long)]
        quotes: PathBuf,

        /// Symbol to inspect.
        #[arg(long)]
        symbol: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            instruments,
            quotes,
            template,
            kind,
            start_date,
            min_liquidity,
            config,
        } => run_scan(
            instruments,
            quotes,
            template,
            kind,
            start_date,
            min_liquidity,
            config,
        ),
        Commands::Rank {
            instruments,
            quotes,
            kind,
            top,
        } => run_rank(instruments, quotes, &kind, top),
        Commands::Indicators {
            instruments,
            quotes,
            symbol,
        } => run_indicators(instruments, quotes, &symbol),
    }
}

// ── CSV loading ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct InstrumentRow {
    id: u64,
    kind: String,
    symbol: Option<String>,
    exchange: Option<String>,
    name: String,
    sector_id: Option<u64>,
    group_id: Option<u64>,
    dividend_id: Option<u64>,
    divisor_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn load_instruments(path: &Path) -> Result<Vec<Instrument>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening instrument CSV {}", path.display()))?;

    let mut instruments = Vec::new();
    for row in reader.deserialize() {
        let row: InstrumentRow = row.context("parsing instrument row")?;
        let Some(kind) = InstrumentKind::parse(&row.kind) else {
            bail!("instrument {} has unknown kind '{}'", row.id, row.kind);
        };
        instruments.push(Instrument {
            id: InstrumentId(row.id),
            kind,
            symbol: row.symbol,
            exchange: row.exchange,
            name: row.name,
            sector: row.sector_id.map(InstrumentId),
            industry_group: row.group_id.map(InstrumentId),
            dividend: row.dividend_id.map(InstrumentId),
            divisor: row.divisor_id.map(InstrumentId),
        });
    }

    let kinds: HashMap<InstrumentId, InstrumentKind> =
        instruments.iter().map(|i| (i.id, i.kind)).collect();
    for instrument in &instruments {
        instrument
            .validate(|id| kinds.get(&id).copied())
            .with_context(|| format!("invalid instrument {}", instrument.id))?;
    }
    Ok(instruments)
}

fn load_series(quotes_dir: &Path, id: InstrumentId, symbol: &str) -> Result<QuotationSeries> {
    let path = quotes_dir.join(format!("{symbol}.csv"));
    let mut reader = csv::Reader::from_path(&path)
        .with_context(|| format!("opening quote CSV {}", path.display()))?;

    let mut quotes = Vec::new();
    for row in reader.deserialize() {
        let row: QuoteRow =
            row.with_context(|| format!("parsing quote row in {}", path.display()))?;
        quotes.push(Quotation::new(
            id, row.date, row.open, row.high, row.low, row.close, row.volume,
        ));
    }
    if quotes.is_empty() {
        bail!("no quotations in {}", path.display());
    }
    Ok(QuotationSeries::new(quotes))
}

/// Load instruments and histories into the in-memory provider. Listed
/// instruments load from their symbol CSV; ratio instruments are derived
/// from their legs afterwards.
fn load_universe(instruments_path: &Path, quotes_dir: &Path) -> Result<MemoryProvider> {
    let instruments = load_instruments(instruments_path)?;

    let mut histories: HashMap<InstrumentId, QuotationSeries> = HashMap::new();
    for instrument in &instruments {
        if instrument.kind == InstrumentKind::Ratio {
            continue;
        }
        let symbol = instrument.symbol.as_deref().expect("validated above");
        histories.insert(instrument.id, load_series(quotes_dir, instrument.id, symbol)?);
    }
    for instrument in &instruments {
        if instrument.kind != InstrumentKind::Ratio {
            continue;
        }
        let (dividend, divisor) = (
            instrument.dividend.expect("validated above"),
            instrument.divisor.expect("validated above"),
        );
        let (Some(a), Some(b)) = (histories.get(&dividend), histories.get(&divisor)) else {
            bail!("ratio {} references a leg without history", instrument.id);
        };
        histories.insert(instrument.id, QuotationSeries::ratio(instrument.id, a, b));
    }

    let mut provider = MemoryProvider::new();
    for instrument in instruments {
        let series = histories.remove(&instrument.id).expect("loaded above");
        provider.insert(instrument, series);
    }
    Ok(provider)
}

// ── Compute + rank pipeline ──────────────────────────────────────────

/// Full indicator pass over every instrument, then percentile ranking per
/// universe, written back so the provider serves scored quotations.
fn score_provider(provider: &mut MemoryProvider) -> Result<()> {
    let ids: Vec<InstrumentId> = provider.instruments().map(|i| i.id).collect();
    let mut universe: Vec<QuotationSeries> = ids
        .iter()
        .map(|&id| provider.history(id))
        .collect::<Result<_, _>>()?;
    compute_universe(&mut universe);
    for series in universe {
        let id = series.instrument_id().expect("non-empty history");
        let latest = series.latest().expect("non-empty history").clone();
        provider.series_mut(id).expect("loaded above").replace_latest(latest);
    }

    for kind in [
        InstrumentKind::Stock,
        InstrumentKind::Etf,
        InstrumentKind::Sector,
        InstrumentKind::IndustryGroup,
    ] {
        let mut candidates = provider.latest_candidates(kind)?;
        rank_universe(&mut candidates);
        for candidate in candidates {
            provider
                .series_mut(candidate.instrument.id)
                .expect("candidate came from this provider")
                .replace_latest(candidate.quotation);
        }
    }
    Ok(())
}

// ── scan ─────────────────────────────────────────────────────────────

/// Optional TOML parameters for `scan`; explicit flags win.
#[derive(Debug, Default, Deserialize)]
struct ScanFileConfig {
    template: Option<String>,
    kind: Option<String>,
    start_date: Option<String>,
    min_liquidity: Option<f64>,
}

fn run_scan(
    instruments: PathBuf,
    quotes: PathBuf,
    template: Option<String>,
    kind: Option<String>,
    start_date: Option<String>,
    min_liquidity: Option<f64>,
    config: Option<PathBuf>,
) -> Result<()> {
    let file_config = match config {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<ScanFileConfig>(&content)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ScanFileConfig::default(),
    };

    let Some(template) = template.or(file_config.template) else {
        bail!("--template is required (via flag or config file)");
    };
    let kind = match kind.or(file_config.kind) {
        Some(s) => parse_kind(&s)?,
        None => InstrumentKind::Stock,
    };
    let start_date = start_date
        .or(file_config.start_date)
        .map(|s| parse_date(&s))
        .transpose()?;
    let min_liquidity = min_liquidity.or(file_config.min_liquidity);

    let mut provider = load_universe(&instruments, &quotes)?;
    score_provider(&mut provider)?;

    let engine = ScanTemplateEngine::new(&provider);
    let params = ScanParams { template, kind, start_date, min_liquidity };
    let result = engine.evaluate(&params)?;

    if result.is_empty() {
        println!("No candidates matched '{}'.", params.template);
        return Ok(());
    }
    println!("Template '{}': {} candidate(s)", params.template, result.len());
    println!();
    print_candidate_table(&result);
    Ok(())
}

// ── rank ─────────────────────────────────────────────────────────────

fn run_rank(instruments: PathBuf, quotes: PathBuf, kind: &str, top: usize) -> Result<()> {
    let kind = parse_kind(kind)?;
    let mut provider = load_universe(&instruments, &quotes)?;
    score_provider(&mut provider)?;

    let mut candidates = provider.latest_candidates(kind)?;
    candidates.sort_by_key(|c| std::cmp::Reverse(rs_number(c)));
    candidates.truncate(top);

    if candidates.is_empty() {
        println!("No instruments of that kind.");
        return Ok(());
    }
    print_candidate_table(&candidates);
    Ok(())
}

// ── indicators ───────────────────────────────────────────────────────

fn run_indicators(instruments: PathBuf, quotes: PathBuf, symbol: &str) -> Result<()> {
    let mut provider = load_universe(&instruments, &quotes)?;
    score_provider(&mut provider)?;

    let Some(instrument) = provider
        .instruments()
        .find(|i| i.symbol.as_deref() == Some(symbol))
        .cloned()
    else {
        bail!("unknown symbol '{symbol}'");
    };
    let series = provider.history(instrument.id)?;
    let quotation = series.latest().expect("non-empty history");

    println!("=== {} ({}) ===", symbol, instrument.name);
    println!("Date:            {}", quotation.date);
    println!("Close:           {:.2}", quotation.close);
    println!("Volume:          {}", quotation.volume);

    if let Some(ma) = quotation.moving_averages {
        println!();
        println!("--- Moving averages ---");
        println!("SMA(10):         {:.4}", ma.sma_10);
        println!("SMA(20):         {:.4}", ma.sma_20);
        println!("SMA(50):         {:.4}", ma.sma_50);
        println!("SMA(150):        {:.4}", ma.sma_150);
        println!("SMA(200):        {:.4}", ma.sma_200);
        println!("EMA(21):         {:.4}", ma.ema_21);
        println!("Volume SMA(30):  {:.0}", ma.sma_volume_30);
        println!("Liquidity(20):   {:.0}", ma.liquidity_20);
    }
    if let Some(ind) = quotation.indicator {
        println!();
        println!("--- Indicators ---");
        println!("Slow stoch(14):  {:.4}", ind.stochastic_14);
        println!("BB width(10):    {:.4}", ind.bollinger_band_width_10);
        println!("ATRP(20):        {:.4}", ind.atrp_20);
        println!("Perf(5d):        {:.2}%", ind.performance_5);
        println!("Dist 52w high:   {:.2}%", ind.distance_to_52w_high);
        println!("Momentum:        {:.4}", ind.momentum_score);
        println!("A/D ratio:       {:.4}", ind.ad_ratio);
        println!("U/D volume(50):  {:.4}", ind.up_down_volume_ratio);
    }
    if let Some(rs) = quotation.relative_strength {
        println!();
        println!("--- Relative strength ---");
        println!("RS number:       {}", rs.rs_number);
        println!("RS 52w high:     {}", rs.rs_distance_52w_high);
        println!("RS U/D volume:   {}", rs.rs_up_down_volume);
        println!("RS sector:       {}", rs.rs_sector);
        println!("RS ind. group:   {}", rs.rs_industry_group);
    }
    Ok(())
}

// ── Shared helpers ───────────────────────────────────────────────────

fn parse_kind(s: &str) -> Result<InstrumentKind> {
    match s.to_ascii_lowercase().as_str() {
        "stock" => Ok(InstrumentKind::Stock),
        "etf" => Ok(InstrumentKind::Etf),
        "sector" => Ok(InstrumentKind::Sector),
        "industry_group" | "ind_group" => Ok(InstrumentKind::IndustryGroup),
        "ratio" => Ok(InstrumentKind::Ratio),
        _ => bail!("unknown kind '{s}'. Valid: stock, etf, sector, industry_group, ratio"),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn rs_number(candidate: &Candidate) -> i32 {
    candidate
        .quotation
        .relative_strength
        .map(|rs| rs.rs_number)
        .unwrap_or(0)
}

fn print_candidate_table(candidates: &[Candidate]) {
    println!(
        "{:<8} {:<28} {:>10} {:>5} {:>10} {:>10}",
        "Symbol", "Name", "Close", "RS", "Momentum", "52w dist"
    );
    println!("{}", "-".repeat(76));
    for candidate in candidates {
        let symbol = candidate.instrument.symbol.as_deref().unwrap_or("-");
        let indicator = candidate.quotation.indicator.unwrap_or_default();
        println!(
            "{:<8} {:<28} {:>10.2} {:>5} {:>10.2} {:>9.2}%",
            symbol,
            candidate.instrument.name,
            candidate.quotation.close,
            rs_number(candidate),
            indicator.momentum_score,
            indicator.distance_to_52w_high,
        );
    }
}
