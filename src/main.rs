use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use salesdash::{
    cache::TableCache,
    filter::{self, CountryFilter, FilterParams},
    metrics::{self, breakdowns},
};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str =
    "usage: salesdash <DATA_CSV> [--country NAME] [--from YYYY-MM-DD] [--to YYYY-MM-DD] \
     [--min-qty N] [--top N]";

struct CliOpts {
    data_path: String,
    country: CountryFilter,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    min_quantity: i64,
    top: usize,
}

impl CliOpts {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut opts = CliOpts {
            data_path: String::new(),
            country: CountryFilter::All,
            from: None,
            to: None,
            min_quantity: 1,
            top: 10,
        };
        let mut positional = Vec::new();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--country" => {
                    opts.country = CountryFilter::Only(expect_value(&mut args, "--country")?)
                }
                "--from" => opts.from = Some(parse_date(&expect_value(&mut args, "--from")?)?),
                "--to" => opts.to = Some(parse_date(&expect_value(&mut args, "--to")?)?),
                "--min-qty" => {
                    opts.min_quantity = expect_value(&mut args, "--min-qty")?
                        .parse()
                        .context("parsing --min-qty")?
                }
                "--top" => {
                    opts.top = expect_value(&mut args, "--top")?
                        .parse()
                        .context("parsing --top")?
                }
                _ => positional.push(arg),
            }
        }
        if positional.len() != 1 {
            bail!("{USAGE}");
        }
        opts.data_path = positional.remove(0);
        Ok(opts)
    }
}

fn expect_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next().with_context(|| format!("{flag} requires a value"))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD"))
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let opts = CliOpts::parse(env::args().skip(1))?;

    // ─── 2) load (memoized) and describe the dataset ─────────────────
    let cache = TableCache::new();
    let table = cache.load_or_ingest(&opts.data_path)?;
    let Some(ds) = table.info() else {
        warn!("no rows survived cleaning; nothing to report");
        println!(
            "{}",
            serde_json::to_string_pretty(&metrics::aggregate(&table))?
        );
        return Ok(());
    };
    info!(
        rows = ds.rows,
        countries = ds.countries,
        first = %ds.first_invoice,
        last = %ds.last_invoice,
        "dataset loaded"
    );

    // ─── 3) apply filters ────────────────────────────────────────────
    let params = FilterParams {
        country: opts.country,
        date_start: opts.from.unwrap_or_else(|| ds.first_invoice.date()),
        date_end: opts.to.unwrap_or_else(|| ds.last_invoice.date()),
        min_quantity: opts.min_quantity,
    };
    let filtered = filter::apply(&table, &params)?;
    if filtered.is_empty() {
        warn!("no rows match the selected filters");
    } else {
        info!(transactions = filtered.len(), "filtered view ready");
    }

    // ─── 4) breakdowns ───────────────────────────────────────────────
    for m in breakdowns::revenue_by_month(&filtered) {
        info!(month = %m.month, revenue = %m.revenue, transactions = m.transactions, "monthly revenue");
    }
    for p in breakdowns::top_products(&filtered, opts.top) {
        info!(product = %p.description, units = p.quantity, revenue = %p.revenue, "top product");
    }
    for c in breakdowns::top_customers(&filtered, opts.top) {
        info!(customer = %c.customer_id, revenue = %c.revenue, purchases = c.purchases, "top customer");
    }
    for c in breakdowns::revenue_by_country(&filtered, opts.top) {
        info!(country = %c.country, revenue = %c.revenue, "country revenue");
    }
    for w in breakdowns::revenue_by_weekday(&filtered) {
        info!(day = w.day, revenue = %w.revenue, "weekday revenue");
    }
    if let Some(mean) = breakdowns::mean_quantity(&filtered) {
        info!(units = %mean, "mean quantity per transaction");
    }

    // ─── 5) KPI snapshot ─────────────────────────────────────────────
    let snapshot = metrics::aggregate(&filtered);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
