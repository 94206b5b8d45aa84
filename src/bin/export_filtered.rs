use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use salesdash::{
    cache::TableCache,
    export,
    filter::{self, CountryFilter, FilterParams},
};
use std::{env, fs::File, io};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: export_filtered <DATA_CSV> <OUT_CSV|-> [--country NAME] \
     [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--min-qty N]";

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD"))
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env_filter).init();

    let mut args = env::args().skip(1);
    let mut positional = Vec::new();
    let mut country = CountryFilter::All;
    let mut from = None;
    let mut to = None;
    let mut min_quantity = 1i64;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--country" => {
                country = CountryFilter::Only(args.next().context("--country requires a value")?)
            }
            "--from" => from = Some(parse_date(&args.next().context("--from requires a value")?)?),
            "--to" => to = Some(parse_date(&args.next().context("--to requires a value")?)?),
            "--min-qty" => {
                min_quantity = args
                    .next()
                    .context("--min-qty requires a value")?
                    .parse()
                    .context("parsing --min-qty")?
            }
            _ => positional.push(arg),
        }
    }
    if positional.len() != 2 {
        bail!("{USAGE}");
    }
    let out_path = positional.pop().unwrap();
    let data_path = positional.pop().unwrap();

    let cache = TableCache::new();
    let table = cache.load_or_ingest(&data_path)?;

    let filtered = match FilterParams::full_range(&table) {
        Some(defaults) => {
            let params = FilterParams {
                country,
                date_start: from.unwrap_or(defaults.date_start),
                date_end: to.unwrap_or(defaults.date_end),
                min_quantity,
            };
            filter::apply(&table, &params)?
        }
        None => (*table).clone(),
    };

    info!(rows = filtered.len(), "writing filtered export");
    if out_path == "-" {
        export::write_csv(&filtered, io::stdout().lock())?;
    } else {
        let file = File::create(&out_path).with_context(|| format!("creating {out_path}"))?;
        export::write_csv(&filtered, file)?;
        info!(path = %out_path, "export written");
    }
    Ok(())
}
