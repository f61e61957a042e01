// File: crates/kpi-demo/src/main.rs
// Summary: Demo loads a date + measures CSV, converts it, and prints per-series KPIs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use kpi_core::dataset::parse_date;
use kpi_core::{convert, swap_to_front, CellValue, Column, ColumnRole, DataRepresentation, Dataset, Settings, Viewport};
use log::info;
use tracing_subscriber::EnvFilter;

struct Args {
    input: PathBuf,
    settings: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
    viewport: Viewport,
    promote: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let path = resolve_path(&args.input)?;
    info!("using input file {}", path.display());

    let settings = match &args.settings {
        Some(p) => load_settings(p).with_context(|| format!("failed to load settings '{}'", p.display()))?,
        None => Settings::default(),
    };

    let dataset = load_csv(&path).with_context(|| format!("failed to load CSV '{}'", path.display()))?;
    if !dataset.is_valid() {
        anyhow::bail!("no rows or measure columns loaded; check headers/delimiter.");
    }
    info!("loaded {} rows x {} measures", dataset.row_count(), dataset.values.len());

    let now = args.now.unwrap_or_else(Utc::now);
    let mut rep = convert(&dataset, &settings, args.viewport, now);
    if let Some(name) = &args.promote {
        rep = swap_to_front(&rep, name);
    }
    print_summary(&rep);
    Ok(())
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args> {
    let mut input = None;
    let mut args = Args {
        input: PathBuf::new(),
        settings: None,
        now: None,
        viewport: Viewport::new(800.0, 600.0),
        promote: None,
    };
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().with_context(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--settings" => args.settings = Some(PathBuf::from(value("--settings")?)),
            "--now" => args.now = Some(parse_date(&value("--now")?)?),
            "--width" => args.viewport.width = value("--width")?.parse().context("--width")?,
            "--height" => args.viewport.height = value("--height")?.parse().context("--height")?,
            "--promote" => args.promote = Some(value("--promote")?),
            _ if input.is_none() => input = Some(PathBuf::from(&arg)),
            other => anyhow::bail!("unexpected argument '{other}'"),
        }
    }
    args.input = input.context("usage: kpi-demo <csv> [--settings f.toml] [--now date] [--width N] [--height N] [--promote name]")?;
    Ok(args)
}

/// Resolve path, trying the .csv/.cvs swap if needed.
fn resolve_path(p: &Path) -> Result<PathBuf> {
    if p.exists() {
        return Ok(p.to_path_buf());
    }
    if let Some(alt) = swap_ext(p) {
        if alt.exists() {
            info!("extension swapped between .csv/.cvs");
            return Ok(alt);
        }
    }
    anyhow::bail!("file not found: {}", p.display());
}

fn swap_ext(p: &Path) -> Option<PathBuf> {
    let mut alt = p.to_path_buf();
    let ext = p.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "cvs" => { alt.set_extension("csv"); Some(alt) }
        "csv" => { alt.set_extension("cvs"); Some(alt) }
        _ => None,
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// First column is the date; every other column is a measure. Empty cells stay null.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    info!("headers: {:?}", headers);
    if headers.len() < 2 {
        anyhow::bail!("expected a date column followed by at least one measure");
    }

    let mut dates = Vec::new();
    let mut measures: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len() - 1];
    for rec in rdr.records() {
        let rec = rec?;
        dates.push(rec.get(0).map_or(CellValue::Null, |s| CellValue::Text(s.trim().to_string())));
        for (i, cells) in measures.iter_mut().enumerate() {
            let cell = rec
                .get(i + 1)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(CellValue::Null, CellValue::Number);
            cells.push(cell);
        }
    }

    let date_col = Column::new(headers[0].clone(), ColumnRole::Date, dates);
    let value_cols = headers[1..]
        .iter()
        .zip(measures)
        .map(|(name, cells)| Column::new(name.clone(), ColumnRole::Value, cells))
        .collect();
    Ok(Dataset::new(vec![date_col], value_cols)?)
}

fn print_summary(rep: &DataRepresentation) {
    println!("viewport: {:?} ({}x{})", rep.viewport_size, rep.viewport.width, rep.viewport.height);
    println!("latest date: {}", rep.latest_date.format("%Y-%m-%d"));
    if let Some(days) = rep.stale_date_difference {
        println!("oldest current value: {days} day(s)");
    }
    for s in &rep.sorted_series {
        println!("- {}", s.name);
        println!("    current:  {}", s.formatted_value);
        println!("    variance: {} since {} ({} days)", s.formatted_variance, s.formatted_date, s.date_difference);
        if let Some((lo, hi)) = s.y.min.zip(s.y.max) {
            println!("    y-axis:   [{lo:.3}, {hi:.3}]");
        }
        if s.is_stale() {
            if let Some(days) = s.stale_date_difference {
                println!("    stale:    {}", s.settings.stale_data.message(days));
            }
        }
        if let Some(t) = &s.formatted_tooltip {
            println!("    tooltip:  {t}");
        }
    }
}
