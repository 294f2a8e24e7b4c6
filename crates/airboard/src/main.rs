//! `airboard` - CLI for the PM2.5 exposure pipeline
//!
//! This binary loads and summarizes the normalized dataset and runs the
//! classroom air calculators.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use airboard::calculators::{alert, health, plants, risk};
use airboard::cli::{
    CalcCommand, Cli, Command, ConfigCommand, ExportCommand, FilterDatesCommand, LoadCommand,
    RankCommand, TrendCommand,
};
use airboard::filters::{DateFilterOutcome, FutureDateFilter};
use airboard::pipeline::fetcher_for;
use airboard::summary::{self, MAJOR_COUNTRIES};
use airboard::{init_logging, Config, DataOrigin, DatasetCache, LoadedDataset, Pipeline, RawTable};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate` reports its own errors
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        let path = file.clone().or_else(|| cli.config.clone());
        handle_validate(path);
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    let mut cache = DatasetCache::new(config.cache_ttl());

    match cli.command {
        Command::Load(cmd) => handle_load(&config, &mut cache, &cmd),
        Command::Export(cmd) => handle_export(&config, &mut cache, &cmd),
        Command::Rank(cmd) => handle_rank(&config, &mut cache, &cmd),
        Command::Trend(cmd) => handle_trend(&config, &mut cache, &cmd),
        Command::FilterDates(cmd) => handle_filter_dates(&config, &cmd),
        Command::Calc(cmd) => handle_calc(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn load_dataset(
    config: &Config,
    cache: &mut DatasetCache,
    file: Option<&Path>,
) -> anyhow::Result<Arc<LoadedDataset>> {
    let pipeline = Pipeline::from_config(config)?;
    let fetcher = fetcher_for(config, file)?;
    let dataset = pipeline.load_cached(&fetcher, cache, Instant::now());
    if dataset.is_sample() {
        eprintln!("Note: live data is unavailable, showing sample data.");
    }
    Ok(dataset)
}

fn handle_load(
    config: &Config,
    cache: &mut DatasetCache,
    cmd: &LoadCommand,
) -> anyhow::Result<()> {
    let dataset = load_dataset(config, cache, cmd.file.as_deref())?;
    let table = &dataset.table;
    let years = summary::years(table);
    let fingerprint = table.fingerprint()?;

    if cmd.json {
        let report = serde_json::json!({
            "origin": dataset.origin,
            "rows": table.len(),
            "first_year": years.first(),
            "last_year": years.last(),
            "fingerprint": fingerprint,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let origin = match &dataset.origin {
        DataOrigin::Live => "live".to_string(),
        DataOrigin::Sample { reason } => format!("sample ({reason:?})"),
    };
    println!("Dataset");
    println!("=======");
    println!("  Origin:       {origin}");
    println!("  Rows:         {}", table.len());
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("  Years:        {first}-{last}"),
        _ => println!("  Years:        none"),
    }
    println!("  Fingerprint:  {fingerprint}");
    Ok(())
}

fn handle_export(
    config: &Config,
    cache: &mut DatasetCache,
    cmd: &ExportCommand,
) -> anyhow::Result<()> {
    let dataset = load_dataset(config, cache, cmd.file.as_deref())?;
    let csv = dataset.table.to_csv_string()?;

    match &cmd.output {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {} rows to {}", dataset.table.len(), path.display());
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn handle_rank(config: &Config, cache: &mut DatasetCache, cmd: &RankCommand) -> anyhow::Result<()> {
    let dataset = load_dataset(config, cache, cmd.file.as_deref())?;

    let Some(ranking) = summary::ranking(&dataset.table, cmd.year, cmd.top) else {
        println!("No data for the requested year.");
        return Ok(());
    };

    println!("Highest PM2.5 exposure in {}", ranking.year);
    for (i, record) in ranking.top.iter().enumerate() {
        println!(
            "  {:>3}. {:<32} {:>3} {:>7.1} µg/m³",
            i + 1,
            record.country,
            record.iso_alpha,
            record.value
        );
    }
    println!();
    println!("Lowest PM2.5 exposure in {}", ranking.year);
    for record in &ranking.bottom {
        println!(
            "       {:<32} {:>3} {:>7.1} µg/m³",
            record.country, record.iso_alpha, record.value
        );
    }
    Ok(())
}

fn handle_trend(
    config: &Config,
    cache: &mut DatasetCache,
    cmd: &TrendCommand,
) -> anyhow::Result<()> {
    let dataset = load_dataset(config, cache, cmd.file.as_deref())?;

    let rows = if cmd.countries.is_empty() {
        summary::trend(&dataset.table, &MAJOR_COUNTRIES)
    } else {
        summary::trend(&dataset.table, &cmd.countries)
    };

    if rows.is_empty() {
        println!("No data for the requested countries.");
        return Ok(());
    }

    let mut current = "";
    for record in rows {
        if record.country != current {
            current = &record.country;
            println!("{} ({})", record.country, record.iso_alpha);
        }
        println!("  {}  {:>7.1} µg/m³", record.year, record.value);
    }
    Ok(())
}

fn handle_filter_dates(config: &Config, cmd: &FilterDatesCommand) -> anyhow::Result<()> {
    let file = std::fs::File::open(&cmd.input)
        .with_context(|| format!("failed to open {}", cmd.input.display()))?;
    let table = RawTable::from_reader(file)?;
    let filter = FutureDateFilter::new(config.pipeline.timezone()?);
    let before = table.len();

    let table = match filter.apply_table(table, &cmd.column) {
        DateFilterOutcome::Filtered(table) => {
            eprintln!(
                "Kept {} of {before} rows dated on or before {}",
                table.len(),
                filter.today()
            );
            table
        }
        DateFilterOutcome::Unavailable { original, reason } => {
            eprintln!("Date filter unavailable, rows left unfiltered: {reason}");
            original
        }
    };

    print!("{}", table.to_csv_string()?);
    Ok(())
}

fn handle_calc(config: &Config, cmd: CalcCommand) -> anyhow::Result<()> {
    let settings = &config.calculators;

    match cmd {
        CalcCommand::Health {
            baseline_pm,
            improved_pm,
            headache,
        } => {
            let input = health::HealthInput {
                baseline_pm,
                improved_pm,
                baseline_headache: headache,
            };
            let result = health::estimate(&input, &settings.health)?;
            println!("PM2.5 reduction:      {:.1} µg/m³", result.pm_reduction);
            println!(
                "Headache rate:        {:.2}% (-{:.2}%p)",
                result.headache_after, result.headache_reduction
            );
            println!("Concentration gain:   +{:.1}%", result.concentration_gain);
            println!("Study time gained:    +{:.1} min/day", result.study_minutes);
        }
        CalcCommand::Alert {
            outdoor_pm,
            indoor_pm,
            co2,
        } => {
            let reading = alert::AlertReading {
                outdoor_pm,
                indoor_pm,
                indoor_co2: co2,
            };
            let result = alert::evaluate(&reading, &settings.alert)?;
            println!("{} [{:?}]", result.guide, result.severity);
            for action in &result.actions {
                println!("  - {action}");
            }
        }
        CalcCommand::Plants {
            species,
            count,
            room,
        } => {
            let result = plants::estimate(species, count, room, &settings.plants)?;
            println!("{species}: {}", species.description());
            println!("CO₂ absorbed:         {:.2} kg/day", result.co2_kg_per_day);
            println!("Humidity improvement: +{:.1}%", result.humidity_effect);
            println!("Plant density:        {:.2} per m²", result.plants_per_sqm);
            println!("Placement:            {}", result.placement);
        }
        CalcCommand::Risk {
            pm,
            ventilation,
            mask,
            exercise,
        } => {
            let profile = risk::RiskProfile {
                pm_exposure: pm,
                ventilation,
                mask,
                exercise,
            };
            let result = risk::assess(&profile, &settings.risk)?;
            println!("Risk score: {:.1} ({})", result.score, result.level);
            println!("{}", result.advice);
            for suggestion in &result.suggestions {
                println!("  - {suggestion}");
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Source]");
                match &config.source.local_path {
                    Some(path) => println!("  Local path:         {}", path.display()),
                    None => println!("  URL:                {}", config.source.url),
                }
                println!("  Timeout (secs):     {}", config.source.timeout_secs);
                println!("  Max retries:        {}", config.source.max_retries);
                println!();
                println!("[Cache]");
                println!("  TTL (secs):         {}", config.cache.ttl_secs);
                println!();
                println!("[Pipeline]");
                println!("  Timezone:           {}", config.pipeline.timezone);
                println!("  Fuzzy threshold:    {}", config.pipeline.fuzzy_threshold);
                println!(
                    "  Extra patterns:     {}",
                    config.pipeline.extra_value_patterns.len()
                );
                println!(
                    "  Excluded entities:  {}",
                    config.pipeline.excluded_entities.len()
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => handle_validate(file),
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
