use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use admission_oracle::audit::{audit, AuditReport};
use admission_oracle::catalog::{Catalog, CatalogIndex};
use admission_oracle::config::{Config, ConfigOverrides};
use admission_oracle::output::csv::{audit_to_csv, ranking_to_csv};
use admission_oracle::output::table::{
    render_audit_table, render_drift_table, render_ranking_table, render_resolution_table,
    render_score_table,
};
use admission_oracle::output::{render_json, OutputFormat};
use admission_oracle::reconcile::{resolve, OverrideStore};
use admission_oracle::scoring::ranking::{formation_candidates, panier_candidates};
use admission_oracle::scoring::{
    rank_programs, score, RankedProgram, SpecialtyAdmissionTable, SpecialtyPair,
};
use admission_oracle::watch::{run_watch_loop, WatchEvent, WatchInputs};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "admission-oracle",
    about = "Parcoursup / panier category reconciliation and admission scoring"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long)]
    overrides: Option<PathBuf>,
    #[arg(long)]
    rates: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve every (institution, panier label) pair and list discrepancies
    Audit {
        #[arg(long)]
        filter: Option<String>,
    },
    /// Resolve one panier label for one institution
    Resolve {
        #[arg(long)]
        label: String,
        #[arg(long)]
        institution: Option<String>,
        /// Comma-separated Parcoursup labels used instead of the catalog
        #[arg(long)]
        candidates: Option<String>,
    },
    /// Score explicit numbers
    Score {
        #[arg(long)]
        grade: f64,
        #[arg(long = "program-grade")]
        program_grade: Option<f64>,
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Rank institutions offering a panier type, or Parcoursup formations of a
    /// category, for a student
    Rank {
        #[arg(long = "cpge-type", conflicts_with = "category")]
        cpge_type: Option<String>,
        /// Parcoursup category, e.g. "Licence"; program grades are estimated
        /// from honours distributions
        #[arg(long)]
        category: Option<String>,
        /// Restrict --category to one detailed program label
        #[arg(long, requires = "category")]
        program: Option<String>,
        #[arg(long)]
        grade: Option<f64>,
        /// Specialty pair, e.g. "maths,ses"
        #[arg(long)]
        specialties: Option<String>,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Re-run the audit whenever the catalog or override file changes
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
        #[arg(long, default_value_t = 1)]
        iterations: u32,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        catalog_path: cli.catalog.clone(),
        overrides_path: cli.overrides.clone(),
        specialty_rates_path: cli.rates.clone(),
        label_filter: match &cli.command {
            Commands::Audit { filter } => filter.clone(),
            _ => None,
        },
    });
    let format = cli.output.unwrap_or(config.output.format);

    match &cli.command {
        Commands::Config { init, show } => {
            if *init {
                Config::write_template(&config_path)?;
                println!("Wrote config template to {}", config_path.display());
            }
            if *show || !*init {
                println!("{}", render_json(&config)?);
            }
        }
        Commands::Audit { .. } => {
            let catalog = Catalog::load(&config.catalog_path())?;
            let overrides = OverrideStore::load(&config.overrides_path())?;
            info!(
                "auditing {} institutions against {} override rules",
                catalog.institutions.len(),
                overrides.len()
            );
            let report = audit(&catalog, &overrides, &config.audit_scope());
            print_audit(&report, format)?;
        }
        Commands::Resolve {
            label,
            institution,
            candidates,
        } => {
            let overrides = OverrideStore::load(&config.overrides_path())?;
            let candidate_labels = match candidates {
                Some(raw) => parse_label_list(raw),
                None => catalog_candidates(&config, institution.as_deref())?,
            };
            let outcome = resolve(&overrides, label, institution.as_deref(), &candidate_labels);
            match format {
                OutputFormat::Table => println!(
                    "{}",
                    render_resolution_table(label, institution.as_deref(), &outcome)
                ),
                OutputFormat::Json => println!("{}", render_json(&outcome)?),
                OutputFormat::Csv => {
                    warn!("CSV output for resolve not implemented, using JSON");
                    println!("{}", render_json(&outcome)?);
                }
            }
        }
        Commands::Score {
            grade,
            program_grade,
            rate,
        } => {
            let result = score(*grade, *program_grade, *rate);
            match format {
                OutputFormat::Table => println!("{}", render_score_table(&result)),
                OutputFormat::Json => println!("{}", render_json(&result)?),
                OutputFormat::Csv => {
                    warn!("CSV output for score not implemented, using JSON");
                    println!("{}", render_json(&result)?);
                }
            }
        }
        Commands::Rank {
            cpge_type,
            category,
            program,
            grade,
            specialties,
            top,
        } => {
            let catalog = Catalog::load(&config.catalog_path())?;
            let rates = load_rates_or_empty(&config.specialty_rates_path())?;
            let pair = match specialties {
                Some(raw) => parse_specialty_pair(raw)?,
                None => config.specialty_pair(),
            };
            let student_grade = grade.unwrap_or(config.scoring.default_student_grade);
            let candidates = match (cpge_type, category) {
                (Some(cpge_type), _) => panier_candidates(&catalog, cpge_type, &rates, &pair),
                (None, Some(category)) => {
                    formation_candidates(&catalog, category, program.as_deref(), &rates, &pair)
                }
                (None, None) => return Err(anyhow!("rank needs --cpge-type or --category")),
            };
            if candidates.is_empty() {
                warn!("no program matches the requested selection");
            }
            let mut ranked = rank_programs(student_grade, candidates);
            ranked.truncate(*top);
            print_ranking(&ranked, format)?;
        }
        Commands::Watch {
            interval_secs,
            iterations,
        } => {
            let inputs = WatchInputs {
                catalog_path: config.catalog_path(),
                overrides_path: config.overrides_path(),
                scope: config.audit_scope(),
            };
            let secs = interval_secs.unwrap_or(config.watch.interval_secs).max(1);
            let mut print_error: Option<anyhow::Error> = None;
            run_watch_loop(&inputs, Duration::from_secs(secs), *iterations, |event| {
                if let Err(err) = print_watch_event(event, format) {
                    print_error.get_or_insert(err);
                }
            })
            .await?;
            if let Some(err) = print_error {
                return Err(err);
            }
        }
    }

    Ok(())
}

fn catalog_candidates(config: &Config, institution: Option<&str>) -> Result<BTreeSet<String>> {
    let Some(code) = institution else {
        warn!("no institution given, resolving against an empty candidate set");
        return Ok(BTreeSet::new());
    };
    let catalog = Catalog::load(&config.catalog_path())?;
    let index = CatalogIndex::build(&catalog, &config.audit.aggregate_category);
    match index.get(code) {
        Some(labels) => Ok(labels.parcoursup_labels.clone()),
        None => {
            warn!("institution {code} not found in catalog");
            Ok(BTreeSet::new())
        }
    }
}

fn load_rates_or_empty(path: &Path) -> Result<SpecialtyAdmissionTable> {
    if !path.exists() {
        warn!(
            "specialty rates not found at {}, using neutral fallback",
            path.display()
        );
        return Ok(SpecialtyAdmissionTable::default());
    }
    SpecialtyAdmissionTable::load(path)
}

fn parse_label_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_specialty_pair(raw: &str) -> Result<SpecialtyPair> {
    let pieces: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();
    match pieces.as_slice() {
        [a, b] if a != b => Ok(SpecialtyPair::new(*a, *b)),
        _ => Err(anyhow!(
            "expected two distinct specialties separated by a comma, got {raw:?}"
        )),
    }
}

fn print_audit(report: &AuditReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_audit_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => println!("{}", audit_to_csv(report)?),
    }
    Ok(())
}

fn print_ranking(items: &[RankedProgram], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_ranking_table(items)),
        OutputFormat::Json => println!("{}", render_json(items)?),
        OutputFormat::Csv => println!("{}", ranking_to_csv(items)?),
    }
    Ok(())
}

fn print_watch_event(event: &WatchEvent, format: OutputFormat) -> Result<()> {
    match event {
        WatchEvent::Unchanged { iteration } => {
            info!("iteration {iteration}: inputs unchanged");
        }
        WatchEvent::Audited {
            report,
            drift: None,
            ..
        } => print_audit(report, format)?,
        WatchEvent::Audited {
            drift: Some(drift), ..
        } => {
            if drift.is_empty() {
                info!("inputs changed but no issue moved");
                return Ok(());
            }
            match format {
                OutputFormat::Table => println!("{}", render_drift_table(drift)),
                _ => println!("{}", render_json(drift)?),
            }
        }
    }
    Ok(())
}
