//! setman - production catalog command line
//!
//! Parses cut folder names, scans episode folders into the catalog and lists
//! stored catalogs.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use setman_catalog::{parse_cut_name, Catalog, NamingConvention, ScanReport};
use setman_common::config::{find_config, RootFolderResolver, Settings, DEFAULT_CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default database file name under the root folder
const DEFAULT_DB_FILE: &str = "setman.db";

#[derive(Parser, Debug)]
#[command(name = "setman")]
#[command(about = "Production catalog for anime cut folders")]
#[command(version)]
struct Args {
    /// Settings file (defaults to ./setman.conf or ~/.setman_setman.conf)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder for setman data
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse folder names with a naming convention
    Parse {
        /// Naming convention template, e.g. "{series}_{episode}_{scene}_{cut}{stage}"
        #[arg(short, long)]
        template: Option<String>,

        /// Series code used to look up the template in the settings file
        #[arg(short, long)]
        series: Option<String>,

        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Scan an episode folder into the catalog
    Scan {
        #[arg(short, long)]
        template: Option<String>,

        #[arg(short, long)]
        series: String,

        #[arg(short, long)]
        episode: u32,

        /// Episode root folder
        #[arg(long)]
        root: PathBuf,

        /// Delivered cuts folder (defaults to <root>/up)
        #[arg(long)]
        up: Option<PathBuf>,

        /// Cels folder (defaults to <root>/cels)
        #[arg(long)]
        cels: Option<PathBuf>,

        /// Save the catalog to this database
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List a stored catalog
    Show {
        /// Database file (defaults to <root folder>/setman.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = load_settings(args.config.as_deref())?;

    let default_level = settings
        .as_ref()
        .and_then(|s| s.find("log_level"))
        .unwrap_or("info")
        .to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), settings.clone()).resolve();
    info!("Root folder: {}", root_folder.display());

    let settings = settings.unwrap_or_default();

    match args.command {
        Command::Parse {
            template,
            series,
            names,
        } => {
            let template = choose_template(template, series.as_deref(), &settings)?;
            let convention = NamingConvention::compile(&template)?;
            for name in &names {
                match parse_cut_name(&convention, name) {
                    Some(identity) => println!("{}\t{}", name, identity),
                    None => println!("{}\tno match", name),
                }
            }
        }

        Command::Scan {
            template,
            series,
            episode,
            root,
            up,
            cels,
            db,
        } => {
            let template = choose_template(template, Some(&series), &settings)?;
            scan(&settings, &template, &series, episode, root, up, cels, db).await?;
        }

        Command::Show { db } => {
            let db = db.unwrap_or_else(|| root_folder.join(DEFAULT_DB_FILE));
            show(&db).await?;
        }
    }

    Ok(())
}

fn load_settings(explicit: Option<&Path>) -> Result<Option<Settings>> {
    if let Some(path) = explicit {
        let settings = Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;
        return Ok(Some(settings));
    }
    match find_config(DEFAULT_CONFIG_FILE) {
        Some(path) => Ok(Some(Settings::load(&path)?)),
        None => Ok(None),
    }
}

fn choose_template(template: Option<String>, series: Option<&str>, settings: &Settings) -> Result<String> {
    if let Some(template) = template {
        return Ok(template);
    }
    settings
        .naming_convention(series.unwrap_or_default())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No naming convention given and none found in the settings file"))
}

#[allow(clippy::too_many_arguments)]
async fn scan(
    settings: &Settings,
    template: &str,
    series_code: &str,
    number: u32,
    root: PathBuf,
    up: Option<PathBuf>,
    cels: Option<PathBuf>,
    db: Option<PathBuf>,
) -> Result<()> {
    let pool = match &db {
        Some(path) => Some(setman_common::db::init_database(path).await?),
        None => None,
    };

    let mut catalog = match &pool {
        Some(pool) => Catalog::from_rows(&setman_catalog::db::load_rows(pool).await?)?,
        None => Catalog::new(),
    };

    let company_name = settings.find_or("company", "default");
    let existing = catalog
        .companies()
        .find(|(_, c)| c.name() == company_name)
        .map(|(id, _)| id);
    let company = match existing {
        Some(id) => id,
        None => catalog.add_company(company_name, None),
    };

    let series = match catalog.find_series(company, series_code) {
        Some(id) => {
            if let Some(series) = catalog.series_mut(id) {
                if series.naming_convention().template() != template {
                    series.set_naming_convention(template)?;
                }
            }
            id
        }
        None => catalog.add_series(company, series_code, template, 1)?,
    };

    let episode = catalog.open_episode(series, number, &root)?;
    if let Some(ep) = catalog.episode_mut(episode) {
        if let Some(up) = up {
            ep.set_up_folder(up);
        }
        if let Some(cels) = cels {
            ep.set_cels_folder(cels);
        }
    }

    let report = catalog.scan_episode(episode)?;
    print_report(&catalog, episode, &report);

    if let Some(pool) = &pool {
        setman_catalog::db::save_rows(pool, &catalog.to_rows()?).await?;
        info!("Catalog saved");
    }

    Ok(())
}

fn print_report(catalog: &Catalog, episode: setman_catalog::EpisodeId, report: &ScanReport) {
    let Some(ep) = catalog.episode(episode) else {
        return;
    };

    for &id in &report.added {
        if let Some(cut) = ep.cut(id) {
            println!("added\t{}\t{}", cut.name(), cut.identifier());
        }
    }
    for &id in &report.archived {
        if let Some(cut) = ep.cut(id) {
            println!("up\t{}\t{}", cut.name(), cut.identifier());
        }
    }
    for rejection in &report.rejected {
        println!("rejected\t{}\t{}", rejection.path.display(), rejection.error);
    }
    for failure in &report.errors {
        println!("error\t{}\t{}", failure.path.display(), failure.error);
    }
    println!(
        "{} accepted, {} rejected, {} ignored",
        report.accepted(),
        report.rejected.len(),
        report.ignored.len()
    );
}

async fn show(db: &Path) -> Result<()> {
    if !db.exists() {
        bail!("Database {} does not exist", db.display());
    }
    let pool = setman_common::db::init_database(db).await?;
    let catalog = Catalog::from_rows(&setman_catalog::db::load_rows(&pool).await?)?;

    for (_, company) in catalog.companies() {
        println!("{}", company.name());
        for &sid in company.series() {
            let Some(series) = catalog.series(sid) else {
                continue;
            };
            println!("  {} (season {}) {}", series.code(), series.season(), series.naming_convention().template());
            for &eid in series.episodes() {
                let Some(ep) = catalog.episode(eid) else {
                    continue;
                };
                println!("    episode {} {} ({} to do)", ep.number(), ep.root().display(), ep.todo());
                for (_, cut) in ep.cuts() {
                    println!("      {}\t{}", cut.name(), cut.status());
                }
            }
        }
    }

    Ok(())
}
