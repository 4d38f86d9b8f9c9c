// Command line front end: browse the catalog, manage the cache, run the API
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use tokio_util::sync::CancellationToken;

use crate::cache::{self, CacheStatus, CatalogLoader, LoadReport};
use crate::catalog::{self, CatalogQuery, Page, PokemonCard, SortDirection};
use crate::config::PokedexConfig;
use crate::server;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Browse the first generation catalog from PokeAPI, cached locally", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.pokedex/config.json when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Snapshot database location
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// PokeAPI base URL
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Keep the snapshot in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List one page of the catalog
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a single entry
    Show {
        name: String,
    },

    /// List every category with its badge color
    Types,

    /// Inspect or manage the snapshot cache
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },

    /// Serve the REST API
    Serve {
        /// Listen address (default from config)
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Case-insensitive name filter
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Category to keep, or `all`
    #[arg(short = 't', long = "type", default_value = catalog::ALL_CATEGORIES)]
    pub category: String,

    #[arg(long, value_enum, default_value_t = SortDirection::None)]
    pub sort: SortDirection,

    /// 1-indexed page
    #[arg(short, long, default_value_t = 1)]
    pub page: usize,
}

impl ListArgs {
    pub fn to_query(&self) -> CatalogQuery {
        CatalogQuery {
            search: self.search.clone(),
            category: self.category.clone().into(),
            sort: self.sort,
            page: self.page,
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheCommand {
    /// Show snapshot age, freshness and hit statistics
    Status,
    /// Delete the stored snapshot
    Clear,
    /// Refetch the catalog and store it
    Refresh,
}

impl Cli {
    /// Config file plus command line overrides
    pub fn resolve_config(&self) -> Result<PokedexConfig> {
        let mut config = PokedexConfig::load(self.config.as_deref())?;
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Cancellation token that fires on ctrl-c
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

async fn load_catalog(loader: &CatalogLoader) -> Result<LoadReport> {
    let report = loader.load_with_report(&ctrl_c_token()).await?;
    if !report.failed.is_empty() {
        eprintln!(
            "warning: {} entries could not be loaded and are hidden: {}",
            report.failed.len(),
            report
                .failed
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(report)
}

pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let loader = cache::init_loader(&config, cli.ephemeral)?;

    match cli.command {
        Commands::List(args) => {
            let report = load_catalog(&loader).await?;
            let page = catalog::catalog_page(&report.snapshot, &args.to_query(), config.page_size);
            println!("{}", render_page(&page));
            println!("{}", page_footer(&page));
        }
        Commands::Show { name } => {
            let report = load_catalog(&loader).await?;
            if report.snapshot.entry(&name).is_none() {
                return Err(anyhow!("{} is not in the catalog", name));
            }
            let card = PokemonCard::from_snapshot(&report.snapshot, &name);
            println!("{}", render_card(&card));
        }
        Commands::Types => {
            let report = load_catalog(&loader).await?;
            println!("{}", render_types(&report.snapshot.all_categories()));
        }
        Commands::Cache { action } => match action {
            CacheCommand::Status => {
                println!("{}", render_status(&loader.status().await?));
            }
            CacheCommand::Clear => {
                if loader.invalidate().await? {
                    println!("Snapshot removed");
                } else {
                    println!("No snapshot stored");
                }
            }
            CacheCommand::Refresh => {
                let report = loader.refresh(&ctrl_c_token()).await?;
                println!(
                    "Fetched {} entries ({} failed), {}",
                    report.snapshot.len(),
                    report.failed.len(),
                    if report.persisted { "stored" } else { "not stored" }
                );
            }
        },
        Commands::Serve { addr } => {
            let report = load_catalog(&loader).await?;
            let addr = addr.unwrap_or_else(|| config.server_addr.clone());
            let state = Arc::new(AppState::new(config, loader, report.snapshot));
            server::start_server(state, &addr).await?;
        }
    }

    Ok(())
}

/// Cell colored like the badge of `category`
fn badge(text: &str, category: &str) -> Cell {
    let style = catalog::category_style(category);
    let (r, g, b) = style.rgb;
    let fg = if style.dark_text { Color::Black } else { Color::White };
    Cell::new(text).bg(Color::Rgb { r, g, b }).fg(fg)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn render_page(page: &Page<PokemonCard>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Name", "Types", "Height", "Weight", "Image"]);

    for card in &page.items {
        // One badge per row; the primary category colors it
        let types = match card.categories.first() {
            Some(primary) => badge(&card.categories.join(" / "), primary),
            None => Cell::new("-"),
        };
        table.add_row(vec![
            Cell::new(&card.name),
            types,
            Cell::new(or_dash(card.height)),
            Cell::new(or_dash(card.weight)),
            Cell::new(card.image_url.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

pub fn page_footer<T>(page: &Page<T>) -> String {
    if page.total_items == 0 {
        return "No matches".to_string();
    }
    let mut footer = format!(
        "Page {} of {} ({} matches)",
        page.page, page.total_pages, page.total_items
    );
    if page.has_next {
        footer.push_str(&format!(", next: --page {}", page.page + 1));
    }
    footer
}

pub fn render_card(card: &PokemonCard) -> Table {
    let mut table = new_table();
    table.add_row(vec![Cell::new("Name").fg(Color::Cyan), Cell::new(&card.name)]);
    table.add_row(vec![
        Cell::new("Height").fg(Color::Cyan),
        Cell::new(or_dash(card.height)),
    ]);
    table.add_row(vec![
        Cell::new("Weight").fg(Color::Cyan),
        Cell::new(or_dash(card.weight)),
    ]);
    table.add_row(vec![
        Cell::new("Image").fg(Color::Cyan),
        Cell::new(card.image_url.as_deref().unwrap_or("-")),
    ]);
    for (i, category) in card.categories.iter().enumerate() {
        let label = if i == 0 { "Types" } else { "" };
        table.add_row(vec![Cell::new(label).fg(Color::Cyan), badge(category, category)]);
    }
    table
}

pub fn render_types(categories: &[String]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Type", "Class"]);
    for category in categories {
        table.add_row(vec![
            badge(category, category),
            Cell::new(catalog::category_style(category).class),
        ]);
    }
    table
}

pub fn render_status(status: &CacheStatus) -> Table {
    let mut table = new_table();
    let rows = [
        ("Stored", status.stored.to_string()),
        ("Fresh", status.fresh.to_string()),
        ("Schema version", or_dash(status.schema_version)),
        ("Cached at", or_dash(status.cached_at.map(|t| t.to_rfc3339()))),
        ("Age (s)", or_dash(status.age_secs)),
        ("Entries", status.entry_count.to_string()),
        ("Rejected", status.rejection.clone().unwrap_or_else(|| "-".to_string())),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).fg(Color::Cyan), Cell::new(value)]);
    }
    table
}
