use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};

use stockroom::{
    config::{self, AppConfig, StoreBackend},
    inventory::{
        category_distribution, filter_and_sort,
        reports::{CategoryShare, InventorySummary, StockAlert},
        seed_items, stock_alerts, summarize, InventoryQuery, Selection, SortKey,
    },
    models::item::{Category, ItemRecord, Location, StockStatus},
    shell::ViewShell,
    store::{store_from_config, ItemStore},
    submission::{SubmissionSettings, SubmissionWorkflow},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    match cli.command {
        Commands::List(args) => handle_list(&cfg, args, cli.json).await,
        Commands::Report(args) => handle_report(&cfg, args, cli.json).await,
        Commands::Add(args) => handle_add(&cfg, args, cli.json).await,
    }
}

#[derive(Parser)]
#[command(name = "stockroom", about = "Stock room inventory views and item intake", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the filtered and sorted inventory
    List(ListArgs),
    /// Show totals, category distribution and stock alerts
    Report(SourceArgs),
    /// Submit a new item to the configured store
    Add(AddArgs),
}

#[derive(Args)]
struct SourceArgs {
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Read from the configured store instead of the demo catalogue"
    )]
    live: bool,
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(long, short, default_value = "", help = "Text matched against name, category and location")]
    query: String,
    #[arg(long, default_value = "all", help = "Category label or slug, or 'all'")]
    category: Selection<Category>,
    #[arg(long, default_value = "all", help = "out, low, normal or 'all'")]
    status: Selection<StockStatus>,
    #[arg(long, default_value = "name", help = "name, quantity, price or status")]
    sort: SortKey,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long, help = "Category label or slug, e.g. towels")]
    category: Category,
    #[arg(long, allow_hyphen_values = true)]
    quantity: String,
    #[arg(long, allow_hyphen_values = true)]
    min_stock: String,
    #[arg(long, allow_hyphen_values = true)]
    price: String,
    #[arg(long, help = "Location label or code, e.g. a1 or main-depot")]
    location: Location,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    barcode: Option<String>,
    #[arg(long, help = "Image file attached inline")]
    image: Option<PathBuf>,
}

async fn load_items(cfg: &AppConfig, live: bool) -> Result<Vec<ItemRecord>> {
    if !live {
        return Ok(seed_items());
    }
    let store = store_from_config(cfg).context("failed to build item store")?;
    let items = store
        .list(&cfg.collection)
        .await
        .with_context(|| format!("failed to read collection '{}'", cfg.collection))?;
    debug!(count = items.len(), "loaded items from store");
    Ok(items)
}

async fn handle_list(cfg: &AppConfig, args: ListArgs, json: bool) -> Result<()> {
    let items = load_items(cfg, args.source.live).await?;

    let mut shell = ViewShell::new();
    shell.set_search(args.query);
    let query = shell.inventory_query(
        InventoryQuery::default()
            .with_category(args.category)
            .with_status(args.status)
            .sorted_by(args.sort),
    );
    let shown = filter_and_sort(&items, &query);

    if json {
        return print_json(&shown);
    }

    if shown.is_empty() {
        println!("No items match the current filters");
        return Ok(());
    }
    println!(
        "{:<28} {:<20} {:>6} {:>6} {:>10}  {:<20} {:<6} {:>5}",
        "NAME", "CATEGORY", "QTY", "MIN", "PRICE", "LOCATION", "STATUS", "FILL"
    );
    for record in &shown {
        let item = &record.item;
        println!(
            "{:<28} {:<20} {:>6} {:>6} {:>10.2}  {:<20} {:<6} {:>4}%",
            item.name,
            item.category.label(),
            item.quantity(),
            item.min_stock(),
            item.price(),
            item.location.label(),
            item.status(),
            item.fill_percentage()
        );
    }
    println!("{} of {} items", shown.len(), items.len());
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    summary: InventorySummary,
    distribution: Vec<CategoryShare>,
    alerts: Vec<StockAlert>,
}

async fn handle_report(cfg: &AppConfig, args: SourceArgs, json: bool) -> Result<()> {
    let items = load_items(cfg, args.live).await?;
    let report = Report {
        summary: summarize(&items),
        distribution: category_distribution(&items),
        alerts: stock_alerts(&items),
    };

    if json {
        return print_json(&report);
    }

    let summary = &report.summary;
    println!("Items:          {}", summary.total_items);
    println!("Low stock:      {}", summary.low_stock);
    println!("Out of stock:   {}", summary.out_of_stock);
    println!("Stock value:    {:.2}", summary.total_value);

    println!();
    println!("By category:");
    for share in &report.distribution {
        println!(
            "  {:<20} {:>3} items {:>6} units {:>6.2}%",
            share.category.label(),
            share.items,
            share.units,
            share.percent
        );
    }

    if !report.alerts.is_empty() {
        println!();
        println!("Alerts:");
        for alert in &report.alerts {
            println!(
                "  [{:?}] {} ({} of min {})",
                alert.severity, alert.item, alert.current, alert.min
            );
        }
    }
    Ok(())
}

async fn handle_add(cfg: &AppConfig, args: AddArgs, json: bool) -> Result<()> {
    if cfg.backend() == StoreBackend::Memory {
        warn!("store_backend is memory; the item is discarded when the command exits");
    }
    let store: Arc<dyn ItemStore> = store_from_config(cfg).context("failed to build item store")?;
    let workflow = SubmissionWorkflow::new(store, SubmissionSettings::from_config(cfg));

    let image = match &args.image {
        Some(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read image {}", path.display()))?;
            Some((image_mime(path), bytes))
        }
        None => None,
    };

    workflow.edit(|form| {
        form.name = args.name;
        form.category = Some(args.category);
        form.quantity = args.quantity;
        form.min_stock = args.min_stock;
        form.price = args.price;
        form.location = Some(args.location);
        form.description = args.description.unwrap_or_default();
        form.supplier = args.supplier.unwrap_or_default();
        form.barcode = args.barcode.unwrap_or_default();
        if let Some((mime, bytes)) = &image {
            form.attach_image(mime, bytes);
        }
    });

    let record = workflow.submit().await.context("failed to add item")?;

    if json {
        print_json(&record)?;
    } else {
        println!(
            "Added '{}' with id {} (status {})",
            record.item.name,
            record.id,
            record.item.status()
        );
    }
    Ok(())
}

fn image_mime(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}
