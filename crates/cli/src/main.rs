//! Tienda CLI - shop from the terminal.
//!
//! Runs the storefront's cart, favorites, catalog filter and WhatsApp
//! checkout against a local state directory, one JSON file per snapshot.
//!
//! # Usage
//!
//! ```bash
//! # Filter a product export
//! tienda --products products.json catalog --size M --color Negro --max-price 80 --sort price-asc
//!
//! # Build a cart and get the WhatsApp link
//! tienda --products products.json cart add 12 --size M --color Negro
//! tienda cart show
//! tienda checkout --whatsapp-phone "+54 9 11 5555 0000"
//!
//! # Favorites, with leads sent to the backend when it is configured
//! tienda --products products.json favorites toggle 12
//! tienda favorites contact --email ana@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `TIENDA_STATE_DIR` - state directory (default `.tienda`)
//! - `TIENDA_PRODUCTS` - product export (JSON array of product rows)
//! - `BACKEND_URL`, `BACKEND_ANON_KEY` - read products from the backend when
//!   no export is given, and submit favorite leads
//! - `WHATSAPP_PHONE` - shop phone for `checkout`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tienda_core::{Phone, Price, ProductId};
use tienda_storefront::backend::BackendClient;
use tienda_storefront::catalog::{FilterCriteria, SortOrder};
use tienda_storefront::config::BackendConfig;
use tienda_storefront::leads::{LeadQueue, spawn_lead_worker};
use tienda_storefront::storage::FileStorage;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda cart, favorites and catalog from the terminal")]
struct Cli {
    /// Directory holding the cart and favorites snapshots
    #[arg(long, env = "TIENDA_STATE_DIR", default_value = ".tienda", global = true)]
    state_dir: PathBuf,

    /// Product export to read instead of the backend
    #[arg(long, env = "TIENDA_PRODUCTS", global = true)]
    products: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter and list products
    Catalog {
        /// Only products with one of these sizes available
        #[arg(long = "size", value_delimiter = ',')]
        sizes: Vec<String>,

        /// Only products in one of these colors
        #[arg(long = "color", value_delimiter = ',')]
        colors: Vec<String>,

        /// Highest effective price, inclusive
        #[arg(long)]
        max_price: Option<Decimal>,

        #[arg(long, value_enum, default_value_t = SortArg::Insertion)]
        sort: SortArg,

        #[arg(long)]
        category: Option<String>,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage favorites and contact
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Print the WhatsApp order message and link
    Checkout {
        /// Shop phone number, with country code
        #[arg(long, env = "WHATSAPP_PHONE")]
        whatsapp_phone: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        product_id: String,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a line by key
    Remove { key: String },
    /// Set a line's quantity (0 removes it)
    Set { key: String, quantity: u32 },
    /// Empty the cart
    Clear,
    /// Show lines and total
    Show,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Save or remove a favorite
    Toggle { product_id: String },
    /// Save contact details and submit favorites as leads
    Contact {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List favorites and contact
    Show,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Insertion,
    PriceAsc,
    PriceDesc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Insertion => Self::Insertion,
            SortArg::PriceAsc => Self::PriceAsc,
            SortArg::PriceDesc => Self::PriceDesc,
        }
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<String, Box<dyn std::error::Error>> = run(cli).await;

    match result {
        Ok(output) => emit(&output),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    print!("{output}");
}

/// Backend client from `BACKEND_URL` / `BACKEND_ANON_KEY`, if both are set.
fn backend_from_env() -> Result<Option<BackendClient>, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let (Ok(url), Ok(key)) = (
        std::env::var("BACKEND_URL"),
        std::env::var("BACKEND_ANON_KEY"),
    ) else {
        return Ok(None);
    };
    let config = BackendConfig {
        url: url.parse()?,
        anon_key: SecretString::from(key),
    };
    Ok(Some(BackendClient::new(&config)?))
}

async fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let storage = FileStorage::open(&cli.state_dir)?;
    let backend = backend_from_env()?;

    let (leads, worker) = match &backend {
        Some(backend) => {
            let (queue, handle) = spawn_lead_worker(backend.clone());
            (queue, Some(handle))
        }
        None => (LeadQueue::disabled(), None),
    };

    let ctx = Context::new(storage, cli.products, backend, leads);
    let output = execute(&ctx, cli.command).await;

    // Every queue handle must be gone before the worker can finish.
    drop(ctx);
    if let Some(worker) = worker {
        worker.await?;
    }
    Ok(output?)
}

async fn execute(ctx: &Context, command: Commands) -> Result<String, CliError> {
    match command {
        Commands::Catalog {
            sizes,
            colors,
            max_price,
            sort,
            category,
        } => {
            let criteria = FilterCriteria {
                sizes,
                colors,
                max_price: max_price.map(Price::new),
                sort: sort.into(),
                category,
            };
            commands::catalog::list(ctx, &criteria).await
        }
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                size,
                color,
            } => {
                commands::cart::add(
                    ctx,
                    &ProductId::new(product_id),
                    size.as_deref(),
                    color.as_deref(),
                )
                .await
            }
            CartAction::Remove { key } => Ok(commands::cart::remove(ctx, &key)),
            CartAction::Set { key, quantity } => commands::cart::set_quantity(ctx, &key, quantity),
            CartAction::Clear => Ok(commands::cart::clear(ctx)),
            CartAction::Show => Ok(commands::cart::show(ctx)),
        },
        Commands::Favorites { action } => match action {
            FavoritesAction::Toggle { product_id } => {
                commands::favorites::toggle(ctx, &ProductId::new(product_id)).await
            }
            FavoritesAction::Contact { email, phone } => {
                commands::favorites::save_contact(ctx, email.as_deref(), phone.as_deref())
            }
            FavoritesAction::Show => Ok(commands::favorites::show(ctx)),
        },
        Commands::Checkout { whatsapp_phone } => {
            let raw = whatsapp_phone.ok_or(CliError::MissingPhone)?;
            let phone = Phone::parse(&raw)?;
            commands::cart::checkout(ctx, &phone)
        }
    }
}
