//! Orchard CLI - drive the client core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! orchard products list --limit 6
//! orchard products list --refresh
//!
//! # Search (recorded in history)
//! orchard search mango
//! orchard history
//!
//! # Cart operations (guest until signed in)
//! orchard cart add prod-42 --quantity 2
//! orchard cart show
//! orchard cart set-qty prod-42 5
//! orchard cart clear
//!
//! # Session
//! orchard signin --token <BEARER>
//! orchard signout
//! ```
//!
//! # Environment Variables
//!
//! - `ORCHARD_API_BASE_URL` - Backend API base URL (required)
//! - `ORCHARD_DATA_DIR` - Where persisted state lives (optional)
//! - `RUST_LOG` - Tracing filter (default: `orchard=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use orchard_client::config::ClientConfig;
use orchard_client::state::ClientState;

#[derive(Parser)]
#[command(name = "orchard")]
#[command(author, version, about = "Orchard storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Search the catalog (recorded in history)
    Search {
        /// Search term
        term: String,
    },
    /// Show or clear the search history
    History {
        /// Forget all recorded searches
        #[arg(long)]
        clear: bool,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Store a bearer token and merge the guest cart into the server cart
    Signin {
        /// Bearer token issued by the identity provider
        #[arg(short, long)]
        token: String,
    },
    /// Clear the stored bearer token
    Signout,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Max products to fetch
        #[arg(short, long)]
        limit: Option<u32>,

        /// Restrict to one category
        #[arg(short, long)]
        category: Option<String>,

        /// Force a network fetch; fail instead of showing cached data
        #[arg(long)]
        refresh: bool,
    },
    /// Show one product
    Show {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        id: String,

        /// Units to add
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: String,
    },
    /// Set the quantity for a product (0 removes it)
    SetQty {
        /// Product ID
        id: String,

        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing with EnvFilter; default to info for our crates
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orchard=info,orchard_client=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let state = ClientState::new(config)?;

    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                limit,
                category,
                refresh,
            } => commands::products::list(&state, limit, category.as_deref(), refresh).await?,
            ProductsAction::Show { id } => commands::products::show(&state, &id).await?,
        },
        Commands::Search { term } => commands::search::run(&state, &term).await?,
        Commands::History { clear } => commands::search::history(&state, clear),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state).await?,
            CartAction::Add { id, quantity } => commands::cart::add(&state, &id, quantity).await?,
            CartAction::Remove { id } => commands::cart::remove(&state, &id).await?,
            CartAction::SetQty { id, quantity } => {
                commands::cart::set_quantity(&state, &id, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(&state).await?,
        },
        Commands::Signin { token } => commands::auth::signin(&state, &token).await?,
        Commands::Signout => commands::auth::signout(&state)?,
    }
    Ok(())
}
