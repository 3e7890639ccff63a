//! Bazaar CLI - drive a saved cart and wishlist from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two units of a product with five in stock
//! bazaar cart add WIDGET-1 --name "Widget" --price 19.99 --quantity 2 --stock 5
//!
//! # Show lines, totals and coupon
//! bazaar cart show
//!
//! # Validate a coupon against the configured backend
//! BAZAAR_API_URL=http://localhost:5000/api bazaar coupon apply SAVE10
//!
//! # Use a different snapshot file
//! bazaar --file /tmp/cart.json wishlist list
//! ```
//!
//! # Commands
//!
//! - `cart` - Show, add, remove, update and clear lines; set checkout details
//! - `coupon` - Apply or remove a coupon
//! - `wishlist` - List, add and remove saved products

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use bazaar_core::ProductId;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(author, version, about = "Bazaar cart and coupon tools")]
struct Cli {
    /// Snapshot file holding the cart and wishlist
    #[arg(long, global = true, env = "BAZAAR_CART_FILE", default_value = "cart.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Apply or remove a coupon
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Manage saved products
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print lines, totals and coupon
    Show,
    /// Add a product, merging with an existing line
    Add {
        /// Product identifier
        product: ProductId,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Unit price
        #[arg(short, long)]
        price: Decimal,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Units in stock (maximum quantity)
        #[arg(short, long)]
        stock: u32,

        /// Image URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Remove a product's line
    Remove { product: ProductId },
    /// Set a line's quantity (0 removes it)
    Update { product: ProductId, quantity: u32 },
    /// Empty the cart
    Clear {
        /// Also drop the coupon, address and payment method
        #[arg(long)]
        all: bool,
    },
    /// Set the shipping address
    Address {
        address: String,
        city: String,
        postal_code: String,
        country: String,
    },
    /// Set the payment method
    Payment { method: String },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Validate a code against the backend and apply it
    Apply { code: String },
    /// Drop the applied coupon
    Remove,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Print saved products
    List,
    /// Save a product
    Add {
        product: ProductId,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        price: Decimal,

        #[arg(long)]
        image: Option<String>,
    },
    /// Save a product that is already in the cart
    Save { product: ProductId },
    /// Remove a saved product
    Remove { product: ProductId },
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Sentry must be initialized before the subscriber
    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = cli.file;
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&file).await?,
            CartAction::Add {
                product,
                name,
                price,
                quantity,
                stock,
                image,
            } => {
                let mut item = bazaar_core::CartItem::new(product, name, price, quantity, stock);
                if let Some(image) = image {
                    item = item.with_image(image);
                }
                commands::cart::add(&file, item).await?;
            }
            CartAction::Remove { product } => commands::cart::remove(&file, &product).await?,
            CartAction::Update { product, quantity } => {
                commands::cart::update(&file, &product, quantity).await?;
            }
            CartAction::Clear { all } => commands::cart::clear(&file, all).await?,
            CartAction::Address {
                address,
                city,
                postal_code,
                country,
            } => {
                let address = bazaar_core::ShippingAddress {
                    address,
                    city,
                    postal_code,
                    country,
                };
                commands::cart::set_address(&file, address).await?;
            }
            CartAction::Payment { method } => {
                commands::cart::set_payment(&file, bazaar_core::PaymentMethod::new(method))
                    .await?;
            }
        },
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code } => commands::coupon::apply(&file, &code).await?,
            CouponAction::Remove => commands::coupon::remove(&file).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::List => commands::wishlist::list(&file).await?,
            WishlistAction::Add {
                product,
                name,
                price,
                image,
            } => {
                let item = bazaar_core::WishlistItem {
                    product,
                    name,
                    image,
                    price,
                };
                commands::wishlist::add(&file, item).await?;
            }
            WishlistAction::Save { product } => {
                commands::wishlist::save_from_cart(&file, &product).await?;
            }
            WishlistAction::Remove { product } => {
                commands::wishlist::remove(&file, &product).await?;
            }
        },
    }
    Ok(())
}
