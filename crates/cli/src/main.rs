//! ShopEase CLI - terminal storefront.
//!
//! Each subcommand is one page of the storefront: it restores the saved
//! session, loads what the page shows, performs the action, and prints the
//! result together with any notices the action produced.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password read from SHOPEASE_PASSWORD or prompted)
//! shopease login -e asha@example.com
//!
//! # Browse the catalog
//! shopease products list --category Electronics --sort-by price --order asc
//!
//! # Fill the cart and check out
//! shopease cart add <product-id> -q 2
//! shopease checkout --street "12 MG Road" --city Bengaluru --state KA --zip 560001
//!
//! # Admin
//! shopease admin set-status <order-id> shipped
//! ```
//!
//! # Environment Variables
//!
//! See `shopease_client::config` for the client settings. `SENTRY_DSN`
//! enables error reporting and `RUST_LOG` overrides the log filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use shopease_client::ClientConfig;
use shopease_core::{OrderStatus, PaymentMethod, SortDirection, SortField};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod gateway;
mod views;

#[derive(Parser)]
#[command(name = "shopease")]
#[command(author, version, about = "ShopEase terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// View and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        /// ZIP / postal code
        #[arg(long)]
        zip: String,
        #[arg(long, default_value = "India")]
        country: String,
        /// Payment method (`razorpay`, `cod`)
        #[arg(short, long, default_value = "razorpay")]
        payment: PaymentMethod,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Search in product names
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<Decimal>,
        #[arg(long)]
        max_price: Option<Decimal>,
        /// Sort field (`createdAt`, `price`, `name`)
        #[arg(long, default_value = "createdAt")]
        sort_by: SortField,
        /// Sort direction (`asc`, `desc`)
        #[arg(long, default_value = "desc")]
        order: SortDirection,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one product
    Show { id: String },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change an item's quantity (0 removes it)
    Update { item_id: String, quantity: u32 },
    /// Remove an item
    Remove { item_id: String },
    /// Remove every item
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: String },
    /// Download an order's invoice
    Invoice {
        id: String,
        /// Output file (default: `invoice-<id>.pdf`)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Store-wide figures
    Stats,
    /// Every customer's orders
    Orders,
    /// Move an order to a new status
    SetStatus { id: String, status: OrderStatus },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopease_client=info,shopease_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::open(config).await?;
    let notices = ctx.store.notifier().subscribe();

    let result = dispatch(&ctx, cli.command).await;

    views::drain_notices(notices);
    if let Some(route) = result
        .as_ref()
        .err()
        .and_then(commands::CliError::client)
        .and_then(shopease_client::ClientError::redirect)
    {
        views::redirect(&route);
    }
    result.map_err(Into::into)
}

async fn dispatch(ctx: &commands::Context, command: Commands) -> Result<(), commands::CliError> {
    match command {
        Commands::Login { email } => commands::auth::login(ctx, &email).await,
        Commands::Logout => commands::auth::logout(ctx).await,
        Commands::Whoami => commands::auth::whoami(ctx).await,
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                min_price,
                max_price,
                sort_by,
                order,
                page,
            } => {
                let query = shopease_core::ProductQuery {
                    search,
                    category,
                    min_price,
                    max_price,
                    sort_by,
                    order,
                    page,
                };
                commands::products::list(ctx, &query).await
            }
            ProductsAction::Show { id } => commands::products::show(ctx, &id.into()).await,
            ProductsAction::Categories => commands::products::categories(ctx).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(ctx).await,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(ctx, &product_id.into(), quantity).await,
            CartAction::Update { item_id, quantity } => {
                commands::cart::update(ctx, &item_id.into(), quantity).await
            }
            CartAction::Remove { item_id } => commands::cart::remove(ctx, &item_id.into()).await,
            CartAction::Clear => commands::cart::clear(ctx).await,
        },
        Commands::Checkout {
            street,
            city,
            state,
            zip,
            country,
            payment,
        } => {
            let form = shopease_client::CheckoutForm {
                shipping_address: shopease_core::ShippingAddress {
                    street,
                    city,
                    state,
                    zip_code: zip,
                    country,
                },
                payment_method: payment,
            };
            commands::checkout::run(ctx, form).await
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(ctx).await,
            OrdersAction::Show { id } => commands::orders::show(ctx, &id.into()).await,
            OrdersAction::Invoice { id, output } => {
                commands::orders::invoice(ctx, &id.into(), output).await
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Stats => commands::admin::stats(ctx).await,
            AdminAction::Orders => commands::admin::orders(ctx).await,
            AdminAction::SetStatus { id, status } => {
                commands::admin::set_status(ctx, &id.into(), status).await
            }
        },
    }
}
