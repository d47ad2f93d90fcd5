//! Command-line front end - the customer and admin screens as subcommands
//!
//! Argument parsing lives here; [`commands`] holds the handlers and [`render`] the text
//! output. Failures a user can act on are printed as `❌` lines with the screen to go to
//! next, and the command still exits successfully. Only local failures (database, I/O)
//! propagate.

/// Command handlers
pub mod commands;
/// Text rendering
pub mod render;

use crate::{config::AppConfig, core::order::Session};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

/// Café ordering client.
#[derive(Debug, Parser)]
#[command(name = "cafe", version, about = "Browse the menu, order, and run the café back office")]
pub struct Cli {
    /// Table code for in-venue ordering; omit for delivery and pickup
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Signed-in account email
    #[arg(long, global = true, env = "CAFE_USER_EMAIL")]
    pub email: Option<String>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the menu grouped by category
    Menu,
    /// Show or change the cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place the order in the cart
    Checkout {
        /// Ten-digit mobile number; defaults to the number used at the last checkout
        #[arg(long)]
        phone: Option<String>,
        /// Customer name, required for table orders
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the last order placed from this cart
    LastOrder,
    /// Show past orders of the signed-in user
    History {
        /// Show orders recorded on this device instead of asking the backend
        #[arg(long)]
        local: bool,
    },
    /// Back-office commands
    #[command(subcommand)]
    Admin(AdminCommand),
}

/// Cart commands. Positions are 1-based as shown by `cart show`.
#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// List cart entries and the total
    Show,
    /// Add a menu item by name
    Add {
        /// Menu item name
        name: String,
        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of an entry; values below 1 are ignored
    Set {
        /// Entry position
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove an entry
    Remove {
        /// Entry position
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
    /// Empty the cart
    Clear,
}

/// Back-office commands.
#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Show all orders
    Orders(WatchArgs),
    /// Mark a pending order completed
    Complete {
        /// Backend order id
        id: String,
    },
    /// Mark a pending order cancelled
    Cancel {
        /// Backend order id
        id: String,
    },
    /// Show dashboard statistics
    Stats(WatchArgs),
    /// List registered users and their orders
    Users,
    /// Maintain menu items
    #[command(subcommand)]
    Menu(MenuCommand),
}

/// Options of the live views.
#[derive(Debug, Clone, Copy, Args)]
pub struct WatchArgs {
    /// Keep refreshing at the configured interval
    #[arg(long)]
    pub watch: bool,
    /// Stop after this many refreshes when watching
    #[arg(long, requires = "watch")]
    pub limit: Option<usize>,
}

/// Menu maintenance commands.
#[derive(Debug, Subcommand)]
pub enum MenuCommand {
    /// Create a menu item; an image is required
    Add(MenuFields),
    /// Update a menu item; fields not given keep their current value
    Update {
        /// Backend item id
        id: String,
        /// New values
        #[command(flatten)]
        fields: MenuFields,
    },
    /// Delete a menu item
    Delete {
        /// Backend item id
        id: String,
    },
}

/// Menu item form fields.
#[derive(Debug, Clone, Default, Args)]
pub struct MenuFields {
    /// Item name
    #[arg(long)]
    pub name: Option<String>,
    /// Short description
    #[arg(long)]
    pub description: Option<String>,
    /// Price in rupees
    #[arg(long)]
    pub price: Option<String>,
    /// Category, e.g. "HOT COFFEE"
    #[arg(long)]
    pub category: Option<String>,
    /// Image file to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

/// Everything a command handler needs.
pub struct CliContext<'a, A: ?Sized, S: ?Sized> {
    /// Backend client
    pub api: Arc<A>,
    /// Local state
    pub store: &'a S,
    /// Loaded configuration
    pub config: &'a AppConfig,
    /// Who is signed in
    pub session: Session,
    /// Table code from the command line
    pub table: Option<String>,
}

impl<'a, A: ?Sized, S: ?Sized> CliContext<'a, A, S> {
    /// Builds the context for one invocation.
    pub fn new(cli: &Cli, api: Arc<A>, store: &'a S, config: &'a AppConfig) -> Self {
        Self {
            api,
            store,
            config,
            session: Session::from_email(cli.email.as_deref()),
            table: cli.table.clone(),
        }
    }
}

pub use commands::run;
