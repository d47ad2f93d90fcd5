//! Command handlers.
//!
//! Each handler does its work through the core layer and writes its output to `out`.
//! [`run`] turns failures the user can act on into a notification line.

use super::{
    AdminCommand, CartCommand, CliContext, Command, MenuCommand, MenuFields, WatchArgs, render,
};
use crate::{
    api::CafeApi,
    core::{
        admin::{self, OrderBoard},
        cart::{CartController, CartItem},
        history,
        menu::{self, ImageUpload, MenuItemForm},
        order::{self, CheckoutRequest, OrderSubmission, REJECTION_FALLBACK_MESSAGE},
        polling::{PollingFeed, SnapshotFeed, SnapshotStream},
        table::{CartScope, redirect_for},
    },
    errors::{Error, Field, Result},
    storage::KeyValueStore,
};
use futures::StreamExt;
use std::{io::Write, sync::Arc};
use tracing::{debug, warn};

/// Runs one command.
///
/// # Errors
/// Only local failures (database, I/O, configuration, corrupt stored data) are returned.
/// Everything else is reported on `out`.
pub async fn run<A, S, W>(command: Command, ctx: &CliContext<'_, A, S>, out: &mut W) -> Result<()>
where
    A: CafeApi + ?Sized + 'static,
    S: KeyValueStore + ?Sized,
    W: Write,
{
    let (result, fallback) = match command {
        Command::Menu => (show_menu(ctx, out).await, "Failed to fetch menu items"),
        Command::Cart(cmd) => (cart(ctx, cmd, out).await, "Failed to update cart"),
        Command::Checkout { phone, name } => (
            checkout(ctx, phone, name, out).await,
            REJECTION_FALLBACK_MESSAGE,
        ),
        Command::LastOrder => (last_order(ctx, out).await, "Failed to load last order"),
        Command::History { local } => (
            show_history(ctx, local, out).await,
            "Failed to fetch order history",
        ),
        Command::Admin(cmd) => {
            let fallback = admin_fallback(&cmd);
            (run_admin(ctx, cmd, out).await, fallback)
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if is_local(&e) => Err(e),
        Err(e) => report(ctx, out, &e, fallback),
    }
}

const fn is_local(error: &Error) -> bool {
    matches!(
        error,
        Error::Database(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::Config { .. }
            | Error::EnvVar(_)
    )
}

const fn admin_fallback(command: &AdminCommand) -> &'static str {
    match command {
        AdminCommand::Orders(_) => admin::FETCH_ORDERS_FAILED,
        AdminCommand::Complete { .. } | AdminCommand::Cancel { .. } => {
            "Failed to update order status"
        }
        AdminCommand::Stats(_) => "Failed to fetch stats",
        AdminCommand::Users => "Failed to fetch users",
        AdminCommand::Menu(MenuCommand::Add(_)) => "Failed to add menu item",
        AdminCommand::Menu(MenuCommand::Update { .. }) => "Failed to update menu item",
        AdminCommand::Menu(MenuCommand::Delete { .. }) => "Failed to delete menu item",
    }
}

fn report<A, S, W>(
    ctx: &CliContext<'_, A, S>,
    out: &mut W,
    error: &Error,
    fallback: &str,
) -> Result<()>
where
    A: ?Sized,
    S: ?Sized,
    W: Write,
{
    debug!("Command failed: {:?}", error);
    writeln!(out, "❌ {}", error.user_message(fallback))?;

    let route = CartScope::resolve(ctx.table.as_deref(), &ctx.config.tables).map_or_else(
        |_| redirect_for(error),
        |scope| order::failure_route(error, &scope),
    );
    if let Some(route) = route {
        writeln!(out, "{}", render::route(&route))?;
    }
    Ok(())
}

async fn open_cart<'a, A, S>(ctx: &CliContext<'a, A, S>) -> Result<CartController<'a, S>>
where
    A: ?Sized,
    S: KeyValueStore + ?Sized,
{
    CartController::open(ctx.store, ctx.table.as_deref(), &ctx.config.tables).await
}

fn position_index(position: u64) -> usize {
    position
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
        .unwrap_or(usize::MAX)
}

async fn show_menu<A, S, W>(ctx: &CliContext<'_, A, S>, out: &mut W) -> Result<()>
where
    A: CafeApi + ?Sized,
    S: ?Sized,
    W: Write,
{
    let items = ctx.api.list_menu().await?;
    writeln!(out, "{}", render::menu(&menu::group_by_category(items)))?;
    Ok(())
}

async fn cart<A, S, W>(ctx: &CliContext<'_, A, S>, command: CartCommand, out: &mut W) -> Result<()>
where
    A: CafeApi + ?Sized,
    S: KeyValueStore + ?Sized,
    W: Write,
{
    let mut cart = open_cart(ctx).await?;

    match command {
        CartCommand::Show => {}
        CartCommand::Add { name, quantity } => {
            let items = ctx.api.list_menu().await?;
            let item = menu::find_item(&items, &name).ok_or_else(|| {
                Error::validation(Field::ItemName, format!("No menu item named '{name}'"))
            })?;
            cart.add_item(CartItem::from(item), quantity).await?;
            writeln!(out, "✅ Added {quantity} x {} to your cart", item.name)?;
            writeln!(out, "{}", render::route(&cart.scope().cart_route()))?;
        }
        CartCommand::Set { position, quantity } => {
            if cart.update_quantity(position_index(position), quantity).await? {
                writeln!(out, "✅ Quantity updated")?;
            } else {
                writeln!(
                    out,
                    "Quantity must be at least 1. Use `cart remove {position}` to drop the item."
                )?;
            }
        }
        CartCommand::Remove { position } => {
            let removed = cart.remove_item(position_index(position)).await?;
            writeln!(out, "✅ Removed {} from your cart", removed.name)?;
        }
        CartCommand::Clear => {
            cart.clear().await?;
            writeln!(out, "✅ Cart cleared")?;
        }
    }

    writeln!(out, "{}", render::cart(cart.cart()))?;
    Ok(())
}

async fn checkout<A, S, W>(
    ctx: &CliContext<'_, A, S>,
    phone: Option<String>,
    name: Option<String>,
    out: &mut W,
) -> Result<()>
where
    A: CafeApi + ?Sized,
    S: KeyValueStore + ?Sized,
    W: Write,
{
    let mut cart = open_cart(ctx).await?;
    let phone = match phone {
        Some(phone) => phone,
        None => order::remembered_phone(ctx.store).await?.unwrap_or_default(),
    };
    let request = CheckoutRequest { phone, name };
    let mut flow = OrderSubmission::new();
    let confirmation = flow
        .submit(ctx.api.as_ref(), &mut cart, &request, &ctx.session)
        .await?;
    writeln!(out, "{}", render::confirmation(&confirmation))?;
    Ok(())
}

async fn last_order<A, S, W>(ctx: &CliContext<'_, A, S>, out: &mut W) -> Result<()>
where
    A: ?Sized,
    S: KeyValueStore + ?Sized,
    W: Write,
{
    let scope = CartScope::resolve(ctx.table.as_deref(), &ctx.config.tables)?;
    match order::load_last_order(ctx.store, &scope).await? {
        Some(snapshot) => writeln!(out, "{}", render::last_order(&snapshot))?,
        None => writeln!(out, "No orders placed yet.")?,
    }
    Ok(())
}

async fn show_history<A, S, W>(ctx: &CliContext<'_, A, S>, local: bool, out: &mut W) -> Result<()>
where
    A: CafeApi + ?Sized,
    S: KeyValueStore + ?Sized,
    W: Write,
{
    let entries = if local {
        history::local_history(ctx.store).await?
    } else {
        history::fetch_user_history(ctx.api.as_ref(), &ctx.session).await?
    };
    writeln!(out, "{}", render::history(&entries))?;
    Ok(())
}

fn limited<T: Send + 'static>(stream: SnapshotStream<T>, watch: WatchArgs) -> SnapshotStream<T> {
    match watch.limit {
        Some(limit) => stream.take(limit).boxed(),
        None => stream,
    }
}

async fn run_admin<A, S, W>(
    ctx: &CliContext<'_, A, S>,
    command: AdminCommand,
    out: &mut W,
) -> Result<()>
where
    A: CafeApi + ?Sized + 'static,
    S: ?Sized,
    W: Write,
{
    let api = ctx.api.as_ref();
    match command {
        AdminCommand::Orders(watch) => {
            let mut board = OrderBoard::new();
            if !watch.watch {
                board.refresh(api).await;
                writeln!(out, "{}", render::order_board(&board))?;
                return Ok(());
            }
            let feed = PollingFeed::from_config(Arc::clone(&ctx.api), ctx.config);
            let mut snapshots = limited(feed.orders(), watch);
            while let Some(snapshot) = snapshots.next().await {
                board.apply(snapshot);
                writeln!(out, "{}\n", render::order_board(&board))?;
                out.flush()?;
            }
        }
        AdminCommand::Complete { id } => {
            admin::complete_order(api, &mut OrderBoard::new(), &id).await?;
            writeln!(out, "✅ Order status updated")?;
        }
        AdminCommand::Cancel { id } => {
            admin::cancel_order(api, &mut OrderBoard::new(), &id).await?;
            writeln!(out, "✅ Order status updated")?;
        }
        AdminCommand::Stats(watch) => {
            if !watch.watch {
                let stats = api.admin_stats().await?;
                writeln!(out, "{}", render::stats(&stats))?;
                return Ok(());
            }
            let feed = PollingFeed::from_config(Arc::clone(&ctx.api), ctx.config);
            let mut snapshots = limited(feed.stats(), watch);
            while let Some(snapshot) = snapshots.next().await {
                match snapshot {
                    Ok(stats) => {
                        writeln!(out, "{}\n", render::stats(&stats))?;
                        out.flush()?;
                    }
                    Err(e) => warn!("Error fetching stats: {}", e),
                }
            }
        }
        AdminCommand::Users => {
            let users = api.list_users().await?;
            writeln!(out, "{}", render::users(&users))?;
        }
        AdminCommand::Menu(command) => menu_admin(api, command, out).await?,
    }
    Ok(())
}

fn read_image(fields: &MenuFields) -> Result<Option<ImageUpload>> {
    fields
        .image
        .as_deref()
        .map(ImageUpload::from_path)
        .transpose()
}

async fn menu_admin<A, W>(api: &A, command: MenuCommand, out: &mut W) -> Result<()>
where
    A: CafeApi + ?Sized,
    W: Write,
{
    match command {
        MenuCommand::Add(fields) => {
            let form = MenuItemForm {
                image: read_image(&fields)?,
                name: fields.name.unwrap_or_default(),
                description: fields.description.unwrap_or_default(),
                price: fields.price.unwrap_or_default(),
                category: fields.category.unwrap_or_default(),
            };
            let stored = admin::create_menu_item(api, form).await?;
            writeln!(out, "✅ Menu item added successfully")?;
            if let Some(item) = stored {
                writeln!(out, "{} ({})", item.name, item.id)?;
            }
        }
        MenuCommand::Update { id, fields } => {
            let items = api.list_menu().await?;
            let existing = items.iter().find(|item| item.id == id).ok_or_else(|| {
                Error::validation(Field::ItemName, format!("No menu item with id '{id}'"))
            })?;

            let mut form = MenuItemForm::from_item(existing);
            form.image = read_image(&fields)?;
            if let Some(name) = fields.name {
                form.name = name;
            }
            if let Some(description) = fields.description {
                form.description = description;
            }
            if let Some(price) = fields.price {
                form.price = price;
            }
            if let Some(category) = fields.category {
                form.category = category;
            }

            admin::edit_menu_item(api, &id, form).await?;
            writeln!(out, "✅ Menu item updated successfully")?;
        }
        MenuCommand::Delete { id } => {
            api.delete_menu_item(&id).await?;
            writeln!(out, "✅ Menu item deleted successfully")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::cli::Cli;
    use crate::config::AppConfig;
    use crate::core::admin::{DashboardStats, OrderStatus};
    use crate::core::price::PriceValue;
    use crate::storage::MemoryStore;
    use crate::test_utils::{
        CountingStore, FakeCafeApi, PlaceBehavior, menu_item, order_record, user_record,
    };
    use clap::Parser;

    /// One device talking to one backend.
    struct Cafe<S> {
        api: Arc<FakeCafeApi>,
        store: S,
        config: AppConfig,
    }

    impl Cafe<MemoryStore> {
        fn new() -> Self {
            Self::with_store(MemoryStore::new())
        }
    }

    impl<S: KeyValueStore> Cafe<S> {
        fn with_store(store: S) -> Self {
            let api = FakeCafeApi::new();
            api.set_menu(vec![
                menu_item("Latte", 150.0, "HOT_COFFEE"),
                menu_item("Fries", 80.0, "FRIES"),
            ]);
            Self {
                api: Arc::new(api),
                store,
                config: AppConfig::default(),
            }
        }

        async fn exec(&self, args: &[&str]) -> Result<String> {
            let cli =
                Cli::try_parse_from(std::iter::once("cafe").chain(args.iter().copied())).unwrap();
            let ctx = CliContext::new(&cli, Arc::clone(&self.api), &self.store, &self.config);
            let mut out = Vec::new();
            run(cli.command, &ctx, &mut out).await?;
            Ok(String::from_utf8(out).unwrap())
        }

        async fn exec_signed_in(&self, args: &[&str]) -> Result<String> {
            let mut full = vec!["--email", "asha@example.com"];
            full.extend_from_slice(args);
            self.exec(&full).await
        }
    }

    #[tokio::test]
    async fn test_table_cart_flow() -> Result<()> {
        let cafe = Cafe::new();

        let text = cafe.exec(&["--table", "3", "cart", "add", "latte", "-q", "2"]).await?;
        assert!(text.contains("✅ Added 2 x Latte"), "{text}");
        assert!(text.contains("→ /table/3/cart"), "{text}");
        cafe.exec(&["--table", "3", "cart", "add", "Fries"]).await?;

        let text = cafe.exec(&["--table", "3", "cart", "set", "2", "0"]).await?;
        assert!(text.contains("Quantity must be at least 1"), "{text}");

        let text = cafe.exec(&["--table", "3", "cart", "show"]).await?;
        assert!(text.contains(" 2. Fries"), "{text}");
        assert!(text.contains("Total: ₹380"), "{text}");
        assert!(cafe.store.get("cart").await?.is_none());

        let text = cafe.exec(&["--table", "3", "cart", "remove", "5"]).await?;
        assert!(text.contains("❌ No cart item at position 5"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_formatted_menu_price_reaches_cart() -> Result<()> {
        let cafe = Cafe::new();
        let mut momos = menu_item("Momos", 0.0, "MOMOS");
        momos.price = PriceValue::from("₹90");
        cafe.api.set_menu(vec![momos]);

        let text = cafe.exec(&["menu"]).await?;
        assert!(text.contains("₹90"), "{text}");

        let text = cafe.exec(&["cart", "add", "Momos", "-q", "2"]).await?;
        assert!(text.contains("→ /cart"), "{text}");
        assert!(text.contains("Total: ₹180"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_menu_item() -> Result<()> {
        let cafe = Cafe::new();
        let text = cafe.exec(&["cart", "add", "Tea"]).await?;
        assert!(text.contains("❌ No menu item named 'Tea'"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_table_redirects_home_without_store_access() -> Result<()> {
        let cafe = Cafe::with_store(CountingStore::new());
        let text = cafe.exec(&["--table", "11", "cart", "add", "Latte"]).await?;
        assert!(text.contains("❌ Invalid table number: 11"), "{text}");
        assert!(text.contains("→ /\n"), "{text}");
        assert_eq!(cafe.store.accesses(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_global_checkout_needs_sign_in() -> Result<()> {
        let cafe = Cafe::new();
        cafe.exec(&["cart", "add", "Latte"]).await?;

        let text = cafe.exec(&["checkout", "--phone", "9876543210"]).await?;
        assert!(text.contains("❌ Please sign in to continue"), "{text}");
        assert!(text.contains("→ /api/auth/signin"), "{text}");
        assert!(cafe.api.placed_orders().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_table_checkout() -> Result<()> {
        let cafe = Cafe::new();
        let checkout = ["--table", "4", "checkout", "--phone", "9876543210", "--name", "Ravi"];

        let text = cafe.exec(&checkout).await?;
        assert!(text.contains("❌ Your cart is empty"), "{text}");
        assert!(text.contains("→ /table/4\n"), "{text}");

        cafe.exec(&["--table", "4", "cart", "add", "Latte", "-q", "2"]).await?;
        let text = cafe.exec(&checkout).await?;
        assert!(text.contains("✅ Order placed successfully!"), "{text}");
        assert!(text.contains("→ /table/4/order-success"), "{text}");
        assert_eq!(cafe.api.placed_orders()[0].total, 300.0);

        let text = cafe.exec(&["--table", "4", "last-order"]).await?;
        assert!(text.contains("Name: Ravi"), "{text}");
        assert!(text.contains("Table: 4"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_reuses_remembered_phone() -> Result<()> {
        let cafe = Cafe::new();

        cafe.exec_signed_in(&["cart", "add", "Latte"]).await?;
        let text = cafe.exec_signed_in(&["checkout"]).await?;
        assert!(text.contains("❌ Phone number is required"), "{text}");

        let text = cafe.exec_signed_in(&["checkout", "--phone", "9876543210"]).await?;
        assert!(text.contains("Past orders: → /order-history"), "{text}");

        cafe.exec_signed_in(&["cart", "add", "Fries"]).await?;
        let text = cafe.exec_signed_in(&["checkout"]).await?;
        assert!(text.contains("✅ Order placed successfully!"), "{text}");
        let placed = cafe.api.placed_orders();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[1].phone_number, "9876543210");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_transport_failure_message() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.set_place_behavior(PlaceBehavior::Transport);
        cafe.exec_signed_in(&["cart", "add", "Latte"]).await?;

        let text = cafe.exec_signed_in(&["checkout", "--phone", "9876543210"]).await?;
        assert_eq!(text, "❌ Server error. Please try again later.\n");
        assert!(cafe.store.get("cart").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_complete_and_reject_non_pending() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.set_orders(vec![order_record("o1", OrderStatus::Pending)]);

        let text = cafe.exec(&["admin", "complete", "o1"]).await?;
        assert!(text.contains("✅ Order status updated"), "{text}");

        let text = cafe.exec(&["admin", "cancel", "o1"]).await?;
        assert!(text.contains("❌ Order o1 is no longer pending"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_complete_while_backend_down() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.fail_order_listing();

        let text = cafe.exec(&["admin", "complete", "o1"]).await?;
        assert_eq!(text, "❌ Server error. Please try again later.\n");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_admin_orders_watch() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.set_orders(vec![order_record("o1", OrderStatus::Pending)]);

        let text = cafe.exec(&["admin", "orders", "--watch", "--limit", "3"]).await?;
        assert_eq!(text.matches("o1 [pending]").count(), 3);
        assert_eq!(cafe.api.list_orders_calls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_users() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.set_users(vec![user_record("asha@example.com", "Asha")]);

        let text = cafe.exec(&["admin", "users"]).await?;
        assert!(text.contains("Asha <asha@example.com> - 1 orders"), "{text}");
        assert!(text.contains("o-asha completed"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_stats() -> Result<()> {
        let cafe = Cafe::new();
        cafe.api.set_stats(DashboardStats {
            total_orders: 7,
            pending_orders: 2,
            revenue: 1250.0,
            ..DashboardStats::default()
        });

        let text = cafe.exec(&["admin", "stats"]).await?;
        assert!(text.contains("Total Orders: 7"), "{text}");
        assert!(text.contains("Pending Orders: 2"), "{text}");
        assert!(text.contains("Revenue: ₹1250"), "{text}");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_menu_update_keeps_unset_fields() -> Result<()> {
        let cafe = Cafe::new();
        let text = cafe.exec(&["admin", "menu", "update", "id-latte", "--price", "160"]).await?;
        assert!(text.contains("✅ Menu item updated successfully"), "{text}");

        let latte = cafe.api.menu().into_iter().find(|m| m.id == "id-latte").unwrap();
        assert_eq!(latte.price.amount()?, 160.0);
        assert_eq!(latte.category, "HOT_COFFEE");
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_menu_delete_rejection() -> Result<()> {
        let cafe = Cafe::new();
        let text = cafe.exec(&["admin", "menu", "delete", "nope"]).await?;
        assert_eq!(text, "❌ Item not found\n");
        Ok(())
    }
}
