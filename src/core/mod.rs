//! Core layer - business logic independent of any front end
//!
//! Everything here talks to the outside world only through the [`crate::storage::KeyValueStore`]
//! port and the [`crate::api::CafeApi`] client trait, so both can be swapped in tests.

/// Admin order board, status changes, stats, users, and menu maintenance
pub mod admin;
/// Cart entries, totals, and the persisted cart controller
pub mod cart;
/// Phone and name validation
pub mod contact;
/// Remote and local order history
pub mod history;
/// Menu grouping, lookup, and admin form validation
pub mod menu;
/// Order payload and the submission state machine
pub mod order;
/// Fixed-interval snapshot streams for admin views
pub mod polling;
/// Price normalization and formatting
pub mod price;
/// Table allow-list, cart scopes, and routes
pub mod table;
