//! Entity module - Contains the SeaORM entity definitions for local persistence.
//! The client keeps all of its durable state (carts, last order snapshots, the order
//! history mirror) as string values in a single key-value table.

pub mod storage_entry;

pub use storage_entry::{
    Column as StorageEntryColumn, Entity as StorageEntry, Model as StorageEntryModel,
};
