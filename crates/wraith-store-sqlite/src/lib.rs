// crates/wraith-store-sqlite/src/lib.rs
// ============================================================================
// Module: Wraith SQLite Store
// Description: Embedded SQLite persistence layer for the Wraith server.
// Purpose: Expose the store handle, filter translation, and entity repositories.
// Dependencies: wraith-core, rusqlite, serde, serde_json, argon2, rand, tracing
// ============================================================================

//! ## Overview
//! This crate is the storage backend of the Wraith server. One
//! [`WraithStore`] owns one SQLite connection and one exclusive transaction
//! for its entire lifetime; every repository operation runs inside that
//! ambient transaction and becomes visible to other processes at
//! [`WraithStore::close`]. Dynamic filters are translated to parameterized
//! SQL through per-entity column enums, so no caller-supplied value or
//! identifier ever reaches the SQL text.

mod bootstrap;
mod commands;
mod config;
mod events;
mod filter;
mod sessions;
mod settings;
mod store;
mod users;
mod wraiths;

pub use commands::CommandColumn;
pub use commands::CommandRepo;
pub use config::JournalMode;
pub use config::StoreConfig;
pub use config::SyncMode;
pub use events::EventColumn;
pub use events::EventRepo;
pub use filter::Filter;
pub use filter::FilterColumn;
pub use filter::FilterSql;
pub use filter::Page;
pub use sessions::SessionColumn;
pub use sessions::SessionRepo;
pub use settings::SettingColumn;
pub use settings::SettingsRepo;
pub use settings::StatsRepo;
pub use store::WraithStore;
pub use users::UserColumn;
pub use users::UserRepo;
pub use wraiths::WraithColumn;
pub use wraiths::WraithRepo;
