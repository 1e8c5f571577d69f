// crates/wraith-core/src/lib.rs
// ============================================================================
// Module: Wraith Core
// Description: Domain types shared by the Wraith server persistence layer.
// Purpose: Provide identifiers, entity records, setting keys, and errors.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core domain vocabulary for the Wraith server: strongly typed identifiers,
//! entity record shapes, the well-known runtime setting keys, and the store
//! error taxonomy. This crate holds no I/O; the storage backend lives in
//! `wraith-store-sqlite` and the API layer consumes both.

pub mod entities;
pub mod errors;
pub mod identifiers;
pub mod settings;

pub use entities::CommandRecord;
pub use entities::EventRecord;
pub use entities::NewCommand;
pub use entities::NewSession;
pub use entities::NewUser;
pub use entities::PrivilegeLevel;
pub use entities::SessionRecord;
pub use entities::UserRecord;
pub use entities::WraithRecord;
pub use errors::StoreError;
pub use identifiers::CommandId;
pub use identifiers::EventId;
pub use identifiers::SessionId;
pub use identifiers::UserName;
pub use identifiers::WraithId;
