// crates/wraith-core/src/entities.rs
// ============================================================================
// Module: Wraith Entities
// Description: Record shapes for agents, commands, users, sessions, and events.
// Purpose: Define the semantic entity forms exchanged with the storage layer.
// Dependencies: serde, crate::identifiers
// ============================================================================

//! ## Overview
//! Entity records as returned by the storage repositories. Property blobs
//! (`host_properties`, `wraith_properties`, `command_params`,
//! `event_properties`) are opaque serialized strings owned by the API layer;
//! list-shaped columns (issued commands, command targets and responses) are
//! decoded into typed vectors at the storage boundary. All timestamps are
//! unix epoch seconds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::identifiers::CommandId;
use crate::identifiers::EventId;
use crate::identifiers::SessionId;
use crate::identifiers::UserName;
use crate::identifiers::WraithId;

// ============================================================================
// SECTION: Privileges
// ============================================================================

/// Operator privilege level.
///
/// # Invariants
/// - Stored in the database as the stable integers 0, 1, and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeLevel {
    /// Ordinary operator.
    User,
    /// Administrator.
    Admin,
    /// Super administrator; at least one exists after bootstrap.
    SuperAdmin,
}

impl PrivilegeLevel {
    /// Returns the stable database integer for this level.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::User => 0,
            Self::Admin => 1,
            Self::SuperAdmin => 2,
        }
    }

    /// Decodes a stored database integer (returns `None` when unknown).
    #[must_use]
    pub const fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::User),
            1 => Some(Self::Admin),
            2 => Some(Self::SuperAdmin),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Wraiths
// ============================================================================

/// One connected Wraith agent.
///
/// # Invariants
/// - `assigned_id` is unique and immutable after creation.
/// - `last_heartbeat_at` drives the offline expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WraithRecord {
    /// Identifier assigned at check-in.
    pub assigned_id: WraithId,
    /// Opaque serialized host properties.
    pub host_properties: String,
    /// Opaque serialized agent properties.
    pub wraith_properties: String,
    /// Unix seconds of the last heartbeat.
    pub last_heartbeat_at: i64,
    /// Identifiers of commands issued to this agent.
    pub issued_commands: Vec<String>,
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Request to issue a command to a set of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommand {
    /// Command name understood by the agents.
    pub name: String,
    /// Opaque serialized command parameters.
    pub params: String,
    /// Assigned identifiers of the targeted agents.
    pub targets: Vec<String>,
}

/// One issued command and its accumulated responses.
///
/// # Invariants
/// - `command_id` is unique and immutable after creation.
/// - `responses` only grows; entries are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Identifier assigned at issue time.
    pub command_id: CommandId,
    /// Command name understood by the agents.
    pub name: String,
    /// Opaque serialized command parameters.
    pub params: String,
    /// Assigned identifiers of the targeted agents.
    pub targets: Vec<String>,
    /// Responses accumulated from the targeted agents.
    pub responses: Vec<String>,
    /// Unix seconds when the command was issued.
    pub time_issued: i64,
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// Request to create an operator account.
///
/// # Invariants
/// - `password` is plaintext here and hashed before it reaches storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Account name.
    pub user_name: UserName,
    /// Plaintext password, consumed by the hashing path.
    pub password: String,
    /// Privilege level for the new account.
    pub privilege: PrivilegeLevel,
}

/// One operator account row.
///
/// # Invariants
/// - `password_hash` is a PHC-format hash string, never a plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Account name, the primary key.
    pub user_name: UserName,
    /// Salted adaptive password hash.
    pub password_hash: String,
    /// Privilege level.
    pub privilege: PrivilegeLevel,
    /// Consecutive failed login attempts.
    pub failed_logins: i64,
    /// Unix seconds when the lockout window started (0 when clear).
    pub failed_logins_timeout_start: i64,
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

/// Credentials for a freshly created management session.
///
/// # Invariants
/// - `session_token` is the bearer credential; it is returned exactly once
///   and is not recoverable in plaintext through any query surface intended
///   for the session holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Identifier of the created session.
    pub session_id: SessionId,
    /// High-entropy bearer token for the session holder.
    pub session_token: String,
}

/// One management login session row.
///
/// # Invariants
/// - `session_id` is unique and immutable after creation.
/// - `user_name` references a user by value; no foreign key is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier, the primary key.
    pub session_id: SessionId,
    /// Account name the session belongs to.
    pub user_name: UserName,
    /// High-entropy bearer token.
    pub session_token: String,
    /// Unix seconds of the last session heartbeat.
    pub last_heartbeat_at: i64,
}

// ============================================================================
// SECTION: Events
// ============================================================================

/// One append-only audit history event.
///
/// # Invariants
/// - `event_id` is unique and immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Identifier assigned when the event was recorded.
    pub event_id: EventId,
    /// Event type label.
    pub event_type: String,
    /// Unix seconds when the event was recorded.
    pub event_time: i64,
    /// Opaque serialized event properties.
    pub event_properties: String,
}
