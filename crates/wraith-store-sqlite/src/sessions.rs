// crates/wraith-store-sqlite/src/sessions.rs
// ============================================================================
// Module: Session Repository
// Description: Management login sessions, expiry, and key rotation.
// Purpose: Track ephemeral operator sessions and rotate the first-layer key.
// Dependencies: wraith-core, rusqlite, rand (via store helpers), tracing
// ============================================================================

//! ## Overview
//! Repository over the `sessions` table. Creating a session generates the
//! identifier and the bearer token; both are returned to the caller once,
//! since the token is the credential the management client presents from
//! then on. Sessions expire by heartbeat staleness against the
//! `managementSessionExpiryDelay` setting, read fresh on every sweep.
//!
//! The first-layer management key can only rotate while no session exists:
//! rotating under a live session would invalidate its traffic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::params;
use rusqlite::params_from_iter;
use tracing::debug;
use wraith_core::NewSession;
use wraith_core::SessionId;
use wraith_core::SessionRecord;
use wraith_core::StoreError;
use wraith_core::UserName;
use wraith_core::settings::MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY;
use wraith_core::settings::MANAGEMENT_SESSION_EXPIRY_DELAY;

use crate::filter::Filter;
use crate::filter::FilterColumn;
use crate::filter::Page;
use crate::store::WraithStore;
use crate::store::random_hex;
use crate::store::unix_seconds;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Byte length of generated session identifiers (hex doubles it).
const SESSION_ID_BYTES: usize = 8;
/// Byte length of generated bearer tokens (hex doubles it).
const SESSION_TOKEN_BYTES: usize = 25;
/// Byte length of the rotated first-layer management key (hex doubles it).
const MANAGEMENT_KEY_BYTES: usize = 25;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `sessions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionColumn {
    /// `session_id` primary key.
    SessionId,
    /// Account name the session belongs to.
    UserName,
    /// High-entropy bearer token.
    SessionToken,
    /// Unix seconds of the last session heartbeat.
    LastHeartbeatAt,
}

impl FilterColumn for SessionColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::SessionId => "session_id",
            Self::UserName => "user_name",
            Self::SessionToken => "session_token",
            Self::LastHeartbeatAt => "last_heartbeat_at",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "session_id" => Ok(Self::SessionId),
            "user_name" => Ok(Self::UserName),
            "session_token" => Ok(Self::SessionToken),
            "last_heartbeat_at" => Ok(Self::LastHeartbeatAt),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository over management login sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> SessionRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Creates a session for an operator and returns its identifier and
    /// bearer token.
    ///
    /// The referenced account is taken on trust by value; callers wanting a
    /// referential check consult the users repository first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn add(&self, user_name: &UserName) -> Result<NewSession, StoreError> {
        let session_id = SessionId::new(random_hex(SESSION_ID_BYTES));
        let session_token = random_hex(SESSION_TOKEN_BYTES);
        self.store.execute(
            "INSERT INTO sessions (session_id, user_name, session_token, last_heartbeat_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id.as_str(), user_name.as_str(), session_token, unix_seconds()],
        )?;
        Ok(NewSession {
            session_id,
            session_token,
        })
    }

    /// Deletes matching sessions and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn remove(&self, filter: &Filter<SessionColumn>, page: Page) -> Result<usize, StoreError> {
        let fragment = filter.to_sql(page)?;
        // rowid subselect keeps LIMIT/OFFSET usable without the
        // UPDATE/DELETE-LIMIT compile option.
        let sql = format!(
            "DELETE FROM sessions WHERE rowid IN (SELECT rowid FROM sessions{})",
            fragment.clause
        );
        self.store.execute(&sql, params_from_iter(fragment.params))
    }

    /// Returns matching sessions keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn get(
        &self,
        filter: &Filter<SessionColumn>,
        page: Page,
    ) -> Result<BTreeMap<SessionId, SessionRecord>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!(
            "SELECT session_id, user_name, session_token, last_heartbeat_at FROM sessions{}",
            fragment.clause
        );
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let session_id: String = row.get(0)?;
            let user_name: String = row.get(1)?;
            let session_token: String = row.get(2)?;
            let last_heartbeat_at: i64 = row.get(3)?;
            Ok((session_id, user_name, session_token, last_heartbeat_at))
        })?;
        let mut sessions = BTreeMap::new();
        for (session_id, user_name, session_token, last_heartbeat_at) in rows {
            let id = SessionId::new(session_id);
            sessions.insert(id.clone(), SessionRecord {
                session_id: id,
                user_name: UserName::new(user_name),
                session_token,
                last_heartbeat_at,
            });
        }
        Ok(sessions)
    }

    /// Sets the heartbeat of one session to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure. An unknown identifier
    /// affects zero rows and is not an error.
    pub fn update_last_heartbeat(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE sessions SET last_heartbeat_at = ?1 WHERE session_id = ?2",
            params![unix_seconds(), session_id.as_str()],
        )?;
        Ok(())
    }

    /// Deletes every session whose heartbeat predates the expiry threshold
    /// and returns the deleted count.
    ///
    /// The threshold setting is read on every call, not cached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on engine failure or a missing/garbage
    /// threshold setting.
    pub fn expire_stale(&self) -> Result<usize, StoreError> {
        let delay = self.store.settings().get_i64(MANAGEMENT_SESSION_EXPIRY_DELAY)?;
        let earliest_valid = unix_seconds() - delay;
        let removed = self.store.execute(
            "DELETE FROM sessions WHERE last_heartbeat_at < ?1",
            params![earliest_valid],
        )?;
        if removed > 0 {
            debug!(removed, "expired stale management sessions");
        }
        Ok(removed)
    }

    /// Returns the number of active sessions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn count(&self) -> Result<i64, StoreError> {
        let count: Option<i64> =
            self.store.query_value("SELECT COUNT(1) FROM sessions", params![])?;
        Ok(count.unwrap_or(0))
    }

    /// Replaces the first-layer management key with a fresh random value,
    /// but only while zero sessions exist.
    ///
    /// Returns true when the key was rotated. Rotation under a live session
    /// would invalidate it, so a non-empty table leaves the key untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on engine failure.
    pub fn regenerate_management_key_if_no_sessions(&self) -> Result<bool, StoreError> {
        if self.count()? > 0 {
            return Ok(false);
        }
        self.store
            .settings()
            .set(MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY, &random_hex(MANAGEMENT_KEY_BYTES))?;
        debug!("rotated first-layer management key");
        Ok(true)
    }
}
