// crates/wraith-store-sqlite/src/wraiths.rs
// ============================================================================
// Module: Wraith Repository
// Description: CRUD and heartbeat lifecycle for connected agents.
// Purpose: Track active Wraiths and expire the ones that stopped reporting.
// Dependencies: wraith-core, rusqlite, serde_json, tracing
// ============================================================================

//! ## Overview
//! Repository over the `wraiths` table. Agents are created at check-in,
//! refreshed by heartbeats, and removed either explicitly or by the staleness
//! sweep. The offline threshold is read fresh from Settings on every sweep so
//! operators can tune it without restarting anything.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::params;
use rusqlite::params_from_iter;
use tracing::debug;
use wraith_core::StoreError;
use wraith_core::WraithId;
use wraith_core::WraithRecord;
use wraith_core::settings::WRAITH_MARK_OFFLINE_DELAY;

use crate::filter::Filter;
use crate::filter::FilterColumn;
use crate::filter::Page;
use crate::store::WraithStore;
use crate::store::unix_seconds;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `wraiths` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WraithColumn {
    /// `assigned_id` primary key.
    AssignedId,
    /// Opaque serialized host properties.
    HostProperties,
    /// Opaque serialized agent properties.
    WraithProperties,
    /// Unix seconds of the last heartbeat.
    LastHeartbeatAt,
    /// JSON list of issued command identifiers.
    IssuedCommands,
}

impl FilterColumn for WraithColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::AssignedId => "assigned_id",
            Self::HostProperties => "host_properties",
            Self::WraithProperties => "wraith_properties",
            Self::LastHeartbeatAt => "last_heartbeat_at",
            Self::IssuedCommands => "issued_commands",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "assigned_id" => Ok(Self::AssignedId),
            "host_properties" => Ok(Self::HostProperties),
            "wraith_properties" => Ok(Self::WraithProperties),
            "last_heartbeat_at" => Ok(Self::LastHeartbeatAt),
            "issued_commands" => Ok(Self::IssuedCommands),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository over connected Wraith agents.
#[derive(Debug, Clone, Copy)]
pub struct WraithRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> WraithRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Inserts one Wraith row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure (including a duplicate
    /// `assigned_id`).
    pub fn add(&self, wraith: &WraithRecord) -> Result<(), StoreError> {
        let issued_commands = serde_json::to_string(&wraith.issued_commands)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        self.store.execute(
            "INSERT INTO wraiths (
                assigned_id, host_properties, wraith_properties, last_heartbeat_at,
                issued_commands
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                wraith.assigned_id.as_str(),
                wraith.host_properties,
                wraith.wraith_properties,
                wraith.last_heartbeat_at,
                issued_commands
            ],
        )?;
        Ok(())
    }

    /// Deletes matching Wraiths and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn remove(&self, filter: &Filter<WraithColumn>, page: Page) -> Result<usize, StoreError> {
        let fragment = filter.to_sql(page)?;
        // rowid subselect keeps LIMIT/OFFSET usable without the
        // UPDATE/DELETE-LIMIT compile option.
        let sql = format!(
            "DELETE FROM wraiths WHERE rowid IN (SELECT rowid FROM wraiths{})",
            fragment.clause
        );
        self.store.execute(&sql, params_from_iter(fragment.params))
    }

    /// Returns matching Wraiths keyed by assigned identifier.
    ///
    /// An unknown identifier simply yields an empty map; absence is a result
    /// shape here, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation, engine failure, or an
    /// undecodable stored command list.
    pub fn get(
        &self,
        filter: &Filter<WraithColumn>,
        page: Page,
    ) -> Result<BTreeMap<WraithId, WraithRecord>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!(
            "SELECT assigned_id, host_properties, wraith_properties, last_heartbeat_at, \
             issued_commands FROM wraiths{}",
            fragment.clause
        );
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let assigned_id: String = row.get(0)?;
            let host_properties: String = row.get(1)?;
            let wraith_properties: String = row.get(2)?;
            let last_heartbeat_at: i64 = row.get(3)?;
            let issued_commands: String = row.get(4)?;
            Ok((assigned_id, host_properties, wraith_properties, last_heartbeat_at, issued_commands))
        })?;
        let mut wraiths = BTreeMap::new();
        for (assigned_id, host_properties, wraith_properties, last_heartbeat_at, issued_raw) in rows
        {
            let issued_commands: Vec<String> = serde_json::from_str(&issued_raw).map_err(|err| {
                StoreError::Invalid(format!("issued_commands for wraith {assigned_id}: {err}"))
            })?;
            let id = WraithId::new(assigned_id);
            wraiths.insert(id.clone(), WraithRecord {
                assigned_id: id,
                host_properties,
                wraith_properties,
                last_heartbeat_at,
                issued_commands,
            });
        }
        Ok(wraiths)
    }

    /// Sets the heartbeat of one Wraith to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure. An unknown identifier
    /// affects zero rows and is not an error.
    pub fn update_last_heartbeat(&self, assigned_id: &WraithId) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE wraiths SET last_heartbeat_at = ?1 WHERE assigned_id = ?2",
            params![unix_seconds(), assigned_id.as_str()],
        )?;
        Ok(())
    }

    /// Deletes every Wraith whose heartbeat predates the offline threshold
    /// and returns the deleted count.
    ///
    /// The threshold setting is read on every call, not cached.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on engine failure or a missing/garbage
    /// threshold setting.
    pub fn expire_stale(&self) -> Result<usize, StoreError> {
        let delay = self.store.settings().get_i64(WRAITH_MARK_OFFLINE_DELAY)?;
        let earliest_valid = unix_seconds() - delay;
        let removed = self.store.execute(
            "DELETE FROM wraiths WHERE last_heartbeat_at < ?1",
            params![earliest_valid],
        )?;
        if removed > 0 {
            debug!(removed, "expired offline wraiths");
        }
        Ok(removed)
    }
}
