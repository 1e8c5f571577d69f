// crates/wraith-store-sqlite/src/settings.rs
// ============================================================================
// Module: Settings and Stats Repositories
// Description: Flat key/value stores for runtime settings and counters.
// Purpose: Serve string-typed configuration and statistics rows.
// Dependencies: wraith-core, rusqlite
// ============================================================================

//! ## Overview
//! Two flat string maps: `settings` (seeded at bootstrap, consulted by the
//! expiry sweeps and the API layer) and `stats` (free-form counters). Values
//! are always strings; [`SettingsRepo::get_i64`] is the one decoding helper
//! this layer provides because the expiry sweeps need it. Writes are upserts
//! so a set followed by a get always round-trips, whether or not the key was
//! seeded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::params;
use rusqlite::params_from_iter;
use wraith_core::StoreError;

use crate::filter::Filter;
use crate::filter::FilterColumn;
use crate::filter::Page;
use crate::store::WraithStore;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `settings` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingColumn {
    /// Setting key.
    Key,
    /// Setting value.
    Value,
}

impl FilterColumn for SettingColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Value => "value",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "key" => Ok(Self::Key),
            "value" => Ok(Self::Value),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Settings Repository
// ============================================================================

/// Repository over runtime settings.
#[derive(Debug, Clone, Copy)]
pub struct SettingsRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> SettingsRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Returns matching settings as a flat key-to-value map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn get(
        &self,
        filter: &Filter<SettingColumn>,
        page: Page,
    ) -> Result<BTreeMap<String, String>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!("SELECT key, value FROM settings{}", fragment.clause);
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((key, value))
        })?;
        Ok(rows.into_iter().collect())
    }

    /// Returns one setting value, or `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.query_value("SELECT value FROM settings WHERE key = ?1", params![key])
    }

    /// Returns one numeric setting, decoded from its string value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the key is absent or the value
    /// does not parse as an integer, [`StoreError::Db`] on engine failure.
    pub fn get_i64(&self, key: &str) -> Result<i64, StoreError> {
        let value = self
            .get_value(key)?
            .ok_or_else(|| StoreError::Invalid(format!("setting not present: {key}")))?;
        value
            .parse()
            .map_err(|_| StoreError::Invalid(format!("setting {key} is not an integer: {value}")))
    }

    /// Writes one setting, inserting or replacing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Stats Repository
// ============================================================================

/// Repository over free-form counters.
#[derive(Debug, Clone, Copy)]
pub struct StatsRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> StatsRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Returns every counter as a flat key-to-value map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn get(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let rows = self.store.query_rows("SELECT key, value FROM stats", params![], |row| {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            Ok((key, value))
        })?;
        Ok(rows.into_iter().collect())
    }

    /// Writes one counter, inserting or replacing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.execute(
            "INSERT INTO stats (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}
