// crates/wraith-store-sqlite/src/events.rs
// ============================================================================
// Module: Event Repository
// Description: Append-only audit history.
// Purpose: Record operator- and agent-facing events for later inspection.
// Dependencies: wraith-core, rusqlite, rand (via store helpers)
// ============================================================================

//! ## Overview
//! Repository over the `event_history` table. Events are appended with a
//! generated identifier and the current time; existing rows are never
//! updated. Removal exists for history pruning only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::params;
use rusqlite::params_from_iter;
use wraith_core::EventId;
use wraith_core::EventRecord;
use wraith_core::StoreError;

use crate::filter::Filter;
use crate::filter::FilterColumn;
use crate::filter::Page;
use crate::store::WraithStore;
use crate::store::random_hex;
use crate::store::unix_seconds;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Byte length of generated event identifiers (hex doubles it).
const EVENT_ID_BYTES: usize = 8;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `event_history` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventColumn {
    /// `event_id` primary key.
    EventId,
    /// Event type label.
    EventType,
    /// Unix seconds when the event was recorded.
    EventTime,
    /// Opaque serialized event properties.
    EventProperties,
}

impl FilterColumn for EventColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::EventId => "event_id",
            Self::EventType => "event_type",
            Self::EventTime => "event_time",
            Self::EventProperties => "event_properties",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "event_id" => Ok(Self::EventId),
            "event_type" => Ok(Self::EventType),
            "event_time" => Ok(Self::EventTime),
            "event_properties" => Ok(Self::EventProperties),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository over the audit event history.
#[derive(Debug, Clone, Copy)]
pub struct EventRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> EventRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Appends one event and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn record(&self, event_type: &str, properties: &str) -> Result<EventId, StoreError> {
        let event_id = EventId::new(random_hex(EVENT_ID_BYTES));
        self.store.execute(
            "INSERT INTO event_history (event_id, event_type, event_time, event_properties)
             VALUES (?1, ?2, ?3, ?4)",
            params![event_id.as_str(), event_type, unix_seconds(), properties],
        )?;
        Ok(event_id)
    }

    /// Returns matching events keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn get(
        &self,
        filter: &Filter<EventColumn>,
        page: Page,
    ) -> Result<BTreeMap<EventId, EventRecord>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!(
            "SELECT event_id, event_type, event_time, event_properties FROM event_history{}",
            fragment.clause
        );
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let event_id: String = row.get(0)?;
            let event_type: String = row.get(1)?;
            let event_time: i64 = row.get(2)?;
            let event_properties: String = row.get(3)?;
            Ok((event_id, event_type, event_time, event_properties))
        })?;
        let mut events = BTreeMap::new();
        for (event_id, event_type, event_time, event_properties) in rows {
            let id = EventId::new(event_id);
            events.insert(id.clone(), EventRecord {
                event_id: id,
                event_type,
                event_time,
                event_properties,
            });
        }
        Ok(events)
    }

    /// Deletes matching events and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn remove(&self, filter: &Filter<EventColumn>, page: Page) -> Result<usize, StoreError> {
        let fragment = filter.to_sql(page)?;
        // rowid subselect keeps LIMIT/OFFSET usable without the
        // UPDATE/DELETE-LIMIT compile option.
        let sql = format!(
            "DELETE FROM event_history WHERE rowid IN (SELECT rowid FROM event_history{})",
            fragment.clause
        );
        self.store.execute(&sql, params_from_iter(fragment.params))
    }
}
