// crates/wraith-store-sqlite/src/commands.rs
// ============================================================================
// Module: Command Repository
// Description: Issue, query, and delete commands dispatched to agents.
// Purpose: Track instructions and accumulate agent responses over time.
// Dependencies: wraith-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Repository over the `commands` table. Issuing a command assigns a random
//! identifier, stamps the issue time, and starts with an empty response
//! list; responses from targeted agents accumulate one at a time through
//! [`CommandRepo::append_response`]. Target and response lists are stored as
//! JSON text and decoded at the repository boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use rusqlite::params;
use rusqlite::params_from_iter;
use wraith_core::CommandId;
use wraith_core::CommandRecord;
use wraith_core::NewCommand;
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

/// Byte length of generated command identifiers (hex doubles it).
const COMMAND_ID_BYTES: usize = 8;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `commands` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandColumn {
    /// `command_id` primary key.
    CommandId,
    /// Command name understood by the agents.
    CommandName,
    /// Opaque serialized command parameters.
    CommandParams,
    /// JSON list of targeted agent identifiers.
    CommandTargets,
    /// JSON list of accumulated responses.
    CommandResponses,
    /// Unix seconds when the command was issued.
    TimeIssued,
}

impl FilterColumn for CommandColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::CommandId => "command_id",
            Self::CommandName => "command_name",
            Self::CommandParams => "command_params",
            Self::CommandTargets => "command_targets",
            Self::CommandResponses => "command_responses",
            Self::TimeIssued => "time_issued",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "command_id" => Ok(Self::CommandId),
            "command_name" => Ok(Self::CommandName),
            "command_params" => Ok(Self::CommandParams),
            "command_targets" => Ok(Self::CommandTargets),
            "command_responses" => Ok(Self::CommandResponses),
            "time_issued" => Ok(Self::TimeIssued),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository over issued commands.
#[derive(Debug, Clone, Copy)]
pub struct CommandRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> CommandRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Issues one command to a target set and returns the assigned
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the target list cannot be serialized or
    /// the insert fails.
    pub fn add(&self, command: &NewCommand) -> Result<CommandId, StoreError> {
        let command_id = CommandId::new(random_hex(COMMAND_ID_BYTES));
        let targets = serde_json::to_string(&command.targets)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        self.store.execute(
            "INSERT INTO commands (
                command_id, command_name, command_params, command_targets, command_responses,
                time_issued
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                command_id.as_str(),
                command.name,
                command.params,
                targets,
                "[]",
                unix_seconds()
            ],
        )?;
        Ok(command_id)
    }

    /// Appends one agent response to an issued command.
    ///
    /// Returns false when the command does not exist; responses are
    /// append-only and never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on engine failure or an undecodable stored
    /// response list.
    pub fn append_response(
        &self,
        command_id: &CommandId,
        response: &str,
    ) -> Result<bool, StoreError> {
        let stored: Option<String> = self.store.query_value(
            "SELECT command_responses FROM commands WHERE command_id = ?1",
            params![command_id.as_str()],
        )?;
        let Some(stored) = stored else {
            return Ok(false);
        };
        let mut responses: Vec<String> = serde_json::from_str(&stored).map_err(|err| {
            StoreError::Invalid(format!("command_responses for command {command_id}: {err}"))
        })?;
        responses.push(response.to_string());
        let updated = serde_json::to_string(&responses)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        self.store.execute(
            "UPDATE commands SET command_responses = ?1 WHERE command_id = ?2",
            params![updated, command_id.as_str()],
        )?;
        Ok(true)
    }

    /// Deletes matching commands and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn remove(&self, filter: &Filter<CommandColumn>, page: Page) -> Result<usize, StoreError> {
        let fragment = filter.to_sql(page)?;
        // rowid subselect keeps LIMIT/OFFSET usable without the
        // UPDATE/DELETE-LIMIT compile option.
        let sql = format!(
            "DELETE FROM commands WHERE rowid IN (SELECT rowid FROM commands{})",
            fragment.clause
        );
        self.store.execute(&sql, params_from_iter(fragment.params))
    }

    /// Returns matching commands keyed by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation, engine failure, or an
    /// undecodable stored list column.
    pub fn get(
        &self,
        filter: &Filter<CommandColumn>,
        page: Page,
    ) -> Result<BTreeMap<CommandId, CommandRecord>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!(
            "SELECT command_id, command_name, command_params, command_targets, \
             command_responses, time_issued FROM commands{}",
            fragment.clause
        );
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let command_id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let params_blob: String = row.get(2)?;
            let targets: String = row.get(3)?;
            let responses: String = row.get(4)?;
            let time_issued: i64 = row.get(5)?;
            Ok((command_id, name, params_blob, targets, responses, time_issued))
        })?;
        let mut commands = BTreeMap::new();
        for (command_id, name, params_blob, targets_raw, responses_raw, time_issued) in rows {
            let targets: Vec<String> = serde_json::from_str(&targets_raw).map_err(|err| {
                StoreError::Invalid(format!("command_targets for command {command_id}: {err}"))
            })?;
            let responses: Vec<String> =
                serde_json::from_str(&responses_raw).map_err(|err| {
                    StoreError::Invalid(format!(
                        "command_responses for command {command_id}: {err}"
                    ))
                })?;
            let id = CommandId::new(command_id);
            commands.insert(id.clone(), CommandRecord {
                command_id: id,
                name,
                params: params_blob,
                targets,
                responses,
                time_issued,
            });
        }
        Ok(commands)
    }
}
