// crates/wraith-core/src/errors.rs
// ============================================================================
// Module: Wraith Store Errors
// Description: Error taxonomy for the persistence layer.
// Purpose: Define the stable error surface shared by storage backends and callers.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The persistence layer distinguishes caller programming errors (filter
//! fields outside an entity's column set), engine failures (propagated
//! unchanged, never masked), bootstrap failures (the init sequence aborts
//! without cleanup), and malformed stored data. "Record not found" is not an
//! error anywhere in this layer: lookups return empty result shapes and the
//! caller inspects them. Lock contention during transaction acquisition is
//! handled internally by retry and never surfaces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Persistence layer errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Db` messages carry the engine error text unchanged.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// A filter referenced a column outside the entity's legal set; always a
    /// programming error at the call site.
    #[error("filter references unknown column: {0}")]
    InvalidFilterField(String),
    /// Underlying database engine error, propagated unchanged.
    #[error("database operation failed: {0}")]
    Db(String),
    /// A bootstrap statement failed; the remaining init sequence was aborted
    /// and no cleanup was attempted.
    #[error("store bootstrap failed: {0}")]
    Bootstrap(String),
    /// Stored data did not decode to its semantic shape.
    #[error("store data invalid: {0}")]
    Invalid(String),
    /// Store path or filesystem error.
    #[error("store io error: {0}")]
    Io(String),
    /// Password hashing backend failure.
    #[error("password hashing failed: {0}")]
    Hash(String),
}
