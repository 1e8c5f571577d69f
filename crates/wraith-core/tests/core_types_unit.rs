// crates/wraith-core/tests/core_types_unit.rs
// ============================================================================
// Module: Core Type Unit Tests
// Description: Targeted tests for identifiers and privilege decoding.
// Purpose: Validate stable integer mapping and identifier wire forms.
// ============================================================================

//! ## Overview
//! Unit-level tests for core vocabulary types:
//! - Privilege levels map to stable integers in both directions
//! - Unknown privilege integers decode to `None`
//! - Identifiers round-trip through their string forms

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    reason = "Test-only assertions and helpers are permitted."
)]

use wraith_core::PrivilegeLevel;
use wraith_core::SessionId;
use wraith_core::UserName;
use wraith_core::WraithId;

#[test]
fn privilege_levels_round_trip_their_integers() {
    for level in [PrivilegeLevel::User, PrivilegeLevel::Admin, PrivilegeLevel::SuperAdmin] {
        assert_eq!(PrivilegeLevel::from_i64(level.as_i64()), Some(level));
    }
    assert_eq!(PrivilegeLevel::User.as_i64(), 0);
    assert_eq!(PrivilegeLevel::Admin.as_i64(), 1);
    assert_eq!(PrivilegeLevel::SuperAdmin.as_i64(), 2);
}

#[test]
fn unknown_privilege_integer_decodes_to_none() {
    assert_eq!(PrivilegeLevel::from_i64(-1), None);
    assert_eq!(PrivilegeLevel::from_i64(3), None);
}

#[test]
fn privilege_ordering_follows_authority() {
    assert!(PrivilegeLevel::User < PrivilegeLevel::Admin);
    assert!(PrivilegeLevel::Admin < PrivilegeLevel::SuperAdmin);
}

#[test]
fn identifiers_round_trip_string_forms() {
    let wraith = WraithId::new("w-1");
    assert_eq!(wraith.as_str(), "w-1");
    assert_eq!(wraith.to_string(), "w-1");
    assert_eq!(WraithId::from("w-1"), wraith);

    let session = SessionId::from("s-1".to_string());
    assert_eq!(session.as_str(), "s-1");

    let name = UserName::new("SuperAdmin");
    assert_eq!(name.to_string(), "SuperAdmin");
}
