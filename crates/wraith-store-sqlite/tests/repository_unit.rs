// crates/wraith-store-sqlite/tests/repository_unit.rs
// ============================================================================
// Module: Entity Repository Unit Tests
// Description: Behavior tests for the per-entity repositories.
// Purpose: Validate CRUD round-trips, heartbeat expiry, credential handling,
//          response accumulation, and key rotation gating.
// ============================================================================

//! ## Overview
//! Behavior tests against a real store file per test:
//! - Wraiths: round-trip, heartbeat refresh, staleness boundary, pagination
//! - Users: hashing, verification, single-field updates, lockout counters
//! - Sessions: creation credentials, expiry via stubbed setting, rotation gate
//! - Settings/Stats: upsert round-trips and numeric decoding
//! - Commands: issue, response accumulation, filtered delete
//! - Events: append and filtered query

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

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tempfile::TempDir;
use wraith_core::CommandId;
use wraith_core::NewCommand;
use wraith_core::NewUser;
use wraith_core::PrivilegeLevel;
use wraith_core::StoreError;
use wraith_core::UserName;
use wraith_core::WraithId;
use wraith_core::WraithRecord;
use wraith_core::settings::MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY;
use wraith_core::settings::MANAGEMENT_SESSION_EXPIRY_DELAY;
use wraith_store_sqlite::CommandColumn;
use wraith_store_sqlite::EventColumn;
use wraith_store_sqlite::Filter;
use wraith_store_sqlite::Page;
use wraith_store_sqlite::SessionColumn;
use wraith_store_sqlite::SettingColumn;
use wraith_store_sqlite::StoreConfig;
use wraith_store_sqlite::UserColumn;
use wraith_store_sqlite::WraithColumn;
use wraith_store_sqlite::WraithStore;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(dir: &TempDir) -> WraithStore {
    WraithStore::open(&StoreConfig::new(dir.path().join("wraith.db"))).expect("store open")
}

fn now_seconds() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("clock");
    i64::try_from(now.as_secs()).expect("timestamp range")
}

fn wraith_with_heartbeat(id: &str, last_heartbeat_at: i64) -> WraithRecord {
    WraithRecord {
        assigned_id: WraithId::new(id),
        host_properties: "{\"os\":\"linux\"}".to_string(),
        wraith_properties: "{\"version\":\"4\"}".to_string(),
        last_heartbeat_at,
        issued_commands: vec!["cmd-1".to_string()],
    }
}

fn new_user(name: &str, password: &str, privilege: PrivilegeLevel) -> NewUser {
    NewUser {
        user_name: UserName::new(name),
        password: password.to_string(),
        privilege,
    }
}

// ============================================================================
// SECTION: Wraiths
// ============================================================================

#[test]
fn wraith_round_trips_with_issued_commands() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let wraith = wraith_with_heartbeat("w-1", 123);
    store.wraiths().add(&wraith).expect("add");
    let wraiths = store
        .wraiths()
        .get(&Filter::new().with(WraithColumn::AssignedId, ["w-1"]), Page::ALL)
        .expect("get");
    assert_eq!(wraiths.len(), 1);
    assert_eq!(wraiths.get(&WraithId::new("w-1")), Some(&wraith));
}

#[test]
fn wraith_lookup_of_unknown_id_yields_empty_map() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let wraiths = store
        .wraiths()
        .get(&Filter::new().with(WraithColumn::AssignedId, ["missing"]), Page::ALL)
        .expect("get");
    assert!(wraiths.is_empty());
}

#[test]
fn heartbeat_update_moves_to_current_time() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = WraithId::new("w-hb");
    store.wraiths().add(&wraith_with_heartbeat("w-hb", 0)).expect("add");
    let before = now_seconds();
    store.wraiths().update_last_heartbeat(&id).expect("heartbeat");
    let wraiths = store.wraiths().get(&Filter::new(), Page::ALL).expect("get");
    let updated = wraiths.get(&id).expect("row").last_heartbeat_at;
    assert!(updated >= before);
}

#[test]
fn expire_stale_removes_old_and_keeps_fresh_wraiths() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let now = now_seconds();
    // Seeded offline delay is 16 seconds.
    store.wraiths().add(&wraith_with_heartbeat("w-stale", now - 16 - 1)).expect("add stale");
    store.wraiths().add(&wraith_with_heartbeat("w-fresh", now)).expect("add fresh");
    let removed = store.wraiths().expire_stale().expect("expire");
    assert_eq!(removed, 1);
    let wraiths = store.wraiths().get(&Filter::new(), Page::ALL).expect("get");
    assert!(!wraiths.contains_key(&WraithId::new("w-stale")));
    assert!(wraiths.contains_key(&WraithId::new("w-fresh")));
}

#[test]
fn remove_honors_limit_pagination() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    for id in ["w-a", "w-b", "w-c"] {
        store.wraiths().add(&wraith_with_heartbeat(id, 0)).expect("add");
    }
    let removed = store.wraiths().remove(&Filter::new(), Page::new(2, -1)).expect("remove");
    assert_eq!(removed, 2);
    let left = store.wraiths().get(&Filter::new(), Page::ALL).expect("get");
    assert_eq!(left.len(), 1);
}

// ============================================================================
// SECTION: Users
// ============================================================================

#[test]
fn stored_password_is_hashed_and_verifies() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.users().add(&new_user("op", "hunter2", PrivilegeLevel::User)).expect("add");
    let name = UserName::new("op");
    let users = store.users().get(&Filter::new(), Page::ALL).expect("get");
    let row = users.get(&name).expect("row");
    assert_ne!(row.password_hash, "hunter2");
    assert!(row.password_hash.starts_with("$argon2"));
    assert!(store.users().verify_password(&name, "hunter2").expect("verify"));
    assert!(!store.users().verify_password(&name, "hunter3").expect("verify"));
}

#[test]
fn verify_password_for_unknown_user_is_false() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    assert!(!store.users().verify_password(&UserName::new("ghost"), "pw").expect("verify"));
}

#[test]
fn duplicate_user_name_is_an_engine_error() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.users().add(&new_user("dup", "pw", PrivilegeLevel::User)).expect("add");
    let result = store.users().add(&new_user("dup", "pw2", PrivilegeLevel::User));
    assert!(matches!(result, Err(StoreError::Db(_))));
}

#[test]
fn change_password_rehashes_and_verifies() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let name = UserName::new("op");
    store.users().add(&new_user("op", "old", PrivilegeLevel::Admin)).expect("add");
    store.users().change_password(&name, "new").expect("change");
    assert!(!store.users().verify_password(&name, "old").expect("verify"));
    assert!(store.users().verify_password(&name, "new").expect("verify"));
}

#[test]
fn change_user_name_and_privilege_update_single_fields() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.users().add(&new_user("before", "pw", PrivilegeLevel::User)).expect("add");
    store
        .users()
        .change_user_name(&UserName::new("before"), &UserName::new("after"))
        .expect("rename");
    store.users().change_privilege(&UserName::new("after"), PrivilegeLevel::Admin).expect("priv");
    let users = store
        .users()
        .get(&Filter::new().with(UserColumn::UserName, ["after"]), Page::ALL)
        .expect("get");
    let row = users.get(&UserName::new("after")).expect("row");
    assert_eq!(row.privilege, PrivilegeLevel::Admin);
    assert!(store.users().verify_password(&UserName::new("after"), "pw").expect("verify"));
}

#[test]
fn failed_login_counters_accumulate_and_clear() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let name = UserName::new("op");
    store.users().add(&new_user("op", "pw", PrivilegeLevel::User)).expect("add");
    store.users().record_failed_login(&name).expect("record");
    store.users().record_failed_login(&name).expect("record");
    let users = store.users().get(&Filter::new(), Page::ALL).expect("get");
    let row = users.get(&name).expect("row");
    assert_eq!(row.failed_logins, 2);
    assert!(row.failed_logins_timeout_start > 0);
    store.users().clear_failed_logins(&name).expect("clear");
    let users = store.users().get(&Filter::new(), Page::ALL).expect("get");
    let row = users.get(&name).expect("row");
    assert_eq!(row.failed_logins, 0);
    assert_eq!(row.failed_logins_timeout_start, 0);
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[test]
fn session_creation_returns_id_and_bearer_token() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let session = store.sessions().add(&UserName::new("SuperAdmin")).expect("add");
    assert_eq!(session.session_token.len(), 50);
    assert!(session.session_token.chars().all(|c| c.is_ascii_hexdigit()));
    let sessions = store.sessions().get(&Filter::new(), Page::ALL).expect("get");
    let row = sessions.get(&session.session_id).expect("row");
    assert_eq!(row.user_name, UserName::new("SuperAdmin"));
    assert_eq!(row.session_token, session.session_token);
}

#[test]
fn session_expiry_uses_the_setting_read_at_call_time() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let session = store.sessions().add(&UserName::new("SuperAdmin")).expect("add");
    // Seeded delay (12s) keeps a fresh session alive.
    assert_eq!(store.sessions().expire_stale().expect("expire"), 0);
    // A negative delay moves the cutoff into the future and reaps it.
    store.settings().set(MANAGEMENT_SESSION_EXPIRY_DELAY, "-2").expect("stub setting");
    assert_eq!(store.sessions().expire_stale().expect("expire"), 1);
    let sessions = store.sessions().get(&Filter::new(), Page::ALL).expect("get");
    assert!(!sessions.contains_key(&session.session_id));
}

#[test]
fn session_remove_by_id_filter() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let session = store.sessions().add(&UserName::new("SuperAdmin")).expect("add");
    let removed = store
        .sessions()
        .remove(
            &Filter::new().with(SessionColumn::SessionId, [session.session_id.as_str()]),
            Page::ALL,
        )
        .expect("remove");
    assert_eq!(removed, 1);
    assert_eq!(store.sessions().count().expect("count"), 0);
}

#[test]
fn management_key_rotates_only_without_sessions() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let original = store
        .settings()
        .get_value(MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY)
        .expect("setting")
        .expect("seeded key");

    store.sessions().add(&UserName::new("SuperAdmin")).expect("add");
    let rotated = store.sessions().regenerate_management_key_if_no_sessions().expect("attempt");
    assert!(!rotated);
    let unchanged = store
        .settings()
        .get_value(MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY)
        .expect("setting")
        .expect("seeded key");
    assert_eq!(unchanged, original);

    store.sessions().remove(&Filter::new(), Page::ALL).expect("clear sessions");
    let rotated = store.sessions().regenerate_management_key_if_no_sessions().expect("attempt");
    assert!(rotated);
    let replaced = store
        .settings()
        .get_value(MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY)
        .expect("setting")
        .expect("rotated key");
    assert_ne!(replaced, original);
    assert_eq!(replaced.len(), 50);
}

// ============================================================================
// SECTION: Settings and Stats
// ============================================================================

#[test]
fn setting_set_then_get_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.settings().set("customKey", "customValue").expect("set");
    let settings = store
        .settings()
        .get(&Filter::new().with(SettingColumn::Key, ["customKey"]), Page::ALL)
        .expect("get");
    assert_eq!(settings.len(), 1);
    assert_eq!(settings.get("customKey").map(String::as_str), Some("customValue"));
}

#[test]
fn setting_set_overwrites_existing_value() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.settings().set("APIPrefix", "X_").expect("set");
    assert_eq!(store.settings().get_value("APIPrefix").expect("get"), Some("X_".to_string()));
}

#[test]
fn numeric_setting_decoding_rejects_garbage() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    assert_eq!(store.settings().get_i64("managementSessionExpiryDelay").expect("get"), 12);
    store.settings().set("managementSessionExpiryDelay", "soon").expect("set");
    let result = store.settings().get_i64("managementSessionExpiryDelay");
    assert!(matches!(result, Err(StoreError::Invalid(_))));
    let missing = store.settings().get_i64("noSuchSetting");
    assert!(matches!(missing, Err(StoreError::Invalid(_))));
}

#[test]
fn stats_upsert_and_read_back() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.stats().set("totalCheckins", "1").expect("set");
    store.stats().set("totalCheckins", "2").expect("set");
    let stats = store.stats().get().expect("get");
    assert_eq!(stats.get("totalCheckins").map(String::as_str), Some("2"));
}

// ============================================================================
// SECTION: Commands
// ============================================================================

#[test]
fn issued_command_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let request = NewCommand {
        name: "shell".to_string(),
        params: "whoami".to_string(),
        targets: vec!["w-1".to_string(), "w-2".to_string()],
    };
    let command_id = store.commands().add(&request).expect("add");
    assert_eq!(command_id.as_str().len(), 16);
    let commands = store
        .commands()
        .get(&Filter::new().with(CommandColumn::CommandId, [command_id.as_str()]), Page::ALL)
        .expect("get");
    let row = commands.get(&command_id).expect("row");
    assert_eq!(row.name, "shell");
    assert_eq!(row.params, "whoami");
    assert_eq!(row.targets, request.targets);
    assert!(row.responses.is_empty());
    assert!(row.time_issued > 0);
}

#[test]
fn responses_accumulate_in_order() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let command_id = store
        .commands()
        .add(&NewCommand {
            name: "shell".to_string(),
            params: "id".to_string(),
            targets: vec!["w-1".to_string()],
        })
        .expect("add");
    assert!(store.commands().append_response(&command_id, "uid=0").expect("append"));
    assert!(store.commands().append_response(&command_id, "uid=1000").expect("append"));
    let commands = store.commands().get(&Filter::new(), Page::ALL).expect("get");
    let row = commands.get(&command_id).expect("row");
    assert_eq!(row.responses, vec!["uid=0".to_string(), "uid=1000".to_string()]);
}

#[test]
fn appending_to_unknown_command_reports_absence() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let appended =
        store.commands().append_response(&CommandId::new("missing"), "late").expect("append");
    assert!(!appended);
}

#[test]
fn commands_delete_by_name_filter() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    for name in ["shell", "shell", "upload"] {
        store
            .commands()
            .add(&NewCommand {
                name: name.to_string(),
                params: String::new(),
                targets: Vec::new(),
            })
            .expect("add");
    }
    let removed = store
        .commands()
        .remove(&Filter::new().with(CommandColumn::CommandName, ["shell"]), Page::ALL)
        .expect("remove");
    assert_eq!(removed, 2);
    let left = store.commands().get(&Filter::new(), Page::ALL).expect("get");
    assert_eq!(left.len(), 1);
}

// ============================================================================
// SECTION: Events
// ============================================================================

#[test]
fn events_append_and_query_by_type() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let event_id =
        store.events().record("wraithConnected", "{\"id\":\"w-1\"}").expect("record");
    store.events().record("userLogin", "{}").expect("record");
    let events = store
        .events()
        .get(&Filter::new().with(EventColumn::EventType, ["wraithConnected"]), Page::ALL)
        .expect("get");
    assert_eq!(events.len(), 1);
    let row = events.get(&event_id).expect("row");
    assert_eq!(row.event_properties, "{\"id\":\"w-1\"}");
    assert!(row.event_time > 0);
}

#[test]
fn events_prune_by_filter() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.events().record("noise", "{}").expect("record");
    store.events().record("noise", "{}").expect("record");
    store.events().record("signal", "{}").expect("record");
    let removed = store
        .events()
        .remove(&Filter::new().with(EventColumn::EventType, ["noise"]), Page::ALL)
        .expect("remove");
    assert_eq!(removed, 2);
    let left = store.events().get(&Filter::new(), Page::ALL).expect("get");
    assert_eq!(left.len(), 1);
}
