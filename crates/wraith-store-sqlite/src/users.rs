// crates/wraith-store-sqlite/src/users.rs
// ============================================================================
// Module: User Repository
// Description: Operator accounts, credential hashing, lockout counters.
// Purpose: Store operator credentials safely and verify them in constant time.
// Dependencies: wraith-core, rusqlite, argon2, tracing
// ============================================================================

//! ## Overview
//! Repository over the `users` table. Passwords are hashed with Argon2
//! (salted, adaptive) before they reach storage and verified through the
//! algorithm's constant-time verifier; the plaintext never touches SQL.
//! Brute-force lockout state lives in the row itself: this layer maintains
//! the counters, the API layer applies the policy thresholds seeded into
//! Settings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use argon2::Argon2;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use rusqlite::params;
use rusqlite::params_from_iter;
use tracing::warn;
use wraith_core::NewUser;
use wraith_core::PrivilegeLevel;
use wraith_core::StoreError;
use wraith_core::UserName;
use wraith_core::UserRecord;

use crate::filter::Filter;
use crate::filter::FilterColumn;
use crate::filter::Page;
use crate::store::WraithStore;
use crate::store::unix_seconds;

// ============================================================================
// SECTION: Columns
// ============================================================================

/// Filterable columns of the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    /// `user_name` primary key.
    UserName,
    /// Salted adaptive password hash.
    PasswordHash,
    /// Privilege level integer.
    Privilege,
    /// Consecutive failed login attempts.
    FailedLogins,
    /// Unix seconds when the lockout window started.
    FailedLoginsTimeoutStart,
}

impl FilterColumn for UserColumn {
    fn as_sql(self) -> &'static str {
        match self {
            Self::UserName => "user_name",
            Self::PasswordHash => "password_hash",
            Self::Privilege => "privilege",
            Self::FailedLogins => "failed_logins",
            Self::FailedLoginsTimeoutStart => "failed_logins_timeout_start",
        }
    }

    fn parse(name: &str) -> Result<Self, StoreError> {
        match name {
            "user_name" => Ok(Self::UserName),
            "password_hash" => Ok(Self::PasswordHash),
            "privilege" => Ok(Self::Privilege),
            "failed_logins" => Ok(Self::FailedLogins),
            "failed_logins_timeout_start" => Ok(Self::FailedLoginsTimeoutStart),
            other => Err(StoreError::InvalidFilterField(other.to_string())),
        }
    }
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// Repository over operator accounts.
#[derive(Debug, Clone, Copy)]
pub struct UserRepo<'a> {
    /// Owning store handle.
    store: &'a WraithStore,
}

impl<'a> UserRepo<'a> {
    /// Creates the repository view.
    pub(crate) const fn new(store: &'a WraithStore) -> Self {
        Self {
            store,
        }
    }

    /// Creates one operator account, hashing the password and zeroing the
    /// lockout counters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when hashing fails or the insert fails
    /// (including a duplicate name).
    pub fn add(&self, user: &NewUser) -> Result<(), StoreError> {
        let password_hash = hash_password(&user.password)?;
        self.store.execute(
            "INSERT INTO users (
                user_name, password_hash, privilege, failed_logins, failed_logins_timeout_start
             ) VALUES (?1, ?2, ?3, 0, 0)",
            params![user.user_name.as_str(), password_hash, user.privilege.as_i64()],
        )?;
        Ok(())
    }

    /// Deletes matching accounts and returns the deleted count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation or engine failure.
    pub fn remove(&self, filter: &Filter<UserColumn>, page: Page) -> Result<usize, StoreError> {
        let fragment = filter.to_sql(page)?;
        // rowid subselect keeps LIMIT/OFFSET usable without the
        // UPDATE/DELETE-LIMIT compile option.
        let sql = format!(
            "DELETE FROM users WHERE rowid IN (SELECT rowid FROM users{})",
            fragment.clause
        );
        self.store.execute(&sql, params_from_iter(fragment.params))
    }

    /// Returns matching accounts keyed by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filter translation, engine failure, or an
    /// unknown stored privilege integer.
    pub fn get(
        &self,
        filter: &Filter<UserColumn>,
        page: Page,
    ) -> Result<BTreeMap<UserName, UserRecord>, StoreError> {
        let fragment = filter.to_sql(page)?;
        let sql = format!(
            "SELECT user_name, password_hash, privilege, failed_logins, \
             failed_logins_timeout_start FROM users{}",
            fragment.clause
        );
        let rows = self.store.query_rows(&sql, params_from_iter(fragment.params), |row| {
            let user_name: String = row.get(0)?;
            let password_hash: String = row.get(1)?;
            let privilege: i64 = row.get(2)?;
            let failed_logins: i64 = row.get(3)?;
            let timeout_start: i64 = row.get(4)?;
            Ok((user_name, password_hash, privilege, failed_logins, timeout_start))
        })?;
        let mut users = BTreeMap::new();
        for (user_name, password_hash, privilege_raw, failed_logins, timeout_start) in rows {
            let privilege = PrivilegeLevel::from_i64(privilege_raw).ok_or_else(|| {
                StoreError::Invalid(format!(
                    "unknown privilege {privilege_raw} for user {user_name}"
                ))
            })?;
            let name = UserName::new(user_name);
            users.insert(name.clone(), UserRecord {
                user_name: name,
                password_hash,
                privilege,
                failed_logins,
                failed_logins_timeout_start: timeout_start,
            });
        }
        Ok(users)
    }

    /// Verifies a plaintext password against the stored hash.
    ///
    /// Returns false for an unknown account, a wrong password, or an
    /// unparseable stored hash; the comparison itself is the hash
    /// algorithm's constant-time verifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn verify_password(
        &self,
        user_name: &UserName,
        plaintext: &str,
    ) -> Result<bool, StoreError> {
        let stored: Option<String> = self.store.query_value(
            "SELECT password_hash FROM users WHERE user_name = ?1",
            params![user_name.as_str()],
        )?;
        let Some(stored) = stored else {
            return Ok(false);
        };
        let parsed = match PasswordHash::new(&stored) {
            Ok(value) => value,
            Err(err) => {
                warn!(user = user_name.as_str(), "stored password hash unparseable: {err}");
                return Ok(false);
            }
        };
        Ok(Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok())
    }

    /// Renames one account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure (including a name
    /// collision). An unknown current name affects zero rows.
    pub fn change_user_name(
        &self,
        current: &UserName,
        new_name: &UserName,
    ) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE users SET user_name = ?1 WHERE user_name = ?2",
            params![new_name.as_str(), current.as_str()],
        )?;
        Ok(())
    }

    /// Replaces one account's password, re-hashing the new plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when hashing or the update fails.
    pub fn change_password(
        &self,
        user_name: &UserName,
        new_password: &str,
    ) -> Result<(), StoreError> {
        let password_hash = hash_password(new_password)?;
        self.store.execute(
            "UPDATE users SET password_hash = ?1 WHERE user_name = ?2",
            params![password_hash, user_name.as_str()],
        )?;
        Ok(())
    }

    /// Changes one account's privilege level.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn change_privilege(
        &self,
        user_name: &UserName,
        privilege: PrivilegeLevel,
    ) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE users SET privilege = ?1 WHERE user_name = ?2",
            params![privilege.as_i64(), user_name.as_str()],
        )?;
        Ok(())
    }

    /// Increments the failed-login counter and stamps the lockout window
    /// start.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn record_failed_login(&self, user_name: &UserName) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE users SET failed_logins = failed_logins + 1, \
             failed_logins_timeout_start = ?1 WHERE user_name = ?2",
            params![unix_seconds(), user_name.as_str()],
        )?;
        Ok(())
    }

    /// Zeroes the failed-login counter and lockout window after a successful
    /// login.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on engine failure.
    pub fn clear_failed_logins(&self, user_name: &UserName) -> Result<(), StoreError> {
        self.store.execute(
            "UPDATE users SET failed_logins = 0, failed_logins_timeout_start = 0 \
             WHERE user_name = ?1",
            params![user_name.as_str()],
        )?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Hashing
// ============================================================================

/// Hashes a plaintext password with a fresh random salt.
fn hash_password(plaintext: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|err| StoreError::Hash(err.to_string()))?;
    Ok(hash.to_string())
}
