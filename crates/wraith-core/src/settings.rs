// crates/wraith-core/src/settings.rs
// ============================================================================
// Module: Wraith Setting Keys
// Description: Well-known keys of the runtime settings table.
// Purpose: Give every consumer one spelling of each settings-table key.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The settings table is a flat string-to-string map seeded at bootstrap.
//! Keys keep their historical camelCase spellings because they are part of
//! the wire contract with deployed agents and management clients. Values are
//! always strings; numeric and list-shaped settings are decoded by callers.

// ============================================================================
// SECTION: Setting Keys
// ============================================================================

/// Seconds without a heartbeat before a Wraith is considered offline.
pub const WRAITH_MARK_OFFLINE_DELAY: &str = "wraithMarkOfflineDelay";

/// Symmetric key agents use for their first check-in.
pub const WRAITH_INITIAL_CRYPT_KEY: &str = "wraithInitialCryptKey";

/// Symmetric key agents rotate to after check-in.
pub const WRAITH_SWITCH_CRYPT_KEY: &str = "wraithSwitchCryptKey";

/// Fingerprint string identifying this API instance to agents.
pub const API_FINGERPRINT: &str = "APIFingerprint";

/// JSON list of commands issued to every new Wraith automatically.
pub const WRAITH_DEFAULT_COMMANDS: &str = "wraithDefaultCommands";

/// Prefix expected on agent request payloads.
pub const API_PREFIX: &str = "APIPrefix";

/// JSON list of source addresses refused at the request layer.
pub const REQUEST_IP_BLACKLIST: &str = "requestIPBlacklist";

/// Seconds without a heartbeat before a management session expires.
pub const MANAGEMENT_SESSION_EXPIRY_DELAY: &str = "managementSessionExpiryDelay";

/// Rotating first-layer key protecting management-session traffic.
pub const MANAGEMENT_FIRST_LAYER_ENCRYPTION_KEY: &str = "managementFirstLayerEncryptionKey";

/// JSON list of addresses allowed to reach the management surface.
pub const MANAGEMENT_IP_WHITELIST: &str = "managementIPWhitelist";

/// Failed login attempts tolerated before the lockout window starts.
pub const MANAGEMENT_BRUTE_FORCE_MAX_ATTEMPTS: &str = "managementBruteForceMaxAttempts";

/// Seconds a locked-out account must wait before retrying.
pub const MANAGEMENT_BRUTE_FORCE_TIMEOUT_SECONDS: &str = "managementBruteForceTimeoutSeconds";
