//! # Configuration
//!
//! A minimal string key/value store with an immutable snapshot type.
//! The binary loads it once at startup (environment + defaults) and
//! threads the snapshot through request state; nothing reads process
//! environment at call sites.
//!
//! Environment overrides use a double-underscore convention:
//! `PULSE__HTTP__PORT=8080` becomes `http.port = 8080`.
//!
//! The fallback organization is special-cased for compatibility with the
//! portal's deployment scripts: `PULSE_DEFAULT_ORG_ID` is honored first,
//! then `DEFAULT_ORG_ID`, and the value lands under `tenant.default_org`.

use std::collections::HashMap;

use crate::tenant::OrgId;

pub const DEFAULT_ORG_KEY: &str = "tenant.default_org";

/// Environment variable names for the fallback organization,
/// in precedence order.
pub const DEFAULT_ORG_ENV_VARS: [&str; 2] = ["PULSE_DEFAULT_ORG_ID", "DEFAULT_ORG_ID"];

#[derive(Debug, Default)]
pub struct PortalConfig {
    values: HashMap<String, String>,
}

impl PortalConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    ///
    /// Example: config.set("otp.max_attempts", "5")
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply `PULSE__`-prefixed environment overrides plus the
    /// default-organization variables.
    pub fn load_env(&mut self) {
        self.load_env_from(std::env::vars());
    }

    /// Same as [`load_env`](Self::load_env) but from an explicit iterator,
    /// so tests never mutate process environment.
    pub fn load_env_from<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        for (key, value) in &vars {
            if let Some(stripped) = key.strip_prefix("PULSE__") {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value.clone());
            }
        }

        // First name wins; later names only fill a gap.
        for name in DEFAULT_ORG_ENV_VARS {
            if self.has(DEFAULT_ORG_KEY) {
                break;
            }
            if let Some(value) = vars.get(name) {
                self.set(DEFAULT_ORG_KEY, value.clone());
            }
        }
    }

    pub fn snapshot(&self) -> PortalConfigSnapshot {
        PortalConfigSnapshot::new(self.values.clone())
    }
}

/// An immutable view of the config, cheap to clone into request state.
#[derive(Debug, Clone, Default)]
pub struct PortalConfigSnapshot {
    map: HashMap<String, String>,
}

impl PortalConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse::<i64>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.parse::<bool>().ok())
    }

    /// The configured fallback organization, if any.
    pub fn default_org(&self) -> Option<OrgId> {
        self.get_i64(DEFAULT_ORG_KEY).map(OrgId)
    }
}
