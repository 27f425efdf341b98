//! Skill configuration sources.
//!
//! Settings come from one of two stores: the centrally managed config, which
//! holds one section per skill, or the per-install local settings. The
//! central section wins whenever it has any entries. Stores are re-read on
//! every [`SettingsSources::resolve`] call; nothing is cached.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use secrecy::SecretString;
use serde_json::Value;

use crate::error::SettingsError;
use crate::transport::HostKeyVerification;

pub const MAC_ADDRESS: &str = "mac_address";
pub const BROADCAST_ADDRESS: &str = "broadcast_address";
pub const WOL_PORT: &str = "wol_port";
pub const IP_ADDRESS: &str = "ip_address";
pub const PORT: &str = "port";
pub const USER: &str = "user";
pub const USER_PASSWORD: &str = "user_password";
pub const SUDO_PASSWORD: &str = "sudo_password";
pub const HOST_KEY_VERIFICATION: &str = "host_key_verification";
pub const TIMEOUT_SECS: &str = "timeout_secs";

/// Flat key/value section. Keys configured as `null` or `""` are kept with
/// an empty value, so they still count as entries when picking a source.
pub type Section = IndexMap<String, String>;

/// A source of skill configuration.
pub trait SettingsStore: Send + Sync {
    /// Load the section for `skill`. Absent sections load as empty.
    fn section(&self, skill: &str) -> Result<Section, SettingsError>;
}

/// Which store a [`Settings`] value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Central,
    Local,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Central => f.write_str("central config"),
            Origin::Local => f.write_str("local settings"),
        }
    }
}

/// Settings resolved for a single handler invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    values: Section,
    origin: Origin,
}

impl Settings {
    pub fn new(values: Section, origin: Origin) -> Self {
        Self { values, origin }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Get a value, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get a value or fail with [`SettingsError::Missing`].
    pub fn require(&self, key: &'static str) -> Result<&str, SettingsError> {
        self.get(key).ok_or(SettingsError::Missing { key })
    }

    fn parse_port(&self, key: &'static str, value: &str) -> Result<u16, SettingsError> {
        value
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| SettingsError::InvalidValue {
                key,
                value: value.to_string(),
            })
    }
}

/// The pair of stores consulted for every invocation.
#[derive(Clone)]
pub struct SettingsSources {
    central: Arc<dyn SettingsStore>,
    local: Arc<dyn SettingsStore>,
}

impl SettingsSources {
    pub fn new(central: Arc<dyn SettingsStore>, local: Arc<dyn SettingsStore>) -> Self {
        Self { central, local }
    }

    /// Read both stores and pick the central section if it has any keys,
    /// even keys whose values are empty.
    pub fn resolve(&self, skill: &str) -> Result<Settings, SettingsError> {
        let central = self.central.section(skill)?;
        let settings = if !central.is_empty() {
            Settings::new(central, Origin::Central)
        } else {
            Settings::new(self.local.section(skill)?, Origin::Local)
        };
        debug!("Resolved {} settings from {}", skill, settings.origin());
        Ok(settings)
    }
}

/// Configuration needed to wake the computer.
#[derive(Debug, Clone)]
pub struct WakeSettings {
    pub mac_address: String,
    pub broadcast: IpAddr,
    pub port: u16,
}

impl WakeSettings {
    /// Default Wake-on-LAN broadcast target.
    pub const DEFAULT_BROADCAST: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);
    /// Default Wake-on-LAN UDP port (discard).
    pub const DEFAULT_PORT: u16 = 9;

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let mac_address = settings.require(MAC_ADDRESS)?.to_string();

        let broadcast = match settings.get(BROADCAST_ADDRESS) {
            Some(raw) => raw.parse().map_err(|_| SettingsError::InvalidValue {
                key: BROADCAST_ADDRESS,
                value: raw.to_string(),
            })?,
            None => Self::DEFAULT_BROADCAST,
        };

        let port = match settings.get(WOL_PORT) {
            Some(raw) => settings.parse_port(WOL_PORT, raw)?,
            None => Self::DEFAULT_PORT,
        };

        Ok(Self {
            mac_address,
            broadcast,
            port,
        })
    }
}

/// Configuration needed to shut the computer down over SSH.
#[derive(Debug, Clone)]
pub struct ShutdownSettings {
    pub ip_address: String,
    pub port: u16,
    pub user: String,
    pub user_password: SecretString,
    pub admin_password: SecretString,
    pub host_key_verification: HostKeyVerification,
    pub timeout: Duration,
}

impl ShutdownSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Extract the five required fields. Every field is checked for presence
    /// before any of them is interpreted.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let ip_address = settings.require(IP_ADDRESS)?;
        let port = settings.require(PORT)?;
        let user = settings.require(USER)?;
        let user_password = settings.require(USER_PASSWORD)?;
        let admin_password = settings.require(SUDO_PASSWORD)?;

        let port = settings.parse_port(PORT, port)?;

        let host_key_verification = match settings.get(HOST_KEY_VERIFICATION) {
            Some(raw) => raw.parse().map_err(|_| SettingsError::InvalidValue {
                key: HOST_KEY_VERIFICATION,
                value: raw.to_string(),
            })?,
            None => HostKeyVerification::Disabled,
        };

        let timeout = match settings.get(TIMEOUT_SECS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| SettingsError::InvalidValue {
                    key: TIMEOUT_SECS,
                    value: raw.to_string(),
                })?,
            None => Self::DEFAULT_TIMEOUT,
        };

        Ok(Self {
            ip_address: ip_address.to_string(),
            port,
            user: user.to_string(),
            user_password: SecretString::from(user_password.to_string()),
            admin_password: SecretString::from(admin_password.to_string()),
            host_key_verification,
            timeout,
        })
    }
}

/// In-process settings, for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub enum MemoryStore {
    /// No settings at all.
    #[default]
    Empty,
    /// One flat section regardless of skill name.
    Flat(Section),
    /// Sections keyed by skill name.
    PerSkill(HashMap<String, Section>),
}

impl MemoryStore {
    /// Build a flat store from key/value pairs.
    pub fn flat<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MemoryStore::Flat(collect_section(pairs))
    }

    /// Build a store holding a single skill's section.
    pub fn for_skill<K, V>(skill: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut sections = HashMap::new();
        sections.insert(skill.into(), collect_section(pairs));
        MemoryStore::PerSkill(sections)
    }
}

fn collect_section<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Section
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl SettingsStore for MemoryStore {
    fn section(&self, skill: &str) -> Result<Section, SettingsError> {
        Ok(match self {
            MemoryStore::Empty => Section::new(),
            MemoryStore::Flat(section) => section.clone(),
            MemoryStore::PerSkill(sections) => sections.get(skill).cloned().unwrap_or_default(),
        })
    }
}

/// How a JSON settings file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// Top-level object keyed by skill name (central config).
    PerSkill,
    /// Top-level object holding this skill's keys directly (local settings).
    Flat,
}

/// JSON file store, re-read on every access. A missing file is empty.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    layout: JsonLayout,
}

impl JsonFileStore {
    pub fn central(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: JsonLayout::PerSkill,
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: JsonLayout::Flat,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, message: impl fmt::Display) -> SettingsError {
        SettingsError::Store {
            source_name: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn section(&self, skill: &str) -> Result<Section, SettingsError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Section::new()),
            Err(e) => return Err(self.store_error(e)),
        };

        if text.trim().is_empty() {
            return Ok(Section::new());
        }

        let root: Value = serde_json::from_str(&text).map_err(|e| self.store_error(e))?;

        let object = match self.layout {
            JsonLayout::Flat => Some(&root),
            JsonLayout::PerSkill => root.get(skill),
        };

        match object {
            None | Some(Value::Null) => Ok(Section::new()),
            Some(Value::Object(map)) => Ok(map
                .iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                .collect()),
            Some(_) => Err(self.store_error(format!("section for '{skill}' is not an object"))),
        }
    }
}

/// Normalize a JSON scalar to a string. `null` becomes an empty value, which
/// [`Settings::get`] reports as absent. Nested values are skipped.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    const SKILL: &str = "RemoteComputerSkill";

    fn shutdown_pairs() -> Vec<(&'static str, &'static str)> {
        vec![
            (IP_ADDRESS, "192.168.1.20"),
            (PORT, "22"),
            (USER, "alice"),
            (USER_PASSWORD, "hunter2"),
            (SUDO_PASSWORD, "root-secret"),
        ]
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("remote-computer-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_central_wins_when_non_empty() {
        let sources = SettingsSources::new(
            Arc::new(MemoryStore::for_skill(SKILL, [(MAC_ADDRESS, "00:11:22:33:44:55")])),
            Arc::new(MemoryStore::flat([(MAC_ADDRESS, "66:77:88:99:aa:bb")])),
        );
        let settings = sources.resolve(SKILL).unwrap();
        assert_eq!(settings.origin(), Origin::Central);
        assert_eq!(settings.get(MAC_ADDRESS), Some("00:11:22:33:44:55"));
    }

    #[test]
    fn test_local_used_when_central_empty() {
        let sources = SettingsSources::new(
            Arc::new(MemoryStore::for_skill("OtherSkill", [(MAC_ADDRESS, "00:11:22:33:44:55")])),
            Arc::new(MemoryStore::flat([(MAC_ADDRESS, "66:77:88:99:aa:bb")])),
        );
        let settings = sources.resolve(SKILL).unwrap();
        assert_eq!(settings.origin(), Origin::Local);
        assert_eq!(settings.get(MAC_ADDRESS), Some("66:77:88:99:aa:bb"));
    }

    #[test]
    fn test_central_with_only_empty_values_still_wins() {
        let sources = SettingsSources::new(
            Arc::new(MemoryStore::for_skill(SKILL, [(MAC_ADDRESS, "")])),
            Arc::new(MemoryStore::flat([(MAC_ADDRESS, "66:77:88:99:aa:bb")])),
        );
        let settings = sources.resolve(SKILL).unwrap();
        assert_eq!(settings.origin(), Origin::Central);
        assert!(matches!(
            WakeSettings::from_settings(&settings),
            Err(SettingsError::Missing { key: MAC_ADDRESS })
        ));
    }

    #[test]
    fn test_json_central_null_value_still_wins() {
        let path = temp_path("central-null.json");
        std::fs::write(&path, r#"{"RemoteComputerSkill": {"mac_address": null}}"#).unwrap();
        let sources = SettingsSources::new(
            Arc::new(JsonFileStore::central(&path)),
            Arc::new(MemoryStore::flat([(MAC_ADDRESS, "66:77:88:99:aa:bb")])),
        );
        let settings = sources.resolve(SKILL).unwrap();
        assert_eq!(settings.origin(), Origin::Central);
        assert_eq!(settings.get(MAC_ADDRESS), None);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_central_branch_supplies_every_shutdown_field() {
        let sources = SettingsSources::new(
            Arc::new(MemoryStore::for_skill(SKILL, shutdown_pairs())),
            Arc::new(MemoryStore::Empty),
        );
        let settings = sources.resolve(SKILL).unwrap();
        let shutdown = ShutdownSettings::from_settings(&settings).unwrap();
        assert_eq!(shutdown.ip_address, "192.168.1.20");
        assert_eq!(shutdown.port, 22);
        assert_eq!(shutdown.user, "alice");
        assert_eq!(shutdown.user_password.expose_secret(), "hunter2");
        assert_eq!(shutdown.admin_password.expose_secret(), "root-secret");
        assert!(matches!(shutdown.host_key_verification, HostKeyVerification::Disabled));
        assert_eq!(shutdown.timeout, ShutdownSettings::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_each_missing_shutdown_field_is_reported() {
        for missing in [IP_ADDRESS, PORT, USER, USER_PASSWORD, SUDO_PASSWORD] {
            let pairs = shutdown_pairs().into_iter().filter(|(k, _)| *k != missing);
            let settings = Settings::new(collect_section(pairs), Origin::Local);
            match ShutdownSettings::from_settings(&settings) {
                Err(SettingsError::Missing { key }) => assert_eq!(key, missing),
                other => panic!("expected missing {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut pairs = shutdown_pairs();
        pairs[2] = (USER, "");
        let settings = Settings::new(collect_section(pairs), Origin::Local);
        assert!(matches!(
            ShutdownSettings::from_settings(&settings),
            Err(SettingsError::Missing { key: USER })
        ));
    }

    #[test]
    fn test_bad_port_rejected() {
        for bad in ["ssh", "0", "70000"] {
            let mut pairs = shutdown_pairs();
            pairs[1] = (PORT, bad);
            let settings = Settings::new(collect_section(pairs), Origin::Local);
            assert!(matches!(
                ShutdownSettings::from_settings(&settings),
                Err(SettingsError::InvalidValue { key: PORT, .. })
            ));
        }
    }

    #[test]
    fn test_wake_settings_defaults_and_overrides() {
        let settings = Settings::new(
            collect_section([(MAC_ADDRESS, "00-11-22-33-44-55")]),
            Origin::Local,
        );
        let wake = WakeSettings::from_settings(&settings).unwrap();
        assert_eq!(wake.broadcast, WakeSettings::DEFAULT_BROADCAST);
        assert_eq!(wake.port, 9);

        let settings = Settings::new(
            collect_section([
                (MAC_ADDRESS, "00-11-22-33-44-55"),
                (BROADCAST_ADDRESS, "192.168.1.255"),
                (WOL_PORT, "7"),
            ]),
            Origin::Local,
        );
        let wake = WakeSettings::from_settings(&settings).unwrap();
        assert_eq!(wake.broadcast, "192.168.1.255".parse::<IpAddr>().unwrap());
        assert_eq!(wake.port, 7);
    }

    #[test]
    fn test_json_central_store() {
        let path = temp_path("central.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"RemoteComputerSkill": {{"ip_address": "10.0.0.5", "port": 2222, "user": "bob", "sudo_password": null}}}}"#
        )
        .unwrap();
        drop(file);

        let store = JsonFileStore::central(&path);
        let section = store.section(SKILL).unwrap();
        assert_eq!(section.get(PORT).map(String::as_str), Some("2222"));
        assert_eq!(section.get(USER).map(String::as_str), Some("bob"));
        assert_eq!(section.get(SUDO_PASSWORD).map(String::as_str), Some(""));
        assert!(store.section("OtherSkill").unwrap().is_empty());

        let settings = Settings::new(section, Origin::Central);
        assert_eq!(settings.get(SUDO_PASSWORD), None);
        assert!(matches!(
            ShutdownSettings::from_settings(&settings),
            Err(SettingsError::Missing { key: SUDO_PASSWORD })
        ));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_local_store_rereads_each_call() {
        let path = temp_path("local.json");
        std::fs::write(&path, r#"{"mac_address": "00:11:22:33:44:55"}"#).unwrap();
        let store = JsonFileStore::local(&path);
        assert_eq!(
            store.section(SKILL).unwrap().get(MAC_ADDRESS).map(String::as_str),
            Some("00:11:22:33:44:55")
        );

        std::fs::write(&path, r#"{"mac_address": "66:77:88:99:aa:bb"}"#).unwrap();
        assert_eq!(
            store.section(SKILL).unwrap().get(MAC_ADDRESS).map(String::as_str),
            Some("66:77:88:99:aa:bb")
        );

        std::fs::remove_file(&path).unwrap();
        assert!(store.section(SKILL).unwrap().is_empty());
    }

    #[test]
    fn test_json_malformed_is_store_error() {
        let path = temp_path("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::local(&path);
        assert!(matches!(store.section(SKILL), Err(SettingsError::Store { .. })));
        std::fs::remove_file(&path).unwrap();
    }
}
