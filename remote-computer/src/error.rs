//! Error types for remote-computer.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::dialog::{DialogKey, Substitutions};

/// Main error type for skill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unreadable configuration
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// A configured value failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Network, authentication or SSH failure
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
}

impl Error {
    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Settings(_) => ErrorKind::Settings,
            Error::InvalidInput(e) => ErrorKind::InvalidInput(e.field),
            Error::Connection(_) => ErrorKind::Connection,
        }
    }

    /// Dialog spoken to the user when this error ends a handler.
    pub fn dialog(&self) -> (DialogKey, Substitutions) {
        match self {
            Error::Settings(_) => (DialogKey::SettingsError, Substitutions::new()),
            Error::InvalidInput(e) => {
                let mut subs = Substitutions::new();
                subs.insert("word".to_string(), e.field.spoken().to_string());
                (DialogKey::Invalid, subs)
            }
            Error::Connection(_) => (DialogKey::ConnectionError, Substitutions::new()),
        }
    }
}

/// Error category reported back to the host in an [`Outcome`](crate::skill::Outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Settings,
    InvalidInput(Field),
    Connection,
}

/// Configuration errors (missing keys, unreadable stores).
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A required key is absent or empty
    #[error("Missing setting '{key}'")]
    Missing { key: &'static str },

    /// A key is present but cannot be interpreted
    #[error("Invalid value for setting '{key}': {value}")]
    InvalidValue { key: &'static str, value: String },

    /// The backing store could not be read
    #[error("Failed to read settings from {source_name}: {message}")]
    Store {
        source_name: String,
        message: String,
    },
}

/// Configured field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mac,
    Ip,
}

impl Field {
    /// How the field is pronounced in the `invalid` dialog.
    pub fn spoken(&self) -> &'static str {
        match self {
            Field::Mac => "mac",
            Field::Ip => "I.P",
        }
    }
}

/// Validation failure for a MAC or IP address.
#[derive(Error, Debug)]
#[error("Invalid {field:?} address '{value}'")]
pub struct InvalidInputError {
    pub field: Field,
    pub value: String,
}

impl InvalidInputError {
    pub fn new(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Connection layer errors (wake packet, SSH transport, remote commands).
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Server presented a key that differs from known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Server is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Remote command could not be run to completion
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    /// Magic packet could not be broadcast
    #[error("Failed to send magic packet to {mac}: {source}")]
    WakeFailed {
        mac: String,
        #[source]
        source: io::Error,
    },
}

/// Result type alias using remote-computer's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mac_dialog() {
        let err: Error = InvalidInputError::new(Field::Mac, "zz").into();
        let (key, subs) = err.dialog();
        assert_eq!(key, DialogKey::Invalid);
        assert_eq!(subs.get("word").map(String::as_str), Some("mac"));
        assert_eq!(err.kind(), ErrorKind::InvalidInput(Field::Mac));
    }

    #[test]
    fn test_invalid_ip_spoken_word() {
        let err: Error = InvalidInputError::new(Field::Ip, "999.1.1.1").into();
        let (_, subs) = err.dialog();
        assert_eq!(subs.get("word").map(String::as_str), Some("I.P"));
    }

    #[test]
    fn test_settings_and_connection_dialogs() {
        let err: Error = SettingsError::Missing { key: "user" }.into();
        assert_eq!(err.dialog().0, DialogKey::SettingsError);
        assert_eq!(err.kind(), ErrorKind::Settings);

        let err: Error = ConnectionError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.dialog().0, DialogKey::ConnectionError);
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
