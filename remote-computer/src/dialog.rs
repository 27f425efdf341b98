//! Speech collaborator interface.
//!
//! The host owns text-to-speech and the yes/no prompt round-trip. The skill
//! only refers to dialogs by key and passes substitutions for templated
//! phrases such as `invalid` ("That {word} address is invalid").

use std::fmt;
use std::future::Future;
use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, warn};

/// Template substitutions for a dialog, in insertion order.
pub type Substitutions = IndexMap<String, String>;

/// Dialogs the skill can speak or prompt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKey {
    SettingsError,
    Invalid,
    ConfirmStartup,
    ConfirmShutdown,
    ComputerOn,
    ComputerOff,
    ConnectionError,
    Okay,
}

impl DialogKey {
    /// Dialog file name understood by the host.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogKey::SettingsError => "settings.error",
            DialogKey::Invalid => "invalid",
            DialogKey::ConfirmStartup => "ask.confirmation.startup",
            DialogKey::ConfirmShutdown => "ask.confirmation.shutdown",
            DialogKey::ComputerOn => "computer.on",
            DialogKey::ComputerOff => "computer.off",
            DialogKey::ConnectionError => "connection.error",
            DialogKey::Okay => "okay",
        }
    }
}

impl fmt::Display for DialogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's answer to a yes/no prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    /// Anything the host could not classify as yes or no.
    Other(String),
}

impl Confirmation {
    /// Classify a raw response string from the host.
    pub fn from_response(response: &str) -> Self {
        match response.trim().to_ascii_lowercase().as_str() {
            "yes" => Confirmation::Yes,
            "no" => Confirmation::No,
            _ => Confirmation::Other(response.to_string()),
        }
    }
}

/// Host speech engine.
pub trait Dialog: Send + Sync {
    /// Speak a dialog, filling in any template substitutions.
    fn speak(&self, key: DialogKey, substitutions: &Substitutions)
    -> impl Future<Output = ()> + Send;

    /// Prompt the user and wait for a yes/no style answer.
    fn ask_yes_no(&self, prompt: DialogKey) -> impl Future<Output = Confirmation> + Send;
}

/// Ask for confirmation, treating an unanswered prompt as "no".
pub async fn confirm(dialog: &impl Dialog, prompt: DialogKey, wait: Duration) -> Confirmation {
    match tokio::time::timeout(wait, dialog.ask_yes_no(prompt)).await {
        Ok(answer) => {
            debug!("Confirmation for '{}': {:?}", prompt, answer);
            answer
        }
        Err(_) => {
            warn!("No answer to '{}' within {:?}, treating as no", prompt, wait);
            Confirmation::No
        }
    }
}
