//! # remote-computer
//!
//! Voice assistant skill that turns a computer on and off.
//!
//! "Turn computer on" broadcasts a Wake-on-LAN magic packet to a configured
//! MAC address. "Turn computer off" connects over SSH and runs a privileged
//! Unix shutdown followed by a Windows shutdown, so one configuration works
//! for either kind of target.
//!
//! The host assistant supplies speech through the [`Dialog`] trait and
//! configuration through [`SettingsStore`]s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use remote_computer::dialog::{Confirmation, Dialog, DialogKey, Substitutions};
//! use remote_computer::settings::{JsonFileStore, SettingsSources};
//! use remote_computer::{Outcome, create_skill};
//!
//! struct Console;
//!
//! impl Dialog for Console {
//!     async fn speak(&self, key: DialogKey, _subs: &Substitutions) {
//!         println!("{key}");
//!     }
//!
//!     async fn ask_yes_no(&self, _prompt: DialogKey) -> Confirmation {
//!         Confirmation::Yes
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let sources = SettingsSources::new(
//!         Arc::new(JsonFileStore::central("/etc/mycroft/mycroft.conf")),
//!         Arc::new(JsonFileStore::local("settings.json")),
//!     );
//!     let skill = create_skill(sources, Console);
//!
//!     if skill.handle_utterance("turn the computer on").await == Outcome::Completed {
//!         println!("magic packet sent");
//!     }
//! }
//! ```

pub mod dialog;
pub mod error;
pub mod intent;
pub mod settings;
pub mod skill;
pub mod transport;
pub mod validate;
pub mod wol;

// Re-export main types for convenience
pub use dialog::{Confirmation, Dialog, DialogKey};
pub use error::{Error, ErrorKind};
pub use settings::{SettingsSources, SettingsStore};
pub use skill::{Outcome, RemoteComputerSkill, create_skill};
pub use transport::{Connector, RemoteSession, SshConfig};
pub use wol::WakeSender;
