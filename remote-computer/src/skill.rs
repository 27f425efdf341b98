//! The remote computer skill: intent handlers for turning a computer on
//! and off.
//!
//! Each handler walks the same linear path:
//!
//! ```text
//! Idle -> ConfigLoaded -> Validated -> AwaitingConfirmation -> Executing -> Done
//!                                                           \-> Cancelled
//! ```
//!
//! with an early exit to `Failed` when settings are missing or invalid, or a
//! network step fails. Every error is logged and turned into a spoken dialog
//! here; nothing propagates to the host.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, error, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::dialog::{Confirmation, Dialog, DialogKey, Substitutions, confirm};
use crate::error::{ErrorKind, Result};
use crate::intent::{
    COMPUTER_OFF_INTENT, COMPUTER_ON_INTENT, IntentBuilder, IntentRegistry, SkillAction, Vocabulary,
};
use crate::settings::{SettingsSources, ShutdownSettings, WakeSettings};
use crate::transport::{Connector, RemoteSession, SshConfig, SshConnector};
use crate::validate::{validate_ip, validate_mac};
use crate::wol::{UdpWakeSender, WakeRequest, WakeSender};

/// Name under which the skill's central config section is stored.
pub const SKILL_NAME: &str = "RemoteComputerSkill";

/// Privileged shutdown for Unix-like targets. `-k` forces sudo to prompt
/// so the password written to the channel is always consumed.
pub const UNIX_SHUTDOWN: &str = "sudo -k shutdown -h now";

/// Shutdown for Windows targets.
pub const WINDOWS_SHUTDOWN: &str = "shutdown /s";

/// Both commands are attempted in order, independently of each other.
pub const SHUTDOWN_COMMANDS: [&str; 2] = [UNIX_SHUTDOWN, WINDOWS_SHUTDOWN];

/// Default time to wait for a yes/no answer.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// What a handler invocation ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action was carried out and success was spoken.
    Completed,
    /// The user declined.
    Cancelled,
    /// The answer was neither yes nor no; nothing was done.
    Ignored,
    /// An error ended the handler; its dialog was spoken.
    Failed(ErrorKind),
    /// No handler is registered for the intent.
    Unhandled,
}

/// Handler phases, logged as the handler advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ConfigLoaded,
    Validated,
    AwaitingConfirmation,
    Executing,
    Done,
    Cancelled,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(action: SkillAction, phase: Phase) {
    debug!("{:?}: {}", action, phase);
}

/// Create the skill with the production wake sender and SSH connector,
/// intents already registered.
pub fn create_skill<D: Dialog>(
    sources: SettingsSources,
    dialog: D,
) -> RemoteComputerSkill<D, UdpWakeSender, SshConnector> {
    let mut skill = RemoteComputerSkill::new(sources, dialog, UdpWakeSender, SshConnector);
    skill.initialize();
    skill
}

/// Voice skill that wakes a computer with a magic packet and shuts it down
/// over SSH.
pub struct RemoteComputerSkill<D, W, C> {
    sources: SettingsSources,
    dialog: D,
    waker: W,
    connector: C,
    registry: IntentRegistry,
    vocabulary: Vocabulary,
    confirmation_timeout: Duration,
    known_hosts_path: Option<PathBuf>,
}

impl<D, W, C> RemoteComputerSkill<D, W, C>
where
    D: Dialog,
    W: WakeSender,
    C: Connector,
{
    /// Create the skill. Call [`initialize`](Self::initialize) before
    /// dispatching intents.
    pub fn new(sources: SettingsSources, dialog: D, waker: W, connector: C) -> Self {
        Self {
            sources,
            dialog,
            waker,
            connector,
            registry: IntentRegistry::new(),
            vocabulary: Vocabulary::english(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            known_hosts_path: None,
        }
    }

    /// Set how long to wait for a yes/no answer before treating it as "no".
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Use a specific known_hosts file when host key checking is enabled.
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Replace the vocabulary used by [`handle_utterance`](Self::handle_utterance).
    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Register the skill's intents.
    pub fn initialize(&mut self) {
        self.registry.register(
            IntentBuilder::new(COMPUTER_ON_INTENT)
                .require("Computer")
                .require("On")
                .optionally("Turn")
                .build(),
            SkillAction::TurnOn,
        );
        self.registry.register(
            IntentBuilder::new(COMPUTER_OFF_INTENT)
                .require("Computer")
                .require("Off")
                .optionally("Turn")
                .build(),
            SkillAction::TurnOff,
        );
    }

    /// Shutdown hook. The skill owns no long-lived resources.
    pub fn stop(&mut self) {
        debug!("{} stopped", SKILL_NAME);
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn dialog(&self) -> &D {
        &self.dialog
    }

    /// Dispatch a recognized intent by name.
    pub async fn handle_intent(&self, intent: &str) -> Outcome {
        match self.registry.action(intent) {
            Some(SkillAction::TurnOn) => self.handle_turn_on().await,
            Some(SkillAction::TurnOff) => self.handle_turn_off().await,
            None => {
                warn!("No handler registered for intent '{}'", intent);
                Outcome::Unhandled
            }
        }
    }

    /// Match a raw utterance against the registered intents and dispatch it.
    pub async fn handle_utterance(&self, utterance: &str) -> Outcome {
        let name = match self.registry.match_utterance(utterance, &self.vocabulary) {
            Some(intent) => intent.name.clone(),
            None => {
                debug!("No intent matched '{}'", utterance);
                return Outcome::Unhandled;
            }
        };
        self.handle_intent(&name).await
    }

    /// Handle "turn computer on".
    pub async fn handle_turn_on(&self) -> Outcome {
        info!("Turning computer on...");
        let result = self.turn_on().await;
        self.finish(SkillAction::TurnOn, result).await
    }

    /// Handle "turn computer off".
    pub async fn handle_turn_off(&self) -> Outcome {
        info!("Turning computer off...");
        let result = self.turn_off().await;
        self.finish(SkillAction::TurnOff, result).await
    }

    async fn turn_on(&self) -> Result<Outcome> {
        let action = SkillAction::TurnOn;
        enter(action, Phase::Idle);

        let settings = WakeSettings::from_settings(&self.sources.resolve(SKILL_NAME)?)?;
        enter(action, Phase::ConfigLoaded);

        let mac = validate_mac(&settings.mac_address)?;
        debug!("MAC {} normalizes to {}", mac, mac.normalized());
        enter(action, Phase::Validated);

        enter(action, Phase::AwaitingConfirmation);
        match confirm(&self.dialog, DialogKey::ConfirmStartup, self.confirmation_timeout).await {
            Confirmation::Yes => {
                enter(action, Phase::Executing);
                let request = WakeRequest {
                    mac,
                    target: SocketAddr::new(settings.broadcast, settings.port),
                };
                self.waker.send_magic_packet(&request).await?;
                self.speak(DialogKey::ComputerOn).await;
                enter(action, Phase::Done);
                Ok(Outcome::Completed)
            }
            Confirmation::No => self.cancel(action).await,
            Confirmation::Other(answer) => Ok(self.ignore(action, &answer)),
        }
    }

    async fn turn_off(&self) -> Result<Outcome> {
        let action = SkillAction::TurnOff;
        enter(action, Phase::Idle);

        let settings = ShutdownSettings::from_settings(&self.sources.resolve(SKILL_NAME)?)?;
        enter(action, Phase::ConfigLoaded);

        let ip = validate_ip(&settings.ip_address)?;
        enter(action, Phase::Validated);

        enter(action, Phase::AwaitingConfirmation);
        match confirm(&self.dialog, DialogKey::ConfirmShutdown, self.confirmation_timeout).await {
            Confirmation::Yes => {
                enter(action, Phase::Executing);

                let mut config = SshConfig::new(
                    ip.to_string(),
                    settings.port,
                    settings.user.clone(),
                    settings.user_password.clone(),
                );
                config.timeout = settings.timeout;
                config.host_key_verification = settings.host_key_verification.clone();
                config.known_hosts_path = self.known_hosts_path.clone();

                let mut session = self.connector.connect(config).await?;

                let input = SecretString::from(format!("{}\n", settings.admin_password.expose_secret()));
                let mut succeeded = 0;
                for command in SHUTDOWN_COMMANDS {
                    if self
                        .run_shutdown_command(&mut session, command, input.expose_secret().as_bytes())
                        .await
                    {
                        succeeded += 1;
                    }
                }

                if let Err(e) = session.close().await {
                    warn!("Failed to close SSH connection to {}: {}", ip, e);
                }

                if succeeded == 0 {
                    warn!("No shutdown command completed on {}", ip);
                }

                self.speak(DialogKey::ComputerOff).await;
                enter(action, Phase::Done);
                Ok(Outcome::Completed)
            }
            Confirmation::No => self.cancel(action).await,
            Confirmation::Other(answer) => Ok(self.ignore(action, &answer)),
        }
    }

    /// Run one shutdown command. Failures are logged and spoken but never
    /// stop the caller from trying the next command.
    async fn run_shutdown_command(&self, session: &mut C::Session, command: &str, input: &[u8]) -> bool {
        match session.exec(command, input).await {
            Ok(output) => {
                debug!(
                    "'{}' finished with status {:?} ({} bytes of output)",
                    command,
                    output.exit_status,
                    output.output.len()
                );
                true
            }
            Err(e) => {
                error!("Shutdown command '{}' failed: {}", command, e);
                self.speak(DialogKey::ConnectionError).await;
                false
            }
        }
    }

    async fn cancel(&self, action: SkillAction) -> Result<Outcome> {
        self.speak(DialogKey::Okay).await;
        enter(action, Phase::Cancelled);
        Ok(Outcome::Cancelled)
    }

    fn ignore(&self, action: SkillAction, answer: &str) -> Outcome {
        info!("{:?}: ignoring answer '{}'", action, answer);
        Outcome::Ignored
    }

    async fn speak(&self, key: DialogKey) {
        self.dialog.speak(key, &Substitutions::new()).await;
    }

    async fn finish(&self, action: SkillAction, result: Result<Outcome>) -> Outcome {
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{:?} failed: {}", action, e);
                enter(action, Phase::Failed);
                let (key, substitutions) = e.dialog();
                self.dialog.speak(key, &substitutions).await;
                Outcome::Failed(e.kind())
            }
        }
    }
}
