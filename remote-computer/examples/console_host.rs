//! Console host: drive the skill from a terminal.
//!
//! Spoken dialogs are printed, yes/no prompts are read from stdin, and
//! settings come from JSON files.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example console_host -- --settings settings.json "turn the computer on"
//! ```
//!
//! `settings.json`:
//! ```json
//! { "mac_address": "00:11:22:33:44:55", "ip_address": "192.168.1.20", "port": 22,
//!   "user": "alice", "user_password": "...", "sudo_password": "..." }
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use remote_computer::dialog::{Confirmation, Dialog, DialogKey, Substitutions};
use remote_computer::settings::{JsonFileStore, SettingsSources};
use remote_computer::{Outcome, create_skill};
use tokio::io::{AsyncBufReadExt, BufReader};

struct Console;

fn phrase(key: DialogKey) -> &'static str {
    match key {
        DialogKey::SettingsError => "Please configure the remote computer settings first.",
        DialogKey::Invalid => "That {word} address is not valid.",
        DialogKey::ConfirmStartup => "Do you want me to turn the computer on?",
        DialogKey::ConfirmShutdown => "Do you want me to shut the computer down?",
        DialogKey::ComputerOn => "Turning the computer on.",
        DialogKey::ComputerOff => "Shutting the computer down.",
        DialogKey::ConnectionError => "I couldn't reach the computer.",
        DialogKey::Okay => "Okay.",
    }
}

impl Dialog for Console {
    async fn speak(&self, key: DialogKey, substitutions: &Substitutions) {
        let mut text = phrase(key).to_string();
        for (name, value) in substitutions {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        println!(">> {text}");
    }

    async fn ask_yes_no(&self, prompt: DialogKey) -> Confirmation {
        println!(">> {} [yes/no]", phrase(prompt));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        match lines.next_line().await {
            Ok(Some(line)) => Confirmation::from_response(&line),
            _ => Confirmation::No,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let sources = SettingsSources::new(
        Arc::new(JsonFileStore::central(&args.central)),
        Arc::new(JsonFileStore::local(&args.settings)),
    );

    let mut skill = create_skill(sources, Console);
    let outcome = skill.handle_utterance(&args.utterance).await;
    skill.stop();

    if outcome == Outcome::Unhandled {
        eprintln!("Didn't understand '{}'", args.utterance);
        std::process::exit(1);
    }
    println!("Outcome: {outcome:?}");
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    central: PathBuf,
    settings: PathBuf,
    utterance: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut central = PathBuf::from("mycroft.conf");
        let mut settings = PathBuf::from("settings.json");
        let mut words = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--central" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        central = PathBuf::from(&args[i]);
                    }
                }
                "--settings" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        settings = PathBuf::from(&args[i]);
                    }
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => words.push(other.to_string()),
            }
            i += 1;
        }

        if words.is_empty() {
            Self::print_help();
            std::process::exit(1);
        }

        Self {
            central,
            settings,
            utterance: words.join(" "),
        }
    }

    fn print_help() {
        println!(
            r#"remote-computer console host

USAGE:
    cargo run --example console_host -- [OPTIONS] <UTTERANCE>...

OPTIONS:
    -c, --central <PATH>     Central config, keyed by skill name [default: mycroft.conf]
    -s, --settings <PATH>    Local skill settings [default: settings.json]
    --help                   Print this help message

EXAMPLES:
    cargo run --example console_host -- turn the computer on
    cargo run --example console_host -- --settings office.json shut down my pc
"#
        );
    }
}
