//! Intent definitions and dispatch table.
//!
//! The host's language-understanding layer decides which intent an
//! utterance belongs to. This module describes the skill's intents in the
//! same required/optional vocabulary form the host consumes, and offers a
//! plain keyword matcher for hosts without their own.
//!
//! # Example
//!
//! ```rust
//! use remote_computer::intent::{IntentBuilder, Vocabulary};
//!
//! let intent = IntentBuilder::new("ComputerOnIntent")
//!     .require("Computer")
//!     .require("On")
//!     .optionally("Turn")
//!     .build();
//!
//! assert!(intent.matches("please turn the computer on", &Vocabulary::english()));
//! ```

use indexmap::IndexMap;

pub const COMPUTER_ON_INTENT: &str = "ComputerOnIntent";
pub const COMPUTER_OFF_INTENT: &str = "ComputerOffIntent";

/// An intent: a name plus the vocabularies an utterance must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub name: String,
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl Intent {
    /// True if every required vocabulary has a keyword in `utterance`.
    pub fn matches(&self, utterance: &str, vocabulary: &Vocabulary) -> bool {
        let words = tokenize(utterance);
        self.required
            .iter()
            .all(|vocab| vocabulary.contains_any(vocab, &words))
    }

    /// Number of optional vocabularies present, used to rank matches.
    pub fn optional_hits(&self, utterance: &str, vocabulary: &Vocabulary) -> usize {
        let words = tokenize(utterance);
        self.optional
            .iter()
            .filter(|vocab| vocabulary.contains_any(vocab, &words))
            .count()
    }
}

/// Fluent builder for [`Intent`].
#[derive(Debug, Clone)]
pub struct IntentBuilder {
    intent: Intent,
}

impl IntentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            intent: Intent {
                name: name.into(),
                required: Vec::new(),
                optional: Vec::new(),
            },
        }
    }

    /// Require a vocabulary to be present.
    pub fn require(mut self, vocab: impl Into<String>) -> Self {
        self.intent.required.push(vocab.into());
        self
    }

    /// Allow a vocabulary without requiring it.
    pub fn optionally(mut self, vocab: impl Into<String>) -> Self {
        self.intent.optional.push(vocab.into());
        self
    }

    pub fn build(self) -> Intent {
        self.intent
    }
}

/// Keyword lists per vocabulary name. Phrases may span several words.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: IndexMap<String, Vec<Vec<String>>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The skill's default English vocabulary.
    pub fn english() -> Self {
        Self::new()
            .with("Computer", ["computer", "pc", "desktop", "workstation"])
            .with("On", ["on", "up", "wake", "start", "boot"])
            .with("Off", ["off", "down", "shutdown", "shut down", "power off"])
            .with("Turn", ["turn", "switch", "power"])
    }

    /// Add phrases to a vocabulary.
    pub fn with<'a>(mut self, vocab: impl Into<String>, phrases: impl IntoIterator<Item = &'a str>) -> Self {
        let entry = self.entries.entry(vocab.into()).or_default();
        entry.extend(phrases.into_iter().map(tokenize).filter(|p| !p.is_empty()));
        self
    }

    fn contains_any(&self, vocab: &str, words: &[String]) -> bool {
        self.entries.get(vocab).is_some_and(|phrases| {
            phrases
                .iter()
                .any(|phrase| words.windows(phrase.len()).any(|w| w == phrase.as_slice()))
        })
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// What the skill does for an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillAction {
    TurnOn,
    TurnOff,
}

/// Static mapping from intents to skill actions.
#[derive(Debug, Clone, Default)]
pub struct IntentRegistry {
    handlers: IndexMap<String, (Intent, SkillAction)>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intent. Re-registering a name replaces the previous entry.
    pub fn register(&mut self, intent: Intent, action: SkillAction) {
        self.handlers.insert(intent.name.clone(), (intent, action));
    }

    /// Look up the action for an intent name.
    pub fn action(&self, name: &str) -> Option<SkillAction> {
        self.handlers.get(name).map(|(_, action)| *action)
    }

    /// Registered intents, in registration order.
    pub fn intents(&self) -> impl Iterator<Item = &Intent> {
        self.handlers.values().map(|(intent, _)| intent)
    }

    /// Find the best matching intent for an utterance.
    ///
    /// Candidates must match all required vocabularies; ties are broken by
    /// the number of optional vocabularies present, then registration order.
    pub fn match_utterance(&self, utterance: &str, vocabulary: &Vocabulary) -> Option<&Intent> {
        let mut best: Option<(&Intent, usize)> = None;
        for intent in self.intents() {
            if !intent.matches(utterance, vocabulary) {
                continue;
            }
            let score = intent.required.len() + intent.optional_hits(utterance, vocabulary);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((intent, score));
            }
        }
        best.map(|(intent, _)| intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> IntentRegistry {
        let mut registry = IntentRegistry::new();
        registry.register(
            IntentBuilder::new(COMPUTER_ON_INTENT)
                .require("Computer")
                .require("On")
                .optionally("Turn")
                .build(),
            SkillAction::TurnOn,
        );
        registry.register(
            IntentBuilder::new(COMPUTER_OFF_INTENT)
                .require("Computer")
                .require("Off")
                .optionally("Turn")
                .build(),
            SkillAction::TurnOff,
        );
        registry
    }

    #[test]
    fn test_builder() {
        let intent = IntentBuilder::new("X").require("A").optionally("B").build();
        assert_eq!(intent.name, "X");
        assert_eq!(intent.required, vec!["A"]);
        assert_eq!(intent.optional, vec!["B"]);
    }

    #[test]
    fn test_match_on_and_off() {
        let registry = registry();
        let vocab = Vocabulary::english();

        let on = registry.match_utterance("Turn my computer on", &vocab).unwrap();
        assert_eq!(registry.action(&on.name), Some(SkillAction::TurnOn));

        let off = registry.match_utterance("please shut down the PC", &vocab).unwrap();
        assert_eq!(registry.action(&off.name), Some(SkillAction::TurnOff));
    }

    #[test]
    fn test_required_vocab_missing() {
        let registry = registry();
        let vocab = Vocabulary::english();
        assert!(registry.match_utterance("turn the lights on", &vocab).is_none());
        assert!(registry.match_utterance("computer", &vocab).is_none());
    }

    #[test]
    fn test_multiword_phrase_needs_adjacent_words() {
        let vocab = Vocabulary::new().with("Off", ["shut down"]);
        let intent = IntentBuilder::new("Off").require("Off").build();
        assert!(intent.matches("shut down now", &vocab));
        assert!(!intent.matches("shut the door, calm down", &vocab));
    }

    #[test]
    fn test_unknown_intent_has_no_action() {
        assert_eq!(registry().action("WeatherIntent"), None);
    }
}
