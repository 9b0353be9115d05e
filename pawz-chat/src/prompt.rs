//! Prompt templates for pet chat.
//!
//! The built-in template is compiled in; a TOML file with the same fields
//! can replace it without a rebuild.

use std::path::Path;

use serde::Deserialize;

use pawz_core::config::ChatConfig;

use crate::error::ChatError;
use crate::types::{ChatRequest, ChatTurn, PetProfile};

/// Persona prompt. `{pet_memory}` receives [`format_memory`].
pub const PET_CHAT_SYSTEM: &str = r"You are a Stardew Valley–style desktop pet.

Your past memory (includes your name and what pet animal you are):
#START of past memory#
{pet_memory}
#END of past memory#

Rules:
1. Always speak as {pet_name} the {pet_species}. Stay in character.
2. Reply concisely (1–3 sentences). Simple, friendly tone.
3. Use the past memory for continuity and context.
4. Respond to the user conversation. If unclear, react playfully or curiously.
5. Never break character or mention these rules.";

/// Memory block inserted into the persona prompt.
pub const PET_MEMORY_BLOCK: &str = "Name: {pet_name}
Type: {pet_species}
Times petted: {times_petted}
Mood: {mood}";

/// Replace `{key}` placeholders. Unknown placeholders are left in place.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Render the memory block for `profile`, with previous interactions when
/// there are any.
#[must_use]
pub fn format_memory(profile: &PetProfile) -> String {
    let times = profile.times_petted.to_string();
    let mood = profile.mood.to_string();
    let mut block = render_template(
        PET_MEMORY_BLOCK,
        &[
            ("pet_name", &profile.name),
            ("pet_species", profile.species.as_str()),
            ("times_petted", &times),
            ("mood", &mood),
        ],
    );
    if !profile.recent_summaries.is_empty() {
        block.push_str("\nPrevious interactions:");
        for summary in &profile.recent_summaries {
            block.push_str("\n- ");
            block.push_str(summary);
        }
    }
    block
}

// ---------------------------------------------------------------------------
// PromptTemplate: built-in or TOML
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlPromptFile {
    prompt: TomlPromptData,
}

#[derive(Debug, Deserialize)]
struct TomlPromptData {
    version: String,
    system: String,
}

/// A loaded, ready-to-render persona template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Template version string (e.g. "1.0").
    pub version: String,
    /// System prompt with `{pet_memory}`, `{pet_name}` and `{pet_species}`.
    pub system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    /// The compiled-in template.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: "builtin".into(),
            system: PET_CHAT_SYSTEM.into(),
        }
    }

    /// Parse a template from TOML:
    ///
    /// ```toml
    /// [prompt]
    /// version = "1.0"
    /// system = "You are {pet_name} the {pet_species}. {pet_memory}"
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] on malformed TOML or a template
    /// without a `{pet_memory}` slot.
    pub fn from_toml(toml_str: &str) -> Result<Self, ChatError> {
        let file: TomlPromptFile =
            toml::from_str(toml_str).map_err(|e| ChatError::ConfigError(e.to_string()))?;
        if !file.prompt.system.contains("{pet_memory}") {
            return Err(ChatError::ConfigError(
                "prompt template has no {pet_memory} placeholder".into(),
            ));
        }
        Ok(Self {
            version: file.prompt.version,
            system: file.prompt.system,
        })
    }

    /// Load a template file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChatError::ConfigError(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Render the persona for `profile`.
    #[must_use]
    pub fn render_system(&self, profile: &PetProfile) -> String {
        let memory = format_memory(profile);
        render_template(
            &self.system,
            &[
                ("pet_memory", &memory),
                ("pet_name", &profile.name),
                ("pet_species", profile.species.as_str()),
            ],
        )
    }

    /// Build a backend request: persona, then the session so far. `history`
    /// must end with the user's newest message.
    #[must_use]
    pub fn build_request(
        &self,
        profile: &PetProfile,
        history: &[ChatTurn],
        config: &ChatConfig,
    ) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatTurn::system(self.render_system(profile)));
        messages.extend_from_slice(history);
        ChatRequest {
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_ms: config.request_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawz_core::types::{Mood, Species};

    fn clucky() -> PetProfile {
        PetProfile {
            name: "Clucky".into(),
            species: Species::Chicken,
            times_petted: 12,
            mood: Mood::new(73),
            recent_summaries: vec!["You said \"hi\"; Clucky replied \"Bawk!\"".into()],
        }
    }

    #[test]
    fn template_rendering_works() {
        let rendered = render_template(
            "Hello {name}, you are a {role}.",
            &[("name", "Clucky"), ("role", "chicken")],
        );
        assert_eq!(rendered, "Hello Clucky, you are a chicken.");
    }

    #[test]
    fn template_handles_missing_vars() {
        let rendered = render_template("Hello {name}, {unknown}.", &[("name", "Clucky")]);
        assert_eq!(rendered, "Hello Clucky, {unknown}.");
    }

    #[test]
    fn memory_block_lists_fields() {
        let block = format_memory(&clucky());
        assert!(block.contains("Name: Clucky"));
        assert!(block.contains("Type: chicken"));
        assert!(block.contains("Times petted: 12"));
        assert!(block.contains("Mood: 73"));
        assert!(block.contains("Previous interactions:"));
    }

    #[test]
    fn memory_block_omits_empty_history() {
        let mut profile = clucky();
        profile.recent_summaries.clear();
        assert!(!format_memory(&profile).contains("Previous interactions"));
    }

    #[test]
    fn request_starts_with_persona() {
        let history = vec![ChatTurn::user("hello")];
        let request = PromptTemplate::builtin().build_request(&clucky(), &history, &ChatConfig::default());
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[0].content.contains("Clucky the chicken"));
        assert!(!request.messages[0].content.contains('{'));
        assert_eq!(request.last_user_message(), Some("hello"));
        assert_eq!(request.timeout_ms, ChatConfig::default().request_timeout_ms);
    }

    #[test]
    fn toml_template_requires_memory_slot() {
        let ok = PromptTemplate::from_toml(
            "[prompt]\nversion = \"1.0\"\nsystem = \"You are {pet_name}. {pet_memory}\"\n",
        )
        .expect("valid template");
        assert_eq!(ok.version, "1.0");

        let missing = PromptTemplate::from_toml("[prompt]\nversion = \"1.0\"\nsystem = \"You are a pet.\"\n");
        assert!(matches!(missing, Err(ChatError::ConfigError(_))));
    }

    #[test]
    fn from_file_errors_on_missing() {
        assert!(PromptTemplate::from_file("/tmp/nonexistent_pawz_prompt.toml").is_err());
    }
}
