//! Chat Prompt Evaluation: Golden Test Set.
//!
//! A curated set of pet profiles with the strings their rendered persona
//! prompt must (and must not) contain.
//!
//! ## Usage
//!
//! - **Offline eval:** `cargo test -p pawz-chat --test eval_golden` checks
//!   that templates render into well-formed prompts.
//! - **Online eval (requires Ollama):** set `PAWZ_EVAL_LLM=1` to send each
//!   golden prompt to a local model and check a reply comes back.

use pawz_chat::prompt::{self, PromptTemplate};
use pawz_chat::types::{ChatTurn, PetProfile, Role};
use pawz_chat::{ChatService, LlmClient, ReplySource};
use pawz_core::config::ChatConfig;
use pawz_core::types::{Mood, Species};

/// A golden test case for prompt evaluation.
struct GoldenCase {
    /// Human-readable name for the test case.
    name: &'static str,
    /// Pet being rendered.
    profile: PetProfile,
    /// Strings that MUST appear in the rendered prompt.
    prompt_must_contain: Vec<&'static str>,
    /// Strings that MUST NOT appear in the rendered prompt.
    prompt_must_not_contain: Vec<&'static str>,
}

fn profile(name: &str, species: Species, times_petted: u64, mood: i64, summaries: &[&str]) -> PetProfile {
    PetProfile {
        name: name.into(),
        species,
        times_petted,
        mood: Mood::new(mood),
        recent_summaries: summaries.iter().map(|s| (*s).to_string()).collect(),
    }
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        // ---------------------------------------------------------------
        // 1. Brand-new chicken, no history
        // ---------------------------------------------------------------
        GoldenCase {
            name: "fresh_chicken",
            profile: profile("Clucky", Species::Chicken, 0, 50, &[]),
            prompt_must_contain: vec!["Clucky the chicken", "Times petted: 0", "Mood: 50"],
            prompt_must_not_contain: vec!["Previous interactions", "{pet_name}", "{pet_memory}"],
        },
        // ---------------------------------------------------------------
        // 2. Well-loved cat with history
        // ---------------------------------------------------------------
        GoldenCase {
            name: "beloved_cat",
            profile: profile(
                "Whiskers",
                Species::Cat,
                412,
                97,
                &["You said \"good kitty\"; Whiskers replied \"Purr purr!\""],
            ),
            prompt_must_contain: vec!["Whiskers the cat", "Times petted: 412", "Mood: 97", "good kitty"],
            prompt_must_not_contain: vec!["{times_petted}", "{mood}"],
        },
        // ---------------------------------------------------------------
        // 3. Grumpy dog
        // ---------------------------------------------------------------
        GoldenCase {
            name: "grumpy_dog",
            profile: profile("Rex", Species::Dog, 3, 4, &[]),
            prompt_must_contain: vec!["Rex the dog", "Mood: 4", "Type: dog"],
            prompt_must_not_contain: vec!["{pet_species}"],
        },
        // ---------------------------------------------------------------
        // 4. Duck with several past chats
        // ---------------------------------------------------------------
        GoldenCase {
            name: "chatty_duck",
            profile: profile(
                "Dewey",
                Species::Duck,
                20,
                66,
                &[
                    "You said \"swim?\"; Dewey replied \"Quack!\"",
                    "You said \"bread?\"; Dewey replied \"Quaaack!\"",
                ],
            ),
            prompt_must_contain: vec!["Dewey the duck", "swim?", "bread?", "Stardew Valley"],
            prompt_must_not_contain: vec!["{pet_memory}"],
        },
        // ---------------------------------------------------------------
        // 5. Name with spaces and punctuation
        // ---------------------------------------------------------------
        GoldenCase {
            name: "fancy_name",
            profile: profile("Sir Fluffington III", Species::Cat, 1, 100, &[]),
            prompt_must_contain: vec!["Sir Fluffington III the cat", "Mood: 100"],
            prompt_must_not_contain: vec!["{pet_name}"],
        },
    ]
}

#[test]
fn golden_prompts_render_without_unresolved_vars() {
    let template = PromptTemplate::builtin();

    for case in golden_cases() {
        let rendered = template.render_system(&case.profile);

        for needle in &case.prompt_must_contain {
            assert!(
                rendered.contains(needle),
                "Golden case '{}': rendered prompt must contain '{}' but doesn't.\nRendered:\n{}",
                case.name,
                needle,
                rendered
            );
        }

        for needle in &case.prompt_must_not_contain {
            assert!(
                !rendered.contains(needle),
                "Golden case '{}': rendered prompt must NOT contain '{}' but does.\nRendered:\n{}",
                case.name,
                needle,
                rendered
            );
        }
    }
}

#[test]
fn system_prompt_has_character_instruction() {
    assert!(prompt::PET_CHAT_SYSTEM.contains("You are"));
    assert!(prompt::PET_CHAT_SYSTEM.contains("Stay in character"));
}

#[test]
fn history_follows_persona_in_order() {
    let history = vec![
        ChatTurn::user("hi"),
        ChatTurn::assistant("Bawk!"),
        ChatTurn::user("how are you?"),
    ];
    let case = &golden_cases()[0];
    let request = PromptTemplate::builtin().build_request(&case.profile, &history, &ChatConfig::default());
    let roles: Vec<Role> = request.messages.iter().map(|t| t.role).collect();
    assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::User]);
    assert_eq!(request.last_user_message(), Some("how are you?"));
}

#[test]
fn template_file_overrides_builtin() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("pet_chat.toml");
    std::fs::write(
        &path,
        "[prompt]\nversion = \"2.0\"\nsystem = \"You are {pet_name}, a tiny {pet_species}.\\n{pet_memory}\"\n",
    )
    .expect("write template");

    let template = PromptTemplate::from_file(&path).expect("load");
    assert_eq!(template.version, "2.0");
    let rendered = template.render_system(&golden_cases()[2].profile);
    assert!(rendered.starts_with("You are Rex, a tiny dog."));
    assert!(rendered.contains("Mood: 4"));
}

#[tokio::test]
async fn online_eval_when_enabled() {
    if std::env::var("PAWZ_EVAL_LLM").is_err() {
        return;
    }
    let config = ChatConfig {
        provider: "ollama".into(),
        ..ChatConfig::default()
    };
    let client = LlmClient::from_config(&config).expect("client");
    let service = ChatService::new(client, config);
    for case in golden_cases() {
        let reply = service.reply(&case.profile, &[ChatTurn::user("Hello! How was your day?")]).await;
        assert!(!reply.text.is_empty(), "case '{}' got an empty reply", case.name);
        if reply.source == ReplySource::Fallback {
            eprintln!("case '{}': model unavailable, got canned reply", case.name);
        }
    }
}
