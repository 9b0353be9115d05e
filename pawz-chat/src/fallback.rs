//! Canned species replies and exchange summaries.
//!
//! Used when no model is configured or the model fails; the pet still
//! "answers" in its own voice.

use rand::Rng;
use rand::seq::SliceRandom;

use pawz_core::types::Species;

/// Longest quote kept from each side of an exchange summary.
pub const SUMMARY_QUOTE_CHARS: usize = 80;

const CHICKEN: &[&str] = &["Cluck cluck!", "Bawk bawk!", "Clucky cluck!", "Baaawk!"];
const CAT: &[&str] = &["Meow!", "Purr purr!", "Mrow!", "Mew mew!"];
const DOG: &[&str] = &["Woof!", "Bark bark!", "Wag wag!", "Arf arf!"];
const DUCK: &[&str] = &["Quack quack!", "Quaaack!", "Quack!", "Quack quack quack!"];

/// Every canned line for `species`.
#[must_use]
pub fn canned_replies(species: Species) -> &'static [&'static str] {
    match species {
        Species::Chicken => CHICKEN,
        Species::Cat => CAT,
        Species::Dog => DOG,
        Species::Duck => DUCK,
    }
}

/// A random canned line for `species`.
pub fn canned_reply<R: Rng + ?Sized>(species: Species, rng: &mut R) -> &'static str {
    canned_replies(species).choose(rng).copied().unwrap_or("...")
}

/// One-line memory of an exchange:
/// `You said "<user>"; <name> replied "<reply>"`.
#[must_use]
pub fn summarize_exchange(name: &str, user: &str, reply: &str) -> String {
    format!(
        "You said \"{}\"; {name} replied \"{}\"",
        truncate(user.trim()),
        truncate(reply.trim())
    )
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(SUMMARY_QUOTE_CHARS) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn canned_reply_matches_species() {
        let mut rng = StdRng::seed_from_u64(1);
        for species in Species::ALL {
            for _ in 0..20 {
                let line = canned_reply(species, &mut rng);
                assert!(canned_replies(species).contains(&line));
            }
        }
        assert!(canned_replies(Species::Duck).contains(&"Quaaack!"));
    }

    #[test]
    fn summary_format() {
        let s = summarize_exchange("Clucky", "  hello there ", "Bawk bawk!");
        assert_eq!(s, "You said \"hello there\"; Clucky replied \"Bawk bawk!\"");
    }

    #[test]
    fn summary_truncates_long_quotes_on_char_boundaries() {
        let long = "é".repeat(200);
        let s = summarize_exchange("Rex", &long, "Woof!");
        let quoted = s
            .strip_prefix("You said \"")
            .and_then(|rest| rest.split('"').next())
            .expect("quoted user text");
        assert_eq!(quoted.chars().count(), SUMMARY_QUOTE_CHARS);
    }
}
