use aqibot_core::{BlockedUsers, LocationQuery, NamedLocation};
use serde::{Deserialize, Serialize};

use crate::tokenizer::tokenize;

/// Form fields Slack posts for a slash command invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    pub text: String,
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub response_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedCommand {
    LocationLookup(LocationQuery),
    NamedLocation(NamedLocation),
    CigaretteEquivalent(Box<ResolvedCommand>),
    BlockedUser,
    Malformed,
}

impl ResolvedCommand {
    /// The location to fetch, if this command needs a reading at all.
    pub fn location(&self) -> Option<LocationQuery> {
        match self {
            Self::LocationLookup(query) => Some(query.clone()),
            Self::NamedLocation(named) => Some(named.query()),
            Self::CigaretteEquivalent(inner) => inner.location(),
            Self::BlockedUser | Self::Malformed => None,
        }
    }

    pub fn wants_cigarettes(&self) -> bool {
        matches!(self, Self::CigaretteEquivalent(_))
    }
}

const DEFAULT_LOCATION: NamedLocation = NamedLocation::Sf;
const CITY_PREFIX: &str = "city";
const POLITE_WORD: &str = "please";
const CIGARETTE_WORD: &str = "cigarettes";

#[derive(Clone, Copy, Debug)]
enum AliasPattern {
    Contains(&'static str),
    Exact(&'static str),
}

/// Checked top to bottom; the first matching entry wins.
const ALIAS_TABLE: &[(NamedLocation, &[AliasPattern])] = &[
    (NamedLocation::Sf, &[AliasPattern::Contains("sf"), AliasPattern::Contains("san francisco")]),
    (NamedLocation::Nyc, &[AliasPattern::Contains("nyc"), AliasPattern::Contains("new york")]),
    (NamedLocation::Seattle, &[AliasPattern::Contains("seattle")]),
    (
        NamedLocation::La,
        &[
            AliasPattern::Contains(" la "),
            AliasPattern::Exact("la"),
            AliasPattern::Contains("los angeles"),
        ],
    ),
];

struct CommandInput<'a> {
    trimmed: &'a str,
    lowered: String,
}

type LocationRule = fn(&CommandInput<'_>) -> Option<ResolvedCommand>;

/// Location rules in precedence order, consulted after the block-list check.
const LOCATION_RULES: &[LocationRule] = &[city_command, named_alias];

/// Resolves free text from `user_id` into a command.
///
/// Blocked users are refused unless they say "please". Otherwise a `city`
/// command beats the alias table, which beats the default city. Mentioning
/// "cigarettes" anywhere switches the output format without changing the
/// location.
pub fn resolve(text: &str, user_id: &str, blocked_users: &BlockedUsers) -> ResolvedCommand {
    let trimmed = text.trim();
    let input = CommandInput { trimmed, lowered: trimmed.to_lowercase() };

    if blocked_users.contains(user_id) && !input.lowered.contains(POLITE_WORD) {
        return ResolvedCommand::BlockedUser;
    }

    let resolved = LOCATION_RULES
        .iter()
        .find_map(|rule| rule(&input))
        .unwrap_or(ResolvedCommand::NamedLocation(DEFAULT_LOCATION));

    if input.lowered.contains(CIGARETTE_WORD) {
        ResolvedCommand::CigaretteEquivalent(Box::new(resolved))
    } else {
        resolved
    }
}

fn city_command(input: &CommandInput<'_>) -> Option<ResolvedCommand> {
    let remainder = strip_city_prefix(input.trimmed)?;
    let tokens = tokenize(remainder);
    let [city, state, country, ..] = tokens.as_slice() else {
        return Some(ResolvedCommand::Malformed);
    };

    let query = LocationQuery::new(title_case(city), title_case(state), title_case(country));
    Some(query.map(ResolvedCommand::LocationLookup).unwrap_or(ResolvedCommand::Malformed))
}

fn strip_city_prefix(text: &str) -> Option<&str> {
    let prefix = text.get(..CITY_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(CITY_PREFIX) {
        return None;
    }

    let remainder = &text[CITY_PREFIX.len()..];
    remainder.starts_with(' ').then_some(remainder)
}

fn named_alias(input: &CommandInput<'_>) -> Option<ResolvedCommand> {
    ALIAS_TABLE
        .iter()
        .find(|(_, patterns)| {
            patterns.iter().any(|pattern| match pattern {
                AliasPattern::Contains(needle) => input.lowered.contains(needle),
                AliasPattern::Exact(expected) => input.lowered == *expected,
            })
        })
        .map(|(location, _)| ResolvedCommand::NamedLocation(*location))
}

/// Upper-cases the first letter of every space-separated word, leaving the
/// rest of each word as typed so acronyms like `USA` survive.
fn title_case(token: &str) -> String {
    let mut output = String::with_capacity(token.len());
    let mut at_word_start = true;

    for ch in token.chars() {
        if at_word_start {
            output.extend(ch.to_uppercase());
        } else {
            output.push(ch);
        }
        at_word_start = ch == ' ';
    }

    output
}

#[cfg(test)]
mod tests {
    use aqibot_core::{BlockedUsers, LocationQuery, NamedLocation};

    use super::{resolve, title_case, ResolvedCommand, SlashCommandPayload};

    fn open() -> BlockedUsers {
        BlockedUsers::default()
    }

    fn lookup(city: &str, state: &str, country: &str) -> ResolvedCommand {
        ResolvedCommand::LocationLookup(
            LocationQuery::new(city, state, country).expect("valid location"),
        )
    }

    #[test]
    fn named_aliases_resolve_in_table_order() {
        assert_eq!(resolve("sf", "u1", &open()), ResolvedCommand::NamedLocation(NamedLocation::Sf));
        assert_eq!(
            resolve("how is San Francisco", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
        assert_eq!(
            resolve("NYC", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Nyc)
        );
        assert_eq!(
            resolve("new york today", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Nyc)
        );
        assert_eq!(
            resolve("seattle", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Seattle)
        );
        assert_eq!(
            resolve("  LA  ", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::La)
        );
        assert_eq!(
            resolve("air in los angeles", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::La)
        );
        assert_eq!(
            resolve("what about la today", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::La)
        );
        // Earlier table entries shadow later ones.
        assert_eq!(
            resolve("nyc vs sf", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
    }

    #[test]
    fn la_requires_padding_or_exact_match() {
        assert_eq!(
            resolve("atlanta", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
        assert_eq!(
            resolve("what about la", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
    }

    #[test]
    fn unknown_text_defaults_to_san_francisco() {
        assert_eq!(resolve("", "u1", &open()), ResolvedCommand::NamedLocation(NamedLocation::Sf));
        assert_eq!(
            resolve("how's the air", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
    }

    #[test]
    fn blocked_users_are_refused_unless_polite() {
        let blocked = BlockedUsers::new(["blocked-user"]);

        assert_eq!(resolve("nyc", "blocked-user", &blocked), ResolvedCommand::BlockedUser);
        assert_eq!(
            resolve("cigarettes nyc", "blocked-user", &blocked),
            ResolvedCommand::BlockedUser
        );
        assert_eq!(
            resolve("nyc please", "blocked-user", &blocked),
            ResolvedCommand::NamedLocation(NamedLocation::Nyc)
        );
        assert_eq!(
            resolve("PLEASE seattle", "blocked-user", &blocked),
            ResolvedCommand::NamedLocation(NamedLocation::Seattle)
        );
        assert_eq!(
            resolve("nyc", "someone-else", &blocked),
            ResolvedCommand::NamedLocation(NamedLocation::Nyc)
        );
    }

    #[test]
    fn city_command_builds_a_location_lookup() {
        assert_eq!(
            resolve(r#"city "Los Angeles" California USA"#, "u1", &open()),
            lookup("Los Angeles", "California", "USA")
        );
        assert_eq!(
            resolve(r#"City “salt lake city” utah USA extra tokens"#, "u1", &open()),
            lookup("Salt Lake City", "Utah", "USA")
        );
    }

    #[test]
    fn city_command_beats_alias_table() {
        assert_eq!(
            resolve("city seattle washington usa", "u1", &open()),
            lookup("Seattle", "Washington", "Usa")
        );
    }

    #[test]
    fn short_city_command_is_malformed() {
        assert_eq!(resolve("city foo bar", "u1", &open()), ResolvedCommand::Malformed);
        assert_eq!(
            resolve("city ", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
        assert_eq!(
            resolve("city cigarettes", "u1", &open()),
            ResolvedCommand::CigaretteEquivalent(Box::new(ResolvedCommand::Malformed))
        );
    }

    #[test]
    fn city_word_without_separator_is_not_a_command() {
        assert_eq!(
            resolve("citywide nyc", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Nyc)
        );
        assert_eq!(
            resolve("city\tfoo bar baz", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Sf)
        );
        assert_eq!(
            resolve("city\tseattle wa usa", "u1", &open()),
            ResolvedCommand::NamedLocation(NamedLocation::Seattle)
        );
    }

    #[test]
    fn cigarettes_wraps_the_resolved_location() {
        assert_eq!(
            resolve("cigarettes nyc", "u1", &open()),
            ResolvedCommand::CigaretteEquivalent(Box::new(ResolvedCommand::NamedLocation(
                NamedLocation::Nyc
            )))
        );
        assert_eq!(
            resolve("Cigarettes", "u1", &open()),
            ResolvedCommand::CigaretteEquivalent(Box::new(ResolvedCommand::NamedLocation(
                NamedLocation::Sf
            )))
        );
        assert_eq!(
            resolve(r#"city Oakland California USA cigarettes"#, "u1", &open()),
            ResolvedCommand::CigaretteEquivalent(Box::new(lookup("Oakland", "California", "USA")))
        );
    }

    #[test]
    fn resolved_commands_expose_their_location() {
        let command = resolve("cigarettes seattle", "u1", &open());
        assert!(command.wants_cigarettes());
        let city = command.location().map(|query| query.city().to_owned());
        assert_eq!(city.as_deref(), Some("Seattle"));
        assert_eq!(ResolvedCommand::Malformed.location(), None);
        assert_eq!(ResolvedCommand::BlockedUser.location(), None);
    }

    #[test]
    fn resolving_is_deterministic() {
        let blocked = BlockedUsers::new(["U9"]);
        for text in ["cigarettes nyc", r#"city "A B" C D"#, "la", "U9 please"] {
            assert_eq!(resolve(text, "U9", &blocked), resolve(text, "U9", &blocked));
        }
    }

    #[test]
    fn title_case_preserves_existing_capitals() {
        assert_eq!(title_case("new york city"), "New York City");
        assert_eq!(title_case("USA"), "USA");
        assert_eq!(title_case("émile"), "Émile");
    }

    #[test]
    fn slash_payload_parses_from_form_body() {
        let payload: SlashCommandPayload = serde_urlencoded::from_str(
            "command=%2Faqi&text=cigarettes+nyc&user_id=U1&channel_id=C1&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2F1",
        )
        .expect("form body");

        assert_eq!(payload.command, "/aqi");
        assert_eq!(payload.text, "cigarettes nyc");
        assert_eq!(payload.user_id, "U1");
        assert_eq!(payload.response_url.as_deref(), Some("https://hooks.slack.com/commands/1"));
    }
}
