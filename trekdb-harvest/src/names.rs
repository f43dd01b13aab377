//! Character name handling
//!
//! Two different transformations live here:
//! - [`normalize_name`]: identity key used by deduplication (lowercased,
//!   honorifics and suffixes stripped, middle initials dropped)
//! - [`prepare_lookup_name`]: display-case name sent to the wiki search
//!   (abbreviated first names expanded, one honorific stripped)
//!
//! The curated tables at the bottom cover the main cast, whose records
//! appear under enough variants (nicknames, ranks) that generic
//! normalization cannot join them.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Rank and title words stripped from the front of names
///
/// Multi-word entries come first so "Lieutenant Commander Data" loses both words.
const HONORIFICS: &[&str] = &[
    "fleet admiral",
    "rear admiral",
    "vice admiral",
    "lieutenant commander",
    "lieutenant junior grade",
    "chief petty officer",
    "grand nagus",
    "admiral",
    "commodore",
    "captain",
    "commander",
    "lieutenant",
    "ensign",
    "colonel",
    "major",
    "general",
    "sergeant",
    "cadet",
    "crewman",
    "chief",
    "doctor",
    "dr",
    "professor",
    "counselor",
    "nurse",
    "ambassador",
    "chancellor",
    "legate",
    "gul",
    "kai",
    "vedek",
    "mister",
    "mr",
    "mrs",
    "ms",
    "miss",
];

/// Trailing generational suffixes
const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Strip trailing `.` and `,` from a token
fn bare(token: &str) -> &str {
    token.trim_end_matches(['.', ','])
}

/// Length (in tokens) of the honorific at the start of `tokens`, if any
fn leading_honorific_len(tokens: &[&str]) -> Option<usize> {
    HONORIFICS.iter().find_map(|honorific| {
        let words: Vec<&str> = honorific.split(' ').collect();
        if tokens.len() <= words.len() {
            // Never strip a name down to nothing ("Captain", "The Doctor")
            return None;
        }
        let matched = words
            .iter()
            .zip(tokens.iter())
            .all(|(word, token)| bare(token).eq_ignore_ascii_case(word));
        matched.then_some(words.len())
    })
}

/// Identity key for deduplication
///
/// `"Captain James T. Kirk"` -> `"james kirk"`,
/// `"Miles Edward O'Brien, Jr."` -> `"miles edward o'brien"`
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();

    while let Some(len) = leading_honorific_len(&tokens) {
        tokens.drain(..len);
    }

    while tokens.len() > 1 {
        let last = bare(tokens[tokens.len() - 1]);
        if SUFFIXES.contains(&last) {
            tokens.pop();
        } else {
            break;
        }
    }

    let count = tokens.len();
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| {
            let is_middle = *i > 0 && *i + 1 < count;
            !(is_middle && bare(token).chars().count() == 1)
        })
        .map(|(_, token)| bare(token))
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Name to send to the wiki search
///
/// An abbreviated first name ("J. Kirk") is expanded when the curated table
/// knows it; then a single leading honorific is removed.
pub fn prepare_lookup_name(name: &str) -> String {
    let trimmed = name.trim();

    let expanded = if starts_with_initial(trimmed) {
        KNOWN_FULL_NAMES
            .iter()
            .find(|(short, _)| short.eq_ignore_ascii_case(trimmed))
            .map(|(_, full)| full.to_string())
            .unwrap_or_else(|| trimmed.to_string())
    } else {
        trimmed.to_string()
    };

    let tokens: Vec<&str> = expanded.split_whitespace().collect();
    match leading_honorific_len(&tokens) {
        Some(len) => tokens[len..].join(" "),
        None => tokens.join(" "),
    }
}

/// "X. Something": single letter, period, whitespace
fn starts_with_initial(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some('.'), Some(space)) if letter.is_alphabetic() && space.is_whitespace()
    )
}

/// Abbreviated names seen in STAPI data and their full forms
const KNOWN_FULL_NAMES: &[(&str, &str)] = &[
    ("J. Kirk", "James T. Kirk"),
    ("L. McCoy", "Leonard McCoy"),
    ("M. Scott", "Montgomery Scott"),
    ("H. Sulu", "Hikaru Sulu"),
    ("P. Chekov", "Pavel Chekov"),
    ("N. Uhura", "Nyota Uhura"),
    ("C. Pike", "Christopher Pike"),
    ("J. Picard", "Jean-Luc Picard"),
    ("W. Riker", "William T. Riker"),
    ("B. Crusher", "Beverly Crusher"),
    ("W. Crusher", "Wesley Crusher"),
    ("D. Troi", "Deanna Troi"),
    ("G. La Forge", "Geordi La Forge"),
    ("B. Sisko", "Benjamin Sisko"),
    ("J. Sisko", "Jake Sisko"),
    ("J. Bashir", "Julian Bashir"),
    ("M. O'Brien", "Miles O'Brien"),
    ("K. Janeway", "Kathryn Janeway"),
    ("C. Chakotay", "Chakotay"),
    ("T. Paris", "Tom Paris"),
    ("B. Torres", "B'Elanna Torres"),
    ("H. Kim", "Harry Kim"),
    ("J. Archer", "Jonathan Archer"),
    ("M. Burnham", "Michael Burnham"),
];

/// Main-cast characters: canonical name plus variants to union with it
struct ImportantCharacter {
    canonical: &'static str,
    aliases: &'static [&'static str],
}

const IMPORTANT_CHARACTERS: &[ImportantCharacter] = &[
    ImportantCharacter { canonical: "James T. Kirk", aliases: &["Jim Kirk", "James Tiberius Kirk", "Kirk"] },
    ImportantCharacter { canonical: "Spock", aliases: &["S'chn T'gai Spock", "Mr. Spock"] },
    ImportantCharacter { canonical: "Leonard McCoy", aliases: &["Bones", "Bones McCoy", "Leonard H. McCoy"] },
    ImportantCharacter { canonical: "Montgomery Scott", aliases: &["Scotty"] },
    ImportantCharacter { canonical: "Nyota Uhura", aliases: &["Uhura"] },
    ImportantCharacter { canonical: "Hikaru Sulu", aliases: &["Sulu"] },
    ImportantCharacter { canonical: "Pavel Chekov", aliases: &["Chekov"] },
    ImportantCharacter { canonical: "Christopher Pike", aliases: &["Chris Pike"] },
    ImportantCharacter { canonical: "Jean-Luc Picard", aliases: &["Picard"] },
    ImportantCharacter { canonical: "William T. Riker", aliases: &["Will Riker"] },
    ImportantCharacter { canonical: "Data", aliases: &[] },
    ImportantCharacter { canonical: "Worf", aliases: &["Worf, son of Mogh"] },
    ImportantCharacter { canonical: "Geordi La Forge", aliases: &["Geordi LaForge"] },
    ImportantCharacter { canonical: "Beverly Crusher", aliases: &["Beverly Howard"] },
    ImportantCharacter { canonical: "Deanna Troi", aliases: &[] },
    ImportantCharacter { canonical: "Benjamin Sisko", aliases: &["Ben Sisko"] },
    ImportantCharacter { canonical: "Kira Nerys", aliases: &["Nerys Kira"] },
    ImportantCharacter { canonical: "Odo", aliases: &[] },
    ImportantCharacter { canonical: "Quark", aliases: &[] },
    ImportantCharacter { canonical: "Julian Bashir", aliases: &[] },
    ImportantCharacter { canonical: "Jadzia Dax", aliases: &[] },
    ImportantCharacter { canonical: "Kathryn Janeway", aliases: &[] },
    ImportantCharacter { canonical: "Chakotay", aliases: &[] },
    ImportantCharacter { canonical: "Seven of Nine", aliases: &["Annika Hansen"] },
    ImportantCharacter { canonical: "The Doctor", aliases: &["EMH"] },
    ImportantCharacter { canonical: "Jonathan Archer", aliases: &[] },
    ImportantCharacter { canonical: "T'Pol", aliases: &[] },
    ImportantCharacter { canonical: "Michael Burnham", aliases: &[] },
];

/// normalized variant -> normalized canonical name
fn alias_index() -> &'static HashMap<String, String> {
    static INDEX: OnceLock<HashMap<String, String>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index = HashMap::new();
        for character in IMPORTANT_CHARACTERS {
            let canonical = normalize_name(character.canonical);
            for alias in character.aliases {
                index.insert(normalize_name(alias), canonical.clone());
            }
            index.insert(canonical.clone(), canonical);
        }
        index
    })
}

/// Canonical normalized name if `normalized` belongs to a curated character
pub fn important_group_key(normalized: &str) -> Option<&'static str> {
    alias_index().get(normalized).map(String::as_str)
}

/// Whether a (raw) name belongs to the curated main cast
pub fn is_important_name(name: &str) -> bool {
    important_group_key(&normalize_name(name)).is_some()
}
