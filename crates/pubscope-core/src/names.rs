//! Author name handling.
//!
//! Names are stored as `"<given names> <surname>"` where spaces inside the
//! surname are replaced with underscores, e.g. `"Albert J. von_Trapp_Rodolfo,_Jr."`.
//! Splitting on the last space then always recovers the surname. Single-word
//! and collective names ("Gopal-Krishna", "The_Fermi-LAT_Collaboration") have an
//! empty given-name part.
//!
//! The NFAS ("normalized first-author surname") is a lowercase, accent-free
//! key in which every run of non-letters becomes a single `.`, with no `.` at
//! either end; it is the join key for `surname.year` lookups.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z]+").unwrap());
static DOT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Split a stored name into `(given, surname)`.
pub fn parse_name(stored: &str) -> (String, String) {
    match stored.rsplit_once(' ') {
        Some((given, surname)) => (given.to_string(), surname.replace('_', " ")),
        None => (String::new(), stored.replace('_', " ")),
    }
}

/// Inverse of [`parse_name`].
pub fn encode_name(given: &str, surname: &str) -> String {
    let surname = surname.replace(' ', "_");
    if given.is_empty() {
        surname
    } else {
        format!("{given} {surname}")
    }
}

/// Reduce a surname to its NFAS fragment.
///
/// `"von Trapp-Rodolfo, Jr."` becomes `"von.trapp.rodolfo.jr"`.
pub fn normalize_surname(surname: &str) -> String {
    let ascii: String = surname.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let dotted = NON_LETTERS.replace_all(&lowered, ".");
    DOT_RUNS
        .replace_all(&dotted, ".")
        .trim_matches('.')
        .to_string()
}

/// NFAS of a stored author name.
pub fn nfas_of(stored: &str) -> String {
    normalize_surname(&parse_name(stored).1)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn squish_spaces(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
