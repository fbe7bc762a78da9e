//! Parser for the bibliographic index's tagged export format.
//!
//! Records look like
//!
//! ```text
//! %R 2020ApJ...1..2S
//! %A Smith, Jane; Doe, John
//! %T A title that can
//!    wrap onto the next line
//! %D 03/2020
//! ```
//!
//! A tag stays open until the next `%` line or a blank line.

use pubscope_core::PubRecord;
use pubscope_core::names::encode_name;

use crate::error::{Provider, Result, ScienceError};

struct OpenTag {
    tag: char,
    text: String,
}

/// Parse an exported record. `target` names the bibcode for error messages.
pub fn parse_tagged_record<I, S>(lines: I, target: &str) -> Result<PubRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut record = PubRecord::pending();
    let mut open: Option<OpenTag> = None;

    for line in lines {
        let line = line.as_ref().trim();

        if line.is_empty() {
            if let Some(done) = open.take() {
                apply_tag(&mut record, done);
            }
            continue;
        }

        if line.starts_with('%') {
            if let Some(done) = open.take() {
                apply_tag(&mut record, done);
            }
            open = open_tag(line);
            continue;
        }

        match open.as_mut() {
            Some(current) => {
                current.text.push(' ');
                current.text.push_str(line);
            }
            None if line.starts_with("Retrieved ") => {
                if !line.ends_with("selected: 1.") {
                    return Err(ScienceError::malformed(
                        Provider::Ads,
                        target,
                        format!("expected exactly one record, got banner \"{line}\""),
                    ));
                }
            }
            None => {}
        }
    }

    if let Some(done) = open.take() {
        apply_tag(&mut record, done);
    }

    Ok(record)
}

/// `%X text`: tag character second, text from the fourth character on.
fn open_tag(line: &str) -> Option<OpenTag> {
    let mut chars = line.chars();
    chars.next();
    let tag = chars.next()?;
    chars.next();
    Some(OpenTag {
        tag,
        text: chars.as_str().to_string(),
    })
}

fn apply_tag(record: &mut PubRecord, OpenTag { tag, text }: OpenTag) {
    match tag {
        'T' => record.title = Some(text),
        'D' => {
            if let Some(year) = parse_year(&text) {
                record.year = Some(year);
            }
        }
        'B' => record.abstract_text = Some(text),
        'A' => {
            record.authors = text
                .split(';')
                .filter(|piece| !piece.trim().is_empty())
                .map(translate_name)
                .collect();
        }
        'Y' => apply_identifiers(record, &text),
        other => tracing::trace!("ignoring tag %{other}"),
    }
}

/// The trailing slash segment that looks like a year, else the last
/// numeric one: `03/2020` and `2019/99` both give their four-digit year.
fn parse_year(text: &str) -> Option<i32> {
    let segments: Vec<&str> = text.split('/').map(str::trim).collect();
    let is_digits = |s: &&str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    segments
        .iter()
        .rev()
        .copied()
        .find(|s| s.len() == 4 && is_digits(s))
        .or_else(|| segments.iter().rev().copied().find(is_digits))
        .and_then(|s| s.parse().ok())
}

/// `"von Trapp, Albert J."` to `"Albert J. von_Trapp"`.
pub(crate) fn translate_name(piece: &str) -> String {
    match piece.split_once(',') {
        Some((surname, given)) => encode_name(given.trim(), surname.trim()),
        None => encode_name("", piece.trim()),
    }
}

fn apply_identifiers(record: &mut PubRecord, text: &str) {
    for item in text.split(';') {
        let Some((key, value)) = item.trim().split_once(": ") else {
            continue;
        };
        let value = value.trim();

        match key {
            "DOI" => record.doi = Some(value.to_string()),
            "eprintid" => {
                if let Some(arxiv) = value.strip_prefix("arXiv:") {
                    record.arxiv = Some(arxiv.to_string());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<PubRecord> {
        parse_tagged_record(text.lines(), "2019test")
    }

    #[test]
    fn parses_basic_record() {
        let record = parse("%T First\n%D 2019/99\n%A Smith, Jane; Doe, John\n\n").unwrap();
        assert_eq!(record.title.as_deref(), Some("First"));
        assert_eq!(record.year, Some(2019));
        assert_eq!(record.authors, vec!["Jane Smith", "John Doe"]);
        assert!(!record.keep);
    }

    #[test]
    fn provider_date_form_gives_year() {
        let record = parse("%D 03/2020\n").unwrap();
        assert_eq!(record.year, Some(2020));

        let record = parse("%D 7/99\n").unwrap();
        assert_eq!(record.year, Some(99));

        let record = parse("%D sometime\n").unwrap();
        assert_eq!(record.year, None);
    }

    #[test]
    fn continuation_lines_join_with_a_space() {
        let record = parse("%T A title that\n   wraps around\n%B An\nabstract\n").unwrap();
        assert_eq!(record.title.as_deref(), Some("A title that wraps around"));
        assert_eq!(record.abstract_text.as_deref(), Some("An abstract"));
    }

    #[test]
    fn multiword_surnames_become_underscored() {
        let record = parse("%A von Trapp Rodolfo, Albert J.; Gopal-Krishna;\n").unwrap();
        assert_eq!(
            record.authors,
            vec!["Albert J. von_Trapp_Rodolfo", "Gopal-Krishna"]
        );
    }

    #[test]
    fn identifier_subrecord() {
        let record =
            parse("%Y DOI: 10.1000/xyz; eprintid: arXiv:1706.03762; SCI-ID: none; junk\n").unwrap();
        assert_eq!(record.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(record.arxiv.as_deref(), Some("1706.03762"));

        let record = parse("%Y eprintid: astro-ph/0101001\n").unwrap();
        assert_eq!(record.arxiv, None);
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let record = parse("%R 2019test\n%Z something new\n%T Kept\n%J ApJ, 1, 2\n").unwrap();
        assert_eq!(record.title.as_deref(), Some("Kept"));
    }

    #[test]
    fn single_result_banner_is_accepted() {
        let record = parse("Retrieved 1 abstracts, total 1 selected: 1.\n\n%T Ok\n").unwrap();
        assert_eq!(record.title.as_deref(), Some("Ok"));
    }

    #[test]
    fn multiple_result_banner_is_fatal() {
        let err = parse("Retrieved 2 papers\n%T Nope\n").unwrap_err();
        assert!(matches!(
            err,
            ScienceError::MalformedProviderPayload { provider: Provider::Ads, ref target, .. }
                if target == "2019test"
        ));
    }

    #[test]
    fn banner_inside_open_tag_is_continuation() {
        let record = parse("%T Retrieved\nRetrieved 2 papers\n").unwrap();
        assert_eq!(record.title.as_deref(), Some("Retrieved Retrieved 2 papers"));
    }

    #[test]
    fn empty_input_gives_empty_record() {
        let record = parse("").unwrap();
        assert_eq!(record, PubRecord::pending());
    }
}
