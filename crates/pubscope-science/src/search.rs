//! Searching: regular expressions over the local library, and author/year
//! queries against the bibliographic index.

use chrono::{Datelike, Local};
use pubscope_core::names::parse_name;
use pubscope_core::{CoreError, Publication, RecordStore};
use regex::RegexBuilder;

use crate::autolearn::translate_name;
use crate::error::{Result, ScienceError};
use crate::listing::truncate_words;
use crate::sources::{BibIndexSource, IndexQuery, SearchResults};

/// Rows asked of the index by default, and with `large` set.
pub const DEFAULT_ROWS: usize = 50;
pub const LARGE_ROWS: usize = 1000;

/// Hits printed unless `large` is set.
pub const SHORT_HIT_COUNT: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct GrepOptions {
    pub ignore_case: bool,
    /// Match `pattern` literally.
    pub fixed: bool,
    /// Search the identifiers and refdata instead of the title and abstract.
    pub refinfo: bool,
}

/// Publications with a field matching `pattern`, oldest first.
pub fn grep(
    store: &dyn RecordStore,
    pattern: &str,
    options: GrepOptions,
) -> Result<Vec<Publication>> {
    let source = if options.fixed {
        regex::escape(pattern)
    } else {
        pattern.to_string()
    };
    let regex = RegexBuilder::new(&source)
        .case_insensitive(options.ignore_case)
        .build()?;

    let mut matches = Vec::new();
    for publication in store.all_publications()? {
        let fields = grep_fields(&publication, options.refinfo)?;
        if fields.iter().any(|field| regex.is_match(field)) {
            matches.push(publication);
        }
    }
    Ok(matches)
}

fn grep_fields(publication: &Publication, refinfo: bool) -> Result<Vec<String>> {
    let mut fields: Vec<String> = if refinfo {
        [&publication.arxiv, &publication.bibcode, &publication.doi]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    } else {
        [&publication.title, &publication.abstract_text]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    };

    if refinfo && !publication.refdata.is_empty() {
        fields.push(serde_json::to_string(&publication.refdata).map_err(CoreError::from)?);
    }
    Ok(fields)
}

/// One parsed `rq` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Year(i32),
    Refereed,
    /// Lift the astronomy-database filter.
    AnyDatabase,
    Surname(String),
}

pub fn parse_search_terms<S: AsRef<str>>(terms: &[S]) -> Result<Vec<SearchTerm>> {
    parse_search_terms_in(terms, Local::now().year())
}

/// Parse terms as of `this_year`.
///
/// Integers are years. Two-digit years up to next year's last two digits
/// fall in this century, larger ones in the previous century. `+ref` and
/// `-ast` are flags, and at most one other word is allowed, taken as an
/// author surname.
pub fn parse_search_terms_in<S: AsRef<str>>(
    terms: &[S],
    this_year: i32,
) -> Result<Vec<SearchTerm>> {
    let next_two_digit = (this_year + 1) % 100;
    let century = this_year / 100 * 100;

    let mut parsed = Vec::new();
    let mut surname: Option<String> = None;

    for term in terms {
        let term = term.as_ref();
        if let Ok(year) = term.parse::<i32>() {
            let year = match year {
                y if y >= 100 => y,
                y if y > next_two_digit => y + century - 100,
                y => y + century,
            };
            parsed.push(SearchTerm::Year(year));
            continue;
        }

        match term {
            "+ref" => parsed.push(SearchTerm::Refereed),
            "-ast" => parsed.push(SearchTerm::AnyDatabase),
            word if surname.is_none() => surname = Some(word.to_string()),
            word => {
                return Err(ScienceError::InvalidSearch(format!(
                    "only one author surname is supported, got a second one \"{word}\""
                )));
            }
        }
    }

    if let Some(surname) = surname {
        parsed.push(SearchTerm::Surname(surname));
    }
    Ok(parsed)
}

/// Express parsed terms in the index's query syntax.
pub fn index_query(terms: &[SearchTerm], large: bool) -> Result<IndexQuery> {
    if terms.len() < 2 {
        return Err(ScienceError::InvalidSearch(
            "the bibliographic index needs at least two search terms".to_string(),
        ));
    }

    let mut clauses = Vec::new();
    let mut astronomy_only = true;
    for term in terms {
        match term {
            SearchTerm::Year(year) => clauses.push(format!("year:{year}")),
            SearchTerm::Refereed => clauses.push("property:refereed".to_string()),
            SearchTerm::AnyDatabase => astronomy_only = false,
            SearchTerm::Surname(surname) => clauses.push(format!("author:\"{surname}\"")),
        }
    }
    if clauses.is_empty() {
        return Err(ScienceError::InvalidSearch(
            "no year or author to search for".to_string(),
        ));
    }

    Ok(IndexQuery {
        query: clauses.join(" "),
        filters: if astronomy_only {
            vec!["database:astronomy".to_string()]
        } else {
            Vec::new()
        },
        rows: if large { LARGE_ROWS } else { DEFAULT_ROWS },
    })
}

/// Parse `terms` and run them against the index.
pub async fn search_index<S: AsRef<str>>(
    index: &dyn BibIndexSource,
    terms: &[S],
    large: bool,
) -> Result<SearchResults> {
    let query = index_query(&parse_search_terms(terms)?, large)?;
    index.search(&query).await
}

/// Render hits as a bibcode/title line followed by an indented line of
/// author surnames, with a note when not everything is shown.
pub fn format_search_results(
    results: &SearchResults,
    large: bool,
    line_width: usize,
) -> Vec<String> {
    let shown = if large {
        results.hits.len()
    } else {
        results.hits.len().min(SHORT_HIT_COUNT)
    };
    let hits = &results.hits[..shown];
    let bibcode_width = hits
        .iter()
        .map(|hit| hit.bibcode.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(hits.len() * 2 + 2);
    for hit in hits {
        let prefix = format!("{:>bibcode_width$}  ", hit.bibcode);
        let title = hit.title.as_deref().unwrap_or("(no title)");
        lines.push(format!(
            "{prefix}{}",
            truncate_words(title, bibcode_width + 2, line_width)
        ));

        let surnames: Vec<String> = hit
            .authors
            .iter()
            .map(|author| parse_name(&translate_name(author)).1)
            .collect();
        lines.push(format!(
            "    {}",
            truncate_words(&surnames.join(", "), 4, line_width)
        ));
    }

    let total = results
        .num_found
        .map_or(results.hits.len(), |n| n as usize)
        .max(results.hits.len());
    if total > shown {
        lines.push(String::new());
        lines.push(format!("(showing {shown} of {total} results)"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SearchHit;
    use crate::testing::{CallLog, FakeSources, fake_dispatcher};
    use pubscope_core::{Database, PubRecord};
    use serde_json::json;

    fn library() -> (Database, Vec<Publication>) {
        let db = Database::open_in_memory().unwrap();
        let mut first = PubRecord {
            title: Some("Radio Flares from Ultracool Dwarfs".into()),
            abstract_text: Some("We observed magnetic activity.".into()),
            bibcode: Some("2014ApJ...785....9W".into()),
            ..PubRecord::default()
        };
        first.refdata.insert("journal".into(), json!("ApJ"));
        let second = PubRecord {
            title: Some("Attention Is All You Need".into()),
            arxiv: Some("1706.03762".into()),
            doi: Some("10.48550/arXiv.1706.03762".into()),
            ..PubRecord::default()
        };
        let pubs = vec![
            db.create_publication(first).unwrap(),
            db.create_publication(second).unwrap(),
        ];
        (db, pubs)
    }

    fn ids(pubs: &[Publication]) -> Vec<i64> {
        pubs.iter().map(|p| p.id).collect()
    }

    #[test]
    fn grep_searches_title_and_abstract() {
        let (db, pubs) = library();

        let found = grep(&db, "magnetic", GrepOptions::default()).unwrap();
        assert_eq!(ids(&found), vec![pubs[0].id]);

        assert!(grep(&db, "attention", GrepOptions::default()).unwrap().is_empty());
        let options = GrepOptions {
            ignore_case: true,
            ..GrepOptions::default()
        };
        assert_eq!(ids(&grep(&db, "attention", options).unwrap()), vec![pubs[1].id]);
    }

    #[test]
    fn fixed_patterns_are_literal() {
        let (db, pubs) = library();
        let options = GrepOptions {
            fixed: true,
            refinfo: true,
            ..GrepOptions::default()
        };

        assert_eq!(ids(&grep(&db, "1706.03762", options).unwrap()), vec![pubs[1].id]);
        assert!(grep(&db, "1706x03762", options).unwrap().is_empty());
        assert!(grep(&db, "(", options).unwrap().is_empty());
    }

    #[test]
    fn refinfo_searches_identifiers_and_refdata() {
        let (db, pubs) = library();
        let options = GrepOptions {
            refinfo: true,
            ..GrepOptions::default()
        };

        assert_eq!(ids(&grep(&db, "\"journal\"", options).unwrap()), vec![pubs[0].id]);
        assert_eq!(ids(&grep(&db, "^2014ApJ", options).unwrap()), vec![pubs[0].id]);
        assert!(grep(&db, "Attention", options).unwrap().is_empty());
    }

    #[test]
    fn bad_pattern_is_reported() {
        let (db, _) = library();
        assert!(matches!(
            grep(&db, "(", GrepOptions::default()),
            Err(ScienceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn two_digit_years_pick_a_century() {
        let terms = parse_search_terms_in(&["14", "27", "28", "99", "1987"], 2026).unwrap();
        assert_eq!(
            terms,
            vec![
                SearchTerm::Year(2014),
                SearchTerm::Year(2027),
                SearchTerm::Year(1928),
                SearchTerm::Year(1999),
                SearchTerm::Year(1987),
            ]
        );
    }

    #[test]
    fn flags_and_surname() {
        let terms = parse_search_terms_in(&["williams", "+ref", "-ast", "2014"], 2026).unwrap();
        assert_eq!(
            terms,
            vec![
                SearchTerm::Refereed,
                SearchTerm::AnyDatabase,
                SearchTerm::Year(2014),
                SearchTerm::Surname("williams".into()),
            ]
        );

        assert!(matches!(
            parse_search_terms_in(&["williams", "berger"], 2026),
            Err(ScienceError::InvalidSearch(_))
        ));
    }

    #[test]
    fn index_query_needs_two_terms() {
        let query = index_query(
            &[SearchTerm::Year(2014), SearchTerm::Surname("williams".into())],
            false,
        )
        .unwrap();
        assert_eq!(query.query, "year:2014 author:\"williams\"");
        assert_eq!(query.filters, vec!["database:astronomy"]);
        assert_eq!(query.rows, DEFAULT_ROWS);

        let query = index_query(
            &[SearchTerm::AnyDatabase, SearchTerm::Refereed, SearchTerm::Year(2001)],
            true,
        )
        .unwrap();
        assert_eq!(query.query, "property:refereed year:2001");
        assert!(query.filters.is_empty());
        assert_eq!(query.rows, LARGE_ROWS);

        assert!(index_query(&[SearchTerm::Year(2014)], false).is_err());
        assert!(index_query(&[SearchTerm::AnyDatabase, SearchTerm::AnyDatabase], false).is_err());
    }

    #[tokio::test]
    async fn search_goes_through_the_index() {
        let log = CallLog::default();
        let dispatcher = fake_dispatcher(
            &log,
            FakeSources {
                search: SearchResults {
                    hits: vec![SearchHit {
                        bibcode: "2014ApJ...785....9W".into(),
                        title: Some("Radio Flares".into()),
                        authors: vec!["Williams, P. K. G.".into()],
                    }],
                    num_found: Some(1),
                },
                ..FakeSources::default()
            },
        );

        let results = search_index(dispatcher.bib_index(), &["1999", "williams"], false)
            .await
            .unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(
            log.calls(),
            vec!["ads.query:year:1999 author:\"williams\" fq=database:astronomy rows=50"]
        );
    }

    #[test]
    fn results_show_surnames_and_truncation_note() {
        let hit = |bibcode: &str, title: Option<&str>| SearchHit {
            bibcode: bibcode.into(),
            title: title.map(String::from),
            authors: vec!["Williams, P. K. G.".into(), "von Trapp, A.".into()],
        };
        let results = SearchResults {
            hits: vec![
                hit("2014ApJ...785....9W", Some("Radio Flares")),
                hit("1991PhDT.......161W", None),
            ],
            num_found: Some(120),
        };

        let lines = format_search_results(&results, true, 80);
        assert_eq!(lines[0], "2014ApJ...785....9W  Radio Flares");
        assert_eq!(lines[1], "    Williams, von Trapp");
        assert_eq!(lines[2], "1991PhDT.......161W  (no title)");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "(showing 2 of 120 results)");

        let many = SearchResults {
            hits: (0..25).map(|i| hit(&format!("20{i:02}ApJ"), Some("T"))).collect(),
            num_found: None,
        };
        let lines = format_search_results(&many, false, 80);
        assert_eq!(lines.len(), SHORT_HIT_COUNT * 2 + 2);
        assert_eq!(lines.last().unwrap(), "(showing 20 of 25 results)");
    }
}
