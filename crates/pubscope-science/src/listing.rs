//! Numbered listings and the `%N` shorthand behind them.
//!
//! Printing a listing replaces the reserved list with what was printed, so
//! `%3` means "the third line of the last listing" until the next one.

use pubscope_core::{Publication, RecordStore};
use serde::Serialize;

use crate::error::Result;

/// One printed line of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    /// One-based; what `%N` refers to.
    pub index: usize,
    pub pub_id: i64,
    pub nfas: String,
    pub year: String,
    pub nickname: String,
    pub title: String,
}

/// Build listing rows for `pubs` and record them as the last listing.
pub fn record_listing(
    store: &dyn RecordStore,
    pubs: &[Publication],
    sort_by_year: bool,
) -> Result<Vec<ListingRow>> {
    let mut rows = Vec::with_capacity(pubs.len());
    for publication in pubs {
        rows.push(ListingRow {
            index: 0,
            pub_id: publication.id,
            nfas: publication
                .nfas
                .clone()
                .unwrap_or_else(|| "(no author)".to_string()),
            year: publication
                .year
                .map(|year| format!("{year:04}"))
                .unwrap_or_else(|| "????".to_string()),
            nickname: store.choose_nickname(publication.id)?.unwrap_or_default(),
            title: publication
                .title
                .clone()
                .unwrap_or_else(|| "(no title)".to_string()),
        });
    }

    // "????" sorts after every digit string.
    if sort_by_year {
        rows.sort_by(|a, b| a.year.cmp(&b.year));
    }

    for (i, row) in rows.iter_mut().enumerate() {
        row.index = i + 1;
    }

    let ids: Vec<i64> = rows.iter().map(|row| row.pub_id).collect();
    store.set_reserved_listing(&ids)?;

    Ok(rows)
}

/// Render rows as aligned text lines no wider than `line_width` where the
/// title allows it.
pub fn format_listing(rows: &[ListingRow], line_width: usize) -> Vec<String> {
    let idx_width = rows.len().to_string().len();
    let nfas_width = rows.iter().map(|r| r.nfas.chars().count()).max().unwrap_or(0);
    let nick_width = rows
        .iter()
        .map(|r| r.nickname.chars().count())
        .max()
        .unwrap_or(0);

    rows.iter()
        .map(|row| {
            let prefix = format!(
                "%{:<idx_width$}  {:>nfas_width$}.{}  {:>nick_width$}  ",
                row.index, row.nfas, row.year, row.nickname
            );
            let offset = prefix.chars().count();
            prefix + &truncate_words(&row.title, offset, line_width)
        })
        .collect()
}

/// Fit `text` into the columns left after `offset`, cutting at word
/// boundaries and marking the cut with `" ..."`.
pub(crate) fn truncate_words(text: &str, offset: usize, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let full = words.join(" ");
    if offset + full.chars().count() < width {
        return full;
    }

    let budget = width.saturating_sub(4);
    let mut used = offset;
    let mut out = String::new();
    for word in words {
        let n = word.chars().count();
        let needed = if out.is_empty() { n } else { n + 1 };
        if used + needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }
    out.push_str(" ...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubscope_core::{Database, PubRecord};

    fn add(db: &Database, title: Option<&str>, author: Option<&str>, year: Option<i32>) -> Publication {
        db.create_publication(PubRecord {
            title: title.map(String::from),
            authors: author.map(|a| vec![a.to_string()]).unwrap_or_default(),
            year,
            keep: true,
            ..PubRecord::default()
        })
        .unwrap()
    }

    #[test]
    fn listing_sorts_by_year_and_records_order() {
        let db = Database::open_in_memory().unwrap();
        let late = add(&db, Some("Late"), Some("Jane Smith"), Some(2020));
        let undated = add(&db, None, None, None);
        let early = add(&db, Some("Early"), Some("John Doe"), Some(1999));
        db.add_nickname(early.id, "doe99").unwrap();

        let rows = record_listing(&db, &[late.clone(), undated.clone(), early.clone()], true).unwrap();
        assert_eq!(
            rows.iter().map(|r| r.pub_id).collect::<Vec<_>>(),
            vec![early.id, late.id, undated.id]
        );
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].nickname, "doe99");
        assert_eq!(rows[2].nfas, "(no author)");
        assert_eq!(rows[2].year, "????");
        assert_eq!(rows[2].title, "(no title)");

        let second = db.find_in_reserved_listing(Some(1)).unwrap();
        assert_eq!(second[0].id, late.id);
    }

    #[test]
    fn unsorted_listing_keeps_input_order() {
        let db = Database::open_in_memory().unwrap();
        let a = add(&db, Some("A"), Some("Jane Smith"), Some(2020));
        let b = add(&db, Some("B"), Some("Jane Smith"), Some(1990));

        let rows = record_listing(&db, &[a.clone(), b.clone()], false).unwrap();
        assert_eq!(rows[0].pub_id, a.id);
        assert_eq!(rows[1].index, 2);
    }

    #[test]
    fn relisting_replaces_the_previous_listing() {
        let db = Database::open_in_memory().unwrap();
        let pubs: Vec<Publication> = (0..5)
            .map(|i| add(&db, Some("T"), Some("Jane Smith"), Some(2000 + i)))
            .collect();

        record_listing(&db, &pubs, true).unwrap();
        assert_eq!(db.find_in_reserved_listing(None).unwrap().len(), 5);

        record_listing(&db, &pubs[..2], true).unwrap();
        assert_eq!(db.find_in_reserved_listing(None).unwrap().len(), 2);
        assert!(db.find_in_reserved_listing(Some(2)).unwrap().is_empty());
    }

    #[test]
    fn lines_are_aligned() {
        let rows = vec![
            ListingRow {
                index: 1,
                pub_id: 1,
                nfas: "smith".into(),
                year: "2019".into(),
                nickname: "s19".into(),
                title: "Short".into(),
            },
            ListingRow {
                index: 2,
                pub_id: 2,
                nfas: "vaswani".into(),
                year: "2017".into(),
                nickname: String::new(),
                title: "Attention".into(),
            },
        ];

        let lines = format_listing(&rows, 80);
        assert_eq!(lines[0], "%1    smith.2019  s19  Short");
        assert_eq!(lines[1], "%2  vaswani.2017       Attention");
    }

    #[test]
    fn long_titles_are_cut_at_words() {
        assert_eq!(truncate_words("a  short   title", 10, 80), "a short title");
        assert_eq!(
            truncate_words("Attention Is All You Need", 20, 40),
            "Attention Is All ..."
        );
    }
}
