//! Parser for Crossref UnixRef records.
//!
//! The document is read into a small element tree first; the two record
//! shapes we understand (journal article, conference paper) are then picked
//! apart with slash-separated child paths.

use pubscope_core::PubRecord;
use pubscope_core::names::{encode_name, squish_spaces};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value;

use crate::error::{Provider, Result, ScienceError};

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> std::result::Result<Self, String> {
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attrs.push((key, value));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attrs,
            children: Vec::new(),
        })
    }

    fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Every element reached by `path`; a `*` step matches any child.
    fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/') {
            current = current
                .into_iter()
                .flat_map(|e| e.children().filter(move |c| step == "*" || c.name == step))
                .collect();
        }
        current
    }

    fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn collect_text<'a>(&'a self, out: &mut Vec<&'a str>) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// All descendant text, each piece trimmed, joined with single spaces.
    fn text(&self) -> String {
        let mut pieces = Vec::new();
        self.collect_text(&mut pieces);
        let joined: Vec<&str> = pieces
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        squish_spaces(&joined.join(" "))
    }
}

fn attach(stack: &mut [Element], roots: &mut Vec<Element>, node: Node) {
    match (stack.last_mut(), node) {
        (Some(parent), node) => parent.children.push(node),
        (None, Node::Element(e)) => roots.push(e),
        (None, Node::Text(_)) => {}
    }
}

fn parse_tree(xml: &[u8]) -> std::result::Result<Element, String> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut roots: Vec<Element> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => stack.push(Element::from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut roots, Node::Element(element));
            }
            Ok(Event::End(_)) => {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut roots, Node::Element(done));
                }
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|e| e.to_string())?.into_owned();
                attach(&mut stack, &mut roots, Node::Text(text));
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                attach(&mut stack, &mut roots, Node::Text(text));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "invalid XML at byte {}: {e}",
                    reader.buffer_position()
                ));
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed <{}> element", open.name));
    }
    roots
        .into_iter()
        .next()
        .ok_or_else(|| "empty document".to_string())
}

/// Parse a UnixRef document fetched for `doi`.
pub fn parse_unixref(xml: &[u8], doi: &str) -> Result<PubRecord> {
    let root =
        parse_tree(xml).map_err(|message| ScienceError::malformed(Provider::Crossref, doi, message))?;
    let mut record = PubRecord::pending();

    if let Some(journal) = root.find("doi_record/crossref/journal") {
        fill_contributors(&mut record, journal.find_all("journal_article/contributors/*"));
        record.title = text_at(journal, "journal_article/titles/title");
        record.year = year_at(journal, "journal_issue/publication_date/year")
            .or_else(|| year_at(journal, "journal_article/publication_date/year"));

        record.set_ref_type("article");
        insert_text(&mut record, "journal", text_at(journal, "journal_metadata/full_title"));
        insert_text(&mut record, "volume", text_at(journal, "journal_issue/journal_volume/volume"));
        insert_text(&mut record, "pages", pages_at(journal, "journal_article/pages"));
    } else if let Some(conference) = root.find("doi_record/crossref/conference")
        && let Some(paper) = conference.find("conference_paper")
    {
        fill_contributors(&mut record, paper.find_all("contributors/*"));
        record.title = text_at(paper, "titles/title");
        record.year = year_at(paper, "publication_date/year");

        record.set_ref_type("inproceedings");
        insert_text(
            &mut record,
            "booktitle",
            text_at(conference, "proceedings_metadata/proceedings_title"),
        );
        insert_text(&mut record, "pages", pages_at(paper, "pages"));
    } else {
        return Err(ScienceError::malformed(
            Provider::Crossref,
            doi,
            "record is neither a journal article nor a conference paper",
        ));
    }

    Ok(record)
}

fn text_at(element: &Element, path: &str) -> Option<String> {
    element
        .find(path)
        .map(Element::text)
        .filter(|t| !t.is_empty())
}

fn year_at(element: &Element, path: &str) -> Option<i32> {
    text_at(element, path).and_then(|t| t.parse().ok())
}

fn pages_at(element: &Element, path: &str) -> Option<String> {
    let pages = element.find(path)?;
    let first = text_at(pages, "first_page")?;
    match text_at(pages, "last_page") {
        Some(last) => Some(format!("{first}-{last}")),
        None => Some(first),
    }
}

fn insert_text(record: &mut PubRecord, key: &str, value: Option<String>) {
    if let Some(value) = value {
        record.refdata.insert(key.to_string(), Value::String(value));
    }
}

fn fill_contributors(record: &mut PubRecord, contributors: Vec<&Element>) {
    for contributor in contributors {
        let name = match contributor.name.as_str() {
            "person_name" => {
                let Some(surname) = text_at(contributor, "surname") else {
                    continue;
                };
                let given = text_at(contributor, "given_name").unwrap_or_default();
                encode_name(&given, &surname)
            }
            "organization" => {
                let text = contributor.text();
                if text.is_empty() {
                    continue;
                }
                encode_name("", &text)
            }
            _ => continue,
        };

        if contributor.attr("contributor_role") == Some("editor") {
            record.editors.push(name);
        } else {
            record.authors.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNAL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<doi_records>
  <doi_record owner="10.1000" timestamp="2020-01-01">
    <crossref>
      <journal>
        <journal_metadata language="en">
          <full_title>The Astrophysical Journal</full_title>
        </journal_metadata>
        <journal_issue>
          <publication_date media_type="print">
            <month>03</month>
            <year>2020</year>
          </publication_date>
          <journal_volume><volume>1</volume></journal_volume>
        </journal_issue>
        <journal_article publication_type="full_text">
          <titles>
            <title>Radio emission from <i>very</i>
              cool dwarfs &amp; friends</title>
          </titles>
          <contributors>
            <person_name sequence="first" contributor_role="author">
              <given_name>Jane</given_name>
              <surname>van der Berg</surname>
            </person_name>
            <organization sequence="additional" contributor_role="author">The Fermi-LAT Collaboration</organization>
            <person_name sequence="additional" contributor_role="editor">
              <given_name>John</given_name>
              <surname>Doe</surname>
            </person_name>
            <person_name sequence="additional" contributor_role="author">
              <surname>Gopal-Krishna</surname>
            </person_name>
          </contributors>
          <pages><first_page>2</first_page><last_page>9</last_page></pages>
        </journal_article>
      </journal>
    </crossref>
  </doi_record>
</doi_records>"#;

    #[test]
    fn parses_journal_article() {
        let record = parse_unixref(JOURNAL_XML.as_bytes(), "10.1000/xyz").unwrap();

        assert_eq!(
            record.title.as_deref(),
            Some("Radio emission from very cool dwarfs & friends")
        );
        assert_eq!(record.year, Some(2020));
        assert_eq!(
            record.authors,
            vec!["Jane van_der_Berg", "The_Fermi-LAT_Collaboration", "Gopal-Krishna"]
        );
        assert_eq!(record.editors, vec!["John Doe"]);
        assert_eq!(record.refdata["_type"], "article");
        assert_eq!(record.refdata["journal"], "The Astrophysical Journal");
        assert_eq!(record.refdata["volume"], "1");
        assert_eq!(record.refdata["pages"], "2-9");
        assert!(!record.keep);
    }

    #[test]
    fn journal_year_falls_back_to_article_date() {
        let xml = br#"<doi_records><doi_record><crossref><journal>
            <journal_article>
              <titles><title>Online only</title></titles>
              <publication_date media_type="online"><year>2018</year></publication_date>
            </journal_article>
        </journal></crossref></doi_record></doi_records>"#;

        let record = parse_unixref(xml, "10.1000/a").unwrap();
        assert_eq!(record.year, Some(2018));
        assert!(record.authors.is_empty());
        assert!(!record.refdata.contains_key("journal"));
    }

    #[test]
    fn parses_conference_paper() {
        let xml = br#"<doi_records><doi_record><crossref><conference>
            <proceedings_metadata><proceedings_title>Proc. Things</proceedings_title></proceedings_metadata>
            <conference_paper>
              <contributors>
                <person_name contributor_role="author"><given_name>Ann</given_name><surname>Lee</surname></person_name>
              </contributors>
              <titles><title>A Talk</title></titles>
              <publication_date><year>2015</year></publication_date>
            </conference_paper>
        </conference></crossref></doi_record></doi_records>"#;

        let record = parse_unixref(xml, "10.1000/b").unwrap();
        assert_eq!(record.authors, vec!["Ann Lee"]);
        assert_eq!(record.title.as_deref(), Some("A Talk"));
        assert_eq!(record.year, Some(2015));
        assert_eq!(record.refdata["_type"], "inproceedings");
        assert_eq!(record.refdata["booktitle"], "Proc. Things");
    }

    #[test]
    fn unknown_record_shape_is_malformed() {
        let xml = br#"<doi_records><doi_record><crossref><error>not found</error></crossref></doi_record></doi_records>"#;
        let err = parse_unixref(xml, "10.1000/c").unwrap_err();
        assert!(matches!(
            err,
            ScienceError::MalformedProviderPayload { provider: Provider::Crossref, ref target, .. }
                if target == "10.1000/c"
        ));
    }

    #[test]
    fn broken_xml_is_malformed() {
        for xml in [&b""[..], &b"<doi_records><doi_record>"[..], &b"<a></b>"[..]] {
            assert!(matches!(
                parse_unixref(xml, "10.1000/d"),
                Err(ScienceError::MalformedProviderPayload { .. })
            ));
        }
    }

    #[test]
    fn bad_year_leaves_field_absent() {
        let xml = br#"<doi_records><doi_record><crossref><journal>
            <journal_issue><publication_date><year>soon</year></publication_date></journal_issue>
            <journal_article><titles><title>T</title></titles></journal_article>
        </journal></crossref></doi_record></doi_records>"#;

        let record = parse_unixref(xml, "10.1000/e").unwrap();
        assert_eq!(record.year, None);
        assert_eq!(record.title.as_deref(), Some("T"));
    }
}
