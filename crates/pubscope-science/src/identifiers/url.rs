use std::borrow::Cow;

use super::RefKind;

const DOI_RESOLVERS: [&str; 4] = [
    "http://dx.doi.org/",
    "https://dx.doi.org/",
    "http://doi.org/",
    "https://doi.org/",
];

/// Current ADS UI: `.../abs/<bibcode>/abstract`, so only the first segment counts.
const ADS_UI_PAGES: [&str; 2] = [
    "http://ui.adsabs.harvard.edu/abs/",
    "https://ui.adsabs.harvard.edu/abs/",
];

const ADS_CLASSIC_PAGES: [&str; 5] = [
    "http://adsabs.harvard.edu/abs/",
    "https://adsabs.harvard.edu/abs/",
    "http://labs.adsabs.harvard.edu/ui/abs/",
    "https://labs.adsabs.harvard.edu/ui/abs/",
    "http://adsabs.harvard.edu/cgi-bin/nph-bib_query?bibcode=",
];

const ARXIV_ABS_PAGES: [&str; 2] = ["http://arxiv.org/abs/", "https://arxiv.org/abs/"];

const ARXIV_PDF_PAGES: [&str; 2] = ["http://arxiv.org/pdf/", "https://arxiv.org/pdf/"];

fn unquote(text: &str) -> String {
    urlencoding::decode(text)
        .unwrap_or(Cow::Borrowed(text))
        .into_owned()
}

fn strip_any<'a>(url: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| url.strip_prefix(p))
}

/// Recognize a provider URL. `None` means the URL is not one we know, and the
/// caller should classify the raw text instead.
pub fn sniff_url(url: &str) -> Option<RefKind> {
    if let Some(rest) = strip_any(url, &DOI_RESOLVERS)
        && rest.starts_with("10.")
    {
        return Some(RefKind::Doi(unquote(rest)));
    }

    if let Some(rest) = strip_any(url, &ADS_UI_PAGES) {
        let bibcode = rest.split('/').next().unwrap_or_default();
        return Some(RefKind::Bibcode(unquote(bibcode)));
    }

    if let Some(rest) = strip_any(url, &ADS_CLASSIC_PAGES) {
        return Some(RefKind::Bibcode(unquote(rest)));
    }

    if let Some(rest) = strip_any(url, &ARXIV_ABS_PAGES) {
        return Some(RefKind::Arxiv(unquote(rest)));
    }

    if let Some(rest) = strip_any(url, &ARXIV_PDF_PAGES) {
        return Some(RefKind::Arxiv(unquote(rest.trim_end_matches(".pdf"))));
    }

    None
}
