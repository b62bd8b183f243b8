//! Turns a tab into a weighted pseudo-document for embedding.

use tabgroup_core::{Settings, Tab};
use url::Url;

use crate::text::clean_text;

/// Weight-to-repeat scale: a weight of 0.4 repeats its component 4 times.
const REPEAT_SCALE: f64 = 10.0;

/// A tab's text as seen by the embedder and the namer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Weighted concatenation of the normalized components.
    pub text: String,
    /// The normalized domain, path and title, each once.
    pub segments: Vec<String>,
}

/// Host (plus explicit port) with a leading `www.` removed.
///
/// Returns an empty string when the URL has no host or does not parse.
pub fn bare_domain(raw_url: &str) -> String {
    match Url::parse(raw_url) {
        Ok(url) => host_of(&url),
        Err(_) => String::new(),
    }
}

fn host_of(url: &Url) -> String {
    let Some(host) = url.host_str() else {
        return String::new();
    };
    let host = host.strip_prefix("www.").unwrap_or(host);
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Split a URL into (domain, path). Unparseable input is treated as a bare path.
fn split_url(raw_url: &str) -> (String, String) {
    match Url::parse(raw_url) {
        Ok(url) => (host_of(&url), url.path().to_string()),
        Err(_) => (String::new(), raw_url.to_string()),
    }
}

/// How many times a component with `weight` is repeated. Never less than 1.
pub fn repeat_count(weight: f64) -> usize {
    let scaled = (weight * REPEAT_SCALE).round();
    if scaled.is_finite() && scaled >= 1.0 {
        scaled as usize
    } else {
        1
    }
}

fn repeated(part: &str, times: usize) -> impl Iterator<Item = &str> {
    std::iter::repeat(part).take(times)
}

/// Build the pseudo-document for one tab.
pub fn build_document(tab: &Tab, settings: &Settings) -> Document {
    let (domain, path) = split_url(&tab.url);
    let domain = clean_text(&domain);
    let path = clean_text(&path);
    let title = clean_text(&tab.title);

    let text = repeated(&domain, repeat_count(settings.domain_weight))
        .chain(repeated(&path, repeat_count(settings.path_weight)))
        .chain(repeated(&title, repeat_count(settings.title_weight)))
        .collect::<Vec<_>>()
        .join(" ");

    Document {
        text,
        segments: vec![domain, path, title],
    }
}

/// Documents for every tab, positionally aligned with `tabs`.
pub fn build_documents(tabs: &[Tab], settings: &Settings) -> Vec<Document> {
    tabs.iter().map(|tab| build_document(tab, settings)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_counts_round_with_a_floor_of_one() {
        assert_eq!(repeat_count(0.0), 1);
        assert_eq!(repeat_count(-2.0), 1);
        assert_eq!(repeat_count(0.04), 1);
        assert_eq!(repeat_count(0.25), 3);
        assert_eq!(repeat_count(0.4), 4);
        assert_eq!(repeat_count(0.33), 3);
        assert_eq!(repeat_count(f64::NAN), 1);
    }

    #[test]
    fn bare_domain_strips_leading_www() {
        assert_eq!(bare_domain("https://www.example.com/a/b"), "example.com");
        assert_eq!(bare_domain("https://docs.rs/tokio"), "docs.rs");
        assert_eq!(bare_domain("http://localhost:8080/x"), "localhost:8080");
        assert_eq!(bare_domain("not a url"), "");
    }

    #[test]
    fn document_repeats_components_in_order() {
        let tab = Tab::new(
            "https://www.github.com/rust-lang/rust",
            "Rust Programming Language",
        );
        let settings = Settings {
            domain_weight: 0.2,
            path_weight: 0.1,
            title_weight: 0.0,
            ..Settings::default()
        };
        let doc = build_document(&tab, &settings);

        assert_eq!(
            doc.segments,
            vec![
                "githubcom".to_string(),
                "rustlangrust".to_string(),
                "rust programming language".to_string()
            ]
        );
        assert_eq!(
            doc.text,
            "githubcom githubcom rustlangrust rust programming language"
        );
    }

    #[test]
    fn documents_align_with_tabs() {
        let tabs = vec![
            Tab::new("https://news.ycombinator.com/", "Hacker News"),
            Tab::new("https://www.wikipedia.org/wiki/Ferris", "Ferris - Wikipedia"),
        ];
        let docs = build_documents(&tabs, &Settings::default());
        assert_eq!(docs.len(), 2);
        assert!(docs[0].text.starts_with("newsycombinatorcom"));
        assert!(docs[1].text.contains("ferris wikipedia"));
    }
}
