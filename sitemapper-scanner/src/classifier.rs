//! Sitemap document classification.
//!
//! A fetched document is either a `<urlset>` (its `<loc>` entries are page
//! URLs) or a `<sitemapindex>` (its `<loc>` entries point at more sitemaps).
//! Element names are matched on their local part only, so namespaced and
//! prefixed documents classify the same as bare ones.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static SITEMAP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sitemap(\.xml|$|\?)").expect("sitemap pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    UrlSet,
    SitemapIndex,
    /// Well-formed XML with some other root element
    Unknown,
    /// Not parseable as XML
    Malformed,
}

impl DocumentKind {
    fn from_root(local_name: &[u8]) -> Self {
        if local_name.eq_ignore_ascii_case(b"urlset") {
            DocumentKind::UrlSet
        } else if local_name.eq_ignore_ascii_case(b"sitemapindex") {
            DocumentKind::SitemapIndex
        } else {
            DocumentKind::Unknown
        }
    }
}

/// Location references pulled out of one document, in document order and
/// without duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: DocumentKind,
    pub leaf_urls: Vec<String>,
    pub nested_sitemaps: Vec<String>,
}

impl Classification {
    fn empty(kind: DocumentKind) -> Self {
        Self {
            kind,
            leaf_urls: Vec::new(),
            nested_sitemaps: Vec::new(),
        }
    }
}

/// Returns true when a location looks like it points at another sitemap:
/// "sitemap" followed by `.xml`, a query string, or the end of the string.
pub fn is_probably_sitemap(url: &str) -> bool {
    SITEMAP_PATTERN.is_match(url)
}

/// Classify raw sitemap text. Malformed input yields an empty classification.
pub fn classify(document: &str) -> Classification {
    let Some((kind, locations)) = scan_document(document.trim_start_matches('\u{feff}')) else {
        return Classification::empty(DocumentKind::Malformed);
    };

    let mut classification = Classification::empty(kind);
    let mut seen_leaves = HashSet::new();
    let mut seen_nested = HashSet::new();

    for location in locations {
        let nested = match kind {
            DocumentKind::UrlSet => false,
            DocumentKind::SitemapIndex => true,
            _ => is_probably_sitemap(&location),
        };

        if nested {
            if seen_nested.insert(location.clone()) {
                classification.nested_sitemaps.push(location);
            }
        } else if seen_leaves.insert(location.clone()) {
            classification.leaf_urls.push(location);
        }
    }

    debug!(
        "Classified document as {:?}: {} urls, {} nested sitemaps",
        classification.kind,
        classification.leaf_urls.len(),
        classification.nested_sitemaps.len()
    );

    classification
}

/// Walk the document once, returning the root kind and every trimmed,
/// non-empty `<loc>` value below the root. `None` means the document is not
/// well-formed, including unbound namespace prefixes and repeated attributes.
///
/// Only the text of a `<loc>` before its first child element counts, so
/// `<loc>a<b/>x</loc>` yields `a`.
fn scan_document(document: &str) -> Option<(DocumentKind, Vec<String>)> {
    let mut reader = NsReader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut kind = None;
    let mut depth = 0usize;
    // Depth of the currently open <loc>, if any
    let mut loc_depth: Option<usize> = None;
    // Set once the open <loc> has had a child element
    let mut loc_text_done = false;
    let mut current = String::new();
    let mut locations = Vec::new();

    loop {
        let (resolved, event) = match reader.read_resolved_event() {
            Ok(pair) => pair,
            Err(e) => {
                debug!(
                    "Malformed sitemap document near byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                return None;
            }
        };

        match event {
            Event::Start(e) => {
                check_element(&resolved, &e)?;
                if depth == 0 {
                    if kind.is_some() {
                        return None;
                    }
                    kind = Some(DocumentKind::from_root(e.local_name().as_ref()));
                }
                if loc_depth.is_some() {
                    loc_text_done = true;
                }
                depth += 1;
                if depth > 1 && loc_depth.is_none() && e.local_name().as_ref() == b"loc" {
                    loc_depth = Some(depth);
                    loc_text_done = false;
                    current.clear();
                }
            }
            Event::Empty(e) => {
                check_element(&resolved, &e)?;
                if depth == 0 {
                    if kind.is_some() {
                        return None;
                    }
                    kind = Some(DocumentKind::from_root(e.local_name().as_ref()));
                }
                if loc_depth.is_some() {
                    loc_text_done = true;
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return None;
                }
                if loc_depth == Some(depth) {
                    let value = current.trim();
                    if !value.is_empty() {
                        locations.push(value.to_string());
                    }
                    loc_depth = None;
                }
                depth -= 1;
            }
            Event::Text(e) => {
                let text = e.unescape().ok()?;
                if depth == 0 {
                    if !text.trim().is_empty() {
                        return None;
                    }
                } else if loc_depth == Some(depth) && !loc_text_done {
                    current.push_str(&text);
                }
            }
            Event::CData(e) => {
                if depth == 0 {
                    return None;
                }
                if loc_depth == Some(depth) && !loc_text_done {
                    current.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }

    kind.map(|kind| (kind, locations))
}

/// Rejects elements whose prefix is not bound or whose attributes are invalid
fn check_element(resolved: &ResolveResult, element: &BytesStart) -> Option<()> {
    if let ResolveResult::Unknown(prefix) = resolved {
        debug!(
            "Unbound namespace prefix {:?}",
            String::from_utf8_lossy(prefix)
        );
        return None;
    }
    for attribute in element.attributes() {
        if let Err(e) = attribute {
            debug!("Invalid attribute: {}", e);
            return None;
        }
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_urlset() {
        let xml = "<urlset><url><loc>https://a.example/1</loc></url><url><loc>https://a.example/2</loc></url></urlset>";
        let result = classify(xml);
        assert_eq!(result.kind, DocumentKind::UrlSet);
        assert_eq!(
            result.leaf_urls,
            vec!["https://a.example/1".to_string(), "https://a.example/2".to_string()]
        );
        assert!(result.nested_sitemaps.is_empty());
    }

    #[test]
    fn test_namespaced_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>https://example.com/sitemap-posts.xml</loc></sitemap>
          <sitemap><loc>https://example.com/sitemap-pages.xml</loc></sitemap>
        </sitemapindex>"#;
        let result = classify(xml);
        assert_eq!(result.kind, DocumentKind::SitemapIndex);
        assert!(result.leaf_urls.is_empty());
        assert_eq!(
            result.nested_sitemaps,
            vec![
                "https://example.com/sitemap-posts.xml".to_string(),
                "https://example.com/sitemap-pages.xml".to_string()
            ]
        );
    }

    #[test]
    fn test_prefixed_elements() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sm:url><sm:loc>https://example.com/a</sm:loc></sm:url>
        </sm:urlset>"#;
        let result = classify(xml);
        assert_eq!(result.kind, DocumentKind::UrlSet);
        assert_eq!(result.leaf_urls, vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn test_root_name_is_case_insensitive() {
        let result = classify("<URLSET><url><loc>https://example.com/a</loc></url></URLSET>");
        assert_eq!(result.kind, DocumentKind::UrlSet);
        assert_eq!(result.leaf_urls.len(), 1);
    }

    #[test]
    fn test_urlset_never_yields_nested() {
        let xml = "<urlset><url><loc>https://example.com/sitemap.xml</loc></url></urlset>";
        let result = classify(xml);
        assert_eq!(result.leaf_urls, vec!["https://example.com/sitemap.xml".to_string()]);
        assert!(result.nested_sitemaps.is_empty());
    }

    #[test]
    fn test_unknown_root_uses_heuristic() {
        let xml = r#"<feed>
            <entry><loc>https://example.com/post/1</loc></entry>
            <entry><loc>https://example.com/sitemap.xml</loc></entry>
            <entry><loc>https://example.com/feeds/sitemap?page=2</loc></entry>
            <entry><loc>https://example.com/SITEMAP</loc></entry>
            <entry><loc>https://example.com/sitemaps/about</loc></entry>
        </feed>"#;
        let result = classify(xml);
        assert_eq!(result.kind, DocumentKind::Unknown);
        assert_eq!(
            result.leaf_urls,
            vec![
                "https://example.com/post/1".to_string(),
                "https://example.com/sitemaps/about".to_string()
            ]
        );
        assert_eq!(
            result.nested_sitemaps,
            vec![
                "https://example.com/sitemap.xml".to_string(),
                "https://example.com/feeds/sitemap?page=2".to_string(),
                "https://example.com/SITEMAP".to_string()
            ]
        );
    }

    #[test]
    fn test_is_probably_sitemap() {
        assert!(is_probably_sitemap("https://example.com/sitemap.xml"));
        assert!(is_probably_sitemap("https://example.com/post-sitemap.XML"));
        assert!(is_probably_sitemap("https://blog.example/feeds/posts/sitemap?start=1"));
        assert!(is_probably_sitemap("https://example.com/sitemap"));
        assert!(!is_probably_sitemap("https://example.com/sitemap-guide"));
        assert!(!is_probably_sitemap("https://example.com/page"));
    }

    #[test]
    fn test_malformed_returns_empty() {
        let inputs = [
            "",
            "not xml at all",
            "<urlset><url><loc>https://example.com/a</loc></url>",
            "<urlset><url><loc>https://example.com/a</url></urlset>",
            "<urlset></urlset><urlset></urlset>",
            "<urlset></urlset>trailing",
            "<<<>>>",
            "<sm:urlset><url><loc>https://a.example/1</loc></url></sm:urlset>",
            "<urlset a=\"1\" a=\"2\"><url><loc>https://a.example/1</loc></url></urlset>",
            "<urlset xmlns:sm=\"http://www.sitemaps.org/schemas/sitemap/0.9\"><url><x:loc>https://a.example/1</x:loc></url></urlset>",
        ];

        for input in inputs {
            let result = classify(input);
            assert_eq!(result.kind, DocumentKind::Malformed, "input: {:?}", input);
            assert!(result.leaf_urls.is_empty());
            assert!(result.nested_sitemaps.is_empty());
        }
    }

    #[test]
    fn test_html_page_is_not_a_sitemap() {
        let result = classify("<html><body><p>Not found</p></body></html>");
        assert_eq!(result.kind, DocumentKind::Unknown);
        assert!(result.leaf_urls.is_empty());
        assert!(result.nested_sitemaps.is_empty());
    }

    #[test]
    fn test_loc_text_is_trimmed_and_unescaped() {
        let xml = r#"<urlset>
            <url><loc>
                https://example.com/search?a=1&amp;b=2
            </loc></url>
            <url><loc><![CDATA[https://example.com/cdata]]></loc></url>
            <url><loc>   </loc></url>
            <url><loc/></url>
        </urlset>"#;
        let result = classify(xml);
        assert_eq!(
            result.leaf_urls,
            vec![
                "https://example.com/search?a=1&b=2".to_string(),
                "https://example.com/cdata".to_string()
            ]
        );
    }

    #[test]
    fn test_loc_text_stops_at_first_child() {
        let xml = "<urlset><url><loc>https://example.com/a<b/>tail</loc></url><url><loc>https://example.com/c<i>x</i>y</loc></url></urlset>";
        let result = classify(xml);
        assert_eq!(
            result.leaf_urls,
            vec!["https://example.com/a".to_string(), "https://example.com/c".to_string()]
        );
    }

    #[test]
    fn test_duplicates_within_document_collapse() {
        let xml = "<urlset><url><loc>https://example.com/a</loc></url><url><loc>https://example.com/a</loc></url></urlset>";
        let result = classify(xml);
        assert_eq!(result.leaf_urls, vec!["https://example.com/a".to_string()]);
    }

    #[test]
    fn test_empty_root_element() {
        let result = classify(r#"<?xml version="1.0"?><urlset/>"#);
        assert_eq!(result.kind, DocumentKind::UrlSet);
        assert!(result.leaf_urls.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let result = classify("\u{feff}<urlset><url><loc>https://example.com/a</loc></url></urlset>");
        assert_eq!(result.kind, DocumentKind::UrlSet);
        assert_eq!(result.leaf_urls.len(), 1);
    }

    #[test]
    fn test_fuzz_inputs_do_not_panic() {
        let long = "<url>".repeat(10000);
        let inputs = [
            "<",
            "<url>",
            "<url><loc>",
            "\x00\x01\x02\x03",
            "<!DOCTYPE urlset><urlset></urlset>",
            "<urlset><url><loc>&bogus;</loc></url></urlset>",
            long.as_str(),
        ];
        for input in inputs {
            let _ = classify(input);
        }
    }
}
