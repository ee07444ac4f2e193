//! Readable content extraction from rendered HTML.
//!
//! Boilerplate (scripts, styles, navigation, headers, footers, asides, forms) is
//! dropped. [`ReadableDocument::content`] yields the readable text of the whole
//! page; [`ReadableDocument::summary`] keeps only the densest content block and
//! re-emits its headings and paragraphs as clean HTML.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "svg",
    "template", "head",
];

const BLOCKS: &[&str] = &[
    "p", "div", "section", "article", "main", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4",
    "h5", "h6", "pre", "blockquote", "table", "tr", "td", "th",
];

const SUMMARY_PARTS: &str = "h1, h2, h3, h4, h5, h6, p, pre, blockquote, li";

pub struct ReadableDocument {
    html: Html,
}

impl ReadableDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| normalize_inline(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    /// Readable text of the page body, one block per line.
    pub fn content(&self) -> String {
        let root = Selector::parse("body")
            .ok()
            .and_then(|s| self.html.select(&s).next())
            .unwrap_or_else(|| self.html.root_element());

        let mut raw = String::new();
        collect_text(root, &mut raw);
        normalize_blocks(&raw)
    }

    /// The main content block as cleaned HTML.
    pub fn summary(&self) -> String {
        let Some(best) = self.best_candidate() else {
            return String::from("<div></div>");
        };
        let Ok(parts) = Selector::parse(SUMMARY_PARTS) else {
            return String::from("<div></div>");
        };

        let mut out = String::from("<div>");
        for part in best.select(&parts) {
            if is_inside_skipped(part, best) || has_block_ancestor_part(part, best) {
                continue;
            }
            let mut raw = String::new();
            collect_text(part, &mut raw);
            let text = normalize_inline(&raw);
            if text.is_empty() {
                continue;
            }
            let tag = part.value().name();
            out.push_str(&format!("<{tag}>{}</{tag}>", escape(&text)));
        }
        out.push_str("</div>");
        out
    }

    /// The element whose direct paragraphs carry the most text.
    fn best_candidate(&self) -> Option<ElementRef<'_>> {
        let paragraphs = Selector::parse("p, pre").ok()?;

        let mut scores: Vec<(ElementRef<'_>, usize)> = Vec::new();
        for paragraph in self.html.select(&paragraphs) {
            if SKIPPED.iter().any(|tag| is_within(paragraph, tag)) {
                continue;
            }
            let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            let mut raw = String::new();
            collect_text(paragraph, &mut raw);
            let len = normalize_inline(&raw).chars().count();
            match scores.iter_mut().find(|(el, _)| *el == parent) {
                Some((_, score)) => *score += len,
                None => scores.push((parent, len)),
            }
        }

        let mut best: Option<(ElementRef<'_>, usize)> = None;
        for (el, score) in scores {
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((el, score));
            }
        }

        best.map(|(el, _)| el).or_else(|| {
            Selector::parse("body")
                .ok()
                .and_then(|s| self.html.select(&s).next())
        })
    }
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Whether `el` or one of its ancestors is a `tag` element.
fn is_within(el: ElementRef<'_>, tag: &str) -> bool {
    el.value().name() == tag
        || el
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == tag)
}

/// Whether `el` sits under a skipped element below `scope`.
fn is_inside_skipped(el: ElementRef<'_>, scope: ElementRef<'_>) -> bool {
    for ancestor in el.ancestors().filter_map(ElementRef::wrap) {
        if ancestor == scope {
            return false;
        }
        if SKIPPED.contains(&ancestor.value().name()) {
            return true;
        }
    }
    false
}

/// Nested summary parts (a `p` inside an `li`) are emitted once, by the outer part.
fn has_block_ancestor_part(el: ElementRef<'_>, scope: ElementRef<'_>) -> bool {
    const PARTS: &[&str] = &["p", "pre", "blockquote", "li"];
    for ancestor in el.ancestors().filter_map(ElementRef::wrap) {
        if ancestor == scope {
            return false;
        }
        if PARTS.contains(&ancestor.value().name()) {
            return true;
        }
    }
    false
}

fn normalize_inline(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_blocks(raw: &str) -> String {
    raw.lines()
        .map(normalize_inline)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title> Quick Fox </title><style>p { color: red; }</style></head>
        <body>
            <nav><a href="/">Home</a> | <a href="/about">About</a></nav>
            <header>Site banner</header>
            <div class="sidebar"><p>Ad</p></div>
            <article>
                <h1>The Quick Brown Fox</h1>
                <p>The quick brown fox jumps over the lazy dog, again and again.</p>
                <p>Foxes are <b>remarkably</b> agile &amp; curious animals.</p>
                <script>track("view");</script>
            </article>
            <footer>Copyright</footer>
        </body>
        </html>
    "#;

    #[test]
    fn test_title() {
        assert_eq!(ReadableDocument::parse(PAGE).title().as_deref(), Some("Quick Fox"));
    }

    #[test]
    fn test_content_drops_boilerplate() {
        let content = ReadableDocument::parse(PAGE).content();
        assert!(content.contains("The Quick Brown Fox"));
        assert!(content.contains("Foxes are remarkably agile & curious animals."));
        assert!(content.contains("Ad"));
        assert!(!content.contains("Home"));
        assert!(!content.contains("Site banner"));
        assert!(!content.contains("Copyright"));
        assert!(!content.contains("track"));
        assert!(!content.contains("color"));
    }

    #[test]
    fn test_summary_keeps_main_block_only() {
        let summary = ReadableDocument::parse(PAGE).summary();
        assert_eq!(
            summary,
            "<div><h1>The Quick Brown Fox</h1>\
             <p>The quick brown fox jumps over the lazy dog, again and again.</p>\
             <p>Foxes are remarkably agile &amp; curious animals.</p></div>"
        );
    }

    #[test]
    fn test_empty_document() {
        let doc = ReadableDocument::parse("");
        assert_eq!(doc.content(), "");
        assert_eq!(doc.summary(), "<div></div>");
        assert!(doc.title().is_none());
    }
}
