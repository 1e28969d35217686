use crate::utils::error::Result;
use scraper::{ElementRef, Node};
use url::Url;

/// Collapses runs of whitespace (including non-breaking spaces) to single spaces.
pub fn collapse(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn element_text(el: ElementRef<'_>) -> String {
    collapse(&el.text().collect::<String>())
}

/// Text between `el` and the next sibling element: the value half of a
/// `<strong>Label:</strong> value` pair.
pub fn tail_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.next_siblings() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => break,
            _ => {}
        }
    }
    collapse(&out)
}

pub fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Splits an element's text on embedded `<br>` tags.
pub fn lines_of(el: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => current.push_str(text),
            Node::Element(element) if element.name() == "br" => {
                lines.push(std::mem::take(&mut current));
            }
            _ => {}
        }
    }
    lines.push(current);

    lines
        .iter()
        .map(|line| collapse(line))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Resolves an `href` against the page it appeared on.
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
    Ok(base.join(href.trim())?)
}

/// `href` of `el` resolved to an absolute URL, if it has one.
pub fn absolute_href(el: ElementRef<'_>, base: &Url) -> Result<Option<String>> {
    match el.value().attr("href") {
        Some(href) if !href.trim().is_empty() => Ok(Some(resolve(base, href)?.to_string())),
        _ => Ok(None),
    }
}
