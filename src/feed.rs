//! Support for creating RSS 2.0 feeds from a [`Registry`].
//!
//! The document is written by hand with [`quick_xml`]'s escaping rather than
//! through a feed builder, so every text node is escaped the same way and the
//! output is byte-for-byte reproducible. A finished document is read back
//! once before it is returned; anything that doesn't parse is reported as a
//! [`FeedGenerationError`].

use crate::post::Post;
use crate::registry::Registry;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// The value of the channel's `generator` element.
pub const GENERATOR: &str = concat!("folio ", env!("CARGO_PKG_VERSION"));

/// Channel-level metadata for a feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    pub title: String,

    /// The site's base URL. Item links are this URL followed by the post
    /// path.
    pub site_root: Url,

    pub description: String,

    /// An optional RSS language code, e.g. `en-us`.
    pub language: Option<String>,
}

impl FeedConfig {
    /// Returns the absolute URL for a post path.
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.site_root.as_str().trim_end_matches('/'), path)
    }
}

/// Returned when the generated document isn't well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generating feed: {0}")]
pub struct FeedGenerationError(pub String);

/// Serializes `registry` into an RSS 2.0 document, one `item` per post in
/// registry order.
pub fn generate(registry: &Registry, config: &FeedConfig) -> Result<String, FeedGenerationError> {
    let mut xml = String::with_capacity(512 + registry.len() * 512);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\">\n");
    xml.push_str("  <channel>\n");
    element(&mut xml, 4, "title", &config.title, "channel")?;
    element(&mut xml, 4, "link", config.site_root.as_str(), "channel")?;
    element(&mut xml, 4, "description", &config.description, "channel")?;
    if let Some(language) = &config.language {
        element(&mut xml, 4, "language", language, "channel")?;
    }
    element(&mut xml, 4, "generator", GENERATOR, "channel")?;
    for post in registry.all() {
        item(&mut xml, post, config)?;
    }
    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");

    check_well_formed(&xml)?;
    Ok(xml)
}

/// Writes a generated feed to `path`, creating parent directories and
/// replacing any previous file.
pub fn write_feed(path: &Path, xml: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, xml)
}

fn item(xml: &mut String, post: &Post, config: &FeedConfig) -> Result<(), FeedGenerationError> {
    let owner = post.source();
    let link = config.link(post.path());
    xml.push_str("    <item>\n");
    element(xml, 6, "title", post.title(), owner)?;
    element(xml, 6, "link", &link, owner)?;
    element(xml, 6, "description", post.desc(), owner)?;
    element(xml, 6, "pubDate", &post.date().to_rfc2822(), owner)?;
    check_chars(&link, "guid", owner)?;
    xml.push_str(&format!(
        "      <guid isPermaLink=\"true\">{}</guid>\n",
        escape(link.as_str())
    ));
    for tag in post.tags() {
        element(xml, 6, "category", tag, owner)?;
    }
    xml.push_str("    </item>\n");
    Ok(())
}

// Appends `<name>text</name>` on its own line. `owner` names the channel or
// the source document of the post the element belongs to, for error messages.
fn element(
    xml: &mut String,
    indent: usize,
    name: &str,
    text: &str,
    owner: &str,
) -> Result<(), FeedGenerationError> {
    check_chars(text, name, owner)?;
    xml.push_str(&format!(
        "{:indent$}<{name}>{}</{name}>\n",
        "",
        escape(text),
        indent = indent,
        name = name
    ));
    Ok(())
}

// Escaping can't help with characters XML 1.0 forbids outright.
fn check_chars(text: &str, name: &str, owner: &str) -> Result<(), FeedGenerationError> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(FeedGenerationError(format!(
            "`{}` of `{}` contains U+{:04X}, which XML doesn't allow",
            name, owner, c as u32
        ))),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn check_well_formed(xml: &str) -> Result<(), FeedGenerationError> {
    let mut reader = Reader::from_str(xml);
    let mut depth: usize = 0;
    let mut roots = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Empty(_)) if depth == 0 => roots += 1,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(FeedGenerationError(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    err
                )))
            }
        }
    }
    match (depth, roots) {
        (0, 1) => Ok(()),
        (0, n) => Err(FeedGenerationError(format!(
            "expected one root element, found {}",
            n
        ))),
        (n, _) => Err(FeedGenerationError(format!(
            "{} element(s) left unclosed",
            n
        ))),
    }
}
