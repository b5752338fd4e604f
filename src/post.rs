//! Defines the [`Post`] and [`RawMetadata`] types as well as [`extract`],
//! which validates one document's front matter and turns it into a [`Post`].

use crate::date::{self, CanonicalDate, DateParseError};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use url::Url;

/// The front matter of a document as it was authored. Every field is
/// optional here; [`extract`] decides what is required.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct RawMetadata {
    /// The title of the post.
    #[serde(default)]
    pub title: Option<String>,

    /// The date of the post, formatted as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,

    /// The tags associated with the post.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// A short summary of the post.
    #[serde(default)]
    pub desc: Option<String>,

    /// An absolute URL for the post's preview image.
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<String>,
}

/// One published post. Fields are private so a [`Post`] can't change after
/// [`extract`] has validated it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    source: String,
    path: String,
    title: String,
    date: CanonicalDate,
    tags: Vec<String>,
    desc: String,
    image_url: Option<Url>,
}

impl Post {
    /// The location of the document the post was extracted from, relative to
    /// the posts source directory.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The site-relative path of the post, e.g. `/blog/hello`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> CanonicalDate {
        self.date
    }

    /// The post's tags in declaration order, without duplicates.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }
}

/// Why a metadata field was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    /// The field was absent or empty.
    Missing,

    /// The field was present but couldn't be normalized.
    Invalid,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reason::Missing => write!(f, "missing"),
            Reason::Invalid => write!(f, "invalid"),
        }
    }
}

/// Returned when a document's front matter doesn't describe a valid post.
#[derive(Debug, Error)]
#[error("document `{document}`: field `{field}` is {reason}")]
pub struct MetadataError {
    /// The document the metadata belongs to.
    pub document: String,

    /// The offending front matter key.
    pub field: &'static str,

    pub reason: Reason,

    /// The normalization failure behind an [`Reason::Invalid`] field, if any.
    #[source]
    pub source: Option<FieldError>,
}

impl MetadataError {
    fn missing(document: &str, field: &'static str) -> MetadataError {
        MetadataError {
            document: document.to_owned(),
            field,
            reason: Reason::Missing,
            source: None,
        }
    }

    fn invalid(document: &str, field: &'static str, source: FieldError) -> MetadataError {
        MetadataError {
            document: document.to_owned(),
            field,
            reason: Reason::Invalid,
            source: Some(source),
        }
    }
}

/// The underlying failure of an invalid field.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Date(#[from] DateParseError),

    #[error("invalid URL `{value}`: {err}")]
    Url {
        value: String,
        #[source]
        err: url::ParseError,
    },
}

/// Validates `metadata` for the document at `document` (a `/`-separated path
/// relative to the posts source directory) and converts it into a [`Post`].
///
/// `title`, `date` and `desc` are required. Tags are trimmed and empty or
/// repeated tags are dropped. The post's path is derived from `document` by
/// [`derive_path`].
pub fn extract(document: &str, metadata: RawMetadata) -> Result<Post, MetadataError> {
    fn required(
        document: &str,
        field: &'static str,
        value: Option<String>,
    ) -> Result<String, MetadataError> {
        match value.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_owned()),
            _ => Err(MetadataError::missing(document, field)),
        }
    }

    let title = required(document, "title", metadata.title)?;
    let raw_date = match metadata.date {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(MetadataError::missing(document, "date")),
    };
    let desc = required(document, "desc", metadata.desc)?;

    // Dates are not trimmed: `normalize` accepts exactly `YYYY-MM-DD`.
    let date = date::normalize(&raw_date)
        .map_err(|err| MetadataError::invalid(document, "date", err.into()))?;

    let mut tags: Vec<String> = Vec::new();
    for tag in metadata.tags.unwrap_or_default() {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }

    let image_url = match metadata.image_url.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(Url::parse(value).map_err(|err| {
            MetadataError::invalid(
                document,
                "imageURL",
                FieldError::Url {
                    value: value.to_owned(),
                    err,
                },
            )
        })?),
    };

    Ok(Post {
        source: document.to_owned(),
        path: derive_path(document),
        title,
        date,
        tags,
        desc,
        image_url,
    })
}

/// Derives a post's site-relative path from its document location: the
/// extension is stripped, an `index` leaf collapses onto its parent
/// directory, and the result has exactly one leading `/` and no trailing `/`
/// (the root is `/`).
///
/// ```
/// use folio::post::derive_path;
/// assert_eq!(derive_path("blog/hello.md"), "/blog/hello");
/// assert_eq!(derive_path("blog/index.md"), "/blog");
/// assert_eq!(derive_path("index.md"), "/");
/// ```
pub fn derive_path(document: &str) -> String {
    let mut segments: Vec<&str> = document
        .split(|c: char| c == '/' || c == '\\')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if let Some(leaf) = segments.pop() {
        let stem = match leaf.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => leaf,
        };
        if stem != "index" {
            segments.push(stem);
        }
    }

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn metadata(title: &str, date: &str, desc: &str) -> RawMetadata {
        RawMetadata {
            title: Some(title.to_owned()),
            date: Some(date.to_owned()),
            desc: Some(desc.to_owned()),
            ..RawMetadata::default()
        }
    }

    #[test]
    fn test_extract() -> Result<(), MetadataError> {
        let post = extract(
            "blog/hello.md",
            RawMetadata {
                tags: Some(vec!["rust".to_owned(), "web".to_owned()]),
                image_url: Some("https://example.org/hello.png".to_owned()),
                ..metadata("Hello, world!", "2021-04-16", "A greeting")
            },
        )?;
        assert_eq!(post.source(), "blog/hello.md");
        assert_eq!(post.path(), "/blog/hello");
        assert_eq!(post.title(), "Hello, world!");
        assert_eq!(post.date().to_string(), "2021-04-16");
        assert_eq!(post.tags(), ["rust", "web"]);
        assert_eq!(post.desc(), "A greeting");
        assert_eq!(
            post.image_url().map(Url::as_str),
            Some("https://example.org/hello.png")
        );
        Ok(())
    }

    #[test]
    fn test_extract_missing_fields() {
        let valid = || metadata("t", "2021-01-01", "d");
        let cases = [
            ("title", RawMetadata { title: None, ..valid() }),
            ("title", RawMetadata { title: Some("  ".to_owned()), ..valid() }),
            ("date", RawMetadata { date: None, ..valid() }),
            ("date", RawMetadata { date: Some(String::new()), ..valid() }),
            ("desc", RawMetadata { desc: None, ..valid() }),
            ("desc", RawMetadata { desc: Some(String::new()), ..valid() }),
        ];
        for (field, raw) in cases {
            let err = extract("post.md", raw).unwrap_err();
            assert_eq!(err.document, "post.md");
            assert_eq!(err.field, field);
            assert_eq!(err.reason, Reason::Missing);
        }
    }

    #[test]
    fn test_extract_invalid_date() {
        let err = extract("post.md", metadata("t", "April 16th", "d")).unwrap_err();
        assert_eq!(err.field, "date");
        assert_eq!(err.reason, Reason::Invalid);
        assert!(matches!(
            err.source,
            Some(FieldError::Date(DateParseError(ref raw))) if raw == "April 16th"
        ));
        assert_eq!(
            err.to_string(),
            "document `post.md`: field `date` is invalid"
        );
    }

    #[test]
    fn test_extract_padded_date_is_invalid() {
        for raw in [" 2021-05-11", "2021-05-11 ", "   "] {
            let err = extract("post.md", metadata("t", raw, "d")).unwrap_err();
            assert_eq!(err.field, "date", "date: {:?}", raw);
            assert_eq!(err.reason, Reason::Invalid, "date: {:?}", raw);
        }
    }

    #[test]
    fn test_extract_invalid_image_url() {
        let raw = RawMetadata {
            image_url: Some("images/cover.png".to_owned()),
            ..metadata("t", "2021-01-01", "d")
        };
        let err = extract("post.md", raw).unwrap_err();
        assert_eq!(err.field, "imageURL");
        assert_eq!(err.reason, Reason::Invalid);
    }

    #[test]
    fn test_extract_empty_image_url_is_absent() -> Result<(), MetadataError> {
        let raw = RawMetadata {
            image_url: Some(String::new()),
            ..metadata("t", "2021-01-01", "d")
        };
        assert_eq!(extract("post.md", raw)?.image_url(), None);
        Ok(())
    }

    #[test]
    fn test_extract_tags_are_cleaned() -> Result<(), MetadataError> {
        let raw = RawMetadata {
            tags: Some(
                ["  rust ", "", "web", "rust", "   ", "web", "cli"]
                    .iter()
                    .map(|t| t.to_string())
                    .collect(),
            ),
            ..metadata("t", "2021-01-01", "d")
        };
        let post = extract("post.md", raw)?;
        assert_eq!(post.tags(), ["rust", "web", "cli"]);
        assert!(post.has_tag("web"));
        assert!(!post.has_tag("go"));
        Ok(())
    }

    #[test]
    fn test_extract_tags_default_empty() -> Result<(), MetadataError> {
        let post = extract("post.md", metadata("t", "2021-01-01", "d"))?;
        assert!(post.tags().is_empty());
        Ok(())
    }

    #[test]
    fn test_derive_path() {
        for (document, wanted) in [
            ("hello.md", "/hello"),
            ("/hello.md", "/hello"),
            ("./hello.md", "/hello"),
            ("blog/hello.md", "/blog/hello"),
            ("blog//hello.md", "/blog/hello"),
            ("blog/hello/index.md", "/blog/hello"),
            ("blog/index.md", "/blog"),
            ("index.md", "/"),
            ("hello.draft.md", "/hello.draft"),
            ("notes/readme", "/notes/readme"),
            ("blog\\windows.md", "/blog/windows"),
        ] {
            assert_eq!(derive_path(document), wanted, "document: {}", document);
        }
    }
}
