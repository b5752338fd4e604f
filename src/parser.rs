//! Defines the [`Parser`] and [`Document`] types: the logic for finding post
//! source files on disk, splitting each into YAML front matter and an opaque
//! body, and extracting a [`Post`] from every one of them in parallel.

use crate::post::{self, MetadataError, Post, RawMetadata};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// The extension of post source files.
pub const MARKDOWN_EXTENSION: &str = "md";

const FENCE: &str = "---";

/// One source document: its location relative to the posts source directory
/// (always `/`-separated), its parsed front matter, and its unrendered body.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub path: String,
    pub metadata: RawMetadata,
    pub body: String,
}

impl Document {
    /// Splits `input` into front matter and body. Each post file must be
    /// structured as follows:
    ///
    /// 1. Initial front matter fence (`---`) on the first line
    /// 2. YAML front matter with fields `title`, `date`, `desc`, and
    ///    optionally `tags` and `imageURL`
    /// 3. Terminal front matter fence (`---`) on a line of its own
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// desc: Saying hello.
    /// tags: [greet]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse(path: &str, input: &str) -> Result<Document> {
        let annotate = |err: Error| Error::Annotated(path.to_owned(), Box::new(err));
        let (yaml, body) = split_front_matter(input).map_err(annotate)?;
        let metadata: RawMetadata = if yaml.trim().is_empty() {
            RawMetadata::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| annotate(e.into()))?
        };
        Ok(Document {
            path: path.to_owned(),
            metadata,
            body: body.to_owned(),
        })
    }
}

// Returns the YAML between the fences and the body after the closing fence.
fn split_front_matter(input: &str) -> Result<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = input
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')))
        .ok_or(Error::FrontMatterMissingStartFence)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontMatterMissingEndFence)
}

/// Parses [`Post`] objects from a posts source directory.
pub struct Parser<'a> {
    source_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(source_directory: &'a Path) -> Parser<'a> {
        Parser { source_directory }
    }

    /// Finds every `.md` file below the source directory, sorted by path.
    /// Hidden files and directories are skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(self.source_directory)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
        for result in walker {
            let entry = result?;
            if entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Reads and parses the document at `file`, an absolute path below the
    /// source directory.
    pub fn parse_document(&self, file: &Path) -> Result<Document> {
        let relative = relative_path(self.source_directory, file)?;
        let input = fs::read_to_string(file)
            .map_err(|err| Error::Annotated(relative.clone(), Box::new(err.into())))?;
        Document::parse(&relative, &input)
    }

    /// Discovers, parses and extracts every post below the source directory
    /// using `pool`. Extraction is independent per document; results are
    /// gathered in discovery order, and if any document fails the first
    /// failure in that order is returned.
    pub fn parse_posts(&self, pool: &rayon::ThreadPool) -> Result<Vec<Post>> {
        let files = self.discover()?;
        debug!(documents = files.len(), "discovered documents");

        let results: Vec<Result<Post>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| -> Result<Post> {
                    let document = self.parse_document(file)?;
                    debug!(document = %document.path, "extracting metadata");
                    Ok(post::extract(&document.path, document.metadata)?)
                })
                .collect()
        });
        results.into_iter().collect()
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map_or(false, |name| name.starts_with('.'))
}

fn relative_path(root: &Path, file: &Path) -> Result<String> {
    let relative = file
        .strip_prefix(root)
        .map_err(|_| Error::InvalidFileName(file.to_owned()))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(segment) => segments.push(segment),
            None => return Err(Error::InvalidFileName(file.to_owned())),
        }
    }
    Ok(segments.join("/"))
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting front matter
    /// fence (`---`).
    #[error("post must begin with `---`")]
    FrontMatterMissingStartFence,

    /// Returned when a post source file is missing its terminal front matter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    #[error("missing closing `---`")]
    FrontMatterMissingEndFence,

    /// Returned when there was an error parsing the front matter as YAML.
    #[error("parsing front matter: {0}")]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when the front matter doesn't describe a valid post.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned when a source path isn't valid UTF-8.
    #[error("invalid file name: {0:?}")]
    InvalidFileName(PathBuf),

    /// An error annotated with the document it occurred in.
    #[error("parsing document `{0}`: {1}")]
    Annotated(String, #[source] Box<Error>),
}
