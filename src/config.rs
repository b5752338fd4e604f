//! Loads project configuration from a `folio.yaml` file.

use crate::feed::FeedConfig;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "folio.yaml";

fn default_posts_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_feed_path() -> PathBuf {
    PathBuf::from("feed.xml")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    site_root: Url,
    title: String,
    description: String,

    #[serde(default)]
    language: Option<String>,

    #[serde(default = "default_posts_directory")]
    posts_directory: PathBuf,

    #[serde(default = "default_feed_path")]
    feed_path: PathBuf,

    #[serde(default)]
    threads: Option<usize>,
}

/// The resolved configuration for one build.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory holding the post source files.
    pub posts_source_directory: PathBuf,

    /// The directory output artifacts are written to.
    pub output_directory: PathBuf,

    /// Where the feed is written.
    pub feed_output_path: PathBuf,

    /// Channel metadata for the feed.
    pub feed: FeedConfig,

    /// How many threads extract posts.
    pub threads: usize,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its ancestors,
    /// and loads the first one found. A relative `dir` is resolved against the
    /// current directory first, so `.` reaches the real parents.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let absolute = dir.canonicalize().map_err(|err| Error::Open {
            path: dir.to_owned(),
            err,
        })?;
        for candidate in absolute.ancestors() {
            let path = candidate.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory, threads);
            }
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`. Relative paths in the file resolve
    /// against the file's directory; `feed_path` resolves against
    /// `output_directory`. A `threads` argument overrides the file.
    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));

        if project.site_root.cannot_be_a_base() {
            return Err(Error::Invalid {
                path: path.to_owned(),
                reason: format!("`site_root` `{}` is not a base URL", project.site_root),
            });
        }

        let threads = match threads.or(project.threads) {
            Some(0) => {
                return Err(Error::Invalid {
                    path: path.to_owned(),
                    reason: "`threads` must be at least 1".to_owned(),
                })
            }
            Some(threads) => threads,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };

        Ok(Config {
            posts_source_directory: project_root.join(&project.posts_directory),
            output_directory: output_directory.to_owned(),
            feed_output_path: output_directory.join(&project.feed_path),
            feed: FeedConfig {
                title: project.title,
                site_root: project.site_root,
                description: project.description,
                language: project.language,
            },
            threads,
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no project file exists in a directory or its ancestors.
    #[error("could not find `{}` in `{}` or any parent directory", PROJECT_FILE, .0.display())]
    NotFound(PathBuf),

    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`: {err}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid YAML or is missing keys.
    #[error("parsing project file `{}`: {err}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        err: serde_yaml::Error,
    },

    /// Returned when a value in the project file is out of range.
    #[error("project file `{}`: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}
