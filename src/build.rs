//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: parsing the posts ([`crate::parser`]), assembling the
//! [`Registry`] and its tag index, and generating and writing the RSS feed
//! ([`crate::feed`]).

use crate::config::Config;
use crate::date;
use crate::feed::{self, FeedGenerationError};
use crate::parser::{Error as ParseError, Parser};
use crate::post::Post;
use crate::registry::{DuplicatePathError, Registry};
use crate::tag::TagIndex;
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, instrument};

/// The outcome of a build: the registry every page-composition step reads
/// from, and the year dates are displayed relative to.
#[derive(Clone, Debug)]
pub struct Site {
    pub registry: Registry,
    pub reference_year: i32,
}

impl Site {
    pub fn tag_index(&self) -> &TagIndex {
        self.registry.tag_index()
    }

    /// Renders a post's date for display. See [`date::display`].
    pub fn display_date(&self, post: &Post) -> String {
        date::display(post.date(), self.reference_year)
    }
}

/// Builds the site from a [`Config`]. `reference` is the date the build
/// started on; the caller captures it once so that nothing below reads the
/// clock.
#[instrument(skip_all, fields(posts = %config.posts_source_directory.display()))]
pub fn build_site(config: &Config, reference: NaiveDate) -> Result<Site> {
    let site = load_site(config, reference)?;

    let xml = feed::generate(&site.registry, &config.feed)?;
    feed::write_feed(&config.feed_output_path, &xml).map_err(|err| Error::WriteFeed {
        path: config.feed_output_path.clone(),
        err,
    })?;
    info!(
        path = %config.feed_output_path.display(),
        items = site.registry.len(),
        "wrote feed"
    );

    Ok(site)
}

/// Parses the posts and assembles the registry without writing anything.
pub fn load_site(config: &Config, reference: NaiveDate) -> Result<Site> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    let posts = Parser::new(&config.posts_source_directory).parse_posts(&pool)?;
    let registry = Registry::build(posts)?;
    info!(
        posts = registry.len(),
        tags = registry.tag_index().tags().count(),
        "assembled registry"
    );

    Ok(Site {
        registry,
        reference_year: reference.year(),
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Every variant aborts the build.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors discovering or parsing documents.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Returned when two documents claim the same path.
    #[error(transparent)]
    DuplicatePath(#[from] DuplicatePathError),

    /// Returned when the feed can't be serialized.
    #[error(transparent)]
    Feed(#[from] FeedGenerationError),

    /// Returned for I/O problems writing the feed.
    #[error("writing feed `{}`: {err}", path.display())]
    WriteFeed {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the extraction thread pool can't be started.
    #[error("starting thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::feed::FeedConfig;
    use std::fs;
    use std::path::Path;
    use url::Url;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn config(root: &Path) -> Config {
        Config {
            posts_source_directory: root.join("posts"),
            output_directory: root.join("out"),
            feed_output_path: root.join("out").join("feed.xml"),
            feed: FeedConfig {
                title: "Example".to_owned(),
                site_root: Url::parse("https://example.org/").unwrap(),
                description: "An example blog".to_owned(),
                language: None,
            },
            threads: 2,
        }
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()
    }

    fn seed(root: &Path) {
        write(
            root,
            "posts/a.md",
            "---\ntitle: A\ndate: 2020-01-01\ntags: [x]\ndesc: d1\n---\nFirst.",
        );
        write(
            root,
            "posts/b.md",
            "---\ntitle: B\ndate: 2021-01-01\ntags: [x, y]\ndesc: d2\n---\nSecond.",
        );
    }

    #[test]
    fn test_build_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        seed(dir.path());
        let config = config(dir.path());

        let site = build_site(&config, reference())?;
        let titles: Vec<&str> = site.registry.all().iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(site.tag_index().count_for("x"), 2);

        let b = site.registry.by_path("/b").unwrap();
        let a = site.registry.by_path("/a").unwrap();
        assert_eq!(site.display_date(b), "Jan 1");
        assert_eq!(site.display_date(a), "Jan 1, 2020");

        let xml = fs::read_to_string(&config.feed_output_path)?;
        assert!(xml.find("<title>B</title>").unwrap() < xml.find("<title>A</title>").unwrap());
        Ok(())
    }

    #[test]
    fn test_build_is_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        seed(dir.path());
        let config = config(dir.path());

        let first = build_site(&config, reference())?;
        let first_xml = fs::read(&config.feed_output_path)?;
        let second = build_site(&config, reference())?;
        let second_xml = fs::read(&config.feed_output_path)?;

        assert_eq!(first.registry.all(), second.registry.all());
        assert_eq!(first_xml, second_xml);
        Ok(())
    }

    #[test]
    fn test_duplicate_path_aborts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        seed(dir.path());
        write(
            dir.path(),
            "posts/a/index.md",
            "---\ntitle: Also A\ndate: 2019-01-01\ndesc: d\n---\n",
        );
        let config = config(dir.path());

        match build_site(&config, reference()) {
            Err(Error::DuplicatePath(err)) => {
                assert_eq!(err.path, "/a");
                // `a/` sorts before `a.md`, so the bundle is discovered first.
                assert_eq!(err.first, "a/index.md");
                assert_eq!(err.second, "a.md");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!config.feed_output_path.exists());
        Ok(())
    }

    #[test]
    fn test_invalid_post_aborts() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        seed(dir.path());
        write(
            dir.path(),
            "posts/c.md",
            "---\ntitle: C\ndate: 2021-02-30\ndesc: d\n---\n",
        );
        let err = build_site(&config(dir.path()), reference()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "document `c.md`: field `date` is invalid"
        );
        Ok(())
    }
}
