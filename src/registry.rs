//! Defines the [`Registry`], the sorted and deduplicated collection of every
//! [`Post`] in a build.

use crate::post::Post;
use crate::tag::TagIndex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Returned when two documents normalize to the same post path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("documents `{first}` and `{second}` both map to path `{path}`")]
pub struct DuplicatePathError {
    /// The colliding path.
    pub path: String,

    /// The document that claimed the path first.
    pub first: String,

    /// The document that collided with it.
    pub second: String,
}

/// Every [`Post`] of one build, newest first with ties broken by ascending
/// path. A registry is immutable once built.
///
/// The registry owns the [`TagIndex`] built from it, and [`Registry::by_tag`]
/// answers from that index so tag listings are computed in exactly one place.
#[derive(Clone, Debug)]
pub struct Registry {
    posts: Vec<Arc<Post>>,
    by_path: HashMap<String, usize>,
    tags: TagIndex,
}

impl Registry {
    /// Builds the registry, failing on the first pair of posts (in input
    /// order) that share a path.
    pub fn build(posts: Vec<Post>) -> Result<Registry, DuplicatePathError> {
        let mut sources: HashMap<&str, &str> = HashMap::with_capacity(posts.len());
        for post in &posts {
            if let Some(first) = sources.insert(post.path(), post.source()) {
                return Err(DuplicatePathError {
                    path: post.path().to_owned(),
                    first: first.to_owned(),
                    second: post.source().to_owned(),
                });
            }
        }

        let mut posts: Vec<Arc<Post>> = posts.into_iter().map(Arc::new).collect();
        posts.sort_by(|a, b| {
            b.date()
                .cmp(&a.date())
                .then_with(|| a.path().cmp(b.path()))
        });

        let by_path = posts
            .iter()
            .enumerate()
            .map(|(i, post)| (post.path().to_owned(), i))
            .collect();
        let tags = TagIndex::from_sorted(&posts);

        Ok(Registry {
            posts,
            by_path,
            tags,
        })
    }

    /// Returns every post in canonical order.
    pub fn all(&self) -> &[Arc<Post>] {
        &self.posts
    }

    /// Looks up a post by its exact path.
    pub fn by_path(&self, path: &str) -> Option<&Arc<Post>> {
        self.by_path.get(path).map(|&i| &self.posts[i])
    }

    /// Returns the posts tagged `tag` in canonical order.
    pub fn by_tag(&self, tag: &str) -> &[Arc<Post>] {
        self.tags.posts_for(tag)
    }

    /// Returns the tag index built alongside the registry.
    pub fn tag_index(&self) -> &TagIndex {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
