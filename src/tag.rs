//! Defines the [`TagIndex`] type, which maps each tag to the posts carrying
//! it.

use crate::post::Post;
use crate::registry::Registry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps each tag to the posts carrying it, in registry order. Tags are kept
/// in a [`BTreeMap`] so [`TagIndex::tags`] comes out alphabetized.
#[derive(Clone, Debug, Default)]
pub struct TagIndex {
    buckets: BTreeMap<String, Vec<Arc<Post>>>,
}

impl TagIndex {
    /// Builds the index for `registry` in a single pass over
    /// [`Registry::all`].
    pub fn build(registry: &Registry) -> TagIndex {
        TagIndex::from_sorted(registry.all())
    }

    /// Builds the index from posts that are already in registry order.
    /// Buckets keep encounter order, so they need no sort of their own.
    pub(crate) fn from_sorted(posts: &[Arc<Post>]) -> TagIndex {
        let mut buckets: BTreeMap<String, Vec<Arc<Post>>> = BTreeMap::new();
        for post in posts {
            for tag in post.tags() {
                buckets.entry(tag.clone()).or_default().push(Arc::clone(post));
            }
        }
        TagIndex { buckets }
    }

    /// Returns every distinct tag, sorted alphabetically.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Returns the posts tagged `tag`, newest first. Unknown tags yield an
    /// empty slice.
    pub fn posts_for(&self, tag: &str) -> &[Arc<Post>] {
        self.buckets.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the number of posts tagged `tag`.
    pub fn count_for(&self, tag: &str) -> usize {
        self.posts_for(tag).len()
    }
}
