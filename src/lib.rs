//! The library code for the `folio` content pipeline. A build runs in a
//! handful of steps:
//!
//! 1. Finding post documents on disk and splitting off their YAML front
//!    matter ([`crate::parser`])
//! 2. Validating each document's metadata into a [`post::Post`]
//!    ([`crate::post`], with dates handled by [`crate::date`])
//! 3. Assembling every post into a sorted, deduplicated
//!    [`registry::Registry`], which also carries the [`tag::TagIndex`]
//! 4. Serializing the registry as an RSS feed ([`crate::feed`])
//!
//! Step 2 runs in parallel across documents; step 3 only starts once every
//! document has been extracted successfully. Any error aborts the build.
//! [`crate::build`] strings the steps together.
//!
//! Rendering post bodies and composing pages are left to the caller, which
//! reads the [`build::Site`] returned by [`build::build_site`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod date;
pub mod feed;
pub mod parser;
pub mod post;
pub mod registry;
pub mod tag;
