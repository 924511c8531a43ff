#![doc = "merritt-feed-core: core logic library for merritt-feed."]

//! This crate turns harvested repository documents into ATOM feeds for
//! preservation ingest, and decides whether a feed is safe to publish.
//! Network clients live in the `merritt-feed` binary crate; here they are
//! only traits (see [`contract`]).
//!
//! # Pipeline
//! [`harvest`] → [`bundle`] → [`entry`] / [`feed`] → [`validate`] → [`atom`],
//! orchestrated by [`synchronise`].

pub mod atom;
pub mod bucket;
pub mod bundle;
pub mod contract;
pub mod entry;
pub mod error;
pub mod feed;
pub mod harvest;
pub mod media_json;
pub mod record;
pub mod resolver;
pub mod synchronise;
pub mod validate;

pub use error::{FeedError, Result};
