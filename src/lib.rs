//! BrixSpark catalog backend.
//!
//! Reads products and blog posts from a headless WordPress site through a
//! caching gateway and serves them as JSON to the storefront.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod text;
pub mod web;
pub mod wordpress;
