//! # Lodestar Search
//!
//! Search backend clients. Currently a single backend, SearXNG, which
//! aggregates many engines behind one JSON API and supports category
//! verticals used for academic and social searches.

pub mod searxng;

pub use searxng::SearxngClient;
