//! Site-specific field extraction.
//!
//! A scraper turns rendered HTML into pipeline models in two phases:
//!
//! 1. **Listing**: discover detail page URLs on a category page
//! 2. **Detail**: read one entry's fields from its own page
//!
//! # Supported Sources
//!
//! | Source | Module | Listing URL |
//! |--------|--------|-------------|
//! | 91porny | [`porny`] | `/video/category/{category}` |
//!
//! Extraction never fails: structure that cannot be found yields an empty
//! list or `None` fields.

pub mod porny;
