//! URL handling module
//!
//! This module provides reference resolution for extracted links and the
//! page-number arithmetic used to synthesize listing-page URLs.

mod pagination;
mod resolve;

pub use pagination::{build_paginated_url, format_page_number, normalize_to_page_one};
pub use resolve::{check_fetchable, parse_absolute, resolve, resolve_against};
