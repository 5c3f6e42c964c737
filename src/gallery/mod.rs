//! Gallery core: pagination and cross-view navigation.
//!
//! This module provides:
//! - `Gallery` - the ordered, deduplicated collection of fetched records
//! - `FocusNavigator` - the full-screen viewer cursor over the same sequence
//! - `FileCache` - LRU cache of raw file bytes with neighbor prefetch

pub mod collection;
pub mod focus;
pub mod prefetch;

pub use collection::*;
pub use focus::*;
pub use prefetch::*;
