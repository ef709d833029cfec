//! Catalog loading and track lookups.
//!
//! The catalog is scanned once at startup and is read-only afterwards; every
//! other component refers to it by master index or by `TrackId`.

mod catalog;
mod model;
mod scan;

pub use catalog::*;
pub use model::*;
pub use scan::scan;
