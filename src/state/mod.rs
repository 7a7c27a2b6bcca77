//! State shared by all page tasks of one crawl run
//!
//! # Components
//!
//! - `VisitedPages`: claims page URLs so exactly one task processes each
//! - `AssetLedger`: crawl-wide asset dedup set and budget
//!
//! These are the only mutable state crossing task boundaries during a crawl.
//! Both are lock-striped concurrent sets; no lock spans a check and an
//! insert, which is what permits the bounded budget overshoot documented on
//! [`AssetLedger`].

mod crawl_state;

pub use crawl_state::{AssetLedger, Claim, VisitedPages};
