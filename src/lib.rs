//! Blamecast - author resolution and report aggregation for static-analysis findings
//!
//! Blamecast takes a flat list of findings ("issues") produced by an external
//! scanner, attributes each one to a human author, and folds the attributed
//! issues into ranked, capped, per-recipient reports ready for delivery.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`pipeline`] - Orchestrates fetch → resolve → aggregate → publish
//! - [`core`] - Domain types and configuration schema
//! - [`sync`] - Keyed mutual exclusion and the single-flight cache
//! - [`resolve`] - Author-resolution strategies (direct and history-backed)
//! - [`report`] - Grouping, ranking, and capping into per-recipient reports
//! - [`directory`] - User-directory abstraction for recipient lookup
//! - [`source`] - Issue-source abstraction and the scanner HTTP client
//! - [`publish`] - Report-consumer abstraction
//!
//! # Correctness Invariants
//!
//! Blamecast maintains the following invariants:
//!
//! 1. At most one computation is ever in flight per cache key
//! 2. A failed computation is never cached; the next caller retries
//! 3. A single issue's resolution failure never affects the rest of the batch
//! 4. Aggregation only ever observes fully-resolved issues

pub mod core;
pub mod directory;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod resolve;
pub mod source;
pub mod sync;
