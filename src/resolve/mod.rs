//! resolve
//!
//! Author-resolution strategies and the revision-lookup boundary.
//!
//! Two strategies satisfy the [`AuthorResolver`] contract:
//!
//! - [`DirectResolver`] - trusts the scanner's own author hint
//! - [`HistoryResolver`] - attributes each issue line through cached,
//!   single-flight revision-history lookups

pub mod direct;
pub mod git_lookup;
pub mod history;
pub mod lookup;
pub mod mock;
pub mod traits;

pub use direct::DirectResolver;
pub use git_lookup::GitRevisionLookup;
pub use history::HistoryResolver;
pub use lookup::{LookupError, RevisionHistory, RevisionId, RevisionLookup};
pub use traits::AuthorResolver;
