//! directory
//!
//! User-directory abstraction for recipient lookup.

pub mod mock;
pub mod traits;

pub use mock::MockDirectory;
pub use traits::{DirectoryError, UserDirectory};
