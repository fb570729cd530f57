//! source
//!
//! Issue-source abstraction and the scanner HTTP client.

pub mod mock;
pub mod scanner;
pub mod traits;

pub use mock::MockSource;
pub use scanner::{ScannerClient, ScannerConfig};
pub use traits::{IssueSource, SourceError};
