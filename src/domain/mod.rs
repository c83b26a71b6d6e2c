//! Domain types and DTOs
//!
//! These types define the data structures for marketplace entities.

pub mod actors;
pub mod clients;
pub mod craftsmen;
pub mod dashboard;
pub mod jobs;
pub mod notifications;
pub mod payments;
pub mod quotes;
pub mod reviews;

// Re-export commonly used types
pub use actors::*;
pub use clients::*;
pub use craftsmen::*;
pub use dashboard::*;
pub use jobs::*;
pub use notifications::*;
pub use payments::*;
pub use quotes::*;
pub use reviews::*;
