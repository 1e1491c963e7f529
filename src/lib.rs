//! aria2 Notifier Library
//!
//! Bridges aria2 download notifications to a work queue. The binaries wire
//! these modules together; they are exposed here for testing and reuse.

pub mod aria2;
pub mod completion;
pub mod config;
pub mod notifier;
pub mod paths;
pub mod queue;
pub mod scan;

// Re-export commonly used types for convenience
pub use aria2::{Aria2Client, StatusResolver};
pub use completion::CompletionNotifier;
pub use config::AppConfig;
pub use notifier::{Dispatcher, NotificationChannel, Notifier, SessionEnd};
pub use queue::{MemoryQueue, QueueProducer, RedisQueue};
