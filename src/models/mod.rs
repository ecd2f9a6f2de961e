//! # Bundling Data Model
//!
//! Poses, tasks, bundles and the request/result envelopes that travel through
//! the pipeline. All of these are plain values: created once, never mutated
//! after they leave their producer.

pub mod bundle;
pub mod request;
pub mod task;

// Re-export models for easy access
pub use bundle::{Bundle, BundleList};
pub use request::{BundlingRequest, BundlingResult, RequesterId};
pub use task::{Pose2d, Task, TaskList};
