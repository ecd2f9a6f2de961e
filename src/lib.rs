#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Bundler Core Rust
//!
//! Task-bundling optimizer for a single agent.
//!
//! ## Overview
//!
//! Given a start pose, a fixed-order list of committed tasks and a pool of
//! candidate tasks, the bundler searches for the cheapest ways to fold a few of
//! the candidates into the committed sequence. Costs come from an external path
//! planner that may be slow, busy or unavailable, so every evaluation is an
//! awaited call with a timeout and a temporary/fatal failure split.
//!
//! ## Module Organization
//!
//! - [`models`] - Poses, tasks, bundles, requests and results
//! - [`combinatorics`] - Subset, permutation and interleaving generators
//! - [`oracle`] - Path-planner interface and the cost client built on it
//! - [`orchestration`] - Queue, worker, search engine, result distribution, service facade
//! - [`events`] - Broadcast topic for results
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging bootstrap
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bundler_core::config::ConfigManager;
//! use bundler_core::models::{BundlingRequest, Pose2d, Task};
//! use bundler_core::oracle::LocalPathPlanner;
//! use bundler_core::orchestration::BundlingService;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! bundler_core::logging::init_structured_logging();
//! let manager = ConfigManager::load()?;
//! let service = BundlingService::start(manager.config(), Arc::new(LocalPathPlanner::new()))?;
//!
//! let mut results = service.subscribe();
//! service.submit(
//!     BundlingRequest::new("robot-1", Pose2d::new(0.0, 0.0, 0.0))
//!         .with_committed(vec![Task::new(10.0, 0.0, 0.0)])
//!         .with_candidates(vec![Task::new(1.0, 0.0, 0.0), Task::new(2.0, 0.0, 0.0)])
//!         .with_limits(2, 1),
//! )?;
//!
//! let published = results.recv().await?;
//! println!("best bundle: {:?}", published.result.best());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, scenario and property tests
//! ```

pub mod combinatorics;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod orchestration;

pub use config::{BundlerConfig, ConfigManager, ConfigurationError};
pub use error::{BundlerError, PlanningError, PlanningErrorKind, Result};
pub use events::{PublishError, PublishedResult, ResultPublisher};
pub use models::{
    Bundle, BundleList, BundlingRequest, BundlingResult, Pose2d, RequesterId, Task, TaskList,
};
pub use oracle::{CostOracle, LocalPathPlanner, LocalPlannerMode, PathCostClient, PathPlanner};
pub use orchestration::{BundleSearchEngine, BundlingService, WorkerStatus};
