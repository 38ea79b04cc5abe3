#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # People RW Core
//!
//! Core of a read/write service that stores Person entities in a graph
//! database through templated statements.
//!
//! ## Overview
//!
//! HTTP handlers for many concurrent requests each produce a handful of
//! statements. Rather than sending every request's statements to the database
//! on its own, they are handed to a [`batching::BatchDispatcher`], which
//! coalesces them into ordered batches (by count or by elapsed time), runs
//! each batch as one atomic executor call and reports the single outcome back
//! to every request that contributed to it.
//!
//! ## Module Organization
//!
//! - [`batching`] - The batching dispatcher: collector actor, executor seam, flush observers
//! - [`people`] - Person model and its mapping onto graph statements
//! - [`config`] - Layered configuration for thresholds and service settings
//! - [`error`] - Dispatcher and configuration errors
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use people_rw_core::batching::{BatchDispatcher, FnExecutor};
//! use people_rw_core::config::ServiceConfig;
//! use people_rw_core::people::{PeopleService, Person, Statement};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! people_rw_core::logging::init_structured_logging();
//! let config = ServiceConfig::load(None)?;
//!
//! let executor = FnExecutor::new(|_statements: &[Statement]| {
//!     // hand the whole batch to the graph database in one transaction
//!     Ok::<_, String>(())
//! });
//! let dispatcher = BatchDispatcher::spawn(config.batcher.clone(), executor)?;
//! let people = PeopleService::new(dispatcher);
//!
//! people
//!     .write(&Person {
//!         uuid: "180cec41-23fa-4148-806b-0602924e6858".to_string(),
//!         name: "Minimal Person".to_string(),
//!         ..Person::default()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod batching;
pub mod config;
pub mod error;
pub mod logging;
pub mod people;

pub use batching::{BatchDispatcher, BatchExecutor, FlushEvent, FlushObserver, FlushTrigger};
pub use config::{BatcherConfig, ServiceConfig};
pub use error::{BatchError, BatchResult, ConfigurationError};
