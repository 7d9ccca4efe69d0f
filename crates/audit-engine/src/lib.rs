#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`AuditEngineError`)
//! - [`config`]: Engine configuration (`AuditEngineConfig`, builder)
//! - [`runtime`]: Container runtime abstraction (`RuntimeClient` trait, `BollardRuntimeClient`)
//! - [`probe`]: Probe runner (`ProbeRunner`, `ProbeRun`, `SoftFailure`)
//! - [`report`]: Finding aggregation (`Report`, `aggregate`)
//! - [`render`]: Report rendering (`Renderer`, `ReportFormat`, text / paginated PDF)
//! - [`artifact`]: Atomic artifact writes
//! - [`summary`]: Run summary (`Summary`, `ContainerOutcome`)
//! - [`auditor`]: Main orchestrator (`Auditor`, `AuditorBuilder`)
//!
//! # Architecture
//!
//! ```text
//! RuntimeClient --list--> Auditor --(per container, bounded pool)--+
//!                                                                   |
//!                   ProbeRunner.run() --> aggregate() --> Renderer.render()
//!                                                                   |
//!                                   ContainerOutcome --> Summary <--+
//! ```

pub mod artifact;
pub mod auditor;
pub mod config;
pub mod error;
pub mod probe;
pub mod render;
pub mod report;
pub mod runtime;
pub mod summary;

// --- Public API Re-exports ---

// Orchestrator
pub use auditor::{Auditor, AuditorBuilder};

// Configuration
pub use config::{AuditEngineConfig, AuditEngineConfigBuilder};

// Error
pub use error::AuditEngineError;

// Runtime
pub use runtime::{BollardRuntimeClient, ExecOutput, RuntimeClient};

// Probes and aggregation
pub use probe::{ProbeRun, ProbeRunner, SoftFailure};
pub use report::{Report, aggregate, aggregate_at};

// Rendering
pub use render::document::{DocumentLayout, paginate};
pub use render::{ReportFormat, Renderer, artifact_path, sanitize_name};

// Summary
pub use summary::{ContainerFailure, ContainerOutcome, Summary};
