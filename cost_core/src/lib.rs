//! # cost_core - Homogeneous-Sections Cost Allocation Engine
//!
//! `cost_core` is the computational heart of Sectio. It distributes indirect
//! charges over analysis sections, empties the auxiliary sections into the
//! primary ones, and derives unit costs for sections and products. All inputs
//! and outputs are JSON-serializable with the French field names used by
//! cost-accounting courses.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: `calculate` is a pure function of the definition
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Validate First**: every problem is reported at once, before any math
//! - **Deterministic**: declaration order is kept, output is byte-identical
//!
//! ## Quick Start
//!
//! ```rust
//! use cost_core::{calculate, AllocationSettings};
//! use cost_core::samples;
//!
//! let result = calculate(&samples::tutorial(), &AllocationSettings::default()).unwrap();
//!
//! let a = result.section("Section A").unwrap();
//! assert!((a.unit_cost_total.value() - 48.0).abs() < 1e-9);
//!
//! let json = serde_json::to_string_pretty(&result).unwrap();
//! assert!(json.contains("couts_unitaires_produits"));
//! ```
//!
//! ## Modules
//!
//! - [`definition`] - Sections, charges, keys, products and consumption
//! - [`validation`] - Structured validation report
//! - [`allocation`] - Primary/secondary distribution, unit and product costs
//! - [`project`] - Project container, metadata, and settings
//! - [`units`] - Amount and percentage wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`samples`] - Ready-made definitions

pub mod allocation;
pub mod definition;
pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod project;
pub mod samples;
pub mod units;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use allocation::{calculate, AllocationResult};
pub use definition::{Center, CenterKind, CostBehavior, IndirectCharge, ProjectDefinition};
pub use errors::{CalcError, CalcResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_project, save_project, FileLock};
pub use project::{AllocationSettings, Project, ProjectMetadata};
pub use units::{Amount, Percent};
pub use validation::{validate, ValidationReport};
