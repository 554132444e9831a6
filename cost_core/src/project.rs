//! # Project Data Structures
//!
//! The `Project` struct wraps a [`ProjectDefinition`] with metadata and the
//! settings the validator and the presentation layer use. Projects serialize
//! to `.sct` (Sectio) files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (id, version, name, timestamps)
//! ├── settings: AllocationSettings (tolerance, strictness, display)
//! └── definition: ProjectDefinition (flattened at the top level)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cost_core::project::Project;
//! use cost_core::samples;
//!
//! let project = Project::new("Atelier", "Exercice 2025").with_definition(samples::workshop());
//! let result = project.calculate().unwrap();
//! assert_eq!(result.sections.len(), 2);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::allocation::{self, AllocationResult};
use crate::definition::ProjectDefinition;
use crate::errors::CalcResult;
use crate::validation::{self, ValidationReport};

/// Current schema version for .sct files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Default tolerance on key sums, in percentage points
pub const DEFAULT_TOLERANCE_PCT: f64 = 0.01;

/// Largest accepted tolerance; beyond it a key could drop part of a charge
pub const MAX_TOLERANCE_PCT: f64 = 1.0;

/// Largest accepted display precision
pub const MAX_DECIMALS: u32 = 10;

/// Settings that shape validation and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationSettings {
    /// Accepted gap between a key's sum and 100 %
    #[serde(rename = "tolerance_pourcentage")]
    pub tolerance_pct: f64,

    /// Treat a center omitted from a key as an error instead of a warning
    #[serde(rename = "cles_completes")]
    pub require_complete_keys: bool,

    /// Currency symbol used by front ends
    #[serde(rename = "devise")]
    pub currency: String,

    /// Display rounding; computation never rounds
    #[serde(rename = "decimales")]
    pub decimals: u32,
}

impl AllocationSettings {
    /// Tolerance is a finite number of points in `0..=MAX_TOLERANCE_PCT`.
    pub fn tolerance_is_valid(&self) -> bool {
        self.tolerance_pct.is_finite() && (0.0..=MAX_TOLERANCE_PCT).contains(&self.tolerance_pct)
    }

    /// Display precision, capped at [`MAX_DECIMALS`].
    pub fn display_decimals(&self) -> usize {
        self.decimals.min(MAX_DECIMALS) as usize
    }
}

impl Default for AllocationSettings {
    fn default() -> Self {
        AllocationSettings {
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
            require_complete_keys: false,
            currency: "€".to_string(),
            decimals: 2,
        }
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Schema version (for migration compatibility)
    #[serde(default = "current_version")]
    pub version: String,

    #[serde(rename = "nom", default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "cree_le", default = "Utc::now")]
    pub created: DateTime<Utc>,

    #[serde(rename = "modifie_le", default = "Utc::now")]
    pub modified: DateTime<Utc>,
}

fn current_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ProjectMetadata {
            id: Uuid::new_v4(),
            version: current_version(),
            name: String::new(),
            description: String::new(),
            created: now,
            modified: now,
        }
    }
}

/// Root project container.
///
/// This is the top-level struct that gets serialized to `.sct` files. A bare
/// definition without `projet`/`parametres` also deserializes: both sections
/// fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "projet", default)]
    pub meta: ProjectMetadata,

    #[serde(rename = "parametres", default)]
    pub settings: AllocationSettings,

    #[serde(flatten)]
    pub definition: ProjectDefinition,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cost_core::project::Project;
    ///
    /// let project = Project::new("Atelier", "Premier essai");
    /// assert_eq!(project.meta.name, "Atelier");
    /// assert!(project.definition.centers.is_empty());
    /// ```
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Project {
            meta: ProjectMetadata {
                name: name.into(),
                description: description.into(),
                ..ProjectMetadata::default()
            },
            settings: AllocationSettings::default(),
            definition: ProjectDefinition::default(),
        }
    }

    pub fn with_definition(mut self, definition: ProjectDefinition) -> Self {
        self.definition = definition;
        self.touch();
        self
    }

    pub fn with_settings(mut self, settings: AllocationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate the definition with this project's settings.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.definition, &self.settings)
    }

    /// Run the allocation pipeline with this project's settings.
    pub fn calculate(&self) -> CalcResult<AllocationResult> {
        allocation::calculate(&self.definition, &self.settings)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "")
    }
}
