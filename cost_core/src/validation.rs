//! # Definition Validation
//!
//! Checks a [`ProjectDefinition`] before any computation and collects every
//! problem into a [`ValidationReport`]. Validation never stops at the first
//! failure: the caller gets the full list, each issue attributed to the
//! charge, center, key or product at fault.
//!
//! Errors block the pipeline. Warnings (e.g. a center omitted from a key,
//! which counts as 0 %) do not, unless the project enforces complete keys.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::definition::{Center, CostBehavior, IndirectCharge, ProjectDefinition};
//! use cost_core::project::AllocationSettings;
//! use cost_core::validation::{validate, IssueKind};
//!
//! let def = ProjectDefinition::new()
//!     .with_center(Center::primary("A", "Heure machine", 100.0))
//!     .with_charge(IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed), &[("A", 99.0)]);
//!
//! let report = validate(&def, &AllocationSettings::default());
//! assert!(!report.is_valid());
//! match &report.errors().next().unwrap().kind {
//!     IssueKind::KeySumMismatch { actual_sum, .. } => assert_eq!(*actual_sum, 99.0),
//!     other => panic!("unexpected issue: {other:?}"),
//! };
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definition::{CostBehavior, ProjectDefinition};
use crate::project::{AllocationSettings, DEFAULT_TOLERANCE_PCT, MAX_DECIMALS, MAX_TOLERANCE_PCT};
use crate::units::Percent;

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the computation
    Error,
    /// Reported, computation proceeds
    Warning,
}

/// The entity an issue belongs to, for display next to the offending input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityRef {
    Project,
    Center { name: String },
    Charge { nature: String },
    /// Primary key of a charge
    PrimaryKey { charge: String },
    /// Secondary key of an auxiliary center; `channel` is set only when the
    /// key gives the variable flow its own percentages
    SecondaryKey {
        center: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<CostBehavior>,
    },
    Product { name: String },
    Consumption { product: String },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Project => write!(f, "project"),
            EntityRef::Center { name } => write!(f, "section \"{}\"", name),
            EntityRef::Charge { nature } => write!(f, "charge \"{}\"", nature),
            EntityRef::PrimaryKey { charge } => write!(f, "primary key of charge \"{}\"", charge),
            EntityRef::SecondaryKey { center, channel: None } => {
                write!(f, "secondary key of section \"{}\"", center)
            }
            EntityRef::SecondaryKey { center, channel: Some(channel) } => {
                write!(f, "secondary key of section \"{}\" ({} flow)", center, channel.label())
            }
            EntityRef::Product { name } => write!(f, "product \"{}\"", name),
            EntityRef::Consumption { product } => write!(f, "consumption of product \"{}\"", product),
        }
    }
}

/// What is wrong. Variants carry the figures the UI needs to explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    /// A required text field is empty
    MissingField { field: String },
    /// Two entities of the same kind share a name
    DuplicateName { name: String },
    /// Two keys (or consumption maps) target the same entity
    DuplicateKey,
    NoPrimaryCenter,
    /// A primary center has no operational-unit quantity
    MissingQuantity,
    NonPositiveQuantity { quantity: f64 },
    /// Negative or non-finite charge amount
    InvalidAmount { amount: f64 },
    /// Percentage outside 0–100 or non-finite
    InvalidPercentage { center: String, percentage: f64 },
    /// Key percentages do not add up to 100; `gap` is `actual_sum - 100`
    KeySumMismatch { actual_sum: f64, gap: f64 },
    UnknownCenter { center: String },
    /// A primary key names a charge that is not declared
    UnknownCharge,
    /// A consumption map names a product that is not declared
    UnknownProduct,
    /// The center listed in a key appears twice
    DuplicateShare { center: String },
    /// A declared center is absent from a key (counts as 0 %)
    MissingShare { center: String },
    MissingPrimaryKey,
    MissingSecondaryKey,
    /// A secondary key is declared for a center that is not auxiliary
    NotAuxiliary,
    /// An auxiliary center is used where only primary centers may appear
    NotPrimary { center: String },
    NegativeConsumption { center: String, quantity: f64 },
    /// Key-sum tolerance is negative, non-finite or too wide
    InvalidTolerance { tolerance: f64 },
    /// Display precision beyond what front ends can print
    InvalidDecimals { decimals: u32 },
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub entity: EntityRef,
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn error(entity: EntityRef, kind: IssueKind) -> Self {
        ValidationIssue {
            severity: Severity::Error,
            entity,
            kind,
        }
    }

    pub fn warning(entity: EntityRef, kind: IssueKind) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            entity,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Human-readable description, without the entity prefix.
    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::MissingField { field } => format!("'{}' is required", field),
            IssueKind::DuplicateName { name } => format!("name \"{}\" is used more than once", name),
            IssueKind::DuplicateKey => "is defined more than once".to_string(),
            IssueKind::NoPrimaryCenter => "at least one primary section is required".to_string(),
            IssueKind::MissingQuantity => "primary section has no operational-unit quantity".to_string(),
            IssueKind::NonPositiveQuantity { quantity } => {
                format!("operational-unit quantity must be greater than 0 (got {})", quantity)
            }
            IssueKind::InvalidAmount { amount } => {
                format!("amount must be a non-negative number (got {})", amount)
            }
            IssueKind::InvalidPercentage { center, percentage } => {
                format!("percentage for \"{}\" must be between 0 and 100 (got {})", center, percentage)
            }
            IssueKind::KeySumMismatch { actual_sum, gap } => format!(
                "percentages must add up to 100% (currently {:.2}%, {:+.2} points)",
                actual_sum, gap
            ),
            IssueKind::UnknownCenter { center } => format!("section \"{}\" is not declared", center),
            IssueKind::UnknownCharge => "no indirect charge has this nature".to_string(),
            IssueKind::UnknownProduct => "no product has this name".to_string(),
            IssueKind::DuplicateShare { center } => format!("section \"{}\" is listed more than once", center),
            IssueKind::MissingShare { center } => {
                format!("section \"{}\" is not listed (counted as 0%)", center)
            }
            IssueKind::MissingPrimaryKey => "has no primary allocation key".to_string(),
            IssueKind::MissingSecondaryKey => {
                "auxiliary section has no secondary allocation key".to_string()
            }
            IssueKind::NotAuxiliary => "secondary keys apply to auxiliary sections only".to_string(),
            IssueKind::NotPrimary { center } => format!(
                "section \"{}\" is auxiliary; only primary sections may appear here",
                center
            ),
            IssueKind::NegativeConsumption { center, quantity } => format!(
                "quantity consumed from \"{}\" must be a non-negative number (got {})",
                center, quantity
            ),
            IssueKind::InvalidTolerance { tolerance } => format!(
                "key tolerance must be between 0 and {} points (got {})",
                MAX_TOLERANCE_PCT, tolerance
            ),
            IssueKind::InvalidDecimals { decimals } => {
                format!("display decimals must be at most {} (got {})", MAX_DECIMALS, decimals)
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", level, self.entity, self.message())
    }
}

/// All findings for one definition, in check order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// No blocking issue.
    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    /// Issues attributed to one entity.
    pub fn for_entity<'a>(&'a self, entity: &'a EntityRef) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues.iter().filter(move |i| &i.entity == entity)
    }

    fn error(&mut self, entity: EntityRef, kind: IssueKind) {
        self.push(ValidationIssue::error(entity, kind));
    }

    fn incomplete_key(&mut self, entity: EntityRef, center: &str, strict: bool) {
        let kind = IssueKind::MissingShare {
            center: center.to_string(),
        };
        if strict {
            self.push(ValidationIssue::error(entity, kind));
        } else {
            self.push(ValidationIssue::warning(entity, kind));
        }
    }
}

/// Validate a definition against the project settings.
pub fn validate(def: &ProjectDefinition, settings: &AllocationSettings) -> ValidationReport {
    let mut report = ValidationReport::default();

    let tolerance = check_settings(settings, &mut report);
    check_centers(def, &mut report);
    check_charges(def, &mut report);
    check_primary_keys(def, settings, tolerance, &mut report);
    check_secondary_keys(def, settings, tolerance, &mut report);
    check_products(def, &mut report);
    check_consumptions(def, &mut report);

    tracing::debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "definition validated"
    );
    report
}

/// Returns the tolerance key sums are checked with. An invalid one is
/// reported and replaced by the default so key findings stay meaningful.
fn check_settings(settings: &AllocationSettings, report: &mut ValidationReport) -> f64 {
    if settings.decimals > MAX_DECIMALS {
        report.error(
            EntityRef::Project,
            IssueKind::InvalidDecimals {
                decimals: settings.decimals,
            },
        );
    }
    if settings.tolerance_is_valid() {
        settings.tolerance_pct
    } else {
        report.error(
            EntityRef::Project,
            IssueKind::InvalidTolerance {
                tolerance: settings.tolerance_pct,
            },
        );
        DEFAULT_TOLERANCE_PCT
    }
}

fn check_centers(def: &ProjectDefinition, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for center in &def.centers {
        let entity = EntityRef::Center {
            name: center.name.clone(),
        };
        if center.name.trim().is_empty() {
            report.error(entity.clone(), IssueKind::MissingField { field: "nom".into() });
        } else if !seen.insert(center.name.as_str()) {
            report.error(
                entity.clone(),
                IssueKind::DuplicateName {
                    name: center.name.clone(),
                },
            );
        }

        if center.is_primary() {
            match def.effective_quantity(&center.name) {
                None => report.error(entity, IssueKind::MissingQuantity),
                Some(q) if !(q.is_finite() && q > 0.0) => {
                    report.error(entity, IssueKind::NonPositiveQuantity { quantity: q })
                }
                Some(_) => {}
            }
        }
    }

    if def.primary_centers().next().is_none() {
        report.error(EntityRef::Project, IssueKind::NoPrimaryCenter);
    }
}

fn check_charges(def: &ProjectDefinition, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for charge in &def.charges {
        let entity = EntityRef::Charge {
            nature: charge.nature.clone(),
        };
        if charge.nature.trim().is_empty() {
            report.error(entity.clone(), IssueKind::MissingField { field: "nature".into() });
        } else if !seen.insert(charge.nature.as_str()) {
            report.error(
                entity.clone(),
                IssueKind::DuplicateName {
                    name: charge.nature.clone(),
                },
            );
        }

        if !(charge.amount.is_finite() && charge.amount.value() >= 0.0) {
            report.error(
                entity.clone(),
                IssueKind::InvalidAmount {
                    amount: charge.amount.value(),
                },
            );
        }

        if def.primary_key_for(&charge.nature).is_none() {
            report.error(entity, IssueKind::MissingPrimaryKey);
        }
    }
}

/// Checks shared by every key: percentage range, duplicates, unknown
/// centers, sum. `allowed` tells whether a declared center may appear.
fn check_shares<'a>(
    def: &ProjectDefinition,
    shares: impl Iterator<Item = (&'a str, Percent)>,
    entity: &EntityRef,
    tolerance: f64,
    allowed: impl Fn(&str) -> Option<IssueKind>,
    report: &mut ValidationReport,
) -> HashSet<&'a str> {
    let mut listed = HashSet::new();
    let mut sum = Percent(0.0);

    for (center, pct) in shares {
        if !listed.insert(center) {
            report.error(
                entity.clone(),
                IssueKind::DuplicateShare {
                    center: center.to_string(),
                },
            );
        }
        if def.center(center).is_none() {
            report.error(
                entity.clone(),
                IssueKind::UnknownCenter {
                    center: center.to_string(),
                },
            );
        } else if let Some(kind) = allowed(center) {
            report.error(entity.clone(), kind);
        }
        if !(pct.value().is_finite() && (0.0..=100.0).contains(&pct.value())) {
            report.error(
                entity.clone(),
                IssueKind::InvalidPercentage {
                    center: center.to_string(),
                    percentage: pct.value(),
                },
            );
        }
        sum = sum + pct;
    }

    if !sum.is_full(tolerance) {
        report.error(
            entity.clone(),
            IssueKind::KeySumMismatch {
                actual_sum: sum.value(),
                gap: sum.value() - Percent::FULL.value(),
            },
        );
    }

    listed
}

fn check_primary_keys(
    def: &ProjectDefinition,
    settings: &AllocationSettings,
    tolerance: f64,
    report: &mut ValidationReport,
) {
    let mut seen = HashSet::new();
    for key in &def.primary_keys {
        let entity = EntityRef::PrimaryKey {
            charge: key.charge.clone(),
        };
        if !seen.insert(key.charge.as_str()) {
            report.error(entity.clone(), IssueKind::DuplicateKey);
            continue;
        }
        if def.charge(&key.charge).is_none() {
            report.error(entity.clone(), IssueKind::UnknownCharge);
        }

        let listed = check_shares(
            def,
            key.shares.iter().map(|s| (s.center.as_str(), s.percentage)),
            &entity,
            tolerance,
            |_| None,
            report,
        );

        for center in &def.centers {
            if !listed.contains(center.name.as_str()) {
                report.incomplete_key(entity.clone(), &center.name, settings.require_complete_keys);
            }
        }
    }
}

fn check_secondary_keys(
    def: &ProjectDefinition,
    settings: &AllocationSettings,
    tolerance: f64,
    report: &mut ValidationReport,
) {
    let mut seen = HashSet::new();
    for key in &def.secondary_keys {
        let base = EntityRef::SecondaryKey {
            center: key.auxiliary.clone(),
            channel: None,
        };
        if !seen.insert(key.auxiliary.as_str()) {
            report.error(base, IssueKind::DuplicateKey);
            continue;
        }
        match def.center(&key.auxiliary) {
            None => report.error(
                base.clone(),
                IssueKind::UnknownCenter {
                    center: key.auxiliary.clone(),
                },
            ),
            Some(c) if !c.is_auxiliary() => report.error(base.clone(), IssueKind::NotAuxiliary),
            Some(_) => {}
        }

        let channels: &[Option<CostBehavior>] = if key.has_split_channels() {
            &[Some(CostBehavior::Fixed), Some(CostBehavior::Variable)]
        } else {
            &[None]
        };

        for channel in channels {
            let entity = EntityRef::SecondaryKey {
                center: key.auxiliary.clone(),
                channel: *channel,
            };
            let shares = key.shares_for(channel.unwrap_or(CostBehavior::Fixed));
            let listed = check_shares(
                def,
                shares.iter().map(|s| (s.center.as_str(), s.percentage)),
                &entity,
                tolerance,
                |center| match def.center(center) {
                    Some(c) if c.is_auxiliary() => Some(IssueKind::NotPrimary {
                        center: center.to_string(),
                    }),
                    _ => None,
                },
                report,
            );

            for center in def.primary_centers() {
                if !listed.contains(center.name.as_str()) {
                    report.incomplete_key(entity.clone(), &center.name, settings.require_complete_keys);
                }
            }
        }
    }

    for center in def.auxiliary_centers() {
        if def.secondary_key_for(&center.name).is_none() {
            report.error(
                EntityRef::Center {
                    name: center.name.clone(),
                },
                IssueKind::MissingSecondaryKey,
            );
        }
    }
}

fn check_products(def: &ProjectDefinition, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for product in &def.products {
        let entity = EntityRef::Product {
            name: product.name.clone(),
        };
        if product.name.trim().is_empty() {
            report.error(entity, IssueKind::MissingField { field: "nom".into() });
        } else if !seen.insert(product.name.as_str()) {
            report.error(
                entity,
                IssueKind::DuplicateName {
                    name: product.name.clone(),
                },
            );
        }
    }
}

fn check_consumptions(def: &ProjectDefinition, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for consumption in &def.consumptions {
        let entity = EntityRef::Consumption {
            product: consumption.product.clone(),
        };
        if !seen.insert(consumption.product.as_str()) {
            report.error(entity, IssueKind::DuplicateKey);
            continue;
        }
        if def.product(&consumption.product).is_none() {
            report.error(entity.clone(), IssueKind::UnknownProduct);
        }

        let mut listed = HashSet::new();
        for line in &consumption.lines {
            if !listed.insert(line.center.as_str()) {
                report.error(
                    entity.clone(),
                    IssueKind::DuplicateShare {
                        center: line.center.clone(),
                    },
                );
            }
            match def.center(&line.center) {
                None => report.error(
                    entity.clone(),
                    IssueKind::UnknownCenter {
                        center: line.center.clone(),
                    },
                ),
                Some(c) if c.is_auxiliary() => report.error(
                    entity.clone(),
                    IssueKind::NotPrimary {
                        center: line.center.clone(),
                    },
                ),
                Some(_) => {}
            }
            if !(line.quantity.is_finite() && line.quantity >= 0.0) {
                report.error(
                    entity.clone(),
                    IssueKind::NegativeConsumption {
                        center: line.center.clone(),
                        quantity: line.quantity,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Center, IndirectCharge};
    use crate::samples;

    fn settings() -> AllocationSettings {
        AllocationSettings::default()
    }

    fn base() -> ProjectDefinition {
        ProjectDefinition::new()
            .with_center(Center::primary("A", "Heure machine", 100.0))
            .with_center(Center::primary("B", "Heure", 50.0))
            .with_center(Center::auxiliary("C"))
            .with_secondary_key("C", &[("A", 50.0), ("B", 50.0)])
    }

    fn kinds(report: &ValidationReport) -> Vec<&IssueKind> {
        report.issues.iter().map(|i| &i.kind).collect()
    }

    #[test]
    fn test_samples_are_valid() {
        assert!(validate(&samples::tutorial(), &settings()).issues.is_empty());
        assert!(validate(&samples::workshop(), &settings()).issues.is_empty());
    }

    #[test]
    fn test_primary_key_sum_99_rejected() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 50.0), ("B", 30.0), ("C", 19.0)],
        );
        let report = validate(&def, &settings());
        assert!(!report.is_valid());

        let issue = report.errors().next().unwrap();
        assert_eq!(
            issue.entity,
            EntityRef::PrimaryKey {
                charge: "Loyer".to_string()
            }
        );
        match issue.kind {
            IssueKind::KeySumMismatch { actual_sum, gap } => {
                assert!((actual_sum - 99.0).abs() < 1e-9);
                assert!((gap + 1.0).abs() < 1e-9);
            }
            ref other => panic!("unexpected issue: {other:?}"),
        }
        assert!(issue.to_string().contains("currently 99.00%"));
    }

    #[test]
    fn test_primary_key_sum_101_rejected() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 50.0), ("B", 30.0), ("C", 21.0)],
        );
        let report = validate(&def, &settings());
        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.issues[0].kind,
            IssueKind::KeySumMismatch { actual_sum, .. } if (actual_sum - 101.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_sum_within_tolerance_accepted() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 33.333), ("B", 33.333), ("C", 33.333)],
        );
        let report = validate(&def, &settings());
        assert!(report.is_valid());
    }

    #[test]
    fn test_oversized_tolerance_rejected() {
        let def = ProjectDefinition::new()
            .with_center(Center::primary("A", "Heure", 10.0))
            .with_charge(IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed), &[("A", 10.0)]);
        let loose = AllocationSettings {
            tolerance_pct: 1e9,
            ..AllocationSettings::default()
        };

        let report = validate(&def, &loose);
        assert!(!report.is_valid());
        assert!(report
            .for_entity(&EntityRef::Project)
            .any(|i| i.kind == IssueKind::InvalidTolerance { tolerance: 1e9 }));
        // The key is still checked with the default tolerance
        assert!(report
            .errors()
            .any(|i| matches!(i.kind, IssueKind::KeySumMismatch { .. })));
    }

    #[test]
    fn test_nan_tolerance_reported_once() {
        let nan = AllocationSettings {
            tolerance_pct: f64::NAN,
            ..AllocationSettings::default()
        };
        let report = validate(&samples::tutorial(), &nan);
        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.issues[0].kind,
            IssueKind::InvalidTolerance { tolerance } if tolerance.is_nan()
        ));
    }

    #[test]
    fn test_tolerance_at_cap_accepts_one_point_gap() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 50.0), ("B", 30.0), ("C", 19.0)],
        );
        let capped = AllocationSettings {
            tolerance_pct: MAX_TOLERANCE_PCT,
            ..AllocationSettings::default()
        };
        assert!(validate(&def, &capped).is_valid());
    }

    #[test]
    fn test_excessive_decimals_rejected() {
        let settings = AllocationSettings {
            decimals: 70_000,
            ..AllocationSettings::default()
        };
        let report = validate(&samples::tutorial(), &settings);
        assert_eq!(
            report.issues,
            vec![ValidationIssue::error(
                EntityRef::Project,
                IssueKind::InvalidDecimals { decimals: 70_000 }
            )]
        );
        assert!(report.issues[0].to_string().contains("at most 10"));
    }

    #[test]
    fn test_omitted_center_is_warning_unless_strict() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 60.0), ("B", 40.0)],
        );

        let report = validate(&def, &settings());
        assert!(report.is_valid());
        assert_eq!(report.warning_count(), 1);
        assert_eq!(
            report.issues[0].kind,
            IssueKind::MissingShare {
                center: "C".to_string()
            }
        );

        let strict = AllocationSettings {
            require_complete_keys: true,
            ..AllocationSettings::default()
        };
        assert!(!validate(&def, &strict).is_valid());
    }

    #[test]
    fn test_unknown_center_in_key() {
        let def = base().with_charge(
            IndirectCharge::new("Loyer", 1_000.0, CostBehavior::Fixed),
            &[("A", 50.0), ("B", 25.0), ("C", 20.0), ("Z", 5.0)],
        );
        let report = validate(&def, &settings());
        assert!(kinds(&report).contains(&&IssueKind::UnknownCenter {
            center: "Z".to_string()
        }));
    }

    #[test]
    fn test_center_checks() {
        let mut def = base().with_center(Center::primary("A", "h", 10.0));
        def.centers[1].quantity = Some(0.0);
        def.centers.push(Center {
            quantity: None,
            ..Center::primary("D", "h", 1.0)
        });

        let report = validate(&def, &settings());
        let k = kinds(&report);
        assert!(k.contains(&&IssueKind::DuplicateName { name: "A".to_string() }));
        assert!(k.contains(&&IssueKind::NonPositiveQuantity { quantity: 0.0 }));
        assert!(k.contains(&&IssueKind::MissingQuantity));
    }

    #[test]
    fn test_no_primary_center() {
        let def = ProjectDefinition::new().with_center(Center::auxiliary("C"));
        let report = validate(&def, &settings());
        assert!(report
            .for_entity(&EntityRef::Project)
            .any(|i| i.kind == IssueKind::NoPrimaryCenter));
    }

    #[test]
    fn test_charge_without_key_and_negative_amount() {
        let mut def = base();
        def.charges.push(IndirectCharge::new("Eau", -5.0, CostBehavior::Variable));
        let report = validate(&def, &settings());
        let entity = EntityRef::Charge {
            nature: "Eau".to_string(),
        };
        let issues: Vec<_> = report.for_entity(&entity).map(|i| &i.kind).collect();
        assert!(issues.contains(&&IssueKind::InvalidAmount { amount: -5.0 }));
        assert!(issues.contains(&&IssueKind::MissingPrimaryKey));
    }

    #[test]
    fn test_secondary_key_into_auxiliary_rejected() {
        let def = base()
            .with_center(Center::auxiliary("D"))
            .with_secondary_key("D", &[("A", 50.0), ("C", 50.0)]);
        let report = validate(&def, &settings());
        assert!(kinds(&report).contains(&&IssueKind::NotPrimary {
            center: "C".to_string()
        }));
    }

    #[test]
    fn test_auxiliary_without_secondary_key() {
        let def = base().with_center(Center::auxiliary("D"));
        let report = validate(&def, &settings());
        assert!(report
            .for_entity(&EntityRef::Center { name: "D".to_string() })
            .any(|i| i.kind == IssueKind::MissingSecondaryKey));
    }

    #[test]
    fn test_split_channels_checked_independently() {
        let mut def = base();
        def.secondary_keys[0] = def.secondary_keys[0]
            .clone()
            .with_variable_shares(&[("A", 80.0), ("B", 10.0)]);
        let report = validate(&def, &settings());
        assert_eq!(report.error_count(), 1);
        assert_eq!(
            report.issues[0].entity,
            EntityRef::SecondaryKey {
                center: "C".to_string(),
                channel: Some(CostBehavior::Variable)
            }
        );
    }

    #[test]
    fn test_consumption_checks() {
        let mut def = base().with_product("X", &[("A", 1.0), ("C", 2.0), ("B", -1.0)]);
        def.consumptions.push(crate::definition::Consumption {
            product: "Ghost".to_string(),
            lines: vec![],
        });
        let report = validate(&def, &settings());
        let k = kinds(&report);
        assert!(k.contains(&&IssueKind::NotPrimary { center: "C".to_string() }));
        assert!(k.contains(&&IssueKind::NegativeConsumption {
            center: "B".to_string(),
            quantity: -1.0
        }));
        assert!(k.contains(&&IssueKind::UnknownProduct));
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ValidationIssue::error(
            EntityRef::PrimaryKey {
                charge: "Loyer".to_string(),
            },
            IssueKind::KeySumMismatch {
                actual_sum: 99.0,
                gap: -1.0,
            },
        );
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["entity"]["type"], "primary_key");
        assert_eq!(json["entity"]["charge"], "Loyer");
        assert_eq!(json["kind"]["code"], "key_sum_mismatch");
        assert_eq!(json["kind"]["actual_sum"], 99.0);

        let roundtrip: ValidationIssue = serde_json::from_value(json).unwrap();
        assert_eq!(roundtrip, issue);
    }
}
