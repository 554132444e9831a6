//! # Cost Allocation Pipeline
//!
//! The homogeneous-sections method as a pure, single-pass pipeline:
//!
//! 1. [`primary`] - spread every indirect charge over all centers
//! 2. [`secondary`] - empty the auxiliary centers into the primary ones
//! 3. [`unit_cost`] - divide each primary total by its operational units
//! 4. [`product_cost`] - charge products with the sections they consume
//!
//! [`calculate`] validates the definition first and runs the four stages only
//! if no error was found: a result is either complete or absent.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::allocation::calculate;
//! use cost_core::project::AllocationSettings;
//! use cost_core::samples;
//!
//! let result = calculate(&samples::tutorial(), &AllocationSettings::default()).unwrap();
//!
//! let x = result.product("Produit X").unwrap();
//! assert!((x.unit_cost_total.value() - 8_466.67).abs() < 0.01);
//! ```

pub mod primary;
pub mod product_cost;
pub mod secondary;
pub mod unit_cost;

use serde::{Deserialize, Serialize};

use crate::definition::{CenterKind, CostBehavior, ProjectDefinition};
use crate::errors::{CalcError, CalcResult};
use crate::project::AllocationSettings;
use crate::units::Amount;
use crate::validation::{validate, ValidationIssue};

pub use primary::{allocate_primary, CenterSubtotal, ChargeDistribution, DistributionLine, PrimaryAllocation};
pub use product_cost::{cost_products, ConsumptionCost, ProductUnitCost};
pub use secondary::{allocate_secondary, AuxiliaryDistribution, SecondaryAllocation};
pub use unit_cost::{compute_unit_costs, SectionUnitCost};

/// Indirect charges overview with the detail of both distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargesSummary {
    #[serde(rename = "total_fixe")]
    pub total_fixed: Amount,
    pub total_variable: Amount,
    pub total: Amount,
    #[serde(rename = "repartition_primaire_fixe")]
    pub primary_fixed: Vec<ChargeDistribution>,
    #[serde(rename = "repartition_primaire_variable")]
    pub primary_variable: Vec<ChargeDistribution>,
    #[serde(rename = "repartition_secondaire_fixe")]
    pub secondary_fixed: Vec<AuxiliaryDistribution>,
    #[serde(rename = "repartition_secondaire_variable")]
    pub secondary_variable: Vec<AuxiliaryDistribution>,
}

/// A center's subtotal at the end of the primary distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterTotal {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CenterKind,
    #[serde(rename = "total_fixe")]
    pub total_fixed: Amount,
    pub total_variable: Amount,
    pub total: Amount,
}

/// Everything the presentation layer displays for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    #[serde(rename = "charges_indirectes")]
    pub charges: ChargesSummary,

    /// Primary-stage subtotals of every center
    #[serde(rename = "totaux_primaires")]
    pub primary_totals: Vec<CenterTotal>,

    #[serde(rename = "couts_unitaires_sections")]
    pub sections: Vec<SectionUnitCost>,

    #[serde(rename = "couts_unitaires_produits")]
    pub products: Vec<ProductUnitCost>,

    /// Non-blocking validation findings
    #[serde(rename = "avertissements", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationIssue>,
}

impl AllocationResult {
    pub fn section(&self, name: &str) -> Option<&SectionUnitCost> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn product(&self, name: &str) -> Option<&ProductUnitCost> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn primary_total(&self, name: &str) -> Option<&CenterTotal> {
        self.primary_totals.iter().find(|c| c.name == name)
    }
}

/// Validate a definition and run the whole pipeline.
///
/// # Returns
///
/// * `Ok(AllocationResult)` - complete result, with any warnings attached
/// * `Err(CalcError::ValidationFailed)` - the full validation report; nothing
///   was computed
/// * `Err(CalcError::Internal)` - a stage met data validation should have
///   rejected, or amounts too large for `f64` overflowed
pub fn calculate(def: &ProjectDefinition, settings: &AllocationSettings) -> CalcResult<AllocationResult> {
    let span = tracing::debug_span!(
        "calculate",
        centers = def.centers.len(),
        charges = def.charges.len(),
        products = def.products.len()
    );
    let _enter = span.enter();

    let report = validate(def, settings);
    for warning in report.warnings() {
        tracing::warn!("{}", warning);
    }
    if !report.is_valid() {
        return Err(CalcError::ValidationFailed { report });
    }

    let primary = allocate_primary(def)?;
    let secondary = allocate_secondary(def, &primary)?;
    let sections = compute_unit_costs(def, &secondary)?;
    let products = cost_products(def, &sections)?;
    ensure_finite(&sections, &products)?;

    let (primary_fixed, primary_variable): (Vec<_>, Vec<_>) = primary
        .distributions
        .iter()
        .cloned()
        .partition(|d| d.behavior == CostBehavior::Fixed);

    let total_fixed: Amount = primary_fixed.iter().map(|d| d.amount).sum();
    let total_variable: Amount = primary_variable.iter().map(|d| d.amount).sum();

    let primary_totals = primary
        .subtotals
        .iter()
        .zip(primary.kinds.values())
        .map(|((name, subtotal), kind)| CenterTotal {
            name: name.clone(),
            kind: *kind,
            total_fixed: subtotal.fixed,
            total_variable: subtotal.variable,
            total: subtotal.total(),
        })
        .collect();

    let SecondaryAllocation { fixed, variable, .. } = secondary;

    tracing::debug!(
        total = %(total_fixed + total_variable),
        "allocation complete"
    );

    Ok(AllocationResult {
        charges: ChargesSummary {
            total_fixed,
            total_variable,
            total: total_fixed + total_variable,
            primary_fixed,
            primary_variable,
            secondary_fixed: fixed,
            secondary_variable: variable,
        },
        primary_totals,
        sections,
        products,
        warnings: report.warnings().cloned().collect(),
    })
}

/// Valid but astronomically large amounts can still overflow once summed.
fn ensure_finite(sections: &[SectionUnitCost], products: &[ProductUnitCost]) -> CalcResult<()> {
    for section in sections {
        let amounts = [section.total, section.unit_cost_total];
        if !amounts.iter().all(|a| a.is_finite()) {
            return Err(CalcError::internal(format!(
                "section \"{}\" overflowed (total {})",
                section.name,
                section.total.value()
            )));
        }
    }
    for product in products {
        if !product.unit_cost_total.is_finite() {
            return Err(CalcError::internal(format!(
                "product \"{}\" overflowed (unit cost {})",
                product.name,
                product.unit_cost_total.value()
            )));
        }
    }
    Ok(())
}
