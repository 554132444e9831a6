//! # Unit Cost of the Primary Sections
//!
//! `unit_cost = final total / operational-unit quantity`, for the fixed and
//! the variable part; the total unit cost is their sum.

use serde::{Deserialize, Serialize};

use super::primary::CenterSubtotal;
use super::secondary::SecondaryAllocation;
use crate::definition::ProjectDefinition;
use crate::errors::{CalcError, CalcResult};
use crate::units::Amount;

/// Final cost and unit cost of one primary section.
///
/// ## JSON Example
///
/// ```json
/// {
///   "nom": "Atelier 1",
///   "quantite": 2500.0,
///   "total_fixe": 137000.0,
///   "total_variable": 46600.0,
///   "total": 183600.0,
///   "cout_unitaire_fixe": 54.8,
///   "cout_unitaire_variable": 18.64,
///   "cout_unitaire_total": 73.44,
///   "unite": "Heure machine"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionUnitCost {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "quantite")]
    pub quantity: f64,
    #[serde(rename = "total_fixe")]
    pub total_fixed: Amount,
    pub total_variable: Amount,
    pub total: Amount,
    #[serde(rename = "cout_unitaire_fixe")]
    pub unit_cost_fixed: Amount,
    #[serde(rename = "cout_unitaire_variable")]
    pub unit_cost_variable: Amount,
    #[serde(rename = "cout_unitaire_total")]
    pub unit_cost_total: Amount,
    #[serde(rename = "unite", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Per-unit fixed and variable cost of a total spread over `quantity` units.
///
/// Refuses a non-positive or non-finite quantity instead of producing
/// `inf`/`NaN`; validation rejects such definitions first.
pub fn unit_rates(total: CenterSubtotal, quantity: f64) -> CalcResult<(Amount, Amount)> {
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(CalcError::internal(format!(
            "operational-unit quantity must be positive, got {}",
            quantity
        )));
    }
    Ok((total.fixed / quantity, total.variable / quantity))
}

/// Compute the unit cost of every primary section.
pub fn compute_unit_costs(def: &ProjectDefinition, secondary: &SecondaryAllocation) -> CalcResult<Vec<SectionUnitCost>> {
    let mut sections = Vec::with_capacity(secondary.totals.len());

    for (name, total) in &secondary.totals {
        let quantity = def
            .effective_quantity(name)
            .ok_or_else(|| CalcError::internal(format!("section \"{}\" has no quantity", name)))?;
        let (unit_cost_fixed, unit_cost_variable) = unit_rates(*total, quantity).map_err(|_| {
            CalcError::internal(format!("section \"{}\" has quantity {}", name, quantity))
        })?;

        sections.push(SectionUnitCost {
            name: name.clone(),
            quantity,
            total_fixed: total.fixed,
            total_variable: total.variable,
            total: total.total(),
            unit_cost_fixed,
            unit_cost_variable,
            unit_cost_total: unit_cost_fixed + unit_cost_variable,
            unit: def.effective_unit(name).map(str::to_string),
        });
    }

    tracing::debug!(sections = sections.len(), "unit costs computed");
    Ok(sections)
}
