//! # Product Costing
//!
//! Charges each product with the unit costs of the primary sections it
//! consumes: `Σ consumption[section] × section.unit_cost`, for the fixed and
//! the variable part.

use serde::{Deserialize, Serialize};

use super::unit_cost::SectionUnitCost;
use crate::definition::ProjectDefinition;
use crate::errors::{CalcError, CalcResult};
use crate::units::Amount;

/// Unit label used when a product does not name one.
pub const DEFAULT_PRODUCT_UNIT: &str = "Unité";

/// Cost contributed by one consumption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionCost {
    /// Primary section consumed
    #[serde(rename = "nom")]
    pub center: String,
    #[serde(rename = "quantite")]
    pub quantity: f64,
    #[serde(rename = "cout_fixe")]
    pub cost_fixed: Amount,
    #[serde(rename = "cout_variable")]
    pub cost_variable: Amount,
    #[serde(rename = "cout_total")]
    pub cost_total: Amount,
}

/// Indirect unit cost of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUnitCost {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "unite")]
    pub unit: String,
    #[serde(rename = "cout_unitaire_fixe")]
    pub unit_cost_fixed: Amount,
    #[serde(rename = "cout_unitaire_variable")]
    pub unit_cost_variable: Amount,
    #[serde(rename = "cout_unitaire_total")]
    pub unit_cost_total: Amount,
    #[serde(rename = "consommation")]
    pub consumption: Vec<ConsumptionCost>,
}

/// Cost every declared product. A product without a consumption map costs 0.
pub fn cost_products(def: &ProjectDefinition, sections: &[SectionUnitCost]) -> CalcResult<Vec<ProductUnitCost>> {
    let mut products = Vec::with_capacity(def.products.len());

    for product in &def.products {
        let lines = def
            .consumption_for(&product.name)
            .map(|c| c.lines.as_slice())
            .unwrap_or_default();

        let mut consumption = Vec::with_capacity(lines.len());
        for line in lines {
            let section = sections.iter().find(|s| s.name == line.center).ok_or_else(|| {
                CalcError::internal(format!(
                    "product \"{}\" consumes unknown primary section \"{}\"",
                    product.name, line.center
                ))
            })?;
            let cost_fixed = section.unit_cost_fixed * line.quantity;
            let cost_variable = section.unit_cost_variable * line.quantity;
            consumption.push(ConsumptionCost {
                center: line.center.clone(),
                quantity: line.quantity,
                cost_fixed,
                cost_variable,
                cost_total: cost_fixed + cost_variable,
            });
        }

        let unit_cost_fixed: Amount = consumption.iter().map(|c| c.cost_fixed).sum();
        let unit_cost_variable: Amount = consumption.iter().map(|c| c.cost_variable).sum();

        products.push(ProductUnitCost {
            name: product.name.clone(),
            unit: product
                .unit
                .clone()
                .unwrap_or_else(|| DEFAULT_PRODUCT_UNIT.to_string()),
            unit_cost_fixed,
            unit_cost_variable,
            unit_cost_total: unit_cost_fixed + unit_cost_variable,
            consumption,
        });
    }

    tracing::debug!(products = products.len(), "products costed");
    Ok(products)
}
