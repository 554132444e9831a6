//! # Primary Distribution
//!
//! Spreads every indirect charge over all centers, primary and auxiliary,
//! according to the charge's primary key:
//!
//! ```text
//! subtotal[c].fixed    = Σ fixed charges     (amount × key[charge][c] / 100)
//! subtotal[c].variable = Σ variable charges  (amount × key[charge][c] / 100)
//! ```
//!
//! A center the key omits receives 0 %. A center no charge reaches ends the
//! stage at 0, which is valid.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definition::{CenterKind, CostBehavior, ProjectDefinition};
use crate::errors::{CalcError, CalcResult};
use crate::units::{Amount, Percent};

/// Fixed and variable cost accumulated by a center.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterSubtotal {
    pub fixed: Amount,
    pub variable: Amount,
}

impl CenterSubtotal {
    pub fn total(&self) -> Amount {
        self.fixed + self.variable
    }

    pub fn get(&self, behavior: CostBehavior) -> Amount {
        match behavior {
            CostBehavior::Fixed => self.fixed,
            CostBehavior::Variable => self.variable,
        }
    }

    pub fn add(&mut self, behavior: CostBehavior, amount: Amount) {
        match behavior {
            CostBehavior::Fixed => self.fixed += amount,
            CostBehavior::Variable => self.variable += amount,
        }
    }
}

/// The part of a distributed amount one center receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionLine {
    #[serde(rename = "section")]
    pub center: String,
    #[serde(rename = "pourcentage")]
    pub percentage: Percent,
    #[serde(rename = "montant")]
    pub amount: Amount,
}

/// How one charge was spread over the centers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeDistribution {
    pub nature: String,
    #[serde(rename = "type")]
    pub behavior: CostBehavior,
    #[serde(rename = "montant")]
    pub amount: Amount,
    #[serde(rename = "repartition")]
    pub lines: Vec<DistributionLine>,
}

/// Output of the primary stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryAllocation {
    /// Per-center subtotals, in declaration order
    pub subtotals: IndexMap<String, CenterSubtotal>,
    /// Kind of each center, same order as `subtotals`
    pub kinds: IndexMap<String, CenterKind>,
    /// Per-charge detail, in declaration order
    pub distributions: Vec<ChargeDistribution>,
}

impl PrimaryAllocation {
    pub fn subtotal(&self, center: &str) -> Option<CenterSubtotal> {
        self.subtotals.get(center).copied()
    }

    /// Sum over every center for one channel.
    pub fn total(&self, behavior: CostBehavior) -> Amount {
        self.subtotals.values().map(|s| s.get(behavior)).sum()
    }
}

/// Run the primary distribution.
///
/// Expects a validated definition: a charge without a key is reported as an
/// internal error, not a validation issue.
pub fn allocate_primary(def: &ProjectDefinition) -> CalcResult<PrimaryAllocation> {
    let mut subtotals: IndexMap<String, CenterSubtotal> = def
        .centers
        .iter()
        .map(|c| (c.name.clone(), CenterSubtotal::default()))
        .collect();
    let kinds = def.centers.iter().map(|c| (c.name.clone(), c.kind)).collect();

    let mut distributions = Vec::with_capacity(def.charges.len());
    for charge in &def.charges {
        let key = def.primary_key_for(&charge.nature).ok_or_else(|| {
            CalcError::internal(format!("charge \"{}\" has no primary key", charge.nature))
        })?;

        let mut lines = Vec::with_capacity(def.centers.len());
        for center in &def.centers {
            let percentage = key.percentage_for(&center.name);
            let amount = percentage.of(charge.amount);
            if let Some(subtotal) = subtotals.get_mut(&center.name) {
                subtotal.add(charge.behavior, amount);
            }
            lines.push(DistributionLine {
                center: center.name.clone(),
                percentage,
                amount,
            });
        }

        distributions.push(ChargeDistribution {
            nature: charge.nature.clone(),
            behavior: charge.behavior,
            amount: charge.amount,
            lines,
        });
    }

    tracing::debug!(
        charges = distributions.len(),
        centers = subtotals.len(),
        "primary distribution done"
    );

    Ok(PrimaryAllocation {
        subtotals,
        kinds,
        distributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Center, IndirectCharge};
    use crate::samples;

    #[test]
    fn test_workshop_primary_subtotals() {
        let primary = allocate_primary(&samples::workshop()).unwrap();

        let a1 = primary.subtotal("Atelier 1").unwrap();
        assert!(a1.fixed.approx_eq(Amount(94_000.0), 1e-6));
        assert!(a1.variable.approx_eq(Amount(37_000.0), 1e-6));

        let magasin = primary.subtotal("Magasin").unwrap();
        assert!(magasin.fixed.approx_eq(Amount(40_000.0), 1e-6));
        assert!(magasin.variable.approx_eq(Amount(8_000.0), 1e-6));

        let admin = primary.subtotal("Administration").unwrap();
        assert!(admin.total().approx_eq(Amount(38_000.0), 1e-6));
    }

    #[test]
    fn test_each_charge_is_conserved() {
        let primary = allocate_primary(&samples::workshop()).unwrap();
        for dist in &primary.distributions {
            let spread: Amount = dist.lines.iter().map(|l| l.amount).sum();
            assert!(spread.approx_eq(dist.amount, 1e-6), "{} not conserved", dist.nature);
        }
        assert!(primary.total(CostBehavior::Fixed).approx_eq(Amount(240_000.0), 1e-6));
        assert!(primary.total(CostBehavior::Variable).approx_eq(Amount(80_000.0), 1e-6));
    }

    #[test]
    fn test_unreached_center_has_zero_subtotal() {
        let def = ProjectDefinition::new()
            .with_center(Center::primary("A", "h", 10.0))
            .with_center(Center::auxiliary("Idle"))
            .with_charge(IndirectCharge::new("Loyer", 500.0, CostBehavior::Fixed), &[("A", 100.0)]);

        let primary = allocate_primary(&def).unwrap();
        assert_eq!(primary.subtotal("Idle"), Some(CenterSubtotal::default()));

        let line = &primary.distributions[0].lines[1];
        assert_eq!(line.center, "Idle");
        assert_eq!(line.percentage, Percent(0.0));
    }

    #[test]
    fn test_charge_without_key_is_internal_error() {
        let mut def = ProjectDefinition::new().with_center(Center::primary("A", "h", 10.0));
        def.charges.push(IndirectCharge::new("Orphan", 1.0, CostBehavior::Fixed));
        let err = allocate_primary(&def).unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
