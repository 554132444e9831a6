//! # Secondary Distribution
//!
//! Empties each auxiliary center into the primary centers:
//!
//! ```text
//! final[p] = primary_stage[p] + Σ_aux (aux.subtotal × key[aux][p] / 100)
//! ```
//!
//! computed separately for the fixed and the variable flow. The hierarchy is
//! single-pass: auxiliary centers only give to primary centers, never to each
//! other, so no system of equations is involved.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::primary::{CenterSubtotal, DistributionLine, PrimaryAllocation};
use crate::definition::{CostBehavior, ProjectDefinition};
use crate::errors::{CalcError, CalcResult};
use crate::units::Amount;

/// How one auxiliary center's flow was spread over the primary centers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryDistribution {
    #[serde(rename = "centre")]
    pub center: String,
    #[serde(rename = "montant")]
    pub amount: Amount,
    #[serde(rename = "repartition")]
    pub lines: Vec<DistributionLine>,
}

/// Output of the secondary stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryAllocation {
    /// Final totals of the primary centers, in declaration order
    pub totals: IndexMap<String, CenterSubtotal>,
    pub fixed: Vec<AuxiliaryDistribution>,
    pub variable: Vec<AuxiliaryDistribution>,
}

impl SecondaryAllocation {
    pub fn total_of(&self, center: &str) -> Option<CenterSubtotal> {
        self.totals.get(center).copied()
    }

    pub fn distributions(&self, behavior: CostBehavior) -> &[AuxiliaryDistribution] {
        match behavior {
            CostBehavior::Fixed => &self.fixed,
            CostBehavior::Variable => &self.variable,
        }
    }

    /// Sum over the primary centers for one channel.
    pub fn total(&self, behavior: CostBehavior) -> Amount {
        self.totals.values().map(|s| s.get(behavior)).sum()
    }
}

/// Run the secondary distribution on the output of the primary stage.
pub fn allocate_secondary(def: &ProjectDefinition, primary: &PrimaryAllocation) -> CalcResult<SecondaryAllocation> {
    let mut totals = IndexMap::new();
    for center in def.primary_centers() {
        let own = primary.subtotal(&center.name).ok_or_else(|| {
            CalcError::internal(format!("section \"{}\" missing from primary stage", center.name))
        })?;
        totals.insert(center.name.clone(), own);
    }

    let mut fixed = Vec::new();
    let mut variable = Vec::new();

    for aux in def.auxiliary_centers() {
        let key = def.secondary_key_for(&aux.name).ok_or_else(|| {
            CalcError::internal(format!("auxiliary section \"{}\" has no secondary key", aux.name))
        })?;
        let subtotal = primary.subtotal(&aux.name).unwrap_or_default();

        for behavior in CostBehavior::ALL {
            let amount = subtotal.get(behavior);
            let mut lines = Vec::with_capacity(totals.len());

            for (target, total) in totals.iter_mut() {
                let percentage = key.percentage_for(behavior, target);
                let share = percentage.of(amount);
                total.add(behavior, share);
                lines.push(DistributionLine {
                    center: target.clone(),
                    percentage,
                    amount: share,
                });
            }

            let distribution = AuxiliaryDistribution {
                center: aux.name.clone(),
                amount,
                lines,
            };
            match behavior {
                CostBehavior::Fixed => fixed.push(distribution),
                CostBehavior::Variable => variable.push(distribution),
            }
        }
    }

    tracing::debug!(
        auxiliaries = fixed.len(),
        primaries = totals.len(),
        "secondary distribution done"
    );

    Ok(SecondaryAllocation { totals, fixed, variable })
}
