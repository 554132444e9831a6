//! # Project Definition Model
//!
//! The static input of an allocation run: analysis centers (sections),
//! indirect charges with their primary keys, secondary keys for the
//! auxiliary centers, products and their consumption of operational units.
//!
//! ## Structure
//!
//! ```text
//! ProjectDefinition
//! ├── sections: Vec<Center>                    (primary + auxiliary)
//! ├── charges_indirectes: Vec<IndirectCharge>  (fixed / variable)
//! ├── repartition_primaire: Vec<PrimaryKey>    (charge -> every center, %)
//! ├── repartition_secondaire: Vec<SecondaryKey>(auxiliary -> primaries, %)
//! ├── produits: Vec<Product>
//! └── consommation_produits: Vec<Consumption>  (product -> primary, qty)
//! ```
//!
//! Keys are lists of `(center name, percentage)` pairs. Nothing refers to a
//! center by position, so reordering sections never shifts a percentage.
//!
//! ## Wire names
//!
//! The JSON schema uses the French field names of the surrounding
//! application. Older payload variants are accepted through serde aliases
//! (`produit` for `produit_nom`, `consommations` for `consommation`,
//! `centre` for `section_secondaire`, `Primaire`/`Secondaire`...). Output
//! always uses the canonical names.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::definition::{Center, CostBehavior, IndirectCharge, ProjectDefinition};
//!
//! let def = ProjectDefinition::new()
//!     .with_center(Center::primary("Atelier", "Heure machine", 500.0))
//!     .with_center(Center::auxiliary("Entretien"))
//!     .with_charge(
//!         IndirectCharge::new("Loyer", 10_000.0, CostBehavior::Fixed),
//!         &[("Atelier", 80.0), ("Entretien", 20.0)],
//!     )
//!     .with_secondary_key("Entretien", &[("Atelier", 100.0)])
//!     .with_product("Table", &[("Atelier", 2.0)]);
//!
//! assert_eq!(def.primary_centers().count(), 1);
//! assert_eq!(def.effective_quantity("Atelier"), Some(500.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::units::{Amount, Percent};

// ============================================================================
// Centers
// ============================================================================

/// Role of an analysis center in the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CenterKind {
    /// Serves products directly; has an operational unit and a unit cost
    #[serde(
        rename = "primaire",
        alias = "Primaire",
        alias = "primary",
        alias = "Primary",
        alias = "principale"
    )]
    Primary,
    /// Serves other centers; emptied into primary centers by the secondary key
    #[serde(
        rename = "secondaire",
        alias = "Secondaire",
        alias = "auxiliary",
        alias = "Auxiliary",
        alias = "auxiliaire",
        alias = "Auxiliaire"
    )]
    Auxiliary,
}

impl CenterKind {
    pub fn label(&self) -> &'static str {
        match self {
            CenterKind::Primary => "primaire",
            CenterKind::Auxiliary => "secondaire",
        }
    }
}

/// An analysis center (section).
///
/// ## JSON Example
///
/// ```json
/// { "nom": "Atelier 1", "type": "primaire", "unite_oeuvre": "Heure machine", "quantite": 2500 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    /// Unique name within the project
    #[serde(rename = "nom", alias = "name")]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: CenterKind,

    /// Operational unit label (e.g. "Heure machine")
    #[serde(rename = "unite_oeuvre", alias = "unite", default, skip_serializing_if = "Option::is_none")]
    pub operational_unit: Option<String>,

    /// Number of operational units supplied over the period.
    ///
    /// Required for primary centers; ignored for auxiliary ones.
    #[serde(rename = "quantite", alias = "quantity", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
}

impl Center {
    /// Create a primary center with its operational unit and activity level.
    pub fn primary(name: impl Into<String>, unit: impl Into<String>, quantity: f64) -> Self {
        Center {
            name: name.into(),
            kind: CenterKind::Primary,
            operational_unit: Some(unit.into()),
            quantity: Some(quantity),
        }
    }

    /// Create an auxiliary center.
    pub fn auxiliary(name: impl Into<String>) -> Self {
        Center {
            name: name.into(),
            kind: CenterKind::Auxiliary,
            operational_unit: None,
            quantity: None,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.kind == CenterKind::Primary
    }

    pub fn is_auxiliary(&self) -> bool {
        self.kind == CenterKind::Auxiliary
    }
}

// ============================================================================
// Indirect charges
// ============================================================================

/// Whether a charge varies with activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostBehavior {
    #[serde(rename = "Fix", alias = "Fixe", alias = "Fixed", alias = "fixe", alias = "fix")]
    Fixed,
    #[serde(rename = "Variable", alias = "variable")]
    Variable,
}

impl CostBehavior {
    pub const ALL: [CostBehavior; 2] = [CostBehavior::Fixed, CostBehavior::Variable];

    pub fn label(&self) -> &'static str {
        match self {
            CostBehavior::Fixed => "fixe",
            CostBehavior::Variable => "variable",
        }
    }
}

/// An indirect charge to distribute.
///
/// ## JSON Example
///
/// ```json
/// { "nature": "Loyer", "montant": 100000, "type": "Fix" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndirectCharge {
    /// Nature of the charge, unique within the project (e.g. "Loyer")
    pub nature: String,

    #[serde(rename = "montant", alias = "amount")]
    pub amount: Amount,

    #[serde(rename = "type")]
    pub behavior: CostBehavior,
}

impl IndirectCharge {
    pub fn new(nature: impl Into<String>, amount: f64, behavior: CostBehavior) -> Self {
        IndirectCharge {
            nature: nature.into(),
            amount: Amount(amount),
            behavior,
        }
    }
}

// ============================================================================
// Allocation keys
// ============================================================================

/// One line of a primary key: the share of a charge that goes to a center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyShare {
    #[serde(rename = "section_nom", alias = "section", alias = "center")]
    pub center: String,

    #[serde(rename = "pourcentage", alias = "percentage")]
    pub percentage: Percent,
}

/// Primary allocation key of one indirect charge.
///
/// Covers every center, primary and auxiliary alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKey {
    /// Nature of the charge this key distributes
    #[serde(rename = "charge_nature", alias = "nature")]
    pub charge: String,

    #[serde(rename = "repartition")]
    pub shares: Vec<KeyShare>,
}

impl PrimaryKey {
    pub fn new(charge: impl Into<String>, shares: &[(&str, f64)]) -> Self {
        PrimaryKey {
            charge: charge.into(),
            shares: shares
                .iter()
                .map(|(center, pct)| KeyShare {
                    center: center.to_string(),
                    percentage: Percent(*pct),
                })
                .collect(),
        }
    }

    /// Percentage given to `center`; an omitted center gets 0 %.
    pub fn percentage_for(&self, center: &str) -> Percent {
        self.shares
            .iter()
            .find(|s| s.center == center)
            .map(|s| s.percentage)
            .unwrap_or_default()
    }
}

/// One line of a secondary key: the share of an auxiliary center that goes
/// to a primary center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryShare {
    #[serde(rename = "section_primaire", alias = "section", alias = "section_nom")]
    pub center: String,

    #[serde(rename = "pourcentage", alias = "percentage")]
    pub percentage: Percent,
}

/// Secondary allocation key of one auxiliary center.
///
/// The same percentages apply to the fixed and the variable flow unless
/// `repartition_variable` gives the variable flow its own mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryKey {
    #[serde(rename = "section_secondaire", alias = "centre", alias = "section")]
    pub auxiliary: String,

    #[serde(rename = "repartition")]
    pub shares: Vec<SecondaryShare>,

    #[serde(rename = "repartition_variable", default, skip_serializing_if = "Option::is_none")]
    pub variable_shares: Option<Vec<SecondaryShare>>,
}

impl SecondaryKey {
    pub fn new(auxiliary: impl Into<String>, shares: &[(&str, f64)]) -> Self {
        SecondaryKey {
            auxiliary: auxiliary.into(),
            shares: to_secondary_shares(shares),
            variable_shares: None,
        }
    }

    /// Give the variable flow its own percentages.
    pub fn with_variable_shares(mut self, shares: &[(&str, f64)]) -> Self {
        self.variable_shares = Some(to_secondary_shares(shares));
        self
    }

    /// Shares that apply to a cost-behavior channel.
    pub fn shares_for(&self, behavior: CostBehavior) -> &[SecondaryShare] {
        match (behavior, &self.variable_shares) {
            (CostBehavior::Variable, Some(variable)) => variable,
            _ => &self.shares,
        }
    }

    /// Whether the two channels use different percentages.
    pub fn has_split_channels(&self) -> bool {
        self.variable_shares.is_some()
    }

    /// Percentage of the `behavior` flow given to `center` (0 % if omitted).
    pub fn percentage_for(&self, behavior: CostBehavior, center: &str) -> Percent {
        self.shares_for(behavior)
            .iter()
            .find(|s| s.center == center)
            .map(|s| s.percentage)
            .unwrap_or_default()
    }
}

fn to_secondary_shares(shares: &[(&str, f64)]) -> Vec<SecondaryShare> {
    shares
        .iter()
        .map(|(center, pct)| SecondaryShare {
            center: center.to_string(),
            percentage: Percent(*pct),
        })
        .collect()
}

// ============================================================================
// Products and consumption
// ============================================================================

/// A product to cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "nom", alias = "name")]
    pub name: String,

    /// Unit the product is counted in (defaults to "Unité" in results)
    #[serde(rename = "unite", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Product {
            name: name.into(),
            unit: None,
        }
    }
}

/// Operational units of one primary center consumed per unit of product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionLine {
    #[serde(rename = "section_nom", alias = "section", alias = "nom")]
    pub center: String,

    #[serde(rename = "quantite", alias = "quantity")]
    pub quantity: f64,
}

/// Consumption map of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    #[serde(rename = "produit_nom", alias = "produit")]
    pub product: String,

    #[serde(rename = "consommation", alias = "consommations", default)]
    pub lines: Vec<ConsumptionLine>,
}

/// Legacy operational-unit record, kept apart from the section itself in
/// older payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfWork {
    pub section: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unite: Option<String>,

    pub quantite: f64,
}

// ============================================================================
// Root aggregate
// ============================================================================

/// Everything an allocation run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDefinition {
    #[serde(rename = "sections", default)]
    pub centers: Vec<Center>,

    #[serde(rename = "charges_indirectes", default)]
    pub charges: Vec<IndirectCharge>,

    #[serde(rename = "repartition_primaire", default)]
    pub primary_keys: Vec<PrimaryKey>,

    #[serde(rename = "repartition_secondaire", default)]
    pub secondary_keys: Vec<SecondaryKey>,

    #[serde(rename = "produits", default)]
    pub products: Vec<Product>,

    #[serde(rename = "consommation_produits", default)]
    pub consumptions: Vec<Consumption>,

    /// Quantities supplied outside the sections (older payloads)
    #[serde(rename = "unites_oeuvre", default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_units: Vec<UnitOfWork>,
}

impl ProjectDefinition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: Center) -> Self {
        self.centers.push(center);
        self
    }

    /// Add a charge together with its primary key.
    pub fn with_charge(mut self, charge: IndirectCharge, shares: &[(&str, f64)]) -> Self {
        self.primary_keys.push(PrimaryKey::new(charge.nature.clone(), shares));
        self.charges.push(charge);
        self
    }

    pub fn with_secondary_key(mut self, auxiliary: &str, shares: &[(&str, f64)]) -> Self {
        self.secondary_keys.push(SecondaryKey::new(auxiliary, shares));
        self
    }

    /// Add a product together with its consumption map.
    pub fn with_product(mut self, name: &str, consumption: &[(&str, f64)]) -> Self {
        self.products.push(Product::new(name));
        self.consumptions.push(Consumption {
            product: name.to_string(),
            lines: consumption
                .iter()
                .map(|(center, qty)| ConsumptionLine {
                    center: center.to_string(),
                    quantity: *qty,
                })
                .collect(),
        });
        self
    }

    pub fn center(&self, name: &str) -> Option<&Center> {
        self.centers.iter().find(|c| c.name == name)
    }

    pub fn primary_centers(&self) -> impl Iterator<Item = &Center> {
        self.centers.iter().filter(|c| c.is_primary())
    }

    pub fn auxiliary_centers(&self) -> impl Iterator<Item = &Center> {
        self.centers.iter().filter(|c| c.is_auxiliary())
    }

    pub fn charge(&self, nature: &str) -> Option<&IndirectCharge> {
        self.charges.iter().find(|c| c.nature == nature)
    }

    pub fn primary_key_for(&self, nature: &str) -> Option<&PrimaryKey> {
        self.primary_keys.iter().find(|k| k.charge == nature)
    }

    pub fn secondary_key_for(&self, auxiliary: &str) -> Option<&SecondaryKey> {
        self.secondary_keys.iter().find(|k| k.auxiliary == auxiliary)
    }

    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn consumption_for(&self, product: &str) -> Option<&Consumption> {
        self.consumptions.iter().find(|c| c.product == product)
    }

    /// Operational-unit quantity of a center.
    ///
    /// The section's own `quantite` wins; otherwise a legacy `unites_oeuvre`
    /// entry for the same section is used.
    pub fn effective_quantity(&self, center: &str) -> Option<f64> {
        self.center(center)
            .and_then(|c| c.quantity)
            .or_else(|| self.legacy_unit(center).map(|u| u.quantite))
    }

    /// Operational-unit label of a center, with the same fallback as
    /// [`effective_quantity`](Self::effective_quantity).
    pub fn effective_unit(&self, center: &str) -> Option<&str> {
        self.center(center)
            .and_then(|c| c.operational_unit.as_deref())
            .or_else(|| self.legacy_unit(center).and_then(|u| u.unite.as_deref()))
    }

    fn legacy_unit(&self, center: &str) -> Option<&UnitOfWork> {
        self.legacy_units.iter().find(|u| u.section == center)
    }
}
