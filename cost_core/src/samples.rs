//! Ready-made project definitions.
//!
//! [`tutorial`] is the classic three-section worked example; [`workshop`]
//! exercises split fixed/variable charges and two auxiliary sections. Both
//! validate without a single issue.

use crate::definition::{Center, CostBehavior, IndirectCharge, ProjectDefinition};

/// Two primary sections, one auxiliary section, fixed charges only.
///
/// Expected results: A = 48 €/h, B ≈ 73.33 €/h, X ≈ 8 466.67 €,
/// Y ≈ 14 533.33 €.
pub fn tutorial() -> ProjectDefinition {
    ProjectDefinition::new()
        .with_center(Center::primary("Section A", "Heure machine", 250.0))
        .with_center(Center::primary("Section B", "Heure de travail", 150.0))
        .with_center(Center::auxiliary("Section C"))
        .with_charge(
            IndirectCharge::new("Charges propres A", 10_000.0, CostBehavior::Fixed),
            &[("Section A", 100.0), ("Section B", 0.0), ("Section C", 0.0)],
        )
        .with_charge(
            IndirectCharge::new("Charges propres B", 8_000.0, CostBehavior::Fixed),
            &[("Section A", 0.0), ("Section B", 100.0), ("Section C", 0.0)],
        )
        .with_charge(
            IndirectCharge::new("Charges propres C", 5_000.0, CostBehavior::Fixed),
            &[("Section A", 0.0), ("Section B", 0.0), ("Section C", 100.0)],
        )
        .with_secondary_key("Section C", &[("Section A", 40.0), ("Section B", 60.0)])
        .with_product("Produit X", &[("Section A", 100.0), ("Section B", 50.0)])
        .with_product("Produit Y", &[("Section A", 150.0), ("Section B", 100.0)])
}

/// Two workshops fed by a store and an administration section.
pub fn workshop() -> ProjectDefinition {
    const CENTERS: [&str; 4] = ["Atelier 1", "Atelier 2", "Magasin", "Administration"];

    let charges: [(&str, f64, CostBehavior, [f64; 4]); 6] = [
        ("Loyer", 100_000.0, CostBehavior::Fixed, [40.0, 30.0, 20.0, 10.0]),
        ("Entretien", 20_000.0, CostBehavior::Fixed, [50.0, 30.0, 10.0, 10.0]),
        ("Salaires indirects", 80_000.0, CostBehavior::Fixed, [30.0, 30.0, 20.0, 20.0]),
        ("Amortissements", 40_000.0, CostBehavior::Fixed, [50.0, 40.0, 5.0, 5.0]),
        ("Électricité", 50_000.0, CostBehavior::Variable, [50.0, 30.0, 10.0, 10.0]),
        ("Eau et lubrifiants", 30_000.0, CostBehavior::Variable, [40.0, 40.0, 10.0, 10.0]),
    ];

    let mut def = ProjectDefinition::new()
        .with_center(Center::primary("Atelier 1", "Heure machine", 2_500.0))
        .with_center(Center::primary("Atelier 2", "Heure de travail", 2_000.0))
        .with_center(Center::auxiliary("Magasin"))
        .with_center(Center::auxiliary("Administration"));

    for (nature, amount, behavior, percentages) in charges {
        let shares: Vec<(&str, f64)> = CENTERS.iter().copied().zip(percentages).collect();
        def = def.with_charge(IndirectCharge::new(nature, amount, behavior), &shares);
    }

    def.with_secondary_key("Magasin", &[("Atelier 1", 70.0), ("Atelier 2", 30.0)])
        .with_secondary_key("Administration", &[("Atelier 1", 50.0), ("Atelier 2", 50.0)])
        .with_product("Produit X", &[("Atelier 1", 1.0), ("Atelier 2", 2.0)])
        .with_product("Produit Y", &[("Atelier 1", 2.0), ("Atelier 2", 1.0)])
}
