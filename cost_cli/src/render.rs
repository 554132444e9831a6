//! Plain-text rendering of results and validation reports.

use cost_core::validation::{Severity, ValidationIssue, ValidationReport};
use cost_core::{AllocationResult, AllocationSettings, Amount};

const RULE: &str = "═══════════════════════════════════════════════════════════════════";

fn money(amount: Amount, settings: &AllocationSettings) -> String {
    format!("{:.*}", settings.display_decimals(), amount.value())
}

fn banner(title: &str) -> [String; 3] {
    [RULE.to_string(), format!("  {}", title), RULE.to_string()]
}

fn severity_tag(issue: &ValidationIssue) -> &'static str {
    match issue.severity {
        Severity::Error => "[ERROR]",
        Severity::Warning => "[WARN]",
    }
}

fn issue_line(issue: &ValidationIssue) -> String {
    format!("  {} {}: {}", severity_tag(issue), issue.entity, issue.message())
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Full allocation result as tables.
pub fn render_result(title: &str, result: &AllocationResult, settings: &AllocationSettings) -> String {
    let cur = &settings.currency;
    let charges = &result.charges;
    let mut lines = Vec::new();

    lines.extend(banner(title));
    lines.push(String::new());
    lines.push("Indirect charges:".to_string());
    lines.push(format!("  Fixed:    {:>14} {}", money(charges.total_fixed, settings), cur));
    lines.push(format!("  Variable: {:>14} {}", money(charges.total_variable, settings), cur));
    lines.push(format!("  Total:    {:>14} {}", money(charges.total, settings), cur));

    lines.push(String::new());
    lines.push("After primary distribution:".to_string());
    lines.push(format!(
        "  {:<22} {:<11} {:>14} {:>14} {:>14}",
        "Section", "Type", "Fixed", "Variable", "Total"
    ));
    for center in &result.primary_totals {
        lines.push(format!(
            "  {:<22} {:<11} {:>14} {:>14} {:>14}",
            center.name,
            center.kind.label(),
            money(center.total_fixed, settings),
            money(center.total_variable, settings),
            money(center.total, settings)
        ));
    }

    if !charges.secondary_fixed.is_empty() {
        lines.push(String::new());
        lines.push("Secondary distribution:".to_string());
        for (fixed, variable) in charges.secondary_fixed.iter().zip(&charges.secondary_variable) {
            lines.push(format!(
                "  {} ({} {} fixed, {} {} variable)",
                fixed.center,
                money(fixed.amount, settings),
                cur,
                money(variable.amount, settings),
                cur
            ));
            for (f, v) in fixed.lines.iter().zip(&variable.lines) {
                lines.push(format!(
                    "    -> {:<19} {:>8} {:>14} {:>8} {:>14}",
                    f.center,
                    f.percentage.to_string(),
                    money(f.amount, settings),
                    v.percentage.to_string(),
                    money(v.amount, settings)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("Section unit costs:".to_string());
    lines.push(format!(
        "  {:<22} {:>22} {:>12} {:>12} {:>12}",
        "Section", "Activity", "Fixed", "Variable", "Total"
    ));
    for section in &result.sections {
        let activity = match &section.unit {
            Some(unit) => format!("{} {}", section.quantity, unit),
            None => section.quantity.to_string(),
        };
        lines.push(format!(
            "  {:<22} {:>22} {:>12} {:>12} {:>12}",
            section.name,
            activity,
            money(section.unit_cost_fixed, settings),
            money(section.unit_cost_variable, settings),
            money(section.unit_cost_total, settings)
        ));
    }

    lines.push(String::new());
    lines.push("Product unit costs:".to_string());
    lines.push(format!(
        "  {:<22} {:>22} {:>12} {:>12} {:>12}",
        "Product", "Unit", "Fixed", "Variable", "Total"
    ));
    for product in &result.products {
        lines.push(format!(
            "  {:<22} {:>22} {:>12} {:>12} {:>12}",
            product.name,
            product.unit,
            money(product.unit_cost_fixed, settings),
            money(product.unit_cost_variable, settings),
            money(product.unit_cost_total, settings)
        ));
    }

    if !result.warnings.is_empty() {
        lines.push(String::new());
        lines.push("Warnings:".to_string());
        lines.extend(result.warnings.iter().map(issue_line));
    }

    lines.push(String::new());
    lines.extend(banner(&format!(
        "RESULT: {} section(s), {} product(s) costed",
        result.sections.len(),
        result.products.len()
    )));
    finish(lines)
}

/// Validation findings, one per line, with a verdict.
pub fn render_report(title: &str, report: &ValidationReport) -> String {
    let mut lines = banner(title).to_vec();

    if report.issues.is_empty() {
        lines.push("  No issues found.".to_string());
    }
    lines.extend(report.issues.iter().map(issue_line));

    let verdict = if report.is_valid() { "VALID" } else { "INVALID" };
    lines.extend(banner(&format!(
        "RESULT: {} ({} error(s), {} warning(s))",
        verdict,
        report.error_count(),
        report.warning_count()
    )));
    finish(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cost_core::{calculate, samples, validate};

    #[test]
    fn test_render_workshop_result() {
        let settings = AllocationSettings::default();
        let result = calculate(&samples::workshop(), &settings).unwrap();
        let text = render_result("WORKSHOP", &result, &settings);

        assert!(text.contains("WORKSHOP"));
        assert!(text.contains("320000.00 €"));
        assert!(text.contains("Magasin"));
        assert!(text.contains("2500 Heure machine"));
        assert!(text.contains("209.84"));
        assert!(text.contains("RESULT: 2 section(s), 2 product(s) costed"));
        assert!(!text.contains("Warnings:"));
    }

    #[test]
    fn test_decimals_setting_is_honoured() {
        let settings = AllocationSettings {
            decimals: 0,
            ..AllocationSettings::default()
        };
        let result = calculate(&samples::tutorial(), &settings).unwrap();
        let text = render_result("T", &result, &settings);
        assert!(text.contains("8467"));
        assert!(!text.contains("8466.67"));
    }

    #[test]
    fn test_huge_decimals_setting_does_not_panic() {
        let settings = AllocationSettings {
            decimals: 70_000,
            ..AllocationSettings::default()
        };
        let result = calculate(&samples::tutorial(), &AllocationSettings::default()).unwrap();
        let text = render_result("T", &result, &settings);
        assert!(text.contains("48.0000000000"));
    }

    #[test]
    fn test_render_invalid_report() {
        let mut def = samples::tutorial();
        def.primary_keys[0].shares[0].percentage = cost_core::Percent(99.0);
        let report = validate(&def, &AllocationSettings::default());
        let text = render_report("CHECK", &report);

        assert!(text.contains("[ERROR] primary key of charge \"Charges propres A\""));
        assert!(text.contains("RESULT: INVALID (1 error(s), 0 warning(s))"));
    }
}
