//! Plan display

use super::planner::{Plan, PlannedChange};
use colored::{ColoredString, Colorize};
use reconcile::{PlannedAction, ResourceDiff, ResourceKind};
use std::collections::BTreeMap;

fn kind_title(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::DnsRecord => "DNS records",
        ResourceKind::Nameservers => "Nameservers",
        ResourceKind::AwsAcmCertificate => "ACM certificates",
        ResourceKind::MonitoringWriteToken => "Monitoring write tokens",
        ResourceKind::TerraformOutput => "Terraform outputs",
        ResourceKind::Deployment => "Deployment",
    }
}

fn colored_symbol(action: PlannedAction) -> ColoredString {
    let symbol = action.symbol();
    match action {
        PlannedAction::Create => symbol.green(),
        PlannedAction::Update => symbol.yellow(),
        PlannedAction::Replace => symbol.magenta(),
        PlannedAction::Delete => symbol.red(),
        PlannedAction::NoChange => symbol.dimmed(),
    }
}

/// Field-level lines for one diff, sensitive values redacted
pub fn change_lines(diff: &ResourceDiff) -> Vec<String> {
    diff.changes.iter().map(ToString::to_string).collect()
}

/// Display a plan grouped by kind
pub fn display_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes. Remote resources match the manifest.", "✓".green());
        return;
    }

    let mut by_kind: BTreeMap<ResourceKind, Vec<&PlannedChange>> = BTreeMap::new();
    for change in plan.pending() {
        by_kind.entry(change.address.kind).or_default().push(change);
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for (kind, changes) in &by_kind {
        println!("│ {}", kind_title(*kind).bold());

        for change in changes {
            let action = change.action();
            println!(
                "│   {:<3} {:<36} {}",
                colored_symbol(action),
                change.address.to_string(),
                format!("({action})").dimmed()
            );
            for line in change_lines(&change.diff) {
                println!("│         {}", line.dimmed());
            }
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!("│ Plan: {}", plan.summary().to_string().bold());
    println!("└─────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{AttributeRecord, FieldChange, REDACTED, Value};

    #[test]
    fn test_change_lines_show_set_values() {
        let policy = ResourceKind::DnsRecord.policy();
        let prior = AttributeRecord::new()
            .with("id", "dns-1")
            .with("values", Value::set(["a"]));
        let desired = AttributeRecord::new().with("values", Value::set(["a", "b"]));

        let diff = ResourceDiff::compute("dns_record.www", policy, Some(&prior), Some(&desired));
        let lines = change_lines(&diff);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("values:"));
        assert!(lines[0].contains("\"b\""));
    }

    #[test]
    fn test_change_lines_redact_sensitive_values() {
        let diff = ResourceDiff {
            address: "monitoring_write_token.main".to_string(),
            action: PlannedAction::Replace,
            changes: vec![FieldChange {
                field: "token".to_string(),
                from: Some(Value::from("cf_wt_old")),
                to: Some(Value::from("cf_wt_new")),
                forces_replacement: true,
                sensitive: true,
            }],
        };

        let rendered = change_lines(&diff).join("\n");
        assert!(!rendered.contains("cf_wt_"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("forces replacement"));
    }

    #[test]
    fn test_kind_titles_cover_every_kind() {
        for kind in ResourceKind::ALL {
            assert!(!kind_title(kind).is_empty());
        }
    }
}
