//! Execution planner: diff the manifest against (refreshed) state

use crate::manifest::{Address, Manifest};
use crate::state::StateFile;
use anyhow::{Result, anyhow};
use reconcile::{AttributeRecord, DiffSummary, PlannedAction, ResourceDiff, ResourceKind};
use std::collections::BTreeSet;

/// A `--target` filter: a whole kind or one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: ResourceKind,
    pub name: Option<String>,
}

impl Target {
    pub fn matches(&self, address: &Address) -> bool {
        address.kind == self.kind
            && self
                .name
                .as_ref()
                .is_none_or(|name| address.name.as_ref() == Some(name))
    }
}

/// Parse a target string like "dns_record.www" into kind and name
pub fn parse_target(target: &str) -> Result<Target> {
    let (kind, name) = match target.split_once('.') {
        Some((kind, name)) => (kind, Some(name.to_string())),
        None => (target, None),
    };
    let kind: ResourceKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    if name.is_some() && kind.policy().is_singleton() {
        return Err(anyhow!("{kind} is a singleton; target it as '{kind}'"));
    }
    Ok(Target { kind, name })
}

/// Check if an address passes the optional filter
pub fn matches_filter(address: &Address, target: Option<&Target>) -> bool {
    target.is_none_or(|t| t.matches(address))
}

// ============================================================================
// Plan
// ============================================================================

/// What to do with one instance
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub address: Address,
    /// Persisted state, absent if the instance is not tracked yet
    pub prior: Option<AttributeRecord>,
    /// Declared state, absent if the instance should be deleted
    pub desired: Option<AttributeRecord>,
    pub diff: ResourceDiff,
}

impl PlannedChange {
    fn new(
        address: Address,
        prior: Option<AttributeRecord>,
        desired: Option<AttributeRecord>,
    ) -> Self {
        let diff = ResourceDiff::compute(
            address.to_string(),
            address.kind.policy(),
            prior.as_ref(),
            desired.as_ref(),
        );
        Self {
            address,
            prior,
            desired,
            diff,
        }
    }

    pub fn action(&self) -> PlannedAction {
        self.diff.action
    }
}

/// Every instance in scope, in address order
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// Changes that need remote work
    pub fn pending(&self) -> Vec<&PlannedChange> {
        self.changes
            .iter()
            .filter(|c| c.action().is_change())
            .collect()
    }

    pub fn summary(&self) -> DiffSummary {
        let diffs: Vec<ResourceDiff> = self.changes.iter().map(|c| c.diff.clone()).collect();
        DiffSummary::from_diffs(&diffs)
    }

    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.action().is_change())
    }
}

/// Diff every declared and tracked instance matching `target`.
///
/// Declared but untracked instances are created, tracked but undeclared
/// ones are deleted.
pub fn build_plan(manifest: &Manifest, state: &StateFile, target: Option<&Target>) -> Plan {
    let addresses: BTreeSet<Address> = manifest
        .iter()
        .map(|r| r.address.clone())
        .chain(state.entries().map(|(address, _)| address))
        .filter(|address| matches_filter(address, target))
        .collect();

    let changes = addresses
        .into_iter()
        .map(|address| {
            let key = address.to_string();
            let prior = state.get(&key).map(|e| e.attributes.clone());
            let desired = manifest.get(&key).map(|r| r.record.clone());
            PlannedChange::new(address, prior, desired)
        })
        .collect();

    Plan { changes }
}

/// Delete every tracked instance matching `target`
pub fn destroy_plan(state: &StateFile, target: Option<&Target>) -> Plan {
    let changes = state
        .entries()
        .filter(|(address, _)| matches_filter(address, target))
        .map(|(address, entry)| PlannedChange::new(address, Some(entry.attributes.clone()), None))
        .collect();
    Plan { changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::Value;

    const MANIFEST: &str = r#"
[dns_record.www]
name = "www"
zone_name = "example.com"
type = "CNAME"
values = ["target.example.com"]

[nameservers]
ns_records = ["ns-1.example.net", "ns-2.example.net"]
"#;

    fn www_state() -> AttributeRecord {
        AttributeRecord::new()
            .with("id", "dns-1")
            .with("name", "www")
            .with("zone_name", "example.com")
            .with("type", "CNAME")
            .with("values", Value::set(["target.example.com"]))
    }

    fn address(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_target() {
        let target = parse_target("dns_record.www").unwrap();
        assert_eq!(target.kind, ResourceKind::DnsRecord);
        assert_eq!(target.name.as_deref(), Some("www"));

        let target = parse_target("nameservers").unwrap();
        assert!(target.name.is_none());

        assert!(parse_target("nameservers.main").is_err());
        assert!(parse_target("bogus").is_err());
    }

    #[test]
    fn test_target_matching() {
        let kind = parse_target("dns_record").unwrap();
        let one = parse_target("dns_record.www").unwrap();

        assert!(kind.matches(&address("dns_record.api")));
        assert!(one.matches(&address("dns_record.www")));
        assert!(!one.matches(&address("dns_record.api")));
        assert!(!kind.matches(&address("nameservers")));
        assert!(matches_filter(&address("nameservers"), None));
    }

    #[test]
    fn test_empty_state_plans_creates() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let plan = build_plan(&manifest, &StateFile::default(), None);

        assert_eq!(plan.changes.len(), 2);
        assert!(plan.changes.iter().all(|c| c.action() == PlannedAction::Create));
        assert_eq!(plan.summary().creates, 2);
    }

    #[test]
    fn test_reordered_set_is_no_change() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        state.set(&address("dns_record.www"), www_state());
        state.set(
            &address("nameservers"),
            AttributeRecord::new().with(
                "ns_records",
                Value::set(["ns-2.example.net", "ns-1.example.net"]),
            ),
        );

        let plan = build_plan(&manifest, &state, None);
        assert!(!plan.has_changes());
        assert_eq!(plan.summary().unchanged, 2);
    }

    #[test]
    fn test_changed_values_plan_update_and_immutable_plans_replace() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        state.set(
            &address("dns_record.www"),
            www_state().with("values", Value::set(["old.example.com"])),
        );
        let plan = build_plan(&manifest, &state, Some(&parse_target("dns_record").unwrap()));
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].action(), PlannedAction::Update);

        state.set(&address("dns_record.www"), www_state().with("type", "TXT"));
        let plan = build_plan(&manifest, &state, Some(&parse_target("dns_record").unwrap()));
        assert_eq!(plan.changes[0].action(), PlannedAction::Replace);
    }

    #[test]
    fn test_undeclared_instance_plans_delete() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut state = StateFile::default();
        state.set(&address("dns_record.old"), www_state());

        let plan = build_plan(&manifest, &state, None);
        let old = plan
            .changes
            .iter()
            .find(|c| c.address.to_string() == "dns_record.old")
            .unwrap();
        assert_eq!(old.action(), PlannedAction::Delete);
        assert!(old.desired.is_none());
    }

    #[test]
    fn test_destroy_plan_respects_target() {
        let mut state = StateFile::default();
        state.set(&address("dns_record.www"), www_state());
        state.set(&address("nameservers"), AttributeRecord::new());

        let plan = destroy_plan(&state, Some(&parse_target("dns_record").unwrap()));
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].action(), PlannedAction::Delete);

        assert_eq!(destroy_plan(&state, None).changes.len(), 2);
    }
}
