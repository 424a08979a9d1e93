//! Integration tests for the built-in availability table against realistic chains

use chainderive::{Availability, AvailabilityTable, StaticChainContext, BUILTIN_GROUPS};

fn included(table: &AvailabilityTable, ctx: &StaticChainContext) -> Vec<&'static str> {
    BUILTIN_GROUPS
        .iter()
        .copied()
        .filter(|group| table.is_included(group, ctx))
        .collect()
}

#[test]
fn test_bare_chain_only_gets_unconditional_groups() {
    let table = AvailabilityTable::builtin();
    let ctx = StaticChainContext::new("minimal").with_query_keys(["system", "timestamp"]);

    assert_eq!(
        included(&table, &ctx),
        vec!["accounts", "balances", "bounties", "chain", "tx"]
    );
}

#[test]
fn test_relay_chain_modules() {
    let table = AvailabilityTable::builtin();
    let ctx = StaticChainContext::new("polkadot").with_query_keys([
        "system",
        "staking",
        "session",
        "democracy",
        "council",
        "technicalCommittee",
        "phragmenElection",
        "treasury",
        "registrar",
        "crowdloan",
        "imOnline",
    ]);

    let groups = included(&table, &ctx);
    for expected in [
        "council",
        "crowdloan",
        "democracy",
        "elections",
        "imOnline",
        "parachains",
        "session",
        "staking",
        "technicalCommittee",
        "treasury",
    ] {
        assert!(groups.contains(&expected), "{expected} should be included");
    }
    for excluded in ["contracts", "membership", "society"] {
        assert!(!groups.contains(&excluded), "{excluded} should be excluded");
    }
}

#[test]
fn test_elections_found_through_renamed_instance() {
    let table = AvailabilityTable::builtin();
    let ctx = StaticChainContext::new("kitchensink")
        .with_query_key("electionsV2")
        .with_instances("kitchensink", "elections", ["electionsV2"]);

    assert_eq!(
        table.explain("elections", &ctx),
        Availability::ResolvedInstance {
            key: "elections".to_string(),
            instance: "electionsV2".to_string(),
        }
    );
}

#[test]
fn test_instance_detection_only_for_flagged_groups() {
    let table = AvailabilityTable::builtin();
    let ctx = StaticChainContext::new("custom")
        .with_query_keys(["societyV2", "instance1Collective"])
        .with_instances("custom", "society", ["societyV2"])
        .with_instances("custom", "technicalCommittee", ["instance1Collective"]);

    assert!(!table.is_included("society", &ctx));
    assert!(table.is_included("technicalCommittee", &ctx));
}

#[test]
fn test_empty_table_includes_everything() {
    let table = AvailabilityTable::empty();
    let ctx = StaticChainContext::default();
    assert_eq!(included(&table, &ctx).len(), BUILTIN_GROUPS.len());
}
