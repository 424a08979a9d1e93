//! Property-based tests for composition laws

use chainderive::{
    compose, AvailabilityRule, AvailabilityTable, CallerId, GroupOrigin, GroupRegistry,
    MethodTable, StaticChainContext,
};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const RUNTIME: &str = "rt";

type Registry = GroupRegistry<StaticChainContext, String>;

fn name(prefix: &'static str) -> impl Strategy<Value = String> {
    (0u8..6).prop_map(move |i| format!("{prefix}{i}"))
}

fn rule() -> impl Strategy<Value = AvailabilityRule> {
    (prop::collection::vec(name("k"), 1..4), any::<bool>()).prop_map(|(keys, detect)| {
        AvailabilityRule {
            required_keys: keys,
            use_instance_detection: detect,
        }
    })
}

fn rules() -> impl Strategy<Value = BTreeMap<String, AvailabilityRule>> {
    prop::collection::btree_map(name("g"), rule(), 0..6)
}

fn context() -> impl Strategy<Value = StaticChainContext> {
    (
        prop::collection::btree_set(name("k"), 0..6),
        prop::collection::btree_map(name("k"), prop::collection::vec(name("k"), 0..3), 0..4),
    )
        .prop_map(|(keys, instances)| {
            instances.into_iter().fold(
                StaticChainContext::new(RUNTIME).with_query_keys(keys),
                |ctx, (logical, resolved)| ctx.with_instances(RUNTIME, logical, resolved),
            )
        })
}

fn registry(groups: &BTreeSet<String>, tag: &'static str) -> Registry {
    groups.iter().fold(GroupRegistry::new(), |registry, group| {
        registry.with_group(
            group.clone(),
            MethodTable::new().with_method("m", move |_, _| Ok(tag.to_string())),
        )
    })
}

/// Reference predicate written directly from the inclusion rules
fn expected_inclusion(
    rules: &BTreeMap<String, AvailabilityRule>,
    group: &str,
    ctx: &StaticChainContext,
) -> bool {
    match rules.get(group) {
        None => true,
        Some(rule) => {
            rule.required_keys.iter().any(|k| ctx.query_keys.contains(k))
                || (rule.use_instance_detection
                    && rule.required_keys.iter().any(|k| {
                        ctx.instances
                            .get(RUNTIME)
                            .and_then(|m| m.get(k))
                            .map(|found| found.iter().any(|i| ctx.query_keys.contains(i)))
                            .unwrap_or(false)
                    }))
        }
    }
}

proptest! {
    #[test]
    fn prop_builtin_only_matches_inclusion(
        rule_map in rules(),
        groups in prop::collection::btree_set(name("g"), 0..6),
        ctx in context(),
    ) {
        let table = AvailabilityTable::from_rules(rule_map.clone()).unwrap();
        let ctx = Arc::new(ctx);
        let derived = compose(
            &registry(&groups, "builtin"),
            &GroupRegistry::new(),
            &table,
            &CallerId::new("p"),
            &ctx,
        );

        let expected: Vec<&str> = groups
            .iter()
            .map(String::as_str)
            .filter(|g| expected_inclusion(&rule_map, g, &ctx))
            .collect();
        prop_assert_eq!(derived.group_names().collect::<Vec<_>>(), expected);
        for group in derived.group_names() {
            prop_assert!(table.is_included(group, &*ctx));
        }
    }

    #[test]
    fn prop_merge_completeness_and_override(
        rule_map in rules(),
        builtin_groups in prop::collection::btree_set(name("g"), 0..6),
        custom_groups in prop::collection::btree_set(name("g"), 0..6),
        ctx in context(),
    ) {
        let table = AvailabilityTable::from_rules(rule_map.clone()).unwrap();
        let ctx = Arc::new(ctx);
        let derived = compose(
            &registry(&builtin_groups, "builtin"),
            &registry(&custom_groups, "custom"),
            &table,
            &CallerId::new("p"),
            &ctx,
        );

        let passing = |set: &BTreeSet<String>| -> BTreeSet<String> {
            set.iter()
                .filter(|g| expected_inclusion(&rule_map, g, &ctx))
                .cloned()
                .collect()
        };
        let builtin_passing = passing(&builtin_groups);
        let custom_passing = passing(&custom_groups);
        let expected: BTreeSet<String> = builtin_passing.union(&custom_passing).cloned().collect();
        let actual: BTreeSet<String> = derived.group_names().map(str::to_string).collect();
        prop_assert_eq!(&actual, &expected);

        for group in &actual {
            let (origin, tag) = if custom_passing.contains(group) {
                (GroupOrigin::Custom, "custom")
            } else {
                (GroupOrigin::BuiltIn, "builtin")
            };
            prop_assert_eq!(derived.origin(group), Some(origin));
            prop_assert_eq!(derived.method(group, "m").unwrap(), tag);
        }
    }
}

/// Groups without a rule are included whatever the chain exposes
#[test]
fn test_unruled_group_always_included_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(rules(), context()), |(rule_map, ctx)| {
            let table = AvailabilityTable::from_rules(rule_map).unwrap();
            assert!(table.is_included("unruled", &ctx));
            assert!(table.is_included("unruled", &StaticChainContext::default()));
            Ok(())
        })
        .unwrap();
}

/// Direct-only rules are decided by key membership alone
#[test]
fn test_direct_rule_is_key_membership_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(name("k"), 1..4), context()),
            |(keys, ctx)| {
                let table =
                    AvailabilityTable::from_rules([("g", AvailabilityRule::new(keys.clone()))])
                        .unwrap();
                let present = keys.iter().any(|k| ctx.query_keys.contains(k));
                assert_eq!(table.is_included("g", &ctx), present);
                Ok(())
            },
        )
        .unwrap();
}
