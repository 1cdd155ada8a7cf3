//! Property tests for hook resolution
//!
//! Generated hooks, platform filters and matrices checked against the
//! activation, filter precedence, cardinality and determinism guarantees of
//! `resolve`.

use hookline_core::hooks::{
    resolve, Activation, Bindings, ExecutionContext, Exclusion, Filter, Hook, Matrix,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const PLATFORMS: [&str; 6] = [
    "linux-x86_64",
    "linux-aarch_64",
    "osx-x86_64",
    "osx-aarch_64",
    "windows-x86_64",
    "windows-x86_32",
];

fn arb_platform() -> impl Strategy<Value = String> {
    prop::sample::select(PLATFORMS.to_vec()).prop_map(String::from)
}

/// Filter entries: exact platforms, OS families, wildcard and regexes
fn arb_pattern() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_platform(),
        prop::sample::select(vec!["linux", "osx", "windows", "*", "linux-.*", ".*-x86_64"])
            .prop_map(String::from),
    ]
}

fn arb_patterns() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(arb_pattern(), 0..4)
}

fn arb_activation() -> impl Strategy<Value = Activation> {
    prop_oneof![
        Just(Activation::Always),
        Just(Activation::Never),
        Just(Activation::Release),
        Just(Activation::Snapshot),
    ]
}

/// Up to four axes with one to three values each
fn arb_axes() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z0-9_]{1,6}", 1..4), 0..5)
}

fn matrix_of(axes: &[Vec<String>]) -> Matrix {
    axes.iter()
        .enumerate()
        .fold(Matrix::new(), |matrix, (i, values)| {
            matrix.with_axis(format!("axis{}", i), values.clone())
        })
}

fn arb_condition() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "",
        "true",
        "axis0 == 'a'",
        "MODE == 'full' || matrix.axis0 =~ '^[a-m]'",
        "!(CI) && MODE != 'off'",
        "UNDEFINED == 'x'",
        "MODE ==",
    ])
    .prop_map(String::from)
}

fn arb_bindings() -> impl Strategy<Value = Bindings> {
    prop::collection::btree_map(
        prop::sample::select(vec!["MODE", "CI", "VERSION", "axis0"]).prop_map(String::from),
        prop_oneof![
            Just("true".to_string()),
            Just("false".to_string()),
            "[a-z]{0,4}"
        ],
        0..4,
    )
}

/// A hook with every resolution-relevant field generated
fn arb_hook() -> impl Strategy<Value = Hook> {
    (
        arb_activation(),
        arb_patterns(),
        arb_patterns(),
        arb_patterns(),
        arb_axes(),
        arb_condition(),
    )
        .prop_map(|(active, includes, excludes, platforms, axes, condition)| {
            let mut hook = Hook::new("generated")
                .with_active(active)
                .with_command("run {{ axis0 }}")
                .with_matrix(matrix_of(&axes))
                .with_condition(condition);
            hook.filter = Filter { includes, excludes };
            hook.platforms = platforms;
            hook
        })
}

fn arb_context() -> impl Strategy<Value = ExecutionContext> {
    (arb_platform(), any::<bool>(), arb_bindings()).prop_map(|(platform, snapshot, bindings)| {
        ExecutionContext::new(platform)
            .with_snapshot(snapshot)
            .with_bindings(bindings)
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// A hook disabled for the run yields no cells, whatever else it declares.
    #[test]
    fn disabled_hook_yields_nothing(hook in arb_hook(), context in arb_context()) {
        let resolution = resolve(&hook, &context).unwrap();

        if hook.active.is_enabled(context.snapshot) {
            prop_assert_ne!(resolution.excluded, Some(Exclusion::Disabled));
        } else {
            prop_assert_eq!(resolution.excluded, Some(Exclusion::Disabled));
            prop_assert!(resolution.cells.is_empty());
            prop_assert_eq!(resolution.invocations().count(), 0);
        }
    }

    /// An exclude entry matching the current platform rejects the hook even
    /// when includes or legacy platforms also match it.
    #[test]
    fn exclude_wins_over_include(
        platform in arb_platform(),
        includes in arb_patterns(),
        excludes in arb_patterns(),
        platforms in arb_patterns(),
        hit in 0usize..3,
        axes in arb_axes(),
    ) {
        let family = platform.split('-').next().unwrap_or_default().to_string();
        let matching = [platform.clone(), family, "*".to_string()];
        let mut excludes = excludes;
        excludes.insert(matching[hit].clone());

        let mut included = includes;
        included.insert(platform.clone());

        let mut hook = Hook::new("filtered").with_matrix(matrix_of(&axes));
        hook.filter = Filter { includes: included, excludes };
        hook.platforms = platforms;

        let resolution = resolve(&hook, &ExecutionContext::new(platform)).unwrap();

        prop_assert_eq!(resolution.excluded, Some(Exclusion::PlatformRejected));
        prop_assert!(resolution.cells.is_empty());
    }

    /// Includes decide when nothing is excluded, and legacy platforms are
    /// consulted only without includes.
    #[test]
    fn include_then_legacy_precedence(
        platform in arb_platform(),
        includes in arb_patterns(),
        platforms in arb_patterns(),
    ) {
        let matches = |set: &BTreeSet<String>| {
            set.iter().any(|p| hookline_core::hooks::platform::platform_matches(p, &platform))
        };
        let expected = if !includes.is_empty() {
            matches(&includes)
        } else if !platforms.is_empty() {
            matches(&platforms)
        } else {
            true
        };

        let mut hook = Hook::new("filtered");
        hook.filter = Filter { includes, excludes: BTreeSet::new() };
        hook.platforms = platforms;

        let resolution = resolve(&hook, &ExecutionContext::new(platform.clone())).unwrap();
        prop_assert_eq!(!resolution.is_excluded(), expected);
    }

    /// An unconditional hook invokes once per cell, the cell count is the
    /// product of the axis sizes, and the order is stable across calls.
    #[test]
    fn cardinality_is_product_of_axes(axes in arb_axes(), platform in arb_platform()) {
        let matrix = matrix_of(&axes);
        let hook = Hook::new("matrix").with_matrix(matrix.clone());
        let context = ExecutionContext::new(platform);

        let expected: usize = axes.iter().map(Vec::len).product();
        let first = resolve(&hook, &context).unwrap().into_invocations();
        let second = resolve(&hook, &context).unwrap().into_invocations();

        prop_assert_eq!(first.len(), expected);
        prop_assert_eq!(matrix.cardinality(), expected);

        let order = |invocations: &[hookline_core::hooks::Invocation]| {
            invocations
                .iter()
                .map(|inv| inv.matrix_binding.clone())
                .collect::<Vec<_>>()
        };
        prop_assert_eq!(order(&first), order(&second));

        // The last axis varies fastest.
        if let (Some(last), Some(cell)) = (axes.last(), first.get(1)) {
            if last.len() > 1 {
                let name = format!("axis{}", axes.len() - 1);
                prop_assert_eq!(&cell.matrix_binding[&name], &last[1]);
            }
        }
    }

    /// Resolving the same hook in the same context twice gives equal results,
    /// including skipped and errored cells.
    #[test]
    fn resolution_is_idempotent(hook in arb_hook(), context in arb_context()) {
        let first = resolve(&hook, &context).unwrap();
        let second = resolve(&hook, &context).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            first.cells.len(),
            first.invocations().count() + first.skipped_count() + first.errored_count()
        );
    }
}
