use collatz_tree::*;
use proptest::prelude::*;

/// 値 v が上限 n の木に含まれるべきか（軌道をたどって直接判定）
///
/// 2の冪は trunk_max まで。それ以外は 1 に至る軌道上の値がすべて n 以内のとき。
fn expected_member(v: u64, n: u64, tm: u64) -> bool {
    if is_power_of_two(v) {
        return v <= tm;
    }
    let mut x = v;
    while x != 1 {
        if x > n {
            return false;
        }
        x = if x % 2 == 0 { x / 2 } else { 3 * x + 1 };
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tree_invariants(n in 4u64..5000) {
        let tree = build_tree(n).unwrap();
        prop_assert!(check_tree(&tree).is_empty());

        let tm = trunk_max(n).unwrap();
        prop_assert!(tm > n && tm / 2 <= n);
        prop_assert!(tree.values().all(|v| v >= 1 && v <= tm));
    }

    #[test]
    fn prop_membership_matches_trajectories(n in 4u64..3000) {
        let tree = build_tree(n).unwrap();
        let tm = tree.trunk_max();
        for v in 1..=tm {
            prop_assert_eq!(tree.contains(v), expected_member(v, n, tm), "v={}", v);
        }
    }

    #[test]
    fn prop_layout_column_invariant(n in 4u64..5000) {
        let tree = build_tree(n).unwrap();
        let layout = compute_layout(&tree);
        let violations = check_layout(&tree, &layout);
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn prop_layout_has_no_crossings(n in 4u64..1500, ratio in 0.05f64..0.95) {
        let tree = build_tree(n).unwrap();
        let cfg = LayoutConfig::new(80.0, 1.0, ratio).unwrap();
        prop_assert_eq!(count_crossings(&compute_layout_with(&tree, &cfg)), 0);
    }

    #[test]
    fn prop_parse_bound_stays_in_range(s in "\\PC*") {
        if let Ok(n) = parse_bound(&s) {
            prop_assert!((MIN_BOUND..=MAX_BOUND).contains(&n));
        }
    }
}
