use collatz_tree::*;

/// コラッツ写像 1ステップ
fn collatz(n: u64) -> u64 {
    if n % 2 == 0 {
        n / 2
    } else {
        3 * n + 1
    }
}

// ===== 具体例 =====

#[test]
fn test_bound_4_is_trunk_only() {
    let tree = build_tree(4).unwrap();
    assert_eq!(tree.trunk_max(), 8);
    assert_eq!(tree.values().collect::<Vec<_>>(), vec![1, 2, 4, 8]);
    assert_eq!(tree.trunk(), vec![1, 2, 4, 8]);
    assert!(tree.iter().all(|(_, n)| n.odd_child.is_none()));
    assert!(tree.get(8).unwrap().is_leaf());
}

#[test]
fn test_bound_16_branches_from_16() {
    let tree = build_tree(16).unwrap();
    let sixteen = tree.get(16).unwrap();
    let five = tree.node(sixteen.odd_child.unwrap());
    assert_eq!(five.value, 5);
    assert_eq!(tree.node(sixteen.even_child.unwrap()).value, 32);

    assert_eq!(
        tree.values().collect::<Vec<_>>(),
        vec![1, 2, 4, 8, 16, 32, 5, 10, 3, 6, 12]
    );
}

#[test]
fn test_extended_trunk_does_not_branch() {
    // N=10: 幹は 16 まで伸びるが、16 > N なので 16 からは奇数枝を出さない
    let tree = build_tree(10).unwrap();
    assert_eq!(tree.trunk(), vec![1, 2, 4, 8, 16]);
    assert!(tree.get(16).unwrap().odd_child.is_none());
    assert!(!tree.contains(5));
    assert_eq!(tree.len(), 5);

    // N=20 なら 16 <= N なので 5 が現れる
    let tree = build_tree(20).unwrap();
    let five = tree.id_of(5).unwrap();
    assert_eq!(tree.get(16).unwrap().odd_child, Some(five));
}

#[test]
fn test_27_needs_bound_9232() {
    // 27 の軌道の最大値は 9232
    assert!(build_tree(9232).unwrap().contains(27));
    assert!(!build_tree(9231).unwrap().contains(27));
    assert!(!build_tree(1000).unwrap().contains(27));
}

#[test]
fn test_depth_of_27() {
    // 27 → 1 は 111 ステップなので、木の深さは少なくとも 111
    let tree = build_tree(MAX_BOUND).unwrap();
    assert!(tree.contains(27));
    assert!(tree.summary().depth >= 111);
}

// ===== 性質 =====

#[test]
fn test_parent_is_collatz_successor() {
    let tree = build_tree(5000).unwrap();
    for (_, node) in tree.iter() {
        for child in node.children() {
            assert_eq!(collatz(tree.node(child).value), node.value);
        }
    }
}

#[test]
fn test_invariants_for_various_bounds() {
    for n in [4, 5, 7, 8, 16, 27, 100, 1000, 4096, 12345, MAX_BOUND] {
        let tree = build_tree(n).unwrap();
        let violations = check_tree(&tree);
        assert!(violations.is_empty(), "N={}: {:?}", n, violations);

        let tm = trunk_max(n).unwrap();
        assert!(tree.values().all(|v| (1..=tm).contains(&v)), "N={}", n);
        assert_eq!(*tree.trunk().last().unwrap(), tm, "N={}", n);
    }
}

#[test]
fn test_non_trunk_values_within_bound() {
    let tree = build_tree(777).unwrap();
    for v in tree.values().filter(|&v| !is_power_of_two(v)) {
        assert!(v <= 777, "{} exceeds bound", v);
    }
}

#[test]
fn test_rebuild_is_deterministic() {
    let a = build_tree(3000).unwrap();
    let b = build_tree(3000).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.values().collect::<Vec<_>>(), b.values().collect::<Vec<_>>());
}

#[test]
fn test_larger_bound_is_superset() {
    let small = build_tree(500).unwrap();
    let large = build_tree(501).unwrap();
    assert!(small.values().all(|v| large.contains(v)));
}

#[test]
fn test_max_bound_summary() {
    let s = build_tree(MAX_BOUND).unwrap().summary();
    assert_eq!(s.trunk_max, 131_072);
    assert_eq!(s.trunk_len, 18); // 2^0 .. 2^17
    assert!(s.nodes > s.trunk_len);
    assert!(s.leaves > 0);
    assert!(s.odd_branches > 0);
}
