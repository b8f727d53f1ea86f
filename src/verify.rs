use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use crate::error::BoundError;
use crate::layout::{compute_layout_with, LayoutConfig, LayoutResult};
use crate::tree::{build_tree, trunk_max, CollatzTree};

/// 木またはレイアウトが満たすべき性質の違反
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("value {value} lies outside [1, {trunk_max}]")]
    OutOfRange { value: u64, trunk_max: u64 },

    #[error("value {value} appears more than once")]
    Duplicate { value: u64 },

    #[error("even child of {parent} is {child}")]
    EvenChild { parent: u64, child: u64 },

    #[error("odd child of {parent} is {child}")]
    OddChild { parent: u64, child: u64 },

    #[error("node {value} has {count} parents")]
    Parents { value: u64, count: usize },

    #[error("trunk stops at {reached}, expected {trunk_max}")]
    BrokenTrunk { reached: u64, trunk_max: u64 },

    #[error("layout has {layout} nodes for a tree of {tree}")]
    NodeCount { tree: usize, layout: usize },

    #[error("layout has {layout} edges for a tree of {tree} nodes")]
    EdgeCount { tree: usize, layout: usize },

    #[error("edge {from} -> {to} points outside {nodes} positions")]
    DanglingEdge { from: usize, to: usize, nodes: usize },

    #[error("value {value} has no position in the layout")]
    MissingPosition { value: u64 },

    #[error("position of {value} has {count} incoming edges")]
    IncomingEdges { value: u64, count: usize },

    #[error("below {parent}: even subtree reaches column {even_max} but odd child sits at {odd_column}")]
    EvenSubtreeColumn { parent: u64, even_max: u32, odd_column: u32 },

    #[error("below {parent}: odd subtree reaches column {odd_min} left of its root column {odd_column}")]
    OddSubtreeColumn { parent: u64, odd_min: u32, odd_column: u32 },

    #[error("{count} crossing edge pairs")]
    Crossings { count: usize },
}

/// 木の構造的性質を検査する
pub fn check_tree(tree: &CollatzTree) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::with_capacity(tree.len());
    let mut parents = vec![0usize; tree.len()];
    let trunk_max = tree.trunk_max();

    for (_, node) in tree.iter() {
        let n = node.value;
        if n == 0 || n > trunk_max {
            violations.push(Violation::OutOfRange { value: n, trunk_max });
        }
        if !seen.insert(n) {
            violations.push(Violation::Duplicate { value: n });
        }
        if let Some(even) = node.even_child {
            parents[even.0] += 1;
            let child = tree.node(even).value;
            if n.checked_mul(2) != Some(child) {
                violations.push(Violation::EvenChild { parent: n, child });
            }
        }
        if let Some(odd) = node.odd_child {
            parents[odd.0] += 1;
            let child = tree.node(odd).value;
            let valid = child % 2 == 1 && child > 1 && child <= tree.max()
                && child.checked_mul(3).and_then(|c| c.checked_add(1)) == Some(n);
            if !valid {
                violations.push(Violation::OddChild { parent: n, child });
            }
        }
    }

    for (id, node) in tree.iter() {
        let expected = if id == CollatzTree::ROOT { 0 } else { 1 };
        if parents[id.0] != expected {
            violations.push(Violation::Parents {
                value: node.value,
                count: parents[id.0],
            });
        }
    }

    let trunk = tree.trunk();
    let reached = trunk.last().copied().unwrap_or(0);
    if trunk.first() != Some(&1) || reached != trunk_max {
        violations.push(Violation::BrokenTrunk { reached, trunk_max });
    }

    violations
}

/// レイアウトが木の射影になっていること、および列の順序不変条件を検査する。
///
/// 両方の子を持つノードについて、偶数子の部分木の列はすべて奇数子の列より小さく、
/// 奇数子の部分木の列はすべて奇数子の列以上でなければならない。
pub fn check_layout(tree: &CollatzTree, layout: &LayoutResult) -> Vec<Violation> {
    let mut violations = Vec::new();

    if layout.nodes.len() != tree.len() {
        violations.push(Violation::NodeCount {
            tree: tree.len(),
            layout: layout.nodes.len(),
        });
    }
    if layout.edges.len() + 1 != tree.len() {
        violations.push(Violation::EdgeCount {
            tree: tree.len(),
            layout: layout.edges.len(),
        });
    }

    let len = layout.nodes.len();
    let mut incoming = vec![0usize; len];
    for edge in &layout.edges {
        if edge.from >= len || edge.to >= len {
            violations.push(Violation::DanglingEdge {
                from: edge.from,
                to: edge.to,
                nodes: len,
            });
            continue;
        }
        incoming[edge.to] += 1;
    }
    for (i, pos) in layout.nodes.iter().enumerate() {
        let expected = if pos.value == 1 { 0 } else { 1 };
        if incoming[i] != expected {
            violations.push(Violation::IncomingEdges {
                value: pos.value,
                count: incoming[i],
            });
        }
    }

    let columns: HashMap<u64, u32> = layout.nodes.iter().map(|p| (p.value, p.column)).collect();

    // 部分木ごとの (最小列, 最大列)。子は親より後ろに格納されているので逆順に畳み込む
    let mut ranges: Vec<Option<(u32, u32)>> = vec![None; tree.len()];
    for (id, node) in tree.iter().rev() {
        let Some(&col) = columns.get(&node.value) else {
            violations.push(Violation::MissingPosition { value: node.value });
            continue;
        };
        let range = node
            .children()
            .filter_map(|c| ranges[c.0])
            .fold((col, col), |(lo, hi), (clo, chi)| (lo.min(clo), hi.max(chi)));
        ranges[id.0] = Some(range);
    }

    for (_, node) in tree.iter() {
        let (Some(even), Some(odd)) = (node.even_child, node.odd_child) else {
            continue;
        };
        let (Some((_, even_max)), Some((odd_min, _)), Some(&odd_column)) =
            (ranges[even.0], ranges[odd.0], columns.get(&tree.node(odd).value))
        else {
            continue;
        };
        if even_max >= odd_column {
            violations.push(Violation::EvenSubtreeColumn {
                parent: node.value,
                even_max,
                odd_column,
            });
        }
        if odd_min < odd_column {
            violations.push(Violation::OddSubtreeColumn {
                parent: node.value,
                odd_min,
                odd_column,
            });
        }
    }

    violations
}

#[derive(Clone, Copy)]
struct Segment {
    from: usize,
    to: usize,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Segment {
    fn min_x(&self) -> f64 {
        self.x0.min(self.x1)
    }
    fn max_x(&self) -> f64 {
        self.x0.max(self.x1)
    }
    fn min_y(&self) -> f64 {
        self.y0.min(self.y1)
    }
    fn max_y(&self) -> f64 {
        self.y0.max(self.y1)
    }

    fn shares_endpoint(&self, other: &Segment) -> bool {
        self.from == other.from || self.from == other.to || self.to == other.from || self.to == other.to
    }
}

/// 向き判定。丸め誤差程度の値は 0（同一直線）とみなす。
fn orient(ax: f64, ay: f64, bx: f64, by: f64, cx: f64, cy: f64) -> i8 {
    let l = (bx - ax) * (cy - ay);
    let r = (by - ay) * (cx - ax);
    let d = l - r;
    let eps = 1e-12 * (l.abs() + r.abs());
    if d > eps {
        1
    } else if d < -eps {
        -1
    } else {
        0
    }
}

fn crosses(a: &Segment, b: &Segment) -> bool {
    let o1 = orient(a.x0, a.y0, a.x1, a.y1, b.x0, b.y0);
    let o2 = orient(a.x0, a.y0, a.x1, a.y1, b.x1, b.y1);
    let o3 = orient(b.x0, b.y0, b.x1, b.y1, a.x0, a.y0);
    let o4 = orient(b.x0, b.y0, b.x1, b.y1, a.x1, a.y1);

    if o1 * o2 < 0 && o3 * o4 < 0 {
        return true;
    }
    // 同一直線上で長さを持って重なる場合も交差として数える
    if o1 == 0 && o2 == 0 {
        let overlap_x = a.max_x().min(b.max_x()) - a.min_x().max(b.min_x());
        let overlap_y = a.max_y().min(b.max_y()) - a.min_y().max(b.min_y());
        return overlap_x.max(overlap_y) > 0.0 && overlap_x >= 0.0 && overlap_y >= 0.0;
    }
    false
}

/// 端点を共有しない辺の組で、交差するものの数。
/// x 方向の掃引で候補を絞るが、最悪計算量は辺数の2乗。
pub fn count_crossings(layout: &LayoutResult) -> usize {
    // 範囲外を指す辺は check_layout が報告するので、ここでは読み飛ばす
    let mut segments: Vec<Segment> = layout
        .edges
        .iter()
        .filter_map(|e| {
            let (a, b) = (layout.nodes.get(e.from)?, layout.nodes.get(e.to)?);
            Some(Segment {
                from: e.from,
                to: e.to,
                x0: a.x,
                y0: a.y,
                x1: b.x,
                y1: b.y,
            })
        })
        .collect();
    segments.sort_by(|a, b| a.min_x().total_cmp(&b.min_x()));

    let mut count = 0;
    for (i, a) in segments.iter().enumerate() {
        for b in &segments[i + 1..] {
            if b.min_x() > a.max_x() {
                break;
            }
            if b.min_y() > a.max_y() || a.min_y() > b.max_y() || a.shares_endpoint(b) {
                continue;
            }
            if crosses(a, b) {
                count += 1;
            }
        }
    }
    count
}

/// 1つの上限値に対する検証結果
#[derive(Debug, Clone, PartialEq)]
pub struct BoundReport {
    pub max: u64,
    pub nodes: usize,
    pub edges: usize,
    pub trunk_len: usize,
    pub columns: u32,
    /// 交差判定を行わなかった場合は None
    pub crossings: Option<usize>,
    pub violations: Vec<Violation>,
}

impl BoundReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// 上限 max で木とレイアウトを作り、全性質を検査する
pub fn verify_bound(max: u64, config: &LayoutConfig, check_crossings: bool) -> Result<BoundReport, BoundError> {
    let tree = build_tree(max)?;
    let layout = compute_layout_with(&tree, config);

    let mut violations = check_tree(&tree);
    violations.extend(check_layout(&tree, &layout));

    let crossings = check_crossings.then(|| count_crossings(&layout));
    if let Some(count) = crossings.filter(|&c| c > 0) {
        violations.push(Violation::Crossings { count });
    }

    Ok(BoundReport {
        max,
        nodes: tree.len(),
        edges: layout.edges.len(),
        trunk_len: tree.trunk().len(),
        columns: layout.column_count(),
        crossings,
        violations,
    })
}

/// 範囲検証の結果
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyResult {
    /// 検証した上限値の数
    pub total_checked: u64,
    pub all_passed: bool,
    /// 最大ノード数とその上限値
    pub max_nodes: usize,
    pub max_nodes_bound: u64,
    pub max_columns: u32,
    /// 違反のあった上限値（昇順）
    pub failures: Vec<BoundReport>,
}

/// [start, end] の全上限値を並列に検証する。
/// 各上限値の木は独立にシングルスレッドで構築される。
/// progress_callback: (完了数, 総数) を呼ぶ（スレッドセーフ）。
pub fn verify_range_parallel(
    start: u64,
    end: u64,
    config: &LayoutConfig,
    check_crossings: bool,
    progress_callback: impl Fn(u64, u64) + Sync,
) -> Result<VerifyResult, BoundError> {
    if start == 0 {
        return Err(BoundError::NonPositive);
    }
    if trunk_max(end).is_none() {
        return Err(BoundError::TooLarge { max: end });
    }
    if start > end {
        return Ok(VerifyResult {
            total_checked: 0,
            all_passed: true,
            max_nodes: 0,
            max_nodes_bound: 0,
            max_columns: 0,
            failures: Vec::new(),
        });
    }

    let total = end - start + 1;
    let done = AtomicU64::new(0);

    let reports: Vec<BoundReport> = (start..=end)
        .into_par_iter()
        .map(|max| {
            let report = verify_bound(max, config, check_crossings);
            let d = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress_callback(d, total);
            report
        })
        .collect::<Result<_, _>>()?;

    let mut result = VerifyResult {
        total_checked: reports.len() as u64,
        all_passed: true,
        max_nodes: 0,
        max_nodes_bound: start,
        max_columns: 0,
        failures: Vec::new(),
    };
    for report in reports {
        if report.nodes > result.max_nodes {
            result.max_nodes = report.nodes;
            result.max_nodes_bound = report.max;
        }
        result.max_columns = result.max_columns.max(report.columns);
        if !report.passed() {
            for v in &report.violations {
                tracing::warn!(max = report.max, violation = %v, "verification failed");
            }
            result.failures.push(report);
        }
    }
    result.all_passed = result.failures.is_empty();

    tracing::info!(
        start,
        end,
        checked = result.total_checked,
        failures = result.failures.len(),
        "range verification finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, Edge, NodePosition};

    fn pos(value: u64, x: f64, y: f64) -> NodePosition {
        NodePosition {
            value,
            column: (x / 80.0) as u32,
            x,
            y,
            is_trunk: false,
            is_leaf: false,
            has_odd_child: false,
            is_odd_child: false,
        }
    }

    fn edge(from: usize, to: usize) -> Edge {
        Edge {
            from,
            to,
            is_trunk: false,
            is_leaf: false,
        }
    }

    #[test]
    fn test_count_crossings_detects_x() {
        let layout = LayoutResult {
            nodes: vec![pos(1, 0.0, 0.0), pos(2, 80.0, 10.0), pos(3, 80.0, 0.0), pos(4, 0.0, 10.0)],
            edges: vec![edge(0, 1), edge(2, 3)],
        };
        assert_eq!(count_crossings(&layout), 1);
    }

    #[test]
    fn test_count_crossings_ignores_shared_endpoint() {
        let layout = LayoutResult {
            nodes: vec![pos(1, 0.0, 0.0), pos(2, 0.0, 10.0), pos(3, 80.0, 3.0)],
            edges: vec![edge(0, 1), edge(0, 2)],
        };
        assert_eq!(count_crossings(&layout), 0);
    }

    #[test]
    fn test_count_crossings_collinear_overlap() {
        let layout = LayoutResult {
            nodes: vec![pos(1, 0.0, 0.0), pos(2, 0.0, 10.0), pos(3, 0.0, 5.0), pos(4, 0.0, 20.0)],
            edges: vec![edge(0, 1), edge(2, 3)],
        };
        assert_eq!(count_crossings(&layout), 1);
    }

    #[test]
    fn test_check_layout_flags_swapped_columns() {
        let tree = build_tree(16).unwrap();
        let mut layout = compute_layout(&tree);
        assert!(check_layout(&tree, &layout).is_empty());

        // 16 の偶数子 32 を奇数子 5 より右の列へ動かす
        for p in layout.nodes.iter_mut().filter(|p| p.value == 32) {
            p.column = 5;
        }
        let violations = check_layout(&tree, &layout);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::EvenSubtreeColumn { parent: 16, .. })));
    }

    #[test]
    fn test_check_layout_reports_truncated_layout() {
        let tree = build_tree(16).unwrap();
        let mut layout = compute_layout(&tree);
        layout.nodes.truncate(3);

        let violations = check_layout(&tree, &layout);
        assert!(violations.contains(&Violation::NodeCount { tree: 11, layout: 3 }));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::DanglingEdge { nodes: 3, .. })));
        assert_eq!(count_crossings(&layout), 0);
    }

    /// N=16 の木で、値 from のノードを to に書き換える
    fn rewrite_value(tree: &mut CollatzTree, from: u64, to: u64) {
        let id = tree.id_of(from).unwrap();
        tree.nodes_mut()[id.0].value = to;
    }

    #[test]
    fn test_check_tree_reports_corruption() {
        let clean = build_tree(16).unwrap();
        assert!(check_tree(&clean).is_empty());

        // 16 の偶数子 32 → 33
        let mut tree = clean.clone();
        rewrite_value(&mut tree, 32, 33);
        assert!(check_tree(&tree).contains(&Violation::EvenChild { parent: 16, child: 33 }));

        // 16 の奇数子 5 → 7
        let mut tree = clean.clone();
        rewrite_value(&mut tree, 5, 7);
        assert!(check_tree(&tree).contains(&Violation::OddChild { parent: 16, child: 7 }));

        // 12 を 6 に書き換えると 6 が2回現れる
        let mut tree = clean.clone();
        rewrite_value(&mut tree, 12, 6);
        let violations = check_tree(&tree);
        assert!(violations.contains(&Violation::Duplicate { value: 6 }));
        assert!(violations.contains(&Violation::EvenChild { parent: 6, child: 6 }));

        // 幹を 16 で切ると 32 は親を失う
        let mut tree = clean.clone();
        let sixteen = tree.id_of(16).unwrap();
        tree.nodes_mut()[sixteen.0].even_child = None;
        let violations = check_tree(&tree);
        assert!(violations.contains(&Violation::BrokenTrunk { reached: 16, trunk_max: 32 }));
        assert!(violations.contains(&Violation::Parents { value: 32, count: 0 }));

        // 範囲外の値
        let mut tree = clean;
        rewrite_value(&mut tree, 12, 64);
        assert!(check_tree(&tree).contains(&Violation::OutOfRange { value: 64, trunk_max: 32 }));
    }

    #[test]
    fn test_verify_bound_small() {
        let report = verify_bound(16, &LayoutConfig::default(), true).unwrap();
        assert!(report.passed(), "{:?}", report.violations);
        assert_eq!(report.nodes, 11);
        assert_eq!(report.edges, 10);
        assert_eq!(report.columns, 3);
        assert_eq!(report.crossings, Some(0));
    }
}
