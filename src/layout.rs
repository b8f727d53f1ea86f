use crate::error::LayoutConfigError;
use crate::tree::{is_power_of_two, CollatzTree, NodeId};

/// レイアウトの表示定数。アルゴリズムの不変条件には関与しない。
///
/// 値は [`LayoutConfig::new`] で検証してから作る。フィールドは直接書き換えられない。
///
/// ```compile_fail
/// let cfg = collatz_tree::LayoutConfig { diagonal_ratio: 2.5, ..Default::default() };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// 1列あたりの x 幅
    h_spacing: f64,
    /// 値 → 縦方向距離の倍率
    v_scale: f64,
    /// 奇数枝の縦落差を偶数枝に対して何倍にするか（< 1 で浅い斜線になる）
    diagonal_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            h_spacing: 80.0,
            v_scale: 1.0,
            diagonal_ratio: 0.3,
        }
    }
}

impl LayoutConfig {
    pub fn new(h_spacing: f64, v_scale: f64, diagonal_ratio: f64) -> Result<Self, LayoutConfigError> {
        if !(h_spacing.is_finite() && h_spacing > 0.0) {
            return Err(LayoutConfigError::Spacing(h_spacing));
        }
        if !(v_scale.is_finite() && v_scale > 0.0) {
            return Err(LayoutConfigError::VerticalScale(v_scale));
        }
        if !(diagonal_ratio > 0.0 && diagonal_ratio < 1.0) {
            return Err(LayoutConfigError::DiagonalRatio(diagonal_ratio));
        }
        Ok(LayoutConfig {
            h_spacing,
            v_scale,
            diagonal_ratio,
        })
    }

    pub fn h_spacing(&self) -> f64 {
        self.h_spacing
    }

    pub fn v_scale(&self) -> f64 {
        self.v_scale
    }

    /// 開区間 (0, 1)
    pub fn diagonal_ratio(&self) -> f64 {
        self.diagonal_ratio
    }
}

/// 1ノードの配置結果
#[derive(Debug, Clone, PartialEq)]
pub struct NodePosition {
    pub value: u64,
    pub column: u32,
    pub x: f64,
    pub y: f64,
    /// 値が2の冪（幹上）
    pub is_trunk: bool,
    /// 子を持たない
    pub is_leaf: bool,
    pub has_odd_child: bool,
    /// 奇数枝の辺で到達したノード
    pub is_odd_child: bool,
}

/// 親 → 子 の辺。端点は [`LayoutResult::nodes`] のインデックス。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub is_trunk: bool,
    /// 葉で終わる奇数枝
    pub is_leaf: bool,
}

/// 描画側に渡す唯一のデータ。生成後は読み取り専用。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutResult {
    /// 深さ優先の前順（偶数子の部分木 → 奇数子の部分木）
    pub nodes: Vec<NodePosition>,
    /// 子の部分木を配置し終えた順
    pub edges: Vec<Edge>,
}

impl LayoutResult {
    pub fn endpoints(&self, edge: &Edge) -> (&NodePosition, &NodePosition) {
        (&self.nodes[edge.from], &self.nodes[edge.to])
    }

    /// ワールド座標の最大 (x, y)。原点は根。
    pub fn world_bounds(&self) -> (f64, f64) {
        self.nodes
            .iter()
            .fold((0.0f64, 0.0f64), |(mx, my), n| (mx.max(n.x), my.max(n.y)))
    }

    /// 使用した列数
    pub fn column_count(&self) -> u32 {
        self.nodes.iter().map(|n| n.column + 1).max().unwrap_or(0)
    }
}

pub fn compute_layout(tree: &CollatzTree) -> LayoutResult {
    compute_layout_with(tree, &LayoutConfig::default())
}

/// 深さ優先で列と y 座標を割り当てる。
///
/// 偶数子を先に、奇数子を後に訪問する。偶数子は親と同じ列を継ぎ、その部分木が
/// 必要な列をすべて確保してから、奇数子に次の空き列が割り当てられる。
/// したがって深い枝ほど小さい列番号を持ち、浅い枝の斜線は深い枝の y 範囲より
/// 上を通るため、辺の交差は生じない。順序を入れ替えるとこの保証は崩れる。
pub fn compute_layout_with(tree: &CollatzTree, config: &LayoutConfig) -> LayoutResult {
    let mut placer = Placer {
        tree,
        config,
        out: LayoutResult {
            nodes: Vec::with_capacity(tree.len()),
            edges: Vec::with_capacity(tree.len().saturating_sub(1)),
        },
    };
    // 根は列0、最初の奇数枝は列1から
    placer.place(CollatzTree::ROOT, 0, 0.0, false, 1);
    let out = placer.out;

    tracing::debug!(
        nodes = out.nodes.len(),
        edges = out.edges.len(),
        columns = out.column_count(),
        "computed column layout"
    );
    out
}

struct Placer<'a> {
    tree: &'a CollatzTree,
    config: &'a LayoutConfig,
    out: LayoutResult,
}

impl Placer<'_> {
    /// id を (col, y) に置き、部分木を配置する。
    /// 戻り値: (配置したノードのインデックス, 部分木配置後の次の空き列)
    fn place(&mut self, id: NodeId, col: u32, y: f64, is_odd_child: bool, next_col: u32) -> (usize, u32) {
        let tree = self.tree;
        let node = tree.node(id);
        let is_trunk = is_power_of_two(node.value);
        let drop = node.value as f64 * self.config.v_scale;

        let idx = self.out.nodes.len();
        self.out.nodes.push(NodePosition {
            value: node.value,
            column: col,
            x: col as f64 * self.config.h_spacing,
            y,
            is_trunk,
            is_leaf: node.is_leaf(),
            has_odd_child: node.odd_child.is_some(),
            is_odd_child,
        });

        let mut available = next_col;

        if let Some(even) = node.even_child {
            let (even_idx, c) = self.place(even, col, y + drop, false, available);
            available = c;
            self.out.edges.push(Edge {
                from: idx,
                to: even_idx,
                is_trunk: is_trunk && self.out.nodes[even_idx].is_trunk,
                is_leaf: false,
            });
        }

        if let Some(odd) = node.odd_child {
            let odd_col = available;
            let (odd_idx, c) = self.place(odd, odd_col, y + drop * self.config.diagonal_ratio, true, odd_col + 1);
            available = c;
            self.out.edges.push(Edge {
                from: idx,
                to: odd_idx,
                is_trunk: false,
                is_leaf: self.out.nodes[odd_idx].is_leaf,
            });
        }

        (idx, available)
    }
}
