use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use num_integer::Integer;
use num_traits::PrimInt;

use crate::error::BoundError;

/// アリーナ内のノード位置。根は常に [`CollatzTree::ROOT`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// 逆コラッツ木の1ノード。
/// 子は所有ハンドル（アリーナのインデックス）で持ち、親への逆参照は持たない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollatzNode {
    pub value: u64,
    /// 2n
    pub even_child: Option<NodeId>,
    /// (n-1)/3（奇数・1より大・上限以内のときのみ）
    pub odd_child: Option<NodeId>,
}

impl CollatzNode {
    fn new(value: u64) -> Self {
        CollatzNode {
            value,
            even_child: None,
            odd_child: None,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.even_child.is_none() && self.odd_child.is_none()
    }

    /// 偶数子 → 奇数子 の順に子を列挙
    pub fn children(&self) -> impl Iterator<Item = NodeId> {
        self.even_child.into_iter().chain(self.odd_child)
    }
}

/// 上限 N で打ち切った逆コラッツ木（根 = 1）。
///
/// ノードは幅優先の生成順にアリーナへ格納される。子のインデックスは
/// 常に親より大きい。構築後は不変で、N が変わったら丸ごと作り直す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollatzTree {
    nodes: Vec<CollatzNode>,
    /// 値 → ノード（訪問済み集合を兼ねる）
    index: HashMap<u64, NodeId>,
    max: u64,
    trunk_max: u64,
}

/// 木の概要（CLI 表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSummary {
    pub nodes: usize,
    pub trunk_len: usize,
    pub trunk_max: u64,
    pub leaves: usize,
    pub odd_branches: usize,
    /// 根からの最大辺数
    pub depth: usize,
}

impl CollatzTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn root(&self) -> &CollatzNode {
        &self.nodes[Self::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &CollatzNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, value: u64) -> Option<&CollatzNode> {
        self.index.get(&value).map(|&id| self.node(id))
    }

    pub fn id_of(&self, value: u64) -> Option<NodeId> {
        self.index.get(&value).copied()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.index.contains_key(&value)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 構築時の上限 N
    pub fn max(&self) -> u64 {
        self.max
    }

    /// N を超える最小の2の冪（幹の到達点）
    pub fn trunk_max(&self) -> u64 {
        self.trunk_max
    }

    /// 幅優先の生成順でノードを列挙
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NodeId, &CollatzNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.nodes.iter().map(|n| n.value)
    }

    /// 根から偶数子をたどった2の冪の列（幹）
    pub fn trunk(&self) -> Vec<u64> {
        let mut trunk = Vec::new();
        let mut cur = Some(Self::ROOT);
        while let Some(id) = cur {
            let node = self.node(id);
            if !is_power_of_two(node.value) {
                break;
            }
            trunk.push(node.value);
            cur = node.even_child;
        }
        trunk
    }

    pub fn summary(&self) -> TreeSummary {
        // 子は親より後ろに格納されているので、先頭から一度なめれば深さが確定する
        let mut depth = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        let mut leaves = 0;
        let mut odd_branches = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                leaves += 1;
            }
            if node.odd_child.is_some() {
                odd_branches += 1;
            }
            for child in node.children() {
                depth[child.0] = depth[i] + 1;
                max_depth = max_depth.max(depth[child.0]);
            }
        }
        TreeSummary {
            nodes: self.nodes.len(),
            trunk_len: self.trunk().len(),
            trunk_max: self.trunk_max,
            leaves,
            odd_branches,
            depth: max_depth,
        }
    }

    /// 検査関数のテスト用に、構築済みの木を壊すための入口
    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut [CollatzNode] {
        &mut self.nodes
    }

    /// 未訪問なら新ノードを作って返す。訪問済みなら None。
    fn insert(&mut self, value: u64) -> Option<NodeId> {
        match self.index.entry(value) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let id = NodeId(self.nodes.len());
                self.nodes.push(CollatzNode::new(value));
                slot.insert(id);
                Some(id)
            }
        }
    }
}

#[inline]
pub fn is_power_of_two<T: PrimInt>(n: T) -> bool {
    n > T::zero() && (n & (n - T::one())) == T::zero()
}

/// max を厳密に超える最小の2の冪。u64 に収まらなければ None。
pub fn trunk_max(max: u64) -> Option<u64> {
    max.checked_add(1)?.checked_next_power_of_two()
}

/// n の奇数子 (n-1)/3。割り切れ、1より大きい奇数で、max 以内のときのみ Some。
pub fn odd_child_value(n: u64, max: u64) -> Option<u64> {
    if n == 0 {
        return None;
    }
    let (q, r) = (n - 1).div_rem(&3);
    (r == 0 && q > 1 && q.is_odd() && q <= max).then_some(q)
}

/// 上限 max の逆コラッツ木を幅優先で構築する。
///
/// - 偶数子 2n: n が2の冪なら trunk_max まで、それ以外は max まで
/// - 奇数子 (n-1)/3: n <= max のノードからのみ（延長した幹の先端からは分岐しない）
///
/// 各辺で値は単調増加し trunk_max で頭打ちになるので必ず停止する。
pub fn build_tree(max: u64) -> Result<CollatzTree, BoundError> {
    if max == 0 {
        return Err(BoundError::NonPositive);
    }
    let trunk_max = trunk_max(max).ok_or(BoundError::TooLarge { max })?;

    let mut tree = CollatzTree {
        nodes: vec![CollatzNode::new(1)],
        index: HashMap::from([(1, CollatzTree::ROOT)]),
        max,
        trunk_max,
    };
    let mut queue = VecDeque::from([CollatzTree::ROOT]);

    while let Some(id) = queue.pop_front() {
        let n = tree.nodes[id.0].value;

        let even_limit = if is_power_of_two(n) { trunk_max } else { max };
        if let Some(even) = n.checked_mul(2).filter(|&e| e <= even_limit) {
            if let Some(child) = tree.insert(even) {
                tree.nodes[id.0].even_child = Some(child);
                queue.push_back(child);
            }
        }

        if n > max {
            continue;
        }
        if let Some(odd) = odd_child_value(n, max) {
            if let Some(child) = tree.insert(odd) {
                tree.nodes[id.0].odd_child = Some(child);
                queue.push_back(child);
            }
        }
    }

    tracing::debug!(max, trunk_max, nodes = tree.len(), "built inverse-Collatz tree");
    Ok(tree)
}
