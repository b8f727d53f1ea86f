use crate::layout::{Edge, NodePosition};

/// ノード・辺の3種類の描画スタイル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// 2の冪の幹
    Trunk,
    /// 葉（辺の場合は葉で終わる奇数枝）
    Leaf,
    Branch,
}

pub const BACKGROUND: [u8; 3] = [0x11, 0x11, 0x11];
pub const LABEL: [u8; 3] = [0x99, 0x99, 0x99];

impl Style {
    pub fn of_node(n: &NodePosition) -> Self {
        Self::from_flags(n.is_trunk, n.is_leaf)
    }

    pub fn of_edge(e: &Edge) -> Self {
        Self::from_flags(e.is_trunk, e.is_leaf)
    }

    // 幹が葉より優先
    fn from_flags(is_trunk: bool, is_leaf: bool) -> Self {
        if is_trunk {
            Style::Trunk
        } else if is_leaf {
            Style::Leaf
        } else {
            Style::Branch
        }
    }

    pub fn node_color(self) -> [u8; 3] {
        match self {
            Style::Trunk => [0xc9, 0xa9, 0x6e],
            Style::Leaf => [0x7e, 0xc4, 0x88],
            Style::Branch => [0x4a, 0x9e, 0xbb],
        }
    }

    pub fn edge_color(self) -> [u8; 3] {
        match self {
            Style::Trunk => [0xa0, 0x80, 0x50],
            Style::Leaf => [0x5e, 0xa0, 0x68],
            Style::Branch => [0x3a, 0x7e, 0x99],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_tree, compute_layout};

    #[test]
    fn test_styles_from_layout() {
        let layout = compute_layout(&build_tree(16).unwrap());
        let style_of = |v: u64| Style::of_node(layout.nodes.iter().find(|n| n.value == v).unwrap());
        assert_eq!(style_of(32), Style::Trunk); // 幹の葉は幹扱い
        assert_eq!(style_of(12), Style::Leaf);
        assert_eq!(style_of(5), Style::Branch);

        let trunk_edges = layout.edges.iter().filter(|e| Style::of_edge(e) == Style::Trunk).count();
        assert_eq!(trunk_edges, 5);
    }
}
