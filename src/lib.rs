//! 上限付き逆コラッツ木と、交差のない列レイアウト
//!
//! 根を 1 とし、各ノード n に偶数子 2n と（条件を満たせば）奇数子 (n-1)/3 をつないだ
//! 木を上限 N まで構築し、ズーム可能な描画向けに2次元配置する。
//!
//! 処理は一方向: 上限 N → [`build_tree`] → [`compute_layout`] → [`LayoutResult`]。
//! レイアウトは偶数子を先に深さ優先でたどり、深い枝ほど小さい列番号を確保するので
//! 辺の交差が構造上生じない。

pub mod bound;
pub mod camera;
pub mod error;
pub mod layout;
pub mod style;
pub mod tree;
pub mod verify;

pub use bound::{clamp_bound, parse_bound, BoundInput, DEFAULT_BOUND, MAX_BOUND, MIN_BOUND};
pub use camera::{Camera, LabelDensity, ViewRect};
pub use error::{BoundError, LayoutConfigError};
pub use layout::{compute_layout, compute_layout_with, Edge, LayoutConfig, LayoutResult, NodePosition};
pub use style::Style;
pub use tree::{build_tree, is_power_of_two, odd_child_value, trunk_max, CollatzNode, CollatzTree, NodeId, TreeSummary};
pub use verify::{check_layout, check_tree, count_crossings, verify_bound, verify_range_parallel, BoundReport, VerifyResult, Violation};
