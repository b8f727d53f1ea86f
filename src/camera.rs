//! 描画側のビューポート状態（パン・ズーム・可視判定・ラベル密度）。
//!
//! GUI ツールキットには依存しない。[`LayoutResult`](crate::LayoutResult) を
//! 読むだけで、木やレイアウトには一切書き戻さない。座標系は
//! `screen = offset + world * scale`。

use crate::layout::NodePosition;

/// ワールド矩形の周囲に確保する余白（スクリーン座標）
pub const PADDING: f64 = 40.0;
pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 20.0;
/// ホイール1刻みあたりの拡大率
pub const ZOOM_STEP: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            offset_x: PADDING,
            offset_y: PADDING,
            scale: 1.0,
        }
    }
}

/// 可視領域（ワールド座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl ViewRect {
    /// 線分の外接矩形が可視領域と重なるか
    pub fn overlaps_segment(&self, a: &NodePosition, b: &NodePosition) -> bool {
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        !(max_x < self.left || min_x > self.right || max_y < self.top || min_y > self.bottom)
    }

    pub fn contains_node(&self, n: &NodePosition, radius: f64) -> bool {
        n.x >= self.left - radius
            && n.x <= self.right + radius
            && n.y >= self.top - radius
            && n.y <= self.bottom + radius
    }

    /// ラベルはノードの左側に描くので、左に広めの余裕を取る
    pub fn contains_label(&self, n: &NodePosition) -> bool {
        n.x >= self.left - 60.0 && n.x <= self.right + 10.0 && n.y >= self.top - 10.0 && n.y <= self.bottom + 10.0
    }
}

/// 拡大率に応じたラベル表示の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDensity {
    /// ラベルなし
    Hidden,
    /// 奇数子を持つ分岐点のみ
    Branching,
    /// 分岐点と奇数枝の先
    Odd,
    All,
}

impl LabelDensity {
    pub fn for_scale(scale: f64) -> Self {
        if scale <= 0.7 {
            LabelDensity::Hidden
        } else if scale <= 1.5 {
            LabelDensity::Branching
        } else if scale <= 3.0 {
            LabelDensity::Odd
        } else {
            LabelDensity::All
        }
    }

    pub fn shows(self, n: &NodePosition) -> bool {
        match self {
            LabelDensity::Hidden => false,
            LabelDensity::Branching => n.has_odd_child,
            LabelDensity::Odd => n.has_odd_child || n.is_odd_child,
            LabelDensity::All => true,
        }
    }
}

impl Camera {
    /// world = ワールドの最大 (x, y)、view = ビューの (幅, 高さ)。
    /// ワールドがビューより小さい方向は左上の余白位置に固定される。
    pub fn clamp_offset(&mut self, world: (f64, f64), view: (f64, f64)) {
        let (max_x, max_y) = world;
        let (w, h) = view;
        let min_ox = PADDING.min(w - PADDING - max_x * self.scale);
        let min_oy = PADDING.min(h - PADDING - max_y * self.scale);
        self.offset_x = self.offset_x.clamp(min_ox, PADDING);
        self.offset_y = self.offset_y.clamp(min_oy, PADDING);
    }

    /// ドラッグによる移動
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// 修飾キーなしのホイール（スクロール）
    pub fn scroll(&mut self, delta_x: f64, delta_y: f64) {
        self.offset_x -= delta_x;
        self.offset_y -= delta_y;
    }

    /// カーソル位置 (スクリーン座標) のワールド点を固定したまま1段ズームする
    pub fn zoom_at(&mut self, mouse_x: f64, mouse_y: f64, zoom_in: bool) {
        let factor = if zoom_in { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let k = new_scale / self.scale;
        self.offset_x = mouse_x - (mouse_x - self.offset_x) * k;
        self.offset_y = mouse_y - (mouse_y - self.offset_y) * k;
        self.scale = new_scale;
    }

    pub fn visible_world(&self, view: (f64, f64)) -> ViewRect {
        let (w, h) = view;
        ViewRect {
            left: -self.offset_x / self.scale,
            top: -self.offset_y / self.scale,
            right: (w - self.offset_x) / self.scale,
            bottom: (h - self.offset_y) / self.scale,
        }
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (self.offset_x + x * self.scale, self.offset_y + y * self.scale)
    }

    // 以下はワールド単位。縮小時もスクリーン上で一定以上の大きさを保つ

    pub fn node_radius(&self) -> f64 {
        (5.0 / self.scale).max(3.0)
    }

    pub fn font_size(&self) -> f64 {
        (12.0 / self.scale).max(10.0)
    }

    pub fn line_width(&self) -> f64 {
        2.0 / self.scale
    }

    pub fn label_density(&self) -> LabelDensity {
        LabelDensity::for_scale(self.scale)
    }
}
