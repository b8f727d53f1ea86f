#![windows_subsystem = "windows"]

use collatz_tree::style::{BACKGROUND, LABEL};
use collatz_tree::*;
use eframe::egui;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("CollatzViz"),
        ..Default::default()
    };
    eframe::run_native(
        "collatz-tree",
        options,
        Box::new(|_cc| Ok(Box::new(TreeApp::default()))),
    )
}

fn rgb(c: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(c[0], c[1], c[2])
}

// ─── データ構造 ─────────────────────────────────────

struct TreeApp {
    input: BoundInput,
    layout: LayoutResult,
    /// layout のワールド最大座標（再構築時のみ更新）
    world: (f64, f64),
    camera: Camera,
    node_count: usize,
    build_ms: u128,
}

impl Default for TreeApp {
    fn default() -> Self {
        let mut app = Self {
            input: BoundInput::default(),
            layout: LayoutResult::default(),
            world: (0.0, 0.0),
            camera: Camera::default(),
            node_count: 0,
            build_ms: 0,
        };
        app.rebuild(DEFAULT_BOUND);
        app
    }
}

impl TreeApp {
    /// 木とレイアウトを丸ごと作り直す（差分更新はしない）
    fn rebuild(&mut self, n: u64) {
        let timer = Instant::now();
        match build_tree(n) {
            Ok(tree) => {
                self.layout = compute_layout(&tree);
                self.world = self.layout.world_bounds();
                self.node_count = tree.len();
            }
            Err(e) => tracing::error!(%e, n, "failed to build tree"),
        }
        self.build_ms = timer.elapsed().as_millis();
    }

    // ─── ヘッダー ──────────────────────────────
    fn ui_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("CollatzViz");
            ui.separator();
            ui.colored_label(
                egui::Color32::GRAY,
                format!("{} nodes | {}ms | zoom {:.2}", self.node_count, self.build_ms, self.camera.scale),
            );
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut self.input.text)
                        .desired_width(72.0)
                        .font(egui::TextStyle::Monospace),
                );
                ui.label("max:");
                // Enter でもフォーカスが外れるので両方ここで拾える
                if resp.lost_focus() {
                    let before = self.input.current();
                    if let Some(n) = self.input.apply() {
                        if n != before {
                            self.rebuild(n);
                        }
                    }
                }
            });
        });
    }

    // ─── キャンバス ──────────────────────────────
    fn ui_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::drag());
        let rect = response.rect;
        let view = (rect.width() as f64, rect.height() as f64);

        if response.dragged() {
            let d = response.drag_delta();
            self.camera.pan(d.x as f64, d.y as f64);
        }
        if response.hovered() {
            let (scroll, zoom_modifier, pointer) = ui.input(|i| {
                (
                    i.raw_scroll_delta,
                    i.modifiers.ctrl || i.modifiers.command,
                    i.pointer.hover_pos(),
                )
            });
            if scroll != egui::Vec2::ZERO {
                if zoom_modifier {
                    if let Some(p) = pointer {
                        let local = p - rect.min;
                        self.camera.zoom_at(local.x as f64, local.y as f64, scroll.y > 0.0);
                    }
                } else {
                    self.camera.scroll(-scroll.x as f64, -scroll.y as f64);
                }
            }
        }
        if ui.input(|i| i.key_pressed(egui::Key::Home)) {
            self.camera = Camera::default();
        }
        self.camera.clamp_offset(self.world, view);

        let cam = self.camera;
        let to_screen = |x: f64, y: f64| {
            let (sx, sy) = cam.to_screen(x, y);
            egui::pos2(rect.min.x + sx as f32, rect.min.y + sy as f32)
        };
        let visible = cam.visible_world(view);

        // 辺
        let stroke_width = (cam.line_width() * cam.scale) as f32;
        for edge in &self.layout.edges {
            let (a, b) = self.layout.endpoints(edge);
            if !visible.overlaps_segment(a, b) {
                continue;
            }
            painter.line_segment(
                [to_screen(a.x, a.y), to_screen(b.x, b.y)],
                egui::Stroke::new(stroke_width, rgb(Style::of_edge(edge).edge_color())),
            );
        }

        // ノード
        let radius = cam.node_radius();
        for n in &self.layout.nodes {
            if !visible.contains_node(n, radius) {
                continue;
            }
            painter.circle_filled(
                to_screen(n.x, n.y),
                (radius * cam.scale) as f32,
                rgb(Style::of_node(n).node_color()),
            );
        }

        // ラベル: 拡大率に応じて重要なノードから順に表示
        let density = cam.label_density();
        if density == LabelDensity::Hidden {
            return;
        }
        let font = egui::FontId::monospace((cam.font_size() * cam.scale) as f32);
        let label_offset = ((radius + 4.0) * cam.scale) as f32;
        for n in &self.layout.nodes {
            if !density.shows(n) || !visible.contains_label(n) {
                continue;
            }
            painter.text(
                to_screen(n.x, n.y) - egui::vec2(label_offset, 0.0),
                egui::Align2::RIGHT_CENTER,
                n.value.to_string(),
                font.clone(),
                rgb(LABEL),
            );
        }
    }
}

impl eframe::App for TreeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| self.ui_header(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(rgb(BACKGROUND)).inner_margin(0.0))
            .show(ctx, |ui| self.ui_canvas(ui));
    }
}
