use papyar_core::layout::Placement;
use papyar_engine::scene::OverlayRenderer;

/// 把文字面板打印到终端的渲染方，代替浏览器端的 A-Frame 场景。
/// 面板姿态沿用标记平面的约定：绕 x 轴翻转 -90 度放平，再按行
/// 倾角绕法线旋转；垂直留空加在 z 偏移上。
pub struct ConsoleRenderer {
    vertical_clearance: f64,
    panel_count: usize,
}

impl ConsoleRenderer {
    pub fn new(vertical_clearance: f64) -> Self {
        Self {
            vertical_clearance,
            panel_count: 0,
        }
    }
}

impl OverlayRenderer for ConsoleRenderer {
    fn clear(&mut self) {
        if self.panel_count > 0 {
            println!("(清空场景)");
        }
        self.panel_count = 0;
    }

    fn draw_text_box(&mut self, text: &str, placement: &Placement) {
        self.panel_count += 1;
        let preview: String = text.chars().take(24).collect();
        let ellipsis = if text.chars().count() > 24 { "…" } else { "" };
        println!(
            "  - 面板 #{}: 宽={:.4} 换行列数={} 位置=({:.4}, 0, {:.4}) 旋转=(-90, 0, {:.2}) 文本=\"{}{}\"",
            self.panel_count,
            placement.width,
            placement.wrap_columns,
            placement.offset_x,
            placement.offset_z + self.vertical_clearance,
            placement.rotation_deg,
            preview.replace('\n', " "),
            ellipsis
        );
    }
}
