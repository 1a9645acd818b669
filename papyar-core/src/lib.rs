pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示，用于描述被跟踪标记的世界坐标。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }

        /// 两点之间的欧氏距离。采样循环用它把两个标记位置换算成参考距离。
        #[inline]
        pub fn distance_to(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn distance_is_euclidean() {
            let a = Point3::new(0.0, 0.0, 0.0);
            let b = Point3::new(3.0, 4.0, 0.0);
            assert!((a.distance_to(b) - 5.0).abs() < 1e-12);
            assert!((b.distance_to(a) - 5.0).abs() < 1e-12);
            assert!(a.distance_to(a).abs() < f64::EPSILON);
        }
    }
}

pub mod layout {
    use serde::{Deserialize, Serialize};

    /// 扫描件里一行文字下方的基线线段，坐标为源页面像素，y 轴向下。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Baseline {
        pub x0: f64,
        pub y0: f64,
        pub x1: f64,
        pub y1: f64,
    }

    impl Baseline {
        #[inline]
        pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
            Self { x0, y0, x1, y1 }
        }

        #[inline]
        pub fn center_x(self) -> f64 {
            (self.x0 + self.x1) / 2.0
        }

        #[inline]
        pub fn center_y(self) -> f64 {
            (self.y0 + self.y1) / 2.0
        }

        /// 由基线斜率推导行倾角（度）。源图像 y 轴向下，
        /// 基线从左到右上升（y 递减）时返回正角度，与投影到水平
        /// 标记面后的旋转轴一致。采用双参数 atan2，垂直基线不会
        /// 除零；结果折叠到 `(-90, 90]`。
        pub fn angle_deg(self) -> f64 {
            let raw = -((self.y1 - self.y0).atan2(self.x1 - self.x0)).to_degrees();
            fold_angle_deg(raw)
        }
    }

    /// 把角度折叠到 `(-90, 90]`。基线是无方向线段，相差 180°
    /// 的两个走向属于同一倾角，垂直基线因此恒为 90。
    fn fold_angle_deg(angle: f64) -> f64 {
        if angle > 90.0 {
            angle - 180.0
        } else if angle <= -90.0 {
            angle + 180.0
        } else {
            angle
        }
    }

    /// 一行文字的版面几何（源页面像素空间）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct LineLayout {
        pub width: f64,
        pub center_x: f64,
        pub center_y: f64,
        pub angle_deg: f64,
    }

    impl LineLayout {
        /// 由行宽与基线构造一条行记录。
        pub fn from_baseline(width: f64, baseline: Baseline) -> Self {
            Self {
                width,
                center_x: baseline.center_x(),
                center_y: baseline.center_y(),
                angle_deg: baseline.angle_deg(),
            }
        }
    }

    /// 整页版面：页宽、页高与按文档顺序排列的行记录。
    /// 行顺序有意义，下游按下标与转写行配对。提取完成后不再修改。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PageLayout {
        pub page_width: f64,
        pub page_height: f64,
        pub lines: Vec<LineLayout>,
    }

    impl PageLayout {
        pub fn new(page_width: f64, page_height: f64, lines: Vec<LineLayout>) -> Self {
            Self {
                page_width,
                page_height,
                lines,
            }
        }
    }

    /// 单个文字面板的最终摆放参数。全部为派生值，参考距离每次
    /// 变化时整表重算，绝不原地修改。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Placement {
        pub width: f64,
        pub wrap_columns: u32,
        pub offset_x: f64,
        pub offset_z: f64,
        pub rotation_deg: f64,
    }

}

pub mod projector {
    use crate::layout::{PageLayout, Placement};

    /// 元数据面板在参考距离之外额外占用的宽度。
    const META_PANEL_EXTRA_WIDTH: f64 = 4.0;
    /// 元数据面板沿标记平面向前的固定偏移。
    const META_PANEL_FORWARD_OFFSET: f64 = 2.5;

    /// 把整页行版面与当前参考距离映射为各行文字面板的摆放参数。
    ///
    /// 纯函数：相同输入产生逐位相同的输出，不做任何 I/O，也不报错。
    /// 行与转写文本按下标配对，配对止于较短一侧（截断而非错误）。
    /// 零行的版面产生空列表。
    pub fn project(
        page: &PageLayout,
        transcriptions: &[String],
        reference_distance: f64,
    ) -> Vec<Placement> {
        let paired = page.lines.len().min(transcriptions.len());
        let width_ratio = reference_distance / page.page_width;
        // 高度按与宽度相同的线性比例缩放，保持页面纵横比。
        let height_ratio =
            (page.page_height / page.page_width) * reference_distance / page.page_height;

        // 一次线性扫描找出最长的转写行及其源宽度，等长时先出现者胜出。
        let mut max_len = 0usize;
        let mut max_len_width = 0.0f64;
        for index in 0..paired {
            let len = transcriptions[index].chars().count();
            if len > max_len {
                max_len = len;
                max_len_width = page.lines[index].width;
            }
        }

        let mut placements = Vec::with_capacity(paired);
        for index in 0..paired {
            let line = &page.lines[index];
            let own_len = transcriptions[index].chars().count() as u32;
            let scaled_columns = if max_len_width > 0.0 {
                (line.width * (max_len as f64 / max_len_width)).round() as u32
            } else {
                0
            };
            placements.push(Placement {
                width: line.width * width_ratio,
                wrap_columns: scaled_columns.max(own_len),
                // 页面右缘锚定在跟踪原点，参考距离增大时向左延伸。
                offset_x: line.center_x * width_ratio - reference_distance,
                offset_z: line.center_y * height_ratio,
                rotation_deg: line.angle_deg,
            });
        }
        placements
    }

    /// 由元数据键值对构造单个合并面板：正文以 `<META>` 开头，每个
    /// 字段一行 `key: value`，行间留空行。面板宽度为参考距离加固定
    /// 余量，换行列数取最长一行的字符数。空字段列表返回 `None`。
    pub fn metadata_panel(
        fields: &[(String, String)],
        reference_distance: f64,
    ) -> Option<(String, Placement)> {
        if fields.is_empty() {
            return None;
        }
        let mut text = String::from("<META>\n\n");
        let mut max_len = 0usize;
        for (key, value) in fields {
            let line = format!("{key}: {value}");
            max_len = max_len.max(line.chars().count());
            text.push_str(&line);
            text.push_str("\n\n");
        }
        let placement = Placement {
            width: reference_distance + META_PANEL_EXTRA_WIDTH,
            wrap_columns: max_len as u32,
            offset_x: -(reference_distance / 2.0),
            offset_z: META_PANEL_FORWARD_OFFSET,
            rotation_deg: 0.0,
        };
        Some((text, placement))
    }

}
