pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("scene is already loaded, call reset() before loading again")]
        AlreadyLoaded,
        #[error("there is no scene to update")]
        NotLoaded,
    }
}

pub mod scale {
    use tracing::trace;

    /// 两个被跟踪标记之间的实时参考距离。由外部采样节拍驱动，
    /// 场景里所有覆盖层几何都按它缩放。
    #[derive(Debug, Clone, Copy)]
    pub struct ScaleModel {
        reference_distance: f64,
    }

    impl ScaleModel {
        pub const DEFAULT_DISTANCE: f64 = 1.0;

        pub fn new() -> Self {
            Self {
                reference_distance: Self::DEFAULT_DISTANCE,
            }
        }

        #[inline]
        pub fn reference_distance(&self) -> f64 {
            self.reference_distance
        }

        /// 接受一次距离采样。返回 `true` 表示值已存储、订阅方需要
        /// 同步重建场景。非有限或非正的采样是跟踪信号的瞬时噪声，
        /// 静默忽略。与当前值相同时也不触发更新；脏检查用精确的
        /// 浮点相等，换成容差比较只会改变更新频率，不影响正确性。
        #[must_use]
        pub fn set_distance(&mut self, new_distance: f64) -> bool {
            if !new_distance.is_finite() || new_distance <= 0.0 {
                trace!(value = new_distance, "忽略不可用的距离采样");
                return false;
            }
            if new_distance == self.reference_distance {
                return false;
            }
            self.reference_distance = new_distance;
            true
        }
    }

    impl Default for ScaleModel {
        fn default() -> Self {
            Self::new()
        }
    }

}

pub mod scene {
    use papyar_core::geometry::Point3;
    use papyar_core::layout::{PageLayout, Placement};
    use papyar_core::projector;
    use tracing::{debug, warn};

    use crate::errors::EngineError;
    use crate::scale::ScaleModel;

    /// 渲染协作方的窄接口。场景每次重建都整表重画：先 `clear`，
    /// 再为每个面板调用一次 `draw_text_box`。重画量以文档行数为
    /// 上界，不做增量比对。
    pub trait OverlayRenderer {
        fn clear(&mut self);
        fn draw_text_box(&mut self, text: &str, placement: &Placement);
    }

    /// 当前展示的数据集：元数据面板或逐行转写覆盖层。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DisplayMode {
        Metadata,
        Transcription,
    }

    impl Default for DisplayMode {
        fn default() -> Self {
            DisplayMode::Metadata
        }
    }

    /// 行版面与转写文本，按下标配对。两边长度允许不一致，
    /// 较长一侧多出的条目在投影时被忽略。
    #[derive(Debug, Clone)]
    pub struct TranscriptionSet {
        pub page: PageLayout,
        pub lines: Vec<String>,
    }

    /// 一次会话展示的完整文档。
    #[derive(Debug, Clone)]
    pub struct SceneDocument {
        pub metadata: Vec<(String, String)>,
        pub transcription: Option<TranscriptionSet>,
    }

    /// 场景状态：持有当前文档、展示模式与最近一次重建的摆放表。
    #[derive(Debug, Default)]
    pub struct SceneState {
        document: Option<SceneDocument>,
        display_mode: DisplayMode,
        placements: Vec<Placement>,
    }

    impl SceneState {
        pub fn new() -> Self {
            Self::default()
        }

        #[inline]
        pub fn is_loaded(&self) -> bool {
            self.document.is_some()
        }

        #[inline]
        pub fn document(&self) -> Option<&SceneDocument> {
            self.document.as_ref()
        }

        #[inline]
        pub fn display_mode(&self) -> DisplayMode {
            self.display_mode
        }

        /// 最近一次重建产出的摆放表。重建是整表替换，读取方不会
        /// 看到半更新的状态。
        #[inline]
        pub fn placements(&self) -> &[Placement] {
            &self.placements
        }

        /// 装入文档。会话里已有文档时拒绝，必须先 `reset()`。
        pub fn load(&mut self, document: SceneDocument) -> Result<(), EngineError> {
            if self.document.is_some() {
                return Err(EngineError::AlreadyLoaded);
            }
            self.display_mode = DisplayMode::Metadata;
            self.document = Some(document);
            Ok(())
        }

        /// 清空会话，之后允许再次 `load`。
        pub fn reset(&mut self) {
            self.document = None;
            self.display_mode = DisplayMode::Metadata;
            self.placements.clear();
        }

        /// 切换展示模式，返回是否发生变化。没有转写数据时无法
        /// 切到转写模式，保持元数据展示。
        pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
            if mode == self.display_mode {
                return false;
            }
            if mode == DisplayMode::Transcription {
                let has_transcription = self
                    .document
                    .as_ref()
                    .is_some_and(|document| document.transcription.is_some());
                if !has_transcription {
                    warn!("没有转写数据，保持元数据展示");
                    return false;
                }
            }
            self.display_mode = mode;
            true
        }

        /// 按当前模式重算全部面板，原子地替换摆放表，然后驱动
        /// 渲染方清空重画。
        pub fn rebuild(
            &mut self,
            reference_distance: f64,
            renderer: &mut dyn OverlayRenderer,
        ) -> Result<(), EngineError> {
            let Some(document) = &self.document else {
                return Err(EngineError::NotLoaded);
            };

            // 先算完整张新表，再一次性替换旧表。
            let mut panels: Vec<(String, Placement)> = Vec::new();
            match self.display_mode {
                DisplayMode::Metadata => {
                    if let Some(panel) =
                        projector::metadata_panel(&document.metadata, reference_distance)
                    {
                        panels.push(panel);
                    }
                }
                DisplayMode::Transcription => {
                    if let Some(set) = &document.transcription {
                        let placements =
                            projector::project(&set.page, &set.lines, reference_distance);
                        panels = placements
                            .into_iter()
                            .zip(&set.lines)
                            .map(|(placement, line)| (line.clone(), placement))
                            .collect();
                    }
                }
            }
            self.placements = panels
                .iter()
                .map(|(_, placement)| placement.clone())
                .collect();

            renderer.clear();
            for (text, placement) in &panels {
                renderer.draw_text_box(text, placement);
            }
            debug!(panel_count = panels.len(), reference_distance, "场景已重建");
            Ok(())
        }
    }

    /// 会话句柄：持有比例模型、场景状态与渲染方，生命周期与一次
    /// 文档展示一致。它是比例模型唯一的订阅者，每次被接受的距离
    /// 更新都同步触发一次场景重建。
    pub struct Session<R: OverlayRenderer> {
        scale: ScaleModel,
        state: SceneState,
        renderer: R,
    }

    impl<R: OverlayRenderer> Session<R> {
        pub fn new(renderer: R) -> Self {
            Self {
                scale: ScaleModel::new(),
                state: SceneState::new(),
                renderer,
            }
        }

        #[inline]
        pub fn reference_distance(&self) -> f64 {
            self.scale.reference_distance()
        }

        #[inline]
        pub fn state(&self) -> &SceneState {
            &self.state
        }

        #[inline]
        pub fn renderer(&self) -> &R {
            &self.renderer
        }

        /// 装入文档并立即做首次构建，元数据面板不必等第一次距离
        /// 更新就可见。
        pub fn load(&mut self, document: SceneDocument) -> Result<(), EngineError> {
            self.state.load(document)?;
            debug!("文档已装入会话");
            self.state
                .rebuild(self.scale.reference_distance(), &mut self.renderer)
        }

        /// 清空会话并让渲染方清屏，参考距离回到默认值。之后可以
        /// 再次 `load`。
        pub fn reset(&mut self) {
            self.state.reset();
            self.scale = ScaleModel::new();
            self.renderer.clear();
        }

        /// 切换展示模式；发生变化时重建场景。
        pub fn set_display_mode(&mut self, mode: DisplayMode) -> Result<bool, EngineError> {
            if !self.state.set_display_mode(mode) {
                return Ok(false);
            }
            self.state
                .rebuild(self.scale.reference_distance(), &mut self.renderer)?;
            Ok(true)
        }

        /// 距离更新入口。未加载文档时报错且不存储采样；被比例模型
        /// 拒绝的采样返回 `Ok(false)`，零次重建。
        pub fn set_distance(&mut self, distance: f64) -> Result<bool, EngineError> {
            if !self.state.is_loaded() {
                return Err(EngineError::NotLoaded);
            }
            if !self.scale.set_distance(distance) {
                return Ok(false);
            }
            self.state
                .rebuild(self.scale.reference_distance(), &mut self.renderer)?;
            Ok(true)
        }

        /// 一次采样节拍：读取两个锚点的位置与可见性，双方都可见时
        /// 才把欧氏距离送进比例模型。节拍可以被跳过或合并，投影
        /// 对给定距离是纯函数，不影响正确性。
        pub fn observe_anchors(
            &mut self,
            data_anchor: Point3,
            calibration_anchor: Point3,
            data_visible: bool,
            calibration_visible: bool,
        ) -> Result<bool, EngineError> {
            if !data_visible || !calibration_visible {
                return Ok(false);
            }
            self.set_distance(data_anchor.distance_to(calibration_anchor))
        }
    }

}
