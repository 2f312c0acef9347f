//! 编辑会话：图形数据与运行时状态（捕捉缓存、追踪历史、视口）
//! 的聚合门面。上层工具只跟 `Session` 打交道。

use tracing::debug;

use draft_config::KernelConfig;
use draft_core::drawing::{Drawing, EntityId, EntityRecord};
use draft_core::geometry::{Bounds2D, Point2, Vector2};

use crate::errors::KernelError;
use crate::hit;
use crate::modify::{self, ExtendPlan, TrimPlan};
use crate::snap::{self, SnapCache, SnapContext, TrackingHistory, WorkingPosition};

const DEFAULT_ZOOM: f64 = 1.0;
const MIN_ZOOM: f64 = 0.01;
const MAX_ZOOM: f64 = 1_000.0;

/// 视口状态（中心点与缩放）。缩放即每世界单位像素数，
/// 命中与捕捉容差都按它换算。
#[derive(Debug, Clone, Copy)]
pub struct ViewportState {
    pub center: Point2,
    pub zoom: f64,
}

impl ViewportState {
    #[inline]
    fn clamp_zoom(value: f64) -> f64 {
        value.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            center: Point2::new(0.0, 0.0),
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// 内核层负责维护 `Drawing` 和运行时状态。捕捉缓存跟随图形
/// 代数自动失效；追踪历史只在工具切换时显式清空。
#[derive(Debug)]
pub struct Session {
    drawing: Drawing,
    config: KernelConfig,
    cache: SnapCache,
    tracking: TrackingHistory,
    viewport: ViewportState,
}

impl Session {
    pub fn new(config: KernelConfig) -> Self {
        Self {
            drawing: Drawing::new(),
            config,
            cache: SnapCache::new(),
            tracking: TrackingHistory::new(),
            viewport: ViewportState::default(),
        }
    }

    /// 使用现有图形初始化会话。
    pub fn with_drawing(drawing: Drawing, config: KernelConfig) -> Self {
        let mut session = Self::new(config);
        session.load_drawing(drawing);
        session
    }

    /// 替换当前图形并重置运行时状态。
    pub fn load_drawing(&mut self, drawing: Drawing) {
        self.drawing = drawing;
        self.cache.invalidate();
        self.tracking.clear();
        self.viewport = ViewportState::default();

        if let Some(bounds) = self.drawing.bounds() {
            self.viewport.center = bounds.center();
        }
        debug!(entities = self.drawing.len(), "图形已载入会话");
    }

    #[inline]
    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    #[inline]
    pub fn drawing_mut(&mut self) -> &mut Drawing {
        &mut self.drawing
    }

    #[inline]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut KernelConfig {
        &mut self.config
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.drawing.entity(id)
    }

    /// 把原始光标位置解析为工作位置（自由点，无锚点约束）。
    pub fn resolve_free(&mut self, raw: Point2) -> WorkingPosition {
        let ctx = SnapContext::free(self.viewport.zoom);
        snap::resolve(
            raw,
            &self.drawing,
            &mut self.cache,
            &mut self.tracking,
            ctx,
            &self.config,
        )
    }

    /// 带锚点解析：正交与极轴约束相对该点生效。
    pub fn resolve_from(&mut self, anchor: Point2, raw: Point2) -> WorkingPosition {
        let ctx = SnapContext::anchored(anchor, self.viewport.zoom);
        snap::resolve(
            raw,
            &self.drawing,
            &mut self.cache,
            &mut self.tracking,
            ctx,
            &self.config,
        )
    }

    /// 工具切换时清空追踪历史，避免跨工具的幽灵对齐线。
    #[inline]
    pub fn reset_tracking(&mut self) {
        self.tracking.clear();
    }

    /// 拾取光标下最上层的可见实体。
    pub fn hit_test(&self, point: Point2) -> Option<EntityId> {
        hit::hit_test(&self.drawing, point, &self.config, self.viewport.zoom)
    }

    /// 框选。拖拽方向决定窗选（左到右）还是叉选（右到左）。
    pub fn box_select(&self, first: Point2, second: Point2) -> Vec<EntityId> {
        hit::box_select(&self.drawing, first, second)
    }

    /// 选中指定实体。实体不存在时返回错误。
    pub fn select(&mut self, id: EntityId) -> Result<(), KernelError> {
        if !self.drawing.set_selected(id, true) {
            return Err(KernelError::EntityNotFound(id.get()));
        }
        Ok(())
    }

    /// 取消选中，返回之前是否处于选中状态。
    pub fn deselect(&mut self, id: EntityId) -> bool {
        let was = self
            .drawing
            .entity(id)
            .is_some_and(|record| record.selected);
        self.drawing.set_selected(id, false);
        was
    }

    /// 切换实体选中状态，返回切换后的状态。
    pub fn toggle_selection(&mut self, id: EntityId) -> Result<bool, KernelError> {
        let record = self
            .drawing
            .entity(id)
            .ok_or(KernelError::EntityNotFound(id.get()))?;
        let next = !record.selected;
        self.drawing.set_selected(id, next);
        Ok(next)
    }

    #[inline]
    pub fn clear_selection(&mut self) {
        self.drawing.clear_selection();
    }

    #[inline]
    pub fn selection(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.drawing.selected_ids()
    }

    #[inline]
    pub fn selection_len(&self) -> usize {
        self.drawing.selected_ids().count()
    }

    #[inline]
    pub fn is_selected(&self, id: EntityId) -> bool {
        self.drawing
            .entity(id)
            .is_some_and(|record| record.selected)
    }

    /// 当前选中实体的联合包围盒。
    pub fn selection_bounds(&self) -> Option<Bounds2D> {
        let mut bounds = Bounds2D::empty();
        let mut has = false;
        for id in self.drawing.selected_ids().collect::<Vec<_>>() {
            if let Some(record) = self.drawing.entity(id)
                && let Some(entity_bounds) = record.shape.bounds()
            {
                bounds.include_bounds(&entity_bounds);
                has = true;
            }
        }
        if has { Some(bounds) } else { None }
    }

    /// 修剪预览，不改动图形。
    pub fn preview_trim(&self, id: EntityId, cursor: Point2) -> Option<TrimPlan> {
        modify::preview_trim(&self.drawing, id, cursor)
    }

    /// 应用修剪描述符。
    pub fn commit_trim(&mut self, plan: &TrimPlan) -> Result<(), KernelError> {
        modify::commit_trim(&mut self.drawing, plan)
    }

    /// 延伸预览，不改动图形。
    pub fn preview_extend(&self, id: EntityId, cursor: Point2) -> Option<ExtendPlan> {
        modify::preview_extend(&self.drawing, id, cursor)
    }

    /// 应用延伸描述符。
    pub fn commit_extend(&mut self, plan: &ExtendPlan) -> Result<(), KernelError> {
        modify::commit_extend(&mut self.drawing, plan)
    }

    #[inline]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    #[inline]
    pub fn reset_viewport(&mut self) {
        self.viewport = ViewportState::default();
    }

    #[inline]
    pub fn set_viewport_center(&mut self, center: Point2) {
        self.viewport.center = center;
    }

    pub fn pan_viewport(&mut self, delta: Vector2) {
        self.viewport.center = self.viewport.center.translate(delta);
    }

    /// 设置缩放倍数（自动限制在合法范围内）。
    pub fn set_viewport_zoom(&mut self, zoom: f64) {
        self.viewport.zoom = ViewportState::clamp_zoom(zoom);
    }

    /// 按乘法因子调整缩放。
    pub fn scale_viewport_zoom(&mut self, factor: f64) {
        let current = self.viewport.zoom;
        let target = if factor.is_finite() {
            current * factor
        } else {
            current
        };
        self.set_viewport_zoom(target);
    }

    /// 聚焦当前选中实体，若为空则退化到整个图形范围。
    pub fn focus_on_selection(&mut self) {
        let target = self.selection_bounds().or_else(|| self.drawing.bounds());
        if let Some(bounds) = target {
            self.viewport.center = bounds.center();
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}
