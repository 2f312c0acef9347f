//! 捕捉/对齐解析器：把原始光标位置解析为工作位置。
//!
//! 解析顺序（命中即返回）：显式捕捉点 → 正交约束 →（正交与追踪
//! 同时适用时的组合求交）→ 对齐追踪 → 网格回退 → 原始位置。

use draft_config::KernelConfig;
use draft_core::drawing::{Drawing, EntityId, SnapKind, SnapPoint};
use draft_core::geometry::{Point2, Vector2};

/// 追踪历史的容量：仅保留最近悬停过的 5 个捕捉点。
const TRACKING_CAPACITY: usize = 5;

/// 捕捉点缓存。记录构建时的图形代数，代数不一致时惰性重建，
/// 因此任何几何变更之后的首次查询自动使用新鲜数据。
#[derive(Debug, Default)]
pub struct SnapCache {
    built_at: Option<u64>,
    points: Vec<(EntityId, SnapPoint)>,
}

impl SnapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回当前图形的捕捉点，必要时重建。
    pub fn points(&mut self, drawing: &Drawing) -> &[(EntityId, SnapPoint)] {
        if self.built_at != Some(drawing.generation()) {
            self.rebuild(drawing);
        }
        &self.points
    }

    fn rebuild(&mut self, drawing: &Drawing) {
        self.points.clear();
        let mut scratch = Vec::new();
        for record in drawing.entities() {
            if !drawing.is_layer_visible(record.layer) {
                continue;
            }
            scratch.clear();
            record.shape.snap_points(&mut scratch);
            self.points
                .extend(scratch.drain(..).map(|point| (record.id, point)));
        }
        self.built_at = Some(drawing.generation());
    }

    /// 显式失效。正常路径依赖代数判定，该方法仅供测试或
    /// 绕过 `Drawing` 修改数据的调用方使用。
    pub fn invalidate(&mut self) {
        self.built_at = None;
    }
}

/// 最近悬停过的捕捉点环，最新的在前。
#[derive(Debug, Default)]
pub struct TrackingHistory {
    points: Vec<SnapPoint>,
}

impl TrackingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个捕捉点。重复悬停同一点只会把它提升到最前。
    pub fn remember(&mut self, point: SnapPoint) {
        self.points
            .retain(|existing| existing.position.distance(point.position) > 1e-9);
        self.points.insert(0, point);
        self.points.truncate(TRACKING_CAPACITY);
    }

    #[inline]
    pub fn points(&self) -> &[SnapPoint] {
        &self.points
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// 光标解析的工具上下文：可选锚点（角度相对约束的参考点）
/// 与视图比例（每世界单位像素数）。
#[derive(Debug, Clone, Copy)]
pub struct SnapContext {
    pub anchor: Option<Point2>,
    pub view_scale: f64,
}

impl SnapContext {
    pub fn free(view_scale: f64) -> Self {
        Self {
            anchor: None,
            view_scale,
        }
    }

    pub fn anchored(anchor: Point2, view_scale: f64) -> Self {
        Self {
            anchor: Some(anchor),
            view_scale,
        }
    }
}

/// 追踪约束的种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingKind {
    Horizontal,
    Vertical,
    /// 两条投影线（水平 + 垂直）的交点。
    Intersection,
}

/// 解析结果的分类，调用方据此渲染不同的提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKind {
    Snap(SnapKind),
    Ortho,
    OrthoTracking,
    Tracking(TrackingKind),
    Grid,
    Free,
}

/// 经过捕捉/约束解析后的工作位置。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingPosition {
    pub position: Point2,
    pub kind: ResolvedKind,
}

/// 把原始光标位置解析为工作位置。命中的显式捕捉点会进入
/// 追踪历史，供后续的对齐追踪使用。
pub fn resolve(
    raw: Point2,
    drawing: &Drawing,
    cache: &mut SnapCache,
    tracking: &mut TrackingHistory,
    ctx: SnapContext,
    cfg: &KernelConfig,
) -> WorkingPosition {
    let snap_tol = cfg.tolerances.snap_px / ctx.view_scale;
    let tracking_tol = cfg.tolerances.tracking_px / ctx.view_scale;

    // 1. 显式捕捉点：最近者胜，等距时按遍历顺序取先遇到的。
    if cfg.snap.enabled {
        let mut best: Option<(f64, SnapPoint)> = None;
        for (_, point) in cache.points(drawing) {
            if point.kind == SnapKind::Center && !cfg.snap.center {
                continue;
            }
            let dist = raw.distance(point.position);
            if dist <= snap_tol && best.is_none_or(|(best_dist, _)| dist < best_dist) {
                best = Some((dist, *point));
            }
        }
        if let Some((_, point)) = best {
            tracking.remember(point);
            return WorkingPosition {
                position: point.position,
                kind: ResolvedKind::Snap(point.kind),
            };
        }
    }

    // 2/4. 正交约束，以及正交与追踪同时适用时的组合。
    if cfg.ortho.enabled
        && let Some(anchor) = ctx.anchor
    {
        let ortho = resolve_ortho(raw, anchor, cfg);
        if cfg.snap.tracking
            && let Some(combined) =
                resolve_ortho_tracking(raw, anchor, ortho, tracking, tracking_tol)
        {
            return WorkingPosition {
                position: combined,
                kind: ResolvedKind::OrthoTracking,
            };
        }
        return WorkingPosition {
            position: ortho,
            kind: ResolvedKind::Ortho,
        };
    }

    // 3. 对齐追踪：水平/垂直投影或两条投影的交点。
    if cfg.snap.tracking
        && let Some((position, kind)) = resolve_tracking(raw, tracking, tracking_tol)
    {
        return WorkingPosition {
            position,
            kind: ResolvedKind::Tracking(kind),
        };
    }

    // 5. 网格回退：两个坐标各自取整到捕捉网格的整数倍。
    if cfg.grid.enabled && cfg.grid.snap_size > 0.0 {
        let step = cfg.grid.snap_size;
        return WorkingPosition {
            position: Point2::new(
                (raw.x() / step).round() * step,
                (raw.y() / step).round() * step,
            ),
            kind: ResolvedKind::Grid,
        };
    }

    WorkingPosition {
        position: raw,
        kind: ResolvedKind::Free,
    }
}

/// 把相对锚点的角度取整到步长的整数倍，可选地把距离取整到
/// 捕捉网格的整数倍。
fn resolve_ortho(raw: Point2, anchor: Point2, cfg: &KernelConfig) -> Point2 {
    let offset = anchor.vector_to(raw);
    let distance = offset.length();
    if distance <= f64::EPSILON {
        return anchor;
    }
    let step = cfg.ortho.step_radians();
    let snapped_angle = if step > 0.0 {
        (offset.angle() / step).round() * step
    } else {
        offset.angle()
    };
    let distance = if cfg.ortho.round_distance && cfg.grid.snap_size > 0.0 {
        let rounded = (distance / cfg.grid.snap_size).round() * cfg.grid.snap_size;
        if rounded > 0.0 { rounded } else { distance }
    } else {
        distance
    };
    anchor.translate(Vector2::from_angle(snapped_angle).scaled(distance))
}

/// 正交射线与追踪约束的组合：取正交方向与追踪线（或追踪交点
/// 在射线上的投影）的交点。射线参数 ≤ 0 的解视为无效，
/// 由调用方回退到纯正交。
fn resolve_ortho_tracking(
    raw: Point2,
    anchor: Point2,
    ortho: Point2,
    tracking: &TrackingHistory,
    tolerance: f64,
) -> Option<Point2> {
    let direction = anchor.vector_to(ortho).normalize()?;
    let mut best: Option<(f64, Point2)> = None;
    let mut consider = |candidate: Point2| {
        let along = anchor.vector_to(candidate).dot(direction);
        if along <= 0.0 {
            return;
        }
        let on_ray = anchor.translate(direction.scaled(along));
        let dist = raw.distance(on_ray);
        if dist <= tolerance && best.is_none_or(|(best_dist, _)| dist < best_dist) {
            best = Some((dist, on_ray));
        }
    };

    for tracked in tracking.points() {
        // 与垂直追踪线 x = tracked.x 求交
        if direction.x().abs() > f64::EPSILON {
            let t = (tracked.position.x() - anchor.x()) / direction.x();
            if t > 0.0 {
                consider(anchor.translate(direction.scaled(t)));
            }
        }
        // 与水平追踪线 y = tracked.y 求交
        if direction.y().abs() > f64::EPSILON {
            let t = (tracked.position.y() - anchor.y()) / direction.y();
            if t > 0.0 {
                consider(anchor.translate(direction.scaled(t)));
            }
        }
    }
    // 垂直对追踪交点投影到射线上
    for (i, first) in tracking.points().iter().enumerate() {
        for second in tracking.points().iter().skip(i + 1) {
            consider(Point2::new(first.position.x(), second.position.y()));
            consider(Point2::new(second.position.x(), first.position.y()));
        }
    }
    best.map(|(_, position)| position)
}

/// 纯追踪解析。两条投影线的交点是比单线更强的约束，且其欧氏
/// 距离必然不小于任一条腿的垂距，因此先单独判定交点，再退到
/// 单线投影；每一类内部最近者胜出。
fn resolve_tracking(
    raw: Point2,
    tracking: &TrackingHistory,
    tolerance: f64,
) -> Option<(Point2, TrackingKind)> {
    let mut best_cross: Option<(f64, Point2)> = None;
    for (i, first) in tracking.points().iter().enumerate() {
        for second in tracking.points().iter().skip(i + 1) {
            for candidate in [
                Point2::new(first.position.x(), second.position.y()),
                Point2::new(second.position.x(), first.position.y()),
            ] {
                let dist = raw.distance(candidate);
                if dist <= tolerance
                    && best_cross.is_none_or(|(best_dist, _)| dist < best_dist)
                {
                    best_cross = Some((dist, candidate));
                }
            }
        }
    }
    if let Some((_, position)) = best_cross {
        return Some((position, TrackingKind::Intersection));
    }

    let mut best: Option<(f64, Point2, TrackingKind)> = None;
    let mut consider = |dist: f64, position: Point2, kind: TrackingKind| {
        if dist <= tolerance && best.is_none_or(|(best_dist, _, _)| dist < best_dist) {
            best = Some((dist, position, kind));
        }
    };
    for tracked in tracking.points() {
        consider(
            (raw.x() - tracked.position.x()).abs(),
            Point2::new(tracked.position.x(), raw.y()),
            TrackingKind::Vertical,
        );
        consider(
            (raw.y() - tracked.position.y()).abs(),
            Point2::new(raw.x(), tracked.position.y()),
            TrackingKind::Horizontal,
        );
    }
    best.map(|(_, position, kind)| (position, kind))
}
