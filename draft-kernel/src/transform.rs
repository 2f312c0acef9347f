//! 批量变换与阵列复制。
//!
//! 多实体变换遵循“先全量校验、后统一改动”的约定：任何一个
//! 目标校验失败都不会留下半途状态。阵列操作返回新实体的标识，
//! 便于调用方随后选中或撤销。

use std::f64::consts::TAU;

use tracing::debug;

use draft_core::drawing::{Arc, Circle, Drawing, EntityId, Shape};
use draft_core::geometry::{FULL_TURN_EPS, Point2, Vector2, sweep_angle};

use crate::errors::TransformError;

/// 目标实体全部存在时才执行改动。
fn validate_targets(drawing: &Drawing, ids: &[EntityId]) -> Result<(), TransformError> {
    for id in ids {
        if drawing.entity(*id).is_none() {
            return Err(TransformError::EntityNotFound(id.get()));
        }
    }
    Ok(())
}

/// 把一组实体绕基点旋转给定弧度。
pub fn apply_rotate(
    drawing: &mut Drawing,
    ids: &[EntityId],
    base: Point2,
    angle: f64,
) -> Result<(), TransformError> {
    validate_targets(drawing, ids)?;
    for id in ids {
        if let Some(record) = drawing.entity_mut(*id) {
            record.shape = record.shape.rotated_about(base, angle);
        }
    }
    debug!(count = ids.len(), angle, "旋转完成");
    Ok(())
}

/// 把一组实体绕基点均匀缩放。比例必须为正的有限数。
pub fn apply_scale(
    drawing: &mut Drawing,
    ids: &[EntityId],
    base: Point2,
    factor: f64,
) -> Result<(), TransformError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(TransformError::InvalidScaleFactor(factor));
    }
    validate_targets(drawing, ids)?;
    for id in ids {
        if let Some(record) = drawing.entity_mut(*id) {
            record.shape = record.shape.scaled_about(base, factor);
        }
    }
    debug!(count = ids.len(), factor, "缩放完成");
    Ok(())
}

/// 向参考点一侧偏移一个实体，生成平行副本。
///
/// 线段沿法向平移；圆与圆弧按参考点在内/外侧增减半径。不支持
/// 偏移的实体类型返回 Ok(None)，半径退化为非正数是错误。
pub fn apply_offset(
    drawing: &mut Drawing,
    id: EntityId,
    reference: Point2,
    distance: f64,
) -> Result<Option<EntityId>, TransformError> {
    let record = drawing
        .entity(id)
        .ok_or(TransformError::EntityNotFound(id.get()))?;
    let layer = record.layer;

    let shape = match &record.shape {
        Shape::Line(line) => {
            let Some(direction) = line.direction() else {
                return Ok(None);
            };
            let perp = direction.perp();
            // 参考点决定法向的符号
            let side = line.midpoint().vector_to(reference).dot(perp);
            let normal = if side >= 0.0 { perp } else { perp.scaled(-1.0) };
            let mut offset = line.clone();
            offset.start = offset.start.translate(normal.scaled(distance));
            offset.end = offset.end.translate(normal.scaled(distance));
            Shape::Line(offset)
        }
        Shape::Circle(circle) => {
            let radius = offset_radius(circle.center, circle.radius, reference, distance)?;
            Shape::Circle(Circle {
                center: circle.center,
                radius,
            })
        }
        Shape::Arc(arc) => {
            let radius = offset_radius(arc.center, arc.radius, reference, distance)?;
            Shape::Arc(Arc { radius, ..*arc })
        }
        Shape::Dimension(_) | Shape::Text(_) | Shape::Rectangle(_) => return Ok(None),
    };

    let new_id = drawing.add_shape(shape, layer);
    debug!(source = id.get(), copy = new_id.get(), distance, "偏移副本已创建");
    Ok(Some(new_id))
}

fn offset_radius(
    center: Point2,
    radius: f64,
    reference: Point2,
    distance: f64,
) -> Result<f64, TransformError> {
    let outward = center.distance(reference) > radius;
    let new_radius = if outward { radius + distance } else { radius - distance };
    if new_radius <= 0.0 {
        return Err(TransformError::InvalidOffsetRadius(new_radius));
    }
    Ok(new_radius)
}

/// 矩形阵列：按列距/行距复制一组实体，原件占据 (0,0) 单元。
/// 两个方向的数量都必须至少为 1。
pub fn apply_rect_pattern(
    drawing: &mut Drawing,
    ids: &[EntityId],
    count_x: usize,
    count_y: usize,
    step_x: f64,
    step_y: f64,
) -> Result<Vec<EntityId>, TransformError> {
    if count_x == 0 || count_y == 0 {
        return Err(TransformError::InvalidRectCount {
            x: count_x,
            y: count_y,
        });
    }
    validate_targets(drawing, ids)?;

    let mut created = Vec::with_capacity(ids.len() * (count_x * count_y - 1));
    for id in ids {
        let Some(record) = drawing.entity(*id) else {
            continue;
        };
        let layer = record.layer;
        let shape = record.shape.clone();
        for ix in 0..count_x {
            for iy in 0..count_y {
                if ix == 0 && iy == 0 {
                    continue;
                }
                let offset = Vector2::new(step_x * ix as f64, step_y * iy as f64);
                created.push(drawing.add_shape(shape.translated(offset), layer));
            }
        }
    }
    debug!(sources = ids.len(), copies = created.len(), "矩形阵列完成");
    Ok(created)
}

/// 环形阵列：绕中心在给定角度范围内摆放副本，原件占据首位。
///
/// 范围覆盖整圆时副本按 sweep/count 均摊，首尾不重叠；部分
/// 圆弧时首尾副本落在范围两端，步长为 sweep/(count-1)。
pub fn apply_circ_pattern(
    drawing: &mut Drawing,
    ids: &[EntityId],
    center: Point2,
    count: usize,
    start_angle: f64,
    end_angle: f64,
) -> Result<Vec<EntityId>, TransformError> {
    if count < 2 {
        return Err(TransformError::InvalidCircularCount(count));
    }
    validate_targets(drawing, ids)?;

    let sweep = sweep_angle(start_angle, end_angle);
    let full_turn = (sweep - TAU).abs() <= FULL_TURN_EPS || sweep <= FULL_TURN_EPS;
    let step = if full_turn {
        TAU / count as f64
    } else {
        sweep / (count - 1) as f64
    };

    let mut created = Vec::with_capacity(ids.len() * (count - 1));
    for id in ids {
        let Some(record) = drawing.entity(*id) else {
            continue;
        };
        let layer = record.layer;
        let shape = record.shape.clone();
        for k in 1..count {
            let angle = step * k as f64;
            created.push(drawing.add_shape(shape.rotated_about(center, angle), layer));
        }
    }
    debug!(sources = ids.len(), copies = created.len(), step, "环形阵列完成");
    Ok(created)
}
