//! 修剪/延伸分段引擎。
//!
//! 两种操作都是预览/提交对：预览只计算描述符，从不改动集合；
//! 提交接受描述符并执行替换、一分为二或删除。光标落点决定
//! 分段的取舍，角度域的运算全部相对圆弧起始角进行，避免
//! 0/2π 接缝处的歧义。

use std::f64::consts::TAU;

use tracing::debug;

use draft_core::drawing::{Arc, Drawing, EntityId, Line, Shape};
use draft_core::geometry::{
    ANGLE_EPS, MIN_ARC_SWEEP, PARAM_EPS, Point2, circle_circle_intersection,
    line_circle_intersection, normalize_angle, segment_intersection,
};

use crate::errors::KernelError;

/// 修剪提交时对目标实体执行的动作。
#[derive(Debug, Clone, PartialEq)]
pub enum TrimAction {
    /// 没有交点兜住光标段，整个实体被移除。
    Delete,
    /// 目标被单一剩余段取代（端部修剪）。
    Replace(Shape),
    /// 中段被挖除，目标分裂为两个实体。
    Split(Shape, Shape),
}

/// 修剪预览的描述符：保留/移除的几何，不含任何状态变更。
#[derive(Debug, Clone, PartialEq)]
pub struct TrimPlan {
    pub target: EntityId,
    pub action: TrimAction,
}

/// 延伸预览的描述符：被延长后的新线段。
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendPlan {
    pub target: EntityId,
    pub extended: Line,
    /// 命中的边界点，供预览高亮。
    pub boundary: Point2,
}

/// 计算修剪预览。光标位置选择要移除的分段；该实体不可修剪时
/// （例如光标在圆弧角度范围之外）返回 None，属于显式的
/// “不适用”状态而非错误。
pub fn preview_trim(drawing: &Drawing, id: EntityId, cursor: Point2) -> Option<TrimPlan> {
    let record = drawing.entity(id)?;
    match &record.shape {
        Shape::Line(line) => Some(TrimPlan {
            target: id,
            action: trim_line(drawing, id, line, cursor),
        }),
        Shape::Circle(circle) => Some(TrimPlan {
            target: id,
            action: trim_circle(drawing, id, circle.center, circle.radius, cursor),
        }),
        Shape::Arc(arc) => trim_arc(drawing, id, arc, cursor).map(|action| TrimPlan {
            target: id,
            action,
        }),
        // 其余实体类型不参与修剪
        Shape::Dimension(_) | Shape::Text(_) | Shape::Rectangle(_) => None,
    }
}

/// 应用修剪描述符并递增图形代数。
pub fn commit_trim(drawing: &mut Drawing, plan: &TrimPlan) -> Result<(), KernelError> {
    let record = drawing
        .entity(plan.target)
        .ok_or(KernelError::EntityNotFound(plan.target.get()))?;
    let layer = record.layer;
    match &plan.action {
        TrimAction::Delete => {
            drawing.remove(plan.target);
            debug!(target = plan.target.get(), "修剪：删除整个实体");
        }
        TrimAction::Replace(shape) => {
            drawing.replace_shape(plan.target, shape.clone());
            debug!(target = plan.target.get(), "修剪：端部截断");
        }
        TrimAction::Split(first, second) => {
            drawing.replace_shape(plan.target, first.clone());
            let twin = drawing.add_shape(second.clone(), layer);
            debug!(
                target = plan.target.get(),
                twin = twin.get(),
                "修剪：中段挖除，实体一分为二"
            );
        }
    }
    Ok(())
}

/// 计算延伸预览（仅线段）。在目标所在的无限直线上搜索全部
/// 边界交点，只保留光标较近端正确一侧、越出量最小的那个；
/// 找不到边界时返回 None（不适用，而非错误）。
pub fn preview_extend(drawing: &Drawing, id: EntityId, cursor: Point2) -> Option<ExtendPlan> {
    let record = drawing.entity(id)?;
    let Shape::Line(line) = &record.shape else {
        return None;
    };
    line.direction()?;

    let extend_start = cursor.distance(line.start) < cursor.distance(line.end);
    let hits = line_parameter_hits(drawing, id, line, true);

    let t = if extend_start {
        hits.iter()
            .copied()
            .filter(|t| *t < -PARAM_EPS)
            .max_by(|a, b| a.total_cmp(b))?
    } else {
        hits.iter()
            .copied()
            .filter(|t| *t > 1.0 + PARAM_EPS)
            .min_by(|a, b| a.total_cmp(b))?
    };

    let boundary = line.point_at(t);
    let extended = if extend_start {
        Line::new(boundary, line.end)
    } else {
        Line::new(line.start, boundary)
    };
    Some(ExtendPlan {
        target: id,
        extended,
        boundary,
    })
}

/// 应用延伸描述符并递增图形代数。
pub fn commit_extend(drawing: &mut Drawing, plan: &ExtendPlan) -> Result<(), KernelError> {
    if !drawing.replace_shape(plan.target, Shape::Line(plan.extended.clone())) {
        return Err(KernelError::EntityNotFound(plan.target.get()));
    }
    debug!(target = plan.target.get(), "延伸：端点移动到最近边界");
    Ok(())
}

/// 目标直线与其余实体边界的全部交点参数 t。
/// `unbounded` 为真时 t 不受 [0,1] 限制（延伸用），其它实体
/// 自身始终按有界边界处理。
fn line_parameter_hits(
    drawing: &Drawing,
    skip: EntityId,
    line: &Line,
    unbounded: bool,
) -> Vec<f64> {
    let mut ts = Vec::new();
    let mut push = |t: f64| {
        if unbounded || (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t) {
            ts.push(t);
        }
    };

    for record in drawing.entities() {
        if record.id == skip || !drawing.is_layer_visible(record.layer) {
            continue;
        }
        match &record.shape {
            Shape::Line(other) => {
                segment_hit_t(line, other.start, other.end, &mut push);
            }
            Shape::Dimension(dimension) => {
                let (a, b) = dimension.measure_line();
                segment_hit_t(line, a, b, &mut push);
            }
            Shape::Rectangle(rect) => {
                for (a, b) in rect.edges() {
                    segment_hit_t(line, a, b, &mut push);
                }
            }
            Shape::Circle(circle) => {
                for (_, t) in
                    line_circle_intersection(line.start, line.end, circle.center, circle.radius)
                {
                    push(t);
                }
            }
            Shape::Arc(arc) => {
                for (point, t) in
                    line_circle_intersection(line.start, line.end, arc.center, arc.radius)
                {
                    if arc.contains(arc.center.vector_to(point).angle()) {
                        push(t);
                    }
                }
            }
            Shape::Text(_) => {}
        }
    }
    ts
}

fn segment_hit_t(line: &Line, a: Point2, b: Point2, push: &mut impl FnMut(f64)) {
    if let Some(hit) = segment_intersection(line.start, line.end, a, b)
        && (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&hit.u)
    {
        push(hit.t);
    }
}

/// 线段修剪的分类逻辑。
fn trim_line(drawing: &Drawing, id: EntityId, line: &Line, cursor: Point2) -> TrimAction {
    // 只有落在线段内部的交点才能形成分段；端点处的交点不分段
    let mut ts: Vec<f64> = line_parameter_hits(drawing, id, line, false)
        .into_iter()
        .filter(|t| (PARAM_EPS..=1.0 - PARAM_EPS).contains(t))
        .collect();
    ts.sort_by(f64::total_cmp);
    ts.dedup_by(|a, b| (*a - *b).abs() < PARAM_EPS);

    if ts.is_empty() {
        return TrimAction::Delete;
    }

    let cursor_t = project_parameter(line, cursor);

    if ts.len() == 1 {
        // 单交点：光标所在的一侧被保留，对侧被移除
        let t = ts[0];
        return if cursor_t < t {
            TrimAction::Replace(Shape::Line(Line::new(line.start, line.point_at(t))))
        } else {
            TrimAction::Replace(Shape::Line(Line::new(line.point_at(t), line.end)))
        };
    }

    // 多交点：光标所在的括段被丢弃
    let mut boundaries = Vec::with_capacity(ts.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(ts);
    boundaries.push(1.0);
    let bracket = bracket_index(&boundaries, cursor_t);

    let touches_start = bracket == 0;
    let touches_end = bracket + 2 == boundaries.len();
    match (touches_start, touches_end) {
        // 光标括段横跨整条线（不会出现：已知至少两个内部交点）
        (true, true) => TrimAction::Delete,
        (true, false) => TrimAction::Replace(Shape::Line(Line::new(
            line.point_at(boundaries[bracket + 1]),
            line.end,
        ))),
        (false, true) => TrimAction::Replace(Shape::Line(Line::new(
            line.start,
            line.point_at(boundaries[bracket]),
        ))),
        (false, false) => TrimAction::Split(
            Shape::Line(Line::new(line.start, line.point_at(boundaries[bracket]))),
            Shape::Line(Line::new(line.point_at(boundaries[bracket + 1]), line.end)),
        ),
    }
}

/// 光标在线段上的投影参数，截断到 [0,1]。
fn project_parameter(line: &Line, cursor: Point2) -> f64 {
    let dir = line.start.vector_to(line.end);
    let len_sq = dir.length_squared();
    if len_sq <= f64::EPSILON {
        return 0.0;
    }
    (line.start.vector_to(cursor).dot(dir) / len_sq).clamp(0.0, 1.0)
}

#[inline]
fn bracket_index(boundaries: &[f64], value: f64) -> usize {
    for (index, pair) in boundaries.windows(2).enumerate() {
        if value >= pair[0] && value <= pair[1] {
            return index;
        }
    }
    boundaries.len().saturating_sub(2)
}

/// 目标圆/圆弧与其余实体边界的交点（世界坐标）。
fn circle_boundary_hits(
    drawing: &Drawing,
    skip: EntityId,
    center: Point2,
    radius: f64,
) -> Vec<Point2> {
    let mut points = Vec::new();

    for record in drawing.entities() {
        if record.id == skip || !drawing.is_layer_visible(record.layer) {
            continue;
        }
        match &record.shape {
            Shape::Line(line) => {
                segment_circle_hits(&mut points, line.start, line.end, center, radius);
            }
            Shape::Dimension(dimension) => {
                let (a, b) = dimension.measure_line();
                segment_circle_hits(&mut points, a, b, center, radius);
            }
            Shape::Rectangle(rect) => {
                for (a, b) in rect.edges() {
                    segment_circle_hits(&mut points, a, b, center, radius);
                }
            }
            Shape::Circle(other) => {
                points.extend(circle_circle_intersection(
                    center,
                    radius,
                    other.center,
                    other.radius,
                ));
            }
            Shape::Arc(other) => {
                for point in
                    circle_circle_intersection(center, radius, other.center, other.radius)
                {
                    if other.contains(other.center.vector_to(point).angle()) {
                        points.push(point);
                    }
                }
            }
            Shape::Text(_) => {}
        }
    }
    points
}

fn segment_circle_hits(points: &mut Vec<Point2>, a: Point2, b: Point2, center: Point2, radius: f64) {
    for (point, t) in line_circle_intersection(a, b, center, radius) {
        if (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t) {
            points.push(point);
        }
    }
}

/// 整圆修剪：角度域的括段挖除，剩余部分只可能是一段圆弧。
fn trim_circle(
    drawing: &Drawing,
    id: EntityId,
    center: Point2,
    radius: f64,
    cursor: Point2,
) -> TrimAction {
    let mut angles: Vec<f64> = circle_boundary_hits(drawing, id, center, radius)
        .into_iter()
        .map(|point| normalize_angle(center.vector_to(point).angle()))
        .collect();
    angles.sort_by(f64::total_cmp);
    angles.dedup_by(|a, b| (*a - *b).abs() < ANGLE_EPS);
    // 接缝两侧的重复交点（0 与 2π 附近）也要合并
    if angles.len() >= 2
        && let (Some(first), Some(last)) = (angles.first().copied(), angles.last().copied())
        && (TAU - last + first) < ANGLE_EPS
    {
        angles.pop();
    }

    if angles.len() < 2 {
        // 少于两个交点无法兜出剩余圆弧，整圆移除
        return TrimAction::Delete;
    }

    let cursor_angle = normalize_angle(center.vector_to(cursor).angle());
    let mut removed_start = angles[angles.len() - 1];
    let mut removed_end = angles[0];
    for pair in angles.windows(2) {
        if cursor_angle >= pair[0] && cursor_angle <= pair[1] {
            removed_start = pair[0];
            removed_end = pair[1];
            break;
        }
    }

    // 剩余圆弧是被挖除括段的补集
    let remaining = Arc {
        center,
        radius,
        start_angle: removed_end,
        end_angle: removed_start,
    };
    let sweep = remaining.sweep();
    if sweep < MIN_ARC_SWEEP || sweep > TAU - MIN_ARC_SWEEP {
        TrimAction::Delete
    } else {
        TrimAction::Replace(Shape::Arc(remaining))
    }
}

/// 圆弧修剪。全部角度相对起始角换算，排序因此跨接缝也无歧义；
/// 两个圆弧端点作为伪交点注入，使得靠近开口端的修剪成为可能。
/// 光标在角度范围之外时返回 None。
fn trim_arc(drawing: &Drawing, id: EntityId, arc: &Arc, cursor: Point2) -> Option<TrimAction> {
    let sweep = arc.sweep();
    let cursor_angle = arc.center.vector_to(cursor).angle();
    let cursor_rel = to_relative(arc, cursor_angle, sweep)?;

    let mut rels: Vec<f64> = circle_boundary_hits(drawing, id, arc.center, arc.radius)
        .into_iter()
        .filter_map(|point| {
            let theta = arc.center.vector_to(point).angle();
            arc.contains(theta)
                .then(|| to_relative(arc, theta, sweep).unwrap_or(0.0))
        })
        // 与端点重合的交点不提供新的分段边界
        .filter(|rel| *rel > ANGLE_EPS && *rel < sweep - ANGLE_EPS)
        .collect();
    rels.sort_by(f64::total_cmp);
    rels.dedup_by(|a, b| (*a - *b).abs() < ANGLE_EPS);

    if rels.is_empty() {
        return Some(TrimAction::Delete);
    }

    if rels.len() == 1 {
        // 单交点：光标较近的原始端点所在的一侧被保留
        let cut = rels[0];
        let keep_start_side = cursor_rel < sweep - cursor_rel;
        let action = if keep_start_side {
            Shape::Arc(Arc {
                start_angle: arc.start_angle,
                end_angle: arc.start_angle + cut,
                ..*arc
            })
        } else {
            Shape::Arc(Arc {
                start_angle: arc.start_angle + cut,
                end_angle: arc.end_angle,
                ..*arc
            })
        };
        return Some(TrimAction::Replace(action));
    }

    // 多交点：两个端点作为伪交点注入后取光标括段
    let mut boundaries = Vec::with_capacity(rels.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(rels);
    boundaries.push(sweep);
    let bracket = bracket_index(&boundaries, cursor_rel);

    let mut pieces = Vec::new();
    if boundaries[bracket] > 0.0 {
        pieces.push(Arc {
            start_angle: arc.start_angle,
            end_angle: arc.start_angle + boundaries[bracket],
            ..*arc
        });
    }
    if boundaries[bracket + 1] < sweep {
        pieces.push(Arc {
            start_angle: arc.start_angle + boundaries[bracket + 1],
            end_angle: arc.end_angle,
            ..*arc
        });
    }
    // 过薄的残余圆弧按数值噪声丢弃
    pieces.retain(|piece| {
        let piece_sweep = piece.sweep();
        piece_sweep >= MIN_ARC_SWEEP && piece_sweep <= TAU - MIN_ARC_SWEEP
    });

    Some(match pieces.len() {
        0 => TrimAction::Delete,
        1 => TrimAction::Replace(Shape::Arc(pieces.remove(0))),
        _ => {
            let second = pieces.remove(1);
            TrimAction::Split(Shape::Arc(pieces.remove(0)), Shape::Arc(second))
        }
    })
}

/// 把绝对角换算成相对起始角的扫角坐标。边界容差内的值被
/// 吸附到端点；超出扫角范围返回 None。
fn to_relative(arc: &Arc, theta: f64, sweep: f64) -> Option<f64> {
    let rel = normalize_angle(theta - arc.start_angle);
    if rel <= sweep {
        Some(rel)
    } else if rel >= TAU - ANGLE_EPS {
        Some(0.0)
    } else if rel <= sweep + ANGLE_EPS {
        Some(sweep)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    /// 100 单位水平线 + 中点处的竖直交线。
    fn crossed_line(drawing: &mut Drawing) -> EntityId {
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), 0);
        drawing.add_line(Point2::new(50.0, -10.0), Point2::new(50.0, 10.0), 0);
        target
    }

    #[test]
    fn trim_keeps_cursor_side_with_single_intersection() {
        let mut drawing = Drawing::new();
        let target = crossed_line(&mut drawing);

        let plan = preview_trim(&drawing, target, Point2::new(20.0, 1.0)).expect("trimmable");
        let TrimAction::Replace(Shape::Line(kept)) = &plan.action else {
            panic!("expected an end trim, got {:?}", plan.action);
        };
        assert!(kept.start.distance(Point2::new(0.0, 0.0)) < 1e-9);
        assert!(kept.end.distance(Point2::new(50.0, 0.0)) < 1e-9);
        assert!((kept.length() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn preview_does_not_mutate_the_drawing() {
        let mut drawing = Drawing::new();
        let target = crossed_line(&mut drawing);
        let generation = drawing.generation();
        let count = drawing.len();

        preview_trim(&drawing, target, Point2::new(20.0, 1.0)).expect("trimmable");
        assert_eq!(drawing.generation(), generation);
        assert_eq!(drawing.len(), count);
    }

    #[test]
    fn middle_trim_splits_into_two_segments() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), 0);
        drawing.add_line(Point2::new(30.0, -10.0), Point2::new(30.0, 10.0), 0);
        drawing.add_line(Point2::new(70.0, -10.0), Point2::new(70.0, 10.0), 0);

        let plan = preview_trim(&drawing, target, Point2::new(50.0, 0.5)).expect("trimmable");
        let TrimAction::Split(Shape::Line(left), Shape::Line(right)) = &plan.action else {
            panic!("expected a middle trim, got {:?}", plan.action);
        };
        assert!(left.end.distance(Point2::new(30.0, 0.0)) < 1e-9);
        assert!(right.start.distance(Point2::new(70.0, 0.0)) < 1e-9);

        let before = drawing.len();
        commit_trim(&mut drawing, &plan).expect("commit");
        assert_eq!(drawing.len(), before + 1);
    }

    #[test]
    fn end_bracket_with_two_intersections_is_an_end_trim() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), 0);
        drawing.add_line(Point2::new(30.0, -10.0), Point2::new(30.0, 10.0), 0);
        drawing.add_line(Point2::new(70.0, -10.0), Point2::new(70.0, 10.0), 0);

        let plan = preview_trim(&drawing, target, Point2::new(10.0, 0.0)).expect("trimmable");
        let TrimAction::Replace(Shape::Line(kept)) = &plan.action else {
            panic!("expected an end trim, got {:?}", plan.action);
        };
        assert!(kept.start.distance(Point2::new(30.0, 0.0)) < 1e-9);
        assert!(kept.end.distance(Point2::new(100.0, 0.0)) < 1e-9);
    }

    #[test]
    fn no_intersections_removes_the_whole_entity() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), 0);

        let plan = preview_trim(&drawing, target, Point2::new(50.0, 0.0)).expect("trimmable");
        assert_eq!(plan.action, TrimAction::Delete);

        commit_trim(&mut drawing, &plan).expect("commit");
        assert!(drawing.entity(target).is_none());
    }

    #[test]
    fn circle_trim_leaves_complement_arc() {
        let mut drawing = Drawing::new();
        let target = drawing.add_circle(Point2::new(0.0, 0.0), 10.0, 0);
        drawing.add_line(Point2::new(0.0, -20.0), Point2::new(0.0, 20.0), 0);

        // cursor on the right rim: the bracket crossing the 0/2pi seam is removed
        let plan = preview_trim(&drawing, target, Point2::new(10.0, 0.1)).expect("trimmable");
        let TrimAction::Replace(Shape::Arc(arc)) = &plan.action else {
            panic!("expected a single remaining arc, got {:?}", plan.action);
        };
        assert!((arc.start_angle - FRAC_PI_2).abs() < 1e-9);
        assert!((arc.end_angle - 1.5 * PI).abs() < 1e-9);
        assert!((arc.sweep() - PI).abs() < 1e-9);
    }

    #[test]
    fn circle_without_intersections_is_deleted() {
        let mut drawing = Drawing::new();
        let target = drawing.add_circle(Point2::new(0.0, 0.0), 10.0, 0);
        let plan = preview_trim(&drawing, target, Point2::new(10.0, 0.0)).expect("trimmable");
        assert_eq!(plan.action, TrimAction::Delete);
    }

    #[test]
    fn arc_trim_outside_span_is_not_applicable() {
        let mut drawing = Drawing::new();
        let target = drawing.add_arc(Point2::new(0.0, 0.0), 10.0, 0.0, FRAC_PI_2, 0);
        // cursor at 180 degrees, far outside [0, 90]
        assert!(preview_trim(&drawing, target, Point2::new(-10.0, 0.0)).is_none());
    }

    #[test]
    fn arc_single_intersection_keeps_nearer_end_side() {
        let mut drawing = Drawing::new();
        let target = drawing.add_arc(Point2::new(0.0, 0.0), 10.0, 0.0, PI, 0);
        drawing.add_line(Point2::new(0.0, 0.0), Point2::new(0.0, 20.0), 0);

        // cursor near the start (angle pi/4): the start side survives
        let cursor = Point2::new(7.0, 7.0);
        let plan = preview_trim(&drawing, target, cursor).expect("trimmable");
        let TrimAction::Replace(Shape::Arc(kept)) = &plan.action else {
            panic!("expected an end trim, got {:?}", plan.action);
        };
        assert!((kept.start_angle - 0.0).abs() < 1e-9);
        assert!((kept.sweep() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn arc_interior_cut_emits_two_arcs() {
        let mut drawing = Drawing::new();
        let target = drawing.add_arc(Point2::new(0.0, 0.0), 10.0, 0.0, PI, 0);
        drawing.add_line(Point2::new(-3.0, 0.0), Point2::new(-3.0, 20.0), 0);
        drawing.add_line(Point2::new(3.0, 0.0), Point2::new(3.0, 20.0), 0);

        let plan = preview_trim(&drawing, target, Point2::new(0.0, 10.0)).expect("trimmable");
        let TrimAction::Split(Shape::Arc(first), Shape::Arc(second)) = &plan.action else {
            panic!("expected two remaining arcs, got {:?}", plan.action);
        };
        let cut_low = (3.0f64 / 10.0).acos();
        let cut_high = PI - cut_low;
        assert!((first.start_angle - 0.0).abs() < 1e-9);
        assert!((first.end_angle - cut_low).abs() < 1e-6);
        assert!((second.start_angle - cut_high).abs() < 1e-6);
        assert!((second.end_angle - PI).abs() < 1e-9);

        let before = drawing.len();
        commit_trim(&mut drawing, &plan).expect("commit");
        assert_eq!(drawing.len(), before + 1);
    }

    #[test]
    fn extend_relocates_near_endpoint_to_circle_boundary() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
        // the infinite extension crosses this circle 5 units beyond x=10
        drawing.add_circle(Point2::new(20.0, 0.0), 5.0, 0);

        let plan =
            preview_extend(&drawing, target, Point2::new(9.0, 0.5)).expect("boundary found");
        assert!(plan.extended.start.distance(Point2::new(0.0, 0.0)) < 1e-9);
        assert!(plan.extended.end.distance(Point2::new(15.0, 0.0)) < 1e-9);

        commit_extend(&mut drawing, &plan).expect("commit");
        let record = drawing.entity(target).expect("still present");
        let Shape::Line(line) = &record.shape else {
            panic!("extend must keep the line variant");
        };
        assert!((line.length() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn extend_prefers_smallest_overshoot() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
        drawing.add_line(Point2::new(40.0, -5.0), Point2::new(40.0, 5.0), 0);
        drawing.add_line(Point2::new(25.0, -5.0), Point2::new(25.0, 5.0), 0);

        let plan =
            preview_extend(&drawing, target, Point2::new(10.0, 0.0)).expect("boundary found");
        assert!(plan.boundary.distance(Point2::new(25.0, 0.0)) < 1e-9);
    }

    #[test]
    fn extend_without_boundary_is_not_applicable() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
        // a boundary exists, but only behind the far endpoint
        drawing.add_line(Point2::new(25.0, -5.0), Point2::new(25.0, 5.0), 0);
        assert!(preview_extend(&drawing, target, Point2::new(1.0, 0.0)).is_none());
    }

    #[test]
    fn extend_start_side_moves_start_only() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(10.0, 0.0), Point2::new(20.0, 0.0), 0);
        drawing.add_line(Point2::new(4.0, -5.0), Point2::new(4.0, 5.0), 0);

        let plan =
            preview_extend(&drawing, target, Point2::new(11.0, 0.0)).expect("boundary found");
        assert!(plan.extended.start.distance(Point2::new(4.0, 0.0)) < 1e-9);
        assert!(plan.extended.end.distance(Point2::new(20.0, 0.0)) < 1e-9);
    }

    #[test]
    fn trim_against_arc_requires_angular_containment() {
        let mut drawing = Drawing::new();
        let target = drawing.add_line(Point2::new(-20.0, 0.0), Point2::new(20.0, 0.0), 0);
        // upper half arc crosses y=0 only at its two endpoints; shifted up it
        // never touches the target within its span
        drawing.add_arc(Point2::new(0.0, 5.0), 10.0, 0.2, PI - 0.2, 0);

        let plan = preview_trim(&drawing, target, Point2::new(0.0, 0.0)).expect("trimmable");
        // the arc's circle would intersect, the arc itself does not
        assert_eq!(plan.action, TrimAction::Delete);
    }
}
