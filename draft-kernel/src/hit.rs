//! 命中测试与框选分类。

use draft_config::KernelConfig;
use draft_core::drawing::{Drawing, EntityId, Shape};
use draft_core::geometry::{
    Bounds2D, Point2, distance_point_to_segment, line_circle_intersection, segment_intersection,
};

/// 单实体命中测试：自顶向下（插入顺序的逆序）遍历，计算各类型
/// 的专用距离，第一个落在容差内的实体即命中。不可见图层被跳过。
///
/// `view_scale` 为每世界单位像素数，用来把像素容差换算到世界单位。
pub fn hit_test(
    drawing: &Drawing,
    point: Point2,
    cfg: &KernelConfig,
    view_scale: f64,
) -> Option<EntityId> {
    let tolerance = cfg.tolerances.hit_px / view_scale;
    for record in drawing.entities().rev() {
        if !drawing.is_layer_visible(record.layer) {
            continue;
        }
        if shape_hit(&record.shape, point, tolerance) {
            return Some(record.id);
        }
    }
    None
}

fn shape_hit(shape: &Shape, point: Point2, tolerance: f64) -> bool {
    match shape {
        Shape::Line(line) => distance_point_to_segment(point, line.start, line.end) <= tolerance,
        Shape::Circle(circle) => {
            (point.distance(circle.center) - circle.radius).abs() <= tolerance
        }
        Shape::Arc(arc) => {
            let theta = arc.center.vector_to(point).angle();
            arc.contains(theta)
                && (point.distance(arc.center) - arc.radius).abs() <= tolerance
        }
        Shape::Dimension(dimension) => {
            let (a, b) = dimension.measure_line();
            distance_point_to_segment(point, a, b) <= tolerance
        }
        Shape::Text(text) => text.approx_bounds().contains_point(point),
        Shape::Rectangle(rect) => rect
            .edges()
            .iter()
            .any(|(a, b)| distance_point_to_segment(point, *a, *b) <= tolerance),
    }
}

/// 框选语义由拖拽方向决定：从左向右为 window（必须完全包含），
/// 从右向左为 crossing（包含或与框边相交）。左右符号约定是对外
/// 契约，与实现细节无关。
pub fn box_select(drawing: &Drawing, first: Point2, second: Point2) -> Vec<EntityId> {
    let selection = Bounds2D::from_corners(first, second);
    let window = second.x() >= first.x();
    drawing
        .entities()
        .filter(|record| drawing.is_layer_visible(record.layer))
        .filter(|record| {
            let Some(bounds) = record.shape.bounds() else {
                return false;
            };
            if selection.contains_bounds(&bounds) {
                return true;
            }
            !window && shape_crosses_box(&record.shape, &selection)
        })
        .map(|record| record.id)
        .collect()
}

/// 实体边界是否与选择框的任一条边相交。
fn shape_crosses_box(shape: &Shape, selection: &Bounds2D) -> bool {
    match shape {
        Shape::Line(line) => segments_cross_box(&[(line.start, line.end)], selection),
        Shape::Rectangle(rect) => segments_cross_box(&rect.edges(), selection),
        Shape::Dimension(dimension) => {
            segments_cross_box(&[dimension.measure_line(), (dimension.start, dimension.end)], selection)
        }
        Shape::Circle(circle) => selection.edges().iter().any(|(a, b)| {
            line_circle_intersection(*a, *b, circle.center, circle.radius)
                .iter()
                .any(|(_, t)| (0.0..=1.0).contains(t))
        }),
        Shape::Arc(arc) => selection.edges().iter().any(|(a, b)| {
            line_circle_intersection(*a, *b, arc.center, arc.radius)
                .iter()
                .any(|(point, t)| {
                    (0.0..=1.0).contains(t) && arc.contains(arc.center.vector_to(*point).angle())
                })
        }),
        Shape::Text(text) => selection.intersects(&text.approx_bounds()),
    }
}

fn segments_cross_box(segments: &[(Point2, Point2)], selection: &Bounds2D) -> bool {
    segments.iter().any(|(a, b)| {
        selection.edges().iter().any(|(c, d)| {
            segment_intersection(*a, *b, *c, *d)
                .is_some_and(|hit| (0.0..=1.0).contains(&hit.t) && (0.0..=1.0).contains(&hit.u))
        })
    })
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use draft_core::drawing::Drawing;

    use super::*;

    fn config() -> KernelConfig {
        KernelConfig::default()
    }

    #[test]
    fn topmost_entity_wins_overlapping_hits() {
        let mut drawing = Drawing::new();
        let below = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
        let above = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
        let hit = hit_test(&drawing, Point2::new(5.0, 0.1), &config(), 1.0);
        assert_eq!(hit, Some(above));
        assert_ne!(hit, Some(below));
    }

    #[test]
    fn circle_is_hit_on_its_rim_not_inside() {
        let mut drawing = Drawing::new();
        let circle = drawing.add_circle(Point2::new(0.0, 0.0), 50.0, 0);
        let cfg = config();
        assert_eq!(
            hit_test(&drawing, Point2::new(50.0, 0.0), &cfg, 1.0),
            Some(circle)
        );
        // interior far from the rim does not hit
        assert_eq!(hit_test(&drawing, Point2::new(0.0, 0.0), &cfg, 1.0), None);
    }

    #[test]
    fn arc_hit_requires_angular_containment() {
        let mut drawing = Drawing::new();
        let arc = drawing.add_arc(Point2::new(0.0, 0.0), 10.0, 0.0, FRAC_PI_2, 0);
        let cfg = config();
        assert_eq!(
            hit_test(&drawing, Point2::new(7.0, 7.2), &cfg, 1.0),
            Some(arc)
        );
        // same radius but outside the span
        assert_eq!(hit_test(&drawing, Point2::new(-10.0, 0.0), &cfg, 1.0), None);
    }

    #[test]
    fn hit_tolerance_scales_with_view() {
        let mut drawing = Drawing::new();
        let line = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0), 0);
        let cfg = config();
        // zoomed in: 10px tolerance covers only 0.1 world units
        assert_eq!(hit_test(&drawing, Point2::new(50.0, 5.0), &cfg, 100.0), None);
        // zoomed out: the same pixel tolerance covers 10 world units
        assert_eq!(
            hit_test(&drawing, Point2::new(50.0, 5.0), &cfg, 1.0),
            Some(line)
        );
    }

    #[test]
    fn invisible_layers_are_skipped() {
        let mut drawing = Drawing::new();
        let hidden = drawing.ensure_layer("HIDDEN");
        drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), hidden);
        drawing.set_layer_visible(hidden, false);
        assert_eq!(hit_test(&drawing, Point2::new(5.0, 0.0), &config(), 1.0), None);
    }

    #[test]
    fn window_selection_requires_full_enclosure() {
        let mut drawing = Drawing::new();
        let inside = drawing.add_line(Point2::new(2.0, 2.0), Point2::new(8.0, 8.0), 0);
        let straddling = drawing.add_line(Point2::new(5.0, 5.0), Point2::new(20.0, 5.0), 0);

        // left-to-right drag: window semantics
        let picked = box_select(&drawing, Point2::new(0.0, 0.0), Point2::new(10.0, 10.0));
        assert_eq!(picked, vec![inside]);

        // right-to-left drag: crossing semantics also picks the straddler
        let picked = box_select(&drawing, Point2::new(10.0, 10.0), Point2::new(0.0, 0.0));
        assert!(picked.contains(&inside));
        assert!(picked.contains(&straddling));
    }

    #[test]
    fn crossing_selection_touches_circle_rim() {
        let mut drawing = Drawing::new();
        let circle = drawing.add_circle(Point2::new(0.0, 0.0), 10.0, 0);
        // box overlaps only the right rim of the circle
        let picked = box_select(&drawing, Point2::new(15.0, -5.0), Point2::new(8.0, 5.0));
        assert_eq!(picked, vec![circle]);
        // window drag over the same region selects nothing
        let picked = box_select(&drawing, Point2::new(8.0, -5.0), Point2::new(15.0, 5.0));
        assert!(picked.is_empty());
    }
}
