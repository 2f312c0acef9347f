pub mod geometry {
    use std::f64::consts::TAU;

    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 2×2 线性方程组的行列式阈值，低于该值视为平行/共线退化。
    pub const DET_EPS: f64 = 1e-10;
    /// 沿线段参数 t 的去重容差，由修剪分段逻辑共用。
    pub const PARAM_EPS: f64 = 1e-3;
    /// 角度域的边界容差（弧度）。该值决定修剪时交点归属哪一段，不能随意调整。
    pub const ANGLE_EPS: f64 = 1e-3;
    /// 修剪后残余圆弧低于此扫角（弧度）视为数值噪声并丢弃。
    pub const MIN_ARC_SWEEP: f64 = 1e-2;
    /// 判定环形阵列扫角是否为整圈的容差（弧度）。
    pub const FULL_TURN_EPS: f64 = 1e-2;

    /// 二维点，内部以 `glam::DVec2` 表示，全部运算使用双精度。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
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
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn midpoint(self, other: Point2) -> Point2 {
            Self((self.0 + other.0) * 0.5)
        }

        /// 绕 `center` 逆时针旋转 `angle` 弧度。
        pub fn rotated_about(self, center: Point2, angle: f64) -> Point2 {
            let (sin, cos) = angle.sin_cos();
            let rel = self.0 - center.0;
            Self(DVec2::new(
                center.0.x + rel.x * cos - rel.y * sin,
                center.0.y + rel.x * sin + rel.y * cos,
            ))
        }

        /// 以 `base` 为基点按 `factor` 均匀缩放。
        #[inline]
        pub fn scaled_about(self, base: Point2, factor: f64) -> Point2 {
            Self(base.0 + (self.0 - base.0) * factor)
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn from_angle(angle: f64) -> Self {
            let (sin, cos) = angle.sin_cos();
            Self(DVec2::new(cos, sin))
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
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn dot(self, other: Vector2) -> f64 {
            self.0.dot(other.0)
        }

        #[inline]
        pub fn cross(self, other: Vector2) -> f64 {
            self.0.perp_dot(other.0)
        }

        #[inline]
        pub fn scaled(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        /// 逆时针旋转 90° 的垂直向量。
        #[inline]
        pub fn perp(self) -> Self {
            Self(DVec2::new(-self.0.y, self.0.x))
        }

        /// 单位化。长度退化时返回 None。
        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于框选与视图范围估算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 从任意两个对角点构造（自动归一化 min/max）。
        pub fn from_corners(a: Point2, b: Point2) -> Self {
            Self {
                min: Point2::new(a.x().min(b.x()), a.y().min(b.y())),
                max: Point2::new(a.x().max(b.x()), a.y().max(b.y())),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        #[inline]
        pub fn contains_point(&self, point: Point2) -> bool {
            !self.is_empty()
                && point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }

        /// 判定 `other` 是否被完全包含（框选 window 模式）。
        #[inline]
        pub fn contains_bounds(&self, other: &Bounds2D) -> bool {
            !self.is_empty()
                && !other.is_empty()
                && other.min.x() >= self.min.x()
                && other.min.y() >= self.min.y()
                && other.max.x() <= self.max.x()
                && other.max.y() <= self.max.y()
        }

        #[inline]
        pub fn intersects(&self, other: &Bounds2D) -> bool {
            !self.is_empty()
                && !other.is_empty()
                && self.min.x() <= other.max.x()
                && self.max.x() >= other.min.x()
                && self.min.y() <= other.max.y()
                && self.max.y() >= other.min.y()
        }

        /// 边界框的四条边，按逆时针顺序。
        pub fn edges(&self) -> [(Point2, Point2); 4] {
            let (min, max) = (self.min, self.max);
            let bl = min;
            let br = Point2::new(max.x(), min.y());
            let tr = max;
            let tl = Point2::new(min.x(), max.y());
            [(bl, br), (br, tr), (tr, tl), (tl, bl)]
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let min_vec = self.min.as_vec2();
            let max_vec = self.max.as_vec2();
            Point2::from_vec((min_vec + max_vec) * 0.5)
        }
    }

    /// 点到线段的投影距离（投影参数截断到 [0,1]）。
    /// 位于线段上的点返回精确的 0。
    pub fn distance_point_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
        let ab = a.vector_to(b);
        let len_sq = ab.length_squared();
        if len_sq <= f64::EPSILON {
            return p.distance(a);
        }
        let t = (a.vector_to(p).dot(ab) / len_sq).clamp(0.0, 1.0);
        let foot = a.translate(ab.scaled(t));
        let dist = p.distance(foot);
        if dist < 1e-9 { 0.0 } else { dist }
    }

    /// 两直线求交的结果：交点及其在两条线上的参数。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SegmentHit {
        pub point: Point2,
        /// 交点在 AB 上的参数（0 对应 A，1 对应 B）。
        pub t: f64,
        /// 交点在 CD 上的参数。
        pub u: f64,
    }

    /// 求 AB 与 CD 所在直线的交点。行列式绝对值低于 `DET_EPS`
    /// （平行或共线）时返回 None。参数范围约束由调用方决定：
    /// 线段求交要求 t、u ∈ [0,1]，延伸操作则使用无界的 t。
    pub fn segment_intersection(a: Point2, b: Point2, c: Point2, d: Point2) -> Option<SegmentHit> {
        let r = a.vector_to(b);
        let s = c.vector_to(d);
        let det = r.cross(s);
        if det.abs() < DET_EPS {
            return None;
        }
        let ac = a.vector_to(c);
        let t = ac.cross(s) / det;
        let u = ac.cross(r) / det;
        Some(SegmentHit {
            point: a.translate(r.scaled(t)),
            t,
            u,
        })
    }

    /// AB 所在直线与圆求交，返回 0、1（相切）或 2 个交点，
    /// 各自带有沿 AB 的参数 t。间距小于 `PARAM_EPS` 的重根合并为一个。
    pub fn line_circle_intersection(
        a: Point2,
        b: Point2,
        center: Point2,
        radius: f64,
    ) -> Vec<(Point2, f64)> {
        let d = a.vector_to(b);
        let f = center.vector_to(a);
        let qa = d.dot(d);
        if qa < DET_EPS {
            return Vec::new();
        }
        let qb = 2.0 * f.dot(d);
        let qc = f.dot(f) - radius * radius;
        let disc = qb * qb - 4.0 * qa * qc;
        if disc < 0.0 {
            return Vec::new();
        }
        let sqrt_disc = disc.sqrt();
        let t1 = (-qb - sqrt_disc) / (2.0 * qa);
        let t2 = (-qb + sqrt_disc) / (2.0 * qa);
        let mut hits = vec![(a.translate(d.scaled(t1)), t1)];
        if (t2 - t1).abs() >= PARAM_EPS {
            hits.push((a.translate(d.scaled(t2)), t2));
        }
        hits
    }

    /// 两圆求交（根轴法），返回 0、1 或 2 个交点。
    /// 圆心重合或一圆完全包含另一圆时无交点。
    pub fn circle_circle_intersection(
        center1: Point2,
        radius1: f64,
        center2: Point2,
        radius2: f64,
    ) -> Vec<Point2> {
        let delta = center1.vector_to(center2);
        let d = delta.length();
        if d < DET_EPS {
            return Vec::new();
        }
        let a = (radius1 * radius1 - radius2 * radius2 + d * d) / (2.0 * d);
        let h_sq = radius1 * radius1 - a * a;
        if h_sq < -1e-9 {
            return Vec::new();
        }
        let dir = delta.scaled(1.0 / d);
        let foot = center1.translate(dir.scaled(a));
        if h_sq <= 1e-9 {
            return vec![foot];
        }
        let h = h_sq.sqrt();
        let offset = dir.perp().scaled(h);
        vec![
            foot.translate(offset),
            foot.translate(offset.scaled(-1.0)),
        ]
    }

    /// 将角度归一化到 [0, 2π)。
    #[inline]
    pub fn normalize_angle(angle: f64) -> f64 {
        angle.rem_euclid(TAU)
    }

    /// 起始角到终止角的逆时针扫角，恒为非负，可超过半圈。
    #[inline]
    pub fn sweep_angle(start: f64, end: f64) -> f64 {
        normalize_angle(end - start)
    }

    /// 判定角 θ 是否落在 [start, end] 的逆时针扫角内。
    /// 边界处放宽 `ANGLE_EPS`：该容差决定交点能否参与圆弧修剪。
    pub fn contains_angle(start: f64, end: f64, theta: f64) -> bool {
        let sweep = sweep_angle(start, end);
        let rel = normalize_angle(theta - start);
        rel <= sweep + ANGLE_EPS || rel >= TAU - ANGLE_EPS
    }

    /// 三点定圆（闭式外心公式）。三点共线时返回 None。
    pub fn circle_from_three_points(a: Point2, b: Point2, c: Point2) -> Option<(Point2, f64)> {
        let d = 2.0
            * (a.x() * (b.y() - c.y()) + b.x() * (c.y() - a.y()) + c.x() * (a.y() - b.y()));
        if d.abs() < DET_EPS {
            return None;
        }
        let a_sq = a.as_vec2().length_squared();
        let b_sq = b.as_vec2().length_squared();
        let c_sq = c.as_vec2().length_squared();
        let ux = (a_sq * (b.y() - c.y()) + b_sq * (c.y() - a.y()) + c_sq * (a.y() - b.y())) / d;
        let uy = (a_sq * (c.x() - b.x()) + b_sq * (a.x() - c.x()) + c_sq * (b.x() - a.x())) / d;
        let center = Point2::new(ux, uy);
        Some((center, center.distance(a)))
    }

}

pub mod drawing {
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2, Vector2, sweep_angle};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
            }
        }
    }

    /// 捕捉点类别。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum SnapKind {
        Endpoint,
        Midpoint,
        Center,
        Quadrant,
        Insertion,
    }

    impl SnapKind {
        pub fn name(&self) -> &'static str {
            match self {
                SnapKind::Endpoint => "端点",
                SnapKind::Midpoint => "中点",
                SnapKind::Center => "圆心",
                SnapKind::Quadrant => "象限点",
                SnapKind::Insertion => "插入点",
            }
        }
    }

    /// 实体上可供光标吸附的几何特征点。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct SnapPoint {
        pub position: Point2,
        pub kind: SnapKind,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
    }

    impl Line {
        #[inline]
        pub fn new(start: Point2, end: Point2) -> Self {
            Self { start, end }
        }

        #[inline]
        pub fn midpoint(&self) -> Point2 {
            self.start.midpoint(self.end)
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.start.distance(self.end)
        }

        /// 单位方向向量。零长线段返回 None。
        #[inline]
        pub fn direction(&self) -> Option<Vector2> {
            Vector2::from_points(self.start, self.end).normalize()
        }

        /// 参数 t 处的点（t=0 为起点，t=1 为终点，允许越界）。
        #[inline]
        pub fn point_at(&self, t: f64) -> Point2 {
            self.start
                .translate(Vector2::from_points(self.start, self.end).scaled(t))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
    }

    /// 圆弧，角度以弧度储存且不做归一化；扫角按需计算，
    /// 恒为起始角到终止角的逆时针距离。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
    }

    impl Arc {
        #[inline]
        pub fn sweep(&self) -> f64 {
            sweep_angle(self.start_angle, self.end_angle)
        }

        /// 圆弧上角度 θ 对应的点。
        pub fn point_at(&self, theta: f64) -> Point2 {
            self.center
                .translate(Vector2::from_angle(theta).scaled(self.radius))
        }

        #[inline]
        pub fn start_point(&self) -> Point2 {
            self.point_at(self.start_angle)
        }

        #[inline]
        pub fn end_point(&self) -> Point2 {
            self.point_at(self.end_angle)
        }

        #[inline]
        pub fn contains(&self, theta: f64) -> bool {
            crate::geometry::contains_angle(self.start_angle, self.end_angle, theta)
        }
    }

    /// 线性尺寸标注：两个测量端点加垂直方向的显示偏移。
    /// 其显示的测量线参与修剪/延伸的边界计算。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Dimension {
        pub start: Point2,
        pub end: Point2,
        pub offset: f64,
    }

    impl Dimension {
        /// 实际绘制的测量线（按 offset 沿单位垂线平移后的线段）。
        /// 端点重合的退化标注直接返回原始端点。
        pub fn measure_line(&self) -> (Point2, Point2) {
            match Vector2::from_points(self.start, self.end).normalize() {
                Some(dir) => {
                    let shift = dir.perp().scaled(self.offset);
                    (self.start.translate(shift), self.end.translate(shift))
                }
                None => (self.start, self.end),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
        pub rotation: f64,
    }

    impl Text {
        /// 近似边界框：按字符数 × 字高估算宽度，忽略旋转。
        pub fn approx_bounds(&self) -> Bounds2D {
            let width = self.content.chars().count() as f64 * self.height;
            let mut bounds = Bounds2D::empty();
            bounds.include_point(self.insert);
            bounds.include_point(Point2::new(
                self.insert.x() + width,
                self.insert.y() + self.height,
            ));
            bounds
        }
    }

    /// 轴对齐矩形，由两个对角点定义，命中测试按四条边处理。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Rectangle {
        pub corner_a: Point2,
        pub corner_b: Point2,
    }

    impl Rectangle {
        /// 四个角点，从左下角开始逆时针。
        pub fn corners(&self) -> [Point2; 4] {
            let bounds = Bounds2D::from_corners(self.corner_a, self.corner_b);
            let (min, max) = (bounds.min(), bounds.max());
            [
                min,
                Point2::new(max.x(), min.y()),
                max,
                Point2::new(min.x(), max.y()),
            ]
        }

        pub fn edges(&self) -> [(Point2, Point2); 4] {
            let [a, b, c, d] = self.corners();
            [(a, b), (b, c), (c, d), (d, a)]
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            self.corner_a.midpoint(self.corner_b)
        }
    }

    /// 封闭的实体几何枚举。新增几何查询时由穷举匹配保证
    /// 每个变体都被处理。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum Shape {
        Line(Line),
        Circle(Circle),
        Arc(Arc),
        Dimension(Dimension),
        Text(Text),
        Rectangle(Rectangle),
    }

    impl Shape {
        pub fn kind_name(&self) -> &'static str {
            match self {
                Shape::Line(_) => "line",
                Shape::Circle(_) => "circle",
                Shape::Arc(_) => "arc",
                Shape::Dimension(_) => "dimension",
                Shape::Text(_) => "text",
                Shape::Rectangle(_) => "rectangle",
            }
        }

        /// 实体的 2D 轴对齐范围。文本退化为近似框。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            match self {
                Shape::Line(line) => {
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                }
                Shape::Circle(circle) => {
                    let radius = circle.radius.abs();
                    let center = circle.center;
                    bounds.include_point(Point2::new(center.x() - radius, center.y() - radius));
                    bounds.include_point(Point2::new(center.x() + radius, center.y() + radius));
                }
                Shape::Arc(arc) => {
                    arc_bounds(arc, &mut bounds);
                }
                Shape::Dimension(dimension) => {
                    bounds.include_point(dimension.start);
                    bounds.include_point(dimension.end);
                    let (a, b) = dimension.measure_line();
                    bounds.include_point(a);
                    bounds.include_point(b);
                }
                Shape::Text(text) => {
                    bounds.include_bounds(&text.approx_bounds());
                }
                Shape::Rectangle(rect) => {
                    bounds.include_point(rect.corner_a);
                    bounds.include_point(rect.corner_b);
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        /// 收集实体的捕捉点：端点、中点、圆心、象限点、插入点。
        pub fn snap_points(&self, out: &mut Vec<SnapPoint>) {
            let mut push = |position: Point2, kind: SnapKind| {
                out.push(SnapPoint { position, kind });
            };
            match self {
                Shape::Line(line) => {
                    push(line.start, SnapKind::Endpoint);
                    push(line.end, SnapKind::Endpoint);
                    push(line.midpoint(), SnapKind::Midpoint);
                }
                Shape::Circle(circle) => {
                    push(circle.center, SnapKind::Center);
                    for quadrant in quadrant_angles() {
                        push(
                            circle
                                .center
                                .translate(Vector2::from_angle(quadrant).scaled(circle.radius)),
                            SnapKind::Quadrant,
                        );
                    }
                }
                Shape::Arc(arc) => {
                    push(arc.center, SnapKind::Center);
                    push(arc.start_point(), SnapKind::Endpoint);
                    push(arc.end_point(), SnapKind::Endpoint);
                    push(
                        arc.point_at(arc.start_angle + arc.sweep() / 2.0),
                        SnapKind::Midpoint,
                    );
                    for quadrant in quadrant_angles() {
                        if arc.contains(quadrant) {
                            push(arc.point_at(quadrant), SnapKind::Quadrant);
                        }
                    }
                }
                Shape::Dimension(dimension) => {
                    push(dimension.start, SnapKind::Endpoint);
                    push(dimension.end, SnapKind::Endpoint);
                    let (a, b) = dimension.measure_line();
                    push(a.midpoint(b), SnapKind::Midpoint);
                }
                Shape::Text(text) => {
                    push(text.insert, SnapKind::Insertion);
                }
                Shape::Rectangle(rect) => {
                    for (a, b) in rect.edges() {
                        push(a, SnapKind::Endpoint);
                        push(a.midpoint(b), SnapKind::Midpoint);
                    }
                    push(rect.center(), SnapKind::Center);
                }
            }
        }

        /// 平移后的副本。
        pub fn translated(&self, offset: Vector2) -> Shape {
            match self {
                Shape::Line(line) => Shape::Line(Line {
                    start: line.start.translate(offset),
                    end: line.end.translate(offset),
                }),
                Shape::Circle(circle) => Shape::Circle(Circle {
                    center: circle.center.translate(offset),
                    radius: circle.radius,
                }),
                Shape::Arc(arc) => Shape::Arc(Arc {
                    center: arc.center.translate(offset),
                    ..arc.clone()
                }),
                Shape::Dimension(dimension) => Shape::Dimension(Dimension {
                    start: dimension.start.translate(offset),
                    end: dimension.end.translate(offset),
                    offset: dimension.offset,
                }),
                Shape::Text(text) => Shape::Text(Text {
                    insert: text.insert.translate(offset),
                    ..text.clone()
                }),
                Shape::Rectangle(rect) => Shape::Rectangle(Rectangle {
                    corner_a: rect.corner_a.translate(offset),
                    corner_b: rect.corner_b.translate(offset),
                }),
            }
        }

        /// 绕 `center` 旋转 `angle` 后的副本。圆弧的起止角同步偏移，
        /// 文本的旋转字段累加相同增量。
        pub fn rotated_about(&self, center: Point2, angle: f64) -> Shape {
            match self {
                Shape::Line(line) => Shape::Line(Line {
                    start: line.start.rotated_about(center, angle),
                    end: line.end.rotated_about(center, angle),
                }),
                Shape::Circle(circle) => Shape::Circle(Circle {
                    center: circle.center.rotated_about(center, angle),
                    radius: circle.radius,
                }),
                Shape::Arc(arc) => Shape::Arc(Arc {
                    center: arc.center.rotated_about(center, angle),
                    radius: arc.radius,
                    start_angle: arc.start_angle + angle,
                    end_angle: arc.end_angle + angle,
                }),
                Shape::Dimension(dimension) => Shape::Dimension(Dimension {
                    start: dimension.start.rotated_about(center, angle),
                    end: dimension.end.rotated_about(center, angle),
                    offset: dimension.offset,
                }),
                Shape::Text(text) => Shape::Text(Text {
                    insert: text.insert.rotated_about(center, angle),
                    rotation: text.rotation + angle,
                    ..text.clone()
                }),
                // 旋转后矩形仍按轴对齐角点储存：旋转角点后重新取对角。
                Shape::Rectangle(rect) => Shape::Rectangle(Rectangle {
                    corner_a: rect.corner_a.rotated_about(center, angle),
                    corner_b: rect.corner_b.rotated_about(center, angle),
                }),
            }
        }

        /// 以 `base` 为基点按 `factor` 缩放后的副本。半径直接乘以因子，
        /// 圆弧角度不变。调用方保证 factor > 0。
        pub fn scaled_about(&self, base: Point2, factor: f64) -> Shape {
            match self {
                Shape::Line(line) => Shape::Line(Line {
                    start: line.start.scaled_about(base, factor),
                    end: line.end.scaled_about(base, factor),
                }),
                Shape::Circle(circle) => Shape::Circle(Circle {
                    center: circle.center.scaled_about(base, factor),
                    radius: circle.radius * factor,
                }),
                Shape::Arc(arc) => Shape::Arc(Arc {
                    center: arc.center.scaled_about(base, factor),
                    radius: arc.radius * factor,
                    start_angle: arc.start_angle,
                    end_angle: arc.end_angle,
                }),
                Shape::Dimension(dimension) => Shape::Dimension(Dimension {
                    start: dimension.start.scaled_about(base, factor),
                    end: dimension.end.scaled_about(base, factor),
                    offset: dimension.offset * factor,
                }),
                Shape::Text(text) => Shape::Text(Text {
                    insert: text.insert.scaled_about(base, factor),
                    height: text.height * factor,
                    ..text.clone()
                }),
                Shape::Rectangle(rect) => Shape::Rectangle(Rectangle {
                    corner_a: rect.corner_a.scaled_about(base, factor),
                    corner_b: rect.corner_b.scaled_about(base, factor),
                }),
            }
        }
    }

    #[inline]
    fn quadrant_angles() -> [f64; 4] {
        [0.0, FRAC_PI_2, PI, 1.5 * PI]
    }

    fn arc_bounds(arc: &Arc, bounds: &mut Bounds2D) {
        bounds.include_point(arc.start_point());
        bounds.include_point(arc.end_point());
        for quadrant in quadrant_angles() {
            if arc.contains(quadrant) {
                bounds.include_point(arc.point_at(quadrant));
            }
        }
    }

    /// 图形集合中的一条记录：标识、图层索引、选中标志与几何。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct EntityRecord {
        pub id: EntityId,
        pub layer: usize,
        pub selected: bool,
        pub shape: Shape,
    }

    /// 平坦、按插入顺序排列的实体集合。插入顺序即 z 序
    /// （命中测试自顶向下逆序遍历）。`generation` 在每次几何
    /// 变更时递增，捕捉点缓存据此判定是否需要重建。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Drawing {
        layers: Vec<Layer>,
        entities: Vec<EntityRecord>,
        next_id: u64,
        generation: u64,
    }

    impl Drawing {
        pub fn new() -> Self {
            let mut drawing = Self::default();
            drawing.ensure_layer("0");
            drawing
        }

        /// 返回图层索引，不存在时创建。
        pub fn ensure_layer(&mut self, name: impl AsRef<str>) -> usize {
            let key = name.as_ref();
            if let Some(index) = self.layers.iter().position(|layer| layer.name == key) {
                return index;
            }
            self.layers.push(Layer::new(key));
            self.layers.len() - 1
        }

        #[inline]
        pub fn layer(&self, index: usize) -> Option<&Layer> {
            self.layers.get(index)
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.iter()
        }

        pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> bool {
            if let Some(layer) = self.layers.get_mut(index) {
                layer.is_visible = visible;
                self.generation += 1;
                true
            } else {
                false
            }
        }

        #[inline]
        pub fn is_layer_visible(&self, index: usize) -> bool {
            self.layers.get(index).is_none_or(|layer| layer.is_visible)
        }

        #[inline]
        pub fn generation(&self) -> u64 {
            self.generation
        }

        fn next_id(&mut self) -> EntityId {
            let id = EntityId::new(self.next_id);
            self.next_id += 1;
            id
        }

        /// 添加任意几何，返回新实体 ID。
        pub fn add_shape(&mut self, shape: Shape, layer: usize) -> EntityId {
            let id = self.next_id();
            self.entities.push(EntityRecord {
                id,
                layer,
                selected: false,
                shape,
            });
            self.generation += 1;
            id
        }

        pub fn add_line(&mut self, start: Point2, end: Point2, layer: usize) -> EntityId {
            self.add_shape(Shape::Line(Line::new(start, end)), layer)
        }

        pub fn add_circle(&mut self, center: Point2, radius: f64, layer: usize) -> EntityId {
            self.add_shape(Shape::Circle(Circle { center, radius }), layer)
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: usize,
        ) -> EntityId {
            self.add_shape(
                Shape::Arc(Arc {
                    center,
                    radius,
                    start_angle,
                    end_angle,
                }),
                layer,
            )
        }

        pub fn add_dimension(
            &mut self,
            start: Point2,
            end: Point2,
            offset: f64,
            layer: usize,
        ) -> EntityId {
            self.add_shape(Shape::Dimension(Dimension { start, end, offset }), layer)
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            rotation: f64,
            layer: usize,
        ) -> EntityId {
            self.add_shape(
                Shape::Text(Text {
                    insert,
                    content: content.into(),
                    height,
                    rotation,
                }),
                layer,
            )
        }

        pub fn add_rectangle(
            &mut self,
            corner_a: Point2,
            corner_b: Point2,
            layer: usize,
        ) -> EntityId {
            self.add_shape(Shape::Rectangle(Rectangle { corner_a, corner_b }), layer)
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
            self.entities.iter().find(|record| record.id == id)
        }

        /// 可变访问实体。调用即视为几何变更，代数计数器递增。
        pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
            self.generation += 1;
            self.entities.iter_mut().find(|record| record.id == id)
        }

        /// 用新几何替换实体，保留其图层与选中状态。
        pub fn replace_shape(&mut self, id: EntityId, shape: Shape) -> bool {
            if let Some(record) = self.entities.iter_mut().find(|record| record.id == id) {
                record.shape = shape;
                self.generation += 1;
                true
            } else {
                false
            }
        }

        /// 从集合中剔除实体。
        pub fn remove(&mut self, id: EntityId) -> Option<EntityRecord> {
            let index = self.entities.iter().position(|record| record.id == id)?;
            self.generation += 1;
            Some(self.entities.remove(index))
        }

        /// 按插入顺序迭代；命中测试需要自顶向下，因此支持逆序。
        #[inline]
        pub fn entities(&self) -> impl DoubleEndedIterator<Item = &EntityRecord> {
            self.entities.iter()
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        /// 选中标志不影响几何，因此不递增代数计数器。
        pub fn set_selected(&mut self, id: EntityId, selected: bool) -> bool {
            if let Some(record) = self.entities.iter_mut().find(|record| record.id == id) {
                record.selected = selected;
                true
            } else {
                false
            }
        }

        pub fn clear_selection(&mut self) {
            for record in &mut self.entities {
                record.selected = false;
            }
        }

        #[inline]
        pub fn selected_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
            self.entities
                .iter()
                .filter(|record| record.selected)
                .map(|record| record.id)
        }

        /// 整幅图形的包围盒。
        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for record in &self.entities {
                if let Some(entity_bounds) = record.shape.bounds() {
                    bounds.include_bounds(&entity_bounds);
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    #[cfg(test)]
    mod tests {
        use std::f64::consts::FRAC_PI_2;

        use super::*;

        #[test]
        fn generation_counter_tracks_mutations() {
            let mut drawing = Drawing::new();
            let before = drawing.generation();
            let id = drawing.add_line(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), 0);
            assert!(drawing.generation() > before);

            let before = drawing.generation();
            drawing.replace_shape(
                id,
                Shape::Line(Line::new(Point2::new(0.0, 0.0), Point2::new(5.0, 0.0))),
            );
            assert!(drawing.generation() > before);

            let before = drawing.generation();
            drawing.remove(id).expect("entity exists");
            assert!(drawing.generation() > before);

            // selection flips are not geometry changes
            let id = drawing.add_circle(Point2::new(0.0, 0.0), 1.0, 0);
            let before = drawing.generation();
            drawing.set_selected(id, true);
            assert_eq!(drawing.generation(), before);
        }

        #[test]
        fn fresh_ids_are_never_reused() {
            let mut drawing = Drawing::new();
            let first = drawing.add_circle(Point2::new(0.0, 0.0), 1.0, 0);
            drawing.remove(first).unwrap();
            let second = drawing.add_circle(Point2::new(0.0, 0.0), 1.0, 0);
            assert_ne!(first, second);
        }

        #[test]
        fn line_snap_points_include_endpoints_and_midpoint() {
            let shape = Shape::Line(Line::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)));
            let mut points = Vec::new();
            shape.snap_points(&mut points);
            assert_eq!(points.len(), 3);
            assert!(points.iter().any(|p| p.kind == SnapKind::Midpoint
                && p.position.distance(Point2::new(5.0, 0.0)) < 1e-9));
        }

        #[test]
        fn arc_snap_points_respect_angular_span() {
            let shape = Shape::Arc(Arc {
                center: Point2::new(0.0, 0.0),
                radius: 10.0,
                start_angle: 0.0,
                end_angle: FRAC_PI_2,
            });
            let mut points = Vec::new();
            shape.snap_points(&mut points);
            // center + two endpoints + arc midpoint + quadrants at 0 and pi/2
            let quadrants: Vec<_> = points
                .iter()
                .filter(|p| p.kind == SnapKind::Quadrant)
                .collect();
            assert_eq!(quadrants.len(), 2);
            assert!(!points.iter().any(|p| p.kind == SnapKind::Quadrant
                && p.position.distance(Point2::new(-10.0, 0.0)) < 1e-9));
        }

        #[test]
        fn arc_bounds_include_contained_quadrants() {
            let shape = Shape::Arc(Arc {
                center: Point2::new(0.0, 0.0),
                radius: 10.0,
                start_angle: 0.0,
                end_angle: PI,
            });
            let bounds = shape.bounds().expect("arc has bounds");
            assert!((bounds.max().y() - 10.0).abs() < 1e-9);
            assert!((bounds.min().y() - 0.0).abs() < 1e-9);
            assert!((bounds.min().x() + 10.0).abs() < 1e-9);
        }

        #[test]
        fn rotated_arc_shifts_angles_by_delta() {
            let shape = Shape::Arc(Arc {
                center: Point2::new(10.0, 0.0),
                radius: 2.0,
                start_angle: 0.0,
                end_angle: FRAC_PI_2,
            });
            let rotated = shape.rotated_about(Point2::new(0.0, 0.0), FRAC_PI_2);
            let Shape::Arc(arc) = rotated else {
                panic!("rotation must preserve the variant");
            };
            assert!(arc.center.distance(Point2::new(0.0, 10.0)) < 1e-9);
            assert!((arc.start_angle - FRAC_PI_2).abs() < 1e-12);
            assert!((sweep_angle(arc.start_angle, arc.end_angle) - FRAC_PI_2).abs() < 1e-12);
        }

        #[test]
        fn scaling_multiplies_radii_and_keeps_arc_angles() {
            let shape = Shape::Arc(Arc {
                center: Point2::new(4.0, 0.0),
                radius: 2.0,
                start_angle: 0.3,
                end_angle: 1.7,
            });
            let scaled = shape.scaled_about(Point2::new(0.0, 0.0), 2.0);
            let Shape::Arc(arc) = scaled else {
                panic!("scaling must preserve the variant");
            };
            assert!(arc.center.distance(Point2::new(8.0, 0.0)) < 1e-9);
            assert!((arc.radius - 4.0).abs() < 1e-12);
            assert!((arc.start_angle - 0.3).abs() < 1e-12);
            assert!((arc.end_angle - 1.7).abs() < 1e-12);
        }

        #[test]
        fn dimension_measure_line_is_offset_perpendicular() {
            let dimension = Dimension {
                start: Point2::new(0.0, 0.0),
                end: Point2::new(10.0, 0.0),
                offset: 5.0,
            };
            let (a, b) = dimension.measure_line();
            assert!(a.distance(Point2::new(0.0, 5.0)) < 1e-9);
            assert!(b.distance(Point2::new(10.0, 5.0)) < 1e-9);
        }

        #[test]
        fn ensure_layer_deduplicates_by_name() {
            let mut drawing = Drawing::new();
            let annot = drawing.ensure_layer("ANNOT");
            assert_eq!(drawing.ensure_layer("ANNOT"), annot);
            assert_eq!(drawing.ensure_layer("0"), 0);
            assert_eq!(drawing.layers().count(), 2);
        }

        #[test]
        fn hidden_layer_is_reported_invisible() {
            let mut drawing = Drawing::new();
            let layer = drawing.ensure_layer("HIDDEN");
            assert!(drawing.is_layer_visible(layer));
            assert!(drawing.set_layer_visible(layer, false));
            assert!(!drawing.is_layer_visible(layer));
        }

        #[test]
        fn full_circle_arc_has_zero_sweep_storage_untouched() {
            let arc = Arc {
                center: Point2::new(0.0, 0.0),
                radius: 1.0,
                start_angle: TAU + 0.5,
                end_angle: TAU + 0.5,
            };
            // storage is unnormalized; sweep is computed on demand
            assert!((arc.start_angle - (TAU + 0.5)).abs() < 1e-12);
            assert!(arc.sweep().abs() < 1e-12);
        }
    }
}
