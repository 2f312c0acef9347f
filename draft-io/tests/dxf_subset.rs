use std::f64::consts::FRAC_PI_2;

use draft_core::drawing::Shape;
use draft_io::{DrawingLoader, DrawingSaver, DxfFacade};

const BASIC_ENTITIES: &str = "0\n\
SECTION\n\
2\n\
ENTITIES\n\
0\n\
LINE\n\
8\n\
GEOM\n\
10\n\
0.0\n\
20\n\
0.0\n\
11\n\
100.0\n\
21\n\
50.0\n\
0\n\
CIRCLE\n\
8\n\
GEOM\n\
10\n\
25.0\n\
20\n\
25.0\n\
40\n\
12.5\n\
0\n\
ARC\n\
8\n\
ANNOT\n\
10\n\
0.0\n\
20\n\
0.0\n\
40\n\
10.0\n\
50\n\
0.0\n\
51\n\
90.0\n\
0\n\
TEXT\n\
8\n\
ANNOT\n\
10\n\
5.0\n\
20\n\
6.0\n\
40\n\
2.5\n\
1\n\
hello\n\
0\n\
ENDSEC\n\
0\n\
EOF\n";

#[test]
fn parse_basic_entities() {
    let facade = DxfFacade::new();
    let (drawing, skipped) = facade.parse(BASIC_ENTITIES).expect("解析 DXF 失败");

    assert_eq!(skipped, 0);
    assert_eq!(drawing.len(), 4);

    let mut entities = drawing.entities();
    let Shape::Line(line) = &entities.next().expect("line").shape else {
        panic!("first entity should be a line");
    };
    assert!((line.end.x() - 100.0).abs() < 1e-9);
    assert!((line.end.y() - 50.0).abs() < 1e-9);

    let Shape::Circle(circle) = &entities.next().expect("circle").shape else {
        panic!("second entity should be a circle");
    };
    assert!((circle.radius - 12.5).abs() < 1e-9);

    // arc angles arrive in degrees and are stored as radians
    let Shape::Arc(arc) = &entities.next().expect("arc").shape else {
        panic!("third entity should be an arc");
    };
    assert!(arc.start_angle.abs() < 1e-9);
    assert!((arc.end_angle - FRAC_PI_2).abs() < 1e-9);

    let Shape::Text(text) = &entities.next().expect("text").shape else {
        panic!("fourth entity should be a text");
    };
    assert_eq!(text.content, "hello");
    assert!((text.height - 2.5).abs() < 1e-9);
}

#[test]
fn parse_records_layers() {
    let facade = DxfFacade::new();
    let (drawing, _) = facade.parse(BASIC_ENTITIES).expect("解析 DXF 失败");

    let names: Vec<&str> = drawing.layers().map(|layer| layer.name.as_str()).collect();
    assert_eq!(names, vec!["0", "GEOM", "ANNOT"]);
}

#[test]
fn unknown_entities_are_skipped_and_counted() {
    let source = "0\n\
SECTION\n\
2\n\
ENTITIES\n\
0\n\
LWPOLYLINE\n\
8\n\
0\n\
90\n\
2\n\
10\n\
0.0\n\
20\n\
0.0\n\
10\n\
5.0\n\
20\n\
5.0\n\
0\n\
LINE\n\
10\n\
0.0\n\
20\n\
0.0\n\
11\n\
1.0\n\
21\n\
1.0\n\
0\n\
ENDSEC\n\
0\n\
EOF\n";

    let facade = DxfFacade::new();
    let (drawing, skipped) = facade.parse(source).expect("解析 DXF 失败");
    assert_eq!(skipped, 1);
    assert_eq!(drawing.len(), 1);
}

#[test]
fn missing_coordinate_is_an_error() {
    let source = "0\n\
SECTION\n\
2\n\
ENTITIES\n\
0\n\
LINE\n\
10\n\
0.0\n\
20\n\
0.0\n\
11\n\
1.0\n\
0\n\
ENDSEC\n\
0\n\
EOF\n";

    let facade = DxfFacade::new();
    let err = facade.parse(source).unwrap_err();
    assert!(err.to_string().contains("21"));
}

#[test]
fn render_round_trips_through_parser() {
    let facade = DxfFacade::new();
    let (drawing, _) = facade.parse(BASIC_ENTITIES).expect("解析 DXF 失败");

    let rendered = facade.render(&drawing);
    let (reparsed, skipped) = facade.parse(&rendered).expect("重解析失败");

    assert_eq!(skipped, 0);
    assert_eq!(reparsed.len(), drawing.len());

    let Shape::Arc(arc) = &reparsed.entities().nth(2).expect("arc").shape else {
        panic!("third entity should be an arc");
    };
    assert!((arc.end_angle - FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn facade_reads_and_writes_files() {
    let dir = tempfile::tempdir().expect("临时目录创建失败");
    let path = dir.path().join("subset.dxf");

    let facade = DxfFacade::new();
    let (drawing, _) = facade.parse(BASIC_ENTITIES).expect("解析 DXF 失败");
    facade.save(&drawing, &path).expect("写出 DXF 失败");

    let loaded = facade.load(&path).expect("读取 DXF 失败");
    assert_eq!(loaded.len(), 4);
}
