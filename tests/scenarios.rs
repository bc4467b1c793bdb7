use std::f64::consts::PI;

use sweepclip::{
    area, boolean_op, point_in_polygon, BooleanOp, ClipperOffset, EndType, FillRule, JoinType,
    OffsetOptions, Path, Paths, Point, PointInPolygon,
};

fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    vec![p(x0, y0), p(x1, y0), p(x1, y1), p(x0, y1)]
}

fn total_area(paths: &Paths) -> f64 {
    paths.iter().map(|p| area(p)).sum()
}

#[test]
fn overlapping_squares() {
    let a = [rect(0.0, 0.0, 10.0, 10.0)];
    let b = [rect(5.0, 5.0, 15.0, 15.0)];
    for (op, expected) in [
        (BooleanOp::Union, 175.0),
        (BooleanOp::Intersection, 25.0),
        (BooleanOp::Difference, 75.0),
        (BooleanOp::Xor, 150.0),
    ] {
        let out = boolean_op(&a, &b, FillRule::EvenOdd, op).unwrap();
        assert!((total_area(&out) - expected).abs() < 1e-9, "{op:?}: {out:?}");
        assert!(out.iter().all(|p| area(p) > 0.0));
    }
}

#[test]
fn round_offset_of_a_square() {
    let mut o = ClipperOffset::new();
    o.add_path(&rect(0.0, 0.0, 10.0, 10.0), JoinType::Round, EndType::ClosedPolygon)
        .unwrap();
    let out = o.execute(2.0).unwrap();
    assert_eq!(out.len(), 1);
    let exact = 100.0 + 40.0 * 2.0 + PI * 2.0 * 2.0;
    assert!((area(&out[0]) - exact).abs() < 2.0);
}

#[test]
fn shared_edge_is_removed() {
    let out = boolean_op(
        &[rect(0.0, 0.0, 10.0, 10.0)],
        &[rect(10.0, 0.0, 20.0, 10.0)],
        FillRule::EvenOdd,
        BooleanOp::Union,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].len(), 4);
    assert!((area(&out[0]) - 200.0).abs() < 1e-9);
    assert!(!out[0].contains(&p(10.0, 0.0)));
    assert!(!out[0].contains(&p(10.0, 10.0)));
}

#[test]
fn zero_offset_splits_a_bowtie() {
    let bowtie = [p(0.0, 0.0), p(10.0, 10.0), p(10.0, 0.0), p(0.0, 10.0)];
    let unsigned: f64 = 50.0;

    let mut o = ClipperOffset::with_options(OffsetOptions {
        strictly_simple: true,
        ..OffsetOptions::default()
    });
    o.add_path(&bowtie, JoinType::Miter, EndType::ClosedPolygon)
        .unwrap();
    let out = o.execute(0.0).unwrap();
    assert_eq!(out.len(), 2, "{out:?}");
    for tri in &out {
        assert_eq!(tri.len(), 3);
    }
    let sum: f64 = out.iter().map(|t| area(t).abs()).sum();
    assert!((sum - unsigned).abs() < 1e-9);
}

#[test]
fn disjoint_operands() {
    let a = [rect(0.0, 0.0, 4.0, 4.0)];
    let b = [rect(10.0, 0.0, 14.0, 4.0)];
    assert!(boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Intersection)
        .unwrap()
        .is_empty());
    let union = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Union).unwrap();
    assert_eq!(union.len(), 2);
    let xor = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Xor).unwrap();
    assert_eq!(xor.len(), 2);
    assert!((total_area(&xor) - total_area(&union)).abs() < 1e-9);
}

#[test]
fn difference_through_union() {
    let a = [rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)];
    let b = [rect(5.0, -5.0, 25.0, 5.0)];
    let direct = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Difference).unwrap();
    let both = boolean_op(&a, &b, FillRule::NonZero, BooleanOp::Union).unwrap();
    let via_union = boolean_op(&both, &b, FillRule::NonZero, BooleanOp::Difference).unwrap();
    assert!((total_area(&direct) - total_area(&via_union)).abs() < 1e-9);
    assert!((total_area(&direct) - 150.0).abs() < 1e-9);
}

#[test]
fn offset_out_and_back_in() {
    let hexagon: Path = (0..6)
        .map(|i| {
            let t = i as f64 / 6.0 * 2.0 * PI;
            p(10.0 * t.cos(), 10.0 * t.sin())
        })
        .collect();
    let opts = OffsetOptions {
        arc_tolerance: 0.05,
        ..OffsetOptions::default()
    };
    let d = 2.0;

    let mut o = ClipperOffset::with_options(opts);
    o.add_path(&hexagon, JoinType::Round, EndType::ClosedPolygon)
        .unwrap();
    let grown = o.execute(d).unwrap();
    let mut o = ClipperOffset::with_options(opts);
    o.add_paths(&grown, JoinType::Round, EndType::ClosedPolygon)
        .unwrap();
    let back = o.execute(-d).unwrap();

    assert_eq!(back.len(), 1);
    let perimeter = 60.0;
    assert!((area(&back[0]) - area(&hexagon)).abs() < perimeter * opts.arc_tolerance);
    let center = point_in_polygon(p(0.0, 0.0), &back[0]);
    assert_eq!(center, PointInPolygon::Inside);
}
