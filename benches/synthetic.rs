use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sweepclip::{
    boolean_op,
    generators::{checkerboard, slanted_checkerboard, slanties, star_polygon, zigzag},
    simplify_polygon, BooleanOp, ClipperOffset, EndType, FillRule, JoinType,
};

fn xor(c: &mut Criterion) {
    let (even, odd) = checkerboard(10);
    c.bench_function("xor checkerboard", |b| {
        b.iter(|| black_box(boolean_op(&even, &odd, FillRule::EvenOdd, BooleanOp::Xor)))
    });

    let (even, odd) = slanted_checkerboard(10);
    c.bench_function("xor slanted checkerboard", |b| {
        b.iter(|| black_box(boolean_op(&even, &odd, FillRule::EvenOdd, BooleanOp::Xor)))
    });
}

fn intersections(c: &mut Criterion) {
    let (even, odd) = slanties(20);
    c.bench_function("union slanties", |b| {
        b.iter(|| black_box(boolean_op(&even, &odd, FillRule::NonZero, BooleanOp::Union)))
    });

    let star = star_polygon(101, 50, 100.0);
    c.bench_function("simplify star", |b| {
        b.iter(|| black_box(simplify_polygon(&star, FillRule::NonZero)))
    });
}

fn offset(c: &mut Criterion) {
    let line = zigzag(200, 5.0, 20.0);
    c.bench_function("offset zigzag", |b| {
        b.iter(|| {
            let mut o = ClipperOffset::new();
            o.add_path(&line, JoinType::Round, EndType::OpenRound)
                .unwrap();
            black_box(o.execute(3.0))
        })
    });

    let (even, _) = checkerboard(10);
    c.bench_function("shrink checkerboard", |b| {
        b.iter(|| {
            let mut o = ClipperOffset::new();
            o.add_paths(&even, JoinType::Miter, EndType::ClosedPolygon)
                .unwrap();
            black_box(o.execute(-2.0))
        })
    });
}

criterion_group!(benches, xor, intersections, offset);
criterion_main!(benches);
