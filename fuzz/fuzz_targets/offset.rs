#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;
use sweepclip::{arbitrary::float_in_range, ClipperOffset, EndType, JoinType};

fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let mut seen = Vec::new();
    let paths = sweepclip::arbitrary::paths(&mut seen, u)?;
    let join = *u.choose(&[JoinType::Square, JoinType::Round, JoinType::Miter])?;
    let end = *u.choose(&[
        EndType::ClosedPolygon,
        EndType::ClosedLine,
        EndType::OpenButt,
        EndType::OpenSquare,
        EndType::OpenRound,
    ])?;
    let delta = float_in_range(-50.0, 50.0, u)?;

    let mut o = ClipperOffset::new();
    o.add_paths(&paths, join, end).unwrap();
    let _ = o.execute(delta);
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let _ = run(&mut Unstructured::new(data));
});
