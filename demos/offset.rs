use std::path::PathBuf;

use clap::Parser;
use kurbo::BezPath;

use sweepclip::{debug_svg, path_from_bez, ClipperOffset, EndType, JoinType, OffsetOptions};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Join {
    Square,
    Round,
    Miter,
}

#[derive(Parser)]
struct Cli {
    /// An SVG path string.
    path: String,

    #[arg(long)]
    output: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    delta: f64,

    #[arg(long, value_enum, default_value = "round")]
    join: Join,

    /// Treat the path as an open polyline with round caps.
    #[arg(long)]
    open: bool,

    #[arg(long, default_value_t = 2.0)]
    miter_limit: f64,

    #[arg(long, default_value_t = 0.25)]
    arc_tolerance: f64,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let paths = path_from_bez(&BezPath::from_svg(&args.path)?, 1e-2);
    let join = match args.join {
        Join::Square => JoinType::Square,
        Join::Round => JoinType::Round,
        Join::Miter => JoinType::Miter,
    };
    let end = if args.open {
        EndType::OpenRound
    } else {
        EndType::ClosedPolygon
    };

    let mut o = ClipperOffset::with_options(OffsetOptions {
        miter_limit: args.miter_limit,
        arc_tolerance: args.arc_tolerance,
        ..OffsetOptions::default()
    });
    o.add_paths(&paths, join, end)?;
    let out = o.execute(args.delta)?;

    svg::save(&args.output, &debug_svg::paths_document([&paths, &out]))?;
    Ok(())
}
