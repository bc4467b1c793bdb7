use std::path::PathBuf;

use clap::{Args, Parser};
use kurbo::BezPath;

use sweepclip::{
    debug_svg, generators, path_from_bez, BooleanOp, ClipOptions, Clipper, FillRule, PathType,
    Paths,
};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Checkerboard,
    SlantedCheckerboard,
    Slanties,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Op {
    Union,
    Intersection,
    Difference,
    Xor,
}

impl From<Op> for BooleanOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Union => BooleanOp::Union,
            Op::Intersection => BooleanOp::Intersection,
            Op::Difference => BooleanOp::Difference,
            Op::Xor => BooleanOp::Xor,
        }
    }
}

#[derive(Parser)]
struct Cli {
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    input: Input,

    #[arg(long, value_enum, default_value = "xor")]
    op: Op,

    #[arg(long)]
    non_zero: bool,

    #[arg(long)]
    strictly_simple: bool,

    /// Also write the result as YAML.
    #[arg(long)]
    yaml: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Two SVG path strings, one per line: the subject and the clip.
    input: Option<PathBuf>,

    #[arg(long)]
    example: Option<Example>,
}

fn get_paths(input: &Input) -> anyhow::Result<(Paths, Paths)> {
    match (&input.input, &input.example) {
        (Some(path), _) => {
            let input = std::fs::read_to_string(path)?;
            let mut lines = input.lines().filter(|l| !l.trim().is_empty());
            let mut next = || -> anyhow::Result<Paths> {
                let line = lines
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("expected two paths"))?;
                Ok(path_from_bez(&BezPath::from_svg(line)?, 1e-2))
            };
            Ok((next()?, next()?))
        }
        (None, Some(Example::Checkerboard)) => Ok(generators::checkerboard(10)),
        (None, Some(Example::SlantedCheckerboard)) => Ok(generators::slanted_checkerboard(10)),
        (None, Some(Example::Slanties)) => Ok(generators::slanties(10)),
        (None, None) => anyhow::bail!("no input"),
    }
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let (subject, clip) = get_paths(&args.input)?;
    let fill = if args.non_zero {
        FillRule::NonZero
    } else {
        FillRule::EvenOdd
    };

    let mut c = Clipper::with_options(ClipOptions {
        strictly_simple: args.strictly_simple,
        ..ClipOptions::default()
    });
    c.add_paths(&subject, PathType::Subject, true)?;
    c.add_paths(&clip, PathType::Clip, true)?;
    let tree = c.execute_tree(args.op.into(), fill, fill)?;
    println!(
        "{} contours, {} of them holes",
        tree.total(),
        tree.iter().filter(|&n| tree.is_hole(n)).count()
    );

    svg::save(&args.output, &debug_svg::tree_document(&tree))?;
    if let Some(yaml) = &args.yaml {
        std::fs::write(yaml, serde_yaml::to_string(&tree)?)?;
    }
    Ok(())
}
