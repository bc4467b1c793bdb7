use kurbo::BezPath;
use libtest_mimic::{Arguments, Failed, Trial};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sweepclip::{
    area, path_from_bez, BooleanOp, ClipOptions, Clipper, ClipperOffset, EndType, FillRule,
    JoinType, OffsetOptions, PathType, Paths,
};

#[derive(Serialize, Deserialize, Debug)]
struct Offset {
    delta: f64,
    #[serde(default)]
    join: JoinType,
    #[serde(default)]
    end: EndType,
    #[serde(default)]
    options: OffsetOptions,
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(default)]
struct Expectation {
    /// Total signed area of the output.
    area: Option<f64>,
    tolerance: Option<f64>,
    contours: Option<usize>,
    holes: Option<usize>,
    vertices: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug)]
struct RegressionCaseDeclaration {
    svg_path_1: String,
    #[serde(default)]
    svg_path_2: String,
    #[serde(default)]
    fill_rule: FillRule,
    #[serde(default)]
    op: BooleanOp,
    #[serde(default)]
    options: ClipOptions,
    /// If present, the first path is offset instead of clipped.
    offset: Option<Offset>,
    #[serde(default)]
    expect: Expectation,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let file_paths = glob::glob(&format!("{ws}/tests/regression/**/*.yml")).unwrap();

    file_paths
        .into_iter()
        .map(|p| {
            let p = p.unwrap();
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || run_regression_case(p))
        })
        .collect()
}

fn input_path_base(input_path: &Path) -> &Path {
    let ws = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let base = format!("{ws}/tests/regression");
    input_path.strip_prefix(base).unwrap()
}

fn parse_paths(svg: &str) -> Result<Paths, Failed> {
    if svg.trim().is_empty() {
        return Ok(Vec::new());
    }
    let bez = BezPath::from_svg(svg).map_err(|e| format!("bad svg path {svg:?}: {e}"))?;
    Ok(path_from_bez(&bez, 1e-3))
}

fn run_regression_case(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path).map_err(|e| e.to_string())?;
    let case: RegressionCaseDeclaration =
        serde_yaml::from_str(&input).map_err(|e| e.to_string())?;
    let subject = parse_paths(&case.svg_path_1)?;
    let clip = parse_paths(&case.svg_path_2)?;

    let tree = match &case.offset {
        Some(offset) => {
            let mut o = ClipperOffset::with_options(offset.options);
            o.add_paths(&subject, offset.join, offset.end)?;
            o.execute_tree(offset.delta)?
        }
        None => {
            let mut c = Clipper::with_options(case.options);
            c.add_paths(&subject, PathType::Subject, true)?;
            c.add_paths(&clip, PathType::Clip, true)?;
            c.execute_tree(case.op, case.fill_rule, case.fill_rule)?
        }
    };
    let out = tree.closed_paths();
    check(&case.expect, &tree, &out, case.options.reverse_solution)
}

fn check(
    expect: &Expectation,
    tree: &sweepclip::PolyTree,
    out: &Paths,
    reversed: bool,
) -> Result<(), Failed> {
    // Orientation always follows nesting.
    for node in tree.iter() {
        let a = area(tree.contour(node));
        if (tree.is_hole(node) != reversed) != (a < 0.0) {
            return Err(format!("contour {node:?} has area {a} but hole = {}", tree.is_hole(node)).into());
        }
    }

    if let Some(expected) = expect.area {
        let actual: f64 = out.iter().map(|p| area(p)).sum();
        let tol = expect.tolerance.unwrap_or(1e-9);
        if (actual - expected).abs() > tol {
            return Err(format!("area {actual}, expected {expected} (within {tol})").into());
        }
    }
    if let Some(expected) = expect.contours {
        if out.len() != expected {
            return Err(format!("{} contours, expected {expected}: {out:?}", out.len()).into());
        }
    }
    if let Some(expected) = expect.holes {
        let holes = tree.iter().filter(|&n| tree.is_hole(n)).count();
        if holes != expected {
            return Err(format!("{holes} holes, expected {expected}").into());
        }
    }
    if let Some(expected) = expect.vertices {
        let vertices: usize = out.iter().map(|p| p.len()).sum();
        if vertices != expected {
            return Err(format!("{vertices} vertices, expected {expected}: {out:?}").into());
        }
    }
    Ok(())
}
