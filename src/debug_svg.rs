//! SVG output, for looking at inputs and results while debugging.

use svg::{
    node::element::{path::Data, Path as SvgPath},
    Document,
};

use crate::{bounds, Path, Paths, PolyTree, Rect};

const COLORS: [&str; 9] = [
    "#005F73", "#0A9396", "#94D2BD", "#E9D8A6", "#EE9B00", "#CA6702", "#BB3E03", "#AE2012",
    "#9B2226",
];

fn path_data(mut data: Data, path: &Path, closed: bool) -> Data {
    let Some((first, rest)) = path.split_first() else {
        return data;
    };
    data = data.move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    if closed {
        data = data.close();
    }
    data
}

fn stroke_width(r: &Rect) -> f64 {
    r.width().max(r.height()).max(1.0) / 512.0
}

/// A document whose view box fits `r`, flipped so that `y` points up.
fn document(r: &Rect) -> Document {
    let pad = stroke_width(r) * 8.0;
    Document::new()
        .set(
            "viewBox",
            (
                r.min_x - pad,
                -r.max_y - pad,
                r.width() + 2.0 * pad,
                r.height() + 2.0 * pad,
            ),
        )
        .set("transform", "scale(1, -1)")
}

/// Draws several layers of closed paths, each in its own color.
///
/// Each layer is filled with the even-odd rule so that holes show up.
pub fn paths_document<'a>(layers: impl IntoIterator<Item = &'a Paths> + Clone) -> Document {
    let r = bounds(layers.clone().into_iter().flatten())
        .unwrap_or_else(|| Rect::from_point(crate::Point::default()));
    let sw = stroke_width(&r);
    let mut doc = document(&r);
    for (i, layer) in layers.into_iter().enumerate() {
        let data = layer
            .iter()
            .fold(Data::new(), |data, p| path_data(data, p, true));
        let path = SvgPath::new()
            .set("d", data)
            .set("stroke", "black")
            .set("stroke-width", sw)
            .set("stroke-linejoin", "round")
            .set("fill-rule", "evenodd")
            .set("fill", COLORS[i % COLORS.len()])
            .set("opacity", 0.6);
        doc = doc.add(path);
    }
    doc
}

/// Draws a polygon tree: each outer contour gets a color together with its
/// holes, and open paths are drawn as strokes.
pub fn tree_document(tree: &PolyTree) -> Document {
    let all = tree.to_paths();
    let r = bounds(&all).unwrap_or_else(|| Rect::from_point(crate::Point::default()));
    let sw = stroke_width(&r);
    let mut doc = document(&r);

    let mut color_idx = 0;
    for node in tree.iter() {
        if tree.is_open(node) {
            let path = SvgPath::new()
                .set("d", path_data(Data::new(), tree.contour(node), false))
                .set("stroke", "black")
                .set("stroke-width", sw * 2.0)
                .set("stroke-linecap", "round")
                .set("fill", "none");
            doc = doc.add(path);
        } else if !tree.is_hole(node) {
            let mut data = path_data(Data::new(), tree.contour(node), true);
            for &hole in tree.children(node) {
                data = path_data(data, tree.contour(hole), true);
            }
            let path = SvgPath::new()
                .set("d", data)
                .set("stroke", "black")
                .set("stroke-width", sw)
                .set("stroke-linejoin", "round")
                .set("fill-rule", "evenodd")
                .set("fill", COLORS[color_idx]);
            doc = doc.add(path);
            color_idx = (color_idx + 1) % COLORS.len();
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    #[test]
    fn draws_every_layer() {
        let square = vec![vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]];
        let doc = paths_document([&square, &square]).to_string();
        assert_eq!(doc.matches("<path").count(), 2);
        assert!(doc.contains("evenodd"));
    }
}
