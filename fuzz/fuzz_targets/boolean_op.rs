#![no_main]

use libfuzzer_sys::fuzz_target;
use sweepclip::{arbitrary::BooleanOpInput, area, Clipper, PathType};

fuzz_target!(|input: BooleanOpInput| {
    let mut c = Clipper::new();
    c.add_paths(&input.subject, PathType::Subject, true).unwrap();
    c.add_paths(&input.clip, PathType::Clip, true).unwrap();
    // Failing is allowed on this kind of input; panicking or returning
    // wrongly-oriented output is not.
    let Ok(tree) = c.execute_tree(input.op, input.fill_rule, input.fill_rule) else {
        return;
    };
    for node in tree.iter() {
        let a = area(tree.contour(node));
        if tree.is_hole(node) {
            assert!(a <= 0.0, "hole {node:?} has area {a}");
        } else {
            assert!(a >= 0.0, "outer contour {node:?} has area {a}");
        }
    }
});
