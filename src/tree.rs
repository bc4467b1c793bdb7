//! A nested representation of clipping output.
//!
//! A [`PolyTree`] is a forest: its roots are outer contours and open paths,
//! the children of an outer contour are its holes, the children of a hole
//! are the outer contours (islands) inside it, and so on.

use serde::ser::{SerializeSeq, SerializeStruct};

use crate::{Path, Paths};

/// The index of a node in a [`PolyTree`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(usize);

impl_typed_vec!(struct Nodes<T>[NodeIdx], "n");

#[derive(Clone, Debug)]
struct PolyNode {
    contour: Path,
    parent: Option<NodeIdx>,
    children: Vec<NodeIdx>,
    is_open: bool,
}

/// Polygons and polylines, arranged by nesting.
#[derive(Clone, Debug, Default)]
pub struct PolyTree {
    nodes: Nodes<PolyNode>,
    roots: Vec<NodeIdx>,
}

impl PolyTree {
    /// The top-level nodes: outer contours that aren't inside anything,
    /// and open paths.
    pub fn roots(&self) -> &[NodeIdx] {
        &self.roots
    }

    /// The nodes directly nested in `node`.
    pub fn children(&self, node: NodeIdx) -> &[NodeIdx] {
        &self.nodes[node].children
    }

    /// The node that `node` is directly nested in.
    pub fn parent(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.nodes[node].parent
    }

    /// Is this node a hole? Holes are the nodes at odd depths.
    pub fn is_hole(&self, node: NodeIdx) -> bool {
        let mut hole = false;
        let mut n = self.nodes[node].parent;
        while let Some(p) = n {
            hole = !hole;
            n = self.nodes[p].parent;
        }
        hole
    }

    /// Is this node an open path?
    pub fn is_open(&self, node: NodeIdx) -> bool {
        self.nodes[node].is_open
    }

    /// The vertices of this node's contour.
    pub fn contour(&self, node: NodeIdx) -> &Path {
        &self.nodes[node].contour
    }

    /// The total number of nodes.
    pub fn total(&self) -> usize {
        self.nodes.len()
    }

    /// Are there no nodes at all?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes depth-first, each parent before its children.
    pub fn iter(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        let mut stack: Vec<NodeIdx> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let n = stack.pop()?;
            stack.extend(self.nodes[n].children.iter().rev().copied());
            Some(n)
        })
    }

    /// All contours, in depth-first order.
    pub fn to_paths(&self) -> Paths {
        self.iter().map(|n| self.contour(n).clone()).collect()
    }

    /// The closed contours, in depth-first order.
    pub fn closed_paths(&self) -> Paths {
        self.iter()
            .filter(|&n| !self.is_open(n))
            .map(|n| self.contour(n).clone())
            .collect()
    }

    /// The open paths. These are only ever roots.
    pub fn open_paths(&self) -> Paths {
        self.roots
            .iter()
            .filter(|&&n| self.is_open(n))
            .map(|&n| self.contour(n).clone())
            .collect()
    }

    /// Adds a node without attaching it anywhere.
    pub(crate) fn add_node(&mut self, contour: Path, is_open: bool) -> NodeIdx {
        self.nodes.push(PolyNode {
            contour,
            parent: None,
            children: Vec::new(),
            is_open,
        })
    }

    /// Makes `node` a child of `parent`, or a root.
    pub(crate) fn attach(&mut self, node: NodeIdx, parent: Option<NodeIdx>) {
        self.nodes[node].parent = parent;
        match parent {
            Some(p) => self.nodes[p].children.push(node),
            None => self.roots.push(node),
        }
    }

    /// Drops a single outer root, promoting its children (the holes in it)
    /// to roots in their own right.
    ///
    /// Offsetting inwards surrounds the result with a temporary outer
    /// rectangle, which this removes.
    pub(crate) fn without_outer_root(self) -> PolyTree {
        let &[root] = self.roots.as_slice() else {
            return self;
        };
        let mut out = PolyTree::default();
        let children = self.nodes[root].children.clone();
        for child in children {
            out.copy_subtree(&self, child, None);
        }
        out
    }

    fn copy_subtree(&mut self, from: &PolyTree, node: NodeIdx, parent: Option<NodeIdx>) {
        let src = &from.nodes[node];
        let new = self.add_node(src.contour.clone(), src.is_open);
        self.attach(new, parent);
        for &child in &src.children {
            self.copy_subtree(from, child, Some(new));
        }
    }
}

struct SerializeNode<'a> {
    tree: &'a PolyTree,
    node: NodeIdx,
}

struct SerializeChildren<'a> {
    tree: &'a PolyTree,
    nodes: &'a [NodeIdx],
}

impl serde::Serialize for SerializeNode<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let node = &self.tree.nodes[self.node];
        let mut s = serializer.serialize_struct("PolyNode", 3)?;
        s.serialize_field("contour", &node.contour)?;
        s.serialize_field("is_open", &node.is_open)?;
        s.serialize_field(
            "children",
            &SerializeChildren {
                tree: self.tree,
                nodes: &node.children,
            },
        )?;
        s.end()
    }
}

impl serde::Serialize for SerializeChildren<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.nodes.len()))?;
        for &node in self.nodes {
            seq.serialize_element(&SerializeNode {
                tree: self.tree,
                node,
            })?;
        }
        seq.end()
    }
}

/// Serialized as the nested list of its roots.
impl serde::Serialize for PolyTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serde::Serialize::serialize(
            &SerializeChildren {
                tree: self,
                nodes: &self.roots,
            },
            serializer,
        )
    }
}
