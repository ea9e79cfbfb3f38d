#![forbid(unsafe_code)]

//! Flow tree layout.
//!
//! Given one source and many targets, `FlowTree` joins targets that leave the source in
//! similar directions into shared trunks. Topology depends only on geometry; weights can be
//! reassigned with [`FlowTree::build`] without moving anything.

mod cluster;

use flowmap_geo::{PathData, Point};
use rustc_hash::FxHashMap;

pub type LeafId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// A target, identified by the caller's leaf id.
    Leaf(LeafId),
    /// A merge trunk, numbered in merge order.
    Merge(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leaf {
    pub id: LeafId,
    pub point: Point,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleOptions {
    /// Adjacent clusters whose mean directions differ by more than this (radians) stay apart.
    pub max_merge_angle: f64,
    /// Where a trunk splits, as a fraction of the distance to its nearest child.
    pub split_ratio: f64,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            max_merge_angle: std::f64::consts::PI / 6.0,
            split_ratio: 0.6,
        }
    }
}

/// One drawable segment of the tree, from its parent's split point (or the source) to its own.
#[derive(Debug, Clone, PartialEq)]
pub struct TreePath {
    pub id: NodeId,
    /// Leaves below this segment, in angular order.
    pub leafs: Vec<LeafId>,
    pub d: String,
    pub weight: f64,
    pub from: Point,
    pub ctrl: Point,
    pub to: Point,
}

#[derive(Debug, Clone)]
pub struct FlowTree {
    source: Point,
    /// Children always precede their parent.
    nodes: Vec<TreePath>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    by_id: FxHashMap<NodeId, usize>,
}

impl FlowTree {
    pub fn layout(source: Point, leaves: &[Leaf], options: &BundleOptions) -> Self {
        let rel: Vec<Point> = leaves.iter().map(|l| l.point.sub(source)).collect();
        let order = cluster::angular_order(&rel);
        let angles: Vec<f64> = order.iter().map(|(_, a)| *a).collect();
        let (merges, root_slots) = cluster::agglomerate(&angles, options.max_merge_angle);

        let mut nodes: Vec<TreePath> = Vec::with_capacity(order.len() + merges.len());
        let mut children: Vec<Vec<usize>> = Vec::with_capacity(nodes.capacity());
        // Mean direction and member count per slot, for placing merge points.
        let mut heading: Vec<(f64, usize)> = Vec::with_capacity(nodes.capacity());

        for &(idx, angle) in &order {
            let leaf = &leaves[idx];
            nodes.push(TreePath {
                id: NodeId::Leaf(leaf.id),
                leafs: vec![leaf.id],
                d: String::new(),
                weight: leaf.weight,
                from: Point::default(),
                ctrl: Point::default(),
                to: rel[idx],
            });
            children.push(Vec::new());
            heading.push((angle, 1));
        }

        for (k, m) in merges.iter().enumerate() {
            let (la, lc) = heading[m.left];
            let (ra, rc) = heading[m.right];
            let count = lc + rc;
            let angle = (la * lc as f64 + ra * rc as f64) / count as f64;
            let nearest = nodes[m.left].to.length().min(nodes[m.right].to.length());
            let radius = nearest * options.split_ratio;

            let mut leafs = nodes[m.left].leafs.clone();
            leafs.extend_from_slice(&nodes[m.right].leafs);
            nodes.push(TreePath {
                id: NodeId::Merge(k),
                leafs,
                d: String::new(),
                weight: nodes[m.left].weight + nodes[m.right].weight,
                from: Point::default(),
                ctrl: Point::default(),
                to: Point::new(angle.cos() * radius, angle.sin() * radius),
            });
            children.push(vec![m.left, m.right]);
            heading.push((angle, count));
        }

        let mut parent = vec![None; nodes.len()];
        for (p, kids) in children.iter().enumerate() {
            for &c in kids {
                parent[c] = Some(p);
            }
        }

        let by_id = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();

        let mut tree = Self {
            source,
            nodes,
            parent,
            children,
            roots: root_slots,
            by_id,
        };
        tree.route();
        tree
    }

    /// Fills `from`/`ctrl`/`d` of every segment, top-down, in absolute coordinates.
    fn route(&mut self) {
        let mut stack: Vec<(usize, Point, Point)> = self
            .roots
            .iter()
            .rev()
            .map(|&r| (r, Point::default(), Point::default()))
            .collect();
        while let Some((i, from, incoming)) = stack.pop() {
            let to = self.nodes[i].to;
            let span = to.sub(from);
            let ctrl = if incoming.length() > 0.0 {
                from.add(incoming.scale(span.length() * 0.5))
            } else {
                from.add(span.scale(0.5))
            };

            let origin = self.source;
            let node = &mut self.nodes[i];
            node.from = from.add(origin);
            node.ctrl = ctrl.add(origin);
            let mut d = PathData::new();
            d.move_to(node.from).quad_to(node.ctrl, to.add(origin));
            node.d = d.finish();

            let heading = to.sub(ctrl).unit();
            for &c in self.children[i].iter().rev() {
                stack.push((c, to, heading));
            }
        }
        for node in &mut self.nodes {
            node.to = node.to.add(self.source);
        }
    }

    pub fn source(&self) -> Point {
        self.source
    }

    /// Reassigns leaf weights and re-sums every trunk. Geometry is untouched.
    pub fn build(&mut self, weight: impl Fn(LeafId) -> f64) {
        for i in 0..self.nodes.len() {
            let w = match self.nodes[i].id {
                NodeId::Leaf(id) => weight(id),
                NodeId::Merge(_) => self.children[i].iter().map(|&c| self.nodes[c].weight).sum(),
            };
            self.nodes[i].weight = w;
        }
    }

    /// Every segment, parents before children.
    pub fn paths(&self) -> Vec<&TreePath> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            out.push(&self.nodes[i]);
            stack.extend(self.children[i].iter().rev().copied());
        }
        out
    }

    pub fn path(&self, id: NodeId) -> Option<&TreePath> {
        self.by_id.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn parent(&self, id: NodeId) -> Option<&TreePath> {
        let i = *self.by_id.get(&id)?;
        self.parent[i].map(|p| &self.nodes[p])
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.id, NodeId::Leaf(_)))
            .count()
    }

    /// Smallest and largest segment weight, trunks included.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.nodes.iter().fold(None, |acc, n| match acc {
            None => Some((n.weight, n.weight)),
            Some((lo, hi)) => Some((lo.min(n.weight), hi.max(n.weight))),
        })
    }

    /// The fewest segments whose leaves together are exactly the selected leaves.
    ///
    /// A segment is returned when all of its leaves are selected; otherwise the search
    /// descends into its children. No leaf appears under two returned segments.
    pub fn subroots(&self, is_selected: impl Fn(LeafId) -> bool) -> Vec<&TreePath> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            let hit = node.leafs.iter().filter(|&&l| is_selected(l)).count();
            if hit == 0 {
                continue;
            }
            if hit == node.leafs.len() {
                out.push(node);
            } else {
                stack.extend(self.children[i].iter().rev().copied());
            }
        }
        out
    }

    /// Source plus the end and control points of every segment leading to a selected leaf.
    pub fn covering_points(&self, is_selected: impl Fn(LeafId) -> bool) -> Vec<Point> {
        let mut out = vec![self.source];
        for node in &self.nodes {
            if node.leafs.iter().any(|&l| is_selected(l)) {
                out.push(node.ctrl);
                out.push(node.to);
            }
        }
        out
    }
}
