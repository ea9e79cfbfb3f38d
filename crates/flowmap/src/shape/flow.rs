use super::Target;
use crate::model::{Path, PathId, Row};
use flowmap_bundle::{BundleOptions, FlowTree, Leaf, NodeId};
use flowmap_geo::{Bound, Location, Margin, Point, Projection};
use rustc_hash::{FxHashMap, FxHashSet};

/// Bundled tree from the hub to every leaf, laid out with the hub at the origin.
#[derive(Debug, Clone)]
pub struct FlowShape {
    anchor: Location,
    tree: FlowTree,
    /// Mirror of the tree's segments, parents first, carrying the rendered widths.
    paths: Vec<Path>,
    index: FxHashMap<PathId, usize>,
}

impl FlowShape {
    pub fn new(hub: Location, targets: &[Target], projection: &Projection) -> Self {
        let leaves: Vec<Leaf> = targets
            .iter()
            .map(|t| Leaf {
                id: t.row,
                point: projection.offset(hub, t.location),
                weight: t.weight,
            })
            .collect();
        let tree = FlowTree::layout(Point::default(), &leaves, &BundleOptions::default());
        let paths: Vec<Path> = tree
            .paths()
            .into_iter()
            .map(|tp| Path {
                id: tp.id.into(),
                leafs: tp.leafs.clone(),
                d: tp.d.clone(),
                weight: tp.weight,
                width: 0.0,
            })
            .collect();
        let index = paths.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        Self {
            anchor: hub,
            tree,
            paths,
            index,
        }
    }

    pub fn anchor(&self) -> Location {
        self.anchor
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub(super) fn paths_mut(&mut self) -> &mut [Path] {
        &mut self.paths
    }

    pub fn path(&self, id: PathId) -> Option<&Path> {
        self.index.get(&id).map(|&i| &self.paths[i])
    }

    pub fn highlight(&self, is_selected: impl Fn(Row) -> bool) -> Vec<Path> {
        self.tree
            .subroots(is_selected)
            .into_iter()
            .filter_map(|tp| self.path(tp.id.into()).cloned())
            .collect()
    }

    pub fn reweight(&mut self, weight: impl Fn(Row) -> f64) {
        self.tree.build(weight);
        for path in &mut self.paths {
            let id = match path.id {
                PathId::Row(row) => NodeId::Leaf(row),
                PathId::Merge(k) => NodeId::Merge(k),
            };
            if let Some(tp) = self.tree.path(id) {
                path.weight = tp.weight;
            }
        }
    }

    pub fn bound(&self, rows: Option<&FxHashSet<Row>>) -> Option<Bound> {
        let points = match rows {
            Some(rows) => self.tree.covering_points(|l| rows.contains(&l)),
            None => self.tree.covering_points(|_| true),
        };
        // Only the source means no selected leaf lives here.
        if points.len() <= 1 {
            return None;
        }
        Some(Bound {
            anchor: self.anchor,
            margin: Margin::from_points(points),
        })
    }
}
