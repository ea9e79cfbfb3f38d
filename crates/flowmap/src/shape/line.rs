use super::Target;
use crate::model::{Path, PathId, Row};
use flowmap_geo::{
    Bound, Location, Margin, PathData, Point, Projection, arc, segment_count, unwrap_longitude,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// One independent path per row: straight segments or great-circle arcs.
#[derive(Debug, Clone)]
pub struct LineShape {
    anchor: Location,
    paths: Vec<Path>,
    /// Extent of each path, parallel to `paths`. Arcs bulge past their endpoints.
    margins: Vec<Margin>,
    index: FxHashMap<Row, usize>,
}

impl LineShape {
    pub fn straight(hub: Location, targets: &[Target], projection: &Projection) -> Self {
        Self::from_polylines(hub, targets, |t| {
            vec![Point::default(), projection.offset(hub, t.location)]
        })
    }

    pub fn arc(hub: Location, targets: &[Target], projection: &Projection) -> Self {
        let origin = projection.to_pixel(hub);
        Self::from_polylines(hub, targets, |t| {
            let mut lon = hub.longitude;
            arc(hub, t.location, segment_count(hub, t.location))
                .into_iter()
                .map(|loc| {
                    // Unwrap against the previous vertex so the polyline never jumps the seam.
                    lon = unwrap_longitude(lon, loc.longitude);
                    projection
                        .to_pixel(Location::new(lon, loc.latitude))
                        .sub(origin)
                })
                .collect()
        })
    }

    fn from_polylines(
        hub: Location,
        targets: &[Target],
        mut polyline: impl FnMut(&Target) -> Vec<Point>,
    ) -> Self {
        let mut paths = Vec::with_capacity(targets.len());
        let mut margins = Vec::with_capacity(targets.len());
        for t in targets {
            let points = polyline(t);
            margins.push(Margin::from_points(points.iter().copied()));
            paths.push(Path {
                id: PathId::Row(t.row),
                leafs: vec![t.row],
                d: PathData::polyline(&points).finish(),
                weight: t.weight,
                width: 0.0,
            });
        }
        let mut shape = Self {
            anchor: hub,
            paths,
            margins,
            index: FxHashMap::default(),
        };
        shape.reindex();
        shape
    }

    fn reindex(&mut self) {
        self.index = self
            .paths
            .iter()
            .enumerate()
            .map(|(i, p)| (p.leafs[0], i))
            .collect();
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
        match id {
            PathId::Row(row) => self.index.get(&row).map(|&i| &self.paths[i]),
            PathId::Merge(_) => None,
        }
    }

    pub fn highlight(&self, is_selected: impl Fn(Row) -> bool) -> Vec<Path> {
        self.paths
            .iter()
            .filter(|p| is_selected(p.leafs[0]))
            .cloned()
            .collect()
    }

    pub fn reweight(&mut self, weight: impl Fn(Row) -> f64) {
        for p in &mut self.paths {
            p.weight = weight(p.leafs[0]);
        }
    }

    pub fn bound(&self, rows: Option<&FxHashSet<Row>>) -> Option<Bound> {
        let mut margin = Margin::default();
        let mut any = false;
        for (p, m) in self.paths.iter().zip(&self.margins) {
            if rows.is_some_and(|r| !r.contains(&p.leafs[0])) {
                continue;
            }
            any = true;
            margin.include(Point::new(m.east, m.south));
            margin.include(Point::new(-m.west, -m.north));
        }
        any.then_some(Bound {
            anchor: self.anchor,
            margin,
        })
    }

    pub fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.paths.len()).collect();
        order.sort_by(|&a, &b| self.paths[b].weight.total_cmp(&self.paths[a].weight));
        let mut paths = Vec::with_capacity(order.len());
        let mut margins = Vec::with_capacity(order.len());
        for i in order {
            paths.push(self.paths[i].clone());
            margins.push(self.margins[i]);
        }
        self.paths = paths;
        self.margins = margins;
        self.reindex();
    }
}
