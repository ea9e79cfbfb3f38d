//! Angular agglomeration of leaves around the source.

use flowmap_geo::Point;
use std::cmp::Ordering;
use std::f64::consts::TAU;

/// One merge step: `left` and `right` (cluster slots) were joined into a new cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Merge {
    pub left: usize,
    pub right: usize,
}

/// Leaf indices sorted by polar angle around the origin, each paired with an unwrapped
/// angle. The cut between the last and first leaf is placed in the widest empty sector, so
/// neighbouring leaves are also neighbours in the returned order.
pub(crate) fn angular_order(points: &[Point]) -> Vec<(usize, f64)> {
    let mut order: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.y.atan2(p.x)))
        .collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    if order.len() < 2 {
        return order;
    }

    // Widest gap, including the wrap-around gap from the last angle back to the first.
    let n = order.len();
    let mut cut = 0usize;
    let mut widest = order[0].1 + TAU - order[n - 1].1;
    for i in 1..n {
        let gap = order[i].1 - order[i - 1].1;
        if gap > widest {
            widest = gap;
            cut = i;
        }
    }

    order.rotate_left(cut);
    let base = order[0].1;
    for entry in &mut order {
        if entry.1 < base {
            entry.1 += TAU;
        }
    }
    order
}

/// Repeatedly joins the two angularly closest adjacent clusters while their mean angles are
/// at most `max_angle` apart. Returns the merges in the order they happened; cluster slots
/// `0..angles.len()` are the inputs and every merge appends one new slot.
pub(crate) fn agglomerate(angles: &[f64], max_angle: f64) -> (Vec<Merge>, Vec<usize>) {
    // (slot, mean angle, member count)
    let mut live: Vec<(usize, f64, usize)> =
        angles.iter().enumerate().map(|(i, a)| (i, *a, 1)).collect();
    let mut merges = Vec::new();
    let mut next_slot = angles.len();

    while live.len() > 1 {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..live.len() - 1 {
            let gap = live[i + 1].1 - live[i].1;
            if best.is_none_or(|(_, g)| gap < g) {
                best = Some((i, gap));
            }
        }
        let Some((i, gap)) = best else {
            break;
        };
        if gap > max_angle {
            break;
        }

        let (ls, la, lc) = live[i];
        let (rs, ra, rc) = live[i + 1];
        let count = lc + rc;
        let angle = (la * lc as f64 + ra * rc as f64) / count as f64;
        merges.push(Merge {
            left: ls,
            right: rs,
        });
        live[i] = (next_slot, angle, count);
        live.remove(i + 1);
        next_slot += 1;
    }

    let roots = live.into_iter().map(|(slot, _, _)| slot).collect();
    (merges, roots)
}
