use crate::model::{PathId, Row};
use crate::pie::PieKind;
use flowmap_geo::Location;
use std::collections::BTreeMap;

/// Notifications for the host, queued by the engine and drained with
/// [`FlowMap::drain_events`](crate::FlowMap::drain_events).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The drawn path set of a flow group changed; tooltip bindings need refreshing.
    PathChanged { key: String, paths: Vec<PathId> },
    /// The drawn pie set changed.
    PieChanged { pies: Vec<(String, PieKind)> },
    /// Pinned marker addresses after a user toggle.
    MarkChanged { keys: Vec<String> },
    /// Debounced hover: `Some` once the pointer settles on a path, `None` after it leaves.
    Hover { rows: Option<Vec<Row>> },
    /// The user clicked a path; the host's selection should toggle these rows.
    Click { rows: Vec<Row> },
    GeocodeProgress { sofar: usize, total: usize },
    /// Freshly geocoded addresses, for the host to cache.
    LocationsResolved {
        locations: BTreeMap<String, Location>,
    },
}
