#![forbid(unsafe_code)]

//! Headless flow-map engine.
//!
//! Turns origin/destination rows into straight, great-circle or bundled flow paths, pies at
//! the addresses they touch, and legend/tooltip data, and keeps all of it consistent as the
//! rows, the selection and the format change. Nothing here draws: the host adapter renders
//! [`Scene`]s and [`Pie`]s and forwards pointer input back.

pub mod collection;
pub mod context;
pub mod error;
pub mod event;
pub mod format;
pub mod geocode;
pub mod grouping;
pub mod legend;
pub mod location;
pub mod map;
pub mod marks;
pub mod model;
pub mod pie;
pub mod rows;
pub mod scale;
pub mod shape;
pub mod timer;
pub mod tooltip;
pub mod view;
pub mod visual;

pub use error::{Error, Result};
pub use event::Event;
pub use format::{Direction, Format, FormatDirty, StyleKind};
pub use geocode::{Geocoder, GeocodeRequest, Ticket, drive_geocoding};
pub use legend::Legend;
pub use location::LocationTable;
pub use map::FlowMap;
pub use model::{Issue, IssueKind, Path, PathId, Row};
pub use pie::{Pie, PieKind, Wedge};
pub use rows::{Record, RowSource, Table};
pub use view::{GroupTransform, MapView};
pub use visual::{DrawnPath, HighlightState, Scene};

pub use flowmap_geo::{Bound, Location, View};
