use flowmap_bundle::NodeId;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Opaque identifier of one input record (one origin/destination edge).
pub type Row = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PathId {
    Row(Row),
    /// Merge trunk of a flow bundle.
    Merge(usize),
}

impl From<NodeId> for PathId {
    fn from(id: NodeId) -> Self {
        match id {
            NodeId::Leaf(row) => PathId::Row(row),
            NodeId::Merge(k) => PathId::Merge(k),
        }
    }
}

/// A renderable segment in reference-zoom pixels, relative to its group's anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub id: PathId,
    /// Rows drawn through this segment.
    pub leafs: Vec<Row>,
    pub d: String,
    pub weight: f64,
    /// Screen pixels.
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueKind {
    Unlocate,
    Selflink,
    Negative,
}

/// Data-quality problems of one row. Each kind names the offending address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selflink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative: Option<String>,
}

impl Issue {
    pub fn is_empty(&self) -> bool {
        self.unlocate.is_none() && self.selflink.is_none() && self.negative.is_none()
    }

    pub fn get(&self, kind: IssueKind) -> Option<&str> {
        match kind {
            IssueKind::Unlocate => self.unlocate.as_deref(),
            IssueKind::Selflink => self.selflink.as_deref(),
            IssueKind::Negative => self.negative.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueTable {
    rows: FxHashMap<Row, Issue>,
}

impl IssueTable {
    /// Records `issue` for `row`, or forgets the row when the issue is empty.
    pub fn set(&mut self, row: Row, issue: Issue) {
        if issue.is_empty() {
            self.rows.remove(&row);
        } else {
            self.rows.insert(row, issue);
        }
    }

    pub fn get(&self, row: Row) -> Option<&Issue> {
        self.rows.get(&row)
    }

    pub fn has(&self, row: Row) -> bool {
        self.rows.contains_key(&row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Rows with an issue, in row order.
    pub fn iter(&self) -> impl Iterator<Item = (Row, &Issue)> {
        let mut rows: Vec<(Row, &Issue)> = self.rows.iter().map(|(r, i)| (*r, i)).collect();
        rows.sort_by_key(|(r, _)| *r);
        rows.into_iter()
    }
}
