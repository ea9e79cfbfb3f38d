//! Sequential address resolution ahead of rendering.
//!
//! Groups are processed strictly in the order they were pushed. Each group issues at most one
//! batched request; a group is handed back for rendering once none of its addresses is still
//! pending. Results are matched by ticket, so a reply to a canceled or superseded request is
//! dropped instead of applied.

use crate::location::LocationTable;
use crate::map::FlowMap;
use crate::model::Row;
use flowmap_geo::Location;
use futures::future::BoxFuture;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub ticket: Ticket,
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Send this batch to the geocoder and report back with [`GeocodeQueue::resolve`].
    Request(GeocodeRequest),
    /// Every address of the group is settled; render it.
    Ready { key: String, rows: Vec<Row> },
    /// A request is outstanding.
    Waiting,
    Done,
}

#[derive(Debug, Clone)]
struct Group {
    key: String,
    rows: Vec<Row>,
    addresses: Vec<String>,
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    group: Group,
    addresses: Vec<String>,
    /// Cleared when the group is removed while its request is outstanding.
    admit: bool,
}

/// Outcome of a matched reply: the finished group and what its batch settled.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub key: String,
    pub rows: Vec<Row>,
    /// `false` when the group was removed while its request was outstanding.
    pub admit: bool,
    /// Addresses that got a location in this batch.
    pub located: BTreeMap<String, Location>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GeocodeQueue {
    pending: VecDeque<Group>,
    in_flight: Option<InFlight>,
    next_ticket: Ticket,
    /// Distinct addresses counted towards `total`.
    counted: FxHashSet<String>,
    /// Addresses settled by a reply, counted towards `sofar`.
    settled: FxHashSet<String>,
}

impl GeocodeQueue {
    /// A queue whose tickets start at `first_ticket`, so replies meant for an earlier queue
    /// never match.
    pub fn new(first_ticket: Ticket) -> Self {
        Self {
            next_ticket: first_ticket,
            ..Self::default()
        }
    }

    pub fn next_ticket(&self) -> Ticket {
        self.next_ticket
    }

    /// Enqueues a group. `addresses` are every address its rows touch.
    pub fn push(
        &mut self,
        key: impl Into<String>,
        rows: Vec<Row>,
        addresses: impl IntoIterator<Item = String>,
        locations: &LocationTable,
    ) {
        let addresses: IndexSet<String> = addresses.into_iter().collect();
        for addr in &addresses {
            if locations.is_pending(addr) {
                self.counted.insert(addr.clone());
            }
        }
        self.pending.push_back(Group {
            key: key.into(),
            rows,
            addresses: addresses.into_iter().collect(),
        });
    }

    /// Drops groups. An outstanding request still settles its addresses, but its group is
    /// no longer reported for rendering. Addresses only the dropped groups were waiting on
    /// leave the progress total.
    pub fn remove(&mut self, keys: &FxHashSet<String>) {
        self.pending.retain(|g| !keys.contains(&g.key));
        if let Some(flight) = &mut self.in_flight {
            if keys.contains(&flight.group.key) {
                flight.admit = false;
            }
        }

        let mut counted = self.settled.clone();
        if let Some(flight) = &self.in_flight {
            counted.extend(flight.addresses.iter().cloned());
        }
        for group in &self.pending {
            for addr in &group.addresses {
                if self.counted.contains(addr) {
                    counted.insert(addr.clone());
                }
            }
        }
        self.counted = counted;
    }

    /// Keys of queued and in-flight groups, in processing order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.in_flight
            .iter()
            .filter(|f| f.admit)
            .map(|f| f.group.key.as_str())
            .chain(self.pending.iter().map(|g| g.key.as_str()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.settled.len(), self.counted.len())
    }

    pub fn step(&mut self, locations: &LocationTable) -> Step {
        if self.in_flight.is_some() {
            return Step::Waiting;
        }
        let Some(group) = self.pending.pop_front() else {
            return Step::Done;
        };
        let addresses: Vec<String> = group
            .addresses
            .iter()
            .filter(|a| locations.is_pending(a))
            .cloned()
            .collect();
        if addresses.is_empty() {
            return Step::Ready {
                key: group.key,
                rows: group.rows,
            };
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        debug!(ticket, key = %group.key, addresses = addresses.len(), "geocode request");
        self.in_flight = Some(InFlight {
            ticket,
            group,
            addresses: addresses.clone(),
            admit: true,
        });
        Step::Request(GeocodeRequest { ticket, addresses })
    }

    /// Applies a reply. Addresses the reply leaves out, answers with `None`, or answers with a
    /// non-finite coordinate are marked as failed for good. Returns `None` for a stale ticket.
    pub fn resolve(
        &mut self,
        ticket: Ticket,
        results: Vec<(String, Option<Location>)>,
        locations: &mut LocationTable,
    ) -> Option<Resolved> {
        if self.in_flight.as_ref().is_none_or(|f| f.ticket != ticket) {
            warn!(ticket, "ignoring stale geocode result");
            return None;
        }
        let flight = self.in_flight.take()?;
        let mut answers: BTreeMap<String, Location> = results
            .into_iter()
            .filter_map(|(addr, loc)| Some((addr, loc.filter(Location::is_finite)?)))
            .collect();

        let mut resolved = Resolved {
            key: flight.group.key,
            rows: flight.group.rows,
            admit: flight.admit,
            located: BTreeMap::new(),
            failed: Vec::new(),
        };
        for addr in flight.addresses {
            self.settled.insert(addr.clone());
            match answers.remove(&addr) {
                Some(loc) => {
                    locations.set_geocoded(addr.clone(), loc);
                    resolved.located.insert(addr, loc);
                }
                None => {
                    locations.mark_failed(addr.clone());
                    resolved.failed.push(addr);
                }
            }
        }
        Some(resolved)
    }
}

/// Resolves address batches for [`drive_geocoding`].
pub trait Geocoder {
    /// One entry per address; `None` or a missing entry means the address did not resolve.
    fn geocode<'a>(
        &'a self,
        addresses: &'a [String],
    ) -> BoxFuture<'a, Vec<(String, Option<Location>)>>;
}

/// Runs the map's geocoding queue to completion against `geocoder`.
///
/// Stops early when the host cancels geocoding or resets the map between batches.
pub async fn drive_geocoding(map: &mut FlowMap, geocoder: &dyn Geocoder) {
    while let Some(request) = map.next_geocode() {
        let results = geocoder.geocode(&request.addresses).await;
        map.on_geocoded(request.ticket, results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn located_groups_are_ready_without_a_request() {
        let mut locations = LocationTable::default();
        locations.inject("A", Location::new(0.0, 0.0));
        locations.inject("B", Location::new(1.0, 1.0));
        let mut q = GeocodeQueue::default();
        q.push("A", vec![0], addrs(&["A", "B"]), &locations);
        assert_eq!(
            q.step(&locations),
            Step::Ready {
                key: "A".into(),
                rows: vec![0]
            }
        );
        assert_eq!(q.step(&locations), Step::Done);
        assert_eq!(q.progress(), (0, 0));
    }

    #[test]
    fn one_request_at_a_time() {
        let mut locations = LocationTable::default();
        let mut q = GeocodeQueue::default();
        q.push("A", vec![0], addrs(&["A", "B"]), &locations);
        q.push("C", vec![1], addrs(&["C", "B"]), &locations);
        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        assert_eq!(req.addresses, addrs(&["A", "B"]));
        assert_eq!(q.step(&locations), Step::Waiting);

        let results = vec![("A".to_string(), Some(Location::new(2.0, 48.0)))];
        let resolved = q.resolve(req.ticket, results, &mut locations).unwrap();
        assert_eq!(resolved.key, "A");
        assert_eq!(resolved.located.len(), 1);
        assert_eq!(resolved.failed, addrs(&["B"]));
        assert!(locations.is_failed("B"));
        assert_eq!(q.progress(), (2, 3));

        // B already failed, so only C is asked for.
        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        assert_eq!(req.addresses, addrs(&["C"]));
    }

    #[test]
    fn non_finite_answers_count_as_failures() {
        let mut locations = LocationTable::default();
        let mut q = GeocodeQueue::default();
        q.push("A", vec![0], addrs(&["A", "B"]), &locations);
        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        let results = vec![
            ("A".to_string(), Some(Location::new(f64::INFINITY, 0.0))),
            ("B".to_string(), Some(Location::new(1e20, f64::NAN))),
        ];
        let resolved = q.resolve(req.ticket, results, &mut locations).unwrap();
        assert!(resolved.located.is_empty());
        assert_eq!(resolved.failed, addrs(&["A", "B"]));
        assert!(locations.get("A").is_none());
    }

    #[test]
    fn removed_groups_leave_the_progress_total() {
        let mut locations = LocationTable::default();
        let mut q = GeocodeQueue::default();
        q.push("A", vec![0], addrs(&["A", "B"]), &locations);
        q.push("C", vec![1], addrs(&["C", "D"]), &locations);
        q.push("E", vec![2], addrs(&["E", "B"]), &locations);
        assert_eq!(q.progress(), (0, 5));

        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        q.remove(&["C".to_string()].into_iter().collect());
        assert_eq!(q.progress(), (0, 3));

        q.resolve(req.ticket, Vec::new(), &mut locations).unwrap();
        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        assert_eq!(req.addresses, addrs(&["E"]));
        q.resolve(req.ticket, Vec::new(), &mut locations).unwrap();
        assert_eq!(q.step(&locations), Step::Done);
        assert_eq!(q.progress(), (3, 3));
    }

    #[test]
    fn stale_tickets_are_ignored() {
        let mut locations = LocationTable::default();
        let mut q = GeocodeQueue::default();
        q.push("A", vec![0], addrs(&["A"]), &locations);
        let Step::Request(req) = q.step(&locations) else {
            panic!("expected a request");
        };
        assert!(q.resolve(req.ticket + 1, Vec::new(), &mut locations).is_none());
        assert!(locations.is_pending("A"));
        assert!(q.resolve(req.ticket, Vec::new(), &mut locations).is_some());
        assert!(q.resolve(req.ticket, Vec::new(), &mut locations).is_none());
    }
}
