use flowmap_geo::Location;
use rustc_hash::{FxHashMap, FxHashSet};

/// Address to location lookup over three sources, checked manual > injection > geocode.
#[derive(Debug, Clone, Default)]
pub struct LocationTable {
    manual: FxHashMap<String, Location>,
    injection: FxHashMap<String, Location>,
    geocode: FxHashMap<String, Location>,
    /// Addresses the geocoder gave up on. Never retried.
    failed: FxHashSet<String>,
}

impl LocationTable {
    pub fn get(&self, addr: &str) -> Option<Location> {
        self.manual
            .get(addr)
            .or_else(|| self.injection.get(addr))
            .or_else(|| self.geocode.get(addr))
            .copied()
    }

    /// Placed by the user (relocate mode).
    pub fn set_manual(&mut self, addr: impl Into<String>, loc: Location) {
        let addr = addr.into();
        self.failed.remove(&addr);
        self.manual.insert(addr, loc);
    }

    /// Supplied up front by the host, e.g. from a latitude/longitude field or a cache.
    pub fn inject(&mut self, addr: impl Into<String>, loc: Location) {
        let addr = addr.into();
        self.failed.remove(&addr);
        self.injection.insert(addr, loc);
    }

    pub fn set_geocoded(&mut self, addr: impl Into<String>, loc: Location) {
        let addr = addr.into();
        self.failed.remove(&addr);
        self.geocode.insert(addr, loc);
    }

    pub fn mark_failed(&mut self, addr: impl Into<String>) {
        self.failed.insert(addr.into());
    }

    pub fn is_failed(&self, addr: &str) -> bool {
        self.failed.contains(addr)
    }

    /// Neither located nor given up on: a geocoding candidate.
    pub fn is_pending(&self, addr: &str) -> bool {
        self.get(addr).is_none() && !self.failed.contains(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_wins_over_injection_and_geocode() {
        let mut t = LocationTable::default();
        t.set_geocoded("A", Location::new(1.0, 1.0));
        assert_eq!(t.get("A"), Some(Location::new(1.0, 1.0)));
        t.inject("A", Location::new(2.0, 2.0));
        assert_eq!(t.get("A"), Some(Location::new(2.0, 2.0)));
        t.set_manual("A", Location::new(3.0, 3.0));
        assert_eq!(t.get("A"), Some(Location::new(3.0, 3.0)));
    }

    #[test]
    fn failed_addresses_are_not_pending() {
        let mut t = LocationTable::default();
        assert!(t.is_pending("?"));
        t.mark_failed("?");
        assert!(!t.is_pending("?"));
        assert!(t.get("?").is_none());
        t.set_manual("?", Location::new(0.0, 0.0));
        assert!(!t.is_failed("?"));
    }
}
