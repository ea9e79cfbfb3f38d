use crate::event::Event;
use indexmap::IndexSet;

/// Addresses whose marker labels the user pinned, in pin order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marks {
    keys: IndexSet<String>,
}

impl Marks {
    /// Pins `addr`, or unpins it when already pinned.
    pub fn toggle(&mut self, addr: &str) -> Event {
        if !self.keys.shift_remove(addr) {
            self.keys.insert(addr.to_string());
        }
        Event::MarkChanged {
            keys: self.keys.iter().cloned().collect(),
        }
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.keys.contains(addr)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }
}
