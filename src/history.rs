use crate::query::Query;

/// A navigable list of query states, newest last.
pub trait History {
    /// The query of the entry currently shown.
    fn current(&self) -> &Query;

    /// Add an entry without reloading anything.
    fn push(&mut self, query: Query);
}

#[derive(Debug, Clone)]
pub struct MemoryHistory {
    current: Query,
    previous: Vec<Query>,
}

impl MemoryHistory {
    pub fn new(initial: Query) -> Self {
        Self {
            current: initial,
            previous: Vec::new(),
        }
    }

    /// Entries before the current one, oldest first.
    pub fn previous(&self) -> &[Query] {
        &self.previous
    }

    /// Number of entries, the current one included.
    pub fn entry_count(&self) -> usize {
        self.previous.len() + 1
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new(Query::new())
    }
}

impl History for MemoryHistory {
    fn current(&self) -> &Query {
        &self.current
    }

    fn push(&mut self, query: Query) {
        tracing::debug!("history: push ?{query}");
        let previous = std::mem::replace(&mut self.current, query);
        self.previous.push(previous);
    }
}
