//! Event trait shared by everything published through an [`EventEmitter`].
//!
//! [`EventEmitter`]: super::EventEmitter

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// An event that can be published through an emitter.
///
/// Every event belongs to exactly one kind. Listeners subscribe to kinds, so
/// the kind set doubles as the public list of event names.
pub trait Event: Clone + Debug + Send + Sync + 'static {
    /// Discriminant used for subscription and filtering.
    type Kind: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Kind of this event
    fn kind(&self) -> Self::Kind;
}

/// Filter to receive only specific event kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter<K> {
    /// Receive all events.
    All,
    /// Receive events matching any of these kinds.
    Kinds(Vec<K>),
}

impl<K: PartialEq> EventFilter<K> {
    /// Filter matching a single kind
    pub fn only(kind: K) -> Self {
        EventFilter::Kinds(vec![kind])
    }

    /// Check if a kind matches this filter
    pub fn matches(&self, kind: &K) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kinds(kinds) => kinds.contains(kind),
        }
    }
}

impl<K> Default for EventFilter<K> {
    fn default() -> Self {
        EventFilter::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches() {
        let all: EventFilter<u8> = EventFilter::default();
        assert!(all.matches(&1));

        let only = EventFilter::only(2u8);
        assert!(only.matches(&2));
        assert!(!only.matches(&3));

        let many = EventFilter::Kinds(vec![1u8, 3]);
        assert!(many.matches(&3));
        assert!(!many.matches(&2));
    }
}
