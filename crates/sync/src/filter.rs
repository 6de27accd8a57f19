//! Refresh filter chain.

use std::sync::Arc;

use common::{CollectionKey, Operation, Record};

/// Stateless predicate deciding whether one mutation should trigger a
/// refresh. Evaluated synchronously on every mutation; must not block.
pub type FilterPredicate =
    Arc<dyn Fn(&CollectionKey, Operation, Option<&Record>) -> bool + Send + Sync>;

/// Ordered set of predicates gating the write path.
///
/// All registered predicates must approve (logical AND) for a refresh to
/// proceed; an empty chain always approves. This lets an integrator
/// suppress refresh storms for high-frequency, low-value mutations.
///
/// Predicates are statically typed, so a malformed entry is rejected by the
/// compiler instead of being silently skipped at call time.
#[derive(Clone, Default)]
pub struct FilterChain {
    predicates: Vec<FilterPredicate>,
}

impl FilterChain {
    /// Creates an empty, always-approving chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from an existing predicate list.
    pub fn from_predicates(predicates: Vec<FilterPredicate>) -> Self {
        Self { predicates }
    }

    /// Appends a predicate to the chain.
    pub fn push(&mut self, predicate: FilterPredicate) {
        self.predicates.push(predicate);
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns true when every predicate approves the mutation.
    pub fn should_refresh(
        &self,
        collection: &CollectionKey,
        operation: Operation,
        record: Option<&Record>,
    ) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate(collection, operation, record))
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("predicates", &self.predicates.len())
            .finish()
    }
}
