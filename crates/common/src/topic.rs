//! Deterministic bus topic naming.

use crate::CollectionKey;

/// Channel namespace shared by every process of this subsystem. Doubles as
/// the consumer group name so exactly one owner handles each prime request.
pub const GROUP: &str = "cache";

/// Separator between the group prefix and the collection key.
pub const SEP: &str = "__";

/// Derives the bus topic for a collection: `cache__<CollectionKey>`.
///
/// The prefix keeps unrelated subsystems sharing a bus from colliding; the
/// suffix is the collection key verbatim.
pub fn topic(collection: &CollectionKey) -> String {
    format!("{GROUP}{SEP}{collection}")
}
