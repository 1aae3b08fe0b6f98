//! Drag-and-drop reordering with persisted ranks.
//!
//! A move is computed in memory first ([`reorder`]) and handed to the caller
//! immediately. Persistence happens afterwards through a [`RankWriter`], and
//! a failure there does not roll the new order back: the caller gets a
//! [`PersistReport`] with a warning to surface.
//!
//! ## Ranks
//!
//! Every item's rank is its zero-based index in the new order. The batch
//! holds every item whose stored rank differs from that index, so stored
//! ranks with gaps (left behind by deletes) are closed up by the first move. For galleries, the first
//! item of the new order is also the primary ("main") image.
//!
//! ## Replays
//!
//! Each [`ReorderCommand`] carries an idempotency key. Writers remember keys
//! they have applied, so a retried command is acknowledged as
//! [`WriteOutcome::Duplicate`] instead of being applied twice.

use crate::types::DocId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Move `dragged` into `target`'s slot.
///
/// The dragged item is removed from its old index and inserted at the
/// target's former index; everything in between shifts by one. Returns the
/// input unchanged when `dragged == target` or either id is absent.
///
/// ```
/// # use realty_desk::gallery::reorder;
/// let order = reorder(&["a", "b", "c", "d"], &"d", &"b");
/// assert_eq!(order, ["a", "d", "b", "c"]);
/// ```
pub fn reorder<T: PartialEq + Clone>(sequence: &[T], dragged: &T, target: &T) -> Vec<T> {
    if dragged == target {
        return sequence.to_vec();
    }
    let (Some(from), Some(to)) = (
        sequence.iter().position(|x| x == dragged),
        sequence.iter().position(|x| x == target),
    ) else {
        return sequence.to_vec();
    };

    let mut out = sequence.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    out
}

/// A single rank assignment: either as stored, or as it should be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankUpdate {
    pub id: DocId,
    pub rank: u32,
}

/// Ranks for every item in `after` whose stored rank in `stored` is not its
/// new index. Items missing from `stored` are always included.
pub fn changed_ranks(stored: &[RankUpdate], after: &[DocId]) -> Vec<RankUpdate> {
    after
        .iter()
        .enumerate()
        .filter(|(i, id)| {
            stored
                .iter()
                .find(|r| r.id == **id)
                .is_none_or(|r| r.rank != *i as u32)
        })
        .map(|(i, id)| RankUpdate {
            id: id.clone(),
            rank: i as u32,
        })
        .collect()
}

/// Idempotency key for a reorder command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandKey(pub String);

impl CommandKey {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which ordered list a command applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReorderScope {
    /// Portfolio items, ranked by their `order` field.
    Portfolio,
    /// Images inside one property's gallery.
    Gallery { property_id: DocId },
}

/// A planned reorder, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderCommand {
    pub key: CommandKey,
    pub scope: ReorderScope,
    /// Full order after the move.
    pub order: Vec<DocId>,
    /// Only the ranks that changed.
    pub ranks: Vec<RankUpdate>,
    /// First item of `order`; the gallery's main image.
    pub primary: Option<DocId>,
}

impl ReorderCommand {
    /// Plan a move of `dragged` onto `target` within `current`, the items in
    /// display order with their stored ranks.
    ///
    /// Returns `None` when the move changes nothing. `key` lets a client
    /// retry with the same identity; a fresh key is generated otherwise.
    pub fn plan(
        scope: ReorderScope,
        current: &[RankUpdate],
        dragged: &DocId,
        target: &DocId,
        key: Option<CommandKey>,
    ) -> Option<Self> {
        let ids: Vec<DocId> = current.iter().map(|r| r.id.clone()).collect();
        let order = reorder(&ids, dragged, target);
        if order == ids {
            return None;
        }
        let ranks = changed_ranks(current, &order);
        let primary = order.first().cloned();
        Some(Self {
            key: key.unwrap_or_else(CommandKey::generate),
            scope,
            order,
            ranks,
            primary,
        })
    }
}

/// Result of a successful rank write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    Applied,
    /// The key was seen before; nothing was written.
    Duplicate,
}

/// Storage seam for rank batches.
pub trait RankWriter {
    type Error: fmt::Display;

    /// Apply all of `command.ranks` (and the primary id, for galleries) as one
    /// batch.
    fn write_ranks(&self, command: &ReorderCommand) -> Result<WriteOutcome, Self::Error>;
}

/// What the caller should tell the user after persisting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WriteOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Persist a command, converting failure into a warning.
///
/// The in-memory order stays as planned either way.
pub fn persist<W: RankWriter>(writer: &W, command: &ReorderCommand) -> PersistReport {
    match writer.write_ranks(command) {
        Ok(outcome) => {
            tracing::debug!(key = %command.key, ?outcome, ranks = command.ranks.len(), "ranks written");
            PersistReport {
                persisted: true,
                outcome: Some(outcome),
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!(key = %command.key, error = %e, "failed to persist new order");
            PersistReport {
                persisted: false,
                outcome: None,
                warning: Some(format!("New order could not be saved: {e}")),
            }
        }
    }
}
