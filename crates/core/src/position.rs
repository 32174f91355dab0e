//! Task ordering: position allocation and reorder validation.
//!
//! Positions are integer sort keys scoped to one project. They need not be
//! contiguous; display order is `position` ascending, then `created_at`
//! ascending.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::{DbId, Position, Timestamp};

/// Message returned when a reorder request carries no ids.
pub const EMPTY_REORDER_MESSAGE: &str = "No task IDs provided";

/// Hands out positions for new tasks so they sort after every sibling the
/// allocator has seen, persisted or still in memory.
#[derive(Debug, Clone, Default)]
pub struct PositionAllocator {
    max_seen: Option<Position>,
}

impl PositionAllocator {
    /// Seed from the positions of the siblings currently known.
    pub fn new<I>(known: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut allocator = Self::default();
        for position in known {
            allocator.observe(position);
        }
        allocator
    }

    /// Record a sibling position without allocating.
    pub fn observe(&mut self, position: Position) {
        self.max_seen = Some(self.max_seen.map_or(position, |m| m.max(position)));
    }

    /// Return the next free position and count it as taken.
    ///
    /// `None` once a sibling sits at `Position::MAX`.
    pub fn allocate(&mut self) -> Option<Position> {
        let next = self.peek()?;
        self.max_seen = Some(next);
        Some(next)
    }

    /// The position [`allocate`](Self::allocate) would return next.
    pub fn peek(&self) -> Option<Position> {
        match self.max_seen {
            None => Some(0),
            Some(m) => m.checked_add(1),
        }
    }
}

/// `max(existing) + 1`, or `0` when there are no siblings.
pub fn next_position<I>(existing: I) -> Option<Position>
where
    I: IntoIterator<Item = Position>,
{
    PositionAllocator::new(existing).peek()
}

/// Check a client-supplied ordering before any write.
///
/// Rejects an empty list and lists naming the same task twice.
pub fn validate_reorder(task_ids: &[DbId]) -> Result<(), CoreError> {
    if task_ids.is_empty() {
        return Err(CoreError::BadRequest(EMPTY_REORDER_MESSAGE.to_string()));
    }
    let mut seen = HashSet::with_capacity(task_ids.len());
    for id in task_ids {
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!(
                "Task {id} appears more than once in the requested order"
            )));
        }
    }
    Ok(())
}

/// Map each id to its index in the requested order.
pub fn reorder_assignments(task_ids: &[DbId]) -> Vec<(DbId, Position)> {
    task_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index as Position))
        .collect()
}

/// Display order of two tasks: position first, creation time breaks ties.
pub fn display_order(
    a: (Position, Timestamp),
    b: (Position, Timestamp),
) -> Ordering {
    a.0.cmp(&b.0).then(a.1.cmp(&b.1))
}
