//! Drag-and-drop reordering as a finite state machine.
//!
//! The machine tracks a single active drag. Every transition is a pure
//! function of `(state, event)` plus the current order; a successful drop
//! yields the reordered list and returns to [`DragState::Idle`].
//!
//! ```text
//! Idle --Start--> Dragging --Over--> Hovering --Drop--> Idle (+ new order)
//!                    ^                  |
//!                    +------Leave-------+
//! any --End--> Idle (no mutation)
//! ```

use serde::{Deserialize, Serialize};

/// Where the dragged item lands relative to the hovered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState<K> {
    #[default]
    Idle,
    Dragging {
        dragged: K,
    },
    Hovering {
        dragged: K,
        target: K,
        placement: Placement,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent<K> {
    /// Pointer picked up an item.
    Start(K),
    /// Pointer moved over a drop target.
    Over { target: K, placement: Placement },
    /// Pointer left the current drop target.
    Leave,
    /// Item released over the current target.
    Drop,
    /// Drag ended without a drop (escape, released outside the list).
    End,
}

impl<K> DragState<K> {
    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Advance the machine by one event.
///
/// Returns the next state and, for a drop that changes the order, the new
/// order of `order`'s items.
pub fn transition<K>(
    state: DragState<K>,
    event: DragEvent<K>,
    order: &[K],
) -> (DragState<K>, Option<Vec<K>>)
where
    K: Clone + PartialEq,
{
    match (state, event) {
        (DragState::Idle, DragEvent::Start(dragged)) => (DragState::Dragging { dragged }, None),

        // Single active drag: a second start is ignored.
        (active @ (DragState::Dragging { .. } | DragState::Hovering { .. }), DragEvent::Start(_)) => {
            (active, None)
        }

        (
            DragState::Dragging { dragged } | DragState::Hovering { dragged, .. },
            DragEvent::Over { target, placement },
        ) => (
            DragState::Hovering {
                dragged,
                target,
                placement,
            },
            None,
        ),

        (DragState::Hovering { dragged, .. }, DragEvent::Leave) => {
            (DragState::Dragging { dragged }, None)
        }

        (
            DragState::Hovering {
                dragged,
                target,
                placement,
            },
            DragEvent::Drop,
        ) => (
            DragState::Idle,
            move_item(order, &dragged, &target, placement),
        ),

        (_, DragEvent::End | DragEvent::Drop) => (DragState::Idle, None),

        (state, _) => (state, None),
    }
}

/// Index at which the dragged item is reinserted after being removed.
pub fn insertion_index(from: usize, target: usize, placement: Placement) -> usize {
    let index = match placement {
        Placement::Above => target,
        Placement::Below => target + 1,
    };
    // Removing the dragged item shifts everything after it left by one.
    if from < index {
        index - 1
    } else {
        index
    }
}

/// Move `dragged` next to `target` and return the new order.
///
/// `None` when either item is missing, when dropping onto itself, or when
/// the move would leave the order unchanged.
pub fn move_item<K>(order: &[K], dragged: &K, target: &K, placement: Placement) -> Option<Vec<K>>
where
    K: Clone + PartialEq,
{
    if dragged == target {
        return None;
    }
    let from = order.iter().position(|k| k == dragged)?;
    let to = order.iter().position(|k| k == target)?;

    let index = insertion_index(from, to, placement);
    if index == from {
        return None;
    }

    let mut next = order.to_vec();
    let item = next.remove(from);
    next.insert(index, item);
    Some(next)
}
