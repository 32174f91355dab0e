//! Optimistic ordering with compensating revert.
//!
//! The local order changes as soon as the user drops an item; the matching
//! reorder request is sent in the background. [`OrderSync`] remembers the
//! last order the server confirmed so that a failed request can be undone
//! instead of leaving the screen out of step with the database.

/// A reorder call waiting to be sent, tagged with a sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderRequest<K> {
    pub seq: u64,
    pub order: Vec<K>,
}

#[derive(Debug, Clone)]
pub struct OrderSync<K> {
    confirmed: Vec<K>,
    confirmed_seq: u64,
    local: Vec<K>,
    latest_seq: u64,
}

impl<K: Clone + PartialEq> OrderSync<K> {
    /// Start from an order loaded from the server.
    pub fn new(order: Vec<K>) -> Self {
        Self {
            confirmed: order.clone(),
            confirmed_seq: 0,
            local: order,
            latest_seq: 0,
        }
    }

    /// The order currently shown to the user.
    pub fn local(&self) -> &[K] {
        &self.local
    }

    /// The last order the server acknowledged.
    pub fn confirmed(&self) -> &[K] {
        &self.confirmed
    }

    /// Whether a request newer than the confirmed order is still out.
    pub fn has_pending(&self) -> bool {
        self.latest_seq > self.confirmed_seq
    }

    /// Apply a new order locally and return the request to send.
    pub fn apply_local(&mut self, order: Vec<K>) -> ReorderRequest<K> {
        self.latest_seq += 1;
        self.local = order.clone();
        ReorderRequest {
            seq: self.latest_seq,
            order,
        }
    }

    /// The server stored the order carried by `request`.
    ///
    /// Responses can land out of order; an acknowledgement older than the
    /// current confirmed order is ignored.
    pub fn acknowledge(&mut self, request: &ReorderRequest<K>) {
        if request.seq > self.confirmed_seq {
            self.confirmed_seq = request.seq;
            self.confirmed = request.order.clone();
        }
    }

    /// The server rejected `seq`.
    ///
    /// If it was the newest request, the local order falls back to the last
    /// confirmed one and that order is returned. A failure superseded by a
    /// newer request changes nothing.
    pub fn reject(&mut self, seq: u64) -> Option<&[K]> {
        if seq != self.latest_seq || seq <= self.confirmed_seq {
            return None;
        }
        // Nothing newer is in flight, so the confirmed order is authoritative.
        self.confirmed_seq = seq;
        self.local = self.confirmed.clone();
        Some(&self.local)
    }

    /// Replace both orders with a fresh server snapshot (page reload or a
    /// live update from another viewer).
    pub fn reset(&mut self, order: Vec<K>) {
        self.confirmed = order.clone();
        self.local = order;
        self.confirmed_seq = self.latest_seq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_change_is_visible_before_ack() {
        let mut sync = OrderSync::new(vec![1, 2, 3]);
        let request = sync.apply_local(vec![3, 1, 2]);
        assert_eq!(sync.local(), &[3, 1, 2]);
        assert_eq!(sync.confirmed(), &[1, 2, 3]);
        assert!(sync.has_pending());
        assert_eq!(request.seq, 1);
    }

    #[test]
    fn ack_promotes_order() {
        let mut sync = OrderSync::new(vec![1, 2, 3]);
        let request = sync.apply_local(vec![2, 1, 3]);
        sync.acknowledge(&request);
        assert_eq!(sync.confirmed(), &[2, 1, 3]);
        assert!(!sync.has_pending());
    }

    #[test]
    fn failure_reverts_to_last_confirmed() {
        let mut sync = OrderSync::new(vec![1, 2, 3]);
        let request = sync.apply_local(vec![3, 2, 1]);
        let reverted = sync.reject(request.seq).map(|o| o.to_vec());
        assert_eq!(reverted, Some(vec![1, 2, 3]));
        assert_eq!(sync.local(), &[1, 2, 3]);
        assert!(!sync.has_pending());
    }

    #[test]
    fn superseded_failure_is_ignored() {
        let mut sync = OrderSync::new(vec![1, 2, 3]);
        let first = sync.apply_local(vec![2, 1, 3]);
        let second = sync.apply_local(vec![2, 3, 1]);

        assert_eq!(sync.reject(first.seq), None);
        assert_eq!(sync.local(), &[2, 3, 1]);

        sync.acknowledge(&second);
        assert_eq!(sync.confirmed(), &[2, 3, 1]);
    }

    #[test]
    fn late_ack_does_not_override_newer_confirmation() {
        let mut sync = OrderSync::new(vec![1, 2]);
        let first = sync.apply_local(vec![2, 1]);
        let second = sync.apply_local(vec![1, 2]);
        sync.acknowledge(&second);
        sync.acknowledge(&first);
        assert_eq!(sync.confirmed(), &[1, 2]);
    }

    #[test]
    fn failure_after_partial_confirmation_reverts_to_that_order() {
        let mut sync = OrderSync::new(vec![1, 2, 3]);
        let first = sync.apply_local(vec![2, 1, 3]);
        sync.acknowledge(&first);
        let second = sync.apply_local(vec![3, 2, 1]);
        let reverted = sync.reject(second.seq).map(|o| o.to_vec());
        assert_eq!(reverted, Some(vec![2, 1, 3]));
    }

    #[test]
    fn reset_clears_pending_state() {
        let mut sync = OrderSync::new(vec![1, 2]);
        sync.apply_local(vec![2, 1]);
        sync.reset(vec![1, 2, 9]);
        assert_eq!(sync.local(), &[1, 2, 9]);
        assert!(!sync.has_pending());
    }
}
