use std::collections::VecDeque;

/// Ordered, unbounded buffer of payloads waiting for dispatch.
#[derive(Debug, Default)]
pub(crate) struct OutboundQueue {
    payloads: VecDeque<Vec<u8>>,
}

impl OutboundQueue {
    /// Returns `false` and keeps nothing when `payload` is empty.
    pub(crate) fn push(&mut self, payload: Vec<u8>) -> bool {
        if payload.is_empty() {
            return false;
        }
        self.payloads.push_back(payload);
        true
    }

    pub(crate) fn front(&self) -> Option<&[u8]> {
        self.payloads.front().map(Vec::as_slice)
    }

    pub(crate) fn pop_front(&mut self) -> Option<Vec<u8>> {
        self.payloads.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.payloads.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_duplicates() {
        let mut queue = OutboundQueue::default();
        assert!(queue.push(b"R:40\n".to_vec()));
        assert!(queue.push(b"R:40\n".to_vec()));
        assert!(queue.push(b"S\n".to_vec()));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.front(), Some(&b"R:40\n"[..]));
        assert_eq!(queue.pop_front().unwrap(), b"R:40\n");
        assert_eq!(queue.pop_front().unwrap(), b"R:40\n");
        assert_eq!(queue.pop_front().unwrap(), b"S\n");
        assert!(queue.is_empty());
    }

    #[test]
    fn drops_empty_payloads() {
        let mut queue = OutboundQueue::default();
        assert!(!queue.push(vec![]));
        assert!(queue.is_empty());
        assert_eq!(queue.front(), None);
    }
}
