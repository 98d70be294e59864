//! Bounded FIFO/priority queue of in-flight spike messages (§4.1)

use std::collections::VecDeque;

use crate::decoder::Decoder;
use crate::error::{CoreError, Result};
use crate::ids::Direction;
use crate::spike::SpikeMessage;

/// Default capacity for the fine-grained (priority) queue variant, matching
/// the reference `Queue(capacity=1000)` default.
pub const DEFAULT_CAPACITY: usize = 1000;

/// FIFO or priority-promotion ordering discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueMode {
    /// Plain first-in-first-out.
    Fifo,
    /// Stable-promotes messages with `delay == 1` to the head at each
    /// `next_op_step`/`dec_delays` call.
    Priority,
}

/// A bounded buffer of [`SpikeMessage`] shared between exactly two
/// components (two routers, or a router and a core).
#[derive(Debug)]
pub struct Queue {
    capacity: usize,
    mode: QueueMode,
    decoder: Decoder,
    messages: VecDeque<SpikeMessage>,
}

impl Queue {
    /// Construct a new queue with the given capacity, ordering mode, and
    /// decode-on-enqueue strategy.
    pub fn new(capacity: usize, mode: QueueMode, decoder: Decoder) -> Self {
        Self {
            capacity,
            mode,
            decoder,
            messages: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    /// Convenience constructor for a capacity-`DEFAULT_CAPACITY` FIFO queue
    /// with no decoder, matching `Queue()` in the reference test scripts.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, QueueMode::Fifo, Decoder::NoOp)
    }

    /// Current number of messages in the queue.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` iff the queue holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `true` iff enqueuing `amt` more messages would exceed capacity:
    /// `len + amt - 1 >= capacity`.
    pub fn is_full(&self, amt: usize) -> bool {
        self.len() + amt.max(1) - 1 >= self.capacity
    }

    /// Enqueue a message: marks it traveled, runs the decoder, appends.
    ///
    /// # Errors
    /// Returns [`CoreError::QueueFull`] if the queue is already full.
    pub fn enqueue(&mut self, mut msg: SpikeMessage) -> Result<()> {
        if self.is_full(1) {
            return Err(CoreError::QueueFull {
                capacity: self.capacity,
                attempted: 1,
            });
        }
        msg.set_traveled(true);
        self.decoder.decode(&mut msg);
        self.messages.push_back(msg);
        Ok(())
    }

    /// Dequeue the head message.
    ///
    /// # Errors
    /// Returns [`CoreError::QueueEmpty`] if the queue has no messages.
    pub fn dequeue(&mut self) -> Result<SpikeMessage> {
        self.messages.pop_front().ok_or(CoreError::QueueEmpty)
    }

    /// Peek the head's `(dir_tag, traveled)` without removing it. Returns
    /// `(Direction::Nop, true)` when empty, so an empty queue never wins
    /// arbitration.
    pub fn peek_request(&self) -> (Direction, bool) {
        match self.messages.front() {
            Some(msg) => (msg.dir_tag(), msg.traveled()),
            None => (Direction::Nop, true),
        }
    }

    /// Called once at the start of every op-step: clears the traveled flag
    /// on every message, then (priority mode only) stable-promotes
    /// `delay == 1` messages to the head.
    pub fn next_op_step(&mut self) {
        for msg in self.messages.iter_mut() {
            msg.set_traveled(false);
        }
        self.promote_if_priority();
    }

    /// Called once at the end of every global timestep: decrements every
    /// message's delay, then re-promotes as in `next_op_step`. Buffer
    /// length is invariant across this call.
    ///
    /// # Errors
    /// Propagates [`CoreError::DelayExhausted`] from any message whose
    /// delay had already reached 0 (Testable Property 2).
    pub fn dec_delays(&mut self) -> Result<()> {
        for msg in self.messages.iter_mut() {
            msg.decrement_delay()?;
        }
        self.promote_if_priority();
        Ok(())
    }

    fn promote_if_priority(&mut self) {
        if self.mode != QueueMode::Priority {
            return;
        }
        // Stable partition: all delay==1 messages first, in original
        // relative order, followed by the rest in original relative order.
        let (promoted, rest): (VecDeque<_>, VecDeque<_>) =
            self.messages.drain(..).partition(|m| m.delay() == 1);
        self.messages = promoted;
        self.messages.extend(rest);
    }

    /// `true` iff this queue is ready to cross a timestep boundary: empty
    /// in FIFO mode; in priority mode, not empty is acceptable but no
    /// message may have `delay == 1` (it must already have been drained).
    pub fn ready(&self) -> bool {
        match self.mode {
            QueueMode::Fifo => self.is_empty(),
            QueueMode::Priority => self.is_empty() || !self.messages.iter().any(|m| m.delay() == 1),
        }
    }

    /// Occupancy in `[0, 1]`.
    pub fn util(&self) -> f32 {
        if self.capacity == 0 {
            0.0
        } else {
            self.len() as f32 / self.capacity as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CoreId;

    fn msg(delay: u32) -> SpikeMessage {
        SpikeMessage::new(CoreId::new(0, 0), vec![3], delay)
    }

    #[test]
    fn capacity_invariant_holds() {
        let mut q = Queue::new(2, QueueMode::Fifo, Decoder::NoOp);
        q.enqueue(msg(5)).unwrap();
        assert!(!q.is_full(1));
        q.enqueue(msg(5)).unwrap();
        assert!(q.is_full(1));
        assert!(matches!(q.enqueue(msg(5)), Err(CoreError::QueueFull { .. })));
        assert!(q.len() <= q.capacity());
    }

    #[test]
    fn dequeue_from_empty_errors() {
        let mut q = Queue::with_defaults();
        assert!(matches!(q.dequeue(), Err(CoreError::QueueEmpty)));
    }

    #[test]
    fn peek_request_on_empty_never_wins_arbitration() {
        let q = Queue::with_defaults();
        assert_eq!(q.peek_request(), (Direction::Nop, true));
    }

    #[test]
    fn priority_mode_promotes_delay_one_to_head_stably() {
        // Reproduces queue_test.py: enqueue delay=4,3,2 then promote.
        let mut q = Queue::new(5, QueueMode::Priority, Decoder::NoOp);
        q.enqueue(msg(4)).unwrap();
        q.enqueue(msg(3)).unwrap();
        q.enqueue(msg(2)).unwrap();
        assert!(q.ready()); // no delay==1 present yet

        // Drive all three down to include a delay==1 message.
        q.dec_delays().unwrap(); // 4,3,2 -> 3,2,1
        assert!(!q.ready()); // a delay==1 message is present
        assert_eq!(q.peek_request().0, Direction::Nop); // head promoted, no decoder attached

        // the delay==1 message (originally enqueued third) must now be first
        let head = q.dequeue().unwrap();
        assert_eq!(head.delay(), 1);
    }

    #[test]
    fn fifo_mode_preserves_insertion_order() {
        let mut q = Queue::new(5, QueueMode::Fifo, Decoder::NoOp);
        q.enqueue(msg(4)).unwrap();
        q.enqueue(msg(3)).unwrap();
        q.enqueue(msg(2)).unwrap();
        let first = q.dequeue().unwrap();
        assert_eq!(first.delay(), 4);
    }

    #[test]
    fn next_op_step_twice_is_idempotent_once_sorted() {
        let mut q = Queue::new(5, QueueMode::Priority, Decoder::NoOp);
        q.enqueue(msg(1)).unwrap();
        q.enqueue(msg(5)).unwrap();
        q.next_op_step();
        let before: Vec<u32> = q.messages.iter().map(|m| m.delay()).collect();
        q.next_op_step();
        let after: Vec<u32> = q.messages.iter().map(|m| m.delay()).collect();
        assert_eq!(before, after);
    }
}
