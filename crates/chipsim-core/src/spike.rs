//! The unit of NoC traffic: a spike message in flight between cores

use crate::error::{CoreError, Result};
use crate::ids::{CoreId, Direction};

/// A spike message traveling through the NoC fabric toward `dst_core`.
///
/// Mirrors the reference `SpikeMsg`: a destination, a list of destination
/// axons, a remaining delay in timesteps, a routing direction tag set by
/// the last router to decode it, and the traveled flag that enforces the
/// one-hop-per-op-step invariant (Testable Property 3).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpikeMessage {
    /// Destination core coordinate; immutable after creation.
    dst_core: CoreId,
    /// Destination axon ids on `dst_core`.
    axon_ids: Vec<u32>,
    /// Remaining delay in timesteps; strictly positive while in flight.
    delay: u32,
    /// Direction this message should move next; `Nop` until decoded.
    dir_tag: Direction,
    /// Set on enqueue, cleared at the start of every op-step.
    traveled_this_opstep: bool,
}

impl SpikeMessage {
    /// Create a new spike message with delay `delay` and no decoded
    /// direction yet (`dir_tag = Nop`, `traveled_this_opstep = false`).
    pub fn new(dst_core: CoreId, axon_ids: Vec<u32>, delay: u32) -> Self {
        debug_assert!(delay >= crate::MIN_DELAY, "spike delay must be >= MIN_DELAY");
        Self {
            dst_core,
            axon_ids,
            delay,
            dir_tag: Direction::Nop,
            traveled_this_opstep: false,
        }
    }

    /// Destination core coordinate.
    pub fn dst_core(&self) -> CoreId {
        self.dst_core
    }

    /// Destination axon ids.
    pub fn axon_ids(&self) -> &[u32] {
        &self.axon_ids
    }

    /// Remaining delay in timesteps.
    pub fn delay(&self) -> u32 {
        self.delay
    }

    /// Current routing direction tag.
    pub fn dir_tag(&self) -> Direction {
        self.dir_tag
    }

    /// Whether this message has already been forwarded through a router
    /// this op-step.
    pub fn traveled(&self) -> bool {
        self.traveled_this_opstep
    }

    /// Decrement the remaining delay by one; called once per global
    /// timestep from [`crate::queue::Queue::dec_delays`].
    ///
    /// Returns [`CoreError::DelayExhausted`] if delay was already 0
    /// (Testable Property 2: a message must never reach 0 while still in
    /// flight — consumption at delay 1 must already have happened).
    pub fn decrement_delay(&mut self) -> Result<()> {
        if self.delay == 0 {
            return Err(CoreError::DelayExhausted {
                dst_core: self.dst_core,
                axon_ids: self.axon_ids.clone(),
            });
        }
        self.delay -= 1;
        Ok(())
    }

    /// Set the direction tag, as computed by a router's decoder.
    pub fn set_dir_tag(&mut self, dir: Direction) {
        self.dir_tag = dir;
    }

    /// Mark this message as having moved through a router this op-step.
    pub fn set_traveled(&mut self, traveled: bool) {
        self.traveled_this_opstep = traveled;
    }
}

impl core::fmt::Display for SpikeMessage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "SpikeMessage(dst={}, axons={:?}, delay={}, dir={}, traveled={})",
            self.dst_core, self.axon_ids, self.delay, self.dir_tag, self.traveled_this_opstep
        )
    }
}
