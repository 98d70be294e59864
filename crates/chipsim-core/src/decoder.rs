//! Pluggable decode-on-enqueue strategies (§9 Design Notes)
//!
//! The reference attaches a per-instance closure to each queue. Rather than
//! runtime closures, this is modeled as a small fixed set of tagged
//! strategies selected once at wiring time.

use crate::ids::{CoreId, Direction};
use crate::spike::SpikeMessage;

/// Strategy a [`crate::queue::Queue`] runs on every enqueue to set the
/// message's [`Direction`] tag.
#[derive(Debug, Clone, Copy)]
pub enum Decoder {
    /// Leaves `dir_tag` untouched: used for core input buffers, whose
    /// consumer is `process_msg`, not the crossbar, and for edge sinks.
    NoOp,
    /// Diagnostic sink at the mesh boundary; behaviorally identical to
    /// [`Decoder::NoOp`] but named distinctly so a reader can tell a
    /// dropped-at-edge queue apart from an ordinary unattached one.
    EdgeSink,
    /// Dimension-order decode relative to the owning router's coordinate.
    RouterDecode(CoreId),
}

impl Decoder {
    /// Apply this decoder to `msg`, setting its direction tag.
    pub fn decode(&self, msg: &mut SpikeMessage) {
        match self {
            Decoder::NoOp | Decoder::EdgeSink => {}
            Decoder::RouterDecode(router_id) => {
                msg.set_dir_tag(dimension_order_direction(*router_id, msg.dst_core()));
            }
        }
    }
}

/// X-then-Y dimension-order routing decode (§4.2).
pub fn dimension_order_direction(from: CoreId, to: CoreId) -> Direction {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        Direction::Local
    } else if dx != 0 {
        if dx > 0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if dy > 0 {
        Direction::North
    } else {
        Direction::South
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_x_before_y() {
        let here = CoreId::new(1, 1);
        assert_eq!(dimension_order_direction(here, CoreId::new(1, 1)), Direction::Local);
        assert_eq!(dimension_order_direction(here, CoreId::new(3, 1)), Direction::East);
        assert_eq!(dimension_order_direction(here, CoreId::new(0, 1)), Direction::West);
        // dx != 0 takes priority over dy even when both are nonzero.
        assert_eq!(dimension_order_direction(here, CoreId::new(2, 5)), Direction::East);
        assert_eq!(dimension_order_direction(here, CoreId::new(1, 5)), Direction::North);
        assert_eq!(dimension_order_direction(here, CoreId::new(1, 0)), Direction::South);
    }

    #[test]
    fn noop_and_edge_sink_leave_tag_alone() {
        let mut msg = SpikeMessage::new(CoreId::new(5, 5), vec![0], 1);
        Decoder::NoOp.decode(&mut msg);
        assert_eq!(msg.dir_tag(), Direction::Nop);
        Decoder::EdgeSink.decode(&mut msg);
        assert_eq!(msg.dir_tag(), Direction::Nop);
    }
}
