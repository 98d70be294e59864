//! Mesh topology: wires a grid of cores and routers together (§4.5)

use std::cell::RefCell;
use std::rc::Rc;

use crate::core_bank::Core;
use crate::decoder::Decoder;
use crate::error::Result;
use crate::ids::{CoreId, Direction};
use crate::numeric::{FloatBackend, NumericBackend};
use crate::queue::{Queue, QueueMode};
use crate::router::Router;

/// Capacity used for the edge sinks dropped messages fall into at the mesh
/// boundary; these are never drained, so a small bound suffices.
const EDGE_SINK_CAPACITY: usize = 64;

/// A rectangular mesh of `width * height` cores, each paired with a router,
/// wired with X-then-Y dimension-order routing and edge sinks at the
/// boundary.
#[derive(Debug)]
pub struct Chip<B: NumericBackend = FloatBackend> {
    width: i32,
    height: i32,
    /// Indexed `[y * width + x]`.
    cores: Vec<Core<B>>,
    /// Indexed `[y * width + x]`.
    routers: Vec<Router>,
}

impl Chip<FloatBackend> {
    /// Build a `width x height` mesh using the floating-point backend, with
    /// every core and router input queue sized `buffer_capacity` in
    /// `buffer_mode`.
    pub fn new(width: i32, height: i32, buffer_capacity: usize, buffer_mode: QueueMode) -> Result<Self> {
        Self::with_backend(width, height, buffer_capacity, buffer_mode, |_| FloatBackend)
    }
}

impl<B: NumericBackend> Chip<B> {
    /// Build a `width x height` mesh, constructing each core's backend from
    /// `make_backend(coord)`.
    pub fn with_backend(
        width: i32,
        height: i32,
        buffer_capacity: usize,
        buffer_mode: QueueMode,
        mut make_backend: impl FnMut(CoreId) -> B,
    ) -> Result<Self> {
        let n = (width * height) as usize;
        let mut cores = Vec::with_capacity(n);
        let mut routers = Vec::with_capacity(n);
        for y in 0..height {
            for x in 0..width {
                let id = CoreId::new(x, y);
                cores.push(Core::with_backend(id, make_backend(id), buffer_capacity, buffer_mode));
                routers.push(Router::new(id, buffer_capacity, buffer_mode));
            }
        }

        let mut chip = Self { width, height, cores, routers };
        chip.wire()?;
        Ok(chip)
    }

    fn index(&self, coord: CoreId) -> usize {
        (coord.y * self.width + coord.x) as usize
    }

    fn neighbor(&self, coord: CoreId, dir: Direction) -> Option<CoreId> {
        let (dx, dy) = match dir {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
            Direction::Local | Direction::Nop => (0, 0),
        };
        let n = CoreId::new(coord.x + dx, coord.y + dy);
        if n.x >= 0 && n.x < self.width && n.y >= 0 && n.y < self.height {
            Some(n)
        } else {
            None
        }
    }

    /// Wire every router's four mesh-facing sinks to the neighbor's
    /// opposite-direction input queue (or a fresh edge sink at the
    /// boundary), wire the Local port to the co-located core's `in_buffer`,
    /// wire each core's outgoing sink to its router's Local input queue,
    /// then initialize every router's crossbar.
    fn wire(&mut self) -> Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let here = CoreId::new(x, y);
                let idx = self.index(here);

                for dir in [Direction::North, Direction::East, Direction::South, Direction::West] {
                    let sink = match self.neighbor(here, dir) {
                        Some(neighbor) => self.routers[self.index(neighbor)].get_buffer_ref(dir.opposite()),
                        None => Rc::new(RefCell::new(Queue::new(EDGE_SINK_CAPACITY, QueueMode::Fifo, Decoder::EdgeSink))),
                    };
                    self.routers[idx].set_sink_ref(dir, sink);
                }

                // Local: router forwards to the co-located core's shared
                // in_buffer; the core forwards outgoing spikes back to the
                // router's own Local input queue.
                self.routers[idx].set_sink_ref(Direction::Local, self.cores[idx].in_buffer_ref());

                let core_out_sink = self.routers[idx].get_buffer_ref(Direction::Local);
                self.cores[idx].set_sink_ref(core_out_sink);
            }
        }

        for router in &mut self.routers {
            router.initialize_crossbar()?;
        }
        Ok(())
    }

    /// Number of columns.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Immutable access to the core at `coord`.
    pub fn core(&self, coord: CoreId) -> &Core<B> {
        &self.cores[self.index(coord)]
    }

    /// Mutable access to the core at `coord`.
    pub fn core_mut(&mut self, coord: CoreId) -> &mut Core<B> {
        let idx = self.index(coord);
        &mut self.cores[idx]
    }

    /// Immutable access to the router at `coord`.
    pub fn router(&self, coord: CoreId) -> &Router {
        &self.routers[self.index(coord)]
    }

    /// Mutable access to the router at `coord`.
    pub fn router_mut(&mut self, coord: CoreId) -> &mut Router {
        let idx = self.index(coord);
        &mut self.routers[idx]
    }

    /// Iterate every core coordinate, row-major.
    pub fn coords(&self) -> impl Iterator<Item = CoreId> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| CoreId::new(x, y)))
    }

    pub(crate) fn cores_mut(&mut self) -> &mut [Core<B>] {
        &mut self.cores
    }

    pub(crate) fn routers_mut(&mut self) -> &mut [Router] {
        &mut self.routers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_core_chip_wires_local_loop() {
        let chip = Chip::new(1, 1, 8, QueueMode::Fifo).unwrap();
        assert_eq!(chip.width(), 1);
        assert_eq!(chip.height(), 1);
        assert!(chip.core(CoreId::new(0, 0)).ready());
        assert!(chip.router(CoreId::new(0, 0)).ready());
    }

    #[test]
    fn two_by_two_mesh_wires_every_neighbor() {
        let chip = Chip::new(2, 2, 8, QueueMode::Fifo).unwrap();
        for coord in chip.coords() {
            assert!(chip.router(coord).ready());
        }
    }
}
