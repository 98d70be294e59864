//! Five-port NoC router (§4.3)

use std::cell::RefCell;
use std::rc::Rc;

use crate::arbiter::{Arbiter, Crossbar};
use crate::decoder::Decoder;
use crate::error::{CoreError, Result};
use crate::ids::{CoreId, Direction};
use crate::queue::{Queue, QueueMode};

/// Five-port router: owns five input queues (one per [`Direction::PORTS`]
/// entry), and holds non-owning references to five output sinks wired in
/// by the [`crate::chip::Chip`] at construction time.
#[derive(Debug)]
pub struct Router {
    id: CoreId,
    /// Input queues, indexed by `Direction::port_index()`.
    inputs: [Rc<RefCell<Queue>>; 5],
    /// Output sink references, indexed by `Direction::port_index()`.
    sinks: [Option<Rc<RefCell<Queue>>>; 5],
    crossbar: Option<Crossbar>,
}

impl Router {
    /// Construct a router at `id` with five input queues of the given
    /// capacity and queue mode, each decoding with `RouterDecode(id)`.
    pub fn new(id: CoreId, input_capacity: usize, mode: QueueMode) -> Self {
        let inputs: [Rc<RefCell<Queue>>; 5] =
            std::array::from_fn(|_| Rc::new(RefCell::new(Queue::new(input_capacity, mode, Decoder::RouterDecode(id)))));
        Self {
            id,
            inputs,
            sinks: Default::default(),
            crossbar: None,
        }
    }

    /// This router's (and its co-located core's) coordinate.
    pub fn id(&self) -> CoreId {
        self.id
    }

    /// A clone of the input queue for `dir`, for a neighbor (or the
    /// co-located core) to register as one of its sinks.
    pub fn get_buffer_ref(&self, dir: Direction) -> Rc<RefCell<Queue>> {
        let idx = dir.port_index().expect("get_buffer_ref requires a concrete port");
        self.inputs[idx].clone()
    }

    /// Register the destination queue messages decoded to `dir` should be
    /// forwarded to: a neighbor router's input queue, an edge sink, or the
    /// co-located core's `in_buffer`.
    pub fn set_sink_ref(&mut self, dir: Direction, sink: Rc<RefCell<Queue>>) {
        let idx = dir.port_index().expect("set_sink_ref requires a concrete port");
        self.sinks[idx] = Some(sink);
    }

    /// Build the crossbar from the five input queues and five sink refs.
    /// Must be called once, after every `set_sink_ref` call, and before
    /// `operate`.
    ///
    /// # Errors
    /// Returns [`CoreError::NotReady`] if any sink was never wired.
    pub fn initialize_crossbar(&mut self) -> Result<()> {
        let mut arbiters = Vec::with_capacity(5);
        for dir in Direction::PORTS {
            let idx = dir.port_index().unwrap();
            let sink = self.sinks[idx].clone().ok_or_else(|| {
                CoreError::not_ready(format!("router {} missing sink for {}", self.id, dir))
            })?;
            arbiters.push(Arbiter::new(dir, self.inputs.clone(), sink));
        }
        self.crossbar = Some(Crossbar::new(arbiters));
        Ok(())
    }

    /// Fire the crossbar once: arbitrate every output direction in the
    /// fixed [`Direction::PORTS`] order.
    pub fn operate(&mut self) -> Result<()> {
        match &mut self.crossbar {
            Some(crossbar) => crossbar.operate(),
            None => Err(CoreError::not_ready(format!("router {} crossbar not initialized", self.id))),
        }
    }

    /// Called once at the start of every op-step: propagate `next_op_step`
    /// to every input queue.
    pub fn next_op_step(&mut self) {
        for input in &self.inputs {
            input.borrow_mut().next_op_step();
        }
    }

    /// `true` iff every input queue is ready.
    pub fn ready(&self) -> bool {
        self.inputs.iter().all(|q| q.borrow().ready())
    }

    /// Decrement delays on every input queue. Requires `ready()`.
    ///
    /// # Errors
    /// Returns [`CoreError::NotReady`] if not ready, or propagates a
    /// [`CoreError::DelayExhausted`] from an input queue.
    pub fn next_timestep(&mut self) -> Result<()> {
        if !self.ready() {
            return Err(CoreError::not_ready(format!("router {}", self.id)));
        }
        for input in &self.inputs {
            input.borrow_mut().dec_delays()?;
        }
        Ok(())
    }

    /// Per-direction queue occupancy, laid out as a 3x3 compass matrix:
    /// North at `[0][1]`, West/Local/East across the middle row, South at
    /// `[2][1]`; corners are unused (0.0).
    pub fn util(&self) -> [[f32; 3]; 3] {
        let mut m = [[0.0_f32; 3]; 3];
        m[0][1] = self.inputs[Direction::North.port_index().unwrap()].borrow().util();
        m[1][0] = self.inputs[Direction::West.port_index().unwrap()].borrow().util();
        m[1][1] = self.inputs[Direction::Local.port_index().unwrap()].borrow().util();
        m[1][2] = self.inputs[Direction::East.port_index().unwrap()].borrow().util();
        m[2][1] = self.inputs[Direction::South.port_index().unwrap()].borrow().util();
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_sink() -> Rc<RefCell<Queue>> {
        Rc::new(RefCell::new(Queue::new(4, QueueMode::Fifo, Decoder::EdgeSink)))
    }

    #[test]
    fn ready_requires_all_inputs_ready() {
        let router = Router::new(CoreId::new(0, 0), 4, QueueMode::Fifo);
        assert!(router.ready());
    }

    #[test]
    fn initialize_crossbar_requires_all_sinks_wired() {
        let mut router = Router::new(CoreId::new(0, 0), 4, QueueMode::Fifo);
        let err = router.initialize_crossbar();
        assert!(matches!(err, Err(CoreError::NotReady { .. })));

        for dir in Direction::PORTS {
            router.set_sink_ref(dir, edge_sink());
        }
        assert!(router.initialize_crossbar().is_ok());
    }

    #[test]
    fn util_matrix_has_compass_layout() {
        let router = Router::new(CoreId::new(0, 0), 4, QueueMode::Fifo);
        let m = router.util();
        assert_eq!(m[0][0], 0.0);
        assert_eq!(m[2][2], 0.0);
    }

    #[test]
    fn messages_that_escape_the_mesh_land_in_the_edge_sink() {
        // Reproduces S5: a spike bound for (-1, 0) arriving at router (0, 0)
        // decodes to west, which at the mesh boundary is wired to an edge
        // sink rather than a neighbor, and never re-enters the mesh.
        use crate::spike::SpikeMessage;

        let mut router = Router::new(CoreId::new(0, 0), 4, QueueMode::Fifo);
        let west_edge = edge_sink();
        for dir in Direction::PORTS {
            if dir == Direction::West {
                router.set_sink_ref(dir, west_edge.clone());
            } else {
                router.set_sink_ref(dir, edge_sink());
            }
        }
        router.initialize_crossbar().unwrap();

        let local_input = router.get_buffer_ref(Direction::Local);
        local_input
            .borrow_mut()
            .enqueue(SpikeMessage::new(CoreId::new(-1, 0), vec![0], 3))
            .unwrap();

        router.next_op_step();
        router.operate().unwrap();

        assert!(local_input.borrow().is_empty());
        assert_eq!(west_edge.borrow().len(), 1);
        assert_eq!(west_edge.borrow().peek_request().0, Direction::West);
    }
}
