//! Error types for the core simulation engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the simulation engine.
///
/// Variants split along the §7 error-handling policy: programming errors
/// (fail fast at load time) and invariant violations (fatal at runtime).
#[derive(Error, Debug)]
pub enum CoreError {
    /// A queue enqueue was attempted while the queue was already full.
    #[error("queue at capacity {capacity}: cannot enqueue {attempted} more message(s)")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
        /// Number of messages that were attempted to be enqueued.
        attempted: usize,
    },

    /// A dequeue was attempted against an empty queue.
    #[error("cannot dequeue from an empty queue")]
    QueueEmpty,

    /// A spike's delay reached zero while still in flight.
    #[error("spike message delay reached 0 in flight (destination {dst_core}, axons {axon_ids:?})")]
    DelayExhausted {
        /// Destination core of the offending message.
        dst_core: crate::ids::CoreId,
        /// Destination axon ids of the offending message.
        axon_ids: Vec<u32>,
    },

    /// A synapse or axon declared a delay outside `[MIN_DELAY, MAX_DELAY]`.
    #[error("delay {delay} out of range [{min}, {max}] on line {line}")]
    InvalidDelay {
        /// The offending delay value.
        delay: i64,
        /// Minimum permitted delay (inclusive).
        min: u32,
        /// Maximum permitted delay (inclusive).
        max: u32,
        /// 1-based program file line the value came from.
        line: usize,
    },

    /// A ring-buffer slot computed from `delay_post + residual delay` did
    /// not fit within `[1, MAX_DELAY - 1]`.
    #[error("synapse delay_post ({delay_post}) plus residual delay ({residual}) reaches or exceeds MAX_DELAY ({max_delay}) on line {line}")]
    RingSlotOverflow {
        /// Synapse's own post-delay.
        delay_post: u32,
        /// Residual delay remaining on the spike at consumption.
        residual: u32,
        /// The fixed `MAX_DELAY` constant.
        max_delay: u32,
        /// 1-based program file line the synapse came from.
        line: usize,
    },

    /// A compartment bank, axon table, or synapse table exceeded its
    /// documented capacity (§3, §4.4 invariants).
    #[error("{resource} capacity exceeded: {requested} requested, limit is {limit}")]
    CapacityExceeded {
        /// Name of the resource (e.g. "n_neurons", "axon_in", "axon_out").
        resource: &'static str,
        /// Requested count.
        requested: usize,
        /// Documented limit.
        limit: usize,
    },

    /// `next_timestep` was called while a core or router was not ready.
    #[error("next_timestep called while not ready: {component}")]
    NotReady {
        /// Human-readable identity of the component that was not ready.
        component: String,
    },

    /// The op-step loop inside a single timestep exceeded the configured
    /// ceiling without reaching quiescence.
    #[error("op-step ceiling ({ceiling}) exceeded at timestep {timestep} without reaching quiescence")]
    OpStepCeilingExceeded {
        /// The configured ceiling.
        ceiling: u64,
        /// The timestep in which the ceiling was hit.
        timestep: u64,
    },

    /// A ring-slot accumulation, fixed-point decay, or overflow computation
    /// produced a value that is not representable in the configured
    /// [`crate::numeric::NumericMode`].
    #[error("numeric error: {reason}")]
    Numeric {
        /// Description of the failure.
        reason: String,
    },

    /// I/O error surfaced verbatim while reading a program file.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error.
        source: std::io::Error,
    },
}

impl CoreError {
    /// Construct a [`CoreError::CapacityExceeded`].
    pub fn capacity_exceeded(resource: &'static str, requested: usize, limit: usize) -> Self {
        Self::CapacityExceeded {
            resource,
            requested,
            limit,
        }
    }

    /// Construct a [`CoreError::InvalidDelay`].
    pub fn invalid_delay(delay: i64, min: u32, max: u32, line: usize) -> Self {
        Self::InvalidDelay {
            delay,
            min,
            max,
            line,
        }
    }

    /// Construct a [`CoreError::NotReady`].
    pub fn not_ready(component: impl Into<String>) -> Self {
        Self::NotReady {
            component: component.into(),
        }
    }

    /// Construct a [`CoreError::Numeric`].
    pub fn numeric(reason: impl Into<String>) -> Self {
        Self::Numeric {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_exceeded_reports_resource_name() {
        let err = CoreError::capacity_exceeded("axon_in", 5000, 4096);
        assert!(matches!(err, CoreError::CapacityExceeded { .. }));
        assert!(format!("{err}").contains("axon_in"));
    }

    #[test]
    fn invalid_delay_reports_line() {
        let err = CoreError::invalid_delay(0, 1, 64, 12);
        let msg = format!("{err}");
        assert!(msg.contains("line 12"));
    }
}
