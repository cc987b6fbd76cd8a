//! The codec pump.
//!
//! A pump drives one [`CodecInstance`] from a data source to a data sink
//! until output end-of-stream, using the bounded-timeout buffer-queue
//! protocol. The same engine serves both phases of a conversion: the decode
//! pump drains a compressed track into raw frames, the encode pump
//! re-compresses raw frames into the target format.

use crate::cancel::CancelToken;
use crate::traits::{CodecInstance, UnitSink, UnitSource};
use revid_core::{Error, Result, SlotFlags};
use std::time::Duration;
use tracing::{debug, trace};

/// How many ready output slots to drain per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Drain every output slot that is ready before attempting more input.
    ///
    /// A decoder may buffer and reorder, emitting zero or multiple output
    /// units per input unit; a 1:1 dequeue policy can stall or drop units.
    /// This policy is always safe.
    #[default]
    DrainAll,
    /// Drain at most one output slot per iteration.
    ///
    /// Sufficient for an encoder, which produces output at the same
    /// cadence as its input.
    Single,
}

/// Pump configuration.
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Bound on each buffer-slot acquisition wait.
    pub slot_timeout: Duration,
    /// Liveness budget: consecutive iterations that may pass without a slot
    /// acquired or an output drained before the pump fails with
    /// [`Error::PumpStall`].
    pub max_idle_iterations: u32,
    /// Output drain policy.
    pub drain: DrainPolicy,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            slot_timeout: Duration::from_micros(2000),
            max_idle_iterations: 1024,
            drain: DrainPolicy::DrainAll,
        }
    }
}

/// Counters from one pump run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpStats {
    /// Input units submitted, not counting the end-of-stream marker.
    pub units_submitted: u64,
    /// Output units drained, including the end-of-stream unit.
    pub units_drained: u64,
    /// Total payload bytes written to the sink.
    pub bytes_drained: u64,
    /// Iterations that made no progress.
    pub idle_iterations: u64,
}

/// Drives a codec instance from a source to a sink until end-of-stream.
#[derive(Debug, Default)]
pub struct CodecPump {
    config: PumpConfig,
    cancel: CancelToken,
}

impl CodecPump {
    /// Create a pump with the given configuration.
    pub fn new(config: PumpConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancellation token, inspected at each iteration boundary.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the pump to output end-of-stream.
    ///
    /// Each iteration submits at most one input unit (an empty
    /// end-of-stream unit once the source is exhausted) and then drains
    /// ready output slots per the configured [`DrainPolicy`]. The loop
    /// terminates when an output slot flagged end-of-stream has been
    /// drained, and fails with [`Error::PumpStall`] once the liveness
    /// budget is exhausted without progress.
    pub fn run<C, S, K>(&self, codec: &mut C, source: &mut S, sink: &mut K) -> Result<PumpStats>
    where
        C: CodecInstance + ?Sized,
        S: UnitSource,
        K: UnitSink,
    {
        let timeout = self.config.slot_timeout;
        let mut stats = PumpStats::default();
        let mut input_eos = false;
        let mut last_pts = 0i64;
        let mut idle = 0u32;

        debug!(policy = ?self.config.drain, "pump starting");

        loop {
            if self.cancel.is_cancelled() {
                debug!("pump cancelled");
                return Err(Error::Cancelled);
            }

            let mut progressed = false;

            if !input_eos {
                if let Some(slot) = codec.dequeue_input(timeout)? {
                    progressed = true;
                    match source.next_unit()? {
                        Some(unit) => {
                            last_pts = unit.pts_us;
                            codec.queue_input(slot, &unit.data, unit.pts_us, SlotFlags::empty())?;
                            stats.units_submitted += 1;
                            trace!(pts_us = unit.pts_us, size = unit.data.len(), "unit submitted");
                        }
                        None => {
                            input_eos = true;
                            codec.queue_input(slot, &[], last_pts, SlotFlags::END_OF_STREAM)?;
                            trace!("input end-of-stream submitted");
                        }
                    }
                }
            }

            loop {
                let Some(slot) = codec.dequeue_output(timeout)? else {
                    break;
                };
                progressed = true;
                let eos = slot.is_eos();
                debug_assert!(
                    input_eos || !eos,
                    "codec produced output end-of-stream before input end-of-stream"
                );

                let data = codec.output_data(&slot)?;
                sink.write_unit(data, slot.pts_us, eos)?;
                stats.units_drained += 1;
                stats.bytes_drained += data.len() as u64;
                codec.release_output(slot)?;

                if eos {
                    debug!(
                        submitted = stats.units_submitted,
                        drained = stats.units_drained,
                        "pump finished"
                    );
                    return Ok(stats);
                }
                if self.config.drain == DrainPolicy::Single {
                    break;
                }
            }

            if progressed {
                idle = 0;
            } else {
                idle += 1;
                stats.idle_iterations += 1;
                if idle >= self.config.max_idle_iterations {
                    return Err(Error::PumpStall {
                        idle_iterations: idle,
                    });
                }
            }
        }
    }
}
