/*
 * Debug Information Module
 *
 * Per-tick diagnostics reported by the scheduler and displayed by the
 * viewer's debug overlay.
 *
 * Includes metrics for:
 * - Tick number and buffer generation
 * - Population size and how many agents joined this tick
 * - Batch layout of the parallel steering pass
 * - Wall-clock time spent in the tick
 */

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    pub generation: u64,
    pub agents: usize,
    pub batches: usize,
    pub batch_size: usize,
    // Agents added from queued spawn requests before this tick ran
    pub spawned: usize,
    pub elapsed: f32,
    pub duration: Duration,
}

impl TickStats {
    // Agents processed per second of wall-clock time
    pub fn throughput(&self) -> f64 {
        let seconds = self.duration.as_secs_f64();
        if seconds > 0.0 {
            self.agents as f64 / seconds
        } else {
            0.0
        }
    }
}
