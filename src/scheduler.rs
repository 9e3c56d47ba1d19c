//! Dual-rate tick scheduling.
//!
//! The data timeline fires at a fixed interval; the graph timeline fires at
//! `1 / fps` and only while animation is enabled. Both accumulate the same
//! frame deltas but never share state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_FPS: u32 = 1;
pub const MAX_FPS: u32 = 60;
pub const MAX_YSCALE: f32 = 100.0;

/// User-adjustable graph settings, also the `graph` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Animate graphs on their own timeline (default: true)
    #[serde(default = "default_animated")]
    pub animated: bool,

    /// Graph refresh rate, 1-60 (default: 30)
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Vertical scale in percent, 0-100 (default: 100)
    #[serde(default = "default_yscale")]
    pub yscale: f32,
}

fn default_animated() -> bool {
    true
}
fn default_fps() -> u32 {
    30
}
fn default_yscale() -> f32 {
    MAX_YSCALE
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            animated: default_animated(),
            fps: default_fps(),
            yscale: default_yscale(),
        }
    }
}

impl GraphConfig {
    pub fn set_animated(&mut self, animated: bool) {
        self.animated = animated;
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
    }

    pub fn set_yscale(&mut self, yscale: f32) {
        self.yscale = if yscale.is_nan() {
            MAX_YSCALE
        } else {
            yscale.clamp(0.0, MAX_YSCALE)
        };
    }

    /// Graph tick period for the current fps.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.clamp(MIN_FPS, MAX_FPS) as f64)
    }
}

/// Elapsed-time accumulator for one timeline.
#[derive(Debug, Clone)]
pub struct Accumulator {
    elapsed: Duration,
}

impl Accumulator {
    /// Starts empty: the first tick waits a full interval.
    pub fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
        }
    }

    /// Starts primed: the first poll fires immediately.
    pub fn primed(interval: Duration) -> Self {
        Self { elapsed: interval }
    }

    /// Returns whether the timeline ticks this frame, then adds `dt`.
    ///
    /// On a tick one interval is consumed; if the frame stalled long enough
    /// to owe further ticks they are dropped rather than replayed in a burst.
    pub fn poll(&mut self, dt: Duration, interval: Duration, enabled: bool) -> bool {
        let fire = enabled && self.elapsed >= interval;
        if fire {
            self.elapsed -= interval;
            if self.elapsed >= interval {
                self.elapsed = Duration::ZERO;
            }
        }
        self.elapsed += dt;
        fire
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Which timelines tick in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickPlan {
    pub data: bool,
    pub graph: bool,
}

/// Drives the data and graph timelines from render-frame deltas.
#[derive(Debug, Clone)]
pub struct DualRateScheduler {
    data_interval: Duration,
    data: Accumulator,
    graph: Accumulator,
}

impl DualRateScheduler {
    /// The data timeline fires on the first frame; the graph timeline
    /// waits one graph interval.
    pub fn new(data_interval: Duration) -> Self {
        Self {
            data_interval,
            data: Accumulator::primed(data_interval),
            graph: Accumulator::new(),
        }
    }

    pub fn data_interval(&self) -> Duration {
        self.data_interval
    }

    pub fn poll(&mut self, dt: Duration, graph: &GraphConfig) -> TickPlan {
        TickPlan {
            data: self.data.poll(dt, self.data_interval, true),
            graph: self.graph.poll(dt, graph.interval(), graph.animated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(10);

    #[test]
    fn test_graph_config_clamps() {
        let mut g = GraphConfig::default();
        g.set_fps(0);
        assert_eq!(g.fps, 1);
        g.set_fps(500);
        assert_eq!(g.fps, 60);
        g.set_yscale(-5.0);
        assert_eq!(g.yscale, 0.0);
        g.set_yscale(250.0);
        assert_eq!(g.yscale, 100.0);
        g.set_yscale(f32::NAN);
        assert_eq!(g.yscale, 100.0);
    }

    #[test]
    fn test_accumulator_carries_remainder() {
        let interval = Duration::from_millis(25);
        let mut acc = Accumulator::new();
        let fired: Vec<bool> = (0..10).map(|_| acc.poll(FRAME, interval, true)).collect();
        // ticks once 30ms, 55ms and 80ms have accumulated
        assert_eq!(fired.iter().filter(|f| **f).count(), 3);
        assert_eq!(
            fired,
            vec![false, false, false, true, false, true, false, false, true, false]
        );
    }

    #[test]
    fn test_accumulator_drops_backlog() {
        let interval = Duration::from_millis(10);
        let mut acc = Accumulator::new();
        assert!(!acc.poll(Duration::from_millis(100), interval, true));
        assert!(acc.poll(FRAME, interval, true));
        assert_eq!(acc.elapsed(), FRAME);
    }

    #[test]
    fn test_disabled_accumulator_never_fires() {
        let mut acc = Accumulator::primed(FRAME);
        for _ in 0..100 {
            assert!(!acc.poll(FRAME, FRAME, false));
        }
    }

    #[test]
    fn test_data_fires_on_first_frame_then_every_interval() {
        let mut sched = DualRateScheduler::new(Duration::from_secs(1));
        let graph = GraphConfig {
            animated: false,
            ..Default::default()
        };
        assert!(sched.poll(FRAME, &graph).data);

        let ticks = (0..1000).filter(|_| sched.poll(FRAME, &graph).data).count();
        assert_eq!(ticks, 10);
    }

    #[test]
    fn test_rates_are_independent() {
        let mut sched = DualRateScheduler::new(Duration::from_secs(1));
        let graph = GraphConfig::default();

        let mut data = 0;
        let mut graph_ticks = 0;
        for _ in 0..10_000 {
            let plan = sched.poll(FRAME, &graph);
            data += plan.data as usize;
            graph_ticks += plan.graph as usize;
        }
        assert_eq!(data, 100);
        assert!((2990..=3000).contains(&graph_ticks), "graph ticks {}", graph_ticks);
    }
}
