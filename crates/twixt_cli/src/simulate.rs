//! Frame-by-frame tween simulation on a manual clock

use crate::config::{OutputFormat, TwixtConfig};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};
use twixt_animation::{TweenId, TweenScheduler};
use twixt_core::{lock_properties, ManualClock, Properties, SharedProperties};

/// Snapshot of every simulated tween after one tick
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub index: u64,
    pub time_ms: f64,
    pub tweens: Vec<TweenState>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TweenState {
    pub name: String,
    pub phase: String,
    pub values: Properties,
}

struct Entry {
    name: String,
    id: TweenId,
    target: SharedProperties,
}

/// Steps a scheduler forward one frame at a time. Yields a [`Frame`] per tick
/// until no tween is live or the frame limit is reached.
pub struct Simulation {
    clock: ManualClock,
    scheduler: TweenScheduler,
    entries: Vec<Entry>,
    frame_ms: f64,
    max_frames: u64,
    frame: u64,
    limit_warned: bool,
}

impl Simulation {
    /// Build and start every configured tween at time zero
    pub fn new(config: &TwixtConfig) -> Result<Self> {
        config.validate()?;

        let clock = ManualClock::new(0.0);
        let scheduler = TweenScheduler::with_clock(Arc::new(clock.clone()));

        let mut entries = Vec::with_capacity(config.tweens.len());
        for (index, tween_config) in config.tweens.iter().enumerate() {
            let name = tween_config.label(index);
            let target = tween_config.target();

            let completed_name = name.clone();
            let tween = tween_config
                .build(target.clone())?
                .on_complete(move |_| info!(tween = %completed_name, "tween completed"));

            let id = scheduler.start_tween(tween, None);
            entries.push(Entry { name, id, target });
        }

        Ok(Self {
            clock,
            scheduler,
            entries,
            frame_ms: config.simulation.frame_ms(),
            max_frames: config.simulation.max_frames,
            frame: 0,
            limit_warned: false,
        })
    }

    /// Frames produced so far
    pub fn frames(&self) -> u64 {
        self.frame
    }

    fn snapshot(&self, time_ms: f64) -> Frame {
        let tweens = self
            .entries
            .iter()
            .map(|entry| TweenState {
                name: entry.name.clone(),
                phase: self
                    .scheduler
                    .phase(entry.id)
                    .map(|phase| phase.to_string())
                    .unwrap_or_default(),
                values: lock_properties(&entry.target).clone(),
            })
            .collect();

        Frame {
            index: self.frame,
            time_ms,
            tweens,
        }
    }
}

impl Iterator for Simulation {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if !self.scheduler.has_active_tweens() {
            return None;
        }
        if self.frame >= self.max_frames {
            if !self.limit_warned {
                warn!(
                    frames = self.max_frames,
                    live = self.scheduler.live_count(),
                    "frame limit reached with tweens still live"
                );
                self.limit_warned = true;
            }
            return None;
        }

        let now = self.clock.advance(self.frame_ms);
        self.scheduler.tick(None);
        self.frame += 1;
        Some(self.snapshot(now))
    }
}

/// Render one frame as a single output line
pub fn render(frame: &Frame, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(frame)?),
        OutputFormat::Text => {
            let mut line = format!("{:>5} {:>9.1}ms", frame.index, frame.time_ms);
            for tween in &frame.tweens {
                write!(line, "  {}[{}]", tween.name, tween.phase)?;
                for (field, value) in tween.values.iter() {
                    write!(line, " {field}={value:.3}")?;
                }
            }
            Ok(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TweenConfig;
    use indexmap::IndexMap;
    use twixt_core::Value;

    fn fields(pairs: &[(&str, f64)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    fn config(fps: u32, tweens: Vec<TweenConfig>) -> TwixtConfig {
        let mut config = TwixtConfig {
            tweens,
            ..TwixtConfig::default()
        };
        config.simulation.fps = fps;
        config
    }

    #[test]
    fn test_linear_runs_to_completion() {
        let tween = TweenConfig {
            from: fields(&[("x", 0.0)]),
            to: fields(&[("x", 100.0)]),
            ..TweenConfig::default()
        };
        let frames: Vec<Frame> = Simulation::new(&config(10, vec![tween])).unwrap().collect();

        assert_eq!(frames.len(), 10);
        assert_eq!(frames[4].time_ms, 500.0);
        assert_eq!(frames[4].tweens[0].values.get("x"), Some(50.0));

        let last = frames.last().unwrap();
        assert_eq!(last.time_ms, 1000.0);
        assert_eq!(last.tweens[0].values.get("x"), Some(100.0));
        assert_eq!(last.tweens[0].phase, "completed");
    }

    #[test]
    fn test_yoyo_repeat_once() {
        let tween = TweenConfig {
            from: fields(&[("x", 0.0)]),
            to: fields(&[("x", 10.0)]),
            duration: 100.0,
            repeat: crate::config::RepeatSetting::Count(1),
            yoyo: true,
            ..TweenConfig::default()
        };
        let frames: Vec<Frame> = Simulation::new(&config(10, vec![tween])).unwrap().collect();

        let xs: Vec<f64> = frames
            .iter()
            .map(|f| f.tweens[0].values.get("x").unwrap())
            .collect();
        assert_eq!(xs, vec![10.0, 0.0]);
    }

    #[test]
    fn test_delay_reports_delaying_phase() {
        let tween = TweenConfig {
            from: fields(&[("x", 0.0)]),
            to: fields(&[("x", 10.0)]),
            duration: 100.0,
            delay: 200.0,
            ..TweenConfig::default()
        };
        let mut sim = Simulation::new(&config(10, vec![tween])).unwrap();

        let first = sim.next().unwrap();
        assert_eq!(first.tweens[0].phase, "delaying");
        assert_eq!(first.tweens[0].values.get("x"), Some(0.0));
        assert_eq!(sim.count(), 2);
    }

    #[test]
    fn test_frame_limit_stops_infinite_tween() {
        let tween = TweenConfig {
            from: fields(&[("x", 0.0)]),
            to: fields(&[("x", 1.0)]),
            duration: 100.0,
            repeat: crate::config::RepeatSetting::Keyword("infinite".into()),
            yoyo: true,
            ..TweenConfig::default()
        };
        let mut config = config(10, vec![tween]);
        config.simulation.max_frames = 5;

        let mut sim = Simulation::new(&config).unwrap();
        assert_eq!(sim.by_ref().count(), 5);
        assert!(sim.next().is_none());
        assert_eq!(sim.frames(), 5);
    }

    #[test]
    fn test_no_tweens_yields_nothing() {
        let mut sim = Simulation::new(&TwixtConfig::default()).unwrap();
        assert!(sim.next().is_none());
    }

    #[test]
    fn test_render_text_and_json() {
        let frame = Frame {
            index: 3,
            time_ms: 50.0,
            tweens: vec![TweenState {
                name: "fade".into(),
                phase: "running".into(),
                values: Properties::new().with("opacity", 0.5),
            }],
        };

        let text = render(&frame, OutputFormat::Text).unwrap();
        assert_eq!(text, "    3      50.0ms  fade[running] opacity=0.500");

        let json = render(&frame, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["tweens"][0]["values"]["opacity"], 0.5);
        assert_eq!(parsed["index"], 3);
    }
}
