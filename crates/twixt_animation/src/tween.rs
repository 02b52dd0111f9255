//! Tweens
//!
//! A [`Tween`] drives named fields of a shared target from the values they
//! hold when the tween starts to a set of end values. Elapsed time is mapped
//! linearly to progress and shaped by an easing curve.
//!
//! A tween is a plain state machine: [`Tween::start`] arms it and
//! [`Tween::advance`] moves it to a point in time. It can be driven by hand,
//! but it is normally handed to a
//! [`TweenScheduler`](crate::scheduler::TweenScheduler), which advances every
//! registered tween on each tick.
//!
//! ```text
//! Idle ──start──▶ Delaying ──activation──▶ Running ──cycle done──▶ Completed
//!                    ▲                        │
//!                    └──── repeats left ──────┘        stop ──▶ Stopped
//! ```
//!
//! # Example
//!
//! ```rust
//! use twixt_animation::{Easing, Tween};
//! use twixt_core::{lock_properties, Properties};
//!
//! let target = Properties::new().with("x", 0.0).into_shared();
//! let mut tween = Tween::new(target.clone())
//!     .to([("x", 100.0)], Some(1000.0))
//!     .easing(Easing::Linear);
//!
//! tween.start(0.0);
//! assert!(tween.advance(500.0));
//! assert_eq!(lock_properties(&target).get("x"), Some(50.0));
//! assert!(!tween.advance(1000.0));
//! ```

use crate::easing::{Easing, EasingFunction};
use std::fmt;
use std::sync::Arc;
use twixt_core::{lock_properties, Properties, SharedProperties, Value};

/// Default tween duration in milliseconds
pub const DEFAULT_DURATION_MS: f64 = 1000.0;

/// Lifecycle callback, receives the target's fields
pub type TweenCallback = Box<dyn FnMut(&Properties) + Send>;

/// How many extra cycles run after the first one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    Count(u32),
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(0)
    }
}

impl From<u32> for Repeat {
    fn from(count: u32) -> Self {
        Repeat::Count(count)
    }
}

impl Repeat {
    /// Cycles left, `None` when unbounded
    pub fn remaining(&self) -> Option<u32> {
        match self {
            Repeat::Count(n) => Some(*n),
            Repeat::Infinite => None,
        }
    }

    /// Consume one cycle, returning false when none are left
    fn take_cycle(&mut self) -> bool {
        match self {
            Repeat::Count(0) => false,
            Repeat::Count(n) => {
                *n -= 1;
                true
            }
            Repeat::Infinite => true,
        }
    }
}

/// Where a tween is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TweenPhase {
    /// Constructed, never started
    #[default]
    Idle,
    /// Started, waiting for the activation time
    Delaying,
    /// Interpolating
    Running,
    /// Final cycle finished
    Completed,
    /// Cancelled by `stop`
    Stopped,
}

impl TweenPhase {
    /// Delaying or running
    pub fn is_playing(&self) -> bool {
        matches!(self, TweenPhase::Delaying | TweenPhase::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TweenPhase::Completed | TweenPhase::Stopped)
    }
}

impl fmt::Display for TweenPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TweenPhase::Idle => "idle",
            TweenPhase::Delaying => "delaying",
            TweenPhase::Running => "running",
            TweenPhase::Completed => "completed",
            TweenPhase::Stopped => "stopped",
        })
    }
}

/// Interpolates numeric fields of a shared target over time
pub struct Tween {
    target: SharedProperties,
    /// Target fields as they were at construction, the fallback for fields
    /// missing when the tween starts
    initial_values: Properties,
    start_values: Properties,
    /// Where each cycle restarts from; swapped with `end_values` on yoyo
    repeat_base_values: Properties,
    end_values: Properties,
    duration_ms: f64,
    delay_ms: f64,
    repeat: Repeat,
    yoyo: bool,
    reversed: bool,
    easing: Arc<dyn EasingFunction>,
    phase: TweenPhase,
    activation_time: f64,
    start_fired: bool,
    on_start: Option<TweenCallback>,
    on_update: Option<TweenCallback>,
    on_complete: Option<TweenCallback>,
    on_stop: Option<TweenCallback>,
}

impl Tween {
    /// Create an idle tween over `target` with default settings: one second,
    /// no delay, no repeat, linear easing
    pub fn new(target: SharedProperties) -> Self {
        let initial_values = lock_properties(&target).clone();
        Self {
            target,
            initial_values,
            start_values: Properties::new(),
            repeat_base_values: Properties::new(),
            end_values: Properties::new(),
            duration_ms: DEFAULT_DURATION_MS,
            delay_ms: 0.0,
            repeat: Repeat::default(),
            yoyo: false,
            reversed: false,
            easing: Arc::new(Easing::Linear),
            phase: TweenPhase::Idle,
            activation_time: 0.0,
            start_fired: false,
            on_start: None,
            on_update: None,
            on_complete: None,
            on_stop: None,
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    /// Set the end values, optionally overriding the duration.
    ///
    /// Values are coerced to numbers now. Text that is not wholly numeric
    /// becomes NaN and propagates into the target when the tween runs.
    pub fn to<I, K, V>(mut self, properties: I, duration_ms: Option<f64>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_end_values(Properties::from_targets(properties), duration_ms);
        self
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.set_duration(ms);
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.set_delay(ms);
        self
    }

    /// Number of extra cycles after the first
    pub fn repeat(mut self, repeat: impl Into<Repeat>) -> Self {
        self.set_repeat(repeat.into());
        self
    }

    pub fn repeat_forever(mut self) -> Self {
        self.set_repeat(Repeat::Infinite);
        self
    }

    /// Reverse direction on every repeat cycle
    pub fn yoyo(mut self, enabled: bool) -> Self {
        self.set_yoyo(enabled);
        self
    }

    pub fn easing(mut self, easing: impl EasingFunction + 'static) -> Self {
        self.set_easing(easing);
        self
    }

    /// Called on the first tick at or after activation
    pub fn on_start<F: FnMut(&Properties) + Send + 'static>(mut self, callback: F) -> Self {
        self.set_on_start(callback);
        self
    }

    /// Called after every tick that writes the target
    pub fn on_update<F: FnMut(&Properties) + Send + 'static>(mut self, callback: F) -> Self {
        self.set_on_update(callback);
        self
    }

    /// Called when the last cycle finishes
    pub fn on_complete<F: FnMut(&Properties) + Send + 'static>(mut self, callback: F) -> Self {
        self.set_on_complete(callback);
        self
    }

    /// Called when a playing tween is stopped
    pub fn on_stop<F: FnMut(&Properties) + Send + 'static>(mut self, callback: F) -> Self {
        self.set_on_stop(callback);
        self
    }

    // =========================================================================
    // In-place configuration
    // =========================================================================

    /// Replace the end values. A running tween picks them up on its next
    /// advance. No consistency with the captured start values is checked.
    pub fn set_end_values(&mut self, end_values: Properties, duration_ms: Option<f64>) {
        if let Some(ms) = duration_ms {
            self.duration_ms = ms;
        }
        self.end_values = end_values;
    }

    pub fn set_duration(&mut self, ms: f64) {
        self.duration_ms = ms;
    }

    pub fn set_delay(&mut self, ms: f64) {
        self.delay_ms = ms;
    }

    pub fn set_repeat(&mut self, repeat: Repeat) {
        self.repeat = repeat;
    }

    pub fn set_yoyo(&mut self, enabled: bool) {
        self.yoyo = enabled;
    }

    pub fn set_easing(&mut self, easing: impl EasingFunction + 'static) {
        self.easing = Arc::new(easing);
    }

    pub fn set_on_start<F: FnMut(&Properties) + Send + 'static>(&mut self, callback: F) {
        self.on_start = Some(Box::new(callback));
    }

    pub fn set_on_update<F: FnMut(&Properties) + Send + 'static>(&mut self, callback: F) {
        self.on_update = Some(Box::new(callback));
    }

    pub fn set_on_complete<F: FnMut(&Properties) + Send + 'static>(&mut self, callback: F) {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn set_on_stop<F: FnMut(&Properties) + Send + 'static>(&mut self, callback: F) {
        self.on_stop = Some(Box::new(callback));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn target(&self) -> &SharedProperties {
        &self.target
    }

    pub fn end_values(&self) -> &Properties {
        &self.end_values
    }

    /// Values the current cycle interpolates from
    pub fn start_values(&self) -> &Properties {
        &self.start_values
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Cycles still to run after the current one
    pub fn repeat_remaining(&self) -> Repeat {
        self.repeat
    }

    pub fn is_yoyo(&self) -> bool {
        self.yoyo
    }

    /// True while an odd number of yoyo cycles have run
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn phase(&self) -> TweenPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase.is_playing()
    }

    /// Time at which the current cycle's clock starts
    pub fn activation_time(&self) -> f64 {
        self.activation_time
    }

    /// Linear progress of the current cycle at `now`, in `[0, 1]`.
    ///
    /// A zero (or otherwise non-positive) duration is always complete.
    pub fn progress_at(&self, now: f64) -> f64 {
        if !(self.duration_ms > 0.0) {
            return 1.0;
        }
        ((now - self.activation_time) / self.duration_ms).clamp(0.0, 1.0)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Arm the tween at time `now`.
    ///
    /// Captures the current value of every end-value field from the target.
    /// A field the target lacks falls back to its value at construction, then
    /// to `0`. NaN captures become `0`. Calling this again restarts from
    /// whatever the target holds at that moment.
    pub fn start(&mut self, now: f64) {
        {
            let target = lock_properties(&self.target);
            self.start_values.clear();
            for (field, _) in self.end_values.iter() {
                let captured = target
                    .get(field)
                    .or_else(|| self.initial_values.get(field))
                    .map(or_zero)
                    .unwrap_or(0.0);
                self.start_values.set(field, captured);
            }
        }
        self.repeat_base_values = self.start_values.clone();

        self.activation_time = now + self.delay_ms;
        self.start_fired = false;
        self.phase = if now < self.activation_time {
            TweenPhase::Delaying
        } else {
            TweenPhase::Running
        };

        tracing::debug!(
            fields = self.end_values.len(),
            activation = self.activation_time,
            duration = self.duration_ms,
            "tween started"
        );
    }

    /// Cancel a playing tween.
    ///
    /// Leaves the target as last written and fires `on_stop`. Returns false,
    /// without firing anything, when the tween was not playing.
    pub fn stop(&mut self) -> bool {
        if !self.phase.is_playing() {
            return false;
        }

        self.phase = TweenPhase::Stopped;
        fire(&mut self.on_stop, &self.target);

        tracing::debug!("tween stopped");
        true
    }

    /// Move the tween to time `now`.
    ///
    /// Returns true while the tween wants further ticks. Returns false once
    /// its final cycle has completed, and for a tween that is idle, completed
    /// or stopped (in which case nothing is touched).
    pub fn advance(&mut self, now: f64) -> bool {
        if !self.phase.is_playing() {
            return false;
        }

        if now < self.activation_time {
            self.phase = TweenPhase::Delaying;
            return true;
        }
        self.phase = TweenPhase::Running;

        if !self.start_fired {
            self.start_fired = true;
            fire(&mut self.on_start, &self.target);
        }

        let elapsed = self.progress_at(now);
        let shaped = self.easing.evaluate(elapsed);

        {
            let mut target = lock_properties(&self.target);
            for (field, end) in self.end_values.iter() {
                let start = self.start_values.get(field).map(or_zero).unwrap_or(0.0);
                target.set(field, start + (end - start) * shaped);
            }
        }

        fire(&mut self.on_update, &self.target);

        if elapsed < 1.0 {
            return true;
        }

        if self.repeat.take_cycle() {
            for (field, base) in self.repeat_base_values.iter_mut() {
                if self.yoyo {
                    if let Some(end) = self.end_values.get_mut(field) {
                        std::mem::swap(base, end);
                    }
                }
                self.start_values.set(field, *base);
            }

            if self.yoyo {
                self.reversed = !self.reversed;
            }
            self.activation_time = now + self.delay_ms;
            if now < self.activation_time {
                self.phase = TweenPhase::Delaying;
            }

            tracing::trace!(
                remaining = ?self.repeat.remaining(),
                reversed = self.reversed,
                "tween cycle repeated"
            );
            return true;
        }

        self.phase = TweenPhase::Completed;
        fire(&mut self.on_complete, &self.target);

        tracing::debug!("tween completed");
        false
    }
}

/// Call a lifecycle callback with a snapshot of the target.
///
/// The target is unlocked while the callback runs, so it may lock the target
/// itself or start other tweens over it.
fn fire(slot: &mut Option<TweenCallback>, target: &SharedProperties) {
    if let Some(callback) = slot.as_mut() {
        let snapshot = lock_properties(target).clone();
        callback(&snapshot);
    }
}

/// Missing-or-NaN start values count as zero
fn or_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn counter() -> (Arc<Mutex<u32>>, impl FnMut(&Properties) + Send + 'static) {
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        (count, move |_: &Properties| *count_clone.lock().unwrap() += 1)
    }

    fn value(target: &SharedProperties, field: &str) -> f64 {
        lock_properties(target).get(field).unwrap()
    }

    #[test]
    fn test_linear_tween_reaches_end() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (completed, on_complete) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 100.0)], None)
            .on_complete(on_complete);
        tween.start(0.0);

        assert!(tween.advance(500.0));
        assert_eq!(value(&target, "x"), 50.0);
        assert_eq!(tween.phase(), TweenPhase::Running);

        assert!(!tween.advance(1000.0));
        assert_eq!(value(&target, "x"), 100.0);
        assert_eq!(*completed.lock().unwrap(), 1);
        assert_eq!(tween.phase(), TweenPhase::Completed);

        // Finished tweens ignore further ticks
        assert!(!tween.advance(2000.0));
        assert_eq!(*completed.lock().unwrap(), 1);
    }

    #[test]
    fn test_delay_holds_target() {
        let target = Properties::new().with("x", 5.0).into_shared();
        let (started, on_start) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 15.0)], Some(100.0))
            .delay(50.0)
            .on_start(on_start);
        tween.start(0.0);
        assert_eq!(tween.phase(), TweenPhase::Delaying);
        assert_eq!(tween.activation_time(), 50.0);

        assert!(tween.advance(49.0));
        assert_eq!(value(&target, "x"), 5.0);
        assert_eq!(*started.lock().unwrap(), 0);

        assert!(tween.advance(100.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(*started.lock().unwrap(), 1);
    }

    #[test]
    fn test_delay_reapplied_between_cycles() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (completed, on_complete) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .delay(50.0)
            .repeat(1)
            .on_complete(on_complete);
        tween.start(0.0);

        // First cycle runs 50..150, then waits out the delay again
        assert!(tween.advance(150.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(tween.activation_time(), 200.0);
        assert_eq!(tween.phase(), TweenPhase::Delaying);

        assert!(tween.advance(180.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(tween.phase(), TweenPhase::Delaying);

        assert!(tween.advance(250.0));
        assert_eq!(value(&target, "x"), 5.0);
        assert_eq!(tween.phase(), TweenPhase::Running);

        assert!(!tween.advance(300.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(tween.phase(), TweenPhase::Completed);
        assert_eq!(*completed.lock().unwrap(), 1);
    }

    #[test]
    fn test_repeated_advance_is_idempotent() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (started, on_start) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .on_start(on_start);
        tween.start(0.0);

        tween.advance(30.0);
        let first = value(&target, "x");
        tween.advance(30.0);

        assert_eq!(value(&target, "x"), first);
        assert_eq!(*started.lock().unwrap(), 1);
    }

    #[test]
    fn test_cycle_transition_not_reapplied_for_same_time() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .repeat(2)
            .yoyo(true);
        tween.start(0.0);

        tween.advance(100.0);
        assert_eq!(tween.repeat_remaining(), Repeat::Count(1));

        // Same instant again is the start of the next cycle, not another completion
        tween.advance(100.0);
        assert_eq!(tween.repeat_remaining(), Repeat::Count(1));
        assert_eq!(value(&target, "x"), 10.0);
    }

    #[test]
    fn test_easing_shapes_final_value() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone())
            .to([("x", 100.0)], Some(200.0))
            .easing(|t: f64| t * 0.5);
        tween.start(10.0);

        assert!(!tween.advance(210.0));
        assert_eq!(value(&target, "x"), 50.0);
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let target = Properties::new().with("x", 1.0).into_shared();
        let mut tween = Tween::new(target.clone()).to([("x", 2.0)], None).duration(0.0);
        tween.start(100.0);

        assert!(!tween.advance(100.0));
        assert_eq!(value(&target, "x"), 2.0);
    }

    #[test]
    fn test_repeat_without_yoyo_restarts_from_base() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .repeat(1);
        tween.start(0.0);

        assert!(tween.advance(100.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(tween.start_values().get("x"), Some(0.0));

        assert!(tween.advance(150.0));
        assert_eq!(value(&target, "x"), 5.0);

        assert!(!tween.advance(200.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert_eq!(tween.repeat_remaining(), Repeat::Count(0));
    }

    #[test]
    fn test_yoyo_reverses_each_cycle() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (completed, on_complete) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .repeat(1)
            .yoyo(true)
            .on_complete(on_complete);
        tween.start(0.0);

        assert!(tween.advance(100.0));
        assert_eq!(value(&target, "x"), 10.0);
        assert!(tween.is_reversed());
        assert_eq!(tween.start_values().get("x"), Some(10.0));
        assert_eq!(tween.end_values().get("x"), Some(0.0));

        assert!(tween.advance(150.0));
        assert_eq!(value(&target, "x"), 5.0);

        assert!(!tween.advance(200.0));
        assert_eq!(value(&target, "x"), 0.0);
        assert_eq!(*completed.lock().unwrap(), 1);
    }

    #[test]
    fn test_infinite_yoyo_oscillates() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (completed, on_complete) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 1.0)], Some(10.0))
            .repeat_forever()
            .yoyo(true)
            .on_complete(on_complete);
        tween.start(0.0);

        for cycle in 1..=50 {
            assert!(tween.advance(cycle as f64 * 10.0));
            let expected = if cycle % 2 == 1 { 1.0 } else { 0.0 };
            assert_eq!(value(&target, "x"), expected, "cycle {cycle}");
            assert_eq!(tween.is_reversed(), cycle % 2 == 1);
        }

        assert_eq!(tween.repeat_remaining(), Repeat::Infinite);
        assert_eq!(*completed.lock().unwrap(), 0);
    }

    #[test]
    fn test_non_numeric_end_value_propagates_nan() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone()).to([("x", "abc")], Some(100.0));
        tween.start(0.0);

        tween.advance(50.0);
        assert!(value(&target, "x").is_nan());
    }

    #[test]
    fn test_numeric_text_end_value_is_coerced() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone()).to([("x", " 40 ")], Some(100.0));
        tween.start(0.0);

        tween.advance(50.0);
        assert_eq!(value(&target, "x"), 20.0);
    }

    #[test]
    fn test_start_capture_fallbacks() {
        let target = Properties::from_values([("a", "oops"), ("b", "3")]).into_shared();
        let mut tween = Tween::new(target.clone())
            .to([("a", 10.0), ("b", 10.0), ("c", 10.0), ("d", 10.0)], Some(100.0));

        // `c` disappears from the target after construction but was there before
        lock_properties(&target).set("c", 7.0);
        let mut tween2 = Tween::new(target.clone()).to([("c", 10.0)], Some(100.0));
        lock_properties(&target).remove("c");

        tween.start(0.0);
        tween2.start(0.0);

        assert_eq!(tween.start_values().get("a"), Some(0.0));
        assert_eq!(tween.start_values().get("b"), Some(3.0));
        assert_eq!(tween.start_values().get("c"), Some(0.0));
        assert_eq!(tween.start_values().get("d"), Some(0.0));
        assert_eq!(tween2.start_values().get("c"), Some(7.0));

        tween.advance(100.0);
        assert_eq!(value(&target, "d"), 10.0);
    }

    #[test]
    fn test_stop_is_noop_unless_playing() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (stopped, on_stop) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .on_stop(on_stop);

        assert!(!tween.stop());
        assert_eq!(*stopped.lock().unwrap(), 0);

        tween.start(0.0);
        tween.advance(40.0);
        assert!(tween.stop());
        assert_eq!(*stopped.lock().unwrap(), 1);
        assert_eq!(tween.phase(), TweenPhase::Stopped);

        // No snap-back, no further ticks
        assert_eq!(value(&target, "x"), 4.0);
        assert!(!tween.advance(80.0));
        assert_eq!(value(&target, "x"), 4.0);

        assert!(!tween.stop());
        assert_eq!(*stopped.lock().unwrap(), 1);
    }

    #[test]
    fn test_no_end_values_completes_immediately() {
        let target = Properties::new().with("x", 3.0).into_shared();
        let (completed, on_complete) = counter();

        let mut tween = Tween::new(target.clone()).on_complete(on_complete);
        tween.start(0.0);

        assert!(tween.advance(0.0));
        assert!(!tween.advance(1000.0));
        assert_eq!(*completed.lock().unwrap(), 1);
        assert_eq!(value(&target, "x"), 3.0);
    }

    #[test]
    fn test_restart_refires_on_start_and_recaptures() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let (started, on_start) = counter();

        let mut tween = Tween::new(target.clone())
            .to([("x", 10.0)], Some(100.0))
            .on_start(on_start);

        tween.start(0.0);
        tween.advance(50.0);
        tween.start(50.0);
        assert_eq!(tween.start_values().get("x"), Some(5.0));

        tween.advance(100.0);
        assert_eq!(value(&target, "x"), 7.5);
        assert_eq!(*started.lock().unwrap(), 2);
    }

    #[test]
    fn test_idle_tween_does_not_advance() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let mut tween = Tween::new(target.clone()).to([("x", 10.0)], None);

        assert_eq!(tween.phase(), TweenPhase::Idle);
        assert!(!tween.advance(10_000.0));
        assert_eq!(value(&target, "x"), 0.0);
    }

    #[test]
    fn test_duration_override_in_to() {
        let target = Properties::new().into_shared();
        let tween = Tween::new(target.clone()).to([("x", 1.0)], Some(250.0));
        assert_eq!(tween.duration_ms(), 250.0);

        let tween = Tween::new(target).duration(300.0).to([("x", 1.0)], None);
        assert_eq!(tween.duration_ms(), 300.0);
    }

    #[test]
    fn test_callbacks_see_written_values() {
        let target = Properties::new().with("x", 0.0).into_shared();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let mut tween = Tween::new(target)
            .to([("x", 4.0)], Some(4.0))
            .on_update(move |props| seen_clone.lock().unwrap().push(props.get("x").unwrap()));
        tween.start(0.0);

        for t in 1..=4 {
            tween.advance(t as f64);
        }
        assert_eq!(*seen.lock().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(TweenPhase::Delaying.to_string(), "delaying");
        assert_eq!(TweenPhase::Completed.to_string(), "completed");
        assert!(TweenPhase::Stopped.is_finished());
        assert!(!TweenPhase::Idle.is_playing());
    }
}
