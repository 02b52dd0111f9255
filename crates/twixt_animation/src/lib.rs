//! Twixt Animation System
//!
//! Time-based tweening of numeric properties.
//!
//! # Features
//!
//! - **Easing**: Named curves, cubic beziers, or any `Fn(f64) -> f64`
//! - **Tweens**: Delay, repeat, yoyo, and lifecycle callbacks
//! - **Scheduler**: One active set driven by `tick`, safe to mutate from callbacks
//!
//! # Example
//!
//! ```rust
//! use twixt_animation::{Easing, Tween, TweenScheduler};
//! use twixt_core::{lock_properties, Properties};
//!
//! let scheduler = TweenScheduler::new();
//! let target = Properties::new().with("x", 0.0).into_shared();
//!
//! scheduler.start_tween(
//!     Tween::new(target.clone())
//!         .to([("x", 100.0)], Some(1000.0))
//!         .easing(Easing::Linear),
//!     Some(0.0),
//! );
//!
//! scheduler.tick(Some(250.0));
//! assert_eq!(lock_properties(&target).get("x"), Some(25.0));
//! ```

pub mod easing;
pub mod scheduler;
pub mod tween;

pub use easing::{Easing, EasingFunction, ParseEasingError};
pub use scheduler::{
    global_scheduler, init_global_scheduler, is_scheduler_initialized, tick, AnimatedTween,
    SchedulerError, SchedulerHandle, TweenId, TweenScheduler,
};
pub use tween::{Repeat, Tween, TweenCallback, TweenPhase, DEFAULT_DURATION_MS};
