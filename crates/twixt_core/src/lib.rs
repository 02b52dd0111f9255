//! Twixt Core
//!
//! Foundational types shared by the Twixt tweening crates:
//!
//! - **Properties**: the named numeric fields a tween writes into
//! - **Value coercion**: loose text/number inputs turned into `f64` once, up front
//! - **Clocks**: millisecond time sources used when a tick is not given an explicit time
//!
//! # Example
//!
//! ```rust
//! use twixt_core::{lock_properties, Properties};
//!
//! let target = Properties::new().with("x", 0.0).with("y", 10.0).into_shared();
//!
//! lock_properties(&target).set("x", 42.0);
//! assert_eq!(lock_properties(&target).get("x"), Some(42.0));
//! ```

pub mod clock;
pub mod error;
pub mod properties;
pub mod value;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use error::{CoreError, Result};
pub use properties::{lock_properties, Properties, SharedProperties};
pub use value::{parse_float, to_number, Value};
