//! Easing functions for tweens

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maps linear progress to shaped progress.
///
/// Input is clamped to `[0, 1]` before the call. Implementations must be pure
/// and should map `0` to `0` and `1` to `1`. Output may leave `[0, 1]` in
/// between (elastic or back-style overshoot).
///
/// Implemented for [`Easing`] and for any `Fn(f64) -> f64` closure, so a custom
/// curve is just a function:
///
/// ```rust
/// use twixt_animation::EasingFunction;
///
/// let smoothstep = |t: f64| t * t * (3.0 - 2.0 * t);
/// assert_eq!(smoothstep.evaluate(1.0), 1.0);
/// ```
pub trait EasingFunction: Send + Sync {
    fn evaluate(&self, t: f64) -> f64;
}

impl<F> EasingFunction for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn evaluate(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    ExponentialInOut,
    ElasticInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    /// Every curve that has a name, in catalogue order
    pub fn named() -> &'static [Easing] {
        &[
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
            Easing::EaseInQuart,
            Easing::EaseOutQuart,
            Easing::EaseInOutQuart,
            Easing::ExponentialInOut,
            Easing::ElasticInOut,
            Easing::BounceIn,
            Easing::BounceOut,
            Easing::BounceInOut,
        ]
    }

    /// Kebab-case name, `None` for parameterised curves
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::EaseInQuad => "ease-in-quad",
            Easing::EaseOutQuad => "ease-out-quad",
            Easing::EaseInOutQuad => "ease-in-out-quad",
            Easing::EaseInCubic => "ease-in-cubic",
            Easing::EaseOutCubic => "ease-out-cubic",
            Easing::EaseInOutCubic => "ease-in-out-cubic",
            Easing::EaseInQuart => "ease-in-quart",
            Easing::EaseOutQuart => "ease-out-quart",
            Easing::EaseInOutQuart => "ease-in-out-quart",
            Easing::ExponentialInOut => "exponential-in-out",
            Easing::ElasticInOut => "elastic-in-out",
            Easing::BounceIn => "bounce-in",
            Easing::BounceOut => "bounce-out",
            Easing::BounceInOut => "bounce-in-out",
            Easing::CubicBezier(..) => return None,
        };
        Some(name)
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::ExponentialInOut => exponential_in_out(t),
            Easing::ElasticInOut => elastic_in_out(t),
            Easing::BounceIn => bounce_in(t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    bounce_in(t * 2.0) * 0.5
                } else {
                    bounce_out(t * 2.0 - 1.0) * 0.5 + 0.5
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }
}

impl EasingFunction for Easing {
    fn evaluate(&self, t: f64) -> f64 {
        self.apply(t)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            named => f.write_str(named.name().unwrap_or_default()),
        }
    }
}

/// Error returned when an easing name is not recognised
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown easing '{0}'")]
pub struct ParseEasingError(pub String);

impl FromStr for Easing {
    type Err = ParseEasingError;

    /// Parses a kebab-case name or `cubic-bezier(x1, y1, x2, y2)`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(easing) = Easing::named()
            .iter()
            .find(|e| e.name() == Some(trimmed))
        {
            return Ok(*easing);
        }

        parse_cubic_bezier(trimmed).ok_or_else(|| ParseEasingError(s.to_string()))
    }
}

fn parse_cubic_bezier(s: &str) -> Option<Easing> {
    let args = s.strip_prefix("cubic-bezier(")?.strip_suffix(')')?;
    let points: Vec<f64> = args
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match points[..] {
        [x1, y1, x2, y2] => Some(Easing::CubicBezier(x1, y1, x2, y2)),
        _ => None,
    }
}

fn exponential_in_out(t: f64) -> f64 {
    if t == 0.0 {
        return 0.0;
    }
    if t == 1.0 {
        return 1.0;
    }

    let k = t * 2.0;
    if k < 1.0 {
        0.5 * 1024f64.powf(k - 1.0)
    } else {
        0.5 * (2.0 - 2f64.powf(-10.0 * (k - 1.0)))
    }
}

/// Elastic in-out with period 0.4. Amplitude below 1 would leave the curve
/// short of its endpoints, so it is raised to 1, which fixes the phase shift
/// at a quarter period.
fn elastic_in_out(t: f64) -> f64 {
    const PERIOD: f64 = 0.4;
    const AMPLITUDE: f64 = 1.0;
    const SHIFT: f64 = PERIOD / 4.0;

    if t == 0.0 {
        return 0.0;
    }
    if t == 1.0 {
        return 1.0;
    }

    let k = t * 2.0 - 1.0;
    let wave = ((k - SHIFT) * (2.0 * PI) / PERIOD).sin();
    if k < 0.0 {
        -0.5 * AMPLITUDE * 2f64.powf(10.0 * k) * wave
    } else {
        AMPLITUDE * 2f64.powf(-10.0 * k) * wave * 0.5 + 1.0
    }
}

fn bounce_out(t: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;

    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let k = t - 1.5 / D;
        N * k * k + 0.75
    } else if t < 2.5 / D {
        let k = t - 2.25 / D;
        N * k * k + 0.9375
    } else {
        let k = t - 2.625 / D;
        N * k * k + 0.984375
    }
}

fn bounce_in(t: f64) -> f64 {
    1.0 - bounce_out(1.0 - t)
}

/// Cubic bezier easing, as CSS `cubic-bezier()` timing functions evaluate it.
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    // Solve for parameter `p` where bezier_x(p) == t
    let mut p = t;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = t;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - t).abs() < 1e-7 {
            break;
        }
        if val < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_named_curves_hit_endpoints() {
        for easing in Easing::named() {
            assert!(approx(easing.apply(0.0), 0.0), "{easing} at 0");
            assert!(approx(easing.apply(1.0), 1.0), "{easing} at 1");
        }
    }

    #[test]
    fn test_linear_is_identity() {
        for t in [0.0, 0.1, 0.5, 0.77, 1.0] {
            assert_eq!(Easing::Linear.evaluate(t), t);
        }
        assert_eq!(Easing::default(), Easing::Linear);
    }

    #[test]
    fn test_in_out_curves_are_symmetric_at_midpoint() {
        for easing in [
            Easing::EaseInOutQuad,
            Easing::EaseInOutCubic,
            Easing::ExponentialInOut,
            Easing::ElasticInOut,
            Easing::BounceInOut,
        ] {
            assert!(approx(easing.apply(0.5), 0.5), "{easing} at 0.5");
        }
    }

    #[test]
    fn test_elastic_overshoots() {
        let max = (1..100)
            .map(|i| Easing::ElasticInOut.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(max > 1.0);
    }

    #[test]
    fn test_bounce_stays_in_range() {
        for i in 0..=100 {
            let t = i as f64 / 100.0;
            let v = Easing::BounceOut.apply(t);
            assert!((-1e-9..=1.0 + 1e-9).contains(&v), "bounce-out({t}) = {v}");
        }
    }

    #[test]
    fn test_cubic_bezier_linear_control_points() {
        let easing = Easing::CubicBezier(0.25, 0.25, 0.75, 0.75);
        for t in [0.1, 0.3, 0.5, 0.9] {
            assert!((easing.apply(t) - t).abs() < 1e-5);
        }
    }

    #[test]
    fn test_closure_implements_contract() {
        let half = |t: f64| t * 0.5;
        assert_eq!(half.evaluate(1.0), 0.5);

        let boxed: Box<dyn EasingFunction> = Box::new(Easing::EaseInQuad);
        assert_eq!(boxed.evaluate(0.5), 0.25);
    }

    #[test]
    fn test_parse_names_roundtrip() {
        for easing in Easing::named() {
            let parsed: Easing = easing.to_string().parse().unwrap();
            assert_eq!(parsed, *easing);
        }
    }

    #[test]
    fn test_parse_cubic_bezier() {
        let easing: Easing = "cubic-bezier(0.4, 0, 0.2, 1)".parse().unwrap();
        assert_eq!(easing, Easing::CubicBezier(0.4, 0.0, 0.2, 1.0));
        assert_eq!(easing.to_string().parse::<Easing>().unwrap(), easing);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "wobble".parse::<Easing>(),
            Err(ParseEasingError("wobble".into()))
        );
        assert!("cubic-bezier(1, 2, 3)".parse::<Easing>().is_err());
    }
}
