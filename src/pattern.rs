//! Per-style scalar fields shared by the albedo and normal maps.
//!
//! Each style yields a colour-blend weight and a bump height from one
//! evaluation, so the two maps always agree on where a feature lies.  The
//! roughness and metalness maps use their own, smaller perturbation tables
//! (see [`crate::roughness`] and [`crate::metalness`]).

use std::f64::consts::PI;

use crate::{
    noise::{fbm, normalize},
    params::PatternStyle,
};

/// `|fbm|` below this marks a crack in the cracked style.
pub const CRACK_THRESHOLD: f64 = 0.05;

/// Result of evaluating a style at one sample point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternSample {
    /// Colour-blend weight, nominally `[0, 1]`.
    pub value: f64,
    /// Height for bump generation, roughly `[-1, 1]`.
    pub height: f64,
}

/// Whether a fractal sample falls inside a crack.
#[inline]
pub fn is_crack(n: f64) -> bool {
    n.abs() < CRACK_THRESHOLD
}

/// Whether `(nx, ny)` lands on a raised cell of the weave checkerboard.
#[inline]
pub fn weave_on(nx: f64, ny: f64) -> bool {
    let wx = (nx * PI * 4.0).sin() * 0.5 + 0.5;
    let wy = (ny * PI * 4.0).sin() * 0.5 + 0.5;
    (wx > 0.5) != (wy > 0.5)
}

/// Evaluate `style` at scaled coordinates `(nx, ny)`.
///
/// [`PatternStyle::Hammered`] has no colour or height field of its own and
/// evaluates as [`PatternStyle::Noise`].
pub fn evaluate(style: PatternStyle, nx: f64, ny: f64) -> PatternSample {
    match style {
        PatternStyle::Brushed => {
            let n = fbm(nx * 0.5, ny * 8.0, 4, 0.6);
            PatternSample {
                value: (n + 1.0) * 0.5,
                height: n,
            }
        }
        PatternStyle::Grain => {
            let ring = normalize((nx * 6.0 + fbm(nx, ny, 5, 0.5) * 4.0).sin());
            PatternSample {
                value: ring,
                height: ring,
            }
        }
        PatternStyle::Cracked => {
            let n1 = fbm(nx * 2.0, ny * 2.0, 6, 0.5);
            PatternSample {
                value: if is_crack(n1) { 0.0 } else { (n1 + 1.0) * 0.5 },
                height: n1,
            }
        }
        PatternStyle::Weave => {
            let on = weave_on(nx, ny);
            PatternSample {
                value: if on { 1.0 } else { 0.0 },
                height: if on { 0.8 } else { 0.2 },
            }
        }
        PatternStyle::Cellular => {
            let cell = (fbm(nx * 1.5, ny * 1.5, 5, 0.55) * PI * 3.0).sin().abs();
            PatternSample {
                value: cell,
                height: cell,
            }
        }
        PatternStyle::Marble => {
            let marble = normalize((nx * 5.0 + fbm(nx, ny, 8, 0.5) * 10.0).sin());
            PatternSample {
                value: marble,
                height: marble,
            }
        }
        PatternStyle::Noise | PatternStyle::Hammered => {
            let n = fbm(nx, ny, 6, 0.5);
            PatternSample {
                value: (n + 1.0) * 0.5,
                height: n,
            }
        }
    }
}

/// High-frequency fBm layered over the cracked style's albedo.
#[inline]
pub fn crack_detail(nx: f64, ny: f64) -> f64 {
    fbm(nx * 4.0 + 100.0, ny * 4.0 + 100.0, 4, 0.6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> impl Iterator<Item = (f64, f64)> {
        (0..24).flat_map(|y| (0..24).map(move |x| (x as f64 * 0.13, y as f64 * 0.11)))
    }

    #[test]
    fn hammered_matches_noise() {
        for (nx, ny) in grid() {
            assert_eq!(
                evaluate(PatternStyle::Hammered, nx, ny),
                evaluate(PatternStyle::Noise, nx, ny)
            );
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        for style in PatternStyle::ALL {
            for (nx, ny) in grid() {
                let s = evaluate(*style, nx, ny);
                assert!(
                    (-1e-9..=1.0 + 1e-9).contains(&s.value),
                    "{style} value {} at ({nx}, {ny})",
                    s.value
                );
                assert!((-1.0001..=1.0001).contains(&s.height));
            }
        }
    }

    #[test]
    fn weave_is_binary() {
        for (nx, ny) in grid() {
            let s = evaluate(PatternStyle::Weave, nx, ny);
            assert!(
                (s.value == 1.0 && s.height == 0.8) || (s.value == 0.0 && s.height == 0.2),
                "{s:?}"
            );
        }
    }

    #[test]
    fn weave_alternates_between_quadrants() {
        // sin(π·4·x) is positive on (0, 0.25) and negative on (0.25, 0.5).
        assert!(!weave_on(0.1, 0.1));
        assert!(weave_on(0.35, 0.1));
        assert!(weave_on(0.1, 0.35));
        assert!(!weave_on(0.35, 0.35));
    }

    #[test]
    fn cracks_zero_the_blend_weight() {
        for (nx, ny) in grid() {
            let n1 = fbm(nx * 2.0, ny * 2.0, 6, 0.5);
            let s = evaluate(PatternStyle::Cracked, nx, ny);
            assert_eq!(s.height, n1);
            if is_crack(n1) {
                assert_eq!(s.value, 0.0);
            } else {
                assert!(s.value > 0.0);
            }
        }
        // The origin is a lattice point, so fbm is exactly zero there.
        assert_eq!(evaluate(PatternStyle::Cracked, 0.0, 0.0).value, 0.0);
    }
}
