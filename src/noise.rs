//! Classic 3-D gradient noise and its fractal (fBm) accumulation.
//!
//! Every pattern in the crate is built from two primitives:
//!
//! * [`noise3`] — Perlin's "improved" gradient noise over a fixed 256-entry
//!   permutation table, output in `[-1, 1]`.
//! * [`fbm`] — a sum of `octaves` noise layers, each at twice the frequency and
//!   `persistence` times the amplitude of the previous one, normalised by the
//!   total amplitude so the result stays on the same `[-1, 1]` scale.
//!
//! The permutation table is a `static` built at compile time and never
//! written, so concurrent readers need no synchronisation and every call in
//! every process sees the same lattice.
//!
//! [`GradientNoise`] and [`FbmField`] expose the same fields through
//! [`noise::NoiseFn`], which lets callers feed them into the `noise` crate's
//! combinators (`ScaleBias`, `Abs`, `Turbulence`, …).

use noise::NoiseFn;

/// Ken Perlin's reference permutation.
const PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// The permutation repeated twice so `TABLE[i + 1]` never needs a wrap check.
static TABLE: [u8; 512] = duplicate(PERMUTATION);

const fn duplicate(perm: [u8; 256]) -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 256 {
        table[i] = perm[i];
        table[256 + i] = perm[i];
        i += 1;
    }
    table
}

#[inline]
fn p(i: usize) -> usize {
    TABLE[i] as usize
}

/// Quintic smootherstep `6t⁵ - 15t⁴ + 10t³`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of 12 edge gradients (16 entries, four repeated),
/// selected by the low four bits of `hash`.
#[inline]
fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Lattice cell index (`floor(c) mod 256`) and fractional offset of `c`.
#[inline]
fn cell(c: f64) -> (usize, f64) {
    let floor = c.floor();
    ((floor as i64 & 255) as usize, c - floor)
}

/// Sample gradient noise at `(x, y, z)`.  Output lies in `[-1, 1]`; integer
/// lattice points always return exactly `0`.
pub fn noise3(x: f64, y: f64, z: f64) -> f64 {
    let (xi, x) = cell(x);
    let (yi, y) = cell(y);
    let (zi, z) = cell(z);

    let u = fade(x);
    let v = fade(y);
    let w = fade(z);

    let a = p(xi) + yi;
    let aa = p(a) + zi;
    let ab = p(a + 1) + zi;
    let b = p(xi + 1) + yi;
    let ba = p(b) + zi;
    let bb = p(b + 1) + zi;

    lerp(
        w,
        lerp(
            v,
            lerp(u, grad(p(aa), x, y, z), grad(p(ba), x - 1.0, y, z)),
            lerp(
                u,
                grad(p(ab), x, y - 1.0, z),
                grad(p(bb), x - 1.0, y - 1.0, z),
            ),
        ),
        lerp(
            v,
            lerp(
                u,
                grad(p(aa + 1), x, y, z - 1.0),
                grad(p(ba + 1), x - 1.0, y, z - 1.0),
            ),
            lerp(
                u,
                grad(p(ab + 1), x, y - 1.0, z - 1.0),
                grad(p(bb + 1), x - 1.0, y - 1.0, z - 1.0),
            ),
        ),
    )
}

/// 2-D slice of [`noise3`] at `z = 0`.
#[inline]
pub fn noise2(x: f64, y: f64) -> f64 {
    noise3(x, y, 0.0)
}

/// Fractal Brownian motion over the `z = 0` slice of [`noise3`].
///
/// `octaves` must be at least 1 and `persistence` positive; the sum is divided
/// by the accumulated amplitude, so a single octave reproduces [`noise2`]
/// exactly.
pub fn fbm(x: f64, y: f64, octaves: u32, persistence: f64) -> f64 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        value += noise2(x * frequency, y * frequency) * amplitude;
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }

    value / max_value
}

/// Map a raw noise sample from `[-1, 1]` to `[0, 1]`.
#[inline]
pub fn normalize(v: f64) -> f64 {
    v * 0.5 + 0.5
}

/// The fixed-table gradient noise field as a [`NoiseFn`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GradientNoise;

impl NoiseFn<f64, 3> for GradientNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        noise3(point[0], point[1], point[2])
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        noise2(point[0], point[1])
    }
}

/// An [`fbm`] field with fixed octave count and persistence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FbmField {
    pub octaves: u32,
    pub persistence: f64,
}

impl FbmField {
    pub const fn new(octaves: u32, persistence: f64) -> Self {
        Self {
            octaves,
            persistence,
        }
    }
}

impl NoiseFn<f64, 2> for FbmField {
    fn get(&self, point: [f64; 2]) -> f64 {
        fbm(point[0], point[1], self.octaves, self.persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noise::{Abs, NoiseFn, ScaleBias};
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn table_is_duplicated() {
        for i in 0..256 {
            assert_eq!(TABLE[i], TABLE[i + 256]);
            assert_eq!(TABLE[i], PERMUTATION[i]);
        }
    }

    #[test]
    fn lattice_points_are_zero() {
        for (x, y, z) in [(0.0, 0.0, 0.0), (1.0, 2.0, 3.0), (-4.0, 17.0, 255.0)] {
            assert_eq!(noise3(x, y, z), 0.0, "non-zero at lattice ({x}, {y}, {z})");
        }
    }

    /// Reference value published with Perlin's improved-noise implementation.
    #[test]
    #[allow(clippy::approx_constant)]
    fn matches_reference_sample() {
        let n = noise3(3.14, 42.0, 7.0);
        assert!((n - 0.136_919_958_784).abs() < 1e-9, "got {n}");
    }

    #[test]
    fn stays_within_unit_range() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            let x = rng.random_range(-300.0..300.0);
            let y = rng.random_range(-300.0..300.0);
            let z = rng.random_range(-300.0..300.0);
            let n = noise3(x, y, z);
            assert!(
                (-1.0001..=1.0001).contains(&n),
                "noise3({x}, {y}, {z}) = {n} escaped [-1, 1]"
            );
        }
    }

    #[test]
    fn is_deterministic() {
        let a: Vec<f64> = (0..64).map(|i| noise3(i as f64 * 0.37, 1.5, -2.25)).collect();
        let b: Vec<f64> = (0..64).map(|i| noise3(i as f64 * 0.37, 1.5, -2.25)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn single_octave_fbm_is_plain_noise() {
        for (x, y) in [(0.3, 0.7), (12.5, -3.25), (100.1, 0.05)] {
            for persistence in [0.3, 0.5, 0.9] {
                assert_eq!(fbm(x, y, 1, persistence), noise2(x, y));
            }
        }
    }

    #[test]
    fn fbm_stays_normalised() {
        for i in 0..2_000 {
            let x = i as f64 * 0.173;
            let y = i as f64 * 0.091 - 40.0;
            let v = fbm(x, y, 8, 0.6);
            assert!((-1.0001..=1.0001).contains(&v), "fbm({x}, {y}) = {v}");
        }
    }

    #[test]
    fn composes_with_noise_combinators() {
        let abs: Abs<f64, _, 3> = Abs::new(GradientNoise);
        let scaled: ScaleBias<f64, _, 2> = ScaleBias::new(FbmField::new(4, 0.5))
            .set_scale(0.5)
            .set_bias(0.5);
        for (x, y) in [(0.4, 0.9), (7.3, 2.2)] {
            assert_eq!(abs.get([x, y, 0.5]), noise3(x, y, 0.5).abs());
            let expected = normalize(fbm(x, y, 4, 0.5));
            assert!((scaled.get([x, y]) - expected).abs() < 1e-12);
        }
    }
}
