//! Roughness synthesizer.
//!
//! Grayscale: `base_roughness + variation(style)` quantised to a byte and
//! written to R, G and B alike.

use crate::{
    color::round_half_up,
    generator::{Raster, TextureError, gray, prepare, rasterize},
    noise::fbm,
    params::{GenerationParameters, PatternStyle},
    pattern::{is_crack, weave_on},
};

/// Style-dependent offset added to the base roughness at `(nx, ny)`.
pub fn roughness_variation(style: PatternStyle, nx: f64, ny: f64) -> f64 {
    match style {
        PatternStyle::Brushed => fbm(nx * 0.5, ny * 8.0, 3, 0.5) * 0.15,
        PatternStyle::Grain => (nx * 6.0 + fbm(nx, ny, 4, 0.5) * 3.0).sin().abs() * 0.2,
        PatternStyle::Cracked => {
            if is_crack(fbm(nx * 2.0, ny * 2.0, 5, 0.5)) {
                -0.3
            } else {
                fbm(nx * 3.0, ny * 3.0, 3, 0.5) * 0.15
            }
        }
        PatternStyle::Weave => {
            if weave_on(nx, ny) {
                0.1
            } else {
                -0.05
            }
        }
        PatternStyle::Cellular
        | PatternStyle::Marble
        | PatternStyle::Noise
        | PatternStyle::Hammered => fbm(nx, ny, 4, 0.5) * 0.1,
    }
}

/// Quantise a `[0, 1]` material scalar to a grayscale byte, rounding half-up.
#[inline]
pub(crate) fn quantize(v: f64) -> u8 {
    round_half_up(v * 255.0).clamp(0.0, 255.0) as u8
}

/// Synthesize the `size × size` roughness map for `params`.
pub fn generate_roughness_map(
    params: &GenerationParameters,
    size: u32,
) -> Result<Raster, TextureError> {
    let scale = prepare(params, size)?;
    let style = params.pattern_style;
    let base = params.roughness;
    Ok(rasterize(size, scale, |nx, ny| {
        gray(quantize(base + roughness_variation(style, nx, ny)))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MaterialType;

    fn stats(raster: &Raster) -> (f64, f64) {
        let values: Vec<f64> = raster.pixels().map(|px| px[0] as f64).collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, variance)
    }

    #[test]
    fn is_grayscale_and_opaque() {
        for material in MaterialType::ALL {
            let p = GenerationParameters::for_material(*material);
            let rough = generate_roughness_map(&p, 32).unwrap();
            assert!(
                rough.pixels().all(|[r, g, b, a]| r == g && g == b && a == 255),
                "{} roughness is not grayscale",
                material.name()
            );
        }
    }

    #[test]
    fn brushed_corners_stay_near_base() {
        let p = GenerationParameters::for_material(MaterialType::Metal);
        let rough = generate_roughness_map(&p, 4).unwrap();
        let expected = round_half_up(0.2 * 255.0);
        assert_eq!(expected, 51.0);
        for (x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
            let v = rough.pixel(x, y)[0] as f64;
            assert!((v - expected).abs() <= 40.0, "corner ({x}, {y}) = {v}");
        }
        // The origin is a lattice point: no perturbation at all.
        assert_eq!(rough.pixel(0, 0)[0], 51);
    }

    #[test]
    fn out_of_range_base_saturates() {
        let p = GenerationParameters {
            roughness: 2.0,
            ..Default::default()
        };
        let rough = generate_roughness_map(&p, 8).unwrap();
        assert!(rough.pixels().all(|px| px[0] == 255));

        let p = GenerationParameters {
            roughness: -1.0,
            ..Default::default()
        };
        let rough = generate_roughness_map(&p, 8).unwrap();
        assert!(rough.pixels().all(|px| px[0] == 0));
    }

    #[test]
    fn weave_has_two_levels() {
        let p = GenerationParameters::for_material(MaterialType::Fabric);
        let rough = generate_roughness_map(&p, 32).unwrap();
        let mut levels: Vec<u8> = rough.pixels().map(|px| px[0]).collect();
        levels.sort_unstable();
        levels.dedup();
        // Raised cells saturate (0.95 + 0.1); the rest sit just below 0.9.
        assert_eq!(levels, vec![quantize(0.95 - 0.05), 255]);
    }

    #[test]
    fn cracks_are_smoother() {
        assert_eq!(roughness_variation(PatternStyle::Cracked, 0.0, 0.0), -0.3);
    }

    #[test]
    fn statistics_are_resolution_independent() {
        let p = GenerationParameters::for_material(MaterialType::Metal);
        let (mean_lo, var_lo) = stats(&generate_roughness_map(&p, 256).unwrap());
        let (mean_hi, var_hi) = stats(&generate_roughness_map(&p, 512).unwrap());
        assert!(
            (mean_lo - mean_hi).abs() <= 0.05 * mean_hi,
            "mean {mean_lo} vs {mean_hi}"
        );
        assert!(
            (var_lo - var_hi).abs() <= 0.05 * var_hi,
            "variance {var_lo} vs {var_hi}"
        );
    }
}
