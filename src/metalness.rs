//! Metalness synthesizer.
//!
//! Same shape as the roughness map but with a smaller perturbation table;
//! only brushed, hammered and cracked get dedicated treatment.

use crate::{
    generator::{Raster, TextureError, gray, prepare, rasterize},
    noise::{fbm, noise2, normalize},
    params::{GenerationParameters, PatternStyle},
    pattern::is_crack,
    roughness::quantize,
};

/// Style-dependent offset added to the base metalness at `(nx, ny)`.
pub fn metalness_variation(style: PatternStyle, nx: f64, ny: f64) -> f64 {
    match style {
        PatternStyle::Brushed => fbm(nx * 0.3, ny * 5.0, 3, 0.5) * 0.1,
        PatternStyle::Hammered => normalize(noise2(nx * 4.0, ny * 4.0)) * 0.15,
        PatternStyle::Cracked => {
            if is_crack(fbm(nx * 2.0, ny * 2.0, 5, 0.5)) {
                -0.4
            } else {
                0.0
            }
        }
        _ => fbm(nx * 2.0, ny * 2.0, 3, 0.5) * 0.05,
    }
}

/// Synthesize the `size × size` metalness map for `params`.
pub fn generate_metalness_map(
    params: &GenerationParameters,
    size: u32,
) -> Result<Raster, TextureError> {
    let scale = prepare(params, size)?;
    let style = params.pattern_style;
    let base = params.metalness;
    Ok(rasterize(size, scale, |nx, ny| {
        gray(quantize(base + metalness_variation(style, nx, ny)))
    }))
}
