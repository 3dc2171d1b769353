//! Normal map synthesizer: height field → tangent-space normals.
//!
//! The style's height is sampled once per pixel into a single-precision
//! buffer, then central differences give the surface gradient at each
//! texel.  Neighbours past the border are replaced by the texel itself
//! (replicate-edge), so edge gradients are one-sided.  Encoding is
//!   R = X, G = Y, B = Z (always towards the viewer), A = 255
//! with each component mapped from `[-1, 1]` to `[0, 255]`.

use crate::{
    color::round_half_up,
    generator::{Raster, TextureError, coord, prepare},
    params::GenerationParameters,
    pattern::evaluate,
};

/// `bump_intensity` is multiplied by this to get the gradient scale.
const BUMP_SCALE: f64 = 3.0;

/// Per-pixel heights, row-major.  Only lives for one normal-map call.
struct HeightField {
    size: usize,
    heights: Vec<f32>,
}

impl HeightField {
    fn sample(params: &GenerationParameters, size: u32, scale: f64) -> Self {
        let style = params.pattern_style;
        let mut heights = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            let ny = coord(y, size, scale);
            for x in 0..size {
                let nx = coord(x, size, scale);
                heights.push(evaluate(style, nx, ny).height as f32);
            }
        }
        Self {
            size: size as usize,
            heights,
        }
    }

    #[inline]
    fn at(&self, x: usize, y: usize) -> f64 {
        self.heights[y * self.size + x] as f64
    }
}

/// Convert a height field into an RGBA8 normal map.
///
/// `strength` multiplies the raw neighbour differences; there is no division
/// by pixel spacing, so the same strength looks steeper at lower resolutions.
fn height_to_normal(field: &HeightField, strength: f64) -> Raster {
    let last = field.size - 1;
    Raster::from_fn(field.size as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let right = field.at((x + 1).min(last), y);
        let left = field.at(x.saturating_sub(1), y);
        let below = field.at(x, (y + 1).min(last));
        let above = field.at(x, y.saturating_sub(1));

        let dx = (right - left) * strength;
        let dy = (below - above) * strength;
        let len = (dx * dx + dy * dy + 1.0).sqrt();

        [
            encode_normal(dx / len),
            encode_normal(dy / len),
            encode_normal(1.0 / len),
            255,
        ]
    })
}

#[inline]
fn encode_normal(n: f64) -> u8 {
    round_half_up((n * 0.5 + 0.5) * 255.0).clamp(0.0, 255.0) as u8
}

/// Synthesize the `size × size` normal map for `params`.
pub fn generate_normal_map(
    params: &GenerationParameters,
    size: u32,
) -> Result<Raster, TextureError> {
    let scale = prepare(params, size)?;
    let field = HeightField::sample(params, size, scale);
    Ok(height_to_normal(&field, params.bump_intensity * BUMP_SCALE))
}
