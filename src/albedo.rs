//! Albedo (base colour) synthesizer.
//!
//! Each pixel blends the base colour toward a palette colour by the style's
//! pattern value, then gets a fine high-frequency speckle.  Blend weights are
//! unclamped and the speckle is offset by a fixed `-7`, so channels are only
//! clamped on the final byte write.

use crate::{
    color::{Rgb, clamp_channel, hex_to_rgb, lerp_color, parse_hex},
    generator::{Raster, TextureError, prepare, rasterize},
    noise::{noise2, normalize},
    params::{GenerationParameters, PatternStyle},
    pattern::{crack_detail, evaluate},
};

/// Amplitude of the speckle layer before scaling by colour variation.
const MICRO_AMPLITUDE: f64 = 15.0;

/// Subtracted from every channel to centre the speckle.
const MICRO_OFFSET: f64 = 7.0;

/// Base colour and parsed palette entries for one synthesis call.
struct Palette {
    base: Rgb,
    entries: Vec<Rgb>,
}

impl Palette {
    fn resolve(params: &GenerationParameters) -> Self {
        let malformed = std::iter::once(&params.base_color)
            .chain(&params.color_palette)
            .filter(|hex| parse_hex(hex).is_none())
            .count();
        if malformed > 0 {
            bevy::log::debug!("{malformed} malformed colour(s) in material, using neutral grey");
        }
        Self {
            base: hex_to_rgb(&params.base_color),
            entries: params.color_palette.iter().map(|c| hex_to_rgb(c)).collect(),
        }
    }

    fn entry(&self, i: usize) -> Option<Rgb> {
        self.entries.get(i).copied()
    }

    fn or_base(&self, i: usize) -> Rgb {
        self.entry(i).unwrap_or(self.base)
    }
}

/// Per-style colour before the speckle layer, channels unclamped.
fn style_color(
    style: PatternStyle,
    palette: &Palette,
    variation: f64,
    nx: f64,
    ny: f64,
) -> [f64; 3] {
    let base = palette.base;
    let sample = evaluate(style, nx, ny);
    match style {
        PatternStyle::Grain => lerp_color(
            palette.or_base(0),
            palette.or_base(1),
            sample.value * variation * 2.0,
        ),
        PatternStyle::Cracked => lerp_color(
            base,
            palette.or_base(1),
            sample.value * variation * 2.0 + crack_detail(nx, ny) * 0.1,
        ),
        PatternStyle::Weave => lerp_color(
            base,
            palette.or_base(1),
            sample.value * 0.3 + variation * 0.2,
        ),
        PatternStyle::Cellular => {
            let target = palette.entry(2).or(palette.entry(1)).unwrap_or(base);
            lerp_color(base, target, sample.value * variation * 2.0)
        }
        PatternStyle::Brushed
        | PatternStyle::Marble
        | PatternStyle::Noise
        | PatternStyle::Hammered => {
            lerp_color(base, palette.or_base(1), sample.value * variation * 2.0)
        }
    }
}

/// Synthesize the `size × size` albedo map for `params`.
pub fn generate_albedo_map(
    params: &GenerationParameters,
    size: u32,
) -> Result<Raster, TextureError> {
    let scale = prepare(params, size)?;
    let palette = Palette::resolve(params);
    let variation = params.color_variation;
    let style = params.pattern_style;

    Ok(rasterize(size, scale, |nx, ny| {
        let [r, g, b] = style_color(style, &palette, variation, nx, ny);
        let micro = normalize(noise2(nx * 20.0, ny * 20.0)) * MICRO_AMPLITUDE * variation;
        [
            clamp_channel(r + micro - MICRO_OFFSET),
            clamp_channel(g + micro - MICRO_OFFSET),
            clamp_channel(b + micro - MICRO_OFFSET),
            255,
        ]
    }))
}
