//! Material parameters: the single input every synthesizer consumes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generator::TextureError;

/// Edge length used for exported maps.
pub const DEFAULT_EXPORT_SIZE: u32 = 512;

/// Edge length used for the live preview.
pub const PREVIEW_SIZE: u32 = 256;

/// Procedural pattern family driving all four maps.
///
/// Parsing is total: any string that is not a known style name becomes
/// [`PatternStyle::Noise`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PatternStyle {
    /// Anisotropic streaks, long along X.
    Brushed,
    /// Wood-like rings.
    Grain,
    /// Fractal field broken by thin zero-crossing cracks.
    Cracked,
    /// Checkerboard of over/under threads.
    Weave,
    /// Banded cells from a folded fBm.
    Cellular,
    /// Sinusoidal veins warped by fBm.
    Marble,
    /// Plain fBm.
    #[default]
    Noise,
    /// Dimpled metal.  Only the metalness map reacts to it; elsewhere it
    /// renders as [`PatternStyle::Noise`].
    Hammered,
}

impl PatternStyle {
    pub const ALL: &'static [PatternStyle] = &[
        PatternStyle::Brushed,
        PatternStyle::Grain,
        PatternStyle::Cracked,
        PatternStyle::Weave,
        PatternStyle::Cellular,
        PatternStyle::Marble,
        PatternStyle::Noise,
        PatternStyle::Hammered,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternStyle::Brushed => "brushed",
            PatternStyle::Grain => "grain",
            PatternStyle::Cracked => "cracked",
            PatternStyle::Weave => "weave",
            PatternStyle::Cellular => "cellular",
            PatternStyle::Marble => "marble",
            PatternStyle::Noise => "noise",
            PatternStyle::Hammered => "hammered",
        }
    }

    /// Look up a style by name, falling back to [`PatternStyle::Noise`].
    pub fn parse(name: &str) -> Self {
        match Self::ALL.iter().find(|style| style.name() == name) {
            Some(style) => *style,
            None => {
                bevy::log::debug!("unknown pattern style {name:?}, rendering as noise");
                PatternStyle::Noise
            }
        }
    }
}

impl fmt::Display for PatternStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for PatternStyle {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&str> for PatternStyle {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<PatternStyle> for String {
    fn from(style: PatternStyle) -> Self {
        style.name().to_owned()
    }
}

/// Everything needed to synthesize one material.
///
/// Colours are sRGB hex strings; malformed ones render as neutral grey.
/// Numeric fields are not range-clamped: values outside `[0, 1]` simply
/// extrapolate.  See [`GenerationParameters::validate`] for what is rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParameters {
    pub base_color: String,
    pub roughness: f64,
    pub metalness: f64,
    pub bump_intensity: f64,
    /// Multiplied with `tiling_scale` to get the sampling frequency.
    pub pattern_scale: f64,
    pub color_variation: f64,
    pub pattern_style: PatternStyle,
    /// Index 0 is the dominant colour, 1 the primary variation, 2 the
    /// secondary variation.  Missing entries fall back to `base_color`.
    pub color_palette: Vec<String>,
    pub tiling_scale: f64,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self::for_material(MaterialType::Metal)
    }
}

impl GenerationParameters {
    /// Canonical parameters for a material family.
    pub fn for_material(material: MaterialType) -> Self {
        let (base, palette, style, roughness, metalness, bump, scale, variation) = match material {
            MaterialType::Metal => (
                "#8a8a8a",
                ["#8a8a8a", "#b0b0b0", "#606060"],
                PatternStyle::Brushed,
                0.2,
                0.95,
                0.3,
                1.0,
                0.1,
            ),
            MaterialType::Wood => (
                "#8B5E3C",
                ["#8B5E3C", "#6B4226", "#A0714F"],
                PatternStyle::Grain,
                0.75,
                0.0,
                0.6,
                2.0,
                0.4,
            ),
            MaterialType::Stone => (
                "#7a7a72",
                ["#7a7a72", "#5a5a52", "#9a9a92"],
                PatternStyle::Cracked,
                0.85,
                0.0,
                0.8,
                1.5,
                0.3,
            ),
            MaterialType::Fabric => (
                "#4a6fa5",
                ["#4a6fa5", "#2a4f85", "#6a8fc5"],
                PatternStyle::Weave,
                0.95,
                0.0,
                0.4,
                3.0,
                0.2,
            ),
            MaterialType::Plastic => (
                "#e03030",
                ["#e03030", "#c02020", "#ff5050"],
                // Rendered as plain noise.
                PatternStyle::Noise,
                0.3,
                0.0,
                0.1,
                1.0,
                0.05,
            ),
            MaterialType::Organic => (
                "#4a7a3a",
                ["#4a7a3a", "#2a5a1a", "#6a9a5a"],
                PatternStyle::Cellular,
                0.7,
                0.0,
                0.7,
                2.5,
                0.5,
            ),
            MaterialType::Ceramic => (
                "#e8e0d0",
                ["#e8e0d0", "#d0c8b8", "#f0e8d8"],
                // Rendered as plain noise.
                PatternStyle::Noise,
                0.15,
                0.05,
                0.2,
                1.0,
                0.08,
            ),
            MaterialType::Concrete => (
                "#888880",
                ["#888880", "#686860", "#a8a8a0"],
                PatternStyle::Noise,
                0.9,
                0.0,
                0.9,
                1.8,
                0.25,
            ),
        };
        Self {
            base_color: base.to_owned(),
            roughness,
            metalness,
            bump_intensity: bump,
            pattern_scale: scale,
            color_variation: variation,
            pattern_style: style,
            color_palette: palette.iter().map(|c| (*c).to_owned()).collect(),
            tiling_scale: 1.0,
        }
    }

    /// Effective sampling frequency, `pattern_scale * tiling_scale`.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.pattern_scale * self.tiling_scale
    }

    /// Reject parameters that would make a synthesis pass meaningless:
    /// non-finite numbers anywhere, or a non-positive scale.  The combined
    /// [`scale`](Self::scale) must be finite and positive too; a failure there
    /// is reported against `tilingScale` with the product as the value.
    pub fn validate(&self) -> Result<(), TextureError> {
        let finite = [
            ("roughness", self.roughness),
            ("metalness", self.metalness),
            ("bumpIntensity", self.bump_intensity),
            ("colorVariation", self.color_variation),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(TextureError::InvalidParameter { field, value });
            }
        }
        for (field, value) in [
            ("patternScale", self.pattern_scale),
            ("tilingScale", self.tiling_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TextureError::InvalidParameter { field, value });
            }
        }
        // Each factor can be fine while the product overflows or underflows.
        let scale = self.scale();
        if !scale.is_finite() || scale <= 0.0 {
            return Err(TextureError::InvalidParameter {
                field: "tilingScale",
                value: scale,
            });
        }
        Ok(())
    }

    /// The subset of these parameters the preset store keeps.
    pub fn to_preset(&self) -> PresetParameters {
        PresetParameters {
            roughness: self.roughness,
            metalness: self.metalness,
            pattern_style: self.pattern_style,
            color_palette: self.color_palette.clone(),
            tiling_scale: self.tiling_scale,
        }
    }

    /// Rebuild full parameters from a stored preset.
    ///
    /// Fields the store does not keep come from `material`'s defaults; the
    /// base colour is the preset's dominant palette entry when there is one.
    pub fn from_preset(material: MaterialType, preset: &PresetParameters) -> Self {
        let defaults = Self::for_material(material);
        Self {
            base_color: preset
                .color_palette
                .first()
                .cloned()
                .unwrap_or(defaults.base_color),
            roughness: preset.roughness,
            metalness: preset.metalness,
            pattern_style: preset.pattern_style,
            color_palette: preset.color_palette.clone(),
            tiling_scale: preset.tiling_scale,
            ..defaults
        }
    }
}

/// Parameters as persisted by the preset store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetParameters {
    pub roughness: f64,
    pub metalness: f64,
    pub pattern_style: PatternStyle,
    pub color_palette: Vec<String>,
    pub tiling_scale: f64,
}

/// Material family a preset belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Metal,
    Wood,
    Stone,
    Fabric,
    Plastic,
    Organic,
    Ceramic,
    Concrete,
}

impl MaterialType {
    pub const ALL: &'static [MaterialType] = &[
        MaterialType::Metal,
        MaterialType::Wood,
        MaterialType::Stone,
        MaterialType::Fabric,
        MaterialType::Plastic,
        MaterialType::Organic,
        MaterialType::Ceramic,
        MaterialType::Concrete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MaterialType::Metal => "metal",
            MaterialType::Wood => "wood",
            MaterialType::Stone => "stone",
            MaterialType::Fabric => "fabric",
            MaterialType::Plastic => "plastic",
            MaterialType::Organic => "organic",
            MaterialType::Ceramic => "ceramic",
            MaterialType::Concrete => "concrete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_brushed_metal() {
        let p = GenerationParameters::default();
        assert_eq!(p.pattern_style, PatternStyle::Brushed);
        assert_eq!(p.base_color, "#8a8a8a");
        assert_eq!(p.color_palette, ["#8a8a8a", "#b0b0b0", "#606060"]);
        assert_eq!(p.roughness, 0.2);
        assert_eq!(p.metalness, 0.95);
        assert_eq!(p.scale(), 1.0);
    }

    #[test]
    fn unknown_style_names_become_noise() {
        assert_eq!(PatternStyle::parse("xyz"), PatternStyle::Noise);
        assert_eq!(PatternStyle::parse("smooth"), PatternStyle::Noise);
        assert_eq!(PatternStyle::parse("Brushed"), PatternStyle::Noise);
        for style in PatternStyle::ALL {
            assert_eq!(PatternStyle::parse(style.name()), *style);
        }
    }

    #[test]
    fn json_uses_camel_case_and_style_names() {
        let json = serde_json::to_value(GenerationParameters::default()).unwrap();
        assert_eq!(json["baseColor"], "#8a8a8a");
        assert_eq!(json["bumpIntensity"], 0.3);
        assert_eq!(json["patternStyle"], "brushed");
        assert_eq!(json["tilingScale"], 1.0);
    }

    #[test]
    fn deserialises_unknown_style_as_noise() {
        let json = r##"{
            "baseColor": "#e03030",
            "roughness": 0.3,
            "metalness": 0.0,
            "bumpIntensity": 0.1,
            "patternScale": 1.0,
            "colorVariation": 0.05,
            "patternStyle": "smooth",
            "colorPalette": ["#e03030", "#c02020", "#ff5050"],
            "tilingScale": 1.0
        }"##;
        let p: GenerationParameters = serde_json::from_str(json).unwrap();
        assert_eq!(p.pattern_style, PatternStyle::Noise);
        assert_eq!(p, GenerationParameters::for_material(MaterialType::Plastic));
    }

    #[test]
    fn validation_rejects_bad_numbers() {
        let mut p = GenerationParameters::default();
        assert!(p.validate().is_ok());

        p.roughness = f64::NAN;
        assert!(matches!(
            p.validate(),
            Err(TextureError::InvalidParameter { field: "roughness", .. })
        ));

        let mut p = GenerationParameters::default();
        p.tiling_scale = -1.0;
        assert!(matches!(
            p.validate(),
            Err(TextureError::InvalidParameter { field: "tilingScale", .. })
        ));

        let mut p = GenerationParameters::default();
        p.pattern_scale = f64::INFINITY;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validation_rejects_overflowing_scale_product() {
        let p = GenerationParameters {
            pattern_scale: 1e200,
            tiling_scale: 1e200,
            ..Default::default()
        };
        assert!(p.scale().is_infinite());
        assert!(matches!(
            p.validate(),
            Err(TextureError::InvalidParameter { field: "tilingScale", value }) if value.is_infinite()
        ));
        assert!(crate::roughness::generate_roughness_map(&p, 4).is_err());

        let p = GenerationParameters {
            pattern_scale: 1e-200,
            tiling_scale: 1e-200,
            ..Default::default()
        };
        assert_eq!(p.scale(), 0.0);
        assert!(p.validate().is_err());
    }

    #[test]
    fn builtin_presets_use_known_styles() {
        assert_eq!(
            GenerationParameters::for_material(MaterialType::Plastic).pattern_style,
            PatternStyle::Noise
        );
        assert_eq!(
            GenerationParameters::for_material(MaterialType::Ceramic).pattern_style,
            PatternStyle::Noise
        );
        for material in MaterialType::ALL {
            assert!(GenerationParameters::for_material(*material).validate().is_ok());
        }
    }

    #[test]
    fn out_of_range_values_are_accepted() {
        let p = GenerationParameters {
            roughness: 1.7,
            metalness: -0.5,
            color_variation: 3.0,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn preset_round_trip_keeps_stored_fields() {
        let mut wood = GenerationParameters::for_material(MaterialType::Wood);
        wood.roughness = 0.5;
        wood.tiling_scale = 2.0;
        wood.color_palette = vec!["#112233".into(), "#445566".into()];

        let restored = GenerationParameters::from_preset(MaterialType::Wood, &wood.to_preset());
        assert_eq!(restored.roughness, 0.5);
        assert_eq!(restored.tiling_scale, 2.0);
        assert_eq!(restored.base_color, "#112233");
        assert_eq!(restored.pattern_style, PatternStyle::Grain);
        // Not stored: comes from the wood defaults.
        assert_eq!(restored.bump_intensity, 0.6);
        assert_eq!(restored.pattern_scale, 2.0);
    }

    #[test]
    fn preset_with_empty_palette_keeps_default_base() {
        let preset = PresetParameters {
            roughness: 0.4,
            metalness: 0.0,
            pattern_style: PatternStyle::Weave,
            color_palette: Vec::new(),
            tiling_scale: 1.0,
        };
        let p = GenerationParameters::from_preset(MaterialType::Fabric, &preset);
        assert_eq!(p.base_color, "#4a6fa5");
    }
}
