//! `bevy_symbios_pbr` — deterministic procedural PBR material maps for Bevy.
//!
//! # Architecture
//! A [`GenerationParameters`] value fully describes one material.  Four
//! independent synthesizers turn it into square RGBA8 [`Raster`]s:
//! [`generate_albedo_map`], [`generate_normal_map`],
//! [`generate_roughness_map`] and [`generate_metalness_map`].  Each is a pure
//! function of its inputs, built on a fixed-table gradient noise
//! ([`crate::noise::noise3`]) and its fractal sum ([`crate::noise::fbm`]).
//!
//! [`MaterialGenerator`] produces all four at once; [`map_to_images`]
//! uploads them into [`bevy::asset::Assets<Image>`] with repeat samplers, and
//! [`async_gen::PendingMaterial`] does both off the main thread.

pub mod albedo;
pub mod async_gen;
pub mod color;
pub mod generator;
pub mod metalness;
pub mod noise;
pub mod normal;
pub mod params;
pub mod pattern;
pub mod roughness;

pub use albedo::generate_albedo_map;
pub use generator::{
    MapKind, MaterialGenerator, PbrHandles, Raster, TextureError, TextureGenerator, TextureMap,
    generate_map, map_to_images,
};
pub use metalness::generate_metalness_map;
pub use normal::generate_normal_map;
pub use params::{
    DEFAULT_EXPORT_SIZE, GenerationParameters, MaterialType, PREVIEW_SIZE, PatternStyle,
    PresetParameters,
};
pub use roughness::generate_roughness_map;

use bevy::prelude::*;

/// Bevy plugin — registers the async-generation polling system.
pub struct SymbiosPbrPlugin;

impl Plugin for SymbiosPbrPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, async_gen::poll_material_tasks);
    }
}
