//! Core trait and data types shared by the four map synthesizers.

use std::sync::OnceLock;

use bevy::{
    asset::{Assets, RenderAssetUsages},
    image::{Image, ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor},
    pbr::StandardMaterial,
    prelude::Handle,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat},
};

use crate::{
    albedo::generate_albedo_map, metalness::generate_metalness_map, normal::generate_normal_map,
    params::GenerationParameters, roughness::generate_roughness_map,
};

/// Error returned when a synthesis request cannot be honoured.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureError {
    /// `size` was zero, which is not a valid raster.
    ZeroDimension { size: u32 },
    /// A numeric parameter was non-finite, or a scale was not positive.
    InvalidParameter { field: &'static str, value: f64 },
    /// The rasters of a [`TextureMap`] do not all share one size.
    SizeMismatch { expected: u32, actual: u32 },
}

impl std::fmt::Display for TextureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextureError::ZeroDimension { size } => {
                write!(f, "texture size must be non-zero (got {size}×{size})")
            }
            TextureError::InvalidParameter { field, value } => {
                write!(f, "invalid value {value} for parameter `{field}`")
            }
            TextureError::SizeMismatch { expected, actual } => {
                write!(
                    f,
                    "material maps differ in size ({expected}×{expected} vs {actual}×{actual})"
                )
            }
        }
    }
}

impl std::error::Error for TextureError {}

/// Square RGBA8 pixel buffer, row-major, alpha always 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    size: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Build a `size × size` raster by evaluating `pixel(x, y)` row by row.
    pub fn from_fn(size: u32, mut pixel: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let n = size as usize * size as usize;
        let mut data = Vec::with_capacity(n * 4);
        for y in 0..size {
            for x in 0..size {
                data.extend_from_slice(&pixel(x, y));
            }
        }
        Self { size, data }
    }

    /// Edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// RGBA bytes of pixel `(x, y)`.
    ///
    /// # Panics
    /// If `x` or `y` is outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.size && y < self.size, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.size as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Scaled sample coordinate of pixel index `i`: `(i / size) * scale`.
#[inline]
pub(crate) fn coord(i: u32, size: u32, scale: f64) -> f64 {
    (i as f64 / size as f64) * scale
}

/// Rasterise a per-pixel function of the scaled coordinates `(nx, ny)`.
pub(crate) fn rasterize(size: u32, scale: f64, mut f: impl FnMut(f64, f64) -> [u8; 4]) -> Raster {
    Raster::from_fn(size, |x, y| f(coord(x, size, scale), coord(y, size, scale)))
}

/// Grayscale pixel with opaque alpha.
#[inline]
pub(crate) fn gray(v: u8) -> [u8; 4] {
    [v, v, v, 255]
}

/// Dimension guard for the synthesizers.
#[inline]
pub fn validate_dimensions(size: u32) -> Result<(), TextureError> {
    if size == 0 {
        return Err(TextureError::ZeroDimension { size });
    }
    Ok(())
}

/// Shared entry check for every synthesizer.  Returns the sampling scale.
pub(crate) fn prepare(params: &GenerationParameters, size: u32) -> Result<f64, TextureError> {
    validate_dimensions(size)?;
    params.validate()?;
    Ok(params.scale())
}

/// One of the four correlated maps describing a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapKind {
    Albedo,
    Normal,
    Roughness,
    Metalness,
}

impl MapKind {
    pub const ALL: [MapKind; 4] = [
        MapKind::Albedo,
        MapKind::Normal,
        MapKind::Roughness,
        MapKind::Metalness,
    ];

    /// Name used for exported files (`<material>-<stem>.png`).
    pub fn file_stem(&self) -> &'static str {
        match self {
            MapKind::Albedo => "albedo",
            MapKind::Normal => "normal",
            MapKind::Roughness => "roughness",
            MapKind::Metalness => "metalness",
        }
    }
}

/// Synthesize a single map.
pub fn generate_map(
    kind: MapKind,
    params: &GenerationParameters,
    size: u32,
) -> Result<Raster, TextureError> {
    match kind {
        MapKind::Albedo => generate_albedo_map(params, size),
        MapKind::Normal => generate_normal_map(params, size),
        MapKind::Roughness => generate_roughness_map(params, size),
        MapKind::Metalness => generate_metalness_map(params, size),
    }
}

/// The four rasters of one material, all the same size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureMap {
    /// sRGB colour.
    pub albedo: Raster,
    /// Tangent-space normal, X=R, Y=G, Z=B.
    pub normal: Raster,
    /// Grayscale roughness.
    pub roughness: Raster,
    /// Grayscale metalness.
    pub metalness: Raster,
}

impl TextureMap {
    pub fn size(&self) -> u32 {
        self.albedo.size()
    }

    pub fn get(&self, kind: MapKind) -> &Raster {
        match kind {
            MapKind::Albedo => &self.albedo,
            MapKind::Normal => &self.normal,
            MapKind::Roughness => &self.roughness,
            MapKind::Metalness => &self.metalness,
        }
    }

    /// Check that all four rasters have the albedo's size.
    pub fn check_sizes(&self) -> Result<(), TextureError> {
        let expected = self.size();
        match MapKind::ALL
            .into_iter()
            .map(|kind| self.get(kind).size())
            .find(|&actual| actual != expected)
        {
            Some(actual) => Err(TextureError::SizeMismatch { expected, actual }),
            None => Ok(()),
        }
    }
}

/// Anything that can produce a full set of material maps.
pub trait TextureGenerator {
    /// Generate all four maps at `size × size`.
    ///
    /// Returns [`TextureError`] if `size` is zero or the parameters are
    /// invalid.
    fn generate(&self, size: u32) -> Result<TextureMap, TextureError>;
}

/// Generates every map for one [`GenerationParameters`].
///
/// The four maps are independent, so each runs as its own rayon task; every
/// individual map is still a single sequential pass.
#[derive(Clone, Debug)]
pub struct MaterialGenerator {
    params: GenerationParameters,
}

impl MaterialGenerator {
    pub fn new(params: GenerationParameters) -> Self {
        Self { params }
    }
}

impl TextureGenerator for MaterialGenerator {
    fn generate(&self, size: u32) -> Result<TextureMap, TextureError> {
        prepare(&self.params, size)?;
        let p = &self.params;
        let ((albedo, normal), (roughness, metalness)) = rayon::join(
            || {
                rayon::join(
                    || generate_albedo_map(p, size),
                    || generate_normal_map(p, size),
                )
            },
            || {
                rayon::join(
                    || generate_roughness_map(p, size),
                    || generate_metalness_map(p, size),
                )
            },
        );
        Ok(TextureMap {
            albedo: albedo?,
            normal: normal?,
            roughness: roughness?,
            metalness: metalness?,
        })
    }
}

/// Handles returned after uploading a [`TextureMap`] into Bevy's asset system.
pub struct PbrHandles {
    pub albedo: Handle<Image>,
    pub normal: Handle<Image>,
    pub roughness: Handle<Image>,
    pub metalness: Handle<Image>,
    /// Roughness in G, metalness in B, as [`StandardMaterial`] samples them.
    pub metallic_roughness: Handle<Image>,
}

impl PbrHandles {
    /// A [`StandardMaterial`] driven entirely by the generated maps.
    ///
    /// The normal map only takes effect on meshes that carry tangents.
    pub fn standard_material(&self) -> StandardMaterial {
        StandardMaterial {
            base_color_texture: Some(self.albedo.clone()),
            normal_map_texture: Some(self.normal.clone()),
            metallic_roughness_texture: Some(self.metallic_roughness.clone()),
            // Texture values are multiplied by these factors.
            metallic: 1.0,
            perceptual_roughness: 1.0,
            ..Default::default()
        }
    }
}

/// Pack roughness and metalness into one ORM raster
/// (R = occlusion 255, G = roughness, B = metalness).
///
/// Returns [`TextureError::SizeMismatch`] if the two rasters differ in size.
pub fn pack_metallic_roughness(
    roughness: &Raster,
    metalness: &Raster,
) -> Result<Raster, TextureError> {
    if roughness.size() != metalness.size() {
        return Err(TextureError::SizeMismatch {
            expected: roughness.size(),
            actual: metalness.size(),
        });
    }
    Ok(Raster::from_fn(roughness.size(), |x, y| {
        [255, roughness.pixel(x, y)[0], metalness.pixel(x, y)[0], 255]
    }))
}

/// Upload a [`TextureMap`] into [`Assets<Image>`] with repeat-wrapping samplers.
///
/// Takes `map` by value so the pixel buffers move straight into the images.
/// Level 0 of every image holds the raster bytes unchanged.  A map whose
/// rasters differ in size is rejected before anything is added to `images`.
pub fn map_to_images(
    map: TextureMap,
    images: &mut Assets<Image>,
) -> Result<PbrHandles, TextureError> {
    map.check_sizes()?;
    let packed = pack_metallic_roughness(&map.roughness, &map.metalness)?;
    Ok(PbrHandles {
        albedo: images.add(make_image(
            map.albedo,
            TextureFormat::Rgba8UnormSrgb,
            MipFilter::Srgb,
        )),
        normal: images.add(make_image(
            map.normal,
            TextureFormat::Rgba8Unorm,
            MipFilter::Normal,
        )),
        roughness: images.add(make_image(
            map.roughness,
            TextureFormat::Rgba8Unorm,
            MipFilter::Linear,
        )),
        metalness: images.add(make_image(
            map.metalness,
            TextureFormat::Rgba8Unorm,
            MipFilter::Linear,
        )),
        metallic_roughness: images.add(make_image(
            packed,
            TextureFormat::Rgba8Unorm,
            MipFilter::Linear,
        )),
    })
}

/// How a 2×2 block is averaged when building mip levels.
#[derive(Clone, Copy, Debug)]
enum MipFilter {
    /// Average in linear light, re-encode as sRGB.
    Srgb,
    /// Average decoded vectors, then renormalise.
    Normal,
    /// Plain byte average.
    Linear,
}

impl MipFilter {
    fn average(self, block: &[[u8; 4]]) -> [u8; 4] {
        let n = block.len() as u32;
        let alpha = (block.iter().map(|p| p[3] as u32).sum::<u32>() / n) as u8;
        match self {
            MipFilter::Linear => {
                let mean = |c: usize| (block.iter().map(|p| p[c] as u32).sum::<u32>() / n) as u8;
                [mean(0), mean(1), mean(2), alpha]
            }
            MipFilter::Srgb => {
                let mean = |c: usize| {
                    let sum: f32 = block.iter().map(|p| srgb_to_linear(p[c])).sum();
                    linear_to_srgb(sum / n as f32)
                };
                [mean(0), mean(1), mean(2), alpha]
            }
            MipFilter::Normal => {
                let mut v = [0.0f32; 3];
                for p in block {
                    for (c, acc) in v.iter_mut().enumerate() {
                        *acc += p[c] as f32 / 127.5 - 1.0;
                    }
                }
                let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
                if len < 1e-6 {
                    // Opposing normals cancelled out; fall back to flat.
                    return [128, 128, 255, 255];
                }
                let enc = |c: f32| ((c / len * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;
                [enc(v[0]), enc(v[1]), enc(v[2]), 255]
            }
        }
    }
}

fn srgb_to_linear(v: u8) -> f32 {
    static LUT: OnceLock<[f32; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        std::array::from_fn(|i| {
            let c = i as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        })
    })[v as usize]
}

fn linear_to_srgb(linear: f32) -> u8 {
    let c = linear.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// Append every mip level below `data` (a `size × size` RGBA8 level 0).
///
/// Each level is `floor(previous / 2)` on a side, matching wgpu's mip sizes.
/// On odd sizes the last destination row and column average a 3-texel span so
/// the source edge still contributes.
/// Returns the extended buffer and the total level count.
fn build_mip_chain(mut data: Vec<u8>, size: u32, filter: MipFilter) -> (Vec<u8>, u32) {
    let mut levels = 1;
    let mut src_offset = 0;
    let mut src = size as usize;

    while src > 1 {
        let dst = src / 2;
        let dst_offset = data.len();
        // Source span covered by destination index `i`.
        let span = |i: usize| 2 * i..if i + 1 == dst { src } else { 2 * i + 2 };
        data.reserve(dst * dst * 4);
        for y in 0..dst {
            for x in 0..dst {
                let mut block = [[0u8; 4]; 9];
                let mut count = 0;
                for sy in span(y) {
                    for sx in span(x) {
                        let at = src_offset + (sy * src + sx) * 4;
                        block[count] = [data[at], data[at + 1], data[at + 2], data[at + 3]];
                        count += 1;
                    }
                }
                let avg = filter.average(&block[..count]);
                data.extend_from_slice(&avg);
            }
        }
        src_offset = dst_offset;
        src = dst;
        levels += 1;
    }

    (data, levels)
}

fn make_image(raster: Raster, format: TextureFormat, filter: MipFilter) -> Image {
    let size = raster.size();
    let mut image = Image::new(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        raster.into_bytes(),
        format,
        RenderAssetUsages::default(),
    );
    if let Some(base) = image.data.take() {
        let (data, levels) = build_mip_chain(base, size, filter);
        image.texture_descriptor.mip_level_count = levels;
        image.data = Some(data);
    }
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        // wgpu requires all filter modes to be Linear when anisotropy_clamp > 1.
        mag_filter: ImageFilterMode::Linear,
        min_filter: ImageFilterMode::Linear,
        mipmap_filter: ImageFilterMode::Linear,
        anisotropy_clamp: 16,
        ..Default::default()
    });
    image
}
