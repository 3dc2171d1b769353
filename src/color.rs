//! sRGB hex parsing and byte-space colour blending.
//!
//! Colours stay in gamma-encoded sRGB bytes the whole way through; there is no
//! linearisation.  Blends are computed in `f64` and may leave `[0, 255]`
//! (interpolation weights are not clamped), so clamping happens only when a
//! channel is finally written into a raster via [`clamp_channel`].

/// An sRGB colour as three bytes.
pub type Rgb = [u8; 3];

/// Returned by [`hex_to_rgb`] for anything that is not a 6-digit hex colour.
pub const NEUTRAL_GREY: Rgb = [128, 128, 128];

/// Parse `"#rrggbb"` or `"rrggbb"` (case-insensitive).
///
/// Malformed input yields [`NEUTRAL_GREY`] instead of an error so one bad
/// palette entry never aborts a whole material.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    parse_hex(hex).unwrap_or(NEUTRAL_GREY)
}

/// Strict variant of [`hex_to_rgb`]: `None` when `hex` is malformed.
pub fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Per-channel `c1 + (c2 - c1) * t`, rounded half-up.
///
/// `t` is deliberately unclamped: weights above 1 or below 0 extrapolate past
/// the endpoints, and the result can fall outside the byte range.
pub fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> [f64; 3] {
    std::array::from_fn(|i| {
        let a = c1[i] as f64;
        let b = c2[i] as f64;
        round_half_up(a + (b - a) * t)
    })
}

/// Bound `v` to `[lo, hi]`.
#[inline]
pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// Final write of a colour channel: clamp to `[0, 255]`, then round to the
/// nearest byte with ties going to even.
#[inline]
pub fn clamp_channel(v: f64) -> u8 {
    clamp(v, 0.0, 255.0).round_ties_even() as u8
}

/// Round to the nearest integer with ties toward positive infinity
/// (`-2.5 → -2`, `2.5 → 3`).
#[inline]
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
