//! Visual effects applied per frame over a segment's still image.
//!
//! Effects compose in a fixed order, pan before fade: pan changes the image
//! extent through upscale+crop, while fade only adjusts pixel appearance.
//! Running fade first would have its result clipped by the pan crop.

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Parameters driving the effect pipeline for one segment.
#[derive(Debug, Clone)]
pub struct EffectParams {
    /// Output frame size (width, height)
    pub output_size: (u32, u32),
    /// Fade in/out duration in seconds; <= 0 disables fading
    pub fade_duration: f64,
    /// Whether the pan effect is applied
    pub use_pan: bool,
    /// Pan range as (horizontal, vertical) fractions of the output dimension
    pub pan_range: (f64, f64),
    /// Segment index, used for alternating pan direction by parity
    pub segment_index: u32,
}

/// Pan movement axis for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PanAxis {
    Horizontal,
    Vertical,
}

/// Apply all effects to one frame at time `t` of a `duration`-second segment.
///
/// The input image is expected to already match `output_size`; the pan effect
/// upscales from it to create movement headroom and crops back down, so the
/// result is always exactly `output_size`.
pub fn apply_effects(image: &RgbImage, t: f64, duration: f64, params: &EffectParams) -> RgbImage {
    let mut frame = if params.use_pan {
        pan_frame(image, t, duration, params)
    } else {
        image.clone()
    };

    let multiplier = fade_multiplier(t, duration, params.fade_duration);
    if multiplier < 1.0 {
        apply_brightness(&mut frame, multiplier);
    }

    frame
}

/// Raised-cosine ease-in-out: zero velocity at both endpoints.
pub fn eased_progress(progress: f64) -> f64 {
    0.5 * (1.0 - (std::f64::consts::PI * progress.clamp(0.0, 1.0)).cos())
}

/// Crop offset along the moving axis at time `t`.
pub fn pan_offset(max_offset: u32, t: f64, duration: f64) -> u32 {
    if duration <= 0.0 {
        return 0;
    }
    (max_offset as f64 * eased_progress(t / duration)) as u32
}

/// Brightness multiplier for the fade effect, clamped to [0, 1].
///
/// Ramps 0..1 over the first `fade_duration` seconds and 1..0 over the last.
/// When the ramps overlap (2 * fade_duration > duration) the minimum of the
/// two applies, so a frame is never brighter than either ramp alone implies.
pub fn fade_multiplier(t: f64, duration: f64, fade_duration: f64) -> f64 {
    if fade_duration <= 0.0 {
        return 1.0;
    }

    let fade_in = t / fade_duration;
    let fade_out = (duration - t) / fade_duration;
    fade_in.min(fade_out).clamp(0.0, 1.0)
}

fn pan_frame(image: &RgbImage, t: f64, duration: f64, params: &EffectParams) -> RgbImage {
    let (out_w, out_h) = params.output_size;
    let axis = pan_axis(params.pan_range, params.segment_index);
    let (h_range, v_range) = params.pan_range;

    let aspect = image.width() as f64 / image.height() as f64;

    // Upscale so the moving axis has headroom while the stationary axis
    // matches the output exactly, preserving aspect ratio.
    let (new_w, new_h) = match axis {
        PanAxis::Horizontal => {
            let new_h = out_h;
            let new_w = ((new_h as f64 * aspect) as u32).max((out_w as f64 * (1.0 + h_range)) as u32);
            (new_w, new_h)
        }
        PanAxis::Vertical => {
            let new_w = out_w;
            let new_h = ((new_w as f64 / aspect) as u32).max((out_h as f64 * (1.0 + v_range)) as u32);
            (new_w, new_h)
        }
    };

    let scaled = imageops::resize(image, new_w, new_h, FilterType::CatmullRom);

    let (x, y) = match axis {
        PanAxis::Horizontal => (pan_offset(new_w - out_w, t, duration), 0),
        PanAxis::Vertical => (0, pan_offset(new_h - out_h, t, duration)),
    };

    imageops::crop_imm(&scaled, x, y, out_w, out_h).to_image()
}

/// Direction for this segment: both range components nonzero alternates by
/// segment parity; exactly one nonzero selects that axis; both zero defaults
/// to horizontal.
fn pan_axis(pan_range: (f64, f64), segment_index: u32) -> PanAxis {
    let (h_range, v_range) = pan_range;
    if h_range > 0.0 && v_range > 0.0 {
        if segment_index % 2 == 0 {
            PanAxis::Horizontal
        } else {
            PanAxis::Vertical
        }
    } else if v_range > 0.0 {
        PanAxis::Vertical
    } else {
        PanAxis::Horizontal
    }
}

/// Uniform brightness scale; no alpha so it composes with yuv420p encoding.
fn apply_brightness(frame: &mut RgbImage, multiplier: f64) {
    let m = multiplier.clamp(0.0, 1.0);
    for pixel in frame.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f64 * m).round().min(255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(output_size: (u32, u32)) -> EffectParams {
        EffectParams {
            output_size,
            fade_duration: 1.0,
            use_pan: true,
            pan_range: (0.5, 0.0),
            segment_index: 0,
        }
    }

    #[test]
    fn test_fade_multiplier_ramps() {
        // fade_duration = 1.0, duration = 5.0
        assert!((fade_multiplier(0.5, 5.0, 1.0) - 0.5).abs() < 1e-9);
        assert!((fade_multiplier(2.5, 5.0, 1.0) - 1.0).abs() < 1e-9);
        assert!((fade_multiplier(4.75, 5.0, 1.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_fade_disabled_when_non_positive() {
        assert_eq!(fade_multiplier(0.0, 5.0, 0.0), 1.0);
        assert_eq!(fade_multiplier(0.0, 5.0, -1.0), 1.0);
    }

    #[test]
    fn test_overlapping_ramps_take_minimum() {
        // 2 * fade_duration > duration: both ramps active at the midpoint
        let duration = 3.0;
        let fade = 2.0;
        let mid = fade_multiplier(1.5, duration, fade);
        assert!((mid - 0.75).abs() < 1e-9);
        // Never brighter than either ramp alone
        assert!(mid <= 1.5 / fade);
        assert!(mid <= (duration - 1.5) / fade);
    }

    #[test]
    fn test_fade_multiplier_clamped() {
        assert_eq!(fade_multiplier(-1.0, 5.0, 1.0), 0.0);
        assert_eq!(fade_multiplier(10.0, 5.0, 1.0), 0.0);
    }

    #[test]
    fn test_pan_offset_boundary_conditions() {
        let max = 500;
        assert_eq!(pan_offset(max, 0.0, 10.0), 0);
        assert_eq!(pan_offset(max, 10.0, 10.0), max);
        // Zero velocity at both ends: almost no movement near them
        assert!(pan_offset(max, 0.05, 10.0) <= 1);
        assert!(pan_offset(max, 9.95, 10.0) >= max - 1);
        // Midpoint lands halfway
        let mid = pan_offset(max, 5.0, 10.0);
        assert!((mid as i64 - (max / 2) as i64).abs() <= 1);
    }

    #[test]
    fn test_eased_progress_midpoint() {
        assert!((eased_progress(0.5) - 0.5).abs() < 1e-9);
        assert!(eased_progress(0.0).abs() < 1e-9);
        assert!((eased_progress(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pan_axis_selection() {
        assert_eq!(pan_axis((0.5, 0.0), 0), PanAxis::Horizontal);
        assert_eq!(pan_axis((0.5, 0.0), 1), PanAxis::Horizontal);
        assert_eq!(pan_axis((0.0, 0.5), 0), PanAxis::Vertical);
        // Both nonzero: alternate by parity
        assert_eq!(pan_axis((0.5, 0.5), 0), PanAxis::Horizontal);
        assert_eq!(pan_axis((0.5, 0.5), 1), PanAxis::Vertical);
        // Both zero: default horizontal
        assert_eq!(pan_axis((0.0, 0.0), 3), PanAxis::Horizontal);
    }

    #[test]
    fn test_output_size_is_exact() {
        let image = RgbImage::from_pixel(1000, 500, image::Rgb([128, 64, 32]));
        let p = params((1000, 500));

        for &t in &[0.0, 2.5, 5.0] {
            let frame = apply_effects(&image, t, 5.0, &p);
            assert_eq!(frame.width(), 1000);
            assert_eq!(frame.height(), 500);
        }
    }

    #[test]
    fn test_vertical_pan_output_size() {
        let image = RgbImage::from_pixel(800, 600, image::Rgb([10, 20, 30]));
        let mut p = params((800, 600));
        p.pan_range = (0.0, 0.4);

        let frame = apply_effects(&image, 1.0, 4.0, &p);
        assert_eq!(frame.dimensions(), (800, 600));
    }

    #[test]
    fn test_fade_darkens_first_frame() {
        let image = RgbImage::from_pixel(64, 64, image::Rgb([200, 100, 50]));
        let mut p = params((64, 64));
        p.use_pan = false;

        // t = 0.5 of a 1.0s fade: half brightness
        let frame = apply_effects(&image, 0.5, 5.0, &p);
        let px = frame.get_pixel(10, 10);
        assert_eq!(px.0, [100, 50, 25]);

        // Steady state: untouched
        let frame = apply_effects(&image, 2.5, 5.0, &p);
        assert_eq!(frame.get_pixel(10, 10).0, [200, 100, 50]);
    }

    #[test]
    fn test_pan_headroom_covers_range() {
        // Square 1000x1000 into 1000x500 with 0.5 horizontal range: the
        // aspect-preserving width (1000 * 2 = 2000) exceeds the range
        // requirement (1500), so max offset is 1000.
        let image = RgbImage::from_pixel(1000, 1000, image::Rgb([1, 2, 3]));
        let p = params((1000, 500));
        let frame = apply_effects(&image, 5.0, 5.0, &p);
        assert_eq!(frame.dimensions(), (1000, 500));
    }
}
