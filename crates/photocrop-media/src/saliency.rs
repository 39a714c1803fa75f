//! Content-aware crop search.
//!
//! [`ContentAwareCropper`] scores candidate windows of a fixed pixel size on
//! a downsampled copy of the image. Each pixel's saliency combines:
//!
//! - edge presence (Canny),
//! - color saturation,
//! - a skin-tone likelihood.
//!
//! A window's score is the mean saliency weighted by an importance mask that
//! favors the window center and its rule-of-thirds lines. Scores are
//! unbounded and positive; callers normalize them.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use imageproc::edges::canny;
use photocrop_models::BoundingBox;

use crate::error::{MediaError, MediaResult};

/// Best window found by a saliency search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaliencyCrop {
    /// Region in source image pixels
    pub region: BoundingBox,
    /// Unbounded positive score
    pub score: f64,
}

/// A saliency engine that picks the most interesting window of a given size.
pub trait SaliencyCropper: Send + Sync {
    /// Find the best `width` x `height` window in `image`.
    fn best_crop(&self, image: &DynamicImage, width: u32, height: u32) -> MediaResult<SaliencyCrop>;

    /// Engine name for logging.
    fn name(&self) -> &'static str;
}

/// Tuning for [`ContentAwareCropper`].
#[derive(Debug, Clone)]
pub struct SaliencyConfig {
    /// Longest side of the analysis image
    pub analysis_size: u32,
    /// Candidate positions per axis = `grid_steps + 1`
    pub grid_steps: u32,
    /// Samples per axis inside one window
    pub window_samples: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub edge_weight: f32,
    pub saturation_weight: f32,
    pub skin_weight: f32,
    /// Multiplier turning the mean weighted saliency into a raw score
    pub score_scale: f64,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            analysis_size: 256,
            grid_steps: 16,
            window_samples: 48,
            canny_low: 30.0,
            canny_high: 80.0,
            edge_weight: 1.0,
            saturation_weight: 0.6,
            skin_weight: 1.2,
            score_scale: 200.0,
        }
    }
}

/// Edge, saturation and skin-tone based cropper.
#[derive(Debug, Clone, Default)]
pub struct ContentAwareCropper {
    config: SaliencyConfig,
}

impl ContentAwareCropper {
    pub fn new(config: SaliencyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SaliencyConfig {
        &self.config
    }

    fn saliency_map(&self, rgb: &RgbImage) -> Vec<f32> {
        let gray = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();
        let edges = canny(&gray, self.config.canny_low, self.config.canny_high);

        rgb.pixels()
            .zip(edges.pixels())
            .map(|(px, edge)| {
                let [r, g, b] = px.0;
                let edge = if edge[0] > 0 { 1.0 } else { 0.0 };
                self.config.edge_weight * edge
                    + self.config.saturation_weight * saturation(r, g, b)
                    + self.config.skin_weight * skin_likelihood(r, g, b)
            })
            .collect()
    }

    fn score_window(&self, map: &[f32], map_width: u32, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let samples_x = self.config.window_samples.min(w).max(1);
        let samples_y = self.config.window_samples.min(h).max(1);

        let mut total = 0.0f64;
        for sy in 0..samples_y {
            let v = (sy as f64 + 0.5) / samples_y as f64;
            let py = y + (v * h as f64) as u32;
            for sx in 0..samples_x {
                let u = (sx as f64 + 0.5) / samples_x as f64;
                let px = x + (u * w as f64) as u32;
                let idx = (py * map_width + px) as usize;
                let value = map.get(idx).copied().unwrap_or(0.0) as f64;
                total += value * importance(u, v);
            }
        }
        total / (samples_x * samples_y) as f64 * self.config.score_scale
    }
}

impl SaliencyCropper for ContentAwareCropper {
    fn best_crop(&self, image: &DynamicImage, width: u32, height: u32) -> MediaResult<SaliencyCrop> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return Err(MediaError::invalid_image("image has no pixels"));
        }
        if width == 0 || height == 0 {
            return Err(MediaError::internal(format!(
                "crop size must be positive, got {}x{}",
                width, height
            )));
        }
        let width = width.min(img_w);
        let height = height.min(img_h);

        let scale = (self.config.analysis_size as f64 / img_w.max(img_h) as f64).min(1.0);
        let small = if scale < 1.0 {
            let sw = ((img_w as f64 * scale).round() as u32).max(1);
            let sh = ((img_h as f64 * scale).round() as u32).max(1);
            image.resize_exact(sw, sh, FilterType::Triangle)
        } else {
            image.clone()
        };
        let rgb = small.to_rgb8();
        let (small_w, small_h) = rgb.dimensions();
        let map = self.saliency_map(&rgb);

        let win_w = ((width as f64 * scale).round() as u32).clamp(1, small_w);
        let win_h = ((height as f64 * scale).round() as u32).clamp(1, small_h);

        let steps = self.config.grid_steps.max(1);
        let positions = |free: u32| -> Vec<u32> {
            let mut out: Vec<u32> = (0..=steps).map(|i| free * i / steps).collect();
            out.dedup();
            out
        };

        let mut best = (0u32, 0u32, f64::NEG_INFINITY);
        for &y in &positions(small_h - win_h) {
            for &x in &positions(small_w - win_w) {
                let score = self.score_window(&map, small_w, x, y, win_w, win_h);
                if score > best.2 {
                    best = (x, y, score);
                }
            }
        }

        let (bx, by, score) = best;
        let x = ((bx as f64 / scale).round()).min((img_w - width) as f64).max(0.0);
        let y = ((by as f64 / scale).round()).min((img_h - height) as f64).max(0.0);

        Ok(SaliencyCrop {
            region: BoundingBox::new(x, y, width as f64, height as f64),
            score: score.max(0.0),
        })
    }

    fn name(&self) -> &'static str {
        "content_aware"
    }
}

fn saturation(r: u8, g: u8, b: u8) -> f32 {
    let max = r.max(g).max(b) as f32;
    let min = r.min(g).min(b) as f32;
    if max == 0.0 {
        0.0
    } else {
        (max - min) / max
    }
}

/// Rule-based RGB skin classifier, softened near the thresholds.
fn skin_likelihood(r: u8, g: u8, b: u8) -> f32 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let spread = r.max(g).max(b) - r.min(g).min(b);
    if r > 95 && g > 40 && b > 20 && spread > 15 && (r - g).abs() > 15 && r > g && r > b {
        // Stronger the further red dominates green, capped.
        (((r - g) as f32) / 60.0).min(1.0).max(0.5)
    } else {
        0.0
    }
}

/// Weight of a position inside a window, `u`/`v` in `[0, 1]`.
fn importance(u: f64, v: f64) -> f64 {
    let dx = (u - 0.5).abs() * 2.0;
    let dy = (v - 0.5).abs() * 2.0;
    let center = (1.41 - (dx * dx + dy * dy).sqrt()).max(0.0);
    center + 0.6 * (thirds(u) + thirds(v))
}

fn thirds(t: f64) -> f64 {
    let d = (t - 1.0 / 3.0).abs().min((t - 2.0 / 3.0).abs()) * 8.0;
    (1.0 - d * d).max(0.0)
}
