use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GrayImage, ImageFormat, ImageOutputFormat, ImageResult, RgbImage};
use imageproc::{
    drawing::{draw_cross_mut, draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};
use log::{debug, warn};

use crate::{
    fill::ScoredRow,
    geometry::center_of_rect,
    image_utils::{BLUE, GREEN, RAINBOW, RED, WHITE_RGB},
};

/// Writes debug images for one invocation, or does nothing when disabled.
#[derive(Debug, Clone)]
pub struct ImageDebugWriter {
    output_dir: Option<PathBuf>,
}

impl ImageDebugWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir: Some(output_dir),
        }
    }

    pub fn disabled() -> Self {
        Self { output_dir: None }
    }

    /// Saves the binary mask under a fresh, timestamped name and returns its
    /// path. Each call creates a new file, so concurrent invocations sharing
    /// one directory never overwrite each other.
    pub fn write_mask(&self, mask: &GrayImage) -> Option<PathBuf> {
        let output_dir = self.output_dir.as_ref()?;
        match write_mask_file(output_dir, mask) {
            Ok(path) => {
                debug!("wrote threshold debug image to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!(
                    "failed to write threshold debug image to {}: {}",
                    output_dir.display(),
                    e
                );
                None
            }
        }
    }

    /// Saves an overlay of the candidate bubbles and their scores next to
    /// the mask written by `write_mask`.
    pub fn write_bubbles(
        &self,
        mask_path: &Path,
        mask: &GrayImage,
        candidates: &[Rect],
        rows: &[ScoredRow],
        min_fill: u32,
    ) -> Option<PathBuf> {
        let mut canvas = DynamicImage::ImageLuma8(mask.clone()).to_rgb8();
        draw_candidate_rects_debug_image_mut(&mut canvas, candidates);
        draw_scored_bubbles_debug_image_mut(&mut canvas, rows, min_fill);

        let path = debug_image_path(mask_path, "bubbles");
        match canvas.save_with_format(&path, ImageFormat::Png) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("failed to write bubble debug image {}: {}", path.display(), e);
                None
            }
        }
    }
}

fn write_mask_file(output_dir: &Path, mask: &GrayImage) -> ImageResult<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut file = tempfile::Builder::new()
        .prefix(&format!("debug_thresh_{}_", timestamp))
        .suffix(".png")
        .tempfile_in(output_dir)?;
    // dropping the file before `keep` removes it
    DynamicImage::ImageLuma8(mask.clone()).write_to(&mut file, ImageOutputFormat::Png)?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    Ok(path)
}

/// Creates a path for a debug image.
pub fn debug_image_path(base: &Path, label: &str) -> PathBuf {
    let mut result = PathBuf::from(base);
    result.set_file_name(format!(
        "{}_{}.png",
        base.file_stem().unwrap_or_default().to_string_lossy(),
        label
    ));
    result
}

/// Draws a debug image of the rectangles of all bubble candidates.
pub fn draw_candidate_rects_debug_image_mut(canvas: &mut RgbImage, candidates: &[Rect]) {
    for (i, rect) in candidates.iter().enumerate() {
        draw_filled_rect_mut(canvas, *rect, RAINBOW[i % RAINBOW.len()]);
    }
}

/// Draws a debug image outlining all the scored bubbles: the winner of each
/// row in green, bubbles below the fill floor in red, and the rest in blue.
pub fn draw_scored_bubbles_debug_image_mut(
    canvas: &mut RgbImage,
    rows: &[ScoredRow],
    min_fill: u32,
) {
    for row in rows {
        let winner = row.winner().map(|bubble| bubble.bounds);
        for bubble in &row.bubbles {
            let color = if Some(bubble.bounds) == winner {
                GREEN
            } else if bubble.coverage < min_fill {
                RED
            } else {
                BLUE
            };
            draw_hollow_rect_mut(canvas, bubble.bounds, color);

            let center = center_of_rect(&bubble.bounds);
            draw_cross_mut(
                canvas,
                WHITE_RGB,
                center.x.round() as i32,
                center.y.round() as i32,
            );
        }
    }
}
