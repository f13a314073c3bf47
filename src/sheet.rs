use std::fs;
use std::path::Path;

use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::alphabet::Language;

/// An inclusive range of pixel sizes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u32,
    pub max: u32,
}

impl SizeRange {
    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// An inclusive range of width/height ratios.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    pub min: f32,
    pub max: f32,
}

impl RatioRange {
    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }
}

/// How vertically sorted bubbles are grouped into question rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowGrouping {
    /// Consecutive runs of `options_per_question` bubbles form a row.
    FixedChunks,

    /// Bubbles are first clustered into visual rows by vertical center,
    /// and each visual row is then split into questions.
    Clustered,
}

/// The expected layout of an answer sheet at its scan resolution.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SheetGeometry {
    /// Accepted bubble width and height, in pixels.
    pub bubble_size: SizeRange,
    /// Accepted bubble width/height ratio.
    pub aspect_ratio: RatioRange,
    /// Minimum number of ink pixels for a bubble to count as marked.
    pub min_fill_pixels: u32,
    /// Side of the square smoothing kernel; must be odd.
    pub blur_kernel_size: u32,
    pub options_per_question: usize,
    pub row_grouping: RowGrouping,
}

impl Default for SheetGeometry {
    /// Bubbles of roughly 6-8mm on a typical phone photo or scan.
    fn default() -> Self {
        Self {
            bubble_size: SizeRange { min: 50, max: 90 },
            aspect_ratio: RatioRange { min: 0.8, max: 1.2 },
            min_fill_pixels: 500,
            blur_kernel_size: 7,
            options_per_question: 4,
            row_grouping: RowGrouping::FixedChunks,
        }
    }
}

impl SheetGeometry {
    /// Determines whether a rect could be a bubble based on its size and shape.
    pub fn rect_could_be_bubble(&self, rect: &Rect) -> bool {
        let aspect_ratio = rect.width() as f32 / rect.height() as f32;
        self.bubble_size.contains(rect.width())
            && self.bubble_size.contains(rect.height())
            && self.aspect_ratio.contains(aspect_ratio)
    }

    /// Checks that this geometry can be used to read a sheet answered in
    /// `language`.
    pub fn validate(&self, language: Language) -> Result<(), String> {
        if self.blur_kernel_size % 2 == 0 {
            return Err(format!(
                "blur kernel size must be odd, got {}",
                self.blur_kernel_size
            ));
        }
        if self.bubble_size.min > self.bubble_size.max {
            return Err(format!(
                "bubble size range is empty: {}..={}",
                self.bubble_size.min, self.bubble_size.max
            ));
        }
        if self.aspect_ratio.min > self.aspect_ratio.max {
            return Err(format!(
                "aspect ratio range is empty: {}..={}",
                self.aspect_ratio.min, self.aspect_ratio.max
            ));
        }
        if self.options_per_question == 0 {
            return Err("options per question must be at least 1".to_string());
        }
        let max_options = language.max_options();
        if self.options_per_question > max_options {
            return Err(format!(
                "{} options per question exceed the {} distinct answer symbols of the {} alphabet",
                self.options_per_question, max_options, language
            ));
        }
        Ok(())
    }
}

/// Loads a sheet geometry from a JSON file. Missing keys keep their defaults.
pub fn load_sheet_geometry(path: &Path) -> Result<SheetGeometry, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read sheet geometry {}: {e}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|e| format!("Failed to parse sheet geometry {}: {e}", path.display()))
}
