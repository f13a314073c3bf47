use std::path::PathBuf;

use imageproc::{point::Point, rect::Rect};
use serde::Serialize;

use crate::geometry::{doubled_center_x, doubled_center_y};

/// A candidate bubble: the bounding box of an outer contour together with
/// the contour itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub bounds: Rect,
    pub contour: Vec<Point<i32>>,
}

impl Region {
    pub fn new(bounds: Rect, contour: Vec<Point<i32>>) -> Self {
        Self { bounds, contour }
    }

    /// Twice the vertical center, so centers compare as integers.
    pub fn center_y2(&self) -> i64 {
        doubled_center_y(&self.bounds)
    }

    /// Twice the horizontal center, so centers compare as integers.
    pub fn center_x2(&self) -> i64 {
        doubled_center_x(&self.bounds)
    }
}

/// The outcome of scoring one question row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Index of the winning option, counted left to right.
    Marked(usize),

    /// No option reached the fill floor.
    NoAnswer,
}

/// The graded result of one answer sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub total_questions: usize,
    pub correct_count: usize,
    pub incorrect_questions: Vec<usize>,
    pub detected_answers: String,
    pub diagnostic_artifact_ref: Option<PathBuf>,
}
