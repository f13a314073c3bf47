use std::fmt::Display;
use std::path::PathBuf;

use image::GrayImage;
use imageproc::rect::Rect;
use log::{debug, info};
use logging_timer::time;
use serde::Serialize;

use crate::alphabet::{decode_answers, Language};
use crate::bubbles::find_bubble_regions;
use crate::debug::ImageDebugWriter;
use crate::fill::{score_grid, ScoredRow};
use crate::grid::{sort_into_grid, Grid};
use crate::image_utils::{binarize_inverted, blur};
use crate::score::{score_answers, AnswerKey};
use crate::sheet::SheetGeometry;
use crate::types::{DetectionResult, RowOutcome};

#[derive(Debug, Clone)]
pub struct InterpretOptions {
    pub geometry: SheetGeometry,
    pub language: Language,
    /// Directory for debug images; `None` disables them.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum InterpretError {
    MissingInput,
    DecodeError(image::ImageError),
    NoBubblesDetected,
    InvalidConfiguration(String),
}

/// Machine-readable failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NoImage,
    DecodeError,
    NoBubblesDetected,
    InvalidConfiguration,
}

impl InterpretError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InterpretError::MissingInput => ErrorKind::NoImage,
            InterpretError::DecodeError(_) => ErrorKind::DecodeError,
            InterpretError::NoBubblesDetected => ErrorKind::NoBubblesDetected,
            InterpretError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
        }
    }
}

impl Display for InterpretError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpretError::MissingInput => write!(f, "No image file provided"),
            InterpretError::DecodeError(_) => write!(f, "Failed to read uploaded image"),
            InterpretError::NoBubblesDetected => write!(
                f,
                "No bubbles detected in image. Please check image quality and format."
            ),
            InterpretError::InvalidConfiguration(reason) => {
                write!(f, "Invalid sheet configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for InterpretError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InterpretError::DecodeError(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything read off one answer sheet, before scoring against a key.
#[derive(Debug, Clone)]
pub struct InterpretedSheet {
    pub grid: Grid,
    pub rows: Vec<ScoredRow>,
    pub detected_answers: String,
    pub threshold_image_path: Option<PathBuf>,
}

#[time]
/// Decodes an uploaded image buffer into a grayscale image.
pub fn load_sheet_image(image_bytes: Option<&[u8]>) -> Result<GrayImage, InterpretError> {
    let image_bytes = image_bytes.ok_or(InterpretError::MissingInput)?;
    let img = image::load_from_memory(image_bytes).map_err(InterpretError::DecodeError)?;
    Ok(img.into_luma8())
}

#[time]
/// Smooths and binarizes a sheet so that ink is `WHITE`.
///
/// The threshold adapts to overall exposure but is global, so strongly
/// uneven lighting across the sheet can still hide marks.
pub fn preprocess_sheet_image(img: &GrayImage, geometry: &SheetGeometry) -> GrayImage {
    binarize_inverted(&blur(img, geometry.blur_kernel_size))
}

#[time]
/// Reads the answer of every question on a grayscale sheet image.
pub fn detect_answers(
    img: &GrayImage,
    options: &InterpretOptions,
    debug: &ImageDebugWriter,
) -> Result<InterpretedSheet, InterpretError> {
    let geometry = &options.geometry;
    let mask = preprocess_sheet_image(img, geometry);
    let threshold_image_path = debug.write_mask(&mask);

    let regions = find_bubble_regions(geometry, &mask);
    if regions.is_empty() {
        return Err(InterpretError::NoBubblesDetected);
    }

    let grid = sort_into_grid(
        regions,
        geometry.options_per_question,
        geometry.row_grouping,
    );
    let rows = score_grid(&grid, &mask, geometry.min_fill_pixels);

    if let Some(mask_path) = &threshold_image_path {
        let candidates = grid.regions().map(|r| r.bounds).collect::<Vec<Rect>>();
        debug.write_bubbles(
            mask_path,
            &mask,
            &candidates,
            &rows,
            geometry.min_fill_pixels,
        );
    }

    let detected_answers = decode_answers(rows.iter().map(|row| row.outcome), options.language)
        .ok_or_else(|| {
            InterpretError::InvalidConfiguration(format!(
                "a bubble index has no symbol in the {} alphabet",
                options.language
            ))
        })?;
    debug!(
        "read {} questions from {} bubbles",
        grid.row_count(),
        grid.regions().count()
    );

    Ok(InterpretedSheet {
        grid,
        rows,
        detected_answers,
        threshold_image_path,
    })
}

#[time]
/// Grades one answer sheet image against `answer_key`.
pub fn interpret_answer_sheet(
    image_bytes: Option<&[u8]>,
    answer_key: &str,
    options: &InterpretOptions,
) -> Result<DetectionResult, InterpretError> {
    options
        .geometry
        .validate(options.language)
        .map_err(InterpretError::InvalidConfiguration)?;

    let img = load_sheet_image(image_bytes)?;
    let debug = match &options.debug_dir {
        Some(dir) => ImageDebugWriter::new(dir.clone()),
        None => ImageDebugWriter::disabled(),
    };
    let sheet = detect_answers(&img, options, &debug)?;

    let unanswered = sheet
        .rows
        .iter()
        .filter(|row| row.outcome == RowOutcome::NoAnswer)
        .count();
    debug!(
        "{} of {} questions unanswered",
        unanswered,
        sheet.grid.row_count()
    );

    let key = AnswerKey::new(answer_key);
    let score = score_answers(&sheet.detected_answers, &key);
    info!("Correct Answers: {}", key.symbols().iter().collect::<String>());
    info!("Detected Answers: {}", sheet.detected_answers);

    Ok(DetectionResult {
        total_questions: score.total_questions,
        correct_count: score.correct_count,
        incorrect_questions: score.incorrect_questions,
        detected_answers: sheet.detected_answers,
        diagnostic_artifact_ref: sheet.threshold_image_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::RowGrouping;
    use crate::testing::{encode_png, AnswerSheet};
    use rayon::prelude::*;

    fn options(language: Language) -> InterpretOptions {
        InterpretOptions {
            geometry: SheetGeometry::default(),
            language,
            debug_dir: None,
        }
    }

    #[test]
    fn second_bubble_filled_reads_b() {
        let png = AnswerSheet::new(4).row(&[1]).to_png();
        let result = interpret_answer_sheet(Some(png.as_slice()), "B", &options(Language::English))
            .expect("sheet is graded");
        assert_eq!(result.detected_answers, "B");
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.correct_count, 1);
        assert!(result.incorrect_questions.is_empty());
        assert_eq!(result.diagnostic_artifact_ref, None);
    }

    #[test]
    fn grades_several_questions() {
        let png = AnswerSheet::new(4)
            .row(&[0])
            .row(&[2])
            .row(&[3])
            .row(&[1])
            .to_png();
        let result = interpret_answer_sheet(Some(png.as_slice()), "acbb", &options(Language::English))
            .expect("sheet is graded");
        assert_eq!(result.detected_answers, "ACDB");
        assert_eq!(result.total_questions, 4);
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.incorrect_questions, vec![3]);
    }

    #[test]
    fn unmarked_row_reads_sentinel() {
        let png = AnswerSheet::new(4).row(&[2]).row(&[]).to_png();
        let mut options = options(Language::English);
        // outlines of unmarked bubbles alone must not reach the floor
        options.geometry.min_fill_pixels = 2000;
        let result =
            interpret_answer_sheet(Some(png.as_slice()), "CC", &options).expect("sheet is graded");
        assert_eq!(result.detected_answers, "CX");
        assert_eq!(result.incorrect_questions, vec![2]);
    }

    #[test]
    fn bengali_sheet() {
        let png = AnswerSheet::new(4).row(&[1]).row(&[]).to_png();
        let mut options = options(Language::Bengali);
        options.geometry.min_fill_pixels = 2000;
        let result =
            interpret_answer_sheet(Some(png.as_slice()), "খগ", &options).expect("sheet is graded");
        assert_eq!(result.detected_answers, "খ০");
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.incorrect_questions, vec![2]);
    }

    #[test]
    fn filled_bubble_outscores_outlines() {
        let png = AnswerSheet::new(4).row(&[3]).to_png();
        let img = load_sheet_image(Some(png.as_slice())).expect("decodes");
        let sheet = detect_answers(&img, &options(Language::English), &ImageDebugWriter::disabled())
            .expect("detects");

        let coverages = sheet.rows[0]
            .bubbles
            .iter()
            .map(|b| b.coverage)
            .collect::<Vec<u32>>();
        assert_eq!(sheet.detected_answers, "D");
        assert!(coverages[..3].iter().all(|&c| c < coverages[3]), "{:?}", coverages);
    }

    #[test]
    fn short_last_row_is_read() {
        let png = AnswerSheet::new(4).row(&[0]).partial_row(2, &[1]).to_png();
        let result = interpret_answer_sheet(Some(png.as_slice()), "AB", &options(Language::English))
            .expect("sheet is graded");
        assert_eq!(result.detected_answers, "AB");
    }

    #[test]
    fn clustered_rows_read_a_two_column_sheet() {
        let png = AnswerSheet::new(3).columns(2).row(&[0]).row(&[2]).to_png();
        let mut options = options(Language::English);
        options.geometry.options_per_question = 3;
        options.geometry.row_grouping = RowGrouping::Clustered;
        let result =
            interpret_answer_sheet(Some(png.as_slice()), "ACAC", &options).expect("sheet is graded");
        assert_eq!(result.detected_answers, "AACC");
        assert_eq!(result.correct_count, 2);
    }

    #[test]
    fn blank_page_has_no_bubbles() {
        let png = encode_png(&GrayImage::from_pixel(400, 300, image::Luma([255])));
        let error = interpret_answer_sheet(Some(png.as_slice()), "A", &options(Language::English))
            .expect_err("nothing to read");
        assert_eq!(error.kind(), ErrorKind::NoBubblesDetected);
        assert_eq!(
            error.to_string(),
            "No bubbles detected in image. Please check image quality and format."
        );
    }

    #[test]
    fn tiny_dots_are_not_bubbles() {
        let png = AnswerSheet::new(4).bubble_radius(8).row(&[1]).to_png();
        let error = interpret_answer_sheet(Some(png.as_slice()), "B", &options(Language::English))
            .expect_err("dots are too small");
        assert_eq!(error.kind(), ErrorKind::NoBubblesDetected);
    }

    #[test]
    fn missing_image() {
        let error = interpret_answer_sheet(None, "A", &options(Language::English))
            .expect_err("no image");
        assert_eq!(error.kind(), ErrorKind::NoImage);
        assert_eq!(error.to_string(), "No image file provided");
    }

    #[test]
    fn undecodable_bytes() {
        for bytes in [&b""[..], &b"definitely not a png"[..]] {
            let error = interpret_answer_sheet(Some(bytes), "A", &options(Language::English))
                .expect_err("not an image");
            assert_eq!(error.kind(), ErrorKind::DecodeError);
            assert_eq!(error.to_string(), "Failed to read uploaded image");
        }
    }

    #[test]
    fn configuration_is_checked_before_decoding() {
        let mut options = options(Language::Bengali);
        options.geometry.options_per_question = 5;
        let error = interpret_answer_sheet(None, "A", &options).expect_err("bad config");
        assert_eq!(error.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn identical_input_gives_identical_answers() {
        let png = AnswerSheet::new(4).row(&[2]).row(&[]).row(&[0]).to_png();
        let options = options(Language::English);
        let first = interpret_answer_sheet(Some(png.as_slice()), "CAA", &options).expect("graded");
        let second = interpret_answer_sheet(Some(png.as_slice()), "CAA", &options).expect("graded");
        assert_eq!(first, second);
    }

    #[test]
    fn answer_count_matches_rows() {
        let png = AnswerSheet::new(4).row(&[0]).row(&[1]).row(&[2]).to_png();
        let img = load_sheet_image(Some(png.as_slice())).expect("decodes");
        let sheet = detect_answers(&img, &options(Language::English), &ImageDebugWriter::disabled())
            .expect("detects");
        assert_eq!(sheet.detected_answers.chars().count(), sheet.grid.row_count());
        assert_eq!(sheet.rows.len(), 3);
    }

    #[test]
    fn parallel_invocations_agree() {
        let png = AnswerSheet::new(4).row(&[3]).row(&[0]).row(&[1]).to_png();
        let dir = tempfile::tempdir().expect("temp dir");
        let options = InterpretOptions {
            debug_dir: Some(dir.path().to_path_buf()),
            ..options(Language::English)
        };

        let results = (0..8)
            .into_par_iter()
            .map(|_| interpret_answer_sheet(Some(png.as_slice()), "DAB", &options).expect("graded"))
            .collect::<Vec<DetectionResult>>();

        let mut paths = results
            .iter()
            .map(|r| r.diagnostic_artifact_ref.clone().expect("artifact written"))
            .collect::<Vec<PathBuf>>();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
        for result in &results {
            assert_eq!(result.detected_answers, "DAB");
            assert_eq!(result.correct_count, 3);
        }
    }

    #[test]
    fn debug_images_do_not_change_results() {
        let png = AnswerSheet::new(4).row(&[1]).row(&[3]).to_png();
        let dir = tempfile::tempdir().expect("temp dir");
        let with_debug = InterpretOptions {
            debug_dir: Some(dir.path().to_path_buf()),
            ..options(Language::English)
        };

        let plain = interpret_answer_sheet(Some(png.as_slice()), "BD", &options(Language::English))
            .expect("graded");
        let debugged = interpret_answer_sheet(Some(png.as_slice()), "BD", &with_debug).expect("graded");
        assert_eq!(plain.detected_answers, debugged.detected_answers);

        let mask_path = debugged.diagnostic_artifact_ref.expect("mask written");
        assert!(mask_path.exists());
        assert!(crate::debug::debug_image_path(&mask_path, "bubbles").exists());
    }
}
