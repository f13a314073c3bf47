//! Synthetic answer sheets for tests.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat};
use imageproc::drawing::draw_filled_circle_mut;

use crate::image_utils::{BLACK, WHITE};

const MARGIN: i32 = 100;
const SPACING: i32 = 100;
const OUTLINE_WIDTH: i32 = 5;

/// Encodes a grayscale image as an RGB PNG, the way a phone photo arrives.
pub fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(DynamicImage::ImageLuma8(img.clone()).to_rgb8())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("png encodes");
    bytes
}

/// A white sheet with rows of bubbles spaced `SPACING` pixels apart.
/// Marked bubbles are solid discs; unmarked ones are printed outlines.
pub struct AnswerSheet {
    options: usize,
    columns: usize,
    radius: i32,
    rows: Vec<(usize, Vec<usize>)>,
}

impl AnswerSheet {
    pub fn new(options: usize) -> Self {
        Self {
            options,
            columns: 1,
            radius: 30,
            rows: vec![],
        }
    }

    /// Places this many questions side by side in every visual row.
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn bubble_radius(mut self, radius: i32) -> Self {
        self.radius = radius;
        self
    }

    /// Adds a row of questions with the given options marked.
    pub fn row(mut self, marked: &[usize]) -> Self {
        self.rows.push((self.options, marked.to_vec()));
        self
    }

    /// Adds a row with only the first `bubbles` options printed.
    pub fn partial_row(mut self, bubbles: usize, marked: &[usize]) -> Self {
        self.rows.push((bubbles, marked.to_vec()));
        self
    }

    fn bubble_x(&self, column: usize, option: usize) -> i32 {
        MARGIN + ((column * (self.options + 1) + option) as i32) * SPACING
    }

    pub fn to_image(&self) -> GrayImage {
        let width = self.bubble_x(self.columns.max(1) - 1, self.options.max(1) - 1) + MARGIN;
        let height = 2 * MARGIN + (self.rows.len().max(1) as i32 - 1) * SPACING;
        let mut img = GrayImage::from_pixel(width as u32, height as u32, WHITE);

        for (row, (bubbles, marked)) in self.rows.iter().enumerate() {
            let y = MARGIN + row as i32 * SPACING;
            for column in 0..self.columns {
                for option in 0..*bubbles {
                    let center = (self.bubble_x(column, option), y);
                    draw_filled_circle_mut(&mut img, center, self.radius, BLACK);
                    if !marked.contains(&option) && self.radius > OUTLINE_WIDTH {
                        draw_filled_circle_mut(&mut img, center, self.radius - OUTLINE_WIDTH, WHITE);
                    }
                }
            }
        }

        img
    }

    pub fn to_png(&self) -> Vec<u8> {
        encode_png(&self.to_image())
    }
}
