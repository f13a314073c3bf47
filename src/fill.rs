use image::GrayImage;
use imageproc::{drawing::draw_polygon_mut, point::Point, rect::Rect};
use log::debug;
use logging_timer::time;

use crate::{
    grid::Grid,
    image_utils::{count_pixels, BLACK, WHITE},
    types::{Region, RowOutcome},
};

/// A bubble together with the number of ink pixels inside its contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredBubble {
    pub bounds: Rect,
    pub coverage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredRow {
    pub bubbles: Vec<ScoredBubble>,
    pub outcome: RowOutcome,
}

impl ScoredRow {
    pub fn winner(&self) -> Option<&ScoredBubble> {
        match self.outcome {
            RowOutcome::Marked(index) => self.bubbles.get(index),
            RowOutcome::NoAnswer => None,
        }
    }
}

/// Renders a region's contour, filled, onto a canvas the size of its
/// bounding box.
pub fn contour_mask(region: &Region) -> GrayImage {
    let bounds = region.bounds;
    let mut shape = GrayImage::from_pixel(bounds.width(), bounds.height(), BLACK);
    let mut polygon = region
        .contour
        .iter()
        .map(|p| Point::new(p.x - bounds.left(), p.y - bounds.top()))
        .collect::<Vec<Point<i32>>>();

    // polygons must not be explicitly closed
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    match polygon.as_slice() {
        [] => {}
        [point] => {
            if point.x >= 0 && point.y >= 0 {
                shape.put_pixel(point.x as u32, point.y as u32, WHITE);
            }
        }
        _ => draw_polygon_mut(&mut shape, &polygon, WHITE),
    }

    shape
}

/// Counts the ink pixels of `mask` that fall inside the region's contour.
/// Pixels inside the bounding box but outside the contour never count.
pub fn coverage_count(region: &Region, mask: &GrayImage) -> u32 {
    let shape = contour_mask(region);
    let left = region.bounds.left();
    let top = region.bounds.top();

    let covered = GrayImage::from_fn(shape.width(), shape.height(), |x, y| {
        let mask_x = left + x as i32;
        let mask_y = top + y as i32;
        let in_mask = mask_x >= 0
            && mask_y >= 0
            && (mask_x as u32) < mask.width()
            && (mask_y as u32) < mask.height();
        if in_mask
            && *shape.get_pixel(x, y) == WHITE
            && *mask.get_pixel(mask_x as u32, mask_y as u32) == WHITE
        {
            WHITE
        } else {
            BLACK
        }
    });

    count_pixels(&covered, &WHITE)
}

/// Picks the most filled option among those with at least `min_fill`
/// coverage. Coverage equal to the floor meets it. On equal coverage the
/// leftmost option wins: a later option must be strictly greater to
/// replace the current best.
pub fn select_winner(coverages: &[u32], min_fill: u32) -> RowOutcome {
    let mut best: Option<(u32, usize)> = None;
    for (index, &coverage) in coverages.iter().enumerate() {
        if coverage < min_fill {
            continue;
        }
        if best.map_or(true, |(best_coverage, _)| coverage > best_coverage) {
            best = Some((coverage, index));
        }
    }

    match best {
        Some((_, index)) => RowOutcome::Marked(index),
        None => RowOutcome::NoAnswer,
    }
}

pub fn score_row(row: &[Region], mask: &GrayImage, min_fill: u32) -> ScoredRow {
    let bubbles = row
        .iter()
        .map(|region| ScoredBubble {
            bounds: region.bounds,
            coverage: coverage_count(region, mask),
        })
        .collect::<Vec<ScoredBubble>>();
    let coverages = bubbles.iter().map(|b| b.coverage).collect::<Vec<u32>>();
    let outcome = select_winner(&coverages, min_fill);
    ScoredRow { bubbles, outcome }
}

#[time]
/// Scores every row of the grid against the binary mask.
pub fn score_grid(grid: &Grid, mask: &GrayImage, min_fill: u32) -> Vec<ScoredRow> {
    grid.rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let scored = score_row(row, mask, min_fill);
            debug!(
                "question {}: coverage {:?} -> {:?}",
                i + 1,
                scored.bubbles.iter().map(|b| b.coverage).collect::<Vec<u32>>(),
                scored.outcome
            );
            scored
        })
        .collect()
}
