use log::debug;
use logging_timer::time;

use crate::{geometry::median, sheet::RowGrouping, types::Region};

/// Bubbles arranged into question rows, each ordered left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<Region>>,
}

impl Grid {
    pub fn rows(&self) -> &[Vec<Region>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.rows.iter().flatten()
    }
}

/// Sorts bubble regions top-to-bottom, then groups them into rows of at
/// most `options_per_question` bubbles sorted left-to-right.
///
/// Both phases use stable sorts. The vertical phase breaks ties on the
/// horizontal center, so any ordering of the same set of distinct regions
/// gives the same grid; regions with identical bounds keep the order they
/// were detected in. When the region count is not a multiple of
/// `options_per_question` the last row is shorter.
#[time]
pub fn sort_into_grid(
    mut regions: Vec<Region>,
    options_per_question: usize,
    grouping: RowGrouping,
) -> Grid {
    let options_per_question = options_per_question.max(1);
    regions.sort_by_key(|region| (region.center_y2(), region.center_x2()));

    let rows = match grouping {
        RowGrouping::FixedChunks => split_into_questions(&regions, options_per_question),
        RowGrouping::Clustered => cluster_visual_rows(regions)
            .into_iter()
            .flat_map(|mut visual_row| {
                visual_row.sort_by_key(|region| region.center_x2());
                split_into_questions(&visual_row, options_per_question)
            })
            .collect(),
    };

    if let Some(last) = rows.last() {
        if last.len() < options_per_question {
            debug!(
                "last row has {} of {} bubbles",
                last.len(),
                options_per_question
            );
        }
    }

    Grid { rows }
}

/// Chunks vertically sorted regions into questions, sorting each chunk by
/// horizontal center.
fn split_into_questions(regions: &[Region], options_per_question: usize) -> Vec<Vec<Region>> {
    regions
        .chunks(options_per_question)
        .map(|chunk| {
            let mut row = chunk.to_vec();
            row.sort_by_key(|region| region.center_x2());
            row
        })
        .collect()
}

/// Groups vertically sorted regions into visual rows. A region starts a new
/// row when its center lies more than half the median bubble height below
/// the center of the current row's first region.
fn cluster_visual_rows(regions: Vec<Region>) -> Vec<Vec<Region>> {
    let mut heights = regions
        .iter()
        .map(|region| region.bounds.height())
        .collect::<Vec<u32>>();
    // in doubled coordinates, half a height is one height
    let tolerance = median(&mut heights).unwrap_or_default() as i64;

    let mut visual_rows: Vec<Vec<Region>> = vec![];
    for region in regions {
        match visual_rows.last_mut() {
            Some(row) if region.center_y2() - row[0].center_y2() <= tolerance => row.push(region),
            _ => visual_rows.push(vec![region]),
        }
    }

    debug!("clustered bubbles into {} visual rows", visual_rows.len());
    visual_rows
}
