use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use log::debug;
use logging_timer::time;

use crate::{geometry::contour_bounding_rect, sheet::SheetGeometry, types::Region};

#[time]
/// Finds the outermost ink contours in a binary mask whose bounding boxes
/// have the size and shape of a bubble. Contours nested inside another
/// contour are never reported.
pub fn find_bubble_regions(geometry: &SheetGeometry, mask: &GrayImage) -> Vec<Region> {
    let contours = find_contours::<i32>(mask);
    let total = contours.len();
    let regions = contours
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| {
            let bounds = contour_bounding_rect(&contour.points)?;
            if geometry.rect_could_be_bubble(&bounds) {
                Some(Region::new(bounds, contour.points))
            } else {
                None
            }
        })
        .collect::<Vec<Region>>();

    debug!(
        "found {} bubble candidates among {} contours",
        regions.len(),
        total
    );
    regions
}
