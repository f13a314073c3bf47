use imageproc::point::Point;
use imageproc::rect::Rect;

pub fn center_of_rect(rect: &Rect) -> Point<f32> {
    Point::new(
        rect.left() as f32 + rect.width() as f32 / 2.0,
        rect.top() as f32 + rect.height() as f32 / 2.0,
    )
}

/// `2 * center.x` of a rect, exact in integers.
pub fn doubled_center_x(rect: &Rect) -> i64 {
    2 * rect.left() as i64 + rect.width() as i64
}

/// `2 * center.y` of a rect, exact in integers.
pub fn doubled_center_y(rect: &Rect) -> i64 {
    2 * rect.top() as i64 + rect.height() as i64
}

/// Gets the smallest rect containing every point of a contour. Sizes are
/// inclusive of both edge pixels, so a single point has size 1x1.
pub fn contour_bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Some(
        Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32),
    )
}

/// Median of the given values, taking the lower middle for even counts.
pub fn median(values: &mut [u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[(values.len() - 1) / 2])
}
