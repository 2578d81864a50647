//! Path normalization and arc-length resampling
//!
//! Both the drawn and the reference path are mapped into unit
//! bounding-box space and resampled to a fixed point count before any
//! comparison, so paths of different scale, position and point density
//! become comparable.

use crate::types::{BoundingBox, Point};

/// Map a path into [0,1] x [0,1] using its own bounding box
///
/// A degenerate axis (zero width or zero height) collapses to 0.5 so a
/// perfectly straight stroke does not divide by zero.
pub fn normalize_to_unit_box(path: &[Point]) -> Vec<Point> {
    let Some(bounds) = BoundingBox::of(path) else {
        return Vec::new();
    };
    let width = bounds.width();
    let height = bounds.height();
    path.iter()
        .map(|p| {
            let x = if width <= f64::EPSILON {
                0.5
            } else {
                (p.x - bounds.min_x) / width
            };
            let y = if height <= f64::EPSILON {
                0.5
            } else {
                (p.y - bounds.min_y) / height
            };
            Point::new(x, y)
        })
        .collect()
}

/// Resample a path to exactly `n` points, spaced evenly along its arc length
///
/// Points are linearly interpolated between the original samples. A path
/// with (near-)zero total length replicates its first point.
pub fn resample(path: &[Point], n: usize) -> Vec<Point> {
    if path.is_empty() || n == 0 {
        return Vec::new();
    }
    if path.len() == 1 || n == 1 {
        return vec![path[0]; n];
    }

    // Cumulative arc length up to each original point
    let mut cumulative: Vec<f64> = Vec::with_capacity(path.len());
    cumulative.push(0.0);
    for i in 1..path.len() {
        let prev = cumulative[i - 1];
        cumulative.push(prev + path[i - 1].distance_to(&path[i]));
    }
    let total = *cumulative.last().unwrap_or(&0.0);
    if total < 1e-9 {
        return vec![path[0]; n];
    }

    let mut out: Vec<Point> = Vec::with_capacity(n);
    let mut seg = 1;
    for i in 0..n {
        let target = (i as f64 / (n - 1) as f64) * total;
        while seg < cumulative.len() - 1 && cumulative[seg] < target {
            seg += 1;
        }
        let span = (cumulative[seg] - cumulative[seg - 1]).max(1e-9);
        let t = ((target - cumulative[seg - 1]) / span).clamp(0.0, 1.0);
        let a = path[seg - 1];
        let b = path[seg];
        out.push(Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y)));
    }
    out
}
