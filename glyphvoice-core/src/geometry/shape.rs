//! Shape-accuracy scoring
//!
//! Compares a drawn path against a reference path after both have been
//! normalized and resampled, combining four sub-metrics (shape,
//! direction, position, proportion) with category-dependent weights.

use crate::config::ScoringConfig;
use crate::types::{BoundingBox, Point, StrokeCategory};

use super::normalize::{normalize_to_unit_box, resample};

/// Score returned when either path has fewer than two points
///
/// Low but nonzero: a trivial path is still an attempt, distinct from
/// no attempt at all.
pub const TRIVIAL_PATH_SCORE: f64 = 10.0;

/// Vectors shorter than this are treated as having no direction
const EPS_LEN: f64 = 1e-6;

/// Half-width of the index window used in the nearest-point search
const LOCAL_WINDOW: usize = 5;

/// Unit-box diagonal, the largest possible point distance after normalization
const MAX_UNIT_DISTANCE: f64 = std::f64::consts::SQRT_2;

/// Per-category weighting of the four sub-metrics
///
/// Weights always sum to 1.0. Basic straight strokes weight shape and
/// direction higher and placement lower; anything with turns uses the
/// balanced default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeWeights {
    pub shape: f64,
    pub direction: f64,
    pub position: f64,
    pub proportion: f64,
}

impl ShapeWeights {
    /// Weights for a stroke category
    pub fn for_category(category: StrokeCategory) -> Self {
        if category.is_basic() {
            Self {
                shape: 0.40,
                direction: 0.30,
                position: 0.15,
                proportion: 0.15,
            }
        } else {
            Self {
                shape: 0.35,
                direction: 0.25,
                position: 0.25,
                proportion: 0.15,
            }
        }
    }
}

/// Score how closely a drawn path matches the reference path, [0, 100]
///
/// Pure function, safe to call from a blocking worker. Fewer than two
/// points on either side yields [`TRIVIAL_PATH_SCORE`].
pub fn score_shape(
    drawn: &[Point],
    expected: &[Point],
    category: StrokeCategory,
    config: &ScoringConfig,
) -> f64 {
    if drawn.len() < 2 || expected.len() < 2 {
        return TRIVIAL_PATH_SCORE;
    }

    let drawn_norm = resample(&normalize_to_unit_box(drawn), config.resample_points);
    let expected_norm = resample(&normalize_to_unit_box(expected), config.resample_points);

    let shape = shape_similarity(&drawn_norm, &expected_norm, config.shape_tolerance);
    let direction = direction_similarity(&drawn_norm, &expected_norm);
    let mut position = position_accuracy(&drawn_norm, &expected_norm, category);
    let proportion = proportion_similarity(drawn, expected);

    let weights = ShapeWeights::for_category(category);
    if category.is_basic() && position < 0.5 {
        // Simple strokes are easy to offset slightly; soften the penalty
        position += (0.5 - position) * 0.5;
    }

    let combined = weights.shape * shape
        + weights.direction * direction
        + weights.position * position
        + weights.proportion * proportion;
    (combined * 100.0).clamp(0.0, 100.0)
}

/// Mean windowed nearest-point distance, converted to a [0,1] similarity
fn shape_similarity(drawn: &[Point], expected: &[Point], tolerance: f64) -> f64 {
    if drawn.is_empty() || expected.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for (i, p) in drawn.iter().enumerate() {
        let lo = i.saturating_sub(LOCAL_WINDOW);
        let hi = (i + LOCAL_WINDOW + 1).min(expected.len());
        // The window can only be empty if lo >= len; clamp to the tail
        let lo = lo.min(expected.len() - 1);
        let mut min_dist = f64::MAX;
        for q in &expected[lo..hi.max(lo + 1)] {
            min_dist = min_dist.min(p.distance_to(q));
        }
        total += min_dist;
    }
    let avg = total / drawn.len() as f64;
    (1.0 - avg / (MAX_UNIT_DISTANCE * tolerance)).clamp(0.0, 1.0)
}

/// Cosine similarity of the start-to-end vectors, remapped to [0,1]
fn direction_similarity(drawn: &[Point], expected: &[Point]) -> f64 {
    let dv = end_vector(drawn);
    let ev = end_vector(expected);
    let d_len = (dv.0 * dv.0 + dv.1 * dv.1).sqrt();
    let e_len = (ev.0 * ev.0 + ev.1 * ev.1).sqrt();

    match (d_len < EPS_LEN, e_len < EPS_LEN) {
        // Two stationary strokes point the same way by convention
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => {
            let cosine = (dv.0 * ev.0 + dv.1 * ev.1) / (d_len * e_len);
            (cosine + 1.0) / 2.0
        }
    }
}

fn end_vector(path: &[Point]) -> (f64, f64) {
    match (path.first(), path.last()) {
        (Some(a), Some(b)) => (b.x - a.x, b.y - a.y),
        _ => (0.0, 0.0),
    }
}

/// Start- and end-point placement accuracy in normalized space
///
/// Straight horizontal strokes measure only vertical displacement and
/// vertical strokes only horizontal, so minor overshoot along the
/// stroke's own axis is not punished twice.
fn position_accuracy(drawn: &[Point], expected: &[Point], category: StrokeCategory) -> f64 {
    let (Some(ds), Some(de)) = (drawn.first(), drawn.last()) else {
        return 0.0;
    };
    let (Some(es), Some(ee)) = (expected.first(), expected.last()) else {
        return 0.0;
    };

    let tolerance = if category.is_basic() { 0.5 } else { 0.3 };
    let displacement = |a: &Point, b: &Point| match category {
        StrokeCategory::Horizontal => (a.y - b.y).abs(),
        StrokeCategory::Vertical => (a.x - b.x).abs(),
        _ => a.distance_to(b),
    };

    let start = (1.0 - displacement(ds, es) / tolerance).clamp(0.0, 1.0);
    let end = (1.0 - displacement(de, ee) / tolerance).clamp(0.0, 1.0);
    (start + end) / 2.0
}

/// Ratio of the smaller to the larger bounding-box aspect ratio
fn proportion_similarity(drawn: &[Point], expected: &[Point]) -> f64 {
    let (Some(db), Some(eb)) = (BoundingBox::of(drawn), BoundingBox::of(expected)) else {
        return 0.0;
    };
    let da = db.width() / db.height().max(EPS_LEN);
    let ea = eb.width() / eb.height().max(EPS_LEN);
    if da < EPS_LEN && ea < EPS_LEN {
        return 1.0;
    }
    let larger = da.max(ea);
    if larger < EPS_LEN {
        return 1.0;
    }
    (da.min(ea) / larger).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScoringConfig {
        ScoringConfig::default()
    }

    fn horizontal_line() -> Vec<Point> {
        (0..12).map(|i| Point::new(i as f64 * 10.0, 50.0)).collect()
    }

    fn vertical_line() -> Vec<Point> {
        (0..12).map(|i| Point::new(50.0, i as f64 * 10.0)).collect()
    }

    fn hook_path() -> Vec<Point> {
        // Down, then a short tail to the left
        let mut path: Vec<Point> = (0..10).map(|i| Point::new(60.0, i as f64 * 12.0)).collect();
        path.push(Point::new(45.0, 115.0));
        path.push(Point::new(35.0, 108.0));
        path
    }

    #[test]
    fn score_is_bounded() {
        let cases = vec![
            (horizontal_line(), vertical_line(), StrokeCategory::Vertical),
            (vertical_line(), hook_path(), StrokeCategory::Hook),
            (hook_path(), horizontal_line(), StrokeCategory::Horizontal),
        ];
        for (drawn, expected, category) in cases {
            let score = score_shape(&drawn, &expected, category, &config());
            assert!((0.0..=100.0).contains(&score), "score was {score}");
        }
    }

    #[test]
    fn identical_paths_score_near_perfect() {
        let path = hook_path();
        let score = score_shape(&path, &path, StrokeCategory::Hook, &config());
        assert!(score >= 99.0, "score was {score}");
    }

    #[test]
    fn identical_basic_paths_score_near_perfect() {
        let path = horizontal_line();
        let score = score_shape(&path, &path, StrokeCategory::Horizontal, &config());
        assert!(score >= 99.0, "score was {score}");
    }

    #[test]
    fn trivial_drawn_path_gets_fixed_low_score() {
        let drawn = vec![Point::new(1.0, 1.0)];
        let score = score_shape(&drawn, &horizontal_line(), StrokeCategory::Horizontal, &config());
        assert_eq!(score, TRIVIAL_PATH_SCORE);
    }

    #[test]
    fn trivial_expected_path_gets_fixed_low_score() {
        let expected = vec![Point::new(1.0, 1.0)];
        let score = score_shape(&horizontal_line(), &expected, StrokeCategory::Dot, &config());
        assert_eq!(score, TRIVIAL_PATH_SCORE);
    }

    #[test]
    fn scoring_is_scale_invariant() {
        let drawn = hook_path();
        let expected = vertical_line();
        let scale = |path: &[Point]| -> Vec<Point> {
            path.iter().map(|p| Point::new(p.x * 7.5, p.y * 7.5)).collect()
        };
        let base = score_shape(&drawn, &expected, StrokeCategory::Hook, &config());
        let scaled = score_shape(&scale(&drawn), &scale(&expected), StrokeCategory::Hook, &config());
        assert!((base - scaled).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_translation_invariant() {
        let drawn = hook_path();
        let expected = vertical_line();
        let shift = |path: &[Point]| -> Vec<Point> {
            path.iter()
                .map(|p| Point::new(p.x + 300.0, p.y - 120.0))
                .collect()
        };
        let base = score_shape(&drawn, &expected, StrokeCategory::Hook, &config());
        let shifted = score_shape(&shift(&drawn), &shift(&expected), StrokeCategory::Hook, &config());
        assert!((base - shifted).abs() < 1e-9);
    }

    #[test]
    fn perpendicular_stroke_scores_much_lower_than_parallel() {
        let expected = horizontal_line();
        let good = score_shape(&horizontal_line(), &expected, StrokeCategory::Horizontal, &config());
        let bad = score_shape(&vertical_line(), &expected, StrokeCategory::Horizontal, &config());
        assert!(good > bad + 20.0, "good {good}, bad {bad}");
    }

    #[test]
    fn reversed_direction_is_penalized() {
        let expected = horizontal_line();
        let mut reversed = horizontal_line();
        reversed.reverse();
        let forward = score_shape(&horizontal_line(), &expected, StrokeCategory::Horizontal, &config());
        let backward = score_shape(&reversed, &expected, StrokeCategory::Horizontal, &config());
        assert!(forward > backward, "forward {forward}, backward {backward}");
    }

    #[test]
    fn weights_sum_to_one() {
        for category in [
            StrokeCategory::Horizontal,
            StrokeCategory::Vertical,
            StrokeCategory::Diagonal,
            StrokeCategory::Dot,
            StrokeCategory::Hook,
            StrokeCategory::Compound,
        ] {
            let w = ShapeWeights::for_category(category);
            let sum = w.shape + w.direction + w.position + w.proportion;
            assert!((sum - 1.0).abs() < 1e-12, "{category}: {sum}");
        }
    }

    #[test]
    fn noisy_copy_still_scores_well() {
        let expected = hook_path();
        // Same path with small deterministic jitter
        let drawn: Vec<Point> = expected
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let wobble = if i % 2 == 0 { 1.5 } else { -1.5 };
                Point::new(p.x + wobble, p.y + wobble * 0.5)
            })
            .collect();
        let score = score_shape(&drawn, &expected, StrokeCategory::Hook, &config());
        assert!(score > 80.0, "score was {score}");
    }
}
