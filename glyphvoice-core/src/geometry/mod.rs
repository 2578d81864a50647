//! Geometry normalization and shape scoring

mod normalize;
mod shape;

pub use normalize::{normalize_to_unit_box, resample};
pub use shape::{score_shape, ShapeWeights, TRIVIAL_PATH_SCORE};
