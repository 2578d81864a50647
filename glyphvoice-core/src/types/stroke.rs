//! Stroke geometry types: points, bounds, reference strokes, drawn samples

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// A 2D point in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned bounding rectangle of a point sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Compute the bounds of a point sequence, `None` for an empty sequence
    pub fn of(points: &[Point]) -> Option<BoundingBox> {
        let first = points.first()?;
        let mut bounds = BoundingBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Width over height; 0 when the box has no height
    pub fn aspect_ratio(&self) -> f64 {
        if self.height() <= f64::EPSILON {
            0.0
        } else {
            self.width() / self.height()
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Category of an expected stroke shape
///
/// Basic categories (horizontal, vertical, dot) get wider position
/// tolerance and a scoring weight profile that emphasizes shape and
/// direction over exact placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCategory {
    /// Straight left-to-right stroke
    Horizontal,
    /// Straight top-to-bottom stroke
    Vertical,
    /// Slanted straight stroke
    Diagonal,
    /// Short press stroke
    Dot,
    /// Stroke ending in a hooked tail
    Hook,
    /// Multi-segment stroke with one or more turns
    Compound,
}

impl StrokeCategory {
    /// Whether this is a basic single-segment shape
    pub fn is_basic(&self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical | Self::Dot)
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
            Self::Dot => "dot",
            Self::Hook => "hook",
            Self::Compound => "compound",
        }
    }
}

impl std::fmt::Display for StrokeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable reference data for one stroke of a character
///
/// Loaded once per character from the character definition and read-only
/// afterwards. `order` is 1-based and unique within a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedStroke {
    /// 1-based position within the character's stroke order
    pub order: u32,
    /// Shape category, drives scoring weights and tolerances
    pub category: StrokeCategory,
    /// The word the user must say while drawing this stroke
    pub name: String,
    /// Ideal path in canvas coordinates
    pub path: Vec<Point>,
    /// Bounding rectangle of `path`
    pub bounds: BoundingBox,
}

impl ExpectedStroke {
    /// Build a reference stroke, deriving its bounds
    ///
    /// Rejects an empty path: a reference stroke with no geometry cannot
    /// be scored against.
    pub fn new(
        order: u32,
        category: StrokeCategory,
        name: impl Into<String>,
        path: Vec<Point>,
    ) -> Result<Self, SessionError> {
        let bounds = BoundingBox::of(&path).ok_or(SessionError::EmptyReferencePath(order))?;
        Ok(Self {
            order,
            category,
            name: name.into(),
            path,
            bounds,
        })
    }
}

/// One user attempt at drawing a stroke
///
/// Created when the user lifts the pen; discarded after scoring, or
/// immediately if it contains no points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnStrokeSample {
    /// 1-based index of the expected stroke being attempted
    pub index: u32,
    /// Captured pen path
    pub points: Vec<Point>,
    /// Pen-down time, session-relative milliseconds
    pub started_ms: u64,
    /// Pen-up time, session-relative milliseconds
    pub ended_ms: u64,
}

impl DrawnStrokeSample {
    pub fn new(index: u32, points: Vec<Point>, started_ms: u64, ended_ms: u64) -> Self {
        Self {
            index,
            points,
            started_ms,
            ended_ms,
        }
    }

    /// An empty sample is an invalid attempt and must never be scored
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
