//! Planar geometries and envelopes.

use crate::crs::{CoordinateOperation, Crs};
use crate::error::{Error, Result};
use alloc::vec::Vec;

/// A 2D coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Shape of a geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Exterior ring only.
    Polygon(Vec<Coordinate>),
}

impl Shape {
    /// Returns all coordinates of the shape.
    pub fn coordinates(&self) -> &[Coordinate] {
        match self {
            Shape::Point(c) => core::slice::from_ref(c),
            Shape::LineString(cs) | Shape::Polygon(cs) => cs,
        }
    }

    fn map(&self, mut f: impl FnMut(Coordinate) -> Result<Coordinate>) -> Result<Shape> {
        Ok(match self {
            Shape::Point(c) => Shape::Point(f(*c)?),
            Shape::LineString(cs) => {
                Shape::LineString(cs.iter().map(|c| f(*c)).collect::<Result<Vec<_>>>()?)
            }
            Shape::Polygon(cs) => {
                Shape::Polygon(cs.iter().map(|c| f(*c)).collect::<Result<Vec<_>>>()?)
            }
        })
    }
}

/// A geometry value, optionally tagged with its reference system.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    shape: Shape,
    crs: Option<Crs>,
}

impl Geometry {
    /// Creates an untagged geometry.
    pub fn new(shape: Shape) -> Self {
        Self { shape, crs: None }
    }

    /// Creates an untagged point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Shape::Point(Coordinate::new(x, y)))
    }

    /// Creates an untagged line string.
    pub fn line_string(coordinates: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self::new(Shape::LineString(
            coordinates
                .into_iter()
                .map(|(x, y)| Coordinate::new(x, y))
                .collect(),
        ))
    }

    /// Returns a copy tagged with `crs`, coordinates untouched.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Returns the bounding envelope, tagged with the same reference system.
    pub fn envelope(&self) -> Option<Envelope> {
        let mut coords = self.shape.coordinates().iter();
        let first = coords.next()?;
        let mut env = Envelope::new(first.x, first.y, first.x, first.y);
        for c in coords {
            env.expand_to_include(*c);
        }
        env.crs = self.crs.clone();
        Some(env)
    }

    /// Reprojects every coordinate with `operation` and tags the result with its target.
    pub fn transform(&self, operation: &dyn CoordinateOperation) -> Result<Geometry> {
        if let Some(crs) = &self.crs {
            if crs != operation.source() {
                return Err(Error::transform(alloc::format!(
                    "geometry is in {}, operation expects {}",
                    crs,
                    operation.source()
                )));
            }
        }
        Ok(Geometry {
            shape: self.shape.map(|c| operation.transform(c))?,
            crs: Some(operation.target().clone()),
        })
    }
}

/// An axis-aligned bounding box, optionally tagged with its reference system.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    crs: Option<Crs>,
}

impl Envelope {
    /// Creates an untagged envelope.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    #[inline]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Grows the envelope to contain `coordinate`.
    pub fn expand_to_include(&mut self, coordinate: Coordinate) {
        self.min_x = self.min_x.min(coordinate.x);
        self.min_y = self.min_y.min(coordinate.y);
        self.max_x = self.max_x.max(coordinate.x);
        self.max_y = self.max_y.max(coordinate.y);
    }

    /// Returns the smallest envelope containing both. Keeps this envelope's tag.
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            crs: self.crs.clone().or_else(|| other.crs.clone()),
        }
    }

    /// Returns true if the two boxes share at least one point. Tags are ignored.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Reprojects the four corners and returns their bounds in the target system.
    pub fn transform(&self, operation: &dyn CoordinateOperation) -> Result<Envelope> {
        let corners = [
            Coordinate::new(self.min_x, self.min_y),
            Coordinate::new(self.min_x, self.max_y),
            Coordinate::new(self.max_x, self.min_y),
            Coordinate::new(self.max_x, self.max_y),
        ];
        let first = operation.transform(corners[0])?;
        let mut env = Envelope::new(first.x, first.y, first.x, first.y);
        for corner in &corners[1..] {
            env.expand_to_include(operation.transform(*corner)?);
        }
        env.crs = Some(operation.target().clone());
        Ok(env)
    }
}
