//! Coordinate reference systems and coordinate operations.
//!
//! Reprojection math is deliberately small: operations are affine maps between
//! named reference systems, resolved through an `OperationFactory`.

use crate::error::{Error, Result};
use crate::geometry::Coordinate;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use hashbrown::HashMap;

/// A coordinate reference system, identified by its code (e.g. `EPSG:4326`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs(String);

impl Crs {
    /// Creates a reference system from its code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code.
    #[inline]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// A transformation of coordinates from one reference system to another.
pub trait CoordinateOperation: fmt::Debug + Send + Sync {
    /// Reference system of the input coordinates.
    fn source(&self) -> &Crs;

    /// Reference system of the output coordinates.
    fn target(&self) -> &Crs;

    /// Transforms a single coordinate.
    fn transform(&self, coordinate: Coordinate) -> Result<Coordinate>;

    /// Returns the inverse operation, if it exists.
    fn inverse(&self) -> Option<Arc<dyn CoordinateOperation>>;
}

/// Operation between a reference system and itself.
#[derive(Clone, Debug)]
pub struct IdentityOperation {
    crs: Crs,
}

impl IdentityOperation {
    pub fn new(crs: Crs) -> Self {
        Self { crs }
    }
}

impl CoordinateOperation for IdentityOperation {
    fn source(&self) -> &Crs {
        &self.crs
    }

    fn target(&self) -> &Crs {
        &self.crs
    }

    fn transform(&self, coordinate: Coordinate) -> Result<Coordinate> {
        Ok(coordinate)
    }

    fn inverse(&self) -> Option<Arc<dyn CoordinateOperation>> {
        Some(Arc::new(self.clone()))
    }
}

/// Scale-then-offset operation: `x' = x * scale_x + offset_x`, same for `y`.
#[derive(Clone, Debug)]
pub struct AffineOperation {
    source: Crs,
    target: Crs,
    scale_x: f64,
    scale_y: f64,
    offset_x: f64,
    offset_y: f64,
}

impl AffineOperation {
    /// Creates an affine operation.
    pub fn new(source: Crs, target: Crs, scale: (f64, f64), offset: (f64, f64)) -> Self {
        Self {
            source,
            target,
            scale_x: scale.0,
            scale_y: scale.1,
            offset_x: offset.0,
            offset_y: offset.1,
        }
    }

    /// Creates a pure translation.
    pub fn translation(source: Crs, target: Crs, dx: f64, dy: f64) -> Self {
        Self::new(source, target, (1.0, 1.0), (dx, dy))
    }
}

impl CoordinateOperation for AffineOperation {
    fn source(&self) -> &Crs {
        &self.source
    }

    fn target(&self) -> &Crs {
        &self.target
    }

    fn transform(&self, coordinate: Coordinate) -> Result<Coordinate> {
        let x = coordinate.x * self.scale_x + self.offset_x;
        let y = coordinate.y * self.scale_y + self.offset_y;
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::transform(format!(
                "({}, {}) has no finite image from {} to {}",
                coordinate.x, coordinate.y, self.source, self.target
            )));
        }
        Ok(Coordinate::new(x, y))
    }

    fn inverse(&self) -> Option<Arc<dyn CoordinateOperation>> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        Some(Arc::new(AffineOperation::new(
            self.target.clone(),
            self.source.clone(),
            (1.0 / self.scale_x, 1.0 / self.scale_y),
            (-self.offset_x / self.scale_x, -self.offset_y / self.scale_y),
        )))
    }
}

/// Resolves coordinate operations between reference systems.
pub trait OperationFactory: Send + Sync {
    /// Finds the operation converting coordinates from `from` into `to`.
    fn find_operation(&self, from: &Crs, to: &Crs) -> Result<Arc<dyn CoordinateOperation>>;
}

/// Operation factory backed by an explicit table of registered operations.
///
/// Equal reference systems always resolve to the identity. Registering an
/// invertible operation also registers its inverse.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: HashMap<(Crs, Crs), Arc<dyn CoordinateOperation>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Registers an operation (and its inverse when it has one).
    pub fn register(&mut self, operation: impl CoordinateOperation + 'static) {
        let operation: Arc<dyn CoordinateOperation> = Arc::new(operation);
        if let Some(inverse) = operation.inverse() {
            self.operations
                .entry((inverse.source().clone(), inverse.target().clone()))
                .or_insert(inverse);
        }
        self.operations.insert(
            (operation.source().clone(), operation.target().clone()),
            operation,
        );
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, operation: impl CoordinateOperation + 'static) -> Self {
        self.register(operation);
        self
    }

    /// Returns the number of registered operations, inverses included.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operation is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl OperationFactory for OperationRegistry {
    fn find_operation(&self, from: &Crs, to: &Crs) -> Result<Arc<dyn CoordinateOperation>> {
        if from == to {
            return Ok(Arc::new(IdentityOperation::new(from.clone())));
        }
        self.operations
            .get(&(from.clone(), to.clone()))
            .cloned()
            .ok_or_else(|| Error::operation_not_found(from, to))
    }
}
