//! Data type definitions for Geodelta feature attributes.

/// Supported attribute types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type (true/false)
    Boolean,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point number
    Float64,
    /// UTF-8 string
    String,
    /// Planar geometry tagged with a coordinate reference system
    Geometry,
    /// Bounding envelope, only used as a filter literal
    Envelope,
}

impl DataType {
    /// Returns whether values of this type carry coordinates.
    pub fn is_spatial(&self) -> bool {
        matches!(self, DataType::Geometry | DataType::Envelope)
    }

    /// Returns whether a value of type `got` may be stored in an attribute of this type.
    pub fn accepts(&self, got: DataType) -> bool {
        *self == got || (*self == DataType::Float64 && got == DataType::Int64)
    }
}
