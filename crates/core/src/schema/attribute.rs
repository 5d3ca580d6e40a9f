//! Attribute definition for Geodelta feature types.

use crate::crs::Crs;
use crate::types::DataType;
use alloc::string::String;

/// An attribute declared by a feature type.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDescriptor {
    /// Attribute name.
    name: String,
    /// Data type of the attribute.
    data_type: DataType,
    /// Whether this attribute allows null values.
    nullable: bool,
    /// Declared reference system, geometry attributes only.
    crs: Option<Crs>,
}

impl AttributeDescriptor {
    /// Creates a new nullable attribute.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            crs: None,
        }
    }

    /// Creates a geometry attribute declared in `crs`.
    pub fn geometry(name: impl Into<String>, crs: Crs) -> Self {
        Self::new(name, DataType::Geometry).with_crs(crs)
    }

    /// Sets whether this attribute is nullable.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn is_geometry(&self) -> bool {
        self.data_type == DataType::Geometry
    }

    /// Returns the declared reference system.
    #[inline]
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }
}
