//! Feature type definition for Geodelta schemas.

use super::attribute::AttributeDescriptor;
use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::types::DataType;
use crate::value::Value;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// A feature type: the schema shared by all features of one kind.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureType {
    /// Type name.
    name: String,
    /// Attribute definitions.
    attributes: Vec<AttributeDescriptor>,
    /// Name of the default geometry attribute.
    default_geometry: Option<String>,
}

impl FeatureType {
    /// Returns the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes.
    #[inline]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Gets an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Returns the name of the default geometry attribute.
    pub fn default_geometry(&self) -> Option<&str> {
        self.default_geometry.as_deref()
    }

    /// Returns the reference system of the default geometry.
    pub fn crs(&self) -> Option<&Crs> {
        self.default_geometry
            .as_deref()
            .and_then(|name| self.attribute(name))
            .and_then(AttributeDescriptor::crs)
    }

    /// Returns the declared reference system of `attribute`, falling back to the
    /// default geometry's when the attribute is not itself a geometry.
    pub fn crs_of(&self, attribute: &str) -> Option<&Crs> {
        match self.attribute(attribute) {
            Some(attr) if attr.is_geometry() => attr.crs(),
            _ => self.crs(),
        }
    }

    /// Returns the geometry attributes.
    pub fn geometry_attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes.iter().filter(|a| a.is_geometry())
    }

    /// Checks that `value` may be stored in `attribute`.
    pub fn validate(&self, attribute: &str, value: &Value) -> Result<()> {
        let attr = self
            .attribute(attribute)
            .ok_or_else(|| Error::attribute_not_found(&self.name, attribute))?;
        match value.data_type() {
            None if attr.is_nullable() => Ok(()),
            None => Err(Error::invalid_argument(format!(
                "attribute {}.{} is not nullable",
                self.name, attribute
            ))),
            Some(got) if attr.data_type().accepts(got) => Ok(()),
            Some(got) => Err(Error::type_mismatch(attribute, attr.data_type(), got)),
        }
    }
}

/// Builder for creating feature types.
pub struct FeatureTypeBuilder {
    name: String,
    attributes: Vec<AttributeDescriptor>,
    default_geometry: Option<String>,
}

impl FeatureTypeBuilder {
    /// Creates a new feature type builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            attributes: Vec::new(),
            default_geometry: None,
        })
    }

    /// Validates a name follows naming rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        let first = match name.chars().next() {
            Some(c) => c,
            None => return Err(Error::invalid_schema("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Adds a descriptor.
    pub fn add(mut self, descriptor: AttributeDescriptor) -> Result<Self> {
        Self::check_naming_rules(descriptor.name())?;
        if self.attributes.iter().any(|a| a.name() == descriptor.name()) {
            return Err(Error::invalid_schema(format!(
                "Attribute already exists: {}",
                descriptor.name()
            )));
        }
        if descriptor.data_type() == DataType::Envelope {
            return Err(Error::invalid_schema(format!(
                "Envelope is not a storable attribute type: {}",
                descriptor.name()
            )));
        }
        // The first geometry becomes the default one.
        if descriptor.is_geometry() && self.default_geometry.is_none() {
            self.default_geometry = Some(descriptor.name().into());
        }
        self.attributes.push(descriptor);
        Ok(self)
    }

    /// Adds a plain attribute.
    pub fn add_attribute(self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        self.add(AttributeDescriptor::new(name, data_type))
    }

    /// Adds a geometry attribute declared in `crs`.
    pub fn add_geometry(self, name: impl Into<String>, crs: Crs) -> Result<Self> {
        self.add(AttributeDescriptor::geometry(name, crs))
    }

    /// Marks attributes as non-nullable.
    pub fn add_non_nullable(mut self, names: &[&str]) -> Self {
        for name in names {
            if let Some(attr) = self.attributes.iter_mut().find(|a| a.name() == *name) {
                *attr = attr.clone().nullable(false);
            }
        }
        self
    }

    /// Selects the default geometry attribute.
    pub fn set_default_geometry(mut self, name: &str) -> Result<Self> {
        match self.attributes.iter().find(|a| a.name() == name) {
            Some(attr) if attr.is_geometry() => {
                self.default_geometry = Some(name.into());
                Ok(self)
            }
            Some(_) => Err(Error::invalid_schema(format!(
                "Default geometry must be a geometry attribute: {}",
                name
            ))),
            None => Err(Error::invalid_schema(format!("Attribute not found: {}", name))),
        }
    }

    /// Builds the feature type.
    pub fn build(self) -> Result<FeatureType> {
        if self.attributes.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Feature type {} declares no attribute",
                self.name
            )));
        }
        Ok(FeatureType {
            name: self.name,
            attributes: self.attributes,
            default_geometry: self.default_geometry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;

    fn road() -> FeatureType {
        FeatureTypeBuilder::new("road")
            .unwrap()
            .add_attribute("status", DataType::String)
            .unwrap()
            .add_attribute("lanes", DataType::Int64)
            .unwrap()
            .add_geometry("geom", Crs::new("EPSG:4326"))
            .unwrap()
            .add_geometry("label_point", Crs::new("LOCAL:1"))
            .unwrap()
            .add_non_nullable(&["lanes"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder() {
        let ft = road();
        assert_eq!(ft.name(), "road");
        assert_eq!(ft.attributes().len(), 4);
        assert_eq!(ft.default_geometry(), Some("geom"));
        assert_eq!(ft.crs(), Some(&Crs::new("EPSG:4326")));
        assert_eq!(ft.geometry_attributes().count(), 2);
    }

    #[test]
    fn test_crs_of() {
        let ft = road();
        assert_eq!(ft.crs_of("label_point"), Some(&Crs::new("LOCAL:1")));
        assert_eq!(ft.crs_of("status"), Some(&Crs::new("EPSG:4326")));
        assert_eq!(ft.crs_of("unknown"), Some(&Crs::new("EPSG:4326")));
    }

    #[test]
    fn test_naming_rules() {
        assert!(FeatureTypeBuilder::new("").is_err());
        assert!(FeatureTypeBuilder::new("1road").is_err());
        assert!(FeatureTypeBuilder::new("road-x").is_err());
        assert!(FeatureTypeBuilder::new("_road").is_ok());
    }

    #[test]
    fn test_duplicate_attribute() {
        let result = FeatureTypeBuilder::new("road")
            .unwrap()
            .add_attribute("a", DataType::String)
            .unwrap()
            .add_attribute("a", DataType::Int64);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_default_geometry() {
        let ft = FeatureTypeBuilder::new("poi")
            .unwrap()
            .add_geometry("a", Crs::new("A"))
            .unwrap()
            .add_geometry("b", Crs::new("B"))
            .unwrap()
            .set_default_geometry("b")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(ft.crs(), Some(&Crs::new("B")));

        let err = FeatureTypeBuilder::new("poi")
            .unwrap()
            .add_attribute("name", DataType::String)
            .unwrap()
            .set_default_geometry("name");
        assert!(err.is_err());
    }

    #[test]
    fn test_validate() {
        let ft = road();
        assert!(ft.validate("status", &Value::from("closed")).is_ok());
        assert!(ft.validate("status", &Value::Null).is_ok());
        assert!(ft.validate("geom", &Value::from(Geometry::point(0.0, 0.0))).is_ok());
        assert!(matches!(
            ft.validate("status", &Value::Int64(1)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(matches!(
            ft.validate("width", &Value::Int64(1)),
            Err(Error::AttributeNotFound { .. })
        ));
        assert!(matches!(
            ft.validate("lanes", &Value::Null),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_empty_type_rejected() {
        assert!(FeatureTypeBuilder::new("empty").unwrap().build().is_err());
    }
}
