//! Reprojection of attribute values into a requested reference system.

use geodelta_core::schema::FeatureType;
use geodelta_core::{Crs, Feature, OperationFactory, Result, Value};

/// Expresses a spatial value in `target`.
///
/// Coordinates are read in `declared` when it is given, whatever the value's
/// own tag says, and in the value's tag otherwise. Values with neither are
/// returned unchanged, as are non-spatial values.
pub fn reproject_value(
    value: &Value,
    declared: Option<&Crs>,
    target: &Crs,
    operations: &dyn OperationFactory,
) -> Result<Value> {
    let source = match declared.or(value.crs()) {
        Some(source) if value.is_spatial() => source.clone(),
        _ => return Ok(value.clone()),
    };
    if &source == target {
        return Ok(match value {
            Value::Geometry(g) => Value::Geometry(g.clone().with_crs(source)),
            Value::Envelope(e) => Value::Envelope(e.clone().with_crs(source)),
            other => other.clone(),
        });
    }
    let operation = operations.find_operation(&source, target)?;
    Ok(match value {
        Value::Geometry(g) => Value::Geometry(g.clone().with_crs(source).transform(&*operation)?),
        Value::Envelope(e) => Value::Envelope(e.transform(&*operation)?),
        other => other.clone(),
    })
}

/// Reprojects every geometry attribute of `feature` declared by `feature_type`.
pub fn reproject_feature(
    feature: &mut Feature,
    feature_type: &FeatureType,
    target: &Crs,
    operations: &dyn OperationFactory,
) -> Result<()> {
    for attribute in feature_type.geometry_attributes() {
        if let Some(value) = feature.get_mut(attribute.name()) {
            *value = reproject_value(value, attribute.crs(), target, operations)?;
        }
    }
    Ok(())
}
