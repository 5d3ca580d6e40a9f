//! Filter definitions for feature selection.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use geodelta_core::{Feature, FeatureId, Result, Value};

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn eval(self, left: &Value, right: &Value) -> bool {
        let ordering = left.compare(right);
        match self {
            CompareOp::Eq => left == right || ordering == Some(Ordering::Equal),
            CompareOp::Ne => !(left == right || ordering == Some(Ordering::Equal)),
            CompareOp::Lt => ordering == Some(Ordering::Less),
            CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            CompareOp::Gt => ordering == Some(Ordering::Greater),
            CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        }
    }
}

/// A selection filter over features.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Matches every feature.
    Include,
    /// Matches no feature.
    Exclude,
    /// Matches the feature with this identifier.
    Id(FeatureId),
    /// Conjunction.
    And(Vec<Filter>),
    /// Disjunction.
    Or(Vec<Filter>),
    /// Negation.
    Not(Box<Filter>),
    /// Compares an attribute to a literal.
    Compare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    /// Bounding-box intersection between a spatial attribute and a spatial literal.
    Intersects { attribute: String, value: Value },
    /// Matches features whose attribute is null or absent.
    IsNull { attribute: String },
}

impl Filter {
    /// Identifier filter.
    pub fn id(id: impl Into<FeatureId>) -> Self {
        Filter::Id(id.into())
    }

    /// OR of identifier filters.
    pub fn ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FeatureId>,
    {
        Filter::Or(ids.into_iter().map(|id| Filter::Id(id.into())).collect())
    }

    pub fn compare(attribute: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Filter::Compare {
            attribute: attribute.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(attribute, CompareOp::Eq, value)
    }

    pub fn ne(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(attribute, CompareOp::Ne, value)
    }

    pub fn lt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(attribute, CompareOp::Lt, value)
    }

    pub fn gt(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(attribute, CompareOp::Gt, value)
    }

    pub fn intersects(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Intersects {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn is_null(attribute: impl Into<String>) -> Self {
        Filter::IsNull {
            attribute: attribute.into(),
        }
    }

    /// Conjunction of two filters, flattening nested conjunctions.
    pub fn and(left: Filter, right: Filter) -> Self {
        let mut operands = Vec::new();
        for f in [left, right] {
            match f {
                Filter::And(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        Filter::And(operands)
    }

    /// Disjunction of two filters, flattening nested disjunctions.
    pub fn or(left: Filter, right: Filter) -> Self {
        let mut operands = Vec::new();
        for f in [left, right] {
            match f {
                Filter::Or(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        Filter::Or(operands)
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Returns the identifier if this is an identifier filter.
    pub fn as_id(&self) -> Option<&FeatureId> {
        match self {
            Filter::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Evaluates the filter against a feature.
    ///
    /// Reference system tags on spatial values are not consulted: callers are
    /// expected to bring literals and features into the same system first.
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::Id(id) => feature.id() == id,
            Filter::And(filters) => filters.iter().all(|f| f.evaluate(feature)),
            Filter::Or(filters) => filters.iter().any(|f| f.evaluate(feature)),
            Filter::Not(inner) => !inner.evaluate(feature),
            Filter::Compare {
                attribute,
                op,
                value,
            } => match feature.get(attribute) {
                Some(actual) if !actual.is_null() => op.eval(actual, value),
                _ => false,
            },
            Filter::Intersects { attribute, value } => {
                match (feature.get(attribute).and_then(Value::envelope), value.envelope()) {
                    (Some(actual), Some(literal)) => actual.intersects(&literal),
                    _ => false,
                }
            }
            Filter::IsNull { attribute } => feature.get(attribute).map_or(true, Value::is_null),
        }
    }

    /// Rebuilds the filter with every literal passed through `f`.
    ///
    /// `f` receives the attribute the literal is compared against.
    pub fn try_map_literals<F>(&self, f: &mut F) -> Result<Filter>
    where
        F: FnMut(&str, &Value) -> Result<Value>,
    {
        Ok(match self {
            Filter::And(filters) => Filter::And(
                filters
                    .iter()
                    .map(|inner| inner.try_map_literals(f))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Filter::Or(filters) => Filter::Or(
                filters
                    .iter()
                    .map(|inner| inner.try_map_literals(f))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Filter::Not(inner) => Filter::Not(Box::new(inner.try_map_literals(f)?)),
            Filter::Compare {
                attribute,
                op,
                value,
            } => Filter::Compare {
                attribute: attribute.clone(),
                op: *op,
                value: f(attribute, value)?,
            },
            Filter::Intersects { attribute, value } => Filter::Intersects {
                attribute: attribute.clone(),
                value: f(attribute, value)?,
            },
            other => other.clone(),
        })
    }

    /// Calls `f` on every literal.
    pub fn visit_literals(&self, f: &mut impl FnMut(&str, &Value)) {
        match self {
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().for_each(|inner| inner.visit_literals(f))
            }
            Filter::Not(inner) => inner.visit_literals(f),
            Filter::Compare {
                attribute, value, ..
            }
            | Filter::Intersects { attribute, value } => f(attribute, value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use geodelta_core::{Crs, Envelope, Geometry};

    fn road(id: &str, status: &str, lanes: i64) -> Feature {
        Feature::new(id.into())
            .with_attribute("status", status)
            .with_attribute("lanes", lanes)
            .with_attribute("geom", Geometry::point(lanes as f64, 0.0))
    }

    #[test]
    fn test_include_exclude() {
        let f = road("road.1", "open", 2);
        assert!(Filter::Include.evaluate(&f));
        assert!(!Filter::Exclude.evaluate(&f));
    }

    #[test]
    fn test_id_filter() {
        let f = road("road.1", "open", 2);
        assert!(Filter::id("road.1").evaluate(&f));
        assert!(!Filter::id("road.2").evaluate(&f));
        assert!(Filter::ids(["road.2", "road.1"]).evaluate(&f));
    }

    #[test]
    fn test_compare() {
        let f = road("road.1", "open", 2);
        assert!(Filter::eq("status", "open").evaluate(&f));
        assert!(Filter::ne("status", "closed").evaluate(&f));
        assert!(Filter::lt("lanes", 3i64).evaluate(&f));
        assert!(Filter::gt("lanes", 1.5f64).evaluate(&f));
        assert!(!Filter::eq("width", 1i64).evaluate(&f));
        assert!(!Filter::ne("width", 1i64).evaluate(&f));
    }

    #[test]
    fn test_logical() {
        let f = road("road.1", "open", 2);
        let both = Filter::and(Filter::eq("status", "open"), Filter::gt("lanes", 5i64));
        assert!(!both.evaluate(&f));
        let either = Filter::or(Filter::eq("status", "open"), Filter::gt("lanes", 5i64));
        assert!(either.evaluate(&f));
        assert!(Filter::not(both).evaluate(&f));
    }

    #[test]
    fn test_or_flattens() {
        let f = Filter::or(Filter::ids(["a", "b"]), Filter::id("c"));
        assert_eq!(f, Filter::ids(["a", "b", "c"]));
    }

    #[test]
    fn test_intersects_and_is_null() {
        let f = road("road.1", "open", 2);
        assert!(Filter::intersects("geom", Envelope::new(1.0, -1.0, 3.0, 1.0)).evaluate(&f));
        assert!(!Filter::intersects("geom", Envelope::new(5.0, 5.0, 6.0, 6.0)).evaluate(&f));
        assert!(Filter::is_null("width").evaluate(&f));
        assert!(!Filter::is_null("status").evaluate(&f));
    }

    #[test]
    fn test_try_map_literals() {
        let crs = Crs::new("EPSG:4326");
        let filter = Filter::and(
            Filter::intersects("geom", Envelope::new(0.0, 0.0, 1.0, 1.0)),
            Filter::not(Filter::eq("status", "open")),
        );
        let mut seen: Vec<String> = vec![];
        let mapped = filter
            .try_map_literals(&mut |attribute: &str, value: &Value| {
                seen.push(attribute.into());
                Ok(match value {
                    Value::Envelope(e) => Value::Envelope(e.clone().with_crs(crs.clone())),
                    other => other.clone(),
                })
            })
            .unwrap();
        assert_eq!(seen, vec![String::from("geom"), String::from("status")]);

        let mut tagged = 0;
        mapped.visit_literals(&mut |_, value| {
            if value.crs() == Some(&crs) {
                tagged += 1;
            }
        });
        assert_eq!(tagged, 1);
    }
}
