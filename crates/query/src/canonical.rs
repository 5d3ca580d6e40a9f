//! Identifier-set decomposition of filters.
//!
//! A canonical filter is one of: `Exclude` (no feature), `Id` (one feature) or
//! an `Or` whose operands are all `Id` filters. Queued session changes keep
//! their targets in this form so identifiers can be rewritten later without
//! re-evaluating predicates.

use crate::filter::Filter;
use alloc::vec;
use alloc::vec::Vec;
use geodelta_core::{FeatureId, IdMap};

/// Decomposes a filter into its identifier-set operands.
///
/// - an OR of identifier filters yields its operands
/// - `Exclude` yields nothing
/// - anything else yields itself
pub fn list(filter: &Filter) -> Vec<Filter> {
    match filter {
        Filter::Exclude => Vec::new(),
        Filter::Or(operands) if operands.iter().all(|f| matches!(f, Filter::Id(_))) => {
            operands.clone()
        }
        other => vec![other.clone()],
    }
}

/// Rebuilds a filter from operands: none → `Exclude`, one → itself, more → `Or`.
///
/// Duplicates are dropped; first occurrences keep their order.
pub fn collapse<I>(filters: I) -> Filter
where
    I: IntoIterator<Item = Filter>,
{
    let mut unique: Vec<Filter> = Vec::new();
    for f in filters {
        if !unique.contains(&f) {
            unique.push(f);
        }
    }
    match unique.len() {
        0 => Filter::Exclude,
        1 => unique.remove(0),
        _ => Filter::Or(unique),
    }
}

/// Rewrites every identifier found in `id_map`, then re-collapses.
pub fn remap_identifiers(filter: &Filter, id_map: &IdMap) -> Filter {
    collapse(list(filter).into_iter().map(|f| match f {
        Filter::Id(id) => match id_map.get(&id) {
            Some(new_id) => Filter::Id(new_id.clone()),
            None => Filter::Id(id),
        },
        other => other,
    }))
}

/// Returns the identifiers of a canonical filter.
pub fn identifiers(filter: &Filter) -> Vec<FeatureId> {
    list(filter)
        .into_iter()
        .filter_map(|f| match f {
            Filter::Id(id) => Some(id),
            _ => None,
        })
        .collect()
}

/// Returns true if the filter is `Exclude`, an `Id`, or an `Or` of `Id`s.
pub fn is_canonical(filter: &Filter) -> bool {
    match filter {
        Filter::Exclude | Filter::Id(_) => true,
        Filter::Or(operands) => {
            !operands.is_empty() && operands.iter().all(|f| matches!(f, Filter::Id(_)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> IdMap {
        pairs
            .iter()
            .map(|(k, v)| (FeatureId::new(*k), FeatureId::new(*v)))
            .collect()
    }

    #[test]
    fn test_list_exclude() {
        assert!(list(&Filter::Exclude).is_empty());
    }

    #[test]
    fn test_list_single_id() {
        assert_eq!(list(&Filter::id("id1")), vec![Filter::id("id1")]);
    }

    #[test]
    fn test_list_or_of_ids() {
        assert_eq!(
            list(&Filter::ids(["a", "b"])),
            vec![Filter::id("a"), Filter::id("b")]
        );
    }

    #[test]
    fn test_list_other_filters() {
        let predicate = Filter::eq("status", "open");
        assert_eq!(list(&predicate), vec![predicate.clone()]);

        let mixed = Filter::or(Filter::id("a"), predicate);
        assert_eq!(list(&mixed), vec![mixed.clone()]);
    }

    #[test]
    fn test_remap_one() {
        let remapped = remap_identifiers(&Filter::ids(["id1", "id2"]), &map(&[("id1", "id3")]));
        assert_eq!(remapped, Filter::ids(["id3", "id2"]));
    }

    #[test]
    fn test_remap_to_same_id_collapses() {
        let remapped = remap_identifiers(
            &Filter::ids(["id1", "id2"]),
            &map(&[("id1", "id9"), ("id2", "id9")]),
        );
        assert_eq!(remapped, Filter::id("id9"));
    }

    #[test]
    fn test_remap_empty_set() {
        let remapped = remap_identifiers(&Filter::Exclude, &map(&[("id1", "id3")]));
        assert_eq!(remapped, Filter::Exclude);
    }

    #[test]
    fn test_remap_untouched() {
        let filter = Filter::id("id5");
        assert_eq!(remap_identifiers(&filter, &IdMap::new()), filter);
    }

    #[test]
    fn test_collapse() {
        assert_eq!(collapse(Vec::new()), Filter::Exclude);
        assert_eq!(collapse(vec![Filter::id("a")]), Filter::id("a"));
        assert_eq!(
            collapse(vec![Filter::id("a"), Filter::id("b"), Filter::id("a")]),
            Filter::ids(["a", "b"])
        );
    }

    #[test]
    fn test_identifiers_and_is_canonical() {
        assert_eq!(
            identifiers(&Filter::ids(["a", "b"])),
            vec![FeatureId::new("a"), FeatureId::new("b")]
        );
        assert!(identifiers(&Filter::Exclude).is_empty());
        assert!(is_canonical(&Filter::Exclude));
        assert!(is_canonical(&Filter::id("a")));
        assert!(is_canonical(&Filter::ids(["a", "b"])));
        assert!(!is_canonical(&Filter::Include));
        assert!(!is_canonical(&Filter::Or(Vec::new())));
        assert!(!is_canonical(&Filter::eq("status", "open")));
    }
}
