//! Property-based tests for the identifier canonicalizer using proptest.

use geodelta_core::{FeatureId, IdMap};
use geodelta_query::{collapse, identifiers, is_canonical, list, remap_identifiers, Filter};
use proptest::prelude::*;

fn id_filter(ids: &[u8]) -> Filter {
    collapse(ids.iter().map(|n| Filter::id(format!("road.{}", n).as_str())))
}

proptest! {
    /// Collapsing any identifier list yields a canonical filter.
    #[test]
    fn collapse_is_canonical(ids in prop::collection::vec(0u8..20, 0..30)) {
        prop_assert!(is_canonical(&id_filter(&ids)));
    }

    /// list() then collapse() gives the filter back.
    #[test]
    fn list_collapse_roundtrip(ids in prop::collection::vec(0u8..20, 0..30)) {
        let filter = id_filter(&ids);
        prop_assert_eq!(collapse(list(&filter)), filter);
    }

    /// Remapping keeps one identifier per distinct image, in first-seen order.
    #[test]
    fn remap_matches_mapped_set(
        ids in prop::collection::vec(0u8..20, 0..30),
        remapped in prop::collection::vec((0u8..20, 100u8..105), 0..10)
    ) {
        let filter = id_filter(&ids);
        let id_map: IdMap = remapped
            .iter()
            .map(|(from, to)| (
                FeatureId::new(format!("road.{}", from)),
                FeatureId::new(format!("road.{}", to)),
            ))
            .collect();

        let result = remap_identifiers(&filter, &id_map);
        prop_assert!(is_canonical(&result));

        let mut expected: Vec<FeatureId> = Vec::new();
        for id in identifiers(&filter) {
            let mapped = id_map.get(&id).cloned().unwrap_or(id);
            if !expected.contains(&mapped) {
                expected.push(mapped);
            }
        }
        prop_assert_eq!(identifiers(&result), expected);
    }

    /// An empty map leaves any canonical filter untouched.
    #[test]
    fn remap_with_empty_map_is_identity(ids in prop::collection::vec(0u8..20, 0..30)) {
        let filter = id_filter(&ids);
        prop_assert_eq!(remap_identifiers(&filter, &IdMap::new()), filter);
    }
}
