//! Route and stop identifiers.
//!
//! Both wrap `Arc<str>`, so a matched stop, a hub record and an overlap pair
//! can all point at the same route name without copying it. Ordering, hashing
//! and equality are those of the underlying text; that is what keeps hub and
//! overlap output deterministic, and it lets maps keyed by an identifier be
//! queried with a plain `&str`.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! text_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(Arc::from(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

text_identifier!(
    /// Names a route; both directions of a route share one identifier.
    RouteIdentifier
);
text_identifier!(
    /// Names a stop; unique within a network.
    StopIdentifier
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn test_clones_share_text() {
        let stop = StopIdentifier::new("alexanderplatz");
        let matched = stop.clone();

        assert_eq!(stop, matched);
        assert!(Arc::ptr_eq(&stop.0, &matched.0));
        assert_eq!(stop, StopIdentifier::from(String::from("alexanderplatz")));
    }

    #[test]
    fn test_route_names_sort_as_text() {
        let mut ids: Vec<RouteIdentifier> = vec!["7".into(), "12".into(), "10A".into()];
        ids.sort();

        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, vec!["10A", "12", "7"]);
    }

    #[test]
    fn test_maps_are_queryable_by_str() {
        let mut served_by: BTreeMap<StopIdentifier, usize> = BTreeMap::new();
        served_by.insert("hub".into(), 3);
        assert_eq!(served_by.get("hub"), Some(&3));

        let routes: HashSet<RouteIdentifier> = ["M4", "M5"].into_iter().map(Into::into).collect();
        assert!(routes.contains("M4"));
        assert!(!routes.contains("M10"));
    }

    #[test]
    fn test_display_is_bare_text() {
        let route = RouteIdentifier::new("M4");
        assert_eq!(format!("route {}", route), "route M4");
    }
}
