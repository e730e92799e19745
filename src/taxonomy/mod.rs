pub mod subcategories;

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::sentiment::Aspect;

pub use subcategories::{SubcategoryDefinition, SUBCATEGORIES};

/// Tag assigned when nothing more specific can be extracted.
pub const DEFAULT_SUBCATEGORY: &str = "overall_satisfaction";

static BY_NAME: LazyLock<HashMap<&'static str, &'static SubcategoryDefinition>> =
    LazyLock::new(|| SUBCATEGORIES.iter().map(|d| (d.name, d)).collect());

pub fn lookup(name: &str) -> Option<&'static SubcategoryDefinition> {
    BY_NAME.get(name).copied()
}

pub fn is_known(name: &str) -> bool {
    BY_NAME.contains_key(name)
}

pub fn parent_aspect(name: &str) -> Option<Aspect> {
    lookup(name).map(|d| d.aspect)
}

pub fn for_aspect(aspect: Aspect) -> impl Iterator<Item = &'static SubcategoryDefinition> {
    SUBCATEGORIES.iter().filter(move |d| d.aspect == aspect)
}

/// Lowercase and trim a raw label before whitelist lookup.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_subcategory_has_one_parent() {
        let names: HashSet<_> = SUBCATEGORIES.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), SUBCATEGORIES.len(), "duplicate subcategory name");

        for def in SUBCATEGORIES {
            assert_eq!(parent_aspect(def.name), Some(def.aspect));
        }
    }

    #[test]
    fn test_every_aspect_has_subcategories() {
        for aspect in Aspect::ALL {
            assert!(for_aspect(aspect).count() > 0, "{} has no subcategories", aspect);
        }
        assert_eq!(SUBCATEGORIES.len(), 19);
    }

    #[test]
    fn test_default_is_whitelisted() {
        assert_eq!(parent_aspect(DEFAULT_SUBCATEGORY), Some(Aspect::Overall));
        assert!(!is_known("food"));
        assert!(!is_known("Food_Quality"));
        assert!(is_known(&normalize_label(" Food_Quality ")));
    }
}
