//! Per-resource field storage.

use crate::resource::FieldValue;
use std::collections::HashMap;

/// Resolved field values of one resource.
///
/// A field is either absent (never fetched, or not returned by the API) or present with a
/// concrete value. `complete` records whether every part of the resource's kind has been
/// fetched; once it is set, an absent field is known not to exist rather than not yet fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldCache {
    values: HashMap<&'static str, FieldValue>,
    complete: bool,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn insert(&mut self, field: &'static str, value: FieldValue) {
        self.values.insert(field, value);
    }

    /// Overwrites our values with every value present in `other`.
    ///
    /// Values only we hold are kept. The completeness marker is sticky.
    pub fn merge(&mut self, other: FieldCache) {
        self.complete |= other.complete;
        self.values.extend(other.values);
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of the cached fields, in no particular order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_incoming_values_and_keeps_the_rest() {
        let mut cache = FieldCache::new();
        cache.insert("title", FieldValue::Str("old".into()));
        cache.insert("n_views", FieldValue::Int(1));

        let mut incoming = FieldCache::new();
        incoming.insert("title", FieldValue::Str("new".into()));
        incoming.mark_complete();

        cache.merge(incoming);
        assert_eq!(cache.get("title"), Some(&FieldValue::Str("new".into())));
        assert_eq!(cache.get("n_views"), Some(&FieldValue::Int(1)));
        assert!(cache.is_complete());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn completeness_survives_merging_a_partial_cache() {
        let mut cache = FieldCache::new();
        cache.mark_complete();
        cache.merge(FieldCache::new());
        assert!(cache.is_complete());
    }
}
