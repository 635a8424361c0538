use foldhash::HashMap;
use parking_lot::RwLock;
use std::{borrow::Borrow, hash::Hash};

/// A map specialized to caching lookups that can't change once answered, such as the location
/// of a named variable in a linked program.
///
/// Readers never block each other, except when an entry is vacant. In that case it gets written to
/// once and then never again, entries are immutable after insertion.
#[derive(Debug)]
pub(crate) struct OnceCache<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for OnceCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OnceCache<K, V> {
    /// Creates a new `OnceCache`.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::default()),
        }
    }
}

impl<K, V> OnceCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Returns the value for the specified `key`, if it exists.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.read().get(key).cloned()
    }

    /// Returns the value for the specified `key`. The entry gets written to with the key-value
    /// pair returned by `f` if it doesn't exist.
    pub(crate) fn get_or_insert<Q>(&self, key: &Q, f: impl FnOnce() -> (K, V)) -> V
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let (key, value) = f();

        self.inner
            .write()
            .entry(key)
            .or_insert_with(|| value.clone())
            .clone()
    }

    /// Returns the number of cached entries.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::OnceCache;
    use std::cell::Cell;

    #[test]
    fn computes_once() {
        let cache: OnceCache<String, Option<i32>> = OnceCache::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            let value = cache.get_or_insert("u_color", || {
                calls.set(calls.get() + 1);
                ("u_color".to_owned(), Some(4))
            });
            assert_eq!(value, Some(4));
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("missing"), None);
    }
}
