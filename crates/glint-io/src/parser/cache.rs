//! Single-flight memo of asynchronous loads.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use glint_core::status::Result;

/// A load result every waiter can poll.
pub type SharedLoad<V> = Shared<LocalBoxFuture<'static, Result<V>>>;

/// Maps keys to shared load futures. The first request for a key starts the
/// load; later requests share the same in-flight or completed result.
pub struct SingleFlight<K, V> {
    entries: RefCell<HashMap<K, SharedLoad<V>>>,
}

impl<K, V> Default for SingleFlight<K, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash,
    V: Clone + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the load for `key`, creating it with `start` on first use.
    ///
    /// `start` only builds the future; nothing is polled while the map is
    /// borrowed.
    pub fn get_or_start<F, Fut>(&self, key: K, start: F) -> SharedLoad<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + 'static,
    {
        if let Some(existing) = self.entries.borrow().get(&key) {
            return existing.clone();
        }
        let load = start().boxed_local().shared();
        self.entries.borrow_mut().insert(key, load.clone());
        load
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use glint_core::status::GltfError;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_single_flight_starts_once() {
        let cache: SingleFlight<u32, u32> = SingleFlight::new();
        let starts = Rc::new(Cell::new(0));

        let loads: Vec<_> = (0..3)
            .map(|_| {
                let starts = starts.clone();
                cache.get_or_start(7, move || async move {
                    starts.set(starts.get() + 1);
                    Ok(42)
                })
            })
            .collect();

        let values = block_on(futures::future::try_join_all(loads)).unwrap();
        assert_eq!(values, vec![42, 42, 42]);
        assert_eq!(starts.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_errors_are_shared() {
        let cache: SingleFlight<&str, u32> = SingleFlight::new();
        let first = cache.get_or_start("bad", || async { Err(GltfError::MissingJsonChunk) });
        let second = cache.get_or_start("bad", || async { Ok(1) });
        assert_eq!(block_on(first), Err(GltfError::MissingJsonChunk));
        assert_eq!(block_on(second), Err(GltfError::MissingJsonChunk));
    }
}
