//! Snapshot cells shared between the host context and the render loop
//!
//! Writers replace the whole value; readers clone the `Arc` and work on one
//! consistent snapshot for as long as they hold it.

use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;

pub struct SnapshotCell<T> {
    inner: Mutex<RefCell<Arc<T>>>,
}

impl<T> SnapshotCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Arc::new(value))),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<T> {
        critical_section::with(|cs| Arc::clone(&self.inner.borrow(cs).borrow()))
    }

    /// Replace the snapshot, returning the previous one
    pub fn store(&self, value: T) -> Arc<T> {
        let next = Arc::new(value);
        critical_section::with(|cs| self.inner.borrow(cs).replace(next))
    }

    /// Replace the snapshot with a value derived from the current one
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        critical_section::with(|cs| {
            let cell = self.inner.borrow(cs);
            let next = f(&cell.borrow());
            cell.replace(Arc::new(next));
        });
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::SnapshotCell;

    #[test]
    fn test_readers_keep_old_snapshot() {
        let cell = SnapshotCell::new(1_u32);
        let before = cell.load();
        cell.store(2);
        assert_eq!(*before, 1);
        assert_eq!(*cell.load(), 2);

        cell.update(|value| value + 1);
        assert_eq!(*cell.load(), 3);
    }
}
