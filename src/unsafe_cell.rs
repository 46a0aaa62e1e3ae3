use std::cell::UnsafeCell;

/// A log slot written from inside the global allocator.
///
/// Each slot is written by exactly one thread, the one that reserved its
/// index, and read only after tracking stopped.
pub struct RecordCell<T> {
    inner: UnsafeCell<T>,
}
unsafe impl<T: Send> Send for RecordCell<T> {}
unsafe impl<T: Send> Sync for RecordCell<T> {}
impl<T> RecordCell<T> {
    pub const fn new(value: T) -> Self {
        RecordCell {
            inner: UnsafeCell::new(value),
        }
    }
    pub fn get(&self) -> *mut T {
        self.inner.get()
    }
}
