use std::ops::{Deref, DerefMut};

/// Owned sqlite object (connection or statement), released on drop unless null.
///
/// Dereferences to the raw pointer, `&mut *handle` is the out parameter of the
/// sqlite constructors.
pub(crate) struct Handle<T> {
    ptr: *mut T,
    release: fn(*mut T),
}

impl<T> Handle<T> {
    pub(crate) fn new(ptr: *mut T, release: fn(*mut T)) -> Self {
        Self { ptr, release }
    }

    /// Handle that does not release `ptr`, owned somewhere else.
    pub(crate) fn borrowed(ptr: *mut T) -> Self {
        Self::new(ptr, |_| {})
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            (self.release)(self.ptr);
        }
    }
}

impl<T> Deref for Handle<T> {
    type Target = *mut T;
    fn deref(&self) -> &*mut T {
        &self.ptr
    }
}

impl<T> DerefMut for Handle<T> {
    fn deref_mut(&mut self) -> &mut *mut T {
        &mut self.ptr
    }
}

// Sqlite is built in serialized mode, objects can move between threads.
unsafe impl<T> Send for Handle<T> {}
unsafe impl<T> Sync for Handle<T> {}

#[cfg(test)]
mod tests {
    use super::Handle;
    use std::{
        ptr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    fn release(_: *mut i32) {
        RELEASED.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn release_non_null_only() {
        let mut value = 7;
        drop(Handle::new(ptr::null_mut(), release));
        assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        {
            let handle = Handle::new(&mut value as *mut i32, release);
            assert_eq!(unsafe { **handle }, 7);
            drop(Handle::borrowed(*handle));
            assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 1);
    }
}
