use once_cell::sync::OnceCell;

use crate::errors::HashError;

/// Lazily initialised, cached handle to one scheme's crypto backend.
///
/// Each adapter owns its own handle, so first use of one scheme never waits
/// on another. After initialisation `get` is a plain atomic load.
pub(crate) struct Handle<T> {
    scheme: &'static str,
    cell: OnceCell<T>,
}

impl<T> Handle<T> {
    pub(crate) const fn new(scheme: &'static str) -> Self {
        Self {
            scheme,
            cell: OnceCell::new(),
        }
    }

    /// Return the backend, building it on first use.
    ///
    /// Concurrent first callers block on this handle only; exactly one
    /// initialiser result is stored. A failed initialisation stores nothing
    /// and the next caller retries.
    pub(crate) fn get_or_try_init(
        &self,
        init: impl FnOnce() -> Result<T, HashError>,
    ) -> Result<&T, HashError> {
        self.cell.get_or_try_init(|| {
            let backend = init()?;
            tracing::debug!(scheme = self.scheme, "crypto backend initialized");
            Ok(backend)
        })
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_initializes_once_under_contention() {
        let handle = Arc::new(Handle::<usize>::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    *handle
                        .get_or_try_init(|| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(42)
                        })
                        .expect("Failed to initialize")
                })
            })
            .collect();

        for worker in workers {
            assert_eq!(worker.join().expect("worker panicked"), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_initialized());
    }

    #[test]
    fn test_failed_initialization_is_retried() {
        let handle = Handle::<u8>::new("test");

        let first = handle.get_or_try_init(|| Err(HashError::Crypto("unavailable".to_string())));
        assert!(first.is_err());
        assert!(!handle.is_initialized());

        assert_eq!(handle.get_or_try_init(|| Ok(7)), Ok(&7));
    }
}
