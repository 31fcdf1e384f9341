//! Shared log store
//!
//! A most-recent-first stack of immutable entries. Only the head reference
//! ever changes; once an entry is linked it is never mutated.
//!
//! ## Design
//!
//! - `prepend` and `peek_head` run under one mutex, so every head read sees a
//!   consistent snapshot and no two prepends interleave
//! - Every prepend (and the final seal) notifies a condition variable, so an
//!   observer can block on `wait_for_change` instead of polling
//! - `EntryHandle` compares by identity, not by text: two identical lines are
//!   still two distinct heads
//!
//! ## Ownership
//!
//! The producer writes through a [`StoreWriter`], which seals the store when
//! dropped. Teardown consumes the store by value, so it can only run once and
//! only after every other handle to the store is gone:
//!
//! ```ignore
//! let writer = StoreWriter::new(Arc::clone(&store));
//! writer.prepend("a")?;
//! drop(writer);                       // seals, releases the producer's Arc
//! let store = LogStore::reclaim(store)?;
//! let teardown = store.teardown();
//! ```

use duolog_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One stored line.
struct Entry {
    text: String,
    /// 1-based insertion position
    ordinal: u64,
    next: Option<Arc<Entry>>,
}

impl Drop for Entry {
    // Unlink iteratively; the default recursive drop overflows on long chains.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(mut entry) => next = entry.next.take(),
                Err(_) => break,
            }
        }
    }
}

/// Identity handle to an entry.
///
/// Equality is pointer identity: a handle equals only handles to the same
/// linked entry.
#[derive(Clone)]
pub struct EntryHandle(Arc<Entry>);

impl EntryHandle {
    /// Text of the entry
    pub fn text(&self) -> &str {
        &self.0.text
    }

    /// 1-based insertion position of the entry
    pub fn ordinal(&self) -> u64 {
        self.0.ordinal
    }

    fn is(&self, node: &Arc<Entry>) -> bool {
        Arc::ptr_eq(&self.0, node)
    }
}

impl PartialEq for EntryHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EntryHandle {}

impl fmt::Debug for EntryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryHandle")
            .field("ordinal", &self.0.ordinal)
            .field("text", &self.0.text)
            .finish()
    }
}

#[derive(Default)]
struct Chain {
    head: Option<Arc<Entry>>,
    len: usize,
    sealed: bool,
}

impl Chain {
    fn head_is(&self, last: Option<&EntryHandle>) -> bool {
        match (&self.head, last) {
            (None, None) => true,
            (Some(node), Some(handle)) => handle.is(node),
            _ => false,
        }
    }

    fn head_handle(&self) -> Option<EntryHandle> {
        self.head.clone().map(EntryHandle)
    }
}

/// What an observer saw when it looked at the store.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Current head
    pub head: Option<EntryHandle>,
    /// Whether the head differs from the caller's last-seen handle
    pub changed: bool,
    /// Whether the producer has closed the store
    pub sealed: bool,
}

/// Result of tearing down the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Teardown {
    /// Entry texts, head first
    pub entries: Vec<String>,
    /// Entries still referenced by outstanding handles; freed when those drop
    pub retained: usize,
}

impl Teardown {
    /// Number of entries the store held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store was empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Most-recent-first stack of immutable entries.
pub struct LogStore {
    chain: Mutex<Chain>,
    changed: Condvar,
}

impl LogStore {
    /// Create an empty store
    pub fn new() -> Self {
        LogStore {
            chain: Mutex::new(Chain::default()),
            changed: Condvar::new(),
        }
    }

    /// Insert `text` as the new head
    ///
    /// Fails with [`Error::StoreSealed`] once the store is sealed.
    pub fn prepend(&self, text: impl Into<String>) -> Result<EntryHandle> {
        self.prepend_with(text, |_| Ok(()))
    }

    /// Insert `text` as the new head, then run `linked` before releasing the
    /// store lock
    ///
    /// Nothing can observe the new head until `linked` returns. The entry
    /// stays linked even if `linked` fails.
    pub fn prepend_with<F>(&self, text: impl Into<String>, linked: F) -> Result<EntryHandle>
    where
        F: FnOnce(&EntryHandle) -> Result<()>,
    {
        let mut chain = self.chain.lock();
        if chain.sealed {
            return Err(Error::StoreSealed);
        }

        let handle = EntryHandle(Arc::new(Entry {
            text: text.into(),
            ordinal: chain.len as u64 + 1,
            next: chain.head.take(),
        }));
        chain.head = Some(Arc::clone(&handle.0));
        chain.len += 1;
        let outcome = linked(&handle);
        drop(chain);

        self.changed.notify_all();
        tracing::trace!(ordinal = handle.ordinal(), "prepended entry");
        outcome.map(|()| handle)
    }

    /// Current head, if any
    pub fn peek_head(&self) -> Option<EntryHandle> {
        self.chain.lock().head_handle()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.chain.lock().len
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry texts, head first
    pub fn snapshot(&self) -> Vec<String> {
        let chain = self.chain.lock();
        let mut out = Vec::with_capacity(chain.len);
        let mut cursor = chain.head.as_deref();
        while let Some(entry) = cursor {
            out.push(entry.text.clone());
            cursor = entry.next.as_deref();
        }
        out
    }

    /// Close the store to further prepends and wake any waiter
    ///
    /// Returns `true` if this call sealed it.
    pub fn seal(&self) -> bool {
        let mut chain = self.chain.lock();
        if chain.sealed {
            return false;
        }
        chain.sealed = true;
        let len = chain.len;
        drop(chain);

        self.changed.notify_all();
        tracing::debug!(entries = len, "log store sealed");
        true
    }

    /// Check if the store is sealed
    pub fn is_sealed(&self) -> bool {
        self.chain.lock().sealed
    }

    /// Look at the head without blocking
    pub fn observe(&self, last: Option<&EntryHandle>) -> Observation {
        let chain = self.chain.lock();
        Observation {
            head: chain.head_handle(),
            changed: !chain.head_is(last),
            sealed: chain.sealed,
        }
    }

    /// Block until the head differs from `last`, the store is sealed, or
    /// `timeout` elapses
    pub fn wait_for_change(&self, last: Option<&EntryHandle>, timeout: Duration) -> Observation {
        let deadline = Instant::now() + timeout;
        let mut chain = self.chain.lock();
        while chain.head_is(last) && !chain.sealed {
            if self.changed.wait_until(&mut chain, deadline).timed_out() {
                break;
            }
        }
        Observation {
            head: chain.head_handle(),
            changed: !chain.head_is(last),
            sealed: chain.sealed,
        }
    }

    /// Take sole ownership of a shared store
    ///
    /// Fails loudly if any other `Arc` to the store is still alive, which
    /// means the producer has not released its writer.
    pub fn reclaim(store: Arc<LogStore>) -> Result<LogStore> {
        Arc::into_inner(store).ok_or_else(|| {
            Error::ProtocolViolation(
                "log store torn down while another handle is still alive".to_string(),
            )
        })
    }

    /// Release every entry and the store itself
    ///
    /// Consumes the store, so teardown cannot run twice or race a prepend.
    pub fn teardown(self) -> Teardown {
        let mut chain = self.chain.into_inner();
        let mut teardown = Teardown {
            entries: Vec::with_capacity(chain.len),
            retained: 0,
        };

        let mut cursor = chain.head.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut entry) => {
                    teardown.entries.push(std::mem::take(&mut entry.text));
                    cursor = entry.next.take();
                }
                Err(shared) => {
                    teardown.retained += 1;
                    teardown.entries.push(shared.text.clone());
                    cursor = shared.next.clone();
                }
            }
        }

        tracing::debug!(
            entries = teardown.entries.len(),
            retained = teardown.retained,
            "log store torn down"
        );
        teardown
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.chain.lock();
        f.debug_struct("LogStore")
            .field("len", &chain.len)
            .field("sealed", &chain.sealed)
            .finish()
    }
}

/// Producer-side write capability.
///
/// Holds one reference to the store. Dropping the writer, including during
/// a panic unwind, seals the store so the observer is never left waiting.
#[derive(Debug)]
pub struct StoreWriter {
    store: Arc<LogStore>,
}

impl StoreWriter {
    /// Wrap the producer's reference to the store
    pub fn new(store: Arc<LogStore>) -> Self {
        StoreWriter { store }
    }

    /// Prepend an entry
    pub fn prepend(&self, text: impl Into<String>) -> Result<EntryHandle> {
        self.store.prepend(text)
    }

    /// Prepend an entry, running `linked` under the store lock
    pub fn prepend_with<F>(&self, text: impl Into<String>, linked: F) -> Result<EntryHandle>
    where
        F: FnOnce(&EntryHandle) -> Result<()>,
    {
        self.store.prepend_with(text, linked)
    }

    /// Number of entries written so far
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Seal the store and release this reference
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        self.store.seal();
    }
}
