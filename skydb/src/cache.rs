//! Per-entry revision cache.
//!
//! Every `(public key, data key)` pair gets a slot holding the highest
//! revision this process knows about and an async exclusive region. Writers
//! to the same entry queue on the region, so a read-modify-write sequence
//! never interleaves with another one in this process. Different entries do
//! not contend.
//!
//! Nothing coordinates across processes. Registries reject revisions that
//! are not strictly greater than the stored one, which is what catches a
//! concurrent writer elsewhere.
//!
//! Slots are never evicted.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;
use skydb_core::{Hash, PublicKey};
use tracing::trace;

/// What the cache knows about an entry's revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedRevision {
    /// Never looked up.
    Unknown,
    /// Looked up and the registry had no entry. Distinct from revision 0.
    NoEntry,
    Known(u64),
}

impl CachedRevision {
    pub fn from_remote(revision: Option<u64>) -> Self {
        match revision {
            Some(revision) => CachedRevision::Known(revision),
            None => CachedRevision::NoEntry,
        }
    }

    /// The latest known revision, `None` if there is none yet.
    pub fn latest(self) -> Option<u64> {
        match self {
            CachedRevision::Known(revision) => Some(revision),
            CachedRevision::Unknown | CachedRevision::NoEntry => None,
        }
    }

    /// Replaces `self` with `other` if `other` carries more information.
    /// Revisions only move forward.
    fn merge(&mut self, other: CachedRevision) -> bool {
        let newer = match (*self, other) {
            (_, CachedRevision::Unknown) => false,
            (CachedRevision::Unknown, _) => true,
            (CachedRevision::NoEntry, CachedRevision::Known(_)) => true,
            (CachedRevision::Known(current), CachedRevision::Known(new)) => new > current,
            (_, CachedRevision::NoEntry) => false,
        };
        if newer {
            *self = other;
        }
        newer
    }
}

#[derive(Debug)]
struct Slot {
    region: tokio::sync::Mutex<()>,
    revision: Mutex<CachedRevision>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            region: tokio::sync::Mutex::new(()),
            revision: Mutex::new(CachedRevision::Unknown),
        }
    }
}

impl Slot {
    fn get(&self) -> CachedRevision {
        *self.revision.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn merge(&self, other: CachedRevision) -> bool {
        self.revision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(other)
    }
}

#[derive(Debug, Default)]
pub struct RevisionCache {
    slots: DashMap<(PublicKey, Hash), Arc<Slot>>,
}

impl RevisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, public_key: PublicKey, data_key: Hash) -> Arc<Slot> {
        self.slots
            .entry((public_key, data_key))
            .or_default()
            .value()
            .clone()
    }

    /// Current knowledge about the entry, without waiting for its region.
    pub fn revision(&self, public_key: &PublicKey, data_key: &Hash) -> CachedRevision {
        self.slots
            .get(&(*public_key, *data_key))
            .map(|slot| slot.value().get())
            .unwrap_or(CachedRevision::Unknown)
    }

    /// Records a revision seen on a read. Advances the cache only if it is
    /// strictly greater than what is cached.
    pub fn observe(&self, public_key: &PublicKey, data_key: &Hash, revision: u64) -> bool {
        let advanced = self
            .slot(*public_key, *data_key)
            .merge(CachedRevision::Known(revision));
        if advanced {
            trace!(
                %public_key,
                data_key = %data_key.fmt_short(),
                revision,
                "revision cache advanced"
            );
        }
        advanced
    }

    /// Runs `operation` inside the entry's exclusive region.
    ///
    /// If nothing is cached yet, `seed` is awaited first to learn the remote
    /// revision (`None` when the registry has no entry). `operation` receives
    /// the latest known revision and returns its result together with the
    /// revision it wrote, if any. That revision is committed only on
    /// success. On error the cache is left as it was.
    ///
    /// The region is released on every exit path, including when the
    /// returned future is dropped.
    pub async fn with_lock<T, E, S, SF, O, OF>(
        &self,
        public_key: PublicKey,
        data_key: Hash,
        seed: S,
        operation: O,
    ) -> Result<T, E>
    where
        S: FnOnce() -> SF,
        SF: Future<Output = Result<Option<u64>, E>>,
        O: FnOnce(Option<u64>) -> OF,
        OF: Future<Output = Result<(T, Option<u64>), E>>,
    {
        let slot = self.slot(public_key, data_key);
        let _region = slot.region.lock().await;

        if slot.get() == CachedRevision::Unknown {
            let remote = seed().await?;
            slot.merge(CachedRevision::from_remote(remote));
        }

        let (result, written) = operation(slot.get().latest()).await?;
        if let Some(revision) = written {
            slot.merge(CachedRevision::Known(revision));
        }
        Ok(result)
    }

    /// Number of entries with a slot.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };

    use skydb_core::Keypair;

    use super::*;

    fn key() -> (PublicKey, Hash) {
        (Keypair::derive(b"cache").public_key(), Hash::new(b"k"))
    }

    #[test]
    fn merge_only_moves_forward() {
        let mut rev = CachedRevision::Unknown;
        assert!(rev.merge(CachedRevision::NoEntry));
        assert!(!rev.merge(CachedRevision::Unknown));
        assert!(rev.merge(CachedRevision::Known(0)));
        assert!(!rev.merge(CachedRevision::NoEntry));
        assert!(rev.merge(CachedRevision::Known(5)));
        assert!(!rev.merge(CachedRevision::Known(5)));
        assert!(!rev.merge(CachedRevision::Known(3)));
        assert_eq!(rev, CachedRevision::Known(5));
    }

    #[test]
    fn observe_is_monotonic() {
        let cache = RevisionCache::new();
        let (pk, dk) = key();
        assert!(cache.observe(&pk, &dk, 4));
        assert!(!cache.observe(&pk, &dk, 2));
        assert!(!cache.observe(&pk, &dk, 4));
        assert!(cache.observe(&pk, &dk, 9));
        assert_eq!(cache.revision(&pk, &dk), CachedRevision::Known(9));
    }

    #[tokio::test]
    async fn seed_runs_once_and_distinguishes_no_entry() {
        let cache = RevisionCache::new();
        let (pk, dk) = key();
        let seeds = AtomicUsize::new(0);

        let seen = cache
            .with_lock(
                pk,
                dk,
                || async {
                    seeds.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(None)
                },
                |current| async move { Ok((current, Some(0))) },
            )
            .await
            .unwrap();
        assert_eq!(seen, None);
        assert_eq!(cache.revision(&pk, &dk), CachedRevision::Known(0));

        let seen = cache
            .with_lock(
                pk,
                dk,
                || async {
                    seeds.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(Some(100))
                },
                |current| async move { Ok((current, None)) },
            )
            .await
            .unwrap();
        assert_eq!(seen, Some(0));
        assert_eq!(seeds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_operation_leaves_cache_untouched() {
        let cache = RevisionCache::new();
        let (pk, dk) = key();
        cache.observe(&pk, &dk, 7);

        let result: Result<(), &str> = cache
            .with_lock(
                pk,
                dk,
                || async { Ok(Some(0)) },
                |_| async { Err("publish failed") },
            )
            .await;
        assert_eq!(result, Err("publish failed"));
        assert_eq!(cache.revision(&pk, &dk), CachedRevision::Known(7));
    }

    #[tokio::test]
    async fn failed_seed_is_propagated() {
        let cache = RevisionCache::new();
        let (pk, dk) = key();

        let ran = AtomicBool::new(false);

        let result: Result<(), &str> = cache
            .with_lock(
                pk,
                dk,
                || async { Err("lookup failed") },
                |_| async {
                    ran.store(true, Ordering::SeqCst);
                    Ok(((), None))
                },
            )
            .await;
        assert_eq!(result, Err("lookup failed"));
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(cache.revision(&pk, &dk), CachedRevision::Unknown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_key_operations_never_overlap() {
        let cache = Arc::new(RevisionCache::new());
        let busy = Arc::new(AtomicBool::new(false));
        let (pk, dk) = key();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let busy = busy.clone();
                tokio::spawn(async move {
                    cache
                        .with_lock(
                            pk,
                            dk,
                            || async { Ok::<_, ()>(None) },
                            |current| async move {
                                assert!(!busy.swap(true, Ordering::SeqCst), "overlapping writers");
                                tokio::time::sleep(Duration::from_millis(5)).await;
                                busy.store(false, Ordering::SeqCst);
                                let next = current.map_or(0, |r| r + 1);
                                Ok((next, Some(next)))
                            },
                        )
                        .await
                })
            })
            .collect();

        let mut revisions = Vec::new();
        for task in tasks {
            revisions.push(task.await.unwrap().unwrap());
        }
        revisions.sort_unstable();
        assert_eq!(revisions, (0..8).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let cache = RevisionCache::new();
        let pk = Keypair::derive(b"cache").public_key();
        let a = Hash::new(b"a");
        let b = Hash::new(b"b");

        // Holding a's region while working on b must not deadlock.
        let outer = cache
            .with_lock(
                pk,
                a,
                || async { Ok::<_, ()>(None) },
                |_| async {
                    let inner = cache
                        .with_lock(
                            pk,
                            b,
                            || async { Ok::<_, ()>(None) },
                            |_| async { Ok(("b", Some(0))) },
                        )
                        .await
                        .unwrap();
                    Ok((inner, Some(0)))
                },
            )
            .await
            .unwrap();
        assert_eq!(outer, "b");
        assert_eq!(cache.len(), 2);
    }
}
