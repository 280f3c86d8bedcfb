use super::{ListQuery, RecordStore, StoreError, UserPage};
use crate::models::{HealthCheckEvent, NewUser, StoredUser};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    users: Vec<StoredUser>,
    health_checks: Vec<HealthCheckEvent>,
    next_id: u64,
}

/// In-process [`RecordStore`] used by tests and local runs without MongoDB.
///
/// Search approximates the Mongo text index: name and email are split into
/// words on non-alphanumeric characters and a record matches when any search
/// word equals one of them, case-insensitively. Unlike Mongo there is no
/// stemming or stop-word list, so `runs` does not find `running`. [`MemoryStore::set_reachable`] simulates an outage: while
/// unreachable every operation fails with [`StoreError::Connectivity`].
pub struct MemoryStore {
    inner: Mutex<Inner>,
    reachable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(StoreError::Connectivity(
                "in-memory store marked unreachable".to_string(),
            ));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

fn matches_search(user: &StoredUser, search: &str) -> bool {
    let indexed: Vec<String> = words(&user.name).chain(words(&user.email)).collect();
    words(search).any(|term| indexed.contains(&term))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<StoredUser, StoreError> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::duplicate_email());
        }

        inner.next_id += 1;
        let stored = StoredUser::from_new(format!("{:024x}", inner.next_id), user);
        inner.users.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, query: &ListQuery) -> Result<UserPage, StoreError> {
        let inner = self.lock()?;

        // Newest first; among equal timestamps the later insert wins.
        let mut matching: Vec<&StoredUser> = inner
            .users
            .iter()
            .rev()
            .filter(|user| {
                query
                    .search
                    .as_deref()
                    .is_none_or(|term| matches_search(user, term))
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.pagination.skip() as usize)
            .take(query.pagination.limit() as usize)
            .cloned()
            .collect();

        Ok(UserPage { items, total })
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.users.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn record_health_check(&self, event: HealthCheckEvent) -> Result<(), StoreError> {
        self.lock()?.health_checks.push(event);
        Ok(())
    }

    async fn latest_health_check(&self) -> Result<Option<HealthCheckEvent>, StoreError> {
        Ok(self
            .lock()?
            .health_checks
            .iter()
            .max_by_key(|event| event.timestamp)
            .cloned())
    }

    async fn count_health_checks(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.health_checks.len() as u64)
    }
}
