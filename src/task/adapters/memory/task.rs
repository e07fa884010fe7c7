//! In-memory task and offer repository.
//!
//! Tasks and offers share one lock, so the parent-status check on offer
//! insertion and the funding unit of work are trivially atomic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    escrow::domain::CheckoutSessionId,
    identity::domain::UserId,
    task::{
        domain::{Offer, OfferId, Task, TaskId, TaskVersion},
        ports::{
            OfferRepository, TaskFilter, TaskRepository, TaskRepositoryError,
            TaskRepositoryResult,
        },
    },
};

/// Thread-safe in-memory task and offer repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    session_index: HashMap<CheckoutSessionId, TaskId>,
    offers: HashMap<OfferId, Offer>,
    offers_by_task: HashMap<TaskId, Vec<OfferId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryTaskState {
    fn check_version(&self, task: &Task, expected: TaskVersion) -> TaskRepositoryResult<()> {
        let stored = self
            .tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        if stored.version() != expected {
            return Err(TaskRepositoryError::VersionConflict {
                task_id: task.id(),
                expected,
            });
        }
        Ok(())
    }

    /// Stores `task` and re-points the session index at its current checkout.
    fn put_task(&mut self, task: &Task) {
        let current = task.checkout().map(|link| &link.session_id);
        let replaced = self
            .tasks
            .get(&task.id())
            .and_then(Task::checkout)
            .map(|link| link.session_id.clone())
            .filter(|previous| current != Some(previous));
        if let Some(previous) = replaced {
            self.session_index.remove(&previous);
        }
        if let Some(session_id) = current {
            self.session_index.insert(session_id.clone(), task.id());
        }
        self.tasks.insert(task.id(), task.clone());
    }

    fn collect_sorted(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| predicate(task))
            .cloned()
            .collect();
        tasks.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        tasks
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.put_task(task);
        Ok(())
    }

    async fn update(&self, task: &Task, expected: TaskVersion) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(task, expected)?;
        state.put_task(task);
        Ok(())
    }

    async fn accept_funding(
        &self,
        task: &Task,
        expected: TaskVersion,
        offer_id: OfferId,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.check_version(task, expected)?;
        let sibling_ids = state
            .offers_by_task
            .get(&task.id())
            .cloned()
            .unwrap_or_default();
        if !sibling_ids.contains(&offer_id) {
            return Err(TaskRepositoryError::OfferNotFound(offer_id));
        }

        let mut updates = Vec::with_capacity(sibling_ids.len());
        for id in sibling_ids {
            let Some(mut offer) = state.offers.get(&id).cloned() else {
                continue;
            };
            let outcome = if id == offer_id {
                offer.accept(task.updated_at())
            } else {
                offer.decline(task.updated_at())
            };
            if outcome.is_ok() {
                updates.push(offer);
            }
        }
        for offer in updates {
            state.offers.insert(offer.id(), offer);
        }
        state.put_task(task);
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &CheckoutSessionId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        let task = state
            .session_index
            .get(session_id)
            .and_then(|task_id| state.tasks.get(task_id))
            .filter(|task| {
                task.checkout()
                    .is_some_and(|link| &link.session_id == session_id)
            })
            .cloned();
        Ok(task)
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self.read()?.collect_sorted(|task| filter.matches(task)))
    }

    async fn list_by_poster(&self, poster_id: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self.read()?.collect_sorted(|task| task.is_poster(poster_id)))
    }

    async fn list_by_helper(&self, helper_id: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self
            .read()?
            .collect_sorted(|task| task.is_assigned_helper(helper_id)))
    }
}

#[async_trait]
impl OfferRepository for InMemoryTaskRepository {
    async fn store_offer(&self, offer: &Offer) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let parent = state
            .tasks
            .get(&offer.task_id())
            .ok_or(TaskRepositoryError::NotFound(offer.task_id()))?;
        if parent.ensure_accepting_offers().is_err() {
            return Err(TaskRepositoryError::TaskNotOpen {
                task_id: parent.id(),
                status: parent.status(),
            });
        }
        if state.offers.contains_key(&offer.id()) {
            return Err(TaskRepositoryError::DuplicateOffer(offer.id()));
        }
        state
            .offers_by_task
            .entry(offer.task_id())
            .or_default()
            .push(offer.id());
        state.offers.insert(offer.id(), offer.clone());
        Ok(())
    }

    async fn find_offer(&self, id: OfferId) -> TaskRepositoryResult<Option<Offer>> {
        Ok(self.read()?.offers.get(&id).cloned())
    }

    async fn list_offers(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Offer>> {
        let state = self.read()?;
        let offers = state
            .offers_by_task
            .get(&task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.offers.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(offers)
    }
}
