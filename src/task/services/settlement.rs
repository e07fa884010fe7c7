//! Post-funding commands: start, completion, cancellation, and dispute.

use super::{
    TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, lifecycle::forbidden,
};
use crate::{
    chat::ports::ChatGateway,
    escrow::{
        domain::{RefundRequest, ReleaseRequest},
        ports::EscrowGateway,
    },
    identity::{domain::Caller, ports::PayoutDirectory},
    task::{
        domain::{CancelingParty, RefundRecord, Task, TaskAction, TaskId, TaskStatus},
        ports::{OfferRepository, TaskRepository},
    },
};
use mockable::Clock;

impl<R, E, H, P, C> TaskLifecycleService<R, E, H, P, C>
where
    R: TaskRepository + OfferRepository,
    E: EscrowGateway,
    H: ChatGateway,
    P: PayoutDirectory,
    C: Clock + Send + Sync,
{
    /// Marks work as started. Only the bound helper may do this.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for anyone but the helper,
    /// or an invalid-state error unless the task is accepted.
    pub async fn start_work(&self, caller: &Caller, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let mut task = self.load_task(task_id).await?;
        if !task.is_assigned_helper(caller.user_id()) {
            return Err(forbidden(caller, TaskAction::StartWork));
        }
        let expected = task.version();
        task.start_work(&*self.clock)?;
        self.repository.update(&task, expected).await?;
        tracing::info!(task_id = %task_id, helper_id = %caller.user_id(), "work started");
        Ok(task)
    }

    /// Marks the task done and releases the helper's share.
    ///
    /// Tasks that require a photo complete only once the chat thread holds a
    /// proof message. The release is attempted after the transition commits
    /// and its failure is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for anyone but the poster or
    /// helper, an invalid-state error unless the task is accepted or in
    /// progress, and [`TaskLifecycleError::ProofRequired`] when proof is
    /// missing.
    pub async fn complete(&self, caller: &Caller, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let mut task = self.load_task(task_id).await?;
        if !is_party(&task, caller) {
            return Err(forbidden(caller, TaskAction::Complete));
        }
        let expected = task.version();
        task.complete(&*self.clock)?;
        if task.details().photo_required && !self.has_proof(task_id).await? {
            return Err(TaskLifecycleError::ProofRequired(task_id));
        }
        self.repository.update(&task, expected).await?;
        tracing::info!(task_id = %task_id, completed_by = %caller.user_id(), "task completed");

        if let Some(assignment) = task.assignment() {
            let release = ReleaseRequest {
                task_id,
                payment_id: assignment.payment_id().clone(),
                destination: assignment.payout_account().clone(),
                amount: assignment.split().helper_amount(),
            };
            if let Err(err) = self.escrow.release(&release).await {
                tracing::error!(
                    task_id = %task_id,
                    payment_id = %release.payment_id,
                    error = %err,
                    "failed to release escrowed funds"
                );
            }
        }
        Ok(task)
    }

    /// Withdraws the task on behalf of `party`.
    ///
    /// A funded task is refunded in full; a requested task with a pending
    /// checkout has that session expired. Neither gateway call can undo the
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the caller is not
    /// `party`, or an invalid-state error unless the task is requested or
    /// accepted.
    pub async fn cancel(
        &self,
        caller: &Caller,
        task_id: TaskId,
        party: CancelingParty,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.load_task(task_id).await?;
        let authorized = match party {
            CancelingParty::Poster => task.is_poster(caller.user_id()),
            CancelingParty::Helper => task.is_assigned_helper(caller.user_id()),
        };
        if !authorized {
            return Err(forbidden(caller, TaskAction::Cancel));
        }

        let pending_session = (task.status() == TaskStatus::Requested)
            .then(|| task.checkout().map(|link| link.session_id.clone()))
            .flatten();
        let expected = task.version();
        let refund = task.cancel(party, &*self.clock)?;
        self.repository.update(&task, expected).await?;
        tracing::info!(task_id = %task_id, canceled_by = %party, "task canceled");

        if let Some(record) = refund {
            refund_quietly(&*self.escrow, task_id, &record).await;
        } else if let Some(session_id) = pending_session {
            self.expire_checkout_quietly(task_id, &session_id).await;
        }
        Ok(task)
    }

    /// Contests a completed task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for anyone but the poster or
    /// helper, or an invalid-state error unless the task is completed.
    pub async fn dispute(&self, caller: &Caller, task_id: TaskId) -> TaskLifecycleResult<Task> {
        let mut task = self.load_task(task_id).await?;
        if !is_party(&task, caller) {
            return Err(forbidden(caller, TaskAction::Dispute));
        }
        let expected = task.version();
        task.dispute(&*self.clock)?;
        self.repository.update(&task, expected).await?;
        tracing::info!(task_id = %task_id, disputed_by = %caller.user_id(), "task disputed");
        Ok(task)
    }

    async fn has_proof(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        let Some(thread) = self.chat.find_thread_by_task(task_id).await? else {
            return Ok(false);
        };
        Ok(self.chat.has_proof_message(thread.id()).await?)
    }
}

fn is_party(task: &Task, caller: &Caller) -> bool {
    task.is_poster(caller.user_id()) || task.is_assigned_helper(caller.user_id())
}

/// Asks the gateway to refund `record`, logging rather than returning a
/// failure.
pub(super) async fn refund_quietly<E>(escrow: &E, task_id: TaskId, record: &RefundRecord)
where
    E: EscrowGateway + ?Sized,
{
    let request = RefundRequest {
        task_id,
        payment_id: record.payment_id.clone(),
        amount: record.amount,
    };
    if let Err(err) = escrow.refund(&request).await {
        tracing::error!(
            task_id = %task_id,
            payment_id = %record.payment_id,
            amount = %record.amount,
            error = %err,
            "failed to refund captured payment"
        );
    }
}
