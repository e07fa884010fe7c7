//! Then steps for marketplace lifecycle BDD scenarios.

use super::world::{MarketplaceWorld, run_async};
use errand::{
    chat::ports::ChatGateway,
    error::ErrorKind,
    task::{
        domain::{Money, OfferStatus, Task, TaskStatus},
        ports::{OfferRepository, TaskRepository},
    },
};
use rstest_bdd_macros::then;

fn stored_task(world: &MarketplaceWorld) -> eyre::Result<Task> {
    let task_id = world.task()?.id();
    run_async(world.repository.find_by_id(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} missing from store"))
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &MarketplaceWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = stored_task(world)?;
    eyre::ensure!(
        task.status() == expected,
        "expected status {expected}, found {}",
        task.status()
    );
    Ok(())
}

#[then("posting fails with an invalid input error")]
fn posting_fails(world: &MarketplaceWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_post
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing posting result"))?;
    let kind = result.as_ref().err().map(errand::task::services::TaskLifecycleError::kind);
    eyre::ensure!(
        kind == Some(ErrorKind::InvalidInput),
        "expected invalid input, got {result:?}"
    );
    Ok(())
}

#[then(r#"the offer from "{helper}" is "{status}""#)]
fn offer_status_is(
    world: &MarketplaceWorld,
    helper: String,
    status: String,
) -> Result<(), eyre::Report> {
    let offer = world
        .offers
        .get(&helper)
        .ok_or_else(|| eyre::eyre!("no offer from {helper}"))?;
    let stored = run_async(world.repository.find_offer(offer.id()))?
        .ok_or_else(|| eyre::eyre!("offer from {helper} missing from store"))?;
    let expected = OfferStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected offer status: {err}"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected offer from {helper} to be {}, found {}",
        expected.as_str(),
        stored.status().as_str()
    );
    Ok(())
}

#[then(r#"a chat thread links the poster and "{helper}""#)]
fn chat_thread_links(world: &MarketplaceWorld, helper: String) -> Result<(), eyre::Report> {
    let poster = world.poster()?;
    let helper_caller = world
        .helpers
        .get(&helper)
        .ok_or_else(|| eyre::eyre!("unknown helper {helper}"))?;
    let thread = run_async(world.chat.find_thread_by_task(world.task()?.id()))?
        .ok_or_else(|| eyre::eyre!("no chat thread opened"))?;
    eyre::ensure!(
        thread.is_participant(poster.user_id()) && thread.is_participant(helper_caller.user_id()),
        "thread participants do not match"
    );
    Ok(())
}

#[then("no refund was requested")]
fn no_refund(world: &MarketplaceWorld) -> Result<(), eyre::Report> {
    let refunds = world.escrow.refunds()?;
    eyre::ensure!(refunds.is_empty(), "unexpected refunds: {refunds:?}");
    Ok(())
}

#[then("the platform fee is {cents:u64} cents")]
fn platform_fee_is(world: &MarketplaceWorld, cents: u64) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    let fee = task
        .assignment()
        .map(|assignment| assignment.split().platform_fee())
        .ok_or_else(|| eyre::eyre!("task has no helper bound"))?;
    eyre::ensure!(fee == Money::from_cents(cents), "platform fee was {fee}");
    Ok(())
}

#[then("the helper receives {cents:u64} cents")]
fn helper_receives(world: &MarketplaceWorld, cents: u64) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    let amount = task
        .assignment()
        .map(|assignment| assignment.split().helper_amount())
        .ok_or_else(|| eyre::eyre!("task has no helper bound"))?;
    eyre::ensure!(
        amount == Money::from_cents(cents),
        "helper amount was {amount}"
    );
    Ok(())
}

#[then(r#"the webhook outcome is "{outcome}""#)]
fn webhook_outcome_is(world: &MarketplaceWorld, outcome: String) -> Result<(), eyre::Report> {
    let result = world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no webhook delivered"))?;
    let actual = result
        .as_ref()
        .map_err(|err| eyre::eyre!("webhook failed: {err}"))?;
    eyre::ensure!(actual.as_str() == outcome, "webhook outcome was {actual}");
    Ok(())
}

#[then("exactly one of cancellation and funding took effect")]
fn exactly_one_settlement(world: &MarketplaceWorld) -> Result<(), eyre::Report> {
    let task = stored_task(world)?;
    let refunds = world.escrow.refunds()?;
    let canceled = world
        .last_cancel
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no cancellation attempted"))?;
    match task.status() {
        TaskStatus::Canceled => {
            eyre::ensure!(canceled.is_ok(), "task canceled but cancel reported {canceled:?}");
            eyre::ensure!(refunds.len() == 1, "expected one refund, found {}", refunds.len());
        }
        TaskStatus::Accepted => {
            eyre::ensure!(canceled.is_err(), "cancel succeeded but task stayed funded");
            eyre::ensure!(refunds.is_empty(), "funded task was refunded");
        }
        other => eyre::bail!("unexpected status {other}"),
    }
    Ok(())
}
