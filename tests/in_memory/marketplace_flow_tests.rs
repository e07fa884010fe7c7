//! End-to-end marketplace flows through the public services.

use super::helpers::{Marketplace, marketplace, member};
use errand::{
    chat::{
        domain::{ChatMessage, MessageBody},
        ports::ChatGateway,
    },
    error::ErrorKind,
    task::{
        domain::{CancelingParty, Money, OfferStatus, PaymentStatus, TaskStatus},
        ports::OfferRepository,
        services::{CreateTaskRequest, WebhookOutcome},
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use rust_decimal::Decimal;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn posting_through_payout(marketplace: Marketplace) -> eyre::Result<()> {
    let poster = member("poster")?;
    let helper = marketplace.helper("helper")?;
    let request = CreateTaskRequest {
        photo_required: true,
        ..super::helpers::task_request(Decimal::new(3000, 2))
    };
    let task = marketplace.service.create_task(&poster, request).await?;
    let offer = marketplace.offer(&helper, &task).await?;
    let session_id = marketplace.choose(&poster, &offer).await?;

    let outcome = marketplace.pay(&session_id, "pi_flow").await??;
    eyre::ensure!(outcome == WebhookOutcome::Accepted, "unexpected {outcome}");

    marketplace.service.start_work(&helper, task.id()).await?;
    let thread = marketplace
        .chat
        .find_thread_by_task(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("chat thread missing"))?;
    marketplace.chat.post_message(ChatMessage::new(
        thread.id(),
        helper.user_id().clone(),
        MessageBody::proof("https://img.example/kitchen.jpg"),
        &DefaultClock,
    )?)?;
    let completed = marketplace.service.complete(&poster, task.id()).await?;

    assert_eq!(completed.status(), TaskStatus::Completed);
    assert_eq!(completed.payment_status(), PaymentStatus::Paid);
    let releases = marketplace.escrow.releases()?;
    assert_eq!(releases.len(), 1);
    let release = releases
        .first()
        .ok_or_else(|| eyre::eyre!("release missing"))?;
    assert_eq!(release.amount, Money::from_cents(2550));
    assert_eq!(release.destination.as_str(), "acct_helper");
    assert_eq!(release.payment_id.as_str(), "pi_flow");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_fee_and_minimum_apply() -> eyre::Result<()> {
    let marketplace = Marketplace::from_settings(&[
        ("ESCROW_WEBHOOK_SECRET", "whsec_custom"),
        ("MIN_JOB_PRICE_USD", "10"),
        ("PLATFORM_FEE_PERCENT", "20"),
    ])?;
    let poster = member("poster")?;
    let helper = marketplace.helper("helper")?;

    let too_cheap = marketplace.post(&poster, 999).await;
    let task = marketplace.post(&poster, 1000).await?;
    let offer = marketplace.offer(&helper, &task).await?;
    let session_id = marketplace.choose(&poster, &offer).await?;
    let checkout = marketplace
        .escrow
        .checkout(&session_id)?
        .ok_or_else(|| eyre::eyre!("checkout missing"))?;

    assert!(too_cheap.is_err());
    assert_eq!(checkout.platform_fee, Money::from_cents(200));
    assert_eq!(checkout.total, Money::from_cents(1000));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn two_offers_one_winner(marketplace: Marketplace) -> eyre::Result<()> {
    let poster = member("poster")?;
    let first = marketplace.helper("first")?;
    let second = marketplace.helper("second")?;
    let task = marketplace.post(&poster, 2000).await?;
    let chosen = marketplace.offer(&first, &task).await?;
    let passed_over = marketplace.offer(&second, &task).await?;
    let session_id = marketplace.choose(&poster, &chosen).await?;

    marketplace.pay(&session_id, "pi_two").await??;

    let offers = marketplace.repository.list_offers(task.id()).await?;
    let status_of = |id| {
        offers
            .iter()
            .find(|offer| offer.id() == id)
            .map(errand::task::domain::Offer::status)
    };
    assert_eq!(status_of(chosen.id()), Some(OfferStatus::Accepted));
    assert_eq!(status_of(passed_over.id()), Some(OfferStatus::Declined));

    let late = marketplace.offer(&member("late")?, &task).await;
    let err = late.err().ok_or_else(|| eyre::eyre!("late offer accepted"))?;
    assert_eq!(
        err.downcast_ref::<errand::task::services::TaskLifecycleError>()
            .map(errand::task::services::TaskLifecycleError::kind),
        Some(ErrorKind::InvalidState)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn canceling_without_offers_charges_nothing(marketplace: Marketplace) -> eyre::Result<()> {
    let poster = member("poster")?;
    let task = marketplace.post(&poster, 1200).await?;

    let canceled = marketplace
        .service
        .cancel(&poster, task.id(), CancelingParty::Poster)
        .await?;

    assert_eq!(canceled.status(), TaskStatus::Canceled);
    assert!(marketplace.escrow.refunds()?.is_empty());
    assert!(marketplace.escrow.expired_sessions()?.is_empty());
    let stored = marketplace.stored(&task).await?;
    assert_eq!(stored.canceled_by(), Some(CancelingParty::Poster));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stranger_cannot_act_on_task(marketplace: Marketplace) -> eyre::Result<()> {
    let poster = member("poster")?;
    let helper = marketplace.helper("helper")?;
    let stranger = member("stranger")?;
    let task = marketplace.post(&poster, 3000).await?;
    let offer = marketplace.offer(&helper, &task).await?;
    let session_id = marketplace.choose(&poster, &offer).await?;
    marketplace.pay(&session_id, "pi_guard").await??;

    let start = marketplace.service.start_work(&stranger, task.id()).await;
    let complete = marketplace.service.complete(&stranger, task.id()).await;
    let view = marketplace.service.get_task(&stranger, task.id()).await?;

    assert_eq!(start.err().map(|err| err.kind()), Some(ErrorKind::Forbidden));
    assert_eq!(complete.err().map(|err| err.kind()), Some(ErrorKind::Forbidden));
    assert_eq!(view.full_address, None);
    assert_eq!(view.helper_name.as_deref(), Some("helper"));
    Ok(())
}
