//! Concurrent commands racing the payment webhook.

use super::helpers::{Marketplace, default_marketplace, marketplace, member};
use errand::{
    error::ErrorKind,
    task::{
        domain::{CancelingParty, OfferStatus, TaskStatus},
        ports::OfferRepository,
        services::WebhookOutcome,
    },
};
use rstest::rstest;

const ROUNDS: usize = 16;

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancel_racing_payment_settles_exactly_once() -> eyre::Result<()> {
    for round in 0..ROUNDS {
        let market = default_marketplace()?;
        let poster = member("poster")?;
        let helper = market.helper("helper")?;
        let task = market.post(&poster, 3000).await?;
        let offer = market.offer(&helper, &task).await?;
        let session_id = market.choose(&poster, &offer).await?;
        let payment = format!("pi_race_{round}");

        let (canceled, paid) = tokio::join!(
            market
                .service
                .cancel(&poster, task.id(), CancelingParty::Poster),
            market.pay(&session_id, &payment),
        );
        let outcome = paid??;
        let stored = market.stored(&task).await?;
        let refunds = market.escrow.refunds()?;

        match stored.status() {
            TaskStatus::Canceled => {
                eyre::ensure!(canceled.is_ok(), "round {round}: cancel lost yet task canceled");
                eyre::ensure!(
                    refunds.len() == 1,
                    "round {round}: expected one refund, found {}",
                    refunds.len()
                );
                eyre::ensure!(
                    matches!(
                        outcome,
                        WebhookOutcome::Accepted | WebhookOutcome::RefundedLatePayment
                    ),
                    "round {round}: unexpected outcome {outcome}"
                );
            }
            TaskStatus::Accepted => {
                let kind = canceled.err().map(|err| err.kind());
                eyre::ensure!(
                    kind == Some(ErrorKind::InvalidState),
                    "round {round}: cancel should fail cleanly, got {kind:?}"
                );
                eyre::ensure!(refunds.is_empty(), "round {round}: refund without cancel");
                eyre::ensure!(outcome == WebhookOutcome::Accepted, "round {round}: {outcome}");
            }
            other => eyre::bail!("round {round}: unexpected status {other}"),
        }
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn offers_racing_payment_never_stay_pending() -> eyre::Result<()> {
    for round in 0..ROUNDS {
        let market = default_marketplace()?;
        let poster = member("poster")?;
        let helper = market.helper("helper")?;
        let latecomer = member("latecomer")?;
        let task = market.post(&poster, 3000).await?;
        let offer = market.offer(&helper, &task).await?;
        let session_id = market.choose(&poster, &offer).await?;
        let payment = format!("pi_offer_{round}");

        let (late_offer, paid) = tokio::join!(
            market.offer(&latecomer, &task),
            market.pay(&session_id, &payment),
        );
        eyre::ensure!(paid?? == WebhookOutcome::Accepted, "round {round}: funding failed");

        let offers = market.repository.list_offers(task.id()).await?;
        eyre::ensure!(
            offers
                .iter()
                .all(|stored| stored.status() != OfferStatus::Pending),
            "round {round}: pending offer on funded task"
        );
        if let Ok(accepted) = late_offer {
            let stored = offers
                .iter()
                .find(|candidate| candidate.id() == accepted.id())
                .ok_or_else(|| eyre::eyre!("round {round}: stored offer missing"))?;
            eyre::ensure!(
                stored.status() == OfferStatus::Declined,
                "round {round}: late offer not declined"
            );
        }
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_deliveries_apply_once(marketplace: Marketplace) -> eyre::Result<()> {
    let poster = member("poster")?;
    let helper = marketplace.helper("helper")?;
    let task = marketplace.post(&poster, 3000).await?;
    let offer = marketplace.offer(&helper, &task).await?;
    let session_id = marketplace.choose(&poster, &offer).await?;

    let (first, second) = tokio::join!(
        marketplace.pay(&session_id, "pi_dup"),
        marketplace.pay(&session_id, "pi_dup"),
    );
    let mut outcomes = vec![first??, second??];
    outcomes.sort_by_key(|outcome| outcome.as_str());

    assert_eq!(
        outcomes,
        vec![WebhookOutcome::Accepted, WebhookOutcome::AlreadyProcessed]
    );
    assert_eq!(marketplace.stored(&task).await?.status(), TaskStatus::Accepted);
    Ok(())
}
