//! When steps for marketplace lifecycle BDD scenarios.

use super::{
    given::scenario_request,
    world::{MarketplaceWorld, run_async},
};
use errand::task::domain::CancelingParty;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"the poster posts a task priced "{price}""#)]
fn poster_posts(world: &mut MarketplaceWorld, price: String) -> Result<(), eyre::Report> {
    let poster = world.poster()?.clone();
    let result = run_async(
        world
            .service
            .create_task(&poster, scenario_request(&price)?),
    );
    if let Ok(ref task) = result {
        world.task = Some(task.clone());
    }
    world.last_post = Some(result);
    Ok(())
}

#[when(r#"the poster chooses the offer from "{helper}""#)]
fn poster_chooses(world: &mut MarketplaceWorld, helper: String) -> Result<(), eyre::Report> {
    let poster = world.poster()?.clone();
    let offer = world
        .offers
        .get(&helper)
        .ok_or_else(|| eyre::eyre!("no offer from {helper}"))?;
    let redirect = run_async(
        world
            .service
            .choose_helper(&poster, offer.task_id(), offer.id()),
    )
    .wrap_err("choose helper")?;
    world.session_id = Some(redirect.session_id);
    Ok(())
}

#[when("the escrow confirms payment")]
fn escrow_confirms(world: &mut MarketplaceWorld) -> Result<(), eyre::Report> {
    let (payload, header) = world.signed_completion("pi_bdd")?;
    let outcome = run_async(world.webhooks.handle(&payload, &header));
    world.last_outcome = Some(outcome);
    world.last_delivery = Some((payload, header));
    Ok(())
}

#[when("the same confirmation is delivered again")]
fn confirmation_replayed(world: &mut MarketplaceWorld) -> Result<(), eyre::Report> {
    let (payload, header) = world
        .last_delivery
        .clone()
        .ok_or_else(|| eyre::eyre!("no earlier delivery to replay"))?;
    world.last_outcome = Some(run_async(world.webhooks.handle(&payload, &header)));
    Ok(())
}

#[when("the poster cancels the task")]
fn poster_cancels(world: &mut MarketplaceWorld) -> Result<(), eyre::Report> {
    let poster = world.poster()?.clone();
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .service
            .cancel(&poster, task_id, CancelingParty::Poster),
    );
    world.last_cancel = Some(result);
    Ok(())
}

#[when("the poster cancels while the payment confirmation arrives")]
fn cancel_races_payment(world: &mut MarketplaceWorld) -> Result<(), eyre::Report> {
    let poster = world.poster()?.clone();
    let task_id = world.task()?.id();
    let (payload, header) = world.signed_completion("pi_bdd_race")?;
    let (canceled, outcome) = run_async(async {
        tokio::join!(
            world
                .service
                .cancel(&poster, task_id, CancelingParty::Poster),
            world.webhooks.handle(&payload, &header),
        )
    });
    world.last_cancel = Some(canceled);
    world.last_outcome = Some(outcome);
    Ok(())
}
