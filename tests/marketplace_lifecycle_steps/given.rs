//! Given steps for marketplace lifecycle BDD scenarios.

use super::world::{MarketplaceWorld, run_async};
use errand::{
    identity::domain::{Caller, PayoutAccountId, PayoutProfile, UserId},
    task::services::{CreateTaskRequest, SubmitOfferRequest},
};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Builds the request every scenario posts, at `price` dollars.
///
/// # Errors
///
/// Returns an error if `price` is not a decimal.
pub fn scenario_request(price: &str) -> eyre::Result<CreateTaskRequest> {
    Ok(CreateTaskRequest {
        title: "Move a sofa".to_owned(),
        description: "Third floor walk-up to the curb".to_owned(),
        category: "moving".to_owned(),
        zip_code: "02139".to_owned(),
        area_description: "Central Square".to_owned(),
        full_address: "700 Massachusetts Ave".to_owned(),
        price: Decimal::from_str(price).wrap_err("scenario price")?,
        photo_required: false,
    })
}

#[given(r#"a poster named "{name}""#)]
fn poster_named(world: &mut MarketplaceWorld, name: String) -> Result<(), eyre::Report> {
    world.poster = Some(Caller::member(UserId::new(name.as_str())?, name));
    Ok(())
}

#[given(r#"the poster has posted a task priced "{price}""#)]
fn poster_has_posted(world: &mut MarketplaceWorld, price: String) -> Result<(), eyre::Report> {
    let poster = world.poster()?.clone();
    let task = run_async(
        world
            .service
            .create_task(&poster, scenario_request(&price)?),
    )
    .wrap_err("post task in scenario setup")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#"helper "{name}" has offered"#)]
fn helper_has_offered(world: &mut MarketplaceWorld, name: String) -> Result<(), eyre::Report> {
    let helper = Caller::member(UserId::new(name.as_str())?, name.as_str());
    let account = PayoutAccountId::new(format!("acct_{name}"))?;
    world
        .payouts
        .register(helper.user_id().clone(), PayoutProfile::new(account, true))?;

    let task_id = world.task()?.id();
    let offer = run_async(
        world
            .service
            .submit_offer(&helper, SubmitOfferRequest::new(task_id, "Free this weekend")),
    )
    .wrap_err("submit offer in scenario setup")?;
    world.offers.insert(name.clone(), offer);
    world.helpers.insert(name, helper);
    Ok(())
}
