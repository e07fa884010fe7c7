//! Compare-and-set writes, atomic funding, and offer guards against a real
//! `PostgreSQL` database.

use super::helpers::{
    CleanupGuard, ensure_template, link_for, member, offer_from, posted_task, setup_repository,
    test_runtime,
};
use errand::{
    escrow::domain::{CheckoutSessionId, PaymentConfirmationId},
    task::{
        domain::{OfferStatus, TaskStatus, TaskVersion},
        ports::{OfferRepository, TaskRepository, TaskRepositoryError},
    },
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

#[rstest]
fn stale_update_is_a_version_conflict(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_task_cas_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let repo = setup_repository(shared_test_cluster, &db_name).expect("repository setup");
    let rt = test_runtime();

    let poster = member("poster");
    let mut winner = posted_task(&poster);
    rt.block_on(repo.store(&winner)).expect("store");
    let mut loser = winner.clone();
    let read_version = winner.version();
    let first = offer_from(&winner, &member("first"));
    let second = offer_from(&winner, &member("second"));

    winner
        .attach_checkout(link_for(&winner, &first, "cs_winner"), &DefaultClock)
        .expect("requested");
    rt.block_on(repo.update(&winner, read_version))
        .expect("first writer wins");
    loser
        .attach_checkout(link_for(&loser, &second, "cs_loser"), &DefaultClock)
        .expect("requested");
    let result = rt.block_on(repo.update(&loser, read_version));

    assert!(matches!(
        result,
        Err(TaskRepositoryError::VersionConflict { task_id, expected })
            if task_id == winner.id() && expected == read_version
    ));
    let stored = rt
        .block_on(repo.find_by_id(winner.id()))
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.version(), winner.version());
    assert_eq!(
        stored.checkout().map(|link| link.offer_id),
        Some(first.id())
    );
    let by_session = rt
        .block_on(repo.find_by_checkout_session(
            &CheckoutSessionId::new("cs_winner").expect("valid session id"),
        ))
        .expect("lookup");
    assert_eq!(by_session.map(|task| task.id()), Some(winner.id()));
}

#[rstest]
fn update_of_missing_task_is_not_found(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_task_missing_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let repo = setup_repository(shared_test_cluster, &db_name).expect("repository setup");
    let rt = test_runtime();

    let task = posted_task(&member("poster"));
    let result = rt.block_on(repo.update(&task, TaskVersion::INITIAL));

    assert!(matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == task.id()));
}

#[rstest]
fn funding_accepts_one_offer_and_declines_siblings(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_task_funding_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let repo = setup_repository(shared_test_cluster, &db_name).expect("repository setup");
    let rt = test_runtime();

    let poster = member("poster");
    let mut task = posted_task(&poster);
    rt.block_on(repo.store(&task)).expect("store task");
    let offers = ["ana", "ben", "cai"].map(|name| offer_from(&task, &member(name)));
    for offer in &offers {
        rt.block_on(repo.store_offer(offer)).expect("store offer");
    }
    let [first, chosen, third] = &offers;

    let expected = task.version();
    let session_id = CheckoutSessionId::new("cs_funded").expect("valid session id");
    task.attach_checkout(link_for(&task, chosen, "cs_funded"), &DefaultClock)
        .expect("requested");
    rt.block_on(repo.update(&task, expected)).expect("chosen");

    let chosen_version = task.version();
    task.confirm_funding(
        &session_id,
        PaymentConfirmationId::new("pi_funded").expect("valid payment id"),
        &DefaultClock,
    )
    .expect("current session");

    let stale = rt.block_on(repo.accept_funding(&task, TaskVersion::INITIAL, chosen.id()));
    assert!(matches!(
        stale,
        Err(TaskRepositoryError::VersionConflict { .. })
    ));
    let untouched = rt.block_on(repo.list_offers(task.id())).expect("offers");
    assert!(
        untouched
            .iter()
            .all(|offer| offer.status() == OfferStatus::Pending)
    );

    rt.block_on(repo.accept_funding(&task, chosen_version, chosen.id()))
        .expect("funding applies");

    let settled = rt.block_on(repo.list_offers(task.id())).expect("offers");
    let status_of = |id| {
        settled
            .iter()
            .find(|offer| offer.id() == id)
            .map(|offer| offer.status())
    };
    assert_eq!(status_of(chosen.id()), Some(OfferStatus::Accepted));
    assert_eq!(status_of(first.id()), Some(OfferStatus::Declined));
    assert_eq!(status_of(third.id()), Some(OfferStatus::Declined));
    let stored = rt
        .block_on(repo.find_by_id(task.id()))
        .expect("lookup")
        .expect("task exists");
    assert_eq!(stored.status(), TaskStatus::Accepted);
    assert_eq!(stored.helper_id(), Some(chosen.helper_id()));
    let assigned = rt
        .block_on(repo.list_by_helper(chosen.helper_id()))
        .expect("list");
    assert_eq!(assigned.len(), 1);
}

#[rstest]
fn offers_are_refused_once_the_task_is_funded(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_task_offer_guard_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let repo = setup_repository(shared_test_cluster, &db_name).expect("repository setup");
    let rt = test_runtime();

    let poster = member("poster");
    let mut task = posted_task(&poster);
    rt.block_on(repo.store(&task)).expect("store task");
    let chosen = offer_from(&task, &member("chosen"));
    rt.block_on(repo.store_offer(&chosen)).expect("store offer");
    let late = offer_from(&task, &member("late"));

    let expected = task.version();
    task.attach_checkout(link_for(&task, &chosen, "cs_guard"), &DefaultClock)
        .expect("requested");
    rt.block_on(repo.update(&task, expected)).expect("chosen");
    let expected = task.version();
    task.confirm_funding(
        &CheckoutSessionId::new("cs_guard").expect("valid session id"),
        PaymentConfirmationId::new("pi_guard").expect("valid payment id"),
        &DefaultClock,
    )
    .expect("current session");
    rt.block_on(repo.accept_funding(&task, expected, chosen.id()))
        .expect("funded");

    let result = rt.block_on(repo.store_offer(&late));

    assert!(matches!(
        result,
        Err(TaskRepositoryError::TaskNotOpen { task_id, status })
            if task_id == task.id() && status == TaskStatus::Accepted
    ));
    let offers = rt.block_on(repo.list_offers(task.id())).expect("offers");
    assert_eq!(offers.len(), 1);
}
