//! Shared helpers for `PostgreSQL` integration tests.
//!
//! Uses `pg-embed-setup-unpriv` for the embedded cluster. Each test gets its
//! own database cloned from a migrated template.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use errand::{
    escrow::domain::CheckoutSessionId,
    identity::domain::{Caller, PayoutAccountId, UserId},
    task::{
        adapters::postgres::PostgresTaskRepository,
        domain::{CheckoutLink, FeePercent, Money, Offer, Task, TaskCategory, TaskDetails},
    },
};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Marketplace schema.
const CREATE_MARKETPLACE_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_marketplace/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "errand_test_template";

/// Creates a runtime for driving the async repository from sync tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_MARKETPLACE_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Clones the template into `db_name` and returns a repository over it.
pub fn setup_repository(
    cluster: &TestCluster,
    db_name: &str,
) -> Result<PostgresTaskRepository, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresTaskRepository::new(pool))
}

/// Drops the per-test database even when the test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(self.db_name.as_str()));
    }
}

pub fn member(name: &str) -> Caller {
    Caller::member(UserId::new(name).expect("valid user id"), name)
}

/// Posts a $30 task for `poster`.
pub fn posted_task(poster: &Caller) -> Task {
    let details = TaskDetails {
        title: "Clean the garage".to_owned(),
        description: "Sweep and sort boxes".to_owned(),
        category: TaskCategory::Cleaning,
        zip_code: "94110".to_owned(),
        area_description: "Bernal Heights".to_owned(),
        full_address: "77 Cortland Ave".to_owned(),
        photo_required: false,
    };
    Task::post(
        details,
        Decimal::new(3000, 2),
        Money::from_cents(700),
        poster,
        &DefaultClock,
    )
    .expect("valid task")
}

pub fn offer_from(task: &Task, helper: &Caller) -> Offer {
    Offer::submit(task, helper, "Free this weekend", None, &DefaultClock).expect("valid offer")
}

/// Checkout link binding `offer` at the default fee.
pub fn link_for(task: &Task, offer: &Offer, session_id: &str) -> CheckoutLink {
    CheckoutLink {
        session_id: CheckoutSessionId::new(session_id).expect("valid session id"),
        offer_id: offer.id(),
        helper_id: offer.helper_id().clone(),
        helper_name: offer.helper_name().to_owned(),
        payout_account: PayoutAccountId::new(format!("acct_{}", offer.helper_id()))
            .expect("valid payout account"),
        split: FeePercent::default()
            .split(task.price())
            .expect("split fits"),
        selected_at: chrono::Utc::now(),
    }
}
