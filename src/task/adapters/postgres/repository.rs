//! `PostgreSQL` repository implementation for task and offer storage.

use super::{
    models::{NewOfferRow, OfferRow, TaskRow, TaskWriteRow},
    schema::{offers, tasks},
};
use crate::{
    escrow::domain::CheckoutSessionId,
    identity::domain::UserId,
    task::{
        domain::{
            ConfirmationCode, Money, Offer, OfferId, OfferStatus, PersistedOfferData,
            PersistedTaskData, Task, TaskCategory, TaskDetails, TaskId, TaskState, TaskStatus,
            TaskVersion,
        },
        ports::{
            OfferRepository, TaskFilter, TaskRepository, TaskRepositoryError,
            TaskRepositoryResult,
        },
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Indexed scalar column that disagrees with the decoded task state.
#[derive(Debug, Error)]
#[error("task {task_id}: column {column} disagrees with stored state")]
struct InconsistentRow {
    task_id: TaskId,
    column: &'static str,
}

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task and offer repository.
///
/// Task writes are guarded by a `version` predicate; offer insertion and
/// funding confirmation run inside transactions that lock the task row.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn load_tasks<F>(&self, query: F) -> TaskRepositoryResult<Vec<Task>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Vec<TaskRow>> + Send + 'static,
    {
        self.run_blocking(move |connection| {
            query(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_write_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task, expected: TaskVersion) -> TaskRepositoryResult<()> {
        let row = to_write_row(task)?;
        self.run_blocking(move |connection| compare_and_set(connection, &row, expected))
            .await
    }

    async fn accept_funding(
        &self,
        task: &Task,
        expected: TaskVersion,
        offer_id: OfferId,
    ) -> TaskRepositoryResult<()> {
        let row = to_write_row(task)?;
        let settled_at = task.updated_at();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                compare_and_set(tx, &row, expected)?;

                let belongs = offers::table
                    .filter(offers::id.eq(offer_id.into_inner()))
                    .filter(offers::task_id.eq(row.id))
                    .count()
                    .get_result::<i64>(tx)?;
                if belongs == 0 {
                    return Err(TaskRepositoryError::OfferNotFound(offer_id));
                }

                diesel::update(
                    offers::table
                        .filter(offers::id.eq(offer_id.into_inner()))
                        .filter(offers::status.eq(OfferStatus::Pending.as_str())),
                )
                .set((
                    offers::status.eq(OfferStatus::Accepted.as_str()),
                    offers::updated_at.eq(settled_at),
                ))
                .execute(tx)?;

                diesel::update(
                    offers::table
                        .filter(offers::task_id.eq(row.id))
                        .filter(offers::id.ne(offer_id.into_inner()))
                        .filter(offers::status.eq(OfferStatus::Pending.as_str())),
                )
                .set((
                    offers::status.eq(OfferStatus::Declined.as_str()),
                    offers::updated_at.eq(settled_at),
                ))
                .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_checkout_session(
        &self,
        session_id: &CheckoutSessionId,
    ) -> TaskRepositoryResult<Option<Task>> {
        let lookup = session_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::checkout_session_id.eq(lookup))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let criteria = filter.clone();
        self.load_tasks(move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(status) = criteria.status {
                query = query.filter(tasks::status.eq(status.as_str()));
            }
            if let Some(zip_code) = criteria.zip_code {
                query = query.filter(tasks::zip_code.eq(zip_code));
            }
            if let Some(category) = criteria.category {
                query = query.filter(tasks::category.eq(category.as_str()));
            }
            query.order(tasks::created_at.desc()).load(connection)
        })
        .await
    }

    async fn list_by_poster(&self, poster_id: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        let poster = poster_id.as_str().to_owned();
        self.load_tasks(move |connection| {
            tasks::table
                .filter(tasks::poster_id.eq(poster))
                .select(TaskRow::as_select())
                .order(tasks::created_at.desc())
                .load(connection)
        })
        .await
    }

    async fn list_by_helper(&self, helper_id: &UserId) -> TaskRepositoryResult<Vec<Task>> {
        let helper = helper_id.as_str().to_owned();
        self.load_tasks(move |connection| {
            tasks::table
                .filter(tasks::helper_id.eq(helper))
                .select(TaskRow::as_select())
                .order(tasks::created_at.desc())
                .load(connection)
        })
        .await
    }
}

#[async_trait]
impl OfferRepository for PostgresTaskRepository {
    async fn store_offer(&self, offer: &Offer) -> TaskRepositoryResult<()> {
        let offer_id = offer.id();
        let task_id = offer.task_id();
        let row = to_offer_row(offer)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let status = tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .select(tasks::status)
                    .for_update()
                    .first::<String>(tx)
                    .optional()?
                    .ok_or(TaskRepositoryError::NotFound(task_id))?;
                let parsed =
                    TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?;
                if parsed != TaskStatus::Requested {
                    return Err(TaskRepositoryError::TaskNotOpen {
                        task_id,
                        status: parsed,
                    });
                }

                diesel::insert_into(offers::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateOffer(offer_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn find_offer(&self, id: OfferId) -> TaskRepositoryResult<Option<Offer>> {
        self.run_blocking(move |connection| {
            let row = offers::table
                .filter(offers::id.eq(id.into_inner()))
                .select(OfferRow::as_select())
                .first::<OfferRow>(connection)
                .optional()?;
            row.map(row_to_offer).transpose()
        })
        .await
    }

    async fn list_offers(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Offer>> {
        self.run_blocking(move |connection| {
            offers::table
                .filter(offers::task_id.eq(task_id.into_inner()))
                .select(OfferRow::as_select())
                .order(offers::created_at.asc())
                .load::<OfferRow>(connection)?
                .into_iter()
                .map(row_to_offer)
                .collect()
        })
        .await
    }
}

/// Writes `row` only if the stored version still equals `expected`.
fn compare_and_set(
    connection: &mut PgConnection,
    row: &TaskWriteRow,
    expected: TaskVersion,
) -> TaskRepositoryResult<()> {
    let task_id = TaskId::from_uuid(row.id);
    let expected_version = to_i64(expected.value())?;
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(row.id))
            .filter(tasks::version.eq(expected_version)),
    )
    .set(row)
    .execute(connection)?;
    if updated == 1 {
        return Ok(());
    }

    let exists = tasks::table
        .filter(tasks::id.eq(row.id))
        .count()
        .get_result::<i64>(connection)?;
    if exists == 0 {
        Err(TaskRepositoryError::NotFound(task_id))
    } else {
        Err(TaskRepositoryError::VersionConflict { task_id, expected })
    }
}

fn to_i64(value: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(value).map_err(TaskRepositoryError::persistence)
}

fn to_u64(value: i64) -> TaskRepositoryResult<u64> {
    u64::try_from(value).map_err(TaskRepositoryError::persistence)
}

fn to_write_row(task: &Task) -> TaskRepositoryResult<TaskWriteRow> {
    let details = task.details();
    let checkout = task
        .checkout()
        .map(serde_json::to_value)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    let state = serde_json::to_value(task.state()).map_err(TaskRepositoryError::persistence)?;

    Ok(TaskWriteRow {
        id: task.id().into_inner(),
        poster_id: task.poster_id().as_str().to_owned(),
        poster_name: task.poster_name().to_owned(),
        title: details.title.clone(),
        description: details.description.clone(),
        category: details.category.as_str().to_owned(),
        zip_code: details.zip_code.clone(),
        area_description: details.area_description.clone(),
        full_address: details.full_address.clone(),
        price_cents: to_i64(task.price().cents())?,
        photo_required: details.photo_required,
        confirmation_code: task.confirmation_code().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        helper_id: task.helper_id().map(|helper| helper.as_str().to_owned()),
        checkout_session_id: task
            .checkout()
            .map(|link| link.session_id.as_str().to_owned()),
        checkout,
        state,
        version: to_i64(task.version().value())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        poster_id,
        poster_name,
        title,
        description,
        category,
        zip_code,
        area_description,
        full_address,
        price_cents,
        photo_required,
        confirmation_code,
        status,
        helper_id,
        checkout_session_id,
        checkout,
        state,
        version,
        created_at,
        updated_at,
    } = row;

    let details = TaskDetails {
        title,
        description,
        category: TaskCategory::try_from(category.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        zip_code,
        area_description,
        full_address,
        photo_required,
    };
    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        poster_id: UserId::new(poster_id).map_err(TaskRepositoryError::persistence)?,
        poster_name,
        details,
        price: Money::from_cents(to_u64(price_cents)?),
        confirmation_code: ConfirmationCode::new(confirmation_code)
            .map_err(TaskRepositoryError::persistence)?,
        checkout: checkout
            .map(serde_json::from_value)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        state: serde_json::from_value::<TaskState>(state)
            .map_err(TaskRepositoryError::persistence)?,
        created_at,
        updated_at,
        version: TaskVersion::new(to_u64(version)?),
    };
    let task = Task::from_persisted(data);

    let mismatch = if task.status().as_str() != status {
        Some("status")
    } else if task.helper_id().map(UserId::as_str) != helper_id.as_deref() {
        Some("helper_id")
    } else if task.checkout().map(|link| link.session_id.as_str()) != checkout_session_id.as_deref()
    {
        Some("checkout_session_id")
    } else {
        None
    };
    if let Some(column) = mismatch {
        return Err(TaskRepositoryError::persistence(InconsistentRow {
            task_id: task.id(),
            column,
        }));
    }
    Ok(task)
}

fn to_offer_row(offer: &Offer) -> TaskRepositoryResult<NewOfferRow> {
    Ok(NewOfferRow {
        id: offer.id().into_inner(),
        task_id: offer.task_id().into_inner(),
        helper_id: offer.helper_id().as_str().to_owned(),
        helper_name: offer.helper_name().to_owned(),
        note: offer.note().to_owned(),
        proposed_price_cents: offer
            .proposed_price()
            .map(|price| to_i64(price.cents()))
            .transpose()?,
        status: offer.status().as_str().to_owned(),
        created_at: offer.created_at(),
        updated_at: offer.updated_at(),
    })
}

fn row_to_offer(row: OfferRow) -> TaskRepositoryResult<Offer> {
    let data = PersistedOfferData {
        id: OfferId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        helper_id: UserId::new(row.helper_id).map_err(TaskRepositoryError::persistence)?,
        helper_name: row.helper_name,
        note: row.note,
        proposed_price: row
            .proposed_price_cents
            .map(|cents| to_u64(cents).map(Money::from_cents))
            .transpose()?,
        status: OfferStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Offer::from_persisted(data))
}
