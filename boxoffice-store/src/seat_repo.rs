use async_trait::async_trait;
use boxoffice_core::{SeatChange, SeatFilter, SeatRepository, StoreError, StoreResult};
use boxoffice_shared::{Seat, SeatStatus};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::error;
use uuid::Uuid;

const SEAT_COLUMNS: &str = "id, event_id, number, status, held_by, held_until, version";

pub struct PgSeatRepository {
    pool: PgPool,
}

impl PgSeatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    event_id: String,
    number: i32,
    status: String,
    held_by: Option<String>,
    held_until: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<SeatRow> for Seat {
    type Error = StoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SeatStatus>()
            .map_err(|e| StoreError::Corrupt(format!("seat {}: {}", row.id, e)))?;

        Ok(Seat {
            id: row.id,
            event_id: row.event_id,
            number: row.number,
            status,
            held_by: row.held_by,
            held_until: row.held_until,
            version: row.version,
        })
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    error!("Seat store query failed: {}", e);
    StoreError::Database(e.to_string())
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &SeatFilter) {
    builder.push(" WHERE TRUE");

    if let Some(event_id) = &filter.event_id {
        builder.push(" AND event_id = ").push_bind(event_id.clone());
    }
    if let Some(number) = filter.number {
        builder.push(" AND number = ").push_bind(number);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<String> = filter
            .statuses
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        builder.push(" AND status = ANY(").push_bind(statuses).push(")");
    }
    if let Some(actor_id) = &filter.held_by {
        builder.push(" AND held_by = ").push_bind(actor_id.clone());
    }
    if let Some(after) = filter.held_until_after {
        builder.push(" AND held_until > ").push_bind(after);
    }
    if let Some(before) = filter.held_until_before {
        builder.push(" AND held_until < ").push_bind(before);
    }
}

fn push_change(builder: &mut QueryBuilder<'static, Postgres>, change: &SeatChange) {
    builder
        .push("UPDATE seats SET status = ")
        .push_bind(change.status.as_str())
        .push(", held_by = ")
        .push_bind(change.held_by.clone())
        .push(", held_until = ")
        .push_bind(change.held_until)
        .push(", version = version + 1");
}

#[async_trait]
impl SeatRepository for PgSeatRepository {
    async fn find_candidate(&self, filter: &SeatFilter) -> StoreResult<Option<Seat>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM seats", SEAT_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY event_id, number LIMIT 1");

        let row = builder
            .build_query_as::<SeatRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Seat::try_from).transpose()
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        expected_version: i64,
        change: &SeatChange,
    ) -> StoreResult<Option<Seat>> {
        let mut builder = QueryBuilder::new("");
        push_change(&mut builder, change);
        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND version = ")
            .push_bind(expected_version)
            .push(format!(" RETURNING {}", SEAT_COLUMNS));

        let row = builder
            .build_query_as::<SeatRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Seat::try_from).transpose()
    }

    async fn bulk_conditional_update(
        &self,
        filter: &SeatFilter,
        change: &SeatChange,
    ) -> StoreResult<u64> {
        let mut builder = QueryBuilder::new("");
        push_change(&mut builder, change);
        push_filter(&mut builder, filter);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }
}
