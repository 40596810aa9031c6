use aeris_core::{CoreError, CoreResult};
use aeris_fleet::aircraft::Aircraft;
use aeris_fleet::repository::FleetRepository;
use aeris_fleet::seatmap::{CabinClass, CabinLayout, Seat, SeatStatus, COLUMN_LETTERS};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store_err;

pub struct PgFleetRepository {
    pool: PgPool,
}

impl PgFleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AircraftRow {
    id: Uuid,
    model: String,
    capacity: i32,
    row_count: i32,
    column_count: i32,
}

impl From<AircraftRow> for Aircraft {
    fn from(row: AircraftRow) -> Self {
        Aircraft {
            id: row.id,
            model: row.model,
            capacity: row.capacity,
            rows: row.row_count,
            columns: row.column_count,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeatRow {
    pub id: Uuid,
    pub aircraft_id: Uuid,
    pub number: String,
    pub seat_row: i32,
    pub seat_col: String,
    pub cabin: String,
    pub status: String,
}

impl SeatRow {
    pub(crate) fn into_seat(self) -> CoreResult<Seat> {
        let column = self
            .seat_col
            .chars()
            .next()
            .ok_or_else(|| CoreError::InternalError("empty seat column".to_string()))?;
        let cabin = CabinClass::parse(&self.cabin)
            .ok_or_else(|| CoreError::InternalError(format!("unknown cabin {}", self.cabin)))?;
        let status = SeatStatus::parse(&self.status)
            .ok_or_else(|| CoreError::InternalError(format!("unknown seat status {}", self.status)))?;

        Ok(Seat::restore(
            self.id,
            self.aircraft_id,
            self.number,
            self.seat_row,
            column,
            cabin,
            status,
        ))
    }
}

#[async_trait]
impl FleetRepository for PgFleetRepository {
    async fn save_aircraft(&self, aircraft: &Aircraft, layout: &CabinLayout) -> CoreResult<Uuid> {
        aircraft.validate()?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        sqlx::query(
            r#"
            INSERT INTO aircraft (id, model, capacity, row_count, column_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                model = EXCLUDED.model,
                capacity = EXCLUDED.capacity,
                row_count = EXCLUDED.row_count,
                column_count = EXCLUDED.column_count
            "#,
        )
        .bind(aircraft.id)
        .bind(&aircraft.model)
        .bind(aircraft.capacity)
        .bind(aircraft.rows)
        .bind(aircraft.columns)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seats WHERE aircraft_id = $1")
            .bind(aircraft.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

        if existing == 0 {
            for row in 1..=aircraft.rows {
                for column in &COLUMN_LETTERS[..aircraft.columns as usize] {
                    let cabin = layout.cabin_for_row(row);
                    sqlx::query(
                        r#"
                        INSERT INTO seats (id, aircraft_id, number, seat_row, seat_col, cabin, status)
                        VALUES ($1, $2, $3, $4, $5, $6, 'available')
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(aircraft.id)
                    .bind(format!("{}{}", row, column))
                    .bind(row)
                    .bind(column.to_string())
                    .bind(cabin.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(store_err)?;
                }
            }
            tracing::info!(aircraft_id = %aircraft.id, seats = aircraft.capacity, "provisioned seat map");
        }

        tx.commit().await.map_err(store_err)?;
        Ok(aircraft.id)
    }

    async fn get_aircraft(&self, id: Uuid) -> CoreResult<Option<Aircraft>> {
        let row: Option<AircraftRow> = sqlx::query_as(
            "SELECT id, model, capacity, row_count, column_count FROM aircraft WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(Aircraft::from))
    }

    async fn delete_aircraft(&self, id: Uuid) -> CoreResult<()> {
        // Seats, flights, reservations, and tickets go with it via
        // ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM aircraft WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFoundError(format!("aircraft {}", id)));
        }

        Ok(())
    }

    async fn available_seats(
        &self,
        aircraft_id: Uuid,
        cabin: Option<CabinClass>,
    ) -> CoreResult<Vec<Seat>> {
        let rows: Vec<SeatRow> = match cabin {
            Some(cabin) => {
                sqlx::query_as(
                    r#"
                    SELECT id, aircraft_id, number, seat_row, seat_col, cabin, status
                    FROM seats
                    WHERE aircraft_id = $1 AND status = 'available' AND cabin = $2
                    ORDER BY seat_row, seat_col
                    "#,
                )
                .bind(aircraft_id)
                .bind(cabin.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, aircraft_id, number, seat_row, seat_col, cabin, status
                    FROM seats
                    WHERE aircraft_id = $1 AND status = 'available'
                    ORDER BY seat_row, seat_col
                    "#,
                )
                .bind(aircraft_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        rows.into_iter().map(SeatRow::into_seat).collect()
    }
}
