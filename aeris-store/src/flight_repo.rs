use aeris_core::{CoreError, CoreResult};
use aeris_schedule::flight::{Flight, FlightStatus};
use aeris_schedule::repository::FlightRepository;
use aeris_schedule::scheduler::ScheduleRequest;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store_err;

pub struct PgFlightRepository {
    pool: PgPool,
}

impl PgFlightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    aircraft_id: Uuid,
    origin: String,
    destination: String,
    departure: chrono::DateTime<chrono::Utc>,
    arrival: chrono::DateTime<chrono::Utc>,
    duration_minutes: i64,
    status: String,
    base_price_cents: i64,
    owner: Option<String>,
}

impl FlightRow {
    fn into_flight(self) -> CoreResult<Flight> {
        let status = FlightStatus::parse(&self.status)
            .ok_or_else(|| CoreError::InternalError(format!("unknown flight status {}", self.status)))?;

        Ok(Flight {
            id: self.id,
            aircraft_id: self.aircraft_id,
            origin: self.origin,
            destination: self.destination,
            departure: self.departure,
            arrival: self.arrival,
            duration_minutes: self.duration_minutes,
            status,
            base_price_cents: self.base_price_cents,
            owner: self.owner,
        })
    }
}

const FLIGHT_COLUMNS: &str = "id, aircraft_id, origin, destination, departure, arrival, \
     duration_minutes, status, base_price_cents, owner";

#[async_trait]
impl FlightRepository for PgFlightRepository {
    async fn schedule_flight(&self, request: ScheduleRequest) -> CoreResult<Flight> {
        let duration = request.validate()?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        // Conflict scan inside the writing transaction: any live flight on
        // the same aircraft whose [departure, arrival) interval overlaps.
        let conflict: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM flights
            WHERE aircraft_id = $1
              AND status IN ('scheduled', 'airborne')
              AND departure < $3
              AND arrival > $2
            LIMIT 1
            "#,
        )
        .bind(request.aircraft_id)
        .bind(request.departure)
        .bind(request.arrival)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;

        if let Some(other) = conflict {
            return Err(CoreError::ConflictError(format!(
                "aircraft {} is already booked by flight {}",
                request.aircraft_id, other
            )));
        }

        let flight = Flight {
            id: Uuid::new_v4(),
            aircraft_id: request.aircraft_id,
            origin: request.origin.trim().to_string(),
            destination: request.destination.trim().to_string(),
            departure: request.departure,
            arrival: request.arrival,
            duration_minutes: duration.num_minutes(),
            status: FlightStatus::Scheduled,
            base_price_cents: request.base_price_cents,
            owner: request.owner,
        };

        sqlx::query(
            r#"
            INSERT INTO flights (id, aircraft_id, origin, destination, departure, arrival,
                                 duration_minutes, status, base_price_cents, owner)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(flight.id)
        .bind(flight.aircraft_id)
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure)
        .bind(flight.arrival)
        .bind(flight.duration_minutes)
        .bind(flight.status.as_str())
        .bind(flight.base_price_cents)
        .bind(&flight.owner)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        tracing::info!(flight_id = %flight.id, aircraft_id = %flight.aircraft_id, "flight scheduled");
        Ok(flight)
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        let row: Option<FlightRow> =
            sqlx::query_as(&format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        row.map(FlightRow::into_flight).transpose()
    }

    async fn list_by_aircraft(&self, aircraft_id: Uuid) -> CoreResult<Vec<Flight>> {
        let rows: Vec<FlightRow> = sqlx::query_as(&format!(
            "SELECT {} FROM flights WHERE aircraft_id = $1 ORDER BY departure",
            FLIGHT_COLUMNS
        ))
        .bind(aircraft_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(FlightRow::into_flight).collect()
    }

    async fn set_status(&self, id: Uuid, status: FlightStatus) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM flights WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;

        let current = current.ok_or_else(|| CoreError::NotFoundError(format!("flight {}", id)))?;
        let current = FlightStatus::parse(&current)
            .ok_or_else(|| CoreError::InternalError(format!("unknown flight status {}", current)))?;

        if !current.can_transition(status) {
            return Err(CoreError::ValidationError(format!(
                "flight cannot move from {} to {}",
                current.as_str(),
                status.as_str()
            )));
        }

        sqlx::query("UPDATE flights SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }
}
