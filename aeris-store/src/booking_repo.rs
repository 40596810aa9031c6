use std::collections::HashMap;

use aeris_booking::engine::{BookingConfirmation, FlightOccupancy};
use aeris_booking::passenger::{normalize_name, PassengerForm};
use aeris_booking::repository::ReservationRepository;
use aeris_booking::reservation::{Reservation, ReservationStatus};
use aeris_booking::ticket::{generate_barcode, Ticket};
use aeris_booking::FarePolicy;
use aeris_core::{CoreError, CoreResult};
use aeris_fleet::seatmap::{CabinClass, Seat};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::fleet_repo::SeatRow;
use crate::store_err;

/// Transactional reservation path: the seat re-check, uniqueness checks,
/// and every write share one transaction, so concurrent bookings of the
/// same seat race on the row lock and exactly one commits.
pub struct PgReservationRepository {
    pool: PgPool,
    fares: FarePolicy,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool, fares: FarePolicy) -> Self {
        Self { pool, fares }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    flight_id: Uuid,
    passenger_id: Uuid,
    seat_id: Uuid,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    price_cents: i64,
    confirmation_code: Uuid,
}

impl ReservationRow {
    fn into_reservation(self) -> CoreResult<Reservation> {
        let status = ReservationStatus::parse(&self.status).ok_or_else(|| {
            CoreError::InternalError(format!("unknown reservation status {}", self.status))
        })?;

        Ok(Reservation {
            id: self.id,
            flight_id: self.flight_id,
            passenger_id: self.passenger_id,
            seat_id: self.seat_id,
            status,
            created_at: self.created_at,
            price_cents: self.price_cents,
            confirmation_code: self.confirmation_code,
        })
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn list_available_seats(
        &self,
        flight_id: Uuid,
        cabin: Option<CabinClass>,
    ) -> CoreResult<Vec<Seat>> {
        let aircraft_id: Option<Uuid> =
            sqlx::query_scalar("SELECT aircraft_id FROM flights WHERE id = $1")
                .bind(flight_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        let aircraft_id =
            aircraft_id.ok_or_else(|| CoreError::NotFoundError(format!("flight {}", flight_id)))?;

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

    async fn create_reservation(
        &self,
        flight_id: Uuid,
        seat_id: Uuid,
        form: &PassengerForm,
    ) -> CoreResult<BookingConfirmation> {
        form.validate()?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let flight: Option<(Uuid, i64)> =
            sqlx::query_as("SELECT aircraft_id, base_price_cents FROM flights WHERE id = $1")
                .bind(flight_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;
        let (flight_aircraft, base_price_cents) =
            flight.ok_or_else(|| CoreError::NotFoundError(format!("flight {}", flight_id)))?;

        // Lock the seat row: the check and the flip below commit together,
        // and a concurrent booking of the same seat waits here, then sees
        // the status we wrote.
        let seat = sqlx::query(
            "SELECT aircraft_id, number, cabin, status FROM seats WHERE id = $1 FOR UPDATE",
        )
        .bind(seat_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or_else(|| CoreError::NotFoundError(format!("seat {}", seat_id)))?;

        let seat_aircraft: Uuid = seat.get("aircraft_id");
        let seat_number: String = seat.get("number");
        let seat_cabin: String = seat.get("cabin");
        let seat_status: String = seat.get("status");

        if seat_aircraft != flight_aircraft {
            return Err(CoreError::ValidationError(format!(
                "seat {} does not belong to the flight's aircraft",
                seat_number
            )));
        }
        if seat_status != "available" {
            return Err(CoreError::SeatUnavailableError(format!(
                "seat {} is {}",
                seat_number, seat_status
            )));
        }

        // Constraint-backed upsert: the unique document index decides the
        // race between two first-time bookings of the same passenger.
        sqlx::query(
            r#"
            INSERT INTO passengers (id, name, document, email, phone, birth_date, document_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (document) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(normalize_name(&form.name))
        .bind(form.document.trim())
        .bind(form.email.trim())
        .bind(form.phone.trim())
        .bind(form.birth_date)
        .bind(form.document_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        let passenger_id: Uuid = sqlx::query_scalar("SELECT id FROM passengers WHERE document = $1")
            .bind(form.document.trim())
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

        let duplicate: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM reservations
            WHERE flight_id = $1 AND passenger_id = $2 AND status = 'active'
            LIMIT 1
            "#,
        )
        .bind(flight_id)
        .bind(passenger_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;
        if duplicate.is_some() {
            return Err(CoreError::DuplicateReservationError(format!(
                "passenger {} already holds an active reservation on this flight",
                form.document.trim()
            )));
        }

        let cabin = CabinClass::parse(&seat_cabin)
            .ok_or_else(|| CoreError::InternalError(format!("unknown cabin {}", seat_cabin)))?;
        let price_cents = self.fares.quote(base_price_cents, cabin)?;

        let reservation = Reservation::new(flight_id, passenger_id, seat_id, price_cents);
        sqlx::query(
            r#"
            INSERT INTO reservations (id, flight_id, passenger_id, seat_id, status,
                                      created_at, price_cents, confirmation_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.flight_id)
        .bind(reservation.passenger_id)
        .bind(reservation.seat_id)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.price_cents)
        .bind(reservation.confirmation_code)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query("UPDATE seats SET status = 'held' WHERE id = $1")
            .bind(seat_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        // Barcode: regenerate until unused; the unique index still backs
        // the rare concurrent collision.
        let mut barcode = generate_barcode();
        loop {
            let taken: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tickets WHERE barcode = $1")
                .bind(&barcode)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;
            if taken.is_none() {
                break;
            }
            barcode = generate_barcode();
        }

        let ticket = Ticket::new(reservation.id, barcode);
        sqlx::query(
            r#"
            INSERT INTO tickets (id, reservation_id, barcode, issued_at, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.reservation_id)
        .bind(&ticket.barcode)
        .bind(ticket.issued_at)
        .bind(ticket.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        tracing::info!(
            reservation_id = %reservation.id,
            flight_id = %flight_id,
            seat = %seat_number,
            price_cents,
            "reservation created"
        );

        Ok(BookingConfirmation {
            reservation,
            ticket,
        })
    }

    async fn cancel_reservation(&self, id: Uuid) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query("SELECT seat_id, status FROM reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_err)?
            .ok_or_else(|| CoreError::NotFoundError(format!("reservation {}", id)))?;

        let seat_id: Uuid = row.get("seat_id");
        let status: String = row.get("status");

        match status.as_str() {
            // Idempotent: already cancelled means nothing left to release.
            "cancelled" => return Ok(()),
            "completed" => {
                return Err(CoreError::ValidationError(
                    "a completed reservation cannot be cancelled".to_string(),
                ))
            }
            _ => {}
        }

        sqlx::query("UPDATE reservations SET status = 'cancelled' WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        sqlx::query("UPDATE seats SET status = 'available' WHERE id = $1 AND status = 'held'")
            .bind(seat_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        // Ticket absence is tolerated: zero rows updated is fine.
        sqlx::query("UPDATE tickets SET status = 'voided' WHERE reservation_id = $1 AND status = 'issued'")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        tracing::info!(reservation_id = %id, "reservation cancelled");
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> CoreResult<Reservation> {
        let parsed = Uuid::parse_str(code.trim())
            .map_err(|_| CoreError::NotFoundError(format!("reservation code {}", code)))?;

        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
            SELECT id, flight_id, passenger_id, seat_id, status, created_at,
                   price_cents, confirmation_code
            FROM reservations
            WHERE confirmation_code = $1
            "#,
        )
        .bind(parsed)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.ok_or_else(|| CoreError::NotFoundError(format!("reservation code {}", code)))?
            .into_reservation()
    }

    async fn flight_occupancy(&self, flight_id: Uuid) -> CoreResult<FlightOccupancy> {
        let aircraft_id: Option<Uuid> =
            sqlx::query_scalar("SELECT aircraft_id FROM flights WHERE id = $1")
                .bind(flight_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        let aircraft_id =
            aircraft_id.ok_or_else(|| CoreError::NotFoundError(format!("flight {}", flight_id)))?;

        let rows = sqlx::query("SELECT cabin, status FROM seats WHERE aircraft_id = $1")
            .bind(aircraft_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        let total = rows.len();
        let mut available = 0usize;
        let mut by_cabin: HashMap<CabinClass, usize> = HashMap::new();

        for row in rows {
            let status: String = row.get("status");
            if status != "available" {
                continue;
            }
            available += 1;

            let cabin: String = row.get("cabin");
            let cabin = CabinClass::parse(&cabin)
                .ok_or_else(|| CoreError::InternalError(format!("unknown cabin {}", cabin)))?;
            *by_cabin.entry(cabin).or_insert(0) += 1;
        }

        let percent = if total == 0 {
            0.0
        } else {
            (total - available) as f64 / total as f64 * 100.0
        };

        Ok(FlightOccupancy {
            available,
            total,
            by_cabin,
            percent,
        })
    }
}
