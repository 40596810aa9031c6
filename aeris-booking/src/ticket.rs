use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Issued,
    Voided,
    Used,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Issued => "issued",
            TicketStatus::Voided => "voided",
            TicketStatus::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(TicketStatus::Issued),
            "voided" => Some(TicketStatus::Voided),
            "used" => Some(TicketStatus::Used),
            _ => None,
        }
    }
}

/// The boarding artifact issued for a confirmed reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub barcode: String,
    pub issued_at: DateTime<Utc>,
    pub status: TicketStatus,
}

impl Ticket {
    pub fn new(reservation_id: Uuid, barcode: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            reservation_id,
            barcode,
            issued_at: Utc::now(),
            status: TicketStatus::Issued,
        }
    }
}

/// One candidate barcode: "BOL-" plus 8 uppercase alphanumerics. Callers
/// must still check for collisions against issued tickets.
pub fn generate_barcode() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("BOL-{}", token.to_ascii_uppercase())
}

/// Issues and voids tickets, one per reservation.
pub struct TicketService {
    tickets: HashMap<Uuid, Ticket>,
    by_barcode: HashMap<String, Uuid>,
    by_reservation: HashMap<Uuid, Uuid>,
}

impl TicketService {
    pub fn new() -> Self {
        Self {
            tickets: HashMap::new(),
            by_barcode: HashMap::new(),
            by_reservation: HashMap::new(),
        }
    }

    /// Issue the ticket for a reservation, regenerating the barcode until
    /// it is unique among issued tickets.
    pub fn issue(&mut self, reservation_id: Uuid) -> CoreResult<Ticket> {
        if self.by_reservation.contains_key(&reservation_id) {
            return Err(CoreError::ValidationError(format!(
                "reservation {} is already ticketed",
                reservation_id
            )));
        }

        let mut barcode = generate_barcode();
        while self.by_barcode.contains_key(&barcode) {
            barcode = generate_barcode();
        }

        let ticket = Ticket::new(reservation_id, barcode.clone());
        self.by_barcode.insert(barcode, ticket.id);
        self.by_reservation.insert(reservation_id, ticket.id);
        self.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    /// Issued -> Voided as part of reservation cancellation. A missing or
    /// already-voided ticket is tolerated; returns whether a ticket moved.
    pub fn void_for_reservation(&mut self, reservation_id: &Uuid) -> bool {
        let ticket = self
            .by_reservation
            .get(reservation_id)
            .and_then(|id| self.tickets.get_mut(id));

        match ticket {
            Some(t) if t.status == TicketStatus::Issued => {
                t.status = TicketStatus::Voided;
                true
            }
            _ => false,
        }
    }

    pub fn find_by_barcode(&self, barcode: &str) -> Option<&Ticket> {
        self.by_barcode
            .get(barcode)
            .and_then(|id| self.tickets.get(id))
    }

    pub fn get_for_reservation(&self, reservation_id: &Uuid) -> Option<&Ticket> {
        self.by_reservation
            .get(reservation_id)
            .and_then(|id| self.tickets.get(id))
    }

    /// Drop the ticket record entirely; used by the aircraft cascade.
    pub fn remove_for_reservation(&mut self, reservation_id: &Uuid) -> Option<Ticket> {
        let id = self.by_reservation.remove(reservation_id)?;
        let ticket = self.tickets.remove(&id)?;
        self.by_barcode.remove(&ticket.barcode);
        Some(ticket)
    }
}

impl Default for TicketService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_shape() {
        let barcode = generate_barcode();
        let token = barcode.strip_prefix("BOL-").unwrap();

        assert_eq!(token.len(), 8);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_one_ticket_per_reservation() {
        let mut service = TicketService::new();
        let reservation_id = Uuid::new_v4();

        service.issue(reservation_id).unwrap();
        assert!(service.issue(reservation_id).is_err());
    }

    #[test]
    fn test_void_is_tolerant() {
        let mut service = TicketService::new();
        let reservation_id = Uuid::new_v4();

        // No ticket at all: tolerated.
        assert!(!service.void_for_reservation(&reservation_id));

        service.issue(reservation_id).unwrap();
        assert!(service.void_for_reservation(&reservation_id));

        // Second void is a no-op.
        assert!(!service.void_for_reservation(&reservation_id));
        assert_eq!(
            service.get_for_reservation(&reservation_id).unwrap().status,
            TicketStatus::Voided
        );
    }

    #[test]
    fn test_find_by_barcode() {
        let mut service = TicketService::new();
        let ticket = service.issue(Uuid::new_v4()).unwrap();

        let found = service.find_by_barcode(&ticket.barcode).unwrap();
        assert_eq!(found.id, ticket.id);
        assert!(service.find_by_barcode("BOL-MISSING1").is_none());
    }
}
