use std::collections::HashMap;

use aeris_core::document::{validate_document, DocumentType};
use aeris_core::{CoreError, CoreResult};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw passenger fields as supplied by a booking caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerForm {
    pub name: String,
    pub document: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub document_type: DocumentType,
}

impl PassengerForm {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }

        validate_document(self.document_type, &self.document)?;

        if self.birth_date >= Utc::now().date_naive() {
            return Err(CoreError::ValidationError(
                "birth date must be in the past".to_string(),
            ));
        }

        let email = self.email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(CoreError::ValidationError(format!(
                "email address {:?} is not valid",
                self.email
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub document: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub document_type: DocumentType,
}

impl Passenger {
    /// Age in whole years as of today.
    pub fn age(&self) -> i64 {
        (Utc::now().date_naive() - self.birth_date).num_days() / 365
    }
}

impl std::fmt::Display for Passenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.document)
    }
}

/// Trim and title-case a display name: "ana maria" -> "Ana Maria".
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Passenger records deduplicated on document identity.
pub struct PassengerDirectory {
    passengers: HashMap<Uuid, Passenger>,
    by_document: HashMap<String, Uuid>,
}

impl PassengerDirectory {
    pub fn new() -> Self {
        Self {
            passengers: HashMap::new(),
            by_document: HashMap::new(),
        }
    }

    /// Look up by document; create (validated, name-normalized) when
    /// absent. Returns the passenger id and whether a record was created.
    pub fn find_or_create(&mut self, form: &PassengerForm) -> CoreResult<(Uuid, bool)> {
        let document = form.document.trim().to_string();
        if let Some(id) = self.by_document.get(&document) {
            return Ok((*id, false));
        }

        form.validate()?;

        let passenger = Passenger {
            id: Uuid::new_v4(),
            name: normalize_name(&form.name),
            document: document.clone(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            birth_date: form.birth_date,
            document_type: form.document_type,
        };

        let id = passenger.id;
        self.by_document.insert(document, id);
        self.passengers.insert(id, passenger);
        Ok((id, true))
    }

    /// Read-only lookup by document, for validation before any write.
    pub fn peek(&self, document: &str) -> Option<&Passenger> {
        self.by_document
            .get(document.trim())
            .and_then(|id| self.passengers.get(id))
    }

    pub fn get(&self, id: &Uuid) -> Option<&Passenger> {
        self.passengers.get(id)
    }
}

impl Default for PassengerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(document: &str) -> PassengerForm {
        PassengerForm {
            name: "  ana maria lopez ".to_string(),
            document: document.to_string(),
            email: "ana@example.com".to_string(),
            phone: "+54 11 5555 0000".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 14).unwrap(),
            document_type: DocumentType::Dni,
        }
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let mut directory = PassengerDirectory::new();

        let (first, created) = directory.find_or_create(&form("12345678")).unwrap();
        assert!(created);

        let (second, created) = directory.find_or_create(&form("12345678")).unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_is_normalized() {
        let mut directory = PassengerDirectory::new();
        let (id, _) = directory.find_or_create(&form("12345678")).unwrap();

        assert_eq!(directory.get(&id).unwrap().name, "Ana Maria Lopez");
    }

    #[test]
    fn test_existing_record_wins_over_new_fields() {
        let mut directory = PassengerDirectory::new();
        directory.find_or_create(&form("12345678")).unwrap();

        let mut changed = form("12345678");
        changed.email = "other@example.com".to_string();
        let (id, created) = directory.find_or_create(&changed).unwrap();

        assert!(!created);
        assert_eq!(directory.get(&id).unwrap().email, "ana@example.com");
    }

    #[test]
    fn test_future_birth_date_rejected() {
        let mut directory = PassengerDirectory::new();
        let mut bad = form("12345678");
        bad.birth_date = Utc::now().date_naive() + chrono::Duration::days(1);

        assert!(directory.find_or_create(&bad).is_err());
    }

    #[test]
    fn test_dni_length_enforced() {
        let mut directory = PassengerDirectory::new();
        assert!(directory.find_or_create(&form("123")).is_err());

        let mut passport = form("X9");
        passport.document_type = DocumentType::Passport;
        assert!(directory.find_or_create(&passport).is_ok());
    }

    #[test]
    fn test_age_in_whole_years() {
        let passenger = Passenger {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            document: "12345678".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            birth_date: Utc::now().date_naive() - chrono::Duration::days(366 * 30),
            document_type: DocumentType::Dni,
        };

        assert_eq!(passenger.age(), 30);
    }
}
