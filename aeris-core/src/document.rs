use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Kinds of travel document accepted for passenger identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Dni,
    Passport,
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Dni => "dni",
            DocumentType::Passport => "passport",
            DocumentType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dni" => Some(DocumentType::Dni),
            "passport" => Some(DocumentType::Passport),
            "other" => Some(DocumentType::Other),
            _ => None,
        }
    }
}

/// Validate a document number against the rules of its kind.
///
/// A DNI carries 7 or 8 characters; other kinds only need to be non-empty.
pub fn validate_document(kind: DocumentType, document: &str) -> CoreResult<()> {
    let document = document.trim();

    if document.is_empty() {
        return Err(CoreError::ValidationError(
            "document must not be empty".to_string(),
        ));
    }

    if kind == DocumentType::Dni && !(7..=8).contains(&document.len()) {
        return Err(CoreError::ValidationError(format!(
            "DNI must have 7 or 8 characters, got {}",
            document.len()
        )));
    }

    Ok(())
}
