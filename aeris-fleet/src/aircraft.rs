use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical aircraft configuration: a rectangular cabin of rows x columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    pub id: Uuid,
    pub model: String,
    pub capacity: i32,
    pub rows: i32,
    pub columns: i32,
}

impl Aircraft {
    pub fn new(model: impl Into<String>, capacity: i32, rows: i32, columns: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            capacity,
            rows,
            columns,
        }
    }

    /// Geometric consistency checks, run on every save.
    pub fn validate(&self) -> CoreResult<()> {
        if self.capacity <= 0 {
            return Err(CoreError::ValidationError(
                "capacity must be greater than 0".to_string(),
            ));
        }

        if self.rows <= 0 || self.columns <= 0 {
            return Err(CoreError::ValidationError(
                "rows and columns must be greater than 0".to_string(),
            ));
        }

        if self.rows * self.columns != self.capacity {
            return Err(CoreError::ValidationError(format!(
                "capacity {} does not match {} rows x {} columns",
                self.capacity, self.rows, self.columns
            )));
        }

        if self.columns != 4 && self.columns != 6 {
            return Err(CoreError::ValidationError(format!(
                "columns must be 4 or 6, got {}",
                self.columns
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Aircraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - capacity {}", self.model, self.capacity)
    }
}

/// Registry of known aircraft. Every write revalidates the geometry,
/// creation and edits alike.
pub struct AircraftRegistry {
    aircraft: HashMap<Uuid, Aircraft>,
}

impl AircraftRegistry {
    pub fn new() -> Self {
        Self {
            aircraft: HashMap::new(),
        }
    }

    pub fn upsert(&mut self, aircraft: Aircraft) -> CoreResult<Uuid> {
        aircraft.validate()?;
        let id = aircraft.id;
        self.aircraft.insert(id, aircraft);
        Ok(id)
    }

    pub fn get(&self, id: &Uuid) -> Option<&Aircraft> {
        self.aircraft.get(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Aircraft> {
        self.aircraft.remove(id)
    }
}

impl Default for AircraftRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_abreast_layout_accepted() {
        let mut registry = AircraftRegistry::new();
        let aircraft = Aircraft::new("A320", 60, 10, 6);
        assert!(registry.upsert(aircraft).is_ok());
    }

    #[test]
    fn test_five_abreast_layout_rejected() {
        let aircraft = Aircraft::new("MD-80", 50, 10, 5);
        let err = aircraft.validate().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_capacity_must_match_geometry() {
        let aircraft = Aircraft::new("A320", 58, 10, 6);
        assert!(aircraft.validate().is_err());
    }

    #[test]
    fn test_edits_revalidate() {
        let mut registry = AircraftRegistry::new();
        let mut aircraft = Aircraft::new("E190", 48, 12, 4);
        let id = registry.upsert(aircraft.clone()).unwrap();

        // A bad edit is rejected and the stored record survives untouched.
        aircraft.capacity = 47;
        assert!(registry.upsert(aircraft).is_err());
        assert_eq!(registry.get(&id).unwrap().capacity, 48);
    }
}
