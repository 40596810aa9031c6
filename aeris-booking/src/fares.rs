use std::collections::HashMap;

use aeris_core::{CoreError, CoreResult};
use aeris_fleet::seatmap::CabinClass;

/// Per-cabin fare multipliers applied to a flight's base price.
///
/// Injected into the engine rather than baked in, so deployments can
/// reprice cabins without touching booking logic.
#[derive(Debug, Clone)]
pub struct FarePolicy {
    multipliers: HashMap<CabinClass, f64>,
}

impl FarePolicy {
    pub fn new(multipliers: HashMap<CabinClass, f64>) -> Self {
        Self { multipliers }
    }

    pub fn multiplier(&self, cabin: CabinClass) -> f64 {
        self.multipliers.get(&cabin).copied().unwrap_or(1.0)
    }

    /// The one and only price derivation: base price x cabin multiplier,
    /// in cents, rounded half-up.
    pub fn quote(&self, base_price_cents: i64, cabin: CabinClass) -> CoreResult<i64> {
        if base_price_cents <= 0 {
            return Err(CoreError::ValidationError(
                "base price must be greater than 0".to_string(),
            ));
        }

        let quoted = (base_price_cents as f64 * self.multiplier(cabin)).round() as i64;
        if quoted <= 0 {
            return Err(CoreError::ValidationError(format!(
                "fare multiplier for {} produced a non-positive price",
                cabin.as_str()
            )));
        }

        Ok(quoted)
    }
}

impl Default for FarePolicy {
    fn default() -> Self {
        let mut multipliers = HashMap::new();
        multipliers.insert(CabinClass::Economy, 1.0);
        multipliers.insert(CabinClass::Premium, 1.5);
        multipliers.insert(CabinClass::Business, 2.0);
        Self { multipliers }
    }
}
