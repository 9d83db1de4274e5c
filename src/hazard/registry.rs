//! Registry of hazard models selectable by configuration key

use crate::core::config::HazardParams;
use crate::core::error::{Result, SimError};
use crate::hazard::{HazardModel, SaturatingHazards};

/// Resolve a hazard model from its registry key
pub fn create_hazard_model(name: &str, params: &HazardParams) -> Result<Box<dyn HazardModel>> {
    match name {
        "saturating" => Ok(Box::new(SaturatingHazards::new(params.clone()))),
        other => Err(SimError::UnknownImplementation {
            kind: "hazard model",
            name: other.to_string(),
        }),
    }
}
