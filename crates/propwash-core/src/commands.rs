//! Control commands. All operator inputs flow through these.

use serde::{Deserialize, Serialize};

use crate::types::PropellerGeometry;

/// Commands sent by a control surface (UI, scripted scenario) to the runner.
/// Applied between ticks, never in the middle of one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ControlCommand {
    SetRpm {
        rpm: f64,
    },
    SetAdvanceVelocity {
        velocity_m_s: f64,
    },
    /// Replace the ambient state that drives the property model.
    SetAmbient {
        pressure_pa: f64,
        temperature_c: f64,
        salinity_psu: f64,
    },
    /// `None` returns density to the property model.
    SetDensityOverride {
        density_kg_m3: Option<f64>,
    },
    SetViscosityOverride {
        viscosity_pa_s: Option<f64>,
    },
    SetGeometry {
        geometry: PropellerGeometry,
    },
    Pause,
    Resume,
}
