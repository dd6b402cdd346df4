//! Operator inputs and how control commands change them.

use serde::Serialize;

use propwash_core::commands::ControlCommand;
use propwash_core::types::{EnvironmentParameters, PropellerState};
use propwash_core::Result;

/// The mutable inputs the engine reads each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimInputs {
    pub environment: EnvironmentParameters,
    pub propeller: PropellerState,
    pub paused: bool,
}

impl SimInputs {
    pub fn new(environment: EnvironmentParameters, propeller: PropellerState) -> Self {
        Self {
            environment,
            propeller,
            paused: false,
        }
    }

    /// Apply one command. A command that would leave the inputs invalid is
    /// rejected and nothing changes.
    pub fn apply(&mut self, command: ControlCommand) -> Result<()> {
        let mut next = *self;
        match command {
            ControlCommand::SetRpm { rpm } => next.propeller.set_rpm(rpm),
            ControlCommand::SetAdvanceVelocity { velocity_m_s } => {
                next.environment.flow_velocity_m_s = velocity_m_s;
            }
            ControlCommand::SetAmbient {
                pressure_pa,
                temperature_c,
                salinity_psu,
            } => {
                next.environment.pressure_pa = pressure_pa;
                next.environment.temperature_c = temperature_c;
                next.environment.salinity_psu = salinity_psu;
            }
            ControlCommand::SetDensityOverride { density_kg_m3 } => {
                next.environment.density_override_kg_m3 = density_kg_m3;
            }
            ControlCommand::SetViscosityOverride { viscosity_pa_s } => {
                next.environment.viscosity_override_pa_s = viscosity_pa_s;
            }
            ControlCommand::SetGeometry { geometry } => next.propeller.set_geometry(geometry)?,
            ControlCommand::Pause => next.paused = true,
            ControlCommand::Resume => next.paused = false,
        }
        next.environment.validate()?;
        *self = next;
        Ok(())
    }
}
