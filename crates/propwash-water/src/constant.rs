//! Constant strategy: fixed properties regardless of inputs.

use propwash_core::{PropwashError, Result};

use crate::model::{ConstantProperties, PropertyEstimate, WaterPropertyModel};

#[derive(Debug, Clone, Copy)]
pub struct ConstantWater {
    values: ConstantProperties,
}

impl ConstantWater {
    pub fn new(values: ConstantProperties) -> Result<Self> {
        let fields = [
            ("water_model.constant.density_kg_m3", values.density_kg_m3),
            ("water_model.constant.viscosity_pa_s", values.viscosity_pa_s),
            ("water_model.constant.vapor_pressure_pa", values.vapor_pressure_pa),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(PropwashError::invalid(
                    field,
                    format!("must be finite and > 0, got {value}"),
                ));
            }
        }
        Ok(Self { values })
    }
}

impl WaterPropertyModel for ConstantWater {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn density(&self, _t: f64, _s: f64, _p: f64) -> PropertyEstimate {
        PropertyEstimate::exact(self.values.density_kg_m3)
    }

    fn viscosity(&self, _t: f64, _s: f64, _p: f64) -> PropertyEstimate {
        PropertyEstimate::exact(self.values.viscosity_pa_s)
    }

    fn vapor_pressure(&self, _t: f64) -> PropertyEstimate {
        PropertyEstimate::exact(self.values.vapor_pressure_pa)
    }
}
