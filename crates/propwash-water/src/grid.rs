//! PropertyGrid: precomputed (T, S, P) tables with trilinear lookup.
//!
//! A cheaper substitute for evaluating the equation of state every tick.
//! Density and viscosity are stored on a uniform 3D grid (row-major,
//! pressure fastest); vapor pressure on the temperature axis alone.

use std::path::Path;

use serde::{Deserialize, Serialize};

use propwash_core::constants::*;
use propwash_core::{PropwashError, Result};

use crate::model::{PropertyEstimate, WaterPropertyModel};

/// One uniformly spaced axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub min: f64,
    pub max: f64,
    /// Number of nodes, including both ends.
    pub count: usize,
}

impl GridAxis {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self { min, max, count }
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.count < 2 {
            return Err(PropwashError::invalid(
                field,
                format!("axis needs at least 2 nodes, got {}", self.count),
            ));
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(PropwashError::invalid(
                field,
                format!("axis bounds must be finite with min < max, got [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }

    fn step(&self) -> f64 {
        (self.max - self.min) / (self.count - 1) as f64
    }

    /// Coordinate of node `i`.
    pub fn node(&self, i: usize) -> f64 {
        if i + 1 == self.count {
            self.max
        } else {
            self.min + i as f64 * self.step()
        }
    }

    /// Lower cell index and fractional offset for `x`, clamped to the axis.
    fn locate(&self, x: f64) -> (usize, f64, bool) {
        let in_domain = x >= self.min && x <= self.max;
        let clamped = x.clamp(self.min, self.max);
        let pos = (clamped - self.min) / self.step();
        let i0 = (pos.floor() as usize).min(self.count - 2);
        (i0, pos - i0 as f64, in_domain)
    }
}

/// The three axes of a property grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxes {
    pub temperature: GridAxis,
    pub salinity: GridAxis,
    pub pressure: GridAxis,
}

impl Default for GridAxes {
    /// Full model domain: 1 °C, 2 PSU and 10 MPa spacing.
    fn default() -> Self {
        let (t0, t1) = WATER_TEMPERATURE_RANGE_C;
        let (s0, s1) = WATER_SALINITY_RANGE_PSU;
        let (p0, p1) = WATER_PRESSURE_RANGE_PA;
        Self {
            temperature: GridAxis::new(t0, t1, 43),
            salinity: GridAxis::new(s0, s1, 22),
            pressure: GridAxis::new(p0, p1, 11),
        }
    }
}

impl GridAxes {
    /// Small grid over the full domain, for tests and quick starts.
    pub fn coarse() -> Self {
        let (t0, t1) = WATER_TEMPERATURE_RANGE_C;
        let (s0, s1) = WATER_SALINITY_RANGE_PSU;
        let (p0, p1) = WATER_PRESSURE_RANGE_PA;
        Self {
            temperature: GridAxis::new(t0, t1, 15),
            salinity: GridAxis::new(s0, s1, 8),
            pressure: GridAxis::new(p0, p1, 3),
        }
    }

    /// Same domain, `n` nodes on the temperature and salinity axes.
    pub fn with_resolution(n: usize) -> Self {
        let mut axes = Self::default();
        axes.temperature.count = n;
        axes.salinity.count = n;
        axes
    }

    fn cell_count(&self) -> usize {
        self.temperature.count * self.salinity.count * self.pressure.count
    }
}

/// Loaded or tabulated property grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyGrid {
    axes: GridAxes,
    /// Density (kg/m³), row-major over (T, S, P).
    density: Vec<f64>,
    /// Dynamic viscosity (Pa·s), same layout as density.
    viscosity: Vec<f64>,
    /// Vapor pressure (Pa) per temperature node.
    vapor_pressure: Vec<f64>,
}

impl PropertyGrid {
    /// Create a grid from pre-loaded data, validating shapes and values.
    pub fn from_parts(
        axes: GridAxes,
        density: Vec<f64>,
        viscosity: Vec<f64>,
        vapor_pressure: Vec<f64>,
    ) -> Result<Self> {
        let grid = Self {
            axes,
            density,
            viscosity,
            vapor_pressure,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Sample `model` at every node of `axes`.
    pub fn tabulate(model: &dyn WaterPropertyModel, axes: GridAxes) -> Result<Self> {
        axes.temperature.validate("grid.axes.temperature")?;
        axes.salinity.validate("grid.axes.salinity")?;
        axes.pressure.validate("grid.axes.pressure")?;

        let mut density = Vec::with_capacity(axes.cell_count());
        let mut viscosity = Vec::with_capacity(axes.cell_count());
        for it in 0..axes.temperature.count {
            let t = axes.temperature.node(it);
            for is in 0..axes.salinity.count {
                let s = axes.salinity.node(is);
                for ip in 0..axes.pressure.count {
                    let p = axes.pressure.node(ip);
                    density.push(model.density(t, s, p).value);
                    viscosity.push(model.viscosity(t, s, p).value);
                }
            }
        }
        let vapor_pressure = (0..axes.temperature.count)
            .map(|it| model.vapor_pressure(axes.temperature.node(it)).value)
            .collect();

        log::debug!(
            "Tabulated {} property grid: {} nodes",
            model.name(),
            axes.cell_count()
        );
        Self::from_parts(axes, density, viscosity, vapor_pressure)
    }

    /// Axes the tables were tabulated on. Fixed once the grid is built.
    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    fn validate(&self) -> Result<()> {
        self.axes.temperature.validate("grid.axes.temperature")?;
        self.axes.salinity.validate("grid.axes.salinity")?;
        self.axes.pressure.validate("grid.axes.pressure")?;

        let cells = self.axes.cell_count();
        let tables = [
            ("grid.density", &self.density, cells),
            ("grid.viscosity", &self.viscosity, cells),
            ("grid.vapor_pressure", &self.vapor_pressure, self.axes.temperature.count),
        ];
        for (field, values, expected) in tables {
            if values.len() != expected {
                return Err(PropwashError::invalid(
                    field,
                    format!("expected {expected} values, got {}", values.len()),
                ));
            }
            if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
                return Err(PropwashError::invalid(
                    field,
                    format!("values must be finite and > 0, found {bad}"),
                ));
            }
        }
        Ok(())
    }

    fn index(&self, it: usize, is: usize, ip: usize) -> usize {
        (it * self.axes.salinity.count + is) * self.axes.pressure.count + ip
    }

    /// Trilinear interpolation over `values` at (T, S, P).
    fn trilinear(&self, values: &[f64], t: f64, s: f64, p: f64) -> PropertyEstimate {
        let (t0, ft, t_ok) = self.axes.temperature.locate(t);
        let (s0, fs, s_ok) = self.axes.salinity.locate(s);
        let (p0, fp, p_ok) = self.axes.pressure.locate(p);

        let v = |dt: usize, ds: usize, dp: usize| values[self.index(t0 + dt, s0 + ds, p0 + dp)];

        let c00 = v(0, 0, 0) * (1.0 - fp) + v(0, 0, 1) * fp;
        let c01 = v(0, 1, 0) * (1.0 - fp) + v(0, 1, 1) * fp;
        let c10 = v(1, 0, 0) * (1.0 - fp) + v(1, 0, 1) * fp;
        let c11 = v(1, 1, 0) * (1.0 - fp) + v(1, 1, 1) * fp;

        let c0 = c00 * (1.0 - fs) + c01 * fs;
        let c1 = c10 * (1.0 - fs) + c11 * fs;

        PropertyEstimate {
            value: c0 * (1.0 - ft) + c1 * ft,
            in_domain: t_ok && s_ok && p_ok,
        }
    }
}

impl WaterPropertyModel for PropertyGrid {
    fn name(&self) -> &'static str {
        "grid-lookup"
    }

    fn density(&self, temperature_c: f64, salinity_psu: f64, pressure_pa: f64) -> PropertyEstimate {
        self.trilinear(&self.density, temperature_c, salinity_psu, pressure_pa)
    }

    fn viscosity(
        &self,
        temperature_c: f64,
        salinity_psu: f64,
        pressure_pa: f64,
    ) -> PropertyEstimate {
        self.trilinear(&self.viscosity, temperature_c, salinity_psu, pressure_pa)
    }

    fn vapor_pressure(&self, temperature_c: f64) -> PropertyEstimate {
        let (i0, f, in_domain) = self.axes.temperature.locate(temperature_c);
        let lo = self.vapor_pressure[i0];
        let hi = self.vapor_pressure[i0 + 1];
        PropertyEstimate {
            value: lo * (1.0 - f) + hi * f,
            in_domain,
        }
    }
}

/// Load a PropertyGrid from a JSON grid file.
pub fn load_grid(path: &Path) -> Result<PropertyGrid> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PropwashError::unavailable(format!("property grid {}", path.display()), e.to_string())
    })?;
    parse_grid(&text)
}

/// Parse a PropertyGrid from JSON text.
pub fn parse_grid(text: &str) -> Result<PropertyGrid> {
    let grid: PropertyGrid =
        serde_json::from_str(text).map_err(|e| PropwashError::invalid("grid", e.to_string()))?;
    grid.validate()?;
    Ok(grid)
}

/// Write a PropertyGrid to a JSON grid file.
pub fn write_grid(grid: &PropertyGrid, path: &Path) -> Result<()> {
    let text =
        serde_json::to_string(grid).map_err(|e| PropwashError::Export(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}
