//! Vehicle footprint catalog.
//!
//! The catalog is read-only configuration shared by every optimization run.
//! Order matters: candidate generation iterates types in catalog order, which
//! keeps candidate lists reproducible.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Base annual price of a standard truck space.
pub const BASE_ANNUAL_PRICE: f64 = 2433.60;

/// Footprint and pricing data for one vehicle type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleSpec {
    /// External identifier (e.g. `"truck"`).
    pub id: String,
    /// Prefix used when labelling spaces (e.g. `"T"` gives `T-1`, `T-2`, ...).
    pub label_prefix: String,
    pub min_length: f64,
    pub min_width: f64,
    pub default_length: f64,
    pub default_width: f64,
    /// Price per space per year at full occupancy.
    pub annual_price: f64,
    /// Turning radius used by the accessibility check.
    pub turning_radius: f64,
}

impl VehicleSpec {
    /// Creates a spec whose minimum dimensions equal its default dimensions.
    pub fn new(id: impl Into<String>, length: f64, width: f64) -> Self {
        let id = id.into();
        let label_prefix = id.chars().next().map(|c| c.to_ascii_uppercase().to_string());
        Self {
            label_prefix: label_prefix.unwrap_or_else(|| "S".to_string()),
            id,
            min_length: length,
            min_width: width,
            default_length: length,
            default_width: width,
            annual_price: BASE_ANNUAL_PRICE,
            turning_radius: 12.0,
        }
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }

    pub fn with_min_dimensions(mut self, length: f64, width: f64) -> Self {
        self.min_length = length;
        self.min_width = width;
        self
    }

    pub fn with_annual_price(mut self, price: f64) -> Self {
        self.annual_price = price;
        self
    }

    pub fn with_turning_radius(mut self, radius: f64) -> Self {
        self.turning_radius = radius;
        self
    }

    /// Area of the default footprint.
    pub fn footprint_area(&self) -> f64 {
        self.default_length * self.default_width
    }

    /// Expected revenue of one space at the given occupancy.
    pub fn expected_revenue(&self, occupancy: f64) -> f64 {
        self.annual_price * occupancy
    }
}

/// Ordered table of vehicle types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleCatalog {
    specs: Vec<VehicleSpec>,
}

impl Default for VehicleCatalog {
    /// Truck, tractor, trailer, EV truck and van.
    fn default() -> Self {
        let price = |multiplier: f64| BASE_ANNUAL_PRICE * multiplier;
        Self {
            specs: vec![
                VehicleSpec::new("truck", 18.5, 3.5)
                    .with_min_dimensions(16.5, 3.2)
                    .with_label_prefix("T")
                    .with_annual_price(price(1.0))
                    .with_turning_radius(12.0),
                VehicleSpec::new("tractor", 8.5, 3.5)
                    .with_min_dimensions(7.0, 3.2)
                    .with_label_prefix("TR")
                    .with_annual_price(price(0.7))
                    .with_turning_radius(10.0),
                VehicleSpec::new("trailer", 14.0, 3.5)
                    .with_min_dimensions(13.6, 3.2)
                    .with_label_prefix("TL")
                    .with_annual_price(price(0.6))
                    .with_turning_radius(12.0),
                VehicleSpec::new("ev", 18.5, 4.5)
                    .with_min_dimensions(16.5, 4.0)
                    .with_label_prefix("EV")
                    .with_annual_price(price(1.3))
                    .with_turning_radius(12.0),
                VehicleSpec::new("van", 7.5, 3.0)
                    .with_min_dimensions(6.0, 2.5)
                    .with_label_prefix("V")
                    .with_annual_price(price(0.5))
                    .with_turning_radius(6.0),
            ],
        }
    }
}

impl VehicleCatalog {
    /// Creates an empty catalog.
    pub fn empty() -> Self {
        Self { specs: Vec::new() }
    }

    /// Adds a spec, replacing any existing spec with the same id in place.
    pub fn with_spec(mut self, spec: VehicleSpec) -> Self {
        match self.specs.iter_mut().find(|s| s.id == spec.id) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&VehicleSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehicleSpec> {
        self.specs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Mean default footprint area over all types (0 for an empty catalog).
    pub fn average_footprint_area(&self) -> f64 {
        if self.specs.is_empty() {
            return 0.0;
        }
        self.specs.iter().map(|s| s.footprint_area()).sum::<f64>() / self.specs.len() as f64
    }
}
