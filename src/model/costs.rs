//! Layered trip cost estimation.
//!
//! Infers trip distance from the posted rate figures, then prices the trip
//! through seven independently switchable cost layers. Risk is computed
//! last because it is a function of the other six.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::safe_div;
use crate::types::LoadRecord;

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Full cost model: global switch, distance/market model, and one table per layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModelConfig {
    /// When false the profit calculator bypasses every layer.
    pub enabled: bool,
    pub math: MathModelConfig,
    pub fuel: FuelConfig,
    pub driver: DriverConfig,
    pub operating: OperatingConfig,
    pub insurance: InsuranceConfig,
    pub maintenance: MaintenanceConfig,
    pub permits: PermitsConfig,
    pub risk: RiskConfig,
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            math: MathModelConfig::default(),
            fuel: FuelConfig::default(),
            driver: DriverConfig::default(),
            operating: OperatingConfig::default(),
            insurance: InsuranceConfig::default(),
            maintenance: MaintenanceConfig::default(),
            permits: PermitsConfig::default(),
            risk: RiskConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathModelConfig {
    /// Posted rate-per-mile figures overstate loaded miles; this corrects for it.
    pub distance_accuracy_factor: f64,
    pub seasonal_fuel_adjustment: f64,
    pub market_volatility_factor: f64,
    pub risk_assessment_weight: f64,
}

impl Default for MathModelConfig {
    fn default() -> Self {
        Self {
            distance_accuracy_factor: 0.95,
            seasonal_fuel_adjustment: 1.0,
            market_volatility_factor: 0.98,
            risk_assessment_weight: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    pub enabled: bool,
    pub cost_per_gallon: f64,
    pub loaded_mpg: f64,
    /// MPG on deadhead miles. Zero means "same as loaded".
    pub empty_mpg: f64,
    pub idling_cost_per_hour: f64,
    pub idling_hours: f64,
    pub fuel_surcharge_rate: f64,
    /// DEF fluid cost per mile.
    pub def_fluid_cost: f64,
    pub temperature_efficiency: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cost_per_gallon: 3.85,
            loaded_mpg: 6.5,
            empty_mpg: 6.8,
            idling_cost_per_hour: 4.50,
            idling_hours: 2.0,
            fuel_surcharge_rate: 0.08,
            def_fluid_cost: 0.15,
            temperature_efficiency: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub enabled: bool,
    pub pay_per_mile: f64,
    pub per_diem_rate: f64,
    pub days: f64,
    pub bonus_rate: f64,
    pub benefits_rate: f64,
    pub overtime_rate: f64,
    pub overtime_hours: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pay_per_mile: 0.65,
            per_diem_rate: 75.0,
            days: 1.0,
            bonus_rate: 0.05,
            benefits_rate: 0.28,
            overtime_rate: 25.0,
            overtime_hours: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingConfig {
    pub enabled: bool,
    // Fixed, per mile
    pub truck_payments: f64,
    pub truck_depreciation: f64,
    pub trailer_costs: f64,
    pub business_insurance: f64,
    pub licenses: f64,
    pub communications: f64,
    pub accounting: f64,
    pub legal_compliance: f64,
    // Variable, per mile
    pub tolls: f64,
    pub cleaning: f64,
    // Per trip
    pub parking: f64,
    pub scale_tickets: f64,
}

impl Default for OperatingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            truck_payments: 0.45,
            truck_depreciation: 0.25,
            trailer_costs: 0.15,
            business_insurance: 0.12,
            licenses: 0.03,
            communications: 0.05,
            accounting: 0.02,
            legal_compliance: 0.01,
            tolls: 0.08,
            cleaning: 0.02,
            parking: 15.0,
            scale_tickets: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceConfig {
    pub enabled: bool,
    pub primary_liability: f64,
    pub cargo: f64,
    pub physical_damage: f64,
    pub bobtail: f64,
    pub workers_comp: f64,
    pub cargo_value_multiplier: f64,
    pub route_risk_factor: f64,
    pub driver_experience_factor: f64,
}

impl Default for InsuranceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            primary_liability: 0.045,
            cargo: 0.035,
            physical_damage: 0.025,
            bobtail: 0.008,
            workers_comp: 0.007,
            cargo_value_multiplier: 1.0,
            route_risk_factor: 1.0,
            driver_experience_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub engine: f64,
    pub transmission: f64,
    pub brakes: f64,
    pub tires: f64,
    pub trailer: f64,
    pub equipment_age_factor: f64,
    pub mileage_depreciation_factor: f64,
    pub seasonal_factor: f64,
    /// Below 1.0: savings from preventive maintenance.
    pub preventive_factor: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: 0.055,
            transmission: 0.025,
            brakes: 0.035,
            tires: 0.045,
            trailer: 0.020,
            equipment_age_factor: 1.0,
            mileage_depreciation_factor: 1.0,
            seasonal_factor: 1.0,
            preventive_factor: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermitsConfig {
    pub enabled: bool,
    pub overweight: f64,
    pub oversize: f64,
    pub special_commodity: f64,
    pub state: f64,
    pub bridge: f64,
    pub city: f64,
    pub route_complexity_factor: f64,
    pub urgency_factor: f64,
}

impl Default for PermitsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            overweight: 0.015,
            oversize: 0.008,
            special_commodity: 0.012,
            state: 0.008,
            bridge: 0.003,
            city: 0.004,
            route_complexity_factor: 1.0,
            urgency_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub enabled: bool,
    pub contingency_rate: f64,
    pub weather_risk_factor: f64,
    /// Expected equipment-failure cost per mile.
    pub equipment_failure_risk: f64,
    pub market_volatility_buffer: f64,
    /// Share of the posted rate expected to actually be collected.
    pub customer_payment_risk: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            contingency_rate: 0.05,
            weather_risk_factor: 1.0,
            equipment_failure_risk: 0.02,
            market_volatility_buffer: 0.03,
            customer_payment_risk: 0.98,
        }
    }
}

/// Weather delays are priced at 2% of base costs per unit of risk factor.
const WEATHER_IMPACT: f64 = 0.02;

// ---------------------------------------------------------------------------
// Distance model
// ---------------------------------------------------------------------------

/// Trip distance inferred from the posted figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripDistance {
    /// total_rate / rate_per_mile.
    pub theoretical: f64,
    /// Loaded miles after the accuracy correction.
    pub estimated: f64,
    pub deadhead: f64,
    /// Loaded plus deadhead.
    pub total_miles: f64,
}

impl TripDistance {
    pub fn infer(load: &LoadRecord, math: &MathModelConfig) -> Self {
        let theoretical = safe_div(load.total_rate, load.rate_per_mile);
        let estimated = theoretical * math.distance_accuracy_factor;
        let deadhead = f64::from(load.deadhead_miles);
        Self {
            theoretical,
            estimated,
            deadhead,
            total_miles: estimated + deadhead,
        }
    }
}

// ---------------------------------------------------------------------------
// Cost breakdown
// ---------------------------------------------------------------------------

/// One named cost category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostLayer {
    Fuel,
    Driver,
    Operating,
    Insurance,
    Maintenance,
    Permits,
    Risk,
}

impl CostLayer {
    /// All layers in evaluation order.
    pub const ALL: &'static [CostLayer] = &[
        CostLayer::Fuel,
        CostLayer::Driver,
        CostLayer::Operating,
        CostLayer::Insurance,
        CostLayer::Maintenance,
        CostLayer::Permits,
        CostLayer::Risk,
    ];
}

impl fmt::Display for CostLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostLayer::Fuel => write!(f, "fuel"),
            CostLayer::Driver => write!(f, "driver"),
            CostLayer::Operating => write!(f, "operating"),
            CostLayer::Insurance => write!(f, "insurance"),
            CostLayer::Maintenance => write!(f, "maintenance"),
            CostLayer::Permits => write!(f, "permits"),
            CostLayer::Risk => write!(f, "risk"),
        }
    }
}

/// Monetary total per layer. A disabled layer holds exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fuel: f64,
    pub driver: f64,
    pub operating: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub permits: f64,
    pub risk: f64,
}

impl CostBreakdown {
    pub fn get(&self, layer: CostLayer) -> f64 {
        match layer {
            CostLayer::Fuel => self.fuel,
            CostLayer::Driver => self.driver,
            CostLayer::Operating => self.operating,
            CostLayer::Insurance => self.insurance,
            CostLayer::Maintenance => self.maintenance,
            CostLayer::Permits => self.permits,
            CostLayer::Risk => self.risk,
        }
    }

    /// Sum of the six layers the risk layer is priced on.
    pub fn base_total(&self) -> f64 {
        self.fuel + self.driver + self.operating + self.insurance + self.maintenance + self.permits
    }

    /// Sum of all seven layers.
    pub fn total(&self) -> f64 {
        self.base_total() + self.risk
    }

    /// `(layer, cost)` pairs in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (CostLayer, f64)> + '_ {
        CostLayer::ALL.iter().map(move |&layer| (layer, self.get(layer)))
    }

    /// Apply `f` to every layer total.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            fuel: f(self.fuel),
            driver: f(self.driver),
            operating: f(self.operating),
            insurance: f(self.insurance),
            maintenance: f(self.maintenance),
            permits: f(self.permits),
            risk: f(self.risk),
        }
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(layer, cost)| format!("{layer}: ${cost:.2}"))
            .collect();
        write!(f, "{} (total ${:.2})", parts.join(" | "), self.total())
    }
}

// ---------------------------------------------------------------------------
// Layer pricing
// ---------------------------------------------------------------------------

impl FuelConfig {
    fn cost(&self, trip: &TripDistance, seasonal_adjustment: f64) -> f64 {
        let empty_mpg = if self.empty_mpg > 0.0 { self.empty_mpg } else { self.loaded_mpg };
        let gallons = safe_div(trip.estimated, self.loaded_mpg) + safe_div(trip.deadhead, empty_mpg);
        let adjusted_gallons = gallons * seasonal_adjustment * self.temperature_efficiency;

        let base = adjusted_gallons * self.cost_per_gallon;
        let idling = self.idling_hours * self.idling_cost_per_hour;
        let def = trip.total_miles * self.def_fluid_cost;
        let surcharge = base * self.fuel_surcharge_rate;

        base + idling + def + surcharge
    }
}

impl DriverConfig {
    fn cost(&self, trip: &TripDistance) -> f64 {
        let base_pay = trip.estimated * self.pay_per_mile;
        let per_diem = self.days * self.per_diem_rate;
        let bonus = base_pay * self.bonus_rate;
        let benefits = (base_pay + bonus) * self.benefits_rate;
        let overtime = self.overtime_hours * self.overtime_rate;

        base_pay + per_diem + bonus + benefits + overtime
    }
}

impl OperatingConfig {
    fn fixed_per_mile(&self) -> f64 {
        self.truck_payments
            + self.truck_depreciation
            + self.trailer_costs
            + self.business_insurance
            + self.licenses
            + self.communications
            + self.accounting
            + self.legal_compliance
    }

    fn cost(&self, trip: &TripDistance) -> f64 {
        let variable_per_mile = self.tolls + self.cleaning;
        let per_trip = self.parking + self.scale_tickets;
        (self.fixed_per_mile() + variable_per_mile) * trip.total_miles + per_trip
    }
}

impl InsuranceConfig {
    fn cost(&self, trip: &TripDistance) -> f64 {
        let base = (self.primary_liability
            + self.cargo
            + self.physical_damage
            + self.bobtail
            + self.workers_comp)
            * trip.total_miles;

        // Compounding, in this order.
        let cargo_adjusted = base * self.cargo_value_multiplier;
        let route_adjusted = cargo_adjusted * self.route_risk_factor;
        route_adjusted * self.driver_experience_factor
    }
}

impl MaintenanceConfig {
    fn cost(&self, trip: &TripDistance) -> f64 {
        let base = (self.engine + self.transmission + self.brakes + self.tires + self.trailer)
            * trip.total_miles;

        let age_adjusted = base * self.equipment_age_factor;
        let mileage_adjusted = age_adjusted * self.mileage_depreciation_factor;
        let seasonal_adjusted = mileage_adjusted * self.seasonal_factor;
        seasonal_adjusted * self.preventive_factor
    }
}

impl PermitsConfig {
    fn cost(&self, trip: &TripDistance) -> f64 {
        let base = (self.overweight
            + self.oversize
            + self.special_commodity
            + self.state
            + self.bridge
            + self.city)
            * trip.total_miles;

        let complexity_adjusted = base * self.route_complexity_factor;
        complexity_adjusted * self.urgency_factor
    }
}

impl RiskConfig {
    fn cost(&self, trip: &TripDistance, base_costs: f64) -> f64 {
        let contingency = base_costs * self.contingency_rate;
        let weather = base_costs * self.weather_risk_factor * WEATHER_IMPACT;
        let equipment = trip.total_miles * self.equipment_failure_risk;
        let market_volatility = base_costs * self.market_volatility_buffer;

        contingency + weather + equipment + market_volatility
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Inferred distance plus the per-layer prices for one load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub distance: TripDistance,
    pub breakdown: CostBreakdown,
}

/// Price a load through every enabled layer.
///
/// Always recomputed from scratch: the configuration may have changed
/// since the same load was last seen.
pub fn estimate(load: &LoadRecord, config: &CostModelConfig) -> CostEstimate {
    let trip = TripDistance::infer(load, &config.math);
    let mut costs = CostBreakdown::default();

    if config.fuel.enabled {
        costs.fuel = config.fuel.cost(&trip, config.math.seasonal_fuel_adjustment);
    }
    if config.driver.enabled {
        costs.driver = config.driver.cost(&trip);
    }
    if config.operating.enabled {
        costs.operating = config.operating.cost(&trip);
    }
    if config.insurance.enabled {
        costs.insurance = config.insurance.cost(&trip);
    }
    if config.maintenance.enabled {
        costs.maintenance = config.maintenance.cost(&trip);
    }
    if config.permits.enabled {
        costs.permits = config.permits.cost(&trip);
    }
    // Must run last.
    if config.risk.enabled {
        costs.risk = config.risk.cost(&trip, costs.base_total());
    }

    CostEstimate {
        distance: trip,
        breakdown: costs,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
