use crate::route::{ObjectiveWeights, RouteRequest};
use once_cell::sync::Lazy;

/// Default fuel cost per kilometre, currency-neutral.
pub const DEFAULT_COST_PER_KM: f64 = 0.15;

/// Credits earned per kg of CO2 saved against a baseline route.
pub const CARBON_CREDIT_PER_KG: f64 = 0.5;

const SAMPLE_DEPOT: &str = "Bengaluru, Karnataka, India";

const SAMPLE_STOPS: [&str; 5] = [
    "Indiranagar, Bengaluru, Karnataka, India",
    "Koramangala, Bengaluru, Karnataka, India",
    "MG Road, Bengaluru, Karnataka, India",
    "Whitefield, Bengaluru, Karnataka, India",
    "Electronic City, Bengaluru, Karnataka, India",
];

/// Built-in demo scenario for when no destination list is supplied.
pub static SAMPLE_SCENARIO: Lazy<RouteRequest> = Lazy::new(|| RouteRequest {
    depot: SAMPLE_DEPOT.to_string(),
    stops: SAMPLE_STOPS.iter().map(|s| s.to_string()).collect(),
    weights: ObjectiveWeights::balanced(),
    cost_per_km: DEFAULT_COST_PER_KM,
});

/// Parses a newline-separated destination list: one location per line,
/// trimmed, blank lines dropped.
pub fn parse_stop_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Carbon credits for emitting less than a baseline route. Never negative:
/// a route that emits more than the baseline earns nothing.
pub fn carbon_credits(baseline_carbon_kg: f64, optimized_carbon_kg: f64) -> f64 {
    ((baseline_carbon_kg - optimized_carbon_kg) * CARBON_CREDIT_PER_KG).max(0.0)
}
