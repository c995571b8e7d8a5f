use crate::matrix::{CostMatrix, Totals};
use crate::swarm::{CancelToken, FishSwarm, SearchProfile};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InvalidInputError {
    #[error("at least one stop is required")]
    NoStops,
    #[error("stop `{0}` is the same location as the depot")]
    StopEqualsDepot(String),
    #[error("stop `{0}` appears more than once")]
    DuplicateStop(String),
    #[error("objective weights must be non-negative")]
    NegativeWeight,
    #[error("cost per km must be non-negative")]
    NegativeCostPerKm,
    #[error("cost matrix is {actual}x{actual}, expected {expected}x{expected}")]
    MatrixSizeMismatch { expected: usize, actual: usize },
}

/// Relative priority of the three objectives. Any non-negative scale is
/// accepted; [`ObjectiveWeights::normalized`] brings it onto percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub time: f64,
    pub cost: f64,
    pub carbon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Time,
    Cost,
    Carbon,
}

impl ObjectiveWeights {
    /// Default balanced preset of the delivery dashboard.
    pub fn balanced() -> Self {
        Self { time: 33.0, cost: 33.0, carbon: 34.0 }
    }

    /// Eco-mode preset: carbon dominates.
    pub fn eco() -> Self {
        Self { time: 5.0, cost: 5.0, carbon: 90.0 }
    }

    /// Rescales the weights so they sum to 100. All-zero weights are a
    /// valid degenerate input and normalize to an even split.
    pub fn normalized(&self) -> Self {
        let sum = self.time + self.cost + self.carbon;
        if sum == 0.0 {
            let third = 100.0 / 3.0;
            return Self { time: third, cost: third, carbon: third };
        }
        Self {
            time: self.time * 100.0 / sum,
            cost: self.cost * 100.0 / sum,
            carbon: self.carbon * 100.0 / sum,
        }
    }

    /// The single objective holding the full weight, if any.
    ///
    /// An extreme preference changes both the fitness function (no blend)
    /// and the search profile (bigger budget).
    pub fn extreme_objective(&self) -> Option<Objective> {
        let w = self.normalized();
        if w.cost == 0.0 && w.carbon == 0.0 {
            Some(Objective::Time)
        } else if w.time == 0.0 && w.carbon == 0.0 {
            Some(Objective::Cost)
        } else if w.time == 0.0 && w.cost == 0.0 {
            Some(Objective::Carbon)
        } else {
            None
        }
    }

    /// Scalarizes tour totals into a fitness value, lower is better.
    ///
    /// A 100% single-objective preference returns that raw objective total
    /// exactly, so an intentionally single-objective request is never
    /// diluted by the weighted blend.
    pub fn fitness_of(&self, totals: &Totals) -> f64 {
        match self.extreme_objective() {
            Some(Objective::Time) => totals.distance_km,
            Some(Objective::Cost) => totals.cost,
            Some(Objective::Carbon) => totals.carbon_kg,
            None => {
                let w = self.normalized();
                totals.distance_km * (w.time / 100.0)
                    + totals.cost * (w.cost / 100.0)
                    + totals.carbon_kg * (w.carbon / 100.0)
            }
        }
    }

    fn is_non_negative(&self) -> bool {
        self.time >= 0.0 && self.cost >= 0.0 && self.carbon >= 0.0
    }
}

/// One route-optimization request: a depot that opens and closes the tour,
/// the stops to visit, and how to trade the objectives off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub depot: String,
    pub stops: Vec<String>,
    pub weights: ObjectiveWeights,
    pub cost_per_km: f64,
}

/// Best tour found, expanded into caller-facing quantities. The three
/// totals are always the raw objectives, never the internal fitness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Visiting order starting at the depot; the return leg is implicit.
    pub route: Vec<String>,
    #[serde(rename = "distance")]
    pub distance_km: f64,
    pub cost: f64,
    #[serde(rename = "carbon")]
    pub carbon_kg: f64,
}

/// Rejects a request before any computation starts.
pub fn validate(request: &RouteRequest) -> Result<(), InvalidInputError> {
    if request.stops.is_empty() {
        return Err(InvalidInputError::NoStops);
    }
    for (i, stop) in request.stops.iter().enumerate() {
        if *stop == request.depot {
            return Err(InvalidInputError::StopEqualsDepot(stop.clone()));
        }
        if request.stops[..i].contains(stop) {
            return Err(InvalidInputError::DuplicateStop(stop.clone()));
        }
    }
    if !request.weights.is_non_negative() {
        return Err(InvalidInputError::NegativeWeight);
    }
    if request.cost_per_km < 0.0 {
        return Err(InvalidInputError::NegativeCostPerKm);
    }
    Ok(())
}

/// Runs the fish-swarm search over `matrix` and expands the best tour
/// found into an [`OptimizationResult`].
///
/// Pure apart from `rng`: the same seed and inputs give the same result.
/// On cancellation the best tour found so far is returned, not an error.
pub fn optimize<R: Rng>(
    request: &RouteRequest,
    matrix: &CostMatrix,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<OptimizationResult, InvalidInputError> {
    validate(request)?;
    let expected = request.stops.len() + 1;
    if matrix.size() != expected {
        return Err(InvalidInputError::MatrixSizeMismatch { expected, actual: matrix.size() });
    }

    let weights = request.weights.normalized();
    let profile = SearchProfile::for_weights(&weights);
    let swarm = FishSwarm::new(profile);
    let (tour, _trace) = swarm.run(matrix, &weights, rng, cancel);

    let totals = matrix.tour_totals(&tour);
    let route = tour
        .iter()
        .map(|&idx| {
            if idx == 0 {
                request.depot.clone()
            } else {
                request.stops[idx - 1].clone()
            }
        })
        .collect();

    tracing::info!(
        stops = request.stops.len(),
        distance_km = totals.distance_km,
        cost = totals.cost,
        carbon_kg = totals.carbon_kg,
        "route optimized"
    );

    Ok(OptimizationResult {
        route,
        distance_km: totals.distance_km,
        cost: totals.cost,
        carbon_kg: totals.carbon_kg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{CostMatrix, EdgeCost};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request(stops: &[&str], weights: ObjectiveWeights) -> RouteRequest {
        RouteRequest {
            depot: "A".to_string(),
            stops: stops.iter().map(|s| s.to_string()).collect(),
            weights,
            cost_per_km: 0.15,
        }
    }

    /// Symmetric instance from the delivery dashboard docs: the optimal
    /// cycle A->B->C->D->A has distance 10 + 12 + 8 + 20 = 50.
    fn example_matrix() -> CostMatrix {
        let d = [
            [0.0, 10.0, 15.0, 20.0],
            [10.0, 0.0, 12.0, 18.0],
            [15.0, 12.0, 0.0, 8.0],
            [20.0, 18.0, 8.0, 0.0],
        ];
        CostMatrix::from_fn(4, |from, to| EdgeCost {
            distance_km: d[from][to],
            cost: d[from][to] * 2.0,
            carbon_kg: d[from][to] * 0.12,
        })
    }

    #[test]
    fn normalization_preserves_proportions() {
        let w = ObjectiveWeights { time: 1.0, cost: 1.0, carbon: 2.0 }.normalized();
        assert_eq!(w, ObjectiveWeights { time: 25.0, cost: 25.0, carbon: 50.0 });
    }

    #[test]
    fn all_zero_weights_normalize_to_even_split() {
        let w = ObjectiveWeights { time: 0.0, cost: 0.0, carbon: 0.0 }.normalized();
        assert!((w.time + w.cost + w.carbon - 100.0).abs() < 1e-9);
        assert_eq!(w.time, w.cost);
        assert_eq!(w.cost, w.carbon);
    }

    #[test]
    fn extreme_objective_detection() {
        let time_only = ObjectiveWeights { time: 100.0, cost: 0.0, carbon: 0.0 };
        assert_eq!(time_only.extreme_objective(), Some(Objective::Time));

        // any scale counts, 7/0/0 is still a pure preference
        let carbon_only = ObjectiveWeights { time: 0.0, cost: 0.0, carbon: 7.0 };
        assert_eq!(carbon_only.extreme_objective(), Some(Objective::Carbon));

        let mixed = ObjectiveWeights { time: 50.0, cost: 50.0, carbon: 0.0 };
        assert_eq!(mixed.extreme_objective(), None);
    }

    #[test]
    fn extreme_fitness_is_the_raw_objective() {
        let totals = Totals { distance_km: 123.4, cost: 56.7, carbon_kg: 8.9 };
        let w = ObjectiveWeights { time: 100.0, cost: 0.0, carbon: 0.0 };
        assert_eq!(w.fitness_of(&totals), 123.4);

        let w = ObjectiveWeights { time: 0.0, cost: 100.0, carbon: 0.0 };
        assert_eq!(w.fitness_of(&totals), 56.7);
    }

    #[test]
    fn blended_fitness_uses_percent_fractions() {
        let totals = Totals { distance_km: 100.0, cost: 50.0, carbon_kg: 10.0 };
        let w = ObjectiveWeights { time: 30.0, cost: 30.0, carbon: 40.0 };
        let expected = 100.0 * 0.3 + 50.0 * 0.3 + 10.0 * 0.4;
        assert!((w.fitness_of(&totals) - expected).abs() < 1e-9);
    }

    #[test]
    fn fitness_is_idempotent() {
        let totals = Totals { distance_km: 42.0, cost: 13.0, carbon_kg: 5.0 };
        let w = ObjectiveWeights::balanced();
        assert_eq!(w.fitness_of(&totals), w.fitness_of(&totals));
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let w = ObjectiveWeights::balanced();

        let empty = request(&[], w);
        assert_eq!(validate(&empty), Err(InvalidInputError::NoStops));

        let dup_depot = request(&["B", "A"], w);
        assert_eq!(
            validate(&dup_depot),
            Err(InvalidInputError::StopEqualsDepot("A".to_string()))
        );

        let dup_stop = request(&["B", "C", "B"], w);
        assert_eq!(
            validate(&dup_stop),
            Err(InvalidInputError::DuplicateStop("B".to_string()))
        );

        let negative = request(&["B"], ObjectiveWeights { time: -1.0, cost: 50.0, carbon: 51.0 });
        assert_eq!(validate(&negative), Err(InvalidInputError::NegativeWeight));

        let mut bad_fuel = request(&["B"], w);
        bad_fuel.cost_per_km = -0.1;
        assert_eq!(validate(&bad_fuel), Err(InvalidInputError::NegativeCostPerKm));
    }

    #[test]
    fn matrix_size_mismatch_is_rejected() {
        let req = request(&["B", "C"], ObjectiveWeights::balanced());
        let matrix = example_matrix(); // 4x4, but 2 stops need 3x3
        let mut rng = StdRng::seed_from_u64(0);
        let err = optimize(&req, &matrix, &mut rng, &CancelToken::new()).unwrap_err();
        assert_eq!(err, InvalidInputError::MatrixSizeMismatch { expected: 3, actual: 4 });
    }

    #[test]
    fn time_only_search_finds_the_shortest_cycle() {
        let req = request(&["B", "C", "D"], ObjectiveWeights { time: 100.0, cost: 0.0, carbon: 0.0 });
        let matrix = example_matrix();
        let mut rng = StdRng::seed_from_u64(3);
        let result = optimize(&req, &matrix, &mut rng, &CancelToken::new()).unwrap();

        assert_eq!(result.distance_km, 50.0);
        assert_eq!(result.route.len(), 4);
        assert_eq!(result.route[0], "A");
        for stop in ["B", "C", "D"] {
            assert_eq!(result.route.iter().filter(|s| s.as_str() == stop).count(), 1);
        }
    }

    #[test]
    fn single_stop_is_a_round_trip() {
        let d = [[0.0, 11.0], [13.0, 0.0]];
        let matrix = CostMatrix::from_fn(2, |from, to| EdgeCost {
            distance_km: d[from][to],
            cost: d[from][to] * 2.0,
            carbon_kg: d[from][to] * 0.12,
        });
        let req = request(&["B"], ObjectiveWeights::balanced());
        let mut rng = StdRng::seed_from_u64(0);
        let result = optimize(&req, &matrix, &mut rng, &CancelToken::new()).unwrap();

        assert_eq!(result.route, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(result.distance_km, 24.0);
        assert!((result.carbon_kg - 24.0 * 0.12).abs() < 1e-9);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let req = request(&["B", "C", "D"], ObjectiveWeights::balanced());
        let matrix = example_matrix();

        let a = optimize(&req, &matrix, &mut StdRng::seed_from_u64(9), &CancelToken::new()).unwrap();
        let b = optimize(&req, &matrix, &mut StdRng::seed_from_u64(9), &CancelToken::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn totals_are_non_negative() {
        let req = request(&["B", "C", "D"], ObjectiveWeights::eco());
        let matrix = example_matrix();
        let mut rng = StdRng::seed_from_u64(1);
        let result = optimize(&req, &matrix, &mut rng, &CancelToken::new()).unwrap();

        assert!(result.distance_km >= 0.0);
        assert!(result.cost >= 0.0);
        assert!(result.carbon_kg >= 0.0);
    }
}
