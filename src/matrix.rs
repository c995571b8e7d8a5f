use rand::Rng;

/// Lower bound of a synthesized urban leg, in kilometres.
pub const URBAN_MIN_KM: f64 = 5.0;
/// Span above [`URBAN_MIN_KM`] for a synthesized leg, in kilometres.
pub const URBAN_SPAN_KM: f64 = 20.0;
/// Average passenger-vehicle emissions, kg CO2 per kilometre.
pub const EMISSION_FACTOR_KG_PER_KM: f64 = 0.12;

/// Travel quantities for one directed edge between two locations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCost {
    pub distance_km: f64,
    pub cost: f64,
    pub carbon_kg: f64,
}

impl EdgeCost {
    pub const ZERO: EdgeCost = EdgeCost {
        distance_km: 0.0,
        cost: 0.0,
        carbon_kg: 0.0,
    };
}

/// Accumulated quantities along a whole tour, including the closing edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub distance_km: f64,
    pub cost: f64,
    pub carbon_kg: f64,
}

impl Totals {
    fn add(&mut self, edge: EdgeCost) {
        self.distance_km += edge.distance_km;
        self.cost += edge.cost;
        self.carbon_kg += edge.carbon_kg;
    }
}

/// Square, asymmetric-capable matrix of edge costs over `{depot} ∪ stops`.
///
/// Index 0 is the depot. The diagonal is zero and never read by the
/// optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    edges: Vec<EdgeCost>,
}

impl CostMatrix {
    /// Builds a matrix by calling `edge_fn(from, to)` for every ordered
    /// pair. The diagonal is forced to zero regardless of `edge_fn`.
    pub fn from_fn(size: usize, mut edge_fn: impl FnMut(usize, usize) -> EdgeCost) -> Self {
        let mut edges = Vec::with_capacity(size * size);
        for from in 0..size {
            for to in 0..size {
                if from == to {
                    edges.push(EdgeCost::ZERO);
                } else {
                    edges.push(edge_fn(from, to));
                }
            }
        }
        Self { size, edges }
    }

    /// Matrix dimension: number of stops + 1 for the depot.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn edge(&self, from: usize, to: usize) -> EdgeCost {
        self.edges[from * self.size + to]
    }

    /// Sums distance, cost and carbon over consecutive tour edges plus the
    /// return edge from the last visited location back to the tour start.
    pub fn tour_totals(&self, tour: &[usize]) -> Totals {
        let mut totals = Totals::default();
        for pair in tour.windows(2) {
            totals.add(self.edge(pair[0], pair[1]));
        }
        if let (Some(&last), Some(&first)) = (tour.last(), tour.first()) {
            if last != first {
                totals.add(self.edge(last, first));
            }
        }
        totals
    }
}

/// Source of edge costs for a set of locations.
///
/// The optimizer never synthesizes data itself; callers inject a model.
/// Production deployments back this with a real distance-matrix service,
/// the demo CLI uses [`SyntheticUrbanModel`].
pub trait CostModel {
    fn cost_matrix<R: Rng>(&self, size: usize, rng: &mut R) -> CostMatrix;
}

/// Stand-in for a distance-matrix provider: draws each leg uniformly from
/// a plausible urban range and derives cost and emissions from it.
#[derive(Debug, Clone)]
pub struct SyntheticUrbanModel {
    pub cost_per_km: f64,
}

impl CostModel for SyntheticUrbanModel {
    fn cost_matrix<R: Rng>(&self, size: usize, rng: &mut R) -> CostMatrix {
        CostMatrix::from_fn(size, |_, _| {
            let distance_km = URBAN_MIN_KM + rng.gen::<f64>() * URBAN_SPAN_KM;
            EdgeCost {
                distance_km,
                cost: distance_km * self.cost_per_km,
                carbon_kg: distance_km * EMISSION_FACTOR_KG_PER_KM,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_matrix() -> CostMatrix {
        // distances 0-1: 4, 1-2: 6, 2-0: 9 (asymmetric on purpose)
        let distances = [[0.0, 4.0, 7.0], [5.0, 0.0, 6.0], [9.0, 8.0, 0.0]];
        CostMatrix::from_fn(3, |from, to| EdgeCost {
            distance_km: distances[from][to],
            cost: distances[from][to] * 2.0,
            carbon_kg: distances[from][to] * 0.5,
        })
    }

    #[test]
    fn diagonal_is_zero() {
        let matrix = fixed_matrix();
        for i in 0..3 {
            assert_eq!(matrix.edge(i, i), EdgeCost::ZERO);
        }
    }

    #[test]
    fn tour_totals_include_return_edge() {
        let matrix = fixed_matrix();
        let totals = matrix.tour_totals(&[0, 1, 2]);
        // 0->1 (4) + 1->2 (6) + 2->0 (9)
        assert_eq!(totals.distance_km, 19.0);
        assert_eq!(totals.cost, 38.0);
        assert_eq!(totals.carbon_kg, 9.5);
    }

    #[test]
    fn tour_totals_are_direction_sensitive() {
        let matrix = fixed_matrix();
        let forward = matrix.tour_totals(&[0, 1, 2]);
        let backward = matrix.tour_totals(&[0, 2, 1]);
        // 0->2 (7) + 2->1 (8) + 1->0 (5)
        assert_eq!(backward.distance_km, 20.0);
        assert_ne!(forward.distance_km, backward.distance_km);
    }

    #[test]
    fn synthetic_legs_stay_in_urban_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let model = SyntheticUrbanModel { cost_per_km: 0.15 };
        let matrix = model.cost_matrix(6, &mut rng);

        for from in 0..6 {
            for to in 0..6 {
                let edge = matrix.edge(from, to);
                if from == to {
                    assert_eq!(edge, EdgeCost::ZERO);
                    continue;
                }
                assert!(edge.distance_km >= URBAN_MIN_KM);
                assert!(edge.distance_km < URBAN_MIN_KM + URBAN_SPAN_KM);
                assert_eq!(edge.cost, edge.distance_km * 0.15);
                assert_eq!(edge.carbon_kg, edge.distance_km * EMISSION_FACTOR_KG_PER_KM);
            }
        }
    }

    #[test]
    fn synthetic_matrix_is_seed_deterministic() {
        let model = SyntheticUrbanModel { cost_per_km: 0.15 };
        let a = model.cost_matrix(5, &mut StdRng::seed_from_u64(42));
        let b = model.cost_matrix(5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
