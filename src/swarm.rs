use crate::matrix::CostMatrix;
use crate::route::ObjectiveWeights;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Search budget and behavior probabilities, fixed before a run.
///
/// An extreme single-objective preference loses the implicit
/// diversification of multi-objective blending, so it gets a larger
/// population and more prey (local improvement) attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchProfile {
    pub population_size: usize,
    pub max_iterations: usize,
    pub prey_probability: f64,
    pub swarm_probability: f64,
    pub swarm_adopt_probability: f64,
    pub follow_adopt_probability: f64,
}

impl SearchProfile {
    /// Profile for blended multi-objective weights.
    pub fn balanced() -> Self {
        Self {
            population_size: 20,
            max_iterations: 50,
            prey_probability: 0.5,
            swarm_probability: 0.25,
            swarm_adopt_probability: 0.3,
            follow_adopt_probability: 0.4,
        }
    }

    /// Profile for a 100% single-objective preference.
    pub fn focused() -> Self {
        Self {
            population_size: 40,
            max_iterations: 100,
            prey_probability: 0.7,
            swarm_probability: 0.2,
            swarm_adopt_probability: 0.3,
            follow_adopt_probability: 0.4,
        }
    }

    pub fn for_weights(weights: &ObjectiveWeights) -> Self {
        if weights.extreme_objective().is_some() {
            Self::focused()
        } else {
            Self::balanced()
        }
    }
}

/// Cooperative cancellation flag, checked once per iteration. A cancelled
/// run still returns the best tour found so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One fish: a tour with its cached fitness. Replaced wholesale when a
/// perturbation strictly improves it, never mutated in place.
#[derive(Debug, Clone)]
struct Candidate {
    tour: Vec<usize>,
    fitness: f64,
}

impl Candidate {
    fn evaluate(tour: Vec<usize>, matrix: &CostMatrix, weights: &ObjectiveWeights) -> Self {
        let fitness = weights.fitness_of(&matrix.tour_totals(&tour));
        Self { tour, fitness }
    }
}

/// Improved Artificial Fish Swarm search over tour permutations.
///
/// Every commit requires a strict fitness improvement, so the best fitness
/// in the school never regresses across iterations.
pub struct FishSwarm {
    pub profile: SearchProfile,
}

impl FishSwarm {
    pub fn new(profile: SearchProfile) -> Self {
        Self { profile }
    }

    /// Runs the search and returns the best tour plus a per-iteration
    /// trace of the best fitness in the school.
    ///
    /// The tour always starts at index 0 (the depot); the closing edge is
    /// implicit. Ties in the final selection go to the first candidate.
    pub fn run<R: Rng>(
        &self,
        matrix: &CostMatrix,
        weights: &ObjectiveWeights,
        rng: &mut R,
        cancel: &CancelToken,
    ) -> (Vec<usize>, Vec<(usize, f64)>) {
        let size = matrix.size();
        let mut school: Vec<Candidate> = (0..self.profile.population_size)
            .map(|_| Candidate::evaluate(random_tour(size, rng), matrix, weights))
            .collect();
        let mut trace = Vec::with_capacity(self.profile.max_iterations);

        for iter in 0..self.profile.max_iterations {
            if cancel.is_cancelled() {
                tracing::debug!(iteration = iter, "search cancelled");
                break;
            }

            for i in 0..school.len() {
                let behavior: f64 = rng.gen();

                if behavior < self.profile.prey_probability {
                    prey(&mut school[i], matrix, weights, rng);
                } else if behavior < self.profile.prey_probability + self.profile.swarm_probability
                {
                    if rng.gen::<f64>() < self.profile.swarm_adopt_probability {
                        let centroid = centroid_tour(&school, size);
                        adopt(&mut school[i], &centroid, matrix, weights, rng);
                    }
                } else {
                    let best = best_index(&school);
                    if best != i && rng.gen::<f64>() < self.profile.follow_adopt_probability {
                        let leader = school[best].tour.clone();
                        adopt(&mut school[i], &leader, matrix, weights, rng);
                    }
                }
            }

            let best = school[best_index(&school)].fitness;
            tracing::debug!(iteration = iter, best_fitness = best, "iteration complete");
            trace.push((iter, best));
        }

        let best = &school[best_index(&school)];
        (best.tour.clone(), trace)
    }
}

/// Uniform random permutation of the stop indices, depot fixed first.
fn random_tour<R: Rng>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut stops: Vec<usize> = (1..size).collect();
    stops.shuffle(rng);
    let mut tour = Vec::with_capacity(size);
    tour.push(0);
    tour.extend(stops);
    tour
}

/// First candidate with the minimum fitness; ties keep the earlier one.
fn best_index(school: &[Candidate]) -> usize {
    let mut best = 0;
    for (i, candidate) in school.iter().enumerate().skip(1) {
        if candidate.fitness < school[best].fitness {
            best = i;
        }
    }
    best
}

/// Index-wise rounded mean of all tours. A diversity heuristic only: the
/// mean of arbitrary labels carries no routing meaning, but swapping a
/// "central" value in still yields a valid perturbation.
fn centroid_tour(school: &[Candidate], size: usize) -> Vec<usize> {
    (0..size)
        .map(|pos| {
            let sum: f64 = school.iter().map(|c| c.tour[pos] as f64).sum();
            (sum / school.len() as f64).round() as usize
        })
        .collect()
}

/// Prey behavior: swap two random non-depot positions in the fish's own
/// tour, keep the swap only on strict improvement.
fn prey<R: Rng>(fish: &mut Candidate, matrix: &CostMatrix, weights: &ObjectiveWeights, rng: &mut R) {
    let len = fish.tour.len();
    if len <= 2 {
        return;
    }
    let a = rng.gen_range(1..len);
    let mut b = rng.gen_range(1..len);
    while b == a {
        b = rng.gen_range(1..len);
    }

    let mut tour = fish.tour.clone();
    tour.swap(a, b);
    let candidate = Candidate::evaluate(tour, matrix, weights);
    if candidate.fitness < fish.fitness {
        *fish = candidate;
    }
}

/// Swarm/follow adoption: take the source tour's value at one random
/// non-depot position and swap it into that position in the fish's own
/// tour. Committed only on strict improvement.
fn adopt<R: Rng>(
    fish: &mut Candidate,
    source: &[usize],
    matrix: &CostMatrix,
    weights: &ObjectiveWeights,
    rng: &mut R,
) {
    let len = fish.tour.len();
    if len <= 2 {
        return;
    }
    let pos = rng.gen_range(1..len);
    let value = source[pos];
    let Some(here) = fish.tour.iter().position(|&v| v == value) else {
        return;
    };
    if here == pos || here == 0 {
        return;
    }

    let mut tour = fish.tour.clone();
    tour.swap(pos, here);
    let candidate = Candidate::evaluate(tour, matrix, weights);
    if candidate.fitness < fish.fitness {
        *fish = candidate;
    }
}
