mod matrix;
mod route;
mod scenario;
mod swarm;

use clap::Parser;
use matrix::{CostModel, SyntheticUrbanModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use route::{ObjectiveWeights, RouteRequest};
use std::path::PathBuf;
use swarm::CancelToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    /// RNG seed
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Depot address that opens and closes the tour
    #[arg(long)]
    depot: Option<String>,

    /// File with one destination per line
    #[arg(long)]
    stops_file: Option<PathBuf>,

    /// Use the built-in Bengaluru sample scenario
    #[arg(long, default_value_t = false)]
    sample: bool,

    /// Time priority weight
    #[arg(long, default_value_t = 33.0)]
    time: f64,

    /// Cost priority weight
    #[arg(long, default_value_t = 33.0)]
    cost: f64,

    /// Carbon priority weight
    #[arg(long, default_value_t = 34.0)]
    carbon: f64,

    /// Lock weights to the eco preset (5/5/90)
    #[arg(long, default_value_t = false)]
    eco: bool,

    /// Fuel cost per kilometre
    #[arg(long, default_value_t = scenario::DEFAULT_COST_PER_KM)]
    fuel_cost: f64,

    /// Also score the unoptimized input order and report carbon credits
    #[arg(long, default_value_t = false)]
    baseline: bool,

    /// Emit the result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let request = build_request(&args)?;
    route::validate(&request)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let model = SyntheticUrbanModel { cost_per_km: request.cost_per_km };
    let matrix = model.cost_matrix(request.stops.len() + 1, &mut rng);

    let start = std::time::Instant::now();
    let result = route::optimize(&request, &matrix, &mut rng, &CancelToken::new())?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("=== OPTIMIZED ROUTE ===");
    for (i, location) in result.route.iter().enumerate() {
        println!("{:>2}. {}", i + 1, location);
    }
    println!("    (returns to {})", request.depot);
    println!();
    println!("Total distance: {:.2} km", result.distance_km);
    println!("Total cost:     {:.2}", result.cost);
    println!("Total carbon:   {:.2} kg CO2", result.carbon_kg);
    println!("Search time:    {:.2}s", elapsed.as_secs_f32());

    if args.baseline {
        let identity: Vec<usize> = (0..matrix.size()).collect();
        let unoptimized = matrix.tour_totals(&identity);
        let credits = scenario::carbon_credits(unoptimized.carbon_kg, result.carbon_kg);

        println!();
        println!("=== VS UNOPTIMIZED INPUT ORDER ===");
        println!(
            "Distance: {:.2} km -> {:.2} km",
            unoptimized.distance_km, result.distance_km
        );
        println!("Cost:     {:.2} -> {:.2}", unoptimized.cost, result.cost);
        println!(
            "Carbon:   {:.2} kg -> {:.2} kg",
            unoptimized.carbon_kg, result.carbon_kg
        );
        println!("Carbon credits earned: {:.2}", credits);
    }

    Ok(())
}

fn build_request(args: &Args) -> Result<RouteRequest, Box<dyn std::error::Error>> {
    let weights = if args.eco {
        ObjectiveWeights::eco()
    } else {
        ObjectiveWeights { time: args.time, cost: args.cost, carbon: args.carbon }
    };

    if args.sample {
        let mut request = scenario::SAMPLE_SCENARIO.clone();
        request.weights = weights;
        request.cost_per_km = args.fuel_cost;
        return Ok(request);
    }

    let depot = args
        .depot
        .clone()
        .ok_or("either --sample or --depot and --stops-file are required")?;
    let stops_file = args
        .stops_file
        .as_ref()
        .ok_or("either --sample or --depot and --stops-file are required")?;
    let stops = scenario::parse_stop_list(&std::fs::read_to_string(stops_file)?);

    Ok(RouteRequest { depot, stops, weights, cost_per_km: args.fuel_cost })
}
