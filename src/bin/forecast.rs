use std::time::Instant;

use clap::Parser;

use electoral_forecast::env_config;
use electoral_forecast::registry::StateModelRegistry;
use electoral_forecast::scenario::{ScenarioAdjustment, UnitOverride};
use electoral_forecast::simulation::{
    baseline_outcome, run_simulation, NationalOutcome, SimulationConfig, SimulationResult,
};

#[derive(Parser)]
#[command(name = "forecast")]
#[command(version, about = "Monte Carlo Electoral College forecast", long_about = None)]
struct Args {
    /// Number of trials (default: FORECAST_TRIALS or 10000)
    #[arg(long)]
    trials: Option<i64>,

    /// Master RNG seed (default: FORECAST_SEED or 2024)
    #[arg(long)]
    seed: Option<u64>,

    /// Share of variance carried by the national shock, in [0, 1]
    #[arg(long, default_value = "0.6")]
    correlation: f64,

    /// National Democratic share shift (0.01 = one point)
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    dem_shift: f64,

    /// National Republican share shift
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    rep_shift: f64,

    /// Global turnout multiplier
    #[arg(long, default_value = "1.0")]
    turnout: f64,

    /// Absolute share override, e.g. --set PA=0.52 (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    set: Vec<(String, f64)>,

    /// Additive share shift, e.g. --shift ME-2=-0.02 (repeatable)
    #[arg(long = "shift", value_parser = parse_assignment, allow_hyphen_values = true)]
    shift: Vec<(String, f64)>,

    /// Per-unit turnout multiplier, e.g. --state-turnout GA=1.1 (repeatable)
    #[arg(long = "state-turnout", value_parser = parse_assignment)]
    state_turnout: Vec<(String, f64)>,

    /// Histogram bin width in EV
    #[arg(long, default_value = "10")]
    bin_width: u32,

    /// Number of battlegrounds to report
    #[arg(long, default_value = "10")]
    top: usize,

    /// Print the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Write the full JSON result to this file
    #[arg(long)]
    output: Option<String>,

    /// Report the shock-free outcome only
    #[arg(long)]
    baseline: bool,
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", s))?;
    let value: f64 = value
        .parse()
        .map_err(|_| format!("invalid number in '{}'", s))?;
    Ok((id.trim().to_string(), value))
}

fn build_scenario(args: &Args) -> ScenarioAdjustment {
    let mut scenario = ScenarioAdjustment::default()
        .with_dem_shift(args.dem_shift)
        .with_rep_shift(args.rep_shift)
        .with_turnout(args.turnout);
    for (id, share) in &args.set {
        scenario = scenario.with_override(id, UnitOverride::Absolute(*share));
    }
    for (id, delta) in &args.shift {
        scenario = scenario.with_override(id, UnitOverride::Shift(*delta));
    }
    for (id, multiplier) in &args.state_turnout {
        scenario = scenario.with_unit_turnout(id, *multiplier);
    }
    scenario
}

fn exit_with(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn emit_json<T: serde::Serialize>(value: &T, args: &Args) {
    if !args.json && args.output.is_none() {
        return;
    }
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| exit_with(e));
    if let Some(ref path) = args.output {
        if let Err(e) = std::fs::write(path, &json) {
            exit_with(format!("failed to write {}: {}", path, e));
        }
        println!("Wrote {}", path);
    }
    if args.json {
        println!("{}", json);
    }
}

fn print_baseline(outcome: &NationalOutcome) {
    println!("Shock-free outcome");
    println!("  Dem EV:       {}", outcome.dem_ev);
    println!("  Rep EV:       {}", outcome.rep_ev);
    println!("  Popular Dem:  {:.0}", outcome.popular_dem);
    println!("  Popular Rep:  {:.0}", outcome.popular_rep);
    println!("  Winner:       {:?}", outcome.winner);
    println!("  Tipping point: {}", outcome.path.tipping_point);
    println!("  Units won:    {}", outcome.path.units_won.join(", "));
}

fn print_summary(result: &SimulationResult, elapsed_ms: f64) {
    println!("Electoral College forecast ({} trials, seed {})", result.trials, result.seed);
    println!("  Elapsed:      {:.1} ms", elapsed_ms);
    println!();
    println!("  P(Dem win):   {:.4}", result.win_probability_dem);
    println!("  P(Rep win):   {:.4}", result.win_probability_rep);
    println!("  P(EC/PV split): {:.4}", result.split_probability);
    println!("  Mean Dem EV:  {:.1}", result.mean_dem_ev);
    let (d, r) = (&result.ev_percentiles.dem, &result.ev_percentiles.rep);
    println!("  Dem EV p5/p50/p95: {:.1} / {:.1} / {:.1}", d.p5, d.p50, d.p95);
    println!("  Rep EV p5/p50/p95: {:.1} / {:.1} / {:.1}", r.p5, r.p50, r.p95);
    println!();
    println!("  Battlegrounds:");
    for unit in &result.battlegrounds {
        println!(
            "    {:<6} {:>3} EV  P(Dem) {:.3}  tipping {:.3}",
            unit.id, unit.electoral_votes, unit.dem_win_probability, unit.tipping_point_frequency
        );
    }
    println!();
    println!("  Top tipping points:");
    for entry in result.tipping_points.iter().take(10) {
        println!("    {:<6} {:.3}", entry.id, entry.frequency);
    }
}

fn main() {
    env_config::init_tracing();
    let args = Args::parse();
    let registry = StateModelRegistry::baseline();
    let scenario = build_scenario(&args);

    if args.baseline {
        let outcome = baseline_outcome(&registry, &scenario).unwrap_or_else(|e| exit_with(e));
        if !args.json {
            print_baseline(&outcome);
        }
        emit_json(&outcome, &args);
        return;
    }

    let trials = match args.trials {
        Some(raw) => electoral_forecast::simulation::trial_count_from_raw(raw)
            .unwrap_or_else(|e| exit_with(e)),
        None => env_config::default_trials(),
    };
    let config = SimulationConfig {
        trials,
        seed: args.seed.unwrap_or_else(env_config::default_seed),
        correlation: args.correlation,
        histogram_bin_width: args.bin_width,
        battleground_count: args.top,
    };

    env_config::init_rayon_threads_lenient();
    let start = Instant::now();
    let result = run_simulation(&registry, &scenario, &config).unwrap_or_else(|e| exit_with(e));
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if !args.json {
        print_summary(&result, elapsed_ms);
    }
    emit_json(&result, &args);
}
