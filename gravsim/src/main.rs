use gravsim::{bench_time_step, Engine, Field, Scenario, ScenarioConfig, TickOutcome};

use anyhow::{bail, Context, Result};
use clap::Parser;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Headless gravitational n-body runner")]
struct Args {
    /// Scenario file inside the crate's `scenarios/` directory
    #[arg(short, long, default_value = "two_body.yaml")]
    file_name: String,

    /// Override `engine.max_ticks` from the scenario
    #[arg(long)]
    ticks: Option<u64>,

    /// Print a snapshot every N ticks
    #[arg(long, default_value_t = 10)]
    every: u64,

    /// Time Field::time_step for growing N instead of running a scenario
    #[arg(long, default_value_t = false)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name);
    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing {}", config_path.display()))?;

    Ok(scenario_cfg)
}

fn print_snapshot<const D: usize>(tick: u64, field: &Field<D>) {
    let line: Vec<String> = field.particles().iter().map(|b| b.to_string()).collect();
    println!("tick {tick:6}: {}", line.join(" "));
}

fn run<const D: usize>(mut cfg: ScenarioConfig, args: &Args) -> Result<()> {
    if let Some(t) = args.ticks {
        cfg.engine.max_ticks = Some(t);
    }
    let scenario = Scenario::<D>::build_scenario(cfg)?;
    let mut engine = Engine::new(scenario)?;

    println!("run: {} bodies in {D}D, G = {:e}", engine.field().len(), engine.field().gravity().g);

    let every = args.every.max(1);
    let summary = engine.run(|tick, outcome, field| {
        if let TickOutcome::Reset { cause } = outcome {
            println!("tick {tick:6}: reset after {cause}");
        }
        if tick % every == 0 {
            print_snapshot(tick, field);
        }
    })?;

    if summary.escaped {
        println!("DONE: every body left the bounds after {} ticks", summary.ticks);
    } else {
        println!("DONE: {} ticks, {} resets", summary.ticks, summary.resets);
    }

    let field = engine.field();
    println!("combined: {}", field.combined()?);
    for (i, b) in field.particles().iter().enumerate() {
        let v: Vec<String> = b.velocity().iter().map(|c| format!("{c:.6}")).collect();
        println!("velocity {i}: [{}]", v.join(", "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.bench {
        bench_time_step()?;
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;

    match scenario_cfg.engine.dimension {
        2 => run::<2>(scenario_cfg, &args),
        3 => run::<3>(scenario_cfg, &args),
        d => bail!("unsupported dimension {d}, expected 2 or 3"),
    }
}
