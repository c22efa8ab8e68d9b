use gravsim::{bench_derivative, Scenario, ScenarioConfig, ScenarioOutcome, Trajectory};
use gravsim::diagnostics::{total_energy, total_momentum};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "N-body gravity with elastic collisions")]
struct Args {
    /// Scenario file; relative names are also looked up in `scenarios/`
    #[arg(short, long, default_value = "two_body.yaml")]
    file_name: String,

    /// Write every trajectory sample as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Time the derivative evaluation instead of running a scenario
    #[arg(long, default_value_t = false)]
    bench: bool,
}

fn resolve_scenario_path(file_name: &str) -> PathBuf {
    let given = PathBuf::from(file_name);
    if given.exists() {
        return given;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
}

fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = resolve_scenario_path(file_name);
    let file = File::open(&config_path).with_context(|| format!("opening {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig =
        serde_yaml::from_reader(reader).with_context(|| format!("parsing {}", config_path.display()))?;
    Ok(scenario_cfg)
}

// one row per body per sample: t,label,x..,v..
fn write_csv(trajectory: &Trajectory, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let layout = trajectory.layout();

    let mut header = vec!["t".to_string(), "label".to_string()];
    header.extend((0..layout.dim()).map(|d| format!("x{d}")));
    header.extend((0..layout.dim()).map(|d| format!("v{d}")));
    writeln!(out, "{}", header.join(","))?;

    for sample in trajectory.samples() {
        for (i, label) in trajectory.labels().iter().enumerate() {
            let x = layout.position(&sample.state, i);
            let v = layout.velocity(&sample.state, i);
            let values: Vec<String> = x.iter().chain(v.iter()).map(|c| c.to_string()).collect();
            writeln!(out, "{},{},{}", sample.t, label, values.join(","))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn log_summary(scenario: &Scenario, outcome: &ScenarioOutcome) {
    let trajectory = outcome.trajectory();
    info!("{} samples over dimension {}", trajectory.len(), scenario.dimension());

    match outcome {
        ScenarioOutcome::ManyBody(traj) => {
            let (Some(first), Some(last)) = (traj.first(), traj.last()) else {
                return;
            };
            let layout = traj.layout();
            let masses: Vec<f64> = scenario.bodies.iter().map(|b| b.m).collect();
            let g = scenario.parameters.G;

            let e0 = total_energy(&first.state, &layout, &masses, g);
            let e1 = total_energy(&last.state, &layout, &masses, g);
            let p0 = total_momentum(&first.state, &layout, &masses);
            let p1 = total_momentum(&last.state, &layout, &masses);

            info!("{} collision events", traj.collisions().len());
            info!("relative energy drift {:e}", ((e1 - e0) / e0).abs());
            info!("momentum drift {:e}", (p1 - p0).norm());
        }
        ScenarioOutcome::TestParticle(result) => match &result.impact {
            Some(hit) => info!("impact on '{}' at t = {}", hit.label, hit.t),
            None => info!("no impact"),
        },
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_derivative();
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let scenario = Scenario::build_scenario(scenario_cfg).context("building scenario")?;

    let outcome = scenario.run().context("running scenario")?;
    log_summary(&scenario, &outcome);

    if let Some(path) = args.output {
        write_csv(outcome.trajectory(), &path)?;
        info!("trajectory written to {}", path.display());
    }

    Ok(())
}
