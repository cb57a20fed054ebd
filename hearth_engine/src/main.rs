use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hearth_engine::geometry::Region;
use hearth_engine::host::HostClient;
use hearth_engine::kitchen::compose_kitchen;
use hearth_engine::session::Session;
use hearth_formats::load_catalog;

/// Procedural kitchen generator driving an external simulation host.
#[derive(Parser, Debug)]
#[command(
    about = "Generates procedural kitchen scenes and streams them to a simulation host",
    version
)]
struct Args {
    /// Path to the model catalog JSON
    #[arg(long, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// Seed for the generation rng (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Host address to stream commands to
    #[arg(long, default_value = "127.0.0.1:47630")]
    host: String,

    /// Compose the plan without connecting to a host
    #[arg(long)]
    dry_run: bool,

    /// Room width used for --dry-run or --fixed-region, in meters
    #[arg(long, default_value_t = 6.0)]
    room_width: f32,

    /// Room depth used for --dry-run or --fixed-region, in meters
    #[arg(long, default_value_t = 4.0)]
    room_depth: f32,

    /// Use the given room size instead of querying the host for regions
    #[arg(long)]
    fixed_region: bool,

    /// Path to write the composed command plan as JSON
    #[arg(long)]
    plan_json: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = load_catalog(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;
    let seed = match args.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            log::info!("picked seed {seed} from entropy");
            seed
        }
    };

    if args.dry_run {
        let region = Region::centered(args.room_width, args.room_depth);
        let plan = compose_kitchen(&catalog, region, seed).context("composing kitchen")?;
        log::info!("dry run: composed {} commands", plan.len());
        if let Some(path) = args.plan_json.as_ref() {
            let values = plan.to_values().context("serializing plan")?;
            let json =
                serde_json::to_string_pretty(&values).context("serializing plan to JSON")?;
            fs::write(path, json)
                .with_context(|| format!("writing plan JSON to {}", path.display()))?;
            log::info!("wrote plan to {}", path.display());
        }
        return Ok(());
    }

    let mut session = Session::new(&catalog, seed);
    if args.fixed_region {
        session = session.with_region(Region::centered(args.room_width, args.room_depth));
    }
    let build = option_env!("CARGO_PKG_VERSION").map(str::to_string);
    let mut client = HostClient::connect(args.host.as_str(), build)
        .with_context(|| format!("connecting to host {}", args.host))?;
    client.run(&mut session).context("running session")?;
    log::info!("scene generation complete (seed {seed})");
    Ok(())
}
