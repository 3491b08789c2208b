//! Headless guild arcade simulator.
//!
//! Spawns lobbies through the LobbyManager, seats humans and bots, plays
//! every game to the end and prints a JSON summary of the payouts.

mod config;
mod driver;
mod logging;

use anyhow::{Error, bail};
use guild_arcade::game::GameKind;
use pico_args::Arguments;

use crate::{config::SimConfig, driver::Simulator};

const HELP: &str = "\
Run guild arcade lobbies headlessly and report the payouts

USAGE:
  ga_sim [OPTIONS]

OPTIONS:
  --lobbies    N           Number of lobbies to run    [default: env SIM_LOBBIES or 3]
  --kind       KIND        dice, bunker, pets or all   [default: env SIM_KIND or all]
  --seed       N           Seed for reproducible games [default: env SIM_SEED or random]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SIM_GUILD                Guild id funding the lobbies
  SIM_BET                  Stake per human player
  SIM_HUMANS               Human players per lobby, host included
  SIM_BOTS                 Bots per lobby
  SIM_STARTING_BALANCE     Balance of every new wallet
  SIM_GAME_TIMEOUT_SECS    Seconds before a running game is force-ended
  RUST_LOG                 Log filter (e.g., debug,guild_arcade=trace)
";

struct Args {
    lobbies: Option<usize>,
    kind: Option<GameKind>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let kind: Option<String> = pargs.opt_value_from_str("--kind")?;
    let args = Args {
        lobbies: pargs.opt_value_from_str("--lobbies")?,
        kind: match kind.as_deref() {
            None | Some("all") => None,
            Some(value) => Some(value.parse().map_err(Error::msg)?),
        },
        seed: pargs.opt_value_from_str("--seed")?,
    };

    logging::init();

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        tracing::warn!("Ignoring unused arguments: {:?}", remaining);
    }

    let config = SimConfig::from_env(args.lobbies, args.kind, args.seed)?;
    config.validate()?;
    tracing::info!(
        lobbies = config.lobbies,
        bet = config.bet,
        seed = ?config.seed,
        "Starting simulation"
    );

    let report = Simulator::new(config).run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.conserved {
        bail!(
            "Coins were not conserved: {} final + {} unpaid != {} starting",
            report.final_total,
            report.unpaid_total,
            report.starting_total
        );
    }

    tracing::info!(
        humans = report.humans,
        unpaid = report.unpaid_total,
        "Simulation finished"
    );
    Ok(())
}
