//! Simulate command - random rounds between a host and participants
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: open_sessions(), play_rounds(), await_convergence(), report_results()
//! - Level 3: play_round(), admit_late_joiner(), await_admission(), in_sync()
//! - Level 4: configuration and formatting

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use koth_core::{Player, Standing, StandingsOrder, Tournament, TournamentRegistry};
use koth_session::{LocalHub, Session, SessionConfig};

const TOURNAMENT_ID: u64 = 1;

/// How often participants are checked while waiting for convergence
const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SimulateArgs {
    /// Players present from the start, host included
    #[arg(long, default_value = "4")]
    pub players: usize,

    /// Rounds to play
    #[arg(long, default_value = "20")]
    pub rounds: usize,

    /// Probability that the king wins a round
    #[arg(long, default_value = "0.5")]
    pub king_win_chance: f64,

    /// Players joining while the tournament runs
    #[arg(long, default_value = "0")]
    pub late_joiners: usize,

    /// Seconds to wait for participants to catch up
    #[arg(long, default_value = "5")]
    pub sync_timeout: u64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Simulation settings
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub players: usize,
    pub rounds: usize,
    pub king_win_chance: f64,
    pub late_joiners: usize,
    pub sync_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            players: 4,
            rounds: 20,
            king_win_chance: 0.5,
            late_joiners: 0,
            sync_timeout: Duration::from_secs(5),
        }
    }
}

impl SimulationConfig {
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_king_win_chance(mut self, chance: f64) -> Self {
        self.king_win_chance = chance;
        self
    }

    pub fn with_late_joiners(mut self, late_joiners: usize) -> Self {
        self.late_joiners = late_joiners;
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.players < 2 {
            anyhow::bail!("A tournament needs at least 2 players, got {}", self.players);
        }
        if !(0.0..=1.0).contains(&self.king_win_chance) {
            anyhow::bail!("King win chance must be within 0..=1, got {}", self.king_win_chance);
        }
        Ok(())
    }

    /// Rounds after which a late joiner arrives, evenly spread
    fn join_rounds(&self) -> Vec<usize> {
        (1..=self.late_joiners)
            .map(|i| i * self.rounds / (self.late_joiners + 1))
            .collect()
    }
}

impl From<&SimulateArgs> for SimulationConfig {
    fn from(args: &SimulateArgs) -> Self {
        SimulationConfig::default()
            .with_players(args.players)
            .with_rounds(args.rounds)
            .with_king_win_chance(args.king_win_chance)
            .with_late_joiners(args.late_joiners)
            .with_sync_timeout(Duration::from_secs(args.sync_timeout))
    }
}

/// Outcome of a simulation
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub rounds_played: usize,
    pub king_wins: usize,
    pub king_losses: usize,
    pub participants: usize,
    pub converged: bool,
    pub final_king: Option<String>,
    pub standings: Vec<Standing>,
}

/// Sessions of one simulated hub
struct Table {
    hub: LocalHub,
    host: Session,
    participants: Vec<Session>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// This function reads like a table of contents:
/// 1. Build the configuration
/// 2. Run the simulation on a tokio runtime
/// 3. Report results
pub fn run(args: SimulateArgs, seed: Option<u64>) -> Result<()> {
    let config = SimulationConfig::from(&args);
    let runtime = tokio::runtime::Runtime::new()?;

    let report = runtime.block_on(simulate(&config, seed))?;

    report_results(&report, args.json)?;
    if !report.converged {
        anyhow::bail!("Participants did not converge on the host state");
    }
    Ok(())
}

/// Play a whole tournament and check that every participant ends up with
/// the host's state
pub async fn simulate(config: &SimulationConfig, seed: Option<u64>) -> Result<SimulationReport> {
    config.validate()?;
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut table = open_sessions(config)?;
    await_admission(&table, config.sync_timeout).await?;
    let (king_wins, king_losses) = play_rounds(config, &mut table, &mut rng).await?;
    let converged = await_convergence(&table, config.sync_timeout).await;

    let host = table.host.tournament();
    let report = SimulationReport {
        rounds_played: king_wins + king_losses,
        king_wins,
        king_losses,
        participants: table.participants.len(),
        converged,
        final_king: host.king().map(|p| p.name),
        standings: host.standings(StandingsOrder::Wins),
    };

    shut_down(table).await?;
    Ok(report)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Host plus one participant session per remaining player, each with a
/// registry of its own
fn open_sessions(config: &SimulationConfig) -> Result<Table> {
    let hub = LocalHub::new("Simulated Hill");
    let session_config = SessionConfig::new(TOURNAMENT_ID);

    let host = Session::start(new_registry(), hub.host(Player::random("Player 1")), &session_config)
        .context("Failed to start host session")?;

    let mut participants = Vec::with_capacity(config.players - 1 + config.late_joiners);
    for n in 2..=config.players {
        participants.push(join(&hub, format!("Player {}", n), &session_config)?);
    }

    Ok(Table {
        hub,
        host,
        participants,
    })
}

/// Returns (king wins, king losses)
async fn play_rounds(
    config: &SimulationConfig,
    table: &mut Table,
    rng: &mut ChaCha8Rng,
) -> Result<(usize, usize)> {
    let join_rounds = config.join_rounds();
    let (mut king_wins, mut king_losses) = (0, 0);

    for round in 0..config.rounds {
        for _ in join_rounds.iter().filter(|r| **r == round) {
            admit_late_joiner(table)?;
            await_admission(table, config.sync_timeout).await?;
        }
        if play_round(&table.host, rng.gen_bool(config.king_win_chance))? {
            king_wins += 1;
        } else {
            king_losses += 1;
        }
    }

    tracing::info!(
        "Played {} rounds: king won {}, lost {}",
        config.rounds,
        king_wins,
        king_losses
    );
    Ok((king_wins, king_losses))
}

/// Poll until every participant mirrors the host, or time runs out
async fn await_convergence(table: &Table, timeout: Duration) -> bool {
    let host = table.host.tournament();
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let lagging = table
            .participants
            .iter()
            .filter(|p| !in_sync(host, p.tournament()))
            .count();
        if lagging == 0 {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!("{} participants still out of sync", lagging);
            return false;
        }
        tokio::time::sleep(SYNC_POLL_INTERVAL).await;
    }
}

fn report_results(report: &SimulationReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("=== Simulation Results ===");
    println!(
        "Rounds: {} (king won {}, lost {})",
        report.rounds_played, report.king_wins, report.king_losses
    );
    println!("Participants: {}", report.participants);
    println!("Converged: {}", if report.converged { "yes" } else { "NO" });
    println!(
        "King: {}",
        report.final_king.as_deref().unwrap_or("none")
    );
    println!();
    println!("{:<4} {:<16} {:>5} {:>7}", "#", "Player", "Wins", "Losses");
    for (rank, standing) in report.standings.iter().enumerate() {
        println!(
            "{:<4} {:<16} {:>5} {:>7}",
            rank + 1,
            standing.name,
            format_count(standing.wins),
            format_count(standing.losses)
        );
    }
    Ok(())
}

/// Terminate the hub and wait for every receive loop
async fn shut_down(table: Table) -> Result<()> {
    table.hub.terminate();
    table.host.wait().await?;
    for participant in table.participants {
        participant.wait().await?;
    }
    table.hub.close();
    Ok(())
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Returns true if the king held the hill
fn play_round(host: &Session, king_wins: bool) -> Result<bool> {
    let tournament = host
        .tournament()
        .as_host()
        .context("Simulation must drive a host tournament")?;

    if king_wins {
        tournament.move_challenger_to_end();
    } else {
        tournament.move_king_to_end();
    }
    Ok(king_wins)
}

fn admit_late_joiner(table: &mut Table) -> Result<()> {
    let name = format!("Player {}", table.participants.len() + 2);
    tracing::info!("{} joins mid-tournament", name);
    let session = join(&table.hub, name, &SessionConfig::new(TOURNAMENT_ID))?;
    table.participants.push(session);
    Ok(())
}

/// Wait until the host has queued everyone on the hub roster
async fn await_admission(table: &Table, timeout: Duration) -> Result<()> {
    let host = table.host.tournament();
    let deadline = tokio::time::Instant::now() + timeout;

    while !table.hub.roster().iter().all(|p| host.position_of(p).is_some()) {
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Host did not admit every player within {:?}", timeout);
        }
        tokio::time::sleep(SYNC_POLL_INTERVAL).await;
    }
    Ok(())
}

fn join(hub: &LocalHub, name: String, config: &SessionConfig) -> Result<Session> {
    let player = Player::random(name);
    let config = config.clone().with_local_player(player.id);
    Session::start(new_registry(), hub.join(player), &config)
        .context("Failed to start participant session")
}

/// Same king, queue, streak and records as the host
fn in_sync(host: &Tournament, participant: &Tournament) -> bool {
    if host.king() != participant.king()
        || host.players() != participant.players()
        || host.king_win_streak() != participant.king_win_streak()
    {
        return false;
    }
    let records = |t: &Tournament| -> Vec<_> {
        t.standings(StandingsOrder::Name)
            .into_iter()
            .map(|s| (s.id, s.position, s.wins, s.losses))
            .collect()
    };
    records(host) == records(participant)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn new_registry() -> Arc<Mutex<TournamentRegistry>> {
    Arc::new(Mutex::new(TournamentRegistry::new()))
}

fn format_count(count: Option<u32>) -> String {
    count.map_or_else(|| "-".to_string(), |c| c.to_string())
}

// ============================================================================
// TESTS
// ============================================================================
