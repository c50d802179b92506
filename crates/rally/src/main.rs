//! Rally - command line front end for a team league.
//!
//! Records matches, keeps Elo ratings and splits a roster into two squads of
//! similar strength. Settings come from `rally.toml`.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rally::config::RallyConfig;
use rally::json_output::{self, BalanceJson};
use rally::storage::SqliteStore;
use rally_core::Match;
use rally_engine::{Balance, League, TeamPlan};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rally")]
#[command(about = "League ratings and balanced squads for pickup team sports")]
struct Cli {
    /// Configuration file (defaults to rally.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register participants with the seed rating
    Register {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Record a finished match and update ratings
    Record {
        /// Team A members, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        team_a: Vec<String>,
        /// Team B members, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        team_b: Vec<String>,
        #[arg(long)]
        score_a: u32,
        #[arg(long)]
        score_b: u32,
        /// When the match was played, RFC 3339 (defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Delete a match and reverse its rating changes
    Delete {
        /// Timestamp of the match, RFC 3339
        at: DateTime<Utc>,
    },
    /// Split participants into two balanced squads
    Balance {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the league table
    Ranking {
        #[arg(long)]
        json: bool,
    },
    /// List recorded matches
    Matches {
        /// Only matches of this participant
        #[arg(short, long)]
        player: Option<String>,
    },
    /// Show one participant's rating, value and history
    Player {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show best friend and worst foe of a participant
    Mates { id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RallyConfig::load_from(path),
        None => RallyConfig::load(),
    }
    .context("Failed to load configuration")?;

    let league = open_league(&config)?;
    run(&league, cli.command)
}

fn open_league(config: &RallyConfig) -> anyhow::Result<League<SqliteStore>> {
    let db_path: &Path = &config.database;
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    let store = SqliteStore::open(db_path, &config.league, &config.sport)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    tracing::info!(
        league = %config.league,
        sport = %config.sport,
        database = %db_path.display(),
        "league opened"
    );
    Ok(League::new(store, config.settings()))
}

fn run(league: &League<SqliteStore>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Register { ids } => {
            for id in ids {
                let p = league
                    .register(&id)
                    .with_context(|| format!("Failed to register {id}"))?;
                println!("{}: {:.2} ({} matches)", p.id, p.current_rating(), p.match_count);
            }
        }
        Commands::Record {
            team_a,
            team_b,
            score_a,
            score_b,
            at,
        } => {
            let played_at = at.unwrap_or_else(Utc::now);
            let m = Match::new(team_a, team_b, score_a, score_b, played_at)
                .context("Invalid match")?;
            let updated = league
                .record_match(m)
                .with_context(|| format!("Failed to record match at {played_at}"))?;
            println!("Recorded {score_a}-{score_b} at {}", played_at.to_rfc3339());
            for p in updated {
                println!("  {:<16} {:>8.2}", p.id, p.current_rating());
            }
        }
        Commands::Delete { at } => {
            let reversed = league
                .delete_match(at)
                .with_context(|| format!("Failed to delete match at {at}"))?;
            println!("Deleted match at {}", at.to_rfc3339());
            for p in reversed {
                println!("  {:<16} {:>8.2}", p.id, p.current_rating());
            }
        }
        Commands::Balance { ids, json } => {
            let balance = league
                .balanced_teams(&ids)
                .context("Failed to balance squads")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&BalanceJson::from(&balance))?);
            } else {
                print_balance(&balance);
            }
        }
        Commands::Ranking { json } => {
            let ranked = league.ranking().context("Failed to load ranking")?;
            let rows = json_output::standings(&ranked);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No matches recorded yet");
            } else {
                println!("{:>3}  {:<16} {:>8} {:>7} {:>5}", "#", "Player", "Rating", "Played", "Won");
                for row in rows {
                    println!(
                        "{:>3}  {:<16} {:>8.2} {:>7} {:>5}",
                        row.rank, row.id, row.rating, row.matches, row.wins
                    );
                }
            }
        }
        Commands::Matches { player } => {
            let matches = league
                .matches(player.as_deref())
                .context("Failed to load matches")?;
            if matches.is_empty() {
                println!("No matches found");
            }
            for m in matches {
                println!(
                    "{}  {} {}-{} {}",
                    m.played_at.to_rfc3339(),
                    m.team_a.join(","),
                    m.score_a,
                    m.score_b,
                    m.team_b.join(",")
                );
            }
        }
        Commands::Player { id, json } => {
            let p = league
                .participant(&id)
                .with_context(|| format!("Failed to load {id}"))?;
            let value = league.settings().estimator.value_of(&p);
            let mates = league.friend_and_foe(&id)?;
            if json {
                let card = json_output::player(&p, value, mates.as_ref());
                println!("{}", serde_json::to_string_pretty(&card)?);
            } else {
                println!("{}", p.id);
                println!("  rating:  {:.2}", p.current_rating());
                println!("  value:   {value:.2}");
                println!("  record:  {} won of {}", p.win_count, p.match_count);
                let history: Vec<String> =
                    p.history.as_slice().iter().map(|r| format!("{r:.1}")).collect();
                println!("  history: {}", history.join(" "));
            }
        }
        Commands::Mates { id } => {
            let mates = league
                .friend_and_foe(&id)
                .with_context(|| format!("Failed to load mates of {id}"))?;
            match mates {
                None => println!("{id} has not played yet"),
                Some(mates) => {
                    match mates.best_friend {
                        Some(f) => println!(
                            "Best friend: {} ({} wins in {} matches together)",
                            f.id, f.count, f.together
                        ),
                        None => println!("Best friend: none yet"),
                    }
                    match mates.worst_foe {
                        Some(f) => println!(
                            "Worst foe:   {} ({} losses in {} matches against)",
                            f.id, f.count, f.together
                        ),
                        None => println!("Worst foe:   none yet"),
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_balance(balance: &Balance) {
    print_squad("Team 1", &balance.team1);
    print_squad("Team 2", &balance.team2);
    println!(
        "Difference: {:.2} after {} swap(s)",
        balance.residual_diff, balance.swaps
    );
}

fn print_squad(name: &str, plan: &TeamPlan) {
    println!("{name} ({:.2})", plan.total);
    for (id, value) in &plan.members {
        println!("  {id:<16} {value:>8.2}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_record_command() {
        let cli = Cli::try_parse_from([
            "rally",
            "record",
            "--team-a",
            "ada,bo",
            "--team-b",
            "cy,di",
            "--score-a",
            "21",
            "--score-b",
            "19",
            "--at",
            "2024-06-01T18:00:00Z",
        ])
        .unwrap();

        match cli.command {
            Commands::Record {
                team_a,
                team_b,
                score_a,
                score_b,
                at,
            } => {
                assert_eq!(team_a, vec!["ada", "bo"]);
                assert_eq!(team_b, vec!["cy", "di"]);
                assert_eq!(score_a, 21);
                assert_eq!(score_b, 19);
                assert_eq!(at, Some(Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap()));
            }
            _ => panic!("Expected Record command"),
        }
    }

    #[test]
    fn test_cli_record_requires_teams() {
        let result = Cli::try_parse_from(["rally", "record", "--score-a", "1", "--score-b", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_balance_with_json_and_config() {
        let cli = Cli::try_parse_from([
            "rally", "balance", "ada", "bo", "cy", "--json", "--config", "league.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("league.toml")));
        match cli.command {
            Commands::Balance { ids, json } => {
                assert_eq!(ids, vec!["ada", "bo", "cy"]);
                assert!(json);
            }
            _ => panic!("Expected Balance command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_timestamp() {
        let result = Cli::try_parse_from(["rally", "delete", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_matches_filter() {
        let cli = Cli::try_parse_from(["rally", "matches", "-p", "ada"]).unwrap();
        match cli.command {
            Commands::Matches { player } => assert_eq!(player.as_deref(), Some("ada")),
            _ => panic!("Expected Matches command"),
        }
    }

    #[test]
    fn test_run_against_memory_database() {
        let config = RallyConfig {
            database: PathBuf::from(":memory:"),
            ..RallyConfig::default()
        };
        let league = open_league(&config).unwrap();
        run(
            &league,
            Commands::Register {
                ids: vec!["ada".into(), "bo".into()],
            },
        )
        .unwrap();
        run(
            &league,
            Commands::Record {
                team_a: vec!["ada".into()],
                team_b: vec!["bo".into()],
                score_a: 21,
                score_b: 10,
                at: None,
            },
        )
        .unwrap();
        assert_eq!(league.ranking().unwrap()[0].id, "ada");
        assert!(run(&league, Commands::Player { id: "ghost".into(), json: false }).is_err());
    }
}
