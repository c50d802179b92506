//! Rating engine for team leagues.
//!
//! This crate provides:
//! - [`RatingUpdater`] - team Elo updates, with a reversal mode for deleted matches
//! - [`ValueEstimator`] - current strength blended with recent form
//! - [`TeamBalancer`] - greedy seeding plus bounded swap search for two squads
//! - [`standings`] - league table and best friend / worst foe statistics
//! - [`League`] - the above wired to an injected [`rally_core::LeagueStore`]
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use rally_core::{Match, MemoryStore};
//! use rally_engine::{League, LeagueSettings};
//!
//! let league = League::new(MemoryStore::new(), LeagueSettings::default());
//! for id in ["ada", "bo", "cy", "di"] {
//!     league.register(id).unwrap();
//! }
//!
//! let played = Match::new(
//!     vec!["ada".into(), "bo".into()],
//!     vec!["cy".into(), "di".into()],
//!     21,
//!     15,
//!     Utc::now(),
//! )
//! .unwrap();
//! league.record_match(played).unwrap();
//!
//! let roster: Vec<String> = ["ada", "bo", "cy", "di"].map(String::from).to_vec();
//! let squads = league.balanced_teams(&roster).unwrap();
//! assert_eq!(squads.placed(), 4);
//! ```

pub mod balance;
pub mod elo;
mod league;
pub mod standings;
pub mod value;

pub use balance::{Balance, TeamBalancer, TeamPlan};
pub use elo::{Direction, RatingParams, RatingUpdater, ReversalPolicy, TiePolicy};
pub use league::{League, LeagueError, LeagueSettings};
pub use standings::{FriendAndFoe, Mate};
pub use value::ValueEstimator;
