//! Core types for team leagues.
//!
//! This crate provides the fundamental types shared by the rating engine
//! and its storage backends:
//! - [`Participant`] and [`RatingHistory`] for rating state
//! - [`Match`], [`Side`] and [`Outcome`] for recorded matches
//! - [`RatingStore`] and [`MatchStore`] for the storage collaborators
//! - [`RatingError`] and [`StoreError`] for the error kinds

mod error;
mod matchup;
mod participant;
mod store;

pub use error::{RatingError, StoreError};
pub use matchup::{Match, Outcome, Side};
pub use participant::{Participant, RatingHistory, DEFAULT_SEED_RATING};
pub use store::{LeagueStore, MatchStore, MemoryStore, RatingStore};
