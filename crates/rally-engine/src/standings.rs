//! League standings derived from participants and the match log.

use crate::elo::{outcome_with, TiePolicy};
use rally_core::{Match, Outcome, Participant};
use std::collections::BTreeMap;

/// Orders participants for the league table.
///
/// Participants without a recorded match are left out. The order is current
/// rating descending, then wins descending, then matches ascending, then
/// identifier.
pub fn ranking(participants: &[Participant]) -> Vec<&Participant> {
    let mut table: Vec<&Participant> = participants.iter().filter(|p| p.match_count >= 1).collect();
    table.sort_by(|a, b| {
        b.current_rating()
            .total_cmp(&a.current_rating())
            .then_with(|| b.win_count.cmp(&a.win_count))
            .then_with(|| a.match_count.cmp(&b.match_count))
            .then_with(|| a.id.cmp(&b.id))
    });
    table
}

/// Another participant and how often a pairing went a given way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mate {
    pub id: String,
    /// Wins together for a friend, losses against for a foe.
    pub count: u32,
    /// Matches shared: as teammates for a friend, as opponents for a foe.
    pub together: u32,
}

/// Most successful teammate and most troublesome opponent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FriendAndFoe {
    /// Teammate with the most wins together, if any win was recorded.
    pub best_friend: Option<Mate>,
    /// Opponent with the most wins against, if any loss was recorded.
    pub worst_foe: Option<Mate>,
}

#[derive(Default)]
struct Tally {
    shared: u32,
    decided: u32,
}

/// Finds the best friend and worst foe of `id` over `matches`.
///
/// Returns `None` if `id` played none of the matches. Draws count as neither
/// a win nor a loss. Ties go to the smaller identifier.
pub fn friend_and_foe(id: &str, matches: &[Match], tie_policy: TiePolicy) -> Option<FriendAndFoe> {
    let mut friends: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut foes: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut played = false;

    for m in matches {
        let Some(side) = m.side_of(id) else {
            continue;
        };
        played = true;
        let outcome = outcome_with(m, tie_policy);
        let won = outcome == Outcome::Winner(side);
        let lost = outcome == Outcome::Winner(side.opponent());

        for mate in m.roster(side).iter().filter(|p| *p != id) {
            let tally = friends.entry(mate.as_str()).or_default();
            tally.shared += 1;
            tally.decided += u32::from(won);
        }
        for foe in m.roster(side.opponent()) {
            let tally = foes.entry(foe.as_str()).or_default();
            tally.shared += 1;
            tally.decided += u32::from(lost);
        }
    }

    if !played {
        return None;
    }
    Some(FriendAndFoe {
        best_friend: top(&friends),
        worst_foe: top(&foes),
    })
}

fn top(tallies: &BTreeMap<&str, Tally>) -> Option<Mate> {
    let mut best: Option<(&str, &Tally)> = None;
    for (id, tally) in tallies {
        if tally.decided == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, b)) => tally.decided > b.decided,
        };
        if better {
            best = Some((*id, tally));
        }
    }
    best.map(|(id, tally)| Mate {
        id: id.to_string(),
        count: tally.decided,
        together: tally.shared,
    })
}
