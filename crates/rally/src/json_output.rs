//! JSON views of league data for the `--json` command line output.
//!
//! The engine types carry no serde derives, so this module borrows from them
//! into flat serializable records.

use rally_core::Participant;
use rally_engine::{Balance, FriendAndFoe, Mate, TeamPlan};
use serde::Serialize;

/// A squad with its members' values.
#[derive(Serialize)]
pub struct SquadJson<'a> {
    pub members: Vec<MemberJson<'a>>,
    pub total: f64,
}

#[derive(Serialize)]
pub struct MemberJson<'a> {
    pub id: &'a str,
    pub value: f64,
}

/// Output of `rally balance --json`.
///
/// ```json
/// {
///   "team1": { "members": [{ "id": "ada", "value": 4.0 }], "total": 4.0 },
///   "team2": { "members": [{ "id": "bo", "value": 3.0 }], "total": 3.0 },
///   "residual_diff": 1.0,
///   "swaps": 0
/// }
/// ```
#[derive(Serialize)]
pub struct BalanceJson<'a> {
    pub team1: SquadJson<'a>,
    pub team2: SquadJson<'a>,
    pub residual_diff: f64,
    pub swaps: u32,
}

/// One line of the league table.
#[derive(Serialize)]
pub struct StandingJson<'a> {
    pub rank: usize,
    pub id: &'a str,
    pub rating: f64,
    pub matches: u32,
    pub wins: u32,
    pub win_rate: f64,
}

/// Output of `rally player --json`.
#[derive(Serialize)]
pub struct PlayerJson<'a> {
    pub id: &'a str,
    pub rating: f64,
    pub value: f64,
    pub matches: u32,
    pub wins: u32,
    pub history: &'a [f64],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_friend: Option<MateJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_foe: Option<MateJson<'a>>,
}

#[derive(Serialize)]
pub struct MateJson<'a> {
    pub id: &'a str,
    pub count: u32,
    pub together: u32,
}

impl<'a> From<&'a TeamPlan> for SquadJson<'a> {
    fn from(plan: &'a TeamPlan) -> Self {
        SquadJson {
            members: plan
                .members
                .iter()
                .map(|(id, value)| MemberJson { id, value: *value })
                .collect(),
            total: plan.total,
        }
    }
}

impl<'a> From<&'a Balance> for BalanceJson<'a> {
    fn from(balance: &'a Balance) -> Self {
        BalanceJson {
            team1: (&balance.team1).into(),
            team2: (&balance.team2).into(),
            residual_diff: balance.residual_diff,
            swaps: balance.swaps,
        }
    }
}

impl<'a> From<&'a Mate> for MateJson<'a> {
    fn from(mate: &'a Mate) -> Self {
        MateJson {
            id: &mate.id,
            count: mate.count,
            together: mate.together,
        }
    }
}

/// Numbers the ranked participants from 1.
pub fn standings(ranked: &[Participant]) -> Vec<StandingJson<'_>> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, p)| StandingJson {
            rank: i + 1,
            id: &p.id,
            rating: p.current_rating(),
            matches: p.match_count,
            wins: p.win_count,
            win_rate: p.win_rate(),
        })
        .collect()
}

/// Builds the player card from a participant, their value and their mates.
pub fn player<'a>(
    participant: &'a Participant,
    value: f64,
    mates: Option<&'a FriendAndFoe>,
) -> PlayerJson<'a> {
    PlayerJson {
        id: &participant.id,
        rating: participant.current_rating(),
        value,
        matches: participant.match_count,
        wins: participant.win_count,
        history: participant.history.as_slice(),
        best_friend: mates.and_then(|m| m.best_friend.as_ref()).map(Into::into),
        worst_foe: mates.and_then(|m| m.worst_foe.as_ref()).map(Into::into),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_engine::TeamBalancer;
    use serde_json::{json, Value};

    #[test]
    fn test_balance_json_shape() {
        let values = vec![("ada".to_string(), 4.0), ("bo".to_string(), 3.0)];
        let balance = TeamBalancer::default().balance(&values);
        let json: Value = serde_json::to_value(BalanceJson::from(&balance)).unwrap();

        assert_eq!(
            json,
            json!({
                "team1": { "members": [{ "id": "ada", "value": 4.0 }], "total": 4.0 },
                "team2": { "members": [{ "id": "bo", "value": 3.0 }], "total": 3.0 },
                "residual_diff": 1.0,
                "swaps": 0
            })
        );
    }

    #[test]
    fn test_standings_are_numbered_from_one() {
        let mut ada = Participant::new("ada", 100.0);
        ada.history = ada.history.with_appended(116.0);
        ada.match_count = 1;
        ada.win_count = 1;
        let bo = Participant::new("bo", 100.0);

        let ranked = vec![ada, bo];
        let rows = standings(&ranked);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].rating, 116.0);
        assert_eq!(rows[0].win_rate, 1.0);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].id, "bo");
    }

    #[test]
    fn test_player_without_mates_omits_them() {
        let ada = Participant::new("ada", 100.0);
        let json: Value = serde_json::to_value(player(&ada, 100.0, None)).unwrap();

        assert_eq!(json["id"], "ada");
        assert_eq!(json["history"], json!([100.0]));
        assert!(json.get("best_friend").is_none());
        assert!(json.get("worst_foe").is_none());
    }

    #[test]
    fn test_player_with_mates() {
        let ada = Participant::new("ada", 100.0);
        let mates = FriendAndFoe {
            best_friend: Some(Mate {
                id: "bo".to_string(),
                count: 3,
                together: 4,
            }),
            worst_foe: None,
        };
        let json: Value = serde_json::to_value(player(&ada, 100.0, Some(&mates))).unwrap();

        assert_eq!(json["best_friend"], json!({ "id": "bo", "count": 3, "together": 4 }));
        assert!(json.get("worst_foe").is_none());
    }
}
