//! Splitting a roster into two squads of similar strength.
//!
//! The balancer seeds both squads greedily, strongest first, then runs a
//! bounded local search that swaps the strongest member of the first squad
//! with the weakest member of the second while that narrows the gap. The
//! result is a local optimum of this heuristic, not a global one.

/// Default gap below which the local search stops.
pub const DEFAULT_MAX_DIFF: f64 = 1.0;

/// Default bound on local search swaps.
pub const DEFAULT_MAX_SWAPS: u32 = 10;

/// One squad and its aggregate value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TeamPlan {
    /// Members with their values, in assignment order.
    pub members: Vec<(String, f64)>,
    /// Sum of member values.
    pub total: f64,
}

impl TeamPlan {
    fn push(&mut self, id: &str, value: f64) {
        self.members.push((id.to_string(), value));
        self.total += value;
    }

    pub fn ids(&self) -> Vec<&str> {
        self.members.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|(m, _)| m == id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of the highest value, first occurrence on ties.
    fn strongest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, (_, value)) in self.members.iter().enumerate() {
            if best.map_or(true, |b| *value > self.members[b].1) {
                best = Some(i);
            }
        }
        best
    }

    /// Index of the lowest value, first occurrence on ties.
    fn weakest(&self) -> Option<usize> {
        let mut worst: Option<usize> = None;
        for (i, (_, value)) in self.members.iter().enumerate() {
            if worst.map_or(true, |w| *value < self.members[w].1) {
                worst = Some(i);
            }
        }
        worst
    }
}

/// Two squads, their remaining gap and the swaps spent reaching it.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub team1: TeamPlan,
    pub team2: TeamPlan,
    /// `|team1.total - team2.total|` after the local search.
    pub residual_diff: f64,
    pub swaps: u32,
}

impl Balance {
    /// Number of participants placed on either squad.
    pub fn placed(&self) -> usize {
        self.team1.len() + self.team2.len()
    }
}

/// Greedy seed plus bounded one-for-one swap search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamBalancer {
    max_diff: f64,
    max_swaps: u32,
}

impl Default for TeamBalancer {
    fn default() -> Self {
        TeamBalancer {
            max_diff: DEFAULT_MAX_DIFF,
            max_swaps: DEFAULT_MAX_SWAPS,
        }
    }
}

impl TeamBalancer {
    pub fn new(max_diff: f64, max_swaps: u32) -> Self {
        TeamBalancer {
            max_diff,
            max_swaps,
        }
    }

    pub fn max_diff(&self) -> f64 {
        self.max_diff
    }

    pub fn max_swaps(&self) -> u32 {
        self.max_swaps
    }

    /// Splits `values` into two squads.
    ///
    /// `values` pairs each participant with their strength; its order is the
    /// encounter order used to break ties. Identifiers are expected to be
    /// distinct. Runs in `O(n log n + swaps * n)`.
    pub fn balance(&self, values: &[(String, f64)]) -> Balance {
        let mut order: Vec<&(String, f64)> = values.iter().collect();
        // Stable sort keeps encounter order among equal values.
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut team1 = TeamPlan::default();
        let mut team2 = TeamPlan::default();
        for (id, value) in order {
            if team1.total <= team2.total {
                team1.push(id, *value);
            } else {
                team2.push(id, *value);
            }
        }

        let mut diff = (team1.total - team2.total).abs();
        let mut swaps = 0;

        while swaps < self.max_swaps && diff >= self.max_diff {
            let (Some(hi), Some(lo)) = (team1.strongest(), team2.weakest()) else {
                break;
            };
            let high = team1.members[hi].1;
            let low = team2.members[lo].1;
            let total1 = team1.total - high + low;
            let total2 = team2.total - low + high;
            let next = (total1 - total2).abs();
            if next >= diff {
                tracing::debug!(diff, next, "no improving swap left");
                break;
            }

            tracing::debug!(
                out = %team1.members[hi].0,
                back = %team2.members[lo].0,
                diff,
                next,
                "swapping"
            );
            std::mem::swap(&mut team1.members[hi], &mut team2.members[lo]);
            team1.total = total1;
            team2.total = total2;
            diff = next;
            swaps += 1;
        }

        Balance {
            team1,
            team2,
            residual_diff: diff,
            swaps,
        }
    }
}
