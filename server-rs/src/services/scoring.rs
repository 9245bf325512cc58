use std::collections::HashMap;

use uuid::Uuid;

use crate::models::leaderboard::{LeaderboardEntry, MatchResult};
use crate::models::tournament::{MatchCategory, MatchStatus, Tournament};

pub const LEADERBOARD_LIMIT: usize = 50;

/// Extra points for finishing first in a battle royale.
pub const BOOYAH_BONUS: i64 = 20;

pub fn match_points(category: MatchCategory, kills: i32, rank: i32) -> i64 {
    let kills = i64::from(kills.max(0));
    match category {
        MatchCategory::BattleRoyale if rank == 1 => kills + BOOYAH_BONUS,
        _ => kills,
    }
}

/// Flattens completed matches into one record per participant, in
/// encounter order (start time, then registration order).
pub fn completed_results<'a, I>(tournaments: I) -> Vec<MatchResult>
where
    I: IntoIterator<Item = &'a Tournament>,
{
    let mut completed: Vec<&Tournament> = tournaments
        .into_iter()
        .filter(|t| t.status == MatchStatus::Completed)
        .collect();
    completed.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

    completed
        .into_iter()
        .flat_map(|t| {
            t.participants.iter().map(move |p| MatchResult {
                category: t.match_category,
                user: p.user,
                ign: p.ign.clone(),
                kills: p.kills,
                rank: p.rank,
            })
        })
        .collect()
}

#[derive(Default)]
struct Totals {
    points: i64,
    kills: i64,
    matches: i64,
    ign: String,
}

/// Sums points per player and ranks them. Players missing from `usernames`
/// are dropped. Ties on points fall back to kills, then user id.
pub fn rank_players<I>(
    results: I,
    usernames: &HashMap<Uuid, String>,
    limit: usize,
) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = MatchResult>,
{
    let mut totals: HashMap<Uuid, Totals> = HashMap::new();
    for r in results {
        let t = totals.entry(r.user).or_default();
        t.points += match_points(r.category, r.kills, r.rank);
        t.kills += i64::from(r.kills.max(0));
        t.matches += 1;
        t.ign = r.ign;
    }

    let mut ranked: Vec<(Uuid, String, Totals)> = totals
        .into_iter()
        .filter_map(|(id, t)| usernames.get(&id).map(|name| (id, name.clone(), t)))
        .collect();
    ranked.sort_by(|a, b| {
        b.2.points
            .cmp(&a.2.points)
            .then(b.2.kills.cmp(&a.2.kills))
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(limit);

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (id, username, t))| LeaderboardEntry {
            rank: i + 1,
            id,
            username,
            ign: t.ign,
            total_points: t.points,
            total_kills: t.kills,
            total_matches: t.matches,
        })
        .collect()
}
