// Roster optimization: deterministic greedy assignment of players to
// starting slots, maximizing redraft value under eligibility, availability,
// and capacity constraints.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ConfigurationError, DataIntegrityError, OptimizeError};
use crate::lineup::eligible_positions;
use crate::models::{
    Guid, LeagueSettings, Player, Position, Roster, SourceWeights, Team, EMPTY_SLOT,
};

/// A startable slot no eligible candidate remained for. Carried in the
/// result rather than raised: an unfillable slot can be an expected
/// transient state in a bye-heavy week, and the caller decides remediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfilledSlot {
    pub index: usize,
    pub label: String,
    pub eligible: Vec<Position>,
}

/// The optimizer's output: a freshly built roster plus any slots it could
/// not fill.
#[derive(Debug, Clone)]
pub struct LineupProposal {
    pub roster: Roster,
    pub unfilled: Vec<UnfilledSlot>,
}

/// Optimize a roster against the current wall clock. See
/// [`optimize_roster_at`] for the full contract.
pub fn optimize_roster(
    roster: &Roster,
    settings: &LeagueSettings,
    players: &HashMap<Guid, Player>,
    teams: &HashMap<String, Team>,
    weights: &SourceWeights,
) -> Result<LineupProposal, OptimizeError> {
    optimize_roster_at(roster, settings, players, teams, weights, Utc::now())
}

/// Produce a new starters/bench/reserve partition for `roster`, maximizing
/// aggregate redraft value of the starting lineup. Pure: the input roster is
/// never mutated, and the same inputs (including `now`) always yield the
/// same output.
///
/// Hard constraints, in order:
/// - the taxi squad is never touched (taxi moves are a separately gated
///   operation);
/// - players whose game has already kicked off keep their current slot;
/// - movable `Inactive` players are forced to reserve while capacity
///   remains, in first-encountered order;
/// - movable players who will not play, are on bye, or have no team exit to
///   the bench before slot filling;
/// - remaining candidates fill the startable slots greedily in slot-list
///   order, best redraft value first (stable on ties), position eligibility
///   permitting. Slots with no eligible candidate stay on the empty marker
///   and are reported in the result.
///
/// A roster player id absent from `players` is a [`DataIntegrityError`];
/// a startable slot label without an eligibility mapping is a
/// [`ConfigurationError`].
pub fn optimize_roster_at(
    roster: &Roster,
    settings: &LeagueSettings,
    players: &HashMap<Guid, Player>,
    teams: &HashMap<String, Team>,
    weights: &SourceWeights,
    now: DateTime<Utc>,
) -> Result<LineupProposal, OptimizeError> {
    for id in &roster.player_ids {
        if !players.contains_key(id) {
            return Err(DataIntegrityError::UnknownRosterPlayer {
                roster: roster.guid.clone(),
                player: id.clone(),
            }
            .into());
        }
    }

    // Resolve every startable slot's eligibility up front so a broken league
    // configuration fails fast instead of surfacing mid-assignment.
    let starter_count = settings.starter_slots();
    let mut slot_eligibility: Vec<&'static [Position]> = Vec::with_capacity(starter_count);
    for (index, label) in settings.roster_positions[..starter_count].iter().enumerate() {
        let eligible = eligible_positions(label).ok_or(ConfigurationError::UnmappedSlot {
            label: label.clone(),
            index,
        })?;
        slot_eligibility.push(eligible);
    }

    let mut starters: Vec<Guid> = vec![EMPTY_SLOT.to_string(); starter_count];
    let mut bench: Vec<Guid> = Vec::new();
    let mut reserve: Vec<Guid> = Vec::new();
    let taxi: Vec<Guid> = roster.taxi.clone();

    // Partition into locked (game already kicked off) and movable players.
    // Order follows the roster's player-id list throughout, which makes the
    // forced-reserve cutoff and sort tie-breaks deterministic.
    let mut movable: Vec<&Player> = Vec::new();

    for id in &roster.player_ids {
        if taxi.contains(id) {
            continue;
        }

        // Validated above.
        let Some(player) = players.get(id) else {
            continue;
        };

        let game_started = player
            .team
            .as_deref()
            .and_then(|code| teams.get(code))
            .and_then(|team| team.game.as_ref())
            .map(|game| now >= game.kickoff())
            .unwrap_or(false);

        if !game_started {
            movable.push(player);
            continue;
        }

        // Locked players retain their current placement exactly.
        if let Some(index) = roster.starters.iter().position(|s| s == id) {
            if index < starter_count {
                starters[index] = id.clone();
                continue;
            }
        }
        if roster.reserve.contains(id) {
            reserve.push(id.clone());
        } else {
            bench.push(id.clone());
        }
    }

    // Availability exits: forced reserve promotion, then bench for anyone
    // who cannot take the field this week.
    let mut candidates: Vec<&Player> = Vec::new();

    for player in movable {
        if player.on_reserve() && reserve.len() < settings.reserve_slots {
            reserve.push(player.guid.clone());
        } else if !player.will_play() {
            bench.push(player.guid.clone());
        } else if player.bye_week == Some(settings.week) {
            bench.push(player.guid.clone());
        } else if player.team.is_none() {
            bench.push(player.guid.clone());
        } else {
            candidates.push(player);
        }
    }

    // Best redraft value first, on a precomputed score so the comparator
    // is a total order even when candidates have disjoint source coverage.
    // The sort is stable so ties keep their original relative order.
    let mut candidates: Vec<(f64, &Player)> = candidates
        .into_iter()
        .map(|player| (player.redraft.score(weights), player))
        .collect();
    candidates.sort_by(|(a, _), (b, _)| b.total_cmp(a));

    let mut unfilled: Vec<UnfilledSlot> = Vec::new();

    for index in 0..starter_count {
        if starters[index] != EMPTY_SLOT {
            continue;
        }

        let eligible = slot_eligibility[index];
        match candidates
            .iter()
            .position(|(_, player)| eligible.contains(&player.position))
        {
            Some(pick) => {
                let (_, player) = candidates.remove(pick);
                starters[index] = player.guid.clone();
            }
            None => {
                unfilled.push(UnfilledSlot {
                    index,
                    label: settings.roster_positions[index].clone(),
                    eligible: eligible.to_vec(),
                });
            }
        }
    }

    // Everyone left over rides the bench.
    bench.extend(candidates.iter().map(|(_, player)| player.guid.clone()));

    debug!(
        roster = %roster.guid,
        starters = starters.iter().filter(|s| *s != EMPTY_SLOT).count(),
        bench = bench.len(),
        reserve = reserve.len(),
        unfilled = unfilled.len(),
        "roster optimized"
    );

    Ok(LineupProposal {
        roster: Roster {
            guid: roster.guid.clone(),
            owners: roster.owners.clone(),
            starters,
            bench,
            reserve,
            taxi,
            player_ids: roster.player_ids.clone(),
        },
        unfilled,
    })
}
