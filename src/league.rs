// League assembly: builds the canonical player set, team schedule, and
// owner/roster/matchup graph for one optimization cycle. Everything here is
// rebuilt fresh each cycle and discarded at the end of it.

use std::collections::HashMap;

use tracing::info;

use crate::clients::sleeper::SleeperClient;
use crate::error::DataIntegrityError;
use crate::models::{Guid, LeagueSettings, Matchup, Owner, Player, Roster, Team};

#[derive(Debug)]
pub struct League {
    pub settings: LeagueSettings,
    pub teams: HashMap<String, Team>,
    /// Canonical players keyed by primary id, restricted to positions the
    /// league can actually start.
    pub players: HashMap<Guid, Player>,
    pub owners: HashMap<Guid, Owner>,
    /// The user id behind the configured token.
    pub me: Guid,
}

impl League {
    /// Fetch everything from Sleeper and assemble one cycle's state.
    pub async fn load(sleeper: &SleeperClient) -> anyhow::Result<League> {
        let settings = sleeper.league_settings().await?;
        let teams = sleeper.teams(settings.season, settings.week).await?;
        let players = sleeper.player_map().await?;
        let owners = sleeper.owners().await?;
        let rosters = sleeper.rosters().await?;
        let matchups = sleeper.matchups(settings.week).await?;
        let me = sleeper.my_user_id().await?;

        let league = assemble(settings, teams, players, owners, rosters, matchups, me)?;
        info!(
            league = %league.settings.name,
            week = league.settings.week,
            players = league.players.len(),
            "league loaded"
        );
        Ok(league)
    }

    /// The roster owned (or co-owned) by the configured account.
    pub fn my_roster(&self) -> Option<&Roster> {
        self.owners.get(&self.me).and_then(|owner| owner.roster.as_ref())
    }
}

/// Pure assembly step, separated from the network fetches so it can be
/// exercised directly.
pub fn assemble(
    settings: LeagueSettings,
    teams: HashMap<String, Team>,
    all_players: HashMap<Guid, Player>,
    owners: Vec<Owner>,
    rosters: Vec<Roster>,
    matchups: Vec<Matchup>,
    me: Guid,
) -> Result<League, DataIntegrityError> {
    // Only positions the league can start are worth tracking; everyone else
    // is noise from the full-league player dump. Bye weeks come from the
    // team schedule, not the player feed.
    let mut players: HashMap<Guid, Player> = HashMap::new();
    for (guid, mut player) in all_players {
        if !settings
            .roster_positions
            .iter()
            .any(|label| label == player.position.display_str())
        {
            continue;
        }
        if let Some(team) = player.team.as_deref().and_then(|code| teams.get(code)) {
            player.bye_week = Some(team.bye_week);
        }
        players.insert(guid, player);
    }

    let mut owners: HashMap<Guid, Owner> = owners
        .into_iter()
        .map(|owner| (owner.guid.clone(), owner))
        .collect();

    for roster in rosters {
        for id in &roster.player_ids {
            if !players.contains_key(id) {
                return Err(DataIntegrityError::UnknownRosterPlayer {
                    roster: roster.guid.clone(),
                    player: id.clone(),
                });
            }
        }

        let matchup = matchups
            .iter()
            .find(|matchup| {
                matchup.home_roster == roster.guid || matchup.away_roster == roster.guid
            })
            .cloned();

        for owner_id in &roster.owners {
            if let Some(owner) = owners.get_mut(owner_id) {
                owner.roster = Some(roster.clone());
                owner.matchup = matchup.clone();
            }
        }
    }

    Ok(League {
        settings,
        teams,
        players,
        owners,
        me,
    })
}
