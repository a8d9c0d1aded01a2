// Sleeper league-data client: REST for league state, rosters, matchups and
// the daily player map; token-authorized GraphQL for the current user, the
// NFL team list, and the roster write.

use std::collections::HashMap;

use anyhow::Context;
use chrono::Duration;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::Cache;
use crate::models::{
    Game, GameStatus, Guid, InjuryStatus, LeagueSettings, Matchup, Owner, Player, PlayerStatus,
    Position, Roster,
};

const REST_BASE: &str = "https://api.sleeper.app";
const GRAPHQL_URL: &str = "https://sleeper.com/graphql";

pub struct SleeperClient {
    rest: reqwest::Client,
    graphql: reqwest::Client,
    league_id: String,
    cache: Cache,
}

impl SleeperClient {
    pub fn new(token: &str, league_id: &str, cache: Cache) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(token).context("sleeper token is not a valid header value")?,
        );

        Ok(SleeperClient {
            rest: reqwest::Client::new(),
            graphql: reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .context("failed to build sleeper graphql client")?,
            league_id: league_id.to_string(),
            cache,
        })
    }

    async fn get_json(&self, path: &str) -> anyhow::Result<Value> {
        let url = format!("{REST_BASE}{path}");
        let response = self
            .rest
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;
        response
            .json()
            .await
            .with_context(|| format!("GET {url} returned unparseable JSON"))
    }

    async fn graphql_query(&self, operation: &str, query: &str, variables: Value) -> anyhow::Result<Value> {
        let body = serde_json::json!({
            "operationName": operation,
            "variables": variables,
            "query": query,
        });

        let response = self
            .graphql
            .post(GRAPHQL_URL)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("graphql {operation} failed"))?
            .error_for_status()
            .with_context(|| format!("graphql {operation} returned an error status"))?;

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("graphql {operation} returned unparseable JSON"))?;

        if let Some(errors) = body.get("errors") {
            anyhow::bail!("graphql {operation} returned errors: {errors}");
        }

        Ok(body)
    }

    /// Resolve the user id behind the configured token.
    pub async fn my_user_id(&self) -> anyhow::Result<Guid> {
        let key = "sleeper_my_user_id";
        if let Some(hit) = self.cache.get(key, Duration::hours(1)) {
            return Ok(hit);
        }

        let body = self
            .graphql_query(
                "initialize_app",
                "query initialize_app { me { user_id } }",
                serde_json::json!({}),
            )
            .await?;

        let user_id = body
            .pointer("/data/me/user_id")
            .and_then(Value::as_str)
            .context("sleeper did not return a user id")?
            .to_string();

        self.cache.put(key, &user_id);
        Ok(user_id)
    }

    pub async fn league_settings(&self) -> anyhow::Result<LeagueSettings> {
        let key = format!("sleeper_settings_{}", self.league_id);
        if let Some(hit) = self.cache.get(&key, Duration::hours(1)) {
            return Ok(hit);
        }

        let nfl_state: RawNflState = serde_json::from_value(self.get_json("/v1/state/nfl").await?)
            .context("unexpected nfl state payload")?;
        let league: RawLeague = serde_json::from_value(
            self.get_json(&format!("/v1/league/{}", self.league_id)).await?,
        )
        .context("unexpected league payload")?;

        let settings = LeagueSettings {
            guid: self.league_id.clone(),
            name: league.name,
            status: league.status,
            week: nfl_state.leg,
            season: nfl_state
                .season
                .parse()
                .context("nfl state season is not numeric")?,
            total_teams: league.total_rosters,
            roster_positions: league.roster_positions,
            taxi_slots: league.settings.taxi_slots,
            reserve_slots: league.settings.reserve_slots,
            ppr: league.scoring_settings.rec,
        };

        self.cache.put(&key, &settings);
        Ok(settings)
    }

    pub async fn owners(&self) -> anyhow::Result<Vec<Owner>> {
        let key = format!("sleeper_owners_{}", self.league_id);
        if let Some(hit) = self.cache.get(&key, Duration::hours(1)) {
            return Ok(hit);
        }

        let users: Vec<RawUser> = serde_json::from_value(
            self.get_json(&format!("/v1/league/{}/users", self.league_id)).await?,
        )
        .context("unexpected users payload")?;

        let owners: Vec<Owner> = users
            .into_iter()
            .map(|user| Owner {
                guid: user.user_id,
                display_name: user.display_name,
                avatar: user.avatar,
                roster: None,
                matchup: None,
            })
            .collect();

        self.cache.put(&key, &owners);
        Ok(owners)
    }

    pub async fn rosters(&self) -> anyhow::Result<Vec<Roster>> {
        let key = format!("sleeper_rosters_{}", self.league_id);
        if let Some(hit) = self.cache.get(&key, Duration::minutes(10)) {
            return Ok(hit);
        }

        let raw: Vec<RawRoster> = serde_json::from_value(
            self.get_json(&format!("/v1/league/{}/rosters", self.league_id)).await?,
        )
        .context("unexpected rosters payload")?;

        let rosters: Vec<Roster> = raw.into_iter().map(map_roster).collect();

        self.cache.put(&key, &rosters);
        Ok(rosters)
    }

    pub async fn matchups(&self, week: u32) -> anyhow::Result<Vec<Matchup>> {
        let key = format!("sleeper_matchups_{}_{week}", self.league_id);
        if let Some(hit) = self.cache.get(&key, Duration::hours(1)) {
            return Ok(hit);
        }

        let raw: Vec<RawMatchup> = serde_json::from_value(
            self.get_json(&format!("/v1/league/{}/matchups/{week}", self.league_id))
                .await?,
        )
        .context("unexpected matchups payload")?;

        // Matchup rows come one per roster; matchup_id pairs them up.
        let mut pairs: HashMap<u64, Vec<u64>> = HashMap::new();
        for row in raw {
            pairs.entry(row.matchup_id).or_default().push(row.roster_id);
        }

        let mut matchups: Vec<Matchup> = Vec::new();
        for (matchup_id, roster_ids) in pairs {
            if let [home, away] = roster_ids[..] {
                matchups.push(Matchup {
                    guid: matchup_id.to_string(),
                    home_roster: home.to_string(),
                    away_roster: away.to_string(),
                });
            } else {
                debug!(matchup_id, rosters = roster_ids.len(), "skipping unpaired matchup");
            }
        }

        self.cache.put(&key, &matchups);
        Ok(matchups)
    }

    /// The full active-player map. The API asks to be hit at most once a
    /// day, hence the long TTL.
    pub async fn player_map(&self) -> anyhow::Result<HashMap<Guid, Player>> {
        let key = "sleeper_player_map";
        if let Some(hit) = self.cache.get(key, Duration::hours(24)) {
            return Ok(hit);
        }

        let raw: HashMap<String, RawPlayer> =
            serde_json::from_value(self.get_json("/v1/players/nfl").await?)
                .context("unexpected player map payload")?;

        let mut players: HashMap<Guid, Player> = HashMap::new();
        for (player_id, player) in raw {
            if !player.active.unwrap_or(false) {
                continue;
            }
            // Players without a parseable position can never fill a slot.
            let Some(position) = player.position.as_deref().and_then(Position::from_str_pos)
            else {
                continue;
            };

            players.insert(
                player_id.clone(),
                Player {
                    guid: player_id,
                    first_name: player.first_name,
                    last_name: player.last_name,
                    team: player.team,
                    position,
                    number: player.number,
                    bye_week: None,
                    status: player.status.as_deref().and_then(PlayerStatus::from_str_status),
                    injury_status: player
                        .injury_status
                        .as_deref()
                        .and_then(InjuryStatus::from_str_status),
                    dynasty: Default::default(),
                    redraft: Default::default(),
                },
            );
        }

        info!(players = players.len(), "loaded sleeper player map");
        self.cache.put(key, &players);
        Ok(players)
    }

    /// NFL teams with bye weeks, plus each team's current-week game from the
    /// schedule feed.
    pub async fn teams(&self, season: u32, week: u32) -> anyhow::Result<HashMap<String, crate::models::Team>> {
        let key = format!("sleeper_teams_{season}_{week}");
        if let Some(hit) = self.cache.get(&key, Duration::hours(1)) {
            return Ok(hit);
        }

        let body = self
            .graphql_query(
                "teams",
                r#"query teams { teams(sport: "nfl") { active aliases metadata name sport team } }"#,
                serde_json::json!({}),
            )
            .await?;

        let raw_teams: Vec<RawTeam> = serde_json::from_value(
            body.pointer("/data/teams")
                .cloned()
                .context("sleeper teams query returned no data")?,
        )
        .context("unexpected teams payload")?;

        let games = self.schedule(season, week).await?;

        let mut teams: HashMap<String, crate::models::Team> = HashMap::new();
        for raw in raw_teams {
            let game = games
                .iter()
                .find(|game| game.teams.contains(&raw.team))
                .cloned();
            let bye_week: u32 = raw
                .metadata
                .bye_week
                .parse()
                .with_context(|| format!("team {} has a non-numeric bye week", raw.team))?;
            teams.insert(
                raw.team.clone(),
                crate::models::Team {
                    guid: raw.team,
                    name: raw.name,
                    bye_week,
                    game,
                },
            );
        }

        self.cache.put(&key, &teams);
        Ok(teams)
    }

    async fn schedule(&self, season: u32, week: u32) -> anyhow::Result<Vec<Game>> {
        let raw: Vec<RawGame> = serde_json::from_value(
            self.get_json(&format!("/schedule/nfl/regular/{season}")).await?,
        )
        .context("unexpected schedule payload")?;

        Ok(raw
            .into_iter()
            .filter(|game| game.week == week)
            .map(|game| Game {
                guid: game.game_id,
                start_time: game.start_time,
                teams: vec![game.home, game.away],
                status: match game.status.as_str() {
                    "in_game" => GameStatus::InGame,
                    "complete" => GameStatus::Complete,
                    _ => GameStatus::PreGame,
                },
            })
            .collect())
    }

    /// Push an optimized roster back to Sleeper. Destructive; callers gate
    /// this behind explicit configuration.
    pub async fn update_roster(&self, roster: &Roster) -> anyhow::Result<()> {
        let roster_id: u64 = roster
            .guid
            .parse()
            .context("roster id is not numeric")?;

        self.graphql_query(
            "update_league_roster",
            r#"mutation update_league_roster($league_id: String!, $roster_id: Int!, $starters: [String], $reserve: [String], $taxi: [String]) {
                update_league_roster(league_id: $league_id, roster_id: $roster_id, starters: $starters, reserve: $reserve, taxi: $taxi) {
                    roster_id
                }
            }"#,
            serde_json::json!({
                "league_id": self.league_id,
                "roster_id": roster_id,
                "starters": roster.starters,
                "reserve": roster.reserve,
                "taxi": roster.taxi,
            }),
        )
        .await?;

        info!(roster = %roster.guid, "roster update pushed to sleeper");
        Ok(())
    }
}

fn map_roster(raw: RawRoster) -> Roster {
    let starters = raw.starters.unwrap_or_default();
    let reserve = raw.reserve.unwrap_or_default();
    let taxi = raw.taxi.unwrap_or_default();

    // The API reports no bench; it is the membership minus everyone with an
    // assigned slot, in membership order.
    let bench: Vec<Guid> = raw
        .players
        .iter()
        .filter(|id| !starters.contains(id) && !reserve.contains(id) && !taxi.contains(id))
        .cloned()
        .collect();

    let mut owners: Vec<Guid> = Vec::new();
    if let Some(owner_id) = raw.owner_id {
        owners.push(owner_id);
    }
    owners.extend(raw.co_owners.unwrap_or_default());

    Roster {
        guid: raw.roster_id.to_string(),
        owners,
        starters,
        bench,
        reserve,
        taxi,
        player_ids: raw.players,
    }
}

// ---------------------------------------------------------------------------
// Raw payload shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawNflState {
    leg: u32,
    season: String,
}

#[derive(Debug, Deserialize)]
struct RawLeague {
    name: String,
    status: String,
    total_rosters: u32,
    roster_positions: Vec<String>,
    settings: RawLeagueInnerSettings,
    scoring_settings: RawScoringSettings,
}

#[derive(Debug, Deserialize)]
struct RawLeagueInnerSettings {
    taxi_slots: usize,
    reserve_slots: usize,
}

#[derive(Debug, Deserialize)]
struct RawScoringSettings {
    rec: f64,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    user_id: String,
    display_name: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRoster {
    roster_id: u64,
    owner_id: Option<String>,
    co_owners: Option<Vec<String>>,
    players: Vec<String>,
    starters: Option<Vec<String>>,
    reserve: Option<Vec<String>>,
    taxi: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawMatchup {
    matchup_id: u64,
    roster_id: u64,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    first_name: String,
    last_name: String,
    team: Option<String>,
    position: Option<String>,
    number: Option<u32>,
    status: Option<String>,
    injury_status: Option<String>,
    active: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    team: String,
    name: String,
    metadata: RawTeamMetadata,
}

#[derive(Debug, Deserialize)]
struct RawTeamMetadata {
    bye_week: String,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    game_id: String,
    week: u32,
    status: String,
    start_time: i64,
    home: String,
    away: String,
}
