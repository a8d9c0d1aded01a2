// Core league entities shared by the valuation and lineup modules.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Guid = String;

/// Marker used in a starters list for an unfilled slot.
pub const EMPTY_SLOT: &str = "0";

// ---------------------------------------------------------------------------
// Positions and availability
// ---------------------------------------------------------------------------

/// Native football positions used for lineup eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
}

impl Position {
    /// Parse a Sleeper-style position string.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DEF" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }
}

/// Roster status as reported by the league platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Active,
    Inactive,
    InjuredReserve,
    NonFootballInjury,
    PhysicallyUnableToPerform,
    PracticeSquad,
}

impl PlayerStatus {
    /// Parse a Sleeper status string. Unknown strings map to `None` and are
    /// treated as "will not play" downstream.
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s {
            "Active" => Some(PlayerStatus::Active),
            "Inactive" => Some(PlayerStatus::Inactive),
            "Injured Reserve" => Some(PlayerStatus::InjuredReserve),
            "Non Football Injury" => Some(PlayerStatus::NonFootballInjury),
            "Physically Unable to Perform" => Some(PlayerStatus::PhysicallyUnableToPerform),
            "Practice Squad" => Some(PlayerStatus::PracticeSquad),
            _ => None,
        }
    }
}

/// Week-to-week injury designation. Only `Questionable` is compatible with
/// playing; everything else benches the player for the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjuryStatus {
    Cov,
    Dnr,
    Doubtful,
    Ir,
    Na,
    Out,
    Pup,
    Questionable,
    Sus,
}

impl InjuryStatus {
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s {
            "COV" => Some(InjuryStatus::Cov),
            "DNR" => Some(InjuryStatus::Dnr),
            "Doubtful" => Some(InjuryStatus::Doubtful),
            "IR" => Some(InjuryStatus::Ir),
            "NA" => Some(InjuryStatus::Na),
            "Out" => Some(InjuryStatus::Out),
            "PUP" => Some(InjuryStatus::Pup),
            "Questionable" => Some(InjuryStatus::Questionable),
            "Sus" => Some(InjuryStatus::Sus),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Source weights
// ---------------------------------------------------------------------------

/// Per-source weight multipliers for combining valuations. Threaded in
/// explicitly wherever valuations are scored; sources without an entry
/// weigh 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceWeights(BTreeMap<String, f64>);

impl SourceWeights {
    pub fn new(weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        SourceWeights(weights.into_iter().collect())
    }

    pub fn weight(&self, source: &str) -> f64 {
        self.0.get(source).copied().unwrap_or(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

// ---------------------------------------------------------------------------
// PlayerValuation
// ---------------------------------------------------------------------------

/// Per-source normalized value and trend numbers for one player in one
/// valuation context (dynasty or redraft).
///
/// Every entry is pre-normalized to [0, 1] by the provider adapter (division
/// by that provider's known maximum), so values from different sources are
/// only comparable through `compare`, which restricts both sides to their
/// shared sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerValuation {
    pub values: BTreeMap<String, f64>,
    pub trends: BTreeMap<String, f64>,
}

impl PlayerValuation {
    /// A valuation carrying a single source's value and optional trend.
    pub fn single(source: &str, value: f64, trend: Option<f64>) -> Self {
        let mut valuation = PlayerValuation::default();
        valuation.values.insert(source.to_string(), value);
        if let Some(trend) = trend {
            valuation.trends.insert(source.to_string(), trend);
        }
        valuation
    }

    /// Sources that have reported a value for this player.
    pub fn sources(&self) -> BTreeSet<&str> {
        self.values.keys().map(|k| k.as_str()).collect()
    }

    /// Union `other` into this valuation; `other`'s entries overwrite
    /// matching keys. Absent entries never erase existing ones.
    pub fn merge(&mut self, other: &PlayerValuation) {
        for (source, value) in &other.values {
            self.values.insert(source.clone(), *value);
        }
        for (source, trend) in &other.trends {
            self.trends.insert(source.clone(), *trend);
        }
    }

    /// Weighted average over all populated sources. No sources means no
    /// information, which scores 0 rather than erroring.
    pub fn score(&self, weights: &SourceWeights) -> f64 {
        self.score_over(self.sources(), weights)
    }

    fn score_over(&self, sources: BTreeSet<&str>, weights: &SourceWeights) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for source in sources {
            if let Some(value) = self.values.get(source) {
                let weight = weights.weight(source);
                numerator += weight * value;
                denominator += weight;
            }
        }

        if denominator == 0.0 {
            return 0.0;
        }

        numerator / denominator
    }

    /// Compare two valuations over the intersection of their populated
    /// sources. Disjoint valuations both score 0 and compare equal.
    pub fn compare(&self, other: &PlayerValuation, weights: &SourceWeights) -> Ordering {
        let shared: BTreeSet<&str> = self
            .sources()
            .intersection(&other.sources())
            .copied()
            .collect();

        let mine = self.score_over(shared.clone(), weights);
        let theirs = other.score_over(shared, weights);

        mine.total_cmp(&theirs)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One canonical player: identity, availability, and a valuation per context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub guid: Guid,
    pub first_name: String,
    pub last_name: String,
    pub team: Option<String>,
    pub position: Position,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub bye_week: Option<u32>,
    #[serde(default)]
    pub status: Option<PlayerStatus>,
    #[serde(default)]
    pub injury_status: Option<InjuryStatus>,
    #[serde(default)]
    pub dynasty: PlayerValuation,
    #[serde(default)]
    pub redraft: PlayerValuation,
}

impl Player {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name-derived fallback key for matching across providers that do not
    /// share primary identifiers. First + last name has historically given
    /// the best match rate; numbers and teams are wrong too often to key on.
    pub fn alternate_id(&self) -> String {
        self.name()
    }

    /// Whether the player qualifies for the forced move to an injured
    /// reserve slot. Status-based only; week-to-week designations do not
    /// qualify.
    pub fn on_reserve(&self) -> bool {
        self.status == Some(PlayerStatus::Inactive)
    }

    /// Whether the player is expected to take the field this week.
    pub fn will_play(&self) -> bool {
        self.status == Some(PlayerStatus::Active)
            && matches!(
                self.injury_status,
                None | Some(InjuryStatus::Questionable)
            )
    }

    /// Merge another view of this player's valuations into this one.
    pub fn update_value(&mut self, other: &Player) {
        self.dynasty.merge(&other.dynasty);
        self.redraft.merge(&other.redraft);
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// A league team's player-to-slot partition. The starters list is positional:
/// index `i` corresponds to the `i`-th startable slot in the league's slot
/// list, with [`EMPTY_SLOT`] marking an unfilled slot. Every id in the four
/// lists must be a member of `player_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub guid: Guid,
    pub owners: Vec<Guid>,
    #[serde(default)]
    pub starters: Vec<Guid>,
    #[serde(default)]
    pub bench: Vec<Guid>,
    #[serde(default)]
    pub reserve: Vec<Guid>,
    #[serde(default)]
    pub taxi: Vec<Guid>,
    #[serde(default)]
    pub player_ids: Vec<Guid>,
}

// ---------------------------------------------------------------------------
// League settings
// ---------------------------------------------------------------------------

/// League-wide configuration, immutable for the duration of a cycle. The
/// scoring flags (`ppr`, `superflex`) are consumed by the valuation
/// providers only, never by the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub guid: Guid,
    pub name: String,
    pub status: String,
    pub week: u32,
    pub season: u32,
    pub total_teams: u32,
    /// Ordered slot labels, e.g. `[QB, RB, RB, WR, WR, TE, FLEX, BN, ...]`.
    /// Startable slots precede the bench labels.
    pub roster_positions: Vec<String>,
    pub taxi_slots: usize,
    pub reserve_slots: usize,
    pub ppr: f64,
}

impl LeagueSettings {
    pub fn bench_slots(&self) -> usize {
        self.roster_positions.iter().filter(|p| *p == "BN").count()
    }

    pub fn starter_slots(&self) -> usize {
        self.roster_positions.len() - self.bench_slots()
    }

    pub fn superflex(&self) -> bool {
        self.roster_positions.iter().filter(|p| *p == "QB").count() > 1
    }
}

// ---------------------------------------------------------------------------
// Teams and games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    PreGame,
    InGame,
    Complete,
}

/// A real-world game in the current week, used only to decide whether a
/// player may still legally be moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub guid: Guid,
    /// Kickoff as epoch milliseconds, as the schedule provider reports it.
    pub start_time: i64,
    pub teams: Vec<String>,
    pub status: GameStatus,
}

impl Game {
    pub fn kickoff(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.start_time).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub guid: Guid,
    pub name: String,
    pub bye_week: u32,
    #[serde(default)]
    pub game: Option<Game>,
}

// ---------------------------------------------------------------------------
// Owners and matchups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matchup {
    pub guid: Guid,
    pub home_roster: Guid,
    pub away_roster: Guid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub guid: Guid,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roster: Option<Roster>,
    #[serde(default)]
    pub matchup: Option<Matchup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valuation(entries: &[(&str, f64)]) -> PlayerValuation {
        let mut v = PlayerValuation::default();
        for (source, value) in entries {
            v.values.insert(source.to_string(), *value);
        }
        v
    }

    #[test]
    fn merge_unions_disjoint_sources_commutatively() {
        let a = valuation(&[("ktc", 0.8)]);
        let b = valuation(&[("fantasy_calc", 0.6)]);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab.values, ba.values);
        assert_eq!(ab.values.len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut v = PlayerValuation::single("ktc", 0.75, Some(0.5));
        let snapshot = v.clone();
        let copy = v.clone();
        v.merge(&copy);
        assert_eq!(v, snapshot);
    }

    #[test]
    fn merge_overwrites_matching_sources() {
        let mut v = valuation(&[("ktc", 0.2)]);
        v.merge(&valuation(&[("ktc", 0.9)]));
        assert_eq!(v.values["ktc"], 0.9);
    }

    #[test]
    fn merge_never_erases_with_absent_entries() {
        let mut v = PlayerValuation::single("ktc", 0.4, Some(0.1));
        v.merge(&PlayerValuation::default());
        assert_eq!(v.values["ktc"], 0.4);
        assert_eq!(v.trends["ktc"], 0.1);
    }

    #[test]
    fn compare_restricts_to_shared_sources() {
        let weights = SourceWeights::default();
        // a is better on the shared source even though b's private source
        // would lift its unrestricted average.
        let a = valuation(&[("ktc", 0.9)]);
        let b = valuation(&[("ktc", 0.5), ("fantasy_calc", 1.0)]);
        assert_eq!(a.compare(&b, &weights), Ordering::Greater);
    }

    #[test]
    fn compare_disjoint_sources_is_equal() {
        let weights = SourceWeights::default();
        let a = valuation(&[("ktc", 0.9)]);
        let b = valuation(&[("fantasy_calc", 0.1)]);
        assert_eq!(a.compare(&b, &weights), Ordering::Equal);
    }

    #[test]
    fn score_without_sources_is_zero() {
        let weights = SourceWeights::default();
        assert_eq!(PlayerValuation::default().score(&weights), 0.0);
    }

    #[test]
    fn score_respects_weights() {
        let weights = SourceWeights::new([
            ("ktc".to_string(), 3.0),
            ("fantasy_calc".to_string(), 1.0),
        ]);
        let v = valuation(&[("ktc", 1.0), ("fantasy_calc", 0.0)]);
        assert!((v.score(&weights) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_weighted_sources_score_zero() {
        let weights = SourceWeights::new([("ktc".to_string(), 0.0)]);
        let v = valuation(&[("ktc", 0.8)]);
        assert_eq!(v.score(&weights), 0.0);
    }

    fn player(status: Option<PlayerStatus>, injury: Option<InjuryStatus>) -> Player {
        Player {
            guid: "1".to_string(),
            first_name: "Test".to_string(),
            last_name: "Player".to_string(),
            team: Some("KC".to_string()),
            position: Position::RunningBack,
            number: None,
            bye_week: None,
            status,
            injury_status: injury,
            dynasty: PlayerValuation::default(),
            redraft: PlayerValuation::default(),
        }
    }

    #[test]
    fn will_play_requires_active_status() {
        assert!(player(Some(PlayerStatus::Active), None).will_play());
        assert!(player(Some(PlayerStatus::Active), Some(InjuryStatus::Questionable)).will_play());
        assert!(!player(Some(PlayerStatus::Active), Some(InjuryStatus::Out)).will_play());
        assert!(!player(Some(PlayerStatus::Inactive), None).will_play());
        assert!(!player(None, None).will_play());
    }

    #[test]
    fn on_reserve_is_status_based_only() {
        assert!(player(Some(PlayerStatus::Inactive), None).on_reserve());
        // A long-term injury designation alone does not qualify.
        assert!(!player(Some(PlayerStatus::Active), Some(InjuryStatus::Ir)).on_reserve());
    }

    #[test]
    fn alternate_id_is_first_last() {
        let p = player(None, None);
        assert_eq!(p.alternate_id(), "Test Player");
    }

    #[test]
    fn update_value_merges_both_contexts() {
        let mut base = player(None, None);
        let mut other = player(None, None);
        other.dynasty = PlayerValuation::single("ktc", 0.7, None);
        other.redraft = PlayerValuation::single("ktc", 0.3, None);

        base.update_value(&other);
        assert_eq!(base.dynasty.values["ktc"], 0.7);
        assert_eq!(base.redraft.values["ktc"], 0.3);
    }

    #[test]
    fn settings_slot_counts() {
        let settings = LeagueSettings {
            guid: "league".to_string(),
            name: "Test".to_string(),
            status: "in_season".to_string(),
            week: 4,
            season: 2024,
            total_teams: 12,
            roster_positions: vec![
                "QB".into(),
                "RB".into(),
                "WR".into(),
                "FLEX".into(),
                "BN".into(),
                "BN".into(),
            ],
            taxi_slots: 2,
            reserve_slots: 2,
            ppr: 1.0,
        };
        assert_eq!(settings.bench_slots(), 2);
        assert_eq!(settings.starter_slots(), 4);
        assert!(!settings.superflex());
    }

    #[test]
    fn player_round_trips_through_json_with_unset_fields() {
        let p = player(None, None);
        let json = serde_json::to_string(&p).unwrap();
        let back: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(back.guid, p.guid);
        assert_eq!(back.team, p.team);
        assert!(back.bye_week.is_none());
        assert!(back.status.is_none());
        assert!(back.injury_status.is_none());
        assert_eq!(back.redraft, p.redraft);
    }

    #[test]
    fn game_kickoff_from_epoch_millis() {
        let game = Game {
            guid: "g1".to_string(),
            start_time: 1_700_000_000_000,
            teams: vec!["KC".into(), "BUF".into()],
            status: GameStatus::PreGame,
        };
        assert_eq!(game.kickoff().timestamp_millis(), 1_700_000_000_000);
    }
}
