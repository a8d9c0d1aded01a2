// KeepTradeCut valuation provider: no API, so the rankings page is fetched
// and the embedded `var playersArray = ...;` blob is extracted and parsed.
// KTC shares no ids with Sleeper; records are keyed by normalized name.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::cache::Cache;
use crate::models::{LeagueSettings, PlayerValuation};
use crate::valuation::identity;
use crate::valuation::{
    ProviderFeed, ProviderRecord, RecordIdentity, ValuationContext, ValuationSource,
};

pub const SOURCE: &str = "ktc";

const MAX_VALUE: f64 = 10_000.0;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub struct KtcClient {
    http: reqwest::Client,
    cache: Cache,
}

impl KtcClient {
    pub fn new(cache: Cache) -> anyhow::Result<Self> {
        Ok(KtcClient {
            http: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .context("failed to build ktc client")?,
            cache,
        })
    }

    fn url(context: ValuationContext) -> &'static str {
        match context {
            ValuationContext::Dynasty => "https://keeptradecut.com/dynasty-rankings",
            ValuationContext::Redraft => "https://keeptradecut.com/fantasy-rankings",
        }
    }
}

#[async_trait]
impl ValuationSource for KtcClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(
        &self,
        context: ValuationContext,
        settings: &LeagueSettings,
    ) -> anyhow::Result<ProviderFeed> {
        let key = format!("ktc_{}", context.label());
        if let Some(hit) = self.cache.get(&key, Duration::hours(24)) {
            return Ok(hit);
        }

        let page = self
            .http
            .get(Self::url(context))
            .send()
            .await
            .context("ktc request failed")?
            .error_for_status()
            .context("ktc returned an error status")?
            .text()
            .await
            .context("ktc returned an unreadable page")?;

        let players = extract_players_array(&page)?;
        let records: Vec<ProviderRecord> = players
            .into_iter()
            .map(|player| map_record(player, settings))
            .collect();

        debug!(
            context = context.label(),
            records = records.len(),
            "scraped ktc values"
        );

        let feed = ProviderFeed {
            source: SOURCE.to_string(),
            context,
            records,
        };

        self.cache.put(&key, &feed);
        Ok(feed)
    }
}

/// Pull the embedded players array out of the page source. Exactly one match
/// is required: zero means the page format changed, more than one means the
/// pattern is no longer specific enough to trust.
fn extract_players_array(page: &str) -> anyhow::Result<Vec<RawKtcPlayer>> {
    let pattern = Regex::new(r"var playersArray = (.*);").context("invalid ktc pattern")?;

    let matches: Vec<&str> = pattern
        .captures_iter(page)
        .filter_map(|captures| captures.get(1).map(|group| group.as_str()))
        .collect();

    let [blob] = matches[..] else {
        anyhow::bail!(
            "found {} matches for the ktc players array, expected exactly 1",
            matches.len()
        );
    };

    serde_json::from_str(blob).context("ktc players array is not valid JSON")
}

fn map_record(player: RawKtcPlayer, settings: &LeagueSettings) -> ProviderRecord {
    let (first, last) = identity::normalize_name(&player.player_name);

    let values = if settings.superflex() {
        player.superflex_values
    } else {
        player.one_qb_values
    };

    // A missing value block merges as a no-op but the record still has to
    // match a league player (or be a draft pick).
    let valuation = match values {
        Some(values) => PlayerValuation::single(
            SOURCE,
            values.value / MAX_VALUE,
            values.overall_7_day_trend.map(|trend| trend / MAX_VALUE),
        ),
        None => PlayerValuation::default(),
    };

    // KTC also disagrees with Sleeper on some team abbreviations.
    let team = player
        .team
        .as_deref()
        .and_then(identity::fix_team)
        .map(|code| code.to_string());

    ProviderRecord {
        identity: RecordIdentity::Alternate(identity::alternate_identity(&first, &last)),
        display_name: player.player_name,
        team,
        valuation,
    }
}

#[derive(Debug, Deserialize)]
struct RawKtcPlayer {
    #[serde(rename = "playerName")]
    player_name: String,
    #[serde(default)]
    team: Option<String>,
    #[serde(rename = "oneQBValues", default)]
    one_qb_values: Option<RawKtcValues>,
    #[serde(rename = "superflexValues", default)]
    superflex_values: Option<RawKtcValues>,
}

#[derive(Debug, Deserialize)]
struct RawKtcValues {
    value: f64,
    #[serde(rename = "overall7DayTrend", default)]
    overall_7_day_trend: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(superflex: bool) -> LeagueSettings {
        LeagueSettings {
            guid: "league".to_string(),
            name: "Test".to_string(),
            status: "in_season".to_string(),
            week: 1,
            season: 2024,
            total_teams: 12,
            roster_positions: if superflex {
                vec!["QB".into(), "QB".into(), "RB".into()]
            } else {
                vec!["QB".into(), "RB".into()]
            },
            taxi_slots: 0,
            reserve_slots: 0,
            ppr: 1.0,
        }
    }

    const PAGE: &str = r#"
        <script>
        var playersArray = [{"playerName": "D.J. Moore", "team": "GBP", "oneQBValues": {"value": 5000, "overall7DayTrend": 120}, "superflexValues": {"value": 4800, "overall7DayTrend": 100}}];
        </script>
    "#;

    #[test]
    fn extracts_exactly_one_players_array() {
        let players = extract_players_array(PAGE).unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].player_name, "D.J. Moore");
    }

    #[test]
    fn missing_players_array_fails() {
        assert!(extract_players_array("<html></html>").is_err());
    }

    #[test]
    fn multiple_players_arrays_fail() {
        let page = format!("{PAGE}\n{PAGE}");
        assert!(extract_players_array(&page).is_err());
    }

    #[test]
    fn records_are_name_keyed_and_normalized() {
        let players = extract_players_array(PAGE).unwrap();
        let record = map_record(players.into_iter().next().unwrap(), &settings(false));

        // The fix table maps the KTC spelling onto the Sleeper one.
        assert_eq!(
            record.identity,
            RecordIdentity::Alternate("DJ Moore".to_string())
        );
        assert_eq!(record.display_name, "D.J. Moore");
        assert_eq!(record.team.as_deref(), Some("GB"));
        assert_eq!(record.valuation.values[SOURCE], 0.5);
        assert_eq!(record.valuation.trends[SOURCE], 0.012);
    }

    #[test]
    fn superflex_leagues_use_superflex_values() {
        let players = extract_players_array(PAGE).unwrap();
        let record = map_record(players.into_iter().next().unwrap(), &settings(true));
        assert_eq!(record.valuation.values[SOURCE], 0.48);
    }

    #[test]
    fn missing_value_block_yields_empty_valuation() {
        let player = RawKtcPlayer {
            player_name: "2025 1st".to_string(),
            team: None,
            one_qb_values: None,
            superflex_values: None,
        };
        let record = map_record(player, &settings(false));
        assert!(record.valuation.values.is_empty());
        assert!(identity::is_draft_pick_name(&record.display_name));
    }
}
