// FantasyCalc valuation provider: JSON API keyed by Sleeper player ids.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::cache::Cache;
use crate::models::{LeagueSettings, PlayerValuation};
use crate::valuation::identity;
use crate::valuation::{
    ProviderFeed, ProviderRecord, RecordIdentity, ValuationContext, ValuationSource,
};

pub const SOURCE: &str = "fantasy_calc";

const API_URL: &str = "https://api.fantasycalc.com/values/current";

// Some raw values drift slightly above 10k, but not by enough to matter for
// ranking purposes.
const MAX_VALUE: f64 = 10_000.0;

pub struct FantasyCalcClient {
    http: reqwest::Client,
    cache: Cache,
}

impl FantasyCalcClient {
    pub fn new(cache: Cache) -> Self {
        FantasyCalcClient {
            http: reqwest::Client::new(),
            cache,
        }
    }
}

#[async_trait]
impl ValuationSource for FantasyCalcClient {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(
        &self,
        context: ValuationContext,
        settings: &LeagueSettings,
    ) -> anyhow::Result<ProviderFeed> {
        let key = format!("fantasy_calc_{}_{}", context.label(), settings.guid);
        if let Some(hit) = self.cache.get(&key, Duration::minutes(10)) {
            return Ok(hit);
        }

        let entries: Vec<RawEntry> = self
            .http
            .get(API_URL)
            .query(&[
                ("isDynasty", (context == ValuationContext::Dynasty).to_string()),
                ("numQbs", if settings.superflex() { "2" } else { "1" }.to_string()),
                ("numTeams", settings.total_teams.to_string()),
                ("ppr", settings.ppr.to_string()),
                ("includeAdp", "false".to_string()),
            ])
            .send()
            .await
            .context("fantasycalc request failed")?
            .error_for_status()
            .context("fantasycalc returned an error status")?
            .json()
            .await
            .context("fantasycalc returned unparseable JSON")?;

        let records: Vec<ProviderRecord> = entries.into_iter().filter_map(map_entry).collect();

        debug!(
            context = context.label(),
            records = records.len(),
            "fetched fantasycalc values"
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

/// Draft picks carry the PICK pseudo-position and have no counterpart in
/// the league player set; everything else must produce a record. An entry
/// missing its Sleeper id falls back to the normalized-name identity so the
/// aggregator still accounts for it instead of it vanishing here.
fn map_entry(entry: RawEntry) -> Option<ProviderRecord> {
    if entry.player.position == "PICK" {
        return None;
    }

    let identity = match entry.player.sleeper_id {
        Some(sleeper_id) => RecordIdentity::Primary(sleeper_id),
        None => {
            let (first, last) = identity::normalize_name(&entry.player.name);
            RecordIdentity::Alternate(identity::alternate_identity(&first, &last))
        }
    };

    Some(ProviderRecord {
        identity,
        display_name: entry.player.name,
        team: entry.player.maybe_team,
        valuation: PlayerValuation::single(
            SOURCE,
            entry.value / MAX_VALUE,
            entry.trend_30_day.map(|trend| trend / MAX_VALUE),
        ),
    })
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    player: RawPlayer,
    value: f64,
    #[serde(rename = "trend30Day")]
    trend_30_day: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    #[serde(rename = "sleeperId")]
    sleeper_id: Option<String>,
    name: String,
    position: String,
    #[serde(rename = "maybeTeam", default)]
    maybe_team: Option<String>,
}
