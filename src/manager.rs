// One weekly management cycle: load the league, aggregate valuations,
// optimize the user's roster, and (when enabled) push the result back.

use std::collections::HashMap;

use anyhow::Context;
use tracing::{info, warn};

use crate::cache::Cache;
use crate::clients::fantasy_calc::FantasyCalcClient;
use crate::clients::ktc::KtcClient;
use crate::clients::sleeper::SleeperClient;
use crate::config::Config;
use crate::league::League;
use crate::lineup::optimizer::optimize_roster;
use crate::models::{Guid, LeagueSettings, Player, Roster, SourceWeights, EMPTY_SLOT};
use crate::valuation::aggregator::aggregate_valuations;
use crate::valuation::{ProviderFeed, ValuationContext, ValuationSource};

/// Run one complete cycle. The core computation is synchronous and
/// deterministic; all awaiting happens in the client calls.
pub async fn run_cycle(config: &Config) -> anyhow::Result<()> {
    let cache = match &config.cache_dir {
        Some(dir) => Cache::new(dir.clone()),
        None => Cache::open_default(),
    };

    let sleeper = SleeperClient::new(&config.token, &config.league_id, cache.clone())?;
    // The provider set is closed and assembled in exactly one place.
    let sources: Vec<Box<dyn ValuationSource>> = vec![
        Box::new(FantasyCalcClient::new(cache.clone())),
        Box::new(KtcClient::new(cache)?),
    ];

    let mut league = League::load(&sleeper).await?;

    let mut feeds: Vec<ProviderFeed> = Vec::new();
    for source in &sources {
        for context in [ValuationContext::Dynasty, ValuationContext::Redraft] {
            let feed = source
                .fetch(context, &league.settings)
                .await
                .with_context(|| format!("fetching {} {} values", source.name(), context.label()))?;
            feeds.push(feed);
        }
    }

    aggregate_valuations(&mut league.players, &feeds)
        .context("reconciling provider valuations")?;

    let roster = league
        .my_roster()
        .context("the configured account owns no roster in this league")?
        .clone();

    info!(
        "current lineup:\n{}",
        format_lineup(&roster, &league.settings, &league.players, &config.weights)
    );

    let proposal = optimize_roster(
        &roster,
        &league.settings,
        &league.players,
        &league.teams,
        &config.weights,
    )?;

    for unfilled in &proposal.unfilled {
        warn!(
            slot = %unfilled.label,
            index = unfilled.index,
            eligible = ?unfilled.eligible,
            "no eligible player left for starting slot"
        );
    }

    info!(
        "proposed lineup:\n{}",
        format_lineup(&proposal.roster, &league.settings, &league.players, &config.weights)
    );

    if config.manage_taxi {
        warn!("taxi management is not part of the weekly cycle; taxi squads are left untouched");
    }

    if config.manage_roster {
        sleeper.update_roster(&proposal.roster).await?;
    } else {
        info!("dry run: set manage.roster = true to push the proposed lineup");
    }

    Ok(())
}

/// Render a roster as one line per starting slot followed by the bench,
/// reserve, and taxi lists.
pub fn format_lineup(
    roster: &Roster,
    settings: &LeagueSettings,
    players: &HashMap<Guid, Player>,
    weights: &SourceWeights,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (index, id) in roster.starters.iter().enumerate() {
        let label = settings
            .roster_positions
            .get(index)
            .map(String::as_str)
            .unwrap_or("?");
        lines.push(format!("  {:>10}: {}", label, describe(id, players, weights)));
    }

    for (label, ids) in [
        ("bench", &roster.bench),
        ("reserve", &roster.reserve),
        ("taxi", &roster.taxi),
    ] {
        let names: Vec<String> = ids.iter().map(|id| describe(id, players, weights)).collect();
        lines.push(format!("  {:>10}: {}", label, names.join(", ")));
    }

    lines.join("\n")
}

fn describe(id: &Guid, players: &HashMap<Guid, Player>, weights: &SourceWeights) -> String {
    if id == EMPTY_SLOT {
        return "(empty)".to_string();
    }
    match players.get(id) {
        Some(player) => format!(
            "{} [{}] ({:.2})",
            player.name(),
            player.position.display_str(),
            player.redraft.score(weights)
        ),
        None => format!("unknown player {id}"),
    }
}
