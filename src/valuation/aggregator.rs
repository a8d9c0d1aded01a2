// Merges provider valuation feeds onto the canonical player set.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::DataIntegrityError;
use crate::models::{Guid, Player};
use crate::valuation::{identity, ProviderFeed, RecordIdentity, ValuationContext};

/// Merge every feed's records into the matching canonical players' dynasty
/// or redraft valuations.
///
/// Records carrying the primary id match directly; name-keyed records match
/// through the alternate identity derived from the canonical player names.
/// A record either merges into exactly one player or counts as unmatched —
/// and any unmatched residual that is not a draft-pick entry fails the whole
/// aggregation, guarding against silent upstream mis-scraping.
///
/// No side effects beyond the valuation fields of matched players.
pub fn aggregate_valuations(
    players: &mut HashMap<Guid, Player>,
    feeds: &[ProviderFeed],
) -> Result<(), DataIntegrityError> {
    // The alternate index is derivable from the canonical set; rebuild it
    // here rather than trusting a caller-maintained copy.
    let alternate_index: HashMap<String, Guid> = players
        .values()
        .map(|player| (player.alternate_id(), player.guid.clone()))
        .collect();

    for feed in feeds {
        let mut unmatched: Vec<&str> = Vec::new();
        let mut merged = 0usize;

        for record in &feed.records {
            let guid = match &record.identity {
                RecordIdentity::Primary(id) => players.contains_key(id).then(|| id.clone()),
                RecordIdentity::Alternate(name) => alternate_index.get(name).cloned(),
            };

            let Some(guid) = guid else {
                unmatched.push(&record.display_name);
                continue;
            };

            // The guid came from the map or the index built from it.
            if let Some(player) = players.get_mut(&guid) {
                match feed.context {
                    ValuationContext::Dynasty => player.dynasty.merge(&record.valuation),
                    ValuationContext::Redraft => player.redraft.merge(&record.valuation),
                }
                merged += 1;
            }
        }

        unmatched.retain(|name| !identity::is_draft_pick_name(name));

        if let Some(first) = unmatched.first() {
            warn!(
                source = %feed.source,
                context = feed.context.label(),
                unmatched = unmatched.len(),
                "provider records left unmatched after aggregation"
            );
            return Err(DataIntegrityError::UnmatchedProviderRecords {
                provider: feed.source.clone(),
                count: unmatched.len(),
                first: first.to_string(),
            });
        }

        debug!(
            source = %feed.source,
            context = feed.context.label(),
            merged,
            "provider feed aggregated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerValuation, Position};
    use crate::valuation::ProviderRecord;

    fn canonical(guid: &str, first: &str, last: &str) -> Player {
        Player {
            guid: guid.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            team: Some("CHI".to_string()),
            position: Position::WideReceiver,
            number: None,
            bye_week: None,
            status: None,
            injury_status: None,
            dynasty: PlayerValuation::default(),
            redraft: PlayerValuation::default(),
        }
    }

    fn player_map(players: Vec<Player>) -> HashMap<Guid, Player> {
        players.into_iter().map(|p| (p.guid.clone(), p)).collect()
    }

    fn record(identity: RecordIdentity, name: &str, source: &str, value: f64) -> ProviderRecord {
        ProviderRecord {
            identity,
            display_name: name.to_string(),
            team: None,
            valuation: PlayerValuation::single(source, value, None),
        }
    }

    fn feed(source: &str, context: ValuationContext, records: Vec<ProviderRecord>) -> ProviderFeed {
        ProviderFeed {
            source: source.to_string(),
            context,
            records,
        }
    }

    #[test]
    fn primary_id_records_merge_directly() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![feed(
            "fantasy_calc",
            ValuationContext::Redraft,
            vec![record(
                RecordIdentity::Primary("p1".to_string()),
                "DJ Moore",
                "fantasy_calc",
                0.82,
            )],
        )];

        aggregate_valuations(&mut players, &feeds).unwrap();
        assert_eq!(players["p1"].redraft.values["fantasy_calc"], 0.82);
        assert!(players["p1"].dynasty.values.is_empty());
    }

    #[test]
    fn alternate_identity_records_merge_by_name() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        // The provider spells the name differently; its adapter normalizes
        // through the fix table before building the record identity.
        let (first, last) = identity::normalize_name("D.J. Moore");
        let feeds = vec![feed(
            "ktc",
            ValuationContext::Dynasty,
            vec![record(
                RecordIdentity::Alternate(identity::alternate_identity(&first, &last)),
                "D.J. Moore",
                "ktc",
                0.91,
            )],
        )];

        aggregate_valuations(&mut players, &feeds).unwrap();
        assert_eq!(players["p1"].dynasty.values["ktc"], 0.91);
    }

    #[test]
    fn divergent_spellings_land_on_one_player() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![
            feed(
                "fantasy_calc",
                ValuationContext::Redraft,
                vec![record(
                    RecordIdentity::Primary("p1".to_string()),
                    "DJ Moore",
                    "fantasy_calc",
                    0.80,
                )],
            ),
            feed(
                "ktc",
                ValuationContext::Redraft,
                vec![record(
                    RecordIdentity::Alternate("DJ Moore".to_string()),
                    "D.J. Moore",
                    "ktc",
                    0.85,
                )],
            ),
        ];

        aggregate_valuations(&mut players, &feeds).unwrap();
        let redraft = &players["p1"].redraft;
        assert_eq!(redraft.values.len(), 2);
        assert_eq!(redraft.values["fantasy_calc"], 0.80);
        assert_eq!(redraft.values["ktc"], 0.85);
    }

    #[test]
    fn draft_pick_records_are_excluded_from_residual() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![feed(
            "ktc",
            ValuationContext::Dynasty,
            vec![
                record(
                    RecordIdentity::Alternate("DJ Moore".to_string()),
                    "DJ Moore",
                    "ktc",
                    0.9,
                ),
                record(
                    RecordIdentity::Alternate("2025 1st".to_string()),
                    "2025 1st",
                    "ktc",
                    0.7,
                ),
            ],
        )];

        assert!(aggregate_valuations(&mut players, &feeds).is_ok());
    }

    #[test]
    fn unmatched_player_record_fails_aggregation() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![feed(
            "ktc",
            ValuationContext::Dynasty,
            vec![record(
                RecordIdentity::Alternate("Nobody Matching".to_string()),
                "Nobody Matching",
                "ktc",
                0.5,
            )],
        )];

        let err = aggregate_valuations(&mut players, &feeds).unwrap_err();
        match err {
            DataIntegrityError::UnmatchedProviderRecords { provider, count, first } => {
                assert_eq!(provider, "ktc");
                assert_eq!(count, 1);
                assert_eq!(first, "Nobody Matching");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_primary_id_also_counts_as_unmatched() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![feed(
            "fantasy_calc",
            ValuationContext::Redraft,
            vec![record(
                RecordIdentity::Primary("missing".to_string()),
                "Someone Else",
                "fantasy_calc",
                0.4,
            )],
        )];

        assert!(aggregate_valuations(&mut players, &feeds).is_err());
    }

    #[test]
    fn repeated_aggregation_overwrites_instead_of_duplicating() {
        let mut players = player_map(vec![canonical("p1", "DJ", "Moore")]);
        let feeds = vec![feed(
            "ktc",
            ValuationContext::Redraft,
            vec![record(
                RecordIdentity::Alternate("DJ Moore".to_string()),
                "DJ Moore",
                "ktc",
                0.6,
            )],
        )];

        aggregate_valuations(&mut players, &feeds).unwrap();
        aggregate_valuations(&mut players, &feeds).unwrap();
        assert_eq!(players["p1"].redraft.values.len(), 1);
        assert_eq!(players["p1"].redraft.values["ktc"], 0.6);
    }
}
