// Valuation engine: provider feeds, identity matching, aggregation.

pub mod aggregator;
pub mod identity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{LeagueSettings, PlayerValuation};

/// Which valuation regime a feed belongs to: long-term keeper value or
/// single-season value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationContext {
    Dynasty,
    Redraft,
}

impl ValuationContext {
    pub fn label(&self) -> &'static str {
        match self {
            ValuationContext::Dynasty => "dynasty",
            ValuationContext::Redraft => "redraft",
        }
    }
}

/// How a provider record identifies its player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordIdentity {
    /// The provider shares the league platform's primary player id.
    Primary(String),
    /// Name-only providers: matched through the normalized alternate
    /// identity ("first last").
    Alternate(String),
}

/// One player's valuation as reported by one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub identity: RecordIdentity,
    /// Display name as the provider reports it, kept for diagnostics and
    /// the draft-pick check.
    pub display_name: String,
    /// Canonicalized team code, when the provider reports one. `None` for
    /// free agents and for providers that omit teams.
    #[serde(default)]
    pub team: Option<String>,
    pub valuation: PlayerValuation,
}

/// A complete fetch from one provider in one context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFeed {
    pub source: String,
    pub context: ValuationContext,
    pub records: Vec<ProviderRecord>,
}

/// A valuation provider adapter. The set of implementations is closed and
/// known at compile time; dispatch happens over trait objects built in one
/// place, never by reflection.
///
/// Adapters normalize values to [0, 1] (division by the provider's known
/// maximum) and resolve provider-specific naming quirks before the records
/// reach the aggregator.
#[async_trait]
pub trait ValuationSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(
        &self,
        context: ValuationContext,
        settings: &LeagueSettings,
    ) -> anyhow::Result<ProviderFeed>;
}
