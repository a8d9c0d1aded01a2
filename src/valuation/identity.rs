// Name-based identity matching: normalize -> fix-table lookup -> suffix and
// roman-numeral stripping, producing the canonical alternate identity used
// when providers do not share primary player ids.
//
// Matching is a pure function of the raw name; never cache-backed.

/// Known provider-to-Sleeper name divergences. Applied before any other
/// normalization.
pub fn fix_name(raw: &str) -> &str {
    match raw {
        "Mitchell Trubisky" => "Mitch Trubisky",
        "Jeffery Wilson" => "Jeff Wilson",
        "D.J. Chark" => "DJ Chark",
        "D.J. Moore" => "DJ Moore",
        "Gabriel Davis" => "Gabe Davis",
        "Josh Palmer" => "Joshua Palmer",
        "Scotty Miller" => "Scott Miller",
        "D'Wayne Eskridge" => "Dee Eskridge",
        other => other,
    }
}

/// Known provider-to-Sleeper team code divergences. `None` means free agent.
pub fn fix_team(raw: &str) -> Option<&str> {
    match raw {
        "GBP" => Some("GB"),
        "LVR" => Some("LV"),
        "SFO" => Some("SF"),
        "KCC" => Some("KC"),
        "NOS" => Some("NO"),
        "FA" => None,
        "JAC" => Some("JAX"),
        "NEP" => Some("NE"),
        "TBB" => Some("TB"),
        other => Some(other),
    }
}

/// Normalize a provider display name into canonical (first, last) parts:
/// apply the fix table, then drop a trailing "Jr."/"Sr." suffix or a
/// trailing roman numeral (a final token made of nothing but I and V).
pub fn normalize_name(raw: &str) -> (String, String) {
    let fixed = fix_name(raw);
    let mut parts: Vec<&str> = fixed.split_whitespace().collect();

    if let Some(&tail) = parts.last() {
        if parts.len() > 1 && (tail == "Jr." || tail == "Sr." || is_roman_numeral(tail)) {
            parts.pop();
        }
    }

    let first = parts.first().copied().unwrap_or_default().to_string();
    let last = parts.get(1..).unwrap_or_default().join(" ");
    (first, last)
}

/// The canonical alternate identity for a normalized name.
pub fn alternate_identity(first: &str, last: &str) -> String {
    format!("{first} {last}")
}

/// Whether an unmatched provider display name looks like a draft pick
/// rather than a player, e.g. "2025 1st".
///
/// Provider feeds mix future draft picks into their player lists; picks have
/// no counterpart in the league player set and must not count against the
/// unmatched residual. Purely-numeric leading token is the only signal the
/// feeds give us; it is provider-format-dependent and should be revisited
/// before trusting it for a new provider.
pub fn is_draft_pick_name(display_name: &str) -> bool {
    display_name
        .split_whitespace()
        .next()
        .map(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn is_roman_numeral(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c == 'I' || c == 'V')
}
