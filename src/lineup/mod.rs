// Lineup construction: slot eligibility and the roster optimizer.

pub mod optimizer;

use crate::models::Position;

/// Bench slot label; never startable.
pub const BENCH_SLOT: &str = "BN";

/// Native positions allowed to fill a startable slot label. Labels absent
/// from this map cannot appear in the startable prefix of a league's slot
/// list; the bench label accepts any position and is handled separately.
pub fn eligible_positions(slot: &str) -> Option<&'static [Position]> {
    use Position::*;

    let positions: &'static [Position] = match slot {
        "QB" => &[Quarterback],
        "RB" => &[RunningBack],
        "WR" => &[WideReceiver],
        "TE" => &[TightEnd],
        "K" => &[Kicker],
        "DEF" => &[Defense],
        "FLEX" => &[RunningBack, WideReceiver, TightEnd],
        "SUPER_FLEX" => &[Quarterback, RunningBack, WideReceiver, TightEnd],
        _ => return None,
    };

    Some(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedicated_slots_accept_one_position() {
        assert_eq!(eligible_positions("QB"), Some(&[Position::Quarterback][..]));
        assert_eq!(eligible_positions("TE"), Some(&[Position::TightEnd][..]));
    }

    #[test]
    fn flex_accepts_rb_wr_te() {
        let flex = eligible_positions("FLEX").unwrap();
        assert!(flex.contains(&Position::RunningBack));
        assert!(flex.contains(&Position::WideReceiver));
        assert!(flex.contains(&Position::TightEnd));
        assert!(!flex.contains(&Position::Quarterback));
    }

    #[test]
    fn superflex_also_accepts_qb() {
        let sf = eligible_positions("SUPER_FLEX").unwrap();
        assert!(sf.contains(&Position::Quarterback));
    }

    #[test]
    fn bench_and_unknown_labels_have_no_mapping() {
        assert!(eligible_positions(BENCH_SLOT).is_none());
        assert!(eligible_positions("IDP_FLEX").is_none());
    }
}
