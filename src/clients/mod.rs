// HTTP clients for the league platform and the valuation providers.

pub mod fantasy_calc;
pub mod ktc;
pub mod sleeper;
