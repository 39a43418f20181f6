//! Pure rule functions: night resolution, day votes, victory.

mod night;
mod victory;
mod vote;

pub use night::{adopt_kill_target, required_consensus, resolve_night};
pub use victory::check_victory;
pub use vote::{TieBreaker, apply_vote_result, tally_votes};
