// Library root: draft state, scoring, budget allocation and suggestions for
// a fantasy football auction.

pub mod config;
pub mod draft;
pub mod error;
pub mod opponents;
pub mod player;
pub mod search;
pub mod valuation;

pub use config::DraftConfig;
pub use draft::entry::{Advisory, MarkOutcome, PickOutcome};
pub use draft::state::DraftState;
pub use error::DraftError;
pub use player::{AgeBand, PerRole, Player, Role};
