// Draft log: picks, unavailable players and opponent tracking.

pub mod entry;
pub mod state;
