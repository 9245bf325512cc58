pub mod leaderboard;
pub mod tournament;
pub mod user;

pub use leaderboard::*;
pub use tournament::*;
pub use user::*;
