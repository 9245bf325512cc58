pub mod leaderboard;
pub mod registration;
pub mod results;
pub mod reveal;
pub mod scoring;
