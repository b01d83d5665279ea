pub mod achievements;
pub mod content;
pub mod engagement;
pub mod heroes;
pub mod progress;
pub mod sessions;
pub mod submissions;
