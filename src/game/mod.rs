pub mod achievements;
pub mod battle;
pub mod ledger;
pub mod progression;
pub mod streak;
pub mod weekly;
