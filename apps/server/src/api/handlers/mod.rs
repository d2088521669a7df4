pub mod health;
pub mod studies;
