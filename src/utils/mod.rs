pub mod colour;
pub mod discord;
pub mod error;
pub mod time;
