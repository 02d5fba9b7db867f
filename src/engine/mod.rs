pub mod events;
pub mod input;
pub mod time;
