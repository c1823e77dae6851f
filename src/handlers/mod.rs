pub mod admin;
pub mod dev;
pub mod public;
pub mod users;
