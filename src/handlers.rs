pub mod auth;
pub mod comments;
pub mod health;
pub mod languages;
pub mod phrases;
pub mod profiles;
pub mod users;
