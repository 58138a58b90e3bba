//! This file serves as the root for all SeaORM entity modules.
//! Users own profiles, phrases and comments; comments hang off phrases.
//! Languages are not a table: they are an enumerated code stored inline.

pub mod comment;
pub mod language;
pub mod phrase;
pub mod profile;
pub mod user;

pub use language::{Language, Sex};

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::comment::Entity as Comment;
    pub use super::phrase::Entity as Phrase;
    pub use super::profile::Entity as Profile;
    pub use super::user::Entity as User;
}
