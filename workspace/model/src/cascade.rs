//! Cascading deletes.
//!
//! Dependents are removed explicitly, children first, inside one
//! transaction. The schema's `ON DELETE CASCADE` only applies on SQLite
//! connections with `foreign_keys` enabled.

use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    QueryTrait, TransactionTrait,
};
use tracing::{debug, instrument};

use crate::entities::{comment, phrase, profile, user};

/// Rows removed by a cascading delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSummary {
    pub users: u64,
    pub profiles: u64,
    pub phrases: u64,
    pub comments: u64,
}

/// Deletes a user together with its profile, its phrases, the comments on
/// those phrases and every comment the user wrote elsewhere.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i32) -> Result<CascadeSummary, DbErr> {
    let txn = db.begin().await?;

    let owned_phrases = phrase::Entity::find()
        .select_only()
        .column(phrase::Column::Id)
        .filter(phrase::Column::UserId.eq(user_id))
        .into_query();

    let comments = comment::Entity::delete_many()
        .filter(
            Condition::any()
                .add(comment::Column::UserId.eq(user_id))
                .add(comment::Column::PhraseId.in_subquery(owned_phrases)),
        )
        .exec(&txn)
        .await?;

    let phrases = phrase::Entity::delete_many()
        .filter(phrase::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    let profiles = profile::Entity::delete_many()
        .filter(profile::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    let users = user::Entity::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;

    let summary = CascadeSummary {
        users: users.rows_affected,
        profiles: profiles.rows_affected,
        phrases: phrases.rows_affected,
        comments: comments.rows_affected,
    };
    debug!(?summary, "User cascade committed");
    Ok(summary)
}

/// Deletes a phrase and its comments.
#[instrument(skip(db))]
pub async fn delete_phrase(db: &DatabaseConnection, phrase_id: i32) -> Result<CascadeSummary, DbErr> {
    let txn = db.begin().await?;

    let comments = comment::Entity::delete_many()
        .filter(comment::Column::PhraseId.eq(phrase_id))
        .exec(&txn)
        .await?;

    let phrases = phrase::Entity::delete_by_id(phrase_id).exec(&txn).await?;

    txn.commit().await?;

    let summary = CascadeSummary {
        phrases: phrases.rows_affected,
        comments: comments.rows_affected,
        ..Default::default()
    };
    debug!(?summary, "Phrase cascade committed");
    Ok(summary)
}
