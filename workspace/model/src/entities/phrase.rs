use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryFilter, QuerySelect, Set};

use super::language::Language;

/// A source text together with its translation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "phrases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub text: String,
    pub text_language: Language,
    pub translated_word: String,
    pub translated_word_language: Language,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

impl Model {
    /// Number of comments attached to this phrase.
    pub async fn comments_count<C>(&self, db: &C) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        self.find_related(super::comment::Entity).count(db).await
    }

    /// Comment counts for a batch of phrases, keyed by phrase id.
    /// Phrases without comments are absent from the map.
    pub async fn comments_counts<C>(
        db: &C,
        phrase_ids: &[i32],
    ) -> Result<std::collections::HashMap<i32, u64>, DbErr>
    where
        C: ConnectionTrait,
    {
        if phrase_ids.is_empty() {
            return Ok(Default::default());
        }

        let rows: Vec<(i32, i64)> = super::comment::Entity::find()
            .select_only()
            .column(super::comment::Column::PhraseId)
            .column_as(super::comment::Column::Id.count(), "count")
            .filter(super::comment::Column::PhraseId.is_in(phrase_ids.iter().copied()))
            .group_by(super::comment::Column::PhraseId)
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(phrase_id, count)| (phrase_id, count.max(0) as u64))
            .collect())
    }
}
