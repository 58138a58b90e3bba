use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Username, 20))
                    .col(string_len(Users::Email, 100).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(boolean(Users::IsActive).default(true))
                    .col(boolean(Users::IsStaff).default(false))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create profiles table, one row per user at most
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(pk_auto(Profiles::Id))
                    .col(integer(Profiles::UserId).unique_key())
                    .col(string_len(Profiles::Sex, 7))
                    .col(date(Profiles::DateOfBirth))
                    .col(timestamp_with_time_zone(Profiles::CreatedAt))
                    .col(timestamp_with_time_zone(Profiles::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profile_user")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create phrases table
        manager
            .create_table(
                Table::create()
                    .table(Phrases::Table)
                    .if_not_exists()
                    .col(pk_auto(Phrases::Id))
                    .col(integer(Phrases::UserId))
                    .col(string_len(Phrases::Text, 1000))
                    .col(string_len(Phrases::TextLanguage, 3))
                    .col(string_len(Phrases::TranslatedWord, 1000))
                    .col(string_len(Phrases::TranslatedWordLanguage, 3))
                    .col(timestamp_with_time_zone(Phrases::CreatedAt))
                    .col(timestamp_with_time_zone(Phrases::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phrase_user")
                            .from(Phrases::Table, Phrases::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create comments table
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(pk_auto(Comments::Id))
                    .col(integer(Comments::UserId))
                    .col(integer(Comments::PhraseId))
                    .col(string_len(Comments::Text, 1000))
                    .col(string_len(Comments::TextLanguage, 3))
                    .col(timestamp_with_time_zone(Comments::CreatedAt))
                    .col(timestamp_with_time_zone(Comments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_user")
                            .from(Comments::Table, Comments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_phrase")
                            .from(Comments::Table, Comments::PhraseId)
                            .to(Phrases::Table, Phrases::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phrases_user_id")
                    .table(Phrases::Table)
                    .col(Phrases::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_phrase_id")
                    .table(Comments::Table)
                    .col(Comments::PhraseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of creation
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Phrases::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    IsActive,
    IsStaff,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    UserId,
    Sex,
    DateOfBirth,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Phrases {
    Table,
    Id,
    UserId,
    Text,
    TextLanguage,
    TranslatedWord,
    TranslatedWordLanguage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    UserId,
    PhraseId,
    Text,
    TextLanguage,
    CreatedAt,
    UpdatedAt,
}
