use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create interaction_action enum
        manager
            .create_type(
                Type::create()
                    .as_enum(InteractionActionEnum::Enum)
                    .values([
                        InteractionActionEnum::Click,
                        InteractionActionEnum::Like,
                        InteractionActionEnum::View,
                        InteractionActionEnum::SelectTags,
                        InteractionActionEnum::Dislike,
                        InteractionActionEnum::Signup,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create interactions table. event_id is plain text, not a foreign
        // key: signup rows reference a sentinel id that never exists in events
        manager
            .create_table(
                Table::create()
                    .table(Interactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Interactions::Id))
                    .col(string(Interactions::UserId))
                    .col(string(Interactions::EventId))
                    .col(
                        ColumnDef::new(Interactions::Action)
                            .enumeration(
                                InteractionActionEnum::Enum,
                                [
                                    InteractionActionEnum::Click,
                                    InteractionActionEnum::Like,
                                    InteractionActionEnum::View,
                                    InteractionActionEnum::SelectTags,
                                    InteractionActionEnum::Dislike,
                                    InteractionActionEnum::Signup,
                                ],
                            )
                            .not_null(),
                    )
                    .col(float(Interactions::Weight))
                    .col(
                        timestamp_with_time_zone(Interactions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Per-user history reads and windowed aggregates
        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_user_id_created_at")
                    .table(Interactions::Table)
                    .col(Interactions::UserId)
                    .col(Interactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Co-interaction and trending scans
        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_event_id")
                    .table(Interactions::Table)
                    .col(Interactions::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_created_at")
                    .table(Interactions::Table)
                    .col(Interactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_interactions_action")
                    .table(Interactions::Table)
                    .col(Interactions::Action)
                    .to_owned(),
            )
            .await?;

        // Create user_profiles table (written by the account system, read here)
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(string(UserProfiles::UserId).primary_key())
                    .col(string_len_null(UserProfiles::Country, 255))
                    .col(json_binary(UserProfiles::Interests).not_null().default("[]"))
                    .col(
                        timestamp_with_time_zone(UserProfiles::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(UserProfiles::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Add updated_at trigger
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER user_profiles_touch_updated_at
                    BEFORE UPDATE ON user_profiles
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "DROP TRIGGER IF EXISTS user_profiles_touch_updated_at ON user_profiles",
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Interactions::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(InteractionActionEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Interactions {
    Table,
    Id,
    UserId,
    EventId,
    Action,
    Weight,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    UserId,
    Country,
    Interests,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum InteractionActionEnum {
    #[sea_orm(iden = "interaction_action")]
    Enum,
    #[sea_orm(iden = "click")]
    Click,
    #[sea_orm(iden = "like")]
    Like,
    #[sea_orm(iden = "view")]
    View,
    #[sea_orm(iden = "select_tags")]
    SelectTags,
    #[sea_orm(iden = "dislike")]
    Dislike,
    #[sea_orm(iden = "signup")]
    Signup,
}
