use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create compensation_action_type enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ActionTypeEnum::Enum)
                    .values([
                        ActionTypeEnum::Rollback,
                        ActionTypeEnum::Retry,
                        ActionTypeEnum::ManualIntervention,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create compensation_action_status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(ActionStatusEnum::Enum)
                    .values([
                        ActionStatusEnum::Pending,
                        ActionStatusEnum::Completed,
                        ActionStatusEnum::Failed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompensationQueue::Table)
                    .if_not_exists()
                    .col(pk_uuid(CompensationQueue::Id))
                    .col(
                        ColumnDef::new(CompensationQueue::ActionType)
                            .enumeration(
                                ActionTypeEnum::Enum,
                                [
                                    ActionTypeEnum::Rollback,
                                    ActionTypeEnum::Retry,
                                    ActionTypeEnum::ManualIntervention,
                                ],
                            )
                            .not_null(),
                    )
                    .col(text(CompensationQueue::Description))
                    .col(json_binary(CompensationQueue::Payload).not_null())
                    .col(
                        ColumnDef::new(CompensationQueue::Status)
                            .enumeration(
                                ActionStatusEnum::Enum,
                                [
                                    ActionStatusEnum::Pending,
                                    ActionStatusEnum::Completed,
                                    ActionStatusEnum::Failed,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(integer(CompensationQueue::RetryCount).default(0))
                    .col(integer(CompensationQueue::MaxRetries).default(3))
                    .col(text_null(CompensationQueue::LastError))
                    .col(
                        timestamp_with_time_zone(CompensationQueue::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CompensationQueue::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Eligibility scan: status filter ordered by age
        manager
            .create_index(
                Index::create()
                    .name("idx_compensation_queue_status_created_at")
                    .table(CompensationQueue::Table)
                    .col(CompensationQueue::Status)
                    .col(CompensationQueue::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Add updated_at trigger
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER compensation_queue_touch_updated_at
                    BEFORE UPDATE ON compensation_queue
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
                "DROP TRIGGER IF EXISTS compensation_queue_touch_updated_at ON compensation_queue",
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CompensationQueue::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ActionStatusEnum::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ActionTypeEnum::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CompensationQueue {
    Table,
    Id,
    ActionType,
    Description,
    Payload,
    Status,
    RetryCount,
    MaxRetries,
    LastError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ActionTypeEnum {
    #[sea_orm(iden = "compensation_action_type")]
    Enum,
    #[sea_orm(iden = "rollback")]
    Rollback,
    #[sea_orm(iden = "retry")]
    Retry,
    #[sea_orm(iden = "manual_intervention")]
    ManualIntervention,
}

#[derive(DeriveIden)]
enum ActionStatusEnum {
    #[sea_orm(iden = "compensation_action_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "failed")]
    Failed,
}
