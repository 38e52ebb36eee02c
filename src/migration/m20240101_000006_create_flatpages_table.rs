use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Flatpages {
    Table,
    Id,
    Url,
    Title,
    Content,
    RegistrationRequired,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Flatpages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Flatpages::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Flatpages::Url)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Flatpages::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Flatpages::Content).text().not_null())
                    .col(
                        ColumnDef::new(Flatpages::RegistrationRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Flatpages::Table).to_owned())
            .await
    }
}
