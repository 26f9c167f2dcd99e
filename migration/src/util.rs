use sea_orm_migration::prelude::*;

pub(crate) fn default_table_statement() -> TableCreateStatement {
    TableCreateStatement::new()
        .if_not_exists()
        .col(ColumnDef::new(DefaultColumn::Id)
            .uuid()
            .primary_key()
            .default(Expr::cust("GEN_RANDOM_UUID()"))
            .take())
        .col(ColumnDef::new(DefaultColumn::CreatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .col(ColumnDef::new(DefaultColumn::UpdatedAt)
            .timestamp_with_time_zone()
            .not_null()
            .take())
        .take()
}

#[derive(DeriveIden)]
pub(crate) enum DefaultColumn {
    Id,
    CreatedAt,
    UpdatedAt,
}

/// Tenant owned table with audit columns
///
/// Must run `setup_tenant_table_fk` macro on the table afterwards
///
/// # Example
///
/// ```rs
/// manager
///     .create_table(tenant_table_statement()
///         .table(PositionTarget::Table)
///         .col(ColumnDef::new(PositionTarget::Position)
///             .text()
///             .not_null())
///         .take()
///     ).await?;
/// setup_tenant_table_fk!(manager, PositionTarget::Table);
/// ```
pub(crate) fn tenant_table_statement() -> TableCreateStatement {
    default_table_statement()
        .col(ColumnDef::new(DefaultUserColumn::CreatedBy)
            .uuid())
        .col(ColumnDef::new(DefaultUserColumn::UpdatedBy)
            .uuid())
        .col(ColumnDef::new(TenantColumn::TenantId)
            .uuid()
            .not_null())
        .take()
}

/// Money columns are `NUMERIC(19, 4)`
pub(crate) fn money<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .decimal_len(19, 4)
        .not_null()
        .take()
}

#[macro_export]
macro_rules! setup_tenant_table_fk {
    ($m:expr,$t:expr) => {{
        use crate::util::*;
        use crate::m20250702_091500_init::{Tenant, User};

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, TenantColumn::TenantId)
                .to(Tenant::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, DefaultUserColumn::CreatedBy)
                .to(User::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;

        $m.create_foreign_key(ForeignKeyCreateStatement::new()
                .from($t, DefaultUserColumn::UpdatedBy)
                .to(User::Table, DefaultColumn::Id)
                .on_delete(ForeignKeyAction::SetNull)
                .on_update(ForeignKeyAction::Cascade)
                .take()
        ).await?;
    }};
}

#[derive(DeriveIden)]
pub(crate) enum DefaultUserColumn {
    CreatedBy,
    UpdatedBy,
}

#[derive(DeriveIden)]
pub(crate) enum TenantColumn {
    TenantId,
}
