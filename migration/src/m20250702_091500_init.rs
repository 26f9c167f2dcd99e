use sea_orm_migration::{prelude::{extension::postgres::TypeDropStatement, *}, sea_orm::{ActiveEnum, DbBackend, DeriveActiveEnum, EnumIter, Schema}};

use crate::{setup_tenant_table_fk, util::{default_table_statement, money, tenant_table_statement, DefaultColumn, TenantColumn}};

#[derive(DeriveMigrationName)]
pub struct Migration;

impl Migration {
    async fn staff_fk(manager: &SchemaManager<'_>, table: impl IntoTableRef, column: impl IntoIden) -> Result<(), DbErr> {
        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(table, column)
            .to(Staff::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .on_update(ForeignKeyAction::Cascade)
            .take()
        ).await
    }

    async fn unique_index(manager: &SchemaManager<'_>, name: &str, table: impl IntoTableRef, columns: Vec<DynIden>) -> Result<(), DbErr> {
        let mut index = Index::create();
        index.name(name).table(table).unique();

        for column in columns {
            index.col(column);
        }

        manager.create_index(index.take()).await
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(DbBackend::Postgres);

        manager
            .create_type(
                schema.create_enum_from_active_enum::<StaffStatus>()
            ).await?;

        manager
            .create_type(
                schema.create_enum_from_active_enum::<AdvanceStatus>()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(Tenant::Table)
                .col(ColumnDef::new(Tenant::Name)
                    .text()
                    .not_null())
                .col(money(Tenant::DefaultOtRate))
                .col(money(Tenant::DefaultExtraDayRate))
                .take()
            ).await?;

        manager
            .create_table(default_table_statement()
                .table(User::Table)
                .col(ColumnDef::new(TenantColumn::TenantId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(User::Username)
                    .text()
                    .unique_key()
                    .not_null())
                .col(ColumnDef::new(User::Password)
                    .binary()
                    .not_null()) // sha256 of `password:username`
                .col(ColumnDef::new(User::Permissions)
                    .json_binary()
                    .not_null()
                    .default(Expr::cust("'[]'::jsonb")))
                .take()
            ).await?;

        manager.create_foreign_key(ForeignKeyCreateStatement::new()
            .from(User::Table, TenantColumn::TenantId)
            .to(Tenant::Table, DefaultColumn::Id)
            .on_delete(ForeignKeyAction::Cascade)
            .on_update(ForeignKeyAction::Cascade)
            .take()
        ).await?;

        manager
            .create_table(tenant_table_statement()
                .table(Staff::Table)
                .col(ColumnDef::new(Staff::Name)
                    .text()
                    .not_null())
                .col(ColumnDef::new(Staff::Position)
                    .text()
                    .not_null())
                .col(money(Staff::FixedSalary))
                .col(ColumnDef::new(Staff::Status)
                    .custom(StaffStatus::name())
                    .not_null()
                    .default(Expr::val("active").cast_as(StaffStatus::name())))
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, Staff::Table);

        manager
            .create_table(tenant_table_statement()
                .table(PositionRate::Table)
                .col(ColumnDef::new(PositionRate::Position)
                    .text()
                    .not_null())
                .col(money(PositionRate::OtRate))
                .col(money(PositionRate::ExtraDayRate))
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, PositionRate::Table);
        Self::unique_index(manager, "position_rate_tenant_position", PositionRate::Table,
            vec![TenantColumn::TenantId.into_iden(), PositionRate::Position.into_iden()]).await?;

        manager
            .create_table(tenant_table_statement()
                .table(PositionTarget::Table)
                .col(ColumnDef::new(PositionTarget::Position)
                    .text()
                    .not_null())
                .col(ColumnDef::new(PositionTarget::RequiredHours)
                    .integer()
                    .not_null())
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, PositionTarget::Table);
        Self::unique_index(manager, "position_target_tenant_position", PositionTarget::Table,
            vec![TenantColumn::TenantId.into_iden(), PositionTarget::Position.into_iden()]).await?;

        manager
            .create_table(tenant_table_statement()
                .table(Attendance::Table)
                .col(ColumnDef::new(Attendance::StaffId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(Attendance::WorkDate)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Attendance::CheckIn)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(Attendance::CheckOut)
                    .timestamp_with_time_zone()
                    .not_null())
                .col(ColumnDef::new(Attendance::WorkingMinutes)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(Attendance::OvertimeMinutes)
                    .integer()
                    .not_null()
                    .default(0))
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, Attendance::Table);
        Self::staff_fk(manager, Attendance::Table, Attendance::StaffId).await?;
        Self::unique_index(manager, "attendance_staff_work_date", Attendance::Table,
            vec![Attendance::StaffId.into_iden(), Attendance::WorkDate.into_iden()]).await?;

        manager
            .create_table(tenant_table_statement()
                .table(Incentive::Table)
                .col(ColumnDef::new(Incentive::StaffId)
                    .uuid()
                    .not_null())
                .col(money(Incentive::Amount))
                .col(ColumnDef::new(Incentive::EarnedOn)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Incentive::Description)
                    .text()
                    .not_null()
                    .default(""))
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, Incentive::Table);
        Self::staff_fk(manager, Incentive::Table, Incentive::StaffId).await?;

        manager
            .create_table(tenant_table_statement()
                .table(Advance::Table)
                .col(ColumnDef::new(Advance::StaffId)
                    .uuid()
                    .not_null())
                .col(money(Advance::Amount))
                .col(ColumnDef::new(Advance::Status)
                    .custom(AdvanceStatus::name())
                    .not_null()
                    .default(Expr::val("pending").cast_as(AdvanceStatus::name())))
                .col(ColumnDef::new(Advance::RequestedOn)
                    .date()
                    .not_null())
                .col(ColumnDef::new(Advance::DecidedOn)
                    .date())
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, Advance::Table);
        Self::staff_fk(manager, Advance::Table, Advance::StaffId).await?;

        manager
            .create_table(tenant_table_statement()
                .table(SalaryRecord::Table)
                .col(ColumnDef::new(SalaryRecord::StaffId)
                    .uuid()
                    .not_null())
                .col(ColumnDef::new(SalaryRecord::Year)
                    .integer()
                    .not_null())
                .col(ColumnDef::new(SalaryRecord::Month)
                    .integer()
                    .not_null()
                    .check(Expr::col(SalaryRecord::Month).between(1, 12)))
                .col(money(SalaryRecord::FixedSalary))
                .col(money(SalaryRecord::BaseSalary))
                .col(money(SalaryRecord::RegularHours))
                .col(money(SalaryRecord::OtHours))
                .col(money(SalaryRecord::OtAmount))
                .col(ColumnDef::new(SalaryRecord::ExtraDays)
                    .integer()
                    .not_null()
                    .default(0))
                .col(money(SalaryRecord::ExtraDayPay))
                .col(money(SalaryRecord::Addition))
                .col(money(SalaryRecord::Deduction))
                .col(money(SalaryRecord::AdvanceDeducted))
                .col(money(SalaryRecord::TotalEarnings))
                .col(money(SalaryRecord::TotalDeductions))
                .col(money(SalaryRecord::NetSalary))
                .col(ColumnDef::new(SalaryRecord::Paid)
                    .boolean()
                    .not_null()
                    .default(false))
                .col(ColumnDef::new(SalaryRecord::PaidOn)
                    .date())
                .take()
            ).await?;
        setup_tenant_table_fk!(manager, SalaryRecord::Table);
        Self::staff_fk(manager, SalaryRecord::Table, SalaryRecord::StaffId).await?;
        Self::unique_index(manager, "salary_record_tenant_staff_period", SalaryRecord::Table,
            vec![
                TenantColumn::TenantId.into_iden(),
                SalaryRecord::StaffId.into_iden(),
                SalaryRecord::Year.into_iden(),
                SalaryRecord::Month.into_iden(),
            ]).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables: [DynIden; 9] = [
            SalaryRecord::Table.into_iden(),
            Advance::Table.into_iden(),
            Incentive::Table.into_iden(),
            Attendance::Table.into_iden(),
            PositionTarget::Table.into_iden(),
            PositionRate::Table.into_iden(),
            Staff::Table.into_iden(),
            User::Table.into_iden(),
            Tenant::Table.into_iden(),
        ];

        for table in tables {
            manager
                .drop_table(
                    TableDropStatement::new()
                        .table(table)
                        .if_exists()
                        .take()
                ).await?;
        }

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(AdvanceStatus::name())
                    .to_owned()
            ).await?;

        manager
            .drop_type(
                TypeDropStatement::new()
                    .name(StaffStatus::name())
                    .to_owned()
            ).await?;

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Tenant {
    Table,
    Name,
    DefaultOtRate,
    DefaultExtraDayRate,
}

#[derive(Iden)]
pub(crate) enum User {
    Table,
    Username,
    Password,
    Permissions,
}

#[derive(Iden)]
pub(crate) enum Staff {
    Table,
    Name,
    Position,
    FixedSalary,
    Status,
}

#[derive(Iden)]
pub(crate) enum PositionRate {
    Table,
    Position,
    OtRate,
    ExtraDayRate,
}

#[derive(Iden)]
pub(crate) enum PositionTarget {
    Table,
    Position,
    RequiredHours,
}

#[derive(Iden)]
enum Attendance {
    Table,
    StaffId,
    WorkDate,
    CheckIn,
    CheckOut,
    WorkingMinutes,
    OvertimeMinutes,
}

#[derive(Iden)]
enum Incentive {
    Table,
    StaffId,
    Amount,
    EarnedOn,
    Description,
}

#[derive(Iden)]
enum Advance {
    Table,
    StaffId,
    Amount,
    Status,
    RequestedOn,
    DecidedOn,
}

#[derive(Iden)]
enum SalaryRecord {
    Table,
    StaffId,
    Year,
    Month,
    FixedSalary,
    BaseSalary,
    RegularHours,
    OtHours,
    OtAmount,
    ExtraDays,
    ExtraDayPay,
    Addition,
    Deduction,
    AdvanceDeducted,
    TotalEarnings,
    TotalDeductions,
    NetSalary,
    Paid,
    PaidOn,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "staff_status")]
enum StaffStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "advance_status")]
enum AdvanceStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}
