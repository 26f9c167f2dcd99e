use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250702_091500_init::{PositionRate, PositionTarget, Staff, Tenant, User};

const TENANT_ID: u128 = 0x7e_0001;
const OWNER_ID: u128 = 0x7e_0002;
const STAFF_COUNT: u128 = 12;

const POSITIONS: [(&str, i32); 3] = [
    ("Stylist", 160),
    ("Senior Stylist", 168),
    ("Receptionist", 173),
];

fn uuid(n: u128) -> SimpleExpr {
    Expr::val(format!("{n:032x}")).cast_as("uuid")
}

fn staff_uuid(i: u128) -> SimpleExpr {
    uuid(0x5_0000 + i)
}

fn numeric(value: impl ToString) -> SimpleExpr {
    Expr::val(value.to_string()).cast_as("numeric")
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-07-04T14:02:10.000Z").cast_as("timestamptz");

        manager
            .exec_stmt(Query::insert()
                .into_table(Tenant::Table)
                .columns(["id", "created_at", "updated_at", "name", "default_ot_rate", "default_extra_day_rate"])
                .values_panic([uuid(TENANT_ID), time.clone(), time.clone(), "Demo Salon".into(), numeric(100), numeric(500)])
                .to_owned()
        ).await?;

        let hashed_password = &sha2::Sha256::digest("owner:owner")[..];

        manager
            .exec_stmt(Query::insert()
                .into_table(User::Table)
                .columns(["id", "created_at", "updated_at", "tenant_id", "username", "password", "permissions"])
                .values_panic([uuid(OWNER_ID), time.clone(), time.clone(), uuid(TENANT_ID), "owner".into(), hashed_password.into(), Expr::val(r#"["*"]"#).cast_as("jsonb")])
                .to_owned()
        ).await?;

        for (position, required_hours) in POSITIONS {
            manager
                .exec_stmt(Query::insert()
                    .into_table(PositionTarget::Table)
                    .columns(["created_at", "updated_at", "created_by", "updated_by", "tenant_id", "position", "required_hours"])
                    .values_panic([time.clone(), time.clone(), uuid(OWNER_ID), uuid(OWNER_ID), uuid(TENANT_ID), position.into(), required_hours.into()])
                    .to_owned()
            ).await?;
        }

        manager
            .exec_stmt(Query::insert()
                .into_table(PositionRate::Table)
                .columns(["created_at", "updated_at", "created_by", "updated_by", "tenant_id", "position", "ot_rate", "extra_day_rate"])
                .values_panic([time.clone(), time.clone(), uuid(OWNER_ID), uuid(OWNER_ID), uuid(TENANT_ID), "Senior Stylist".into(), numeric(150), numeric(800)])
                .to_owned()
        ).await?;

        for i in 1..=STAFF_COUNT {
            let (position, _) = POSITIONS[(i as usize) % POSITIONS.len()];
            let fixed_salary = rand::random_range(20_000..=60_000) / 100 * 100;

            manager
                .exec_stmt(Query::insert()
                    .into_table(Staff::Table)
                    .columns(["id", "created_at", "updated_at", "created_by", "updated_by", "tenant_id", "name", "position", "fixed_salary", "status"])
                    .values_panic([
                        staff_uuid(i), time.clone(), time.clone(), uuid(OWNER_ID), uuid(OWNER_ID), uuid(TENANT_ID),
                        format!("Staff {i}").into(), position.into(), numeric(fixed_salary), Expr::val("active").cast_as("staff_status"),
                    ])
                    .to_owned()
            ).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Everything else cascades from the tenant
        manager
            .exec_stmt(Query::delete()
                .from_table(Tenant::Table)
                .and_where(Expr::col("id").eq(uuid(TENANT_ID)))
                .to_owned()
        ).await?;

        Ok(())
    }
}
