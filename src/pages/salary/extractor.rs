use std::ops::Deref;

use super::*;

impl FromRequest for salary_record::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let session = Session::from_request(&req, &mut dev::Payload::None).await?;

            let Some(salary_id) = req.match_info().get("salary_id") else {
                return Err(actix_web::error::ErrorInternalServerError("salary record extractor used outside of a `salary_id` path"))
            };
            let Ok(salary_id) = Uuid::from_str(salary_id) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `salary_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let record = SalaryRecord::find_by_id(salary_id)
                .filter(salary_record::Column::TenantId.eq(session.tenant_id))
                .one(db.as_ref()).await
                .map_err(PayrollError::from)?
                .ok_or(PayrollError::NotFound("salary record"))?;

            Ok(record)
        })
    }
}

/// A salary record that has been processed but not paid yet
pub(super) struct UnpaidSalaryRecord(pub(super) salary_record::Model);

impl Deref for UnpaidSalaryRecord {
    type Target = salary_record::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for UnpaidSalaryRecord {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let record = salary_record::Model::from_request(&req, &mut dev::Payload::None).await?;

            if record.paid {
                return Err(PayrollError::TerminalState("salary record is already paid".to_string()).into());
            }

            Ok(Self(record))
        })
    }
}
