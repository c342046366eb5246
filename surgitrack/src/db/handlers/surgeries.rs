//! Database repository for surgeries.
//!
//! Recording a surgery is the one workflow that touches every other
//! repository: participant names resolve through [`Users`], usage
//! counters drop through [`Instruments`], stock is claimed and tagged
//! through [`Consumables`], and the id comes from [`Counters`]. The whole
//! sequence runs in a single transaction, so a failure at any step (a
//! stock shortage, an ambiguous nurse name) leaves no trace: decrements
//! and tags applied earlier in the sequence roll back with it.

use chrono::{FixedOffset, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::{
    errors::{DbError, Result},
    handlers::{
        consumables::Consumables, counters::Counters, instruments::Instruments, users::Users,
    },
    models::{
        consumables::ConsumableUseDBRequest,
        surgeries::{
            InstrumentUse, SurgeryDBResponse, SurgeryFilter, SurgeryRecordDBRequest,
            SurgeryUpdateDBRequest,
        },
    },
};
use crate::types::{ConsumableId, SurgeryId, UserId};

pub struct Surgeries<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Surgeries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Records one completed surgery.
    ///
    /// Participant names must each resolve to exactly one user. Every
    /// requested instrument loses one use; every consumable demand claims
    /// the freshest unit of that name and tags it with the demand's
    /// description. The record's `date` is the ward clock's calendar day,
    /// stored at midnight UTC, independent of the begin/end timestamps.
    ///
    /// Runs in one transaction: a shortage or resolution failure midway
    /// undoes every counter and tag already applied.
    #[instrument(skip(self, request, ward), fields(procedure = %request.procedure_name), err)]
    pub async fn record(
        &mut self,
        request: &SurgeryRecordDBRequest,
        ward: FixedOffset,
    ) -> Result<SurgeryDBResponse> {
        let mut tx = self.db.begin().await?;

        let chief = Users::new(&mut tx).resolve_name(&request.chief_surgeon).await?.id;
        let associate = match &request.associate_surgeon {
            Some(name) => Some(Users::new(&mut tx).resolve_name(name).await?.id),
            None => None,
        };
        let instrument_nurses = resolve_names(&mut tx, &request.instrument_nurses).await?;
        let circulating_nurses = resolve_names(&mut tx, &request.circulating_nurses).await?;

        let mut snapshots = Vec::with_capacity(request.instruments.len());
        for usage in &request.instruments {
            Instruments::new(&mut tx).decrement(usage.id, 1).await?;
            snapshots.push(usage.clone());
        }

        let unit_ids = claim_consumables(&mut tx, &request.consumables).await?;

        let id = Counters::new(&mut tx).next_id(crate::types::RecordKind::Surgery).await?;
        let date = Utc::now().with_timezone(&ward).date_naive().and_time(NaiveTime::MIN).and_utc();

        let surgery = sqlx::query_as::<_, SurgeryDBResponse>(
            r#"
            INSERT INTO surgeries
                (id, patient_name, admission_number, department, procedure_name,
                 date, begin_time, end_time, chief_surgeon, associate_surgeon,
                 instrument_nurses, circulating_nurses, instruments, consumables)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.patient_name)
        .bind(request.admission_number)
        .bind(request.department)
        .bind(&request.procedure_name)
        .bind(date)
        .bind(request.begin_time)
        .bind(request.end_time)
        .bind(&chief)
        .bind(&associate)
        .bind(&instrument_nurses)
        .bind(&circulating_nurses)
        .bind(Json(&snapshots))
        .bind(&unit_ids)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(surgery)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: SurgeryId) -> Result<Option<SurgeryDBResponse>> {
        let surgery = sqlx::query_as::<_, SurgeryDBResponse>("SELECT * FROM surgeries WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(surgery)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &SurgeryFilter) -> Result<Vec<SurgeryDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM surgeries WHERE 1=1");

        if let Some(ids) = &filter.ids {
            query.push(" AND id = ANY(");
            query.push_bind(ids);
            query.push(")");
        }
        if let Some(departments) = &filter.departments {
            query.push(" AND department = ANY(");
            query.push_bind(departments);
            query.push(")");
        }
        if let Some(names) = &filter.patient_names {
            query.push(" AND patient_name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(numbers) = &filter.admission_numbers {
            query.push(" AND admission_number = ANY(");
            query.push_bind(numbers);
            query.push(")");
        }
        if let Some(names) = &filter.procedure_names {
            query.push(" AND procedure_name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(chiefs) = &filter.chief_surgeons {
            query.push(" AND chief_surgeon = ANY(");
            query.push_bind(chiefs);
            query.push(")");
        }
        if let Some(staff) = &filter.staff {
            query.push(" AND (chief_surgeon = ");
            query.push_bind(staff);
            query.push(" OR associate_surgeon = ");
            query.push_bind(staff);
            query.push(" OR ");
            query.push_bind(staff);
            query.push(" = ANY(instrument_nurses) OR ");
            query.push_bind(staff);
            query.push(" = ANY(circulating_nurses))");
        }
        if let Some(from) = filter.date_from {
            query.push(" AND date >= ");
            query.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            query.push(" AND date < ");
            query.push_bind(to);
        }

        query.push(" ORDER BY date DESC, id DESC");

        if let Some(limit) = filter.limit {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(skip) = filter.skip {
            query.push(" OFFSET ");
            query.push_bind(skip);
        }

        let surgeries = query.build_query_as::<SurgeryDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(surgeries)
    }

    /// Administrative correction of an existing record.
    ///
    /// Supplying `instruments` or `consumables` re-runs the recording
    /// side effects: the listed instruments are decremented again and a
    /// fresh unit is claimed and tagged per consumable demand. Units
    /// consumed by the original record stay consumed; the record's
    /// references are replaced, not merged.
    #[instrument(skip(self, request), err)]
    pub async fn update(&mut self, id: SurgeryId, request: &SurgeryUpdateDBRequest) -> Result<SurgeryDBResponse> {
        let mut tx = self.db.begin().await?;

        let existing_procedure =
            sqlx::query_scalar::<_, String>("SELECT procedure_name FROM surgeries WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DbError::NotFound)?;

        let chief = match &request.chief_surgeon {
            Some(name) => Some(Users::new(&mut tx).resolve_name(name).await?.id),
            None => None,
        };
        let associate = match &request.associate_surgeon {
            Some(name) => Some(Users::new(&mut tx).resolve_name(name).await?.id),
            None => None,
        };
        let instrument_nurses = match &request.instrument_nurses {
            Some(names) => Some(resolve_names(&mut tx, names).await?),
            None => None,
        };
        let circulating_nurses = match &request.circulating_nurses {
            Some(names) => Some(resolve_names(&mut tx, names).await?),
            None => None,
        };

        let snapshots = match &request.instruments {
            Some(usages) => {
                for usage in usages {
                    Instruments::new(&mut tx).decrement(usage.id, 1).await?;
                }
                Some(Json(usages.clone()))
            }
            None => None,
        };
        // A demand without a note gets the procedure name, same as at
        // recording time, so no claimed unit ends up with an empty tag.
        let unit_ids = match &request.consumables {
            Some(demands) => {
                let fallback = request.procedure_name.as_deref().unwrap_or(&existing_procedure);
                let demands: Vec<ConsumableUseDBRequest> = demands
                    .iter()
                    .map(|demand| ConsumableUseDBRequest {
                        name: demand.name.clone(),
                        description: if demand.description.is_empty() {
                            fallback.to_string()
                        } else {
                            demand.description.clone()
                        },
                    })
                    .collect();
                Some(claim_consumables(&mut tx, &demands).await?)
            }
            None => None,
        };

        let surgery = sqlx::query_as::<_, SurgeryDBResponse>(
            r#"
            UPDATE surgeries SET
                patient_name = COALESCE($2, patient_name),
                admission_number = COALESCE($3, admission_number),
                department = COALESCE($4, department),
                procedure_name = COALESCE($5, procedure_name),
                date = COALESCE($6, date),
                begin_time = COALESCE($7, begin_time),
                end_time = COALESCE($8, end_time),
                chief_surgeon = COALESCE($9, chief_surgeon),
                associate_surgeon = COALESCE($10, associate_surgeon),
                instrument_nurses = COALESCE($11, instrument_nurses),
                circulating_nurses = COALESCE($12, circulating_nurses),
                instruments = COALESCE($13, instruments),
                consumables = COALESCE($14, consumables)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.patient_name)
        .bind(request.admission_number)
        .bind(request.department)
        .bind(&request.procedure_name)
        .bind(request.date)
        .bind(request.begin_time)
        .bind(request.end_time)
        .bind(&chief)
        .bind(&associate)
        .bind(&instrument_nurses)
        .bind(&circulating_nurses)
        .bind(&snapshots)
        .bind(&unit_ids)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(surgery)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, id: SurgeryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM surgeries WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every record matching the filter. Does not touch the
    /// equipment the records reference.
    #[instrument(skip(self, filter), err)]
    pub async fn delete_where(&mut self, filter: &SurgeryFilter) -> Result<u64> {
        let mut query = QueryBuilder::new("DELETE FROM surgeries WHERE 1=1");

        if let Some(ids) = &filter.ids {
            query.push(" AND id = ANY(");
            query.push_bind(ids);
            query.push(")");
        }
        if let Some(departments) = &filter.departments {
            query.push(" AND department = ANY(");
            query.push_bind(departments);
            query.push(")");
        }
        if let Some(names) = &filter.patient_names {
            query.push(" AND patient_name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(numbers) = &filter.admission_numbers {
            query.push(" AND admission_number = ANY(");
            query.push_bind(numbers);
            query.push(")");
        }
        if let Some(names) = &filter.procedure_names {
            query.push(" AND procedure_name = ANY(");
            query.push_bind(names);
            query.push(")");
        }
        if let Some(chiefs) = &filter.chief_surgeons {
            query.push(" AND chief_surgeon = ANY(");
            query.push_bind(chiefs);
            query.push(")");
        }
        if let Some(from) = filter.date_from {
            query.push(" AND date >= ");
            query.push_bind(from);
        }
        if let Some(to) = filter.date_to {
            query.push(" AND date < ");
            query.push_bind(to);
        }

        let result = query.build().execute(&mut *self.db).await?;

        Ok(result.rows_affected())
    }
}

async fn resolve_names(db: &mut PgConnection, names: &[String]) -> Result<Vec<UserId>> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(Users::new(&mut *db).resolve_name(name).await?.id);
    }
    Ok(ids)
}

/// Claims and tags one fresh unit per demand. An empty claim aborts the
/// whole operation; units claimed earlier are released when the caller's
/// transaction rolls back.
async fn claim_consumables(
    db: &mut PgConnection,
    demands: &[ConsumableUseDBRequest],
) -> Result<Vec<ConsumableId>> {
    let mut unit_ids = Vec::with_capacity(demands.len());
    for demand in demands {
        let mut pool = Consumables::new(&mut *db);
        let units = pool.allocate_freshest(&demand.name, 1).await?;
        let Some(unit) = units.first() else {
            return Err(DbError::InsufficientStock {
                name: demand.name.clone(),
                requested: 1,
                available: 0,
            });
        };
        pool.tag(unit.id, &demand.description).await?;
        unit_ids.push(unit.id);
    }
    Ok(unit_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::db::handlers::repository::Repository;
    use crate::db::models::instruments::InstrumentCreateDBRequest;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::types::Department;
    use chrono::TimeZone;
    use sqlx::PgPool;

    async fn seed_user(pool: &PgPool, id: &str, name: &str, role: Role) {
        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                id: id.to_string(),
                name: name.to_string(),
                role,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
    }

    async fn seed_instrument(pool: &PgPool, name: &str, remaining_uses: i32) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        Instruments::new(&mut conn)
            .create(&InstrumentCreateDBRequest { name: name.to_string(), remaining_uses })
            .await
            .unwrap()
            .id
    }

    fn ward_utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn record_request(instrument_id: i64) -> SurgeryRecordDBRequest {
        SurgeryRecordDBRequest {
            patient_name: "陈某".to_string(),
            admission_number: 202406,
            department: Department::Urologic,
            procedure_name: "膀胱癌根治术".to_string(),
            begin_time: Utc.with_ymd_and_hms(2024, 6, 14, 8, 30, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 6, 14, 12, 5, 0).unwrap(),
            chief_surgeon: "张伟".to_string(),
            associate_surgeon: None,
            instrument_nurses: vec!["李娜".to_string()],
            circulating_nurses: vec!["李娜".to_string()],
            instruments: vec![InstrumentUse { id: instrument_id, description: "default".to_string() }],
            consumables: vec![ConsumableUseDBRequest {
                name: "无菌壁套".to_string(),
                description: "膀胱癌根治术".to_string(),
            }],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_surgery_happy_path(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 1).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 1).await.unwrap();

        let surgery = Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await.unwrap();

        assert_eq!(surgery.id, 0);
        assert_eq!(surgery.chief_surgeon, "D-1001");
        assert_eq!(surgery.instrument_nurses, vec!["N-2001".to_string()]);
        assert_eq!(surgery.date.time(), NaiveTime::MIN);
        assert_eq!(surgery.date.date_naive(), Utc::now().date_naive());
        assert_eq!(surgery.instruments.0.len(), 1);
        assert_eq!(surgery.instruments.0[0].id, instrument_id);
        assert_eq!(surgery.instruments.0[0].description, "default");
        assert_eq!(surgery.consumables.len(), 1);

        // The instrument lost its last use.
        let instrument = Instruments::new(&mut conn).get_by_id(instrument_id).await.unwrap().unwrap();
        assert_eq!(instrument.remaining_uses, 0);

        // The claimed unit carries the demand's description.
        let unit = Consumables::new(&mut conn).get_by_id(surgery.consumables[0]).await.unwrap().unwrap();
        assert_eq!(unit.description, "膀胱癌根治术");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_stamps_ward_calendar_day(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 2).await.unwrap();

        // A ward far ahead of UTC dates the record by its own clock, not
        // the server's.
        let ahead = FixedOffset::east_opt(14 * 3600).unwrap();
        let expected = Utc::now().with_timezone(&ahead).date_naive();
        let eastern = Surgeries::new(&mut conn).record(&record_request(instrument_id), ahead).await.unwrap();
        let expected_after = Utc::now().with_timezone(&ahead).date_naive();
        assert!(eastern.date.date_naive() == expected || eastern.date.date_naive() == expected_after);
        assert_eq!(eastern.date.time(), NaiveTime::MIN);

        // A ward far behind lands 1-2 calendar days earlier than the one
        // far ahead, whatever the wall clock says.
        let behind = FixedOffset::east_opt(-12 * 3600).unwrap();
        let western = Surgeries::new(&mut conn).record(&record_request(instrument_id), behind).await.unwrap();
        let spread = (eastern.date.date_naive() - western.date.date_naive()).num_days();
        assert!((1..=2).contains(&spread), "unexpected calendar spread: {spread}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_fails_on_ambiguous_name(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        seed_user(&pool, "N-2002", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 1).await.unwrap();

        let result = Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await;
        assert!(matches!(
            result,
            Err(DbError::UnresolvedUser { matches: 2, .. })
        ));

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM surgeries")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_insufficient_stock_rolls_everything_back(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        // No stock of 无菌壁套 at all.
        let mut conn = pool.acquire().await.unwrap();
        let result = Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await;

        assert!(matches!(
            result,
            Err(DbError::InsufficientStock { available: 0, .. })
        ));

        // The decrement applied before the shortage was rolled back with
        // the transaction, and no surgery row exists.
        let instrument = Instruments::new(&mut conn).get_by_id(instrument_id).await.unwrap().unwrap();
        assert_eq!(instrument.remaining_uses, 5);

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM surgeries")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_reruns_side_effects_only_when_asked(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let first = seed_instrument(&pool, "电剪", 5).await;
        let second = seed_instrument(&pool, "持针钳", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 2).await.unwrap();

        let surgery = Surgeries::new(&mut conn).record(&record_request(first), ward_utc()).await.unwrap();

        // Fixing the patient name touches no counters.
        let update = SurgeryUpdateDBRequest {
            patient_name: Some("陈某某".to_string()),
            ..Default::default()
        };
        let updated = Surgeries::new(&mut conn).update(surgery.id, &update).await.unwrap();
        assert_eq!(updated.patient_name, "陈某某");
        assert_eq!(updated.instruments.0[0].id, first);

        let untouched = Instruments::new(&mut conn).get_by_id(second).await.unwrap().unwrap();
        assert_eq!(untouched.remaining_uses, 5);

        // Swapping the instrument list decrements the newly listed one.
        let update = SurgeryUpdateDBRequest {
            instruments: Some(vec![InstrumentUse { id: second, description: "故障更换".to_string() }]),
            ..Default::default()
        };
        let updated = Surgeries::new(&mut conn).update(surgery.id, &update).await.unwrap();
        assert_eq!(updated.instruments.0[0].id, second);

        let decremented = Instruments::new(&mut conn).get_by_id(second).await.unwrap().unwrap();
        assert_eq!(decremented.remaining_uses, 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_staff_membership(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 1).await.unwrap();
        Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await.unwrap();

        let mut repo = Surgeries::new(&mut conn);

        let by_nurse = repo.list(&SurgeryFilter::new().staff("N-2001")).await.unwrap();
        assert_eq!(by_nurse.len(), 1);

        let by_chief = repo.list(&SurgeryFilter::new().staff("D-1001")).await.unwrap();
        assert_eq!(by_chief.len(), 1);

        let by_stranger = repo.list(&SurgeryFilter::new().staff("D-9999")).await.unwrap();
        assert!(by_stranger.is_empty());

        let by_department = repo.list(&SurgeryFilter::new().department(Department::Urologic)).await.unwrap();
        assert_eq!(by_department.len(), 1);

        let other_department = repo.list(&SurgeryFilter::new().department(Department::Cardiac)).await.unwrap();
        assert!(other_department.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_surgery(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 1).await.unwrap();
        let surgery = Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await.unwrap();

        let mut repo = Surgeries::new(&mut conn);
        assert!(repo.delete(surgery.id).await.unwrap());
        assert!(!repo.delete(surgery.id).await.unwrap());
        assert!(repo.get_by_id(surgery.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_where_matches_department(pool: PgPool) {
        seed_user(&pool, "D-1001", "张伟", Role::Doctor).await;
        seed_user(&pool, "N-2001", "李娜", Role::Nurse).await;
        let instrument_id = seed_instrument(&pool, "电剪", 5).await;

        let mut conn = pool.acquire().await.unwrap();
        Consumables::new(&mut conn).restock("无菌壁套", 2).await.unwrap();
        Surgeries::new(&mut conn).record(&record_request(instrument_id), ward_utc()).await.unwrap();
        let mut other = record_request(instrument_id);
        other.department = Department::Chest;
        Surgeries::new(&mut conn).record(&other, ward_utc()).await.unwrap();

        let mut repo = Surgeries::new(&mut conn);
        let deleted = repo.delete_where(&SurgeryFilter::new().department(Department::Chest)).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = repo.list(&SurgeryFilter::new()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].department, Department::Urologic);
    }
}
