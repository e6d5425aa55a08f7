use crate::errors::AppError;
use crate::models::{Lead, LeadFilter, NewLead, Prediction, SortOrder};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Data access for the lead collection.
///
/// Every call re-reads current store state; nothing is cached across calls,
/// so bulk mutations made through other sessions are immediately visible to
/// the next query.
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts one new lead with its prediction result attached.
    ///
    /// Column filtering happened upstream in ingestion; this inserts the
    /// record as given and returns it with its store-assigned id.
    pub async fn create(&self, record: &NewLead, prediction: &Prediction) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                age, job, marital, education, credit_default, housing, loan,
                contact, month, day_of_week, duration, campaign, pdays,
                previous, poutcome, emp_var_rate, cons_price_idx,
                cons_conf_idx, euribor3m, nr_employed,
                prediction_score, prediction_label
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22
            )
            RETURNING *
            "#,
        )
        .bind(record.age)
        .bind(&record.job)
        .bind(&record.marital)
        .bind(&record.education)
        .bind(&record.credit_default)
        .bind(&record.housing)
        .bind(&record.loan)
        .bind(&record.contact)
        .bind(&record.month)
        .bind(&record.day_of_week)
        .bind(record.duration)
        .bind(record.campaign)
        .bind(record.pdays)
        .bind(record.previous)
        .bind(&record.poutcome)
        .bind(record.emp_var_rate)
        .bind(record.cons_price_idx)
        .bind(record.cons_conf_idx)
        .bind(record.euribor3m)
        .bind(record.nr_employed)
        .bind(prediction.score)
        .bind(&prediction.label)
        .fetch_one(&self.pool)
        .await?;

        Ok(lead)
    }

    /// Lists leads matching `filter`, sorted and paginated.
    ///
    /// Returns `(filtered_count, slice)`: the count is computed over the
    /// whole filtered set before pagination, so it is independent of
    /// `skip`/`limit`; the slice holds at most `limit` records starting at
    /// offset `skip` of the filtered, sorted collection. Negative offsets
    /// and limits are treated as zero.
    pub async fn list(
        &self,
        filter: &LeadFilter,
        sort: SortOrder,
        skip: i64,
        limit: i64,
    ) -> Result<(i64, Vec<Lead>), AppError> {
        let skip = skip.max(0);
        let limit = limit.max(0);

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        apply_filters(&mut count_query, filter);
        let filtered_count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM leads");
        apply_filters(&mut query, filter);
        query.push(sort.order_clause());
        query.push(" OFFSET ");
        query.push_bind(skip);
        query.push(" LIMIT ");
        query.push_bind(limit);

        let items = query
            .build_query_as::<Lead>()
            .fetch_all(&self.pool)
            .await?;

        Ok((filtered_count, items))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }

    /// Replaces the notes of one lead and refreshes `updated_at`.
    pub async fn update_notes(&self, id: i64, notes: Option<&str>) -> Result<Lead, AppError> {
        sqlx::query_as::<_, Lead>(
            "UPDATE leads SET notes = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))
    }

    /// Deletes every lead whose id appears in `ids`; absent ids are
    /// silently ignored. The whole batch succeeds or fails as one unit.
    pub async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM leads WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut *tx)
            .await;

        match result {
            Ok(done) => {
                tx.commit().await?;
                tracing::info!("Bulk delete removed {} leads", done.rows_affected());
                Ok(done.rows_affected())
            }
            Err(e) => {
                tx.rollback().await.ok();
                tracing::error!("Bulk delete failed, rolled back: {:?}", e);
                Err(e.into())
            }
        }
    }

    /// Sets `status` (and refreshes `updated_at`) on every matching lead.
    ///
    /// An empty status is rejected before the store is touched; store
    /// errors roll the whole batch back.
    pub async fn bulk_update_status(&self, ids: &[i64], new_status: &str) -> Result<u64, AppError> {
        if new_status.trim().is_empty() {
            return Err(AppError::Validation("Status cannot be empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE leads SET status = $2, updated_at = now() WHERE id = ANY($1)")
                .bind(ids)
                .bind(new_status)
                .execute(&mut *tx)
                .await;

        match result {
            Ok(done) => {
                tx.commit().await?;
                tracing::info!(
                    "Bulk status update set '{}' on {} leads",
                    new_status,
                    done.rows_affected()
                );
                Ok(done.rows_affected())
            }
            Err(e) => {
                tx.rollback().await.ok();
                tracing::error!("Bulk status update failed, rolled back: {:?}", e);
                Err(e.into())
            }
        }
    }

    /// Empties the lead collection. Atomic and irreversible; ids are not
    /// reused afterwards (the sequence keeps advancing).
    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let done = sqlx::query("DELETE FROM leads").execute(&self.pool).await?;
        tracing::info!("Cleared lead collection ({} rows)", done.rows_affected());
        Ok(done.rows_affected())
    }
}

/// Appends the WHERE clause for an optional-filter specification.
///
/// All bounds are inclusive; an empty filter appends nothing.
fn apply_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filter: &'a LeadFilter) {
    let mut prefix = " WHERE ";

    if let Some(job) = &filter.job {
        query.push(prefix).push("job = ").push_bind(job);
        prefix = " AND ";
    }
    if let Some(min_age) = filter.min_age {
        query.push(prefix).push("age >= ").push_bind(min_age);
        prefix = " AND ";
    }
    if let Some(max_age) = filter.max_age {
        query.push(prefix).push("age <= ").push_bind(max_age);
        prefix = " AND ";
    }
    if let Some(min_score) = filter.min_score {
        query
            .push(prefix)
            .push("prediction_score >= ")
            .push_bind(min_score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_sql(filter: &LeadFilter) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        apply_filters(&mut query, filter);
        query.sql().to_string()
    }

    #[test]
    fn empty_filter_adds_no_predicate() {
        assert_eq!(rendered_sql(&LeadFilter::default()), "SELECT COUNT(*) FROM leads");
    }

    #[test]
    fn single_bound_uses_where() {
        let filter = LeadFilter {
            min_age: Some(30),
            ..Default::default()
        };
        let sql = rendered_sql(&filter);
        assert!(sql.contains("WHERE age >= $1"));
        assert!(!sql.contains("AND"));
    }

    #[test]
    fn all_bounds_chain_with_and() {
        let filter = LeadFilter {
            job: Some("admin.".to_string()),
            min_age: Some(25),
            max_age: Some(45),
            min_score: Some(0.5),
        };
        let sql = rendered_sql(&filter);
        assert!(sql.contains("WHERE job = $1"));
        assert!(sql.contains("AND age >= $2"));
        assert!(sql.contains("AND age <= $3"));
        assert!(sql.contains("AND prediction_score >= $4"));
    }
}
