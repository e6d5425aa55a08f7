use crate::analytics::HIGH_POTENTIAL;
use crate::errors::AppError;
use crate::models::{ActivityEntry, Lead, ProfileStats, ProfileUpdate, ProfileView, UserProfile};
use chrono::Utc;
use sqlx::PgPool;

/// Default mail domain for created profiles.
pub const PROFILE_MAIL_DOMAIN: &str = "bank-asah.co.id";

/// Derives the user-facing profile and recent-activity feed from the lead
/// collection plus the profile record.
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the user's profile, creating the default one on first access.
    ///
    /// Creation is a single `ON CONFLICT (user_id) DO NOTHING` upsert, so a
    /// repeated call — or two concurrent first-time reads — never produces a
    /// second profile row.
    pub async fn get_profile(&self, user_id: i64) -> Result<ProfileView, AppError> {
        let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, name, role, email, id_emp)
            VALUES ($1, $2, 'Junior Sales', $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&username)
        .bind(format!("{}@{}", username, PROFILE_MAIL_DOMAIN))
        .bind(format!("SLS-{}", user_id))
        .execute(&self.pool)
        .await?;

        let profile =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let total_leads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&self.pool)
            .await?;
        let high_leads: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE prediction_label = $1")
                .bind(HIGH_POTENTIAL)
                .fetch_one(&self.pool)
                .await?;

        let first_created: Option<chrono::DateTime<Utc>> =
            sqlx::query_scalar("SELECT MIN(created_at) FROM leads")
                .fetch_one(&self.pool)
                .await?;
        let active_days = match first_created {
            Some(first) => (Utc::now() - first).num_days() + 1,
            None => 0,
        };

        let recent = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads ORDER BY updated_at DESC, id DESC LIMIT 5",
        )
        .fetch_all(&self.pool)
        .await?;
        let recent_activities = recent.iter().map(activity_entry).collect();

        let conversion_rate = if total_leads > 0 {
            (high_leads as f64 / total_leads as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Ok(ProfileView {
            id: profile.id,
            name: profile.name,
            role: profile.role,
            email: profile.email,
            id_emp: profile.id_emp,
            monthly_target: profile.monthly_target,
            joined_date: profile.joined_date.format("%d %B %Y").to_string(),
            active_days,
            stats: ProfileStats {
                leads_processed: total_leads,
                conversion_rate,
                current_progress: high_leads,
            },
            recent_activities,
        })
    }

    /// Applies the allow-listed profile fields for `user_id`.
    ///
    /// Absent fields keep their stored value; returns `None` without
    /// writing anything when no profile row exists yet.
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET name = COALESCE($2, name),
                role = COALESCE($3, role),
                email = COALESCE($4, email),
                id_emp = COALESCE($5, id_emp),
                monthly_target = COALESCE($6, monthly_target)
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.role)
        .bind(&update.email)
        .bind(&update.id_emp)
        .bind(update.monthly_target)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}

/// Formats one lead as a recent-activity entry. A lead whose `updated_at`
/// moved past `created_at` has been worked on; otherwise it was only
/// ingested.
pub fn activity_entry(lead: &Lead) -> ActivityEntry {
    let action = if lead.updated_at > lead.created_at {
        "Updated status/notes for"
    } else {
        "Added to database"
    };
    ActivityEntry {
        lead_id: lead.id,
        time: lead.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        content: format!("{} Nasabah-{}", action, lead.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_lead(id: i64) -> Lead {
        let now = Utc::now();
        Lead {
            id,
            age: Some(30),
            job: Some("admin.".to_string()),
            marital: None,
            education: None,
            credit_default: None,
            housing: None,
            loan: None,
            contact: None,
            month: None,
            day_of_week: None,
            duration: None,
            campaign: None,
            pdays: None,
            previous: None,
            poutcome: None,
            emp_var_rate: None,
            cons_price_idx: None,
            cons_conf_idx: None,
            euribor3m: None,
            nr_employed: None,
            prediction_score: None,
            prediction_label: None,
            status: "new".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn untouched_lead_reads_as_added() {
        let lead = sample_lead(7);
        let entry = activity_entry(&lead);
        assert_eq!(entry.lead_id, 7);
        assert_eq!(entry.content, "Added to database Nasabah-7");
    }

    #[test]
    fn mutated_lead_reads_as_updated() {
        let mut lead = sample_lead(12);
        lead.updated_at = lead.created_at + Duration::minutes(5);
        let entry = activity_entry(&lead);
        assert_eq!(entry.content, "Updated status/notes for Nasabah-12");
    }

    #[test]
    fn activity_time_is_minute_precision() {
        let mut lead = sample_lead(1);
        lead.updated_at = "2025-03-04T09:30:12Z".parse().unwrap();
        let entry = activity_entry(&lead);
        assert_eq!(entry.time, "2025-03-04 09:30");
    }
}
