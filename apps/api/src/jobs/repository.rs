use sqlx::PgPool;

use crate::jobs::models::{Job, JobWithCount, NewJob};

/// Inserts or replaces the job keyed by `job_id`. Re-uploading reactivates it.
pub async fn upsert_job(pool: &PgPool, job: &NewJob) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO jobs (job_id, title, required_skills, experience_years, document, status)
        VALUES ($1, $2, $3, $4, $5, 'active')
        ON CONFLICT (job_id) DO UPDATE SET
            title = EXCLUDED.title,
            required_skills = EXCLUDED.required_skills,
            experience_years = EXCLUDED.experience_years,
            document = EXCLUDED.document,
            status = 'active',
            uploaded_at = now(),
            updated_at = now()
        "#,
    )
    .bind(&job.job_id)
    .bind(&job.title)
    .bind(&job.required_skills)
    .bind(&job.experience_years)
    .bind(&job.document)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_job(pool: &PgPool, job_id: &str) -> Result<Option<Job>, sqlx::Error> {
    sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE job_id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Active jobs, newest first, each with its number of candidates.
pub async fn list_jobs(pool: &PgPool) -> Result<Vec<JobWithCount>, sqlx::Error> {
    sqlx::query_as::<_, JobWithCount>(
        r#"
        SELECT j.*, COUNT(c.candidate_id) AS candidate_count
        FROM jobs j
        LEFT JOIN candidates c ON c.job_id = j.job_id
        WHERE j.status = 'active'
        GROUP BY j.job_id
        ORDER BY j.uploaded_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Soft delete. Returns false when no active job had that id.
pub async fn deactivate_job(pool: &PgPool, job_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE jobs SET status = 'inactive', updated_at = now() WHERE job_id = $1 AND status = 'active'",
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
