use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::tender::TenderRecord;

async fn upsert_tender(
    tx: &mut Transaction<'_, Postgres>,
    record: &TenderRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        insert into tender
            (source_id, dedup_key, title, reference, deadline, buyer, value, currency, location, url, description)
        values
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        on conflict (source_id, dedup_key) do update set
            title = excluded.title,
            reference = excluded.reference,
            deadline = excluded.deadline,
            buyer = excluded.buyer,
            value = excluded.value,
            currency = excluded.currency,
            location = excluded.location,
            url = excluded.url,
            description = excluded.description,
            updated_at = now()
        ",
    )
    .bind(&record.source_id)
    .bind(record.dedup_key().encode())
    .bind(&record.title)
    .bind(&record.reference)
    .bind(record.deadline)
    .bind(&record.buyer)
    .bind(record.value)
    .bind(&record.currency)
    .bind(&record.location)
    .bind(&record.url)
    .bind(&record.description)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn upsert_tenders(pool: &PgPool, records: &[TenderRecord]) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for record in records {
        upsert_tender(&mut tx, record).await?;
    }

    tx.commit().await?;
    Ok(records.len())
}

pub async fn count_tenders(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("select count(*) from tender")
        .fetch_one(pool)
        .await
}
