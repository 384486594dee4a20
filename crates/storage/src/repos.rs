use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::models::*;

// ─── Template Queries ───────────────────────────────────────────────────────

/// Insert a batch of template events using a single multi-value INSERT.
/// Skips duplicates on (transaction_hash, log_index).
pub async fn insert_template_events_batch<'e, E>(
    executor: E,
    events: &[NewTemplateEvent],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    if events.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO template_events (key, kind, template, owner, price, transaction_hash, block_number, log_index) ",
    );

    qb.push_values(events, |mut b, e| {
        b.push_bind(&e.key)
            .push_bind(e.kind.as_str())
            .push_bind(&e.template)
            .push_bind(&e.owner)
            .push_bind(&e.price)
            .push_bind(&e.transaction_hash)
            .push_bind(e.block_number)
            .push_bind(e.log_index);
    });

    qb.push(" ON CONFLICT (transaction_hash, log_index) DO NOTHING");
    qb.build().execute(executor).await?;
    Ok(())
}

/// Live (not deleted) templates, oldest first.
pub async fn get_templates(pool: &PgPool) -> Result<Vec<Template>, sqlx::Error> {
    sqlx::query_as::<_, Template>(
        "SELECT * FROM templates WHERE NOT deleted ORDER BY added_at_block, key",
    )
    .fetch_all(pool)
    .await
}

/// A single template by key, including deleted ones.
pub async fn get_template(pool: &PgPool, key: &str) -> Result<Option<Template>, sqlx::Error> {
    sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

// ─── Deployment Queries ─────────────────────────────────────────────────────

/// Insert a batch of deployments. Skips duplicates on (transaction_hash, log_index).
pub async fn insert_deployments_batch<'e, E>(
    executor: E,
    deployments: &[NewDeployment],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    if deployments.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO deployments (deployed, deployer, transaction_hash, block_number, log_index) ",
    );

    qb.push_values(deployments, |mut b, d| {
        b.push_bind(&d.deployed)
            .push_bind(&d.deployer)
            .push_bind(&d.transaction_hash)
            .push_bind(d.block_number)
            .push_bind(d.log_index);
    });

    qb.push(" ON CONFLICT (transaction_hash, log_index) DO NOTHING");
    qb.build().execute(executor).await?;
    Ok(())
}

/// Most recent deployments across all deployers.
pub async fn get_recent_deployments(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<Deployment>, sqlx::Error> {
    sqlx::query_as::<_, Deployment>(
        "SELECT * FROM deployments ORDER BY block_number DESC, log_index DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get_deployer_deployments(
    pool: &PgPool,
    deployer: &str,
    limit: i64,
) -> Result<Vec<Deployment>, sqlx::Error> {
    sqlx::query_as::<_, Deployment>(
        "SELECT * FROM deployments WHERE deployer = $1 ORDER BY block_number DESC, log_index DESC LIMIT $2",
    )
    .bind(deployer)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get_deployment_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deployments")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// ─── Fee Queries ────────────────────────────────────────────────────────────

pub async fn insert_fee_changes_batch<'e, E>(
    executor: E,
    changes: &[NewFeeChange],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    if changes.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO fee_changes (kind, previous, current, transaction_hash, block_number, log_index) ",
    );

    qb.push_values(changes, |mut b, c| {
        b.push_bind(&c.kind)
            .push_bind(&c.previous)
            .push_bind(&c.current)
            .push_bind(&c.transaction_hash)
            .push_bind(c.block_number)
            .push_bind(c.log_index);
    });

    qb.push(" ON CONFLICT (transaction_hash, log_index) DO NOTHING");
    qb.build().execute(executor).await?;
    Ok(())
}

/// Fee history, newest first.
pub async fn get_fee_changes(pool: &PgPool, limit: i64) -> Result<Vec<FeeChange>, sqlx::Error> {
    sqlx::query_as::<_, FeeChange>(
        "SELECT * FROM fee_changes ORDER BY block_number DESC, log_index DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Latest value of the given fee kind, if it has ever changed.
pub async fn get_current_fee(pool: &PgPool, kind: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT current FROM fee_changes WHERE kind = $1 ORDER BY block_number DESC, log_index DESC LIMIT 1",
    )
    .bind(kind)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}

// ─── Batch ──────────────────────────────────────────────────────────────────

/// Write every row of a decoded batch through one executor (normally a transaction).
pub async fn write_batch(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    batch: &BatchWrite,
) -> Result<(), sqlx::Error> {
    insert_template_events_batch(&mut **tx, &batch.template_events).await?;
    insert_deployments_batch(&mut **tx, &batch.deployments).await?;
    insert_fee_changes_batch(&mut **tx, &batch.fee_changes).await?;
    Ok(())
}

// ─── Block Queries ──────────────────────────────────────────────────────────

/// Insert a processed block.
pub async fn insert_block<'e, E>(executor: E, block: &IndexedBlock) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO indexed_blocks (block_number, block_hash, parent_hash, timestamp)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (block_number) DO UPDATE
        SET block_hash = $2, parent_hash = $3, timestamp = $4
        "#,
    )
    .bind(block.block_number)
    .bind(&block.block_hash)
    .bind(&block.parent_hash)
    .bind(block.timestamp)
    .execute(executor)
    .await?;
    Ok(())
}

/// Get the latest indexed block number.
pub async fn get_latest_block(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(block_number) FROM indexed_blocks")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

/// Delete all indexed data after a given block number in one transaction.
pub async fn reorg_rollback(pool: &PgPool, fork_block: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for table in ["template_events", "deployments", "fee_changes", "indexed_blocks"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE block_number > $1"))
            .bind(fork_block)
            .execute(&mut *tx)
            .await?;
    }

    set_last_indexed_block(&mut *tx, fork_block).await?;

    tx.commit().await?;

    tracing::warn!(fork_block = fork_block, "Reorg rollback complete");
    Ok(())
}

/// Get the stored block hash for a specific block number.
pub async fn get_block_hash(
    pool: &PgPool,
    block_number: i64,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT block_hash FROM indexed_blocks WHERE block_number = $1")
            .bind(block_number)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| r.0))
}

// ─── Indexer State ──────────────────────────────────────────────────────────

/// Get the last indexed block from persistent state.
pub async fn get_last_indexed_block(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (String,) =
        sqlx::query_as("SELECT value FROM indexer_state WHERE key = 'last_indexed_block'")
            .fetch_one(pool)
            .await?;
    Ok(row.0.parse::<i64>().unwrap_or(0))
}

/// Set the last indexed block in persistent state.
pub async fn set_last_indexed_block<'e, E>(
    executor: E,
    block_number: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE indexer_state SET value = $1 WHERE key = 'last_indexed_block'")
        .bind(block_number.to_string())
        .execute(executor)
        .await?;
    Ok(())
}
