//! Factori Indexer: follows a deployed factory and persists its events.
//!
//! Each batch of blocks is fetched with one `eth_getLogs` call filtered on the
//! factory address and its event signatures, then written together with the
//! block record and cursor in a single database transaction. A parent-hash
//! mismatch against `indexed_blocks` triggers a rollback to the fork point.

mod batch;

use alloy::{
    consensus::BlockHeader,
    eips::BlockNumberOrTag,
    network::primitives::HeaderResponse,
    primitives::Address,
    providers::Provider,
    rpc::types::Filter,
};
use eyre::{Result, WrapErr};
use factori_core::{Settings, telemetry};
use factori_rpc::{FactoriProvider, factory_signatures, provider};
use factori_storage::{self as storage, models::IndexedBlock};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let settings = Settings::from_env()?;

    let factory: Address = settings
        .factory_address
        .parse()
        .wrap_err_with(|| format!("FACTORY_ADDRESS {:?}", settings.factory_address))?;

    tracing::info!(rpc = %settings.rpc_url, factory = %factory, "Starting Factori Indexer");

    let pool = storage::connect(&settings.database_url).await?;
    tracing::info!("Connected to database");

    storage::migrate(&pool).await?;
    tracing::info!("Database migrations applied");

    let provider = provider::create_provider(&settings.rpc_url)?;

    let mut last_block = storage::repos::get_last_indexed_block(&pool).await?;
    if last_block == 0 && settings.start_block > 0 {
        last_block = settings.start_block as i64 - 1;
    }

    tracing::info!(from_block = last_block + 1, "Starting indexing loop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutting down gracefully");
                break;
            }
            result = index_next_batch(&provider, &pool, factory, &mut last_block, &settings) => {
                match result {
                    Ok(true) => {}
                    Ok(false) => tokio::time::sleep(std::time::Duration::from_secs(2)).await,
                    Err(e) => {
                        tracing::error!(error = %e, "Indexing error, retrying in 5s");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }

    tracing::info!("Indexer stopped");
    Ok(())
}

/// Index the next batch of blocks. Returns `Ok(false)` once caught up with the head.
async fn index_next_batch(
    provider: &FactoriProvider,
    pool: &sqlx::PgPool,
    factory: Address,
    last_block: &mut i64,
    settings: &Settings,
) -> Result<bool> {
    let chain_head = provider.get_block_number().await? as i64;
    if *last_block >= chain_head {
        return Ok(false);
    }

    let from = *last_block + 1;
    let to = std::cmp::min(from + settings.batch_size.max(1) as i64 - 1, chain_head);

    tracing::info!(from = from, to = to, head = chain_head, "Indexing batch");

    if let Some(fork_block) = detect_reorg(provider, pool, from).await? {
        storage::repos::reorg_rollback(pool, fork_block).await?;
        *last_block = fork_block;
        return Ok(true);
    }

    let filter = Filter::new()
        .address(factory)
        .event_signature(factory_signatures())
        .from_block(from as u64)
        .to_block(to as u64);

    let logs = provider.get_logs(&filter).await?;
    let rows = batch::collect_batch(&logs);

    let head_block = provider
        .get_block_by_number(BlockNumberOrTag::Number(to as u64))
        .await?
        .ok_or_else(|| eyre::eyre!("Block {} not found on chain", to))?;

    let mut tx = pool.begin().await?;

    storage::repos::write_batch(&mut tx, &rows).await?;

    let indexed_block = IndexedBlock {
        block_number: to,
        block_hash: format!("{:#x}", head_block.header.hash()),
        parent_hash: format!("{:#x}", head_block.header.parent_hash()),
        timestamp: head_block.header.timestamp() as i64,
    };
    storage::repos::insert_block(&mut *tx, &indexed_block).await?;
    storage::repos::set_last_indexed_block(&mut *tx, to).await?;

    tx.commit().await?;

    *last_block = to;

    tracing::info!(
        block = to,
        templates = rows.template_events.len(),
        deployments = rows.deployments.len(),
        fee_changes = rows.fee_changes.len(),
        "Batch complete"
    );

    Ok(true)
}

/// Compare the chain's parent hash of `from` with the stored hash of `from - 1`.
///
/// On mismatch, walks back until a stored hash agrees with the chain and
/// returns that block as the fork point.
async fn detect_reorg(
    provider: &FactoriProvider,
    pool: &sqlx::PgPool,
    from: i64,
) -> Result<Option<i64>> {
    if from <= 1 {
        return Ok(None);
    }
    let Some(stored_hash) = storage::repos::get_block_hash(pool, from - 1).await? else {
        return Ok(None);
    };

    let block = provider
        .get_block_by_number(BlockNumberOrTag::Number(from as u64))
        .await?
        .ok_or_else(|| eyre::eyre!("Block {} not found on chain", from))?;
    let parent_hash = format!("{:#x}", block.header.parent_hash());
    if parent_hash == stored_hash {
        return Ok(None);
    }

    tracing::warn!(
        block = from,
        expected = %stored_hash,
        got = %parent_hash,
        "Reorg detected, rolling back"
    );

    let mut fork_block = from - 2;
    while fork_block > 0 {
        let Some(stored) = storage::repos::get_block_hash(pool, fork_block).await? else {
            break;
        };
        let chain_block = provider
            .get_block_by_number(BlockNumberOrTag::Number(fork_block as u64))
            .await?
            .ok_or_else(|| eyre::eyre!("Block {} not found during reorg walk", fork_block))?;
        if format!("{:#x}", chain_block.header.hash()) == stored {
            break;
        }
        fork_block -= 1;
    }

    tracing::warn!(fork_block = fork_block, "Fork point found");
    Ok(Some(fork_block))
}
