//! Turns decoded factory events into insert-ready rows.

use alloy::rpc::types::Log;
use factori_rpc::{EventMeta, FactoryEvent, decode_factory_log};
use factori_storage::models::*;

/// Fold a batch of raw factory logs into the rows written for it.
pub fn collect_batch(logs: &[Log]) -> BatchWrite {
    let mut batch = BatchWrite::default();
    for log in logs {
        if let Some((meta, event)) = decode_factory_log(log) {
            push_event(&mut batch, meta, event);
        }
    }
    batch
}

fn push_event(batch: &mut BatchWrite, meta: EventMeta, event: FactoryEvent) {
    let block_number = meta.block_number as i64;
    let log_index = meta.log_index as i32;
    let transaction_hash = meta.transaction_hash;

    let template_event = |key, kind, template, owner, price| NewTemplateEvent {
        key,
        kind,
        template,
        owner,
        price,
        transaction_hash: transaction_hash.clone(),
        block_number,
        log_index,
    };

    match event {
        FactoryEvent::NewTemplate {
            key,
            template,
            price,
        } => {
            tracing::info!(key = %key, template = %template, %price, "Template added");
            batch.template_events.push(template_event(
                format!("{key:#x}"),
                TemplateEventKind::Added,
                Some(format!("{template:#x}")),
                None,
                Some(price.to_string()),
            ));
        }
        FactoryEvent::UpdatedTemplate {
            key,
            template,
            owner,
            price,
        } => {
            tracing::info!(key = %key, template = %template, owner = %owner, "Template updated");
            batch.template_events.push(template_event(
                format!("{key:#x}"),
                TemplateEventKind::Updated,
                Some(format!("{template:#x}")),
                Some(format!("{owner:#x}")),
                Some(price.to_string()),
            ));
        }
        FactoryEvent::DeletedTemplate { key } => {
            tracing::info!(key = %key, "Template removed");
            batch.template_events.push(template_event(
                format!("{key:#x}"),
                TemplateEventKind::Deleted,
                None,
                None,
                None,
            ));
        }
        FactoryEvent::Deployed { deployed, deployer } => {
            batch.deployments.push(NewDeployment {
                deployed: format!("{deployed:#x}"),
                deployer: format!("{deployer:#x}"),
                transaction_hash,
                block_number,
                log_index,
            });
        }
        FactoryEvent::FeeChanged { previous, current } => {
            tracing::info!(%previous, %current, "Fee changed");
            batch.fee_changes.push(NewFeeChange {
                kind: "fee".into(),
                previous: previous.to_string(),
                current: current.to_string(),
                transaction_hash,
                block_number,
                log_index,
            });
        }
        FactoryEvent::FeeToChanged { previous, current } => {
            tracing::info!(previous = %previous, current = %current, "Fee recipient changed");
            batch.fee_changes.push(NewFeeChange {
                kind: "fee_to".into(),
                previous: format!("{previous:#x}"),
                current: format!("{current:#x}"),
                transaction_hash,
                block_number,
                log_index,
            });
        }
    }
}
