use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use factori_protocol::abi::IFactory;

/// Where a decoded event sits on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMeta {
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u32,
}

/// A factory event decoded from an RPC log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryEvent {
    NewTemplate {
        key: B256,
        template: Address,
        price: U256,
    },
    UpdatedTemplate {
        key: B256,
        template: Address,
        owner: Address,
        price: U256,
    },
    DeletedTemplate {
        key: B256,
    },
    Deployed {
        deployed: Address,
        deployer: Address,
    },
    FeeChanged {
        previous: U256,
        current: U256,
    },
    FeeToChanged {
        previous: Address,
        current: Address,
    },
}

/// Topic0 of every event the indexer subscribes to.
pub fn factory_signatures() -> Vec<B256> {
    vec![
        IFactory::NewTemplate::SIGNATURE_HASH,
        IFactory::UpdatedTemplate::SIGNATURE_HASH,
        IFactory::DeletedTemplate::SIGNATURE_HASH,
        IFactory::Deployed::SIGNATURE_HASH,
        IFactory::FeeChanged::SIGNATURE_HASH,
        IFactory::FeeToChanged::SIGNATURE_HASH,
    ]
}

/// Attempt to decode a log emitted by the factory.
///
/// Pending logs (no block number or index yet) and foreign events yield `None`.
pub fn decode_factory_log(log: &Log) -> Option<(EventMeta, FactoryEvent)> {
    let meta = EventMeta {
        block_number: log.block_number?,
        transaction_hash: log
            .transaction_hash
            .map(|h| format!("{h:#x}"))
            .unwrap_or_default(),
        log_index: log.log_index? as u32,
    };

    let topic0 = *log.topic0()?;
    let event = if topic0 == IFactory::NewTemplate::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::NewTemplate>().ok()?.inner.data;
        FactoryEvent::NewTemplate {
            key: d.key,
            template: d.template,
            price: d.price,
        }
    } else if topic0 == IFactory::UpdatedTemplate::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::UpdatedTemplate>().ok()?.inner.data;
        FactoryEvent::UpdatedTemplate {
            key: d.key,
            template: d.template,
            owner: d.owner,
            price: d.price,
        }
    } else if topic0 == IFactory::DeletedTemplate::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::DeletedTemplate>().ok()?.inner.data;
        FactoryEvent::DeletedTemplate { key: d.key }
    } else if topic0 == IFactory::Deployed::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::Deployed>().ok()?.inner.data;
        FactoryEvent::Deployed {
            deployed: d.deployed,
            deployer: d.deployer,
        }
    } else if topic0 == IFactory::FeeChanged::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::FeeChanged>().ok()?.inner.data;
        FactoryEvent::FeeChanged {
            previous: d.previous,
            current: d.current,
        }
    } else if topic0 == IFactory::FeeToChanged::SIGNATURE_HASH {
        let d = log.log_decode::<IFactory::FeeToChanged>().ok()?.inner.data;
        FactoryEvent::FeeToChanged {
            previous: d.previous,
            current: d.current,
        }
    } else {
        tracing::debug!(topic0 = %topic0, "Skipping unrecognised factory log");
        return None;
    };

    Some((meta, event))
}
