pub mod decoder;
pub mod provider;

pub use decoder::{EventMeta, FactoryEvent, decode_factory_log, factory_signatures};
pub use factori_protocol::abi::IFactory;
pub use provider::{FactoriProvider, create_provider};
