//! Execution backends implementing the operation protocol.
//!
//! * [`EagerContext`] runs every primitive immediately on host tensors.
//! * [`GraphContext`] records a node per operation and hands out symbolic handles.

pub mod config;
mod eager;
mod graph;
mod handles;

pub use config::{ConfigError, ContextConfig, ENV_DEFAULT_DEVICE, ENV_MEMORY_LIMIT};
pub use eager::{EagerContext, EagerOperation};
pub use graph::{GraphContext, GraphOperation, NodeDef, PLACEHOLDER};
pub use handles::HandleTable;

#[cfg(test)]
mod tests {
    use super::*;
    use opforge_core::ExecutionContext;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn contexts_are_thread_safe() {
        assert_send_sync::<EagerContext>();
        assert_send_sync::<GraphContext>();
    }

    #[test]
    fn contexts_never_share_handles() {
        let eager = EagerContext::new(ContextConfig::default()).unwrap();
        let graph = GraphContext::new();
        assert_ne!(eager.id(), graph.id());
        assert_eq!(eager.backend(), "eager");
        assert_eq!(graph.backend(), "graph");

        let h = graph.placeholder(core_types::DataType::F32, None);
        assert!(eager.dims(h).is_err());
    }
}
