use estate_core::AggregateId;

/// A command targets a specific aggregate.
///
/// Commands are intent ("accept this offer"); the aggregate either rejects
/// them or turns them into events. Each command operates on exactly one
/// aggregate, which is the transaction boundary for its invariants.
pub trait Command: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn target_aggregate_id(&self) -> AggregateId;
}
