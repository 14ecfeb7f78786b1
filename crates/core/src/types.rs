/// Caller-assigned identity of a work item. Unique within one batch.
pub type ItemId = String;

/// Per-identity submission sequence number, assigned by the client and
/// echoed back by the server.
pub type Sequence = u64;
