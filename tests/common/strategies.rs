use proptest::prelude::*;

/// Lull time used by the property suites (milliseconds)
pub const LULL_MS: u64 = 100;

/// One step of a producer/consumer interleaving
#[derive(Debug, Clone)]
pub enum QueueOp {
    Put(u32),
    /// Advance the clock; pause lengths never add up to exactly `LULL_MS`
    Pause(u64),
    TryGet,
    TryGetBatch,
}

pub fn pause_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![Just(15u64), Just(45u64), Just(150u64)]
}

pub fn queue_op_strategy() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        4 => any::<u32>().prop_map(QueueOp::Put),
        3 => pause_strategy().prop_map(QueueOp::Pause),
        1 => Just(QueueOp::TryGet),
        2 => Just(QueueOp::TryGetBatch),
    ]
}

pub fn queue_ops_strategy() -> impl Strategy<Value = Vec<QueueOp>> {
    prop::collection::vec(queue_op_strategy(), 1..40)
}
