pub mod aggregator;
pub mod encoder;
pub mod pipeline;
pub mod random;
pub mod source;
pub mod updater;

pub use aggregator::Aggregator;
pub use pipeline::{Acquisition, CanonicalValue, Oracle};
pub use random::RandomRange;
pub use source::{SourceOutcome, SourceResult, ValueSource};
pub use updater::{LedgerUpdater, TransactionRecord, UpdateStage, UpdateTarget};
