pub mod position;
pub mod recorder;

pub use position::{LedgerError, PositionState};
pub use recorder::{FillRecord, TradeRecord, TradeRecorder};
