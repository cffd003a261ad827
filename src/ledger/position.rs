use crate::engine::execution::{Fill, OrderSide};
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("Invalid fill price: {0} (must be positive)")]
    InvalidPrice(f64),
    #[error("Negative commission: {0}")]
    NegativeCommission(f64),
    #[error("Zero-quantity fill")]
    ZeroQuantity,
    #[error("Sell of {requested} exceeds current holdings of {held}")]
    OverSell { requested: u32, held: u32 },
    #[error("Close notification out of sync with ledger: {net_quantity} shares still open")]
    PrematureClose { net_quantity: u32 },
    #[error("Close notification received with no position lifecycle in progress")]
    CloseWithoutOpen,
}

//bookkeeping state for the currently open position
//long-only: net quantity never goes negative, a sell beyond holdings is rejected
//reset to flat defaults every time the position fully closes
#[derive(Debug, Clone)]
pub struct PositionState {
    //current open size, 0 when flat
    net_quantity: u32,

    //volume-weighted average entry price of the open quantity
    //meaningless while flat, recomputed only on buys
    average_cost: f64,

    //pre-commission pnl realized by partial or full exits within this
    //position's lifetime (diagnostic; broker figures are authoritative at close)
    realized_pnl_pretax: f64,

    //commissions charged since the position opened
    commission_accum: f64,

    //timestamp of the fill that took the position from flat to open
    opened_at: Option<NaiveDateTime>,

    //every fill belonging to the currently open position, in order
    fills_in_position: Vec<Fill>,

    //largest net quantity reached since the position opened
    peak_quantity: u32,
}

impl PositionState {
    //creates a flat position
    pub fn new() -> Self {
        PositionState {
            net_quantity: 0,
            average_cost: 0.0,
            realized_pnl_pretax: 0.0,
            commission_accum: 0.0,
            opened_at: None,
            fills_in_position: Vec::new(),
            peak_quantity: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.net_quantity == 0
    }

    pub fn net_quantity(&self) -> u32 {
        self.net_quantity
    }

    pub fn average_cost(&self) -> f64 {
        self.average_cost
    }

    pub fn realized_pnl_pretax(&self) -> f64 {
        self.realized_pnl_pretax
    }

    pub fn commission_accum(&self) -> f64 {
        self.commission_accum
    }

    pub fn opened_at(&self) -> Option<NaiveDateTime> {
        self.opened_at
    }

    pub fn peak_quantity(&self) -> u32 {
        self.peak_quantity
    }

    pub fn fill_count(&self) -> usize {
        self.fills_in_position.len()
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills_in_position
    }

    //applies one fill, validating before any state mutation
    //a buy from flat starts a new position lifecycle; that fill's own
    //commission is charged against the fresh accumulators
    pub fn apply(&mut self, fill: &Fill) -> Result<(), LedgerError> {
        if fill.price <= 0.0 {
            return Err(LedgerError::InvalidPrice(fill.price));
        }
        if fill.commission < 0.0 {
            return Err(LedgerError::NegativeCommission(fill.commission));
        }
        if fill.quantity == 0 {
            return Err(LedgerError::ZeroQuantity);
        }

        match fill.side {
            OrderSide::Buy => {
                if self.net_quantity == 0 {
                    self.begin(fill.timestamp);
                }

                //volume-weighted average of held and incoming quantity
                let held = self.net_quantity as f64;
                let incoming = fill.quantity as f64;
                self.average_cost =
                    (self.average_cost * held + fill.price * incoming) / (held + incoming);

                self.net_quantity += fill.quantity;
                self.peak_quantity = self.peak_quantity.max(self.net_quantity);
            }
            OrderSide::Sell => {
                //long-only: overselling means the sizer upstream is broken,
                //refuse rather than clamp and corrupt the cost basis
                if fill.quantity > self.net_quantity {
                    return Err(LedgerError::OverSell {
                        requested: fill.quantity,
                        held: self.net_quantity,
                    });
                }

                self.realized_pnl_pretax +=
                    (fill.price - self.average_cost) * fill.quantity as f64;
                self.net_quantity -= fill.quantity;
                //average cost is unchanged by exits
            }
        }

        self.commission_accum += fill.commission;
        self.fills_in_position.push(fill.clone());

        Ok(())
    }

    //starts a fresh position lifecycle at the given open timestamp
    fn begin(&mut self, opened_at: NaiveDateTime) {
        self.opened_at = Some(opened_at);
        self.average_cost = 0.0;
        self.realized_pnl_pretax = 0.0;
        self.commission_accum = 0.0;
        self.peak_quantity = 0;
        self.fills_in_position.clear();
    }

    //returns the state to flat defaults after a close is recorded
    pub fn reset(&mut self) {
        *self = PositionState::new();
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::new()
    }
}
