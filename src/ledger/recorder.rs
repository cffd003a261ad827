use crate::engine::execution::{Fill, OrderSide};
use crate::ledger::position::{LedgerError, PositionState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

//immutable summary of one round trip (flat -> open -> flat)
//pnl figures come from the broker at close time and are authoritative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub peak_quantity: u32,
    pub average_entry_cost: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub total_commission: f64,
    pub fill_count: usize,
}

//one executed fill, logged across the whole run regardless of
//position lifecycle; only collected when fill export is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRecord {
    pub timestamp: NaiveDateTime,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: f64,
    pub commission: f64,
}

impl FillRecord {
    fn from_fill(fill: &Fill) -> Self {
        FillRecord {
            timestamp: fill.timestamp,
            side: fill.side,
            quantity: fill.quantity,
            price: fill.price,
            commission: fill.commission,
        }
    }
}

//consumes fill and position-closed notifications from the backtest engine
//and maintains the trade log plus per-position cost-basis bookkeeping
#[derive(Debug, Clone)]
pub struct TradeRecorder {
    position: PositionState,
    trades: Vec<TradeRecord>,
    fills: Option<Vec<FillRecord>>,
}

impl TradeRecorder {
    //creates an empty recorder; pass true to also keep the all-time fill log
    pub fn new(record_fills: bool) -> Self {
        TradeRecorder {
            position: PositionState::new(),
            trades: Vec::new(),
            fills: if record_fills { Some(Vec::new()) } else { None },
        }
    }

    //handles one executed fill
    pub fn on_fill(&mut self, fill: &Fill) -> Result<(), LedgerError> {
        self.position.apply(fill)?;

        if let Some(log) = self.fills.as_mut() {
            log.push(FillRecord::from_fill(fill));
        }

        Ok(())
    }

    //handles the engine's notification that the position has returned to flat
    //builds a TradeRecord from ledger state and the supplied broker figures,
    //appends it, and resets the position state
    pub fn on_position_closed(
        &mut self,
        close_time: NaiveDateTime,
        gross_pnl: f64,
        net_pnl: f64,
        total_commission: f64,
    ) -> Result<TradeRecord, LedgerError> {
        if !self.position.is_flat() {
            return Err(LedgerError::PrematureClose {
                net_quantity: self.position.net_quantity(),
            });
        }

        let entry_time = self
            .position
            .opened_at()
            .ok_or(LedgerError::CloseWithoutOpen)?;

        let record = TradeRecord {
            entry_time,
            exit_time: close_time,
            peak_quantity: self.position.peak_quantity(),
            average_entry_cost: self.position.average_cost(),
            gross_pnl,
            net_pnl,
            total_commission,
            fill_count: self.position.fill_count(),
        };

        self.trades.push(record.clone());
        self.position.reset();

        Ok(record)
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_flat()
    }

    //current position bookkeeping (diagnostic view)
    pub fn position(&self) -> &PositionState {
        &self.position
    }

    //closed trades in the order they completed
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    //all-time fill log, if enabled
    pub fn fills(&self) -> Option<&[FillRecord]> {
        self.fills.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn fill(day: u32, side: OrderSide, quantity: u32, price: f64, commission: f64) -> Fill {
        Fill {
            id: day as u64,
            order_id: day as u64,
            timestamp: ts(day),
            symbol: "AAPL".to_string(),
            side,
            quantity,
            price,
            commission,
        }
    }

    #[test]
    fn single_round_trip_scenario() {
        //buy 100 @ 10.00 (comm 1.00), sell 100 @ 11.00 (comm 1.10)
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 1.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Sell, 100, 11.0, 1.1))
            .unwrap();
        assert!(recorder.is_flat());

        let gross = 100.0;
        let commission = 2.1;
        let record = recorder
            .on_position_closed(ts(5), gross, gross - commission, commission)
            .unwrap();

        assert_eq!(record.entry_time, ts(4));
        assert_eq!(record.exit_time, ts(5));
        assert_eq!(record.gross_pnl, 100.0);
        assert_eq!(record.total_commission, 2.1);
        assert!((record.net_pnl - 97.9).abs() < 1e-9);
        assert_eq!(record.peak_quantity, 100);
        assert_eq!(record.fill_count, 2);
        assert_eq!(recorder.trades().len(), 1);
    }

    #[test]
    fn scale_in_and_out_bookkeeping() {
        //buy 50 @ 10, buy 50 @ 12 (avg 11, peak 100),
        //sell 60 @ 13 (+120), sell 40 @ 14 (+120)
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 50, 10.0, 0.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Buy, 50, 12.0, 0.0))
            .unwrap();

        assert!((recorder.position().average_cost() - 11.0).abs() < 1e-9);
        assert_eq!(recorder.position().peak_quantity(), 100);

        recorder
            .on_fill(&fill(6, OrderSide::Sell, 60, 13.0, 0.0))
            .unwrap();
        assert_eq!(recorder.position().net_quantity(), 40);
        assert!((recorder.position().realized_pnl_pretax() - 120.0).abs() < 1e-9);
        //partial exit leaves average cost untouched
        assert!((recorder.position().average_cost() - 11.0).abs() < 1e-9);

        recorder
            .on_fill(&fill(7, OrderSide::Sell, 40, 14.0, 0.0))
            .unwrap();
        assert!(recorder.is_flat());
        assert!((recorder.position().realized_pnl_pretax() - 240.0).abs() < 1e-9);
        assert_eq!(recorder.position().peak_quantity(), 100);
        assert_eq!(recorder.position().fill_count(), 4);

        let record = recorder.on_position_closed(ts(7), 240.0, 240.0, 0.0).unwrap();
        assert_eq!(record.peak_quantity, 100);
        assert_eq!(record.fill_count, 4);
    }

    #[test]
    fn zero_move_round_trip_has_zero_gross() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 250, 42.0, 0.5))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Sell, 250, 42.0, 0.5))
            .unwrap();

        assert!(recorder.position().realized_pnl_pretax().abs() < 1e-9);
    }

    #[test]
    fn average_cost_is_volume_weighted() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 10, 100.0, 0.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Buy, 30, 120.0, 0.0))
            .unwrap();
        recorder
            .on_fill(&fill(6, OrderSide::Buy, 60, 90.0, 0.0))
            .unwrap();

        let expected = (10.0 * 100.0 + 30.0 * 120.0 + 60.0 * 90.0) / 100.0;
        assert!((recorder.position().average_cost() - expected).abs() < 1e-9);
        assert_eq!(recorder.position().net_quantity(), 100);
    }

    #[test]
    fn peak_tracks_maximum_open_size() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 40, 10.0, 0.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Sell, 20, 10.0, 0.0))
            .unwrap();
        recorder
            .on_fill(&fill(6, OrderSide::Buy, 70, 10.0, 0.0))
            .unwrap();
        assert_eq!(recorder.position().peak_quantity(), 90);

        recorder
            .on_fill(&fill(7, OrderSide::Sell, 90, 10.0, 0.0))
            .unwrap();
        assert_eq!(recorder.position().peak_quantity(), 90);
    }

    #[test]
    fn close_resets_state_for_next_position() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 1.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Sell, 100, 12.0, 1.2))
            .unwrap();
        recorder.on_position_closed(ts(5), 200.0, 197.8, 2.2).unwrap();

        let position = recorder.position();
        assert!(position.is_flat());
        assert_eq!(position.peak_quantity(), 0);
        assert_eq!(position.fill_count(), 0);
        assert!(position.opened_at().is_none());
        assert_eq!(position.realized_pnl_pretax(), 0.0);
        assert_eq!(position.commission_accum(), 0.0);

        //a fresh position is uncontaminated by the prior one
        recorder
            .on_fill(&fill(8, OrderSide::Buy, 50, 20.0, 0.5))
            .unwrap();
        let position = recorder.position();
        assert_eq!(position.opened_at(), Some(ts(8)));
        assert_eq!(position.net_quantity(), 50);
        assert_eq!(position.peak_quantity(), 50);
        assert!((position.average_cost() - 20.0).abs() < 1e-9);
        assert_eq!(position.commission_accum(), 0.5);
        assert_eq!(position.fill_count(), 1);
    }

    #[test]
    fn opening_fill_commission_survives_the_reset() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 1.0))
            .unwrap();
        assert_eq!(recorder.position().commission_accum(), 1.0);
    }

    #[test]
    fn sell_while_flat_is_rejected() {
        let mut recorder = TradeRecorder::new(false);

        let err = recorder
            .on_fill(&fill(4, OrderSide::Sell, 10, 10.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::OverSell {
                requested: 10,
                held: 0
            }
        );

        //rejection leaves no trace
        assert!(recorder.position().is_flat());
        assert_eq!(recorder.position().fill_count(), 0);
        assert_eq!(recorder.position().commission_accum(), 0.0);
    }

    #[test]
    fn oversell_is_a_hard_error() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 50, 10.0, 0.0))
            .unwrap();
        let err = recorder
            .on_fill(&fill(5, OrderSide::Sell, 80, 11.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::OverSell {
                requested: 80,
                held: 50
            }
        );

        //state is untouched by the rejected fill
        assert_eq!(recorder.position().net_quantity(), 50);
        assert_eq!(recorder.position().realized_pnl_pretax(), 0.0);
    }

    #[test]
    fn invalid_fills_rejected_before_mutation() {
        let mut recorder = TradeRecorder::new(false);

        let err = recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidPrice(0.0));

        let err = recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, -0.5))
            .unwrap_err();
        assert_eq!(err, LedgerError::NegativeCommission(-0.5));

        let err = recorder
            .on_fill(&fill(4, OrderSide::Buy, 0, 10.0, 0.0))
            .unwrap_err();
        assert_eq!(err, LedgerError::ZeroQuantity);

        assert!(recorder.position().is_flat());
        assert_eq!(recorder.position().fill_count(), 0);
    }

    #[test]
    fn premature_close_is_detected() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 0.0))
            .unwrap();
        let err = recorder
            .on_position_closed(ts(5), 0.0, 0.0, 0.0)
            .unwrap_err();
        assert_eq!(err, LedgerError::PrematureClose { net_quantity: 100 });
    }

    #[test]
    fn close_without_open_lifecycle_is_detected() {
        let mut recorder = TradeRecorder::new(false);

        let err = recorder
            .on_position_closed(ts(5), 0.0, 0.0, 0.0)
            .unwrap_err();
        assert_eq!(err, LedgerError::CloseWithoutOpen);
    }

    #[test]
    fn fill_log_spans_position_lifecycles() {
        let mut recorder = TradeRecorder::new(true);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 1.0))
            .unwrap();
        recorder
            .on_fill(&fill(5, OrderSide::Sell, 100, 11.0, 1.1))
            .unwrap();
        recorder.on_position_closed(ts(5), 100.0, 97.9, 2.1).unwrap();
        recorder
            .on_fill(&fill(8, OrderSide::Buy, 100, 12.0, 1.2))
            .unwrap();

        let fills = recorder.fills().unwrap();
        assert_eq!(fills.len(), 3);
        assert_eq!(fills[0].price, 10.0);
        assert_eq!(fills[2].timestamp, ts(8));
    }

    #[test]
    fn fill_log_disabled_by_default() {
        let mut recorder = TradeRecorder::new(false);

        recorder
            .on_fill(&fill(4, OrderSide::Buy, 100, 10.0, 0.0))
            .unwrap();
        assert!(recorder.fills().is_none());
    }
}
