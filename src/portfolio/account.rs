use crate::engine::execution::{Fill, OrderSide};
use crate::portfolio::position::Position;
use std::collections::HashMap;

//represents a cash trading account with positions
#[derive(Debug, Clone)]
pub struct Account {
    //initial cash balance
    pub initial_cash: f64,

    //current cash (notional flows in and out on fills, commissions deducted)
    pub cash: f64,

    //current total equity (cash + market value of holdings)
    pub equity: f64,

    //open positions by symbol
    pub open_positions: HashMap<String, Position>,

    //total commission charged so far
    pub total_commission: f64,
}

impl Account {
    //creates a new account with the given starting cash
    pub fn new(initial_cash: f64) -> Self {
        Account {
            initial_cash,
            cash: initial_cash,
            equity: initial_cash,
            open_positions: HashMap::new(),
            total_commission: 0.0,
        }
    }

    //processes a fill: cash settles the notional plus commission,
    //the position updates its cost basis and realized pnl
    pub fn process_fill(&mut self, fill: &Fill) {
        self.cash -= fill.commission;
        self.total_commission += fill.commission;

        match fill.side {
            OrderSide::Buy => self.cash -= fill.notional(),
            OrderSide::Sell => self.cash += fill.notional(),
        }

        let position = self
            .open_positions
            .entry(fill.symbol.clone())
            .or_insert_with(|| Position::new(fill.symbol.clone()));

        position.update_with_fill(fill.signed_quantity(), fill.price);
    }

    //updates total equity based on current market prices
    pub fn update_equity(&mut self, prices: &HashMap<String, f64>) {
        let mut holdings_value = 0.0;

        for (symbol, position) in &self.open_positions {
            if let Some(&price) = prices.get(symbol) {
                holdings_value += position.market_value(price);
            }
        }

        self.equity = self.cash + holdings_value;
    }

    //returns the position for a symbol, if any fills have touched it
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.open_positions.get(symbol)
    }

    //returns the net quantity held in a symbol (0 when flat or never traded)
    pub fn position_qty(&self, symbol: &str) -> i64 {
        self.open_positions
            .get(symbol)
            .map(|p| p.net_qty)
            .unwrap_or(0)
    }

    //returns total realized pnl across all positions, before commissions
    pub fn total_realized_pnl(&self) -> f64 {
        self.open_positions.values().map(|p| p.realized_pnl).sum()
    }

    //returns the total return as a fraction of initial cash
    pub fn total_return(&self) -> f64 {
        (self.equity - self.initial_cash) / self.initial_cash
    }
}
