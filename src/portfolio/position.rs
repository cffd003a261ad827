use serde::{Deserialize, Serialize};

//broker-side view of a position in one symbol
//quantities are signed, but the shipped strategies only ever go long
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    //symbol being held
    pub symbol: String,

    //net quantity (positive for long, 0 for flat)
    pub net_qty: i64,

    //average entry price of the open quantity
    pub avg_entry_price: f64,

    //cumulative realized pnl from exits, before commissions
    pub realized_pnl: f64,
}

impl Position {
    //creates a new flat position
    pub fn new(symbol: String) -> Self {
        Position {
            symbol,
            net_qty: 0,
            avg_entry_price: 0.0,
            realized_pnl: 0.0,
        }
    }

    //calculates unrealized pnl at a given price
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        if self.net_qty == 0 {
            return 0.0;
        }
        (current_price - self.avg_entry_price) * self.net_qty as f64
    }

    //returns true if the position is flat (no open position)
    pub fn is_flat(&self) -> bool {
        self.net_qty == 0
    }

    //returns the market value of the holding at a given price
    pub fn market_value(&self, current_price: f64) -> f64 {
        current_price * self.net_qty as f64
    }

    //updates the position with a new fill
    //returns the realized pnl from this fill (nonzero when it reduces the position)
    pub fn update_with_fill(&mut self, fill_qty: i64, fill_price: f64) -> f64 {
        let mut realized_pnl = 0.0;

        //if flat, just establish the new position
        if self.net_qty == 0 {
            self.net_qty = fill_qty;
            self.avg_entry_price = fill_price;
            return realized_pnl;
        }

        let same_direction =
            (self.net_qty > 0 && fill_qty > 0) || (self.net_qty < 0 && fill_qty < 0);

        if same_direction {
            //adding to position - update average entry price
            let total_qty = self.net_qty + fill_qty;
            let total_cost =
                self.avg_entry_price * self.net_qty as f64 + fill_price * fill_qty as f64;
            self.avg_entry_price = total_cost / total_qty as f64;
            self.net_qty = total_qty;
        } else {
            //reducing the position
            let close_qty = fill_qty.abs().min(self.net_qty.abs());

            let price_diff = if self.net_qty > 0 {
                fill_price - self.avg_entry_price
            } else {
                self.avg_entry_price - fill_price
            };

            realized_pnl = price_diff * close_qty as f64;
            self.realized_pnl += realized_pnl;
            self.net_qty += fill_qty;

            //if flat, reset entry price
            if self.net_qty == 0 {
                self.avg_entry_price = 0.0;
            }
        }

        realized_pnl
    }
}
