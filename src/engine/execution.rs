use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    //converts to quantity sign (Buy = +1, Sell = -1)
    pub fn to_qty_sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

//a market order waiting for the next bar open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub quantity: u32,
    pub side: OrderSide,
}

impl Order {
    pub fn market(
        id: u64,
        timestamp: NaiveDateTime,
        symbol: String,
        quantity: u32,
        side: OrderSide,
    ) -> Self {
        Order {
            id,
            timestamp,
            symbol,
            quantity,
            side,
        }
    }

    //returns the signed quantity (positive for buy, negative for sell)
    pub fn signed_quantity(&self) -> i64 {
        (self.quantity as i64) * self.side.to_qty_sign()
    }
}

//represents a filled order
//timestamp is the simulated execution time, not the submission time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub id: u64,
    pub order_id: u64,
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    pub fn from_order(
        fill_id: u64,
        order: &Order,
        timestamp: NaiveDateTime,
        price: f64,
        commission: f64,
    ) -> Self {
        Fill {
            id: fill_id,
            order_id: order.id,
            timestamp,
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            commission,
        }
    }

    //returns the cash value of the fill before commission
    pub fn notional(&self) -> f64 {
        self.price * self.quantity as f64
    }

    //returns the signed quantity (positive for buy, negative for sell)
    pub fn signed_quantity(&self) -> i64 {
        (self.quantity as i64) * self.side.to_qty_sign()
    }
}

//simulates order execution
//market orders fill at the open of the bar after submission,
//commission is a rate applied to the fill's notional value
pub struct ExecutionEngine {
    commission_rate: f64,
    next_order_id: u64,
    next_fill_id: u64,
    pending_orders: Vec<Order>,
}

impl ExecutionEngine {
    pub fn new(commission_rate: f64) -> Self {
        ExecutionEngine {
            commission_rate,
            next_order_id: 1,
            next_fill_id: 1,
            pending_orders: Vec::new(),
        }
    }

    //creates and submits a market order, returning its id
    pub fn market_order(
        &mut self,
        timestamp: NaiveDateTime,
        symbol: String,
        quantity: u32,
        side: OrderSide,
    ) -> u64 {
        let order = Order::market(self.next_order_id, timestamp, symbol, quantity, side);
        self.next_order_id += 1;
        let id = order.id;
        self.pending_orders.push(order);
        id
    }

    //fills all pending orders at the given price (the current bar's open)
    pub fn process_orders(&mut self, timestamp: NaiveDateTime, price: f64) -> Vec<Fill> {
        let mut fills = Vec::new();

        for order in self.pending_orders.drain(..) {
            let commission = self.commission_rate * price * order.quantity as f64;
            let fill = Fill::from_order(self.next_fill_id, &order, timestamp, price, commission);
            self.next_fill_id += 1;
            fills.push(fill);
        }

        fills
    }

    //returns the number of pending orders
    pub fn pending_order_count(&self) -> usize {
        self.pending_orders.len()
    }

    //cancels all pending orders
    pub fn cancel_all_orders(&mut self) {
        self.pending_orders.clear();
    }
}
