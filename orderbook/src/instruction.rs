use crate::types::{Identifier, Side, TimeInForce};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub symbol: String,
    pub id: String,
    pub attribution_id: i32,
    pub side: Side,
    /// Ticks.
    pub price: i64,
    /// Lots.
    pub quantity: i64,
    pub time_in_force: TimeInForce,
}

impl PlaceOrder {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.id.clone(), self.attribution_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReplaceOrder {
    pub symbol: String,
    pub id: String,
    pub attribution_id: i32,
    pub cancel_id: String,
    pub price: i64,
    pub quantity: i64,
}

impl CancelReplaceOrder {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.id.clone(), self.attribution_id)
    }

    /// The order being replaced, in the instruction's attribution namespace.
    pub fn cancel_identifier(&self) -> Identifier {
        Identifier::new(self.cancel_id.clone(), self.attribution_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub symbol: String,
    pub id: String,
    pub attribution_id: i32,
    pub cancel_id: String,
}

impl CancelOrder {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.id.clone(), self.attribution_id)
    }

    pub fn cancel_identifier(&self) -> Identifier {
        Identifier::new(self.cancel_id.clone(), self.attribution_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub symbol: String,
    pub id: String,
    pub attribution_id: i32,
    pub status_id: String,
}

impl OrderStatus {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.id.clone(), self.attribution_id)
    }

    pub fn status_identifier(&self) -> Identifier {
        Identifier::new(self.status_id.clone(), self.attribution_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Place(PlaceOrder),
    CancelReplace(CancelReplaceOrder),
    Cancel(CancelOrder),
    Status(OrderStatus),
}

impl Instruction {
    pub fn symbol(&self) -> &str {
        match self {
            Instruction::Place(i) => &i.symbol,
            Instruction::CancelReplace(i) => &i.symbol,
            Instruction::Cancel(i) => &i.symbol,
            Instruction::Status(i) => &i.symbol,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Instruction::Place(i) => &i.id,
            Instruction::CancelReplace(i) => &i.id,
            Instruction::Cancel(i) => &i.id,
            Instruction::Status(i) => &i.id,
        }
    }
}
