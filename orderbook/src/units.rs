//! Fixed-point conversion between decimal prices/quantities and integer ticks/lots.
//!
//! Everything past this boundary is integer arithmetic. Rounding is to the
//! nearest integer with ties away from zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const ONE_TICK: f64 = 0.000_01;
pub const ONE_LOT: f64 = 0.000_000_01;

pub const TICK_SCALE: u32 = 5;
pub const LOT_SCALE: u32 = 8;

pub const TICKS_PER_UNIT: i64 = 100_000;
pub const LOTS_PER_UNIT: i64 = 100_000_000;

pub fn to_ticks(value: f64) -> i64 {
    (value * TICKS_PER_UNIT as f64).round() as i64
}

/// `value` counted in increments of `tick_size` decimal units.
pub fn to_ticks_scaled(value: f64, tick_size: f64) -> i64 {
    to_ticks(value * tick_size)
}

pub fn from_ticks(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_UNIT as f64
}

pub fn to_lots(value: f64) -> i64 {
    (value * LOTS_PER_UNIT as f64).round() as i64
}

/// `value` counted in increments of `lot_size` decimal units.
pub fn to_lots_scaled(value: f64, lot_size: f64) -> i64 {
    to_lots(value * lot_size)
}

pub fn from_lots(lots: i64) -> f64 {
    lots as f64 / LOTS_PER_UNIT as f64
}

/// Exact conversion; `None` when the result does not fit in an `i64`.
pub fn decimal_to_ticks(value: Decimal) -> Option<i64> {
    scale(value, TICKS_PER_UNIT)
}

pub fn ticks_to_decimal(ticks: i64) -> Decimal {
    Decimal::new(ticks, TICK_SCALE)
}

/// Exact conversion; `None` when the result does not fit in an `i64`.
pub fn decimal_to_lots(value: Decimal) -> Option<i64> {
    scale(value, LOTS_PER_UNIT)
}

pub fn lots_to_decimal(lots: i64) -> Decimal {
    Decimal::new(lots, LOT_SCALE)
}

fn scale(value: Decimal, per_unit: i64) -> Option<i64> {
    value
        .checked_mul(Decimal::from(per_unit))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
