use rust_decimal::Decimal;

/// Working minutes in a standard shift; anything past this in a day is overtime
pub const STANDARD_SHIFT_MINUTES: i32 = 8 * 60;

pub const MINUTES_PER_HOUR: i64 = 60;

/// Monetary amounts leaving the engine are rounded to this many decimal places
pub const CURRENCY_SCALE: u32 = 2;

/// Largest magnitude a `NUMERIC(19, 4)` column holds, 999999999999999.9999
pub const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, 4);

/// Grants every permission
pub const PERMISSION_WILDCARD: &str = "*";

pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
