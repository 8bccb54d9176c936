use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Counter '{0}' cannot be negative (got {1})")]
    NegativeCounter(&'static str, Decimal),

    #[error("Counter '{field}' only accumulates: {attempted} is below the current total {current}")]
    CounterDecrease {
        field: &'static str,
        current: Decimal,
        attempted: Decimal,
    },
}
