mod bet;
mod constants;
mod report;
mod token;
mod volatility;

pub use bet::{parse_amount, Bet};
pub use constants::*;
pub use report::{OutcomeReport, ReportKind};
pub use token::{Token, TokenError, TokenPayload};
pub use volatility::{ValidationError, VolatilityLevel};

#[cfg(test)]
mod tests;
