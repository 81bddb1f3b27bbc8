//! Operator Commands
//!
//! Line-oriented command surface. Each line is either a menu number or a
//! keyword, optionally followed by arguments:
//!
//! | Input | Command |
//! |-------|---------|
//! | `0`, `quit`, `exit` | stop the gateway |
//! | `1`, `positions` | request positions for every account |
//! | `2`, `subscribe [SYM...]` | subscribe (default: configured symbols) |
//! | `3`, `unsubscribe [SYM...]` | unsubscribe (default: all active) |
//! | `4`, `order [buy\|sell] [SYMBOL] [QTY]` | market order per account |
//! | `ready` | mark discovery complete |
//! | `status` | print a state snapshot |

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::requests::{MarketOrderParams, OrderSide};

/// Command parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank input line.
    #[error("empty command")]
    Empty,

    /// Unrecognised command word.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// Order side other than buy/sell.
    #[error("invalid side: {0} (expected buy or sell)")]
    InvalidSide(String),

    /// Quantity that is not a positive decimal.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// More arguments than the command accepts.
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Overrides for a market order; missing parts fall back to configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderOverrides {
    /// Side override.
    pub side: Option<OrderSide>,
    /// Symbol override.
    pub symbol: Option<String>,
    /// Quantity override.
    pub quantity: Option<Decimal>,
}

impl OrderOverrides {
    /// Apply the overrides on top of the configured order.
    #[must_use]
    pub fn apply(self, defaults: &MarketOrderParams) -> MarketOrderParams {
        MarketOrderParams {
            symbol: self.symbol.unwrap_or_else(|| defaults.symbol.clone()),
            side: self.side.unwrap_or(defaults.side),
            quantity: self.quantity.unwrap_or(defaults.quantity),
        }
    }
}

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stop the gateway.
    Quit,
    /// Request positions.
    Positions,
    /// Subscribe symbols (empty: configured set).
    Subscribe(Vec<String>),
    /// Unsubscribe symbols (empty: all active).
    Unsubscribe(Vec<String>),
    /// Market order.
    Order(OrderOverrides),
    /// Complete discovery.
    Ready,
    /// Print status.
    Status,
}

impl Command {
    /// Parse one input line.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` for blank, unknown or malformed input.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "0" | "quit" | "exit" => Self::Quit,
            "1" | "positions" => Self::Positions,
            "2" | "subscribe" => Self::Subscribe(symbols(&args)),
            "3" | "unsubscribe" => Self::Unsubscribe(symbols(&args)),
            "4" | "order" => Self::Order(parse_order(&args)?),
            "ready" => Self::Ready,
            "status" => Self::Status,
            _ => return Err(CommandError::Unknown(head.to_string())),
        };

        let takes_args = matches!(
            command,
            Self::Subscribe(_) | Self::Unsubscribe(_) | Self::Order(_)
        );
        match args.first() {
            Some(extra) if !takes_args => {
                Err(CommandError::UnexpectedArgument((*extra).to_string()))
            }
            _ => Ok(command),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn symbols(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_ascii_uppercase()).collect()
}

fn parse_order(args: &[&str]) -> Result<OrderOverrides, CommandError> {
    let mut overrides = OrderOverrides::default();
    let mut rest = args.iter();

    if let Some(side) = rest.next() {
        overrides.side = Some(match side.to_ascii_lowercase().as_str() {
            "buy" | "b" => OrderSide::Buy,
            "sell" | "s" => OrderSide::Sell,
            other => return Err(CommandError::InvalidSide(other.to_string())),
        });
    }
    if let Some(symbol) = rest.next() {
        overrides.symbol = Some(symbol.to_ascii_uppercase());
    }
    if let Some(quantity) = rest.next() {
        let parsed = Decimal::from_str(quantity)
            .ok()
            .filter(|q| q.is_sign_positive() && !q.is_zero())
            .ok_or_else(|| CommandError::InvalidQuantity((*quantity).to_string()))?;
        overrides.quantity = Some(parsed);
    }
    if let Some(extra) = rest.next() {
        return Err(CommandError::UnexpectedArgument((*extra).to_string()));
    }
    Ok(overrides)
}
