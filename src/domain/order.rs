use serde::{Deserialize, Serialize};

use crate::helpers::{GREEN, RED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Display class: buys are green, sells red.
    pub fn class(&self) -> &'static str {
        match self {
            Side::Buy => GREEN,
            Side::Sell => RED,
        }
    }

    /// Balance direction from the viewer's perspective.
    pub fn sign(&self) -> &'static str {
        match self {
            Side::Buy => "+",
            Side::Sell => "-",
        }
    }
}
