//! Status enums for orders and payments.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Orders start as `Pending` at checkout; only administrators move them
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
    ];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }

    /// Capitalized label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How the shopper intends to pay.
///
/// No gateway is integrated: mobile-money orders only show manual transfer
/// instructions, and the administrator confirms payment out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    OrangeMoney,
    LonestarMoney,
}

impl PaymentMethod {
    /// Every payment method offered at checkout.
    pub const ALL: [Self; 3] = [Self::CashOnDelivery, Self::OrangeMoney, Self::LonestarMoney];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::OrangeMoney => "orange_money",
            Self::LonestarMoney => "lonestar_money",
        }
    }

    /// Human-readable label (wire name with spaces).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash on delivery",
            Self::OrangeMoney => "orange money",
            Self::LonestarMoney => "lonestar money",
        }
    }

    /// Manual transfer instructions, for mobile-money methods only.
    #[must_use]
    pub const fn instructions(self) -> Option<&'static str> {
        match self {
            Self::CashOnDelivery => None,
            Self::OrangeMoney => Some(
                "Send the order total via Orange Money and include your order number \
                 as the transfer reference. We confirm payment before shipping.",
            ),
            Self::LonestarMoney => Some(
                "Send the order total via Lonestar MTN Mobile Money and include your order \
                 number as the transfer reference. We confirm payment before shipping.",
            ),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("invalid payment method: {s}"))
    }
}
