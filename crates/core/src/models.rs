//! Documents stored in the hosted collections (`products`, `orders`, `users`).
//!
//! Field names follow the camelCase wire format of the document store. The
//! document id never lives inside the document body; repositories attach it
//! when reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, OrderId, OrderStatus, PaymentMethod, Price, ProductId, Role, UserId};

/// Stock level below which the storefront shows an "only N left" hint.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// A catalogue product.
///
/// Immutable from the storefront's point of view; only administrators edit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

/// Stock hint shown next to a product. Purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockHint {
    InStock,
    Low(u32),
    OutOfStock,
}

impl Product {
    /// Attach a document id to a product body.
    #[must_use]
    pub fn from_parts(id: ProductId, body: NewProduct) -> Self {
        Self {
            id,
            name: body.name,
            description: body.description,
            price: body.price,
            category: body.category,
            image_url: body.image_url,
            stock: body.stock,
            is_featured: body.is_featured,
        }
    }

    /// Stock hint for display.
    #[must_use]
    pub const fn stock_hint(&self) -> StockHint {
        match self.stock {
            0 => StockHint::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockHint::Low(n),
            _ => StockHint::InStock,
        }
    }

    #[must_use]
    pub fn featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }
}

/// Product create payload (a product without its id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

/// Partial product update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl ProductPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
            && self.stock.is_none()
            && self.is_featured.is_none()
    }
}

impl From<NewProduct> for ProductPatch {
    fn from(product: NewProduct) -> Self {
        Self {
            name: Some(product.name),
            description: Some(product.description),
            price: Some(product.price),
            category: Some(product.category),
            image_url: Some(product.image_url),
            stock: Some(product.stock),
            is_featured: product.is_featured,
        }
    }
}

/// One line of an order, captured at checkout time.
///
/// Later product edits never change an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Order create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn from_parts(id: OrderId, body: NewOrder) -> Self {
        Self {
            id,
            user_id: body.user_id,
            user_email: body.user_email,
            items: body.items,
            total: body.total,
            status: body.status,
            payment_method: body.payment_method,
            created_at: body.created_at,
        }
    }
}

/// Profile document in the `users` collection, keyed by the auth provider's uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(
        default,
        rename = "photoURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
}

impl UserProfile {
    /// Display name used when the provider supplied none.
    pub const DEFAULT_DISPLAY_NAME: &'static str = "User";

    /// Profile created lazily on first sign-in.
    #[must_use]
    pub fn new_customer(
        id: UserId,
        email: Email,
        display_name: Option<String>,
        photo_url: Option<String>,
    ) -> Self {
        Self {
            id,
            email,
            display_name: Some(
                display_name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| Self::DEFAULT_DISPLAY_NAME.to_string()),
            ),
            role: Role::Customer,
            photo_url,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(Self::DEFAULT_DISPLAY_NAME)
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            price: Price::from_cents(2500),
            category: "Home".to_string(),
            image_url: "https://img.example.com/lamp.png".to_string(),
            stock,
            is_featured: None,
        }
    }

    #[test]
    fn test_stock_hint() {
        assert_eq!(product(0).stock_hint(), StockHint::OutOfStock);
        assert_eq!(product(3).stock_hint(), StockHint::Low(3));
        assert_eq!(product(5).stock_hint(), StockHint::InStock);
    }

    #[test]
    fn test_product_wire_format_is_camel_case() {
        let json = serde_json::to_value(product(2)).unwrap();
        assert_eq!(json["imageUrl"], "https://img.example.com/lamp.png");
        assert_eq!(json["price"], 25.0);
        assert!(json.get("isFeatured").is_none());
    }

    #[test]
    fn test_profile_reads_legacy_document() {
        let doc = serde_json::json!({
            "id": "uid-1",
            "email": "shopper@example.com",
            "photoURL": "https://img.example.com/me.png"
        });
        let profile: UserProfile = serde_json::from_value(doc).unwrap();
        assert_eq!(profile.role, Role::Customer);
        assert_eq!(profile.display_name(), "User");
        assert!(profile.photo_url.is_some());
    }

    #[test]
    fn test_new_customer_defaults_display_name() {
        let email = Email::parse("a@b.co").unwrap();
        let profile = UserProfile::new_customer(UserId::new("u"), email, Some("  ".into()), None);
        assert_eq!(profile.display_name(), "User");
        assert!(!profile.is_admin());
    }

    #[test]
    fn test_order_without_payment_method_defaults() {
        let doc = serde_json::json!({
            "id": "o1",
            "userId": "u1",
            "userEmail": "a@b.co",
            "items": [],
            "total": 0,
            "status": "shipped",
            "createdAt": "2025-01-02T03:04:05Z"
        });
        let order: Order = serde_json::from_value(doc).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(order.status, OrderStatus::Shipped);
    }
}
