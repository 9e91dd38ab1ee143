//! Order repository.

use chrono::SecondsFormat;
use oussaili_core::{NewOrder, Order, OrderId, OrderStatus, UserId, Validate};
use serde_json::Value;
use tracing::instrument;

use super::{RepositoryError, decode, not_found};
use crate::documents::{Collection, Direction, DocumentStore, Fields, Query, to_fields};

/// Repository for the `orders` collection.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Validate and insert an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the order is invalid (empty,
    /// zero quantities, or a total that disagrees with its lines).
    #[instrument(skip(self, order), fields(user_id = %order.user_id, total = %order.total))]
    pub async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        order.validate()?;

        let mut fields = to_fields(&order)?;
        // Fixed-width timestamps keep string ordering chronological.
        fields.insert(
            "createdAt".to_string(),
            Value::String(order.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let id = self.store.create(Collection::Orders, fields).await?;
        tracing::info!(order_id = %id, "Order placed");
        Ok(Order::from_parts(OrderId::new(id), order))
    }

    /// Orders visible to a viewer, newest first.
    ///
    /// Administrators see every order; everyone else sees their own.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_visible(
        &self,
        user_id: &UserId,
        is_admin: bool,
    ) -> Result<Vec<Order>, RepositoryError> {
        let query = if is_admin {
            Query::all()
        } else {
            Query::all().where_eq("userId", user_id.as_str())
        };
        self.list(query.order_by("createdAt", Direction::Descending))
            .await
    }

    async fn list(&self, query: Query) -> Result<Vec<Order>, RepositoryError> {
        self.store
            .list(Collection::Orders, &query)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.store
            .get(Collection::Orders, id.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    /// Move an order to `status`. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let mut fields = Fields::new();
        fields.insert("status".to_string(), Value::String(status.as_str().to_string()));
        self.store
            .update(Collection::Orders, id.as_str(), fields)
            .await
            .map_err(not_found)?;
        tracing::info!("Order status updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, Utc};
    use oussaili_core::{Email, OrderItem, PaymentMethod, Price, ProductId};

    use super::*;
    use crate::documents::MemoryDocumentStore;

    fn order(user: &str, minutes_ago: i64) -> NewOrder {
        let item = OrderItem {
            product_id: ProductId::new("p1"),
            name: "Lamp".to_string(),
            price: Price::from_cents(1000),
            quantity: 2,
            image_url: None,
        };
        NewOrder {
            user_id: UserId::new(user),
            user_email: Email::parse("a@b.co").unwrap(),
            total: item.line_total(),
            items: vec![item],
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::OrangeMoney,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_customer_sees_own_orders_newest_first() {
        let store = MemoryDocumentStore::new();
        let repo = OrderRepository::new(&store);
        let old = repo.create(order("u1", 30)).await.unwrap();
        let new = repo.create(order("u1", 1)).await.unwrap();
        repo.create(order("u2", 5)).await.unwrap();

        let mine = repo.list_visible(&UserId::new("u1"), false).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![new.id, old.id]);

        let all = repo.list_visible(&UserId::new("admin"), true).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_mismatched_total_rejected() {
        let store = MemoryDocumentStore::new();
        let repo = OrderRepository::new(&store);
        let bad = NewOrder {
            total: Price::from_cents(1),
            ..order("u1", 0)
        };
        assert!(matches!(repo.create(bad).await, Err(RepositoryError::Validation(_))));
    }

    #[tokio::test]
    async fn test_status_can_move_backwards() {
        let store = MemoryDocumentStore::new();
        let repo = OrderRepository::new(&store);
        let placed = repo.create(order("u1", 0)).await.unwrap();

        repo.update_status(&placed.id, OrderStatus::Delivered).await.unwrap();
        repo.update_status(&placed.id, OrderStatus::Processing).await.unwrap();
        let stored = repo.get(&placed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.payment_method, PaymentMethod::OrangeMoney);

        let err = repo
            .update_status(&OrderId::new("ghost"), OrderStatus::Shipped)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
