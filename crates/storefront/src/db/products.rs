//! Product repository.

use oussaili_core::{NewProduct, Product, ProductId, ProductPatch, Validate};
use tracing::instrument;

use super::{RepositoryError, decode, not_found};
use crate::documents::{Collection, DocumentStore, Query, to_fields};

/// Repository for the `products` collection.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every product in the catalogue, in store order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.list_in(None).await
    }

    /// Products in one category (equality match), or every product when
    /// `category` is `None`. Order is whatever the store returns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_in(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let query = match category {
            Some(category) => Query::all().where_eq("category", category),
            None => Query::all(),
        };
        let documents = self.store.list(Collection::Products, &query).await?;
        documents.into_iter().map(decode).collect()
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .get(Collection::Products, id.as_str())
            .await?
            .map(decode)
            .transpose()
    }

    /// Validate and insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the payload is invalid.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        product.validate()?;
        let id = self
            .store
            .create(Collection::Products, to_fields(&product)?)
            .await?;
        tracing::info!(product_id = %id, "Product created");
        Ok(Product::from_parts(ProductId::new(id), product))
    }

    /// Validate and merge a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the patch is invalid and
    /// `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<(), RepositoryError> {
        patch.validate()?;
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update(Collection::Products, id.as_str(), to_fields(&patch)?)
            .await
            .map_err(not_found)
    }

    /// Delete a product. Past orders keep their own copy of its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the delete fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.store.delete(Collection::Products, id.as_str()).await?;
        tracing::info!("Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use oussaili_core::Price;

    use super::*;
    use crate::documents::MemoryDocumentStore;

    fn lamp() -> NewProduct {
        NewProduct {
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            price: Price::from_cents(2500),
            category: "Home".to_string(),
            image_url: "https://img.example.com/lamp.png".to_string(),
            stock: 3,
            is_featured: Some(true),
        }
    }

    #[tokio::test]
    async fn test_create_get_update_delete() {
        let store = MemoryDocumentStore::new();
        let repo = ProductRepository::new(&store);

        let created = repo.create(lamp()).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let patch = ProductPatch {
            stock: Some(0),
            ..ProductPatch::default()
        };
        repo.update(&created.id, patch).await.unwrap();
        assert_eq!(repo.get(&created.id).await.unwrap().unwrap().stock, 0);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_product_never_written() {
        let store = MemoryDocumentStore::new();
        let repo = ProductRepository::new(&store);
        let bad = NewProduct {
            image_url: "nope".to_string(),
            ..lamp()
        };
        assert!(matches!(repo.create(bad).await, Err(RepositoryError::Validation(_))));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let store = MemoryDocumentStore::new();
        let repo = ProductRepository::new(&store);
        let patch = ProductPatch {
            name: Some("Renamed".to_string()),
            ..ProductPatch::default()
        };
        let err = repo.update(&ProductId::new("ghost"), patch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_keeps_store_order() {
        let store = MemoryDocumentStore::new();
        let repo = ProductRepository::new(&store);
        for name in ["kettle", "Apron", "lamp"] {
            repo.create(NewProduct {
                name: name.to_string(),
                ..lamp()
            })
            .await
            .unwrap();
        }
        let stored: Vec<String> = store
            .list(Collection::Products, &Query::all())
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        let listed: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.as_str().to_string())
            .collect();
        assert_eq!(listed, stored);
        assert_eq!(listed.len(), 3);
    }

    #[tokio::test]
    async fn test_list_in_category() {
        let store = MemoryDocumentStore::new();
        let repo = ProductRepository::new(&store);
        repo.create(lamp()).await.unwrap();
        repo.create(NewProduct {
            name: "Scarf".to_string(),
            category: "Clothing".to_string(),
            ..lamp()
        })
        .await
        .unwrap();

        let clothing = repo.list_in(Some("Clothing")).await.unwrap();
        assert_eq!(clothing.len(), 1);
        assert_eq!(clothing[0].name, "Scarf");
        assert!(repo.list_in(Some("Toys")).await.unwrap().is_empty());
        assert_eq!(repo.list_in(None).await.unwrap().len(), 2);
    }
}
