//! Product catalogue commands.
//!
//! Seeding reads a YAML file shaped like:
//!
//! ```yaml
//! products:
//!   - name: Wireless Earbuds
//!     description: Bluetooth 5.3, 24h battery
//!     price: 49.99
//!     category: Electronics
//!     imageUrl: https://example.com/earbuds.jpg
//!     stock: 40
//!     isFeatured: true
//! ```
//!
//! Every entry is validated before the first write, so a bad file leaves the
//! catalogue untouched.

use std::collections::HashSet;
use std::path::Path;

use oussaili_core::{NewProduct, Product, Validate, ValidationErrors};
use oussaili_storefront::db::{ProductRepository, RepositoryError};
use oussaili_storefront::documents::DocumentStore;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Error)]
pub enum ProductsError {
    /// Seed file could not be read.
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid YAML for the expected shape.
    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An entry failed validation.
    #[error("Product #{index} ({name}) is invalid: {errors}")]
    Invalid {
        index: usize,
        name: String,
        errors: ValidationErrors,
    },

    /// Document store call failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Top-level shape of a seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<NewProduct>,
}

/// Outcome of a seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Log every product.
///
/// # Errors
///
/// Returns `ProductsError::Repository` if the catalogue cannot be read.
pub async fn list(store: &dyn DocumentStore) -> Result<Vec<Product>, ProductsError> {
    let products = ProductRepository::new(store).list().await?;
    for product in &products {
        tracing::info!(
            id = %product.id,
            category = %product.category,
            price = %product.price.display(),
            stock = product.stock,
            "{}",
            product.name
        );
    }
    tracing::info!(count = products.len(), "Listed products");
    Ok(products)
}

/// Parse the seed file at `path` and create its products.
///
/// # Errors
///
/// Returns `ProductsError` if the file cannot be read or parsed, or if any
/// entry is invalid.
pub async fn seed_from_file(
    store: &dyn DocumentStore,
    path: impl AsRef<Path>,
    skip_existing: bool,
) -> Result<SeedSummary, ProductsError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "Reading seed file");
    let contents = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&contents)?;
    seed_products(store, seed.products, skip_existing).await
}

/// Create `products`, optionally skipping names already in the catalogue.
///
/// # Errors
///
/// Returns `ProductsError::Invalid` before any write if an entry fails
/// validation.
pub async fn seed_products(
    store: &dyn DocumentStore,
    products: Vec<NewProduct>,
    skip_existing: bool,
) -> Result<SeedSummary, ProductsError> {
    for (index, product) in products.iter().enumerate() {
        product.validate().map_err(|errors| ProductsError::Invalid {
            index: index + 1,
            name: product.name.clone(),
            errors,
        })?;
    }

    let repo = ProductRepository::new(store);
    let existing: HashSet<String> = if skip_existing {
        repo.list().await?.into_iter().map(|p| p.name).collect()
    } else {
        HashSet::new()
    };

    let mut summary = SeedSummary::default();
    for product in products {
        if existing.contains(&product.name) {
            tracing::debug!(name = %product.name, "Skipping existing product");
            summary.skipped += 1;
            continue;
        }
        repo.create(product).await?;
        summary.created += 1;
    }
    Ok(summary)
}
