//! Home page route handler: the product catalogue.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use oussaili_core::Product;
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::middleware::PageContext;
use crate::routes::products::ProductView;
use crate::state::AppState;

/// Category tabs, in display order. `All` disables the filter.
pub const CATEGORIES: [&str; 5] = ["All", "Electronics", "Clothing", "Accessories", "Home"];

const ALL_CATEGORIES: &str = "All";

/// Catalogue filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogueQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl CatalogueQuery {
    /// Category to filter on, if any.
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// Trimmed search text, if any.
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Keep products whose name contains `needle`, ignoring case.
#[must_use]
pub fn search_by_name(products: Vec<Product>, needle: &str) -> Vec<Product> {
    let needle = needle.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect()
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub products: Vec<ProductView>,
    pub categories: Vec<String>,
    pub selected_category: String,
    pub search: String,
}

/// Display the catalogue, optionally filtered by category and name.
#[instrument(skip(state, page))]
pub async fn home(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<CatalogueQuery>,
) -> Result<HomeTemplate> {
    let category = query.category();
    let mut products = ProductRepository::new(state.store()).list_in(category).await?;
    if let Some(needle) = query.search() {
        products = search_by_name(products, needle);
    }

    Ok(HomeTemplate {
        page,
        products: products.iter().map(ProductView::from).collect(),
        categories: CATEGORIES.iter().map(ToString::to_string).collect(),
        selected_category: category.unwrap_or(ALL_CATEGORIES).to_string(),
        search: query.search().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use oussaili_core::{Price, ProductId};

    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::new(name),
            name: name.to_string(),
            description: "test".to_string(),
            price: Price::from_cents(100),
            category: "Home".to_string(),
            image_url: "https://img.example.com/x.png".to_string(),
            stock: 1,
            is_featured: None,
        }
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let products = vec![product("Desk Lamp"), product("Lampshade"), product("Kettle")];
        let names: Vec<_> = search_by_name(products, "LAMP")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Desk Lamp", "Lampshade"]);
    }

    #[test]
    fn test_all_disables_category_filter() {
        let query = CatalogueQuery {
            category: Some("All".to_string()),
            q: Some("   ".to_string()),
        };
        assert_eq!(query.category(), None);
        assert_eq!(query.search(), None);

        let query = CatalogueQuery {
            category: Some("Clothing".to_string()),
            q: Some(" scarf ".to_string()),
        };
        assert_eq!(query.category(), Some("Clothing"));
        assert_eq!(query.search(), Some("scarf"));
    }
}
