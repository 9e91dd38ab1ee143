//! Schema checks run before every product or order write.
//!
//! A payload that fails here never reaches the document store. Errors carry
//! the offending field and a message suitable for showing next to a form.

use core::fmt;

use url::Url;

use crate::models::{NewOrder, NewProduct, ProductPatch};
use crate::types::{Price, PriceError};

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All failures found in one payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", format_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self(vec![ValidationError::new(field, message)])
    }

    /// Whether any error concerns `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Message of the first error, for one-line notifications.
    #[must_use]
    pub fn first_message(&self) -> &str {
        self.0.first().map_or("Invalid input", |e| e.message.as_str())
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A payload that can be checked before it is written.
pub trait Validate {
    /// Check the payload.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

fn require_text(errors: &mut Vec<ValidationError>, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, format!("{label} is required")));
    }
}

fn require_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some());
    if !valid {
        errors.push(ValidationError::new(field, "Must be a valid URL"));
    }
}

impl Validate for NewProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", "Name", &self.name);
        require_text(&mut errors, "description", "Description", &self.description);
        require_text(&mut errors, "category", "Category", &self.category);
        require_url(&mut errors, "imageUrl", &self.image_url);
        ValidationErrors(errors).into_result()
    }
}

impl Validate for ProductPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            require_text(&mut errors, "name", "Name", name);
        }
        if let Some(description) = &self.description {
            require_text(&mut errors, "description", "Description", description);
        }
        if let Some(category) = &self.category {
            require_text(&mut errors, "category", "Category", category);
        }
        if let Some(image_url) = &self.image_url {
            require_url(&mut errors, "imageUrl", image_url);
        }
        ValidationErrors(errors).into_result()
    }
}

impl Validate for NewOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        if self.user_id.as_str().trim().is_empty() {
            errors.push(ValidationError::new("userId", "User is required"));
        }
        if self.items.is_empty() {
            errors.push(ValidationError::new("items", "Order must contain at least one item"));
        }
        for item in &self.items {
            if item.quantity < 1 {
                errors.push(ValidationError::new("items.quantity", "Quantity must be at least 1"));
            }
            if item.name.trim().is_empty() {
                errors.push(ValidationError::new("items.name", "Item name is required"));
            }
        }
        let expected: Price = self.items.iter().map(|item| item.line_total()).sum();
        if expected != self.total {
            errors.push(ValidationError::new(
                "total",
                format!("Total {} does not match items ({})", self.total.display(), expected.display()),
            ));
        }
        ValidationErrors(errors).into_result()
    }
}

/// Product form exactly as submitted: every field is raw text.
///
/// Parsing turns it into a [`NewProduct`] and runs the same checks as
/// [`Validate`], reporting number-format problems per field.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
    pub stock: String,
    pub is_featured: bool,
}

impl ProductDraft {
    /// Parse and validate the draft.
    ///
    /// # Errors
    ///
    /// Returns every field-level failure found.
    pub fn parse(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = Vec::new();

        let price = match self.price.parse::<Price>() {
            Ok(price) => Some(price),
            Err(PriceError::Negative) => {
                errors.push(ValidationError::new("price", "Price cannot be negative"));
                None
            }
            Err(PriceError::NotANumber) => {
                errors.push(ValidationError::new("price", "Price must be a number"));
                None
            }
        };

        let stock = match self.stock.trim().parse::<i64>() {
            Ok(n) if n < 0 => {
                errors.push(ValidationError::new("stock", "Stock cannot be negative"));
                None
            }
            Ok(n) => u32::try_from(n).map_or_else(
                |_| {
                    errors.push(ValidationError::new("stock", "Stock is too large"));
                    None
                },
                Some,
            ),
            Err(_) => {
                errors.push(ValidationError::new("stock", "Stock must be a whole number"));
                None
            }
        };

        let product = NewProduct {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: price.unwrap_or(Price::ZERO),
            category: self.category.trim().to_string(),
            image_url: self.image_url.trim().to_string(),
            stock: stock.unwrap_or(0),
            is_featured: Some(self.is_featured),
        };

        if let Err(ValidationErrors(more)) = product.validate() {
            errors.extend(more);
        }

        ValidationErrors(errors).into_result().map(|()| product)
    }
}
