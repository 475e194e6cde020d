use crate::validation::{self, FormErrors};
use garde::Validate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Product {
    /// Stock badge level used by the listing: plenty, low or critical.
    pub fn stock_level(&self) -> &'static str {
        match self.stock {
            s if s > 20 => "plenty",
            s if s > 5 => "low",
            _ => "critical",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Price and stock are range-checked while they are parsed, so only the
/// textual rules live on the struct.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ProductInput {
    #[garde(length(chars, min = 2))]
    pub name: String,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub price: Decimal,
    #[garde(skip)]
    pub stock: i64,
    #[garde(skip)]
    pub image_url: Option<String>,
}

const PRODUCT_MESSAGES: &[(&str, &str)] = &[("name", "Name must be at least 2 characters")];

impl ProductForm {
    pub fn validate(&self) -> Result<ProductInput, FormErrors> {
        let mut errors = FormErrors::new();

        let price = validation::positive_decimal(&mut errors, "price", &self.price);
        let stock = validation::non_negative_integer(&mut errors, "stock", &self.stock);

        // A failed parse has already recorded an error, so the zero
        // placeholders never leave this function.
        let input = ProductInput {
            name: self.name.trim().to_string(),
            description: validation::optional_text(&self.description),
            price: price.unwrap_or_default(),
            stock: stock.unwrap_or_default(),
            image_url: validation::optional_text(&self.image_url),
        };
        errors.absorb(input.validate(), PRODUCT_MESSAGES);

        errors.into_result(input)
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        ProductForm {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            csrf_token: String::new(),
        }
    }
}
