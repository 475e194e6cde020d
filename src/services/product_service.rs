use crate::error::ActionError;
use crate::models::{Product, ProductForm};
use crate::repositories::{ProductRepository, RepositoryError};
use crate::services::view_cache::{ListingInvalidator, PRODUCTS_LISTING};
use crate::services::ActionResult;
use std::sync::Arc;
use tracing::{error, info};

pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    invalidator: Arc<dyn ListingInvalidator>,
}

impl ProductService {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        invalidator: Arc<dyn ListingInvalidator>,
    ) -> Self {
        Self {
            repository,
            invalidator,
        }
    }

    pub async fn list_products(&self) -> ActionResult<Vec<Product>> {
        self.repository.find_many().await.map_err(|e| {
            error!("Failed to load products: {}", e);
            ActionError::Persistence("Could not load products".to_string())
        })
    }

    pub async fn get_product(&self, id: i64) -> ActionResult<Product> {
        match self.repository.find_by_id(id).await {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(ActionError::NotFound),
            Err(e) => {
                error!("Failed to load product {}: {}", id, e);
                Err(ActionError::Persistence(
                    "Could not load the product".to_string(),
                ))
            }
        }
    }

    pub async fn count_products(&self) -> ActionResult<i64> {
        self.repository.count().await.map_err(|e| {
            error!("Failed to count products: {}", e);
            ActionError::Persistence("Could not count products".to_string())
        })
    }

    pub async fn create_product(&self, form: &ProductForm) -> ActionResult<Product> {
        let input = form.validate().map_err(ActionError::Validation)?;

        match self.repository.create(input).await {
            Ok(product) => {
                info!("Created product {} ({})", product.id, product.name);
                self.invalidator.mark_stale(PRODUCTS_LISTING);
                Ok(product)
            }
            Err(e) => {
                error!("Failed to create product: {}", e);
                Err(ActionError::Persistence(
                    "Could not create the product.".to_string(),
                ))
            }
        }
    }

    pub async fn update_product(&self, id: i64, form: &ProductForm) -> ActionResult<Product> {
        let input = form.validate().map_err(ActionError::Validation)?;

        match self.repository.update(id, input).await {
            Ok(product) => {
                info!("Updated product {}", product.id);
                self.invalidator.mark_stale(PRODUCTS_LISTING);
                Ok(product)
            }
            Err(RepositoryError::NotFound) => Err(ActionError::NotFound),
            Err(e) => {
                error!("Failed to update product {}: {}", id, e);
                Err(ActionError::Persistence(
                    "Could not update the product.".to_string(),
                ))
            }
        }
    }

    pub async fn delete_product(&self, id: i64) -> ActionResult<()> {
        match self.repository.delete(id).await {
            Ok(()) => {
                info!("Deleted product {}", id);
                self.invalidator.mark_stale(PRODUCTS_LISTING);
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ActionError::NotFound),
            Err(e) => {
                error!("Failed to delete product {}: {}", id, e);
                Err(ActionError::Persistence(
                    "Could not delete the product.".to_string(),
                ))
            }
        }
    }
}
