use crate::error::ActionError;
use crate::models::{User, UserForm};
use crate::repositories::{RepositoryError, UserRepository};
use crate::services::view_cache::{ListingInvalidator, USERS_LISTING};
use crate::services::ActionResult;
use std::sync::Arc;
use tracing::{error, info};

/// User actions: validate, write once, mark the listing stale.
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    invalidator: Arc<dyn ListingInvalidator>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        invalidator: Arc<dyn ListingInvalidator>,
    ) -> Self {
        Self {
            repository,
            invalidator,
        }
    }

    pub async fn list_users(&self) -> ActionResult<Vec<User>> {
        self.repository.find_many().await.map_err(|e| {
            error!("Failed to load users: {}", e);
            ActionError::Persistence("Could not load users".to_string())
        })
    }

    pub async fn get_user(&self, id: i64) -> ActionResult<User> {
        match self.repository.find_by_id(id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ActionError::NotFound),
            Err(e) => {
                error!("Failed to load user {}: {}", id, e);
                Err(ActionError::Persistence("Could not load the user".to_string()))
            }
        }
    }

    pub async fn count_users(&self) -> ActionResult<i64> {
        self.repository.count().await.map_err(|e| {
            error!("Failed to count users: {}", e);
            ActionError::Persistence("Could not count users".to_string())
        })
    }

    pub async fn create_user(&self, form: &UserForm) -> ActionResult<User> {
        let input = form.validate().map_err(ActionError::Validation)?;

        match self.repository.create(input).await {
            Ok(user) => {
                info!("Created user {} ({})", user.id, user.email);
                self.invalidator.mark_stale(USERS_LISTING);
                Ok(user)
            }
            Err(e) => Err(persistence_error("create", e)),
        }
    }

    pub async fn update_user(&self, id: i64, form: &UserForm) -> ActionResult<User> {
        let input = form.validate().map_err(ActionError::Validation)?;

        match self.repository.update(id, input).await {
            Ok(user) => {
                info!("Updated user {}", user.id);
                self.invalidator.mark_stale(USERS_LISTING);
                Ok(user)
            }
            Err(RepositoryError::NotFound) => Err(ActionError::NotFound),
            Err(e) => Err(persistence_error("update", e)),
        }
    }

    pub async fn delete_user(&self, id: i64) -> ActionResult<()> {
        match self.repository.delete(id).await {
            Ok(()) => {
                info!("Deleted user {}", id);
                self.invalidator.mark_stale(USERS_LISTING);
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(ActionError::NotFound),
            Err(e) => Err(persistence_error("delete", e)),
        }
    }
}

fn persistence_error(verb: &str, err: RepositoryError) -> ActionError {
    error!("Failed to {} user: {}", verb, err);
    match err {
        RepositoryError::AlreadyExists => {
            ActionError::Persistence("A user with this email already exists.".to_string())
        }
        _ => ActionError::Persistence(format!("Could not {} the user.", verb)),
    }
}
