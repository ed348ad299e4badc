//! Category management

use std::sync::Arc;

use crate::errors::{FintrackError, Result};
use crate::storage::{Category, CategoryKind, NewCategory, SeaOrmStorage};
use crate::utils::validators::{normalize_color, normalize_name};

pub const CATEGORY_NAME_MAX: usize = 64;

#[derive(Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
    pub kind: CategoryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryRequest {
    fn validate(self) -> Result<NewCategory> {
        let name = normalize_name(&self.name, "Category name", CATEGORY_NAME_MAX)?;
        let color = self
            .color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(normalize_color)
            .transpose()?;
        let icon = self
            .icon
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        if icon.as_ref().is_some_and(|i| i.chars().count() > 64) {
            return Err(FintrackError::validation(
                "Icon must be at most 64 characters",
            ));
        }

        Ok(NewCategory {
            name,
            kind: self.kind,
            color,
            icon,
        })
    }
}

pub struct CategoryService {
    storage: Arc<SeaOrmStorage>,
}

impl CategoryService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list(&self, user_id: i64, kind: Option<CategoryKind>) -> Result<Vec<Category>> {
        self.storage.list_categories(user_id, kind).await
    }

    pub async fn get(&self, user_id: i64, id: i64) -> Result<Category> {
        self.storage
            .get_category(user_id, id)
            .await?
            .ok_or_else(|| FintrackError::not_found(format!("Category {} not found", id)))
    }

    pub async fn create(&self, user_id: i64, req: CategoryRequest) -> Result<Category> {
        let new = req.validate()?;
        self.ensure_name_free(user_id, &new, None).await?;
        self.storage.create_category(user_id, new).await
    }

    pub async fn update(&self, user_id: i64, id: i64, req: CategoryRequest) -> Result<Category> {
        let new = req.validate()?;
        self.get(user_id, id).await?;
        self.ensure_name_free(user_id, &new, Some(id)).await?;
        self.storage.update_category(user_id, id, new).await
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> Result<()> {
        self.storage.delete_category(user_id, id).await
    }

    /// Names are unique per user and kind, ignoring case
    async fn ensure_name_free(
        &self,
        user_id: i64,
        new: &NewCategory,
        except_id: Option<i64>,
    ) -> Result<()> {
        match self
            .storage
            .find_category_by_name(user_id, new.kind, &new.name)
            .await?
        {
            Some(existing) if Some(existing.id) != except_id => Err(FintrackError::conflict(
                format!("A {} category named \"{}\" already exists", new.kind, existing.name),
            )),
            _ => Ok(()),
        }
    }
}
