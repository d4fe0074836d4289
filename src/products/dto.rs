use serde::Deserialize;

use crate::error::{ApiError, FieldError};

/// Body shared by create and update: all three fields are required, and
/// update always writes all of them (no partial updates).
#[derive(Debug, Deserialize)]
pub struct ProductBody {
    pub name: String,
    pub description: String,
    pub amount: i64,
}

impl ProductBody {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        let name_len = self.name.trim().chars().count();
        if name_len == 0 {
            errors.push(FieldError::new("name", "Name is required"));
        } else if name_len > 255 {
            errors.push(FieldError::new(
                "name",
                "Name must be at most 255 characters",
            ));
        }
        let description_len = self.description.trim().chars().count();
        if description_len == 0 {
            errors.push(FieldError::new("description", "Description is required"));
        } else if description_len > 500 {
            errors.push(FieldError::new(
                "description",
                "Description must be at most 500 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}
