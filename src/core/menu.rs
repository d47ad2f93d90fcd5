//! Menu business logic - grouping for display and admin form validation.
//!
//! Menu items are owned by the backend. The client only groups them by category for
//! display, looks them up by name when adding to a cart, and validates the admin form
//! before a create or update request is sent.

use crate::core::price::PriceValue;
use crate::errors::{Error, Field, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Category used for items the backend sent without one.
pub const FALLBACK_CATEGORY: &str = "others";

/// Largest accepted image upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A menu item as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Backend identifier
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Display name, unique within the menu
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Unit price, numeric or currency-formatted
    pub price: PriceValue,
    /// Category label, e.g. `"HOT COFFEE"`
    #[serde(default)]
    pub category: String,
    /// Image URL
    #[serde(default)]
    pub img: String,
}

/// Menu items of one category, in the order the backend listed them.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSection {
    /// Raw category key
    pub category: String,
    /// Items in this category
    pub items: Vec<MenuItem>,
}

impl MenuSection {
    /// Category as shown to customers.
    #[must_use]
    pub fn title(&self) -> String {
        display_category(&self.category)
    }
}

/// Groups items by category, keeping categories in first-seen order.
#[must_use]
pub fn group_by_category(items: Vec<MenuItem>) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = Vec::new();
    for item in items {
        let category = if item.category.trim().is_empty() {
            FALLBACK_CATEGORY.to_string()
        } else {
            item.category.clone()
        };

        match sections.iter_mut().find(|s| s.category == category) {
            Some(section) => section.items.push(item),
            None => sections.push(MenuSection {
                category,
                items: vec![item],
            }),
        }
    }
    sections
}

/// Category label with underscores shown as spaces.
#[must_use]
pub fn display_category(category: &str) -> String {
    category.replace('_', " ")
}

/// Finds an item by exact name, falling back to a case-insensitive match.
#[must_use]
pub fn find_item<'a>(items: &'a [MenuItem], name: &str) -> Option<&'a MenuItem> {
    let wanted = name.trim();
    items
        .iter()
        .find(|item| item.name == wanted)
        .or_else(|| items.iter().find(|item| item.name.eq_ignore_ascii_case(wanted)))
}

/// An image chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reads an image from disk, guessing its content type from the extension.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or an image validation error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

        let upload = Self {
            file_name,
            content_type,
            bytes,
        };
        upload.validate()?;
        Ok(upload)
    }

    /// Checks size and content type.
    ///
    /// # Errors
    /// Returns a [`Field::Image`] validation error.
    pub fn validate(&self) -> Result<()> {
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(Error::validation(
                Field::Image,
                "Image size should be less than 5MB",
            ));
        }
        if !self.content_type.starts_with("image/") {
            return Err(Error::validation(Field::Image, "Please upload an image file"));
        }
        Ok(())
    }
}

/// Raw admin form input for creating or editing a menu item.
#[derive(Debug, Clone, Default)]
pub struct MenuItemForm {
    /// Item name
    pub name: String,
    /// Description
    pub description: String,
    /// Price as typed
    pub price: String,
    /// Category
    pub category: String,
    /// Image, required when creating
    pub image: Option<ImageUpload>,
}

/// A form that passed validation and can be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMenuItem {
    /// Trimmed name
    pub name: String,
    /// Trimmed description
    pub description: String,
    /// Parsed price
    pub price: f64,
    /// Trimmed category
    pub category: String,
    /// Image to upload, if any
    pub image: Option<ImageUpload>,
}

impl MenuItemForm {
    /// Pre-fills the form from an existing item for editing.
    #[must_use]
    pub fn from_item(item: &MenuItem) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            price: item
                .price
                .amount()
                .map_or_else(|_| item.price.to_string(), |amount| amount.to_string()),
            category: item.category.clone(),
            image: None,
        }
    }

    /// Validates the form. `require_image` is set when creating a new item.
    ///
    /// # Errors
    /// Returns the first field-level validation error.
    pub fn validate(self, require_image: bool) -> Result<ValidMenuItem> {
        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .ok_or_else(|| Error::validation(Field::Price, "Please enter a valid price"))?;

        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation(Field::ItemName, "Item name is required"));
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(Error::validation(Field::Category, "Please choose a category"));
        }

        match &self.image {
            Some(image) => image.validate()?,
            None if require_image => {
                return Err(Error::validation(Field::Image, "Please select an image"));
            }
            None => {}
        }

        Ok(ValidMenuItem {
            name,
            description: self.description.trim().to_string(),
            price,
            category,
            image: self.image,
        })
    }
}
