//! Sell-item form: category catalog, draft editing and the create→sell flow.
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::Phase;
use crate::api::MarketApi;
use crate::display::{ImageHandle, ImageStore};
use crate::model::{Category, CategoryId, ImageFile, ItemId, NewItemForm};
use crate::notify::Notifier;
use crate::session::Credentials;

/// Category preselected before the catalog is known.
pub const DEFAULT_CATEGORY_ID: CategoryId = 1;
pub const LISTED_MESSAGE: &str = "Item added successfully!";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("unknown form field: {0}")]
    UnknownField(String),
    #[error("{field} must be a whole number, got {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftImage {
    Unset,
    File(ImageFile),
}

/// One field update. Applying it touches exactly that field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Name(String),
    CategoryId(CategoryId),
    Price(i64),
    Description(String),
}

impl DraftField {
    /// Map a form input `name`/`value` pair to a typed update.
    pub fn parse(name: &str, value: &str) -> Result<Self, DraftError> {
        match name {
            "name" => Ok(DraftField::Name(value.to_string())),
            "description" => Ok(DraftField::Description(value.to_string())),
            "price" => parse_number("price", value).map(DraftField::Price),
            "category_id" => parse_number("category_id", value).map(DraftField::CategoryId),
            other => Err(DraftError::UnknownField(other.to_string())),
        }
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<i64, DraftError> {
    value.trim().parse().map_err(|_| DraftError::NotANumber {
        field,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub name: String,
    pub category_id: CategoryId,
    pub price: i64,
    pub description: String,
    pub image: DraftImage,
}

impl Draft {
    pub fn initial(category_id: CategoryId) -> Self {
        Self {
            name: String::new(),
            category_id,
            price: 0,
            description: String::new(),
            image: DraftImage::Unset,
        }
    }

    pub fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Name(name) => self.name = name,
            DraftField::CategoryId(id) => self.category_id = id,
            DraftField::Price(price) => self.price = price,
            DraftField::Description(description) => self.description = description,
        }
    }

    /// Build the create payload, requiring the same inputs the form marks
    /// as required.
    pub fn to_form(&self) -> Result<NewItemForm, DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::Missing("name"));
        }
        if self.description.trim().is_empty() {
            return Err(DraftError::Missing("description"));
        }
        let image = match &self.image {
            DraftImage::File(file) => file.clone(),
            DraftImage::Unset => return Err(DraftError::Missing("image")),
        };
        Ok(NewItemForm {
            name: self.name.clone(),
            category_id: self.category_id.to_string(),
            price: self.price.to_string(),
            description: self.description.clone(),
            image,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Created and marked for sale.
    Listed { item_id: ItemId },
    /// Created, but marking it for sale failed. Finish with `sell`.
    CreatedUnlisted { item_id: ItemId },
    /// The server refused to create the item; the draft is untouched.
    CreateFailed,
    /// Required inputs are missing; nothing was sent.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    /// `None` shows the upload placeholder.
    pub preview: Option<String>,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub categories: Vec<CategoryOption>,
}

impl fmt::Display for ListingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.preview {
            Some(preview) => writeln!(f, "[image {}]", preview)?,
            None => writeln!(f, "[choose an image]")?,
        }
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Price: {}", self.price)?;
        writeln!(f, "Description: {}", self.description)?;
        write!(f, "Category:")?;
        for option in &self.categories {
            let mark = if option.selected { "*" } else { " " };
            write!(f, "\n {} {} {}", mark, option.id, option.name)?;
        }
        Ok(())
    }
}

pub struct ListingScreen {
    api: Arc<dyn MarketApi>,
    notifier: Arc<dyn Notifier>,
    images: ImageStore,
    phase: Phase,
    categories: Vec<Category>,
    draft: Draft,
    preview: Option<ImageHandle>,
}

impl fmt::Debug for ListingScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingScreen")
            .field("phase", &self.phase)
            .field("categories", &self.categories)
            .field("draft", &self.draft)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl ListingScreen {
    pub fn new(api: Arc<dyn MarketApi>, notifier: Arc<dyn Notifier>, images: ImageStore) -> Self {
        Self {
            api,
            notifier,
            images,
            phase: Phase::Loading,
            categories: Vec::new(),
            draft: Draft::initial(DEFAULT_CATEGORY_ID),
            preview: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn preview(&self) -> Option<&ImageHandle> {
        self.preview.as_ref()
    }

    fn default_category(&self) -> CategoryId {
        self.categories
            .first()
            .map(|c| c.id)
            .unwrap_or(DEFAULT_CATEGORY_ID)
    }

    /// Fetch the category catalog. Called once per screen.
    #[instrument(skip_all)]
    pub async fn load(&mut self) {
        match self.api.list_categories().await {
            Ok(categories) => {
                info!(count = categories.len(), "loaded categories");
                self.categories = categories;
                if self.draft.category_id == DEFAULT_CATEGORY_ID {
                    self.draft.category_id = self.default_category();
                }
                self.phase = Phase::Ready;
            }
            Err(err) => {
                warn!(?err, "GET categories failed");
                self.notifier.error(&err.message());
                self.phase = Phase::Failed;
            }
        }
    }

    pub fn set_field(&mut self, field: DraftField) {
        self.draft.apply(field);
    }

    /// Update from a form input. On error the draft is left as it was.
    pub fn set_field_by_name(&mut self, name: &str, value: &str) -> Result<(), DraftError> {
        let field = DraftField::parse(name, value)?;
        self.set_field(field);
        Ok(())
    }

    /// Choose the image to upload and refresh its preview.
    pub async fn select_image(&mut self, file: ImageFile) {
        // release the old preview before acquiring the new one
        self.preview = None;
        match self.images.acquire(&file.bytes).await {
            Ok(handle) => self.preview = Some(handle),
            Err(err) => {
                warn!(?err, file = %file.file_name, "failed to create image preview");
                self.notifier
                    .error(&format!("failed to preview {}: {}", file.file_name, err));
            }
        }
        self.draft.image = DraftImage::File(file);
    }

    pub fn view(&self) -> ListingView {
        ListingView {
            preview: self.preview.as_ref().map(ImageHandle::reference),
            name: self.draft.name.clone(),
            price: self.draft.price,
            description: self.draft.description.clone(),
            categories: self
                .categories
                .iter()
                .map(|c| CategoryOption {
                    id: c.id,
                    name: c.name.clone(),
                    selected: c.id == self.draft.category_id,
                })
                .collect(),
        }
    }

    /// Forget the draft and its preview.
    pub fn reset(&mut self) {
        self.draft = Draft::initial(self.default_category());
        self.preview = None;
    }

    /// Create the item from the draft, then mark it for sale.
    #[instrument(skip_all, fields(user_id = creds.user_id))]
    pub async fn submit(&mut self, creds: &Credentials) -> SubmitOutcome {
        let form = match self.draft.to_form() {
            Ok(form) => form,
            Err(err) => {
                warn!(%err, "draft incomplete");
                self.notifier.error(&err.to_string());
                return SubmitOutcome::Incomplete;
            }
        };

        let item_id = match self.api.create_item(creds, &form).await {
            Ok(id) => id,
            Err(err) => {
                warn!(?err, "POST items failed");
                self.notifier.error(&err.message());
                return SubmitOutcome::CreateFailed;
            }
        };
        info!(item_id, "item created");

        let outcome = self.sell(creds, item_id).await;
        self.reset();
        outcome
    }

    /// Mark an already created item for sale.
    #[instrument(skip_all, fields(item_id = item_id))]
    pub async fn sell(&self, creds: &Credentials, item_id: ItemId) -> SubmitOutcome {
        match self.api.sell(creds, item_id).await {
            Ok(()) => {
                info!("item listed for sale");
                self.notifier.success(LISTED_MESSAGE);
                SubmitOutcome::Listed { item_id }
            }
            Err(err) => {
                warn!(?err, "POST sell failed; item created but not listed");
                self.notifier.error(&err.message());
                SubmitOutcome::CreatedUnlisted { item_id }
            }
        }
    }
}
