use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub type ItemId = i64;
pub type CategoryId = i64;
pub type UserId = i64;

/// Sale status of an item. Only the server moves an item between states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum ItemStatus {
    Initial,
    OnSale,
    SoldOut,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Initial => "initial",
            ItemStatus::OnSale => "on_sale",
            ItemStatus::SoldOut => "sold_out",
        }
    }
}

impl TryFrom<u8> for ItemStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ItemStatus::Initial),
            1 => Ok(ItemStatus::OnSale),
            2 => Ok(ItemStatus::SoldOut),
            other => Err(format!("unknown item status {}", other)),
        }
    }
}

impl From<ItemStatus> for u8 {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Initial => 0,
            ItemStatus::OnSale => 1,
            ItemStatus::SoldOut => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub user_id: UserId,
    pub price: i64,
    pub status: ItemStatus,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A user-chosen image file waiting to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = content_type(Path::new(&file_name));
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read an image from disk, keeping only its file name for the upload.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }
}

pub fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// One named part of the multipart create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(ImageFile),
}

/// Wire payload of `POST /items`. Numbers travel as their decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItemForm {
    pub name: String,
    pub category_id: String,
    pub price: String,
    pub description: String,
    pub image: ImageFile,
}

impl NewItemForm {
    /// The form parts in the order they are sent.
    pub fn parts(&self) -> Vec<(&'static str, FormValue)> {
        vec![
            ("name", FormValue::Text(self.name.clone())),
            ("category_id", FormValue::Text(self.category_id.clone())),
            ("price", FormValue::Text(self.price.clone())),
            ("description", FormValue::Text(self.description.clone())),
            ("image", FormValue::File(self.image.clone())),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedItem {
    pub id: ItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SellRequest {
    pub item_id: ItemId,
}
