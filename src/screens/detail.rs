//! Item detail and purchase screen.
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::Phase;
use crate::api::MarketApi;
use crate::display::{ImageHandle, ImageStore};
use crate::model::{Item, ItemId, ItemStatus, UserId};
use crate::notify::Notifier;
use crate::route::Route;
use crate::session::Credentials;

/// Inline error shown under the button after a rejected purchase.
pub const PURCHASE_REJECTED: &str = "This item is listed by you!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseButton {
    pub label: &'static str,
    pub disabled: bool,
}

impl PurchaseButton {
    pub fn for_status(status: ItemStatus) -> Self {
        match status {
            ItemStatus::SoldOut => Self {
                label: "SoldOut",
                disabled: true,
            },
            ItemStatus::Initial | ItemStatus::OnSale => Self {
                label: "Purchase",
                disabled: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub image: String,
    /// Clicking the image leads back to this item's own page.
    pub image_link: Route,
    pub name: String,
    pub price: i64,
    pub user_id: UserId,
    pub category_name: String,
    pub description: String,
    pub purchase: PurchaseButton,
    pub error_message: Option<String>,
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[image {} -> {}]", self.image, self.image_link)?;
        writeln!(f, "Item Name: {}", self.name)?;
        writeln!(f, "Price: {}", self.price)?;
        writeln!(f, "UserID: {}", self.user_id)?;
        writeln!(f, "Category: {}", self.category_name)?;
        writeln!(f, "Description: {}", self.description)?;
        let state = if self.purchase.disabled { " (disabled)" } else { "" };
        write!(f, "[ {} ]{}", self.purchase.label, state)?;
        if let Some(err) = &self.error_message {
            write!(f, "\n{}", err)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Accepted by the server; the screen has been reloaded.
    Purchased,
    /// Rejected by the server; nothing was reloaded.
    Rejected,
    /// The button is disabled or the screen is not ready; nothing was sent.
    Unavailable,
}

pub struct DetailScreen {
    api: Arc<dyn MarketApi>,
    notifier: Arc<dyn Notifier>,
    images: ImageStore,
    item_id: ItemId,
    phase: Phase,
    item: Option<Item>,
    image: Option<ImageHandle>,
    error_message: Option<String>,
}

impl fmt::Debug for DetailScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailScreen")
            .field("item_id", &self.item_id)
            .field("phase", &self.phase)
            .field("item", &self.item)
            .field("image", &self.image)
            .finish_non_exhaustive()
    }
}

impl DetailScreen {
    pub fn new(
        api: Arc<dyn MarketApi>,
        notifier: Arc<dyn Notifier>,
        images: ImageStore,
        item_id: ItemId,
    ) -> Self {
        Self {
            api,
            notifier,
            images,
            item_id,
            phase: Phase::Loading,
            item: None,
            image: None,
            error_message: None,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Fetch metadata and image concurrently. Either may fail without
    /// affecting the other; each failure is reported on its own.
    #[instrument(skip_all, fields(item_id = self.item_id))]
    pub async fn load(&mut self) {
        let id = self.item_id;
        let (item, image) = futures::join!(self.api.get_item(id), self.api.get_item_image(id));

        match item {
            Ok(item) => self.item = Some(item),
            Err(err) => {
                warn!(?err, "GET item failed");
                self.notifier.error(&err.message());
            }
        }

        match image {
            Ok(bytes) => match self.images.acquire(&bytes).await {
                // the previous handle is dropped, and released, here
                Ok(handle) => self.image = Some(handle),
                Err(err) => {
                    warn!(?err, "failed to store item image");
                    self.notifier
                        .error(&format!("failed to display item image: {}", err));
                }
            },
            Err(err) => {
                warn!(?err, "GET item image failed");
                self.notifier.error(&err.message());
            }
        }

        self.phase = if self.item.is_some() && self.image.is_some() {
            Phase::Ready
        } else {
            Phase::Failed
        };
        info!(phase = ?self.phase, "detail screen loaded");
    }

    pub fn view(&self) -> Option<DetailView> {
        if self.phase != Phase::Ready {
            return None;
        }
        let item = self.item.as_ref()?;
        let image = self.image.as_ref()?;
        Some(DetailView {
            image: image.reference(),
            image_link: Route::ItemDetail(item.id),
            name: item.name.clone(),
            price: item.price,
            user_id: item.user_id,
            category_name: item.category_name.clone(),
            description: item.description.clone(),
            purchase: PurchaseButton::for_status(item.status),
            error_message: self.error_message.clone(),
        })
    }

    /// Buy the item as `creds.user_id`. The displayed state is only ever
    /// refreshed from the server, never patched locally.
    #[instrument(skip_all, fields(item_id = self.item_id, user_id = creds.user_id))]
    pub async fn purchase(&mut self, creds: &Credentials) -> PurchaseOutcome {
        match self.view() {
            Some(view) if !view.purchase.disabled => {}
            _ => return PurchaseOutcome::Unavailable,
        }

        match self.api.purchase(creds, self.item_id).await {
            Ok(()) => {
                info!("purchase accepted");
                self.error_message = None;
                self.load().await;
                PurchaseOutcome::Purchased
            }
            Err(err) => {
                warn!(?err, "POST purchase failed");
                self.notifier.error(&err.message());
                self.error_message = Some(PURCHASE_REJECTED.to_string());
                PurchaseOutcome::Rejected
            }
        }
    }
}
