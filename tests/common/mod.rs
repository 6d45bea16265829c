#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use mercari_storefront::api::MarketApi;
use mercari_storefront::error::{ApiError, ApiResult};
use mercari_storefront::model::{Category, Item, ItemId, ItemStatus, NewItemForm};
use mercari_storefront::session::Credentials;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetItem(ItemId),
    GetItemImage(ItemId),
    Purchase {
        item_id: ItemId,
        user_id: i64,
        token: String,
    },
    ListCategories,
    CreateItem(NewItemForm),
    Sell(ItemId),
}

/// Stub storefront: answers from queued responses and records every call.
#[derive(Default)]
pub struct RecordingMarket {
    items: Mutex<VecDeque<ApiResult<Item>>>,
    images: Mutex<VecDeque<ApiResult<Vec<u8>>>>,
    purchases: Mutex<VecDeque<ApiResult<()>>>,
    categories: Mutex<VecDeque<ApiResult<Vec<Category>>>>,
    creates: Mutex<VecDeque<ApiResult<ItemId>>>,
    sells: Mutex<VecDeque<ApiResult<()>>>,
    calls: Mutex<Vec<Call>>,
    created: Mutex<Vec<ItemId>>,
    listed: Mutex<Vec<ItemId>>,
    item_delay: Option<Duration>,
    image_delay: Option<Duration>,
}

fn missing<T>(what: &str) -> ApiResult<T> {
    Err(ApiError::Decode(format!("no {} response queued", what)))
}

pub fn rejected(message: &str) -> ApiError {
    ApiError::Status {
        status: StatusCode::PRECONDITION_FAILED,
        body: format!(r#"{{"message":"{}"}}"#, message),
    }
}

impl RecordingMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delays(item_delay: Option<Duration>, image_delay: Option<Duration>) -> Self {
        Self {
            item_delay,
            image_delay,
            ..Default::default()
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn push_item(&self, res: ApiResult<Item>) {
        self.items.lock().await.push_back(res);
    }

    pub async fn push_image(&self, res: ApiResult<Vec<u8>>) {
        self.images.lock().await.push_back(res);
    }

    pub async fn push_purchase(&self, res: ApiResult<()>) {
        self.purchases.lock().await.push_back(res);
    }

    pub async fn push_categories(&self, res: ApiResult<Vec<Category>>) {
        self.categories.lock().await.push_back(res);
    }

    pub async fn push_create(&self, res: ApiResult<ItemId>) {
        self.creates.lock().await.push_back(res);
    }

    pub async fn push_sell(&self, res: ApiResult<()>) {
        self.sells.lock().await.push_back(res);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn created(&self) -> Vec<ItemId> {
        self.created.lock().await.clone()
    }

    pub async fn listed(&self) -> Vec<ItemId> {
        self.listed.lock().await.clone()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl MarketApi for RecordingMarket {
    async fn get_item(&self, id: ItemId) -> ApiResult<Item> {
        self.record(Call::GetItem(id)).await;
        if let Some(delay) = self.item_delay {
            tokio::time::sleep(delay).await;
        }
        let res = self.items.lock().await.pop_front();
        res.unwrap_or_else(|| missing("item"))
    }

    async fn get_item_image(&self, id: ItemId) -> ApiResult<Vec<u8>> {
        self.record(Call::GetItemImage(id)).await;
        if let Some(delay) = self.image_delay {
            tokio::time::sleep(delay).await;
        }
        let res = self.images.lock().await.pop_front();
        res.unwrap_or_else(|| missing("image"))
    }

    async fn purchase(&self, creds: &Credentials, id: ItemId) -> ApiResult<()> {
        self.record(Call::Purchase {
            item_id: id,
            user_id: creds.user_id,
            token: creds.token.clone(),
        })
        .await;
        let res = self.purchases.lock().await.pop_front();
        res.unwrap_or_else(|| missing("purchase"))
    }

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        self.record(Call::ListCategories).await;
        let res = self.categories.lock().await.pop_front();
        res.unwrap_or_else(|| missing("categories"))
    }

    async fn create_item(&self, _creds: &Credentials, form: &NewItemForm) -> ApiResult<ItemId> {
        self.record(Call::CreateItem(form.clone())).await;
        let res = self
            .creates
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| missing("create"));
        if let Ok(id) = &res {
            self.created.lock().await.push(*id);
        }
        res
    }

    async fn sell(&self, _creds: &Credentials, item_id: ItemId) -> ApiResult<()> {
        self.record(Call::Sell(item_id)).await;
        let res = self
            .sells
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| missing("sell"));
        if res.is_ok() {
            self.listed.lock().await.push(item_id);
        }
        res
    }
}

pub fn item(id: ItemId, status: ItemStatus) -> Item {
    Item {
        id,
        name: "vintage camera".into(),
        category_id: 3,
        category_name: "electronics".into(),
        user_id: 7,
        price: 12000,
        status,
        description: "works fine".into(),
    }
}

pub fn creds() -> Credentials {
    Credentials {
        token: "test-token".into(),
        user_id: 42,
    }
}

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
