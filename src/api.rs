use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Request, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Category, CreatedItem, FormValue, Item, ItemId, NewItemForm, PurchaseRequest, SellRequest,
};
use crate::session::Credentials;

const JSON: &str = "application/json";

/// The storefront HTTP API as seen by the screens.
#[async_trait]
pub trait MarketApi: Send + Sync {
    async fn get_item(&self, id: ItemId) -> ApiResult<Item>;

    async fn get_item_image(&self, id: ItemId) -> ApiResult<Vec<u8>>;

    async fn purchase(&self, creds: &Credentials, id: ItemId) -> ApiResult<()>;

    async fn list_categories(&self) -> ApiResult<Vec<Category>>;

    async fn create_item(&self, creds: &Credentials, form: &NewItemForm) -> ApiResult<ItemId>;

    async fn sell(&self, creds: &Credentials, item_id: ItemId) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct MarketClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for MarketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MarketClient {
    pub fn new(mut base_url: Url, timeout: Duration) -> ApiResult<Self> {
        // Url::join drops the last path segment unless it ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .user_agent("mercari-storefront/0.1")
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(cfg: &Config) -> ApiResult<Self> {
        let base_url =
            Url::parse(&cfg.api.base_url).map_err(|e| ApiError::Request(e.to_string()))?;
        Self::new(base_url, Duration::from_secs(cfg.api.timeout_secs))
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Request(format!("invalid path {}: {}", path, e)))
    }

    /// Build a JSON request. A body is only attached when given; the JSON
    /// headers are always present.
    pub fn build_json_request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        creds: Option<&Credentials>,
        body: Option<&B>,
    ) -> ApiResult<Request> {
        let mut builder = self
            .http
            .request(method, self.endpoint(path)?)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON);
        if let Some(creds) = creds {
            builder = builder.header(AUTHORIZATION, creds.bearer());
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Request(e.to_string()))?;
            builder = builder.body(bytes);
        }
        builder.build().map_err(|e| ApiError::Request(e.to_string()))
    }

    /// Build the multipart create request. The content type (with its
    /// boundary) is left to reqwest.
    pub fn build_create_request(
        &self,
        creds: &Credentials,
        form: &NewItemForm,
    ) -> ApiResult<Request> {
        let mut multipart = Form::new();
        for (name, value) in form.parts() {
            multipart = match value {
                FormValue::Text(text) => multipart.text(name, text),
                FormValue::File(file) => multipart.part(
                    name,
                    Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(file.mime)
                        .map_err(|e| ApiError::Request(e.to_string()))?,
                ),
            };
        }
        self.http
            .post(self.endpoint("/items")?)
            .header(AUTHORIZATION, creds.bearer())
            .multipart(multipart)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    async fn execute(&self, request: Request) -> ApiResult<reqwest::Response> {
        debug!(method=%request.method(), url=%request.url(), "sending storefront request");
        let res = self
            .http
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(res)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let res = self.execute(request).await?;
        let bytes = res.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn fetch_bytes(&self, request: Request) -> ApiResult<Vec<u8>> {
        let res = self.execute(request).await?;
        let bytes = res.bytes().await.map_err(ApiError::Transport)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MarketApi for MarketClient {
    async fn get_item(&self, id: ItemId) -> ApiResult<Item> {
        let request =
            self.build_json_request::<()>(Method::GET, &format!("/items/{}", id), None, None)?;
        self.fetch_json(request).await
    }

    async fn get_item_image(&self, id: ItemId) -> ApiResult<Vec<u8>> {
        let request = self.build_json_request::<()>(
            Method::GET,
            &format!("/items/{}/image", id),
            None,
            None,
        )?;
        self.fetch_bytes(request).await
    }

    async fn purchase(&self, creds: &Credentials, id: ItemId) -> ApiResult<()> {
        let body = PurchaseRequest {
            user_id: creds.user_id,
        };
        let request = self.build_json_request(
            Method::POST,
            &format!("/purchase/{}", id),
            Some(creds),
            Some(&body),
        )?;
        self.execute(request).await?;
        Ok(())
    }

    async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        let request =
            self.build_json_request::<()>(Method::GET, "/items/categories", None, None)?;
        self.fetch_json(request).await
    }

    async fn create_item(&self, creds: &Credentials, form: &NewItemForm) -> ApiResult<ItemId> {
        let request = self.build_create_request(creds, form)?;
        let created: CreatedItem = self.fetch_json(request).await?;
        Ok(created.id)
    }

    async fn sell(&self, creds: &Credentials, item_id: ItemId) -> ApiResult<()> {
        let body = SellRequest { item_id };
        let request = self.build_json_request(Method::POST, "/sell", Some(creds), Some(&body))?;
        self.execute(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageFile;

    fn client() -> MarketClient {
        MarketClient::new(
            Url::parse("http://localhost:9000/").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn creds() -> Credentials {
        Credentials {
            token: "tok".into(),
            user_id: 12,
        }
    }

    fn header<'a>(request: &'a Request, name: &str) -> &'a str {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .unwrap()
    }

    #[test]
    fn get_request_sets_json_headers_without_auth() {
        let request = client()
            .build_json_request::<()>(Method::GET, "/items/4", None, None)
            .unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "http://localhost:9000/items/4");
        assert_eq!(header(&request, "Accept"), "application/json");
        assert_eq!(header(&request, "Content-Type"), "application/json");
        assert!(request.headers().get("Authorization").is_none());
        assert!(request.body().is_none());
    }

    #[test]
    fn purchase_request_carries_bearer_and_user_id() {
        let body = PurchaseRequest { user_id: 12 };
        let request = client()
            .build_json_request(Method::POST, "/purchase/4", Some(&creds()), Some(&body))
            .unwrap();
        assert_eq!(request.url().path(), "/purchase/4");
        assert_eq!(header(&request, "Authorization"), "Bearer tok");
        let sent: serde_json::Value =
            serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(sent, serde_json::json!({ "user_id": 12 }));
    }

    #[test]
    fn create_request_is_multipart_with_auth() {
        let form = NewItemForm {
            name: "mug".into(),
            category_id: "1".into(),
            price: "300".into(),
            description: "blue".into(),
            image: ImageFile::new("mug.jpg", vec![0xff, 0xd8]),
        };
        let request = client().build_create_request(&creds(), &form).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.url().path(), "/items");
        assert_eq!(header(&request, "Authorization"), "Bearer tok");
        assert!(header(&request, "Content-Type").starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn base_url_with_path_prefix_is_kept() {
        let client = MarketClient::new(
            Url::parse("http://localhost:9000/api").unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        let request = client
            .build_json_request::<()>(Method::GET, "/items/categories", None, None)
            .unwrap();
        assert_eq!(request.url().path(), "/api/items/categories");
    }
}
