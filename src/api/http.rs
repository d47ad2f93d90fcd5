use super::{
    CafeApi,
    models::{
        Envelope, MenuItemPayload, MenuPayload, NoPayload, OrdersPayload, PhoneUpdate,
        PlacedOrderPayload, StatusUpdate, UsersPayload,
    },
};
use crate::{
    config::AppConfig,
    core::{
        admin::{DashboardStats, OrderRecord, OrderStatus, UserRecord},
        history::HistoryEntry,
        menu::{MenuItem, ValidMenuItem},
        order::Order,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::{
    Client, Response, Url,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// [`CafeApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCafeApi {
    client: Client,
    base_url: String,
}

impl HttpCafeApi {
    /// Builds a client for the backend at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `path` followed by `segment` as one percent-encoded path segment.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url(path)).map_err(|e| Error::Config {
            message: format!("Invalid API base URL '{}': {e}", self.base_url),
        })?;
        url.path_segments_mut()
            .map_err(|()| Error::Config {
                message: format!("API base URL '{}' cannot carry a path", self.base_url),
            })?
            .push(segment);
        Ok(url)
    }

    /// Decodes a response envelope.
    ///
    /// Non-2xx answers become [`Error::Status`] unless the body is an envelope with
    /// `success: false`, which is a business rejection.
    async fn read<T: DeserializeOwned>(response: Response, endpoint: &str) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<Envelope<NoPayload>>(&body) {
            if envelope.success == Some(false) {
                return Err(Error::Api {
                    message: envelope.message,
                });
            }
        }

        warn!("{} answered {}", endpoint, status);
        Err(Error::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        })
    }

    fn menu_form(item: &ValidMenuItem) -> Result<Form> {
        let mut form = Form::new()
            .text("name", item.name.clone())
            .text("description", item.description.clone())
            .text("price", item.price.to_string())
            .text("category", item.category.clone());

        if let Some(image) = &item.image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)?;
            form = form.part("image", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl CafeApi for HttpCafeApi {
    #[instrument(skip(self))]
    async fn list_menu(&self) -> Result<Vec<MenuItem>> {
        let endpoint = "/api/menu/all";
        let response = self.client.get(self.url(endpoint)).send().await?;
        let envelope: Envelope<MenuPayload> = Self::read(response, endpoint).await?;
        let items = envelope.confirmed()?.items;
        debug!("Fetched {} menu items", items.len());
        Ok(items)
    }

    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn add_menu_item(&self, item: &ValidMenuItem) -> Result<Option<MenuItem>> {
        let endpoint = "/api/menu/add";
        let response = self
            .client
            .post(self.url(endpoint))
            .multipart(Self::menu_form(item)?)
            .send()
            .await?;
        let envelope: Envelope<MenuItemPayload> = Self::read(response, endpoint).await?;
        Ok(envelope.confirmed()?.item)
    }

    #[instrument(skip(self, item))]
    async fn update_menu_item(&self, id: &str, item: &ValidMenuItem) -> Result<()> {
        let endpoint = format!("/api/menu/update/{id}");
        let response = self
            .client
            .put(self.url(&endpoint))
            .multipart(Self::menu_form(item)?)
            .send()
            .await?;
        let envelope: Envelope<NoPayload> = Self::read(response, &endpoint).await?;
        envelope.confirmed()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_menu_item(&self, id: &str) -> Result<()> {
        let endpoint = format!("/api/menu/delete/{id}");
        let response = self.client.delete(self.url(&endpoint)).send().await?;
        let envelope: Envelope<NoPayload> = Self::read(response, &endpoint).await?;
        envelope.confirmed()?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(items = order.items.len(), total = order.total))]
    async fn place_order(&self, order: &Order) -> Result<Option<String>> {
        let endpoint = "/api/orders/place";
        let response = self
            .client
            .post(self.url(endpoint))
            .json(order)
            .send()
            .await?;
        let envelope: Envelope<PlacedOrderPayload> = Self::read(response, endpoint).await?;
        Ok(envelope.confirmed()?.order_id)
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<OrderRecord>> {
        let endpoint = "/api/orders";
        let response = self.client.get(self.url(endpoint)).send().await?;
        let envelope: Envelope<OrdersPayload> = Self::read(response, endpoint).await?;
        Ok(envelope.accepted()?.orders)
    }

    #[instrument(skip(self))]
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<()> {
        let endpoint = format!("/api/orders/{id}/status");
        let response = self
            .client
            .put(self.url(&endpoint))
            .json(&StatusUpdate { status })
            .send()
            .await?;
        let envelope: Envelope<NoPayload> = Self::read(response, &endpoint).await?;
        envelope.accepted()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn user_orders(&self, email: &str) -> Result<Vec<HistoryEntry>> {
        let endpoint = format!("/api/orders/user/{email}");
        let url = self.url_with_segment("/api/orders/user", email)?;
        let response = self.client.get(url).send().await?;
        let envelope: Envelope<OrdersPayload<HistoryEntry>> =
            Self::read(response, &endpoint).await?;
        Ok(envelope.confirmed()?.orders)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let endpoint = "/api/admin/users";
        let response = self.client.get(self.url(endpoint)).send().await?;
        let envelope: Envelope<UsersPayload> = Self::read(response, endpoint).await?;
        Ok(envelope.accepted()?.users)
    }

    #[instrument(skip(self))]
    async fn admin_stats(&self) -> Result<DashboardStats> {
        let endpoint = "/api/admin/stats";
        let response = self.client.get(self.url(endpoint)).send().await?;
        Self::read(response, endpoint).await
    }

    #[instrument(skip(self, phone))]
    async fn update_phone(&self, email: &str, phone: &str) -> Result<()> {
        let endpoint = "/api/users/phone";
        let response = self
            .client
            .put(self.url(endpoint))
            .json(&PhoneUpdate { email, phone })
            .send()
            .await?;
        let envelope: Envelope<NoPayload> = Self::read(response, endpoint).await?;
        envelope.accepted()?;
        Ok(())
    }
}
