use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use crate::collector::{Collector, PageContext, PageSource};
use crate::error::{Error, Result};
use crate::host::{Host, NavigationEvent, TabId};
use crate::messaging::{self, Endpoint, Request, Response};
use crate::results::{NetworkEntry, StorageData};

/// The single tab a WebDriver session drives
const DRIVEN_TAB: TabId = TabId(1);

const STORAGE_SCRIPT: &str = r#"
const dump = (area) => {
  const out = {};
  try {
    for (let i = 0; i < area.length; i++) {
      const key = area.key(i);
      out[key] = area.getItem(key);
    }
  } catch (e) {}
  return out;
};
return { localStorage: dump(window.localStorage), sessionStorage: dump(window.sessionStorage) };
"#;

const RESOURCES_SCRIPT: &str = r#"
return performance.getEntriesByType('resource').map((e) => ({
  name: e.name,
  initiatorType: e.initiatorType,
  duration: e.duration,
  transferSize: e.transferSize,
}));
"#;

/// Host backed by a browser under WebDriver control
pub struct WebDriverHost {
    client: Client,
    collector: Mutex<Option<Endpoint>>,
    popup: Option<mpsc::Sender<()>>,
}

impl WebDriverHost {
    /// Connect to the WebDriver instance, trying common local ports if the
    /// configured one is not answering
    pub async fn connect(webdriver_url: &str) -> Result<Self> {
        let client = connect_to_webdriver(webdriver_url).await?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            collector: Mutex::new(None),
            popup: None,
        }
    }

    /// Route popup activations to `tx`
    pub fn with_popup_surface(mut self, tx: mpsc::Sender<()>) -> Self {
        self.popup = Some(tx);
        self
    }

    /// Load a page and report its completion
    pub async fn navigate(&self, url: &str) -> Result<NavigationEvent> {
        ::log::info!("Navigating to {}", url);
        self.client.goto(url).await?;
        let loaded = match self.client.current_url().await {
            Ok(current) => current.to_string(),
            Err(e) => {
                ::log::warn!("Could not read URL after navigating to {}: {}", url, e);
                url.to_string()
            }
        };
        Ok(NavigationEvent::complete(DRIVEN_TAB, loaded))
    }

    /// End the WebDriver session
    pub async fn close(&self) {
        if let Err(e) = self.client.clone().close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client> {
    let first_error = match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e
        }
    };

    // If we couldn't connect, try with common alternative URLs
    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(first_error.into())
}

#[async_trait]
impl Host for WebDriverHost {
    async fn active_tab(&self) -> Result<TabId> {
        Ok(DRIVEN_TAB)
    }

    async fn send_to_tab(&self, tab: TabId, request: Request) -> Result<Response> {
        let endpoint = match (tab, self.collector.lock().await.as_ref()) {
            (DRIVEN_TAB, Some(endpoint)) => endpoint.clone(),
            _ => return Err(Error::CollectorUnavailable(tab)),
        };
        endpoint.request(request).await
    }

    async fn inject_collector(&self, tab: TabId) -> Result<()> {
        if tab != DRIVEN_TAB {
            return Err(Error::CollectorUnavailable(tab));
        }

        let mut slot = self.collector.lock().await;
        if slot.as_ref().is_some_and(|e| !e.is_closed()) {
            return Ok(());
        }

        let (endpoint, inbox) = messaging::channel(16);
        let collector = Collector::new(WebDriverPage::new(self.client.clone()));
        tokio::spawn(inbox.serve(Arc::new(collector)));
        *slot = Some(endpoint);

        ::log::debug!("Collector injected into tab {}", tab);
        Ok(())
    }

    async fn capture_screenshot(&self) -> Result<String> {
        let png = self.client.screenshot().await?;
        Ok(STANDARD.encode(png))
    }

    async fn open_popup(&self) -> Result<()> {
        signal_popup(self.popup.as_ref())
    }
}

/// Nudge the popup surface without waiting on it
fn signal_popup(popup: Option<&mpsc::Sender<()>>) -> Result<()> {
    let popup = popup.ok_or(Error::PopupUnavailable)?;
    popup.try_send(()).map_err(|e| {
        ::log::debug!("Popup surface not accepting activations: {}", e);
        Error::PopupUnavailable
    })
}

/// Page source reading the document the WebDriver session is showing
pub struct WebDriverPage {
    client: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceTiming {
    #[serde(default)]
    name: String,
    #[serde(default)]
    initiator_type: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    transfer_size: f64,
}

impl From<ResourceTiming> for NetworkEntry {
    fn from(entry: ResourceTiming) -> Self {
        NetworkEntry {
            name: entry.name,
            kind: entry.initiator_type,
            duration: entry.duration,
            size: entry.transfer_size.max(0.0) as u64,
        }
    }
}

impl WebDriverPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn url(&self) -> String {
        match self.client.current_url().await {
            Ok(url) => url.to_string(),
            Err(e) => {
                ::log::warn!("Could not read page URL: {}", e);
                String::new()
            }
        }
    }

    async fn html(&self) -> String {
        match self.client.source().await {
            Ok(source) => source,
            Err(e) => {
                ::log::warn!("Could not read page source: {}", e);
                String::new()
            }
        }
    }

    async fn storage(&self) -> StorageData {
        self.run_script(STORAGE_SCRIPT, "storage")
            .await
            .and_then(|value| decode(value, "storage"))
            .unwrap_or_default()
    }

    async fn resources(&self) -> Vec<NetworkEntry> {
        self.run_script(RESOURCES_SCRIPT, "resource timing")
            .await
            .and_then(|value| decode::<Vec<ResourceTiming>>(value, "resource timing"))
            .map(|entries| entries.into_iter().map(NetworkEntry::from).collect())
            .unwrap_or_default()
    }

    async fn run_script(&self, script: &str, what: &str) -> Option<Value> {
        match self.client.execute(script, Vec::new()).await {
            Ok(value) => Some(value),
            Err(e) => {
                ::log::warn!("Could not read {}: {}", what, e);
                None
            }
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            ::log::warn!("Unexpected {} data: {}", what, e);
            None
        }
    }
}

#[async_trait]
impl PageSource for WebDriverPage {
    async fn capture(&self) -> PageContext {
        PageContext {
            url: self.url().await,
            html: self.html().await,
            storage: self.storage().await,
            resources: self.resources().await,
        }
    }
}
