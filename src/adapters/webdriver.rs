//! Browser automation over the W3C WebDriver protocol.
//!
//! Talks JSON to a driver server such as chromedriver. Every port call is a
//! single request against the session created in [`WebDriverClient::connect`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::errors::AutomationError;
use crate::domain::models::WebDriverConfig;
use crate::domain::ports::{Automation, AutomationResult, ControlRef, Locator};

/// Key under which element references are returned.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSession {
    session_id: String,
}

/// Browser launch options for a new session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// User agent for windowed sessions.
    pub user_agent: String,
}

impl BrowserOptions {
    pub fn from_config(config: &WebDriverConfig, headless: bool) -> Self {
        Self {
            headless,
            user_agent: config.user_agent.clone(),
        }
    }

    fn chrome_args(&self) -> Vec<String> {
        if self.headless {
            vec!["--headless=new".to_string(), "--window-size=1280,800".to_string()]
        } else {
            vec![format!("--user-agent={}", self.user_agent)]
        }
    }

    fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": self.chrome_args() }
                }
            }
        })
    }
}

/// WebDriver session bound to one browser window.
#[derive(Debug)]
pub struct WebDriverClient {
    http: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Start a browser through the driver server at `base_url`.
    pub async fn connect(base_url: &str, options: &BrowserOptions) -> AutomationResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let value = send(&http, Method::POST, &format!("{base_url}/session"), Some(options.capabilities())).await?;
        let session: NewSession = serde_json::from_value(value).map_err(|err| AutomationError::Protocol {
            code: "invalid session response".to_string(),
            message: err.to_string(),
        })?;

        info!(session = %session.session_id, headless = options.headless, "browser session started");
        Ok(Self {
            http,
            base_url,
            session_id: session.session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn endpoint(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/session/{}", self.base_url, self.session_id)
        } else {
            format!("{}/session/{}/{path}", self.base_url, self.session_id)
        }
    }

    async fn call(&self, method: Method, path: &str, body: Option<Value>) -> AutomationResult<Value> {
        send(&self.http, method, &self.endpoint(path), body).await
    }
}

async fn send(http: &Client, method: Method, url: &str, body: Option<Value>) -> AutomationResult<Value> {
    debug!(%method, %url, "webdriver request");
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let envelope: Envelope = response.json().await?;

    if status.is_success() {
        Ok(envelope.value)
    } else {
        Err(classify(status.as_u16(), envelope.value))
    }
}

/// Map a W3C error payload onto the port's error kinds.
fn classify(status: u16, value: Value) -> AutomationError {
    let Ok(body) = serde_json::from_value::<ErrorBody>(value) else {
        return AutomationError::Protocol {
            code: format!("http {status}"),
            message: "malformed error response".to_string(),
        };
    };

    match body.error.as_str() {
        "stale element reference" => AutomationError::StaleReference(body.message),
        "no such window" | "invalid session id" => AutomationError::NoSuchWindow(body.message),
        "no such element" => AutomationError::NotFound(body.message),
        "element not interactable" | "element click intercepted" => {
            AutomationError::NotInteractable(body.message)
        }
        "javascript error" => AutomationError::Script(body.message),
        _ => AutomationError::Protocol {
            code: body.error,
            message: body.message,
        },
    }
}

fn element_id(value: &Value) -> AutomationResult<ControlRef> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(ControlRef::new)
        .ok_or_else(|| AutomationError::Protocol {
            code: "invalid element".to_string(),
            message: format!("no element reference in {value}"),
        })
}

fn locate_body(locator: &Locator) -> Value {
    json!({ "using": locator.strategy(), "value": locator.expression() })
}

#[async_trait]
impl Automation for WebDriverClient {
    async fn navigate(&self, address: &str) -> AutomationResult<()> {
        self.call(Method::POST, "url", Some(json!({ "url": address })))
            .await
            .map(drop)
    }

    async fn evaluate(&self, script: &str) -> AutomationResult<Value> {
        self.call(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": [] })),
        )
        .await
    }

    async fn find(&self, locator: &Locator) -> AutomationResult<Option<ControlRef>> {
        match self.call(Method::POST, "element", Some(locate_body(locator))).await {
            Ok(value) => element_id(&value).map(Some),
            Err(AutomationError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<ControlRef>> {
        let value = self
            .call(Method::POST, "elements", Some(locate_body(locator)))
            .await?;
        value
            .as_array()
            .map(|items| items.iter().map(element_id).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn is_displayed(&self, control: &ControlRef) -> AutomationResult<bool> {
        let path = format!("element/{}/displayed", control.id());
        let value = self.call(Method::GET, &path, None).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, control: &ControlRef) -> AutomationResult<()> {
        let path = format!("element/{}/click", control.id());
        self.call(Method::POST, &path, Some(json!({}))).await.map(drop)
    }

    async fn read_attribute(
        &self,
        control: &ControlRef,
        name: &str,
    ) -> AutomationResult<Option<String>> {
        let path = format!("element/{}/property/{name}", control.id());
        let value = self.call(Method::GET, &path, None).await?;
        Ok(match value {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }

    async fn close(&self) -> AutomationResult<()> {
        self.call(Method::DELETE, "", None).await?;
        info!(session = %self.session_id, "browser session ended");
        Ok(())
    }
}
