// crates/console-sso/tests/common/browser.rs
// ============================================================================
// Module: Scripted Browser
// Description: In-memory Browser whose page depends on the signed-in user.
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use console_sso::Browser;
use console_sso::BrowserLauncher;
use console_sso::ElementRef;
use console_sso::Locator;
use console_sso::ResolvedConsole;
use console_sso::WebDriverError;
use console_sso::login::username_field;
use serde_json::Value;

use super::identity::FakeIdentity;

/// Element present on the scripted page.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub locator: Locator,
    /// Visibility checks answered `false` before the element shows.
    pub hidden_checks: u32,
    /// Whether the element ever becomes visible.
    pub displayed: bool,
    /// How many elements match the locator.
    pub count: usize,
}

impl FakeElement {
    pub fn visible(locator: Locator) -> Self {
        Self {
            locator,
            hidden_checks: 0,
            displayed: true,
            count: 1,
        }
    }

    pub fn hidden(locator: Locator) -> Self {
        Self {
            displayed: false,
            ..Self::visible(locator)
        }
    }

    pub fn visible_after(locator: Locator, hidden_checks: u32) -> Self {
        Self {
            hidden_checks,
            ..Self::visible(locator)
        }
    }

    pub fn repeated(locator: Locator, count: usize) -> Self {
        Self {
            count,
            ..Self::visible(locator)
        }
    }
}

/// Access rule a scripted console enforces against the identity directory.
#[derive(Debug, Clone)]
pub struct ConsoleRule {
    pub identity: Arc<FakeIdentity>,
    /// Roles granting access inside the required population.
    pub roles: BTreeMap<String, Vec<String>>,
    /// Population local users must belong to.
    pub population_id: String,
    /// Users of this environment are federated and skip the population check.
    pub external_environment_id: String,
    /// Roles granting access from any population.
    pub any_population_roles: Option<BTreeMap<String, Vec<String>>>,
    pub granted: Vec<FakeElement>,
    pub denied: Vec<FakeElement>,
}

impl ConsoleRule {
    /// Rule mirroring a resolved console; application lists show two entries.
    pub fn for_console(identity: &Arc<FakeIdentity>, console: &ResolvedConsole) -> Self {
        let mut granted: Vec<FakeElement> =
            console.granted.iter().cloned().map(FakeElement::visible).collect();
        if let Some(entry) = &console.app_entry {
            granted.push(FakeElement::repeated(entry.clone(), 2));
        }
        Self {
            identity: Arc::clone(identity),
            roles: console.roles.clone(),
            population_id: "pop-acme".to_string(),
            external_environment_id: "env-external".to_string(),
            any_population_roles: console.any_population_roles.clone(),
            granted,
            denied: console.denied.iter().cloned().map(FakeElement::visible).collect(),
        }
    }

    fn allows(&self, username: &str) -> bool {
        let directory = self.identity.directory.lock().unwrap();
        directory.users.iter().any(|((environment_id, name), payload)| {
            if name != username {
                return false;
            }
            let in_population = *environment_id == self.external_environment_id
                || payload["population"]["id"] == self.population_id.as_str();
            (in_population && holds(payload, &self.roles))
                || self.any_population_roles.as_ref().is_some_and(|roles| holds(payload, roles))
        })
    }
}

fn holds(payload: &Value, roles: &BTreeMap<String, Vec<String>>) -> bool {
    roles.iter().all(|(attribute, values)| {
        values.iter().all(|value| {
            payload[attribute.as_str()]
                .as_array()
                .is_some_and(|held| held.iter().any(|entry| entry == value.as_str()))
        })
    })
}

/// Shared page script and command log.
#[derive(Debug, Default)]
pub struct FakeState {
    /// Elements shown to everyone (login forms, buttons).
    pub base: Vec<FakeElement>,
    /// Elements shown once a given username was typed.
    pub per_user: HashMap<String, Vec<FakeElement>>,
    /// Consoles whose page follows the signed-in user's directory entry.
    pub rules: Vec<ConsoleRule>,
    /// Page source returned to every caller.
    pub source: String,
    /// Username typed into the login form, cleared with cookies.
    pub current_user: Option<String>,
    /// Locators whose click fails as not interactable.
    pub not_interactable: Vec<Locator>,
    /// Locators whose visibility check reports a stale element.
    pub stale: Vec<Locator>,
    /// Error returned by every find command when set.
    pub find_error: Option<WebDriverError>,
    pub navigations: Vec<String>,
    pub clicks: Vec<Locator>,
    pub typed: Vec<(Locator, String)>,
    pub frames: Vec<Option<String>>,
    pub implicit_waits: Vec<Duration>,
    pub cookies_cleared: u32,
    pub launches: u32,
    pub quits: u32,
    /// Element handles issued so far.
    handles: Vec<Locator>,
    /// Visibility checks per handle.
    checks: HashMap<String, u32>,
}

impl FakeState {
    pub fn with_base(mut self, elements: Vec<FakeElement>) -> Self {
        self.base.extend(elements);
        self
    }

    pub fn with_rule(mut self, rule: ConsoleRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_user_page(mut self, username: &str, elements: Vec<FakeElement>) -> Self {
        self.per_user.entry(username.to_string()).or_default().extend(elements);
        self
    }

    fn elements(&self) -> Vec<FakeElement> {
        let mut elements = self.base.clone();
        if let Some(user) = &self.current_user {
            elements.extend(self.per_user.get(user).cloned().unwrap_or_default());
            for rule in &self.rules {
                let page = if rule.allows(user) { &rule.granted } else { &rule.denied };
                elements.extend(page.iter().cloned());
            }
        }
        elements
    }

    fn lookup(&self, locator: &Locator) -> Option<FakeElement> {
        self.elements().into_iter().find(|element| &element.locator == locator)
    }

    fn locator_of(&self, element: &ElementRef) -> Locator {
        let index: usize = element.0.trim_start_matches("el-").parse().unwrap();
        self.handles[index].clone()
    }
}

/// Handle to the shared state, used by tests to script and inspect.
pub type SharedState = Arc<Mutex<FakeState>>;

/// Creates shared state with the standard login form on every page.
pub fn login_page() -> FakeState {
    FakeState::default().with_base(vec![
        FakeElement::visible(Locator::id("username")),
        FakeElement::visible(Locator::id("password")),
        FakeElement::visible(Locator::css("button[data-id=\"submit-button\"]")),
        FakeElement::visible(Locator::class_name("custom-provider-button")),
    ])
}

pub fn shared(state: FakeState) -> SharedState {
    Arc::new(Mutex::new(state))
}

/// Browser reading and writing the shared state.
pub struct FakeBrowser {
    pub state: SharedState,
    pub session_id: String,
}

impl FakeBrowser {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            session_id: "fake-session".to_string(),
        }
    }
}

fn no_such_element(locator: &Locator) -> WebDriverError {
    WebDriverError::NoSuchElement {
        message: format!("no element for {locator}"),
    }
}

impl Browser for FakeBrowser {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn navigate(&mut self, url: &str) -> Result<(), WebDriverError> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, WebDriverError> {
        Ok(self.state.lock().unwrap().navigations.last().cloned().unwrap_or_default())
    }

    fn find_element(&mut self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.find_error {
            return Err(err.clone());
        }
        if state.lookup(locator).is_none() {
            return Err(no_such_element(locator));
        }
        state.handles.push(locator.clone());
        Ok(ElementRef(format!("el-{}", state.handles.len() - 1)))
    }

    fn find_elements(&mut self, locator: &Locator) -> Result<Vec<ElementRef>, WebDriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.find_error {
            return Err(err.clone());
        }
        let count = state.lookup(locator).map_or(0, |element| element.count);
        let mut refs = Vec::new();
        for _ in 0..count {
            state.handles.push(locator.clone());
            refs.push(ElementRef(format!("el-{}", state.handles.len() - 1)));
        }
        Ok(refs)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), WebDriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state.locator_of(element);
        if state.not_interactable.contains(&locator) {
            return Err(WebDriverError::NotInteractable {
                message: format!("{locator} is covered"),
            });
        }
        state.clicks.push(locator);
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state.locator_of(element);
        if locator == username_field() {
            state.current_user = Some(text.to_string());
        }
        state.typed.push((locator, text.to_string()));
        Ok(())
    }

    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool, WebDriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state.locator_of(element);
        if state.stale.contains(&locator) {
            return Err(WebDriverError::StaleElement {
                message: format!("{locator} detached"),
            });
        }
        let Some(fake) = state.lookup(&locator) else {
            return Err(WebDriverError::StaleElement {
                message: format!("{locator} no longer on the page"),
            });
        };
        let checks = state.checks.entry(element.0.clone()).or_default();
        *checks += 1;
        Ok(fake.displayed && *checks > fake.hidden_checks)
    }

    fn page_source(&mut self) -> Result<String, WebDriverError> {
        Ok(self.state.lock().unwrap().source.clone())
    }

    fn switch_to_frame(&mut self, frame: Option<&ElementRef>) -> Result<(), WebDriverError> {
        let mut state = self.state.lock().unwrap();
        let entry = frame.map(|element| state.locator_of(element).to_string());
        state.frames.push(entry);
        Ok(())
    }

    fn delete_all_cookies(&mut self) -> Result<(), WebDriverError> {
        let mut state = self.state.lock().unwrap();
        state.cookies_cleared += 1;
        state.current_user = None;
        Ok(())
    }

    fn set_implicit_wait(&mut self, wait: Duration) -> Result<(), WebDriverError> {
        self.state.lock().unwrap().implicit_waits.push(wait);
        Ok(())
    }

    fn quit(&mut self) -> Result<(), WebDriverError> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}

/// Launcher handing out browsers over one shared state. Each launch starts
/// signed out, like a fresh browser profile.
pub struct FakeLauncher {
    pub state: SharedState,
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn Browser>, WebDriverError> {
        let mut state = self.state.lock().unwrap();
        state.launches += 1;
        state.current_user = None;
        Ok(Box::new(FakeBrowser {
            state: Arc::clone(&self.state),
            session_id: format!("fake-{}", state.launches),
        }))
    }
}
