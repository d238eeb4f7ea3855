#![forbid(unsafe_code)]

//! Login form with a simulated verification delay.
//!
//! `Submit` validates the form locally; a complete form moves to
//! `Submitting` and schedules the credential check on the sequencer. The
//! check only lands if the store is still alive and still submitting that
//! exact form, so `Cancel` or teardown during the delay makes it inert.

use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use stepwise_runtime::{
    DeferredSequencer, Evaluator, Handled, ObservableCell, PassableSignal, Screen, StepStore,
    TransitionScope, Translator,
};

use crate::trace::{TraceRecorder, Traceable};

/// Checks a username/password pair.
pub trait Authenticator {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Fixed list of accepted accounts.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    accounts: Vec<(String, String)>,
}

impl StaticAuthenticator {
    #[must_use]
    pub fn new<U, P>(accounts: impl IntoIterator<Item = (U, P)>) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            accounts: accounts
                .into_iter()
                .map(|(user, pass)| (user.into(), pass.into()))
                .collect(),
        }
    }

    /// The demo account `guest` / `stepwise`.
    #[must_use]
    pub fn demo() -> Self {
        Self::new([("guest", "stepwise")])
    }
}

impl Authenticator for StaticAuthenticator {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.accounts
            .iter()
            .any(|(user, pass)| user == username && pass == password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginError {
    MissingUsername,
    MissingPassword,
    Rejected,
}

impl LoginError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingUsername => "Enter a username",
            Self::MissingPassword => "Enter a password",
            Self::Rejected => "Wrong username or password",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormConfig {
    pub username: String,
    pub password: String,
    pub error: Option<LoginError>,
}

impl FormConfig {
    fn validate(&self) -> Option<LoginError> {
        if self.username.trim().is_empty() {
            Some(LoginError::MissingUsername)
        } else if self.password.is_empty() {
            Some(LoginError::MissingPassword)
        } else {
            None
        }
    }

    fn with_error(&self, error: LoginError) -> Self {
        Self {
            error: Some(error),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    Editing(FormConfig),
    Submitting(FormConfig),
    SignedIn(SessionConfig),
}

impl LoginStep {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Editing(_) => "editing",
            Self::Submitting(_) => "submitting",
            Self::SignedIn(_) => "signed_in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAction {
    EditUsername(String),
    EditPassword(String),
    Submit,
    Cancel,
    SignOut,
}

impl LoginAction {
    /// Parse a script token: `user:<name>`, `pass:<secret>`, `submit`,
    /// `cancel` or `signout`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "submit" => Some(Self::Submit),
            "cancel" => Some(Self::Cancel),
            "signout" => Some(Self::SignOut),
            _ => {
                if let Some(name) = token.strip_prefix("user:") {
                    Some(Self::EditUsername(name.to_string()))
                } else {
                    token
                        .strip_prefix("pass:")
                        .map(|secret| Self::EditPassword(secret.to_string()))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub struct LoginEvaluator {
    store: StepStore<LoginStep>,
    sequencer: DeferredSequencer,
    authenticator: Rc<dyn Authenticator>,
    verify_delay: Duration,
}

impl LoginEvaluator {
    #[must_use]
    pub fn new(
        authenticator: Rc<dyn Authenticator>,
        sequencer: DeferredSequencer,
        verify_delay: Duration,
    ) -> Self {
        Self {
            store: StepStore::new(LoginStep::Editing(FormConfig::default())),
            sequencer,
            authenticator,
            verify_delay,
        }
    }

    fn submit(&self, form: FormConfig) {
        let form = FormConfig { error: None, ..form };
        let submitted_at = self.store.commit(LoginStep::Submitting(form.clone()));

        let store = self.store.downgrade();
        let authenticator = Rc::clone(&self.authenticator);
        self.sequencer.after(self.verify_delay, move || {
            let Some(store) = store.upgrade() else {
                return;
            };
            // Any step since this submit (cancel, resubmit) retires the check.
            if store.generation() != submitted_at {
                tracing::debug!(
                    submitted_at,
                    generation = store.generation(),
                    "stale credential check dropped"
                );
                return;
            }
            let next = if authenticator.verify(&form.username, &form.password) {
                LoginStep::SignedIn(SessionConfig {
                    username: form.username,
                })
            } else {
                LoginStep::Editing(FormConfig {
                    username: form.username,
                    password: String::new(),
                    error: Some(LoginError::Rejected),
                })
            };
            store.set(next);
        });
    }
}

impl Evaluator for LoginEvaluator {
    type Step = LoginStep;
    type Action = LoginAction;

    fn store(&self) -> &StepStore<LoginStep> {
        &self.store
    }

    fn evaluate(&self, action: LoginAction) -> Handled {
        match (self.store.current(), action) {
            (LoginStep::Editing(form), LoginAction::EditUsername(username)) => {
                self.store.set(LoginStep::Editing(FormConfig {
                    username,
                    error: None,
                    ..form
                }));
                Handled::Applied
            }
            (LoginStep::Editing(form), LoginAction::EditPassword(password)) => {
                self.store.set(LoginStep::Editing(FormConfig {
                    password,
                    error: None,
                    ..form
                }));
                Handled::Applied
            }
            (LoginStep::Editing(form), LoginAction::Submit) => {
                match form.validate() {
                    Some(error) => self.store.set(LoginStep::Editing(form.with_error(error))),
                    None => self.submit(form),
                }
                Handled::Applied
            }
            (LoginStep::Submitting(form), LoginAction::Cancel) => {
                self.store.set(LoginStep::Editing(form));
                Handled::Applied
            }
            (LoginStep::SignedIn(session), LoginAction::SignOut) => {
                self.store.set(LoginStep::Editing(FormConfig {
                    username: session.username,
                    ..FormConfig::default()
                }));
                Handled::Applied
            }
            _ => Handled::Ignored,
        }
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginDisplay {
    pub username: String,
    pub password_mask: String,
    pub error_text: String,
    pub form_enabled: bool,
    pub submit_enabled: bool,
    pub busy: bool,
    pub greeting: String,
}

#[derive(Debug, Default)]
pub struct LoginTranslator {
    pub username: ObservableCell<String>,
    pub password_mask: ObservableCell<String>,
    pub error_text: ObservableCell<String>,
    pub form_enabled: ObservableCell<bool>,
    pub submit_enabled: ObservableCell<bool>,
    pub busy: ObservableCell<bool>,
    pub greeting: ObservableCell<String>,
    /// Fires when the server rejects the credentials.
    pub rejected: PassableSignal<()>,
    /// Fires with the username on sign-in.
    pub signed_in: PassableSignal<String>,
}

impl LoginTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn display(&self) -> LoginDisplay {
        LoginDisplay {
            username: self.username.get(),
            password_mask: self.password_mask.get(),
            error_text: self.error_text.get(),
            form_enabled: self.form_enabled.get(),
            submit_enabled: self.submit_enabled.get(),
            busy: self.busy.get(),
            greeting: self.greeting.get(),
        }
    }

    fn assign(&self, display: LoginDisplay) {
        TransitionScope::run(|| {
            self.username.set(display.username);
            self.password_mask.set(display.password_mask);
            self.error_text.set(display.error_text);
            self.form_enabled.set(display.form_enabled);
            self.submit_enabled.set(display.submit_enabled);
            self.busy.set(display.busy);
            self.greeting.set(display.greeting);
        });
    }

    fn show_editing(&self, form: &FormConfig) {
        self.assign(LoginDisplay {
            username: form.username.clone(),
            password_mask: mask(&form.password),
            error_text: form.error.map(LoginError::message).unwrap_or_default().to_string(),
            form_enabled: true,
            submit_enabled: form.validate().is_none(),
            busy: false,
            greeting: String::new(),
        });
        if form.error == Some(LoginError::Rejected) {
            self.rejected.send(());
        }
    }

    fn show_submitting(&self, form: &FormConfig) {
        self.assign(LoginDisplay {
            username: form.username.clone(),
            password_mask: mask(&form.password),
            error_text: String::new(),
            form_enabled: false,
            submit_enabled: false,
            busy: true,
            greeting: String::new(),
        });
    }

    fn show_signed_in(&self, session: &SessionConfig) {
        self.assign(LoginDisplay {
            username: session.username.clone(),
            password_mask: String::new(),
            error_text: String::new(),
            form_enabled: false,
            submit_enabled: false,
            busy: false,
            greeting: format!("Welcome, {}", session.username),
        });
        self.signed_in.send(session.username.clone());
    }
}

fn mask(password: &str) -> String {
    "•".repeat(password.chars().count())
}

impl Translator for LoginTranslator {
    type Step = LoginStep;

    fn translate(&self, step: &LoginStep) {
        match step {
            LoginStep::Editing(form) => self.show_editing(form),
            LoginStep::Submitting(form) => self.show_submitting(form),
            LoginStep::SignedIn(session) => self.show_signed_in(session),
        }
    }
}

impl Traceable for LoginTranslator {
    fn trace(&self, recorder: &TraceRecorder) {
        recorder.cell("username", &self.username);
        recorder.cell("password_mask", &self.password_mask);
        recorder.cell("error_text", &self.error_text);
        recorder.cell("form_enabled", &self.form_enabled);
        recorder.cell("submit_enabled", &self.submit_enabled);
        recorder.cell("busy", &self.busy);
        recorder.cell("greeting", &self.greeting);
        recorder.signal("rejected", &self.rejected);
        recorder.signal("signed_in", &self.signed_in);
    }
}

pub type LoginScreen = Screen<LoginEvaluator, LoginTranslator>;

/// Assemble a login screen verifying through `authenticator`.
#[must_use]
pub fn login_screen(
    authenticator: Rc<dyn Authenticator>,
    sequencer: DeferredSequencer,
    verify_delay: Duration,
) -> LoginScreen {
    let sequencer = sequencer.scoped();
    Screen::new(
        LoginEvaluator::new(authenticator, sequencer.clone(), verify_delay),
        LoginTranslator::new(),
        sequencer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tokens() {
        assert_eq!(
            LoginAction::parse("user:ada"),
            Some(LoginAction::EditUsername("ada".to_string()))
        );
        assert_eq!(
            LoginAction::parse("pass:"),
            Some(LoginAction::EditPassword(String::new()))
        );
        assert_eq!(LoginAction::parse("login"), None);
    }

    #[test]
    fn validation_order() {
        let mut form = FormConfig::default();
        assert_eq!(form.validate(), Some(LoginError::MissingUsername));
        form.username = "  ".to_string();
        assert_eq!(form.validate(), Some(LoginError::MissingUsername));
        form.username = "ada".to_string();
        assert_eq!(form.validate(), Some(LoginError::MissingPassword));
        form.password = "pw".to_string();
        assert_eq!(form.validate(), None);
    }

    #[test]
    fn static_authenticator() {
        let auth = StaticAuthenticator::demo();
        assert!(auth.verify("guest", "stepwise"));
        assert!(!auth.verify("guest", "nope"));
        assert!(!StaticAuthenticator::default().verify("", ""));
    }

    #[test]
    fn mask_counts_chars() {
        assert_eq!(mask("héllo"), "•••••");
        assert_eq!(mask(""), "");
    }
}
