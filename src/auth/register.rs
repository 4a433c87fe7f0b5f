//! The registration page and the handler for creating user accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{Email, PasswordHash, User, ValidatedPassword, create_user, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        email_input, loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The minimum number of characters the password should have to be considered
/// valid on the client side. The server checks password strength on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

#[derive(Default)]
struct FormErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: FormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm-password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                (email_input(email))

                @if let Some(error_message) = errors.email
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", FormErrors::default());
    let content = log_in_register("Create an account", &registration_form);

    base("Register", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A problem with one field of the registration form.
#[derive(Debug)]
enum FieldError {
    Email(String),
    Password(String),
    ConfirmPassword(String),
}

impl FieldError {
    /// Re-render the form with the message under the offending field.
    fn into_form(self, email: &str) -> Markup {
        let errors = match &self {
            FieldError::Email(message) => FormErrors {
                email: Some(message),
                ..Default::default()
            },
            FieldError::Password(message) => FormErrors {
                password: Some(message),
                ..Default::default()
            },
            FieldError::ConfirmPassword(message) => FormErrors {
                confirm_password: Some(message),
                ..Default::default()
            },
        };

        registration_form(email, errors)
    }
}

fn validate_form(form: &RegisterForm) -> Result<(Email, ValidatedPassword), FieldError> {
    let email = Email::new(&form.email).map_err(|error| FieldError::Email(error.to_string()))?;

    let password = ValidatedPassword::new(&form.password, &[email.as_ref()])
        .map_err(|error| FieldError::Password(error.to_string()))?;

    if form.password != form.confirm_password {
        return Err(FieldError::ConfirmPassword(
            "Passwords do not match".to_owned(),
        ));
    }

    Ok((email, password))
}

/// Hash the password and store the new user.
fn store_user(
    email: Email,
    password: ValidatedPassword,
    db_connection: &Mutex<Connection>,
) -> Result<User, Error> {
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("Could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(email, password_hash, &connection)
}

/// Create a user from the registration form and log them in.
///
/// On success the client is redirected to the wallets page so that they can
/// create their first wallet. Validation errors are shown next to the
/// offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let (email, password) = match validate_form(&user_data) {
        Ok(valid) => valid,
        Err(error) => return error.into_form(&user_data.email).into_response(),
    };

    let user = match store_user(email.clone(), password, &state.db_connection) {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            let error =
                FieldError::Email("An account with this email address already exists".to_owned());
            return error.into_form(email.as_ref()).into_response();
        }
        Err(error) => {
            tracing::error!("Could not register user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {} ({})", user.id, user.email);

    let jar = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))
        .and_then(|local_offset| {
            set_auth_cookie(jar, user.id, state.cookie_duration, local_offset)
        });

    match jar {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not log in the new user: {error}");
            get_internal_server_error_redirect()
        }
    }
}
