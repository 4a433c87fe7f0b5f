//! Wallet renaming page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error, UserID, endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    wallet::{WalletId, WalletName, WalletState, domain::WalletFormData, get_wallet, rename_wallet},
};

/// Render the wallet renaming page.
pub async fn get_edit_wallet_page(
    Path(wallet_id): Path<i64>,
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallet = get_wallet(user_id, WalletId::new(wallet_id), &connection)?;
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_WALLET, wallet_id);

    Ok(edit_wallet_view(&update_endpoint, wallet.name.as_ref()).into_response())
}

/// Handle the wallet renaming form submission.
pub async fn update_wallet_endpoint(
    Path(wallet_id): Path<i64>,
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<WalletFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_WALLET, wallet_id);

    let name = match WalletName::new(&form.name) {
        Ok(name) => name,
        Err(error) => {
            return edit_wallet_form_view(&update_endpoint, &form.name, &format!("Error: {error}"))
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match rename_wallet(user_id, WalletId::new(wallet_id), name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::NotFound | Error::DuplicateWalletName(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while renaming wallet {wallet_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_wallet_view(update_endpoint: &str, wallet_name: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_WALLET_VIEW).into_html();
    let form = edit_wallet_form_view(update_endpoint, wallet_name, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Wallet", &content)
}

fn edit_wallet_form_view(update_endpoint: &str, wallet_name: &str, error_message: &str) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Wallet Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Wallet Name"
                    value=(wallet_name)
                    maxlength="255"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Rename Wallet" }
        }
    }
}
