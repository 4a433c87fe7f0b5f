//! Account renaming page and endpoint.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error, UserID, endpoints,
    chart::{
        AccountId, AccountName, ChartNode, ChartState, domain::RenameAccountFormData, get_node,
        rename_node,
    },
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base,
    },
    navigation::NavBar,
    wallet::{MAX_NAME_LENGTH, resolve_wallet_context},
};

/// Render the account renaming page.
///
/// Protected accounts cannot be renamed, so they get an error page instead.
pub async fn get_edit_account_page(
    Path(account_id): Path<AccountId>,
    State(state): State<ChartState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let context = resolve_wallet_context(user_id, &jar, &connection)?;
    let node = get_node(context.wallet.id, account_id, &connection)?;

    if node.is_protected {
        return Err(Error::ProtectedAccount(node.name.to_string()));
    }

    Ok(edit_account_view(&node, context.wallet.name.as_ref()).into_response())
}

/// Handle the account renaming form submission.
pub async fn update_account_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<ChartState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<RenameAccountFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account_id);

    let name = match AccountName::new(&form.name) {
        Ok(name) => name,
        Err(error) => {
            return edit_account_form_view(&update_endpoint, &form.name, &format!("Error: {error}"))
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

    let context = match resolve_wallet_context(user_id, &jar, &connection) {
        Ok(context) => context,
        Err(error) => return error.into_alert_response(),
    };

    match rename_node(&context, account_id, name, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CHART_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::NotFound | Error::ProtectedAccount(_))) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while renaming account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_account_view(node: &ChartNode, wallet_name: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_ACCOUNT_VIEW)
        .with_wallet(wallet_name)
        .into_html();
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, node.id);
    let form = edit_account_form_view(&update_endpoint, node.name.as_ref(), "");

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            dl class="w-full mb-4 text-sm"
            {
                dt class="font-medium" { "Code" }
                dd class="mb-2" { (node.code) }
                dt class="font-medium" { "Type" }
                dd { (node.category.label()) }
            }

            (form)
        }
    };

    base("Edit Account", &content)
}

fn edit_account_form_view(update_endpoint: &str, account_name: &str, error_message: &str) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Account Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Account Name"
                    value=(account_name)
                    maxlength=(MAX_NAME_LENGTH)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Rename Account" }
        }
    }
}

#[cfg(test)]
mod edit_account_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};

    use crate::{
        Error, endpoints,
        chart::{
            AccountName, ChartNode, ChartState, NewChartNode, create_node,
            domain::RenameAccountFormData, get_node,
            test_utils::{get_test_context, node_id_by_code},
        },
        test_utils::{
            assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        wallet::WalletContext,
    };

    use super::{get_edit_account_page, update_account_endpoint};

    fn get_state_with_account() -> (ChartState, WalletContext, ChartNode) {
        let (connection, context) = get_test_context();
        let assets_id = node_id_by_code(&context, "1", &connection);
        let node = create_node(
            &context,
            NewChartNode {
                name: AccountName::new_unchecked("Investments"),
                parent_id: Some(assets_id),
                category: None,
            },
            &connection,
        )
        .unwrap();
        let state = ChartState {
            cookie_key: Key::from(&Sha512::digest("foobar")),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, context, node)
    }

    fn get_jar(state: &ChartState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    #[tokio::test]
    async fn get_edit_account_page_succeeds() {
        let (state, context, node) = get_state_with_account();
        let jar = get_jar(&state);

        let response =
            get_edit_account_page(Path(node.id), State(state), Extension(context.user_id), jar)
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_ACCOUNT, node.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Investments");
        assert_form_submit_button_with_text(&form, "Rename Account");
    }

    #[tokio::test]
    async fn edit_page_for_protected_account_is_forbidden() {
        let (state, context, _) = get_state_with_account();
        let cash_id = node_id_by_code(&context, "1.1.1.1", &state.db_connection.lock().unwrap());
        let jar = get_jar(&state);

        let result =
            get_edit_account_page(Path(cash_id), State(state), Extension(context.user_id), jar)
                .await;

        assert_eq!(result.err(), Some(Error::ProtectedAccount("Cash".to_owned())));
    }

    #[tokio::test]
    async fn edit_page_for_missing_account_is_not_found() {
        let (state, context, _) = get_state_with_account();
        let jar = get_jar(&state);

        let response =
            get_edit_account_page(Path(9999), State(state), Extension(context.user_id), jar)
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_account_endpoint_succeeds() {
        let (state, context, node) = get_state_with_account();
        let jar = get_jar(&state);

        let response = update_account_endpoint(
            Path(node.id),
            State(state.clone()),
            Extension(context.user_id),
            jar,
            Form(RenameAccountFormData {
                name: "Brokerage".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CHART_VIEW);
        let renamed =
            get_node(context.wallet.id, node.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(renamed.name.as_ref(), "Brokerage");
        assert_eq!(renamed.code, node.code);
    }

    #[tokio::test]
    async fn update_with_empty_name_shows_error() {
        let (state, context, node) = get_state_with_account();
        let jar = get_jar(&state);

        let response = update_account_endpoint(
            Path(node.id),
            State(state),
            Extension(context.user_id),
            jar,
            Form(RenameAccountFormData {
                name: "".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Name cannot be empty");
    }

    #[tokio::test]
    async fn update_protected_account_is_forbidden() {
        let (state, context, _) = get_state_with_account();
        let assets_id = node_id_by_code(&context, "1", &state.db_connection.lock().unwrap());
        let jar = get_jar(&state);

        let response = update_account_endpoint(
            Path(assets_id),
            State(state.clone()),
            Extension(context.user_id),
            jar,
            Form(RenameAccountFormData {
                name: "Stuff".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let assets =
            get_node(context.wallet.id, assets_id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(assets.name.as_ref(), "Assets");
    }
}
