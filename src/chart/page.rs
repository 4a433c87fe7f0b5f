//! The chart of accounts page for the active wallet.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID, endpoints,
    chart::{AccountCategory, ChartNode, ChartTreeNode, build_tree, get_chart_nodes, walk_tree},
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links,
    },
    navigation::NavBar,
    wallet::{MAX_NAME_LENGTH, WalletContext, resolve_wallet_context},
};

/// The state needed by the chart of accounts handlers.
#[derive(Debug, Clone)]
pub struct ChartState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ChartState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ChartState> for Key {
    fn from_ref(state: &ChartState) -> Self {
        state.cookie_key.clone()
    }
}

/// Render the chart of accounts of the active wallet.
///
/// Users without a wallet are sent to the wallets page to create one.
pub async fn get_chart_page(
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
    let nodes = get_chart_nodes(context.wallet.id, &connection).inspect_err(|error| {
        tracing::error!(
            "Failed to retrieve the chart of accounts for wallet {}: {error}",
            context.wallet.id
        )
    })?;
    let tree = build_tree(&nodes, None);

    Ok(chart_view(&context, &nodes, &tree).into_response())
}

fn chart_view(context: &WalletContext, nodes: &[ChartNode], tree: &[ChartTreeNode]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CHART_VIEW)
        .with_wallet(context.wallet.name.as_ref())
        .into_html();

    let table_row = |depth: usize, node: &ChartTreeNode| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, node.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_ACCOUNT, node.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? The accounts below it will be deleted too.",
            node.name
        );
        let indent = format!("padding-left: {}rem", 1.5 + depth as f32 * 1.25);

        html!(
            tr class=(TABLE_ROW_STYLE) data-code=(node.code)
            {
                td class=(TABLE_CELL_STYLE) { (node.code) }

                td class="py-4 pr-6" style=(indent)
                {
                    @if depth == 0 {
                        span class="font-semibold" { (node.name) }
                    } @else {
                        (node.name)
                    }
                }

                td class=(TABLE_CELL_STYLE) { (node.category.label()) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4 items-center"
                    {
                        @if node.is_protected {
                            span class=(BADGE_STYLE) { "Protected" }
                        } @else {
                            (edit_delete_action_links(
                                &edit_url,
                                &delete_url,
                                &confirm_message,
                                "closest tr",
                                "delete",
                            ))
                        }
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Chart of Accounts" }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for (depth, node) in walk_tree(tree) {
                            (table_row(depth, node))
                        }
                    }
                }

                (new_account_form_view(nodes))
            }
        }
    );

    base("Chart of Accounts", &content)
}

fn new_account_form_view(nodes: &[ChartNode]) -> Markup {
    html! {
        form
            hx-post=(endpoints::CHART_API)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            h2 class="text-lg font-semibold" { "New Account" }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Account Name"
                    maxlength=(MAX_NAME_LENGTH)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="parent_id" class=(FORM_LABEL_STYLE) { "Parent Account" }

                select id="parent_id" name="parent_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected { "None (top-level account)" }

                    @for node in nodes {
                        option value=(node.id) { (node.code) " " (node.name) }
                    }
                }
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Type" }

                select id="category" name="category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected { "Same as parent account" }

                    @for category in AccountCategory::ALL {
                        option value=(category.as_str()) { (category.label()) }
                    }
                }

                p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                {
                    "Only used for top-level accounts. Other accounts share the type of their parent."
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Account" }
        }
    }
}

#[cfg(test)]
mod chart_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::State,
        http::StatusCode,
        response::IntoResponse,
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use scraper::{Html, Selector};
    use sha2::{Digest, Sha512};

    use crate::{
        endpoints,
        chart::{
            AccountName, NewChartNode, create_node, default_chart_size,
            test_utils::node_id_by_code,
        },
        test_utils::{
            assert_content_type, assert_form_input, assert_hx_endpoint, assert_redirect,
            assert_valid_html, element_texts, get_select_option_values, must_get_form,
            parse_html_document,
        },
        wallet::{
            WalletContext, WalletName, create_wallet, set_active_wallet,
            test_utils::get_test_connection,
        },
    };

    use super::{ChartState, get_chart_page};

    fn get_state(connection: rusqlite::Connection) -> ChartState {
        ChartState {
            cookie_key: Key::from(&Sha512::digest("foobar")),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn row_codes(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tbody tr").unwrap())
            .filter_map(|row| row.value().attr("data-code").map(str::to_owned))
            .collect()
    }

    #[tokio::test]
    async fn renders_default_chart_in_code_order() {
        let (connection, user_id) = get_test_connection();
        create_wallet(user_id, WalletName::new_unchecked("Household"), &connection).unwrap();
        let state = get_state(connection);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_chart_page(State(state), Extension(user_id), jar)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let codes = row_codes(&html);
        assert_eq!(codes.len(), default_chart_size());
        assert_eq!(codes[..4], ["1", "1.1", "1.1.1", "1.1.1.1"]);

        let protected_badges = element_texts(&html, "tbody span")
            .into_iter()
            .filter(|text| text == "Protected")
            .count();
        assert_eq!(protected_badges, default_chart_size());
        assert_eq!(
            html.select(&Selector::parse("button[hx-delete]").unwrap())
                .count(),
            0,
            "protected accounts cannot be deleted"
        );
    }

    #[tokio::test]
    async fn shows_user_accounts_with_actions() {
        let (connection, user_id) = get_test_connection();
        let wallet =
            create_wallet(user_id, WalletName::new_unchecked("Household"), &connection).unwrap();
        let context = WalletContext { user_id, wallet };
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
        let state = get_state(connection);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_chart_page(State(state), Extension(user_id), jar)
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let codes = row_codes(&html);
        let position = codes.iter().position(|code| code == "1.3").unwrap();
        assert_eq!(codes[position - 1], "1.2", "new account follows its siblings");

        let delete_button = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .next()
            .expect("delete button missing");
        assert_eq!(
            delete_button.value().attr("hx-delete"),
            Some(endpoints::format_endpoint(endpoints::DELETE_ACCOUNT, node.id).as_str())
        );
    }

    #[tokio::test]
    async fn shows_active_wallet_chart() {
        let (connection, user_id) = get_test_connection();
        create_wallet(user_id, WalletName::new_unchecked("Household"), &connection).unwrap();
        let business =
            create_wallet(user_id, WalletName::new_unchecked("Business"), &connection).unwrap();
        let state = get_state(connection);
        let jar = set_active_wallet(PrivateCookieJar::new(state.cookie_key.clone()), business.id);

        let response = get_chart_page(State(state), Extension(user_id), jar)
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(element_texts(&html, "#active-wallet"), ["Business"]);
    }

    #[tokio::test]
    async fn has_new_account_form() {
        let (connection, user_id) = get_test_connection();
        create_wallet(user_id, WalletName::new_unchecked("Household"), &connection).unwrap();
        let state = get_state(connection);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_chart_page(State(state), Extension(user_id), jar)
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::CHART_API, "hx-post");
        assert_form_input(&form, "name", "text");

        let parent_options = get_select_option_values(&form, "parent_id");
        assert_eq!(parent_options.len(), default_chart_size() + 1);
        assert_eq!(parent_options[0], "");
        let category_options = get_select_option_values(&form, "category");
        assert_eq!(
            category_options,
            ["", "asset", "liability", "equity", "revenue", "expense"]
        );
    }

    #[tokio::test]
    async fn redirects_to_wallets_page_without_wallet() {
        let (connection, user_id) = get_test_connection();
        let state = get_state(connection);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_chart_page(State(state), Extension(user_id), jar)
            .await
            .into_response();

        assert_redirect(&response, endpoints::WALLETS_VIEW);
    }
}
