//! Wallets listing page with the form for creating a wallet.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};

use crate::{
    Error, UserID, endpoints,
    html::{
        BADGE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, edit_delete_action_links,
    },
    navigation::NavBar,
    wallet::{Wallet, WalletId, WalletState, get_active_wallet_id, get_wallets},
};

/// Render the wallets page listing the user's wallets.
pub async fn get_wallets_page(
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallets = get_wallets(user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve wallets: {error}"))?;

    let active_wallet_id = active_wallet_id(&wallets, get_active_wallet_id(&jar));

    Ok(wallets_view(&wallets, active_wallet_id).into_response())
}

/// The wallet from the session if it is one of `wallets`, otherwise the first wallet.
fn active_wallet_id(wallets: &[Wallet], session_wallet_id: Option<WalletId>) -> Option<WalletId> {
    session_wallet_id
        .filter(|wallet_id| wallets.iter().any(|wallet| wallet.id == *wallet_id))
        .or_else(|| wallets.first().map(|wallet| wallet.id))
}

fn wallets_view(wallets: &[Wallet], active_wallet_id: Option<WalletId>) -> Markup {
    let active_wallet_name = wallets
        .iter()
        .find(|wallet| Some(wallet.id) == active_wallet_id)
        .map(|wallet| wallet.name.as_ref());
    let mut nav_bar = NavBar::new(endpoints::WALLETS_VIEW);
    if let Some(name) = active_wallet_name {
        nav_bar = nav_bar.with_wallet(name);
    }

    let table_row = |wallet: &Wallet| {
        let is_active = Some(wallet.id) == active_wallet_id;
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_WALLET_VIEW, wallet.id.as_i64());
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_WALLET, wallet.id.as_i64());
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? Its chart of accounts will be deleted too.",
            wallet.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (wallet.name)

                    @if is_active {
                        " "
                        span class=(BADGE_STYLE) { "Active" }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4 items-center"
                    {
                        @if !is_active {
                            button
                                type="button"
                                hx-post=(endpoints::ACTIVE_WALLET)
                                hx-vals=(format!(r#"{{"wallet_id": {}}}"#, wallet.id))
                                hx-target-error="#alert-container"
                                class=(BUTTON_SECONDARY_STYLE)
                            {
                                "Use"
                            }
                        }

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
        )
    };

    let content = html!(
        (nav_bar.into_html())

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-6 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Wallets" }

                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for wallet in wallets {
                            (table_row(wallet))
                        }

                        @if wallets.is_empty() {
                            tr
                            {
                                td
                                    colspan="2"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "You don't have any wallets yet. Create one below to get started."
                                }
                            }
                        }
                    }
                }

                (new_wallet_form_view())
            }
        }
    );

    base("Wallets", &content)
}

fn new_wallet_form_view() -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_WALLET)
            hx-target-error="#alert-container"
            class="w-full max-w-md space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "New Wallet" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Wallet Name"
                    maxlength="255"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Wallet" }
        }
    }
}
