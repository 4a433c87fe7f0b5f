//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/wallets/{wallet_id}', use [format_endpoint].

/// The root route which redirects to the chart of accounts or log in page.
pub const ROOT: &str = "/";
/// The page for listing, creating and switching wallets.
pub const WALLETS_VIEW: &str = "/wallets";
/// The page for renaming a wallet.
pub const EDIT_WALLET_VIEW: &str = "/wallets/{wallet_id}/edit";
/// The page displaying the chart of accounts of the active wallet.
pub const CHART_VIEW: &str = "/chart";
/// The page for renaming an account in the chart of accounts.
pub const EDIT_ACCOUNT_VIEW: &str = "/chart/{account_id}/edit";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create a wallet.
pub const POST_WALLET: &str = "/api/wallets";
/// The route to choose the active wallet.
pub const ACTIVE_WALLET: &str = "/api/wallets/active";
/// The route to rename a wallet.
pub const PUT_WALLET: &str = "/api/wallets/{wallet_id}";
/// The route to delete a wallet.
pub const DELETE_WALLET: &str = "/api/wallets/{wallet_id}";
/// The route to get the chart of accounts as JSON and to create accounts.
pub const CHART_API: &str = "/api/chart";
/// The route to rename an account.
pub const PUT_ACCOUNT: &str = "/api/chart/{account_id}";
/// The route to delete an account.
pub const DELETE_ACCOUNT: &str = "/api/chart/{account_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/wallets/{wallet_id}', '{wallet_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
