//! The chart of accounts as JSON.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use serde_json::json;

use crate::{
    Error, UserID,
    chart::{ChartState, ChartTreeNode, build_tree, get_chart_nodes},
    wallet::{WalletId, resolve_wallet_context},
};

/// The active wallet and its chart of accounts.
#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub active_wallet: WalletId,
    pub tree: Vec<ChartTreeNode>,
}

/// Get the chart of accounts of the active wallet as a tree.
pub async fn get_chart_json(
    State(state): State<ChartState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return json_error(Error::DatabaseLockError);
        }
    };

    let context = match resolve_wallet_context(user_id, &jar, &connection) {
        Ok(context) => context,
        Err(error) => return json_error(error),
    };

    match get_chart_nodes(context.wallet.id, &connection) {
        Ok(nodes) => Json(ChartResponse {
            active_wallet: context.wallet.id,
            tree: build_tree(&nodes, None),
        })
        .into_response(),
        Err(error) => json_error(error),
    }
}

fn json_error(error: Error) -> Response {
    let (status, message) = match error {
        Error::NoWallet => (StatusCode::NOT_FOUND, error.to_string()),
        error => {
            tracing::error!("An unexpected error occurred while getting the chart: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "an unexpected error occurred".to_owned(),
            )
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod chart_json_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use serde_json::Value;
    use sha2::{Digest, Sha512};

    use crate::{
        chart::ChartState,
        test_utils::{assert_content_type, parse_json},
        wallet::{WalletName, create_wallet, set_active_wallet, test_utils::get_test_connection},
    };

    use super::get_chart_json;

    fn get_state(connection: rusqlite::Connection) -> ChartState {
        ChartState {
            cookie_key: Key::from(&Sha512::digest("foobar")),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn returns_tree_of_active_wallet() {
        let (connection, user_id) = get_test_connection();
        create_wallet(user_id, WalletName::new_unchecked("Household"), &connection).unwrap();
        let business =
            create_wallet(user_id, WalletName::new_unchecked("Business"), &connection).unwrap();
        let state = get_state(connection);
        let jar = set_active_wallet(PrivateCookieJar::new(state.cookie_key.clone()), business.id);

        let response = get_chart_json(State(state), Extension(user_id), jar).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "application/json");
        let json = parse_json(response).await;
        assert_eq!(json["active_wallet"], business.id.as_i64());

        let tree = json["tree"].as_array().unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree[0]["code"], "1");
        assert_eq!(tree[0]["name"], "Assets");
        assert_eq!(tree[0]["type"], "asset");
        assert_eq!(tree[0]["is_protected"], true);
        assert_eq!(tree[0]["parent_id"], Value::Null);

        let cash = &tree[0]["children"][0]["children"][0]["children"][0];
        assert_eq!(cash["code"], "1.1.1.1");
        assert_eq!(cash["name"], "Cash");
        assert_eq!(cash["type"], "asset");
        assert_eq!(cash["children"], serde_json::json!([]));
        assert_eq!(tree[4]["children"][1]["name"], "Financial Expenses");
    }

    #[tokio::test]
    async fn returns_not_found_without_wallet() {
        let (connection, user_id) = get_test_connection();
        let state = get_state(connection);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_chart_json(State(state), Extension(user_id), jar).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = parse_json(response).await;
        assert_eq!(json["error"], "the user does not have a wallet");
    }
}
