//! Alert system for displaying success and error messages to users.
//!
//! Alerts are returned as HTML fragments that HTMX swaps into the
//! `#alert-container` element that every page includes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone)]
pub enum Alert {
    SuccessSimple { message: String },
    Error { message: String, details: String },
}

impl Alert {
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::SuccessSimple { message } => (SUCCESS_STYLE, message, String::new()),
            Alert::Error { message, details } => (ERROR_STYLE, message, details),
        };

        html! {
            div
                role="alert"
                class=(container_style)
                onclick="this.remove()"
            {
                p class="font-semibold" { (message) }

                @if !details.is_empty() {
                    p class="text-sm" { (details) }
                }
            }
        }
    }

    /// Render the alert with a status code other than 200 OK.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

const SUCCESS_STYLE: &str = "p-4 mb-4 rounded border border-green-300 bg-green-50 \
    text-green-800 dark:bg-gray-800 dark:text-green-400 dark:border-green-800 cursor-pointer";

const ERROR_STYLE: &str = "p-4 mb-4 rounded border border-red-300 bg-red-50 \
    text-red-800 dark:bg-gray-800 dark:text-red-400 dark:border-red-800 cursor-pointer";

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        alert::Alert,
        test_utils::{assert_content_type, assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn error_alert_renders_message_and_details() {
        let response = Alert::Error {
            message: "Oh no".to_owned(),
            details: "Something broke".to_owned(),
        }
        .into_response_with_status(StatusCode::BAD_REQUEST);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(paragraphs, vec!["Oh no", "Something broke"]);
    }

    #[tokio::test]
    async fn simple_alert_has_no_details() {
        let response = Alert::SuccessSimple {
            message: "Done".to_owned(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let count = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(count, 1);
    }
}
