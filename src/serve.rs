//! Blocking HTTP front end.
//!
//! A parallel entry point to the batch harness: the same inference and
//! normalisation path, exposed as a JSON API and a small HTML form, with
//! no persistence. Requests are handled synchronously; the only shared
//! state is the read-only batcher built once at startup.

use rouille::{Request, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::api::{ReviewInput, Sentiment};
use crate::batch::Batcher;
use crate::providers::DynClassifier;

#[derive(Deserialize)]
struct PredictBody {
    review: Option<ReviewInput>,
}

/// The front-end application: routing plus the shared batcher.
pub struct App {
    batcher: Batcher<Box<DynClassifier>>,
}

impl App {
    #[must_use]
    pub fn new(batcher: Batcher<Box<DynClassifier>>) -> Self {
        Self { batcher }
    }

    /// Route one request.
    #[must_use]
    pub fn handle(&self, request: &Request) -> Response {
        match (request.method(), request.url().as_str()) {
            ("GET", "/") => Response::html(render_form(None)),
            ("POST", "/predict") => self.predict(request),
            _ => Response::empty_404(),
        }
    }

    fn predict(&self, request: &Request) -> Response {
        if is_json(request) {
            self.predict_json(request)
        } else {
            self.predict_form(request)
        }
    }

    /// JSON API path: always answers with an array of labels, even for a
    /// single review.
    fn predict_json(&self, request: &Request) -> Response {
        let Ok(body) = rouille::input::json_input::<PredictBody>(request) else {
            return missing_review();
        };
        let Some(input) = body.review else {
            return missing_review();
        };
        if input.is_blank() {
            return missing_review();
        }
        match self.labels(&input) {
            Ok(labels) => Response::json(&labels),
            Err(response) => response,
        }
    }

    /// Form path: renders the labels back into the page, collapsing a
    /// single review to a bare label for display.
    fn predict_form(&self, request: &Request) -> Response {
        let Ok(fields) = rouille::input::post::raw_urlencoded_post_input(request) else {
            return missing_review();
        };
        let Some((_, value)) = fields.into_iter().find(|(key, _)| key == "review") else {
            return missing_review();
        };
        let input = match parse_form_review(&value) {
            Ok(input) => input,
            Err(response) => return response,
        };
        if input.is_blank() {
            return missing_review();
        }
        match self.labels(&input) {
            Ok(labels) => {
                let display = if labels.len() == 1 {
                    labels[0].to_string()
                } else {
                    let joined: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
                    format!("[{}]", joined.join(", "))
                };
                Response::html(render_form(Some((&value, &display))))
            }
            Err(response) => response,
        }
    }

    fn labels(&self, input: &ReviewInput) -> Result<Vec<Sentiment>, Response> {
        match self.batcher.predict(input) {
            Ok(predictions) => {
                info!(reviews = predictions.len(), "served prediction");
                Ok(predictions.into_iter().map(|p| p.label).collect())
            }
            Err(err) => {
                error!(index = err.index(), %err, "inference failed");
                Err(Response::json(&json!({ "error": err.to_string() })).with_status_code(502))
            }
        }
    }
}

/// A form value starting with `[` must be a JSON array of strings; any
/// other value is a single review. The rule is declared, not guessed: an
/// invalid array is a client error, never silently treated as plain text.
fn parse_form_review(value: &str) -> Result<ReviewInput, Response> {
    if value.trim_start().starts_with('[') {
        match serde_json::from_str::<Vec<String>>(value) {
            Ok(reviews) => Ok(ReviewInput::Many(reviews)),
            Err(_) => Err(Response::json(
                &json!({ "error": "review list must be a JSON array of strings" }),
            )
            .with_status_code(400)),
        }
    } else {
        Ok(ReviewInput::One(value.to_owned()))
    }
}

fn is_json(request: &Request) -> bool {
    request
        .header("Content-Type")
        .is_some_and(|value| value.starts_with("application/json"))
}

fn missing_review() -> Response {
    Response::json(&json!({ "error": "Missing review" })).with_status_code(400)
}

fn render_form(result: Option<(&str, &str)>) -> String {
    let echo = result.map_or(String::new(), |(review, sentiment)| {
        format!(
            "\n    <h4>{}: {}</h4>",
            escape_html(review),
            escape_html(sentiment)
        )
    });
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>Sentiment App</title>\n</head>\n<body>\n    <h2>Sentiment App</h2>\n    <h3>Enter a review</h3>\n    <form method=\"POST\" action=\"/predict\">\n        <input type=\"text\" name=\"review\" required>\n        <button type=\"submit\">Sentiment</button>\n    </form>{echo}\n</body>\n</html>\n"
    )
}

fn escape_html(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '&' => "&amp;".to_owned(),
            '<' => "&lt;".to_owned(),
            '>' => "&gt;".to_owned(),
            '"' => "&quot;".to_owned(),
            '\'' => "&#39;".to_owned(),
            other => other.to_string(),
        })
        .collect()
}

/// Serve forever on `addr`.
///
/// # Panics
///
/// Panics if the address cannot be bound.
pub fn run(addr: &str, app: App) -> ! {
    info!(addr, "listening");
    rouille::start_server(addr, move |request| app.handle(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&"), "&lt;b&gt;&amp;");
    }

    #[test]
    fn form_value_without_bracket_is_a_single_review() {
        let input = parse_form_review("I loved it").unwrap_or_else(|_| panic!("parse form value"));
        assert_eq!(input, ReviewInput::One("I loved it".into()));
    }

    #[test]
    fn form_value_with_bracket_must_be_a_json_array() {
        let input =
            parse_form_review(r#"["a", "b"]"#).unwrap_or_else(|_| panic!("parse form value"));
        assert_eq!(input.items().len(), 2);

        let err = parse_form_review("[not json");
        assert!(err.is_err());
    }
}
