use axum::response::Html;

const INDEX_HTML: &str = include_str!("index.html");

pub(super) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
