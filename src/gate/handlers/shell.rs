//! Minimal HTML shells for the login entry and the protected areas. The
//! real pages are static assets; these handlers only exist so the gate has
//! something to guard and the login entry has something to land on.

use axum::response::Html;

pub async fn login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Allstar</title></head>\
         <body><form method=\"post\" action=\"/api/login\">\
         <input name=\"email\" type=\"email\" autocomplete=\"username\">\
         <input name=\"password\" type=\"password\" autocomplete=\"current-password\">\
         <button type=\"submit\">Sign in</button></form></body></html>",
    )
}

pub async fn hub() -> Html<&'static str> {
    Html("<!doctype html><html><head><title>Hub</title></head><body id=\"hub\"></body></html>")
}

pub async fn adherence() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Adherence</title></head>\
         <body id=\"adherence\"></body></html>",
    )
}

pub async fn flowmaster() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>Flowmaster</title></head>\
         <body id=\"flowmaster\"></body></html>",
    )
}
