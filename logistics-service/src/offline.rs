//! Service worker for the courier page.
//!
//! Precaches a fixed allowlist, serves those URLs cache-first with a network
//! fallback, and drops every other cache version on activation.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::api::AppState;

const SCRIPT_BODY: &str = r#"
self.addEventListener('install', (event) => {
  event.waitUntil(
    caches.open(CACHE_NAME).then((cache) => cache.addAll(URLS_TO_CACHE))
  );
});

self.addEventListener('fetch', (event) => {
  const url = new URL(event.request.url);
  if (event.request.method !== 'GET' || !URLS_TO_CACHE.includes(url.pathname)) {
    return;
  }
  event.respondWith(
    caches.match(event.request).then((cached) => cached || fetch(event.request))
  );
});

self.addEventListener('activate', (event) => {
  event.waitUntil(
    caches.keys().then((names) =>
      Promise.all(
        names
          .filter((name) => name !== CACHE_NAME)
          .map((name) => caches.delete(name))
      )
    )
  );
});
"#;

pub fn render_service_worker(cache_name: &str, urls: &[String]) -> String {
    let urls: Vec<&str> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();

    // JSON string and array literals are valid JavaScript.
    let cache_name = serde_json::to_string(cache_name).unwrap_or_else(|_| "\"courier-cache\"".to_string());
    let urls = serde_json::to_string(&urls).unwrap_or_else(|_| "[]".to_string());

    format!(
        "const CACHE_NAME = {};\nconst URLS_TO_CACHE = {};\n{}",
        cache_name, urls, SCRIPT_BODY
    )
}

pub async fn service_worker(State(state): State<AppState>) -> impl IntoResponse {
    let script = render_service_worker(&state.config.sw_cache_name, &state.config.sw_precache);
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        script,
    )
}
