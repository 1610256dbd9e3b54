use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};

/// spa_service
///
/// Serves the built frontend from `dir`. Paths that match no file (the client-side
/// routes `/register`, `/login`, `/profile`, ...) get `index.html` with a 200, so the
/// history-mode router in the browser can take over.
pub fn spa_service(dir: impl AsRef<Path>) -> ServeDir<ServeFile> {
    let dir = dir.as_ref();
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}
