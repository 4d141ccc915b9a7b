// handlers/web/mod.rs - Server-rendered pages

use askama::Template;
use axum::response::Html;
use chrono::Datelike;

use crate::config::config;
use crate::error::ApiError;

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomePage<'a> {
    pub project_name: &'a str,
    pub year: i32,
}

/// GET /
pub async fn home() -> Result<Html<String>, ApiError> {
    let page = HomePage {
        project_name: &config().project_name,
        year: chrono::Utc::now().year(),
    };
    let body = page.render().map_err(|e| {
        tracing::error!("Failed to render home page: {}", e);
        ApiError::internal_server_error("Unable to render page")
    })?;
    Ok(Html(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_page_names_the_project() {
        let html = HomePage { project_name: "Frame", year: 2024 }.render().unwrap();
        assert!(html.contains("<title>Frame</title>"));
        assert!(html.contains("2024 Frame"));
    }
}
