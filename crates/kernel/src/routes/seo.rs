//! robots.txt and sitemap.xml.
//!
//! The sitemap lists every public page in every locale; `/api` prefixes are
//! left out since they are not pages.

use std::fmt::Write;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::error::AppResult;
use crate::state::AppState;

/// Create the robots/sitemap router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/robots.txt", get(robots))
        .route("/sitemap.xml", get(sitemap))
}

async fn robots(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let config = state.config();
    let body = render_robots(&config.site_url, &config.robots_disallow)?;

    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let routes = page_routes(&state.config().public_paths);
    let lastmod = chrono::Utc::now().format("%Y-%m-%d").to_string();

    let body = render_sitemap(
        &state.config().site_url,
        state.gate().locales().codes(),
        &routes,
        &lastmod,
    )?;

    Ok(([(header::CONTENT_TYPE, "application/xml")], body))
}

fn render_robots(site_url: &str, disallow: &[String]) -> Result<String, std::fmt::Error> {
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for path in disallow {
        writeln!(out, "Disallow: {path}")?;
    }
    writeln!(out, "\nSitemap: {site_url}/sitemap.xml")?;
    Ok(out)
}

/// Public page suffixes in configuration order: `""` for the root, then
/// each non-API prefix.
fn page_routes(public_paths: &[String]) -> Vec<String> {
    let mut routes: Vec<String> = Vec::new();
    for path in public_paths {
        if path == "/api" || path.starts_with("/api/") {
            continue;
        }
        let route = path.trim_end_matches('/').to_string();
        if !routes.contains(&route) {
            routes.push(route);
        }
    }
    routes
}

fn render_sitemap(
    site_url: &str,
    locales: &[String],
    routes: &[String],
    lastmod: &str,
) -> Result<String, std::fmt::Error> {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );

    for locale in locales {
        for route in routes {
            let priority = if route.is_empty() { "1.0" } else { "0.8" };
            let loc = escape_xml(&format!("{site_url}/{locale}{route}"));
            writeln!(
                out,
                "  <url>\n    <loc>{loc}</loc>\n    <lastmod>{lastmod}</lastmod>\n    \
                 <changefreq>daily</changefreq>\n    <priority>{priority}</priority>\n  </url>"
            )?;
        }
    }

    out.push_str("</urlset>\n");
    Ok(out)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
