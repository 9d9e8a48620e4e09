//! Public surface: health probe, sitemap, service catalog and the contact
//! form submission endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::AppConfig,
    middleware::error_handling::{AppError, Result},
    models::inquiry::{CreateInquiryRequest, InquiryResponse, ServiceType},
    services::InquiryService,
};

/// The public pages of the site, with their sitemap change frequency and
/// priority.
const PUBLIC_PAGES: [(&str, &str, &str); 5] = [
    ("", "monthly", "1.0"),
    ("/services", "monthly", "0.9"),
    ("/marriage", "monthly", "0.8"),
    ("/pre-marriage", "monthly", "0.8"),
    ("/contact", "monthly", "0.7"),
];

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "counsel-desk",
    }))
}

pub async fn service_catalog() -> Json<Vec<&'static str>> {
    Json(ServiceType::ALL.iter().map(|s| s.as_str()).collect())
}

pub async fn sitemap(State(config): State<AppConfig>) -> Response {
    let body = sitemap_xml(&config.site_url, chrono::Utc::now().date_naive());
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

fn sitemap_xml(base_url: &str, last_modified: chrono::NaiveDate) -> String {
    let base = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for (path, change_frequency, priority) in PUBLIC_PAGES {
        xml.push_str(&format!(
            "  <url>\n    <loc>{base}{path}</loc>\n    <lastmod>{last_modified}</lastmod>\n    \
             <changefreq>{change_frequency}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n"
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Contact form submission. Invalid input never reaches storage; a valid
/// submission creates one pending inquiry.
pub async fn submit_inquiry(
    State(config): State<AppConfig>,
    Json(request): Json<CreateInquiryRequest>,
) -> Result<(StatusCode, Json<InquiryResponse>)> {
    request.validate().map_err(AppError::Validation)?;

    let service = InquiryService::new(crate::repositories::InquiryRepository::new(
        config.database_pool.clone(),
        config.inquiry_events.clone(),
    ));

    let inquiry = service.submit(&request).await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}
