//! Admin inquiry management: list/filter, live snapshot stream, detail,
//! status transitions, notes, delete, stats and exports.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use tokio::sync::broadcast;
use validator::Validate;

use crate::{
    config::AppConfig,
    middleware::error_handling::{AppError, Result},
    models::inquiry::{
        InquiryFilter, InquiryResponse, InquiryStats, UpdateNotesRequest, UpdateStatusRequest,
    },
    repositories::InquiryRepository,
    services::{export_service, InquiryService},
};

fn inquiry_repo(config: &AppConfig) -> InquiryRepository {
    InquiryRepository::new(config.database_pool.clone(), config.inquiry_events.clone())
}

fn inquiry_service(config: &AppConfig) -> InquiryService {
    InquiryService::new(inquiry_repo(config))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub service_type: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<InquiryFilter> {
        InquiryFilter::from_params(self.service_type.as_deref(), self.status.as_deref())
            .map_err(|err| AppError::BadRequest(format!("Unknown filter value: {}", err.0)))
    }
}

pub async fn list_inquiries(
    State(config): State<AppConfig>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<InquiryResponse>>> {
    let filter = params.filter()?;
    let inquiries = inquiry_service(&config).list(&filter).await?;
    Ok(Json(inquiries))
}

/// Live view of the collection: one full, re-ordered snapshot immediately,
/// then a fresh snapshot after every underlying change. A lagged subscriber
/// just gets the most recent snapshot; the stream ends when the client
/// disconnects.
pub async fn stream_inquiries(
    State(config): State<AppConfig>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let repo = inquiry_repo(&config);
    let changes = repo.subscribe();

    let stream = futures::stream::unfold(
        (repo, changes, true),
        |(repo, mut changes, initial)| async move {
            if !initial {
                loop {
                    match changes.recv().await {
                        Ok(()) => break,
                        // Missed signals coalesce into the next snapshot.
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }

            let snapshot: Vec<InquiryResponse> = match repo.list_all().await {
                Ok(inquiries) => inquiries.into_iter().map(Into::into).collect(),
                Err(err) => {
                    tracing::error!("Failed to load inquiry snapshot: {}", err);
                    return None;
                }
            };

            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => Some((Ok(event), (repo, changes, false))),
                Err(err) => {
                    tracing::error!("Failed to encode inquiry snapshot: {}", err);
                    None
                }
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn get_stats(State(config): State<AppConfig>) -> Result<Json<InquiryStats>> {
    let stats = inquiry_service(&config).stats().await?;
    Ok(Json(stats))
}

pub async fn get_inquiry(
    State(config): State<AppConfig>,
    Path(id): Path<String>,
) -> Result<Json<InquiryResponse>> {
    let inquiry = inquiry_service(&config).get(&id).await?;
    Ok(Json(inquiry))
}

pub async fn update_status(
    State(config): State<AppConfig>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<InquiryResponse>> {
    let inquiry = inquiry_service(&config)
        .update_status(&id, request.status)
        .await?;
    Ok(Json(inquiry))
}

pub async fn update_notes(
    State(config): State<AppConfig>,
    Path(id): Path<String>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<InquiryResponse>> {
    request.validate().map_err(AppError::Validation)?;

    let inquiry = inquiry_service(&config)
        .save_notes(&id, &request.notes)
        .await?;
    Ok(Json(inquiry))
}

pub async fn delete_inquiry(
    State(config): State<AppConfig>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    inquiry_service(&config).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export_inquiries_csv(State(config): State<AppConfig>) -> Result<Response> {
    let inquiries = inquiry_repo(&config).list_all().await?;
    let csv = export_service::inquiries_to_csv(&inquiries)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inquiries.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn inquiry_report(State(config): State<AppConfig>) -> Result<Response> {
    let inquiries = inquiry_repo(&config).list_all().await?;
    let report = export_service::summary_report(&inquiries);

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report,
    )
        .into_response())
}
