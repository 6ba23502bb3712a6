//! Operations on the unsampled reports of a view, plus the sessions query.

use reqwest::Method;
use tracing::{debug, info};

use crate::client::{list_items, ServiceCall};
use crate::error::{ReportError, Result};
use crate::ids::validate_id;
use crate::locator::ResourceRef;
use crate::models::{GaDataResponse, ReportRecord, SessionsSummary};

/// The answer that allows a destructive call.
pub const AFFIRMATIVE: &str = "Y";

/// A user's answer to a destructive-action prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    affirmed: bool,
}

impl Confirmation {
    /// Interpret one input line. Only `Y` (either case) confirms.
    pub fn from_input(input: &str) -> Self {
        let answer = input.trim_end_matches(['\r', '\n']);
        Self {
            affirmed: answer.eq_ignore_ascii_case(AFFIRMATIVE),
        }
    }

    pub fn declined() -> Self {
        Self { affirmed: false }
    }

    pub fn is_affirmed(&self) -> bool {
        self.affirmed
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user did not confirm; nothing was sent.
    Declined,
}

/// List the unsampled reports of a view in server order.
pub async fn list_reports<S: ServiceCall>(
    service: &S,
    target: &ResourceRef,
) -> Result<Vec<ReportRecord>> {
    let reports: Vec<ReportRecord> = list_items(service, &target.reports_path()).await?;
    info!(view = %target, count = reports.len(), "listed unsampled reports");
    Ok(reports)
}

/// Get one unsampled report. Returns `None` when the report does not exist.
pub async fn get_report<S: ServiceCall>(
    service: &S,
    target: &ResourceRef,
    report_id: &str,
) -> Result<Option<ReportRecord>> {
    let path = target.report_path(report_id)?;

    match service.call(Method::GET, &path, &[]).await {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(ReportError::ApiError { status: 404, .. }) => {
            debug!(report_id, "unsampled report not found");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Delete an unsampled report, but only after an affirmative confirmation.
pub async fn delete_report<S: ServiceCall>(
    service: &S,
    target: &ResourceRef,
    report_id: &str,
    confirmation: Confirmation,
) -> Result<DeleteOutcome> {
    if !confirmation.is_affirmed() {
        info!(report_id, "delete declined");
        return Ok(DeleteOutcome::Declined);
    }

    let path = target.report_path(report_id)?;
    service.call(Method::DELETE, &path, &[]).await?;
    info!(view = %target, report_id, "deleted unsampled report");
    Ok(DeleteOutcome::Deleted)
}

/// Core Reporting query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsQuery {
    pub start_date: String,
    pub end_date: String,
    pub metrics: String,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self {
            start_date: "1daysAgo".to_string(),
            end_date: "today".to_string(),
            metrics: "ga:sessions".to_string(),
        }
    }
}

/// Run a metric query (sessions by default) against a view.
pub async fn sessions<S: ServiceCall>(
    service: &S,
    target: &ResourceRef,
    query: &MetricsQuery,
) -> Result<SessionsSummary> {
    validate_id("start date", &query.start_date)?;
    validate_id("end date", &query.end_date)?;
    if query.metrics.is_empty() || query.metrics.split(',').any(|m| !m.starts_with("ga:")) {
        return Err(ReportError::QueryConstruction(format!(
            "invalid metrics: {:?}",
            query.metrics
        )));
    }

    let ids = target.ga_ids();
    let value = service
        .call(
            Method::GET,
            "data/ga",
            &[
                ("ids", ids.as_str()),
                ("start-date", query.start_date.as_str()),
                ("end-date", query.end_date.as_str()),
                ("metrics", query.metrics.as_str()),
            ],
        )
        .await?;
    let data: GaDataResponse = serde_json::from_value(value)?;

    let rows = data
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    cell.parse::<f64>().map_err(|_| {
                        ReportError::InvalidResponse(format!("non-numeric metric value {:?}", cell))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SessionsSummary {
        profile_name: data
            .profile_info
            .and_then(|p| p.profile_name)
            .unwrap_or_else(|| target.profile_id().to_string()),
        rows,
    })
}
