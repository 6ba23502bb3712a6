//! Tests for the unsampled report executors and their presentation.

mod common;

use common::FakeService;
use ga_reports::error::ReportError;
use ga_reports::locator::ResourceRef;
use ga_reports::presenter;
use ga_reports::reports::{
    delete_report, get_report, list_reports, sessions, Confirmation, DeleteOutcome, MetricsQuery,
};
use reqwest::Method;
use serde_json::json;

const REPORTS: &str =
    "management/accounts/296593/webproperties/UA-296593-56/profiles/107283129/unsampledReports";
const REPORT_ID: &str = "41ir6z5OSOuRDotwkh8wQg";

fn target() -> ResourceRef {
    ResourceRef::new("296593", "UA-296593-56", "107283129").unwrap()
}

fn report_path() -> String {
    format!("{}/{}", REPORTS, REPORT_ID)
}

mod list {
    use super::*;

    #[tokio::test]
    async fn keeps_server_order() {
        let service = FakeService::new().respond(
            Method::GET,
            REPORTS,
            json!({
                "items": [
                    {"id": "z", "title": "Last alphabetically", "status": "PENDING"},
                    {"id": "a", "title": "First alphabetically", "status": "COMPLETED"}
                ],
                "totalResults": 2
            }),
        );

        let reports = list_reports(&service, &target()).await.unwrap();

        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);

        let lines = presenter::report_list(&reports);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Total Unsampled Reports: 2");
    }

    #[tokio::test]
    async fn empty_list_is_a_result() {
        let service = FakeService::new().respond(
            Method::GET,
            REPORTS,
            json!({"kind": "analytics#unsampledReports", "totalResults": 0}),
        );

        let reports = list_reports(&service, &target()).await.unwrap();

        assert!(reports.is_empty());
        assert_eq!(
            presenter::report_list(&reports),
            vec!["Total Unsampled Reports: 0", "No reports found"]
        );
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let service = FakeService::new().fail(Method::GET, REPORTS, 500);

        let err = list_reports(&service, &target()).await.unwrap_err();

        assert!(matches!(err, ReportError::ApiError { status: 500, .. }));
    }
}

mod get {
    use super::*;

    #[tokio::test]
    async fn formats_detail_block() {
        let service = FakeService::new().respond(
            Method::GET,
            &report_path(),
            json!({
                "id": REPORT_ID,
                "title": "T",
                "status": "COMPLETED",
                "downloadType": "DRIVE"
            }),
        );

        let report = get_report(&service, &target(), REPORT_ID)
            .await
            .unwrap()
            .unwrap();

        let lines = presenter::report_detail(&report);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(REPORT_ID));
        assert!(lines[1].contains("T"));
        assert!(lines[2].contains("COMPLETED"));
        assert!(lines[3].contains("DRIVE"));
    }

    #[tokio::test]
    async fn missing_report_is_none() {
        let service = FakeService::new().fail(Method::GET, &report_path(), 404);

        let report = get_report(&service, &target(), REPORT_ID).await.unwrap();

        assert!(report.is_none());
    }

    #[tokio::test]
    async fn forbidden_is_an_error() {
        let service = FakeService::new().fail(Method::GET, &report_path(), 403);

        let err = get_report(&service, &target(), REPORT_ID).await.unwrap_err();

        assert!(matches!(err, ReportError::ApiError { status: 403, .. }));
    }

    #[tokio::test]
    async fn malformed_id_makes_no_call() {
        let service = FakeService::new();

        let err = get_report(&service, &target(), "../profiles")
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::QueryConstruction(_)));
        assert!(service.calls().is_empty());
    }
}

mod delete {
    use super::*;

    fn service() -> FakeService {
        FakeService::new().respond(Method::DELETE, &report_path(), serde_json::Value::Null)
    }

    #[tokio::test]
    async fn declined_makes_no_call() {
        for input in ["n", "N", "", "no", "yes", " y"] {
            let service = service();

            let outcome = delete_report(
                &service,
                &target(),
                REPORT_ID,
                Confirmation::from_input(input),
            )
            .await
            .unwrap();

            assert_eq!(outcome, DeleteOutcome::Declined, "input {input:?}");
            assert!(service.calls().is_empty(), "input {input:?}");
        }
    }

    #[tokio::test]
    async fn confirmed_deletes_once() {
        for input in ["Y", "y"] {
            let service = service();

            let outcome = delete_report(
                &service,
                &target(),
                REPORT_ID,
                Confirmation::from_input(input),
            )
            .await
            .unwrap();

            assert_eq!(outcome, DeleteOutcome::Deleted);
            let calls = service.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].method, Method::DELETE);
            assert_eq!(calls[0].path, report_path());
        }
    }

    #[tokio::test]
    async fn confirmed_with_malformed_id_makes_no_call() {
        let service = service();

        let err = delete_report(&service, &target(), "", Confirmation::from_input("Y"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::QueryConstruction(_)));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn api_failure_is_reported() {
        let service = FakeService::new().fail(Method::DELETE, &report_path(), 403);

        let err = delete_report(&service, &target(), REPORT_ID, Confirmation::from_input("y"))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::ApiError { status: 403, .. }));
        assert_eq!(service.calls().len(), 1);
    }
}

mod metrics {
    use super::*;

    #[tokio::test]
    async fn sessions_for_view() {
        let service = FakeService::new().respond(
            Method::GET,
            "data/ga",
            json!({
                "profileInfo": {"profileId": "107283129", "profileName": "All Web Site Data"},
                "rows": [["4521"]]
            }),
        );

        let summary = sessions(&service, &target(), &MetricsQuery::default())
            .await
            .unwrap();

        assert_eq!(summary.profile_name, "All Web Site Data");
        assert_eq!(summary.rows, vec![vec![4521.0]]);

        let calls = service.calls();
        assert_eq!(calls[0].param("ids"), Some("ga:107283129"));
        assert_eq!(calls[0].param("start-date"), Some("1daysAgo"));
        assert_eq!(calls[0].param("end-date"), Some("today"));
        assert_eq!(calls[0].param("metrics"), Some("ga:sessions"));

        assert_eq!(
            presenter::sessions(&summary),
            vec!["View (Profile): All Web Site Data", "Total Sessions: 4521"]
        );
    }

    #[tokio::test]
    async fn no_rows() {
        let service = FakeService::new().respond(
            Method::GET,
            "data/ga",
            json!({"profileInfo": {"profileName": "Empty view"}}),
        );

        let summary = sessions(&service, &target(), &MetricsQuery::default())
            .await
            .unwrap();

        assert!(summary.rows.is_empty());
        assert_eq!(presenter::sessions(&summary)[1], "No results found");
    }

    #[tokio::test]
    async fn non_numeric_rows() {
        let service = FakeService::new().respond(
            Method::GET,
            "data/ga",
            json!({"rows": [["many"]]}),
        );

        let err = sessions(&service, &target(), &MetricsQuery::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn invalid_metrics_make_no_call() {
        let service = FakeService::new();
        let query = MetricsQuery {
            metrics: "sessions".to_string(),
            ..Default::default()
        };

        let err = sessions(&service, &target(), &query).await.unwrap_err();

        assert!(matches!(err, ReportError::QueryConstruction(_)));
        assert!(service.calls().is_empty());
    }
}
