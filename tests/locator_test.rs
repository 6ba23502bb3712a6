//! Tests for hierarchy resolution against a recording fake service.

mod common;

use common::FakeService;
use ga_reports::error::ReportError;
use ga_reports::locator::{resolve, resolve_default_view, HierarchyLevel, PartialRef, Pick, Selection};
use reqwest::Method;
use serde_json::json;

const ACCOUNTS: &str = "management/accounts";

fn items(ids: &[&str]) -> serde_json::Value {
    let items: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "name": format!("name-{}", id)}))
        .collect();
    json!({ "items": items, "totalResults": ids.len() })
}

fn two_of_everything() -> FakeService {
    FakeService::new()
        .respond(Method::GET, ACCOUNTS, items(&["a1", "a2"]))
        .respond(Method::GET, "management/accounts/a1/webproperties", items(&["p1", "p2"]))
        .respond(Method::GET, "management/accounts/a2/webproperties", items(&["p3"]))
        .respond(
            Method::GET,
            "management/accounts/a1/webproperties/p1/profiles",
            items(&["v1", "v2"]),
        )
        .respond(
            Method::GET,
            "management/accounts/a1/webproperties/p2/profiles",
            items(&["v3"]),
        )
        .respond(
            Method::GET,
            "management/accounts/a2/webproperties/p3/profiles",
            items(&["v4"]),
        )
}

mod default_view {
    use super::*;

    #[tokio::test]
    async fn follows_first_entries_only() {
        let service = two_of_everything();

        let target = resolve_default_view(&service, &Selection::default())
            .await
            .unwrap();

        assert_eq!(target.account_id(), "a1");
        assert_eq!(target.web_property_id(), "p1");
        assert_eq!(target.profile_id(), "v1");
        assert_eq!(
            service.paths(),
            vec![
                ACCOUNTS.to_string(),
                "management/accounts/a1/webproperties".to_string(),
                "management/accounts/a1/webproperties/p1/profiles".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_accounts() {
        let service = FakeService::new().respond(Method::GET, ACCOUNTS, json!({"totalResults": 0}));

        let err = resolve_default_view(&service, &Selection::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::NotFound {
                level: HierarchyLevel::Account
            }
        ));
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_properties() {
        let service = FakeService::new()
            .respond(Method::GET, ACCOUNTS, items(&["a1"]))
            .respond(Method::GET, "management/accounts/a1/webproperties", items(&[]));

        let err = resolve_default_view(&service, &Selection::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::NotFound {
                level: HierarchyLevel::Property
            }
        ));
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test]
    async fn empty_views() {
        let service = FakeService::new()
            .respond(Method::GET, ACCOUNTS, items(&["a1"]))
            .respond(Method::GET, "management/accounts/a1/webproperties", items(&["p1"]))
            .respond(
                Method::GET,
                "management/accounts/a1/webproperties/p1/profiles",
                items(&[]),
            );

        let err = resolve_default_view(&service, &Selection::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::NotFound {
                level: HierarchyLevel::View
            }
        ));
    }

    #[tokio::test]
    async fn transport_failure_is_not_reported_as_empty() {
        let service = FakeService::new().fail(Method::GET, ACCOUNTS, 503);

        let err = resolve_default_view(&service, &Selection::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::ApiError { status: 503, .. }));
    }
}

mod selection {
    use super::*;

    #[tokio::test]
    async fn named_account() {
        let service = two_of_everything();
        let selection = Selection {
            account: Pick::Named("name-a2".to_string()),
            ..Default::default()
        };

        let target = resolve_default_view(&service, &selection).await.unwrap();

        assert_eq!(target.to_string(), "a2/p3/v4");
    }

    #[tokio::test]
    async fn index_selection() {
        let service = two_of_everything();
        let selection = Selection {
            property: Pick::Index(1),
            ..Default::default()
        };

        let target = resolve_default_view(&service, &selection).await.unwrap();

        assert_eq!(target.to_string(), "a1/p2/v3");
    }

    #[tokio::test]
    async fn index_out_of_range() {
        let service = two_of_everything();

        let err = resolve_default_view(&service, &Selection::uniform(Pick::Index(5)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::NotFound {
                level: HierarchyLevel::Account
            }
        ));
    }

    #[tokio::test]
    async fn predicate_selection() {
        let service = two_of_everything();
        let selection = Selection {
            view: Pick::matching(|e| e.id == "v2"),
            ..Default::default()
        };

        let target = resolve_default_view(&service, &selection).await.unwrap();

        assert_eq!(target.profile_id(), "v2");
    }
}

mod partial {
    use super::*;

    #[tokio::test]
    async fn explicit_components_are_not_listed() {
        let service = two_of_everything();
        let partial = PartialRef {
            account_id: Some("a1".to_string()),
            web_property_id: Some("p2".to_string()),
            profile_id: None,
        };

        let target = resolve(&service, &partial, &Selection::default())
            .await
            .unwrap();

        assert_eq!(target.to_string(), "a1/p2/v3");
        assert_eq!(
            service.paths(),
            vec!["management/accounts/a1/webproperties/p2/profiles".to_string()]
        );
    }

    #[tokio::test]
    async fn fully_explicit_makes_no_calls() {
        let service = FakeService::new();
        let partial = PartialRef {
            account_id: Some("296593".to_string()),
            web_property_id: Some("UA-296593-56".to_string()),
            profile_id: Some("107283129".to_string()),
        };

        let target = resolve(&service, &partial, &Selection::default())
            .await
            .unwrap();

        assert_eq!(target.profile_id(), "107283129");
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_explicit_account_fails_before_listing() {
        let service = FakeService::new();
        let partial = PartialRef {
            account_id: Some("a/../b".to_string()),
            ..Default::default()
        };

        let err = resolve(&service, &partial, &Selection::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::QueryConstruction(_)));
        assert!(service.calls().is_empty());
    }
}

mod pagination {
    use super::*;

    #[tokio::test]
    async fn follows_start_index() {
        let service = FakeService::new()
            .respond(
                Method::GET,
                ACCOUNTS,
                json!({"items": [{"id": "a1"}], "totalResults": 2}),
            )
            .respond(
                Method::GET,
                ACCOUNTS,
                json!({"items": [{"id": "a2"}], "totalResults": 2}),
            )
            .respond(Method::GET, "management/accounts/a2/webproperties", items(&["p3"]))
            .respond(
                Method::GET,
                "management/accounts/a2/webproperties/p3/profiles",
                items(&["v4"]),
            );

        let selection = Selection {
            account: Pick::Index(1),
            ..Default::default()
        };
        let target = resolve_default_view(&service, &selection).await.unwrap();

        assert_eq!(target.account_id(), "a2");
        let calls = service.calls();
        assert_eq!(calls[0].param("start-index"), Some("1"));
        assert_eq!(calls[1].path, ACCOUNTS);
        assert_eq!(calls[1].param("start-index"), Some("2"));
    }
}
