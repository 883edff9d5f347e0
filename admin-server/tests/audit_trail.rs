//! Audit trail behaviour
//!
//! Write failures, pagination, ordering, actor resolution, filters and
//! CSV export, at the recorder level and through the HTTP API.

mod common;

use std::time::Duration;

use http::StatusCode;
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use admin_server::audit::{
    AuditAction, AuditError, AuditQuery, AuditRecorder, AuditResource, RequestMeta,
};
use admin_server::auth::Capability;

fn meta() -> RequestMeta {
    RequestMeta {
        ip: Some("203.0.113.9".to_string()),
        user_agent: Some("integration-test".to_string()),
    }
}

#[tokio::test]
async fn write_failure_surfaces_but_logged_variant_swallows() {
    // Unconnected client: every statement fails
    let db: Surreal<Db> = Surreal::init();
    let recorder = AuditRecorder::new(db);

    let err = recorder
        .record(
            "admin:ghost",
            AuditAction::Create,
            AuditResource::ContentItem,
            None,
            None,
            &meta(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Database(_)));

    // The forgiving variant must neither panic nor bubble the error
    recorder
        .record_logged(
            "admin:ghost",
            AuditAction::Create,
            AuditResource::ContentItem,
            None,
            None,
            &meta(),
        )
        .await;
}

#[tokio::test]
async fn empty_actor_is_rejected() {
    let (state, _tmp) = common::test_state().await;

    let err = state
        .get_audit()
        .record(
            "  ",
            AuditAction::Create,
            AuditResource::ContentItem,
            None,
            None,
            &meta(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::MissingActor));
}

#[tokio::test]
async fn pagination_counts_and_page_boundaries() {
    let (state, _tmp) = common::test_state().await;
    let recorder = state.get_audit();

    for i in 0..120 {
        recorder
            .record(
                "admin:loadgen",
                AuditAction::Create,
                AuditResource::Booking,
                Some(format!("booking:{}", i)),
                None,
                &meta(),
            )
            .await
            .unwrap();
    }

    let page2 = recorder
        .query(&AuditQuery {
            page: 2,
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page2.entries.len(), 50);
    assert_eq!(page2.pagination.page, 2);
    assert_eq!(page2.pagination.limit, 50);
    assert_eq!(page2.pagination.total, 120);
    assert_eq!(page2.pagination.pages, 3);

    let page3 = recorder
        .query(&AuditQuery {
            page: 3,
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page3.entries.len(), 20);

    let beyond = recorder
        .query(&AuditQuery {
            page: 4,
            limit: 50,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(beyond.entries.is_empty());
    assert_eq!(beyond.pagination.total, 120);
}

#[tokio::test]
async fn newest_first_ordering() {
    let (state, _tmp) = common::test_state().await;
    let recorder = state.get_audit();

    for resource_id in ["route:first", "route:second", "route:third"] {
        recorder
            .record(
                "admin:seq",
                AuditAction::Update,
                AuditResource::Route,
                Some(resource_id.to_string()),
                None,
                &meta(),
            )
            .await
            .unwrap();
        // created_at has millisecond resolution
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let list = recorder.query(&AuditQuery::default()).await.unwrap();
    let ids: Vec<_> = list
        .entries
        .iter()
        .filter_map(|e| e.resource_id.as_deref())
        .collect();
    assert_eq!(ids, ["route:third", "route:second", "route:first"]);
}

#[tokio::test]
async fn dangling_actor_renders_unknown() {
    let (state, _tmp) = common::test_state().await;
    let (admin_id, _) = common::seed_admin_with_role(
        &state,
        "known@cityhop.test",
        "steady-hand-11",
        "Operations",
        &[],
    )
    .await;
    let recorder = state.get_audit();

    recorder
        .record(
            &admin_id,
            AuditAction::Delete,
            AuditResource::Category,
            None,
            None,
            &meta(),
        )
        .await
        .unwrap();
    recorder
        .record(
            "admin:longgone",
            AuditAction::Delete,
            AuditResource::Category,
            None,
            None,
            &meta(),
        )
        .await
        .unwrap();

    let list = recorder
        .query(&AuditQuery {
            action: Some(AuditAction::Delete),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(list.pagination.total, 2);

    let unknown = list
        .entries
        .iter()
        .find(|e| e.actor == "admin:longgone")
        .unwrap();
    assert_eq!(unknown.actor_name, "Unknown");
    assert_eq!(unknown.actor_email, "");

    let known = list.entries.iter().find(|e| e.actor == admin_id).unwrap();
    assert_eq!(known.actor_name, "known");
    assert_eq!(known.actor_email, "known@cityhop.test");
}

#[tokio::test]
async fn filters_compose() {
    let (state, _tmp) = common::test_state().await;
    let recorder = state.get_audit();

    recorder
        .record(
            "admin:a",
            AuditAction::Create,
            AuditResource::City,
            Some("city:1".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();
    recorder
        .record(
            "admin:a",
            AuditAction::Publish,
            AuditResource::ContentItem,
            Some("content-item:1".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();
    recorder
        .record(
            "admin:b",
            AuditAction::Publish,
            AuditResource::ContentItem,
            Some("content-item:2".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();

    let by_actor = recorder
        .query(&AuditQuery {
            actor_id: Some("admin:a".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_actor.pagination.total, 2);

    let by_action = recorder
        .query(&AuditQuery {
            action: Some(AuditAction::Publish),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_action.pagination.total, 2);

    let both = recorder
        .query(&AuditQuery {
            actor_id: Some("admin:a".to_string()),
            action: Some(AuditAction::Publish),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(both.pagination.total, 1);
    assert_eq!(both.entries[0].resource_id.as_deref(), Some("content-item:1"));

    let by_resource = recorder
        .query(&AuditQuery {
            resource_type: Some(AuditResource::City),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_resource.pagination.total, 1);
}

#[tokio::test]
async fn date_range_is_inclusive() {
    let (state, _tmp) = common::test_state().await;
    let recorder = state.get_audit();

    recorder
        .record(
            "admin:t",
            AuditAction::Create,
            AuditResource::Tag,
            Some("tag:old".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    let cut = shared::util::now_millis();
    tokio::time::sleep(Duration::from_millis(30)).await;
    recorder
        .record(
            "admin:t",
            AuditAction::Create,
            AuditResource::Tag,
            Some("tag:new".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();

    let older = recorder
        .query(&AuditQuery {
            end_date: Some(cut),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(older.pagination.total, 1);
    assert_eq!(older.entries[0].resource_id.as_deref(), Some("tag:old"));

    let newer = recorder
        .query(&AuditQuery {
            start_date: Some(cut),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(newer.pagination.total, 1);
    assert_eq!(newer.entries[0].resource_id.as_deref(), Some("tag:new"));
}

#[tokio::test]
async fn csv_export_header_escaping_and_short_ids() {
    let (state, _tmp) = common::test_state().await;
    let (admin_id, _) = common::seed_admin_with_role(
        &state,
        "exporter@cityhop.test",
        "paper-trail-10",
        "Exporter",
        &[],
    )
    .await;
    let recorder = state.get_audit();

    recorder
        .record(
            &admin_id,
            AuditAction::Update,
            AuditResource::SeoConfig,
            Some("seo_config:homepage".to_string()),
            Some(json!({"note": "title, with \"quotes\""})),
            &meta(),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    recorder
        .record(
            "admin:mystery",
            AuditAction::Delete,
            AuditResource::Media,
            Some("media:banner".to_string()),
            None,
            &meta(),
        )
        .await
        .unwrap();

    let csv = recorder.export_csv(&AuditQuery::default()).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Timestamp,Actor,Action,Resource Type,Resource ID,Details,IP Address"
    );
    assert_eq!(lines.len(), 3);

    // Newest first: the dangling-actor row comes before the update
    assert!(lines[1].contains("Unknown"));
    assert!(lines[1].contains(",delete,media,banner,"));

    assert!(lines[2].contains("exporter (exporter@cityhop.test)"));
    assert!(lines[2].contains(",update,seo-config,homepage,"));
    // Details field carries a comma, so it is quoted with doubled quotes
    assert!(lines[2].contains(r#"""note"""#));
    assert!(lines[2].ends_with("203.0.113.9"));

    // Export honours the same filters as the list endpoint
    let filtered = recorder
        .export_csv(&AuditQuery {
            action: Some(AuditAction::Update),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.lines().count(), 2);
}

#[tokio::test]
async fn audit_log_api_gated_and_exports() {
    let (state, _tmp) = common::test_state().await;
    common::seed_admin_with_role(
        &state,
        "auditor@cityhop.test",
        "ledger-keeper-12",
        "Auditor",
        &[(Capability::ViewAuditLog, true)],
    )
    .await;
    common::seed_admin_with_role(&state, "plain@cityhop.test", "no-entry-13", "Plain", &[]).await;

    let auditor = common::login(&state, "auditor@cityhop.test", "ledger-keeper-12").await;
    let plain = common::login(&state, "plain@cityhop.test", "no-entry-13").await;

    // The two logins above are themselves audited
    let response = common::send(&state, common::get("/api/audit-log", Some(&auditor))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert_eq!(body["data"]["entries"][0]["action"], "login");

    // Query-string filters and paging
    let response = common::send(
        &state,
        common::get("/api/audit-log?action=login&limit=1", Some(&auditor)),
    )
    .await;
    let body = common::body_json(response).await;
    assert_eq!(body["data"]["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert_eq!(body["data"]["pagination"]["pages"], 2);

    // CSV download
    let response = common::send(&state, common::get("/api/audit-log/export", Some(&auditor))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(http::header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(
        response
            .headers()
            .get(http::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("audit-log.csv")
    );
    let text = common::body_text(response).await;
    assert!(text.starts_with("Timestamp,Actor,Action,Resource Type,Resource ID,Details,IP Address\n"));

    // Without view-audit-log both endpoints refuse
    let response = common::send(&state, common::get("/api/audit-log", Some(&plain))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = common::send(&state, common::get("/api/audit-log/export", Some(&plain))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
