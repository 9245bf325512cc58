mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use arena_api::services::registration::JoinRequest;
use arena_api::services::reveal::ROOM_PLACEHOLDER;
use arena_api::store::TournamentStore;

#[tokio::test]
async fn lobby_lists_soonest_first_without_room_fields() {
    let app = common::app();
    let admin = app.admin().await;
    let later = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::days(2), 8)
        .await;
    let sooner = app
        .create_match(&admin, "BATTLE_ROYALE", Utc::now() + Duration::hours(3), 48)
        .await;
    app.update_room(&admin, later, json!({ "roomId": "7001", "roomPassword": "pw" }))
        .await;

    let (status, body) = app.get("/api/tournaments", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["tournaments"].as_array().unwrap();
    let ids: Vec<&str> = list.iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![sooner.to_string(), later.to_string()]);
    for t in list {
        assert!(t.get("roomId").is_none());
        assert!(t.get("roomPassword").is_none());
        assert_eq!(t["status"], "UPCOMING");
    }
}

#[tokio::test]
async fn participant_sees_room_inside_window_others_do_not() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("booyah", "booyah@ff.gg").await;
    let outsider = app.account("lurker", "lurker@ff.gg").await;

    let id = app
        .create_match(&admin, "BATTLE_ROYALE", Utc::now() + Duration::minutes(10), 48)
        .await;
    let (status, _) = app.join(id, &player, "BooyahKing").await;
    assert_eq!(status, StatusCode::OK);
    app.update_room(&admin, id, json!({ "roomId": "558811", "roomPassword": "bermuda" }))
        .await;

    let uri = format!("/api/tournaments/{id}");
    let (status, body) = app.get(&uri, Some(&player.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tournament"]["roomId"], "558811");
    assert_eq!(body["tournament"]["roomPassword"], "bermuda");

    for token in [Some(outsider.token.as_str()), None, Some("garbage")] {
        let (status, body) = app.get(&uri, token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tournament"]["roomId"], ROOM_PLACEHOLDER);
        assert_eq!(body["tournament"]["roomPassword"], ROOM_PLACEHOLDER);
    }
}

#[tokio::test]
async fn participant_waits_until_window_opens() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("early", "early@ff.gg").await;

    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(2), 8)
        .await;
    app.join(id, &player, "EarlyBird").await;
    app.update_room(&admin, id, json!({ "roomId": "1", "roomPassword": "2" }))
        .await;

    let (_, body) = app.get(&format!("/api/tournaments/{id}"), Some(&player.token)).await;
    assert_eq!(body["tournament"]["roomId"], ROOM_PLACEHOLDER);
    assert_eq!(body["tournament"]["roomPassword"], ROOM_PLACEHOLDER);
}

#[tokio::test]
async fn unset_room_is_empty_once_revealed() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("blank", "blank@ff.gg").await;

    let id = app
        .create_match(&admin, "LONE_WOLF", Utc::now() + Duration::minutes(5), 2)
        .await;
    app.join(id, &player, "Lone").await;

    let (_, body) = app.get(&format!("/api/tournaments/{id}"), Some(&player.token)).await;
    assert!(body["tournament"]["roomId"].is_null());
    assert!(body["tournament"]["roomPassword"].is_null());
}

#[tokio::test]
async fn third_player_finds_arena_full() {
    let app = common::app();
    let admin = app.admin().await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 2)
        .await;

    let a = app.account("alpha", "alpha@ff.gg").await;
    let b = app.account("bravo", "bravo@ff.gg").await;
    let c = app.account("charlie", "charlie@ff.gg").await;

    assert_eq!(app.join(id, &a, "Alpha").await.0, StatusCode::OK);
    let (status, body) = app.join(id, &b, "Bravo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tournament"]["participants"].as_array().unwrap().len(), 2);

    let (status, body) = app.join(id, &c, "Charlie").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Arena full");
}

#[tokio::test]
async fn second_join_is_already_registered() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("twice", "twice@ff.gg").await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 4)
        .await;

    let (status, body) = app.join(id, &player, "  Twice  ").await;
    assert_eq!(status, StatusCode::OK);
    let entry = &body["tournament"]["participants"][0];
    assert_eq!(entry["ign"], "Twice");
    assert_eq!(entry["kills"], 0);
    assert_eq!(entry["rank"], 0);

    let (status, body) = app.join(id, &player, "Twice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Already registered");

    let stored = app.store.tournament(id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 1);
}

#[tokio::test]
async fn registration_closes_once_live() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("late", "late@ff.gg").await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() - Duration::minutes(5), 4)
        .await;
    app.update_room(&admin, id, json!({ "status": "LIVE" })).await;

    let (status, body) = app.join(id, &player, "Late").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Registration closed");
}

#[tokio::test]
async fn join_requires_ign_and_uid() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("nameless", "nameless@ff.gg").await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 4)
        .await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/tournaments/{id}/join"),
            Some(&player.token),
            Some(json!({ "ign": "   ", "uid": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IGN and UID are required");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/tournaments/{id}/join"),
            Some(&player.token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn join_unknown_match_or_without_token() {
    let app = common::app();
    let player = app.account("lost", "lost@ff.gg").await;

    let (status, body) = app.join(Uuid::new_v4(), &player, "Lost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Match not found");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/tournaments/not-a-uuid/join",
            Some(&player.token),
            Some(json!({ "ign": "x", "uid": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/tournaments/{}/join", Uuid::new_v4()),
            None,
            Some(json!({ "ign": "x", "uid": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registered_lists_only_joined_matches() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("regular", "regular@ff.gg").await;
    let joined = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 4)
        .await;
    app.create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(2), 4)
        .await;
    app.join(joined, &player, "Regular").await;

    let (status, body) = app.get("/api/tournaments/registered", Some(&player.token)).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["tournaments"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], joined.to_string());

    let (status, _) = app.get("/api/tournaments/registered", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn racing_joins_for_last_slot_admit_exactly_one() {
    let app = common::app();
    let admin = app.admin().await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 1)
        .await;
    let a = app.account("racer_a", "a@ff.gg").await;
    let b = app.account("racer_b", "b@ff.gg").await;

    let (ra, rb) = tokio::join!(app.join(id, &a, "RacerA"), app.join(id, &b, "RacerB"));
    let mut statuses = [ra.0, rb.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let stored = app.store.tournament(id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 1);
}

#[tokio::test]
async fn store_join_is_atomic_under_many_tasks() {
    let app = common::app();
    let admin = app.admin().await;
    let id = app
        .create_match(&admin, "BATTLE_ROYALE", Utc::now() + Duration::hours(1), 5)
        .await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let store = app.store.clone();
            tokio::spawn(async move {
                let request = JoinRequest {
                    user: Uuid::new_v4(),
                    ign: format!("bot{i}"),
                    uid: format!("{i}"),
                };
                store.join_tournament(id, &request, Utc::now()).await.is_ok()
            })
        })
        .collect();

    let mut admitted = 0;
    for h in handles {
        if h.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 5);
    let stored = app.store.tournament(id).await.unwrap().unwrap();
    assert_eq!(stored.participants.len(), 5);
}

#[tokio::test]
async fn missing_body_still_reports_unknown_match_first() {
    let app = common::app();
    let player = app.account("bodyless", "bodyless@ff.gg").await;

    let (status, body) = app
        .send_raw(
            Method::POST,
            &format!("/api/tournaments/{}/join", Uuid::new_v4()),
            Some(&player.token),
            None,
            "",
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Match not found");
}

#[tokio::test]
async fn malformed_join_fields_fall_through_to_field_check() {
    let app = common::app();
    let admin = app.admin().await;
    let player = app.account("typo", "typo@ff.gg").await;
    let id = app
        .create_match(&admin, "CLASH_SQUAD", Utc::now() + Duration::hours(1), 4)
        .await;
    let uri = format!("/api/tournaments/{id}/join");

    let (status, body) = app
        .send(Method::POST, &uri, Some(&player.token), Some(json!({ "ign": 123, "uid": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IGN and UID are required");

    let (status, body) = app
        .send_raw(Method::POST, &uri, Some(&player.token), None, "")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IGN and UID are required");

    let (status, body) = app
        .send_raw(Method::POST, &uri, Some(&player.token), Some("application/json"), "{not json")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "IGN and UID are required");
}

#[tokio::test]
async fn full_match_outranks_bad_body() {
    let app = common::app();
    let admin = app.admin().await;
    let first = app.account("first_in", "first_in@ff.gg").await;
    let late = app.account("late_in", "late_in@ff.gg").await;
    let id = app
        .create_match(&admin, "LONE_WOLF", Utc::now() + Duration::hours(1), 1)
        .await;
    app.join(id, &first, "FirstIn").await;

    let (status, body) = app
        .send_raw(Method::POST, &format!("/api/tournaments/{id}/join"), Some(&late.token), None, "")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Arena full");
}
