#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Listing endpoint tests: filters, ordering, pagination and redaction.

mod common;

use axum::http::StatusCode;
use chrono::{TimeDelta, Utc};

use armeta_kernel::models::{EngagementKind, ItemKind};
use common::{TestApp, item, titles};

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn second_page_of_twelve_reviews() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    for n in 0..12 {
        app.review(&author, subject, &format!("review {n:02}"), n);
    }

    let (status, body) = app.get("/api/reviews?page=2&limit=5", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        titles(&body),
        ["review 06", "review 05", "review 04", "review 03", "review 02"]
    );
    assert_eq!(body["pagination"]["currentPage"], 2);
    assert_eq!(body["pagination"]["limit"], 5);
    assert_eq!(body["pagination"]["totalData"], 12);
    assert_eq!(body["pagination"]["totalPage"], 3);
    assert_eq!(body["pagination"]["hasNextPage"], true);
}

#[tokio::test]
async fn page_past_the_end_is_empty_success() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    for n in 0..12 {
        app.review(&author, subject, &format!("review {n:02}"), n);
    }

    let (status, body) = app.get("/api/reviews?page=9&limit=5", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
    assert_eq!(body["pagination"]["currentPage"], 9);
    assert_eq!(body["pagination"]["totalData"], 12);
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn empty_listing_has_zero_pages() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/forums", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
    assert_eq!(body["pagination"]["totalData"], 0);
    assert_eq!(body["pagination"]["totalPage"], 0);
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[tokio::test]
async fn malformed_page_and_limit_fall_back_to_defaults() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    for n in 0..12 {
        app.review(&author, subject, &format!("review {n:02}"), n);
    }

    let (status, body) = app.get("/api/reviews?page=abc&limit=-4", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(titles(&body).len(), 10);
}

#[tokio::test]
async fn limit_is_capped_at_configured_maximum() {
    let app = TestApp::with_max_limit(5);
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    for n in 0..8 {
        app.review(&author, subject, &format!("review {n:02}"), n);
    }

    let (_, body) = app.get("/api/reviews?limit=50", None).await;

    assert_eq!(body["pagination"]["limit"], 5);
    assert_eq!(body["pagination"]["totalPage"], 2);
    assert_eq!(titles(&body).len(), 5);
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn search_endpoint_requires_keyword_and_issues_no_query() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/reviews/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "search keyword required");

    let (status, _) = app.get("/api/forums/search?q=%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.store.query_count(), 0);
}

#[tokio::test]
async fn search_matches_text_and_skips_replies() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let graphs = app.subject("Graph Theory");
    let compilers = app.subject("Compilers");

    let parent = app.review(&author, compilers, "Parsing is fun", 0);
    app.review(&author, compilers, "Register allocation", 1);
    app.review(&author, graphs, "Tough exams", 2);

    let mut reply = item(ItemKind::Review, author.user_id, 3);
    reply.reply_to_id = Some(parent);
    reply.title = "parsing follow-up".into();
    app.insert(reply);

    let (status, body) = app.get("/api/reviews/search?q=PARSING", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), ["Parsing is fun"]);

    // Subject names are searched too
    let (_, body) = app.get("/api/reviews/search?q=graph", None).await;
    assert_eq!(titles(&body), ["Tough exams"]);
}

#[tokio::test]
async fn keyword_on_listing_filters_page_and_count_alike() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Databases");
    for n in 0..6 {
        let title = if n % 2 == 0 { "Indexing deep dive" } else { "Exam tips" };
        app.review(&author, subject, title, n);
    }

    let (_, body) = app.get("/api/reviews?search=index&limit=2", None).await;

    assert_eq!(titles(&body).len(), 2);
    assert_eq!(body["pagination"]["totalData"], 3);
    assert_eq!(body["pagination"]["totalPage"], 2);
    assert!(titles(&body).iter().all(|t| t == "Indexing deep dive"));
}

#[tokio::test]
async fn date_range_covers_whole_days() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    app.review(&author, subject, "first of may", 0);
    app.review(&author, subject, "second of may", 24 * 60);
    app.review(&author, subject, "third of may", 48 * 60);
    // 23:59 on May 2nd
    app.review(&author, subject, "late on the second", 24 * 60 + 15 * 60 + 59);

    let (_, body) = app
        .get("/api/reviews?from=2024-05-01&to=2024-05-02", None)
        .await;
    assert_eq!(
        titles(&body),
        ["late on the second", "second of may", "first of may"]
    );

    // A lone bound is ignored
    let (_, body) = app.get("/api/reviews?from=2024-05-03", None).await;
    assert_eq!(titles(&body).len(), 4);

    // A malformed bound matches nothing
    let (status, body) = app
        .get("/api/reviews?from=yesterday&to=2024-05-02", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
    assert_eq!(body["pagination"]["totalData"], 0);
}

#[tokio::test]
async fn subject_and_lecturer_filters() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let algorithms = app.subject("Algorithms");
    let networks = app.subject("Networks");
    let lecturer = app.lecturer("Dr. Hartono");

    app.review(&author, algorithms, "algo", 0);
    app.review(&author, networks, "net", 1);
    let mut with_lecturer = item(ItemKind::Review, author.user_id, 2);
    with_lecturer.lecturer_id = Some(lecturer);
    with_lecturer.title = "lecturer only".into();
    app.insert(with_lecturer);

    let (_, body) = app
        .get(&format!("/api/reviews?id_subject={networks}"), None)
        .await;
    assert_eq!(titles(&body), ["net"]);

    let (_, body) = app
        .get(&format!("/api/reviews?id_lecturer={lecturer}"), None)
        .await;
    assert_eq!(titles(&body), ["lecturer only"]);
    assert_eq!(body["data"][0]["lecturer_name"], "Dr. Hartono");

    let (status, body) = app.get("/api/reviews?id_subject=not-a-uuid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(titles(&body).is_empty());
}

#[tokio::test]
async fn forum_subject_route_and_recent_filter() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Operating Systems");
    let other = app.subject("Statistics");

    let mut fresh = item(ItemKind::Forum, author.user_id, 0);
    fresh.created_at = Utc::now() - TimeDelta::hours(1);
    fresh.subject_id = Some(subject);
    fresh.title = "this week".into();
    app.insert(fresh);

    let mut stale = item(ItemKind::Forum, author.user_id, 0);
    stale.created_at = Utc::now() - TimeDelta::days(40);
    stale.subject_id = Some(subject);
    stale.title = "long ago".into();
    app.insert(stale);

    app.forum(&author, other, "elsewhere", 0);

    let (_, body) = app
        .get(&format!("/api/forums/subject/{subject}"), None)
        .await;
    assert_eq!(titles(&body), ["this week", "long ago"]);

    let (_, body) = app.get("/api/forums?filter=week", None).await;
    assert_eq!(titles(&body), ["this week"]);

    // Explicit range wins over the relative filter
    let (_, body) = app
        .get("/api/forums?filter=week&from=2024-05-01&to=2024-05-01", None)
        .await;
    assert_eq!(titles(&body), ["elsewhere"]);
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test]
async fn most_liked_ordering_breaks_ties_by_recency() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let fans = [app.user("Budi"), app.user("Sari")];
    let subject = app.subject("Algorithms");

    app.review(&author, subject, "no likes", 0);
    let two = app.review(&author, subject, "two likes", 1);
    let one_old = app.review(&author, subject, "one like old", 2);
    let one_new = app.review(&author, subject, "one like new", 3);

    for fan in &fans {
        app.engage(fan, EngagementKind::Like, ItemKind::Review, two);
    }
    app.engage(&fans[0], EngagementKind::Like, ItemKind::Review, one_old);
    app.engage(&fans[1], EngagementKind::Like, ItemKind::Review, one_new);

    let (_, body) = app.get("/api/reviews?sortBy=most_like", None).await;
    assert_eq!(
        titles(&body),
        ["two likes", "one like new", "one like old", "no likes"]
    );
    assert_eq!(body["data"][0]["total_likes"], 2);

    let (_, body) = app
        .get("/api/reviews?sortBy=mostLiked&order=asc", None)
        .await;
    assert_eq!(
        titles(&body),
        ["no likes", "one like new", "one like old", "two likes"]
    );
}

#[tokio::test]
async fn most_replied_and_unknown_sort_key() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");

    app.review(&author, subject, "quiet", 5);
    let busy = app.review(&author, subject, "busy", 0);
    for n in 0..3 {
        let mut reply = item(ItemKind::Review, author.user_id, 10 + n);
        reply.reply_to_id = Some(busy);
        app.insert(reply);
    }

    let (_, body) = app.get("/api/reviews?sortBy=most_reply", None).await;
    assert_eq!(titles(&body), ["busy", "quiet"]);
    assert_eq!(body["data"][0]["total_replies"], 3);

    let (_, body) = app.get("/api/reviews?sortBy=shuffle&order=asc", None).await;
    assert_eq!(titles(&body), ["busy", "quiet"]);
}

// =============================================================================
// Aggregates and visibility
// =============================================================================

#[tokio::test]
async fn viewer_flags_follow_the_viewer() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let fan = app.user("Budi");
    let subject = app.subject("Algorithms");
    let review = app.review(&author, subject, "liked", 0);
    app.engage(&fan, EngagementKind::Like, ItemKind::Review, review);
    app.engage(&author, EngagementKind::Bookmark, ItemKind::Review, review);

    let (_, body) = app.get("/api/reviews", Some(&app.token(&fan))).await;
    assert_eq!(body["data"][0]["total_likes"], 1);
    assert_eq!(body["data"][0]["total_bookmarks"], 1);
    assert_eq!(body["data"][0]["is_liked"], true);
    assert_eq!(body["data"][0]["is_bookmarked"], false);

    let (_, body) = app.get("/api/reviews", None).await;
    assert_eq!(body["data"][0]["is_liked"], false);
    assert_eq!(body["data"][0]["is_bookmarked"], false);
}

#[tokio::test]
async fn anonymous_author_hidden_from_everyone_else() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let other = app.user("Budi");
    let subject = app.subject("Algorithms");

    let mut secret = item(ItemKind::Review, author.user_id, 0);
    secret.subject_id = Some(subject);
    secret.title = "honest opinion".into();
    secret.is_anonymous = true;
    app.insert(secret);

    for token in [None, Some(app.token(&other))] {
        let (_, body) = app.get("/api/reviews", token.as_deref()).await;
        let user = &body["data"][0]["user"];
        assert_eq!(user["name"], "Anonymous");
        assert!(user["id"].is_null());
        assert!(user["image"].is_null());
    }

    let (_, body) = app.get("/api/reviews", Some(&app.token(&author))).await;
    assert_eq!(body["data"][0]["user"]["name"], "Rina");
    assert_eq!(body["data"][0]["user"]["id"], author.user_id.to_string());
}

#[tokio::test]
async fn author_filter_hides_anonymous_items_from_others() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let other = app.user("Budi");
    let subject = app.subject("Algorithms");

    let public = app.review(&author, subject, "public", 0);
    let mut hidden = item(ItemKind::Review, author.user_id, 1);
    hidden.subject_id = Some(subject);
    hidden.title = "hidden".into();
    hidden.is_anonymous = true;
    app.insert(hidden);
    let mut reply = item(ItemKind::Review, author.user_id, 2);
    reply.reply_to_id = Some(public);
    reply.title = "reply".into();
    app.insert(reply);

    let uri = format!("/api/reviews?id_user={}", author.user_id);

    let (_, body) = app.get(&uri, Some(&app.token(&other))).await;
    assert_eq!(titles(&body), ["reply", "public"]);
    assert_eq!(body["pagination"]["totalData"], 2);

    let (_, body) = app.get(&uri, None).await;
    assert_eq!(titles(&body), ["reply", "public"]);

    let (_, body) = app.get(&uri, Some(&app.token(&author))).await;
    assert_eq!(titles(&body), ["reply", "hidden", "public"]);
    assert_eq!(body["pagination"]["totalData"], 3);

    // Without an author filter replies stay out of the listing
    let (_, body) = app.get("/api/reviews", Some(&app.token(&author))).await;
    assert_eq!(titles(&body), ["hidden", "public"]);
}

#[tokio::test]
async fn parent_preview_is_redacted_too() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let replier = app.user("Budi");
    let subject = app.subject("Algorithms");

    let mut parent = item(ItemKind::Review, author.user_id, 0);
    parent.subject_id = Some(subject);
    parent.title = "anonymous parent".into();
    parent.is_anonymous = true;
    let parent_id = app.insert(parent);

    let mut reply = item(ItemKind::Review, replier.user_id, 1);
    reply.reply_to_id = Some(parent_id);
    reply.title = "open reply".into();
    app.insert(reply);

    let uri = format!("/api/reviews?id_user={}", replier.user_id);

    let (_, body) = app.get(&uri, Some(&app.token(&replier))).await;
    let preview = &body["data"][0]["parent"];
    assert_eq!(preview["id"], parent_id.to_string());
    assert_eq!(preview["title"], "anonymous parent");
    assert_eq!(preview["user"]["name"], "Anonymous");
    assert!(preview["user"]["id"].is_null());
    assert_eq!(body["data"][0]["user"]["name"], "Budi");

    let (_, body) = app.get(&uri, Some(&app.token(&author))).await;
    assert_eq!(body["data"][0]["parent"]["user"]["name"], "Rina");
}

#[tokio::test]
async fn repeated_requests_return_identical_pages() {
    let app = TestApp::new();
    let author = app.user("Rina");
    let subject = app.subject("Algorithms");
    // Same timestamp for every item so ordering falls through to the id
    for n in 0..7 {
        app.review(&author, subject, &format!("same time {n}"), 0);
    }

    let (_, first) = app.get("/api/reviews?limit=3&page=2", None).await;
    let (_, second) = app.get("/api/reviews?limit=3&page=2", None).await;
    assert_eq!(first, second);

    let (_, all) = app.get("/api/reviews?limit=7", None).await;
    let all = titles(&all);
    assert_eq!(titles(&first), all[3..6]);
}
