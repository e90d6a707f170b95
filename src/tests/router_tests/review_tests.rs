use crate::tests::utils::{
    authed, dispatch, get, init_test_db, json_request, response_json, seed_listing, seed_user,
};
use http::Method;
use serde_json::json;

fn post_review(
    db: &crate::db::Database,
    token: &str,
    listing_id: i64,
    rating: i64,
    comment: &str,
) -> (u16, serde_json::Value) {
    let req = json_request(
        Method::POST,
        "/api/reviews",
        token,
        &json!({ "listingId": listing_id, "rating": rating, "comment": comment }),
    );
    let resp = dispatch(req, db);
    let status = resp.status().as_u16();
    (status, response_json(resp))
}

fn listing_aggregates(db: &crate::db::Database, listing_id: i64) -> (f64, i64) {
    let listing = response_json(dispatch(get(&format!("/api/listings/{listing_id}")), db));
    (
        listing["rating"].as_f64().unwrap(),
        listing["reviewCount"].as_i64().unwrap(),
    )
}

#[test]
fn review_requires_a_session() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    let req = http::Request::builder()
        .method(Method::POST)
        .uri("/api/reviews")
        .body(astra::Body::from(
            json!({ "listingId": listing_id, "rating": 5 }).to_string(),
        ))
        .unwrap();

    assert_eq!(dispatch(req, &db).status(), 401);
}

#[test]
fn aggregates_track_the_review_set_exactly() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let (_, alice) = seed_user(&db, "alice@example.com", "user");
    let (_, bob) = seed_user(&db, "bob@example.com", "user");
    let (_, carol) = seed_user(&db, "carol@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    assert_eq!(listing_aggregates(&db, listing_id), (0.0, 0));

    let (status, _) = post_review(&db, &alice, listing_id, 5, "Great bag");
    assert_eq!(status, 201);
    assert_eq!(listing_aggregates(&db, listing_id), (5.0, 1));

    let (_, body) = post_review(&db, &bob, listing_id, 3, "Scuffed zipper");
    let bobs_review = body["id"].as_i64().unwrap();
    post_review(&db, &carol, listing_id, 4, "Solid");

    // 5, 3, 4 -> mean 4.0 over three reviews.
    assert_eq!(listing_aggregates(&db, listing_id), (4.0, 3));

    // Deleting the rating-3 review leaves 5 and 4 -> mean 4.5.
    let resp = dispatch(
        authed(Method::DELETE, &format!("/api/reviews/{bobs_review}"), &bob),
        &db,
    );
    assert_eq!(resp.status(), 200);
    assert_eq!(listing_aggregates(&db, listing_id), (4.5, 2));
}

#[test]
fn deleting_the_last_review_resets_the_aggregates() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let (_, alice) = seed_user(&db, "alice@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    let (_, body) = post_review(&db, &alice, listing_id, 4, "Good");
    let review_id = body["id"].as_i64().unwrap();
    assert_eq!(listing_aggregates(&db, listing_id), (4.0, 1));

    let resp = dispatch(
        authed(Method::DELETE, &format!("/api/reviews/{review_id}"), &alice),
        &db,
    );
    assert_eq!(resp.status(), 200);

    // Sentinel, not a stale value.
    assert_eq!(listing_aggregates(&db, listing_id), (0.0, 0));
}

#[test]
fn one_review_per_reviewer_per_listing() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let (_, alice) = seed_user(&db, "alice@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    let (status, _) = post_review(&db, &alice, listing_id, 5, "Great");
    assert_eq!(status, 201);

    let (status, body) = post_review(&db, &alice, listing_id, 1, "Changed my mind");
    assert_eq!(status, 400);
    assert_eq!(body["error"], "You have already reviewed this listing");

    // The original review and the aggregates are untouched.
    assert_eq!(listing_aggregates(&db, listing_id), (5.0, 1));
    let reviews = response_json(dispatch(
        get(&format!("/api/reviews/listing/{listing_id}")),
        &db,
    ));
    assert_eq!(reviews.as_array().unwrap().len(), 1);
    assert_eq!(reviews[0]["rating"].as_i64().unwrap(), 5);
}

#[test]
fn rating_must_be_one_through_five() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let (_, alice) = seed_user(&db, "alice@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    let (status, _) = post_review(&db, &alice, listing_id, 0, "");
    assert_eq!(status, 400);
    let (status, _) = post_review(&db, &alice, listing_id, 6, "");
    assert_eq!(status, 400);

    assert_eq!(listing_aggregates(&db, listing_id), (0.0, 0));
}

#[test]
fn reviewing_a_missing_listing_is_not_found() {
    let db = init_test_db();
    let (_, alice) = seed_user(&db, "alice@example.com", "user");

    let (status, body) = post_review(&db, &alice, 999, 5, "");
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Listing not found");
}

#[test]
fn only_the_reviewer_or_an_admin_may_delete() {
    let db = init_test_db();
    let (owner_id, owner) = seed_user(&db, "owner@example.com", "user");
    let (_, alice) = seed_user(&db, "alice@example.com", "user");
    let (_, bob) = seed_user(&db, "bob@example.com", "user");
    let (_, admin) = seed_user(&db, "admin@example.com", "admin");
    let listing_id = seed_listing(&db, owner_id);

    let (_, body) = post_review(&db, &alice, listing_id, 5, "Great");
    let review_id = body["id"].as_i64().unwrap();

    for intruder in [&bob, &owner] {
        let resp = dispatch(
            authed(Method::DELETE, &format!("/api/reviews/{review_id}"), intruder),
            &db,
        );
        assert_eq!(resp.status(), 403);
    }
    assert_eq!(listing_aggregates(&db, listing_id), (5.0, 1));

    let resp = dispatch(
        authed(Method::DELETE, &format!("/api/reviews/{review_id}"), &admin),
        &db,
    );
    assert_eq!(resp.status(), 200);
    assert_eq!(listing_aggregates(&db, listing_id), (0.0, 0));

    // Gone now.
    let resp = dispatch(
        authed(Method::DELETE, &format!("/api/reviews/{review_id}"), &admin),
        &db,
    );
    assert_eq!(resp.status(), 404);
}

#[test]
fn review_list_is_paginated_and_carries_the_reviewer_name() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    for (i, rating) in [5, 4, 3, 2].iter().enumerate() {
        let (_, token) = seed_user(&db, &format!("reviewer{i}@example.com"), "user");
        let (status, _) = post_review(&db, &token, listing_id, *rating, "ok");
        assert_eq!(status, 201);
    }

    let page = response_json(dispatch(
        get(&format!("/api/reviews/listing/{listing_id}?limit=2&offset=0")),
        &db,
    ));
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0]["userName"].is_string());
    assert_eq!(page[0]["listingId"].as_i64().unwrap(), listing_id);

    let rest = response_json(dispatch(
        get(&format!("/api/reviews/listing/{listing_id}?limit=10&offset=2")),
        &db,
    ));
    assert_eq!(rest.as_array().unwrap().len(), 2);
}
