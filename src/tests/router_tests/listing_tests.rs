use crate::db::listings::{insert_listing, set_availability};
use crate::tests::utils::{
    dispatch, get, init_test_db, listing_fixture, response_json, seed_listing, seed_user,
};

#[test]
fn listing_by_id_serializes_the_wire_shape() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");
    let listing_id = seed_listing(&db, owner_id);

    let resp = dispatch(get(&format!("/api/listings/{listing_id}")), &db);
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap().to_str().unwrap(),
        "application/json; charset=utf-8"
    );

    let listing = response_json(resp);
    assert_eq!(listing["id"].as_i64().unwrap(), listing_id);
    assert_eq!(listing["ownerId"].as_i64().unwrap(), owner_id);
    assert_eq!(listing["location"], "Boulder, CO");
    assert_eq!(listing["available"], true);
    assert_eq!(listing["pricingSchedule"]["dailyRate"].as_f64().unwrap(), 35.0);
    assert_eq!(listing["pricingSchedule"]["weeklyRate"].as_f64().unwrap(), 210.0);
    assert_eq!(listing["pricingSchedule"]["minimumDays"].as_i64().unwrap(), 1);
    assert_eq!(listing["rating"].as_f64().unwrap(), 0.0);
    assert_eq!(listing["reviewCount"].as_i64().unwrap(), 0);
}

#[test]
fn missing_listing_is_not_found() {
    let db = init_test_db();

    let resp = dispatch(get("/api/listings/42"), &db);
    assert_eq!(resp.status(), 404);
    assert_eq!(response_json(resp)["error"], "Listing not found");
}

#[test]
fn featured_endpoint_filters_paused_and_unfeatured_listings() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");

    let plain = seed_listing(&db, owner_id);

    let mut featured = listing_fixture(owner_id);
    featured.featured = true;
    let featured_id = insert_listing(&db, &featured).unwrap();

    let mut paused = listing_fixture(owner_id);
    paused.featured = true;
    let paused_id = insert_listing(&db, &paused).unwrap();
    set_availability(&db, paused_id, false).unwrap();

    let found = response_json(dispatch(get("/api/listings/featured"), &db));
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"].as_i64().unwrap(), featured_id);
    assert_ne!(found[0]["id"].as_i64().unwrap(), plain);
}

#[test]
fn search_matches_location_substring() {
    let db = init_test_db();
    let (owner_id, _) = seed_user(&db, "owner@example.com", "user");

    seed_listing(&db, owner_id); // Boulder, CO

    let mut elsewhere = listing_fixture(owner_id);
    elsewhere.location = "Moab, UT".into();
    insert_listing(&db, &elsewhere).unwrap();

    let found = response_json(dispatch(get("/api/listings/search?location=Boulder"), &db));
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["location"], "Boulder, CO");

    let all = response_json(dispatch(get("/api/listings"), &db));
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[test]
fn unknown_routes_are_not_found() {
    let db = init_test_db();

    let resp = dispatch(get("/api/listings/1/bids"), &db);
    assert_eq!(resp.status(), 404);

    let resp = dispatch(get("/totally/elsewhere"), &db);
    assert_eq!(resp.status(), 404);
}

#[test]
fn health_check_answers() {
    let db = init_test_db();

    let resp = dispatch(get("/api/health"), &db);
    assert_eq!(resp.status(), 200);
    assert_eq!(response_json(resp)["status"], "ok");
}
