use axum::http::StatusCode;
use serde_json::json;

use crate::testing::TestContext;

#[tokio::test]
async fn blog_lists_published_posts_newest_first() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();

    for (slug, published_at, tags) in [
        ("older", "2024-01-01T00:00:00.000Z", json!(["rust"])),
        ("newer", "2024-06-01T00:00:00.000Z", json!(["design", "rust", "Éclat"])),
    ] {
        let res = ctx
            .post(
                "/api/blog",
                json!({
                    "slug": slug, "title": slug, "excerpt": "e", "content": "c", "author": "Ana",
                    "tags": tags, "isPublished": true, "publishedAt": published_at
                }),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    }
    ctx.post(
        "/api/blog",
        json!({"slug": "draft", "title": "Draft", "excerpt": "e", "content": "c"}),
        Some(&token),
    )
    .await;

    let res = ctx.get("/api/blog").await;
    let slugs: Vec<&str> = res.body.as_array().unwrap().iter().filter_map(|p| p["slug"].as_str()).collect();
    assert_eq!(slugs, vec!["newer", "older"]);

    let res = ctx.get("/api/blog?tag=design").await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["tags"], json!(["design", "rust", "Éclat"]));

    // éclat
    let res = ctx.get("/api/blog?tag=%C3%A9clat").await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = ctx.get("/api/blog/older").await;
    assert_eq!(res.body["author"], "Ana");

    let res = ctx.get("/api/blog/draft").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), Some("POST_NOT_FOUND"));
}

#[tokio::test]
async fn blog_slugs_are_validated_and_unique() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();
    let post = json!({"slug": "launch", "title": "Launch", "excerpt": "e", "content": "c"});

    assert_eq!(ctx.post("/api/blog", post.clone(), Some(&token)).await.status, StatusCode::CREATED);
    let res = ctx.post("/api/blog", post, Some(&token)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), Some("SLUG_TAKEN"));

    let res = ctx
        .post("/api/blog", json!({"slug": "Bad Slug", "title": "t", "excerpt": "e", "content": "c"}), Some(&token))
        .await;
    assert_eq!(res.code(), Some("INVALID_SLUG"));

    let res = ctx.post("/api/blog", json!({"slug": "x", "title": "t"}), None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn portfolio_filters_by_category_and_featured() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();
    for (slug, category, featured, order) in [("a", "web", true, 2), ("b", "web", false, 1), ("c", "mobile", true, 3)] {
        let res = ctx
            .post(
                "/api/portfolio",
                json!({
                    "slug": slug, "title": slug, "client": "Client", "category": category,
                    "description": "d", "technologies": ["Rust"], "isFeatured": featured, "displayOrder": order
                }),
                Some(&token),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{:?}", res.body);
    }

    let slugs = |body: &serde_json::Value| -> Vec<String> {
        body.as_array().unwrap().iter().filter_map(|p| p["slug"].as_str().map(String::from)).collect()
    };
    assert_eq!(slugs(&ctx.get("/api/portfolio").await.body), vec!["b", "a", "c"]);
    assert_eq!(slugs(&ctx.get("/api/portfolio?category=web").await.body), vec!["b", "a"]);
    assert_eq!(slugs(&ctx.get("/api/portfolio?featured=true").await.body), vec!["a", "c"]);
    assert_eq!(ctx.get("/api/portfolio?featured=maybe").await.code(), Some("INVALID_FIELD"));
}

#[tokio::test]
async fn testimonial_ratings_are_bounded() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();
    let base = json!({"clientName": "Bo", "clientRole": "CTO", "company": "Acme", "content": "Great"});

    let res = ctx.post("/api/testimonials", base.clone(), Some(&token)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["rating"], json!(5));

    let mut bad = base.clone();
    bad["rating"] = json!(6);
    assert_eq!(ctx.post("/api/testimonials", bad, Some(&token)).await.code(), Some("INVALID_RATING"));

    let mut featured = base;
    featured["rating"] = json!(4);
    featured["isFeatured"] = json!(true);
    ctx.post("/api/testimonials", featured, Some(&token)).await;

    assert_eq!(ctx.get("/api/testimonials").await.body.as_array().unwrap().len(), 2);
    let res = ctx.get("/api/testimonials?featured=true").await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["rating"], json!(4));
}

#[tokio::test]
async fn team_lists_only_active_members() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();
    ctx.post("/api/team", json!({"name": "Ana", "role": "Lead", "bio": "b"}), Some(&token)).await;
    ctx.post("/api/team", json!({"name": "Bo", "role": "Dev", "bio": "b", "isActive": false}), Some(&token))
        .await;
    let res = ctx.post("/api/team", json!({"name": "Cy", "role": "Dev"}), Some(&token)).await;
    assert_eq!(res.code(), Some("MISSING_FIELD"));

    let res = ctx.get("/api/team").await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["name"], "Ana");
}

#[tokio::test]
async fn blog_published_at_must_be_a_timestamp() {
    let ctx = TestContext::new().await.unwrap();
    let token = ctx.staff_token().await.unwrap();
    let post = |slug: &str, published_at: &str| {
        json!({
            "slug": slug, "title": slug, "excerpt": "e", "content": "c",
            "isPublished": true, "publishedAt": published_at
        })
    };

    let res = ctx.post("/api/blog", post("bad-date", "last tuesday"), Some(&token)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some("INVALID_FIELD"));

    let res = ctx.post("/api/blog", post("offset", "2024-06-01T02:30:00+02:00"), Some(&token)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["publishedAt"], "2024-06-01T00:30:00.000Z");

    let res = ctx.post("/api/blog", post("later", "2024-06-01T01:00:00Z"), Some(&token)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = ctx.get("/api/blog").await;
    let slugs: Vec<&str> = res.body.as_array().unwrap().iter().filter_map(|p| p["slug"].as_str()).collect();
    assert_eq!(slugs, vec!["later", "offset"]);
}
