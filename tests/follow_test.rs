mod common;

use quill::models::{follow, Follow};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

async fn follow_rows(app: &common::TestApp, user_id: i32, author_id: i32) -> u64 {
    Follow::find()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.eq(author_id))
        .count(&app.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn follow_is_idempotent_and_unfollow_removes_it() {
    let app = common::spawn_app().await;
    let (reader, token) = common::create_test_user(&app, "reader").await;
    let (author, _) = common::create_test_user(&app, "author").await;
    let follow_path = format!("/{}/follow/", author.username);

    for _ in 0..2 {
        let resp = app.get(&follow_path, Some(&token)).await;
        assert_eq!(resp.status(), 303);
        assert_eq!(common::location(&resp), format!("/{}/", author.username));
    }
    assert_eq!(follow_rows(&app, reader.id, author.id).await, 1);

    let (_, body) = app
        .get_view(&format!("/{}/", author.username), Some(&token))
        .await;
    assert_eq!(body["context"]["following"], true);
    assert_eq!(body["context"]["author"]["follower_count"], 1);

    let resp = app
        .get(&format!("/{}/unfollow/", author.username), Some(&token))
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(follow_rows(&app, reader.id, author.id).await, 0);

    // unfollowing again is harmless
    let resp = app
        .get(&format!("/{}/unfollow/", author.username), Some(&token))
        .await;
    assert_eq!(resp.status(), 303);

    let (_, body) = app
        .get_view(&format!("/{}/", author.username), Some(&token))
        .await;
    assert_eq!(body["context"]["following"], false);
}

#[tokio::test]
async fn self_follow_creates_nothing() {
    let app = common::spawn_app().await;
    let (user, token) = common::create_test_user(&app, "narcissus").await;

    let resp = app
        .get(&format!("/{}/follow/", user.username), Some(&token))
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), format!("/{}/", user.username));
    assert_eq!(Follow::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn following_unknown_user_is_not_found() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "reader").await;

    let resp = app.get("/ghost/follow/", Some(&token)).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn anonymous_follow_redirects_to_login() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "author").await;

    let resp = app.get(&format!("/{}/follow/", author.username), None).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(
        common::location(&resp),
        format!("/auth/login/?next=/{}/follow/", author.username)
    );

    let resp = app.get("/follow/", None).await;
    assert_eq!(common::location(&resp), "/auth/login/?next=/follow/");
    assert_eq!(Follow::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn followed_feed_only_shows_followed_authors() {
    let app = common::spawn_app().await;
    let (_, follower_token) = common::create_test_user(&app, "follower").await;
    let (_, stranger_token) = common::create_test_user(&app, "stranger").await;
    let (author, _) = common::create_test_user(&app, "author").await;
    let (other_author, _) = common::create_test_user(&app, "other").await;

    app.get(&format!("/{}/follow/", author.username), Some(&follower_token))
        .await;

    common::create_test_post(&app, author.id, "for my followers", None).await;
    common::create_test_post(&app, other_author.id, "nobody follows me", None).await;

    let (status, body) = app.get_view("/follow/", Some(&follower_token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["template"], "posts/follow.html");
    assert_eq!(common::page_texts(&body), vec!["for my followers"]);

    let (_, body) = app.get_view("/follow/", Some(&stranger_token)).await;
    assert!(common::page_texts(&body).is_empty());
    assert_eq!(body["context"]["page_obj"]["paginator"]["num_pages"], 1);
}

#[tokio::test]
async fn anonymous_profile_has_no_following_flag() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "author").await;
    common::create_test_post(&app, author.id, "hello", None).await;

    let (status, body) = app.get_view(&format!("/{}/", author.username), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["template"], "posts/profile.html");
    assert!(body["context"].get("following").is_none());
    assert_eq!(body["context"]["author"]["post_count"], 1);
    assert_eq!(body["context"]["author"]["following_count"], 0);
}
