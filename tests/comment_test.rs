mod common;

use quill::models::Comment;
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn authenticated_user_can_comment() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "author").await;
    let (commenter, token) = common::create_test_user(&app, "commenter").await;
    let post = common::create_test_post(&app, author.id, "discuss", None).await;
    let detail = format!("/{}/{}/", author.username, post.id);

    let resp = app
        .post_form(
            &format!("{}comment/", detail),
            Some(&token),
            &[("text", "Nice post"), ("author", &author.id.to_string())],
        )
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), detail);

    let comments = Comment::find().all(&app.db).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_id, commenter.id);
    assert_eq!(comments[0].post_id, post.id);

    let (_, body) = app.get_view(&detail, None).await;
    assert_eq!(body["context"]["comments"][0]["text"], "Nice post");
    assert_eq!(
        body["context"]["comments"][0]["author"]["username"],
        commenter.username
    );
}

#[tokio::test]
async fn comments_are_newest_first() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "author").await;
    let post = common::create_test_post(&app, author.id, "discuss", None).await;
    let comment_path = format!("/{}/{}/comment/", author.username, post.id);

    for text in ["first", "second", "third"] {
        app.post_form(&comment_path, Some(&token), &[("text", text)])
            .await;
    }

    let (_, body) = app
        .get_view(&format!("/{}/{}/", author.username, post.id), None)
        .await;
    let texts: Vec<&str> = body["context"]["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn anonymous_comment_redirects_to_login() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "author").await;
    let post = common::create_test_post(&app, author.id, "discuss", None).await;
    let comment_path = format!("/{}/{}/comment/", author.username, post.id);

    let resp = app.post_form(&comment_path, None, &[("text", "drive-by")]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(
        common::location(&resp),
        format!("/auth/login/?next={}", comment_path)
    );
    assert_eq!(Comment::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn blank_comment_redisplays_post_with_errors() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "author").await;
    let post = common::create_test_post(&app, author.id, "discuss", None).await;

    let resp = app
        .post_form(
            &format!("/{}/{}/comment/", author.username, post.id),
            Some(&token),
            &[("text", "  ")],
        )
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["template"], "posts/post.html");
    assert_eq!(body["context"]["comment"], true);
    assert_eq!(
        body["context"]["form"]["errors"]["text"][0],
        "This field is required."
    );
    assert_eq!(body["context"]["post"]["text"], "discuss");
    assert_eq!(Comment::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "author").await;

    let resp = app
        .post_form(
            &format!("/{}/12345/comment/", author.username),
            Some(&token),
            &[("text", "hello?")],
        )
        .await;
    assert_eq!(resp.status(), 404);
}
