mod common;

use quill::forms::upload::INVALID_IMAGE;
use quill::models::Post;
use reqwest::multipart::{Form, Part};
use sea_orm::{EntityTrait, PaginatorTrait};

#[tokio::test]
async fn new_post_is_saved_with_submitter_as_author() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;
    let (other, _) = common::create_test_user(&app, "other").await;
    let group = common::create_test_group(&app, "novels").await;

    let form = Form::new()
        .text("text", "Hello from the test")
        .text("group", group.id.to_string())
        .text("author", other.id.to_string());
    let resp = app.post_multipart("/new/", Some(&token), form).await;

    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), "/");

    let posts = Post::find().all(&app.db).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, author.id);
    assert_eq!(posts[0].text, "Hello from the test");
    assert_eq!(posts[0].group_id, Some(group.id));
    assert_eq!(posts[0].image, None);
}

#[tokio::test]
async fn new_post_accepts_urlencoded_form() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;

    let resp = app
        .post_form("/new/", Some(&token), &[("text", "plain form"), ("group", "")])
        .await;
    assert_eq!(resp.status(), 303);

    let posts = Post::find().all(&app.db).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author_id, author.id);
    assert_eq!(posts[0].group_id, None);
}

#[tokio::test]
async fn anonymous_post_redirects_to_login() {
    let app = common::spawn_app().await;

    let resp = app.post_form("/new/", None, &[("text", "sneaky")]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), "/auth/login/?next=/new/");

    let resp = app.get("/new/", None).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), "/auth/login/?next=/new/");

    assert_eq!(Post::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn new_post_form_lists_groups() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "leo").await;
    common::create_test_group(&app, "poems").await;

    let (status, body) = app.get_view("/new/", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["template"], "posts/new_post.html");
    assert_eq!(body["context"]["is_edit"], false);
    assert_eq!(body["context"]["groups"][0]["slug"], "poems");
    assert_eq!(body["context"]["form"]["data"]["text"], "");
}

#[tokio::test]
async fn blank_text_and_unknown_group_are_field_errors() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "leo").await;

    let resp = app
        .post_form("/new/", Some(&token), &[("text", "   "), ("group", "999")])
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["template"], "posts/new_post.html");
    assert_eq!(body["context"]["form"]["errors"]["text"][0], "This field is required.");
    assert_eq!(
        body["context"]["form"]["errors"]["group"][0],
        "Select a valid choice. That choice is not one of the available choices."
    );
    assert_eq!(Post::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "leo").await;

    let form = Form::new().text("text", "with a fake image").part(
        "image",
        Part::bytes(b"definitely not a picture".to_vec())
            .file_name("small.gif")
            .mime_str("image/gif")
            .unwrap(),
    );
    let resp = app.post_multipart("/new/", Some(&token), form).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["context"]["form"]["errors"]["image"][0], INVALID_IMAGE);
    assert_eq!(body["context"]["form"]["data"]["text"], "with a fake image");
    assert_eq!(Post::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn image_upload_is_stored_and_served() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;

    let form = Form::new().text("text", "with a picture").part(
        "image",
        Part::bytes(common::png_bytes())
            .file_name("small.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let resp = app.post_multipart("/new/", Some(&token), form).await;
    assert_eq!(resp.status(), 303);

    let post = Post::find().one(&app.db).await.unwrap().unwrap();
    let image = post.image.clone().unwrap();
    assert!(image.starts_with("posts/"));
    assert!(image.ends_with(".png"));
    assert!(app.media_root().join(&image).exists());

    let (status, body) = app
        .get_view(&format!("/{}/{}/", author.username, post.id), None)
        .await;
    assert_eq!(status, 200);
    let url = body["context"]["post"]["image"].as_str().unwrap().to_string();
    assert_eq!(url, format!("/media/{}", image));

    let resp = app.get(&url, None).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), common::png_bytes());
}

#[tokio::test]
async fn new_post_shows_up_on_every_listing() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;
    let group = common::create_test_group(&app, "stories").await;

    let resp = app
        .post_form(
            "/new/",
            Some(&token),
            &[("text", "visible everywhere"), ("group", &group.id.to_string())],
        )
        .await;
    assert_eq!(resp.status(), 303);
    let post = Post::find().one(&app.db).await.unwrap().unwrap();

    for path in [
        "/".to_string(),
        format!("/{}/", author.username),
        "/group/stories/".to_string(),
    ] {
        let (status, body) = app.get_view(&path, None).await;
        assert_eq!(status, 200, "{}", path);
        assert_eq!(common::page_texts(&body), vec!["visible everywhere"], "{}", path);
    }

    let (status, body) = app
        .get_view(&format!("/{}/{}/", author.username, post.id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["template"], "posts/post.html");
    assert_eq!(body["context"]["post"]["text"], "visible everywhere");
    assert_eq!(body["context"]["post"]["author"]["username"], author.username);
    assert_eq!(body["context"]["post"]["group"]["slug"], "stories");
    assert_eq!(body["context"]["author"]["post_count"], 1);
    assert_eq!(body["context"]["comment"], false);
}

#[tokio::test]
async fn listings_are_newest_first_and_paginated() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "leo").await;
    for i in 0..13 {
        common::create_test_post(&app, author.id, &format!("post {}", i), None).await;
    }

    let (_, body) = app.get_view("/", None).await;
    let texts = common::page_texts(&body);
    assert_eq!(texts.len(), 10);
    assert_eq!(texts[0], "post 12");
    assert_eq!(texts[9], "post 3");
    let paginator = &body["context"]["page_obj"]["paginator"];
    assert_eq!(paginator["number"], 1);
    assert_eq!(paginator["num_pages"], 2);
    assert_eq!(paginator["count"], 13);
    assert_eq!(paginator["has_next"], true);

    let (_, body) = app.get_view("/?page=2", None).await;
    assert_eq!(common::page_texts(&body), vec!["post 2", "post 1", "post 0"]);

    let (_, body) = app.get_view("/?page=99", None).await;
    assert_eq!(body["context"]["page_obj"]["paginator"]["number"], 2);

    let (_, body) = app.get_view("/?page=abc", None).await;
    assert_eq!(body["context"]["page_obj"]["paginator"]["number"], 1);

    let (_, body) = app
        .get_view(&format!("/{}/?page=2", author.username), None)
        .await;
    assert_eq!(common::page_texts(&body).len(), 3);
}

#[tokio::test]
async fn empty_feed_has_one_empty_page() {
    let app = common::spawn_app().await;

    let (status, body) = app.get_view("/", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["template"], "posts/index.html");
    assert!(common::page_texts(&body).is_empty());
    assert_eq!(body["context"]["page_obj"]["paginator"]["num_pages"], 1);
}

#[tokio::test]
async fn owner_can_edit_post() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;
    let post = common::create_test_post(&app, author.id, "first draft", None).await;
    let edit_path = format!("/{}/{}/edit/", author.username, post.id);

    let (status, body) = app.get_view(&edit_path, Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(body["context"]["form"]["data"]["text"], "first draft");

    let resp = app
        .post_form(&edit_path, Some(&token), &[("text", "final version")])
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(
        common::location(&resp),
        format!("/{}/{}/", author.username, post.id)
    );

    let updated = Post::find_by_id(post.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(updated.text, "final version");
    assert_eq!(updated.pub_date, post.pub_date);
    assert_eq!(updated.author_id, author.id);
}

#[tokio::test]
async fn non_owner_edit_redirects_without_changes() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "leo").await;
    let (_, intruder_token) = common::create_test_user(&app, "intruder").await;
    let post = common::create_test_post(&app, author.id, "original", None).await;
    let edit_path = format!("/{}/{}/edit/", author.username, post.id);
    let detail = format!("/{}/{}/", author.username, post.id);

    let resp = app.get(&edit_path, Some(&intruder_token)).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), detail);

    let resp = app
        .post_form(&edit_path, Some(&intruder_token), &[("text", "defaced")])
        .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(common::location(&resp), detail);

    let unchanged = Post::find_by_id(post.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "original");
}

#[tokio::test]
async fn edit_can_clear_image() {
    let app = common::spawn_app().await;
    let (author, token) = common::create_test_user(&app, "leo").await;

    let form = Form::new().text("text", "pictured").part(
        "image",
        Part::bytes(common::png_bytes()).file_name("a.png"),
    );
    app.post_multipart("/new/", Some(&token), form).await;
    let post = Post::find().one(&app.db).await.unwrap().unwrap();
    assert!(post.image.is_some());

    let edit_path = format!("/{}/{}/edit/", author.username, post.id);
    let resp = app
        .post_form(
            &edit_path,
            Some(&token),
            &[("text", "no picture"), ("image-clear", "on")],
        )
        .await;
    assert_eq!(resp.status(), 303);

    let updated = Post::find_by_id(post.id).one(&app.db).await.unwrap().unwrap();
    assert_eq!(updated.text, "no picture");
    assert_eq!(updated.image, None);
}

#[tokio::test]
async fn missing_posts_and_routes_render_not_found_page() {
    let app = common::spawn_app().await;
    let (author, _) = common::create_test_user(&app, "leo").await;
    let (other, _) = common::create_test_user(&app, "other").await;
    let post = common::create_test_post(&app, author.id, "mine", None).await;

    for path in [
        format!("/{}/{}/", other.username, post.id),
        format!("/{}/{}/", author.username, post.id + 100),
        format!("/{}/not-a-number/", author.username),
        "/nobody_here/".to_string(),
        "/group/missing/".to_string(),
        "/definitely/not/a/route/".to_string(),
    ] {
        let (status, body) = app.get_view(&path, None).await;
        assert_eq!(status, 404, "{}", path);
        assert_eq!(body["template"], "misc/404.html", "{}", path);
        assert_eq!(body["context"]["path"], path.as_str());
    }
}
