mod common;

use common::{SMALL_GIF, TestApp, location, rendered};
use poem::http::StatusCode;
use poem::test::{TestForm, TestFormField};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde_json::Value;
use yatube::entities::{group, post, user};

fn object_ids(page: &Value) -> Vec<i64> {
    page["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn public_pages_render_their_templates() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app.create_post(&author, "Message longer than fifteen chars", Some(&group)).await;

    let pages = [
        ("/".to_string(), "posts/index.html"),
        ("/group/test-slug/".to_string(), "posts/group_list.html"),
        ("/profile/author/".to_string(), "posts/profile.html"),
        (format!("/posts/{}/", post.id), "posts/post_detail.html"),
    ];
    for (url, template) in pages {
        let resp = app.cli.get(&url).send().await;
        resp.assert_status_is_ok();
        assert_eq!(rendered(resp).await["template"], template, "{url}");
    }
}

#[tokio::test]
async fn unknown_things_are_not_found() {
    let app = TestApp::new().await;

    for url in ["/unexisting_page/", "/group/nope/", "/profile/nobody/", "/posts/999/", "/posts/abc/"] {
        app.cli.get(url).send().await.assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn group_listing_holds_its_single_post() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let other = app.create_group("Other group", "other").await;
    let post = app.create_post(&author, "in the group", Some(&group)).await;
    app.create_post(&author, "elsewhere", Some(&other)).await;
    app.create_post(&author, "nowhere", None).await;

    let ctx = rendered(app.cli.get("/group/test-slug/").send().await).await["context"].clone();
    assert_eq!(ctx["group"]["slug"], "test-slug");
    assert_eq!(object_ids(&ctx["page_obj"]), vec![post.id as i64]);
    assert_eq!(ctx["page_obj"]["object_list"][0]["group"]["title"], "Test group");
    assert_eq!(ctx["page_obj"]["object_list"][0]["author"]["username"], "author");
}

#[tokio::test]
async fn listings_paginate_newest_first() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let mut created = Vec::new();
    for i in 0..13 {
        created.push(app.create_post(&author, &format!("post number {i}"), None).await.id as i64);
    }
    created.reverse();

    for base in ["/", "/profile/author/"] {
        let first = rendered(app.cli.get(base).send().await).await["context"]["page_obj"].clone();
        let second = rendered(app.cli.get(base).query("page", &2).send().await).await["context"]["page_obj"].clone();

        assert_eq!(object_ids(&first), created[..10]);
        assert_eq!(object_ids(&second), created[10..]);
        assert_eq!(first["num_pages"], 2);
        assert_eq!(first["has_next"], true);
        assert_eq!(second["has_previous"], true);
        assert_eq!(second["has_next"], false);

        let first_ids = object_ids(&first);
        assert!(object_ids(&second).iter().all(|id| !first_ids.contains(id)));
    }
}

#[tokio::test]
async fn out_of_range_pages_fall_back() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    for i in 0..12 {
        app.create_post(&author, &format!("post {i}"), None).await;
    }

    let page = |q: &'static str| {
        let cli = &app.cli;
        async move {
            rendered(cli.get("/profile/author/").query("page", &q).send().await).await["context"]["page_obj"]["number"]
                .as_u64()
                .unwrap()
        }
    };
    assert_eq!(page("junk").await, 1);
    assert_eq!(page("40").await, 2);
    assert_eq!(page("0").await, 2);
}

#[tokio::test]
async fn post_detail_shows_post_and_comments() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app.create_post(&author, "detail text", Some(&group)).await;
    app.create_post(&author, "second", None).await;
    yatube::db::comments::create(&app.state.db, post.id, &author, "first!".into())
        .await
        .unwrap();

    let ctx = rendered(app.cli.get(format!("/posts/{}/", post.id)).send().await).await["context"].clone();
    assert_eq!(ctx["post"]["text"], "detail text");
    assert_eq!(ctx["post"]["group"]["slug"], "test-slug");
    assert_eq!(ctx["author_posts_count"], 2);
    assert_eq!(ctx["comments"][0]["text"], "first!");
    assert_eq!(ctx["comments"][0]["author"]["username"], "author");
}

#[tokio::test]
async fn anonymous_create_redirects_to_login() {
    let app = TestApp::new().await;

    let resp = app.cli.get("/create/").send().await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fcreate%2F");

    let before = app.post_count().await;
    let resp = app.cli.post("/create/").form(&[("text", "sneaky")]).send().await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(app.post_count().await, before);
}

#[tokio::test]
async fn create_form_offers_groups() {
    let app = TestApp::new().await;
    let user = app.create_user("author").await;
    app.create_group("Test group", "test-slug").await;

    let resp = app.cli.get("/create/").header("cookie", app.session_cookie(&user)).send().await;
    resp.assert_status_is_ok();
    let page = rendered(resp).await;
    assert_eq!(page["template"], "posts/create_post.html");
    assert_eq!(page["context"]["is_edit"], false);
    assert_eq!(page["context"]["groups"][0]["slug"], "test-slug");
    assert_eq!(page["context"]["form"]["text"], "");
}

#[tokio::test]
async fn create_forces_session_author() {
    let app = TestApp::new().await;
    let user = app.create_user("form_user").await;
    let someone_else = app.create_user("someone_else").await;
    let spoofed_author = someone_else.id.to_string();
    let before = app.post_count().await;

    let resp = app
        .cli
        .post("/create/")
        .header("cookie", app.session_cookie(&user))
        .form(&[("text", "Form test post"), ("author", spoofed_author.as_str())])
        .send()
        .await;

    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/form_user/");
    assert_eq!(app.post_count().await, before + 1);

    let profile = rendered(app.cli.get("/profile/form_user/").send().await).await;
    let newest = &profile["context"]["page_obj"]["object_list"][0];
    assert_eq!(newest["text"], "Form test post");
    assert_eq!(newest["author"]["id"], user.id);
}

#[tokio::test]
async fn create_with_group_and_image() {
    let app = TestApp::new().await;
    let user = app.create_user("form_user").await;
    let group = app.create_group("Test group", "form_test_slug").await;

    let form = TestForm::new()
        .field(TestFormField::text("Form test post 2").name("text"))
        .field(TestFormField::text(group.id.to_string()).name("group"))
        .field(
            TestFormField::bytes(SMALL_GIF.to_vec())
                .name("image")
                .filename("small.gif")
                .content_type("image/gif"),
        );
    let resp = app
        .cli
        .post("/create/")
        .header("cookie", app.session_cookie(&user))
        .multipart(form)
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);

    let page = rendered(app.cli.get("/group/form_test_slug/").send().await).await;
    let created = &page["context"]["page_obj"]["object_list"][0];
    assert_eq!(created["text"], "Form test post 2");
    assert_eq!(created["author"]["username"], "form_user");

    let image = created["image"].as_str().unwrap();
    let file = image.strip_prefix("posts/").unwrap();
    assert_eq!(file.split('_').next(), Some("small"));
    assert!(app.media.path().join(image).exists());
}

#[tokio::test]
async fn invalid_create_is_redisplayed() {
    let app = TestApp::new().await;
    let user = app.create_user("author").await;
    let cookie = app.session_cookie(&user);
    let before = app.post_count().await;

    let resp = app.cli.post("/create/").header("cookie", &cookie).form(&[("text", "   ")]).send().await;
    resp.assert_status_is_ok();
    let page = rendered(resp).await;
    assert_eq!(page["template"], "posts/create_post.html");
    assert_eq!(page["context"]["errors"]["text"][0], "This field is required.");

    let resp = app
        .cli
        .post("/create/")
        .header("cookie", &cookie)
        .form(&[("text", "fine"), ("group", "12345")])
        .send()
        .await;
    resp.assert_status_is_ok();
    let page = rendered(resp).await;
    assert!(page["context"]["errors"]["group"].is_array());
    assert_eq!(page["context"]["form"]["text"], "fine");

    assert_eq!(app.post_count().await, before);
}

#[tokio::test]
async fn non_author_cannot_edit() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let stranger = app.create_user("notauthor").await;
    let post = app.create_post(&author, "original text", None).await;
    let cookie = app.session_cookie(&stranger);
    let edit_url = format!("/posts/{}/edit/", post.id);

    let resp = app.cli.get(&edit_url).header("cookie", &cookie).send().await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = app
        .cli
        .post(&edit_url)
        .header("cookie", &cookie)
        .form(&[("text", "hijacked")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(app.post(post.id).await.text, "original text");
}

#[tokio::test]
async fn anonymous_edit_goes_to_login() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post = app.create_post(&author, "original text", None).await;

    let resp = app.cli.get(format!("/posts/{}/edit/", post.id)).send().await;
    resp.assert_status(StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));
}

#[tokio::test]
async fn author_edits_in_place() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let group = app.create_group("Test group", "test-slug").await;
    let post = app.create_post(&author, "Text before editing", Some(&group)).await;
    let cookie = app.session_cookie(&author);
    let edit_url = format!("/posts/{}/edit/", post.id);

    let resp = app.cli.get(&edit_url).header("cookie", &cookie).send().await;
    resp.assert_status_is_ok();
    let page = rendered(resp).await;
    assert_eq!(page["context"]["is_edit"], true);
    assert_eq!(page["context"]["post_id"], post.id);
    assert_eq!(page["context"]["form"]["text"], "Text before editing");
    assert_eq!(page["context"]["form"]["group"], group.id.to_string());

    let resp = app
        .cli
        .post(&edit_url)
        .header("cookie", &cookie)
        .form(&[("text", "Text after editing"), ("group", "")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = app.post(post.id).await;
    assert_eq!(edited.text, "Text after editing");
    assert_eq!(edited.group_id, None);
    assert_eq!(edited.author_id, author.id);
    assert_eq!(edited.pub_date, post.pub_date);
}

#[tokio::test]
async fn author_edit_with_blank_text_changes_nothing() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post = app.create_post(&author, "keep me", None).await;

    let resp = app
        .cli
        .post(format!("/posts/{}/edit/", post.id))
        .header("cookie", app.session_cookie(&author))
        .form(&[("text", "")])
        .send()
        .await;
    resp.assert_status_is_ok();
    assert_eq!(rendered(resp).await["context"]["is_edit"], true);
    assert_eq!(app.post(post.id).await.text, "keep me");
}

#[tokio::test]
async fn only_logged_in_users_comment() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post = app.create_post(&author, "commented post", None).await;
    let comment_url = format!("/posts/{}/comment/", post.id);
    let before = app.comment_count().await;

    let resp = app
        .cli
        .post(&comment_url)
        .header("cookie", app.session_cookie(&author))
        .form(&[("text", "Is that you, John Wayne?")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let resp = app.cli.post(&comment_url).form(&[("text", "This is me!")]).send().await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(app.comment_count().await, before + 1);

    let detail = rendered(app.cli.get(format!("/posts/{}/", post.id)).send().await).await;
    let comments = detail["context"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Is that you, John Wayne?");
}

#[tokio::test]
async fn blank_comment_is_dropped() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post = app.create_post(&author, "commented post", None).await;

    let resp = app
        .cli
        .post(format!("/posts/{}/comment/", post.id))
        .header("cookie", app.session_cookie(&author))
        .form(&[("text", "  ")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;

    app.cli
        .post("/posts/404/comment/")
        .header("cookie", app.session_cookie(&author))
        .form(&[("text", "hello?")])
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_is_cached_until_invalidated() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    app.create_post(&author, "first", None).await;

    let old = common::body_text(app.cli.get("/").send().await).await;
    app.create_post(&author, "test2", None).await;
    let cached = common::body_text(app.cli.get("/").send().await).await;
    app.state.page_cache.invalidate_all();
    let fresh = common::body_text(app.cli.get("/").send().await).await;

    assert_eq!(old, cached);
    assert_ne!(cached, fresh);
    assert!(fresh.contains("test2"));
}

#[tokio::test]
async fn anonymous_comment_returns_to_the_post_after_login() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post = app.create_post(&author, "commented post", None).await;

    let resp = app
        .cli
        .post(format!("/posts/{}/comment/", post.id))
        .form(&[("text", "anonymous")])
        .send()
        .await;
    resp.assert_status(StatusCode::FOUND);
    let login = location(&resp);
    let next = login.strip_prefix("/auth/login/?next=").unwrap();
    let next = urlencoding::decode(next).unwrap().into_owned();
    assert_eq!(next, format!("/posts/{}/comment/", post.id));

    let resp = app.cli.get(&next).header("cookie", app.session_cookie(&author)).send().await;
    resp.assert_status(StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    assert_eq!(app.comment_count().await, 0);

    let resp = app.cli.get("/posts/9999/comment/").send().await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_group_and_author_follows_delete_rules() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let reader = app.create_user("reader").await;
    let group = app.create_group("Test group", "test_slug").await;
    let post = app.create_post(&author, "grouped post", Some(&group)).await;
    yatube::db::comments::create(&app.state.db, post.id, &reader, "nice".into()).await.unwrap();

    group::Entity::delete_by_id(group.id).exec(&app.state.db).await.unwrap();
    assert_eq!(app.post(post.id).await.group_id, None);
    assert_eq!(app.comment_count().await, 1);

    user::Entity::delete_by_id(author.id).exec(&app.state.db).await.unwrap();
    let gone = post::Entity::find_by_id(post.id).one(&app.state.db).await.unwrap();
    assert!(gone.is_none());
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn failed_create_leaves_no_upload_behind() {
    let app = TestApp::new().await;
    let user = app.create_user("author").await;
    app.state.db.execute_unprepared("DROP TABLE comments").await.unwrap();
    app.state.db.execute_unprepared("DROP TABLE posts").await.unwrap();

    let form = TestForm::new()
        .field(TestFormField::text("never stored").name("text"))
        .field(
            TestFormField::bytes(SMALL_GIF.to_vec())
                .name("image")
                .filename("small.gif")
                .content_type("image/gif"),
        );
    let resp = app
        .cli
        .post("/create/")
        .header("cookie", app.session_cookie(&user))
        .multipart(form)
        .send()
        .await;
    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let leftovers = std::fs::read_dir(app.media.path().join("posts"))
        .map(|dir| dir.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}
