#![allow(dead_code)]

use std::time::Duration;

use poem::test::{TestClient, TestResponse};
use poem::{EndpointExt, endpoint::BoxEndpoint};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::Value;
use tempfile::TempDir;

use yatube::config::{AuthConfig, CacheConfig, Config, DatabaseConfig, MediaConfig, ServerConfig};
use yatube::entities::{comment, group, post, user};
use yatube::{AppState, app, db};

pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x01\x00\x01\x00\x00\x00\x00\x21\xf9\x04\
\x01\x0a\x00\x01\x00\x2c\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\
\x02\x4c\x01\x00\x3b";

pub struct TestApp {
    pub state: AppState,
    pub cli: TestClient<BoxEndpoint<'static>>,
    pub media: TempDir,
}

pub fn test_config(media: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
            // one connection so every query sees the same in-memory database
            max_connections: 1,
        },
        auth: AuthConfig {
            secret: "test-secret".into(),
            session_ttl: Duration::from_secs(3600),
            login_url: "/auth/login/".into(),
        },
        cache: CacheConfig {
            index_ttl: Duration::from_secs(20),
            max_capacity: 100,
        },
        media: MediaConfig {
            root: media.path().to_path_buf(),
        },
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let config = test_config(&media);
        let db = db::connect(&config.database).await.unwrap();
        let state = AppState::new(db, &config);
        let cli = TestClient::new(app(state.clone()).map_to_response().boxed());
        TestApp { state, cli, media }
    }

    /// Users made here cannot log in with a password; tests use
    /// [`TestApp::session_cookie`] instead.
    pub async fn create_user(&self, username: &str) -> user::Model {
        yatube::db::users::create(&self.state.db, username, "!unusable".into())
            .await
            .unwrap()
    }

    pub fn session_cookie(&self, user: &user::Model) -> String {
        let token = self.state.sessions.issue(user).unwrap();
        format!("sessionid={token}")
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> group::Model {
        group::ActiveModel {
            title: Set(title.into()),
            description: Set("Test description".into()),
            slug: Set(slug.into()),
            ..Default::default()
        }
        .insert(&self.state.db)
        .await
        .unwrap()
    }

    pub async fn create_post(&self, author: &user::Model, text: &str, group: Option<&group::Model>) -> post::Model {
        yatube::db::posts::create(&self.state.db, author, text.into(), group.map(|g| g.id), None)
            .await
            .unwrap()
    }

    pub async fn post(&self, id: i32) -> post::Model {
        post::Entity::find_by_id(id)
            .one(&self.state.db)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn post_count(&self) -> u64 {
        post::Entity::find().count(&self.state.db).await.unwrap()
    }

    pub async fn comment_count(&self) -> u64 {
        comment::Entity::find().count(&self.state.db).await.unwrap()
    }
}

pub async fn body_text(resp: TestResponse) -> String {
    resp.0.into_body().into_string().await.unwrap()
}

pub async fn rendered(resp: TestResponse) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
}

pub fn location(resp: &TestResponse) -> String {
    resp.0
        .headers()
        .get("location")
        .expect("redirect without a location")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn session_from(resp: &TestResponse) -> Option<String> {
    resp.0
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("sessionid="))
        .and_then(|c| c.split(';').next())
        .map(ToString::to_string)
}
