#![allow(dead_code)]

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use orgkeep_api::{
    bootstrap::{self, RootIdentity},
    build_router,
    client::Client,
    config::{AppConfig, Keys},
    database::{Org, Status, Store, User},
    security::{Argon2Config, Codec, Key},
    AppState,
};

/// Server running inside the test's runtime on its own port and its own
/// in-memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
    pub root: RootIdentity,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn cheap_argon2() -> Argon2Config {
    Argon2Config {
        memory_kib: 8 * 1024,
        iterations: 1,
        parallelism: 1,
    }
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_test_writer()
            .try_init();

        let mut config = AppConfig::development();
        config.security.argon2 = cheap_argon2();

        let keys = Keys {
            key: Key::random(),
            signing_key: Key::random(),
        };
        let store = Store::in_memory().await.context("in-memory store")?;
        let codec = Codec::new(keys.key.clone(), config.security.argon2);
        let root = bootstrap::ensure_root(&store, &codec, &config.root)
            .await
            .context("root bootstrap")?;

        let state = AppState::new(config, store, keys, root.ids());

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("bind test listener")?;
        let app = build_router(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            root,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn root_client(&self) -> Client {
        let secret = self.root.api_secret.clone().unwrap_or_default();
        Client::new(&self.base_url, &self.root.user, secret)
    }

    pub fn client_for(&self, user: &User) -> Client {
        Client::new(&self.base_url, &user.id, &user.api_secret)
    }

    /// Active org with an active owner, written straight to the store
    pub async fn org_owner(&self, name: &str) -> Result<(Org, User)> {
        let email = format!("owner@{name}.example.com");
        Ok(bootstrap::new_org_owner(&self.state.store, &self.state.codec, name, "Owner", &email).await?)
    }

    /// Active plain member of `org`, written straight to the store
    pub async fn member(&self, org: &Org, display_name: &str, email: &str) -> Result<User> {
        let password = self.state.codec.derive_password("member-password")?;
        let mut user = User::new(&self.state.codec, display_name, email, &org.id, &password)?;
        user.meta.status = Status::Active;
        user.insert(self.state.store.writer()).await?;
        Ok(user)
    }

    pub async fn read_user(&self, id: &str) -> Result<User> {
        Ok(User::read(self.state.store.writer(), &self.state.codec, id).await?)
    }
}
