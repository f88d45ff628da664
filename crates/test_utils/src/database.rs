//! Disposable PostgreSQL for adapter tests
//!
//! One container is started per test binary. Every [`TestDatabase`] is a fresh
//! database inside it with the document store schema applied, so tests never
//! see each other's documents or change notifications. Requires Docker; tests
//! using it are `#[ignore]`d by default.

use infra_db::{create_pool, DatabaseConfig, PostgresDocumentStore};
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "review_desk";
const POSTGRES_PASSWORD: &str = "review_desk";
/// Database the server boots with; only used to create per-test databases
const ADMIN_DATABASE: &str = "postgres";

struct PostgresServer {
    _container: ContainerAsync<GenericImage>,
    host: String,
    port: u16,
}

impl PostgresServer {
    async fn start() -> Result<Self, BoxError> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", ADMIN_DATABASE)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        Ok(Self {
            _container: container,
            host,
            port,
        })
    }

    fn url(&self, database: &str) -> String {
        connection_url(&self.host, self.port, database)
    }
}

static SERVER: OnceCell<PostgresServer> = OnceCell::const_new();

fn connection_url(host: &str, port: u16, database: &str) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        POSTGRES_USER, POSTGRES_PASSWORD, host, port, database
    )
}

/// A freshly created database holding the document store schema
pub struct TestDatabase {
    pub name: String,
    pool: PgPool,
}

impl TestDatabase {
    pub async fn create() -> Result<Self, BoxError> {
        let server = SERVER.get_or_try_init(PostgresServer::start).await?;
        let name = format!("review_desk_{}", Uuid::new_v4().simple());

        let mut admin = PgConnection::connect(&server.url(ADMIN_DATABASE)).await?;
        sqlx::query(&format!("CREATE DATABASE \"{}\"", name))
            .execute(&mut admin)
            .await?;
        admin.close().await?;

        let config = DatabaseConfig::new(server.url(&name))
            .max_connections(5)
            .min_connections(0)
            .application_name("review-desk-tests");
        let pool = create_pool(config).await?;

        Ok(Self { name, pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn document_store(&self) -> PostgresDocumentStore {
        PostgresDocumentStore::new(self.pool.clone())
    }

    /// Number of review events recorded for one document
    pub async fn review_event_count(&self, collection: &str, document_id: &str) -> Result<i64, BoxError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM review_events WHERE collection = $1 AND document_id = $2",
        )
        .bind(collection)
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Shorthand for [`TestDatabase::create`]
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::create().await
}
