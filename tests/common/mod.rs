#![allow(dead_code)]

use std::path::PathBuf;

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

use trimpro_fsm::db::{DbPool, establish_connection_pool};
use trimpro_fsm::domain::tenant::{NewTenant, Tenant};
use trimpro_fsm::domain::types::EmailAddress;
use trimpro_fsm::domain::user::{AdminAccount, User};
use trimpro_fsm::models::auth::hash_password;
use trimpro_fsm::models::config::ServerConfig;
use trimpro_fsm::repository::{DieselRepository, UserWriter};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const ADMIN_EMAIL: &str = "owner@trimpro.test";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// Migrated SQLite file living in a temporary directory that is removed on
/// drop.
pub struct TestDb {
    pool: DbPool,
    path: PathBuf,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create pool");
        pool.get()
            .expect("get connection")
            .run_pending_migrations(MIGRATIONS)
            .expect("run migrations");
        Self {
            pool,
            path,
            _dir: dir,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        address: "127.0.0.1".into(),
        port: 0,
        database_url: String::new(),
        jwt_secret: "integration-access".into(),
        jwt_refresh_secret: "integration-refresh".into(),
        access_token_ttl_secs: 900,
        refresh_token_ttl_secs: 3600,
        payment_webhook_secret: Some("hook-secret".into()),
        public_url: "http://localhost".into(),
        notification_poll_secs: 1,
    }
}

/// Creates the default tenant with an active administrator.
pub fn seed_admin(repo: &DieselRepository) -> (Tenant, User) {
    let account = AdminAccount {
        email: EmailAddress::new(ADMIN_EMAIL).unwrap(),
        first_name: "Olive".into(),
        last_name: "Owner".into(),
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
    };
    repo.bootstrap_admin(&NewTenant::default_tenant(), &account)
        .expect("bootstrap admin")
}
