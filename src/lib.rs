pub mod core;
pub mod database;
pub mod users;

use database::{DatabaseError, FirebaseDatabase};
use yup_oauth2::ServiceAccountKey;

pub use yup_oauth2;

pub struct FirebaseApp {
    key: ServiceAccountKey,
}

impl FirebaseApp {
    pub fn new(service_account_key: ServiceAccountKey) -> Self {
        Self {
            key: service_account_key,
        }
    }

    /// Client for the Realtime Database at `database_url`, authenticated as this
    /// app's service account.
    pub fn database(&self, database_url: &str) -> Result<FirebaseDatabase, DatabaseError> {
        let middleware = crate::core::middleware::AuthMiddleware::new(self.key.clone());
        FirebaseDatabase::new(middleware, database_url)
    }

    /// Client for the project's default database,
    /// `https://<project_id>-default-rtdb.firebaseio.com`.
    pub fn default_database(&self) -> Result<FirebaseDatabase, DatabaseError> {
        let project_id = self.key.project_id.clone().unwrap_or_default();
        self.database(&format!("https://{}-default-rtdb.firebaseio.com", project_id))
    }
}
