use std::env;

use crate::error::AppError;

/// Runtime profile selecting which database the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbProfile {
    Prod,
    /// Test profile points at a disposable database name.
    Test,
}

/// Connection settings for the MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub db_name: String,
}

/// Build Mongo connection settings from environment variables.
///
/// `MONGODB_URI` defaults to a local deployment. The database name comes
/// from `MONGODB_DB` (prod) or `MONGODB_TEST_DB` (test); both have
/// defaults so a bare local setup works out of the box.
pub fn mongo_config(profile: DbProfile) -> Result<MongoConfig, AppError> {
    Ok(MongoConfig {
        uri: uri(),
        db_name: db_name(profile)?,
    })
}

fn uri() -> String {
    env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string())
}

fn db_name(profile: DbProfile) -> Result<String, AppError> {
    let name = match profile {
        DbProfile::Prod => env::var("MONGODB_DB").unwrap_or_else(|_| "gameDB".to_string()),
        DbProfile::Test => {
            env::var("MONGODB_TEST_DB").unwrap_or_else(|_| "gameDB_test".to_string())
        }
    };

    if name.trim().is_empty() {
        return Err(AppError::config("database name must not be empty"));
    }

    // Guard against a test run pointing at the prod database by accident.
    if profile == DbProfile::Test && name == "gameDB" {
        return Err(AppError::config(
            "test profile must not use the prod database name",
        ));
    }

    Ok(name)
}
