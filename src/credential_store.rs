use crate::errors::ConfigError;
use secrecy::SecretString;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

const AUTH_SECTION: &str = "AUTH";
const REDDIT_SECTION: &str = "REDDIT";

/// Reads and writes auth artifacts in the config file.
///
/// Every call re-reads the file and edits the raw table, so keys this
/// program does not know about survive a rewrite.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    config_path: PathBuf,
}

impl CredentialStore {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load_code(&self) -> Result<Option<String>, ConfigError> {
        let table = self.read_table()?;
        Ok(get_string(&table, AUTH_SECTION, "code"))
    }

    pub fn save_code(&self, code: &str) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        set_string(&mut table, AUTH_SECTION, "code", code);
        self.write_table(&table)?;
        tracing::debug!("Auth code saved to {:?}", self.config_path);
        Ok(())
    }

    /// Removes the stored code; a missing code is not an error
    pub fn delete_code(&self) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        let removed = table
            .get_mut(AUTH_SECTION)
            .and_then(Value::as_table_mut)
            .and_then(|section| section.remove("code"))
            .is_some();

        if removed {
            self.write_table(&table)?;
            tracing::info!("Stored auth code deleted from {:?}", self.config_path);
        } else {
            tracing::debug!("No stored auth code to delete");
        }
        Ok(())
    }

    pub fn load_refresh_token(&self) -> Result<Option<SecretString>, ConfigError> {
        let table = self.read_table()?;
        Ok(get_string(&table, REDDIT_SECTION, "refresh_token").map(SecretString::new))
    }

    pub fn save_refresh_token(&self, refresh_token: &str) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        set_string(&mut table, REDDIT_SECTION, "refresh_token", refresh_token);
        self.write_table(&table)?;
        tracing::info!("Refresh token saved to {:?}", self.config_path);
        Ok(())
    }

    fn read_table(&self) -> Result<Table, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Table::new());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::LoadError {
                path: self.config_path.display().to_string(),
                source: e,
            })?;

        Ok(toml::from_str::<Table>(&contents)?)
    }

    fn write_table(&self, table: &Table) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(table)?;
        fs::write(&self.config_path, contents).map_err(|e| ConfigError::WriteError {
            path: self.config_path.display().to_string(),
            source: e,
        })
    }
}

fn get_string(table: &Table, section: &str, key: &str) -> Option<String> {
    table
        .get(section)
        .and_then(Value::as_table)
        .and_then(|section| section.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn set_string(table: &mut Table, section: &str, key: &str, value: &str) {
    let entry = table
        .entry(section.to_string())
        .or_insert_with(|| Value::Table(Table::new()));

    // A scalar where a section should be is replaced outright
    if !entry.is_table() {
        *entry = Value::Table(Table::new());
    }

    if let Some(section) = entry.as_table_mut() {
        section.insert(key.to_string(), Value::String(value.to_string()));
    }
}
