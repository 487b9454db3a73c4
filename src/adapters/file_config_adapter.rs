//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::LedgerSettings;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[store]
path = /var/lib/tradelog/journal.db
pool_size = 2

[ledger]
fee_rate = 0.001
starting_balance = 5000
"#;

    #[test]
    fn reads_store_and_ledger_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("store", "path"),
            Some("/var/lib/tradelog/journal.db".to_string())
        );
        assert_eq!(adapter.get_int("store", "pool_size", 4), 2);
        assert_eq!(adapter.get_double("ledger", "fee_rate", 0.0), 0.001);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[store]\npath = a.db\n").unwrap();
        assert_eq!(adapter.get_int("store", "pool_size", 4), 4);
        assert_eq!(adapter.get_double("ledger", "fee_rate", 0.00075), 0.00075);
        assert_eq!(adapter.get_string("ledger", "missing"), None);
        assert!(adapter.get_bool("ledger", "missing", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[ledger]\nfee_rate = lots\nstarting_balance = x\n")
                .unwrap();
        assert_eq!(adapter.get_double("ledger", "fee_rate", 0.00075), 0.00075);
        assert_eq!(adapter.get_int("ledger", "starting_balance", 3881), 3881);
    }

    #[test]
    fn ledger_settings_from_config() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let settings = LedgerSettings::from_config(&adapter);
        assert_eq!(settings.fee_rate, 0.001);
        assert_eq!(settings.starting_balance, 5000.0);
    }

    #[test]
    fn ledger_settings_defaults_on_empty_config() {
        let adapter = FileConfigAdapter::from_string("[store]\npath = a.db\n").unwrap();
        let settings = LedgerSettings::from_config(&adapter);
        assert_eq!(settings, LedgerSettings::default());
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("store", "pool_size", 4), 2);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        assert!(FileConfigAdapter::from_file("/nonexistent/tradelog.ini").is_err());
    }
}
