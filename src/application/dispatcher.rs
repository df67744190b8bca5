//! Domain dispatching service.
//!
//! Owns the domain cursor and the measurement log. Built once at startup
//! and shared by reference with every caller.

use crate::domain::{AppConfig, DispenserStatus, DomainItem, Result};
use crate::infrastructure::{load_domains, AppendLog, CursorFile};

use super::CursorStore;

/// Hands out domains to measure and records the submitted results.
pub struct Dispatcher {
    domains: CursorStore<DomainItem, CursorFile>,
    measurements: AppendLog,
}

impl Dispatcher {
    /// Load the domain list and open the cursor and measurement files.
    ///
    /// # Errors
    /// Returns error if any of the three files cannot be opened.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let domains = load_domains(&config.domain_file(), &config.links.base_url)?;
        let cursor = CursorFile::open(&config.cursor_file())?;
        let measurements =
            AppendLog::open(&config.measurement_file(), config.log.sync_on_append)?;

        tracing::info!(
            cursor_file = %cursor.path().display(),
            measurement_file = %measurements.path().display(),
            "Dispatcher ready"
        );

        let dispatcher = Self::new(CursorStore::initialize(cursor, domains), measurements);
        if dispatcher.domains.is_empty() {
            tracing::warn!("Domain list is empty, every fetch will report exhaustion");
        }
        Ok(dispatcher)
    }

    /// Assemble a dispatcher from already-open parts.
    #[must_use]
    pub const fn new(
        domains: CursorStore<DomainItem, CursorFile>,
        measurements: AppendLog,
    ) -> Self {
        Self {
            domains,
            measurements,
        }
    }

    /// Hand out the next domain and durably move past it.
    ///
    /// # Errors
    /// Returns `Exhausted` when no domains remain, or an IO error if the
    /// cursor cannot be persisted.
    pub fn fetch(&self) -> Result<&DomainItem> {
        let domain = self.domains.dispense_next()?;
        tracing::debug!(
            id = domain.domain_id,
            domain = %domain.domain_name,
            remaining = self.domains.remaining(),
            "Dispensed domain"
        );
        Ok(domain)
    }

    /// Move past the next domain without handing it out.
    ///
    /// # Errors
    /// Returns `Exhausted` when no domains remain, or an IO error if the
    /// cursor cannot be persisted.
    pub fn skip(&self) -> Result<()> {
        self.domains.advance()?;
        tracing::info!(position = self.domains.position(), "Skipped domain");
        Ok(())
    }

    /// Show the domain `fetch` would hand out next, without consuming it.
    ///
    /// # Errors
    /// Returns `Exhausted` when no domains remain.
    pub fn peek(&self) -> Result<&DomainItem> {
        self.domains.dispense_current()
    }

    /// Record one measurement payload.
    ///
    /// # Errors
    /// Returns error if the log write fails.
    pub fn submit(&self, payload: &[u8]) -> Result<()> {
        self.measurements.append(payload)
    }

    /// Snapshot of cursor progress and log size.
    ///
    /// # Errors
    /// Returns error if the log's metadata cannot be read.
    pub fn status(&self) -> Result<DispenserStatus> {
        let cursor = self.domains.persistence();

        Ok(DispenserStatus {
            position: self.domains.position(),
            total: self.domains.len(),
            cursor_file: cursor.path().display().to_string(),
            last_advance: cursor.modified(),
            measurement_file: self.measurements.path().display().to_string(),
            measurement_bytes: self.measurements.len()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.paths.data_dir = Some(dir.to_path_buf());
        config
    }

    #[test]
    fn test_fetch_survives_restart() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("domains.txt"), "nic.at\ndenic.de\nsidn.nl\n").unwrap();
        let config = config_in(dir.path());

        {
            let dispatcher = Dispatcher::open(&config).unwrap();
            assert_eq!(dispatcher.fetch().unwrap().domain_name, "nic.at");
            assert_eq!(dispatcher.fetch().unwrap().domain_name, "denic.de");
        }

        let dispatcher = Dispatcher::open(&config).unwrap();
        assert_eq!(dispatcher.peek().unwrap().domain_name, "sidn.nl");
        assert_eq!(dispatcher.fetch().unwrap().domain_id, 3);
        assert!(dispatcher.skip().unwrap_err().is_exhausted());
        assert!(dispatcher.fetch().unwrap_err().is_exhausted());
        assert!(dispatcher.peek().unwrap_err().is_exhausted());
    }

    #[test]
    fn test_submit_and_status() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("domains.txt"), "a.at\nb.at\n").unwrap();
        let dispatcher = Dispatcher::open(&config_in(dir.path())).unwrap();

        dispatcher.fetch().unwrap();
        dispatcher.submit(br#"{"domain":"a.at","status":1}"#).unwrap();

        let status = dispatcher.status().unwrap();
        assert_eq!(status.position, 1);
        assert_eq!(status.total, 2);
        assert_eq!(status.remaining(), 1);
        assert_eq!(status.measurement_bytes, 29);
        assert!(status.last_advance.is_some());

        let log = fs::read_to_string(dir.path().join("measurements.json")).unwrap();
        assert_eq!(log, "{\"domain\":\"a.at\",\"status\":1}\n");
    }

    #[test]
    fn test_skip_advances_without_fetching() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("domains.txt"), "broken.at\nnic.at\n").unwrap();
        let dispatcher = Dispatcher::open(&config_in(dir.path())).unwrap();

        dispatcher.skip().unwrap();

        assert_eq!(dispatcher.fetch().unwrap().domain_name, "nic.at");
        assert_eq!(fs::read_to_string(dir.path().join("domainid.txt")).unwrap(), "2");
    }

    #[test]
    fn test_independent_dispatchers_never_share_a_domain() {
        const INSTANCES: usize = 8;
        const FETCHES: usize = 5;

        let dir = tempdir().unwrap();
        let list: String = (0..48).map(|i| format!("d{i}.at\n")).collect();
        fs::write(dir.path().join("domains.txt"), list).unwrap();
        let config = config_in(dir.path());

        let ids: Vec<u64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..INSTANCES)
                .map(|_| {
                    s.spawn(|| {
                        let dispatcher = Dispatcher::open(&config).unwrap();
                        (0..FETCHES)
                            .map(|_| dispatcher.fetch().unwrap().domain_id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<u64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), INSTANCES * FETCHES);
        assert_eq!(unique.len(), INSTANCES * FETCHES);
        assert_eq!(
            fs::read_to_string(dir.path().join("domainid.txt")).unwrap(),
            (INSTANCES * FETCHES).to_string()
        );
    }

    #[test]
    fn test_missing_domain_file_fails_startup() {
        let dir = tempdir().unwrap();

        assert!(Dispatcher::open(&config_in(dir.path())).is_err());
    }
}
