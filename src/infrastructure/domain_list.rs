//! Plain-text domain list loading.
//!
//! One domain per line, in file order. Line `n` (1-based) becomes the item
//! with id `n`. A line may carry the registration date after the name,
//! separated by whitespace, either as `YYYY-MM-DD` or as an RFC 3339
//! timestamp:
//!
//! ```text
//! nic.at 1998-04-01
//! denic.de
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::domain::{AppError, DomainItem, Result};

/// Loads the dispensable domain list from a text file.
///
/// # Errors
/// Returns error if the file cannot be opened or read.
pub fn load_domains(path: &Path, base_url: &str) -> Result<Vec<DomainItem>> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Cannot open domain file: {}", path.display()), e))?;

    let domains = read_domains(BufReader::new(file), base_url)?;

    tracing::info!(path = %path.display(), count = domains.len(), "Loaded domains");
    Ok(domains)
}

/// Builds domain items from any line source.
///
/// # Errors
/// Returns error if reading a line fails or a registration date is malformed.
pub fn read_domains(reader: impl BufRead, base_url: &str) -> Result<Vec<DomainItem>> {
    reader
        .lines()
        .zip(1u64..)
        .map(|(line, id)| {
            let line =
                line.map_err(|e| AppError::io(format!("Failed to read domain line {id}"), e))?;
            parse_line(id, &line, base_url)
        })
        .collect()
}

fn parse_line(id: u64, line: &str, base_url: &str) -> Result<DomainItem> {
    let Some((name, date)) = line.split_once(|c: char| c.is_ascii_whitespace()) else {
        return Ok(DomainItem::new(id, line, base_url));
    };

    let date = date.trim();
    let create_date = if date.is_empty() {
        None
    } else {
        Some(parse_date(date).ok_or_else(|| AppError::InvalidData {
            message: format!("Domain line {id}: invalid registration date '{date}'"),
        })?)
    };

    Ok(DomainItem::new(id, name, base_url).with_create_date(create_date))
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const BASE: &str = "https://localhost:8080/api/v1";

    #[test]
    fn test_ids_follow_line_numbers() {
        let input = Cursor::new("nic.at\r\ndenic.de\nexample.com\n");

        let domains = read_domains(input, BASE).unwrap();

        assert_eq!(domains.len(), 3);
        assert_eq!(domains[0].domain_id, 1);
        assert_eq!(domains[0].domain_name, "nic.at");
        assert_eq!(domains[1].domain_name, "denic.de");
        assert_eq!(domains[2].id(), "3");
        assert_eq!(domains[2].self_link, format!("{BASE}/domains/3"));
    }

    #[test]
    fn test_registration_date_column() {
        let input = Cursor::new("nic.at 1998-04-01\ndenic.de\tnot-a-date\n");
        let err = read_domains(input, BASE).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidData { ref message } if message.contains("line 2")
        ));

        let input = Cursor::new(concat!(
            "nic.at 1998-04-01\n",
            "sidn.nl\t2001-02-03T04:05:06+01:00\n",
            "example.com\n",
        ));
        let domains = read_domains(input, BASE).unwrap();

        assert_eq!(domains[0].domain_name, "nic.at");
        assert_eq!(
            domains[0].create_date.unwrap().to_rfc3339(),
            "1998-04-01T00:00:00+00:00"
        );
        assert_eq!(domains[1].domain_name, "sidn.nl");
        assert_eq!(
            domains[1].create_date.unwrap().to_rfc3339(),
            "2001-02-03T03:05:06+00:00"
        );
        assert_eq!(domains[2].create_date, None);
    }

    #[test]
    fn test_empty_input_gives_empty_list() {
        let domains = read_domains(Cursor::new(""), BASE).unwrap();
        assert!(domains.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();

        let err = load_domains(&dir.path().join("missing.txt"), BASE).unwrap_err();

        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domains.txt");
        std::fs::write(&path, "a.at\nb.at\n").unwrap();

        let domains = load_domains(&path, BASE).unwrap();

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[1].u_label, "b.at");
    }
}
