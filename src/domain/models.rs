//! Domain models for dispensable items.
//!
//! A `DomainItem` is one entry of the dispensable list. It serializes in the
//! resource-object shape the measurement clients expect.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Resource type tag for dispensed domains.
pub const DOMAIN_RESOURCE_TYPE: &str = "domains";

/// A domain to be measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainItem {
    /// 1-based identifier, equal to the domain's line number in the source list.
    pub domain_id: u64,
    /// ASCII (A-label) domain name.
    pub domain_name: String,
    /// Unicode form of the domain name.
    pub u_label: String,
    /// Registration date, if known.
    pub create_date: Option<DateTime<Utc>>,
    /// Canonical link to this resource.
    pub self_link: String,
}

impl DomainItem {
    /// Build an item for the given 1-based id.
    #[must_use]
    pub fn new(domain_id: u64, domain_name: impl Into<String>, base_url: &str) -> Self {
        let domain_name = domain_name.into();
        Self {
            domain_id,
            u_label: domain_name.clone(),
            domain_name,
            create_date: None,
            self_link: format!(
                "{}/{DOMAIN_RESOURCE_TYPE}/{domain_id}",
                base_url.trim_end_matches('/')
            ),
        }
    }

    /// Set the registration date.
    #[must_use]
    pub fn with_create_date(mut self, create_date: Option<DateTime<Utc>>) -> Self {
        self.create_date = create_date;
        self
    }

    /// String identifier used in the resource object.
    #[must_use]
    pub fn id(&self) -> String {
        self.domain_id.to_string()
    }
}

#[derive(Serialize)]
struct Resource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    attributes: Attributes<'a>,
    links: Links<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Attributes<'a> {
    domain_id: u64,
    domain_name: &'a str,
    u_label: &'a str,
    create_date: Option<&'a DateTime<Utc>>,
}

#[derive(Serialize)]
struct Links<'a> {
    #[serde(rename = "self")]
    self_link: &'a str,
}

#[derive(Serialize)]
struct Document<'a> {
    data: Resource<'a>,
}

impl Serialize for DomainItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Document {
            data: Resource {
                kind: DOMAIN_RESOURCE_TYPE,
                id: self.id(),
                attributes: Attributes {
                    domain_id: self.domain_id,
                    domain_name: &self.domain_name,
                    u_label: &self.u_label,
                    create_date: self.create_date.as_ref(),
                },
                links: Links {
                    self_link: &self.self_link,
                },
            },
        }
        .serialize(serializer)
    }
}

/// Snapshot of the dispenser and log for the status report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispenserStatus {
    /// Next position to hand out (0-based).
    pub position: usize,
    /// Number of items in the list.
    pub total: usize,
    /// Cursor file location.
    pub cursor_file: String,
    /// When the cursor file was last written.
    pub last_advance: Option<DateTime<Utc>>,
    /// Measurement log location.
    pub measurement_file: String,
    /// Measurement log size in bytes.
    pub measurement_bytes: u64,
}

impl DispenserStatus {
    /// Items still to be handed out.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.position)
    }

    /// Whether the cursor reached the end of the list.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.position >= self.total
    }
}
