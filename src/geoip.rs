//! IP to country lookups with a concurrent cache
//!
//! Countries come from an optional CSV range database in the widely
//! distributed `start_ip,end_ip,country_code` layout (IPv4 and IPv6 rows may
//! be mixed). Without a database every lookup yields no country.

use dashmap::DashMap;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading a range database
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeoIpError {
    #[error("failed to open GeoIP database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read GeoIP database: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid GeoIP range on line {line}: {reason}")]
    InvalidRange { line: u64, reason: String },
}

#[derive(Debug, Clone)]
struct Range<T> {
    start: T,
    end: T,
    country: Arc<str>,
}

fn find<T: Ord + Copy>(ranges: &[Range<T>], ip: T) -> Option<&Arc<str>> {
    let idx = ranges.partition_point(|r| r.start <= ip);
    let range = ranges.get(idx.checked_sub(1)?)?;
    (ip <= range.end).then_some(&range.country)
}

/// Sorted IP ranges mapped to ISO country codes
#[derive(Debug, Clone, Default)]
pub struct RangeDatabase {
    v4: Vec<Range<u32>>,
    v6: Vec<Range<u128>>,
}

impl RangeDatabase {
    /// Load a database from a CSV file
    pub fn load(path: &Path) -> Result<Self, GeoIpError> {
        let file = std::fs::File::open(path).map_err(|source| GeoIpError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse `start_ip,end_ip,country_code` rows
    ///
    /// Rows with an empty or `ZZ` (unassigned) country are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeoIpError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut db = Self::default();
        for record in csv.records() {
            let record = record?;
            let line = record.position().map_or(0, csv::Position::line);
            let invalid = |reason: String| GeoIpError::InvalidRange { line, reason };

            let (Some(start), Some(end), Some(code)) = (record.get(0), record.get(1), record.get(2))
            else {
                return Err(invalid(format!("expected 3 columns, found {}", record.len())));
            };
            if code.is_empty() || code.eq_ignore_ascii_case("ZZ") {
                continue;
            }

            let start: IpAddr = start
                .parse()
                .map_err(|_| invalid(format!("bad start address '{start}'")))?;
            let end: IpAddr = end
                .parse()
                .map_err(|_| invalid(format!("bad end address '{end}'")))?;
            let country: Arc<str> = Arc::from(code.to_ascii_uppercase());

            match (start, end) {
                (IpAddr::V4(start), IpAddr::V4(end)) if start <= end => db.v4.push(Range {
                    start: u32::from(start),
                    end: u32::from(end),
                    country,
                }),
                (IpAddr::V6(start), IpAddr::V6(end)) if start <= end => db.v6.push(Range {
                    start: u128::from(start),
                    end: u128::from(end),
                    country,
                }),
                _ => return Err(invalid(format!("'{start}' - '{end}' is not a valid range"))),
            }
        }

        db.v4.sort_by_key(|r| r.start);
        db.v6.sort_by_key(|r| r.start);
        Ok(db)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Country code for an address, if a range covers it
    #[must_use]
    pub fn country(&self, ip: IpAddr) -> Option<Arc<str>> {
        match ip {
            IpAddr::V4(v4) => find(&self.v4, u32::from(v4)),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => find(&self.v4, u32::from(v4)),
                None => find(&self.v6, u128::from(v6)),
            },
        }
        .cloned()
    }
}

/// Addresses that never resolve to a country
fn is_non_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_non_routable_v4(v4),
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
        }
    }
}

fn is_non_routable_v4(ip: Ipv4Addr) -> bool {
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
}

/// Addresses remembered before the lookup cache starts over
pub const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Cached country lookups shared by the ingestion pipeline
#[derive(Debug)]
pub struct GeoLocator {
    database: Option<RangeDatabase>,
    cache: DashMap<IpAddr, Option<Arc<str>>>,
    capacity: usize,
}

impl Default for GeoLocator {
    fn default() -> Self {
        Self {
            database: None,
            cache: DashMap::new(),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl GeoLocator {
    /// A locator without a database; every lookup yields `None`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_database(database: RangeDatabase) -> Self {
        Self {
            database: Some(database),
            ..Self::default()
        }
    }

    /// Limit the number of cached addresses (at least one)
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Open a CSV range database
    pub fn open(path: &Path) -> Result<Self, GeoIpError> {
        let database = RangeDatabase::load(path)?;
        tracing::info!(
            "Loaded {} GeoIP ranges from {}",
            database.len(),
            path.display()
        );
        Ok(Self::with_database(database))
    }

    #[must_use]
    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }

    /// Country code for a textual address
    ///
    /// Results for valid addresses are cached, misses included. Input that
    /// does not parse as an address is never cached. A full cache is emptied
    /// before the next insert.
    #[must_use]
    pub fn lookup(&self, ip: &str) -> Option<Arc<str>> {
        let database = self.database.as_ref()?;
        let addr = ip.parse::<IpAddr>().ok()?;
        if let Some(cached) = self.cache.get(&addr) {
            return cached.clone();
        }

        let country = if is_non_routable(addr) {
            None
        } else {
            database.country(addr)
        };
        if self.cache.len() >= self.capacity {
            tracing::debug!("GeoIP cache reached {} entries, clearing", self.capacity);
            self.cache.clear();
        }
        self.cache.insert(addr, country.clone());
        country
    }

    /// Number of cached addresses
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AE", "United Arab Emirates"),
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CZ", "Czech Republic"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EG", "Egypt"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GR", "Greece"),
    ("HK", "Hong Kong"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KR", "South Korea"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("NG", "Nigeria"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PH", "Philippines"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RU", "Russia"),
    ("SA", "Saudi Arabia"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("TH", "Thailand"),
    ("TR", "Turkey"),
    ("TW", "Taiwan"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("VN", "Vietnam"),
    ("ZA", "South Africa"),
];

/// English name for an ISO country code, or the code itself when unknown
#[must_use]
pub fn country_name(code: &str) -> &str {
    COUNTRY_NAMES
        .binary_search_by(|(c, _)| (*c).cmp(code))
        .map_or(code, |idx| COUNTRY_NAMES[idx].1)
}
