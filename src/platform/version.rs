//! Server version parsing.

use std::fmt;

/// Database server version as reported by `SELECT version()` or configured
/// through `server_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// MySQL protocol servers that identify as MariaDB.
    pub mariadb: bool,
    raw: String,
}

impl ServerVersion {
    /// Extract the first `major[.minor[.patch]]` sequence from a version string.
    ///
    /// Handles both bare versions (`"8.0.33"`, `"15"`) and full banners
    /// (`"PostgreSQL 15.3 on x86_64-pc-linux-gnu"`, `"10.5.8-MariaDB-1:10.5.8"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find(|c: char| c.is_ascii_digit())?;
        let numeric: String = raw[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let mut parts = numeric
            .split('.')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next().transpose().ok()?.unwrap_or(0);
        let patch = parts.next().transpose().ok()?.unwrap_or(0);

        Some(Self {
            major,
            minor,
            patch,
            mariadb: raw.to_ascii_lowercase().contains("mariadb"),
            raw: raw.to_string(),
        })
    }

    /// Version string this was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether this version is at least `major.minor.patch`.
    pub fn at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        (self.major, self.minor, self.patch) >= (major, minor, patch)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.mariadb {
            write!(f, "-MariaDB")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_versions() {
        let v = ServerVersion::parse("8.0.33").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (8, 0, 33));
        assert!(!v.mariadb);

        let v = ServerVersion::parse("15").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (15, 0, 0));
    }

    #[test]
    fn test_parse_postgres_banner() {
        let v = ServerVersion::parse(
            "PostgreSQL 15.3 (Debian 15.3-1.pgdg120+1) on x86_64-pc-linux-gnu",
        )
        .unwrap();
        assert_eq!((v.major, v.minor, v.patch), (15, 3, 0));
    }

    #[test]
    fn test_parse_mariadb() {
        let v = ServerVersion::parse("10.5.8-MariaDB-1:10.5.8+maria~focal").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (10, 5, 8));
        assert!(v.mariadb);
        assert_eq!(v.to_string(), "10.5.8-MariaDB");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ServerVersion::parse("").is_none());
        assert!(ServerVersion::parse("latest").is_none());
    }

    #[test]
    fn test_at_least() {
        let v = ServerVersion::parse("5.7.8").unwrap();
        assert!(v.at_least(5, 7, 8));
        assert!(v.at_least(5, 6, 99));
        assert!(!v.at_least(5, 7, 9));
        assert!(!v.at_least(8, 0, 0));
    }
}
