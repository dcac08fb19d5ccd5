pub mod types;

pub use types::*;

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_rfc3339_parses_back() {
        let ts = now_rfc3339();
        let parsed = time::OffsetDateTime::parse(
            &ts,
            &time::format_description::well_known::Rfc3339,
        );
        assert!(parsed.is_ok());
    }
}
