//! Keyword/value connection strings (`host=localhost dbname=app user=u`).
//!
//! Parsing follows the libpq conventions: pairs are separated by whitespace,
//! whitespace around `=` is allowed, values may be single-quoted, and a
//! backslash escapes the next character. When a keyword appears more than once
//! the last occurrence wins, so a user supplied `sslmode=` overrides the
//! `sslmode=disable` prefix added by the settings loader.
//!
//! Keywords the driver does not consume itself (`search_path`, `TimeZone`,
//! `statement_timeout`, ...) are sent to the server as run-time parameters,
//! as are the `-c key=value` entries of `options`.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::error::DsnError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Keywords handled by the driver rather than forwarded to the server.
pub const DRIVER_KEYWORDS: &[&str] = &[
    "host",
    "port",
    "dbname",
    "user",
    "password",
    "sslmode",
    "sslrootcert",
    "sslcert",
    "sslkey",
    "application_name",
    "fallback_application_name",
    "connect_timeout",
    "options",
];

const REDACTED: &str = "********";

// ---------------------------------------------------------------------------
// Parsed parameters
// ---------------------------------------------------------------------------

/// Ordered keyword/value pairs from a connection string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DsnParams {
    pairs: Vec<(String, String)>,
}

impl DsnParams {
    pub fn parse(input: &str) -> Result<Self, DsnError> {
        let mut params = Self::default();
        let mut chars = input.chars().peekable();

        loop {
            skip_whitespace(&mut chars);
            if chars.peek().is_none() {
                break;
            }

            let mut keyword = String::new();
            while let Some(&c) = chars.peek() {
                if c == '=' || c.is_whitespace() {
                    break;
                }
                keyword.push(c);
                chars.next();
            }

            skip_whitespace(&mut chars);
            if chars.next() != Some('=') {
                return Err(DsnError::MissingEquals(keyword));
            }
            skip_whitespace(&mut chars);

            let value = if chars.peek() == Some(&'\'') {
                chars.next();
                read_quoted(&mut chars).ok_or_else(|| DsnError::UnterminatedQuote(keyword.clone()))?
            } else {
                read_bare(&mut chars)
            };

            if keyword.is_empty() {
                return Err(DsnError::EmptyKeyword);
            }
            params.set(keyword, value);
        }

        Ok(params)
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn set(&mut self, keyword: String, value: String) {
        match self.pairs.iter_mut().find(|(k, _)| *k == keyword) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push((keyword, value)),
        }
    }

    /// `connect_timeout` in seconds; absent or `0` means no explicit timeout.
    pub fn connect_timeout(&self) -> Result<Option<Duration>, DsnError> {
        let Some(raw) = self.get("connect_timeout") else {
            return Ok(None);
        };
        let secs: u64 = raw
            .trim()
            .parse()
            .map_err(|_| DsnError::InvalidTimeout(raw.to_string()))?;
        Ok((secs > 0).then(|| Duration::from_secs(secs)))
    }

    /// Non-driver keywords plus the entries of `options`, in order.
    pub fn runtime_parameters(&self) -> Result<Vec<(String, String)>, DsnError> {
        let mut params = Vec::new();
        for (keyword, value) in &self.pairs {
            if keyword == "options" {
                params.extend(parse_command_line_options(value)?);
            } else if !DRIVER_KEYWORDS.contains(&keyword.as_str()) {
                params.push((keyword.clone(), value.clone()));
            }
        }
        Ok(params)
    }

    /// Translate into driver connect options. Keywords that are absent keep
    /// the driver defaults (including the `PG*` environment variables).
    pub fn to_connect_options(&self) -> Result<PgConnectOptions, DsnError> {
        let mut options = PgConnectOptions::new();
        let has_application_name = self.get("application_name").is_some();

        for (keyword, value) in &self.pairs {
            options = match keyword.as_str() {
                // A leading slash names a Unix socket directory.
                "host" if value.starts_with('/') => options.socket(value),
                "host" => options.host(value),
                "port" => options.port(
                    value
                        .parse()
                        .map_err(|_| DsnError::InvalidPort(value.clone()))?,
                ),
                "dbname" => options.database(value),
                "user" => options.username(value),
                "password" => options.password(value),
                "sslmode" => options.ssl_mode(parse_ssl_mode(value)?),
                "sslrootcert" => options.ssl_root_cert(value),
                "sslcert" => options.ssl_client_cert(value),
                "sslkey" => options.ssl_client_key(value),
                "application_name" => options.application_name(value),
                "fallback_application_name" if !has_application_name => {
                    options.application_name(value)
                }
                // Applied around the connect call; run-time parameters below.
                _ => options,
            };
        }

        let runtime = self.runtime_parameters()?;
        if !runtime.is_empty() {
            options = options.options(runtime);
        }

        Ok(options)
    }
}

/// Renders the parameters back as a connection string with the password
/// masked, for logging.
impl fmt::Display for DsnParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (keyword, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{keyword}=")?;
            if keyword == "password" {
                f.write_str(REDACTED)?;
            } else {
                write_value(f, value)?;
            }
        }
        Ok(())
    }
}

/// Values are matched exactly; `DISABLE` is not `disable`.
pub fn parse_ssl_mode(value: &str) -> Result<PgSslMode, DsnError> {
    match value {
        "disable" => Ok(PgSslMode::Disable),
        "allow" => Ok(PgSslMode::Allow),
        "prefer" => Ok(PgSslMode::Prefer),
        "require" => Ok(PgSslMode::Require),
        "verify-ca" => Ok(PgSslMode::VerifyCa),
        "verify-full" => Ok(PgSslMode::VerifyFull),
        _ => Err(DsnError::InvalidSslMode(value.to_string())),
    }
}

/// Split the `options` value into `(key, value)` pairs. Accepts `-c key=value`,
/// `-ckey=value` and `--key=value` entries separated by whitespace.
pub fn parse_command_line_options(raw: &str) -> Result<Vec<(String, String)>, DsnError> {
    let mut pairs = Vec::new();
    let mut tokens = raw.split_whitespace();

    while let Some(token) = tokens.next() {
        let setting = if token == "-c" {
            tokens
                .next()
                .ok_or_else(|| DsnError::InvalidOptions(token.to_string()))?
        } else if let Some(rest) = token.strip_prefix("--") {
            rest
        } else if let Some(rest) = token.strip_prefix("-c") {
            rest
        } else {
            return Err(DsnError::InvalidOptions(token.to_string()));
        };

        match setting.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.push((key.to_string(), value.to_string()));
            }
            _ => return Err(DsnError::InvalidOptions(setting.to_string())),
        }
    }

    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Lexing helpers
// ---------------------------------------------------------------------------

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut value = String::new();
    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    value
}

/// Reads up to the closing quote. `None` when the input ends first.
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut value = String::new();
    loop {
        match chars.next()? {
            '\'' => return Some(value),
            '\\' => value.push(chars.next()?),
            c => value.push(c),
        }
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let needs_quotes =
        value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return f.write_str(value);
    }
    f.write_str("'")?;
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // -- parse ----------------------------------------------------------------

    #[test]
    fn parses_composed_connection_string() {
        let params =
            DsnParams::parse("sslmode=disable host=localhost dbname=test user=u password=p")
                .unwrap();
        assert_eq!(params.get("sslmode"), Some("disable"));
        assert_eq!(params.get("host"), Some("localhost"));
        assert_eq!(params.get("dbname"), Some("test"));
        assert_eq!(params.get("user"), Some("u"));
        assert_eq!(params.get("password"), Some("p"));
    }

    #[test]
    fn empty_string_is_valid() {
        assert!(DsnParams::parse("").unwrap().is_empty());
        assert!(DsnParams::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn bare_prefix_alone_is_valid() {
        let params = DsnParams::parse("sslmode=disable ").unwrap();
        assert_eq!(params.get("sslmode"), Some("disable"));
    }

    #[test]
    fn whitespace_around_equals_is_allowed() {
        let params = DsnParams::parse("host = db  port= 5433").unwrap();
        assert_eq!(params.get("host"), Some("db"));
        assert_eq!(params.get("port"), Some("5433"));
    }

    #[test]
    fn quoted_values_keep_spaces_and_escapes() {
        let params = DsnParams::parse(r"password='it\'s a secret' application_name='a\\b'").unwrap();
        assert_eq!(params.get("password"), Some("it's a secret"));
        assert_eq!(params.get("application_name"), Some(r"a\b"));
    }

    #[test]
    fn quoted_empty_value() {
        let params = DsnParams::parse("password=''").unwrap();
        assert_eq!(params.get("password"), Some(""));
    }

    #[test]
    fn later_keyword_overrides_earlier() {
        let params = DsnParams::parse("sslmode=disable host=db sslmode=require").unwrap();
        assert_eq!(params.get("sslmode"), Some("require"));
        assert_eq!(params.to_string(), "sslmode=require host=db");
    }

    #[test]
    fn missing_equals_rejects() {
        assert_matches!(
            DsnParams::parse("sslmode=disable localhost"),
            Err(DsnError::MissingEquals(k)) if k == "localhost"
        );
    }

    #[test]
    fn unterminated_quote_rejects() {
        assert_matches!(
            DsnParams::parse("password='oops"),
            Err(DsnError::UnterminatedQuote(k)) if k == "password"
        );
    }

    #[test]
    fn empty_keyword_rejects() {
        assert_matches!(DsnParams::parse("host=db =1"), Err(DsnError::EmptyKeyword));
    }

    /// A URL after the prefix is not a keyword/value pair.
    #[test]
    fn url_after_prefix_rejects() {
        assert_matches!(
            DsnParams::parse("sslmode=disable postgres://u:p@localhost/test"),
            Err(DsnError::MissingEquals(_))
        );
    }

    // -- connect options ------------------------------------------------------

    #[test]
    fn maps_to_connect_options() {
        let options = DsnParams::parse(
            "sslmode=disable host=db.internal port=6543 dbname=app user=runner application_name=sqlrunner",
        )
        .unwrap()
        .to_connect_options()
        .unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("app"));
        assert_eq!(options.get_username(), "runner");
        assert_eq!(options.get_application_name(), Some("sqlrunner"));
        assert_matches!(options.get_ssl_mode(), PgSslMode::Disable);
    }

    #[test]
    fn slash_host_is_socket_directory() {
        let options = DsnParams::parse("host=/var/run/postgresql")
            .unwrap()
            .to_connect_options()
            .unwrap();
        assert_eq!(
            options.get_socket().map(|p| p.to_string_lossy().into_owned()),
            Some("/var/run/postgresql".to_string())
        );
    }

    #[test]
    fn invalid_port_rejects() {
        let params = DsnParams::parse("port=abc").unwrap();
        assert_matches!(params.to_connect_options(), Err(DsnError::InvalidPort(p)) if p == "abc");
    }

    #[test]
    fn invalid_sslmode_rejects() {
        let params = DsnParams::parse("sslmode=sometimes").unwrap();
        assert_matches!(params.to_connect_options(), Err(DsnError::InvalidSslMode(_)));
    }

    #[test]
    fn ssl_modes_match_exactly() {
        assert_matches!(parse_ssl_mode("verify-full"), Ok(PgSslMode::VerifyFull));
        assert_matches!(parse_ssl_mode("verify-ca"), Ok(PgSslMode::VerifyCa));
        assert_matches!(parse_ssl_mode("prefer"), Ok(PgSslMode::Prefer));
        assert_matches!(parse_ssl_mode("DISABLE"), Err(DsnError::InvalidSslMode(m)) if m == "DISABLE");
    }

    #[test]
    fn uppercase_sslmode_rejects_at_connect_options() {
        let params = DsnParams::parse("sslmode=Require host=db").unwrap();
        assert_matches!(params.to_connect_options(), Err(DsnError::InvalidSslMode(_)));
    }

    // -- run-time parameters --------------------------------------------------

    #[test]
    fn non_driver_keywords_are_forwarded() {
        let params = DsnParams::parse("sslmode=disable host=db search_path=app TimeZone=UTC").unwrap();
        assert_eq!(
            params.runtime_parameters().unwrap(),
            vec![
                ("search_path".to_string(), "app".to_string()),
                ("TimeZone".to_string(), "UTC".to_string()),
            ]
        );

        let options = params.to_connect_options().unwrap();
        let rendered = options.get_options().unwrap_or_default();
        assert!(rendered.contains("search_path=app"), "got {rendered:?}");
        assert!(rendered.contains("TimeZone=UTC"), "got {rendered:?}");
        assert_eq!(options.get_host(), "db");
    }

    #[test]
    fn options_entries_are_forwarded() {
        let params =
            DsnParams::parse("host=db options='-c statement_timeout=5s -cwork_mem=64MB --geqo=off'")
                .unwrap();
        assert_eq!(
            params.runtime_parameters().unwrap(),
            vec![
                ("statement_timeout".to_string(), "5s".to_string()),
                ("work_mem".to_string(), "64MB".to_string()),
                ("geqo".to_string(), "off".to_string()),
            ]
        );

        let options = params.to_connect_options().unwrap();
        assert!(options
            .get_options()
            .is_some_and(|o| o.contains("statement_timeout=5s")));
    }

    #[test]
    fn driver_keywords_are_not_forwarded() {
        let params = DsnParams::parse("sslmode=disable host=db user=u connect_timeout=3").unwrap();
        assert!(params.runtime_parameters().unwrap().is_empty());
        assert_eq!(params.to_connect_options().unwrap().get_options(), None);
    }

    #[test]
    fn malformed_options_reject() {
        assert_matches!(
            parse_command_line_options("-c"),
            Err(DsnError::InvalidOptions(_))
        );
        assert_matches!(
            parse_command_line_options("-c statement_timeout"),
            Err(DsnError::InvalidOptions(s)) if s == "statement_timeout"
        );
        assert_matches!(
            parse_command_line_options("-v"),
            Err(DsnError::InvalidOptions(s)) if s == "-v"
        );
    }

    #[test]
    fn fallback_application_name_applies_only_without_application_name() {
        let fallback = DsnParams::parse("fallback_application_name=runner")
            .unwrap()
            .to_connect_options()
            .unwrap();
        assert_eq!(fallback.get_application_name(), Some("runner"));

        let explicit = DsnParams::parse("fallback_application_name=runner application_name=nightly")
            .unwrap()
            .to_connect_options()
            .unwrap();
        assert_eq!(explicit.get_application_name(), Some("nightly"));
    }

    // -- connect_timeout ------------------------------------------------------

    #[test]
    fn connect_timeout_absent_or_zero_is_none() {
        assert_eq!(DsnParams::parse("host=db").unwrap().connect_timeout(), Ok(None));
        assert_eq!(
            DsnParams::parse("connect_timeout=0").unwrap().connect_timeout(),
            Ok(None)
        );
    }

    #[test]
    fn connect_timeout_in_seconds() {
        assert_eq!(
            DsnParams::parse("connect_timeout=7").unwrap().connect_timeout(),
            Ok(Some(Duration::from_secs(7)))
        );
    }

    #[test]
    fn connect_timeout_must_be_a_number() {
        assert_matches!(
            DsnParams::parse("connect_timeout=-1").unwrap().connect_timeout(),
            Err(DsnError::InvalidTimeout(_))
        );
    }

    // -- display --------------------------------------------------------------

    #[test]
    fn display_redacts_password() {
        let params = DsnParams::parse("host=db user=u password=hunter2").unwrap();
        let rendered = params.to_string();
        assert_eq!(rendered, "host=db user=u password=********");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn display_quotes_values_with_spaces() {
        let params = DsnParams::parse("application_name='nightly load'").unwrap();
        assert_eq!(params.to_string(), "application_name='nightly load'");
    }
}
