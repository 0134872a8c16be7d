//! Credential checks for helper requests.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

use htpasswd_auth::{HtGroup, Htpasswd, Options};
use htpasswd_config::Config;
use tracing::debug;

use crate::error::HelperError;

/// Answer to one request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Err,
}

impl Reply {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Err => "ERR",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The htpasswd table, plus an optional group restriction.
#[derive(Debug)]
pub struct Authenticator {
    htpasswd: Htpasswd,
    groups: Option<HtGroup>,
    require_group: Option<String>,
}

impl Authenticator {
    pub fn new(htpasswd: Htpasswd) -> Self {
        Self {
            htpasswd,
            groups: None,
            require_group: None,
        }
    }

    /// Only accept members of `group` in `groups`.
    pub fn with_required_group(mut self, groups: HtGroup, group: impl Into<String>) -> Self {
        self.groups = Some(groups);
        self.require_group = Some(group.into());
        self
    }

    /// Open the files named by a validated config.
    pub fn from_config(config: &Config) -> Result<Self, HelperError> {
        let options: Options = config.htpasswd.options();
        let htpasswd = Htpasswd::open(Path::new(&config.htpasswd.path), options)?;
        let groups = config
            .group
            .path
            .as_deref()
            .map(HtGroup::open)
            .transpose()?;
        Ok(Self {
            htpasswd,
            groups,
            require_group: config.group.require.clone(),
        })
    }

    /// Check a user, including group membership when one is required.
    pub fn check(&self, user: &str, password: &str) -> bool {
        if !self.htpasswd.matches(user, password) {
            return false;
        }
        match (&self.require_group, &self.groups) {
            (Some(group), Some(groups)) => groups.is_user_in_group(user, group),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Answer one `username password` request line.
    ///
    /// Both fields are URL-escaped, so a space inside either arrives as `%20`.
    pub fn handle_line(&self, line: &str) -> Reply {
        let Some((user, password)) = parse_request(line) else {
            debug!("malformed request line");
            return Reply::Err;
        };
        if self.check(&user, &password) {
            debug!(user = %user, "authenticated");
            Reply::Ok
        } else {
            debug!(user = %user, "authentication failed");
            Reply::Err
        }
    }

    /// Re-read the htpasswd file and the group file, if any.
    ///
    /// Each file keeps its previous contents when its reload fails.
    pub fn reload(&self) -> Result<usize, HelperError> {
        let users = self.htpasswd.reload()?;
        if let Some(groups) = &self.groups {
            groups.reload()?;
        }
        Ok(users)
    }
}

fn parse_request(line: &str) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (user, password) = line.split_once(' ')?;
    if user.is_empty() {
        return None;
    }
    let user = urlencoding::decode(user).ok()?;
    let password = urlencoding::decode(password).ok()?;
    Some((user, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(data: &str) -> Htpasswd {
        Htpasswd::from_reader(data.as_bytes(), Options::default()).unwrap()
    }

    #[test]
    fn request_parsing() {
        assert_eq!(
            parse_request("alice secret\r\n"),
            Some(("alice".into(), "secret".into()))
        );
        assert_eq!(
            parse_request("bob%20smith open%20sesame"),
            Some(("bob smith".into(), "open sesame".into()))
        );
        assert_eq!(parse_request("carol "), Some(("carol".into(), "".into())));
        assert_eq!(parse_request("nopassword"), None);
        assert_eq!(parse_request(" secret"), None);
        assert_eq!(parse_request("bad %FF"), None);
    }

    #[test]
    fn replies() {
        let auth = Authenticator::new(table("alice:secret\nbob:open sesame\n"));
        assert_eq!(auth.handle_line("alice secret"), Reply::Ok);
        assert_eq!(auth.handle_line("alice wrong"), Reply::Err);
        assert_eq!(auth.handle_line("bob open%20sesame"), Reply::Ok);
        assert_eq!(auth.handle_line("mallory secret"), Reply::Err);
        assert_eq!(auth.handle_line("garbage"), Reply::Err);
        assert_eq!(Reply::Ok.to_string(), "OK");
    }

    #[test]
    fn required_group() {
        let groups = HtGroup::from_reader("admins: alice\n".as_bytes()).unwrap();
        let auth =
            Authenticator::new(table("alice:a\nbob:b\n")).with_required_group(groups, "admins");
        assert!(auth.check("alice", "a"));
        assert!(!auth.check("bob", "b"));
        assert!(!auth.check("alice", "b"));
    }

    #[test]
    fn reader_tables_cannot_reload() {
        let auth = Authenticator::new(table("alice:a\n"));
        assert!(matches!(
            auth.reload(),
            Err(HelperError::Htpasswd(htpasswd_auth::HtpasswdError::NoPath))
        ));
        assert!(auth.check("alice", "a"));
    }
}
