//! CLI module for htpasswd-auth.
//!
//! Used both by the standalone `htpasswd-auth` binary and as the `auth`
//! subcommand of the unified `htpasswd-rs` CLI.
//!
//! # Usage
//!
//! ```bash
//! # Verify a password (exit status 0 on match)
//! htpasswd-auth check -f .htpasswd -u alice -p secret
//!
//! # Print a record for an htpasswd file
//! htpasswd-auth hash -u alice -p secret --scheme sha512 --rounds 10000
//!
//! # List users and their schemes
//! htpasswd-auth list -f .htpasswd --format json
//!
//! # Show the groups of a user
//! htpasswd-auth groups -g .htgroup -u alice
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::chain::{ParserChain, System};
use crate::crypt_sha::{CryptSha, ShaWidth, generate_salt};
use crate::htgroup::HtGroup;
use crate::htpasswd::{BadLinePolicy, Htpasswd, Options};
use crate::md5_crypt::{self, Md5Crypt};

/// htpasswd management CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "htpasswd-auth",
    version,
    about = "Check, hash and inspect htpasswd credentials"
)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommands {
    /// Verify a user's password against an htpasswd file.
    Check {
        /// htpasswd file.
        #[arg(short, long, env = "HTPASSWD_FILE")]
        file: PathBuf,

        /// Username to check.
        #[arg(short, long)]
        user: String,

        /// Candidate password.
        #[arg(short, long, env = "HTPASSWD_PASSWORD")]
        password: String,

        /// Refuse plain-text records instead of accepting them.
        #[arg(long)]
        reject_plain: bool,
    },

    /// Print a `user:encoding` line.
    Hash {
        /// Username for the record.
        #[arg(short, long)]
        user: String,

        /// Password to hash.
        #[arg(short, long, env = "HTPASSWD_PASSWORD")]
        password: String,

        /// Hashing scheme.
        #[arg(short, long, value_enum, default_value_t = HashScheme::Sha512)]
        scheme: HashScheme,

        /// Rounds for crypt-sha (clamped to 1000..=999999999).
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Salt (random if omitted).
        #[arg(long)]
        salt: Option<String>,
    },

    /// List users and their password schemes.
    List {
        /// htpasswd file.
        #[arg(short, long, env = "HTPASSWD_FILE")]
        file: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Skip unparsable lines instead of failing.
        #[arg(long)]
        skip_bad_lines: bool,
    },

    /// Print the groups of a user.
    Groups {
        /// Group file.
        #[arg(short, long, env = "HTGROUP_FILE")]
        group_file: PathBuf,

        /// Username to look up.
        #[arg(short, long)]
        user: String,
    },
}

/// Schemes the `hash` command can produce.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// `$5$` SHA-256 crypt.
    Sha256,
    /// `$6$` SHA-512 crypt.
    Sha512,
    /// `$apr1$` Apache MD5.
    Apr1,
    /// `$1$` MD5 crypt.
    Md5,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// User row for display.
#[derive(Tabled, Serialize)]
struct UserDisplay {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Scheme")]
    scheme: &'static str,
}

/// Run the auth CLI with the given arguments.
///
/// `check` returns an error when the password does not match, so the exit
/// status of the binary reflects the result.
pub fn run(args: AuthArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        AuthCommands::Check {
            file,
            user,
            password,
            reject_plain,
        } => check(&file, &user, &password, reject_plain),
        AuthCommands::Hash {
            user,
            password,
            scheme,
            rounds,
            salt,
        } => {
            println!("{}", hash_record(&user, &password, scheme, rounds, salt)?);
            Ok(())
        }
        AuthCommands::List {
            file,
            format,
            skip_bad_lines,
        } => {
            let policy = if skip_bad_lines {
                BadLinePolicy::Skip
            } else {
                BadLinePolicy::Abort
            };
            let table = Htpasswd::open(&file, Options::default().on_bad_line(policy))?;
            let users = table.users();
            if users.is_empty() {
                println!("No users found.");
                return Ok(());
            }
            println!("{}", render_users(users, format)?);
            Ok(())
        }
        AuthCommands::Groups { group_file, user } => {
            let groups = HtGroup::open(&group_file)?;
            for group in groups.user_groups(&user) {
                println!("{group}");
            }
            Ok(())
        }
    }
}

fn check(
    file: &std::path::Path,
    user: &str,
    password: &str,
    reject_plain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = Options::default();
    if reject_plain {
        let systems = System::DEFAULT.map(|s| match s {
            System::Plain => System::RejectPlain,
            other => other,
        });
        options = options.with_chain(ParserChain::from_systems(systems));
    }
    let table = Htpasswd::open(file, options)?;
    if table.matches(user, password) {
        println!("OK");
        Ok(())
    } else {
        Err(format!("authentication failed for {user}").into())
    }
}

/// Build a `user:encoding` line.
fn hash_record(
    user: &str,
    password: &str,
    scheme: HashScheme,
    rounds: Option<u32>,
    salt: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    if user.contains(':') || user.contains('\n') {
        return Err("username must not contain ':' or newlines".into());
    }
    let encoded = match scheme {
        HashScheme::Sha256 | HashScheme::Sha512 => {
            let width = if scheme == HashScheme::Sha256 {
                ShaWidth::Sha256
            } else {
                ShaWidth::Sha512
            };
            let salt = salt.unwrap_or_else(generate_salt);
            validate_salt(&salt)?;
            CryptSha::new(width, password, &salt, rounds).to_string()
        }
        HashScheme::Apr1 | HashScheme::Md5 => {
            if rounds.is_some() {
                return Err("--rounds only applies to sha256 and sha512".into());
            }
            let salt = salt
                .unwrap_or_else(|| generate_salt()[..md5_crypt::SALT_MAX_LEN].to_string());
            validate_salt(&salt)?;
            if scheme == HashScheme::Apr1 {
                Md5Crypt::apr1(password, &salt).to_string()
            } else {
                Md5Crypt::md5(password, &salt).to_string()
            }
        }
    };
    Ok(format!("{user}:{encoded}"))
}

fn validate_salt(salt: &str) -> Result<(), Box<dyn std::error::Error>> {
    if salt.contains(['$', ':', '\n']) {
        return Err("salt must not contain '$', ':' or newlines".into());
    }
    Ok(())
}

fn render_users(
    users: Vec<(String, &'static str)>,
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    let rows: Vec<UserDisplay> = users
        .into_iter()
        .map(|(user, scheme)| UserDisplay { user, scheme })
        .collect();

    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rows)?,
        OutputFormat::Csv => {
            let mut out = String::from("user,scheme");
            for row in &rows {
                out.push('\n');
                out.push_str(&format!("{},{}", row.user, row.scheme));
            }
            out
        }
        OutputFormat::Table => Table::new(rows).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoded::EncodedPassword;

    #[test]
    fn parse_hash_command() {
        let args = AuthArgs::try_parse_from([
            "htpasswd-auth",
            "hash",
            "-u",
            "alice",
            "-p",
            "secret",
            "--scheme",
            "sha256",
            "--rounds",
            "10000",
        ])
        .unwrap();
        match args.command {
            AuthCommands::Hash { scheme, rounds, .. } => {
                assert_eq!(scheme, HashScheme::Sha256);
                assert_eq!(rounds, Some(10000));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn hash_record_is_verifiable() {
        let line = hash_record("alice", "secret", HashScheme::Sha512, Some(1000), None).unwrap();
        let table = Htpasswd::from_reader(line.as_bytes(), Options::default()).unwrap();
        assert!(table.matches("alice", "secret"));
        assert_eq!(table.users(), vec![("alice".to_string(), "crypt-sha512")]);
        assert!(line.starts_with("alice:$6$rounds=1000$"));
    }

    #[test]
    fn hash_record_with_fixed_salt() {
        let line =
            hash_record("mickey", "mickey", HashScheme::Sha256, None, Some("123456".into()))
                .unwrap();
        assert_eq!(
            line,
            "mickey:$5$123456$2hClNSDw3lZ0X/9PFBSI2eCGMOS06v6IbChiRsjy6tA"
        );

        let line = hash_record("u", "pw", HashScheme::Apr1, None, None).unwrap();
        let encoded = line.strip_prefix("u:").unwrap();
        let v = Md5Crypt::parse(encoded).unwrap().unwrap();
        assert!(v.matches("pw"));
    }

    #[test]
    fn hash_record_with_multibyte_salt_verifies() {
        for scheme in [HashScheme::Sha256, HashScheme::Apr1] {
            // both the 8- and the 16-byte cut split an 'é'
            let salt = "aéééééééé".to_string();
            let line = hash_record("carol", "pw", scheme, None, Some(salt)).unwrap();
            let table = Htpasswd::from_reader(line.as_bytes(), Options::default()).unwrap();
            assert!(table.matches("carol", "pw"), "{line}");
        }
    }

    #[test]
    fn hash_record_rejects_bad_input() {
        assert!(hash_record("a:b", "pw", HashScheme::Sha512, None, None).is_err());
        assert!(hash_record("a", "pw", HashScheme::Sha512, None, Some("x$y".into())).is_err());
        assert!(hash_record("a", "pw", HashScheme::Md5, Some(5000), None).is_err());
    }

    #[test]
    fn render_formats() {
        let users = || vec![("alice".to_string(), "sha"), ("bob".to_string(), "plain")];

        assert_eq!(
            render_users(users(), OutputFormat::Csv).unwrap(),
            "user,scheme\nalice,sha\nbob,plain"
        );

        let json: serde_json::Value =
            serde_json::from_str(&render_users(users(), OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json[1]["user"], "bob");
        assert_eq!(json[1]["scheme"], "plain");

        let table = render_users(users(), OutputFormat::Table).unwrap();
        assert!(table.contains("Scheme"));
        assert!(table.contains("alice"));
    }
}
