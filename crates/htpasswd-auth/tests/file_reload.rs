//! File-backed table and group loading.

use std::fs;

use htpasswd_auth::{
    BadLinePolicy, CryptSha, HtGroup, Htpasswd, HtpasswdError, Md5Crypt, Options, ParseError,
    ShaWidth,
};

fn sha512(password: &str) -> String {
    CryptSha::new(ShaWidth::Sha512, password, "filetestsalt", Some(1000)).to_string()
}

#[test]
fn open_and_reload_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htpasswd");
    fs::write(
        &path,
        format!("# users\nalice:{}\nbob:{}\n", sha512("one"), Md5Crypt::apr1("two", "saltsalt")),
    )
    .unwrap();

    let table = Htpasswd::open(&path, Options::default()).unwrap();
    assert_eq!(table.path(), Some(path.as_path()));
    assert!(table.matches("alice", "one"));
    assert!(table.matches("bob", "two"));
    assert!(!table.matches("alice", "two"));

    fs::write(&path, format!("alice:{}\n", sha512("three"))).unwrap();
    assert_eq!(table.reload().unwrap(), 1);
    assert!(table.matches("alice", "three"));
    assert!(!table.matches("alice", "one"));
    assert!(!table.contains_user("bob"));
}

#[test]
fn broken_file_keeps_old_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htpasswd");
    fs::write(&path, format!("alice:{}\n", sha512("one"))).unwrap();
    let table = Htpasswd::open(&path, Options::default()).unwrap();

    fs::write(&path, "alice:$6$rounds=1000$salt$tooshort\n").unwrap();
    match table.reload() {
        Err(HtpasswdError::Parse { user, source, .. }) => {
            assert_eq!(user, "alice");
            assert!(matches!(source, ParseError::Malformed { scheme: "crypt-sha", .. }));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(table.matches("alice", "one"));

    fs::remove_file(&path).unwrap();
    assert!(matches!(table.reload(), Err(HtpasswdError::Io { .. })));
    assert!(table.matches("alice", "one"));
}

#[test]
fn skip_policy_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htpasswd");
    fs::write(&path, format!("alice:{}\njunk\nbob:$5$x\n", sha512("one"))).unwrap();

    assert!(Htpasswd::open(&path, Options::default()).is_err());

    let table =
        Htpasswd::open(&path, Options::default().on_bad_line(BadLinePolicy::Skip)).unwrap();
    assert_eq!(table.len(), 1);
    assert!(table.matches("alice", "one"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let err = Htpasswd::open(&missing, Options::default()).unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(matches!(err, HtpasswdError::Io { .. }));
    assert!(matches!(HtGroup::open(&missing), Err(HtpasswdError::Io { .. })));
}

#[test]
fn group_file_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".htgroup");
    fs::write(&path, "admins: alice\nusers: alice bob\n").unwrap();

    let groups = HtGroup::open(&path).unwrap();
    assert!(groups.is_user_in_group("alice", "admins"));
    assert_eq!(groups.user_groups("bob"), vec!["users"]);

    fs::write(&path, "admins: bob\n").unwrap();
    groups.reload().unwrap();
    assert!(!groups.is_user_in_group("alice", "admins"));
    assert!(groups.is_user_in_group("bob", "admins"));
}
