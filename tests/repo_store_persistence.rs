//! Tracked list and credentials survive a reopen on disk

use build_tracker::api::{BuildSnapshot, BuildState, CiToken, SourceHostToken, TrackedRepo};
use build_tracker::core::{CredentialStore, FileStorage, RepoStore};
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

fn storage(dir: &TempDir) -> FileStorage {
    FileStorage::with_path(dir.path()).unwrap()
}

#[test]
fn test_tracked_list_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let mut repos = RepoStore::open(storage(&dir));
        repos.add(TrackedRepo::new(1, "a/a")).unwrap();
        repos.add(TrackedRepo::new(2, "b/b")).unwrap();
        repos.add(TrackedRepo::new(3, "c/c")).unwrap();
        repos.move_entry(0, 2).unwrap();
        repos
            .merge(&[TrackedRepo::new(2, "b/b").with_build(BuildSnapshot {
                last_build_state: Some(BuildState::Failed),
                last_build_duration: Some(125),
                ..BuildSnapshot::default()
            })])
            .unwrap();
    }

    let repos = RepoStore::open(storage(&dir));
    let slugs: Vec<&str> = repos.repos().iter().map(|r| r.slug.as_str()).collect();
    assert_eq!(slugs, vec!["c/c", "b/b", "a/a"]);
    assert_eq!(repos.get(1).unwrap().build.state(), BuildState::Failed);
    assert_eq!(repos.get(1).unwrap().build.duration_text(), "2m 5s");
}

#[test]
fn test_credentials_survive_restart_and_logout() {
    let dir = TempDir::new().unwrap();

    {
        let mut creds = CredentialStore::open(storage(&dir));
        creds
            .set_source_host_token(Some(SourceHostToken {
                token: SecretString::from("gho_disk".to_string()),
                token_type: "bearer".to_string(),
                scope: "repo".to_string(),
            }))
            .unwrap();
        creds.set_ci_token(Some(CiToken::new("travis_disk"))).unwrap();
    }

    let mut creds = CredentialStore::open(storage(&dir));
    assert!(creds.is_authenticated());
    assert_eq!(creds.ci_token().unwrap().token.expose_secret(), "travis_disk");

    creds.logout().unwrap();
    let creds = CredentialStore::open(storage(&dir));
    assert!(!creds.is_authenticated());
}
