//! Wire-level tests for the GitHub forge.
//!
//! Each test stands up a local HTTP server, points `GitHubForge` at it and
//! checks the request it sends and how it reads the response.

use std::io::Read;
use std::sync::Arc;

use ghfs::auth::StaticToken;
use ghfs::core::types::{BranchName, EntryKind, FileMode, Oid};
use ghfs::forge::github::GitHubForge;
use ghfs::forge::{Forge, ForgeError, TreeItem};
use ghfs::fs::{FsError, GitHubFs};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_test";

fn sha(c: char) -> String {
    std::iter::repeat(c).take(40).collect()
}

fn oid(c: char) -> Oid {
    Oid::new(sha(c)).unwrap()
}

fn main_branch() -> BranchName {
    BranchName::new("main").unwrap()
}

fn forge(server: &MockServer) -> GitHubForge {
    GitHubForge::with_api_base(
        Arc::new(StaticToken::new(TOKEN)),
        "octocat",
        "site",
        server.uri(),
    )
}

fn error_body(message: &str) -> serde_json::Value {
    json!({ "message": message, "documentation_url": "https://docs.github.com" })
}

// =============================================================================
// Reads
// =============================================================================

mod reads {
    use super::*;

    #[tokio::test]
    async fn get_branch_reads_head_and_tree() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/branches/main"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("accept", "application/vnd.github+json"))
            .and(header("user-agent", "ghfs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "main",
                "commit": {
                    "sha": sha('c'),
                    "commit": { "tree": { "sha": sha('t') }, "message": "m" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = forge(&server).get_branch(&main_branch()).await.unwrap();
        assert_eq!(state.head_commit, oid('c'));
        assert_eq!(state.head_tree, oid('t'));
        assert_eq!(state.name, main_branch());
    }

    #[tokio::test]
    async fn get_tree_recursive_flattens_and_skips_submodules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .and(query_param("recursive", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha('t'),
                "truncated": false,
                "tree": [
                    { "path": "a", "mode": "040000", "type": "tree", "sha": sha('1') },
                    { "path": "a/b.txt", "mode": "100644", "type": "blob", "sha": sha('2'), "size": 5 },
                    { "path": "vendor/lib", "mode": "160000", "type": "commit", "sha": sha('3') }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entries = forge(&server).get_tree(&oid('t'), true).await.unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].path, "a");
        assert_eq!(entries[0].kind, EntryKind::Tree);
        assert_eq!(entries[0].mode, FileMode::Directory);
        assert_eq!(entries[0].size, None);

        assert_eq!(entries[1].path, "a/b.txt");
        assert_eq!(entries[1].kind, EntryKind::Blob);
        assert_eq!(entries[1].oid, Some(oid('2')));
        assert_eq!(entries[1].size, Some(5));
    }

    #[tokio::test]
    async fn get_tree_keeps_executable_and_symlink_modes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    { "path": "run.sh", "mode": "100755", "type": "blob", "sha": sha('1'), "size": 10 },
                    { "path": "link", "mode": "120000", "type": "blob", "sha": sha('2'), "size": 6 }
                ]
            })))
            .mount(&server)
            .await;

        let entries = forge(&server).get_tree(&oid('t'), true).await.unwrap();
        assert_eq!(entries[0].mode, FileMode::Executable);
        assert_eq!(entries[1].mode, FileMode::Symlink);
    }

    #[tokio::test]
    async fn get_tree_rejects_unknown_mode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    { "path": "odd", "mode": "100664", "type": "blob", "sha": sha('1') }
                ]
            })))
            .mount(&server)
            .await;

        assert!(matches!(
            forge(&server).get_tree(&oid('t'), true).await,
            Err(ForgeError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn truncated_tree_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha('t'),
                "truncated": true,
                "tree": [
                    { "path": "a.txt", "mode": "100644", "type": "blob", "sha": sha('1'), "size": 1 }
                ]
            })))
            .mount(&server)
            .await;

        match forge(&server).get_tree(&oid('t'), true).await {
            Err(ForgeError::TruncatedTree(tree)) => assert_eq!(tree, oid('t')),
            other => panic!("expected TruncatedTree, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn get_blob_decodes_wrapped_base64() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/blobs/{}", sha('b'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": sha('b'),
                "size": 5,
                "encoding": "base64",
                "content": "aGVs\nbG8=\n"
            })))
            .mount(&server)
            .await;

        let blob = forge(&server).get_blob(&oid('b')).await.unwrap();
        assert_eq!(blob.decode().unwrap(), b"hello");
    }

    #[tokio::test]
    async fn get_blob_rejects_unknown_encoding() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/blobs/{}", sha('b'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "rot13",
                "content": "uryyb"
            })))
            .mount(&server)
            .await;

        assert!(matches!(
            forge(&server).get_blob(&oid('b')).await,
            Err(ForgeError::Decode(_))
        ));
    }
}

// =============================================================================
// Writes
// =============================================================================

mod writes {
    use super::*;

    #[tokio::test]
    async fn create_blob_posts_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/site/git/blobs"))
            .and(body_json(json!({ "content": "aGVsbG8=", "encoding": "base64" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "sha": sha('b'),
                "url": "https://example.invalid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(forge(&server).create_blob(b"hello").await.unwrap(), oid('b'));
    }

    #[tokio::test]
    async fn create_tree_posts_items_without_base() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/site/git/trees"))
            .and(body_json(json!({
                "tree": [
                    { "path": "docs", "mode": "040000", "type": "tree", "sha": sha('d') },
                    { "path": "docs/a.md", "mode": "100644", "type": "blob", "sha": sha('a') }
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('t') })))
            .expect(1)
            .mount(&server)
            .await;

        let items = vec![
            TreeItem {
                path: "docs".into(),
                mode: FileMode::Directory,
                kind: EntryKind::Tree,
                oid: oid('d'),
            },
            TreeItem {
                path: "docs/a.md".into(),
                mode: FileMode::File,
                kind: EntryKind::Blob,
                oid: oid('a'),
            },
        ];
        assert_eq!(forge(&server).create_tree(&items).await.unwrap(), oid('t'));
    }

    #[tokio::test]
    async fn create_commit_has_one_parent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/site/git/commits"))
            .and(body_json(json!({
                "message": "automatic commit from ghfs",
                "tree": sha('t'),
                "parents": [sha('p')]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('c') })))
            .expect(1)
            .mount(&server)
            .await;

        let commit = forge(&server)
            .create_commit("automatic commit from ghfs", &oid('t'), &oid('p'))
            .await
            .unwrap();
        assert_eq!(commit, oid('c'));
    }

    #[tokio::test]
    async fn update_ref_is_not_forced() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octocat/site/git/refs/heads/main"))
            .and(body_json(json!({ "sha": sha('c'), "force": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/main",
                "object": { "sha": sha('c'), "type": "commit" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        forge(&server)
            .update_ref(&main_branch(), &oid('c'), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_ref_rejection_is_ref_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octocat/site/git/refs/heads/main"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(error_body("Update is not a fast forward")),
            )
            .mount(&server)
            .await;

        assert_eq!(
            forge(&server).update_ref(&main_branch(), &oid('c'), false).await,
            Err(ForgeError::RefConflict("Update is not a fast forward".into()))
        );
    }

    #[tokio::test]
    async fn delete_path_returns_new_head() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/octocat/site/contents/docs/a.md"))
            .and(body_json(json!({
                "message": "automatic commit from ghfs",
                "sha": sha('a'),
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": null,
                "commit": { "sha": sha('c'), "tree": { "sha": sha('t') }, "message": "m" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = forge(&server)
            .delete_path("docs/a.md", &oid('a'), &main_branch(), "automatic commit from ghfs")
            .await
            .unwrap();
        assert_eq!(result.commit, oid('c'));
        assert_eq!(result.tree, oid('t'));
    }

    #[tokio::test]
    async fn delete_path_stale_blob_is_ref_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/octocat/site/contents/a.md"))
            .respond_with(ResponseTemplate::new(409).set_body_json(error_body("a.md does not match")))
            .mount(&server)
            .await;

        assert!(matches!(
            forge(&server)
                .delete_path("a.md", &oid('a'), &main_branch(), "m")
                .await,
            Err(ForgeError::RefConflict(_))
        ));
    }
}

// =============================================================================
// Error mapping
// =============================================================================

mod errors {
    use super::*;

    async fn branch_error(template: ResponseTemplate) -> ForgeError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/branches/main"))
            .respond_with(template)
            .mount(&server)
            .await;
        forge(&server).get_branch(&main_branch()).await.unwrap_err()
    }

    #[tokio::test]
    async fn unauthorized_is_auth_failed() {
        let err = branch_error(ResponseTemplate::new(401).set_body_json(error_body("Bad credentials"))).await;
        assert!(matches!(err, ForgeError::AuthFailed(_)));
    }

    #[tokio::test]
    async fn exhausted_quota_is_rate_limited() {
        let err = branch_error(
            ResponseTemplate::new(403)
                .insert_header("X-RateLimit-Remaining", "0")
                .set_body_json(error_body("API rate limit exceeded")),
        )
        .await;
        assert_eq!(err, ForgeError::RateLimited);
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let err = branch_error(ResponseTemplate::new(429)).await;
        assert_eq!(err, ForgeError::RateLimited);
    }

    #[tokio::test]
    async fn forbidden_names_required_permissions() {
        let err = branch_error(
            ResponseTemplate::new(403)
                .insert_header("X-Accepted-GitHub-Permissions", "contents=read")
                .set_body_json(error_body("Resource not accessible by integration")),
        )
        .await;
        match err {
            ForgeError::AuthFailed(message) => {
                assert!(message.contains("Permission denied"));
                assert!(message.contains("contents=read"));
            }
            other => panic!("expected AuthFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_branch_is_not_found() {
        let err = branch_error(ResponseTemplate::new(404).set_body_json(error_body("Branch not found"))).await;
        assert_eq!(err, ForgeError::NotFound("Branch not found".into()));
    }

    #[tokio::test]
    async fn server_error_keeps_status() {
        let err = branch_error(ResponseTemplate::new(502)).await;
        assert!(matches!(err, ForgeError::ApiError { status: 502, .. }));
    }

    #[tokio::test]
    async fn empty_token_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let forge = GitHubForge::with_api_base(
            Arc::new(StaticToken::new("")),
            "octocat",
            "site",
            server.uri(),
        );
        assert_eq!(
            forge.get_branch(&main_branch()).await,
            Err(ForgeError::AuthRequired)
        );
    }
}

// =============================================================================
// Mounting over HTTP
// =============================================================================

mod session {
    use super::*;

    #[tokio::test]
    async fn mount_and_read_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/branches/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commit": { "sha": sha('c'), "commit": { "tree": { "sha": sha('t') } } }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    { "path": "a", "mode": "040000", "type": "tree", "sha": sha('1') },
                    { "path": "a/b.txt", "mode": "100644", "type": "blob", "sha": sha('2'), "size": 5 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/blobs/{}", sha('2'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "encoding": "base64",
                "content": "aGVsbG8="
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fs = GitHubFs::mount(Arc::new(forge(&server)), main_branch())
            .await
            .unwrap();

        assert_eq!(fs.read_dir("a").await.unwrap().names(), vec!["b.txt"]);

        let mut file = fs.open("a/b.txt").await.unwrap().into_file().unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn mount_fails_on_truncated_tree() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/branches/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commit": { "sha": sha('c'), "commit": { "tree": { "sha": sha('t') } } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "truncated": true,
                "tree": []
            })))
            .mount(&server)
            .await;

        let result = GitHubFs::mount(Arc::new(forge(&server)), main_branch()).await;
        assert!(matches!(
            result,
            Err(FsError::Remote(ForgeError::TruncatedTree(_)))
        ));
    }

    #[tokio::test]
    async fn commit_resubmits_remote_modes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octocat/site/branches/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commit": { "sha": sha('c'), "commit": { "tree": { "sha": sha('t') } } }
            })))
            .expect(2)
            .mount(&server)
            .await;
        // listed at mount and again after the commit
        Mock::given(method("GET"))
            .and(path(format!("/repos/octocat/site/git/trees/{}", sha('t'))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tree": [
                    { "path": "run.sh", "mode": "100755", "type": "blob", "sha": sha('1'), "size": 10 },
                    { "path": "link", "mode": "120000", "type": "blob", "sha": sha('2'), "size": 6 }
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/site/git/trees"))
            .and(body_json(json!({
                "tree": [
                    { "path": "run.sh", "mode": "100755", "type": "blob", "sha": sha('1') },
                    { "path": "link", "mode": "120000", "type": "blob", "sha": sha('2') }
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('t') })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/octocat/site/git/commits"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sha": sha('d') })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octocat/site/git/refs/heads/main"))
            .and(body_json(json!({ "sha": sha('d'), "force": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ref": "refs/heads/main",
                "object": { "sha": sha('d'), "type": "commit" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let fs = GitHubFs::mount(Arc::new(forge(&server)), main_branch())
            .await
            .unwrap();
        assert_eq!(fs.commit().await.unwrap(), oid('d'));
        assert_eq!(fs.stat("run.sh").await.unwrap().mode, FileMode::Executable);
        assert_eq!(fs.stat("link").await.unwrap().mode, FileMode::Symlink);
    }
}
