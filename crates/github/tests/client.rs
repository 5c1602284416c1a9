use github::{CreatePrRequest, GitHubClient, GitHubError, PrState, RepoConfig, Tracker};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (GitHubClient, MockServer) {
    let mock = MockServer::start().await;
    let client = GitHubClient::new(
        "secret-token",
        &mock.uri(),
        RepoConfig::new("w3c", "web-platform-tests"),
        RepoConfig::new("servo", "servo"),
    )
    .expect("Failed to build client");
    (client, mock)
}

fn commit_json(mock: &MockServer, sha: &str) -> serde_json::Value {
    json!({
        "sha": sha,
        "url": format!("{}/repos/servo/servo/commits/{}", mock.uri(), sha),
        "html_url": format!("{}/servo/servo/commit/{}", mock.uri(), sha),
        "commit": {
            "author": { "name": "Jane Doe", "email": "jane@example.com", "date": "2017-11-01T00:00:00Z" },
            "message": format!("Commit {}", sha)
        }
    })
}

mod commits {
    use super::*;

    #[tokio::test]
    async fn test_list_pr_commits() {
        let (client, mock) = setup().await;

        Mock::given(method("GET"))
            .and(path("/repos/servo/servo/pulls/42/commits"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([commit_json(&mock, "aaa"), commit_json(&mock, "bbb")])),
            )
            .expect(1)
            .mount(&mock)
            .await;

        let url = format!("{}/repos/servo/servo/pulls/42/commits", mock.uri());
        let commits = client.list_pr_commits(&url).await.unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].sha, "aaa");
        assert_eq!(commits[1].commit.message, "Commit bbb");
        assert_eq!(commits[0].commit.author.email, "jane@example.com");
    }

    #[tokio::test]
    async fn test_get_commit_files() {
        let (client, mock) = setup().await;

        Mock::given(method("GET"))
            .and(path("/repos/servo/servo/commits/aaa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "aaa",
                "files": [{ "filename": "tests/wpt/web-platform-tests/a.html", "status": "added" }]
            })))
            .mount(&mock)
            .await;

        let url = format!("{}/repos/servo/servo/commits/aaa", mock.uri());
        let detail = client.get_commit(&url).await.unwrap();

        assert!(detail.touches_prefix("tests/wpt/web-platform-tests/"));
    }

    #[tokio::test]
    async fn test_get_diff() {
        let (client, mock) = setup().await;

        Mock::given(method("GET"))
            .and(path("/servo/servo/commit/aaa.diff"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("diff --git a/x b/x\n"))
            .mount(&mock)
            .await;

        let url = format!("{}/servo/servo/commit/aaa.diff", mock.uri());
        let diff = client.get_diff(&url).await.unwrap();

        assert_eq!(diff, "diff --git a/x b/x\n");
    }

    #[tokio::test]
    async fn test_get_diff_non_success_carries_status_and_body() {
        let (client, mock) = setup().await;

        Mock::given(method("GET"))
            .and(path("/servo/servo/commit/zzz.diff"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock)
            .await;

        let url = format!("{}/servo/servo/commit/zzz.diff", mock.uri());
        let err = client.get_diff(&url).await.unwrap_err();

        match err {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

mod pull_requests {
    use super::*;

    #[tokio::test]
    async fn test_create_pull_request() {
        let (client, mock) = setup().await;

        Mock::given(method("POST"))
            .and(path("/repos/w3c/web-platform-tests/pulls"))
            .and(body_json(json!({
                "title": "Update flexbox tests",
                "body": "Reviewed in https://github.com/servo/servo/pull/42.",
                "head": "servo-wpt-sync:servo_export_42",
                "base": "master",
                "maintainer_can_modify": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://github.com/w3c/web-platform-tests/pull/7"
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let request =
            CreatePrRequest::new("Update flexbox tests", "servo-wpt-sync:servo_export_42", "master")
                .with_body("Reviewed in https://github.com/servo/servo/pull/42.");
        let created = client.create_pull_request(&request).await.unwrap();

        assert_eq!(created.number, 7);
        assert_eq!(
            created.html_url,
            "https://github.com/w3c/web-platform-tests/pull/7"
        );
    }

    #[tokio::test]
    async fn test_create_pull_request_validation_failure() {
        let (client, mock) = setup().await;

        Mock::given(method("POST"))
            .and(path("/repos/w3c/web-platform-tests/pulls"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&mock)
            .await;

        let request = CreatePrRequest::new("t", "h", "master");
        let err = client.create_pull_request(&request).await.unwrap_err();

        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_set_pull_request_state() {
        let (client, mock) = setup().await;

        Mock::given(method("PATCH"))
            .and(path("/repos/w3c/web-platform-tests/pulls/7"))
            .and(body_json(json!({ "state": "closed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": 7 })))
            .expect(1)
            .mount(&mock)
            .await;

        client
            .set_pull_request_state(7, PrState::Closed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_merge_pull_request() {
        let (client, mock) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/repos/w3c/web-platform-tests/pulls/7/merge"))
            .and(body_json(json!({ "merge_method": "merge" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "merged": true })))
            .expect(1)
            .mount(&mock)
            .await;

        client.merge_pull_request(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_merge_conflict_is_an_error() {
        let (client, mock) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/repos/w3c/web-platform-tests/pulls/7/merge"))
            .respond_with(ResponseTemplate::new(405).set_body_json(json!({
                "message": "Pull Request is not mergeable"
            })))
            .mount(&mock)
            .await;

        let err = client.merge_pull_request(7).await.unwrap_err();
        assert_eq!(err.status(), Some(405));
    }

    #[tokio::test]
    async fn test_proxy_error_page_keeps_status_and_body() {
        let (client, mock) = setup().await;
        let page = "<html><body><h1>502 Bad Gateway</h1></body></html>";

        Mock::given(method("PATCH"))
            .and(path("/repos/w3c/web-platform-tests/pulls/7"))
            .respond_with(
                ResponseTemplate::new(502)
                    .insert_header("content-type", "text/html")
                    .set_body_string(page),
            )
            .mount(&mock)
            .await;

        let err = client
            .set_pull_request_state(7, PrState::Open)
            .await
            .unwrap_err();

        match err {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, page);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_pull_request_behind_unavailable_proxy() {
        let (client, mock) = setup().await;

        Mock::given(method("POST"))
            .and(path("/repos/w3c/web-platform-tests/pulls"))
            .respond_with(
                ResponseTemplate::new(503)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<html>Service Unavailable</html>"),
            )
            .mount(&mock)
            .await;

        let request = CreatePrRequest::new("t", "h", "master");
        let err = client.create_pull_request(&request).await.unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_merge_error_uses_json_message() {
        let (client, mock) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/repos/w3c/web-platform-tests/pulls/7/merge"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "Head branch was modified"
            })))
            .mount(&mock)
            .await;

        let err = client.merge_pull_request(7).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (409): Head branch was modified");
    }
}

mod labels_and_comments {
    use super::*;

    #[tokio::test]
    async fn test_add_labels() {
        let (client, mock) = setup().await;

        Mock::given(method("POST"))
            .and(path("/repos/w3c/web-platform-tests/issues/7/labels"))
            .and(body_json(json!({ "labels": ["servo-export", "do not merge yet"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock)
            .await;

        client
            .add_labels(7, &["servo-export", "do not merge yet"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_label_encodes_name() {
        let (client, mock) = setup().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/w3c/web-platform-tests/issues/7/labels/do%20not%20merge%20yet"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock)
            .await;

        client.remove_label(7, "do not merge yet").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_missing_label_is_not_an_error() {
        let (client, mock) = setup().await;

        Mock::given(method("DELETE"))
            .and(path("/repos/w3c/web-platform-tests/issues/7/labels/do%20not%20merge%20yet"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Label does not exist" })),
            )
            .mount(&mock)
            .await;

        client.remove_label(7, "do not merge yet").await.unwrap();
    }

    #[tokio::test]
    async fn test_comment_on_source_pr() {
        let (client, mock) = setup().await;

        Mock::given(method("POST"))
            .and(path("/repos/servo/servo/issues/42/comments"))
            .and(body_json(json!({ "body": "hello" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
            .expect(1)
            .mount(&mock)
            .await;

        client.comment_on_source_pr(42, "hello").await.unwrap();
    }
}
