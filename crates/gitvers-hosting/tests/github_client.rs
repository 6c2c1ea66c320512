use gitvers_hosting::{GitHubClient, HostingClient, HostingError, Lookup};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_testtoken123";

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&server.uri(), TOKEN).expect("client")
}

fn commit_json(sha: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "sha": sha,
        "commit": {
            "message": message,
            "committer": { "date": "2024-05-01T12:00:00Z" }
        }
    })
}

#[tokio::test]
async fn current_login_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"login": "octo"})))
        .expect(1)
        .mount(&server)
        .await;

    let login = client(&server).current_login().await.unwrap();
    assert_eq!(login, "octo");
}

#[tokio::test]
async fn current_login_maps_401_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = client(&server).current_login().await.unwrap_err();
    assert!(matches!(err, HostingError::Unauthorized));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn find_repository_distinguishes_found_and_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "site",
            "full_name": "octo/site",
            "clone_url": "https://github.com/octo/site.git",
            "private": true,
            "stargazers_count": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let c = client(&server);
    match c.find_repository("octo", "site").await {
        Lookup::Found(repo) => assert_eq!(repo.full_name, "octo/site"),
        other => panic!("expected Found, got {other:?}"),
    }
    assert!(matches!(
        c.find_repository("octo", "missing").await,
        Lookup::NotFound
    ));
    assert!(c.exists("octo", "site").await.unwrap());
    assert!(!c.exists("octo", "missing").await.unwrap());
}

#[tokio::test]
async fn find_repository_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    match client(&server).find_repository("octo", "site").await {
        Lookup::Error(HostingError::Http { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_repository_requests_private_repo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_json(serde_json::json!({"name": "site", "private": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "name": "site",
            "full_name": "octo/site",
            "clone_url": "https://github.com/octo/site.git",
            "private": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = client(&server).create_repository("site").await.unwrap();
    assert!(repo.private);
}

#[tokio::test]
async fn list_commits_follows_pages() {
    let server = MockServer::start().await;
    let first_page: Vec<_> = (0..100)
        .map(|i| commit_json(&format!("{:040x}", 200 - i), &format!("Version {}: page one", 200 - i)))
        .collect();
    let second_page = vec![commit_json(&format!("{:040x}", 1), "Version 1: first")];

    Mock::given(method("GET"))
        .and(path("/repos/octo/site/commits"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/commits"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(second_page))
        .mount(&server)
        .await;

    match client(&server).list_commits("octo", "site").await {
        Lookup::Found(commits) => {
            assert_eq!(commits.len(), 101);
            assert_eq!(commits[0].subject(), "Version 200: page one");
            assert_eq!(commits[100].subject(), "Version 1: first");
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[tokio::test]
async fn list_commits_of_empty_repository_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/site/commits"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Git Repository is empty."))
        .mount(&server)
        .await;

    match client(&server).list_commits("octo", "site").await {
        Lookup::Found(commits) => assert!(commits.is_empty()),
        other => panic!("expected empty listing, got {other:?}"),
    }
}
