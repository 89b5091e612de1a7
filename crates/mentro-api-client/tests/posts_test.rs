use mentro_api_client::{ApiClient, Auth};
use mentro_compose::{Key, SubmissionController};
use mentro_core::models::FileHandle;
use mentro_core::ComposeError;
use mockito::Matcher;

const COMPLETE_LINE: &str = concat!(
    r#"data: {"type":"complete","post":{"id":"p1","author":{"id":"u1","name":"Ada"},"#,
    r#""content":"hello","media":[],"likes":0,"comments":[],"#,
    r##""timestamp":"2026-10-18T09:30:00Z","tags":["#intro"]}}"##,
    "\n"
);

fn controller(client: ApiClient) -> SubmissionController<ApiClient> {
    let mut controller = SubmissionController::new(client);
    controller.set_content("hello");
    controller
        .staging_mut()
        .add_images(vec![FileHandle::new("cover.png", "image/png", "png-bytes")]);
    let mut buffer = "#intro".to_string();
    controller.hashtags_mut().on_key(&mut buffer, Key::Comma);
    controller
}

#[tokio::test]
async fn test_streamed_post_creation() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "data: {{\"fileName\":\"cover.png\",\"progress\":40}}\n{}",
        COMPLETE_LINE
    );
    let mock = server
        .mock("POST", "/api/v1/posts")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="content"\r\n\r\nhello\r\n"#.to_string()),
            Matcher::Regex(r##"name="hashtags"\r\n\r\n\["#intro"\]"##.to_string()),
            Matcher::Regex(r#"name="images"; filename="cover.png""#.to_string()),
            Matcher::Regex(r#"\r\n\r\npng-bytes\r\n"#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Auth::Bearer("secret".to_string())).unwrap();
    let mut controller = controller(client);

    let post = controller.submit().await.unwrap();

    mock.assert_async().await;
    assert_eq!(post.id, "p1");
    assert_eq!(post.tags, ["#intro"]);
    assert_eq!(post.comments.count(), 0);
    assert!(controller.staging().is_empty());
    assert_eq!(controller.content(), "");
}

#[tokio::test]
async fn test_error_payload_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/posts")
        .match_header("x-api-key", "key-1")
        .with_status(413)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"File too large"}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Auth::XApiKey("key-1".to_string())).unwrap();
    let mut controller = controller(client);

    let err = controller.submit().await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, ComposeError::Request { status: 413, .. }));
    assert_eq!(controller.last_error(), Some("File too large"));
    assert_eq!(controller.staging().len(), 1);
    assert_eq!(controller.content(), "hello");
}

#[tokio::test]
async fn test_stream_without_completion() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/posts")
        .with_status(200)
        .with_body("data: {\"fileName\":\"cover.png\",\"progress\":100}\n")
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Auth::Bearer("secret".to_string())).unwrap();
    let mut controller = controller(client);

    let err = controller.submit().await.unwrap_err();

    assert!(matches!(err, ComposeError::UnexpectedStreamEnd));
    assert!(controller.progress().is_empty());
    assert_eq!(controller.staging().len(), 1);
}

#[tokio::test]
async fn test_empty_success_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/v1/posts")
        .with_status(204)
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Auth::Bearer("secret".to_string())).unwrap();
    let mut controller = controller(client);

    let err = controller.submit().await.unwrap_err();

    assert!(matches!(err, ComposeError::NoResponseBody));
    assert_eq!(controller.last_error(), Some("No response body"));
}
