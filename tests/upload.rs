mod common;

use common::{file_part, upload, upload_request, Part, TestRoot};
use http_body_util::{Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{HeaderValue, CONTENT_LENGTH};
use hyper::StatusCode;
use std::io;

#[tokio::test]
async fn test_upload_stores_basename_in_root() {
    let root = TestRoot::new();

    let res = root.send(upload(&[file_part("../x.txt", b"uploaded")])).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "File x.txt uploaded successfully.");
    assert_eq!(root.entries(), vec!["x.txt"]);

    let res = root.get("/x.txt").await;
    assert_eq!(res.text(), "uploaded");
}

#[tokio::test]
async fn test_windows_style_path_is_reduced() {
    let root = TestRoot::new();

    let res = root
        .send(upload(&[file_part("C:\\Users\\me\\photo.jpg", b"jpeg")]))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(root.entries(), vec!["photo.jpg"]);
}

#[tokio::test]
async fn test_upload_replaces_existing_file() {
    let root = TestRoot::new();
    root.write("notes.txt", b"first version, longer than the second");

    let res = root.send(upload(&[file_part("notes.txt", b"second")])).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        std::fs::read(root.root().join("notes.txt")).unwrap(),
        b"second"
    );
    assert_eq!(root.entries(), vec!["notes.txt"]);
}

#[tokio::test]
async fn test_other_fields_are_ignored() {
    let root = TestRoot::new();

    let parts = [
        Part {
            name: "comment",
            filename: None,
            data: b"not stored",
        },
        file_part("data.bin", &[0, 1, 2, 3]),
    ];
    let res = root.send(upload(&parts)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(root.entries(), vec!["data.bin"]);
}

#[tokio::test]
async fn test_empty_file_is_accepted() {
    let root = TestRoot::new();

    let res = root.send(upload(&[file_part("empty.txt", b"")])).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        std::fs::metadata(root.root().join("empty.txt")).unwrap().len(),
        0
    );
}

#[tokio::test]
async fn test_oversized_stream_is_rejected_without_leftovers() {
    let root = TestRoot::with_config(|c| c.storage.max_upload_size = 1024);

    let data = vec![b'z'; 4096];
    let res = root.send(upload(&[file_part("big.bin", &data)])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_oversized_declared_length_is_rejected() {
    let root = TestRoot::with_config(|c| c.storage.max_upload_size = 1024);

    // Far beyond the limit plus any framing allowance
    let mut req = upload(&[file_part("small.txt", b"tiny")]);
    req.headers_mut()
        .insert(CONTENT_LENGTH, HeaderValue::from_static("10000000"));
    let res = root.send(req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_missing_file_field_is_bad_request() {
    let root = TestRoot::new();

    let parts = [Part {
        name: "attachment",
        filename: Some("x.txt"),
        data: b"wrong field",
    }];
    let res = root.send(upload(&parts)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_unusable_filenames_are_bad_request() {
    let root = TestRoot::new();

    for name in ["", "..", "dir/", ".upload-x.part"] {
        let res = root.send(upload(&[file_part(name, b"data")])).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{name:?}");
    }
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body_is_bad_request() {
    let root = TestRoot::new();

    let req = hyper::Request::builder()
        .method(hyper::Method::POST)
        .uri("/upload")
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from_static(b"{}")))
        .unwrap();
    let res = root.send(req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_broken_body_leaves_no_partial_file() {
    let root = TestRoot::new();

    // Headers and some data, then the connection dies mid-field
    let full = common::multipart_body(&[file_part("cut.bin", &[7u8; 2048])]);
    let prefix = Bytes::copy_from_slice(&full[..full.len() / 2]);
    let frames: Vec<Result<Frame<Bytes>, io::Error>> = vec![
        Ok(Frame::data(prefix)),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")),
    ];
    let body = StreamBody::new(futures_util::stream::iter(frames));

    let res = root.send(upload_request(body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_truncated_body_leaves_no_partial_file() {
    let root = TestRoot::new();

    // Well-formed start, but the closing boundary never arrives
    let full = common::multipart_body(&[file_part("cut.bin", &[7u8; 2048])]);
    let truncated = Bytes::copy_from_slice(&full[..full.len() - 40]);

    let res = root.send(upload_request(Full::new(truncated))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_uploads_to_same_name_never_interleave() {
    let root = TestRoot::new();

    let a = vec![b'a'; 256 * 1024];
    let b = vec![b'b'; 256 * 1024];
    let (first, second) = tokio::join!(
        root.send(upload(&[file_part("shared.bin", &a)])),
        root.send(upload(&[file_part("shared.bin", &b)])),
    );
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);

    let stored = std::fs::read(root.root().join("shared.bin")).unwrap();
    assert!(stored == a || stored == b);
    assert_eq!(root.entries(), vec!["shared.bin"]);
}

#[tokio::test]
async fn test_upload_path_is_configurable() {
    let root = TestRoot::with_config(|c| c.storage.upload_path = "/incoming".to_string());

    let mut req = upload(&[file_part("moved.txt", b"moved")]);
    *req.uri_mut() = "/incoming".parse().unwrap();
    let res = root.send(req).await;
    assert_eq!(res.status, StatusCode::OK);

    // The default endpoint is now an ordinary read-only path
    let res = root.send(upload(&[file_part("moved.txt", b"again")])).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_second_file_field_is_rejected() {
    let root = TestRoot::new();

    let parts = [file_part("one.txt", b"1"), file_part("two.txt", b"2")];
    let res = root.send(upload(&parts)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_file_of_exactly_the_limit_is_accepted() {
    let root = TestRoot::with_config(|c| c.storage.max_upload_size = 1024);

    let data = vec![b'x'; 1024];
    let res = root.send(upload(&[file_part("exact.bin", &data)])).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(std::fs::read(root.root().join("exact.bin")).unwrap(), data);
}

#[tokio::test]
async fn test_file_one_byte_over_the_limit_is_rejected() {
    let root = TestRoot::with_config(|c| c.storage.max_upload_size = 1024);

    let data = vec![b'x'; 1025];
    let res = root.send(upload(&[file_part("over.bin", &data)])).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}

#[tokio::test]
async fn test_other_fields_count_toward_the_limit() {
    let root = TestRoot::with_config(|c| c.storage.max_upload_size = 1024);

    let padding = vec![b'p'; 600];
    let data = vec![b'x'; 600];
    let parts = [
        Part {
            name: "padding",
            filename: None,
            data: &padding,
        },
        file_part("split.bin", &data),
    ];
    let res = root.send(upload(&parts)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(root.entries().is_empty());
}
