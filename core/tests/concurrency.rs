//! Shared resources read from several threads at once.

use std::thread;

use resource_core::{FileParameter, HttpResource, Parameter};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn resource_is_send_and_sync() {
    assert_send_sync::<HttpResource>();
}

#[test]
fn first_reads_from_many_threads_agree() {
    let res = HttpResource::builder("http://example.com/upload?id=1 2&flag")
        .post_params(vec![Parameter::new("title", "a&b"), Parameter::flag("draft")])
        .file_params(vec![FileParameter::new("doc", "cv.txt", "hello")])
        .build();

    let seen: Vec<(String, String, String, u64)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (
                        res.url().to_string(),
                        res.encoded_data().to_string(),
                        res.encoded_files().to_string(),
                        res.identity_hash(),
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = &seen[0];
    assert!(seen.iter().all(|values| values == first));
    assert_eq!(first.0, "http://example.com/upload?id=1%202&flag");
    assert_eq!(first.1, "title=a%26b&draft");
    assert_eq!(first.2, "doc=cv.txt");
    assert_eq!(first.3, res.identity_hash());
}
