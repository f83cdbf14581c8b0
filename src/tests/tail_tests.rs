#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::error::AppError;
    use crate::log_reader::tail::MAX_PARTIAL_BYTES;
    use crate::log_reader::{TailOptions, TailSubscription};
    use crate::tests::write_file;
    use crate::types::TailEvent;

    const WAIT: Duration = Duration::from_secs(5);

    fn fast_options() -> TailOptions {
        TailOptions {
            poll_interval: Duration::from_millis(20),
            channel_capacity: 64,
            idle_timeout: None,
            max_retries: 2,
        }
    }

    fn append(path: &Path, content: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    async fn next(sub: &mut TailSubscription) -> Option<TailEvent> {
        timeout(WAIT, sub.next_event()).await.expect("timed out waiting for tail event")
    }

    fn line(s: &str) -> TailEvent {
        TailEvent::Line { line: s.to_string() }
    }

    #[tokio::test]
    async fn test_appended_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "old 1\nold 2\n");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        assert_eq!(sub.start_offset(), 12);

        append(&path, "L1\nL2\n");
        append(&path, "L3\n");

        assert_eq!(next(&mut sub).await, Some(line("L1")));
        assert_eq!(next(&mut sub).await, Some(line("L2")));
        assert_eq!(next(&mut sub).await, Some(line("L3")));
        sub.close().await;
    }

    #[tokio::test]
    async fn test_partial_line_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        append(&path, "par");
        assert!(timeout(Duration::from_millis(150), sub.next_event()).await.is_err());

        append(&path, "tial\r\nnext\n");
        assert_eq!(next(&mut sub).await, Some(line("partial")));
        assert_eq!(next(&mut sub).await, Some(line("next")));
    }

    #[tokio::test]
    async fn test_overlong_line_is_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        let total = 3 * MAX_PARTIAL_BYTES + 1000;
        append(&path, &"x".repeat(total));

        for _ in 0..3 {
            match next(&mut sub).await {
                Some(TailEvent::Line { line }) => assert_eq!(line.len(), MAX_PARTIAL_BYTES),
                other => panic!("Expected chunk, got {:?}", other),
            }
        }

        append(&path, "\n");
        assert_eq!(next(&mut sub).await, Some(line(&"x".repeat(1000))));
    }

    #[tokio::test]
    async fn test_truncation_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "before\n");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        append(&path, "L1\n");
        assert_eq!(next(&mut sub).await, Some(line("L1")));

        std::fs::File::create(&path).unwrap();
        assert_eq!(next(&mut sub).await, Some(TailEvent::Reset { offset: 0 }));

        append(&path, "after\n");
        assert_eq!(next(&mut sub).await, Some(line("after")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_replaced_file_resets_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "first generation\n");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();

        let staged = dir.path().join("staged.tmp");
        write_file(&staged, "rotated\n");
        std::fs::rename(&staged, &path).unwrap();

        assert_eq!(next(&mut sub).await, Some(TailEvent::Reset { offset: 8 }));

        append(&path, "fresh\n");
        assert_eq!(next(&mut sub).await, Some(line("fresh")));
    }

    #[tokio::test]
    async fn test_subscriptions_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "");

        let mut a = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        append(&path, "one\n");
        assert_eq!(next(&mut a).await, Some(line("one")));

        let mut b = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        assert_eq!(b.start_offset(), 4);

        append(&path, "two\n");
        assert_eq!(next(&mut a).await, Some(line("two")));
        assert_eq!(next(&mut b).await, Some(line("two")));

        drop(a);
        append(&path, "three\n");
        assert_eq!(next(&mut b).await, Some(line("three")));
    }

    #[tokio::test]
    async fn test_close_stops_task() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("app.log"), "x\n");

        let sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        assert!(sub.path().ends_with("app.log"));
        timeout(WAIT, sub.close()).await.expect("close did not finish");
    }

    #[tokio::test]
    async fn test_deleted_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        write_file(&path, "x\n");

        let mut sub = TailSubscription::open(dir.path(), "app.log", fast_options()).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        match next(&mut sub).await {
            Some(TailEvent::Error { message }) => assert!(message.contains("app.log")),
            other => panic!("Expected Error event, got {:?}", other),
        }
        assert_eq!(next(&mut sub).await, None);
    }

    #[tokio::test]
    async fn test_idle_timeout_ends_subscription() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join("app.log"), "x\n");

        let options = TailOptions { idle_timeout: Some(Duration::from_millis(100)), ..fast_options() };
        let mut sub = TailSubscription::open(dir.path(), "app.log", options).await.unwrap();
        assert_eq!(next(&mut sub).await, None);
    }

    #[tokio::test]
    async fn test_open_rejects_bad_names() {
        let root = tempfile::tempdir().unwrap();
        let logs = root.path().join("logs");
        std::fs::create_dir(&logs).unwrap();
        write_file(&root.path().join("secret.log"), "secret\n");

        let result = TailSubscription::open(&logs, "../secret.log", fast_options()).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));

        let result = TailSubscription::open(&logs, "missing.log", fast_options()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
