use super::*;
use crate::host::ArtworkFetcher;

#[test]
fn slots_rotate_through_ten_keys() {
    let mut ids = ArtworkIds::default();
    let keys: Vec<String> = (0..12).map(|_| ids.next_id().key()).collect();
    assert_eq!(keys[0], "player.artwork.0");
    assert_eq!(keys[9], "player.artwork.9");
    assert_eq!(keys[10], "player.artwork.0");
    assert_eq!(keys[11], "player.artwork.1");
}

#[test]
fn reused_slot_is_still_a_distinct_request() {
    let mut ids = ArtworkIds::default();
    let first = ids.next_id();
    for _ in 0..9 {
        ids.next_id();
    }
    let again = ids.next_id();
    assert_eq!(first.slot(), again.slot());
    assert_ne!(first, again);
    assert_eq!(again.generation(), 10);
}

#[test]
fn file_urls_resolve_to_local_paths() {
    assert_eq!(
        http::local_path("file:///tmp/cover.png"),
        Some(std::path::PathBuf::from("/tmp/cover.png"))
    );
    assert_eq!(http::local_path("https://example.com/a.png"), None);
}

#[test]
fn cancelling_finished_requests_leaves_nothing_tracked() {
    let dir = tempfile::tempdir().unwrap();
    let cover = dir.path().join("cover.png");
    std::fs::write(&cover, b"png").unwrap();
    let url = format!("file://{}", cover.display());

    let (tx, rx) = std::sync::mpsc::channel();
    let fetcher = HttpArtworkFetcher::new(dir.path().join("cache"), tx);
    let mut ids = ArtworkIds::default();
    for _ in 0..5 {
        let id = ids.next_id();
        fetcher.fetch(ArtworkRequest {
            id,
            url: url.clone(),
        });
        let result = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(result.id, id);
        assert_eq!(result.outcome.unwrap(), cover);
        fetcher.cancel(id);
    }
    assert_eq!(fetcher.in_flight_count(), 0);
}
