mod common;

use std::sync::Arc;

use common::{settle, start_session};
use value_store::MemoryBackend;
use versekeeper_core_types::{cleared_key, value_key, FieldKind, WorkspaceId, LYRICS_DEFAULT};

#[tokio::test(start_paused = true)]
async fn clear_empties_the_field_and_raises_the_flag() {
    let backend = Arc::new(MemoryBackend::new());
    let session = start_session("https://suno.com/create", backend.clone());
    settle().await;
    assert_eq!(
        session.page.value_of(session.nodes.lyrics).as_deref(),
        Some(LYRICS_DEFAULT)
    );

    session.page.click_clear_lyrics();
    settle().await;

    let wid = WorkspaceId::sentinel();
    assert_eq!(session.page.value_of(session.nodes.lyrics).as_deref(), Some(""));
    let snapshot = backend.snapshot();
    assert_eq!(snapshot.get(&cleared_key(&wid)), Some(&"1".to_string()));
    assert_eq!(
        snapshot.get(&value_key(FieldKind::Lyrics, &wid)),
        Some(&String::new())
    );
    session.stop().await;
}

#[tokio::test(start_paused = true)]
async fn cleared_workspace_stays_empty_across_sessions() {
    let backend = Arc::new(MemoryBackend::new());
    let session = start_session("https://suno.com/create?wid=song1", backend.clone());
    settle().await;
    session.page.click_clear_lyrics();
    settle().await;
    session.stop().await;

    // Reload: no default reinserted for this workspace.
    let session = start_session("https://suno.com/create?wid=song1", backend.clone());
    settle().await;
    assert_eq!(session.page.value_of(session.nodes.lyrics).as_deref(), Some(""));
    session.stop().await;
}

#[tokio::test(start_paused = true)]
async fn typing_after_a_clear_lowers_the_flag_on_blur() {
    let backend = Arc::new(MemoryBackend::new());
    let session = start_session("https://suno.com/create", backend.clone());
    settle().await;
    session.page.click_clear_lyrics();
    settle().await;

    session.page.user_type(session.nodes.lyrics, "verse one");
    session.page.user_blur(session.nodes.lyrics);
    settle().await;

    let wid = WorkspaceId::sentinel();
    assert_eq!(
        backend.snapshot().get(&cleared_key(&wid)),
        Some(&"0".to_string())
    );
    session.stop().await;
}
