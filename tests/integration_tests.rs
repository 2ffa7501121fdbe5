use isl_bible_navigator::bible_core::{
    parse_marker_table, Catalog, CatalogBuilder, Direction, ParseFailure, ReferenceParser,
    StaticMarkerSource, VerseLabel, VerseMarkerIndex,
};
use isl_bible_navigator::data::discover_marker_files;
use isl_bible_navigator::{
    load_catalog, ChangeOrigin, Config, ConfigBuilder, DirectoryMarkerSource, NavigationEvent,
    NavigationState, Navigator, NavigatorOptions, Rejection, Session, SessionCommand,
    SessionHandle, SessionUpdate, SimulatedPlayer, Transition,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const GENESIS_49: &str = "verse,time
Intro,00:00:00:00
1,00:00:12:00
2,00:00:30:00
3-5,00:02:00:00
31-33,00:05:10.5
";

const JOHN_3: &str = "verse,time
1,0
2,0.2
3,0.4
";

fn catalog() -> Arc<Catalog> {
    Arc::new(
        CatalogBuilder::canonical()
            .enable_chapters("GEN", [1, 49])
            .enable_chapters("JHN", [3])
            .verse_count("GEN", 49, 33)
            .build()
            .unwrap(),
    )
}

fn markers() -> Arc<VerseMarkerIndex> {
    let source = StaticMarkerSource::new()
        .with_chapter("GEN", 49, parse_marker_table(GENESIS_49).unwrap())
        .with_chapter("JHN", 3, parse_marker_table(JOHN_3).unwrap());
    Arc::new(VerseMarkerIndex::new(Arc::new(source)))
}

fn config() -> Config {
    ConfigBuilder::new()
        .with_poll_interval_ms(20)
        .with_debounce_ms(50)
        .auto_select_first_verse(false)
        .build()
}

fn start_session(
    config: Config,
    player_duration: Option<f64>,
) -> (JoinHandle<anyhow::Result<Navigator>>, SessionHandle) {
    let (player_tx, player_rx) = mpsc::unbounded_channel();
    let player = SimulatedPlayer::new(player_tx);
    let player = match player_duration {
        Some(seconds) => player.with_duration(seconds),
        None => player,
    };

    let navigator = Navigator::new(catalog(), markers(), NavigatorOptions::from_config(&config));
    let (session, handle) = Session::new(navigator, Arc::new(player), player_rx, &config);
    (tokio::spawn(session.run()), handle)
}

/// Wait for the first update matching `predicate`, skipping the others
async fn wait_for<F>(handle: &mut SessionHandle, mut predicate: F) -> SessionUpdate
where
    F: FnMut(&SessionUpdate) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            match handle.recv().await {
                Some(update) if predicate(&update) => return update,
                Some(_) => continue,
                None => panic!("session closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for session update")
}

async fn shutdown(task: JoinHandle<anyhow::Result<Navigator>>, handle: &SessionHandle) -> Navigator {
    handle.send(SessionCommand::Shutdown).await.unwrap();
    task.await.unwrap().unwrap()
}

#[tokio::test]
async fn test_session_starts_on_first_available_chapter() {
    let (task, mut handle) = start_session(config(), None);

    let update = wait_for(&mut handle, |u| {
        matches!(u, SessionUpdate::Navigation(NavigationEvent::ChapterSelected { .. }))
    })
    .await;
    let SessionUpdate::Navigation(NavigationEvent::ChapterSelected { book, chapter }) = update
    else {
        unreachable!()
    };
    assert_eq!(book.code, "GEN");
    assert_eq!(chapter, 1);

    let navigator = shutdown(task, &handle).await;
    assert_eq!(navigator.state(), NavigationState::ChapterSelected);
}

#[tokio::test]
async fn test_search_jumps_to_range_marker() {
    let (task, mut handle) = start_session(config(), None);
    handle
        .send(SessionCommand::Search("gen 49:32".to_string()))
        .await
        .unwrap();

    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::Seek(_))).await;
    let SessionUpdate::Seek(seek) = update else {
        unreachable!()
    };
    assert_eq!(seek.time_seconds, 310.5);
    assert!(seek.token.is_some());

    let navigator = shutdown(task, &handle).await;
    let selection = navigator.selection();
    assert_eq!(selection.book().unwrap().code, "GEN");
    assert_eq!(selection.chapter(), Some(49));
    assert_eq!(selection.verse(), Some(VerseLabel::range(31, 33).unwrap()));
    assert_eq!(selection.verse().unwrap().to_string(), "31-33");
}

#[tokio::test]
async fn test_search_selects_sub_range_and_listed_verse() {
    let (task, mut handle) = start_session(config(), None);

    handle
        .send(SessionCommand::Search("gen 49:4-5".to_string()))
        .await
        .unwrap();
    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::Seek(_))).await;
    let SessionUpdate::Seek(seek) = update else {
        unreachable!()
    };
    assert_eq!(seek.time_seconds, 120.0);

    // Verse 10 is in the chapter but has no marker of its own
    handle
        .send(SessionCommand::Search("gen 49:10".to_string()))
        .await
        .unwrap();
    let update = wait_for(&mut handle, |u| {
        matches!(u, SessionUpdate::Navigation(NavigationEvent::VerseSelected { .. }))
            || matches!(u, SessionUpdate::Rejected(_))
    })
    .await;
    let SessionUpdate::Navigation(NavigationEvent::VerseSelected { label, origin, .. }) = update
    else {
        panic!("verse 10 was not selected: {:?}", update)
    };
    assert_eq!(label, VerseLabel::single(10));
    assert!(matches!(origin, ChangeOrigin::User(_)));

    let navigator = shutdown(task, &handle).await;
    assert_eq!(navigator.state(), NavigationState::VerseSelected);
    assert_eq!(navigator.selection().verse(), Some(VerseLabel::single(10)));
}

#[tokio::test]
async fn test_failed_search_keeps_selection() {
    let (task, mut handle) = start_session(config(), None);
    handle
        .send(SessionCommand::Search("Xyz 1:1".to_string()))
        .await
        .unwrap();

    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::SearchFailed(_))).await;
    let SessionUpdate::SearchFailed(error) = update else {
        unreachable!()
    };
    assert_eq!(error.kind(), ParseFailure::BookNotFound);

    handle
        .send(SessionCommand::Search("Genesis 51".to_string()))
        .await
        .unwrap();
    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::SearchFailed(_))).await;
    let SessionUpdate::SearchFailed(error) = update else {
        unreachable!()
    };
    assert_eq!(error.kind(), ParseFailure::ChapterUnavailable);

    let navigator = shutdown(task, &handle).await;
    assert_eq!(navigator.selection().chapter(), Some(1));
}

#[tokio::test]
async fn test_typeahead_delivers_latest_input_only() {
    let (task, mut handle) = start_session(config(), None);

    for input in ["j", "jo", "joh"] {
        handle
            .send(SessionCommand::SearchInput(input.to_string()))
            .await
            .unwrap();
    }

    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::Suggestions(_))).await;
    let SessionUpdate::Suggestions(suggestions) = update else {
        unreachable!()
    };
    assert_eq!(suggestions[0].book.code, "JHN");
    assert!(!suggestions[0].disabled);

    let extra = tokio::time::timeout(Duration::from_millis(200), async {
        loop {
            if let Some(SessionUpdate::Suggestions(_)) = handle.recv().await {
                return;
            }
        }
    })
    .await;
    assert!(extra.is_err(), "only one suggestion batch expected");

    shutdown(task, &handle).await;
}

#[tokio::test]
async fn test_playback_drives_verse_selection() {
    let (task, mut handle) = start_session(config(), None);
    handle
        .send(SessionCommand::Search("John 3".to_string()))
        .await
        .unwrap();
    handle.send(SessionCommand::Play).await.unwrap();

    let update = wait_for(&mut handle, |u| {
        matches!(
            u,
            SessionUpdate::Navigation(NavigationEvent::VerseSelected { label, .. })
                if *label == VerseLabel::single(2)
        )
    })
    .await;
    let SessionUpdate::Navigation(NavigationEvent::VerseSelected { origin, book, .. }) = update
    else {
        unreachable!()
    };
    assert_eq!(origin, ChangeOrigin::Playback);
    assert_eq!(book.code, "JHN");

    shutdown(task, &handle).await;
}

#[tokio::test]
async fn test_playback_end_advances_to_next_chapter() {
    let config = ConfigBuilder::new()
        .with_poll_interval_ms(20)
        .auto_select_first_verse(false)
        .advance_on_end(true)
        .build();
    let (task, mut handle) = start_session(config, Some(0.3));

    handle
        .send(SessionCommand::Search("Genesis 49".to_string()))
        .await
        .unwrap();
    handle.send(SessionCommand::Play).await.unwrap();

    let update = wait_for(&mut handle, |u| {
        matches!(u, SessionUpdate::Navigation(NavigationEvent::PlaybackEnded { .. }))
    })
    .await;
    let SessionUpdate::Navigation(NavigationEvent::PlaybackEnded { book, chapter }) = update
    else {
        unreachable!()
    };
    assert_eq!((book.code.as_str(), chapter), ("GEN", 49));

    let update = wait_for(&mut handle, |u| {
        matches!(u, SessionUpdate::Navigation(NavigationEvent::ChapterSelected { .. }))
    })
    .await;
    let SessionUpdate::Navigation(NavigationEvent::ChapterSelected { book, chapter }) = update
    else {
        unreachable!()
    };
    assert_eq!((book.code.as_str(), chapter), ("JHN", 3));

    shutdown(task, &handle).await;
}

#[tokio::test]
async fn test_chapter_navigation_stops_at_boundary() {
    let (task, mut handle) = start_session(config(), None);
    handle
        .send(SessionCommand::NavigateChapter(Direction::Previous))
        .await
        .unwrap();

    let update = wait_for(&mut handle, |u| matches!(u, SessionUpdate::Rejected(_))).await;
    assert_eq!(update, SessionUpdate::Rejected(Rejection::AtBoundary));

    let navigator = shutdown(task, &handle).await;
    assert_eq!(navigator.selection().chapter(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_manual_seek_suppresses_playback_updates() {
    let options = NavigatorOptions {
        auto_select_first_verse: false,
        seek_lock_timeout: Duration::from_millis(500),
    };
    let mut navigator = Navigator::new(catalog(), markers(), options);
    navigator.select_initial();
    navigator.navigate_chapter(Direction::Next);
    navigator.take_events();

    let (token, transition) = navigator.on_user_seek(125.0);
    assert_eq!(transition, Transition::Applied);
    assert_eq!(navigator.selection().verse(), Some(VerseLabel::range(3, 5).unwrap()));

    // A stale sample from before the seek must not move the selection back
    assert_eq!(navigator.on_playback_time(13.0), Transition::Unchanged);

    assert!(navigator.confirm_seek(Some(token)));
    assert_eq!(navigator.on_playback_time(31.0), Transition::Applied);
    assert_eq!(navigator.selection().verse(), Some(VerseLabel::single(2)));

    // Unconfirmed seeks unlock after the fallback timeout
    navigator.on_user_seek(310.6);
    assert_eq!(navigator.on_playback_time(12.5), Transition::Unchanged);
    tokio::time::advance(Duration::from_millis(600)).await;
    assert_eq!(navigator.on_playback_time(12.5), Transition::Applied);
    assert_eq!(navigator.selection().verse(), Some(VerseLabel::single(1)));
}

#[tokio::test]
async fn test_catalog_and_marker_files_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("catalog.json");
    let markers_dir = temp_dir.path().join("markers");
    tokio::fs::create_dir_all(&markers_dir).await.unwrap();

    tokio::fs::write(
        &catalog_path,
        r#"{"videos": [{"book": "GEN", "chapter": 49}, {"book": "1JN", "chapter": 2}]}"#,
    )
    .await
    .unwrap();
    tokio::fs::write(markers_dir.join("Genesis_49.csv"), GENESIS_49)
        .await
        .unwrap();
    tokio::fs::write(
        markers_dir.join("1_John_2.json"),
        r#"[{"verse": "1", "time": 0}, {"verse": "2-3", "time": "00:00:20"}]"#,
    )
    .await
    .unwrap();

    let catalog = load_catalog(&catalog_path).await.unwrap();
    assert_eq!(catalog.len(), 66);

    let files = discover_marker_files(&markers_dir).unwrap();
    assert_eq!(files.len(), 2);

    let markers = VerseMarkerIndex::new(Arc::new(DirectoryMarkerSource::new(&markers_dir)));
    let parser = ReferenceParser::new(&catalog, &markers);

    let reference = parser.parse("Genesis 49:32").unwrap();
    assert_eq!(reference.to_string(), "Genesis 49:32");
    let genesis = &reference.book;
    assert_eq!(
        markers.resolve_label(genesis, 49, VerseLabel::single(32)),
        Some(VerseLabel::range(31, 33).unwrap())
    );
    assert_eq!(markers.time_for(genesis, 49, VerseLabel::single(32)), Ok(310.5));

    let first_john = parser.parse("1 John 2:3").unwrap();
    assert_eq!(first_john.book.code, "1JN");
    assert_eq!(
        markers.verse_at(&first_john.book, 2, 25.0),
        Some(VerseLabel::range(2, 3).unwrap())
    );

    assert_eq!(
        parser.parse("Genesis 49:40").unwrap_err().kind(),
        ParseFailure::VerseNotFound
    );
}

#[test]
fn test_empty_catalog_file_falls_back_to_canonical_books() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("catalog.json");
    std::fs::write(&catalog_path, "{}").unwrap();

    let catalog = tokio_test::block_on(load_catalog(&catalog_path)).unwrap();
    assert_eq!(catalog.len(), 66);
    assert!(catalog.first_enabled_book().is_none());
    assert_eq!(catalog.lookup_book("rev").unwrap().display_name, "Revelation");
}
