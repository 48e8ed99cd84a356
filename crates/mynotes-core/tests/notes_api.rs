//! End-to-end use of the public API against an on-disk database

use mynotes_core::{
    spawn_worker, CommandHistory, Config, ListChange, NoteChange, NoteColor, NoteDraft,
    NoteField, NoteListPresenter, NoteRepository, SortOrder, WorkerCommand, WorkerEvent,
};
use std::time::Duration;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> Config {
    Config {
        data_dir: dir.path().join("data"),
        ..Config::default()
    }
}

#[test]
fn repository_presenter_and_history_agree() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let mut repo = NoteRepository::open(&config).unwrap();
    let mut history = CommandHistory::new(config.history_limit);
    let mut presenter = NoteListPresenter::new(SortOrder::Recent);

    assert_eq!(presenter.replace_all(repo.list().unwrap()), ListChange::Reset);
    assert!(presenter.is_empty());

    let shopping = history
        .create(
            &mut repo,
            NoteDraft::new()
                .with_title("Shopping")
                .with_body("eggs")
                .with_color(NoteColor::Yellow),
        )
        .unwrap();
    assert_eq!(
        presenter.apply(shopping.clone()),
        Some(ListChange::Inserted { index: 0 })
    );

    let ideas = history
        .create(&mut repo, NoteDraft::new().with_title("Ideas"))
        .unwrap();
    assert_eq!(presenter.apply(ideas), Some(ListChange::Inserted { index: 0 }));

    // Editing the older note moves it to the top
    let mut edited = shopping.note().clone();
    edited.set_body("eggs, flour");
    let updated = history.update(&mut repo, &edited).unwrap();
    assert_eq!(
        presenter.apply(updated),
        Some(ListChange::Moved { from: 1, to: 0 })
    );

    // Undo the edit, then the create
    let reverted = history.undo(&mut repo).unwrap().unwrap();
    assert_eq!(reverted.note().body, "eggs");
    presenter.apply(reverted);

    let removed = history.undo(&mut repo).unwrap().unwrap();
    assert!(matches!(removed, NoteChange::Deleted(_)));
    presenter.apply(removed);

    let stored = repo.list().unwrap();
    assert_eq!(presenter.items(), stored.as_slice());
    assert_eq!(stored.len(), 1);
}

#[test]
fn validation_errors_are_field_level() {
    let dir = TempDir::new().unwrap();
    let mut repo = NoteRepository::open(&config_in(&dir)).unwrap();

    let err = repo
        .create(NoteDraft::new().with_web_link("nope"))
        .unwrap_err();
    let issues = err.validation().unwrap();

    assert!(issues.for_field(NoteField::Title).is_some());
    assert!(issues.for_field(NoteField::Body).is_some());
    assert!(issues.for_field(NoteField::WebLink).is_some());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn notes_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);

    let id = {
        let mut repo = NoteRepository::open(&config).unwrap();
        repo.create(NoteDraft::new().with_title("kept")).unwrap().id()
    };

    let repo = NoteRepository::open(&config).unwrap();
    assert_eq!(repo.get(id).unwrap().unwrap().title, "kept");
    assert!(config.sqlite_path().exists());
}

#[tokio::test]
async fn worker_drives_the_list() {
    let dir = TempDir::new().unwrap();
    let repo = NoteRepository::open(&config_in(&dir)).unwrap();
    let mut handle = spawn_worker(repo, 100).unwrap();
    let mut presenter = NoteListPresenter::default();

    handle.send(WorkerCommand::Refresh).await;
    handle
        .send(WorkerCommand::Create(NoteDraft::new().with_title("from worker")))
        .await;

    let mut events = Vec::new();
    for _ in 0..2 {
        let event = tokio::time::timeout(Duration::from_secs(5), handle.next_event())
            .await
            .unwrap()
            .unwrap();
        events.push(event);
    }

    for event in events {
        match event {
            WorkerEvent::Loaded(notes) => {
                presenter.replace_all(notes);
            }
            WorkerEvent::Changed { change, .. } => {
                assert_eq!(
                    presenter.apply(change),
                    Some(ListChange::Inserted { index: 0 })
                );
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    assert_eq!(presenter.len(), 1);
    assert_eq!(presenter.items()[0].title, "from worker");
    handle.send(WorkerCommand::Shutdown).await;
}
