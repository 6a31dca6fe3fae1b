// tests/menu_actions.rs

use subvolmenu::actions::{Actions, SNAPSHOT_NAME_TITLE, SUBVOLUME_NAME_TITLE};
use subvolmenu::dialog::{Dialog, DialogResponse};
use subvolmenu::engine::{Supervisor, SupervisorEvent};
use subvolmenu::menu::{FileItem, MenuAction, background_items, file_items};
use subvolmenu_test_utils::builders::ConfigFileBuilder;
use subvolmenu_test_utils::{FakeBackend, RecordingPresenter, exited, init_tracing};

fn setup() -> (FakeBackend, RecordingPresenter, Supervisor, Actions) {
    init_tracing();
    let backend = FakeBackend::new();
    let presenter = RecordingPresenter::new();
    let sup = Supervisor::new(backend.clone(), presenter.clone());
    let cfg = ConfigFileBuilder::new().with_helper("helper").build();
    (backend, presenter, sup, Actions::from_config(&cfg))
}

fn submit(sup: &mut Supervisor, presenter: &RecordingPresenter, name: &str) {
    sup.handle_event(SupervisorEvent::DialogResponse {
        dialog: presenter.last_id(),
        response: DialogResponse::Submitted(name.to_string()),
    });
}

#[test]
fn test_create_subvolume_from_background_menu() {
    let (backend, presenter, mut sup, actions) = setup();

    let item = background_items(&FileItem::parse("file:///mnt/pool"))
        .into_iter()
        .next()
        .expect("create entry");
    actions.activate(&mut sup, item.action, None);

    assert_eq!(
        presenter.last().map(|(_, d)| d),
        Some(Dialog::NameEntry {
            title: SUBVOLUME_NAME_TITLE.into()
        })
    );
    assert!(backend.blocking_commands().is_empty());

    submit(&mut sup, &presenter, "data");

    assert_eq!(
        backend.blocking_commands(),
        vec![vec!["helper", "createsubvol", "/mnt/pool", "data"]]
    );
    assert!(sup.is_idle());
}

#[test]
fn test_snapshot_lands_next_to_its_source() {
    let (backend, presenter, mut sup, actions) = setup();

    let items = file_items(&[FileItem::parse("/mnt/pool/vol")]);
    let snapshot = items
        .into_iter()
        .find(|i| i.name == "BtrfsSnapshotExtension::snapshot")
        .expect("snapshot entry");
    actions.activate(&mut sup, snapshot.action, None);
    assert_eq!(presenter.titles(), vec![SNAPSHOT_NAME_TITLE]);

    submit(&mut sup, &presenter, "backup1");

    assert_eq!(
        backend.blocking_commands(),
        vec![vec![
            "helper",
            "create",
            "-p",
            "/mnt/pool/vol",
            "/mnt/pool/backup1"
        ]]
    );
    assert!(sup.is_idle());
}

#[test]
fn test_cancelled_name_entry_runs_nothing() {
    let (backend, presenter, mut sup, actions) = setup();
    actions.create_subvolume(&mut sup, &FileItem::parse("/mnt/pool"), None);

    sup.handle_event(SupervisorEvent::DialogResponse {
        dialog: presenter.last_id(),
        response: DialogResponse::Cancel,
    });

    assert!(backend.blocking_commands().is_empty());
    assert!(sup.is_idle());
}

#[test]
fn test_given_name_skips_the_dialog() {
    let (backend, presenter, mut sup, actions) = setup();
    actions.activate(
        &mut sup,
        MenuAction::CreateSubvolume {
            directory: FileItem::parse("/mnt/pool"),
        },
        Some("data".into()),
    );

    assert!(presenter.presented().is_empty());
    assert_eq!(backend.blocking_commands().len(), 1);
}

#[test]
fn test_failed_create_shows_helper_stderr() {
    let (backend, presenter, mut sup, actions) = setup();
    backend.push_outcome(exited(1, "ERROR: target path already exists: /mnt/pool/data\n"));

    actions.create_subvolume(&mut sup, &FileItem::parse("/mnt/pool"), Some("data".into()));

    let (_, dialog) = presenter.last().expect("error dialog");
    assert_eq!(
        dialog.secondary(),
        Some("ERROR: target path already exists: /mnt/pool/data\n")
    );
    assert_eq!(sup.live_processes(), 0);
    assert_eq!(sup.open_dialogs(), 1);
}

#[test]
fn test_remote_locations_are_skipped() {
    let (backend, presenter, mut sup, actions) = setup();
    actions.create_subvolume(&mut sup, &FileItem::parse("sftp://host/mnt/pool"), None);
    actions.create_snapshot(&mut sup, &FileItem::parse("sftp://host/mnt/pool/vol"), None);
    actions.delete_subvolumes(&mut sup, &[FileItem::parse("sftp://host/mnt/pool/vol")]);

    assert!(presenter.presented().is_empty());
    assert!(backend.blocking_commands().is_empty());
    assert!(sup.is_idle());
}

#[test]
fn test_snapshot_of_root_is_skipped() {
    let (backend, presenter, mut sup, actions) = setup();
    actions.create_snapshot(&mut sup, &FileItem::parse("/"), Some("x".into()));

    assert!(presenter.presented().is_empty());
    assert!(backend.blocking_commands().is_empty());
}
