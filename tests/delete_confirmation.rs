// tests/delete_confirmation.rs
//
// The delete helper's line protocol, driven through a fake backend: the
// test plays the helper by feeding stdout lines and inspecting what was
// written back to its stdin.

use subvolmenu::actions::Actions;
use subvolmenu::confirm::ConfirmationProtocol;
use subvolmenu::dialog::{Dialog, DialogResponse};
use subvolmenu::engine::{DialogId, ProcessId, StreamEvent, Supervisor, SupervisorEvent};
use subvolmenu::exec::Helper;
use subvolmenu::menu::FileItem;
use subvolmenu::types::StreamKind;
use subvolmenu_test_utils::{FakeBackend, RecordingPresenter, init_tracing};

struct Harness {
    backend: FakeBackend,
    presenter: RecordingPresenter,
    sup: Supervisor,
    actions: Actions,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let backend = FakeBackend::new();
        let presenter = RecordingPresenter::new();
        let sup = Supervisor::new(backend.clone(), presenter.clone());
        let actions = Actions::new(Helper::new("helper"), ConfirmationProtocol::default());
        Self {
            backend,
            presenter,
            sup,
            actions,
        }
    }

    /// Select `paths`, pick "Delete", confirm the warning.
    fn delete(&mut self, paths: &[&str]) -> Vec<ProcessId> {
        let files: Vec<FileItem> = paths.iter().map(|p| FileItem::parse(p)).collect();
        self.actions.delete_subvolumes(&mut self.sup, &files);

        let (warning, dialog) = self.presenter.last().expect("delete warning");
        assert_eq!(dialog, Dialog::delete_warning());
        self.answer(warning, DialogResponse::Ok);

        self.backend.spawned_ids()
    }

    fn print(&mut self, process: ProcessId, line: &str) {
        self.sup.handle_event(SupervisorEvent::Stream {
            process,
            event: StreamEvent::Data(StreamKind::Stdout, line.as_bytes().to_vec()),
        });
    }

    fn exit(&mut self, process: ProcessId, code: i32) {
        for event in [
            StreamEvent::Closed(StreamKind::Stdout),
            StreamEvent::Closed(StreamKind::Stderr),
            StreamEvent::Exited(Some(code)),
        ] {
            self.sup
                .handle_event(SupervisorEvent::Stream { process, event });
        }
    }

    fn answer(&mut self, dialog: DialogId, response: DialogResponse) {
        self.sup
            .handle_event(SupervisorEvent::DialogResponse { dialog, response });
    }

    fn prompts(&self) -> Vec<(DialogId, String)> {
        self.presenter
            .presented()
            .into_iter()
            .filter_map(|(id, d)| match d {
                Dialog::ConfirmDeletion { item } => Some((id, item)),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn test_one_delete_per_selected_item() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a", "/mnt/pool/b"]);

    let spawned: Vec<Vec<String>> = h.backend.spawned().into_iter().map(|(_, c)| c).collect();
    assert_eq!(
        spawned,
        vec![
            vec!["helper", "delete", "/mnt/pool/a"],
            vec!["helper", "delete", "/mnt/pool/b"],
        ]
    );
    assert_ne!(ids[0], ids[1]);
    assert_eq!(h.sup.live_processes(), 2);
}

#[test]
fn test_cancelling_the_warning_deletes_nothing() {
    let mut h = Harness::new();
    h.actions
        .delete_subvolumes(&mut h.sup, &[FileItem::parse("/mnt/pool/a")]);
    let warning = h.presenter.last_id();
    h.answer(warning, DialogResponse::Cancel);

    assert!(h.backend.spawned().is_empty());
    assert!(h.sup.is_idle());
}

#[test]
fn test_request_line_prompts_and_answer_goes_to_stdin() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a"]);
    let a = ids[0];

    h.print(a, "/mnt/pool/a/.snap (y/n)?\n");
    let prompts = h.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, "/mnt/pool/a/.snap");
    assert!(h.backend.stdin_of(a).is_empty());

    h.answer(prompts[0].0, DialogResponse::No);
    assert_eq!(h.backend.stdin_of(a), vec!["n\n"]);
    assert_eq!(h.sup.open_dialogs(), 0);
}

#[test]
fn test_yes_to_all_applies_to_its_own_process_only() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a", "/mnt/pool/b"]);
    let (a, b) = (ids[0], ids[1]);

    h.print(a, "/mnt/pool/a/x (y/n)?\n");
    let first = h.prompts()[0].0;
    h.answer(first, DialogResponse::YesToAll);
    assert_eq!(h.backend.stdin_of(a), vec!["y\n"]);
    assert!(h.sup.session(a).unwrap().always_yes());

    // Same process: answered without a dialog.
    h.print(a, "/mnt/pool/a/y (y/n)?\n");
    assert_eq!(h.prompts().len(), 1);
    assert_eq!(h.backend.stdin_of(a), vec!["y\n", "y\n"]);

    // Other process: still asks.
    h.print(b, "/mnt/pool/b (y/n)?\n");
    let prompts = h.prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[1].1, "/mnt/pool/b");
    assert!(h.backend.stdin_of(b).is_empty());
    assert!(!h.sup.session(b).unwrap().always_yes());
}

#[test]
fn test_completion_line_needs_no_answer() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a"]);
    let a = ids[0];

    h.print(a, "Delete subvolume (no-commit): '/mnt/pool/a' deleted.\n");
    assert!(h.prompts().is_empty());
    assert_eq!(h.backend.stdin_write_count(), 0);

    h.exit(a, 0);
    assert!(h.sup.is_idle());
    assert_eq!(h.presenter.presented().len(), 1); // the warning only
}

#[test]
fn test_open_prompt_is_withdrawn_when_its_process_ends() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a"]);
    let a = ids[0];

    h.print(a, "/mnt/pool/a (y/n)?\n");
    let prompt = h.prompts()[0].0;
    assert_eq!(h.sup.open_dialogs(), 1);

    h.exit(a, 0);
    assert_eq!(h.presenter.dismissed(), vec![prompt]);
    assert!(h.sup.is_idle());

    // A late answer is ignored.
    h.answer(prompt, DialogResponse::Yes);
    assert_eq!(h.backend.stdin_write_count(), 0);
}

#[test]
fn test_several_lines_in_one_burst_each_count() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a"]);
    let a = ids[0];

    h.print(a, "/mnt/pool/a/1 deleted.\n/mnt/pool/a/2 (y/n)?\n");
    let prompts = h.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, "/mnt/pool/a/2");
}

#[test]
fn test_request_line_split_across_bursts_prompts_once() {
    let mut h = Harness::new();
    let ids = h.delete(&["/mnt/pool/a"]);
    let a = ids[0];

    h.print(a, "/mnt/pool/a");
    assert!(h.prompts().is_empty());

    h.print(a, " (y/n)?\n");
    let prompts = h.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, "/mnt/pool/a");

    h.answer(prompts[0].0, DialogResponse::No);
    assert_eq!(h.backend.stdin_of(a), vec!["n\n"]);
    assert_eq!(h.backend.stdin_write_count(), 1);
}
