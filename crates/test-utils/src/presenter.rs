use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use subvolmenu::dialog::{Dialog, DialogPresenter, DialogResponse};
use subvolmenu::engine::{DialogId, SupervisorEvent};

#[derive(Default)]
struct Log {
    presented: Vec<(DialogId, Dialog)>,
    dismissed: Vec<DialogId>,
}

/// Records dialogs and never answers them; tests answer by feeding
/// `SupervisorEvent::DialogResponse` to the supervisor themselves.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<Log>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> Vec<(DialogId, Dialog)> {
        self.log.lock().unwrap().presented.clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.presented()
            .iter()
            .map(|(_, d)| d.title().to_string())
            .collect()
    }

    pub fn last(&self) -> Option<(DialogId, Dialog)> {
        self.log.lock().unwrap().presented.last().cloned()
    }

    /// Id of the most recent dialog; panics if none was shown.
    pub fn last_id(&self) -> DialogId {
        self.last().expect("no dialog presented").0
    }

    pub fn dismissed(&self) -> Vec<DialogId> {
        self.log.lock().unwrap().dismissed.clone()
    }
}

impl DialogPresenter for RecordingPresenter {
    fn present(&mut self, id: DialogId, dialog: &Dialog) {
        self.log.lock().unwrap().presented.push((id, dialog.clone()));
    }

    fn dismiss(&mut self, id: DialogId) {
        self.log.lock().unwrap().dismissed.push(id);
    }
}

type Answerer = Box<dyn FnMut(&Dialog) -> DialogResponse + Send>;

/// Answers every dialog immediately through the runtime channel, using
/// `answer` to pick the response. Also records like [`RecordingPresenter`].
pub struct AutoPresenter {
    events: mpsc::Sender<SupervisorEvent>,
    answer: Answerer,
    recorder: RecordingPresenter,
}

impl AutoPresenter {
    pub fn new(
        events: mpsc::Sender<SupervisorEvent>,
        answer: impl FnMut(&Dialog) -> DialogResponse + Send + 'static,
    ) -> Self {
        Self {
            events,
            answer: Box::new(answer),
            recorder: RecordingPresenter::new(),
        }
    }

    /// Shares the log of dialogs this presenter has shown.
    pub fn recorder(&self) -> RecordingPresenter {
        self.recorder.clone()
    }
}

impl DialogPresenter for AutoPresenter {
    fn present(&mut self, id: DialogId, dialog: &Dialog) {
        self.recorder.present(id, dialog);
        let response = (self.answer)(dialog);
        self.events
            .try_send(SupervisorEvent::DialogResponse {
                dialog: id,
                response,
            })
            .expect("event channel full or closed");
    }

    fn dismiss(&mut self, id: DialogId) {
        self.recorder.dismiss(id);
    }
}
