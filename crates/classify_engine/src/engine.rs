use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use classify_logging::classify_debug;

use crate::submit::{ChannelProgressSink, ClassifySettings, Classifier, ReqwestClassifier};
use crate::{CycleId, EngineEvent};

enum EngineCommand {
    Submit { cycle: CycleId, path: PathBuf },
}

/// Runs classify requests on a background tokio runtime and reports back over a channel.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    pub fn new(settings: ClassifySettings) -> io::Result<Self> {
        Self::with_classifier(Arc::new(ReqwestClassifier::new(settings)))
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let classifier = classifier.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(classifier.as_ref(), command, event_tx).await;
                });
            }
            classify_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        })
    }

    pub fn submit(&self, cycle: CycleId, path: impl Into<PathBuf>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            cycle,
            path: path.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    classifier: &dyn Classifier,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Submit { cycle, path } => {
            let sink = ChannelProgressSink::new(event_tx.clone());
            let result = classifier.classify(cycle, &path, &sink).await;
            let _ = event_tx.send(EngineEvent::ClassifyCompleted { cycle, result });
        }
    }
}
