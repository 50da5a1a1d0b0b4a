use std::path::PathBuf;
use std::sync::{mpsc, Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use classify_core::{ClassifyFailure, Effect, Msg};
use classify_engine::{
    export_raw, ClassifyError, ClassifySettings, EngineEvent, EngineHandle, FailureKind, Stage,
};
use classify_logging::{classify_debug, classify_info, classify_warn};

/// Outcome of an effect the user should hear about directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved(PathBuf),
    SaveFailed(String),
}

/// Executes effects. The runner is the only strong owner of the engine: dropping it
/// closes the command channel, which stops the engine thread and its runtime.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    download_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        settings: ClassifySettings,
        download_dir: PathBuf,
        msg_tx: mpsc::Sender<Msg>,
    ) -> std::io::Result<Self> {
        let engine = Arc::new(EngineHandle::new(settings)?);
        let runner = Self {
            engine,
            download_dir,
        };
        forward_events(Arc::downgrade(&runner.engine), msg_tx);
        Ok(runner)
    }

    pub fn set_download_dir(&mut self, dir: PathBuf) {
        self.download_dir = dir;
    }

    pub fn run(&self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitClassify { cycle, file } => {
                    classify_info!("SubmitClassify cycle={} file={:?}", cycle, file.path());
                    self.engine.submit(cycle, file.path());
                }
                Effect::SaveDownload { download } => {
                    match export_raw(&self.download_dir, download.file_name(), download.bytes()) {
                        Ok(summary) => notices.push(Notice::Saved(summary.output_path)),
                        Err(err) => {
                            classify_warn!("Saving cycle {} failed: {}", download.cycle(), err);
                            notices.push(Notice::SaveFailed(err.to_string()));
                        }
                    }
                }
            }
        }
        notices
    }
}

/// Turn engine events into messages until the engine or the message receiver goes away.
fn forward_events(engine: Weak<EngineHandle>, msg_tx: mpsc::Sender<Msg>) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Some(engine) = engine.upgrade() {
            let Some(event) = engine.recv_timeout(Duration::from_millis(50)) else {
                continue;
            };
            let msg = match event {
                EngineEvent::Progress(progress) => match (progress.stage, progress.bytes) {
                    (Stage::Receiving, Some(received_bytes)) => Msg::ClassifyProgress {
                        cycle: progress.cycle,
                        received_bytes,
                    },
                    (stage, bytes) => {
                        classify_debug!("Cycle {} {:?} {:?}", progress.cycle, stage, bytes);
                        continue;
                    }
                },
                EngineEvent::ClassifyCompleted { cycle, result } => Msg::ClassifyDone {
                    cycle,
                    result: result.map(|output| output.bytes).map_err(map_failure),
                },
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
        classify_debug!("Engine event forwarding stopped");
    })
}

fn map_failure(err: ClassifyError) -> ClassifyFailure {
    match err.kind {
        FailureKind::HttpStatus(status) => ClassifyFailure::Service {
            status,
            body: err.message,
        },
        _ => ClassifyFailure::Transport(err.to_string()),
    }
}
