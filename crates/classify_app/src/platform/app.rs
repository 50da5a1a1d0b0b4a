use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use classify_core::{update, AppState, AppViewModel, FileHandle, Msg, Phase};
use classify_logging::{classify_debug, classify_info};
use log::LevelFilter;
use serde_json::json;

use super::cli::{Cli, Command, OutputFormat};
use super::config::AppConfig;
use super::effects::{EffectRunner, Notice};
use super::logging;
use super::ui::commands::{self, UserCommand, HELP};
use super::ui::render;

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(cli.log, level);

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let settings = config.settings(cli.endpoint.as_deref())?;
    let download_dir = config.download_dir(cli.download_dir.as_deref());
    classify_info!("Using endpoint {}", settings.endpoint);

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(settings, download_dir, msg_tx)
        .context("failed to start the classification engine")?;
    let session = Session::new(runner, msg_rx);

    match cli.command {
        Some(Command::Run { file, out, format }) => run_once(session, file, out, format),
        Some(Command::Interactive) | None => run_interactive(session),
    }
}

/// Owns the state between messages and feeds effects to the runner.
struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    fn new(runner: EffectRunner, msg_rx: mpsc::Receiver<Msg>) -> Self {
        Self {
            state: AppState::new(),
            runner,
            msg_rx,
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Notice> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects)
    }

    fn take_frame(&mut self) -> Option<AppViewModel> {
        if self.state.consume_dirty() {
            Some(self.state.view())
        } else {
            None
        }
    }

    fn drain_engine(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(msg) = self.msg_rx.try_recv() {
            notices.extend(self.dispatch(msg));
        }
        notices
    }

    /// Block until the in-flight cycle (if any) resolves.
    fn wait_idle(&mut self) -> anyhow::Result<()> {
        while self.state.is_busy() {
            let msg = self
                .msg_rx
                .recv()
                .context("classification engine stopped unexpectedly")?;
            self.dispatch(msg);
        }
        Ok(())
    }
}

fn run_once(
    mut session: Session,
    file: PathBuf,
    out: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    session.dispatch(Msg::FileSelected(FileHandle::new(file)));
    session.dispatch(Msg::ClassifyClicked);
    session.wait_idle()?;

    let view = session.state.view();
    if view.phase == Phase::Failed {
        bail!(
            "{}",
            view.error_banner
                .unwrap_or_else(|| "classification failed".to_string())
        );
    }

    let mut saved_to = None;
    if let Some(dir) = out {
        session.runner.set_download_dir(dir);
        for notice in session.dispatch(Msg::DownloadClicked) {
            match notice {
                Notice::Saved(path) => saved_to = Some(path),
                Notice::SaveFailed(err) => bail!("failed to save result: {err}"),
            }
        }
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    match format {
        OutputFormat::Table => {
            if let Some(table) = &view.table {
                writeln!(stdout, "{}", render::render_table(table))?;
            }
            if let Some(path) = &saved_to {
                writeln!(stdout, "Saved {}", path.display())?;
            }
        }
        OutputFormat::Json => {
            let (headers, rows) = view
                .table
                .map(|table| (table.headers, table.rows))
                .unwrap_or_default();
            let document = json!({
                "file": view.file_name,
                "headers": headers,
                "rows": rows,
                "download_bytes": view.download_len,
                "saved_to": saved_to.as_deref().map(Path::display).map(|p| p.to_string()),
            });
            writeln!(stdout, "{document:#}")?;
        }
    }
    Ok(())
}

fn run_interactive(mut session: Session) -> anyhow::Result<()> {
    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut screen = Screen::default();
    screen.print(HELP);
    screen.redraw(&session.state.view());
    screen.prompt();

    loop {
        let notices = session.drain_engine();
        screen.notices(&notices);
        if let Some(view) = session.take_frame() {
            screen.frame(&view);
        }

        let line = match line_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(line) => line,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Input ended (e.g. piped script); let a running cycle finish first.
                session.wait_idle()?;
                if let Some(view) = session.take_frame() {
                    screen.frame(&view);
                }
                break;
            }
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                screen.prompt();
                continue;
            }
            Err(err) => {
                screen.print(&err);
                screen.prompt();
                continue;
            }
        };
        classify_debug!("Command {:?}", command);

        let notices = match command {
            UserCommand::Select(path) => session.dispatch(Msg::FileSelected(FileHandle::new(path))),
            UserCommand::Classify => session.dispatch(Msg::ClassifyClicked),
            UserCommand::Regenerate => session.dispatch(Msg::RegenerateClicked),
            UserCommand::Download(dir) => {
                if let Some(dir) = dir {
                    session.runner.set_download_dir(dir);
                }
                session.dispatch(Msg::DownloadClicked)
            }
            UserCommand::Show => {
                screen.redraw(&session.state.view());
                Vec::new()
            }
            UserCommand::Help => {
                screen.print(HELP);
                Vec::new()
            }
            UserCommand::Quit => break,
        };
        screen.notices(&notices);
        match session.take_frame() {
            Some(view) => screen.frame(&view),
            None => screen.prompt(),
        }
    }
    Ok(())
}

/// Terminal output. Progress-only changes while busy are not redrawn.
#[derive(Default)]
struct Screen {
    last_phase: Option<Phase>,
}

impl Screen {
    fn frame(&mut self, view: &AppViewModel) {
        if view.busy && self.last_phase == Some(Phase::Busy) && view.deferred_file_name.is_none() {
            return;
        }
        self.redraw(view);
        self.prompt();
    }

    fn redraw(&mut self, view: &AppViewModel) {
        self.last_phase = Some(view.phase);
        self.print(&format!("\n{}", render::render(view)));
    }

    fn notices(&self, notices: &[Notice]) {
        for notice in notices {
            match notice {
                Notice::Saved(path) => self.print(&format!("Saved {}", path.display())),
                Notice::SaveFailed(err) => self.print(&format!("! Could not save: {err}")),
            }
        }
    }

    fn print(&self, text: &str) {
        println!("{text}");
    }

    fn prompt(&self) {
        print!("> ");
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use classify_engine::ClassifySettings;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn session_for(server: &MockServer, download_dir: &Path) -> Session {
        let settings = ClassifySettings {
            endpoint: format!("{}/classify/", server.uri()),
            ..ClassifySettings::default()
        };
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(settings, download_dir.to_path_buf(), msg_tx).unwrap();
        Session::new(runner, msg_rx)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn classify_then_regenerate_posts_twice_and_releases_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classify/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/csv")
                    .set_body_bytes(b"name,count\na,1\n".to_vec()),
            )
            .expect(2)
            .mount(&server)
            .await;
        let temp = TempDir::new().unwrap();
        let upload = temp.path().join("logs.csv");
        fs::write(&upload, "level,message\nINFO,started\n").unwrap();
        let mut session = session_for(&server, temp.path());

        session.dispatch(Msg::FileSelected(FileHandle::new(upload.clone())));
        session.dispatch(Msg::ClassifyClicked);
        tokio::task::block_in_place(|| session.wait_idle()).unwrap();
        assert_eq!(session.state.phase(), Phase::Succeeded);
        let first = session.state.download().unwrap().watch();
        assert!(first.is_live());

        session.dispatch(Msg::RegenerateClicked);
        assert!(session.state.is_busy());
        assert!(!first.is_live());
        tokio::task::block_in_place(|| session.wait_idle()).unwrap();

        let view = session.state.view();
        assert_eq!(view.phase, Phase::Succeeded);
        assert!(view.actions_visible);
        assert_eq!(
            view.table.map(|table| table.rows),
            Some(vec![vec!["a".to_string(), "1".to_string()]])
        );
        let second = session.state.download().unwrap();
        assert!(second.cycle() > first.cycle());

        let notices = session.dispatch(Msg::DownloadClicked);
        let saved = temp.path().join("classified_logs.csv");
        assert_eq!(notices, vec![Notice::Saved(saved.clone())]);
        assert_eq!(fs::read(saved).unwrap(), b"name,count\na,1\n");
    }
}
