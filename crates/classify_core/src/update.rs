use classify_logging::classify_debug;

use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            state.select_file(file);
            Vec::new()
        }
        Msg::ClassifyClicked => submit(&mut state),
        Msg::RegenerateClicked => {
            // Regenerate is only offered next to a finished result.
            if state.actions_visible() {
                submit(&mut state)
            } else {
                classify_debug!("Regenerate ignored in phase {:?}", state.phase());
                Vec::new()
            }
        }
        Msg::DownloadClicked => match state.download() {
            Some(download) => vec![Effect::SaveDownload {
                download: download.clone(),
            }],
            None => {
                classify_debug!("Download ignored: no result in phase {:?}", state.phase());
                Vec::new()
            }
        },
        Msg::ClassifyProgress {
            cycle,
            received_bytes,
        } => {
            state.apply_progress(cycle, received_bytes);
            Vec::new()
        }
        Msg::ClassifyDone { cycle, result } => {
            state.finish_cycle(cycle, result);
            Vec::new()
        }
    };

    (state, effects)
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    match state.begin_cycle() {
        Some((cycle, file)) => vec![Effect::SubmitClassify { cycle, file }],
        None => Vec::new(),
    }
}
