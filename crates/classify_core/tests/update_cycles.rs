use classify_core::{update, AppState, ClassifyFailure, Effect, FileHandle, Msg, Phase};

fn start_cycle(path: &str) -> AppState {
    let (state, _) = update(AppState::new(), Msg::FileSelected(FileHandle::new(path)));
    let (state, effects) = update(state, Msg::ClassifyClicked);
    assert_eq!(effects.len(), 1);
    state
}

#[test]
fn second_classify_while_busy_is_noop() {
    let state = start_cycle("a.csv");
    let before = state.clone();

    let (state, effects) = update(state, Msg::ClassifyClicked);
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = update(state, Msg::RegenerateClicked);
    assert!(effects.is_empty());
    assert_eq!(state.in_flight_cycle(), Some(1));
}

#[test]
fn stale_completion_is_ignored() {
    let state = start_cycle("a.csv");
    let before = state.clone();

    let (state, _) = update(
        state,
        Msg::ClassifyDone {
            cycle: 99,
            result: Ok(b"h\nv\n".to_vec()),
        },
    );

    assert_eq!(state, before);
    assert!(state.is_busy());
}

#[test]
fn progress_updates_received_bytes_for_current_cycle_only() {
    let state = start_cycle("a.csv");

    let (mut state, _) = update(
        state,
        Msg::ClassifyProgress {
            cycle: 1,
            received_bytes: 512,
        },
    );
    assert_eq!(state.view().received_bytes, Some(512));
    assert!(state.consume_dirty());

    let (mut state, _) = update(
        state,
        Msg::ClassifyProgress {
            cycle: 7,
            received_bytes: 4096,
        },
    );
    assert_eq!(state.view().received_bytes, Some(512));
    assert!(!state.consume_dirty());
}

#[test]
fn busy_clears_after_table_empty_or_failed_outcomes() {
    let outcomes: Vec<Result<Vec<u8>, ClassifyFailure>> = vec![
        Ok(b"name,count\na,1\n".to_vec()),
        Ok(Vec::new()),
        // The reader closes the open quote at end of input.
        Ok(b"\"unterminated\n".to_vec()),
        Err(ClassifyFailure::Transport("dns failure".to_string())),
        Err(ClassifyFailure::Service {
            status: 500,
            body: "boom".to_string(),
        }),
    ];

    for result in outcomes {
        let state = start_cycle("a.csv");
        let (state, _) = update(state, Msg::ClassifyDone { cycle: 1, result });
        assert!(!state.is_busy());
        assert!(!state.view().busy);
        assert!(matches!(state.phase(), Phase::Succeeded | Phase::Failed));
    }
}

#[test]
fn selection_while_busy_is_deferred_until_cycle_resolves() {
    let state = start_cycle("a.csv");

    let (state, effects) = update(state, Msg::FileSelected(FileHandle::new("b.csv")));
    assert!(effects.is_empty());
    assert!(state.is_busy());
    assert_eq!(state.selected_file().unwrap().name(), "a.csv");
    assert_eq!(state.view().deferred_file_name.as_deref(), Some("b.csv"));

    let (state, _) = update(
        state,
        Msg::ClassifyDone {
            cycle: 1,
            result: Ok(b"name\nx\n".to_vec()),
        },
    );

    assert_eq!(state.phase(), Phase::Ready);
    assert_eq!(state.selected_file().unwrap().name(), "b.csv");
    assert!(state.classification().is_none());
    assert!(state.download().is_none());
    assert!(state.view().deferred_file_name.is_none());
}

#[test]
fn cycle_ids_increase_across_cycles() {
    let state = start_cycle("a.csv");
    let (state, _) = update(
        state,
        Msg::ClassifyDone {
            cycle: 1,
            result: Err(ClassifyFailure::Transport("reset".to_string())),
        },
    );

    let (state, effects) = update(state, Msg::ClassifyClicked);
    assert_eq!(
        effects,
        vec![Effect::SubmitClassify {
            cycle: 2,
            file: FileHandle::new("a.csv"),
        }]
    );

    // A late answer to cycle 1 must not overwrite cycle 2.
    let (state, _) = update(
        state,
        Msg::ClassifyDone {
            cycle: 1,
            result: Ok(b"late\n".to_vec()),
        },
    );
    assert_eq!(state.in_flight_cycle(), Some(2));
}
