mod common;

use std::time::Duration;

use rusty_transfer_core::{fetch_with_retry, HistoryRefresh, HistoryView, PortError, RetryPolicy};

use common::{
    ether, history_row, new_client, tx_hash, RecordingClock, ScriptedHistory, ScriptedWallet,
};

fn client_with(history: ScriptedHistory) -> common::TestClient {
    let client = new_client(ScriptedWallet::with_balance(ether(1)), history);
    client.initialize().expect("initialize");
    client
}

#[test]
fn retries_until_submitted_hash_is_indexed() {
    let expected = tx_hash(9);
    let client = client_with(ScriptedHistory::new(vec![
        Ok(vec![]),
        Ok(vec![]),
        Ok(vec![history_row(tx_hash(1))]),
        Ok(vec![history_row(expected), history_row(tx_hash(1))]),
    ]));
    let clock = RecordingClock::default();

    let refresh = fetch_with_retry(&client, Some(expected), &RetryPolicy::default(), &clock);

    match refresh {
        HistoryRefresh::Fetched { rows, attempts } => {
            assert_eq!(attempts, 4);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].hash, expected);
        }
        other => panic!("expected fetched, got {other:?}"),
    }
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_millis(500),
            Duration::from_millis(1_000),
            Duration::from_millis(2_000),
        ]
    );
}

#[test]
fn first_non_empty_result_is_enough_without_expected_hash() {
    let client = client_with(ScriptedHistory::new(vec![
        Ok(vec![]),
        Ok(vec![history_row(tx_hash(1))]),
    ]));
    let clock = RecordingClock::default();
    let refresh = fetch_with_retry(&client, None, &RetryPolicy::default(), &clock);
    assert!(matches!(refresh, HistoryRefresh::Fetched { attempts: 2, .. }));
    assert_eq!(clock.sleeps().len(), 1);
}

#[test]
fn gives_up_after_eight_attempts_and_keeps_prior_rows() {
    let client = client_with(ScriptedHistory::new(vec![Ok(vec![history_row(tx_hash(1))])]));
    let clock = RecordingClock::default();

    let mut view = HistoryView::new();
    view.begin_refresh(None);
    view.apply(fetch_with_retry(&client, None, &RetryPolicy::default(), &clock));
    assert_eq!(view.rows().len(), 1);

    let expected = tx_hash(9);
    assert!(view.should_refresh(Some(expected)));
    view.begin_refresh(Some(expected));
    let refresh = fetch_with_retry(&client, Some(expected), &RetryPolicy::default(), &clock);
    assert_eq!(
        refresh,
        HistoryRefresh::Exhausted {
            attempts: 8,
            last_error: None,
        }
    );
    view.apply(refresh);

    assert_eq!(client.history.calls(), 1 + 8);
    assert_eq!(clock.sleeps().len(), 7);
    assert!(!view.is_loading());
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].hash, tx_hash(1));
}

#[test]
fn port_errors_count_as_failed_attempts() {
    let client = client_with(ScriptedHistory::new(vec![Err(PortError::Transport(
        "explorer unreachable".to_owned(),
    ))]));
    let clock = RecordingClock::default();
    let policy = RetryPolicy {
        max_attempts: 3,
        ..RetryPolicy::default()
    };
    match fetch_with_retry(&client, None, &policy, &clock) {
        HistoryRefresh::Exhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.expect("error").contains("explorer unreachable"));
        }
        other => panic!("expected exhausted, got {other:?}"),
    }
}

#[test]
fn display_rows_are_formatted_at_render_time() {
    let client = client_with(ScriptedHistory::new(vec![Ok(vec![history_row(tx_hash(3))])]));
    let mut view = HistoryView::new();
    view.begin_refresh(None);
    view.apply(fetch_with_retry(
        &client,
        None,
        &RetryPolicy::default(),
        &RecordingClock::default(),
    ));

    let row = &view.rows()[0];
    assert_eq!(row.date, "2023-11-14 22:13:20");
    assert_eq!(row.value, "1.0");
    assert_eq!(row.gas, "21.0");
    assert_eq!(row.from, common::sender().to_string());
}
