mod common;

use chatdesk_session::controller::HISTORY_ERROR_NOTICE;
use chatdesk_session::{
    render_session, BackendError, ChatController, CommandOutcome, IgnoreReason, Operation,
    SearchOutcome, SessionStatus, TokenStore,
};
use chatdesk_types::{ChatId, ChatTranscript, Credential, WireMessage};
use common::{controller_with, signed_in, summary, Call, ScriptedBackend, TokioSleeper};
use pretty_assertions::assert_eq;
use std::rc::Rc;
use std::time::Duration;

fn applied(query: &str, count: usize) -> SearchOutcome {
    SearchOutcome::Applied {
        query: query.to_string(),
        count,
    }
}

#[tokio::test(start_paused = true)]
async fn test_typing_within_window_issues_one_fetch_for_latest_text() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;
    backend.push_list(Ok(vec![summary("1", "abcd notes")]), None);

    let first = controller.set_query("abc");
    let pending_first = controller.settle_search(first);
    tokio::pin!(pending_first);
    assert!(futures::poll!(&mut pending_first).is_pending());

    tokio::time::advance(Duration::from_millis(200)).await;
    let second = controller.set_query("abcd");
    let (first_outcome, second_outcome) =
        tokio::join!(pending_first, controller.settle_search(second));

    assert_eq!(first_outcome, SearchOutcome::Superseded);
    assert_eq!(second_outcome, applied("abcd", 1));
    assert_eq!(backend.list_searches(), vec![Some("abcd".to_string())]);
    assert_eq!(controller.history(), vec![summary("1", "abcd notes")]);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_is_fetched_before_the_window_elapses() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;

    let ticket = controller.set_query("rust");
    let settling = controller.settle_search(ticket);
    tokio::pin!(settling);
    assert!(futures::poll!(&mut settling).is_pending());

    tokio::time::advance(Duration::from_millis(499)).await;
    assert!(futures::poll!(&mut settling).is_pending());
    assert!(backend.calls().is_empty());

    assert_eq!(settling.await, applied("rust", 0));
    assert_eq!(backend.list_searches(), vec![Some("rust".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_debounce_window() {
    let backend = ScriptedBackend::new();
    let tokens = Rc::new(TokenStore::in_memory());
    tokens.set(Credential::bearer("session-token"));
    let controller = ChatController::new(backend.clone(), tokens, Rc::new(TokioSleeper))
        .with_debounce(Duration::from_millis(50));
    controller.resume().await;
    backend.clear_calls();

    let started = tokio::time::Instant::now();
    let ticket = controller.set_query("x");
    controller.settle_search(ticket).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(500));
    assert_eq!(backend.list_searches(), vec![Some("x".to_string())]);
    assert_eq!(controller.search().debounce(), Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_response_never_becomes_visible() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;
    backend.push_list(
        Ok(vec![summary("1", "Old result")]),
        Some(Duration::from_secs(2)),
    );
    backend.push_list(Ok(vec![summary("2", "New result")]), None);

    let first = controller.set_query("a");
    let pending_first = controller.settle_search(first);
    tokio::pin!(pending_first);
    assert!(futures::poll!(&mut pending_first).is_pending());
    tokio::time::advance(Duration::from_millis(600)).await;
    // debounce elapsed: the slow fetch for "a" is now in flight
    assert!(futures::poll!(&mut pending_first).is_pending());
    assert_eq!(backend.list_searches(), vec![Some("a".to_string())]);

    let second = controller.set_query("b");
    let (first_outcome, second_outcome) =
        tokio::join!(pending_first, controller.settle_search(second));

    // "b" settled while "a" was in flight, so it waited its turn
    assert_eq!(second_outcome, SearchOutcome::Deferred);
    assert_eq!(first_outcome, applied("b", 1));
    assert_eq!(
        backend.list_searches(),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
    assert_eq!(controller.history(), vec![summary("2", "New result")]);
    assert_eq!(controller.search().applied_query(), Some("b".to_string()));
    assert_eq!(backend.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_settling_during_send_runs_after_send() {
    let backend = ScriptedBackend::new();
    backend.push_chat(Ok(ChatTranscript {
        id: ChatId::new("8"),
        messages: vec![WireMessage::user("Hi"), WireMessage::assistant("Hello")],
    }));
    let (_, controller) = signed_in(&backend).await;
    controller.open_conversation(&ChatId::new("8")).await;
    backend.clear_calls();
    backend.set_latency(Duration::from_secs(2));

    let ticket = controller.set_query("borrow");
    let (send_outcome, search_outcome) =
        tokio::join!(controller.send("One more thing"), controller.settle_search(ticket));

    assert_eq!(search_outcome, SearchOutcome::Deferred);
    assert_eq!(send_outcome, CommandOutcome::Completed);
    assert_eq!(
        backend.calls(),
        vec![
            Call::SendMessage {
                id: "8".into(),
                content: "One more thing".into()
            },
            Call::ListChats {
                token: "session-token".into(),
                search: Some("borrow".into())
            },
        ]
    );
    assert_eq!(backend.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_search_settling_during_open_runs_after_load() {
    let backend = ScriptedBackend::new();
    backend.push_chat(Ok(ChatTranscript {
        id: ChatId::new("8"),
        messages: vec![WireMessage::user("Hi"), WireMessage::assistant("Hello")],
    }));
    let (_, controller) = signed_in(&backend).await;
    backend.push_list(Ok(vec![summary("8", "Borrow checker")]), None);
    backend.set_latency(Duration::from_secs(2));

    let ticket = controller.set_query("borrow");
    let chat_8 = ChatId::new("8");
    let (open_outcome, search_outcome) = tokio::join!(
        controller.open_conversation(&chat_8),
        controller.settle_search(ticket)
    );

    assert_eq!(search_outcome, SearchOutcome::Deferred);
    assert_eq!(open_outcome, CommandOutcome::Completed);
    assert_eq!(
        backend.calls(),
        vec![
            Call::GetChat { id: "8".into() },
            Call::ListChats {
                token: "session-token".into(),
                search: Some("borrow".into())
            },
        ]
    );
    assert_eq!(controller.conversation().len(), 2);
    assert_eq!(controller.history(), vec![summary("8", "Borrow checker")]);
    assert_eq!(controller.search().applied_query(), Some("borrow".to_string()));
    assert_eq!(backend.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_input_disabled_while_history_fetch_in_flight() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;
    backend.set_latency(Duration::from_secs(2));

    let ticket = controller.set_query("rust");
    let settling = controller.settle_search(ticket);
    tokio::pin!(settling);
    assert!(futures::poll!(&mut settling).is_pending());
    tokio::time::advance(Duration::from_millis(600)).await;
    // debounce elapsed: the fetch now holds the gate
    assert!(futures::poll!(&mut settling).is_pending());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_eq!(snapshot.in_flight, Some(Operation::Search));
    assert!(!render_session(&snapshot).input_enabled);
    assert_eq!(
        controller.send("Hello").await,
        CommandOutcome::Ignored(IgnoreReason::Busy)
    );
    assert!(controller.conversation().is_empty());

    assert_eq!(settling.await, applied("rust", 0));
    assert!(render_session(&controller.snapshot()).input_enabled);
}

#[tokio::test(start_paused = true)]
async fn test_empty_query_means_unfiltered() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;

    let ticket = controller.set_query("   ");
    controller.settle_search(ticket).await;

    assert_eq!(backend.list_searches(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_search_rejected_credential_signs_out() {
    let backend = ScriptedBackend::new();
    let (tokens, controller) = signed_in(&backend).await;
    controller.send("Hello").await;
    backend.push_list(Err(BackendError::Unauthorized { status: 401 }), None);

    let ticket = controller.set_query("anything");
    let outcome = controller.settle_search(ticket).await;

    assert_eq!(outcome, SearchOutcome::AuthRejected);
    assert!(tokens.get().is_none());
    assert_eq!(controller.status(), SessionStatus::Unauthenticated);
    assert!(controller.conversation().is_empty());
    assert!(!render_session(&controller.snapshot()).signed_in);
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_previous_results_and_sets_notice() {
    let backend = ScriptedBackend::new();
    let (_, controller) = signed_in(&backend).await;
    backend.push_list(Ok(vec![summary("1", "Kept")]), None);
    backend.push_list(Err(BackendError::Transport("timed out".into())), None);
    backend.push_list(Ok(vec![summary("1", "Kept"), summary("2", "Fresh")]), None);

    controller.refresh_history().await;
    let outcome = controller.refresh_history().await;

    assert!(matches!(outcome, SearchOutcome::Failed(_)));
    assert_eq!(controller.history(), vec![summary("1", "Kept")]);
    assert_eq!(
        controller.notice().as_deref(),
        Some(HISTORY_ERROR_NOTICE)
    );

    controller.refresh_history().await;
    assert_eq!(controller.notice(), None);
    assert_eq!(controller.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_search_when_signed_out_makes_no_request() {
    let backend = ScriptedBackend::new();
    let (_, controller) = controller_with(&backend);

    let ticket = controller.set_query("rust");
    assert_eq!(
        controller.settle_search(ticket).await,
        SearchOutcome::NotSignedIn
    );
    assert!(backend.calls().is_empty());
}
