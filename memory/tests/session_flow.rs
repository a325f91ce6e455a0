//! End-to-end flow against an on-disk database: the state a session writes
//! must survive closing and reopening the store.

use chatmem_memory::Session;
use chatmem_types::{ChatModel, Role};

#[test]
fn conversation_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("history.db");

    let expected_tokens;
    {
        let mut session = Session::open(&db_path, ChatModel::Gpt4).expect("open");

        let question = session
            .save_message("U100", Role::User, "What is ownership in Rust?")
            .expect("save question");
        let answer = session
            .save_message(
                "U100",
                Role::Assistant,
                "Ownership is Rust's compile-time memory management model.",
            )
            .expect("save answer");
        expected_tokens = u64::from(question.token_count) + u64::from(answer.token_count);

        session.set_model("U100", "gpt-4-32k").expect("set model");
        session.set_temperature("U100", 0.8).expect("set temperature");
    }

    let mut session = Session::open(&db_path, ChatModel::Gpt4).expect("reopen");

    // Settings persisted.
    assert_eq!(session.model("U100").expect("model"), ChatModel::Gpt4_32k);
    let temperature = session.temperature("U100").expect("temperature");
    assert!((temperature.value() - 0.8).abs() < f64::EPSILON);

    // The log and its token accounting persisted.
    let size = session.window_size("U100").expect("size");
    assert_eq!(size.rows, 2);
    assert_eq!(size.tokens, expected_tokens);

    // The window replays the conversation in order, within budget.
    let window = session.window("U100").expect("window");
    assert_eq!(window.len(), 2);
    assert_eq!(window.entries()[0].role, Role::User);
    assert_eq!(window.entries()[1].role, Role::Assistant);
    assert!(window.total_tokens() <= u64::from(ChatModel::Gpt4_32k.max_tokens()));
}

#[test]
fn reset_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("history.db");

    {
        let mut session = Session::open(&db_path, ChatModel::Gpt4).expect("open");
        for i in 0..5 {
            session
                .save_message("U100", Role::User, &format!("message {i}"))
                .expect("save");
        }
        session.reset("U100").expect("reset");
    }

    let mut session = Session::open(&db_path, ChatModel::Gpt4).expect("reopen");

    let size = session.window_size("U100").expect("size");
    assert_eq!(size.rows, 0);

    let window = session.window("U100").expect("window");
    assert!(window.is_empty());

    // New conversation proceeds from a clean window.
    session
        .save_message("U100", Role::User, "fresh start")
        .expect("save");
    let window = session.window("U100").expect("window");
    assert_eq!(window.len(), 1);
    assert_eq!(window.entries()[0].content, "fresh start");
}

#[test]
fn users_are_isolated_from_each_other() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db_path = dir.path().join("history.db");
    let mut session = Session::open(&db_path, ChatModel::Gpt4).expect("open");

    session
        .save_message("U100", Role::User, "alpha's message")
        .expect("save");
    session
        .save_message("U200", Role::User, "beta's message")
        .expect("save");
    session.reset("U100").expect("reset alpha");

    // Resetting one user must not touch the other's window.
    let alpha = session.window("U100").expect("window");
    assert!(alpha.is_empty());

    let beta = session.window("U200").expect("window");
    assert_eq!(beta.len(), 1);
    assert_eq!(beta.entries()[0].content, "beta's message");
}
