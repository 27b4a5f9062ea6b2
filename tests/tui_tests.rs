use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mia_chat::tui::settings::{self, KeyValueStore, MemoryStore, API_BASE_KEY};
use mia_chat::tui::send::SendOutcome;
use mia_chat::tui::state::NO_MODEL_LABEL;
use mia_chat::tui::{
    apply, begin_send, finish_send, key_action, message_lines, render_to_buffer, select_provider_models,
    usage_line, Action, ApiError, App, ChatResponse, Controls, Effect, Focus, Message, Overlay,
    PendingFile, Provider,
};
use ratatui::style::Modifier;

const BASE: &str = "http://127.0.0.1:8010";

// ── helpers ───────────────────────────────────────────────────────────────────

fn openai_app() -> App {
    App::new("openai", BASE)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        assert!(key_action(app, key(KeyCode::Char(c))).is_none());
    }
}

/// Collect all visible characters from a buffer row into a String.
fn buffer_row(buf: &ratatui::buffer::Buffer, row: u16) -> String {
    let width = buf.area().width;
    (0..width).map(|col| buf[(col, row)].symbol().chars().next().unwrap_or(' ')).collect()
}

/// Collect the entire buffer as a single string (rows joined by newline).
fn buffer_text(buf: &ratatui::buffer::Buffer) -> String {
    let height = buf.area().height;
    (0..height).map(|r| buffer_row(buf, r)).collect::<Vec<_>>().join("\n")
}

fn line_text(line: &ratatui::text::Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

// ── Model catalog ─────────────────────────────────────────────────────────────

#[test]
fn openai_catalog_order_and_disabled_entry() {
    let models = select_provider_models("openai");
    let ids: Vec<&str> = models.iter().map(|m| m.id).collect();
    assert_eq!(
        ids,
        [
            "openai:gpt-4o-mini",
            "openai:gpt-4o",
            "openai:gpt-4-turbo",
            "openai:gpt-3.5-turbo",
            "openai:gpt-5",
        ]
    );
    assert!(models[4].disabled);
    assert!(models[..4].iter().all(|m| !m.disabled));
}

#[test]
fn mistral_catalog_has_two_models() {
    assert_eq!(select_provider_models("mistral").len(), 2);
}

#[test]
fn unknown_provider_has_no_models() {
    assert!(select_provider_models("anthropic").is_empty());
    assert!(select_provider_models("").is_empty());
}

#[test]
fn provider_names_round_trip() {
    for p in Provider::all() {
        assert_eq!(Provider::from_name(p.name()), Some(p));
    }
    assert_eq!(Provider::from_name("OpenAI"), None);
}

// ── Model selector ────────────────────────────────────────────────────────────

#[test]
fn new_app_defaults_to_first_model() {
    let app = openai_app();
    assert_eq!(app.conversation.model.as_deref(), Some("openai:gpt-4o-mini"));
    assert_eq!(app.model_label, "GPT-4o-Mini");
    assert_eq!(app.model_list_state.selected(), Some(0));
    assert_eq!(app.controls, Controls::idle());
}

#[test]
fn unknown_provider_leaves_selector_empty() {
    let app = App::new("anthropic", BASE);
    assert_eq!(app.conversation.model, None);
    assert_eq!(app.model_label, NO_MODEL_LABEL);
    assert_eq!(app.model_list_state.selected(), None);
}

#[test]
fn select_model_updates_id_and_label() {
    let mut app = openai_app();
    assert!(app.select_model(2));
    assert_eq!(app.conversation.model.as_deref(), Some("openai:gpt-4-turbo"));
    assert_eq!(app.model_label, "GPT-4-Turbo");
}

#[test]
fn select_model_refuses_disabled_and_out_of_range() {
    let mut app = openai_app();
    assert!(!app.select_model(4));
    assert!(!app.select_model(99));
    assert_eq!(app.conversation.model.as_deref(), Some("openai:gpt-4o-mini"));
}

#[test]
fn switching_provider_resets_model_to_first_entry() {
    let mut app = openai_app();
    app.select_model(1);
    app.select_provider("mistral");
    assert_eq!(app.conversation.model.as_deref(), Some("mistral:open-mixtral-8x7b"));
    assert_eq!(app.model_label, "Mixtral 8×7B");

    app.select_provider("nobody");
    assert_eq!(app.conversation.model, None);
}

#[test]
fn model_navigation_skips_disabled_entries() {
    let mut app = openai_app();
    app.focus = Focus::ModelList;
    app.select_model(3);
    assert!(key_action(&mut app, key(KeyCode::Down)).is_none());

    match key_action(&mut app, key(KeyCode::Up)) {
        Some(Action::SelectModel(2)) => {}
        other => panic!("expected SelectModel(2), got {other:?}"),
    }
}

#[test]
fn provider_list_navigation_selects_next_provider() {
    let mut app = openai_app();
    app.focus = Focus::ProviderList;
    let action = key_action(&mut app, key(KeyCode::Down)).expect("provider action");
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, action);
    assert_eq!(app.conversation.provider, "mistral");
    assert_eq!(app.provider_list_state.selected(), Some(1));
    assert_eq!(app.conversation.model.as_deref(), Some("mistral:open-mixtral-8x7b"));
}

// ── Key mapping ───────────────────────────────────────────────────────────────

#[test]
fn enter_in_message_box_sends() {
    let mut app = openai_app();
    type_text(&mut app, "hi");
    assert_eq!(app.message_input.value, "hi");
    assert!(matches!(key_action(&mut app, key(KeyCode::Enter)), Some(Action::Send)));
}

#[test]
fn shift_enter_and_ctrl_j_insert_newlines() {
    let mut app = openai_app();
    type_text(&mut app, "a");
    key_action(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
    type_text(&mut app, "b");
    key_action(&mut app, ctrl('j'));
    type_text(&mut app, "c");
    assert_eq!(app.message_input.value, "a\nb\nc");
}

#[test]
fn control_shortcuts_map_to_actions() {
    let mut app = openai_app();
    assert!(matches!(key_action(&mut app, ctrl('n')), Some(Action::NewChat)));
    assert!(matches!(key_action(&mut app, ctrl('u')), Some(Action::OpenAttach)));
    assert!(matches!(key_action(&mut app, ctrl('d')), Some(Action::DetachFile)));
    assert!(matches!(key_action(&mut app, ctrl('s')), Some(Action::OpenSettings)));
    assert!(matches!(key_action(&mut app, ctrl('y')), Some(Action::CopyLastReply)));
    assert!(matches!(key_action(&mut app, key(KeyCode::Esc)), Some(Action::Quit)));
}

#[test]
fn tab_cycles_focus() {
    let mut app = openai_app();
    let mut seen = vec![app.focus];
    for _ in 0..4 {
        key_action(&mut app, key(KeyCode::Tab));
        seen.push(app.focus);
    }
    assert_eq!(
        seen,
        [Focus::Message, Focus::ModelList, Focus::ProviderList, Focus::Conversation, Focus::Message]
    );
    key_action(&mut app, key(KeyCode::BackTab));
    assert_eq!(app.focus, Focus::Conversation);
}

// ── Actions ───────────────────────────────────────────────────────────────────

#[test]
fn new_chat_clears_messages_file_and_usage() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    app.conversation.push(Message::user("hello"));
    app.conversation.pending_file = Some(PendingFile::new("a.txt", b"x".to_vec()));
    app.usage_line = "tokens 1/2".to_string();

    let effect = apply(&mut app, &mut store, Action::NewChat);
    assert!(matches!(effect, Effect::None));
    assert!(app.conversation.messages.is_empty());
    assert!(app.conversation.pending_file.is_none());
    assert!(app.usage_line.is_empty());
    assert_eq!(app.conversation.model.as_deref(), Some("openai:gpt-4o-mini"));
}

#[test]
fn attach_is_refused_while_sending() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    app.controls = Controls::busy();
    apply(&mut app, &mut store, Action::OpenAttach);
    assert!(app.overlay.is_none());

    app.controls = Controls::idle();
    apply(&mut app, &mut store, Action::OpenAttach);
    assert!(matches!(app.overlay, Some(Overlay::Attach(_))));
}

#[test]
fn detach_is_refused_while_upload_in_flight() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    app.conversation.pending_file = Some(PendingFile::new("notes.txt", b"n".to_vec()));
    app.message_input = mia_chat::tui::TextInput::with_value("read this");

    let Effect::Send(outgoing) = apply(&mut app, &mut store, Action::Send) else {
        panic!("expected a send effect");
    };
    assert!(outgoing.is_upload());
    apply(&mut app, &mut store, Action::DetachFile);
    assert!(app.conversation.pending_file.is_some());

    finish_send(
        &mut app,
        SendOutcome {
            uploaded: true,
            result: Err(ApiError::Interrupted("connection reset".into())),
        },
    );
    assert!(app.conversation.pending_file.is_some());

    apply(&mut app, &mut store, Action::DetachFile);
    assert!(app.conversation.pending_file.is_none());
}

#[test]
fn attach_overlay_enter_requests_file_load() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, Action::OpenAttach);
    type_text(&mut app, "/tmp/report.pdf");
    let action = key_action(&mut app, key(KeyCode::Enter)).expect("attach action");
    match apply(&mut app, &mut store, action) {
        Effect::LoadFile(path) => assert_eq!(path, std::path::PathBuf::from("/tmp/report.pdf")),
        other => panic!("expected LoadFile, got {other:?}"),
    }
    assert!(app.overlay.is_none());
}

#[test]
fn attach_file_sets_pending_file_and_detach_clears_it() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, Action::AttachFile(PendingFile::new("a.csv", vec![1, 2, 3])));
    assert_eq!(app.file_badge().as_deref(), Some("File: a.csv"));
    apply(&mut app, &mut store, Action::DetachFile);
    assert_eq!(app.file_badge(), None);
}

#[test]
fn settings_overlay_is_prefilled_with_current_base() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, Action::OpenSettings);
    match &app.overlay {
        Some(Overlay::Settings(input)) => assert_eq!(input.value, BASE),
        other => panic!("expected settings overlay, got {other:?}"),
    }
}

#[test]
fn saving_blank_settings_is_a_silent_noop() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, Action::OpenSettings);
    let effect = apply(&mut app, &mut store, Action::SaveSettings("   ".to_string()));
    assert!(matches!(effect, Effect::None));
    assert_eq!(store.get(API_BASE_KEY), None);
    assert!(app.status.is_empty());
    assert!(app.overlay.is_some());
}

#[test]
fn saving_settings_persists_and_requests_reload() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    let effect = apply(
        &mut app,
        &mut store,
        Action::SaveSettings("https://chat.example.org/".to_string()),
    );
    match effect {
        Effect::Reload(base) => assert_eq!(base, "https://chat.example.org"),
        other => panic!("expected Reload, got {other:?}"),
    }
    assert_eq!(settings::load(&store), "https://chat.example.org");
}

#[test]
fn copy_last_reply_yields_latest_assistant_text() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    assert!(matches!(apply(&mut app, &mut store, Action::CopyLastReply), Effect::None));

    app.conversation.push(Message::assistant("first"));
    app.conversation.push(Message::user("again"));
    app.conversation.push(Message::assistant("second"));
    match apply(&mut app, &mut store, Action::CopyLastReply) {
        Effect::Copy(text) => assert_eq!(text, "second"),
        other => panic!("expected Copy, got {other:?}"),
    }
}

#[test]
fn send_action_with_empty_input_has_no_effect() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    assert!(matches!(apply(&mut app, &mut store, Action::Send), Effect::None));
    assert!(!app.conversation.sending);
}

// ── Usage line ────────────────────────────────────────────────────────────────

fn response(json: serde_json::Value) -> ChatResponse {
    serde_json::from_value(json).unwrap()
}

#[test]
fn usage_line_with_tokens_and_cost_omits_co2() {
    let resp = response(serde_json::json!({
        "content": "hi",
        "usage": {"input_tokens": 10, "output_tokens": 5},
        "cost_eur": 0.000123
    }));
    let line = usage_line(&resp);
    assert!(line.contains("tokens 10/5"), "{line}");
    assert!(line.contains("0.000123 €"), "{line}");
    assert!(!line.contains("CO₂"), "{line}");
    assert_eq!(line, "tokens 10/5 • 0.000123 €");
}

#[test]
fn usage_line_with_all_fields() {
    let resp = response(serde_json::json!({
        "usage": {"input_tokens": 3, "output_tokens": 0},
        "cost_eur": 0.5,
        "est_co2e_g": 1.234
    }));
    assert_eq!(usage_line(&resp), "tokens 3/0 • 0.500000 € • 1.23 gCO₂e");
}

#[test]
fn usage_line_is_empty_without_figures() {
    assert_eq!(usage_line(&response(serde_json::json!({"content": "x"}))), "");
    assert_eq!(usage_line(&response(serde_json::json!({"usage": {}}))), "");
}

// ── Send preparation ──────────────────────────────────────────────────────────

#[test]
fn begin_send_echoes_text_and_file_notice_before_network() {
    let mut app = openai_app();
    type_text(&mut app, "  summarise this  ");
    app.conversation.pending_file = Some(PendingFile::new("notes.txt", b"abc".to_vec()));

    let outgoing = begin_send(&mut app).expect("send should start");
    assert!(outgoing.is_upload());
    assert_eq!(
        app.conversation.messages,
        vec![Message::user("summarise this"), Message::user("📎 Attached file: notes.txt")]
    );
    assert!(app.message_input.value.is_empty());
    assert!(app.conversation.sending);
    assert_eq!(app.controls, Controls::busy());
    assert_eq!(app.controls.send_label, "Sending…");
}

#[test]
fn begin_send_without_model_is_rejected() {
    let mut app = App::new("anthropic", BASE);
    type_text(&mut app, "hello");
    assert!(begin_send(&mut app).is_none());
    assert!(app.conversation.messages.is_empty());
    assert_eq!(app.message_input.value, "hello");
}

// ── Rendering ─────────────────────────────────────────────────────────────────

#[test]
fn user_text_is_never_markdown_interpreted() {
    let lines = message_lines(&[Message::user("**bold** <b>tag</b>")]);
    let body: Vec<String> = lines.iter().map(line_text).collect();
    assert!(body.iter().any(|l| l.contains("**bold** <b>tag</b>")), "{body:?}");
    for line in &lines[1..] {
        for span in &line.spans {
            assert!(!span.style.add_modifier.contains(Modifier::BOLD));
        }
    }
}

#[test]
fn assistant_text_is_rendered_as_markdown() {
    let lines = message_lines(&[Message::assistant("**bold** and `code`")]);
    let bold = lines
        .iter()
        .flat_map(|l| l.spans.iter())
        .find(|s| s.content.as_ref() == "bold")
        .expect("bold span");
    assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    let text: String = lines.iter().map(line_text).collect::<Vec<_>>().join("\n");
    assert!(!text.contains("**"));
    assert!(text.contains("code"));
}

#[test]
fn error_bubble_keeps_body_text_readable() {
    let lines = message_lines(&[Message::assistant("⚠️ Error: POST /chat -> 500 oops")]);
    let text: String = lines.iter().map(line_text).collect::<Vec<_>>().join("\n");
    assert!(text.contains("oops"));
    assert!(text.contains("⚠️"));
    assert!(text.contains("/chat -> 500"));
}

#[test]
fn chat_screen_shows_models_and_controls() {
    let mut app = openai_app();
    let buf = render_to_buffer(&mut app, 110, 30);
    let text = buffer_text(&buf);
    assert!(text.contains("GPT-4o-Mini"));
    assert!(text.contains("GPT-5 (coming soon)"));
    assert!(text.contains("[ Send ]"));
    assert!(text.contains("[ Attach ]"));
    assert!(text.contains(BASE));
}

#[test]
fn chat_screen_shows_busy_label_while_sending() {
    let mut app = openai_app();
    app.controls = Controls::busy();
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    assert!(text.contains("[ Sending… ]"));
    assert!(!text.contains("[ Send ]"));
}

#[test]
fn chat_screen_shows_file_badge_and_usage() {
    let mut app = openai_app();
    app.conversation.pending_file = Some(PendingFile::new("data.csv", vec![]));
    app.usage_line = "tokens 10/5 • 0.000123 €".to_string();
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    assert!(text.contains("File: data.csv"));
    assert!(text.contains("tokens 10/5"));
}

#[test]
fn chat_screen_shows_messages_in_order() {
    let mut app = openai_app();
    app.conversation.push(Message::user("first question"));
    app.conversation.push(Message::assistant("first answer"));
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    let q = text.find("first question").expect("question rendered");
    let a = text.find("first answer").expect("answer rendered");
    assert!(q < a);
}

#[test]
fn empty_provider_renders_no_model_hint() {
    let mut app = App::new("anthropic", BASE);
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    assert!(text.contains("No models"));
}

#[test]
fn long_conversation_sticks_to_bottom() {
    let mut app = openai_app();
    for i in 0..40 {
        app.conversation.push(Message::user(format!("message number {i}")));
    }
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    assert!(text.contains("message number 39"));
    assert!(!text.contains("message number 0 "));
    assert!(app.conv_max_scroll > 0);
}

#[test]
fn settings_overlay_renders_over_chat() {
    let mut app = openai_app();
    let mut store = MemoryStore::default();
    apply(&mut app, &mut store, Action::OpenSettings);
    let text = buffer_text(&render_to_buffer(&mut app, 110, 30));
    assert!(text.contains("Settings"));
    assert!(text.contains("Enter save & reload"));
}
