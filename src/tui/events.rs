use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use arboard::Clipboard;
use std::{io, path::PathBuf, time::{Duration, Instant}};
use tokio::sync::mpsc;

use crate::tui::actions::{apply, read_attachment, Action, Effect};
use crate::tui::api::ApiClient;
use crate::tui::draw::draw;
use crate::tui::input::handle_text_input_key;
use crate::tui::providers::Provider;
use crate::tui::send::{dispatch_detached, finish_send, SendOutcome};
use crate::tui::settings::{self, KeyValueStore};
use crate::tui::state::{App, Focus, Overlay};

const STATUS_TTL: Duration = Duration::from_secs(4);

/// Startup parameters for the interactive client.
pub struct RunOptions {
    pub store: Box<dyn KeyValueStore>,
    pub provider: String,
    /// Session-only base URL, takes precedence over the stored one.
    pub api_base_override: Option<String>,
}

impl RunOptions {
    pub fn api_base(&self) -> String {
        match &self.api_base_override {
            Some(url) if !url.trim().is_empty() => settings::normalize_base(url),
            _ => settings::load(self.store.as_ref()),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub async fn run(options: RunOptions) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    // Kitty keyboard protocol lets supporting terminals report Shift+Enter.
    let kitty_supported = execute!(
        stdout,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    ).is_ok();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, options).await;

    disable_raw_mode()?;
    if kitty_supported {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    result
}

// ── Event loop ────────────────────────────────────────────────────────────────

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut options: RunOptions,
) -> Result<()> {
    let api_base = options.api_base();
    let mut client = ApiClient::new(&api_base);
    let mut app = App::new(&options.provider, client.base());
    tracing::info!(api_base = client.base(), provider = %options.provider, "client started");

    let mut event_stream = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    let (mut done_tx, mut done_rx) = mpsc::unbounded_channel::<SendOutcome>();
    let mut status_at: Option<Instant> = None;
    let mut last_status = String::new();

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        tokio::select! {
            _ = tick.tick() => {
                if app.status != last_status {
                    last_status = app.status.clone();
                    status_at = Some(Instant::now());
                }
                if status_at.is_some_and(|t| t.elapsed() >= STATUS_TTL) {
                    app.status.clear();
                    last_status.clear();
                    status_at = None;
                }
            }

            Some(outcome) = done_rx.recv() => {
                finish_send(&mut app, outcome);
            }

            Some(Ok(event)) = event_stream.next() => {
                let action = match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => key_action(&mut app, key),
                    Event::Mouse(mouse) => {
                        match mouse.kind {
                            MouseEventKind::ScrollUp => scroll_by(&mut app, -3),
                            MouseEventKind::ScrollDown => scroll_by(&mut app, 3),
                            _ => {}
                        }
                        None
                    }
                    _ => None,
                };
                let Some(action) = action else { continue };

                let mut effect = apply(&mut app, options.store.as_mut(), action);
                // file loading feeds back into the dispatcher once
                if let Effect::LoadFile(path) = effect {
                    effect = match read_attachment(&path).await {
                        Ok(file) => apply(&mut app, options.store.as_mut(), Action::AttachFile(file)),
                        Err(e) => {
                            app.status = format!("{e:#}");
                            Effect::None
                        }
                    };
                }

                match effect {
                    Effect::None | Effect::LoadFile(_) => {}
                    Effect::Send(outgoing) => {
                        let tx = done_tx.clone();
                        let client = client.clone();
                        tokio::spawn(async move {
                            let outcome = dispatch_detached(client, outgoing).await;
                            let _ = tx.send(outcome);
                        });
                    }
                    Effect::Reload(base) => {
                        tracing::info!(api_base = %base, "reloading with new settings");
                        options.api_base_override = None;
                        client = ApiClient::new(&base);
                        let provider = app.conversation.provider.clone();
                        app = App::new(&provider, client.base());
                        // replies from the discarded context go nowhere
                        (done_tx, done_rx) = mpsc::unbounded_channel();
                        app.status = "Settings saved".to_string();
                    }
                    Effect::Copy(text) => {
                        app.status = match Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
                            Ok(()) => "📋 Copied last reply".to_string(),
                            Err(e) => format!("Clipboard unavailable: {e}"),
                        };
                    }
                    Effect::Quit => return Ok(()),
                }
            }
        }
    }
}

fn scroll_by(app: &mut App, delta: i32) {
    let current = if app.chat_scroll_manual { app.chat_scroll } else { app.conv_max_scroll };
    let next = (current as i32 + delta).clamp(0, app.conv_max_scroll as i32) as u16;
    app.chat_scroll = next;
    app.chat_scroll_manual = next < app.conv_max_scroll;
}

// ── Key mapping ───────────────────────────────────────────────────────────────

/// Translates a key press into an action. Plain text editing is applied directly.
pub fn key_action(app: &mut App, key: KeyEvent) -> Option<Action> {
    if let Some(overlay) = app.overlay.as_mut() {
        return overlay_key(overlay, key);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => return Some(Action::Quit),
        KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::Char('n') if ctrl => return Some(Action::NewChat),
        KeyCode::Char('u') if ctrl => return Some(Action::OpenAttach),
        KeyCode::Char('d') if ctrl => return Some(Action::DetachFile),
        KeyCode::Char('s') if ctrl => return Some(Action::OpenSettings),
        KeyCode::F(2) => return Some(Action::OpenSettings),
        KeyCode::Char('y') if ctrl => return Some(Action::CopyLastReply),
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return None;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return None;
        }
        KeyCode::PageUp => {
            scroll_by(app, -5);
            return None;
        }
        KeyCode::PageDown => {
            scroll_by(app, 5);
            return None;
        }
        _ => {}
    }

    match app.focus {
        Focus::Message => match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                app.message_input.insert_newline();
                None
            }
            KeyCode::Char('j') if ctrl => {
                app.message_input.insert_newline();
                None
            }
            KeyCode::Enter => Some(Action::Send),
            _ => {
                handle_text_input_key(&mut app.message_input, key);
                None
            }
        },
        Focus::ModelList => match key.code {
            KeyCode::Up => app.neighbour_model(-1).map(Action::SelectModel),
            KeyCode::Down => app.neighbour_model(1).map(Action::SelectModel),
            KeyCode::Enter => {
                app.focus = Focus::Message;
                None
            }
            _ => None,
        },
        Focus::ProviderList => {
            let providers = Provider::all();
            let current = app.provider_list_state.selected();
            let next = match key.code {
                KeyCode::Up => Some(current.map_or(0, |i| i.saturating_sub(1))),
                KeyCode::Down => Some(current.map_or(0, |i| (i + 1).min(providers.len() - 1))),
                KeyCode::Enter => {
                    app.focus = Focus::ModelList;
                    None
                }
                _ => None,
            };
            next.filter(|i| Some(*i) != current)
                .map(|i| Action::SelectProvider(providers[i].name().to_string()))
        }
        Focus::Conversation => {
            match key.code {
                KeyCode::Up => scroll_by(app, -1),
                KeyCode::Down => scroll_by(app, 1),
                KeyCode::End => app.scroll_to_bottom(),
                _ => {}
            }
            None
        }
    }
}

fn overlay_key(overlay: &mut Overlay, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CloseOverlay),
        KeyCode::Enter => Some(match overlay {
            Overlay::Settings(input) => Action::SaveSettings(input.trimmed().to_string()),
            Overlay::Attach(input) => Action::AttachPath(PathBuf::from(input.trimmed())),
        }),
        _ => {
            let (Overlay::Settings(input) | Overlay::Attach(input)) = overlay;
            handle_text_input_key(input, key);
            None
        }
    }
}
