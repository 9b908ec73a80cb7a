//! Movie browser TUI main loop.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use url::Url;

use cinedex_api::tmdb::{GenreMap, LocalTmdbApi, SearchMovieParams, TmdbClient};

use super::state::{AppState, Effect, FetchOutcome, InputMode};
use super::ui;

/// Event poll interval. Also bounds debounce resolution.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// What a handled key asks the loop to do.
enum LoopAction {
    /// Leave the browser.
    Quit,
    /// Execute a network effect.
    Run(Effect),
}

/// Runs the movie browser TUI until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
pub async fn run_browser(
    client: Arc<TmdbClient>,
    genres: GenreMap,
    session: Option<String>,
    poster_base: Url,
) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &client, genres, session, poster_base).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop. Owns all UI state; fetch tasks only send messages.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: &Arc<TmdbClient>,
    genres: GenreMap,
    session: Option<String>,
    poster_base: Url,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut state = AppState::new(genres, session, poster_base, Instant::now());

    loop {
        terminal
            .draw(|frame| ui::draw(frame, &state))
            .context("failed to draw TUI")?;

        // Apply finished fetches; a rating may trigger a rated refresh.
        while let Ok(outcome) = rx.try_recv() {
            if let Some(effect) = state.apply_outcome(outcome) {
                spawn_effect(client, &tx, effect);
            }
        }

        // Fire a search whose quiet period has passed.
        if let Some(effect) = state.poll_debounce(Instant::now()) {
            spawn_effect(client, &tx, effect);
        }

        if event::poll(TICK_INTERVAL).context("failed to poll events")?
            && let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            match state.input_mode {
                InputMode::Query => handle_query_input(&mut state, key.code),
                InputMode::Normal => {
                    match handle_normal_input(&mut state, key.code, key.modifiers) {
                        Some(LoopAction::Quit) => return Ok(()),
                        Some(LoopAction::Run(effect)) => spawn_effect(client, &tx, effect),
                        None => {}
                    }
                }
            }
        }
    }
}

/// Handles key input while editing the query.
fn handle_query_input(state: &mut AppState, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::Enter => {
            state.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => state.backspace(Instant::now()),
        KeyCode::Char(c) => state.input_char(c, Instant::now()),
        _ => {}
    }
}

/// Handles key input in normal mode.
fn handle_normal_input(
    state: &mut AppState,
    key: KeyCode,
    modifiers: KeyModifiers,
) -> Option<LoopAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(LoopAction::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(LoopAction::Quit);
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(effect) = state.toggle_tab() {
                return Some(LoopAction::Run(effect));
            }
        }
        KeyCode::Up | KeyCode::Char('k') => state.move_up(),
        KeyCode::Down | KeyCode::Char('j') => state.move_down(),
        KeyCode::Left => state.prev_page(Instant::now()),
        KeyCode::Right => state.next_page(Instant::now()),
        KeyCode::Char('/') => {
            state.input_mode = InputMode::Query;
        }
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if let Some(digit) = c.to_digit(10) {
                let value = if digit == 0 { 10.0 } else { f64::from(digit) };
                if let Some(effect) = state.rate_selected(value) {
                    return Some(LoopAction::Run(effect));
                }
            }
        }
        _ => {}
    }
    None
}

/// Spawns the fetch task for an effect. Each task sends exactly one
/// outcome message back to the loop.
fn spawn_effect(
    client: &Arc<TmdbClient>,
    tx: &mpsc::UnboundedSender<FetchOutcome>,
    effect: Effect,
) {
    let client = Arc::clone(client);
    let tx = tx.clone();

    match effect {
        Effect::Search { query, generation } => {
            tokio::spawn(async move {
                let params = SearchMovieParams::new(query.term).page(query.page);
                let result = client
                    .search_movie(&params)
                    .await
                    .map_err(|err| format!("{err:#}"));
                let _ = tx.send(FetchOutcome::Search { generation, result });
            });
        }
        Effect::FetchRated { session_id } => {
            tokio::spawn(async move {
                let result = client
                    .rated_movies(&session_id, 1)
                    .await
                    .map_err(|err| format!("{err:#}"));
                let _ = tx.send(FetchOutcome::Rated { result });
            });
        }
        Effect::SubmitRating {
            movie_id,
            session_id,
            value,
        } => {
            tokio::spawn(async move {
                let result = client
                    .rate_movie(movie_id, &session_id, value)
                    .await
                    .map(|_| ())
                    .map_err(|err| format!("{err:#}"));
                let _ = tx.send(FetchOutcome::Rating {
                    movie_id,
                    value,
                    result,
                });
            });
        }
    }
}
