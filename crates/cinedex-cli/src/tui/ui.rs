//! TUI rendering logic for the movie browser.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use cinedex_api::tmdb::{MovieSummary, poster_url};

use super::state::{ActiveTab, AppState, InputMode, RatedPhase, SearchPhase};

/// Overview text is cut at this many characters.
const OVERVIEW_MAX_CHARS: usize = 120;

/// Draws the movie browser UI.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(5),    // main content
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);
    match state.active_tab {
        ActiveTab::Search => draw_search_tab(frame, chunks[1], state),
        ActiveTab::Rated => draw_rated_tab(frame, chunks[1], state),
    }
    draw_footer(frame, chunks[2], state);
}

/// Draws the header with the query input and the tab bar.
#[allow(clippy::indexing_slicing)]
fn draw_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let query_style = if state.input_mode == InputMode::Query {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let query = Paragraph::new(state.term.clone())
        .style(query_style)
        .block(Block::default().borders(Borders::ALL).title(" Query: / "));
    frame.render_widget(query, header_chunks[0]);

    let tab_style = |tab: ActiveTab| {
        if state.active_tab == tab {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let session_label = if state.session.is_some() {
        Span::styled("session ok", Style::default().fg(Color::Green))
    } else {
        Span::styled("no session", Style::default().fg(Color::Red))
    };
    let tabs = Paragraph::new(Line::from(vec![
        Span::styled(" Search ", tab_style(ActiveTab::Search)),
        Span::raw("|"),
        Span::styled(" Rated ", tab_style(ActiveTab::Rated)),
        Span::raw("  "),
        session_label,
    ]))
    .block(Block::default().borders(Borders::ALL).title(" cinedex "));
    frame.render_widget(tabs, header_chunks[1]);
}

/// Draws the search tab: loading/error notices or the result cards.
fn draw_search_tab(frame: &mut Frame, area: Rect, state: &AppState) {
    match &state.search_phase {
        SearchPhase::Loading => draw_notice(frame, area, " Results ", "Loading...", Color::Yellow),
        SearchPhase::Failed(message) => draw_notice(
            frame,
            area,
            " Results ",
            &format!("Failed to load movies: {message}"),
            Color::Red,
        ),
        SearchPhase::Loaded => {
            if state.movies.is_empty() {
                draw_notice(
                    frame,
                    area,
                    " Results ",
                    "No movies found matching your search.",
                    Color::Yellow,
                );
            } else {
                let title = format!(
                    " Results (page {}/{}, {} found) ",
                    state.page,
                    state.total_pages().max(1),
                    state.total_results,
                );
                draw_cards(frame, area, state, &state.movies, &title);
            }
        }
    }
}

/// Draws the rated tab according to its lifecycle phase.
fn draw_rated_tab(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.session.is_none() {
        draw_notice(
            frame,
            area,
            " Rated ",
            "No guest session. Ratings are unavailable.",
            Color::Red,
        );
        return;
    }

    match &state.rated_phase {
        RatedPhase::Idle | RatedPhase::Loading => {
            draw_notice(frame, area, " Rated ", "Loading...", Color::Yellow);
        }
        RatedPhase::Empty => draw_notice(
            frame,
            area,
            " Rated ",
            "You haven't rated any movies yet.",
            Color::Yellow,
        ),
        RatedPhase::Failed(message) => draw_notice(
            frame,
            area,
            " Rated ",
            &format!("Failed to load rated movies: {message}"),
            Color::Red,
        ),
        RatedPhase::Loaded => {
            let title = format!(" Rated ({}) ", state.rated.len());
            draw_cards(frame, area, state, &state.rated, &title);
        }
    }
}

/// Draws a bordered single-message pane.
fn draw_notice(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let notice = Paragraph::new(message.to_owned())
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(title.to_owned()));
    frame.render_widget(notice, area);
}

/// Draws a list of movie cards.
fn draw_cards(frame: &mut Frame, area: Rect, state: &AppState, movies: &[MovieSummary], title: &str) {
    let items: Vec<ListItem> = movies
        .iter()
        .enumerate()
        .map(|(i, movie)| movie_card(state, movie, i == state.cursor))
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_owned()),
    );
    frame.render_widget(list, area);
}

/// Builds the multi-line card for one movie.
fn movie_card(state: &AppState, movie: &MovieSummary, selected: bool) -> ListItem<'static> {
    let marker = if selected { "\u{25b8} " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut lines = vec![Line::from(vec![
        Span::raw(String::from(marker)),
        Span::styled(movie.title.clone(), title_style),
        Span::raw("  "),
        Span::styled(
            format!("{:.1}", movie.vote_average),
            Style::default().fg(vote_color(movie.vote_average)),
        ),
        Span::raw("  "),
        Span::styled(
            movie
                .release_date
                .clone()
                .unwrap_or_else(|| String::from("-")),
            Style::default().fg(Color::DarkGray),
        ),
    ])];

    lines.push(Line::from(Span::styled(
        format!("    {}", state.genres.labels(&movie.genre_ids).join(" / ")),
        Style::default().fg(Color::Magenta),
    )));

    let overview = movie.overview.as_deref().unwrap_or("");
    lines.push(Line::from(format!(
        "    {}",
        truncate(overview, OVERVIEW_MAX_CHARS)
    )));

    lines.push(Line::from(Span::styled(
        format!(
            "    {}",
            poster_url(&state.poster_base, movie.poster_path.as_deref())
        ),
        Style::default().fg(Color::DarkGray),
    )));

    if let Some(rating) = state.user_ratings.get(&movie.id) {
        lines.push(Line::from(Span::styled(
            format!("    Your rating: {rating:.1}"),
            Style::default().fg(Color::Green),
        )));
    }

    lines.push(Line::from(""));
    ListItem::new(lines)
}

/// Maps a vote average to its display color band.
fn vote_color(vote_average: f64) -> Color {
    if vote_average <= 3.0 {
        Color::Red
    } else if vote_average <= 5.0 {
        Color::LightRed
    } else if vote_average <= 7.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// Cuts text to `max_chars` characters, appending `...` when shortened.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        String::from(text)
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push_str("...");
        cut
    }
}

/// Draws the footer with key hints.
fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let help_text = if state.input_mode == InputMode::Query {
        "Type to search | Esc/Enter: done"
    } else {
        "Tab: switch tab  \u{2191}\u{2193}/j/k: move  \u{2190}\u{2192}: page  /: edit query  1-9,0: rate  q: quit"
    };

    let footer = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
