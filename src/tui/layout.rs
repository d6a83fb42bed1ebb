use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Chat screen layout
pub struct AppLayout {
    pub sessions_area: Rect,
    pub transcript_area: Rect,
    pub input_area: Rect,
    pub status_area: Rect,
}

impl AppLayout {
    /// Sessions sidebar (30%) beside the transcript (70%), a 3-row input box below them
    /// and a 1-row status bar at the bottom
    pub fn new(area: Rect) -> Self {
        let vertical_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3), Constraint::Length(1)])
            .split(area);

        let horizontal_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(vertical_chunks[0]);

        Self {
            sessions_area: horizontal_chunks[0],
            transcript_area: horizontal_chunks[1],
            input_area: vertical_chunks[1],
            status_area: vertical_chunks[2],
        }
    }
}
