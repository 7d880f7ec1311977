use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use park_and_ride::{
    Config, DailySummary, FeeQuote, Leaving, ParkedVehicle, ParkingLot, RateEntry, TimeOfDay,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Rates,
    VehicleIn,
    VehicleOut,
    Profile,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Rates => Page::VehicleIn,
            Page::VehicleIn => Page::VehicleOut,
            Page::VehicleOut => Page::Profile,
            Page::Profile => Page::Rates,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Rates => Page::Profile,
            Page::VehicleIn => Page::Rates,
            Page::VehicleOut => Page::VehicleIn,
            Page::Profile => Page::VehicleOut,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Rates => "Rates",
            Page::VehicleIn => "Vehicle In",
            Page::VehicleOut => "Vehicle Out",
            Page::Profile => "Profile",
        }
    }
}

/// What the keyboard is currently feeding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingRate,
    EditingPlate,
    SearchingPlate,
    EditingLeavingTime,
    ConfirmReset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

pub struct App {
    pub lot: ParkingLot,
    pub config: Config,
    pub current_page: Page,
    pub mode: InputMode,
    pub input: String,
    pub rates: Vec<RateEntry>,
    pub rates_state: TableState,
    pub type_index: usize,
    pub vehicles: Vec<ParkedVehicle>,
    pub vehicles_state: TableState,
    pub found: Option<ParkedVehicle>,
    pub quote: Option<FeeQuote>,
    pub summary: DailySummary,
    pub status: Option<Status>,
}

impl App {
    pub fn new(lot: ParkingLot, config: Config) -> Result<Self> {
        let rates = lot.rates.get_all()?;
        let vehicles = lot.ledger.parked()?;
        let summary = lot.ledger.summary()?;

        let mut rates_state = TableState::default();
        if !rates.is_empty() {
            rates_state.select(Some(0));
        }

        Ok(Self {
            lot,
            config,
            current_page: Page::Rates,
            mode: InputMode::Normal,
            input: String::new(),
            rates,
            rates_state,
            type_index: 0,
            vehicles,
            vehicles_state: TableState::default(),
            found: None,
            quote: None,
            summary,
            status: None,
        })
    }

    fn refresh(&mut self) -> park_and_ride::Result<()> {
        self.rates = self.lot.rates.get_all()?;
        self.vehicles = self.lot.ledger.parked()?;
        self.summary = self.lot.ledger.summary()?;
        if self.type_index >= self.rates.len() {
            self.type_index = 0;
        }
        Ok(())
    }

    fn ok(&mut self, message: impl Into<String>) {
        self.status = Some(Status {
            message: message.into(),
            is_error: false,
        });
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.status = Some(Status {
            message: message.into(),
            is_error: true,
        });
    }

    pub fn selected_rate(&self) -> Option<&RateEntry> {
        self.rates_state.selected().and_then(|i| self.rates.get(i))
    }

    pub fn selected_type(&self) -> Option<&RateEntry> {
        self.rates.get(self.type_index)
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.rates.len();
        if len == 0 {
            return;
        }
        let i = match self.rates_state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(0) | None => if down { 0 } else { len - 1 },
            Some(i) => i - 1,
        };
        self.rates_state.select(Some(i));
    }

    fn cycle_type(&mut self, forward: bool) {
        let len = self.rates.len();
        if len == 0 {
            return;
        }
        self.type_index = if forward {
            (self.type_index + 1) % len
        } else {
            (self.type_index + len - 1) % len
        };
    }

    fn begin(&mut self, mode: InputMode) {
        self.mode = mode;
        self.input.clear();
    }

    fn clear_checkout(&mut self) {
        self.found = None;
        self.quote = None;
    }

    /// Apply one key press; returns false when the console should close
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            InputMode::Normal => self.handle_normal(key),
            InputMode::ConfirmReset => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => self.reset_revenue(),
                    _ => self.ok("Reset cancelled"),
                }
                self.mode = InputMode::Normal;
                true
            }
            _ => {
                self.handle_text(key);
                true
            }
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            _ => match self.current_page {
                Page::Rates => match key.code {
                    KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
                    KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
                    KeyCode::Enter | KeyCode::Char('e') if self.selected_rate().is_some() => {
                        self.begin(InputMode::EditingRate)
                    }
                    _ => {}
                },
                Page::VehicleIn => match key.code {
                    KeyCode::Left | KeyCode::Char('h') => self.cycle_type(false),
                    KeyCode::Right | KeyCode::Char('l') => self.cycle_type(true),
                    KeyCode::Enter | KeyCode::Char('a') => self.begin(InputMode::EditingPlate),
                    _ => {}
                },
                Page::VehicleOut => match key.code {
                    KeyCode::Enter | KeyCode::Char('/') | KeyCode::Char('s') => {
                        self.clear_checkout();
                        self.begin(InputMode::SearchingPlate);
                    }
                    KeyCode::Char('c') if self.quote.is_some() => self.check_out(),
                    KeyCode::Char('x') => self.clear_checkout(),
                    _ => {}
                },
                Page::Profile => {
                    if let KeyCode::Char('r') = key.code {
                        self.mode = InputMode::ConfirmReset;
                    }
                }
            },
        }
        true
    }

    fn handle_text(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.input.clear();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
            }
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let input = std::mem::take(&mut self.input);
        let mode = self.mode;
        self.mode = InputMode::Normal;

        match mode {
            InputMode::EditingRate => self.update_rate(&input),
            InputMode::EditingPlate => self.check_in(&input),
            InputMode::SearchingPlate => self.search(&input),
            InputMode::EditingLeavingTime => self.calculate(&input),
            InputMode::Normal | InputMode::ConfirmReset => {}
        }
    }

    fn update_rate(&mut self, input: &str) {
        let Some(name) = self.selected_rate().map(|r| r.name.clone()) else {
            return;
        };
        match self.lot.rates.update_rate(&name, input) {
            Ok(entry) => {
                let money = self.config.money(entry.rate);
                self.ok(format!("Rate for {} updated to {}", entry.name, money));
            }
            Err(e) => self.fail(e.to_string()),
        }
        self.reload();
    }

    fn check_in(&mut self, plate: &str) {
        let vehicle_type = self
            .selected_type()
            .map(|r| r.name.clone())
            .unwrap_or_default();
        match self.lot.ledger.check_in(&vehicle_type, plate) {
            Ok(record) => self.ok(format!(
                "{} ({}) checked in at {}",
                record.plate_number, record.vehicle_type, record.time
            )),
            Err(e) => self.fail(e.to_string()),
        }
        self.reload();
    }

    fn search(&mut self, plate: &str) {
        match self.lot.ledger.find_by_plate(plate) {
            Ok(record) => {
                self.ok(format!(
                    "Found {} ({}), entered {}. Leaving time HH:MM, blank for now",
                    record.plate_number, record.vehicle_type, record.time
                ));
                self.found = Some(record);
                self.begin(InputMode::EditingLeavingTime);
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn calculate(&mut self, leaving: &str) {
        let Some(record) = self.found.clone() else {
            return;
        };

        let leaving = if leaving.trim().is_empty() {
            Ok(Leaving::At(Local::now()))
        } else {
            TimeOfDay::parse(leaving).map(Leaving::TimeOfDay)
        };

        match leaving.and_then(|l| self.lot.ledger.quote(&record, l)) {
            Ok(quote) => {
                let money = self.config.money(quote.fee);
                self.ok(format!("Total charge: {}. Press c to check out", money));
                self.quote = Some(quote);
            }
            Err(e) => {
                self.fail(e.to_string());
                self.begin(InputMode::EditingLeavingTime);
            }
        }
    }

    fn check_out(&mut self) {
        let Some(quote) = self.quote.take() else {
            return;
        };
        match self.lot.ledger.check_out(&quote.vehicle, quote.fee) {
            Ok(receipt) => {
                let money = self.config.money(receipt.fee);
                self.ok(format!("{} checked out, {} collected", receipt.vehicle.plate_number, money));
                self.found = None;
            }
            Err(e) => {
                self.fail(e.to_string());
                self.quote = Some(quote);
            }
        }
        self.reload();
    }

    fn reset_revenue(&mut self) {
        match self.lot.ledger.reset_revenue() {
            Ok(()) => self.ok("Total revenue has been reset"),
            Err(e) => self.fail(e.to_string()),
        }
        self.reload();
    }

    fn reload(&mut self) {
        if let Err(e) = self.refresh() {
            self.fail(format!("Failed to reload: {}", e));
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Rates => render_rates(f, chunks[1], app),
        Page::VehicleIn => render_vehicle_in(f, chunks[1], app),
        Page::VehicleOut => render_vehicle_out(f, chunks[1], app),
        Page::Profile => render_profile(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Rates, Page::VehicleIn, Page::VehicleOut, Page::Profile];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Hi, {}", app.summary.attendant_name()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Parked: {}", app.vehicles.len()),
        Style::default().fg(Color::Cyan),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        app.config.money(app.summary.revenue),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_rates(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let rows = app.rates.iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.icon.clone()).style(Style::default().fg(Color::DarkGray)),
            Cell::from(entry.name.clone()),
            Cell::from(app.config.money(entry.rate)).style(Style::default().fg(Color::Cyan)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(16),
        ],
    )
    .header(header_row(&["Icon", "Vehicle Type", "Per Hour"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Parking Rates (per hour) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[0], &mut app.rates_state);

    let mut lines = vec![Line::from(vec![
        Span::styled(
            "  More than 24 hours parking: ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("24 Hours Rate × Number Of Days"),
    ])];
    if app.mode == InputMode::EditingRate {
        let name = app.selected_rate().map(|r| r.name.as_str()).unwrap_or("");
        lines.push(input_line(&format!("New rate for {}: ", name), &app.input));
    }

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );
}

fn render_vehicle_in(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let mut type_spans = vec![Span::raw("  Type: ")];
    for (i, entry) in app.rates.iter().enumerate() {
        let style = if i == app.type_index {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        type_spans.push(Span::styled(format!(" {} ", entry.name), style));
        type_spans.push(Span::raw(" "));
    }

    let plate_line = if app.mode == InputMode::EditingPlate {
        input_line("  Vehicle number: ", &app.input)
    } else {
        Line::from(Span::styled(
            "  ←/→ choose type, Enter to add a vehicle",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    };

    f.render_widget(
        Paragraph::new(vec![Line::from(type_spans), plate_line])
            .block(Block::default().borders(Borders::ALL).title(" Vehicle In ")),
        chunks[0],
    );

    let rows = app.vehicles.iter().map(|v| {
        Row::new(vec![
            Cell::from(v.vehicle_type.clone()).style(Style::default().fg(Color::Cyan)),
            Cell::from(v.plate_number.clone()),
            Cell::from(v.time.clone()).style(Style::default().fg(Color::DarkGray)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(20),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Type", "Number", "Entry"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Parked Vehicles "),
    );

    f.render_stateful_widget(table, chunks[1], &mut app.vehicles_state);
}

fn render_vehicle_out(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];

    if app.mode == InputMode::SearchingPlate {
        content.push(input_line("  Vehicle number: ", &app.input));
    } else if app.found.is_none() {
        content.push(Line::from(Span::styled(
            "  Press Enter to search a vehicle number",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(record) = &app.found {
        content.push(Line::from(vec![
            Span::styled("  Vehicle: ", label),
            Span::raw(record.plate_number.clone()),
        ]));
        content.push(Line::from(vec![
            Span::styled("  Vehicle Type: ", label),
            Span::raw(record.vehicle_type.clone()),
        ]));
        content.push(Line::from(vec![
            Span::styled("  Entry Time: ", label),
            Span::raw(record.time.clone()),
        ]));
        content.push(Line::from(""));

        if app.mode == InputMode::EditingLeavingTime {
            content.push(input_line("  Leaving time (HH:MM): ", &app.input));
        }
    }

    if let Some(quote) = &app.quote {
        content.push(Line::from(vec![
            Span::styled("  Duration: ", label),
            Span::raw(format!("{}h {:02}m", quote.minutes / 60, quote.minutes % 60)),
        ]));
        content.push(Line::from(vec![
            Span::styled("  Total Charge: ", label),
            Span::styled(
                app.config.money(quote.fee),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]));
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled("  c", Style::default().fg(Color::Yellow)),
            Span::raw(" check out and clear   "),
            Span::styled("x", Style::default().fg(Color::Red)),
            Span::raw(" cancel"),
        ]));
    }

    f.render_widget(
        Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Vehicle Out "),
        ),
        area,
    );
}

fn render_profile(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Hi "),
            Span::styled(
                app.summary.attendant_name().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(", you have earned "),
            Span::styled(
                app.config.money(app.summary.revenue),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" at {} today.", app.config.lot_name)),
        ]),
        Line::from(""),
        Line::from(format!("  Vehicles still parked: {}", app.summary.parked)),
        Line::from(""),
    ];

    if app.mode == InputMode::ConfirmReset {
        content.push(Line::from(Span::styled(
            "  Are you sure you want to reset the total revenue for the day? (y/n)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    } else {
        content.push(Line::from(vec![
            Span::styled("  r", Style::default().fg(Color::Yellow)),
            Span::raw(" Reset Daily Revenue"),
        ]));
    }

    f.render_widget(
        Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Profile "),
        ),
        area,
    );
}

fn input_line(prompt: &str, input: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(prompt.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(input.to_string()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ])
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        status_spans.push(Span::styled(
            format!(" {} ", status.message),
            Style::default().fg(color),
        ));
        status_spans.push(Span::raw(" | "));
    }

    if app.mode == InputMode::Normal {
        status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    } else {
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Submit | "));
        status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Cancel"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use park_and_ride::{MemoryStore, UnknownTypePolicy};
    use std::sync::Arc;

    fn app() -> App {
        let lot = ParkingLot::with_store(Arc::new(MemoryStore::new()), UnknownTypePolicy::Reject)
            .unwrap();
        App::new(lot, Config::default()).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_page_cycle() {
        let mut app = app();
        assert_eq!(app.current_page, Page::Rates);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::VehicleIn);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_page, Page::Profile);
        assert!(!press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_edit_rate() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_rate().unwrap().name, "Motor Car");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, InputMode::EditingRate);
        type_text(&mut app, "65");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, InputMode::Normal);
        assert_eq!(app.lot.rates.rate_for("Motor Car").unwrap(), 65.0);
        assert!(!app.status.as_ref().unwrap().is_error);

        // Rejected input is reported and nothing changes
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "-5");
        press(&mut app, KeyCode::Enter);
        assert!(app.status.as_ref().unwrap().is_error);
        assert_eq!(app.lot.rates.rate_for("Motor Car").unwrap(), 65.0);
    }

    #[test]
    fn test_check_in_and_out_flow() {
        let mut app = app();

        // Vehicle In: pick "Three Wheel" and add a plate
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "QL-7788");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.vehicles.len(), 1);
        assert_eq!(app.vehicles[0].vehicle_type, "Three Wheel");

        // Vehicle Out: search, quote for now, confirm
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "QL-7788");
        press(&mut app, KeyCode::Enter);
        assert!(app.found.is_some());
        assert_eq!(app.mode, InputMode::EditingLeavingTime);

        press(&mut app, KeyCode::Enter);
        let fee = app.quote.as_ref().unwrap().fee;
        assert!(fee >= 0.0);

        press(&mut app, KeyCode::Char('c'));
        assert!(app.vehicles.is_empty());
        assert!(app.found.is_none());
        assert_eq!(app.summary.revenue, fee);
    }

    #[test]
    fn test_search_unknown_plate_reports_error() {
        let mut app = app();
        app.current_page = Page::VehicleOut;
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "NOPE-1");
        press(&mut app, KeyCode::Enter);

        assert!(app.found.is_none());
        assert_eq!(app.mode, InputMode::Normal);
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_bad_leaving_time_keeps_prompt_open() {
        let mut app = app();
        app.lot.ledger.check_in("Motor Car", "CAR-1").unwrap();
        app.current_page = Page::VehicleOut;

        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "CAR-1");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "99:99");
        press(&mut app, KeyCode::Enter);

        assert!(app.quote.is_none());
        assert_eq!(app.mode, InputMode::EditingLeavingTime);
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_reset_needs_confirmation() {
        let mut app = app();
        let record = app.lot.ledger.check_in("Motor Car", "CAR-1").unwrap();
        app.lot.ledger.check_out(&record, 50.0).unwrap();
        app.current_page = Page::Profile;

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.lot.ledger.revenue().unwrap(), 50.0);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.mode, InputMode::ConfirmReset);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.lot.ledger.revenue().unwrap(), 0.0);
        assert_eq!(app.summary.revenue, 0.0);
    }
}
