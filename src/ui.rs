// 📺 Terminal dashboard - read-only view of one user's finances
//
// Pages: Transactions (filterable table + detail panel), Report (one month,
// Left/Right to move between months) and Budgets (gauges for this month).

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use crate::aggregation::{AggregationEngine, BudgetStatus, MonthlySummary};
use crate::clock::{Clock, MonthWindow};
use crate::entities::{Transaction, TransactionKind, User};
use crate::money::format_money;
use crate::report;
use crate::store::{BudgetStore, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Transactions,
    Report,
    Budgets,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Transactions => Page::Report,
            Page::Report => Page::Budgets,
            Page::Budgets => Page::Transactions,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Transactions => Page::Budgets,
            Page::Report => Page::Transactions,
            Page::Budgets => Page::Report,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Transactions => "Transactions",
            Page::Report => "Monthly Report",
            Page::Budgets => "Budgets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None,
    Income,
    Expense,
}

impl FilterType {
    fn matches(&self, tx: &Transaction) -> bool {
        match self {
            FilterType::None => true,
            FilterType::Income => tx.kind == TransactionKind::Income,
            FilterType::Expense => tx.is_expense(),
        }
    }
}

pub struct App {
    pub username: String,
    pub transactions: Vec<Transaction>,
    pub filtered_transactions: Vec<Transaction>,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub active_filter: FilterType,
    pub summary: MonthlySummary,
    pub budgets: Vec<BudgetStatus>,
    month: MonthWindow,
}

impl App {
    /// Load everything the dashboard shows for `user`, with the report
    /// opened on the clock's current month.
    pub fn load<S, C>(store: &S, clock: &C, user: &User) -> crate::error::Result<Self>
    where
        S: RecordStore + BudgetStore + ?Sized,
        C: Clock + ?Sized,
    {
        let engine = AggregationEngine::new(store, clock);
        let month = engine.current_month();
        let transactions = store.transactions_for_user(user.id)?;

        let mut state = TableState::default();
        if !transactions.is_empty() {
            state.select(Some(0));
        }

        Ok(App {
            username: user.username.clone(),
            filtered_transactions: transactions.clone(),
            transactions,
            state,
            current_page: Page::Transactions,
            show_detail: false,
            active_filter: FilterType::None,
            summary: engine.summary_for(user.id, &month)?,
            budgets: engine.get_budgets_with_spending(user.id)?,
            month,
        })
    }

    pub fn month(&self) -> MonthWindow {
        self.month
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|i| self.filtered_transactions.get(i))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.active_filter = filter;
        self.filtered_transactions = self
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();

        if self.filtered_transactions.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Move the report one month back or forward and recompute it.
    pub fn shift_month<S, C>(
        &mut self,
        engine: &AggregationEngine<'_, S, C>,
        user_id: i64,
        forward: bool,
    ) -> crate::error::Result<()>
    where
        S: RecordStore + BudgetStore + ?Sized,
        C: Clock + ?Sized,
    {
        let month = if forward {
            self.month.next()
        } else {
            self.month.previous()
        };
        self.summary = engine.summary_for(user_id, &month)?;
        self.month = month;
        Ok(())
    }

    pub fn next(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_transactions.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn over_budget_count(&self) -> usize {
        self.budgets.iter().filter(|b| b.is_over()).count()
    }
}

pub fn run_ui<S, C>(store: &S, clock: &C, user: &User) -> Result<()>
where
    S: RecordStore + BudgetStore + ?Sized,
    C: Clock + ?Sized,
{
    let mut app = App::load(store, clock, user)?;
    let engine = AggregationEngine::new(store, clock);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &engine, user.id);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B, S, C>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    engine: &AggregationEngine<'_, S, C>,
    user_id: i64,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    S: RecordStore + BudgetStore + ?Sized,
    C: Clock + ?Sized,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !handle_key(app, engine, user_id, key)? {
                return Ok(());
            }
        }
    }
}

/// Apply one key press. Returns `false` when the dashboard should close.
pub fn handle_key<S, C>(
    app: &mut App,
    engine: &AggregationEngine<'_, S, C>,
    user_id: i64,
    key: KeyEvent,
) -> crate::error::Result<bool>
where
    S: RecordStore + BudgetStore + ?Sized,
    C: Clock + ?Sized,
{
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
        KeyCode::BackTab => app.previous_page(),
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.previous_page();
            } else {
                app.next_page();
            }
        }
        KeyCode::Enter if app.current_page == Page::Transactions => app.toggle_detail(),
        KeyCode::Char('1') if app.current_page == Page::Transactions => {
            app.apply_filter(FilterType::None)
        }
        KeyCode::Char('2') if app.current_page == Page::Transactions => {
            app.apply_filter(FilterType::Income)
        }
        KeyCode::Char('3') if app.current_page == Page::Transactions => {
            app.apply_filter(FilterType::Expense)
        }
        KeyCode::Char('c') => {
            app.clear_filter();
            app.current_page = Page::Transactions;
        }
        KeyCode::Left if app.current_page == Page::Report => {
            app.shift_month(engine, user_id, false)?
        }
        KeyCode::Right if app.current_page == Page::Report => {
            app.shift_month(engine, user_id, true)?
        }
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home => {
            if !app.filtered_transactions.is_empty() {
                app.state.select(Some(0));
            }
        }
        KeyCode::End => {
            if !app.filtered_transactions.is_empty() {
                app.state.select(Some(app.filtered_transactions.len() - 1));
            }
        }
        _ => {}
    }
    Ok(true)
}

// ============================================================================
// RENDERING
// ============================================================================

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

    if app.show_detail && app.current_page == Page::Transactions {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Transactions => render_table(f, chunks[1], app),
            Page::Report => render_report(f, chunks[1], app),
            Page::Budgets => render_budgets(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Transactions, Page::Report, Page::Budgets].iter().enumerate() {
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
        app.username.clone(),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} transactions", app.transactions.len()),
        Style::default().fg(Color::White),
    ));

    let over = app.over_budget_count();
    if over > 0 {
        tab_spans.push(Span::raw("  "));
        tab_spans.push(Span::styled(
            format!("⚠ {} over budget", over),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn kind_color(kind: TransactionKind) -> Color {
    match kind {
        TransactionKind::Income => Color::Green,
        TransactionKind::Expense => Color::Red,
    }
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.filtered_transactions.iter().map(|tx| {
        let color = kind_color(tx.kind);
        Row::new(vec![
            Cell::from(tx.id.to_string()),
            Cell::from(tx.date.to_string()),
            Cell::from(tx.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(truncate(&tx.category, 20)),
            Cell::from(format_money(tx.amount)).style(Style::default().fg(color)),
            Cell::from(truncate(tx.description.as_deref().unwrap_or(""), 30)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(22),
            Constraint::Length(14),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["ID", "Date", "Type", "Category", "Amount", "Description"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transactions "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_report(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let summary = &app.summary;
    let savings_color = if summary.savings.is_sign_negative() {
        Color::Red
    } else {
        Color::Green
    };
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let totals = vec![
        Line::from(vec![
            Span::styled("  Total Income:   ", label),
            Span::styled(format_money(summary.income_total), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("  Total Expenses: ", label),
            Span::styled(format_money(summary.expense_total), Style::default().fg(Color::Red)),
        ]),
        Line::from("  ──────────────────────────────"),
        Line::from(vec![
            Span::styled("  Net Savings:    ", label),
            Span::styled(
                format_money(summary.savings),
                Style::default().fg(savings_color).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let totals_panel = Paragraph::new(totals).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" Monthly Summary for {} ", app.month)),
    );
    f.render_widget(totals_panel, chunks[0]);

    if !summary.has_expenses() {
        let empty = Paragraph::new("  No expenses to break down for this month.").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expense Breakdown "),
        );
        f.render_widget(empty, chunks[1]);
        return;
    }

    let rows = summary.expense_breakdown.iter().map(|entry| {
        Row::new(vec![
            Cell::from(truncate(&entry.category, 28)),
            Cell::from(format_money(entry.total)).style(Style::default().fg(Color::Red)),
        ])
    });
    let table = Table::new(rows, [Constraint::Length(30), Constraint::Length(16)])
        .header(header_row(&["Category", "Total"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expense Breakdown "),
        );
    f.render_widget(table, chunks[1]);
}

fn render_budgets(f: &mut Frame, area: Rect, app: &App) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Budget Status for this Month ");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    if app.budgets.is_empty() {
        f.render_widget(Paragraph::new("  You have not set any budgets yet."), inner);
        return;
    }

    let mut constraints: Vec<Constraint> =
        app.budgets.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(0));
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (status, slot) in app.budgets.iter().zip(slots.iter()) {
        let color = if status.is_over() { Color::Red } else { Color::Green };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(format!(
                " {}  {} / {}  remaining {} ",
                status.category,
                format_money(status.spent),
                format_money(status.limit),
                format_money(status.remaining)
            )))
            .gauge_style(Style::default().fg(color))
            .ratio(report::budget_fill(status));
        f.render_widget(gauge, *slot);
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let mut status_spans = vec![];

    match app.current_page {
        Page::Transactions => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            status_spans.push(Span::styled(
                format!(" Row: {}/{} ", selected, app.filtered_transactions.len()),
                Style::default().fg(Color::Cyan),
            ));

            if app.active_filter != FilterType::None {
                let filter_name = match app.active_filter {
                    FilterType::Income => "income",
                    FilterType::Expense => "expense",
                    FilterType::None => "all",
                };
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled(
                    format!("Filter: {}", filter_name),
                    Style::default().fg(Color::Green),
                ));
                status_spans.push(Span::raw(" ("));
                status_spans.push(Span::styled("c", key));
                status_spans.push(Span::raw(" clear)"));
            }

            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("1/2/3", key));
            status_spans.push(Span::raw(" All/Income/Expense | "));
            status_spans.push(Span::styled("Enter", key));
            status_spans.push(Span::raw(" Details | "));
            status_spans.push(Span::styled("↑/↓", key));
            status_spans.push(Span::raw(" Nav | "));
        }
        Page::Report => {
            status_spans.push(Span::styled(
                format!(" {} ", app.month),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("←/→", key));
            status_spans.push(Span::raw(" Month | "));
        }
        Page::Budgets => {
            status_spans.push(Span::styled(
                format!(" {} budgets ", app.budgets.len()),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw(" | "));
        }
    }

    status_spans.push(Span::styled("Tab", key));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let Some(tx) = app.selected_transaction() else {
        let empty = Paragraph::new("  No transaction selected").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Transaction Details "),
        );
        f.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let color = kind_color(tx.kind);

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  ID:       ", label),
            Span::raw(tx.id.to_string()),
        ]),
        Line::from(vec![
            Span::styled("  Date:     ", label),
            Span::raw(tx.date.to_string()),
        ]),
        Line::from(vec![
            Span::styled("  Type:     ", label),
            Span::styled(tx.kind.label(), Style::default().fg(color)),
        ]),
        Line::from(vec![
            Span::styled("  Category: ", label),
            Span::raw(tx.category.clone()),
        ]),
        Line::from(vec![
            Span::styled("  Amount:   ", label),
            Span::styled(
                format_money(tx.amount),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  DESCRIPTION",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                tx.description.clone().unwrap_or_else(|| "(none)".to_string()),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Transaction Details "),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
