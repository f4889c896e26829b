//! Custom TUI Widgets for the Live Dashboard
//!
//! Header, metric card grid, bar charts, tab strip, product tables and the
//! supplier/performer lists, all drawn with ratatui.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use super::{
    category_series, format_currency, format_quantity, monthly_series, product_rows, DashboardScreen,
    DashboardState, DashboardTab, ALL_TIME_HINT, EMPTY_TEXT, ERROR_TITLE, LOADING_TEXT, NO_PRODUCTS_TEXT,
    PAGE_SUBTITLE, PRODUCT_TABLE_HEADERS, TIME_FILTERED_HINT,
};
use crate::metrics::{metric_cards, MetricCard};
use crate::models::{AnalyticsSnapshot, Product, SupplierSummary, TopPerformer};

/// Cards per row in the metric grid
const CARDS_PER_ROW: usize = 4;
const CARD_HEIGHT: u16 = 4;
const CHART_HEIGHT: u16 = 12;
const LIST_HEIGHT: u16 = 9;

/// Style constants for consistent theming
pub struct AppTheme {
    pub primary: Style,
    pub secondary: Style,
    pub accent: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub muted: Style,
    pub stocked: Style,
    pub sold: Style,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self {
            primary: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            secondary: Style::default().fg(Color::Cyan),
            accent: Style::default().fg(Color::Yellow),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            muted: Style::default().fg(Color::DarkGray),
            stocked: Style::default().fg(Color::Blue),
            sold: Style::default().fg(Color::Green),
        }
    }
}

fn titled_block<'a>(title: impl Into<Line<'a>>, theme: &AppTheme) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(theme.primary)
        .borders(Borders::ALL)
        .border_style(theme.secondary)
}

/// Page header: title, pharmacy, freshness and signed-in user
pub struct HeaderWidget<'a> {
    title: &'a str,
    last_updated: Option<&'a str>,
    user: Option<&'a str>,
    refreshing: bool,
    theme: &'a AppTheme,
}

impl<'a> HeaderWidget<'a> {
    pub fn new(
        title: &'a str,
        last_updated: Option<&'a str>,
        user: Option<&'a str>,
        refreshing: bool,
        theme: &'a AppTheme,
    ) -> Self {
        Self {
            title,
            last_updated,
            user,
            refreshing,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut block = titled_block(self.title, self.theme);
        if let Some(user) = self.user {
            block = block.title(Line::from(Span::styled(user, self.theme.muted)).right_aligned());
        }

        let mut spans = vec![Span::styled(PAGE_SUBTITLE, self.theme.muted)];
        if let Some(text) = self.last_updated {
            spans.push(Span::styled("  ·  ", self.theme.muted));
            spans.push(Span::styled(text, self.theme.accent));
        }
        if self.refreshing {
            spans.push(Span::styled("  ⟳ refreshing", self.theme.secondary));
        }

        let header = Paragraph::new(Line::from(spans)).block(block);
        frame.render_widget(header, area);
    }
}

/// One summary card: label, main value, trend percentage and time-filter badge
pub struct MetricCardWidget<'a> {
    card: &'a MetricCard,
    theme: &'a AppTheme,
}

impl<'a> MetricCardWidget<'a> {
    pub fn new(card: &'a MetricCard, theme: &'a AppTheme) -> Self {
        Self { card, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let badge = if self.card.time_filtered { " ⏱" } else { "" };
        let block = Block::default()
            .title(format!("{}{}", self.card.display.display_label, badge))
            .title_style(self.theme.secondary)
            .borders(Borders::ALL)
            .border_style(self.theme.muted);

        let (arrow, trend_style) = if self.card.trend_up {
            ("↑", self.theme.success)
        } else {
            ("↓", self.theme.error)
        };
        let mut value_spans = vec![Span::styled(self.card.display.main.clone(), self.theme.primary)];
        if let Some(percent) = &self.card.display.percent {
            let style = if percent.starts_with('-') {
                self.theme.error
            } else {
                self.theme.success
            };
            value_spans.push(Span::raw(" "));
            value_spans.push(Span::styled(percent.clone(), style));
        }
        value_spans.push(Span::styled(format!(" {}", arrow), trend_style));

        let hint = if self.card.time_filtered {
            TIME_FILTERED_HINT
        } else {
            ALL_TIME_HINT
        };
        let text = Text::from(vec![Line::from(value_spans), Line::from(Span::styled(hint, self.theme.muted))]);

        frame.render_widget(Paragraph::new(text).block(block), area);
    }
}

/// Rows needed to lay out `count` cards
pub fn card_grid_height(count: usize) -> u16 {
    let rows = count.div_ceil(CARDS_PER_ROW);
    rows as u16 * CARD_HEIGHT
}

pub fn render_card_grid(frame: &mut Frame, area: Rect, cards: &[MetricCard], theme: &AppTheme) {
    let rows: Vec<&[MetricCard]> = cards.chunks(CARDS_PER_ROW).collect();
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(rows.iter().map(|_| Constraint::Length(CARD_HEIGHT)))
        .split(area);

    for (row, row_area) in rows.iter().zip(row_areas.iter()) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..CARDS_PER_ROW).map(|_| Constraint::Ratio(1, CARDS_PER_ROW as u32)))
            .split(*row_area);
        for (card, column) in row.iter().zip(columns.iter()) {
            MetricCardWidget::new(card, theme).render(frame, *column);
        }
    }
}

/// Grouped bar chart of a two-value series
pub struct SeriesChartWidget<'a> {
    title: &'a str,
    series: &'a [(String, u64, u64)],
    theme: &'a AppTheme,
}

impl<'a> SeriesChartWidget<'a> {
    pub fn new(title: &'a str, series: &'a [(String, u64, u64)], theme: &'a AppTheme) -> Self {
        Self { title, series, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = titled_block(self.title, self.theme);
        if self.series.is_empty() {
            let empty = Paragraph::new("No data")
                .style(self.theme.muted)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let mut chart = BarChart::default()
            .block(block)
            .bar_width(3)
            .bar_gap(0)
            .group_gap(2)
            .value_style(self.theme.primary);
        for (label, first, second) in self.series {
            let group = BarGroup::default().label(Line::from(label.clone())).bars(&[
                Bar::default().value(*first).style(self.theme.stocked),
                Bar::default().value(*second).style(self.theme.sold),
            ]);
            chart = chart.data(group);
        }
        frame.render_widget(chart, area);
    }
}

/// Products table, skipping the first `scroll` rows
pub struct ProductTableWidget<'a> {
    title: &'a str,
    products: &'a [Product],
    scroll: usize,
    theme: &'a AppTheme,
}

impl<'a> ProductTableWidget<'a> {
    pub fn new(title: &'a str, products: &'a [Product], scroll: usize, theme: &'a AppTheme) -> Self {
        Self {
            title,
            products,
            scroll,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = titled_block(format!("{} ({})", self.title, self.products.len()), self.theme);
        if self.products.is_empty() {
            let empty = Paragraph::new(NO_PRODUCTS_TEXT)
                .style(self.theme.muted)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(PRODUCT_TABLE_HEADERS.iter().map(|h| Cell::from(*h))).style(self.theme.secondary);
        let rows: Vec<Row> = product_rows(self.products)
            .into_iter()
            .skip(self.scroll)
            .map(|row| Row::new([row.name, row.sku, row.quantity, row.unit_price, row.expiry]))
            .collect();
        let widths = [
            Constraint::Percentage(36),
            Constraint::Percentage(16),
            Constraint::Percentage(14),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
        ];

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }
}

pub struct SupplierListWidget<'a> {
    suppliers: &'a [SupplierSummary],
    theme: &'a AppTheme,
}

impl<'a> SupplierListWidget<'a> {
    pub fn new(suppliers: &'a [SupplierSummary], theme: &'a AppTheme) -> Self {
        Self { suppliers, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = titled_block("Top Suppliers", self.theme);
        if self.suppliers.is_empty() {
            let empty = Paragraph::new("No suppliers").style(self.theme.muted).block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .suppliers
            .iter()
            .map(|supplier| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", supplier.name), self.theme.primary),
                    Span::styled(format!("{} units ", format_quantity(supplier.volume_supplied)), self.theme.muted),
                    Span::styled(format_currency(supplier.value_supplied), self.theme.success),
                    Span::styled(
                        format!(
                            " · {} orders · {}%",
                            supplier.orders_delivered,
                            format_quantity((supplier.order_completion_pct * 10.0).round() / 10.0)
                        ),
                        self.theme.muted,
                    ),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }
}

pub struct PerformerListWidget<'a> {
    performers: &'a [TopPerformer],
    theme: &'a AppTheme,
}

impl<'a> PerformerListWidget<'a> {
    pub fn new(performers: &'a [TopPerformer], theme: &'a AppTheme) -> Self {
        Self { performers, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = titled_block("Top Performers", self.theme);
        if self.performers.is_empty() {
            let empty = Paragraph::new("No performers").style(self.theme.muted).block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .performers
            .iter()
            .enumerate()
            .map(|(rank, performer)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{}. ", rank + 1), self.theme.muted),
                    Span::styled(format!("{} ", performer.name), self.theme.primary),
                    Span::styled(format!("@{} ", performer.username), self.theme.secondary),
                    Span::styled(format!("{} sold", format_quantity(performer.volume_sold)), self.theme.accent),
                ]))
            })
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }
}

/// Key help shown on the bottom line
pub struct StatusWidget<'a> {
    theme: &'a AppTheme,
}

impl<'a> StatusWidget<'a> {
    pub fn new(theme: &'a AppTheme) -> Self {
        Self { theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let keys = [("r", " refresh  "), ("Tab", " switch  "), ("↑/↓", " scroll  "), ("q", " quit")];
        let spans: Vec<Span> = keys
            .iter()
            .flat_map(|(key, action)| [Span::styled(*key, self.theme.accent), Span::styled(*action, self.theme.muted)])
            .collect();

        let help = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
        frame.render_widget(help, area);
    }
}

fn render_message(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>, theme: &AppTheme) {
    let paragraph = Paragraph::new(Text::from(lines))
        .block(titled_block(title.to_string(), theme))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Split the area under the tab strip; returns (lists/charts area, table grid)
fn split_tab_body(area: Rect, top_height: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top_height), Constraint::Min(5)])
        .split(area);
    (chunks[0], chunks[1])
}

fn halves(area: Rect, direction: Direction) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Lay out product tables two per row; returns the rows visible in each table
fn render_table_grid(
    frame: &mut Frame,
    area: Rect,
    tables: &[(&str, &[Product])],
    scroll: usize,
    theme: &AppTheme,
) -> usize {
    let grid_rows = tables.len().div_ceil(2).max(1);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..grid_rows).map(|_| Constraint::Ratio(1, grid_rows as u32)))
        .split(area);

    for (pair, row_area) in tables.chunks(2).zip(row_areas.iter()) {
        let (left, right) = halves(*row_area, Direction::Horizontal);
        for ((title, products), cell) in pair.iter().zip([left, right]) {
            ProductTableWidget::new(title, products, scroll, theme).render(frame, cell);
        }
    }

    // Borders and the header row
    row_areas.first().map(|r| r.height.saturating_sub(3) as usize).unwrap_or(0)
}

fn render_content(
    frame: &mut Frame,
    area: Rect,
    snapshot: &AnalyticsSnapshot,
    state: &DashboardState,
    theme: &AppTheme,
) -> usize {
    let analytics = &snapshot.analytics;
    let summary = metric_cards(&analytics.metrics);
    let inventory = metric_cards(&analytics.inventory_cards);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(card_grid_height(summary.len())),
            Constraint::Length(card_grid_height(inventory.len())),
            Constraint::Length(3),
            Constraint::Min(8),
        ])
        .split(area);

    render_card_grid(frame, chunks[0], &summary, theme);
    if !inventory.is_empty() {
        render_card_grid(frame, chunks[1], &inventory, theme);
    }

    let tabs = Tabs::new(DashboardTab::ALL.iter().map(|tab| tab.title()))
        .select(state.tab.index())
        .style(theme.muted)
        .highlight_style(theme.accent.add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).border_style(theme.secondary));
    frame.render_widget(tabs, chunks[2]);

    let tables = state.tab.product_tables(analytics);
    match state.tab {
        DashboardTab::Inventory => {
            let categories = category_series(analytics);
            let months = monthly_series(analytics);
            let (charts, grid) = split_tab_body(chunks[3], CHART_HEIGHT);
            let (left, right) = halves(charts, Direction::Horizontal);
            SeriesChartWidget::new("Distribution by Category", &categories, theme).render(frame, left);
            SeriesChartWidget::new("Monthly Stocked vs Sold", &months, theme).render(frame, right);
            render_table_grid(frame, grid, &tables, state.scroll_position, theme)
        }
        DashboardTab::Sales => {
            let (lists, grid) = split_tab_body(chunks[3], LIST_HEIGHT);
            let (left, right) = halves(lists, Direction::Horizontal);
            SupplierListWidget::new(&analytics.top_suppliers, theme).render(frame, left);
            PerformerListWidget::new(&analytics.top_performers, theme).render(frame, right);
            render_table_grid(frame, grid, &tables, state.scroll_position, theme)
        }
    }
}

/// Create a layout for the main display: header, body, status line
pub fn create_main_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(area)
        .to_vec()
}

/// Render the whole dashboard; returns how many product rows fit on screen
pub fn render_dashboard(frame: &mut Frame, state: &DashboardState, theme: &AppTheme, now: DateTime<Utc>) -> usize {
    let chunks = create_main_layout(frame.area());

    let title = state.format_title();
    let last_updated = state.last_updated_text(now);
    let user = state.format_user();
    HeaderWidget::new(&title, last_updated.as_deref(), user.as_deref(), state.is_refreshing(), theme)
        .render(frame, chunks[0]);

    let visible_rows = match state.screen() {
        DashboardScreen::Loading => {
            render_message(frame, chunks[1], "Loading", vec![Line::styled(LOADING_TEXT, theme.muted)], theme);
            0
        }
        DashboardScreen::Error(message) => {
            let lines = vec![
                Line::styled(ERROR_TITLE, theme.error),
                Line::from(""),
                Line::styled(message, theme.primary),
                Line::from(""),
                Line::styled("Press r to refresh", theme.muted),
            ];
            render_message(frame, chunks[1], "Error", lines, theme);
            0
        }
        DashboardScreen::Empty => {
            render_message(frame, chunks[1], "Analytics", vec![Line::styled(EMPTY_TEXT, theme.muted)], theme);
            0
        }
        DashboardScreen::Content(snapshot) => render_content(frame, chunks[1], &snapshot, state, theme),
    };

    StatusWidget::new(theme).render(frame, chunks[2]);
    visible_rows
}
