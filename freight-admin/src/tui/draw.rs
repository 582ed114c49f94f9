// Rendering. Pure functions of the app state.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use super::app::{App, LocationPicker, Screen};
use super::form::{slot_value, FormState};
use crate::forms::FieldKind;
use crate::listing::StatusFilter;
use crate::notify::NoticeLevel;
use crate::utils::validation::{password_strength, PasswordStrength};

pub(crate) fn draw(f: &mut Frame<'_>, app: &App) {
    let window = centered_window(f.size(), 100, 30);
    f.render_widget(Block::default().borders(Borders::ALL).title("Freight Admin"), window);

    let inner = window.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(inner);

    draw_header(f, rows[0], app);
    match app.screen {
        Screen::Login => draw_login(f, rows[1], app),
        Screen::Otp => draw_otp(f, rows[1], app),
        Screen::Dashboard => draw_dashboard(f, rows[1], app),
        Screen::Bookings => draw_bookings(f, rows[1], app),
        Screen::Users => draw_users(f, rows[1], app),
        Screen::Wizard => {
            if let Some(state) = &app.form {
                draw_wizard(f, rows[1], state);
            }
        }
    }
    draw_notices(f, rows[2], app);
    f.render_widget(
        Paragraph::new(key_hints(app)).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );

    if let Some(picker) = &app.picker {
        draw_picker(f, window, picker);
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(60).min(area.width);
    let h = height.min(area.height.saturating_sub(2)).max(20).min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &App) {
    let title = match app.screen {
        Screen::Login => "Sign in".to_string(),
        Screen::Otp => "Verify your identity".to_string(),
        Screen::Dashboard => "Dashboard".to_string(),
        Screen::Bookings => "Bookings".to_string(),
        Screen::Users => "Users".to_string(),
        Screen::Wizard => app
            .form
            .as_ref()
            .map(|s| s.form.view().title().to_string())
            .unwrap_or_default(),
    };
    let who = app
        .session
        .as_ref()
        .map(|s| format!("{} ({})", s.display_name(), s.user.role))
        .unwrap_or_default();
    let busy = if app.busy { "  [working...]" } else { "" };
    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(busy),
        Span::raw("  "),
        Span::styled(who, Style::default().fg(Color::Cyan)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn key_hints(app: &App) -> &'static str {
    match app.screen {
        Screen::Login => "Tab switch field  Enter sign in  Esc quit",
        Screen::Otp => "Digits type  Backspace erase  Ctrl+Shift+V paste  Enter verify  F4 resend  Esc back",
        Screen::Dashboard => {
            "b bookings  u users  n new booking  s new shipment  w receive  a add staff  c add customer  r refresh  l sign out  q quit"
        }
        Screen::Bookings => "Type to search  Tab status  Left/Right page  Enter ship  F6 confirm  F5 refresh  Esc back",
        Screen::Users => "Type to search  Left/Right page  F6 (de)activate  F5 refresh  Esc back",
        Screen::Wizard if app.picker.is_some() => "Type to filter  Up/Down choose  Enter pick  Esc close",
        Screen::Wizard => "Tab/Up/Down field  Enter next/submit  Esc back  F2 add package  F3 remove package  F5 find place",
    }
}

fn input_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let marker = if focused { ">" } else { " " };
    let style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(format!("{} {:<24}", marker, label)),
        Span::styled(format!(" {} ", value), style),
    ])
}

fn draw_login(f: &mut Frame<'_>, area: Rect, app: &App) {
    let lines = vec![
        Line::from("Sign in with your staff account."),
        Line::from(""),
        input_line("Email", app.email.display(), app.login_focus == 0),
        input_line("Password", app.password.display(), app.login_focus == 1),
        Line::from(""),
        Line::from(button_text("Sign in", true, !app.busy)),
    ];
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_otp(f: &mut Frame<'_>, area: Rect, app: &App) {
    let mut boxes = Vec::new();
    for (i, slot) in app.otp.slots().iter().enumerate() {
        let style = if i == app.otp.focus() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        boxes.push(Span::styled(format!("[{}]", slot.unwrap_or(' ')), style));
        boxes.push(Span::raw(" "));
    }
    let expiry = if app.otp_expiry.is_elapsed() {
        "Code expired".to_string()
    } else {
        format!("Code expires in {}", app.otp_expiry.label())
    };
    let resend = if app.resend_cooldown.is_elapsed() {
        "Press F4 to resend the code".to_string()
    } else {
        format!("Resend available in {}", app.resend_cooldown.label())
    };
    let lines = vec![
        Line::from(format!("Enter the code sent to {}", app.otp_email)),
        Line::from(""),
        Line::from(boxes),
        Line::from(""),
        Line::from(expiry),
        Line::from(resend),
    ];
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn draw_dashboard(f: &mut Frame<'_>, area: Rect, app: &App) {
    let count = |filter: StatusFilter| app.bookings.iter().filter(|b| filter.matches(&b.status)).count();
    let greeting = app
        .session
        .as_ref()
        .map(|s| s.greeting())
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled(greeting, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(format!("Bookings      {}", app.bookings.len())),
        Line::from(format!("  pending     {}", count(StatusFilter::Pending))),
        Line::from(format!("  confirmed   {}", count(StatusFilter::Confirmed))),
        Line::from(format!("  in transit  {}", count(StatusFilter::InTransit))),
        Line::from(format!("  delivered   {}", count(StatusFilter::Delivered))),
        Line::from(format!("Shipments     {}", app.shipments.len())),
    ];
    if app.is_admin() {
        let active = app.users.iter().filter(|u| u.is_active).count();
        lines.push(Line::from(format!(
            "Users         {} ({} active)",
            app.users.len(),
            active
        )));
    }
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title("Overview")),
        area,
    );
}

fn list_block(title: String) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title)
}

fn draw_bookings(f: &mut Frame<'_>, area: Rect, app: &App) {
    let page = app.booking_page();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    f.render_widget(
        Paragraph::new(format!(
            "Search: {}   Status: {}   {}",
            app.list.search.display(),
            app.list.status.label(),
            page.summary()
        )),
        rows[0],
    );

    let items: Vec<ListItem> = page
        .items
        .iter()
        .map(|b| {
            ListItem::new(format!(
                "{:<12} {:<18} {:<20} -> {:<20} {}",
                b.booking_number,
                truncate(&b.customer.name, 18),
                truncate(&b.origin.short(), 20),
                truncate(&b.destination.short(), 20),
                b.status
            ))
        })
        .collect();
    let list = List::new(items)
        .block(list_block(format!("Page {} of {}", page.page, page.total_pages)))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected((!page.items.is_empty()).then_some(app.list.selected));
    f.render_stateful_widget(list, rows[1], &mut state);
}

fn draw_users(f: &mut Frame<'_>, area: Rect, app: &App) {
    let page = app.user_page();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);
    f.render_widget(
        Paragraph::new(format!("Search: {}   {}", app.list.search.display(), page.summary())),
        rows[0],
    );

    let items: Vec<ListItem> = page
        .items
        .iter()
        .map(|u| {
            let state = if u.is_active { "active" } else { "inactive" };
            ListItem::new(format!(
                "{:<24} {:<30} {:<10} {}",
                truncate(&u.full_name, 24),
                truncate(&u.email, 30),
                u.role,
                state
            ))
        })
        .collect();
    let list = List::new(items)
        .block(list_block(format!("Page {} of {}", page.page, page.total_pages)))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected((!page.items.is_empty()).then_some(app.list.selected));
    f.render_stateful_widget(list, rows[1], &mut state);
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

fn draw_wizard(f: &mut Frame<'_>, area: Rect, state: &FormState) {
    let view = state.form.view();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(0)])
        .split(area);

    let steps: Vec<Line> = view
        .steps()
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let (marker, style) = match i.cmp(&view.active_step()) {
                std::cmp::Ordering::Less => ("[x]", Style::default().fg(Color::Green)),
                std::cmp::Ordering::Equal => ("[>]", Style::default().add_modifier(Modifier::BOLD)),
                std::cmp::Ordering::Greater => ("[ ]", Style::default().fg(Color::DarkGray)),
            };
            Line::from(Span::styled(format!("{} {}", marker, step.title), style))
        })
        .collect();
    f.render_widget(
        Paragraph::new(Text::from(steps)).block(Block::default().borders(Borders::ALL).title("Steps")),
        cols[0],
    );

    let record = view.record();
    let errors = view.errors();
    let mut lines = Vec::new();
    for (i, slot) in state.slots().iter().enumerate() {
        let focused = i == state.focus;
        let value = if focused && slot.uses_editor() {
            state.editor.display()
        } else {
            slot_value(record, slot)
        };
        let value = match slot.kind {
            FieldKind::Choice(_) if value.is_empty() => "< choose >".to_string(),
            FieldKind::Choice(_) => format!("< {} >", value),
            _ => value,
        };
        lines.push(input_line(&slot.label, value, focused));
        if let Some(message) = errors.get(&slot.path) {
            lines.push(Line::from(Span::styled(
                format!("    {}", message),
                Style::default().fg(Color::Red),
            )));
        }
        if focused && slot.kind == FieldKind::Secret && !state.editor.value.is_empty() {
            let strength = password_strength(&state.editor.value);
            let color = match strength {
                PasswordStrength::Weak => Color::Red,
                PasswordStrength::Fair => Color::Yellow,
                PasswordStrength::Good | PasswordStrength::Strong => Color::Green,
            };
            lines.push(Line::from(Span::styled(
                format!("    Strength: {}", strength.as_str()),
                Style::default().fg(color),
            )));
        }
    }
    // List-level errors ("Add at least one package") have no slot of their own.
    for (path, message) in errors.iter() {
        if !path.contains('.') && !state.slots().iter().any(|s| s.path == path) {
            lines.push(Line::from(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Red),
            )));
        }
    }

    let step = &view.steps()[view.active_step()];
    let title = format!(
        "Step {} of {}: {}",
        view.active_step() + 1,
        view.steps().len(),
        step.title
    );
    let body_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(cols[1]);

    // Keep the focused field on screen.
    let visible = body_rows[0].height.saturating_sub(2) as usize;
    let focus_line = lines_before_focus(state);
    let scroll = focus_line.saturating_sub(visible.saturating_sub(2)) as u16;
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((scroll, 0))
            .wrap(Wrap { trim: false }),
        body_rows[0],
    );

    let next = if view.is_last_step() { "Submit" } else { "Next" };
    let buttons = Line::from(vec![
        button_text("Back", false, view.active_step() > 0),
        Span::raw(" "),
        button_text(next, true, true),
    ]);
    f.render_widget(Paragraph::new(buttons).alignment(Alignment::Right), body_rows[1]);
}

fn lines_before_focus(state: &FormState) -> usize {
    let errors = state.form.view().errors();
    state
        .slots()
        .iter()
        .take(state.focus)
        .map(|s| 1 + usize::from(errors.contains(&s.path)))
        .sum()
}

fn draw_notices(f: &mut Frame<'_>, area: Rect, app: &App) {
    let notices: Vec<_> = app.notices.iter().collect();
    let lines: Vec<Line> = notices
        .into_iter()
        .rev()
        .take(area.height as usize)
        .map(|n| {
            let color = match n.level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => Color::Red,
                NoticeLevel::Info => Color::Cyan,
            };
            Line::from(Span::styled(n.message.clone(), Style::default().fg(color)))
        })
        .collect();
    f.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn draw_picker(f: &mut Frame<'_>, window: Rect, picker: &LocationPicker) {
    let w = 56u16.min(window.width.saturating_sub(4)).max(30);
    let h = 14u16.min(window.height.saturating_sub(4)).max(7);
    let area = Rect {
        x: window.x + window.width.saturating_sub(w) / 2,
        y: window.y + window.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    };
    f.render_widget(Clear, area);

    let title = format!("Find place: {}", picker.filter.display());
    let block = Block::default().borders(Borders::ALL).title(title);
    if picker.loading {
        f.render_widget(Paragraph::new("Loading...").block(block), area);
        return;
    }
    let items: Vec<ListItem> = picker
        .visible()
        .iter()
        .map(|o| ListItem::new(o.label.clone()))
        .collect();
    let empty = items.is_empty();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected((!empty).then_some(picker.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}
