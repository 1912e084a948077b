//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::MachineState;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_machine(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw disassembly view around the instruction pointer.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(listing, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(&listing.addr) { "●" } else { " " };
            let text = format!("{}{}", prefix, listing);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(&listing.addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw machine state.
fn draw_machine(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = &app.machine;
    let result = machine
        .memory()
        .first()
        .map_or_else(|| "-".to_string(), |v| v.to_string());
    let pending: Vec<String> = app.input.iter().map(|v| v.to_string()).collect();
    let emitted: Vec<String> = app.output.iter().map(|v| v.to_string()).collect();

    let content = vec![
        Line::from(vec![
            Span::raw("IP: "),
            Span::styled(format!("{:>6}", machine.ip), Style::default().fg(Color::Yellow)),
            Span::raw("   Size: "),
            Span::styled(format!("{}", machine.mem.len()), Style::default().fg(Color::White)),
            Span::raw("   [0]: "),
            Span::styled(result, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Input:  "),
            Span::styled(pending.join(", "), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Output: "),
            Span::styled(emitted.join(", "), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", machine.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   State: "),
            Span::styled(format!("{:?}", machine.state), state_style(machine.state)),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Machine ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app.machine.mem
        .dump(app.mem_scroll, visible_rows)
        .into_iter()
        .map(|(addr, value)| {
            let is_ip = addr == app.machine.ip;
            let text = format!("{:5}: {}", addr, value);

            let style = if is_ip {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn state_style(state: MachineState) -> Style {
    match state {
        MachineState::Running => Style::default().fg(Color::Green),
        MachineState::Halted | MachineState::EndOfMemory => Style::default().fg(Color::Blue),
        MachineState::Faulted => Style::default().fg(Color::Red),
    }
}
