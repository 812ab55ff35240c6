use crate::app::{App, Calculation};
use crate::explain::{calculation_notes, format_loan_amount, FICO_BANDS};
use crate::form::Field;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const LABEL_WIDTH: usize = 26;
const MARGIN: u16 = 2;

pub fn draw(f: &mut Frame, app: &App) {
    // Inside the outer margin and the panel borders.
    let inner_width = f.size().width.saturating_sub(2 * MARGIN + 2);
    let result_height = app
        .result()
        .map_or(0, |result| result_rows(result, inner_width) + 2);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(MARGIN)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(Field::ALL.len() as u16 + 2),
                Constraint::Length(result_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new("Loan Calculator")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    render_form(f, app, chunks[1]);
    if app.result().is_some() {
        render_result(f, app, chunks[2]);
    }
    render_notes(f, chunks[3]);

    let help = Paragraph::new(
        "↑/↓ or Tab: move | digits/Backspace: edit | ←/→: change selection | Enter: calculate | Esc/Ctrl-C: quit",
    )
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[4]);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let focused = field == app.focus();
            let marker = if focused { "▶ " } else { "  " };
            let label = format!(
                "{marker}{:<width$}",
                format!("{}:", field.label()),
                width = LABEL_WIDTH
            );

            let value = app.form().display_value(field);
            let value = if field.is_currency() {
                if value.is_empty() {
                    Span::styled(field.placeholder(), Style::default().fg(Color::DarkGray))
                } else {
                    Span::raw(format!("${value}"))
                }
            } else if focused {
                Span::raw(format!("◀ {value} ▶"))
            } else {
                Span::raw(value)
            };

            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![Span::raw(label), value]).style(style)
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Loan Application"),
    );
    f.render_widget(form, area);
}

const AMOUNT_LABEL: &str = "Estimated Loan Amount: ";
const FORMULA_LABEL: &str = "Calculation Formula: ";
const EXPLANATION_LABEL: &str = "Explanation: ";

/// Rows the result text takes once word-wrapped to `width` columns.
fn result_rows(result: &Calculation, width: u16) -> u16 {
    let amount = format!("{AMOUNT_LABEL}${}", format_loan_amount(result.loan_amount));
    let formula = format!("{FORMULA_LABEL}{}", result.display.formula);
    let explanation = format!("{EXPLANATION_LABEL}{}", result.display.explanation);
    [amount.as_str(), "", formula.as_str(), explanation.as_str()]
        .iter()
        .map(|line| wrapped_rows(line, width as usize))
        .sum()
}

fn wrapped_rows(text: &str, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }
    let mut rows = 1;
    let mut used = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if used > 0 && used + 1 + len <= width {
            used += 1 + len;
            continue;
        }
        if used > 0 {
            rows += 1;
        }
        // Words longer than the panel are broken across rows.
        rows += (len - 1) / width;
        used = (len - 1) % width + 1;
    }
    rows as u16
}

fn render_result(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.result() else {
        return;
    };
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let text = vec![
        Line::from(vec![
            Span::styled(AMOUNT_LABEL, bold),
            Span::styled(
                format!("${}", format_loan_amount(result.loan_amount)),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(FORMULA_LABEL, bold),
            Span::raw(result.display.formula.as_str()),
        ]),
        Line::from(vec![
            Span::styled(EXPLANATION_LABEL, bold),
            Span::raw(result.display.explanation.as_str()),
        ]),
    ];

    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Result"));
    f.render_widget(widget, area);
}

fn render_notes(f: &mut Frame, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut text = Vec::new();

    for note in calculation_notes() {
        text.push(Line::from(vec![
            Span::styled(format!("{}: ", note.title), bold),
            Span::styled(note.formula, Style::default().fg(Color::Cyan)),
        ]));
        text.push(Line::from(format!("  Uses {}", note.uses)));
        text.push(Line::from(vec![
            Span::styled("  Ignores: ", Style::default().fg(Color::DarkGray)),
            Span::styled(note.ignores, Style::default().fg(Color::DarkGray)),
        ]));
    }

    text.push(Line::from(""));
    text.push(Line::from(Span::styled("FICO Score Multiplier:", bold)));
    for band in FICO_BANDS.iter() {
        text.push(Line::from(format!(
            "  {} ({}-{}): {:.1}",
            band.label, band.min, band.max, band.multiplier
        )));
    }

    let notes = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Calculation Notes"));
    f.render_widget(notes, area);
}
