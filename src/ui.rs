//! TUI rendering for the flight search
//!
//! This module draws the search form, the autocomplete popup, the results
//! table with its expanded detail panel, and the key help line using the
//! `ratatui` crate.

use crate::app::{App, Focus};
use crate::duration::{arrives_next_day, clock_time, parse_timestamp};
use crate::form::AirportField;
use crate::models::{Itinerary, Leg, TripType};
use crate::pipeline::PageView;
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
};

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const ROW_HEIGHT: u16 = 2;

/// Renders one frame of the TUI based on current application state.
///
/// The screen is split into the search form, the results area and a one-line
/// key help footer. The autocomplete popup is drawn last so it sits over the
/// results.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_form(f, app, chunks[0]);
    render_results(f, app, chunks[1]);
    render_help(f, app, chunks[2]);
    render_suggestions(f, app, chunks[0]);
}

fn field_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default()
            .fg(Color::Cyan)
            .bg(Color::Rgb(30, 30, 60))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().add_modifier(Modifier::BOLD))
}

/// Search form: trip type, origin/destination with selection marks, dates.
fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.form;
    let radio = |t: TripType| if form.trip_type == t { "(•)" } else { "( )" };

    let airport_spans = |field: AirportField, focus: Focus| {
        let input = form.airport(field);
        let mark = if input.selected.is_some() {
            Span::styled(" ✓", Style::default().fg(Color::Green))
        } else if input.loading {
            Span::styled(
                format!(" {}", SPINNER[app.tick_count % SPINNER.len()]),
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::raw("")
        };
        vec![
            Span::styled(format!(" {:<28}", input.text), field_style(app, focus)),
            mark,
        ]
    };

    let mut lines = vec![
        Line::from(vec![
            label("Trip:        "),
            Span::styled(
                format!(
                    " {} {}  {} {} ",
                    radio(TripType::Oneway),
                    TripType::Oneway,
                    radio(TripType::Roundtrip),
                    TripType::Roundtrip
                ),
                field_style(app, Focus::TripType),
            ),
        ]),
        Line::from(
            [
                vec![label("Origin:      ")],
                airport_spans(AirportField::Origin, Focus::Origin),
            ]
            .concat(),
        ),
        Line::from(
            [
                vec![label("Destination: ")],
                airport_spans(AirportField::Destination, Focus::Destination),
            ]
            .concat(),
        ),
    ];

    let mut dates = vec![
        label("Departure:   "),
        Span::styled(
            format!(" {:<12}", form.departure_date),
            field_style(app, Focus::DepartureDate),
        ),
    ];
    if form.trip_type == TripType::Roundtrip {
        dates.push(Span::raw("   "));
        dates.push(label("Return: "));
        dates.push(Span::styled(
            format!(" {:<12}", form.return_date),
            field_style(app, Focus::ReturnDate),
        ));
    }
    lines.push(Line::from(dates));

    let block = Block::default()
        .title(" Flight Search ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Autocomplete popup under the focused airport field.
fn render_suggestions(f: &mut Frame, app: &App, form_area: Rect) {
    let field = match app.focus {
        Focus::Origin => AirportField::Origin,
        Focus::Destination => AirportField::Destination,
        _ => return,
    };
    let input = app.form.airport(field);
    if input.selected.is_some() || input.options.is_empty() {
        return;
    }

    let row_offset = match field {
        AirportField::Origin => 3,
        AirportField::Destination => 4,
    };
    let height = (input.options.len() as u16 + 2).min(10);
    let area = Rect {
        x: form_area.x + 15,
        y: form_area.y + row_offset,
        width: 60,
        height,
    }
    .intersection(f.size());

    let items: Vec<ListItem> = input
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = if i == app.suggestion_index {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {}", option.label), style),
                Span::styled(
                    format!("  {}", option.sky_id),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        List::new(items).block(Block::bordered().title(" Airports ")),
        area,
    );
}

fn render_results(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();

    if view.loading {
        let msg = format!(" ✈ {} Searching flights...", SPINNER[app.tick_count % SPINNER.len()]);
        render_centered(f, area, &msg, Style::default().fg(Color::Cyan));
        return;
    }
    if let Some(error) = view.error {
        render_centered(f, area, error, Style::default().fg(Color::Red));
        return;
    }
    if view.items.is_empty() {
        render_centered(f, area, "No flights to show", Style::default().fg(Color::Red));
        return;
    }

    let expanded = view.expanded_index.and_then(|i| view.items.get(i).copied());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(view.items.len() as u16 * ROW_HEIGHT + 5),
            Constraint::Min(0),
        ])
        .split(area);

    render_table(f, app, &view, chunks[0]);
    if let Some(itinerary) = expanded {
        render_details(f, itinerary, chunks[1]);
    }
}

fn render_centered(f: &mut Frame, area: Rect, text: &str, style: Style) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(area.height / 2), Constraint::Min(0)])
        .split(area);
    f.render_widget(
        Paragraph::new(text.to_string())
            .style(style)
            .alignment(Alignment::Center),
        chunks[1],
    );
}

/// Departure–arrival clock times, with `+1` when the flight lands the next day.
pub fn leg_times(leg: &Leg) -> String {
    let dep = leg.departure.as_deref().and_then(parse_timestamp);
    let arr = leg.arrival.as_deref().and_then(parse_timestamp);
    match (dep, arr) {
        (Some(dep), Some(arr)) => format!(
            "{} – {}{}",
            clock_time(dep),
            clock_time(arr),
            if arrives_next_day(dep, arr) { " +1" } else { "" }
        ),
        _ => "N/A".to_string(),
    }
}

fn place_id(place: Option<&crate::models::Place>) -> &str {
    place
        .map(|p| p.id.as_str())
        .filter(|id| !id.is_empty())
        .unwrap_or("N/A")
}

fn itinerary_row<'a>(itinerary: &'a Itinerary, expanded: bool) -> Row<'a> {
    let empty = Leg::default();
    let leg = itinerary.first_leg().unwrap_or(&empty);

    let carrier = leg
        .carriers
        .marketing
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "N/A".to_string());
    let marker = if expanded { "▾ " } else { "▸ " };

    let airline = Text::from(vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(leg_times(leg), Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(Span::styled(
            format!("  {}", carrier),
            Style::default().fg(get_operator_color(&carrier)),
        )),
    ]);
    let duration = Text::from(vec![
        Line::from(leg.duration_label().unwrap_or_else(|| "N/A".to_string())),
        Line::from(Span::styled(
            format!(
                "{} – {}",
                place_id(leg.origin.as_ref()),
                place_id(leg.destination.as_ref())
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    let price = itinerary
        .price
        .formatted
        .clone()
        .unwrap_or_else(|| "N/A".to_string());

    Row::new(vec![
        Cell::from(airline),
        Cell::from(duration),
        Cell::from(leg.stops_label()),
        Cell::from(Span::styled(
            price,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ])
    .height(ROW_HEIGHT)
}

fn render_table(f: &mut Frame, app: &App, view: &PageView, area: Rect) {
    let rows: Vec<Row> = view
        .items
        .iter()
        .enumerate()
        .map(|(i, it)| itinerary_row(it, view.expanded_index == Some(i)))
        .collect();

    let header = Row::new(vec!["Airline", "Duration", "Stops", "Price"])
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Gray))
        .bottom_margin(1);

    let title = format!(
        " All Flights │ {} results │ sort: {} │ page {}/{} ",
        view.total_results,
        view.sort_key.label(),
        view.current_page,
        view.total_pages.max(1)
    );

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .title(
                Title::from(" Prices include required taxes + fees for 1 adult. ")
                    .position(Position::Bottom),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    )
    .highlight_style(Style::default().bg(Color::Rgb(30, 30, 60)));

    let mut state = TableState::default();
    if app.focus == Focus::Results {
        state.select(Some(app.cursor_row));
    }
    f.render_stateful_widget(table, area, &mut state);
}

/// Detail panel for the expanded itinerary: segments and marketing carriers.
fn render_details(f: &mut Frame, itinerary: &Itinerary, area: Rect) {
    let mut lines = Vec::new();

    for (n, leg) in itinerary.legs.iter().enumerate() {
        lines.push(Line::from(vec![
            label(if n == 0 { "Outbound: " } else { "Leg:      " }),
            Span::raw(format!(
                "{} → {}  {}",
                place_id(leg.origin.as_ref()),
                place_id(leg.destination.as_ref()),
                leg_times(leg)
            )),
        ]));
        for segment in &leg.segments {
            let flight = segment
                .flight_number
                .as_deref()
                .map(|num| format!("  #{}", num))
                .unwrap_or_default();
            lines.push(Line::from(format!(
                "   {} ({}) → {} ({}){}",
                segment.origin.name,
                segment.origin.kind,
                segment.destination.name,
                segment.destination.kind,
                flight
            )));
        }
        for carrier in &leg.carriers.marketing {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled(
                    carrier.name.clone(),
                    Style::default().fg(get_operator_color(&carrier.name)),
                ),
                Span::styled(
                    format!("  {}", carrier.logo_url.as_deref().unwrap_or("")),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(" Itinerary Details ")
                .borders(Borders::ALL)
                .padding(Padding::new(1, 1, 0, 0)),
        );
    f.render_widget(p, area);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.focus {
        Focus::TripType => " Space toggle trip   Enter search   Tab next field   Esc quit",
        Focus::Origin | Focus::Destination => {
            " type to search airports   ↑/↓ pick   Enter select/search   Tab next   Esc quit"
        }
        Focus::DepartureDate | Focus::ReturnDate => {
            " YYYY-MM-DD   Enter search   Tab next field   Esc quit"
        }
        Focus::Results => " ↑/↓ move   Enter expand   ←/→ page   s sort   Tab form   q quit",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Returns a color associated with the airline name for brand-style display.
///
/// Matches common US airlines by substring (case-insensitive). Unknown
/// carriers return [`Color::White`].
fn get_operator_color(operator: &str) -> Color {
    let op = operator.to_lowercase();
    if op.contains("united") {
        Color::Blue
    } else if op.contains("southwest") {
        Color::Yellow
    } else if op.contains("delta") {
        Color::Rgb(180, 20, 40)
    } else if op.contains("american") {
        Color::Cyan
    } else if op.contains("alaska") {
        Color::Rgb(0, 66, 110)
    } else if op.contains("jetblue") {
        Color::Rgb(0, 80, 160)
    } else {
        Color::White
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Carrier, Carriers, Place, Price};
    use ratatui::backend::TestBackend;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn itinerary() -> Itinerary {
        Itinerary {
            id: "x".into(),
            price: Price {
                raw: Some(180.0),
                formatted: Some("$180".into()),
            },
            legs: vec![Leg {
                origin: Some(Place { id: "JFK".into(), ..Place::default() }),
                destination: Some(Place { id: "LAX".into(), ..Place::default() }),
                departure: Some("2024-06-01T22:50:00".into()),
                arrival: Some("2024-06-02T01:55:00".into()),
                stop_count: 1,
                carriers: Carriers {
                    marketing: vec![Carrier {
                        name: "Delta".into(),
                        logo_url: Some("https://logos/DL.png".into()),
                    }],
                },
                ..Leg::default()
            }],
        }
    }

    #[test]
    fn leg_times_marks_next_day() {
        assert_eq!(leg_times(&itinerary().legs[0]), "10:50 PM – 1:55 AM +1");
        assert_eq!(leg_times(&Leg::default()), "N/A");
    }

    #[test]
    fn empty_state_message() {
        let app = App::new(None);
        assert!(screen(&app).contains("No flights to show"));
    }

    #[test]
    fn error_replaces_table() {
        let mut app = App::new(None);
        app.store.set_error(Some("Invalid market".into()));
        assert!(screen(&app).contains("Invalid market"));
    }

    #[test]
    fn rows_and_details_render() {
        let mut app = App::new(None);
        app.store.set_results(vec![itinerary()]);
        app.pipeline.sync(&app.store);
        app.toggle_expand(0);

        let text = screen(&app);
        assert!(text.contains("3 hr 5 min"));
        assert!(text.contains("JFK – LAX"));
        assert!(text.contains("1 stop(s)"));
        assert!(text.contains("$180"));
        assert!(text.contains("https://logos/DL.png"));
    }
}
