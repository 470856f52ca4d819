use crate::error::SearchError;
use crate::form::{AirportField, FormField, LookupTicket, SearchForm};
use crate::models::{AirportOption, Itinerary, SearchQuery, TripType};
use crate::pipeline::{PageView, ResultPipeline, SortKey};
use crate::storage::Storage;
use crate::store::SearchStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Work the main loop has to start on the app's behalf.
#[derive(Debug, PartialEq)]
pub enum Action {
    Search(SearchQuery),
    Lookup(LookupTicket),
}

// Which widget receives key presses
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum Focus {
    TripType,
    #[default]
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Results,
}

#[derive(Default)]
pub struct App {
    pub form: SearchForm,
    pub store: SearchStore,
    pub pipeline: ResultPipeline,
    pub focus: Focus,
    pub suggestion_index: usize,
    pub cursor_row: usize,
    pub tick_count: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(storage: Option<Storage>) -> Self {
        let (form, store) = match storage {
            Some(storage) => (
                SearchForm::restore(storage.clone()),
                SearchStore::with_storage(storage),
            ),
            None => (SearchForm::new(), SearchStore::new()),
        };

        let mut app = Self {
            form,
            store,
            ..Self::default()
        };
        app.pipeline.sync(&app.store);
        app
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn view(&self) -> PageView<'_> {
        self.pipeline.view(&self.store)
    }

    // Presentation events

    pub fn submit_search(&mut self) -> Option<Action> {
        self.form.begin_search(&mut self.store).map(Action::Search)
    }

    pub fn change_sort(&mut self, key: SortKey) {
        self.pipeline.change_sort(key);
    }

    pub fn change_page(&mut self, page: usize) {
        self.pipeline.change_page(&self.store, page);
        self.cursor_row = 0;
    }

    pub fn toggle_expand(&mut self, row: usize) {
        self.pipeline.toggle_expand(&self.store, row);
    }

    pub fn update_field(&mut self, field: FormField, value: String) -> Option<Action> {
        if matches!(field, FormField::Origin | FormField::Destination) {
            self.suggestion_index = 0;
        }
        self.form.update_field(field, value).map(Action::Lookup)
    }

    // Completions from request tasks

    pub fn on_search_finished(&mut self, result: Result<Vec<Itinerary>, SearchError>) {
        self.form.finish_search(&mut self.store, result);
        self.pipeline.sync(&self.store);
        self.cursor_row = 0;
        if !self.store.results().is_empty() {
            self.focus = Focus::Results;
        }
    }

    pub fn on_airports_loaded(
        &mut self,
        ticket: LookupTicket,
        result: Result<Vec<AirportOption>, SearchError>,
    ) {
        if self.form.finish_lookup(&ticket, result) {
            self.suggestion_index = 0;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(true);
                return None;
            }
            KeyCode::BackTab => {
                self.cycle_focus(false);
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::TripType => self.handle_trip_type_key(key),
            Focus::Origin => self.handle_airport_key(AirportField::Origin, key),
            Focus::Destination => self.handle_airport_key(AirportField::Destination, key),
            Focus::DepartureDate => self.handle_date_key(FormField::DepartureDate, key),
            Focus::ReturnDate => self.handle_date_key(FormField::ReturnDate, key),
            Focus::Results => {
                self.handle_results_key(key);
                None
            }
        }
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::TripType, Focus::Origin, Focus::Destination, Focus::DepartureDate];
        if self.form.trip_type == TripType::Roundtrip {
            order.push(Focus::ReturnDate);
        }
        order.push(Focus::Results);
        order
    }

    fn cycle_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % order.len()
        } else {
            pos.checked_sub(1).unwrap_or(order.len() - 1)
        };
        self.focus = order[next];
        self.suggestion_index = 0;
    }

    fn handle_trip_type_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                let toggled = self.form.trip_type.toggled();
                self.form.set_trip_type(toggled);
                None
            }
            KeyCode::Enter => self.submit_search(),
            _ => None,
        }
    }

    fn handle_airport_key(&mut self, field: AirportField, key: KeyEvent) -> Option<Action> {
        let form_field = match field {
            AirportField::Origin => FormField::Origin,
            AirportField::Destination => FormField::Destination,
        };
        let input = self.form.airport(field);

        match key.code {
            KeyCode::Char(c) => {
                let mut text = input.text.clone();
                text.push(c);
                self.update_field(form_field, text)
            }
            KeyCode::Backspace => {
                let mut text = input.text.clone();
                text.pop();
                self.update_field(form_field, text)
            }
            KeyCode::Down => {
                if !input.options.is_empty() {
                    self.suggestion_index = (self.suggestion_index + 1) % input.options.len();
                }
                None
            }
            KeyCode::Up => {
                if !input.options.is_empty() {
                    self.suggestion_index = self
                        .suggestion_index
                        .checked_sub(1)
                        .unwrap_or(input.options.len() - 1);
                }
                None
            }
            KeyCode::Enter => {
                if input.selected.is_none() {
                    if let Some(option) = input.options.get(self.suggestion_index).cloned() {
                        self.form.select_airport(field, option);
                        self.suggestion_index = 0;
                        self.cycle_focus(true);
                        return None;
                    }
                }
                self.submit_search()
            }
            _ => None,
        }
    }

    fn handle_date_key(&mut self, field: FormField, key: KeyEvent) -> Option<Action> {
        let current = match field {
            FormField::ReturnDate => &self.form.return_date,
            _ => &self.form.departure_date,
        };

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                let mut text = current.clone();
                text.push(c);
                self.update_field(field, text)
            }
            KeyCode::Backspace => {
                let mut text = current.clone();
                text.pop();
                self.update_field(field, text)
            }
            KeyCode::Enter => self.submit_search(),
            _ => None,
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        let rows = self.view().items.len();
        let page = self.pipeline.current_page();

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => {
                if rows > 0 {
                    self.cursor_row = (self.cursor_row + 1) % rows;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if rows > 0 {
                    self.cursor_row = self.cursor_row.checked_sub(1).unwrap_or(rows - 1);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_expand(self.cursor_row),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown => self.change_page(page + 1),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp => {
                self.change_page(page.saturating_sub(1))
            }
            KeyCode::Char('s') => self.change_sort(self.pipeline.sort_key().next()),
            _ => {}
        }
    }
}
