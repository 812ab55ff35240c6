//! Session state for the calculator screen.
//!
//! Submissions run on a tokio runtime in the background. Their outcomes come
//! back over a channel and are applied in arrival order, so when several
//! requests overlap the last one to finish is what stays on screen.

use crate::client::{CalculationResult, ClientError, LoanClient};
use crate::explain::{explain, Explanation};
use crate::form::{Field, LoanForm, LoanRequest};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{error, info};

#[derive(Debug)]
pub struct CompletedRequest {
    pub id: u64,
    pub request: LoanRequest,
    pub outcome: Result<CalculationResult, ClientError>,
}

/// Last successful calculation and the text derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub loan_amount: f64,
    pub display: Explanation,
}

pub struct App {
    form: LoanForm,
    focus: Field,
    result: Option<Calculation>,
    next_request_id: u64,
    client: LoanClient,
    runtime: Handle,
    completed_tx: UnboundedSender<CompletedRequest>,
    completed_rx: UnboundedReceiver<CompletedRequest>,
}

impl App {
    pub fn new(client: LoanClient, runtime: Handle) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            form: LoanForm::new(),
            focus: Field::PropertyValue,
            result: None,
            next_request_id: 1,
            client,
            runtime,
            completed_tx,
            completed_rx,
        }
    }

    pub fn form(&self) -> &LoanForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut LoanForm {
        &mut self.form
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn result(&self) -> Option<&Calculation> {
        self.result.as_ref()
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let field = self.focus;
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Tab => self.focus = field.next(),
            KeyCode::Up | KeyCode::BackTab => self.focus = field.previous(),
            KeyCode::Enter => {
                self.submit();
            }
            KeyCode::Left if !field.is_currency() => self.form.cycle(field, false),
            KeyCode::Right if !field.is_currency() => self.form.cycle(field, true),
            KeyCode::Backspace => self.form.backspace(field),
            KeyCode::Char(c) if field.is_currency() => {
                let raw = format!("{}{}", self.form.raw_value(field), c);
                self.form.on_field_change(field, &raw);
            }
            _ => {}
        }
        false
    }

    /// Sends the current inputs to the calculation service without waiting.
    pub fn submit(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;

        let request = self.form.snapshot();
        info!(request_id = id, endpoint = self.client.endpoint(), "submitting calculation");

        let client = self.client.clone();
        let completed_tx = self.completed_tx.clone();
        self.runtime.spawn(async move {
            let outcome = client.calculate(&request).await;
            // The receiver only goes away when the app is shutting down.
            let _ = completed_tx.send(CompletedRequest {
                id,
                request,
                outcome,
            });
        });
        id
    }

    /// Applies every outcome that has arrived since the last call.
    pub fn poll_completed(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completed) = self.completed_rx.try_recv() {
            self.apply(completed);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, completed: CompletedRequest) {
        match completed.outcome {
            Ok(result) => {
                let display = explain(&completed.request, result.loan_amount);
                info!(
                    request_id = completed.id,
                    loan_amount = result.loan_amount,
                    "calculation received"
                );
                self.result = Some(Calculation {
                    loan_amount: result.loan_amount,
                    display,
                });
            }
            Err(err) => {
                error!(request_id = completed.id, error = %err, "error calculating loan");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::PropertyType;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use tokio::runtime::Runtime;

    fn app(runtime: &Runtime) -> App {
        App::new(LoanClient::new("http://127.0.0.1:9"), runtime.handle().clone())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn flip_request() -> LoanRequest {
        LoanRequest {
            arv: 350_000,
            fico_score: Some(705),
            property_type: PropertyType::FixAndFlip,
            ..LoanRequest::default()
        }
    }

    #[test]
    fn success_replaces_result_and_display() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);
        assert!(app.result().is_none());

        app.apply(CompletedRequest {
            id: 1,
            request: flip_request(),
            outcome: Ok(CalculationResult { loan_amount: 220_500.0 }),
        });

        let result = app.result().unwrap();
        assert_eq!(result.loan_amount, 220_500.0);
        assert_eq!(result.display.formula, "(0.7 * 350000) * 0.9 = 220500.00");
    }

    #[test]
    fn failure_keeps_previous_result() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);

        app.apply(CompletedRequest {
            id: 1,
            request: flip_request(),
            outcome: Err(ClientError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: String::new(),
            }),
        });
        assert!(app.result().is_none());

        app.apply(CompletedRequest {
            id: 2,
            request: flip_request(),
            outcome: Ok(CalculationResult { loan_amount: 220_500.0 }),
        });
        let before = app.result().cloned();

        app.apply(CompletedRequest {
            id: 3,
            request: LoanRequest::default(),
            outcome: Err(ClientError::MalformedResponse("missing field `loanAmount`".into())),
        });
        assert_eq!(app.result().cloned(), before);
    }

    #[test]
    fn last_arrival_wins() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);
        for (id, amount) in [(2, 10.0), (1, 20.0)] {
            app.apply(CompletedRequest {
                id,
                request: flip_request(),
                outcome: Ok(CalculationResult { loan_amount: amount }),
            });
        }
        assert_eq!(app.result().unwrap().loan_amount, 20.0);
    }

    #[test]
    fn typing_formats_focused_currency_field() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);
        for c in "12x3456".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(app.form().display_value(Field::PropertyValue), "123,456");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.form().display_value(Field::PropertyValue), "12,345");
    }

    #[test]
    fn arrows_move_focus_and_cycle_selectors() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.focus(), Field::FicoScore);

        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.form().fico_score(), Some(625));

        app.handle_key(key(KeyCode::Up));
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.focus(), Field::PropertyType);
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.form().property_type(), &PropertyType::Construction);
    }

    #[test]
    fn quit_keys() {
        let runtime = Runtime::new().unwrap();
        let mut app = app(&runtime);
        assert!(app.handle_key(key(KeyCode::Esc)));
        assert!(app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!app.handle_key(key(KeyCode::Char('7'))));
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert_eq!(app.form().display_value(Field::PropertyValue), "7");
    }
}
