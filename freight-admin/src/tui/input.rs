// Key and paste handling. Handlers mutate the app and return the effects the
// event loop should start; they never touch the network themselves.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Effect, FormKind, LocationLookup, LocationPicker, Screen};
use super::form::{cycle_choice, ActiveForm, FormState, TextInput};
use crate::forms::otp::OTP_LENGTH;
use crate::forms::packages::PACKAGES;
use crate::forms::shipment::prefill_from_booking;
use crate::forms::{FieldKind, FieldValue, FormError, StepOutcome, SubmitError};
use crate::listing::{confirmed_bookings, StatusFilter};
use crate::notify::{Notice, NoticeQueue};
use crate::utils::validation::is_valid_email;

pub(crate) fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Effect> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit = true;
        return Vec::new();
    }
    match app.screen {
        Screen::Login => login_key(app, key.code),
        Screen::Otp => otp_key(app, key.code),
        Screen::Dashboard => dashboard_key(app, key.code),
        Screen::Bookings => bookings_key(app, key.code),
        Screen::Users => users_key(app, key.code),
        Screen::Wizard => match app.picker {
            Some(_) => picker_key(app, key.code),
            None => wizard_key(app, key.code),
        },
    }
}

/// Bracketed paste. The code screen takes the whole clipboard at once.
pub(crate) fn handle_paste(app: &mut App, text: &str) -> Vec<Effect> {
    match app.screen {
        Screen::Otp => {
            if !app.otp.paste(text) {
                app.notices
                    .push(Notice::error(format!("Paste a {}-digit code", OTP_LENGTH)));
            }
        }
        Screen::Login => focused_login_input(app).insert_str(text.trim()),
        Screen::Bookings | Screen::Users => {
            app.list.search.insert_str(text.trim());
            app.list.page = 1;
        }
        Screen::Wizard => {
            if let Some(picker) = app.picker.as_mut() {
                picker.filter.insert_str(text.trim());
                picker.selected = 0;
            } else if let Some(state) = app.form.as_mut() {
                if state.focused_slot().is_some_and(|s| s.uses_editor()) {
                    state.editor.insert_str(text.trim());
                }
            }
        }
        Screen::Dashboard => {}
    }
    Vec::new()
}

fn focused_login_input(app: &mut App) -> &mut TextInput {
    if app.login_focus == 0 {
        &mut app.email
    } else {
        &mut app.password
    }
}

fn login_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    match code {
        KeyCode::Esc => app.quit = true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => app.login_focus = 1 - app.login_focus.min(1),
        KeyCode::Enter if !app.busy => {
            let email = app.email.value.trim().to_string();
            if !is_valid_email(&email) {
                app.notices.push(Notice::error("Enter a valid email address"));
                app.login_focus = 0;
            } else if app.password.value.is_empty() {
                app.notices.push(Notice::error("Enter your password"));
                app.login_focus = 1;
            } else {
                app.busy = true;
                return vec![Effect::Login {
                    email,
                    password: app.password.value.clone(),
                }];
            }
        }
        other => {
            focused_login_input(app).handle_key(other);
        }
    }
    Vec::new()
}

fn otp_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    match code {
        KeyCode::Esc => app.goto(Screen::Login),
        KeyCode::Char(c) => app.otp.input(c),
        KeyCode::Backspace => app.otp.backspace(),
        KeyCode::Left => app.otp.set_focus(app.otp.focus().saturating_sub(1)),
        KeyCode::Right => app.otp.set_focus(app.otp.focus() + 1),
        KeyCode::F(4) => {
            if app.resend_cooldown.is_elapsed() && !app.busy {
                app.busy = true;
                return vec![Effect::ResendOtp {
                    email: app.otp_email.clone(),
                }];
            }
            app.notices.push(Notice::info(format!(
                "You can request a new code in {}",
                app.resend_cooldown.label()
            )));
        }
        KeyCode::Enter if !app.busy => {
            if app.otp_expiry.is_elapsed() {
                app.notices
                    .push(Notice::error("The code has expired. Press F4 to get a new one."));
            } else if let Some(code) = app.otp.code() {
                app.busy = true;
                return vec![Effect::VerifyOtp {
                    email: app.otp_email.clone(),
                    code,
                }];
            } else {
                app.notices
                    .push(Notice::error(format!("Enter all {} digits", OTP_LENGTH)));
            }
        }
        _ => {}
    }
    Vec::new()
}

fn dashboard_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('b') => app.goto(Screen::Bookings),
        KeyCode::Char('u') if app.is_admin() => app.goto(Screen::Users),
        KeyCode::Char('n') => return app.open_form(FormKind::Booking),
        KeyCode::Char('s') => return app.open_form(FormKind::Shipment),
        KeyCode::Char('w') => return app.open_form(FormKind::Receive),
        KeyCode::Char('a') if app.is_admin() => return app.open_form(FormKind::Staff),
        KeyCode::Char('c') => return app.open_form(FormKind::Customer),
        KeyCode::Char('r') | KeyCode::F(5) => return vec![Effect::LoadData],
        KeyCode::Char('l') => return app.sign_out(),
        _ => {}
    }
    Vec::new()
}

fn list_navigation(app: &mut App, code: KeyCode, page_len: usize, total_pages: usize) -> bool {
    match code {
        KeyCode::Up => app.list.selected = app.list.selected.saturating_sub(1),
        KeyCode::Down => app.list.selected = (app.list.selected + 1).min(page_len.saturating_sub(1)),
        KeyCode::PageUp | KeyCode::Left => {
            app.list.page = app.list.page.saturating_sub(1).max(1);
            app.list.selected = 0;
        }
        KeyCode::PageDown | KeyCode::Right => {
            app.list.page = (app.list.page + 1).min(total_pages);
            app.list.selected = 0;
        }
        KeyCode::Char(_) | KeyCode::Backspace | KeyCode::Delete => {
            app.list.search.handle_key(code);
            app.list.page = 1;
            app.list.selected = 0;
        }
        _ => return false,
    }
    true
}

fn bookings_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    let page = app.booking_page();
    if list_navigation(app, code, page.items.len(), page.total_pages) {
        return Vec::new();
    }
    let selected = page.items.get(app.list.selected);
    match code {
        KeyCode::Esc => app.goto(Screen::Dashboard),
        KeyCode::Tab => {
            app.list.status = app.list.status.next();
            app.list.page = 1;
            app.list.selected = 0;
        }
        KeyCode::F(5) => return vec![Effect::LoadData],
        KeyCode::F(6) => {
            if let Some(booking) = selected.filter(|b| StatusFilter::Pending.matches(&b.status)) {
                app.busy = true;
                return vec![Effect::SetBookingStatus {
                    id: booking.id.clone(),
                    status: "confirmed".to_string(),
                }];
            }
            app.notices.push(Notice::info("Only pending bookings can be confirmed"));
        }
        KeyCode::Enter => match selected {
            Some(booking) if StatusFilter::Confirmed.matches(&booking.status) => {
                let booking = booking.clone();
                app.open_shipment_for(&booking);
            }
            Some(_) => app
                .notices
                .push(Notice::info("Only confirmed bookings can be shipped")),
            None => {}
        },
        _ => {}
    }
    Vec::new()
}

fn users_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    let page = app.user_page();
    if list_navigation(app, code, page.items.len(), page.total_pages) {
        return Vec::new();
    }
    match code {
        KeyCode::Esc => app.goto(Screen::Dashboard),
        KeyCode::F(5) => return vec![Effect::LoadData],
        KeyCode::F(6) => {
            if let Some(user) = page.items.get(app.list.selected) {
                app.busy = true;
                return vec![Effect::SetUserActive {
                    id: user.id.clone(),
                    active: !user.is_active,
                }];
            }
        }
        _ => {}
    }
    Vec::new()
}

fn report(notices: &mut NoticeQueue, result: Result<(), FormError>) {
    if let Err(e) = result {
        notices.push(Notice::error(e.to_string()));
    }
}

fn wizard_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    let Some(state) = app.form.as_mut() else {
        return Vec::new();
    };
    let slot = state.focused_slot();

    match code {
        KeyCode::Enter if !app.busy => {
            report(&mut app.notices, state.commit_editor());
            if state.form.view().is_last_step() {
                match state.form.submit() {
                    Ok(request) => {
                        app.busy = true;
                        return vec![Effect::Submit(request)];
                    }
                    Err(SubmitError::Invalid { .. }) => {
                        state.focus_first_error();
                        app.notices
                            .push(Notice::error("Please correct the highlighted fields"));
                    }
                    Err(SubmitError::Form(e)) => app.notices.push(Notice::error(e.to_string())),
                }
            } else {
                match state.form.view_mut().advance() {
                    StepOutcome::Advanced(_) => {
                        state.focus = 0;
                        state.load_editor();
                    }
                    StepOutcome::Blocked(_) => state.focus_first_error(),
                    StepOutcome::AtLastStep => {}
                }
            }
        }
        KeyCode::Esc => {
            report(&mut app.notices, state.commit_editor());
            if state.form.view().active_step() == 0 {
                app.goto(Screen::Dashboard);
            } else {
                state.form.view_mut().retreat();
                state.focus = 0;
                state.load_editor();
            }
        }
        KeyCode::Tab | KeyCode::Down => report(&mut app.notices, state.move_focus(true)),
        KeyCode::BackTab | KeyCode::Up => report(&mut app.notices, state.move_focus(false)),
        KeyCode::F(2) => report(&mut app.notices, add_package(state)),
        KeyCode::F(3) => report(&mut app.notices, remove_package(state)),
        KeyCode::F(5) => return open_picker(app),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            if slot.as_ref().is_some_and(|s| !s.uses_editor() || s.path == "bookingId") =>
        {
            let forward = code != KeyCode::Left;
            let Some(slot) = slot else {
                return Vec::new();
            };
            let result = match slot.kind {
                FieldKind::Toggle => {
                    let on = state.form.view().record().flag(&slot.path);
                    state.form.view_mut().set_field(&slot.path, FieldValue::Bool(!on))
                }
                FieldKind::Choice(options) => {
                    let current = state.form.view().record().text(&slot.path).to_string();
                    match cycle_choice(options, &current, forward) {
                        Some(next) => state.form.view_mut().set_field(&slot.path, FieldValue::text(next)),
                        None => Ok(()),
                    }
                }
                _ => cycle_booking(state, &app.bookings, forward),
            };
            report(&mut app.notices, result);
            state.load_editor();
        }
        other => {
            if slot.is_some_and(|s| s.uses_editor() && s.path != "bookingId") {
                state.editor.handle_key(other);
            }
        }
    }
    Vec::new()
}

/// Shipment wizard: Left/Right on the booking field walks the confirmed bookings.
fn cycle_booking(
    state: &mut FormState,
    bookings: &[crate::models::responses::Booking],
    forward: bool,
) -> Result<(), FormError> {
    let ActiveForm::Shipment(wizard) = &mut state.form else {
        return Ok(());
    };
    let candidates = confirmed_bookings(bookings);
    if candidates.is_empty() {
        return Ok(());
    }
    let current = wizard.record().text("bookingId").to_string();
    let next = match candidates.iter().position(|b| b.id == current) {
        None => 0,
        Some(i) if forward => (i + 1) % candidates.len(),
        Some(i) => (i + candidates.len() - 1) % candidates.len(),
    };
    prefill_from_booking(wizard, candidates[next])
}

fn step_has_packages(state: &FormState) -> bool {
    let view = state.form.view();
    view.steps()[view.active_step()]
        .fields
        .iter()
        .any(|f| f.name == PACKAGES)
}

fn add_package(state: &mut FormState) -> Result<(), FormError> {
    if !step_has_packages(state) {
        return Ok(());
    }
    state.commit_editor()?;
    let index = state.form.view_mut().push_item(PACKAGES)?;
    let prefix = format!("{}.{}.", PACKAGES, index);
    state.focus = state
        .slots()
        .iter()
        .position(|s| s.path.starts_with(&prefix))
        .unwrap_or(0);
    state.load_editor();
    Ok(())
}

fn remove_package(state: &mut FormState) -> Result<(), FormError> {
    let Some(slot) = state.focused_slot() else {
        return Ok(());
    };
    let Some((list, index)) = slot.item() else {
        return Ok(());
    };
    let list = list.to_string();
    state.form.view_mut().remove_item(&list, index)?;
    state.focus = 0;
    state.load_editor();
    Ok(())
}

fn open_picker(app: &mut App) -> Vec<Effect> {
    let Some(state) = app.form.as_mut() else {
        return Vec::new();
    };
    let Some(slot) = state.focused_slot().filter(|s| s.kind == FieldKind::Location) else {
        return Vec::new();
    };
    report(&mut app.notices, state.commit_editor());

    let typed = state.editor.value.trim().to_string();
    let (root, leaf) = slot.path.rsplit_once('.').unwrap_or(("", slot.path.as_str()));
    let country = app.picked.get(&format!("{}.country", root));
    let region = app.picked.get(&format!("{}.state", root));

    let lookup = match leaf {
        "country" => LocationLookup::Countries,
        "state" => match country {
            Some(c) => LocationLookup::States(c.geoname_id),
            None => LocationLookup::Search {
                query: typed.clone(),
                country: None,
            },
        },
        _ => match (region, country) {
            (Some(s), _) => LocationLookup::Cities(s.geoname_id),
            (None, c) => LocationLookup::Search {
                query: typed.clone(),
                country: c.map(|c| c.country_code.clone()),
            },
        },
    };

    let detailed = matches!(lookup, LocationLookup::Search { .. });
    if detailed && typed.is_empty() {
        app.notices.push(Notice::info("Type a few letters, then press F5"));
        return Vec::new();
    }

    app.picker = Some(LocationPicker {
        path: slot.path.clone(),
        options: Vec::new(),
        filter: TextInput::new(if detailed { String::new() } else { typed }, false),
        selected: 0,
        loading: true,
        detailed,
    });
    vec![Effect::Locations {
        path: slot.path,
        lookup,
    }]
}

fn picker_key(app: &mut App, code: KeyCode) -> Vec<Effect> {
    let Some(picker) = app.picker.as_mut() else {
        return Vec::new();
    };
    match code {
        KeyCode::Esc => app.picker = None,
        KeyCode::Up => picker.selected = picker.selected.saturating_sub(1),
        KeyCode::Down => {
            let count = picker.visible().len();
            picker.selected = (picker.selected + 1).min(count.saturating_sub(1));
        }
        KeyCode::Enter => {
            let choice = picker
                .visible()
                .get(picker.selected)
                .map(|o| ((*o).clone(), picker.field_text(o)));
            let path = picker.path.clone();
            if let Some((option, text)) = choice {
                apply_location(app, &path, option, text);
            }
        }
        other => {
            picker.filter.handle_key(other);
            picker.selected = 0;
        }
    }
    Vec::new()
}

/// Writes the picked place and clears the levels below it.
fn apply_location(app: &mut App, path: &str, option: crate::api::LocationOption, text: String) {
    app.picker = None;
    let Some(state) = app.form.as_mut() else {
        return;
    };
    let (root, leaf) = path.rsplit_once('.').unwrap_or(("", path));
    let dependents: &[&str] = match leaf {
        "country" => &["state", "city"],
        "state" => &["city"],
        _ => &[],
    };

    let mut result = state.form.view_mut().set_field(path, FieldValue::Text(text));
    for dependent in dependents {
        let dependent_path = format!("{}.{}", root, dependent);
        app.picked.remove(&dependent_path);
        if result.is_ok() {
            result = state.form.view_mut().set_field(&dependent_path, FieldValue::text(""));
        }
    }
    app.picked.insert(path.to_string(), option);
    report(&mut app.notices, result);
    state.load_editor();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::LoginOutcome;
    use crate::api::LocationOption;
    use crate::models::responses::{Booking, User};
    use crate::models::state::Session;
    use crate::tui::app::{Reply, UiMsg};
    use crate::tui::form::SubmitRequest;
    use crossterm::event::KeyEventKind;

    fn press(app: &mut App, code: KeyCode) -> Vec<Effect> {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn signed_in() -> App {
        App::new(Some(Session::new(
            "token",
            User {
                id: "u-1".to_string(),
                full_name: "Ada Obi".to_string(),
                role: "admin".to_string(),
                ..Default::default()
            },
        )))
    }

    #[test]
    fn login_requires_a_valid_email_before_calling_out() {
        let mut app = App::new(None);
        type_text(&mut app, "not-an-email");
        assert!(press(&mut app, KeyCode::Enter).is_empty());

        app.email.set("ops@freight.test");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "hunter22");
        let effects = press(&mut app, KeyCode::Enter);
        assert_eq!(
            effects,
            vec![Effect::Login {
                email: "ops@freight.test".to_string(),
                password: "hunter22".to_string()
            }]
        );
        assert!(app.busy);
        assert!(press(&mut app, KeyCode::Enter).is_empty());
    }

    #[test]
    fn pasted_code_fills_the_otp_group_and_verifies() {
        let mut app = App::new(None);
        app.apply(Reply {
            generation: app.generation,
            msg: UiMsg::LoginFinished(Ok(LoginOutcome::OtpRequired {
                email: "ops@freight.test".to_string(),
                expires_in: 300,
            })),
        });

        handle_paste(&mut app, "abcde1");
        assert_eq!(app.otp.code(), None);
        assert_eq!(app.notices.latest().map(|n| n.message.as_str()), Some("Paste a 6-digit code"));

        handle_paste(&mut app, " 123456 ");
        assert_eq!(app.otp.focus(), 5);
        let effects = press(&mut app, KeyCode::Enter);
        assert_eq!(
            effects,
            vec![Effect::VerifyOtp {
                email: "ops@freight.test".to_string(),
                code: "123456".to_string()
            }]
        );
    }

    #[test]
    fn resend_waits_for_the_cooldown() {
        let mut app = App::new(None);
        app.goto(Screen::Otp);
        app.otp_email = "ops@freight.test".to_string();
        app.resend_cooldown = crate::forms::otp::Countdown::new(2);
        assert!(press(&mut app, KeyCode::F(4)).is_empty());
        app.on_second();
        app.on_second();
        assert_eq!(
            press(&mut app, KeyCode::F(4)),
            vec![Effect::ResendOtp {
                email: "ops@freight.test".to_string()
            }]
        );
    }

    #[test]
    fn booking_wizard_blocks_then_advances() {
        let mut app = signed_in();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen, Screen::Wizard);

        press(&mut app, KeyCode::Enter);
        let state = app.form.as_ref().unwrap();
        assert_eq!(state.form.view().active_step(), 0);
        assert!(state.form.view().errors().contains("customerName"));
        assert_eq!(state.focus, 0);

        type_text(&mut app, "Acme Freight");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "ops@acme.test");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "+234 803 555 0101");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.as_ref().unwrap().form.view().active_step(), 1);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.form.as_ref().unwrap().form.view().active_step(), 0);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Dashboard);
        assert!(app.form.is_none());
    }

    #[test]
    fn function_keys_add_and_remove_packages() {
        let mut app = signed_in();
        app.open_form(FormKind::Booking);
        {
            let state = app.form.as_mut().unwrap();
            state.form.view_mut().advance();
        }
        // Not on the cargo step yet: F2 does nothing.
        press(&mut app, KeyCode::F(2));
        let count = |app: &App| {
            app.form
                .as_ref()
                .unwrap()
                .form
                .view()
                .record()
                .list(PACKAGES)
                .map(|l| l.len())
                .unwrap()
        };
        assert_eq!(count(&app), 1);

        let mut wizard = crate::forms::Wizard::new(crate::forms::booking::BookingSchema).unwrap();
        for (path, value) in [
            ("customerName", "Acme"),
            ("customerEmail", "ops@acme.test"),
            ("customerPhone", "+2348035550101"),
            ("origin.country", "Nigeria"),
            ("origin.city", "Lagos"),
            ("origin.address", "1 Marina"),
            ("destination.country", "Ghana"),
            ("destination.city", "Accra"),
            ("destination.address", "2 Ring Road"),
            ("transport.mode", "sea"),
            ("transport.pickupDate", "2026-11-02"),
        ] {
            wizard.set_field(path, value).unwrap();
        }
        wizard.advance();
        wizard.advance();
        assert_eq!(wizard.active_step(), 2);
        app.form = Some(FormState::new(ActiveForm::Booking(wizard)));

        press(&mut app, KeyCode::F(2));
        assert_eq!(count(&app), 2);
        assert_eq!(
            app.form.as_ref().unwrap().focused_slot().map(|s| s.path),
            Some("packages.1.packageType".to_string())
        );
        press(&mut app, KeyCode::F(3));
        assert_eq!(count(&app), 1);
    }

    #[test]
    fn choice_and_toggle_cycle_with_arrow_keys() {
        let mut app = signed_in();
        app.open_form(FormKind::Receive);
        let mut wizard = crate::forms::Wizard::new(crate::forms::warehouse::ReceiveSchema).unwrap();
        wizard.set_field("trackingNumber", "trk-1").unwrap();
        wizard.advance();
        app.form = Some(FormState::new(ActiveForm::Receive(wizard)));

        type_text(&mut app, "3");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        let record = app.form.as_ref().unwrap().form.view().record().clone();
        assert_eq!(record.text("condition"), "damaged");
        assert_eq!(record.text("receivedPackages"), "3");

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        let record = app.form.as_ref().unwrap().form.view().record().clone();
        assert_eq!(record.text("condition"), "partial");
    }

    #[test]
    fn submit_on_the_last_step_emits_the_payload() {
        let mut app = signed_in();
        let mut wizard = crate::forms::Wizard::new(crate::forms::warehouse::ReceiveSchema).unwrap();
        wizard.set_field("trackingNumber", "trk-9").unwrap();
        wizard.advance();
        wizard.set_field("receivedPackages", "4").unwrap();
        wizard.set_field("condition", "good").unwrap();
        app.goto(Screen::Wizard);
        app.form = Some(FormState::new(ActiveForm::Receive(wizard)));

        let effects = press(&mut app, KeyCode::Enter);
        match effects.as_slice() {
            [Effect::Submit(SubmitRequest::Receive(request))] => {
                assert_eq!(request.tracking_number, "TRK-9");
                assert_eq!(request.received_packages, 4);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
        assert!(app.busy);
    }

    #[test]
    fn enter_on_a_confirmed_booking_opens_a_prefilled_shipment() {
        let mut app = signed_in();
        app.bookings = vec![
            Booking {
                id: "b-1".to_string(),
                booking_number: "BK-1".to_string(),
                status: "pending".to_string(),
                ..Default::default()
            },
            Booking {
                id: "b-2".to_string(),
                booking_number: "BK-2".to_string(),
                status: "booking_confirmed".to_string(),
                total_packages: Some(3.0),
                ..Default::default()
            },
        ];
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(
            press(&mut app, KeyCode::F(6)),
            vec![Effect::SetBookingStatus {
                id: "b-1".to_string(),
                status: "confirmed".to_string()
            }]
        );

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Bookings);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Wizard);
        let record = app.form.as_ref().unwrap().form.view().record().clone();
        assert_eq!(record.text("bookingId"), "b-2");
        assert_eq!(record.text("bookingNumber"), "BK-2");
    }

    #[test]
    fn location_picker_scopes_states_to_the_picked_country() {
        let mut app = signed_in();
        let mut wizard = crate::forms::Wizard::new(crate::forms::booking::BookingSchema).unwrap();
        wizard.set_field("customerName", "Acme").unwrap();
        wizard.set_field("customerEmail", "ops@acme.test").unwrap();
        wizard.set_field("customerPhone", "+2348035550101").unwrap();
        wizard.advance();
        app.goto(Screen::Wizard);
        app.form = Some(FormState::new(ActiveForm::Booking(wizard)));

        let effects = press(&mut app, KeyCode::F(5));
        assert_eq!(
            effects,
            vec![Effect::Locations {
                path: "origin.country".to_string(),
                lookup: LocationLookup::Countries
            }]
        );
        let nigeria = LocationOption {
            value: "NG".to_string(),
            label: "Nigeria".to_string(),
            geoname_id: 2328926,
            country_code: "NG".to_string(),
            admin_code: None,
            lat: None,
            lng: None,
        };
        app.apply(Reply {
            generation: app.generation,
            msg: UiMsg::LocationsLoaded {
                path: "origin.country".to_string(),
                result: Ok(vec![nigeria]),
            },
        });
        press(&mut app, KeyCode::Enter);
        assert!(app.picker.is_none());
        assert_eq!(
            app.form.as_ref().unwrap().form.view().record().text("origin.country"),
            "Nigeria"
        );

        press(&mut app, KeyCode::Tab);
        assert_eq!(
            press(&mut app, KeyCode::F(5)),
            vec![Effect::Locations {
                path: "origin.state".to_string(),
                lookup: LocationLookup::States(2328926)
            }]
        );
    }

    #[test]
    fn typing_on_login_fills_the_focused_field() {
        let event = KeyEvent::new_with_kind(KeyCode::Char('x'), KeyModifiers::NONE, KeyEventKind::Press);
        let mut app = App::new(None);
        handle_key(&mut app, event);
        assert_eq!(app.email.value, "x");
    }
}
