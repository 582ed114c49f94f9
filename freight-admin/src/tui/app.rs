// Screen state for the terminal front end and the replies it reacts to.
//
// Every network call is tagged with the screen generation it was started
// from. Changing screens bumps the generation and cancels the old token, so a
// late reply for a closed screen is dropped instead of applied.

use log::{debug, info};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use super::form::{ActiveForm, FormState, SubmitRequest, TextInput};
use crate::api::auth::LoginOutcome;
use crate::api::{ApiError, LocationOption, RequestContext};
use crate::forms::booking::BookingSchema;
use crate::forms::otp::{Countdown, OtpInput};
use crate::forms::shipment::{prefill_from_booking, ShipmentSchema};
use crate::forms::staff::UserSchema;
use crate::forms::warehouse::ReceiveSchema;
use crate::forms::{FormError, Wizard};
use crate::listing::{filter_bookings, filter_users, paginate, Page, StatusFilter};
use crate::models::responses::{Booking, Shipment, User};
use crate::models::state::Session;
use crate::notify::{Notice, NoticeQueue};

pub(crate) const PER_PAGE: usize = 8;
pub(crate) const RESEND_COOLDOWN_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Otp,
    Dashboard,
    Bookings,
    Users,
    Wizard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormKind {
    Booking,
    Shipment,
    Staff,
    Customer,
    Receive,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LocationLookup {
    Countries,
    States(i64),
    Cities(i64),
    Search { query: String, country: Option<String> },
}

/// Work the event loop hands to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    Login { email: String, password: String },
    VerifyOtp { email: String, code: String },
    ResendOtp { email: String },
    LoadData,
    Locations { path: String, lookup: LocationLookup },
    Submit(SubmitRequest),
    SetBookingStatus { id: String, status: String },
    SetUserActive { id: String, active: bool },
    SaveSession(Session),
    Logout(Session),
}

#[derive(Debug)]
pub(crate) enum UiMsg {
    LoginFinished(Result<LoginOutcome, ApiError>),
    OtpVerified(Result<Session, ApiError>),
    OtpResent(Result<u32, ApiError>),
    DataLoaded {
        bookings: Result<Vec<Booking>, ApiError>,
        shipments: Result<Vec<Shipment>, ApiError>,
        users: Option<Result<Vec<User>, ApiError>>,
    },
    LocationsLoaded {
        path: String,
        result: Result<Vec<LocationOption>, ApiError>,
    },
    Submitted(Result<String, ApiError>),
    BookingUpdated(Result<Booking, ApiError>),
    UserUpdated(Result<User, ApiError>),
}

#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) generation: u64,
    pub(crate) msg: UiMsg,
}

pub(crate) struct LocationPicker {
    pub(crate) path: String,
    pub(crate) options: Vec<LocationOption>,
    pub(crate) filter: TextInput,
    pub(crate) selected: usize,
    pub(crate) loading: bool,
    /// Search results carry "name, region, country" labels.
    pub(crate) detailed: bool,
}

impl LocationPicker {
    pub(crate) fn visible(&self) -> Vec<&LocationOption> {
        let needle = self.filter.value.trim().to_lowercase();
        self.options
            .iter()
            .filter(|o| needle.is_empty() || o.label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Text written into the field for an option.
    pub(crate) fn field_text(&self, option: &LocationOption) -> String {
        if self.detailed {
            option.label.split(',').next().unwrap_or_default().trim().to_string()
        } else {
            option.label.clone()
        }
    }
}

pub(crate) struct ListView {
    pub(crate) search: TextInput,
    pub(crate) status: StatusFilter,
    pub(crate) page: usize,
    pub(crate) selected: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            search: TextInput::new("", false),
            status: StatusFilter::All,
            page: 1,
            selected: 0,
        }
    }
}

pub(crate) struct App {
    pub(crate) screen: Screen,
    pub(crate) generation: u64,
    pub(crate) cancel: CancellationToken,
    pub(crate) session: Option<Session>,
    pub(crate) notices: NoticeQueue,
    pub(crate) busy: bool,
    pub(crate) quit: bool,

    pub(crate) email: TextInput,
    pub(crate) password: TextInput,
    pub(crate) login_focus: usize,

    pub(crate) otp: OtpInput,
    pub(crate) otp_email: String,
    pub(crate) otp_expiry: Countdown,
    pub(crate) resend_cooldown: Countdown,

    pub(crate) bookings: Vec<Booking>,
    pub(crate) shipments: Vec<Shipment>,
    pub(crate) users: Vec<User>,
    /// Shared lists are not owned by a screen: their loads carry this
    /// generation and token, which only sign-out replaces.
    pub(crate) data_generation: u64,
    pub(crate) data_cancel: CancellationToken,
    pub(crate) list: ListView,

    pub(crate) form: Option<FormState>,
    pub(crate) picker: Option<LocationPicker>,
    /// Options picked per location path, used to scope child lookups.
    pub(crate) picked: HashMap<String, LocationOption>,
}

impl App {
    pub(crate) fn new(session: Option<Session>) -> Self {
        let screen = if session.is_some() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        Self {
            screen,
            generation: 0,
            cancel: CancellationToken::new(),
            session,
            notices: NoticeQueue::default(),
            busy: false,
            quit: false,
            email: TextInput::new("", false),
            password: TextInput::new("", true),
            login_focus: 0,
            otp: OtpInput::new(),
            otp_email: String::new(),
            otp_expiry: Countdown::new(0),
            resend_cooldown: Countdown::new(0),
            bookings: Vec::new(),
            shipments: Vec::new(),
            users: Vec::new(),
            data_generation: 0,
            data_cancel: CancellationToken::new(),
            list: ListView::default(),
            form: None,
            picker: None,
            picked: HashMap::new(),
        }
    }

    /// Effects to run once the loop starts.
    pub(crate) fn startup_effects(&mut self) -> Vec<Effect> {
        match &self.session {
            Some(session) => {
                self.notices.push(Notice::success(session.greeting()));
                vec![Effect::LoadData]
            }
            None => Vec::new(),
        }
    }

    pub(crate) fn goto(&mut self, screen: Screen) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.busy = false;
        self.picker = None;
        if screen != Screen::Wizard {
            self.form = None;
            self.picked.clear();
        }
        if matches!(screen, Screen::Bookings | Screen::Users) && screen != self.screen {
            self.list = ListView::default();
        }
        debug!(
            "[PHASE: tui] [STEP: navigate] {:?} -> {:?} (generation={})",
            self.screen, screen, self.generation
        );
        self.screen = screen;
    }

    pub(crate) fn context(&self) -> RequestContext {
        RequestContext::new(self.session.clone(), self.cancel.clone())
    }

    /// Context for loading the shared lists; survives screen changes.
    pub(crate) fn data_context(&self) -> RequestContext {
        RequestContext::new(self.session.clone(), self.data_cancel.clone())
    }

    /// Generation a reply for `msg` must carry to be applied.
    pub(crate) fn generation_for(&self, msg: &UiMsg) -> u64 {
        match msg {
            UiMsg::DataLoaded { .. } => self.data_generation,
            _ => self.generation,
        }
    }

    pub(crate) fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    pub(crate) fn on_tick(&mut self) {
        self.notices.tick();
    }

    pub(crate) fn on_second(&mut self) {
        if self.screen == Screen::Otp {
            self.otp_expiry.tick();
            self.resend_cooldown.tick();
        }
    }

    pub(crate) fn report_error(&mut self, err: &ApiError) {
        if !err.is_cancelled() {
            self.notices.push(Notice::from_error(err));
        }
    }

    pub(crate) fn report_form_error(&mut self, err: &FormError) {
        self.notices.push(Notice::error(err.to_string()));
    }

    pub(crate) fn open_form(&mut self, kind: FormKind) -> Vec<Effect> {
        let form = match kind {
            FormKind::Booking => Wizard::new(BookingSchema).map(ActiveForm::Booking),
            FormKind::Shipment => Wizard::new(ShipmentSchema).map(ActiveForm::Shipment),
            FormKind::Staff => Wizard::new(UserSchema::staff()).map(ActiveForm::User),
            FormKind::Customer => Wizard::new(UserSchema::customer()).map(ActiveForm::User),
            FormKind::Receive => Wizard::new(ReceiveSchema).map(ActiveForm::Receive),
        };
        match form {
            Ok(form) => {
                self.goto(Screen::Wizard);
                self.form = Some(FormState::new(form));
                if kind == FormKind::Shipment && self.bookings.is_empty() {
                    return vec![Effect::LoadData];
                }
                Vec::new()
            }
            Err(e) => {
                self.report_form_error(&e);
                Vec::new()
            }
        }
    }

    /// Opens the shipment wizard with `booking` already copied in.
    pub(crate) fn open_shipment_for(&mut self, booking: &Booking) {
        let mut wizard = match Wizard::new(ShipmentSchema) {
            Ok(wizard) => wizard,
            Err(e) => return self.report_form_error(&e),
        };
        if let Err(e) = prefill_from_booking(&mut wizard, booking) {
            return self.report_form_error(&e);
        }
        self.goto(Screen::Wizard);
        self.form = Some(FormState::new(ActiveForm::Shipment(wizard)));
    }

    pub(crate) fn booking_page(&self) -> Page<Booking> {
        let filtered: Vec<Booking> = filter_bookings(&self.bookings, &self.list.search.value, self.list.status)
            .into_iter()
            .cloned()
            .collect();
        paginate(&filtered, self.list.page, PER_PAGE)
    }

    pub(crate) fn user_page(&self) -> Page<User> {
        let filtered: Vec<User> = filter_users(&self.users, &self.list.search.value, None)
            .into_iter()
            .cloned()
            .collect();
        paginate(&filtered, self.list.page, PER_PAGE)
    }

    fn sign_in(&mut self, session: Session) -> Vec<Effect> {
        info!(
            "[PHASE: tui] [STEP: sign_in] signed in as {} (role={})",
            session.display_name(),
            session.user.role
        );
        self.password.set("");
        self.otp.clear();
        self.notices.push(Notice::success(session.greeting()));
        self.session = Some(session.clone());
        self.goto(Screen::Dashboard);
        vec![Effect::SaveSession(session), Effect::LoadData]
    }

    /// Signs out locally; the returned effect tells the server and wipes the store.
    pub(crate) fn sign_out(&mut self) -> Vec<Effect> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        self.bookings.clear();
        self.shipments.clear();
        self.users.clear();
        self.data_cancel.cancel();
        self.data_cancel = CancellationToken::new();
        self.data_generation += 1;
        self.goto(Screen::Login);
        self.notices.push(Notice::info("You have been signed out"));
        vec![Effect::Logout(session)]
    }

    /// Applies one reply. Replies from an older generation are dropped.
    pub(crate) fn apply(&mut self, reply: Reply) -> Vec<Effect> {
        let current = self.generation_for(&reply.msg);
        if reply.generation != current {
            debug!(
                "[PHASE: tui] [STEP: reply] dropped stale reply (generation={} current={})",
                reply.generation, current
            );
            return Vec::new();
        }
        // A background list load says nothing about the screen's own request.
        if !matches!(reply.msg, UiMsg::DataLoaded { .. }) {
            self.busy = false;
        }

        match reply.msg {
            UiMsg::LoginFinished(Ok(LoginOutcome::OtpRequired { email, expires_in })) => {
                self.goto(Screen::Otp);
                self.otp.clear();
                self.otp_expiry = Countdown::new(expires_in);
                self.resend_cooldown = Countdown::new(RESEND_COOLDOWN_SECS);
                self.notices
                    .push(Notice::info(format!("A verification code was sent to {}", email)));
                self.otp_email = email;
                Vec::new()
            }
            UiMsg::LoginFinished(Ok(LoginOutcome::SignedIn(session))) => self.sign_in(session),
            UiMsg::OtpVerified(Ok(session)) => self.sign_in(session),
            UiMsg::LoginFinished(Err(e)) | UiMsg::OtpVerified(Err(e)) => {
                self.otp.clear();
                self.report_error(&e);
                Vec::new()
            }
            UiMsg::OtpResent(Ok(seconds)) => {
                self.otp.clear();
                self.otp_expiry.restart_with(seconds);
                self.resend_cooldown.restart();
                self.notices.push(Notice::info("A new code was sent"));
                Vec::new()
            }
            UiMsg::OtpResent(Err(e)) => {
                self.report_error(&e);
                Vec::new()
            }
            UiMsg::DataLoaded {
                bookings,
                shipments,
                users,
            } => {
                match bookings {
                    Ok(list) => self.bookings = list,
                    Err(e) => self.report_error(&e),
                }
                match shipments {
                    Ok(list) => self.shipments = list,
                    Err(e) => self.report_error(&e),
                }
                match users {
                    Some(Ok(list)) => self.users = list,
                    Some(Err(e)) => self.report_error(&e),
                    None => {}
                }
                debug!(
                    "[PHASE: tui] [STEP: data] {} booking(s), {} shipment(s), {} user(s)",
                    self.bookings.len(),
                    self.shipments.len(),
                    self.users.len()
                );
                Vec::new()
            }
            UiMsg::LocationsLoaded { path, result } => {
                let Some(picker) = self.picker.as_mut().filter(|p| p.path == path) else {
                    return Vec::new();
                };
                match result {
                    Ok(options) => {
                        picker.options = options;
                        picker.selected = 0;
                        picker.loading = false;
                        if picker.options.is_empty() {
                            self.picker = None;
                            self.notices.push(Notice::info("No matching places found"));
                        }
                    }
                    Err(e) => {
                        self.picker = None;
                        self.report_error(&e);
                    }
                }
                Vec::new()
            }
            UiMsg::Submitted(Ok(message)) => {
                self.notices.push(Notice::success(message));
                self.goto(Screen::Dashboard);
                vec![Effect::LoadData]
            }
            UiMsg::Submitted(Err(e)) => {
                self.report_error(&e);
                Vec::new()
            }
            UiMsg::BookingUpdated(Ok(updated)) => {
                self.notices.push(Notice::success(format!(
                    "Booking {} is now {}",
                    updated.booking_number, updated.status
                )));
                if let Some(slot) = self.bookings.iter_mut().find(|b| b.id == updated.id) {
                    *slot = updated;
                }
                Vec::new()
            }
            UiMsg::UserUpdated(Ok(updated)) => {
                let state = if updated.is_active { "activated" } else { "deactivated" };
                self.notices
                    .push(Notice::success(format!("{} {}", updated.full_name, state)));
                if let Some(slot) = self.users.iter_mut().find(|u| u.id == updated.id) {
                    *slot = updated;
                }
                Vec::new()
            }
            UiMsg::BookingUpdated(Err(e)) | UiMsg::UserUpdated(Err(e)) => {
                self.report_error(&e);
                Vec::new()
            }
        }
    }
}
