//! Terminal front end.
//!
//! Layout: a centered window titled "Freight Admin" with a header line, the
//! active screen, a notice strip and a key-hint footer.
//!
//! Input handlers never touch the network. They mutate [`app::App`] and
//! return [`app::Effect`]s; the loop hands those to a small tokio runtime and
//! the results come back as tagged replies over a channel.
//!
//! Note: logging is file-only in TUI mode (stdout logging is disabled) to
//! avoid corrupting the terminal.

mod app;
mod draw;
mod form;
mod input;

use anyhow::Result;
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use futures::future::join3;
use log::{info, warn};
use ratatui::backend::{CrosstermBackend, TestBackend};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::api::auth::{self, LoginOutcome};
use crate::api::{bookings, shipments, users, warehouse, ApiClient, GeoClient, RequestContext};
use crate::config::AppConfig;
use crate::models::requests::{ListFilters, UpdateUserRequest};
use crate::models::responses::{Address, Booking, Customer, Shipment, User};
use crate::models::state::{AppState, Session};
use crate::security::secret_protector::{default_key_path, SecretProtector};
use crate::security::session_store::{clear_session, load_session, save_session, FileStore, KeyValueStore};
use crate::utils::path_resolver;
use app::{App, Effect, FormKind, LocationLookup, Reply, Screen, UiMsg};
use form::SubmitRequest;

/// Page size requested from the backend; the TUI paginates locally.
const FETCH_LIMIT: u32 = 200;

struct Services {
    runtime: Runtime,
    client: ApiClient,
    geo: GeoClient,
    session_ops: UnboundedSender<SessionOp>,
    tx: mpsc::Sender<Reply>,
}

/// Writes to the session store. One task applies them in the order issued,
/// so a logout can never be overtaken by the save before it.
#[derive(Debug)]
enum SessionOp {
    Save(Session),
    Logout(Session),
}

impl SessionOp {
    fn name(&self) -> &'static str {
        match self {
            SessionOp::Save(_) => "save",
            SessionOp::Logout(_) => "logout",
        }
    }
}

async fn session_writer(
    mut ops: UnboundedReceiver<SessionOp>,
    client: ApiClient,
    store: Arc<dyn KeyValueStore>,
    state: Arc<AppState>,
) {
    while let Some(op) = ops.recv().await {
        match op {
            SessionOp::Save(session) => {
                state.set_session(session.clone()).await;
                if let Err(e) = save_session(store.as_ref(), &session).await {
                    warn!("[PHASE: session] [STEP: save] could not persist session: {}", e);
                }
            }
            SessionOp::Logout(session) => {
                // Not tied to any screen token.
                let ctx = RequestContext::new(Some(session), CancellationToken::new());
                if let Err(e) = auth::logout(&client, &ctx).await {
                    warn!(
                        "[PHASE: auth] [STEP: logout] server logout failed: {} (correlation_id={})",
                        e,
                        ctx.correlation_id()
                    );
                }
                if let Err(e) = clear_session(store.as_ref()).await {
                    warn!("[PHASE: session] [STEP: clear] could not clear stored session: {}", e);
                }
                state.clear_session().await;
            }
        }
    }
}

impl Services {
    fn dispatch_all(&self, app: &App, effects: Vec<Effect>) {
        for effect in effects {
            self.dispatch(app, effect);
        }
    }

    /// Starts the work for one effect. The reply carries the generation the
    /// app was at when the work started.
    fn dispatch(&self, app: &App, effect: Effect) {
        let (generation, ctx) = match effect {
            Effect::LoadData => (app.data_generation, app.data_context()),
            _ => (app.generation, app.context()),
        };
        let tx = self.tx.clone();
        let send = move |msg: UiMsg| {
            // The loop has exited when the receiver is gone.
            let _ = tx.send(Reply { generation, msg });
        };
        let client = self.client.clone();

        match effect {
            Effect::Login { email, password } => {
                self.runtime.spawn(async move {
                    let result = auth::login(&client, &ctx, &email, &password).await;
                    send(UiMsg::LoginFinished(result));
                });
            }
            Effect::VerifyOtp { email, code } => {
                self.runtime.spawn(async move {
                    send(UiMsg::OtpVerified(auth::verify_otp(&client, &ctx, &email, &code).await));
                });
            }
            Effect::ResendOtp { email } => {
                self.runtime.spawn(async move {
                    send(UiMsg::OtpResent(auth::resend_otp(&client, &ctx, &email).await));
                });
            }
            Effect::LoadData => {
                let admin = app.is_admin();
                self.runtime.spawn(async move {
                    let filters = ListFilters {
                        limit: Some(FETCH_LIMIT),
                        ..Default::default()
                    };
                    let (booking_list, shipment_list, user_list) = join3(
                        bookings::list(&client, &ctx, &filters),
                        shipments::list(&client, &ctx, &filters),
                        async {
                            if admin {
                                Some(users::list(&client, &ctx, &filters).await)
                            } else {
                                None
                            }
                        },
                    )
                    .await;
                    send(UiMsg::DataLoaded {
                        bookings: booking_list.map(|f| f.data),
                        shipments: shipment_list.map(|f| f.data),
                        users: user_list.map(|r| r.map(|f| f.data)),
                    });
                });
            }
            Effect::Locations { path, lookup } => {
                let geo = self.geo.clone();
                self.runtime.spawn(async move {
                    let result = match &lookup {
                        LocationLookup::Countries => geo.countries(&ctx).await,
                        LocationLookup::States(country) => geo.states(&ctx, *country).await,
                        LocationLookup::Cities(state) => geo.cities(&ctx, *state).await,
                        LocationLookup::Search { query, country } => {
                            geo.search(&ctx, query, country.as_deref()).await
                        }
                    };
                    send(UiMsg::LocationsLoaded { path, result });
                });
            }
            Effect::Submit(request) => {
                self.runtime.spawn(async move {
                    send(UiMsg::Submitted(submit(&client, &ctx, request).await));
                });
            }
            Effect::SetBookingStatus { id, status } => {
                self.runtime.spawn(async move {
                    let result = bookings::update_status(&client, &ctx, &id, &status).await;
                    send(UiMsg::BookingUpdated(result.map(|f| f.data)));
                });
            }
            Effect::SetUserActive { id, active } => {
                self.runtime.spawn(async move {
                    let request = UpdateUserRequest {
                        is_active: Some(active),
                        ..Default::default()
                    };
                    let result = users::update(&client, &ctx, &id, &request).await;
                    send(UiMsg::UserUpdated(result.map(|f| f.data)));
                });
            }
            Effect::SaveSession(session) => self.queue_session_op(SessionOp::Save(session)),
            Effect::Logout(session) => self.queue_session_op(SessionOp::Logout(session)),
        }
    }

    fn queue_session_op(&self, op: SessionOp) {
        if let Err(e) = self.session_ops.send(op) {
            warn!("[PHASE: session] [STEP: queue] session writer is gone, dropped {}", e.0.name());
        }
    }
}

/// Sends one form payload and returns the confirmation shown to the user.
async fn submit(
    client: &ApiClient,
    ctx: &RequestContext,
    request: SubmitRequest,
) -> Result<String, crate::api::ApiError> {
    match request {
        SubmitRequest::Booking(body) => {
            let created = bookings::create(client, ctx, &body).await?.data;
            Ok(format!("Booking {} created", created.booking_number))
        }
        SubmitRequest::Shipment(body) => {
            let created = shipments::create(client, ctx, &body).await?.data;
            Ok(format!(
                "Shipment {} created, tracking number {}",
                created.shipment_number, created.tracking_number
            ))
        }
        SubmitRequest::User(body) => {
            let created = users::create(client, ctx, &body).await?.data;
            Ok(format!("{} account created for {}", created.role, created.full_name))
        }
        SubmitRequest::Receive(body) => {
            let receipt = warehouse::receive(client, ctx, &body).await?.data;
            Ok(format!("{} received into the warehouse", receipt.tracking_number))
        }
    }
}

pub fn run(config: &AppConfig) -> Result<()> {
    info!("[PHASE: tui] [STEP: start] Starting freight admin TUI");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("freight-admin-io")
        .enable_all()
        .build()?;

    let client = ApiClient::new(&config.api)?;
    let geo = GeoClient::new(&config.geocoding)?;

    let session_path = config.session_path();
    let data_dir = session_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(path_resolver::resolve_data_dir);
    let protector = SecretProtector::new(default_key_path(&data_dir));
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(session_path, protector));

    let session = runtime
        .block_on(load_session(store.as_ref()))
        .unwrap_or_else(|e| {
            warn!("[PHASE: session] [STEP: load] ignoring stored session: {}", e);
            None
        });
    let state = Arc::new(AppState::default());
    if let Some(session) = &session {
        runtime.block_on(state.set_session(session.clone()));
    }

    let (session_ops, ops_rx) = unbounded_channel();
    let writer = runtime.spawn(session_writer(ops_rx, client.clone(), store, state));

    let (tx, rx) = mpsc::channel();
    let services = Services {
        runtime,
        client,
        geo,
        session_ops,
        tx,
    };
    let mut app = App::new(session);

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &mut app, &services, &rx);
    restore_terminal(&mut terminal)?;

    app.cancel.cancel();
    app.data_cancel.cancel();
    let Services {
        runtime, session_ops, ..
    } = services;
    // Let queued session writes (a final logout) land before exiting.
    drop(session_ops);
    if runtime
        .block_on(tokio::time::timeout(Duration::from_secs(3), writer))
        .is_err()
    {
        warn!("[PHASE: session] [STEP: flush] session writes still pending at exit");
    }
    runtime.shutdown_timeout(Duration::from_secs(2));
    info!("[PHASE: tui] [STEP: exit] TUI closed");
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    services: &Services,
    rx: &mpsc::Receiver<Reply>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let second = Duration::from_secs(1);
    let mut last_tick = Instant::now();
    let mut last_second = Instant::now();

    let startup = app.startup_effects();
    services.dispatch_all(app, startup);

    while !app.quit {
        while let Ok(reply) = rx.try_recv() {
            let effects = app.apply(reply);
            services.dispatch_all(app, effects);
        }
        terminal.draw(|f| draw::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            let effects = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => Vec::new(),
            };
            services.dispatch_all(app, effects);
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
        if last_second.elapsed() >= second {
            app.on_second();
            last_second += second;
        }
    }

    Ok(())
}

fn sample_address(country: &str, state: &str, city: &str) -> Address {
    Address {
        country: country.to_string(),
        state: state.to_string(),
        city: city.to_string(),
        address: "12 Wharf Road".to_string(),
    }
}

fn sample_booking(id: &str, number: &str, status: &str, customer: &str) -> Booking {
    Booking {
        id: id.to_string(),
        booking_number: number.to_string(),
        status: status.to_string(),
        customer: Customer {
            name: customer.to_string(),
            email: "ops@harbor.test".to_string(),
            phone: "+2348012345678".to_string(),
            company: Some("Harbor Goods".to_string()),
        },
        origin: sample_address("Nigeria", "Lagos", "Lagos"),
        destination: sample_address("Ghana", "Greater Accra", "Accra"),
        transport_mode: Some("sea".to_string()),
        ..Default::default()
    }
}

fn sample_user(id: &str, name: &str, role: &str, active: bool) -> User {
    User {
        id: id.to_string(),
        full_name: name.to_string(),
        email: format!("{}@freight.test", id),
        role: role.to_string(),
        is_active: active,
        ..Default::default()
    }
}

/// Seeded state for deterministic rendering. Only smoke mode uses it.
fn new_smoke_app(target: &str) -> App {
    let session = Session::new("smoke-token", sample_user("admin", "Ada Obi", "admin", true));
    let mut app = App::new(Some(session));
    app.bookings = vec![
        sample_booking("b1", "BK-1001", "pending", "Harbor Goods"),
        sample_booking("b2", "BK-1002", "confirmed", "Delta Foods"),
        sample_booking("b3", "BK-1003", "in_transit", "Kano Textiles"),
    ];
    app.shipments = vec![Shipment {
        id: "s1".to_string(),
        shipment_number: "SH-2001".to_string(),
        tracking_number: "TRK-88120".to_string(),
        status: "in_transit".to_string(),
        booking_id: Some("b3".to_string()),
        ..Default::default()
    }];
    app.users = vec![
        sample_user("admin", "Ada Obi", "admin", true),
        sample_user("clerk", "Tunde Bello", "staff", true),
        sample_user("buyer", "Efua Mensah", "customer", false),
    ];

    match target {
        "login" => {
            app.sign_out();
            app.notices.dismiss_all();
        }
        "otp" => {
            app.sign_out();
            app.notices.dismiss_all();
            let generation = app.generation;
            app.apply(Reply {
                generation,
                msg: UiMsg::LoginFinished(Ok(LoginOutcome::OtpRequired {
                    email: "admin@freight.test".to_string(),
                    expires_in: 300,
                })),
            });
        }
        "bookings" => app.goto(Screen::Bookings),
        "users" => app.goto(Screen::Users),
        "booking" => {
            app.open_form(FormKind::Booking);
        }
        "shipment" => {
            let confirmed = app.bookings[1].clone();
            app.open_shipment_for(&confirmed);
        }
        "staff" => {
            app.open_form(FormKind::Staff);
        }
        "customer" => {
            app.open_form(FormKind::Customer);
        }
        "receive" => {
            app.open_form(FormKind::Receive);
        }
        _ => {
            // default: dashboard
            app.startup_effects();
        }
    }
    app
}

fn render(app: &App, width: u16, height: u16) -> Result<String> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw::draw(f, app))?;

    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer.get(x, y).symbol());
        }
        out.push('\n');
    }
    Ok(out)
}

/// Non-interactive smoke mode: render a single frame and exit.
/// Targets: login|otp|dashboard|bookings|users|booking|shipment|staff|customer|receive
pub fn smoke(target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    let t = target.trim().to_ascii_lowercase();
    let app = new_smoke_app(t.as_str());
    let frame = render(&app, 100, 30)?;
    info!(
        "[PHASE: tui] [STEP: smoke] rendered {:?} ({} non-blank cells)",
        app.screen,
        frame.chars().filter(|c| !c.is_whitespace()).count()
    );
    Ok(())
}
