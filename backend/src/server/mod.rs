//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::warn;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::domain::ports::{
    DisabledMeetingScheduler, MeetingScheduler, PaymentGateway, UnconfiguredPaymentGateway,
};
use backend::domain::{
    AccountService, ChallengeService, DashboardService, NotificationService, PaymentService,
    SessionService, SubscriptionService, TeamService,
};
use backend::inbound::http::accounts::{
    change_password, get_profile, login, logout, signup, update_profile,
};
use backend::inbound::http::challenges::{
    create_challenge, join_challenge, list_challenges, update_progress,
};
use backend::inbound::http::dashboard::get_dashboard;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::notifications::{list_notifications, mark_notifications_read};
use backend::inbound::http::payments::mpesa_callback;
use backend::inbound::http::sessions::{
    complete_session, create_session, join_session, list_sessions, start_session,
};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::subscriptions::{list_plans, subscribe};
use backend::inbound::http::teams::{
    create_team, initiate_team_payment, join_team, leave_team, list_team_messages,
    list_teams, post_team_message,
};
use backend::outbound::calendar::CalendarHttpScheduler;
use backend::outbound::mpesa::MpesaHttpGateway;
use backend::outbound::persistence::{
    DieselChallengeRepository, DieselNotificationRepository, DieselPaymentRepository,
    DieselSessionRepository, DieselSubscriptionRepository, DieselTeamRepository,
    DieselUserRepository,
};

/// Wire every domain service from the configured adapters.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let pool = config.db_pool.clone();
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let sessions = Arc::new(DieselSessionRepository::new(pool.clone()));
    let teams = Arc::new(DieselTeamRepository::new(pool.clone()));
    let challenges = Arc::new(DieselChallengeRepository::new(pool.clone()));
    let subscriptions = Arc::new(DieselSubscriptionRepository::new(pool.clone()));
    let payments = Arc::new(DieselPaymentRepository::new(pool.clone()));
    let notifications = Arc::new(DieselNotificationRepository::new(pool));

    let gateway: Arc<dyn PaymentGateway> = match &config.mpesa {
        Some(mpesa) => match MpesaHttpGateway::new(mpesa.clone()) {
            Ok(gateway) => Arc::new(gateway),
            Err(err) => {
                warn!(error = %err, "mpesa gateway unavailable; paid flows will answer 503");
                Arc::new(UnconfiguredPaymentGateway)
            }
        },
        None => {
            warn!("mpesa credentials not configured; paid flows will answer 503");
            Arc::new(UnconfiguredPaymentGateway)
        }
    };

    let scheduler: Arc<dyn MeetingScheduler> = match &config.calendar {
        Some(calendar) => match CalendarHttpScheduler::new(calendar.clone()) {
            Ok(scheduler) => Arc::new(scheduler),
            Err(err) => {
                warn!(error = %err, "calendar integration unavailable; sessions proceed without meet links");
                Arc::new(DisabledMeetingScheduler)
            }
        },
        None => {
            warn!("calendar credentials not configured; sessions proceed without meet links");
            Arc::new(DisabledMeetingScheduler)
        }
    };

    let team_service = TeamService::new(
        teams.clone(),
        users.clone(),
        challenges.clone(),
        notifications.clone(),
        payments.clone(),
        gateway.clone(),
    );

    HttpState {
        accounts: Arc::new(AccountService::new(
            users.clone(),
            subscriptions.clone(),
            challenges.clone(),
        )),
        sessions: Arc::new(SessionService::new(
            sessions.clone(),
            users,
            challenges.clone(),
            notifications.clone(),
            scheduler,
        )),
        teams: Arc::new(team_service.clone()),
        challenges: Arc::new(ChallengeService::new(
            challenges.clone(),
            notifications.clone(),
        )),
        subscriptions: Arc::new(SubscriptionService::new(
            subscriptions.clone(),
            payments.clone(),
            gateway,
            notifications.clone(),
        )),
        payments: Arc::new(PaymentService::new(
            payments,
            subscriptions,
            teams,
            notifications.clone(),
            team_service,
        )),
        notifications: Arc::new(NotificationService::new(notifications)),
        dashboard: Arc::new(DashboardService::new(sessions, challenges)),
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
        .wrap(session)
        .service(signup)
        .service(login)
        .service(logout)
        .service(get_profile)
        .service(update_profile)
        .service(change_password)
        .service(list_sessions)
        .service(create_session)
        .service(join_session)
        .service(start_session)
        .service(complete_session)
        .service(list_teams)
        .service(create_team)
        .service(join_team)
        .service(initiate_team_payment)
        .service(leave_team)
        .service(list_team_messages)
        .service(post_team_message)
        .service(list_challenges)
        .service(create_challenge)
        .service(join_challenge)
        .service(update_progress)
        .service(list_plans)
        .service(subscribe)
        .service(mpesa_callback)
        .service(list_notifications)
        .service(mark_notifications_read)
        .service(get_dashboard);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server from the given configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(build_http_state(&config));
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        db_pool: _,
        mpesa: _,
        calendar: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
