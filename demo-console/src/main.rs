use std::sync::Arc;

use console_auth::{
    AuthController, AuthProvider, AuthSettings, CookieJar, HistoryNavigator, HttpAuthEndpoint,
    RecordService,
};
use serde_json::Map;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("console_auth=trace,{app_name}=trace,info").into()
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = app_name;
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("You can increase verbosity by setting the RUST_LOG environment variable.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("demo_console");

    let settings = match AuthSettings::from_env().resolve().await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Could not resolve settings from the auth server: {e}");
            let settings = AuthSettings::from_env();
            settings.validate()?;
            settings
        }
    };
    tracing::info!(
        "Auth server: {}, session cookie: {}",
        settings.auth_url,
        settings.session_cookie_name()
    );

    let jar = CookieJar::from_header(
        &settings.app_root,
        &std::env::var("CONSOLE_COOKIES").unwrap_or_default(),
    )?;
    let navigator = Arc::new(HistoryNavigator::new(settings.app_root.clone()));
    let endpoint = Arc::new(HttpAuthEndpoint::from_settings(&settings, &jar)?);
    let jar = Arc::new(jar);
    let controller = Arc::new(AuthController::new(
        &settings,
        jar.clone(),
        endpoint,
        navigator.clone(),
    ));

    let session = controller.session_store();
    tracing::info!(
        "Session cookie '{}' present: {}",
        session.cookie_name(),
        session.token().is_some()
    );

    let outcome = controller.check_auth().await.unwrap_or_else(|e| {
        tracing::warn!("Session check rejected: {e}");
        e.outcome()
    });
    tracing::info!("Session check: {:?}", outcome);

    if outcome.is_valid() {
        let records = RecordService::new(settings.backend_url.clone(), &jar, controller.clone())?;
        match records.get_list("users", &Map::new(), &[]).await {
            Ok(users) => tracing::info!("{} users visible to this session", users.total),
            Err(e) => tracing::error!("Listing users failed: {e}"),
        }
    } else {
        controller.login(Default::default()).await?;
    }

    for url in navigator.visited() {
        tracing::info!("Browser would navigate to: {url}");
    }

    Ok(())
}
