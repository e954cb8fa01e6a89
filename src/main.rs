use std::time::{Duration, Instant};

use anyhow::Result;
use skyview_ui::{AppServices, AuthView, Panel};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STARTUP_WAIT: Duration = Duration::from_secs(15);

fn main() -> Result<()> {
    // Initialize core
    skyview_core::init()?;

    let (config, _validation) = skyview_core::Config::load_validated()?;
    let services = AppServices::new(config)?;
    services.init();

    tracing::info!("SkyView started");

    println!("SkyView - Weather Dashboard");
    println!("  Config directory: {}", services.config().config_dir.display());

    let auth = services.auth_model();
    match auth.view() {
        AuthView::Dashboard => {
            let mut dashboard = services.dashboard_model();
            println!("  Welcome back, {}!", dashboard.greeting_name());

            dashboard.mount();
            let started = Instant::now();
            while dashboard.is_loading() && started.elapsed() < STARTUP_WAIT {
                std::thread::sleep(POLL_INTERVAL);
                dashboard.poll_channel();
            }

            match dashboard.panel() {
                Panel::Weather(snapshot) => {
                    println!(
                        "  {}, {}: {} {} (feels like {}{}), humidity {}%, wind {}",
                        snapshot.city,
                        snapshot.country,
                        snapshot.temperature_display(),
                        snapshot.condition_display(),
                        dashboard.display_temperature(snapshot.feels_like),
                        dashboard.unit_system().temperature_symbol(),
                        snapshot.humidity,
                        snapshot.wind_display()
                    );
                    println!("  Sunrise {} / Sunset {}", snapshot.sunrise, snapshot.sunset);
                }
                Panel::Loading => println!("  Weather still loading for {}", dashboard.selected_city()),
                Panel::Placeholder => {
                    for note in dashboard.take_notifications() {
                        println!("  {}: {}", note.title, note.description);
                    }
                }
            }
        }
        view => println!("  Not signed in ({:?})", view),
    }

    // Graceful shutdown
    services.shutdown();

    Ok(())
}
