//! Event loop
//!
//! Everything runs on one thread. Timers and the route fetch report back
//! over a channel; the session is only touched from the loop itself.

use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use smol::stream::StreamExt;
use smol::{LocalExecutor, Task, Timer};
use waypoint_geo::{LngLat, PlatformPermission, SimulatedDevice};
use waypoint_net::{
    DirectionsClient, DirectionsError, HistoryClient, HistoryRecord, LoaderConfig, ResourceLoader,
    RouteResult,
};
use waypoint_session::{
    DestinationCandidate, LocationBanner, NavigationSession, RouteTicket, SessionConfig, SessionPhase,
    ViewModel,
};

use crate::cli::Cli;
use crate::console_map::ConsoleMap;
use crate::track;

/// The map widget reports it has loaded after this long
const MAP_LOAD_DELAY: Duration = Duration::from_millis(300);

/// HTTP deadline past the route timeout, so the session's timeout decides
const ROUTE_HTTP_GRACE: Duration = Duration::from_secs(2);

enum AppEvent {
    Tick,
    MapLoaded,
    RouteFinished(RouteTicket, Result<RouteResult, DirectionsError>),
}

type Session = NavigationSession<SimulatedDevice, ConsoleMap>;

pub async fn run(ex: &LocalExecutor<'_>, cli: Cli) -> Result<()> {
    let fixes = track::load(&cli.track)?;
    tracing::info!("Loaded {} fixes from {}", fixes.len(), cli.track.display());

    let mut device = SimulatedDevice::with_track(fixes).starting_at(epoch_ms());
    if cli.deny_location {
        device.answer_prompts_with(PlatformPermission::Denied);
    }

    let config = cli.session_config();
    let directions = Rc::new(DirectionsClient::new(
        ResourceLoader::new(directions_loader_config(&config))?,
        cli.directions_url.clone(),
        cli.access_token.clone(),
    ));
    let history = HistoryClient::new(ResourceLoader::new(LoaderConfig::default())?, cli.backend_url.clone());

    let mut session: Session = NavigationSession::new(device, ConsoleMap::default(), config);

    let (tx, rx) = smol::channel::unbounded();
    {
        let tx = tx.clone();
        ex.spawn(async move {
            Timer::after(MAP_LOAD_DELAY).await;
            let _ = tx.send(AppEvent::MapLoaded).await;
        })
        .detach();
    }
    {
        let tx = tx.clone();
        let mut ticker = Timer::interval(cli.interval());
        ex.spawn(async move {
            while ticker.next().await.is_some() {
                if tx.send(AppEvent::Tick).await.is_err() {
                    break;
                }
            }
        })
        .detach();
    }

    // Pick and save the destination before tracking starts
    match (&cli.to, cli.history) {
        (Some(name), _) => {
            let (Some(lng), Some(lat)) = (cli.lng, cli.lat) else {
                bail!("--to needs --lng and --lat");
            };
            session.select_destination(DestinationCandidate {
                id: format!("cli.{}", name.to_lowercase().replace(' ', "-")),
                name: Some(name.clone()),
                coordinates: Some(LngLat::new(lng, lat)),
            })?;
            session.start_navigation(&history).await.context("Could not start navigation")?;
        }
        (None, Some(index)) => {
            let recent = session.recent_destinations(&history).await?;
            let record = recent
                .get(index)
                .with_context(|| format!("No recent destination #{} ({} available)", index, recent.len()))?;
            session
                .navigate_to_history(record, &history)
                .await
                .context("Could not start navigation")?;
        }
        (None, None) => {
            let recent = session.recent_destinations(&history).await?;
            print_recent(&recent);
            return Ok(());
        }
    }

    session.start_tracking();
    let tick_ms = cli.interval().as_millis() as u64;
    let mut banner = session.view().banner;
    let mut route_task: Option<Task<()>> = None;
    let mut awaiting: Option<RouteTicket> = None;

    while let Ok(event) = rx.recv().await {
        match event {
            AppEvent::Tick => {
                for event in session.device_mut().advance(tick_ms) {
                    session.handle_device_event(event);
                }
            }
            AppEvent::MapLoaded => {
                let replayed = session.map_loaded();
                tracing::info!("Map loaded ({} commands applied)", replayed);
            }
            AppEvent::RouteFinished(ticket, result) => {
                if awaiting == Some(ticket) {
                    awaiting = None;
                    route_task = None;
                }
                if session.complete_route(ticket, result) {
                    report_route(session.view());
                }
            }
        }

        if let Some(ticket) = session.take_route_request() {
            let directions = Rc::clone(&directions);
            let tx = tx.clone();
            let timeout = session.config().route_timeout;
            // Replacing the handle cancels the fetch for the previous pair
            route_task = Some(ex.spawn(async move {
                let result = ticket.fetch(&*directions, timeout).await;
                let _ = tx.send(AppEvent::RouteFinished(ticket, result)).await;
            }));
            awaiting = Some(ticket);
        }

        let view = session.view();
        if view.banner != banner {
            banner = view.banner;
            log_banner(banner);
        }

        if session.phase() == SessionPhase::Completed {
            tracing::info!("You have arrived");
            break;
        }
        if session.tracker().permission().is_terminal() {
            tracing::warn!("Location is {}, stopping", session.tracker().permission());
            session.stop_navigation()?;
            break;
        }
        if session.device().is_exhausted() && awaiting.is_none() {
            tracing::info!("Track finished before arrival");
            session.stop_navigation()?;
            break;
        }
    }

    drop(route_task);
    session.stop_tracking();
    tracing::info!("{} map commands applied", session.renderer().surface().applied());
    Ok(())
}

fn directions_loader_config(config: &SessionConfig) -> LoaderConfig {
    LoaderConfig::default().with_timeout(config.route_timeout + ROUTE_HTTP_GRACE)
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn log_banner(banner: LocationBanner) {
    match banner {
        LocationBanner::Denied | LocationBanner::Unavailable => tracing::warn!("{}", banner.message()),
        _ => tracing::info!("{}", banner.message()),
    }
}

fn report_route(view: &ViewModel) {
    match view.route_summary {
        Some(summary) => {
            let km = summary.distance_meters.map(|m| m / 1000.0).unwrap_or_default();
            let min = summary.duration_seconds.map(|s| s / 60.0).unwrap_or_default();
            tracing::info!("Route: {:.1} km, about {:.0} min", km, min);
        }
        None if view.route_line.is_none() && !view.route_loading => {
            tracing::info!("No route to show");
        }
        None => {}
    }
}

fn print_recent(records: &[HistoryRecord]) {
    if records.is_empty() {
        println!("No recent destinations");
        return;
    }
    for (i, record) in records.iter().enumerate() {
        println!("{:>2}  {}  ({})  {}", i, record.address_text, record.lng_lat(), record.last_used);
    }
}
