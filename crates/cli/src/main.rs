use pedalhop::prelude::*;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let args: Vec<_> = std::env::args().collect();
    if args.len() < 3 {
        error!("Usage: pedalhop-cli <start lon,lat> <end lon,lat>");
        std::process::exit(1);
    }
    let Some(start) = parse_coordinate(&args[1]) else {
        error!("Invalid start coordinate: {}", args[1]);
        std::process::exit(1);
    };
    let Some(end) = parse_coordinate(&args[2]) else {
        error!("Invalid end coordinate: {}", args[2]);
        std::process::exit(1);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };

    let stations = StationClient::new(&config);
    let directions = DirectionsClient::new(&config);
    let trip = Trip::new(start, end);
    let mut session =
        SessionController::new(HeadlessMap::new(), stations, directions, config, trip);
    session.on_alert(|message| eprintln!("Error: {message}"));
    session.on_selection_change(|selection| {
        info!(
            "Mid station: {} ({} bikes, {} docks)",
            selection.name, selection.bikes_available, selection.docks_available
        );
    });

    if let Err(err) = session.load_map() {
        error!("{err}");
        std::process::exit(1);
    }
    session.handle_event(MapEvent::Loaded).await;

    match session.route_status() {
        RouteStatus::Rendered {
            distance_m,
            duration_s,
        } => info!(
            "Route: {:.1} km, {:.0} min by bike",
            distance_m / 1000.0,
            duration_s / 60.0
        ),
        RouteStatus::NoRoute => info!("No route could be computed"),
        RouteStatus::Pending => info!("No station inventory available"),
    }

    session.destroy();
}

fn parse_coordinate(value: &str) -> Option<Coordinate> {
    let (lon, lat) = value.split_once(',')?;
    Some(Coordinate::new(
        lon.trim().parse().ok()?,
        lat.trim().parse().ok()?,
    ))
}
