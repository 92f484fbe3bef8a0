use dashframe::{panel_json, Dashboard, DashboardError, JsonDirSource};
use std::env;

/// Prints the weather figures of a station from the JSON exports in the given
/// directory, or in the default data directory.
#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    let mut args = env::args().skip(1);
    let station = args.next().unwrap_or_else(|| "KTXHOUST1".to_string());
    let source = match args.next() {
        Some(dir) => JsonDirSource::new(dir),
        None => JsonDirSource::open_default().await?,
    };
    let dashboard = Dashboard::new(source);

    let figures = dashboard.weather().station(&station).time("d1").call().await;
    match panel_json(figures) {
        Some(json) => println!("{json}"),
        None => println!("No figures for {station}"),
    }

    let latest = dashboard.weather().latest(&station).await;
    println!("{:#?}", latest.ok());

    dashboard.shutdown().await
}
