//! Weather backend: async weather fetching.
//! All network work runs off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use skyview_weather::{UnitSystem, WeatherError, WeatherProvider, WeatherSnapshot};
use tokio::runtime::Handle;

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of one fetch, tagged with the sequence number it was issued under
    FetchDone {
        seq: u64,
        city: String,
        units: UnitSystem,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Request current conditions for `city` asynchronously.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    provider: Arc<WeatherProvider>,
    seq: u64,
    city: String,
    units: UnitSystem,
) {
    let tx = tx.clone();

    runtime.spawn(async move {
        let result = provider.fetch_weather(&city, units).await;
        if tx
            .send(WeatherServiceMessage::FetchDone {
                seq,
                city,
                units,
                result,
            })
            .is_err()
        {
            tracing::debug!("Weather result for fetch #{} has no receiver", seq);
        }
    });
}
