pub mod location_service;
pub mod weather_service;

pub use location_service::{request_location, LocationServiceMessage};
pub use weather_service::{
    request_current as request_weather_current, request_detail as request_weather_detail,
    request_forecast as request_weather_forecast, WeatherError, WeatherQuery,
    WeatherServiceMessage,
};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Channel a screen model owns: spawned tasks post results on `tx`, the
/// model drains `rx` from its own thread.
pub struct ServiceChannel<M> {
    runtime: Handle,
    tx: mpsc::UnboundedSender<M>,
    rx: mpsc::UnboundedReceiver<M>,
}

impl<M> ServiceChannel<M> {
    pub fn new(runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { runtime, tx, rx }
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn sender(&self) -> &mpsc::UnboundedSender<M> {
        &self.tx
    }

    /// Next pending message, if any
    pub fn try_recv(&mut self) -> Option<M> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next message. The channel keeps its own sender, so this
    /// only returns `None` if the receiver was closed.
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }
}
