//! Location backend: permission sequence and position lookup off the
//! screen thread.

use std::sync::Arc;

use skycast_weather::{request_current_position, Coordinates, LocationError, LocationOptions, LocationResolver};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug)]
pub enum LocationServiceMessage {
    LocationDone {
        generation: u64,
        result: Result<Coordinates, LocationError>,
    },
}

/// Request the device position. Sends `LocationDone` when complete.
pub fn request_location<M>(
    runtime: &tokio::runtime::Handle,
    tx: &UnboundedSender<M>,
    resolver: Arc<dyn LocationResolver>,
    options: LocationOptions,
    generation: u64,
) where
    M: From<LocationServiceMessage> + Send + 'static,
{
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = request_current_position(resolver.as_ref(), &options).await;
        let _ = tx.send(M::from(LocationServiceMessage::LocationDone { generation, result }));
    });
}
