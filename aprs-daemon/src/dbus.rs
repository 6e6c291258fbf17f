//! D-Bus surface of the daemon.
//!
//! Exposes [`ApInterfaceService`] as `org.aprs.ApInterface1`. A request that
//! could not be carried out becomes an `org.freedesktop.DBus.Error.Failed`
//! reply; a request that was carried out but answered "no" (invalid
//! parameters, hostapd did not come up) returns `false`.
//!
//! The `HostapdState` property emits `PropertiesChanged` on every hostapd
//! transition of the current interface, and when the interface goes away.

use aprs::{
    ApInterfaceService, EncryptionType, HostapdParams, HostapdState, InterfaceHandle, Reply,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::{Mutex, mpsc, watch};
use zbus::{Connection, connection, fdo, interface};

pub const BUS_NAME: &str = "org.aprs.ApInterface";
pub const OBJECT_PATH: &str = "/org/aprs/ApInterface";

/// State updates of the current interface, `None` once it is torn down.
pub type StateFeed = Option<watch::Receiver<HostapdState>>;

/// The object served at [`OBJECT_PATH`].
///
/// Handles cross the bus as their id string. Only the handle of the current
/// interface is kept; older ones are reported stale.
pub struct ApInterfaceObject {
    service: ApInterfaceService,
    handles: Mutex<HashMap<String, InterfaceHandle>>,
    feed: mpsc::UnboundedSender<StateFeed>,
}

impl ApInterfaceObject {
    /// Creates the object. State receivers of each new interface are sent
    /// on `feed` so they can be turned into property change signals.
    pub fn new(service: ApInterfaceService, feed: mpsc::UnboundedSender<StateFeed>) -> Self {
        Self {
            service,
            handles: Mutex::new(HashMap::new()),
            feed,
        }
    }

    async fn resolve(&self, handle: &str) -> fdo::Result<InterfaceHandle> {
        self.handles
            .lock()
            .await
            .get(handle)
            .cloned()
            .ok_or_else(|| fdo::Error::Failed(aprs::ApError::StaleHandle.to_string()))
    }

    fn watch_states(&self, states: StateFeed) {
        if self.feed.send(states).is_err() {
            debug!("No state forwarder running");
        }
    }
}

/// Maps a reply to the D-Bus result: `Some` on success, `None` when rejected.
fn into_dbus<T>(method: &str, reply: Reply<T>) -> fdo::Result<Option<T>> {
    match reply {
        Reply::Success(value) => Ok(Some(value)),
        Reply::Rejected(e) => {
            info!("{method} rejected: {e}");
            Ok(None)
        }
        Reply::Failed(e) => Err(fdo::Error::Failed(e.to_string())),
    }
}

#[interface(name = "org.aprs.ApInterface1")]
impl ApInterfaceObject {
    /// Creates the AP interface. Returns its handle, or an empty string if
    /// one already exists.
    async fn create_ap_interface(&self) -> fdo::Result<String> {
        let handle = into_dbus("CreateApInterface", self.service.create_ap_interface().await)?;
        let Some(handle) = handle.flatten() else {
            debug!("AP interface already exists");
            return Ok(String::new());
        };

        match self.service.manager().subscribe(&handle).await {
            Ok(states) => self.watch_states(Some(states)),
            Err(e) => warn!("Not forwarding hostapd state of {handle}: {e}"),
        }

        let id = handle.id().to_string();
        let mut handles = self.handles.lock().await;
        handles.clear();
        handles.insert(id.clone(), handle);
        Ok(id)
    }

    async fn get_interface_name(&self, handle: &str) -> fdo::Result<String> {
        let handle = self.resolve(handle).await?;
        into_dbus("GetInterfaceName", self.service.get_interface_name(&handle).await)?
            .ok_or_else(|| fdo::Error::Failed("interface name unavailable".to_string()))
    }

    /// Returns whether the config was written.
    async fn write_hostapd_config(
        &self,
        handle: &str,
        ssid: Vec<u8>,
        is_hidden: bool,
        channel: u32,
        encryption_type: u32,
        passphrase: Vec<u8>,
    ) -> fdo::Result<bool> {
        let handle = self.resolve(handle).await?;
        let encryption = match EncryptionType::try_from(encryption_type) {
            Ok(encryption) => encryption,
            Err(e) => {
                info!("WriteHostapdConfig rejected: {e}");
                return Ok(false);
            }
        };
        let params = HostapdParams::new(ssid, is_hidden, channel, encryption, passphrase);
        let reply = self.service.write_hostapd_config(&handle, &params).await;
        Ok(into_dbus("WriteHostapdConfig", reply)?.is_some())
    }

    /// Returns whether hostapd was started.
    async fn start_hostapd(&self, handle: &str) -> fdo::Result<bool> {
        let handle = self.resolve(handle).await?;
        let reply = self.service.start_hostapd(&handle).await;
        Ok(into_dbus("StartHostapd", reply)?.is_some())
    }

    /// Returns whether hostapd was stopped.
    async fn stop_hostapd(&self, handle: &str) -> fdo::Result<bool> {
        let handle = self.resolve(handle).await?;
        let reply = self.service.stop_hostapd(&handle).await;
        Ok(into_dbus("StopHostapd", reply)?.is_some())
    }

    /// Tears the interface down. Handles are dropped even if that fails,
    /// since the slot is released either way.
    async fn tear_down_interfaces(&self) -> fdo::Result<()> {
        let reply = self.service.tear_down_interfaces().await;
        self.handles.lock().await.clear();
        self.watch_states(None);
        into_dbus("TearDownInterfaces", reply)?;
        Ok(())
    }

    /// hostapd state of the current interface, or "none".
    #[zbus(property)]
    async fn hostapd_state(&self) -> String {
        match self.service.manager().status().await {
            Some(status) => status.hostapd.to_string(),
            None => "none".to_string(),
        }
    }
}

/// Calls `emit` whenever the watched interface changes state or is replaced.
///
/// Returns once every feed sender is gone.
async fn forward_states<F, Fut>(mut feeds: mpsc::UnboundedReceiver<StateFeed>, mut emit: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    enum Event {
        Feed(StateFeed),
        Changed { alive: bool },
    }

    let mut current: StateFeed = None;
    loop {
        let event = tokio::select! {
            feed = feeds.recv() => match feed {
                Some(feed) => Event::Feed(feed),
                None => return,
            },
            alive = changed(&mut current) => Event::Changed { alive },
        };
        match event {
            Event::Feed(feed) => current = feed,
            // Sender dropped: the interface was retired
            Event::Changed { alive: false } => current = None,
            Event::Changed { alive: true } => {}
        }
        emit().await;
    }
}

async fn changed(states: &mut StateFeed) -> bool {
    match states {
        Some(states) => states.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}

async fn emit_state_changed(conn: &Connection) -> zbus::Result<()> {
    let iface = conn
        .object_server()
        .interface::<_, ApInterfaceObject>(OBJECT_PATH)
        .await?;
    iface
        .get()
        .await
        .hostapd_state_changed(iface.signal_emitter())
        .await
}

/// Connects to the bus, claims [`BUS_NAME`] and serves the object.
///
/// The returned connection must be kept alive for as long as the object
/// should be reachable.
pub async fn serve(service: ApInterfaceService, session: bool) -> zbus::Result<Connection> {
    let builder = if session {
        connection::Builder::session()?
    } else {
        connection::Builder::system()?
    };

    let (feed, feeds) = mpsc::unbounded_channel();
    let conn = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, ApInterfaceObject::new(service, feed))?
        .build()
        .await?;

    let signal_conn = conn.clone();
    tokio::spawn(forward_states(feeds, move || {
        let conn = signal_conn.clone();
        async move {
            if let Err(e) = emit_state_changed(&conn).await {
                warn!("Failed to emit HostapdState change: {e}");
            }
        }
    }));

    info!(
        "Serving {OBJECT_PATH} as {BUS_NAME} on the {} bus",
        if session { "session" } else { "system" }
    );
    Ok(conn)
}
