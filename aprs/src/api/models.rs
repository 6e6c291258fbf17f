use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use uuid::Uuid;

use crate::types::constants::{DEFAULT_INTERFACE, paths, timeouts};

/// Access point encryption types.
///
/// The numeric codes match the ones used on the D-Bus surface:
/// `0 = Open`, `1 = Wpa`, `2 = Wpa2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionType {
    /// No authentication, passphrase is ignored
    Open,
    /// WPA/WPA2 mixed mode (TKIP and CCMP)
    Wpa,
    /// WPA2-PSK with CCMP only
    Wpa2,
}

impl EncryptionType {
    /// Returns `true` if a passphrase is required.
    pub fn secured(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Returns the numeric code used on the wire.
    pub fn to_code(&self) -> u32 {
        match self {
            Self::Open => 0,
            Self::Wpa => 1,
            Self::Wpa2 => 2,
        }
    }
}

impl TryFrom<u32> for EncryptionType {
    type Error = ValidationError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Open),
            1 => Ok(Self::Wpa),
            2 => Ok(Self::Wpa2),
            v => Err(ValidationError::UnknownEncryption(v)),
        }
    }
}

impl Display for EncryptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Wpa => write!(f, "WPA"),
            Self::Wpa2 => write!(f, "WPA2"),
        }
    }
}

/// WiFi band selection, derived from the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiBand {
    /// 2.4 GHz band
    Bg,
    /// 5 GHz band
    A,
}

impl WifiBand {
    /// The value of hostapd's `hw_mode` key for this band.
    pub fn hw_mode(&self) -> char {
        match self {
            Self::Bg => 'g',
            Self::A => 'a',
        }
    }
}

/// Caller-supplied access point parameters.
///
/// These are validated and serialized by
/// [`build_hostapd_config`](crate::builders::build_hostapd_config).
///
/// # Example
///
/// ```rust
/// use aprs::{EncryptionType, HostapdParams};
///
/// let params = HostapdParams::new("foobar", false, 6, EncryptionType::Wpa2, "super secret");
/// assert_eq!(params.ssid, b"foobar");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct HostapdParams {
    /// Network name, 1 to 32 bytes, not necessarily UTF-8
    pub ssid: Vec<u8>,
    /// Whether the SSID is left out of beacons
    pub hidden: bool,
    /// 802.11 channel number
    pub channel: u32,
    /// Security mode
    pub encryption: EncryptionType,
    /// Passphrase bytes, ignored for open networks
    pub passphrase: Vec<u8>,
}

impl HostapdParams {
    /// Creates a parameter set from its parts.
    pub fn new(
        ssid: impl Into<Vec<u8>>,
        hidden: bool,
        channel: u32,
        encryption: EncryptionType,
        passphrase: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            ssid: ssid.into(),
            hidden,
            channel,
            encryption,
            passphrase: passphrase.into(),
        }
    }
}

impl fmt::Debug for HostapdParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostapdParams")
            .field("ssid", &String::from_utf8_lossy(&self.ssid))
            .field("hidden", &self.hidden)
            .field("channel", &self.channel)
            .field("encryption", &self.encryption)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Lifecycle of the supervised hostapd process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostapdState {
    /// No hostapd process is running.
    Stopped,
    /// hostapd was launched and is being probed.
    Starting,
    /// hostapd is confirmed alive and the interface is up.
    Running,
    /// hostapd was told to exit and the interface is being brought down.
    Stopping,
}

impl HostapdState {
    /// Returns `true` while a hostapd process may exist.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl Display for HostapdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

/// Reference to the live AP interface.
///
/// Handles are cheap to clone. Once the interface is torn down, operations
/// on an old handle fail with [`ApError::NoInterface`] while no interface
/// exists, and with [`ApError::StaleHandle`] once a new one has been created,
/// even if it has the same kernel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceHandle {
    pub(crate) id: Uuid,
    pub(crate) name: String,
}

impl InterfaceHandle {
    /// Unique id of this interface instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Kernel interface name, e.g. `wlan0`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for InterfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Read-only snapshot of the AP interface.
#[derive(Debug, Clone)]
pub struct ApStatus {
    /// Handle to the interface
    pub handle: InterfaceHandle,
    /// When the interface was created
    pub created_at: SystemTime,
    /// Current hostapd lifecycle state
    pub hostapd: HostapdState,
    /// Whether a valid config has been written for this interface
    pub config_written: bool,
}

/// Timeouts used while supervising hostapd.
///
/// The exact durations are policy. Shorter settle delays make start faster
/// but widen the window in which a hostapd that dies during startup goes
/// unnoticed.
///
/// # Example
///
/// ```rust
/// use aprs::TimeoutConfig;
/// use std::time::Duration;
///
/// let config = TimeoutConfig::new()
///     .with_startup_timeout(Duration::from_secs(5))
///     .with_settle_delay(Duration::from_millis(1500));
/// assert_eq!(config.startup_timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Upper bound for hostapd to be confirmed running
    pub startup_timeout: Duration,
    /// How long hostapd must survive after launch to count as running
    pub settle_delay: Duration,
    /// Upper bound for hostapd to exit after being killed
    pub death_timeout: Duration,
    /// Upper bound for the kernel to report the interface up
    pub interface_timeout: Duration,
    /// Interval between probes
    pub poll_interval: Duration,
}

impl TimeoutConfig {
    /// Creates a config with the default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the startup timeout.
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Sets the settle delay.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the death confirmation timeout.
    pub fn with_death_timeout(mut self, timeout: Duration) -> Self {
        self.death_timeout = timeout;
        self
    }

    /// Sets the interface up confirmation timeout.
    pub fn with_interface_timeout(mut self, timeout: Duration) -> Self {
        self.interface_timeout = timeout;
        self
    }

    /// Sets the probe interval, raised to at least
    /// [`TimeoutConfig::MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Self::MIN_POLL_INTERVAL);
        self
    }

    /// Shortest probe interval the poll loops use.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

    /// The probe interval actually used, even if the field was set below the
    /// minimum directly.
    pub(crate) fn effective_poll_interval(&self) -> Duration {
        self.poll_interval.max(Self::MIN_POLL_INTERVAL)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            startup_timeout: timeouts::startup_timeout(),
            settle_delay: timeouts::settle_delay(),
            death_timeout: timeouts::death_timeout(),
            interface_timeout: timeouts::interface_timeout(),
            poll_interval: timeouts::poll_interval(),
        }
    }
}

/// Configuration for an [`ApInterfaceManager`](crate::ApInterfaceManager).
///
/// # Example
///
/// ```rust
/// use aprs::ApConfig;
///
/// let config = ApConfig::default()
///     .with_interface("wlan1")
///     .with_config_path("/tmp/hostapd.conf");
/// assert_eq!(config.interface, "wlan1");
/// ```
#[derive(Debug, Clone)]
pub struct ApConfig {
    /// Interface to run the access point on
    pub interface: String,
    /// hostapd executable
    pub hostapd_binary: PathBuf,
    /// Arguments placed before the config path on the hostapd command line
    pub hostapd_args: Vec<String>,
    /// Where the generated config is written
    pub config_path: PathBuf,
    /// Directory for hostapd's control sockets
    pub ctrl_interface: PathBuf,
    /// Supervision timeouts
    pub timeouts: TimeoutConfig,
}

impl ApConfig {
    /// Sets the interface name.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Sets the hostapd executable and the arguments placed before the config path.
    pub fn with_hostapd(mut self, binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        self.hostapd_binary = binary.into();
        self.hostapd_args = args;
        self
    }

    /// Sets where the generated config is written.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Sets the control socket directory.
    pub fn with_ctrl_interface(mut self, path: impl Into<PathBuf>) -> Self {
        self.ctrl_interface = path.into();
        self
    }

    /// Sets the supervision timeouts.
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }
}

impl Default for ApConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            hostapd_binary: PathBuf::from(paths::HOSTAPD_BINARY),
            hostapd_args: Vec::new(),
            config_path: PathBuf::from(paths::HOSTAPD_CONFIG),
            ctrl_interface: PathBuf::from(paths::CTRL_INTERFACE),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// A hostapd parameter that failed validation.
///
/// Nothing is written to disk when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The SSID is empty.
    #[error("SSID must not be empty")]
    EmptySsid,

    /// The SSID is longer than 32 bytes.
    #[error("SSID is {0} bytes, at most 32 are allowed")]
    SsidTooLong(usize),

    /// The channel is not one hostapd can run an AP on.
    #[error("invalid channel: {0}")]
    InvalidChannel(u32),

    /// The passphrase is too short or too long for the encryption type.
    #[error("passphrase must be 8-63 characters or 64 hex digits, got {0} bytes")]
    PassphraseLength(usize),

    /// The passphrase contains bytes outside printable ASCII.
    #[error("passphrase must be printable ASCII")]
    PassphraseCharacters,

    /// An encryption code outside the known set.
    #[error("unknown encryption type code: {0}")]
    UnknownEncryption(u32),
}

/// Errors returned by access point operations.
///
/// Use [`ApError::is_rejection`] to tell domain-level failures (bad input,
/// hostapd not coming up) from precondition and I/O failures.
///
/// # Example
///
/// ```no_run
/// use aprs::{ApError, ApInterfaceManager};
///
/// # async fn example() -> aprs::Result<()> {
/// let manager = ApInterfaceManager::new();
/// let handle = manager.create_ap_interface().await?;
///
/// match manager.start_hostapd(&handle).await {
///     Ok(()) => println!("AP is up"),
///     Err(ApError::NoConfig) => eprintln!("write a config first"),
///     Err(e) if e.is_rejection() => eprintln!("hostapd did not start: {e}"),
///     Err(e) => return Err(e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Error)]
pub enum ApError {
    /// A config parameter was invalid.
    #[error("invalid hostapd parameters: {0}")]
    Validation(#[from] ValidationError),

    /// An AP interface already exists.
    #[error("AP interface {0} already exists")]
    AlreadyExists(String),

    /// No AP interface exists.
    #[error("no AP interface exists")]
    NoInterface,

    /// The handle refers to an interface that was torn down.
    #[error("interface handle is stale")]
    StaleHandle,

    /// hostapd was asked to start before a config was written.
    #[error("no hostapd config has been written")]
    NoConfig,

    /// Querying or setting the interface up/down state failed.
    #[error("failed to access state of interface {interface}: {source}")]
    InterfaceState {
        interface: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the hostapd config failed.
    #[error("failed to write hostapd config to {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Checking for the hostapd config failed for a reason other than absence.
    #[error("failed to access hostapd config at {}: {source}", .path.display())]
    ConfigAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Spawning or probing the hostapd process failed.
    #[error("hostapd process error ({context}): {source}")]
    Process {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// hostapd was not confirmed running in time.
    #[error("hostapd not confirmed running within {0:?}")]
    StartupTimeout(Duration),

    /// hostapd exited during startup, usually because it rejected its config.
    #[error("hostapd exited during startup (status: {})", exit_status_label(.0))]
    ProcessExited(Option<i32>),

    /// The interface was not reported up in time.
    #[error("interface {0} did not come up")]
    InterfaceNotUp(String),
}

fn exit_status_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

impl ApError {
    /// Returns `true` for domain-level failures.
    ///
    /// These leave no partial state behind and the caller may retry with
    /// different input. Everything else is a precondition or I/O failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::StartupTimeout(_)
                | Self::ProcessExited(_)
                | Self::InterfaceNotUp(_)
        )
    }
}
