/// Example bringing up a WPA2 access point for a short while.
///
/// Needs root (or CAP_NET_ADMIN) and a hostapd binary. The interface and
/// timing can be adjusted with the `AP_INTERFACE` and `AP_SECONDS`
/// environment variables.
use aprs::{ApConfig, ApInterfaceManager, EncryptionType, HostapdParams, TimeoutConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> aprs::Result<()> {
    env_logger::init();

    let interface = std::env::var("AP_INTERFACE").unwrap_or_else(|_| "wlan0".to_string());
    let seconds = std::env::var("AP_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    // Some drivers take a while to bring the interface up
    let timeouts = TimeoutConfig::new()
        .with_startup_timeout(Duration::from_secs(5))
        .with_interface_timeout(Duration::from_secs(5));
    let manager =
        ApInterfaceManager::with_config(ApConfig::default().with_interface(interface).with_timeouts(timeouts));

    let ap = manager.create_ap_interface().await?;
    println!("Created AP interface {}", ap.name());

    let params = HostapdParams::new(
        "aprs-demo",
        false,
        6,
        EncryptionType::Wpa2,
        std::env::var("AP_PASSPHRASE").unwrap_or_else(|_| "super secret".to_string()),
    );
    manager.write_hostapd_config(&ap, &params).await?;

    match manager.start_hostapd(&ap).await {
        Ok(()) => println!("hostapd running, serving for {seconds}s..."),
        Err(e) if e.is_rejection() => {
            eprintln!("hostapd did not come up: {e}");
            manager.tear_down_interfaces().await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    tokio::time::sleep(Duration::from_secs(seconds)).await;
    println!("hostapd state: {}", manager.refresh(&ap).await?);

    manager.stop_hostapd(&ap).await?;
    manager.tear_down_interfaces().await?;
    println!("Done");

    Ok(())
}
