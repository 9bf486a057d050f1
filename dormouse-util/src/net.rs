// Copyright (C) 2025 Dormouse Project Developers
//
// MIT License

//! dormouse-util - Networking utilities and helpers
//!
//! The [`Wifi`] object configures and controls dormouse's WiFi station
//! interface.  There is no access-point support - dormouse devices are
//! sleep-mostly reporters, and only ever join a network.
//!
//! # Example
//! ```rust
//! use dormouse_util::net::{InterfaceConfig, Wifi};
//! use embassy_net::StackResources;
//!
//! // Create the STA interface config, and the static resources
//! // `embassy-net` requires to run the networking stack.
//! let stack_resources = make_static!(StackResources::<4>::new());
//! let sta_config = InterfaceConfig {
//!     ssid: String::from("MyNetwork"),
//!     password: String::from("password123"),
//!     net: embassy_net::Config::dhcpv4(Default::default()),
//! };
//!
//! // Create the WiFi object using the builder pattern.  Builds all required
//! // `esp-wifi` and `embassy-net` objects.
//! // <4> is the number of sockets available to the networking stack.
//! let mut wifi = Wifi::builder::<4>()
//!     .with_sta_if(sta_config, stack_resources)
//!     .build(&spawner, timg0, rng, wifi_hw)
//!     .expect("Failed to build WiFi object");
//!
//! // Spawn the WiFi and networking tasks.
//! wifi.must_spawn();
//!
//! // Bring the station up.  Polls the link a bounded number of times and
//! // reports the outcome - the caller decides what a failure means.
//! if wifi.connect_sta().await {
//!     // Use wifi.net_stack() to create sockets, etc.
//! }
//! ```

use alloc::format;
use alloc::string::String;
use core::fmt;
use core::future::pending;
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_net::{Config as NetConfig, Runner, Stack, StackResources, StaticConfigV4};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use esp_hal::peripherals::{RNG, TIMG0, WIFI};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_wifi::wifi::{
    ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiMode,
};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use static_cell::make_static;

use dormouse_core::policy::{ConnectPolicy, PollVerdict};

/// Error type for WiFi operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Hit error in the esp-wifi stack
    Wifi(String),

    /// Configuration error, e.g. missing required configuration
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Wifi(msg) => write!(f, "WiFi stack error: {msg}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

/// WiFi controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Enable the station interface
    Enable,

    /// Disable the station interface and power the radio down
    Disable,
}

/// WiFi interface status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Station interface is enabled
    Enabled,

    /// Station interface is disabled, radio powered down
    Disabled,

    /// Station is connected to the network
    Connected,

    /// Station lost the network
    Disconnected,
}

// Signals used to command the Wifi controller task, and to notify about
// changes in WiFi state.  Used internally with pub [`Wifi`] using them.
static CONTROL: Signal<CriticalSectionRawMutex, Control> = Signal::new();
static STATUS: Signal<CriticalSectionRawMutex, Status> = Signal::new();

/// Configuration for the station interface.
// Do not derive Debug as there appears to be a bug in the embassy-net crate
// leading to a crash when trying to print the Debug representation of
// (Net)Config
#[derive(Clone)]
pub struct InterfaceConfig {
    /// SSID of the WiFi network
    pub ssid: String,

    /// Password for the WiFi network
    pub password: String,

    /// Network configuration for the interface.  Either a static IP or DHCP
    /// configuration.
    pub net: NetConfig,
}

impl core::fmt::Debug for InterfaceConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // DO NOT output net
        f.debug_struct("InterfaceConfig")
            .field("ssid", &self.ssid)
            .field("password", &self.password)
            .finish()
    }
}

/// Builder for the WiFi interface.  Use [`Wifi::builder`] to create a new
/// instance of this builder and see the documentation for that method for
/// examples of how to use it.
#[derive(Default)]
pub struct WifiBuilder<const STA: usize> {
    sta_config: Option<InterfaceConfig>,
    sta_stack_resources: Option<&'static mut StackResources<STA>>,
}

impl<const STA: usize> WifiBuilder<STA> {
    fn new() -> Self {
        Self::default()
    }

    /// Adds the station interface configuration to the builder.
    ///
    /// Arguments:
    /// - `config`: The configuration for the STA interface, including SSID,
    ///   password, and network configuration.
    /// - `stack_resources`: The stack resources for the STA interface, which
    ///   are used to manage the networking stack.
    ///
    /// Returns:
    /// - `Self` to allow method chaining.
    pub fn with_sta_if(
        mut self,
        config: InterfaceConfig,
        stack_resources: &'static mut StackResources<STA>,
    ) -> Self {
        self.sta_config = Some(config);
        self.sta_stack_resources = Some(stack_resources);
        self
    }

    /// Builds the WiFi interface with the specified configuration.
    ///
    /// After this function you likely want to call [`Wifi::must_spawn`] to
    /// start the networking and WiFi tasks.
    ///
    /// Arguments:
    /// - `spawner`: The spawner used to spawn the WiFi tasks.
    /// - `timg0`: The timer group used for WiFi timing.
    /// - `rng`: The random number generator used for WiFi operations.
    /// - `wifi`: The WiFi peripheral to use for the WiFi interface.
    ///
    /// Returns:
    /// - `Ok(Wifi)` if the WiFi interface was built successfully.
    /// - `Err(Error)` if there was an error building the WiFi interface.
    pub fn build(
        self,
        spawner: &Spawner,
        timg0: TIMG0<'static>,
        rng: RNG<'static>,
        wifi: WIFI<'static>,
    ) -> Result<Wifi, Error> {
        let mut wifi_obj = Wifi::new(spawner);
        wifi_obj.init(timg0, rng, wifi, self.sta_config, self.sta_stack_resources)?;
        Ok(wifi_obj)
    }
}

/// Main WiFi object, used to add station connectivity to a dormouse
/// application.
///
/// Uses `esp-wifi` and `embassy-net`.
///
/// See [`Wifi::builder`] for an example of creating and starting WiFi using
/// this object.
pub struct Wifi {
    spawner: Spawner,
    controller: Option<WifiController<'static>>,
    sta_stack: Option<Stack<'static>>,
    sta_runner: Option<Runner<'static, WifiDevice<'static>>>,
    sta_ssid: Option<String>,
}

impl Wifi {
    /// Creates a new WiFi builder with the specified resource (socket) size
    /// for the station interface.
    ///
    /// Generics:
    /// - `STA`: The number of sockets for the station interface
    ///
    /// Returns:
    /// - `WifiBuilder<STA>`
    pub fn builder<const STA: usize>() -> WifiBuilder<STA> {
        WifiBuilder::new()
    }

    // Creates a new WiFi instance with the specified configuration.
    fn new(spawner: &Spawner) -> Self {
        Self {
            spawner: *spawner,
            controller: None,
            sta_stack: None,
            sta_runner: None,
            sta_ssid: None,
        }
    }

    // Initializes the WiFi controller and creates the station interface.
    //
    // Arguments:
    // - `timg0`: The timer group used for WiFi timing
    // - `rng`: The random number generator used for WiFi operations
    // - `wifi`: The WiFi peripheral
    // - `sta_config`: The station interface configuration
    // - `sta_stack_resources`: Stack resources for the station interface
    //
    // Returns:
    // - `Ok(())` if the WiFi controller was initialized successfully
    fn init<const STA: usize>(
        &mut self,
        timg0: TIMG0<'static>,
        rng: RNG<'static>,
        wifi: WIFI<'static>,
        sta_config: Option<InterfaceConfig>,
        sta_stack_resources: Option<&'static mut StackResources<STA>>,
    ) -> Result<(), Error> {
        // Set up the peripherals for WiFi
        let timg0 = TimerGroup::new(timg0);
        let mut rng = Rng::new(rng);

        // Create and configure the WiFi controller.
        // Use &* to make the mutable reference that make_static! returns
        // immutable, which is what esp_wifi expects.
        let esp_wifi_ctrl = &*make_static!(esp_wifi::init(timg0.timer0, rng).unwrap());
        let (mut controller, interfaces) = esp_wifi::wifi::new(esp_wifi_ctrl, wifi).unwrap();

        // Configure and store the controller
        self.configure_wifi(&mut controller, sta_config.as_ref())?;
        self.controller = Some(controller);

        // Set up the station interface, if configured.
        if let Some(sta_config) = sta_config {
            debug!(
                "Info:  Configuring STA interface with SSID: {}",
                sta_config.ssid
            );
            let sta_seed = (rng.random() as u64) << 32 | rng.random() as u64;
            let (sta_stack, sta_runner) = embassy_net::new(
                interfaces.sta,
                sta_config.net.clone(),
                sta_stack_resources.expect("STA stack resources not provided"),
                sta_seed,
            );
            self.sta_stack = Some(sta_stack);
            self.sta_runner = Some(sta_runner);
            self.sta_ssid = Some(sta_config.ssid);
        }

        Ok(())
    }

    // Configures the WiFi controller
    fn configure_wifi(
        &self,
        controller: &mut WifiController<'static>,
        sta_if: Option<&InterfaceConfig>,
    ) -> Result<(), Error> {
        // Avoid power saving mode for more reliable WiFi
        controller
            .set_power_saving(esp_wifi::config::PowerSaveMode::None)
            .inspect_err(|e| {
                error!("Error: Failed to set power WiFi saving mode {e:?}");
            })
            .ok();

        let Some(sta_if) = sta_if else {
            debug!("Info:  No STA interface configured");
            return Ok(());
        };

        debug!(
            "Info:  Configuring STA interface with SSID: {}",
            sta_if.ssid
        );
        let config = Configuration::Client(ClientConfiguration {
            ssid: sta_if.ssid.clone(),
            password: sta_if.password.clone(),
            ..Default::default()
        });

        controller
            .set_configuration(&config)
            .inspect(|_| trace!("Ok:    WiFi configuration set successfully"))
            .inspect_err(|e| {
                warn!("Error: Failed to set WiFi configuration: {e:?}");
            })
            .map_err(|e| Error::Wifi(format!("Failed to set WiFi configuration: {e:?}")))
    }

    /// Spawns the WiFi and networking tasks.  The networking task is
    /// spawned first, so it is ready to handle events when the WiFi
    /// connection is established.
    ///
    /// Uses `Spawner::must_spawn` to ensure that the tasks are spawned or
    /// panics.
    pub fn must_spawn(&mut self) {
        // Start the STA runner
        if self.sta_runner.is_some() {
            let sta_runner = self.sta_runner.take().unwrap();
            self.spawner.must_spawn(net_task(sta_runner));
        }

        // Start the WiFi controller task
        let controller = self
            .controller
            .take()
            .expect("WiFi controller not initialized");
        self.spawner.must_spawn(wifi_controller(controller));
    }

    /// Brings the station up and polls the link state under the bounded
    /// connect policy: up to 7 polls, 500ms apart.  On success, waits for
    /// an IPv4 address and logs the network name and address.  On failure,
    /// reports having exhausted the poll budget.  No retry beyond the
    /// bounded loop - what happens next is the caller's decision.
    ///
    /// Returns:
    /// - `true` if the station connected within the poll budget
    /// - `false` otherwise
    pub async fn connect_sta(&self) -> bool {
        let Some(stack) = self.sta_stack else {
            error!("Error: No STA interface configured");
            return false;
        };
        let ssid = self.sta_ssid.as_deref().unwrap_or("<unconfigured>");

        info!("Exec:  Connecting to {ssid}");
        self.control(Control::Enable);

        let policy = ConnectPolicy::default();
        let mut attempt = policy.begin();
        let connected = loop {
            Timer::after_millis(policy.poll_interval_ms()).await;
            match attempt.record(stack.is_link_up()) {
                PollVerdict::Connected => break true,
                PollVerdict::GaveUp => break false,
                PollVerdict::Retry => {
                    debug!(
                        "Info:  Waiting for {ssid} ({}/{})",
                        attempt.polls(),
                        policy.max_polls()
                    );
                }
            }
        };

        if connected {
            let net_config = wait_for_ipv4(&stack).await;
            info!("Ok:    Connected to {ssid}");
            info!("Value: IP address http://{}", net_config.address.address());
        } else {
            warn!(
                "Error: Couldn't connect to {ssid} after {} polls",
                attempt.polls()
            );
        }
        connected
    }

    /// Disconnects the station and powers the radio down.  Waits for the
    /// WiFi task to confirm.
    pub async fn disconnect_sta(&self) -> Status {
        self.control_and_wait(Control::Disable).await
    }

    /// Waits for a control update.  This is typically received after a
    /// control signal is sent to enable or disable the station, using
    /// [`Self::control`].
    ///
    /// Returns:
    /// - `Status` indicating the current status of the WiFi interface
    pub async fn wait_for_control_update(&self) -> Status {
        STATUS.wait().await
    }

    /// Controls (enables/disables) the station interface.  Use
    /// [`Self::wait_for_control_update`] to wait for a notification that
    /// the action has been applied.
    ///
    /// Arguments:
    /// - `control`: The control action to perform (Enable or Disable)
    pub fn control(&self, control: Control) {
        CONTROL.signal(control);
    }

    /// Controls (enables/disables) the station interface and waits for the
    /// control update to be applied.  This is a convenience method that
    /// combines [`Self::control`] and [`Self::wait_for_control_update`].
    pub async fn control_and_wait(&self, control: Control) -> Status {
        self.control(control);
        self.wait_for_control_update().await
    }

    /// Gets the networking stack for the station interface.
    ///
    /// Returns:
    /// - `Some(Stack)` if the station interface is configured
    /// - `None` if it is not
    pub fn net_stack(&self) -> Option<Stack<'static>> {
        self.sta_stack
    }

    /// Waits for an IPv4 address to be assigned to the station interface.
    /// Useful when using DHCP to obtain an IP address.
    ///
    /// Returns:
    /// - `Ok(config)` the IP address configuration when an address is
    ///   assigned
    /// - `Err(Error::Config)` if the station interface is not configured
    pub async fn wait_for_ipv4(&self) -> Result<StaticConfigV4, Error> {
        let net_stack = self
            .sta_stack
            .as_ref()
            .ok_or(Error::Config(String::from("STA interface not configured")))?;
        Ok(wait_for_ipv4(net_stack).await)
    }
}

// Station interface events used by `sta_future()`.
enum StaEvent {
    Connected,
    Disconnected,
}

// Future to handle connecting to or waiting for disconnect from the station
// interface.  Having a single async function allows this call to be put in a
// single select arm.
//
// This function also signals the status of the STA interface when connects/
// disconnects happen.  While the station is enabled it reconnects after
// every disconnect, which is what keeps the link alive for clients that
// enable automatic network reconnection.
async fn sta_future(
    controller: &mut WifiController<'_>,
    enabled: bool,
    sta_connected: bool,
) -> StaEvent {
    if !enabled {
        return pending().await;
    }

    if !sta_connected {
        info!("Exec:  Connecting WiFi station");
        match controller.connect_async().await {
            Ok(()) => {
                STATUS.signal(Status::Connected);
                StaEvent::Connected
            }
            Err(_) => StaEvent::Disconnected,
        }
    } else {
        controller
            .wait_for_all_events(WifiEvent::StaDisconnected.into(), false)
            .await;
        warn!("Warn:  WiFi station disconnected");
        STATUS.signal(Status::Disconnected);
        StaEvent::Disconnected
    }
}

// Handles starting and stopping the station interface on demand.
#[embassy_executor::task]
async fn wifi_controller(mut controller: WifiController<'static>) -> ! {
    debug!(
        "Info:  WiFi device capabilities: {:?}",
        controller.capabilities()
    );

    let mut enabled = false;
    let mut sta_connected = false;

    loop {
        // Single select to detect:
        // - Signal to enable/disable the station
        // - Event from the STA interface (connected/disconnected)
        let control = match select(
            CONTROL.wait(),
            sta_future(&mut controller, enabled, sta_connected),
        )
        .await
        {
            Either::First(control) => control,
            Either::Second(event) => {
                match event {
                    StaEvent::Connected => sta_connected = true,
                    StaEvent::Disconnected => sta_connected = false,
                }
                continue;
            }
        };
        debug!("Info:  WiFi control signal received: {control:?}");

        match control {
            Control::Enable if !enabled => match start_sta(&mut controller).await {
                Ok(()) => {
                    enabled = true;
                    STATUS.signal(Status::Enabled);
                }
                Err(e) => {
                    warn!("Error: Failed to start WiFi: {e}");
                    STATUS.signal(Status::Disabled);
                }
            },
            Control::Disable if enabled => {
                stop_sta(&mut controller).await;
                enabled = false;
                sta_connected = false;
                STATUS.signal(Status::Disabled);
            }
            _ => {
                warn!("Warning: WiFi control signal ignored: {control:?}");
            }
        }
    }
}

// Puts the controller in station mode and starts it.
async fn start_sta(controller: &mut WifiController<'static>) -> Result<(), Error> {
    controller
        .set_mode(WifiMode::Sta)
        .map_err(|e| Error::Wifi(format!("Failed to set WiFi mode: {e:?}")))?;

    match controller.start_async().await {
        Ok(()) => {
            info!("Ok:    WiFi started in mode {:?}", WifiMode::Sta);
            Ok(())
        }
        Err(e) => Err(Error::Wifi(format!("Failed to start WiFi: {e:?}"))),
    }
}

// Disconnects the station and stops the controller, powering the radio
// down.  Errors are logged, not propagated - this runs on the way into deep
// sleep, where there is nothing left to recover.
async fn stop_sta(controller: &mut WifiController<'static>) {
    if matches!(controller.is_started(), Ok(true)) {
        info!("Exec:  Stopping WiFi");
        let _ = controller.disconnect_async().await;
        match controller.stop_async().await {
            Ok(()) => debug!("Ok:    WiFi stopped"),
            Err(e) => warn!("Error: Failed to stop WiFi: {e:?}"),
        }
    } else {
        trace!("Info:  WiFi already stopped");
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// This function waits for an IP address to be assigned
async fn wait_for_ipv4(net_stack: &Stack<'static>) -> StaticConfigV4 {
    loop {
        // Wait for the network stack to receive valid IP configuration
        net_stack.wait_config_up().await;
        if let Some(config) = net_stack.config_v4() {
            return config;
        }
        Timer::after_millis(100).await;
    }
}
