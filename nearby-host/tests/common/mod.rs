#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use data_error::{NearbyError, Result};
use data_settings::{
    Constraints, ParentDependency, SettingDefinition, SettingType,
    SettingsSchema,
};
use nearby_common::{AppDetails, PairingChallenge, PeerMessage};
use nearby_host::{
    AdvertiseCompletion, AdvertiseOutcome, ConnectionEvent,
    ConnectionLifecycle, EndpointId, HostSubscriber, PayloadListener,
    Strategy, Transport,
};

pub const TOKEN: &str = "123456";
pub const SYMBOL: &str = "🎲";

pub fn sample_schema() -> SettingsSchema {
    SettingsSchema::new(vec![
        SettingDefinition::new(
            "toggle_input",
            "Toggle Input",
            SettingType::Toggle,
        )
        .with_default("false"),
        SettingDefinition::new(
            "custom_input",
            "Custom Input",
            SettingType::Text,
        )
        .with_default("hello")
        .with_parent(ParentDependency::when_toggled("toggle_input", true)),
        SettingDefinition::new(
            "number_input",
            "Number Input",
            SettingType::Number,
        )
        .with_default("10")
        .with_constraints(Constraints::range(0, 100)),
        SettingDefinition::new(
            "select_input",
            "Select Input",
            SettingType::Select,
        )
        .with_default("low")
        .with_constraints(Constraints::options(["low", "high"])),
    ])
}

pub fn app_details() -> AppDetails {
    AppDetails::new("Nearby Settings Demo", "Nearby Settings")
}

/// How the transport answers a start request.
pub enum StartMode {
    Succeed,
    Fail(String),
    /// The platform aborts the request, e.g. the user dismissed a prompt.
    Cancel,
    /// Keep the completion until [`LoopbackTransport::complete`] is called.
    Defer,
}

#[derive(Default)]
struct Recorded {
    lifecycle: Option<Arc<dyn ConnectionLifecycle>>,
    listener: Option<Arc<dyn PayloadListener>>,
    completion: Option<AdvertiseCompletion>,
    advertised_as: Option<(String, String, Strategy)>,
    sent: Vec<(EndpointId, Vec<u8>)>,
    accepted: Vec<EndpointId>,
    rejected: Vec<EndpointId>,
    start_calls: usize,
    stop_calls: usize,
    send_attempts: usize,
    fail_sends: bool,
}

/// In-process transport recording every call and letting a test play the
/// remote device. Callbacks are invoked with no internal lock held.
pub struct LoopbackTransport {
    mode: StartMode,
    recorded: Mutex<Recorded>,
}

impl LoopbackTransport {
    pub fn new(mode: StartMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            recorded: Mutex::new(Recorded::default()),
        })
    }

    fn lifecycle(&self) -> Arc<dyn ConnectionLifecycle> {
        self.recorded
            .lock()
            .unwrap()
            .lifecycle
            .clone()
            .expect("not advertising")
    }

    /// A new device asks to connect. Returns its endpoint ID.
    pub fn connect(&self, auth_token: &str) -> EndpointId {
        let endpoint = uuid::Uuid::new_v4().to_string();
        self.lifecycle()
            .on_connection_initiated(&endpoint, auth_token);
        endpoint
    }

    pub fn report_result(&self, endpoint: &str, success: bool) {
        self.lifecycle()
            .on_connection_result(endpoint, success);
    }

    pub fn disconnect(&self, endpoint: &str) {
        self.lifecycle().on_disconnected(endpoint);
    }

    /// Delivers a payload as if `endpoint` had sent it.
    pub fn deliver(&self, endpoint: &str, bytes: &[u8]) {
        let listener = self
            .recorded
            .lock()
            .unwrap()
            .listener
            .clone()
            .expect("no connection accepted");
        listener.on_payload_received(endpoint, bytes);
    }

    pub fn has_pending_start(&self) -> bool {
        self.recorded
            .lock()
            .unwrap()
            .completion
            .is_some()
    }

    /// Finishes a deferred start request.
    pub fn complete(&self, outcome: AdvertiseOutcome) {
        let completion = self
            .recorded
            .lock()
            .unwrap()
            .completion
            .take()
            .expect("no start request pending");
        completion(outcome);
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.recorded.lock().unwrap().fail_sends = fail;
    }

    /// Successfully sent payloads for `endpoint`, decoded.
    pub fn sent_to(&self, endpoint: &str) -> Vec<PeerMessage> {
        self.recorded
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|(to, _)| to == endpoint)
            .map(|(_, bytes)| {
                PeerMessage::decode(bytes).expect("undecodable payload")
            })
            .collect()
    }

    pub fn advertised_as(&self) -> Option<(String, String, Strategy)> {
        self.recorded
            .lock()
            .unwrap()
            .advertised_as
            .clone()
    }

    pub fn accepted(&self) -> Vec<EndpointId> {
        self.recorded.lock().unwrap().accepted.clone()
    }

    pub fn rejected(&self) -> Vec<EndpointId> {
        self.recorded.lock().unwrap().rejected.clone()
    }

    pub fn start_calls(&self) -> usize {
        self.recorded.lock().unwrap().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.recorded.lock().unwrap().stop_calls
    }

    pub fn send_attempts(&self) -> usize {
        self.recorded.lock().unwrap().send_attempts
    }
}

impl Transport for LoopbackTransport {
    fn start_advertising(
        &self,
        device_label: &str,
        app_id: &str,
        lifecycle: Arc<dyn ConnectionLifecycle>,
        strategy: Strategy,
        completion: AdvertiseCompletion,
    ) {
        {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.start_calls += 1;
            recorded.lifecycle = Some(lifecycle);
            recorded.advertised_as =
                Some((device_label.to_owned(), app_id.to_owned(), strategy));
        }
        match &self.mode {
            StartMode::Succeed => completion(AdvertiseOutcome::Started),
            StartMode::Fail(reason) => {
                completion(AdvertiseOutcome::Failed(reason.clone()))
            }
            StartMode::Cancel => completion(AdvertiseOutcome::Cancelled),
            StartMode::Defer => {
                self.recorded.lock().unwrap().completion = Some(completion);
            }
        }
    }

    fn stop_advertising(&self) {
        self.recorded.lock().unwrap().stop_calls += 1;
    }

    fn send_payload(&self, endpoint: &str, bytes: Vec<u8>) -> Result<()> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.send_attempts += 1;
        if recorded.fail_sends {
            return Err(NearbyError::Transport("link lost".to_owned()));
        }
        recorded.sent.push((endpoint.to_owned(), bytes));
        Ok(())
    }

    fn accept_connection(
        &self,
        endpoint: &str,
        listener: Arc<dyn PayloadListener>,
    ) -> Result<()> {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.accepted.push(endpoint.to_owned());
        recorded.listener = Some(listener);
        Ok(())
    }

    fn reject_connection(&self, endpoint: &str) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .rejected
            .push(endpoint.to_owned());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSubscriber {
    settings: Mutex<Vec<Arc<SettingsSchema>>>,
    challenges: Mutex<Vec<PairingChallenge>>,
    advertising: Mutex<Vec<bool>>,
    events: Mutex<Vec<ConnectionEvent>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn settings(&self) -> Vec<Arc<SettingsSchema>> {
        self.settings.lock().unwrap().clone()
    }

    pub fn challenges(&self) -> Vec<PairingChallenge> {
        self.challenges.lock().unwrap().clone()
    }

    pub fn advertising(&self) -> Vec<bool> {
        self.advertising.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl HostSubscriber for RecordingSubscriber {
    fn get_id(&self) -> String {
        "recording-subscriber".to_owned()
    }

    fn notify_settings_changed(&self, schema: Arc<SettingsSchema>) {
        self.settings.lock().unwrap().push(schema);
    }

    fn notify_challenge(&self, challenge: PairingChallenge) {
        self.challenges.lock().unwrap().push(challenge);
    }

    fn notify_advertising(&self, is_advertising: bool) {
        self.advertising
            .lock()
            .unwrap()
            .push(is_advertising);
    }

    fn notify_connection(&self, event: ConnectionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
