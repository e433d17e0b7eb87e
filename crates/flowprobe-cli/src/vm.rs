//! Virtual machine lifecycle object model used by `flowprobe run`.
//!
//! Routines are registered under `object_model.<name>` so the demo model in
//! `demos/vm_model.yaml` can refer to them. Every callback accepts an
//! optional `state` (state to record on the server) and `result` (value to
//! return) in the step data; every validator accepts a `result` override.

use chrono::{DateTime, Utc};
use flowprobe::engine::{Context, RoutineError, RoutineRegistry};
use flowprobe::report::{Align, TextTable};
use flowprobe::Payload;
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Prefix of every routine name in the demo model.
pub const ROUTINE_PREFIX: &str = "object_model";

/// Length of generated root passwords.
pub const PASSWORD_LENGTH: usize = 18;

/// Address assigned once a server is built.
pub const BUILT_IP_ADDR: &str = "192.168.1.1";

/// Address of a server without a network.
pub const NO_IP_ADDR: &str = "0.0.0.0";

const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789abcdefghijklmnopqrstuvwxyz";

/// Server states as recorded on the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum VmState {
    Active,
    Building,
    Deleting,
    Deleted,
    DoesNotExist,
    Error,
    Locked,
    Paused,
    Rebooting,
    Resizing,
}

impl VmState {
    /// Name used in logs and the attribute table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Building => "BUILDING",
            Self::Deleting => "DELETING",
            Self::Deleted => "DELETED",
            Self::DoesNotExist => "DOES_NOT_EXIST",
            Self::Error => "ERROR",
            Self::Locked => "LOCKED",
            Self::Paused => "PAUSED",
            Self::Rebooting => "REBOOTING",
            Self::Resizing => "RESIZING",
        }
    }

    /// Parse a state name; `DNE` is accepted for `DOES_NOT_EXIST`.
    pub fn parse(name: &str) -> Option<Self> {
        let state = match name.to_ascii_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            "BUILDING" => Self::Building,
            "DELETING" => Self::Deleting,
            "DELETED" => Self::Deleted,
            "DNE" | "DOES_NOT_EXIST" => Self::DoesNotExist,
            "ERROR" => Self::Error,
            "LOCKED" => Self::Locked,
            "PAUSED" => Self::Paused,
            "REBOOTING" => Self::Rebooting,
            "RESIZING" => Self::Resizing,
            _ => return None,
        };
        Some(state)
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmData {
    /// `Server<nnnn>` once created
    pub name: Option<String>,
    /// Current server state
    pub state: VmState,
    /// Assigned when the server is built
    pub uuid: Option<Uuid>,
    /// User metadata
    pub metadata: BTreeMap<String, String>,
    /// Mounted volume id
    pub volume: Option<Uuid>,
    /// Flavor id, -1 when unset
    pub flavor: i64,
    /// Boot image
    pub image: Option<String>,
    /// Generated on first build
    pub root_password: Option<String>,
    /// IPv4 address
    pub ip_addr: String,
    /// Creation time
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for VmData {
    fn default() -> Self {
        Self {
            name: None,
            state: VmState::DoesNotExist,
            uuid: None,
            metadata: BTreeMap::new(),
            volume: None,
            flavor: -1,
            image: None,
            root_password: None,
            ip_addr: NO_IP_ADDR.to_string(),
            created_at: None,
        }
    }
}

impl VmData {
    /// `(attribute, value)` pairs in display order.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        fn or_none<T: ToString>(value: Option<&T>) -> String {
            value.map_or_else(|| "None".to_string(), ToString::to_string)
        }

        let metadata = self
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");

        vec![
            ("name", or_none(self.name.as_ref())),
            ("state", self.state.to_string()),
            ("uuid", or_none(self.uuid.as_ref())),
            ("metadata", if metadata.is_empty() { "{}".to_string() } else { metadata }),
            ("volume", or_none(self.volume.as_ref())),
            ("flavor", self.flavor.to_string()),
            ("image", or_none(self.image.as_ref())),
            ("root_password", or_none(self.root_password.as_ref())),
            ("ip_addr", self.ip_addr.clone()),
            (
                "created_at",
                or_none(self.created_at.map(|at| at.to_rfc3339()).as_ref()),
            ),
        ]
    }
}

/// The simulated server.
#[derive(Debug, Clone, Default)]
pub struct VmModel {
    /// Server attributes
    pub data: VmData,
}

impl VmModel {
    /// A server that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn log_state(&self) {
        tracing::info!("\n{self}");
    }

    fn id(&self) -> String {
        self.data
            .uuid
            .map_or_else(|| "None".to_string(), |uuid| uuid.to_string())
    }

    /// Name the server and give it a flavor and image.
    pub fn create_server(&mut self, state: VmState) {
        let number = Uuid::new_v4().as_fields().1 % 1000;
        self.data.name = Some(format!("Server{number:04}"));
        self.data.flavor = 3;
        self.data.image = Some("Linux".to_string());
        self.data.state = state;
        self.data.created_at = Some(Utc::now());
        tracing::info!(
            "Creating Server: '{}' using flavor '{}', using a 'Linux' image.",
            self.data.name.as_deref().unwrap_or_default(),
            self.data.flavor
        );
    }

    /// Assign id, password, volume and address.
    pub fn building_server(&mut self, state: VmState) {
        self.data.uuid = Some(Uuid::new_v4());
        if self.data.root_password.is_none() {
            self.data.root_password = Some(generate_password());
        }
        if self.data.volume.is_none() {
            self.data.volume = Some(Uuid::new_v4());
        }
        self.data.state = state;
        self.data.ip_addr = BUILT_IP_ADDR.to_string();

        let name = self.data.name.as_deref().unwrap_or_default();
        tracing::info!("Building Server: '{name}'");
        tracing::info!(
            "Root Password: '{}'",
            self.data.root_password.as_deref().unwrap_or_default()
        );
        if let Some(volume) = self.data.volume {
            tracing::info!("Mounting a volume '{volume}' to server '{name}' ({})", self.id());
        }
        tracing::info!("IPv4 Address: {}", self.data.ip_addr);
    }

    /// Build, then land in `state` (normally `ERROR`).
    pub fn building_server_fail(&mut self, state: VmState) {
        self.building_server(VmState::Active);
        tracing::info!("Failing the build for '{}'", self.id());
        self.data.state = state;
    }

    /// Set one metadata entry.
    pub fn add_metadata(&mut self, key: &str, value: &str, state: VmState) {
        tracing::info!("Adding metadata: key: {key}  value:{value}");
        self.data.metadata.insert(key.to_string(), value.to_string());
        self.data.state = state;
    }

    /// Unmount the volume and start deleting.
    pub fn delete_server(&mut self, state: VmState) {
        tracing::info!("Deleting server: {}", self.id());
        if let Some(volume) = self.data.volume.take() {
            tracing::info!("Unmounting volume: {volume}");
        }
        self.data.state = state;
    }

    /// Finish deleting. Attributes are reset only when `state` is `DELETED`.
    pub fn deleting_server(&mut self, state: VmState) {
        tracing::info!("Deleted server: {}", self.id());
        self.data.state = state;
        if state == VmState::Deleted {
            self.data.ip_addr = NO_IP_ADDR.to_string();
            self.data.root_password = None;
            self.data.metadata.clear();
            self.data.image = None;
            self.data.flavor = -1;
        } else {
            tracing::error!("Unable to delete server: {}", self.id());
        }
    }

    /// Set the state, logging `action` against the server id.
    pub fn change_state(&mut self, action: &str, state: VmState) {
        tracing::info!("{action} server: {}", self.id());
        self.data.state = state;
    }

    /// Whether the server is in one of `expected`.
    pub fn check_state(&self, expected: &[VmState]) -> bool {
        expected.contains(&self.data.state)
    }
}

impl fmt::Display for VmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = TextTable::new(["Attribute", "Value"]).with_align("Attribute", Align::Left);
        for (attribute, value) in self.data.attributes() {
            table.add_row([attribute.to_string(), value]);
        }
        f.write_str(table.render().trim_end())
    }
}

fn generate_password() -> String {
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    first
        .as_bytes()
        .iter()
        .chain(second.as_bytes())
        .take(PASSWORD_LENGTH)
        .map(|byte| char::from(PASSWORD_ALPHABET[usize::from(*byte) % PASSWORD_ALPHABET.len()]))
        .collect()
}

fn text(data: &Payload, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn state_arg(data: &Payload, default: VmState) -> Result<VmState, RoutineError> {
    match text(data, "state") {
        None => Ok(default),
        Some(name) => VmState::parse(&name)
            .ok_or_else(|| RoutineError::new(format!("Unknown server state '{name}'"))),
    }
}

fn result_arg(data: &Payload) -> Option<bool> {
    data.get("result").and_then(Value::as_bool)
}

type Action = fn(&mut VmModel, &Payload, VmState);

fn callback(
    default: VmState,
    action: Action,
) -> impl Fn(&mut Context<VmModel>, &Payload) -> Result<Value, RoutineError> {
    move |ctx, data| {
        let state = state_arg(data, default)?;
        let vm = ctx.object_mut();
        action(vm, data, state);
        vm.log_state();
        Ok(Value::Bool(result_arg(data).unwrap_or(true)))
    }
}

fn validator(expected: &'static [VmState]) -> impl Fn(&Context<VmModel>, &Payload) -> bool {
    move |ctx, data| {
        let vm = ctx.object();
        let result = result_arg(data).unwrap_or_else(|| vm.check_state(expected));
        let names: Vec<&str> = expected.iter().map(|state| state.as_str()).collect();
        tracing::info!(
            "Checking if server '{}' state is: {names:?}: {result}",
            vm.id()
        );
        if !result {
            tracing::error!(
                "Expected state: {names:?}  Actual State: {}",
                vm.data.state
            );
        }
        result
    }
}

fn routine(name: &str) -> String {
    format!("{ROUTINE_PREFIX}.{name}")
}

/// Callbacks and validators for [`VmModel`].
pub fn registry() -> RoutineRegistry<VmModel> {
    let callbacks: [(&str, VmState, Action); 13] = [
        ("create_server", VmState::Building, |vm, data, state| {
            vm.create_server(state);
            if let Some(flavor) = data.get("flavor").and_then(Value::as_i64) {
                vm.data.flavor = flavor;
            }
            if let Some(image) = text(data, "image") {
                vm.data.image = Some(image);
            }
        }),
        ("building_server", VmState::Active, |vm, _, state| vm.building_server(state)),
        ("building_server_fail", VmState::Error, |vm, _, state| {
            vm.building_server_fail(state);
        }),
        ("add_metadata", VmState::Active, |vm, data, state| {
            let key = text(data, "key").unwrap_or_else(|| "test".to_string());
            let value = text(data, "value").unwrap_or_else(|| "value".to_string());
            vm.add_metadata(&key, &value, state);
        }),
        ("go_into_error", VmState::Error, |vm, _, state| {
            vm.change_state("Gone into ERROR state. Failing", state);
        }),
        ("reboot_server", VmState::Active, |vm, _, state| vm.change_state("Rebooting", state)),
        ("resize_server", VmState::Active, |vm, _, state| vm.change_state("Resizing", state)),
        ("pause_server", VmState::Paused, |vm, _, state| vm.change_state("Pausing", state)),
        ("unpause_server", VmState::Active, |vm, _, state| vm.change_state("Unpausing", state)),
        ("lock_server", VmState::Locked, |vm, _, state| vm.change_state("Locking", state)),
        ("unlock_server", VmState::Active, |vm, _, state| vm.change_state("Unlocking", state)),
        ("delete_server", VmState::Deleting, |vm, _, state| vm.delete_server(state)),
        ("deleting_server", VmState::Deleted, |vm, _, state| vm.deleting_server(state)),
    ];

    let validators: [(&str, &'static [VmState]); 6] = [
        (
            "does_server_exist",
            &[
                VmState::Active,
                VmState::Building,
                VmState::Deleting,
                VmState::Error,
                VmState::Locked,
                VmState::Paused,
                VmState::Rebooting,
                VmState::Resizing,
            ],
        ),
        ("is_server_active", &[VmState::Active]),
        ("is_server_in_error", &[VmState::Error]),
        ("is_server_paused", &[VmState::Paused]),
        ("is_server_locked", &[VmState::Locked]),
        ("is_server_deleting", &[VmState::Deleting]),
    ];

    let mut registry = RoutineRegistry::new();
    for (name, default, action) in callbacks {
        registry.register_callback(routine(name), callback(default, action));
    }
    for (name, expected) in validators {
        registry.register_validator(routine(name), validator(expected));
    }
    registry
}
