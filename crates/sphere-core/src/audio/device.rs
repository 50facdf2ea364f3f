//! Audio device enumeration
//!
//! Lists input and output devices from every available host (ALSA, JACK,
//! PulseAudio, CoreAudio, WASAPI) and resolves configured [`DeviceId`]s.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Which side of the interface a device is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDirection {
    Input,
    Output,
}

impl DeviceDirection {
    pub fn label(self) -> &'static str {
        match self {
            DeviceDirection::Input => "input",
            DeviceDirection::Output => "output",
        }
    }
}

/// Human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|id| host_name(*id) == name)
        .and_then(|id| cpal::host_from_id(id).ok())
}

fn host_devices(host: &Host, direction: DeviceDirection) -> Option<Vec<cpal::Device>> {
    let devices: Vec<cpal::Device> = match direction {
        DeviceDirection::Input => host.input_devices().ok()?.collect(),
        DeviceDirection::Output => host.output_devices().ok()?.collect(),
    };
    Some(devices)
}

fn host_default(host: &Host, direction: DeviceDirection) -> Option<cpal::Device> {
    match direction {
        DeviceDirection::Input => host.default_input_device(),
        DeviceDirection::Output => host.default_output_device(),
    }
}

/// Information about an audio device
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Identifier for configuration (includes host info)
    pub id: DeviceId,
    /// Host backend name (e.g., "ALSA", "JACK")
    pub host: String,
    /// Whether this is the default device for its host
    pub is_default: bool,
    /// Maximum channel count in this direction
    pub max_channels: u16,
}

impl std::fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.id.name)
    }
}

/// List every device usable in `direction`, defaults first
pub fn list_devices(direction: DeviceDirection) -> AudioResult<Vec<AudioDevice>> {
    let mut all_devices: Vec<AudioDevice> = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);

        let default_name = host_default(&host, direction).and_then(|d| d.name().ok());

        let Some(devices) = host_devices(&host, direction) else {
            log::debug!("Could not enumerate {} devices for {:?}", direction.label(), host_id);
            continue;
        };

        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };

            let max_channels = match direction {
                DeviceDirection::Input => device
                    .supported_input_configs()
                    .map(|c| c.map(|c| c.channels()).max().unwrap_or(0)),
                DeviceDirection::Output => device
                    .supported_output_configs()
                    .map(|c| c.map(|c| c.channels()).max().unwrap_or(0)),
            }
            .unwrap_or(0);

            if max_channels == 0 {
                continue;
            }

            all_devices.push(AudioDevice {
                is_default: default_name.as_ref() == Some(&name),
                id: DeviceId::with_host(&name, &host_label),
                host: host_label.clone(),
                max_channels,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices(direction.label()));
    }

    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.id.name.cmp(&b.id.name))
    });

    Ok(all_devices)
}

/// Find a device by its ID
///
/// Uses the host named in the ID if present, otherwise searches all hosts.
pub fn find_device(id: &DeviceId, direction: DeviceDirection) -> AudioResult<cpal::Device> {
    let matches = |d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name);

    if let Some(ref name) = id.host {
        if let Some(host) = get_host_by_name(name) {
            return host_devices(&host, direction)
                .ok_or_else(|| AudioError::ConfigError(format!("cannot list devices on {}", name)))?
                .into_iter()
                .find(matches)
                .ok_or_else(|| AudioError::DeviceNotFound(id.name.clone()));
        }
    }

    cpal::available_hosts()
        .into_iter()
        .filter_map(|host_id| cpal::host_from_id(host_id).ok())
        .filter_map(|host| host_devices(&host, direction))
        .flatten()
        .find(matches)
        .ok_or_else(|| AudioError::DeviceNotFound(id.name.clone()))
}

/// The default device of the default host
pub fn default_device(direction: DeviceDirection) -> AudioResult<cpal::Device> {
    host_default(&cpal::default_host(), direction).ok_or_else(|| {
        AudioError::NoDefaultDevice(format!("no default {} device", direction.label()))
    })
}

/// Resolve an optional configured device, falling back to the default
pub fn resolve_device(id: Option<&DeviceId>, direction: DeviceDirection) -> AudioResult<cpal::Device> {
    match id {
        Some(id) => find_device(id, direction),
        None => default_device(direction),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_enumeration() {
        // May find nothing on headless CI machines
        for direction in [DeviceDirection::Output, DeviceDirection::Input] {
            match list_devices(direction) {
                Ok(devices) => {
                    assert!(!devices.is_empty());
                    for device in &devices {
                        assert!(device.max_channels > 0);
                    }
                }
                Err(AudioError::NoDevices(label)) => assert_eq!(label, direction.label()),
                Err(e) => println!("Error enumerating devices: {}", e),
            }
        }
    }

    #[test]
    fn test_unknown_device_not_found() {
        let id = DeviceId::new("sphere-looper-no-such-device");
        assert!(find_device(&id, DeviceDirection::Output).is_err());
    }
}
