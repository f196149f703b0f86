//! List available capture devices.

use crate::capture::CaptureBackend;
use crate::transcode::find_ffmpeg;
use regex::Regex;
use std::process::Command;

/// A camera or microphone that ffmpeg can open.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DeviceEntry {
    kind: DeviceKind,
    /// Value to put in `capture.video_device` / `capture.audio_device`
    id: String,
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceKind {
    Video,
    Audio,
}

/// Lists the capture devices of the host's backend.
///
/// # Errors
/// If ffmpeg cannot be found (macOS, Windows) or the device list cannot be read.
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    let backend = CaptureBackend::resolve("auto")?;
    let devices = match backend {
        CaptureBackend::V4l2 => list_v4l2()?,
        CaptureBackend::AvFoundation => parse_avfoundation(&ffmpeg_device_listing(&[
            "-f",
            "avfoundation",
            "-list_devices",
            "true",
            "-i",
            "",
        ])?),
        CaptureBackend::DShow => parse_dshow(&ffmpeg_device_listing(&[
            "-list_devices",
            "true",
            "-f",
            "dshow",
            "-i",
            "dummy",
        ])?),
    };

    println!();
    println!("Capture devices ({backend}):");
    println!();

    if devices.is_empty() {
        println!("  No capture devices found on this system.");
    }
    for kind in [DeviceKind::Video, DeviceKind::Audio] {
        let of_kind: Vec<&DeviceEntry> = devices.iter().filter(|d| d.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        let heading = match kind {
            DeviceKind::Video => "Cameras (capture.video_device)",
            DeviceKind::Audio => "Microphones (capture.audio_device)",
        };
        println!("  {heading}:");
        for device in of_kind {
            println!("    {:<16} {}", device.id, device.name);
        }
        println!();
    }

    if backend == CaptureBackend::V4l2 {
        println!("  Microphones are read through PulseAudio; `pactl list short sources` lists them.");
        println!();
    }
    Ok(())
}

/// Reads `/dev/video*` with names from sysfs.
fn list_v4l2() -> Result<Vec<DeviceEntry>, anyhow::Error> {
    let mut devices: Vec<DeviceEntry> = std::fs::read_dir("/dev")?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            name.strip_prefix("video")
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
        })
        .map(|node| {
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/{node}/name"))
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|_| "Unknown".to_string());
            DeviceEntry {
                kind: DeviceKind::Video,
                id: format!("/dev/{node}"),
                name,
            }
        })
        .collect();
    devices.sort_by_key(|d| {
        d.id.trim_start_matches("/dev/video")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    Ok(devices)
}

/// Runs ffmpeg's device listing; it always "fails" and prints to stderr.
fn ffmpeg_device_listing(args: &[&str]) -> Result<String, anyhow::Error> {
    let ffmpeg = find_ffmpeg()?;
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .args(args)
        .output()
        .map_err(|e| anyhow::anyhow!("Failed to run ffmpeg: {e}"))?;
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Parses `[AVFoundation indev @ 0x..] [0] FaceTime HD Camera` style listings.
fn parse_avfoundation(listing: &str) -> Vec<DeviceEntry> {
    let Ok(entry) = Regex::new(r"\]\s*\[(\d+)\]\s+(.+?)\s*$") else {
        return Vec::new();
    };
    let mut kind = None;
    let mut devices = Vec::new();

    for line in listing.lines() {
        if line.contains("AVFoundation video devices") {
            kind = Some(DeviceKind::Video);
        } else if line.contains("AVFoundation audio devices") {
            kind = Some(DeviceKind::Audio);
        } else if let (Some(kind), Some(caps)) = (kind, entry.captures(line)) {
            devices.push(DeviceEntry {
                kind,
                id: caps[1].to_string(),
                name: caps[2].to_string(),
            });
        }
    }
    devices
}

/// Parses `[dshow @ 0x..] "Integrated Camera" (video)` style listings.
fn parse_dshow(listing: &str) -> Vec<DeviceEntry> {
    let Ok(entry) = Regex::new(r#""([^"]+)"\s+\((video|audio)\)"#) else {
        return Vec::new();
    };
    entry
        .captures_iter(listing)
        .map(|caps| DeviceEntry {
            kind: if &caps[2] == "video" {
                DeviceKind::Video
            } else {
                DeviceKind::Audio
            },
            id: caps[1].to_string(),
            name: caps[1].to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_avfoundation() {
        let listing = "\
[AVFoundation indev @ 0x7f8] AVFoundation video devices:
[AVFoundation indev @ 0x7f8] [0] FaceTime HD Camera
[AVFoundation indev @ 0x7f8] [1] Capture screen 0
[AVFoundation indev @ 0x7f8] AVFoundation audio devices:
[AVFoundation indev @ 0x7f8] [0] MacBook Pro Microphone
: Input/output error";

        let devices = parse_avfoundation(listing);

        assert_eq!(devices.len(), 3);
        assert_eq!(
            devices[0],
            DeviceEntry {
                kind: DeviceKind::Video,
                id: "0".to_string(),
                name: "FaceTime HD Camera".to_string(),
            }
        );
        assert_eq!(devices[2].kind, DeviceKind::Audio);
        assert_eq!(devices[2].name, "MacBook Pro Microphone");
    }

    #[test]
    fn test_parse_dshow() {
        let listing = r#"[dshow @ 000001] "Integrated Camera" (video)
[dshow @ 000001]   Alternative name "@device_pnp_\\?\usb#vid"
[dshow @ 000001] "Microphone Array (Realtek)" (audio)
dummy: Immediate exit requested"#;

        let devices = parse_dshow(listing);

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "Integrated Camera");
        assert_eq!(devices[0].kind, DeviceKind::Video);
        assert_eq!(devices[1].id, "Microphone Array (Realtek)");
        assert_eq!(devices[1].kind, DeviceKind::Audio);
    }
}
