// ── Settings domain types ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Persistent device configuration (`settings`).
///
/// `Default` matches the device's factory values. Numbers stay
/// [`Number`]s so integral and fractional values round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub master_intensity: Number,
    pub master_volume: Number,

    // DMX / sACN / Art-Net
    pub dmx_address: Number,
    pub dmx_sacn_universe: Number,
    pub dmx_sacn_enable: bool,
    pub dmx_artnet_universe: Number,
    pub dmx_artnet_subnet: Number,
    pub dmx_artnet_enable: bool,

    // Playback
    /// Fade-out duration in seconds.
    pub fade_out: Number,
    pub play_mode: PlayMode,
    pub loop_queue: bool,
    pub resume_on_start: bool,

    // Video output
    pub output_resolution: String,
    pub video_output_mode: VideoOutputMode,
    pub identity_option_box: bool,
    pub identity_option_tone: bool,
    pub output_color_depth: OutputColorDepth,
    pub output_color_mode: OutputColorMode,
    #[serde(rename = "outputHDRMode")]
    pub output_hdr_mode: HdrMode,
    pub output_full_range: bool,
    pub output_roi_enable: bool,
    pub output_roi_x: Number,
    pub output_roi_y: Number,
    pub output_roi_w: Number,
    pub output_roi_h: Number,
    pub output_red: Number,
    pub output_green: Number,
    pub output_blue: Number,
    pub output_saturation: Number,
    pub keep_aspect_ratio: bool,
    /// `_id` of the pattern shown in test mode; empty for none.
    pub test_pattern: String,

    // Audio
    pub audio_output_mode: AudioOutputMode,

    // Follower mode
    pub is_follower: bool,
    pub remote_master_id: Option<String>,
    pub link_hardware_ui_pages: bool,

    pub local_lang: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_intensity: Number::from(100_u8),
            master_volume: Number::from(100_u8),
            dmx_address: Number::from(1_u8),
            dmx_sacn_universe: Number::from(1_u8),
            dmx_sacn_enable: false,
            dmx_artnet_universe: Number::from(0_u8),
            dmx_artnet_subnet: Number::from(0_u8),
            dmx_artnet_enable: false,
            fade_out: Number::from(0_u8),
            play_mode: PlayMode::Playlist,
            loop_queue: false,
            resume_on_start: false,
            output_resolution: "1920x1080P60".into(),
            video_output_mode: VideoOutputMode::Normal,
            identity_option_box: true,
            identity_option_tone: true,
            output_color_depth: OutputColorDepth::Default,
            output_color_mode: OutputColorMode::Default,
            output_hdr_mode: HdrMode::Sdr,
            output_full_range: true,
            output_roi_enable: false,
            output_roi_x: Number::from(0_u8),
            output_roi_y: Number::from(0_u8),
            output_roi_w: Number::from(0_u8),
            output_roi_h: Number::from(0_u8),
            output_red: Number::from(0_u8),
            output_green: Number::from(0_u8),
            output_blue: Number::from(0_u8),
            output_saturation: Number::from(0_u8),
            keep_aspect_ratio: true,
            test_pattern: String::new(),
            audio_output_mode: AudioOutputMode::Stereo,
            is_follower: false,
            remote_master_id: None,
            link_hardware_ui_pages: false,
            local_lang: "en".into(),
            extra: Map::new(),
        }
    }
}

wire_enum! {
    pub enum PlayMode {
        Direct = "direct",
        Abpreset = "abpreset",
        Playlist = "playlist",
    }
}

wire_enum! {
    pub enum VideoOutputMode {
        Normal = "normal",
        Test = "test",
        Identity = "identity",
        Blackout = "blackout",
    }
}

wire_enum! {
    pub enum AudioOutputMode {
        Stereo = "stereo",
        Mono = "mono",
        DoubleLeft = "doubleLeft",
        DoubleRight = "doubleRight",
    }
}

wire_enum! {
    /// Bits per pixel of the video output.
    pub enum OutputColorDepth {
        Default = "default",
        Bits24 = "24",
        Bits30 = "30",
        Bits36 = "36",
    }
}

wire_enum! {
    pub enum OutputColorMode {
        Default = "default",
        Yuv420 = "YUV420",
        Yuv422 = "YUV422",
        Yuv444 = "YUV444",
        Rgb444 = "RGB444",
    }
}

wire_enum! {
    pub enum HdrMode {
        Sdr = "sdr",
        Hdr = "hdr",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn factory_values_use_wire_names() {
        insta::assert_json_snapshot!(Settings::default(), @r#"
        {
          "masterIntensity": 100,
          "masterVolume": 100,
          "dmxAddress": 1,
          "dmxSacnUniverse": 1,
          "dmxSacnEnable": false,
          "dmxArtnetUniverse": 0,
          "dmxArtnetSubnet": 0,
          "dmxArtnetEnable": false,
          "fadeOut": 0,
          "playMode": "playlist",
          "loopQueue": false,
          "resumeOnStart": false,
          "outputResolution": "1920x1080P60",
          "videoOutputMode": "normal",
          "identityOptionBox": true,
          "identityOptionTone": true,
          "outputColorDepth": "default",
          "outputColorMode": "default",
          "outputHDRMode": "sdr",
          "outputFullRange": true,
          "outputRoiEnable": false,
          "outputRoiX": 0,
          "outputRoiY": 0,
          "outputRoiW": 0,
          "outputRoiH": 0,
          "outputRed": 0,
          "outputGreen": 0,
          "outputBlue": 0,
          "outputSaturation": 0,
          "keepAspectRatio": true,
          "testPattern": "",
          "audioOutputMode": "stereo",
          "isFollower": false,
          "remoteMasterId": null,
          "linkHardwareUiPages": false,
          "localLang": "en"
        }
        "#);
    }

    #[test]
    fn enums_parse_device_values() {
        let settings: Settings = serde_json::from_value(json!({
            "audioOutputMode": "doubleLeft",
            "outputColorDepth": "30",
            "outputColorMode": "YUV422",
            "outputHDRMode": "hdr",
            "playMode": "abpreset"
        }))
        .unwrap();

        assert_eq!(settings.audio_output_mode, AudioOutputMode::DoubleLeft);
        assert_eq!(settings.output_color_depth, OutputColorDepth::Bits30);
        assert_eq!(settings.output_color_mode, OutputColorMode::Yuv422);
        assert_eq!(settings.output_hdr_mode, HdrMode::Hdr);
        assert_eq!(settings.play_mode, PlayMode::Abpreset);
        assert_eq!(settings.master_volume, Number::from(100_u8));
    }

    #[test]
    fn display_names_match_wire_names() {
        assert_eq!(AudioOutputMode::DoubleRight.to_string(), "doubleRight");
        assert_eq!(OutputColorMode::Rgb444.as_str(), "RGB444");
        assert_eq!("24".parse::<OutputColorDepth>().unwrap(), OutputColorDepth::Bits24);
    }

    #[test]
    fn newer_firmware_values_round_trip() {
        let mut raw = serde_json::to_value(Settings::default()).unwrap();
        raw["masterVolume"] = json!(42.5);
        raw["playMode"] = json!("timecode");
        raw["outputColorDepth"] = json!("48");
        raw["newFirmwareField"] = json!({"enabled": true});

        let settings: Settings = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(settings.master_volume.as_f64(), Some(42.5));
        assert_eq!(settings.play_mode, PlayMode::Other("timecode".into()));
        assert_eq!(settings.output_color_depth.as_str(), "48");
        assert_eq!(settings.extra["newFirmwareField"], json!({"enabled": true}));
        assert_eq!(serde_json::to_value(&settings).unwrap(), raw);
    }
}
