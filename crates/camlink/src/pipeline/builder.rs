//! Pipeline construction for each operating mode

use super::spec::{ParamValue, PipelineError, PipelineSpec, Stage};
use crate::stream::StreamRole;
use indexmap::IndexMap;
use std::str::FromStr;

/// H.264 encoder selection with its tuning properties
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Identifier used in candidate naming and logs ("hardware", "software")
    pub name: String,
    /// External encoder element
    pub element: String,
    /// Element properties, in serialization order
    pub properties: IndexMap<String, ParamValue>,
}

impl EncoderSettings {
    /// Hardware-accelerated encoder preset
    pub fn hardware() -> Self {
        let mut properties = IndexMap::new();
        properties.insert("bitrate".to_string(), ParamValue::Int(1_000_000));
        properties.insert("preset-level".to_string(), ParamValue::Int(1));
        Self {
            name: "hardware".to_string(),
            element: "omxh264enc".to_string(),
            properties,
        }
    }

    /// Software encoder preset; the bitrate unit differs from the hardware
    /// element (kbit/s vs bit/s)
    pub fn software() -> Self {
        let mut properties = IndexMap::new();
        properties.insert("bitrate".to_string(), ParamValue::Int(1000));
        properties.insert(
            "speed-preset".to_string(),
            ParamValue::Str("ultrafast".to_string()),
        );
        Self {
            name: "software".to_string(),
            element: "x264enc".to_string(),
            properties,
        }
    }

    fn to_stage(&self) -> Stage {
        let mut stage = Stage::transform(&self.element);
        for (key, value) in &self.properties {
            stage = stage.with(key.clone(), value.clone());
        }
        stage
    }
}

/// Operating modes a pipeline can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Camera to discard sink; validates that a device yields decodable
    /// frames
    CaptureTest,
    /// Camera to H.264-over-RTP network sender
    RelaySource,
    /// Network listener to local display surface
    SinkDisplay,
    /// Network listener to MP4 file
    SinkRecord,
    /// Network listener re-paid toward a localhost relay port
    SinkForward,
    /// Network listener to discard sink; validates UDP receive capability
    ListenTest,
}

impl PipelineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::CaptureTest => "capture-test",
            PipelineMode::RelaySource => "relay-source",
            PipelineMode::SinkDisplay => "sink-display",
            PipelineMode::SinkRecord => "sink-record",
            PipelineMode::SinkForward => "sink-forward",
            PipelineMode::ListenTest => "listen-test",
        }
    }
}

impl FromStr for PipelineMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capture-test" => Ok(PipelineMode::CaptureTest),
            "relay-source" => Ok(PipelineMode::RelaySource),
            "sink-display" => Ok(PipelineMode::SinkDisplay),
            "sink-record" => Ok(PipelineMode::SinkRecord),
            "sink-forward" => Ok(PipelineMode::SinkForward),
            "listen-test" => Ok(PipelineMode::ListenTest),
            other => Err(PipelineError::UnknownMode(other.to_string())),
        }
    }
}

/// Parameters injected into [`build`]. The builder never inspects the
/// environment; everything variable arrives here.
#[derive(Debug, Clone, Default)]
pub struct PipelineParams {
    /// Capture device (source-side modes)
    pub device: Option<String>,
    /// UDP listen port (sink-side modes)
    pub listen_port: Option<u16>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Capture framerate
    pub framerate: u32,
    /// Destination host for the network sender
    pub target_host: Option<String>,
    /// Destination port for the network sender
    pub target_port: Option<u16>,
    /// Encoder for source-side modes
    pub encoder: Option<EncoderSettings>,
    /// Output file for record mode
    pub output_path: Option<String>,
    /// Relay destination for forward mode; host defaults to localhost
    pub forward_host: Option<String>,
    /// Relay port for forward mode
    pub forward_port: Option<u16>,
}

impl PipelineParams {
    /// Frame geometry from the link configuration, everything else unset
    pub fn from_config(config: &crate::config::LinkConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            framerate: config.framerate,
            ..Self::default()
        }
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    pub fn with_target(mut self, host: impl Into<String>, port: u16) -> Self {
        self.target_host = Some(host.into());
        self.target_port = Some(port);
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_forward_port(mut self, port: u16) -> Self {
        self.forward_port = Some(port);
        self
    }
}

fn require<'a, T>(
    value: &'a Option<T>,
    mode: PipelineMode,
    name: &'static str,
) -> Result<&'a T, PipelineError> {
    value.as_ref().ok_or(PipelineError::MissingParameter {
        mode: mode.as_str(),
        name,
    })
}

fn jpeg_caps(params: &PipelineParams) -> String {
    format!(
        "image/jpeg,width={},height={},framerate={}/1",
        params.width, params.height, params.framerate
    )
}

const RAW_I420_CAPS: &str = "video/x-raw,format=I420";
const H264_STREAM_CAPS: &str = "video/x-h264,stream-format=byte-stream,alignment=au";
const RTP_H264_CAPS: &str = "application/x-rtp,encoding-name=H264";

/// Camera capture front half shared by the source-side modes
fn capture_stages(
    device: &str,
    encoder: &EncoderSettings,
    params: &PipelineParams,
) -> Vec<Stage> {
    vec![
        Stage::source("v4l2src").with("device", device),
        Stage::caps(jpeg_caps(params)),
        Stage::transform("jpegdec"),
        Stage::transform("videoconvert"),
        Stage::caps(RAW_I420_CAPS),
        encoder.to_stage(),
    ]
}

/// RTP depayload front half shared by the sink-side modes
fn listen_stages(port: u16) -> Vec<Stage> {
    vec![
        Stage::source("udpsrc").with("port", port),
        Stage::caps(RTP_H264_CAPS),
        Stage::transform("rtph264depay"),
    ]
}

/// Build the pipeline description for `mode`, pure and deterministic.
///
/// `role` only contributes the label the launched process will log under;
/// all variability is injected via `params`.
pub fn build(
    mode: PipelineMode,
    role: StreamRole,
    params: &PipelineParams,
) -> Result<PipelineSpec, PipelineError> {
    let label = format!("{}/{}", role.label(), mode.as_str());
    let stages = match mode {
        PipelineMode::CaptureTest => {
            let device = require(&params.device, mode, "device")?;
            let encoder = params.encoder.clone().unwrap_or_else(EncoderSettings::hardware);
            let mut stages = capture_stages(device, &encoder, params);
            stages.push(Stage::sink("fakesink"));
            stages
        }
        PipelineMode::RelaySource => {
            let device = require(&params.device, mode, "device")?;
            let host = require(&params.target_host, mode, "target_host")?;
            let port = *require(&params.target_port, mode, "target_port")?;
            let encoder = require(&params.encoder, mode, "encoder")?;
            let mut stages = capture_stages(device, encoder, params);
            stages.extend([
                Stage::caps(H264_STREAM_CAPS),
                Stage::transform("h264parse"),
                Stage::transform("rtph264pay").with("config-interval", 1i64),
                Stage::sink("udpsink")
                    .with("host", host.clone())
                    .with("port", port)
                    .with("sync", false),
            ]);
            stages
        }
        PipelineMode::SinkDisplay => {
            let port = *require(&params.listen_port, mode, "listen_port")?;
            let mut stages = listen_stages(port);
            stages.extend([
                Stage::transform("h264parse"),
                Stage::transform("avdec_h264"),
                Stage::transform("videoconvert"),
                Stage::sink("autovideosink").with("sync", false),
            ]);
            stages
        }
        PipelineMode::SinkRecord => {
            let port = *require(&params.listen_port, mode, "listen_port")?;
            let path = require(&params.output_path, mode, "output_path")?;
            let mut stages = listen_stages(port);
            stages.extend([
                Stage::transform("h264parse"),
                Stage::transform("mp4mux"),
                Stage::sink("filesink").with("location", path.clone()),
            ]);
            stages
        }
        PipelineMode::SinkForward => {
            let port = *require(&params.listen_port, mode, "listen_port")?;
            let relay_port = *require(&params.forward_port, mode, "forward_port")?;
            let relay_host = params
                .forward_host
                .clone()
                .unwrap_or_else(|| "127.0.0.1".to_string());
            let mut stages = listen_stages(port);
            stages.extend([
                Stage::transform("h264parse"),
                Stage::transform("rtph264pay").with("config-interval", 1i64),
                Stage::sink("udpsink")
                    .with("host", relay_host)
                    .with("port", relay_port)
                    .with("sync", false),
            ]);
            stages
        }
        PipelineMode::ListenTest => {
            let port = *require(&params.listen_port, mode, "listen_port")?;
            let mut stages = listen_stages(port);
            stages.push(Stage::sink("fakesink"));
            stages
        }
    };
    PipelineSpec::from_stages(label, stages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::pipeline::spec::StageKind;

    fn base_params() -> PipelineParams {
        PipelineParams::from_config(&LinkConfig::default())
    }

    fn assert_well_formed(spec: &PipelineSpec) {
        assert_eq!(spec.source().kind, StageKind::Source);
        assert_eq!(spec.sink().kind, StageKind::Sink);
        let middle = &spec.stages()[1..spec.stages().len() - 1];
        assert!(middle.iter().all(|s| s.kind == StageKind::Transform));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result = "warp-drive".parse::<PipelineMode>();
        assert!(matches!(result, Err(PipelineError::UnknownMode(m)) if m == "warp-drive"));
    }

    #[test]
    fn test_all_mode_strings_round_trip() {
        for mode in [
            PipelineMode::CaptureTest,
            PipelineMode::RelaySource,
            PipelineMode::SinkDisplay,
            PipelineMode::SinkRecord,
            PipelineMode::SinkForward,
            PipelineMode::ListenTest,
        ] {
            assert_eq!(mode.as_str().parse::<PipelineMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_relay_source_preserves_parameters() {
        let params = base_params()
            .with_device("/dev/video0")
            .with_target("192.168.1.10", 5000)
            .with_encoder(EncoderSettings::hardware());
        let spec = build(PipelineMode::RelaySource, StreamRole::CameraOne, &params).unwrap();
        assert_well_formed(&spec);

        assert_eq!(
            spec.source().property("device"),
            Some(&ParamValue::Str("/dev/video0".to_string()))
        );
        assert_eq!(spec.sink().name, "udpsink");
        assert_eq!(
            spec.sink().property("host"),
            Some(&ParamValue::Str("192.168.1.10".to_string()))
        );
        assert_eq!(spec.sink().property("port"), Some(&ParamValue::Int(5000)));
        assert_eq!(spec.sink().property("sync"), Some(&ParamValue::Bool(false)));

        // geometry flows into the JPEG caps verbatim
        assert_eq!(
            spec.stages()[1].name,
            "image/jpeg,width=640,height=480,framerate=15/1"
        );
    }

    #[test]
    fn test_relay_source_requires_encoder() {
        let params = base_params()
            .with_device("/dev/video0")
            .with_target("192.168.1.10", 5000);
        let result = build(PipelineMode::RelaySource, StreamRole::CameraOne, &params);
        assert!(matches!(
            result,
            Err(PipelineError::MissingParameter { name: "encoder", .. })
        ));
    }

    #[test]
    fn test_capture_test_requires_device() {
        let result = build(PipelineMode::CaptureTest, StreamRole::CameraOne, &base_params());
        assert!(matches!(
            result,
            Err(PipelineError::MissingParameter { name: "device", .. })
        ));
    }

    #[test]
    fn test_capture_test_discards_output() {
        let params = base_params().with_device("/dev/video2");
        let spec = build(PipelineMode::CaptureTest, StreamRole::CameraTwo, &params).unwrap();
        assert_well_formed(&spec);
        assert_eq!(spec.sink().name, "fakesink");
        assert_eq!(spec.label(), "camera2/capture-test");
    }

    #[test]
    fn test_sink_display_listens_on_given_port() {
        let params = base_params().with_listen_port(5001);
        let spec = build(PipelineMode::SinkDisplay, StreamRole::CameraTwo, &params).unwrap();
        assert_well_formed(&spec);
        assert_eq!(spec.source().name, "udpsrc");
        assert_eq!(spec.source().property("port"), Some(&ParamValue::Int(5001)));
        assert_eq!(spec.sink().name, "autovideosink");
    }

    #[test]
    fn test_sink_record_requires_output_path() {
        let params = base_params().with_listen_port(5000);
        let result = build(PipelineMode::SinkRecord, StreamRole::CameraOne, &params);
        assert!(matches!(
            result,
            Err(PipelineError::MissingParameter { name: "output_path", .. })
        ));
    }

    #[test]
    fn test_sink_record_writes_to_path() {
        let params = base_params()
            .with_listen_port(5000)
            .with_output_path("camera1_1700000000.mp4");
        let spec = build(PipelineMode::SinkRecord, StreamRole::CameraOne, &params).unwrap();
        assert_well_formed(&spec);
        assert_eq!(spec.sink().name, "filesink");
        assert_eq!(
            spec.sink().property("location"),
            Some(&ParamValue::Str("camera1_1700000000.mp4".to_string()))
        );
    }

    #[test]
    fn test_sink_forward_defaults_to_localhost() {
        let params = base_params().with_listen_port(5000).with_forward_port(8554);
        let spec = build(PipelineMode::SinkForward, StreamRole::CameraOne, &params).unwrap();
        assert_well_formed(&spec);
        assert_eq!(
            spec.sink().property("host"),
            Some(&ParamValue::Str("127.0.0.1".to_string()))
        );
        assert_eq!(spec.sink().property("port"), Some(&ParamValue::Int(8554)));
    }

    #[test]
    fn test_listen_test_is_minimal() {
        let params = base_params().with_listen_port(5000);
        let spec = build(PipelineMode::ListenTest, StreamRole::CameraOne, &params).unwrap();
        assert_well_formed(&spec);
        assert_eq!(spec.stages().len(), 4);
        assert_eq!(spec.sink().name, "fakesink");
    }

    #[test]
    fn test_encoder_presets_differ() {
        let hw = EncoderSettings::hardware();
        let sw = EncoderSettings::software();
        assert_eq!(hw.element, "omxh264enc");
        assert_eq!(sw.element, "x264enc");
        assert_eq!(hw.properties.get("bitrate"), Some(&ParamValue::Int(1_000_000)));
        assert_eq!(sw.properties.get("bitrate"), Some(&ParamValue::Int(1000)));
    }
}
