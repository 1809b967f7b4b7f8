//! Pipeline description types

use indexmap::IndexMap;
use std::fmt;

/// Stage parameter values can be strings, integers, or booleans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ParamValue {
    /// String form used when serializing to the launcher argument vector
    pub fn as_str(&self) -> String {
        match self {
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u16> for ParamValue {
    fn from(value: u16) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// Position a stage may occupy in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Origin of the data: capture device or network listener
    Source,
    /// Intermediate processing step, including caps constraints
    Transform,
    /// Destination: display, network sender, file, or discard
    Sink,
}

/// One named processing step in a linear media pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub kind: StageKind,
    /// External element name, or a caps string for constraint stages
    pub name: String,
    /// Ordered element properties
    pub properties: IndexMap<String, ParamValue>,
}

impl Stage {
    fn new(kind: StageKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            properties: IndexMap::new(),
        }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Self::new(StageKind::Source, name)
    }

    pub fn transform(name: impl Into<String>) -> Self {
        Self::new(StageKind::Transform, name)
    }

    pub fn sink(name: impl Into<String>) -> Self {
        Self::new(StageKind::Sink, name)
    }

    /// A caps-constraint stage; the caps string is the stage name and takes
    /// no properties
    pub fn caps(caps: impl Into<String>) -> Self {
        Self::new(StageKind::Transform, caps)
    }

    /// Attach a property (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property value
    pub fn property(&self, key: &str) -> Option<&ParamValue> {
        self.properties.get(key)
    }

    fn push_args(&self, args: &mut Vec<String>) {
        args.push(self.name.clone());
        for (key, value) in &self.properties {
            args.push(format!("{}={}", key, value));
        }
    }
}

/// Errors from pipeline construction and validation
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown pipeline mode '{0}'")]
    UnknownMode(String),

    #[error("mode '{mode}' requires parameter '{name}'")]
    MissingParameter {
        mode: &'static str,
        name: &'static str,
    },

    #[error("pipeline has no stages")]
    EmptyChain,

    #[error("pipeline must begin with a single source stage")]
    MissingSource,

    #[error("pipeline must end with a single sink stage")]
    MissingSink,

    #[error("stage '{0}' breaks the source-transforms-sink chain")]
    MisplacedStage(String),
}

/// An immutable, validated linear pipeline
///
/// Invariants, checked at construction: the chain is non-empty, begins with
/// exactly one source stage, and ends with exactly one sink stage. Output of
/// stage *i* feeds stage *i + 1*.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    label: String,
    stages: Vec<Stage>,
}

impl PipelineSpec {
    /// Validate and freeze a stage chain
    pub fn from_stages(
        label: impl Into<String>,
        stages: Vec<Stage>,
    ) -> Result<Self, PipelineError> {
        let (first, rest) = stages.split_first().ok_or(PipelineError::EmptyChain)?;
        if first.kind != StageKind::Source {
            return Err(PipelineError::MissingSource);
        }
        let (last, middle) = rest.split_last().ok_or(PipelineError::MissingSink)?;
        if last.kind != StageKind::Sink {
            return Err(PipelineError::MissingSink);
        }
        if let Some(stage) = middle.iter().find(|s| s.kind != StageKind::Transform) {
            return Err(PipelineError::MisplacedStage(stage.name.clone()));
        }
        Ok(Self {
            label: label.into(),
            stages,
        })
    }

    /// Log prefix for processes launched from this spec
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn source(&self) -> &Stage {
        &self.stages[0]
    }

    pub fn sink(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    /// Serialize to the external launcher invocation. Stages become element
    /// tokens with `key=value` properties, chained with `!`.
    pub fn to_launch_command(&self) -> LaunchCommand {
        let mut args = vec!["-v".to_string()];
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                args.push("!".to_string());
            }
            stage.push_args(&mut args);
        }
        LaunchCommand {
            label: self.label.clone(),
            program: "gst-launch-1.0".to_string(),
            args,
        }
    }
}

impl fmt::Display for PipelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" ! ")?;
            }
            f.write_str(&stage.name)?;
        }
        Ok(())
    }
}

/// A fully-resolved external command, ready to spawn
#[derive(Debug, Clone)]
pub struct LaunchCommand {
    /// Log prefix for the spawned process
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    pub fn new(
        label: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}
