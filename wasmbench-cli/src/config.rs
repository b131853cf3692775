//! Configuration loading from wasmbench.toml
//!
//! The configuration is discovered by walking up from the current directory.
//! Without one, the built-in fib(30) scenario runs: two modules under
//! `demos/wasm` plus the Rust reference.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wasmbench_core::{EngineSettings, OptLevel, Value};

/// Name of the discovered configuration file
pub const CONFIG_FILE_NAME: &str = "wasmbench.toml";

/// wasmbench configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasmbenchConfig {
    /// What to call and where modules live
    #[serde(default)]
    pub scenario: ScenarioConfig,
    /// Candidates in measurement order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<CandidateConfig>,
    /// Runtime engine configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
    /// Directory of the file this config was loaded from
    #[serde(skip)]
    pub root: Option<PathBuf>,
}

impl Default for WasmbenchConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioConfig::default(),
            candidates: default_candidates(),
            runtime: RuntimeConfig::default(),
            output: OutputConfig::default(),
            root: None,
        }
    }
}

/// Scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Export invoked on every module candidate
    #[serde(default = "default_export")]
    pub export: String,
    /// Arguments passed to every candidate
    #[serde(default = "default_args")]
    pub args: Vec<ArgLiteral>,
    /// Directory module paths are resolved against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            export: default_export(),
            args: default_args(),
            base_dir: default_base_dir(),
        }
    }
}

fn default_export() -> String {
    "fib".to_string()
}
fn default_args() -> Vec<ArgLiteral> {
    vec![ArgLiteral::Int(30)]
}
fn default_base_dir() -> PathBuf {
    PathBuf::from("demos/wasm")
}

/// An argument as written in TOML: `30`, `2.5` or `"30i64"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgLiteral {
    /// Integer literal (i32 when it fits, else i64)
    Int(i64),
    /// Float literal (f64)
    Float(f64),
    /// Suffixed literal parsed like a CLI `--arg`
    Text(String),
}

impl ArgLiteral {
    /// Convert into a typed value
    pub fn to_value(&self) -> anyhow::Result<Value> {
        match self {
            ArgLiteral::Int(v) => Ok(i32::try_from(*v)
                .map(Value::I32)
                .unwrap_or(Value::I64(*v))),
            ArgLiteral::Float(v) => Ok(Value::F64(*v)),
            ArgLiteral::Text(s) => s.parse().map_err(anyhow::Error::msg),
        }
    }
}

/// One candidate: a module path or a reference name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Display label
    pub label: String,
    /// Module path, relative to `scenario.base_dir`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Name of a built-in reference implementation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

fn default_candidates() -> Vec<CandidateConfig> {
    vec![
        CandidateConfig {
            label: "Unoptimized".to_string(),
            path: Some(PathBuf::from("fib.wasm")),
            reference: None,
        },
        CandidateConfig {
            label: "Optimized".to_string(),
            path: Some(PathBuf::from("fib_opt.wasm")),
            reference: None,
        },
        CandidateConfig {
            label: "Reference".to_string(),
            path: None,
            reference: Some("fib".to_string()),
        },
    ]
}

/// Code generation level for the runtime compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CodegenLevel {
    /// No optimizations
    None,
    /// Optimize for speed (default)
    #[default]
    Speed,
    /// Optimize for speed and size
    SpeedAndSize,
}

impl From<CodegenLevel> for OptLevel {
    fn from(level: CodegenLevel) -> Self {
        match level {
            CodegenLevel::None => OptLevel::None,
            CodegenLevel::Speed => OptLevel::Speed,
            CodegenLevel::SpeedAndSize => OptLevel::SpeedAndSize,
        }
    }
}

/// Runtime engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Code generation level: "none", "speed" or "speed-and-size"
    #[serde(default)]
    pub opt_level: CodegenLevel,
    /// Compile module functions in parallel
    #[serde(default = "default_true")]
    pub parallel_compilation: bool,
    /// Satisfy unknown function imports with trapping stubs
    #[serde(default = "default_true")]
    pub stub_imports: bool,
    /// Pin the measuring thread to this core
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            opt_level: CodegenLevel::default(),
            parallel_compilation: true,
            stub_imports: true,
            pin_cpu: None,
        }
    }
}

impl RuntimeConfig {
    /// Engine settings for the module loader
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            opt_level: self.opt_level.into(),
            parallel_compilation: self.parallel_compilation,
            stub_imports: self.stub_imports,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print a speedup table after the report lines
    #[serde(default)]
    pub summary: bool,
    /// Append cycle counts to report lines
    #[serde(default)]
    pub show_cycles: bool,
}

impl WasmbenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.root = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<anyhow::Result<Self>> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(Self::load(&config_path));
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Base directory for module paths.
    ///
    /// A relative `scenario.base_dir` is taken relative to the config file's
    /// directory, or to the current directory without a file.
    pub fn base_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) if self.scenario.base_dir.is_relative() => {
                root.join(&self.scenario.base_dir)
            }
            _ => self.scenario.base_dir.clone(),
        }
    }

    /// Scenario arguments as typed values
    pub fn args(&self) -> anyhow::Result<Vec<Value>> {
        self.scenario
            .args
            .iter()
            .map(ArgLiteral::to_value)
            .collect()
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# wasmbench configuration

[scenario]
# Export invoked on every module candidate
export = "fib"
# Arguments: integers, floats, or suffixed strings such as "30i64"
args = [30]
# Module paths below are resolved against this directory
base_dir = "demos/wasm"

# Candidates run strictly in this order, one at a time
[[candidates]]
label = "Unoptimized"
path = "fib.wasm"

[[candidates]]
label = "Optimized"
path = "fib_opt.wasm"

[[candidates]]
label = "Reference"
reference = "fib"

[runtime]
# Code generation level: "none", "speed" or "speed-and-size"
opt_level = "speed"
parallel_compilation = true
# Link unknown function imports to trapping stubs
stub_imports = true
# Pin the measuring thread to a core (uncomment to enable)
# pin_cpu = 0

[output]
# Print a speedup table after the report lines
summary = false
# Append cycle counts to each line
show_cycles = false
"#
        .to_string()
    }
}
