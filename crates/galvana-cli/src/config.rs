//! TOML configuration deserialisation for mapping jobs.

use serde::Deserialize;

use galvana_core::transfer::OutOfDomainPolicy;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub profile: ProfileConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Optional frame change applied to the model before mapping.
    #[serde(default)]
    pub frame: Option<FrameConfig>,
    /// Optional slice definition for `run --emit-plane`.
    #[serde(default)]
    pub plane: Option<PlaneConfig>,
}

/// Where the exported field profile lives.
#[derive(Debug, Deserialize)]
pub struct ProfileConfig {
    pub path: String,
}

/// Model geometry: a section-list file or an inline straight fibre.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelConfig {
    File {
        path: String,
    },
    Fibre {
        prefix: String,
        start: [f64; 3],
        direction: [f64; 3],
        sections: usize,
        section_length: f64,
        #[serde(default = "default_nseg")]
        nseg: u32,
    },
}

fn default_nseg() -> u32 {
    1
}

/// Mapping parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct MappingConfig {
    /// Probe current in amperes driven during the EM solve.
    #[serde(default = "default_probe_current")]
    pub probe_current_amps: f64,
    /// Out-of-domain handling: "reject" or "nearest-sample".
    #[serde(default)]
    pub out_of_domain: OutOfDomainPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            probe_current_amps: default_probe_current(),
            out_of_domain: OutOfDomainPolicy::default(),
        }
    }
}

fn default_probe_current() -> f64 {
    1.0e-6
}

/// Frame change pieces, applied as scale, then rotation, then translation.
#[derive(Debug, Default, Deserialize)]
pub struct FrameConfig {
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub rotate_x_deg: Option<f64>,
    #[serde(default)]
    pub translate: Option<[f64; 3]>,
}

/// Output file paths.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Positional resistance store (default: "resistances.dat").
    #[serde(default = "default_resistances")]
    pub resistances: String,
    /// Optional keyed store for inspection and diffing.
    #[serde(default)]
    pub keyed: Option<String>,
    /// Optional JSON run report.
    #[serde(default)]
    pub report: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            resistances: default_resistances(),
            keyed: None,
            report: None,
        }
    }
}

fn default_resistances() -> String {
    "resistances.dat".into()
}

/// An axis-aligned slice through the field for visual inspection.
#[derive(Debug, Deserialize)]
pub struct PlaneConfig {
    /// Plane orientation: "xy", "xz", or "yz".
    pub axis: String,
    /// Coordinate of the plane along the remaining axis.
    pub level: f64,
    /// In-plane extent `[u_min, u_max, v_min, v_max]`.
    pub extent: [f64; 4],
    #[serde(default = "default_plane_samples")]
    pub nu: usize,
    #[serde(default = "default_plane_samples")]
    pub nv: usize,
    /// Output CSV path (default: "plane.csv").
    #[serde(default = "default_plane_path")]
    pub path: String,
}

fn default_plane_samples() -> usize {
    40
}

fn default_plane_path() -> String {
    "plane.csv".into()
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: JobConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_fibre_job_fills_defaults() {
        let text = r#"
[profile]
path = "exported.txt"

[model]
prefix = "node"
start = [25.0, 25.0, 10.0]
direction = [0.0, 0.0, 1.0]
sections = 5
section_length = 15.0
"#;
        let job: JobConfig = toml::from_str(text).unwrap();
        match job.model {
            ModelConfig::Fibre { nseg, sections, .. } => {
                assert_eq!(nseg, 1);
                assert_eq!(sections, 5);
            }
            other => panic!("expected a fibre model, got {other:?}"),
        }
        assert_eq!(job.mapping.probe_current_amps, 1.0e-6);
        assert_eq!(job.mapping.out_of_domain, OutOfDomainPolicy::Reject);
        assert_eq!(job.output.resistances, "resistances.dat");
        assert!(job.frame.is_none());
        assert!(job.plane.is_none());
    }

    #[test]
    fn full_job_with_file_model_parses() {
        let text = r#"
[profile]
path = "exported.txt"

[model]
path = "sections.txt"

[mapping]
probe_current_amps = 2.0e-6
out_of_domain = "nearest-sample"

[frame]
rotate_x_deg = 90.0
translate = [0.0, 0.0, 50.0]

[output]
resistances = "rx.dat"
keyed = "rx.tsv"
report = "report.json"

[plane]
axis = "xy"
level = 50.0
extent = [0.0, 100.0, 0.0, 100.0]
path = "slice.csv"
"#;
        let job: JobConfig = toml::from_str(text).unwrap();
        assert!(matches!(job.model, ModelConfig::File { .. }));
        assert_eq!(job.mapping.out_of_domain, OutOfDomainPolicy::NearestSample);
        assert_eq!(job.output.keyed.as_deref(), Some("rx.tsv"));

        let frame = job.frame.unwrap();
        assert_eq!(frame.rotate_x_deg, Some(90.0));
        assert_eq!(frame.scale, None);

        let plane = job.plane.unwrap();
        assert_eq!(plane.axis, "xy");
        assert_eq!(plane.nu, 40);
        assert_eq!(plane.path, "slice.csv");
    }

    #[test]
    fn missing_profile_section_fails() {
        let text = r#"
[model]
path = "sections.txt"
"#;
        assert!(toml::from_str::<JobConfig>(text).is_err());
    }
}
