use super::model::Topology;
use super::registry::TopologyAttr;
use crate::core::error::TopologyError;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Declarative description of a topology, typically read from TOML.
///
/// ```toml
/// n_atoms = 4
/// n_residues = 2
/// n_segments = 1
/// atom_resindex = [0, 0, 1, 1]
/// ```
///
/// Omitted maps fall back to the defaults of [`Topology::new`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TopologyConfig {
    pub n_atoms: usize,
    pub n_residues: usize,
    pub n_segments: usize,
    pub atom_resindex: Option<Vec<usize>>,
    pub residue_segindex: Option<Vec<usize>>,
}

impl TopologyConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config = Self::parse(&content, &path.to_string_lossy())?;
        debug!(path = %path.display(), "Loaded topology configuration");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })
    }

    /// Validates the maps and builds a topology with no attributes.
    pub fn build(self) -> Result<Topology, ConfigError> {
        Ok(Topology::new(
            self.n_atoms,
            self.n_residues,
            self.n_segments,
            Vec::new(),
            self.atom_resindex,
            self.residue_segindex,
        )?)
    }
}

#[derive(Default)]
pub struct TopologyBuilder {
    n_atoms: Option<usize>,
    n_residues: Option<usize>,
    n_segments: Option<usize>,
    atom_resindex: Option<Vec<usize>>,
    residue_segindex: Option<Vec<usize>>,
    attrs: Vec<Arc<dyn TopologyAttr>>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_atoms(mut self, n: usize) -> Self {
        self.n_atoms = Some(n);
        self
    }
    pub fn n_residues(mut self, n: usize) -> Self {
        self.n_residues = Some(n);
        self
    }
    pub fn n_segments(mut self, n: usize) -> Self {
        self.n_segments = Some(n);
        self
    }
    pub fn atom_resindex(mut self, map: Vec<usize>) -> Self {
        self.atom_resindex = Some(map);
        self
    }
    pub fn residue_segindex(mut self, map: Vec<usize>) -> Self {
        self.residue_segindex = Some(map);
        self
    }
    pub fn attribute(mut self, attr: Arc<dyn TopologyAttr>) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn build(self) -> Result<Topology, ConfigError> {
        let n_atoms = self.n_atoms.ok_or(ConfigError::MissingParameter("n_atoms"))?;
        let n_residues = self
            .n_residues
            .ok_or(ConfigError::MissingParameter("n_residues"))?;
        let n_segments = self
            .n_segments
            .ok_or(ConfigError::MissingParameter("n_segments"))?;

        Ok(Topology::new(
            n_atoms,
            n_residues,
            n_segments,
            self.attrs,
            self.atom_resindex,
            self.residue_segindex,
        )?)
    }
}

impl From<TopologyConfig> for TopologyBuilder {
    fn from(config: TopologyConfig) -> Self {
        let mut builder = TopologyBuilder::new()
            .n_atoms(config.n_atoms)
            .n_residues(config.n_residues)
            .n_segments(config.n_segments);
        builder.atom_resindex = config.atom_resindex;
        builder.residue_segindex = config.residue_segindex;
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::Level;
    use crate::topology::registry::tests::dummy;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const REFERENCE_TOML: &str = r#"
n_atoms = 10
n_residues = 4
n_segments = 2
atom_resindex = [0, 0, 2, 2, 1, 1, 3, 3, 1, 2]
residue_segindex = [0, 1, 1, 0]
"#;

    fn write_config(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    mod load_tests {
        use super::*;

        #[test]
        fn load_and_build_reference_topology() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_config(temp_dir.path(), "topology.toml", REFERENCE_TOML);

            let topology = TopologyConfig::load(&path).unwrap().build().unwrap();

            assert_eq!(topology.n_atoms(), 10);
            assert_eq!(
                topology.trans_table().segments_to_residues_flat(&[0, 1]).unwrap(),
                vec![0, 3, 1, 2]
            );
        }

        #[test]
        fn load_fails_for_missing_file() {
            let temp_dir = TempDir::new().unwrap();
            let result = TopologyConfig::load(&temp_dir.path().join("absent.toml"));
            assert!(matches!(result, Err(ConfigError::Io { .. })));
        }

        #[test]
        fn load_fails_for_malformed_toml() {
            let temp_dir = TempDir::new().unwrap();
            let path = write_config(temp_dir.path(), "bad.toml", "n_atoms = [");
            match TopologyConfig::load(&path) {
                Err(ConfigError::Toml { path: reported, .. }) => {
                    assert!(reported.ends_with("bad.toml"))
                }
                other => panic!("expected TOML error, got {:?}", other),
            }
        }

        #[test]
        fn unknown_fields_are_rejected() {
            let content = "n_atoms = 1\nn_residues = 1\nn_segments = 1\nn_chains = 1\n";
            let result = TopologyConfig::from_toml_str(content);
            assert!(matches!(result, Err(ConfigError::Toml { .. })));
        }

        #[test]
        fn omitted_maps_use_defaults() {
            let config =
                TopologyConfig::from_toml_str("n_atoms = 3\nn_residues = 2\nn_segments = 1\n")
                    .unwrap();
            assert!(config.atom_resindex.is_none());

            let topology = config.build().unwrap();
            assert_eq!(topology.trans_table().residue_atoms(0).unwrap(), vec![0, 1, 2]);
            assert!(topology.trans_table().residue_atoms(1).unwrap().is_empty());
        }

        #[test]
        fn inconsistent_maps_surface_topology_error() {
            let content = "n_atoms = 2\nn_residues = 1\nn_segments = 1\natom_resindex = [0, 1]\n";
            let result = TopologyConfig::from_toml_str(content).unwrap().build();
            assert!(matches!(
                result,
                Err(ConfigError::Topology(TopologyError::InvalidTopology(_)))
            ));
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn builder_creates_topology_with_attributes() {
            let topology = TopologyBuilder::new()
                .n_atoms(4)
                .n_residues(2)
                .n_segments(1)
                .atom_resindex(vec![0, 1, 1, 0])
                .attribute(dummy("names", Level::Atom, 4))
                .build()
                .unwrap();

            assert_eq!(topology.trans_table().residue_atoms(0).unwrap(), vec![0, 3]);
            assert_eq!(topology.trans_table().residue_segindex(), &[0, 0]);
            assert!(topology.has_attribute(Level::Atom, "names"));
        }

        #[test]
        fn builder_reports_missing_counts() {
            let result = TopologyBuilder::new().n_atoms(1).n_segments(1).build();
            assert!(matches!(
                result,
                Err(ConfigError::MissingParameter("n_residues"))
            ));

            let result = TopologyBuilder::new().build();
            assert!(matches!(result, Err(ConfigError::MissingParameter("n_atoms"))));
        }

        #[test]
        fn builder_from_config_matches_direct_build() {
            let config = TopologyConfig::from_toml_str(REFERENCE_TOML).unwrap();
            let via_builder = TopologyBuilder::from(config.clone()).build().unwrap();
            let direct = config.build().unwrap();

            assert_eq!(
                via_builder.trans_table().atom_resindex(),
                direct.trans_table().atom_resindex()
            );
            assert_eq!(
                via_builder.trans_table().residue_segindex(),
                direct.trans_table().residue_segindex()
            );
        }
    }
}
