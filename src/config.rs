//! Policy configuration: detection thresholds, grouping parameters, and the
//! maintainability-index weights.
//!
//! All values are serde-defaulted so a partial `.splitmap.toml` only overrides
//! what it names. The maintainability formula and the grouping similarity
//! threshold are deliberately policy parameters rather than constants; the
//! defaults here are the empirically tuned ones.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".splitmap.toml";

/// Detection thresholds. Risk levels are a pure function of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Physical line count above which a file is oversized
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// File-level cyclomatic complexity above which a file is oversized
    #[serde(default = "default_max_complexity")]
    pub max_complexity: u32,

    /// Fraction of a threshold at which risk becomes Medium
    #[serde(default = "default_warn_ratio")]
    pub warn_ratio: f64,

    /// Multiplier over both thresholds at which risk becomes Critical
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            max_complexity: default_max_complexity(),
            warn_ratio: default_warn_ratio(),
            critical_multiplier: default_critical_multiplier(),
        }
    }
}

fn default_max_lines() -> usize {
    1000
}

fn default_max_complexity() -> u32 {
    80
}

fn default_warn_ratio() -> f64 {
    0.75
}

fn default_critical_multiplier() -> f64 {
    2.0
}

/// Responsibility-grouping parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingPolicy {
    /// Jaccard similarity of needed-import sets at which two declarations
    /// are clustered together
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Clusters below this size (and without a type member) stay ungrouped
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Recommendations below this confidence are suppressed
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Minimum shared name-stem length for naming proximity
    #[serde(default = "default_min_stem_len")]
    pub min_stem_len: usize,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_group_size: default_min_group_size(),
            min_confidence: default_min_confidence(),
            min_stem_len: default_min_stem_len(),
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.5
}

fn default_min_group_size() -> usize {
    2
}

fn default_min_confidence() -> f64 {
    0.3
}

fn default_min_stem_len() -> usize {
    4
}

/// Weights of the maintainability-index composite. The formula is
/// `base - complexity_weight * cc - size_weight * ln(loc) + comment bonus`,
/// rescaled to [0, 100]. Complexity and size only ever lower the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintainabilityWeights {
    #[serde(default = "default_mi_base")]
    pub base: f64,

    #[serde(default = "default_mi_complexity_weight")]
    pub complexity_weight: f64,

    #[serde(default = "default_mi_size_weight")]
    pub size_weight: f64,

    /// Scale of the comment-density bonus
    #[serde(default = "default_mi_comment_weight")]
    pub comment_weight: f64,
}

impl Default for MaintainabilityWeights {
    fn default() -> Self {
        Self {
            base: default_mi_base(),
            complexity_weight: default_mi_complexity_weight(),
            size_weight: default_mi_size_weight(),
            comment_weight: default_mi_comment_weight(),
        }
    }
}

fn default_mi_base() -> f64 {
    171.0
}

fn default_mi_complexity_weight() -> f64 {
    0.23
}

fn default_mi_size_weight() -> f64 {
    16.2
}

fn default_mi_comment_weight() -> f64 {
    50.0
}

/// Include/exclude filters for the tree walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkPolicy {
    /// Glob patterns relative to the root; empty means every `.rs` file
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    // both root-level and nested forms; `**/` does not match zero components
    vec![
        "target/**".to_string(),
        "**/target/**".to_string(),
        ".git/**".to_string(),
        "**/.git/**".to_string(),
        ".splitmap/**".to_string(),
        "**/.splitmap/**".to_string(),
        "node_modules/**".to_string(),
        "**/node_modules/**".to_string(),
    ]
}

/// Complete policy for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub thresholds: Thresholds,

    #[serde(default)]
    pub grouping: GroupingPolicy,

    #[serde(default)]
    pub maintainability: MaintainabilityWeights,

    #[serde(default)]
    pub walk: WalkPolicy,

    /// Directory (relative to the analyzed root) holding backups, the
    /// transition log, and the exclusivity marker
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".splitmap")
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            grouping: GroupingPolicy::default(),
            maintainability: MaintainabilityWeights::default(),
            walk: WalkPolicy::default(),
            state_dir: default_state_dir(),
        }
    }
}

impl Policy {
    /// Load `.splitmap.toml` from `root`, falling back to defaults when the
    /// file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let policy: Policy = toml::from_str(&content)
            .with_context(|| format!("invalid config at {}", path.display()))?;
        Ok(policy)
    }

    /// Serialized default policy, written by `splitmap init`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Policy::default())
            .expect("default policy always serializes")
    }

    /// Absolute state directory for a given root.
    pub fn state_dir_for(&self, root: &Path) -> PathBuf {
        if self.state_dir.is_absolute() {
            self.state_dir.clone()
        } else {
            root.join(&self.state_dir)
        }
    }

    pub fn backup_root_for(&self, root: &Path) -> PathBuf {
        self.state_dir_for(root).join("backups")
    }
}
