//! Query and tree-construction settings.

use lattice_math::{Real, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{BvhError, Result};

/// Settings shared by tree construction and the ray-cast query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Cast direction of the point-in-triangle-mesh ray. Normalized on use.
    pub ray_direction: [f64; 3],
    /// Padding added to each primitive box before the tree is built.
    pub box_padding: f64,
    /// Number of SAH buckets tried per axis during construction.
    pub sah_buckets: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ray_direction: [0.0, 0.0, 1.0],
            box_padding: 1e-12,
            sah_buckets: 12,
        }
    }
}

impl QueryConfig {
    /// Parse settings from TOML. Missing keys take their defaults.
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let [x, y, z] = self.ray_direction;
        let len = (x * x + y * y + z * z).sqrt();
        if !len.is_finite() || len < 1e-12 {
            return Err(BvhError::InvalidConfig(
                "ray_direction must be a finite, non-zero vector".into(),
            ));
        }
        if !self.box_padding.is_finite() || self.box_padding < 0.0 {
            return Err(BvhError::InvalidConfig(
                "box_padding must be finite and non-negative".into(),
            ));
        }
        if self.sah_buckets < 2 {
            return Err(BvhError::InvalidConfig(
                "sah_buckets must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// The configured ray direction in the query scalar type.
    pub fn direction<T: Real>(&self) -> Vec3<T> {
        let [x, y, z] = self.ray_direction;
        Vec3::new(T::lit(x), T::lit(y), T::lit(z))
    }

    /// The configured box padding in the query scalar type.
    pub fn padding<T: Real>(&self) -> T {
        T::lit(self.box_padding)
    }
}
