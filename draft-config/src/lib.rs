use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。内核相关配置集中在 [`KernelConfig`]，
/// 作为显式参数传入每个内核调用，不存在全局可变配置。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub kernel: KernelConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `DRAFT_CONFIG`，否则寻找
    /// `./config/default.toml`。文件缺失时返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("DRAFT_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 内核配置：容差、网格、正交与捕捉开关。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelConfig {
    #[serde(default)]
    pub tolerances: ToleranceConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub ortho: OrthoConfig,
    #[serde(default)]
    pub snap: SnapConfig,
}

/// 以像素表示的容差。调用方提供“每世界单位像素数”的比例，
/// 内核据此换算为世界单位。
#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default = "ToleranceConfig::default_hit_px")]
    pub hit_px: f64,
    #[serde(default = "ToleranceConfig::default_snap_px")]
    pub snap_px: f64,
    #[serde(default = "ToleranceConfig::default_tracking_px")]
    pub tracking_px: f64,
}

impl ToleranceConfig {
    fn default_hit_px() -> f64 {
        10.0
    }

    fn default_snap_px() -> f64 {
        10.0
    }

    fn default_tracking_px() -> f64 {
        8.0
    }
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            hit_px: Self::default_hit_px(),
            snap_px: Self::default_snap_px(),
            tracking_px: Self::default_tracking_px(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    /// 显示网格间距（世界单位）。
    #[serde(default = "GridConfig::default_size")]
    pub size: f64,
    /// 捕捉网格间距，网格回退与正交距离取整都使用它。
    #[serde(default = "GridConfig::default_snap_size")]
    pub snap_size: f64,
    #[serde(default = "GridConfig::default_enabled")]
    pub enabled: bool,
}

impl GridConfig {
    fn default_size() -> f64 {
        10.0
    }

    fn default_snap_size() -> f64 {
        1.0
    }

    fn default_enabled() -> bool {
        true
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: Self::default_size(),
            snap_size: Self::default_snap_size(),
            enabled: Self::default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrthoConfig {
    #[serde(default)]
    pub enabled: bool,
    /// 角度步长（度）。文件里以度书写，内核使用弧度。
    #[serde(default = "OrthoConfig::default_step_degrees")]
    pub step_degrees: f64,
    /// 是否将锚点距离取整到捕捉网格的整数倍。
    #[serde(default)]
    pub round_distance: bool,
}

impl OrthoConfig {
    fn default_step_degrees() -> f64 {
        45.0
    }

    #[inline]
    pub fn step_radians(&self) -> f64 {
        self.step_degrees.to_radians()
    }
}

impl Default for OrthoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            step_degrees: Self::default_step_degrees(),
            round_distance: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapConfig {
    /// 显式捕捉点（端点/中点/象限/插入点）总开关。
    #[serde(default = "SnapConfig::default_enabled")]
    pub enabled: bool,
    /// 圆心捕捉可单独关闭。
    #[serde(default = "SnapConfig::default_center")]
    pub center: bool,
    /// 对齐追踪开关。
    #[serde(default = "SnapConfig::default_tracking")]
    pub tracking: bool,
}

impl SnapConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_center() -> bool {
        true
    }

    fn default_tracking() -> bool {
        true
    }
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            center: Self::default_center(),
            tracking: Self::default_tracking(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
