use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use draft_config::{AppConfig, ConfigError};
use draft_io::{DrawingLoader, DxfFacade, JsonFacade};
use draft_kernel::session::Session;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
            path => input = Some(PathBuf::from(path)),
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动绘图内核");

    let mut session = Session::new(config.kernel.clone());
    if let Some(path) = input {
        match load_drawing(&path) {
            Ok(drawing) => session.load_drawing(drawing),
            Err(err) => {
                error!(path = %path.display(), error = %err, "载入图形失败");
                std::process::exit(1);
            }
        }
    }

    summarize(&session);
}

/// 按扩展名选择加载器：`.json` 走原生格式，其余按 DXF 处理。
fn load_drawing(path: &Path) -> Result<draft_core::drawing::Drawing, draft_io::IoError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        JsonFacade::new().load(path)
    } else {
        DxfFacade::new().load(path)
    }
}

fn summarize(session: &Session) {
    let drawing = session.drawing();
    let layers = drawing.layers().count();
    info!(entities = drawing.len(), layers, "会话就绪");
    if let Some(bounds) = drawing.bounds() {
        info!(
            min_x = bounds.min().x(),
            min_y = bounds.min().y(),
            max_x = bounds.max().x(),
            max_y = bounds.max().y(),
            "图形范围"
        );
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
