use std::path::PathBuf;

use papyar_config::{AppConfig, ConfigError};
use papyar_core::geometry::Point3;
use papyar_engine::scene::{DisplayMode, Session};
use papyar_io::token::overlay_url;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod loader;
mod renderer;

use loader::DocumentSource;
use renderer::ConsoleRenderer;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut page_token: Option<String> = None;
    let mut layout_path: Option<PathBuf> = None;
    let mut transcription_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--page" => {
                let Some(token) = args.next() else {
                    eprintln!("`--page` 需要提供页面令牌");
                    std::process::exit(1);
                };
                page_token = Some(token);
            }
            "--layout" => {
                let Some(path) = args.next() else {
                    eprintln!("`--layout` 需要提供 ALTO 文件路径");
                    std::process::exit(1);
                };
                layout_path = Some(PathBuf::from(path));
            }
            "--transcription" => {
                let Some(path) = args.next() else {
                    eprintln!("`--transcription` 需要提供文本文件路径");
                    std::process::exit(1);
                };
                transcription_path = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 papyar 会话");

    let loaded = loader::load_document(
        page_token.as_deref(),
        layout_path.as_ref(),
        transcription_path.as_ref(),
    );

    println!("papyar CLI 演示");
    match &loaded.source {
        DocumentSource::Alto(path) => {
            println!("已从 ALTO 版面构建文档：{}", path.display());
        }
        DocumentSource::Token(raw) => {
            println!("已从页面令牌构建文档：{raw}");
        }
        DocumentSource::Demo => {
            println!("已构建内置示例文档");
        }
    }
    println!(
        "分享链接：{}",
        overlay_url(&config.source.overlay_base_url, &loaded.token)
    );

    let mut session = Session::new(ConsoleRenderer::new(config.overlay.vertical_clearance));

    println!("元数据面板：");
    if let Err(err) = session.load(loaded.document) {
        error!(error = %err, "装入文档失败");
        std::process::exit(1);
    }

    println!("转写覆盖层：");
    match session.set_display_mode(DisplayMode::Transcription) {
        Ok(true) => {}
        Ok(false) => println!("  （没有转写数据）"),
        Err(err) => {
            error!(error = %err, "切换展示模式失败");
            std::process::exit(1);
        }
    }

    // 模拟跟踪协作方的校准节拍：两个标记的位姿采样，其中一次
    // 标记被遮挡、一次与上一帧姿态重合。
    let data_anchor = Point3::new(0.0, 0.0, 0.0);
    let samples = [
        (Point3::new(1.2, 0.0, 0.0), true, true),
        (Point3::new(1.2, 0.0, 0.0), true, true),
        (Point3::new(1.5, 0.2, 0.1), true, false),
        (Point3::new(1.5, 0.2, 0.1), true, true),
    ];
    for (calibration_anchor, data_visible, calibration_visible) in samples {
        match session.observe_anchors(
            data_anchor,
            calibration_anchor,
            data_visible,
            calibration_visible,
        ) {
            Ok(true) => {
                info!(
                    reference_distance = session.reference_distance(),
                    "比例已更新，场景重建完成"
                );
            }
            Ok(false) => {}
            Err(err) => {
                error!(error = %err, "处理采样失败");
                std::process::exit(1);
            }
        }
    }

    println!(
        "会话结束：参考距离={:.4}，面板数={}",
        session.reference_distance(),
        session.state().placements().len()
    );
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
